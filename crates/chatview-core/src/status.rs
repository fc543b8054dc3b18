//! Status log banner
//!
//! The newest entry is the current status; earlier entries form a history
//! shown newest-first when the banner is expanded. Dismissal clears all.

use crate::types::StatusEntry;
use std::time::{Duration, Instant};

/// Duration of a history entry's enter/exit transition
pub const TRANSITION_MS: u64 = 300;

/// Transition phase of a history row at render time
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    Entering,
    Present,
    Exiting,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HistoryRow {
    pub id: String,
    pub message: String,
    pub transition: Transition,
    /// Time spent in the current transition, capped at [`TRANSITION_MS`]
    pub elapsed_ms: u64,
}

impl HistoryRow {
    /// Fraction of the transition completed, `0.0..=1.0`
    pub fn progress(&self) -> f32 {
        self.elapsed_ms as f32 / TRANSITION_MS as f32
    }
}

/// What the banner shows
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusBanner {
    pub current: String,
    /// Pulsing "live" dot next to the current status
    pub live: bool,
    pub expanded: bool,
    /// Newest-first rows, then rows leaving the history region
    pub history: Vec<HistoryRow>,
}

/// A history row on screen, with the instant its transition began
#[derive(Debug, Clone)]
struct TrackedRow {
    entry: StatusEntry,
    since: Instant,
    leaving: bool,
}

impl TrackedRow {
    fn to_history(&self, now: Instant) -> HistoryRow {
        let elapsed = now.saturating_duration_since(self.since).min(transition_duration());
        let transition = if self.leaving {
            Transition::Exiting
        } else if elapsed < transition_duration() {
            Transition::Entering
        } else {
            Transition::Present
        };
        HistoryRow {
            id: self.entry.id.clone(),
            message: self.entry.message.clone(),
            transition,
            elapsed_ms: elapsed.as_millis() as u64,
        }
    }

    fn is_settled(&self, now: Instant) -> bool {
        !self.leaving && now.saturating_duration_since(self.since) >= transition_duration()
    }
}

fn transition_duration() -> Duration {
    Duration::from_millis(TRANSITION_MS)
}

#[derive(Debug, Default)]
pub struct StatusLog {
    entries: Vec<StatusEntry>,
    expanded: bool,
    /// History rows currently on screen, including ones still exiting
    rows: Vec<TrackedRow>,
}

impl StatusLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, entry: StatusEntry) {
        self.entries.push(entry);
    }

    pub fn push_message(&mut self, message: impl Into<String>) {
        self.push(StatusEntry::new(message));
    }

    /// Clear every entry at once
    pub fn dismiss(&mut self) {
        self.entries.clear();
        self.rows.clear();
    }

    pub fn toggle_expanded(&mut self) {
        self.expanded = !self.expanded;
    }

    pub fn is_expanded(&self) -> bool {
        self.expanded
    }

    pub fn entries(&self) -> &[StatusEntry] {
        &self.entries
    }

    pub fn current(&self) -> Option<&StatusEntry> {
        self.entries.last()
    }

    /// All but the newest entry, newest-first
    pub fn history(&self) -> impl Iterator<Item = &StatusEntry> {
        let len = self.entries.len().saturating_sub(1);
        self.entries[..len].iter().rev()
    }

    /// Whether any history row is still mid-transition at `now`
    pub fn is_settling(&self, now: Instant) -> bool {
        self.rows.iter().any(|row| !row.is_settled(now))
    }

    /// Produce the banner for this render, or `None` when there is no status
    pub fn render(&mut self) -> Option<StatusBanner> {
        self.render_at(Instant::now())
    }

    /// Produce the banner as of `now`.
    ///
    /// Rows enter and exit over [`TRANSITION_MS`] regardless of how often
    /// this is called; exiting rows are dropped once their transition ends.
    pub fn render_at(&mut self, now: Instant) -> Option<StatusBanner> {
        let Some(current) = self.entries.last() else {
            self.rows.clear();
            return None;
        };
        let current = current.message.clone();

        let visible: Vec<StatusEntry> = if self.expanded && self.entries.len() > 1 {
            self.history().cloned().collect()
        } else {
            Vec::new()
        };

        for row in &mut self.rows {
            let still_visible = visible.iter().any(|e| e.id == row.entry.id);
            if !still_visible && !row.leaving {
                row.leaving = true;
                row.since = now;
            }
        }
        self.rows
            .retain(|row| !row.leaving || now.saturating_duration_since(row.since) < transition_duration());

        let mut rows = Vec::with_capacity(visible.len() + self.rows.len());
        for entry in visible {
            let row = match self.rows.iter().position(|r| r.entry.id == entry.id) {
                Some(i) => {
                    let mut row = self.rows.remove(i);
                    if row.leaving {
                        row.leaving = false;
                        row.since = now;
                    }
                    row.entry = entry;
                    row
                }
                None => TrackedRow {
                    entry,
                    since: now,
                    leaving: false,
                },
            };
            rows.push(row);
        }
        // Whatever is left is on its way out
        rows.append(&mut self.rows);
        self.rows = rows;

        Some(StatusBanner {
            current,
            live: true,
            expanded: self.expanded,
            history: self.rows.iter().map(|row| row.to_history(now)).collect(),
        })
    }
}
