//! Message list view model and reveal tracking

use crate::preview::{DiagramRenderer, FileDisplay, RenderContext};
use crate::types::{ChatMessage, MessageKey, Role};
use std::collections::HashSet;

/// Indices of bot messages whose reveal animation has already played
#[derive(Debug, Default, Clone)]
pub struct RevealTracker {
    rendered: HashSet<usize>,
}

impl RevealTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns whether the message at `index` should play its reveal, marking
    /// it as played. User and status messages never reveal.
    pub fn observe(&mut self, index: usize, message: &ChatMessage) -> bool {
        message.is_bot_message() && self.rendered.insert(index)
    }

    pub fn has_rendered(&self, index: usize) -> bool {
        self.rendered.contains(&index)
    }

    pub fn reset(&mut self) {
        self.rendered.clear();
    }

    pub fn len(&self) -> usize {
        self.rendered.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rendered.is_empty()
    }
}

/// One rendered message bubble
#[derive(Debug, Clone, PartialEq)]
pub struct MessageView {
    /// Render identity; a change forces a fresh bubble
    pub key: MessageKey,
    pub index: usize,
    pub role: Role,
    pub is_status: bool,
    pub text: String,
    /// Play the reveal animation on this render
    pub reveal: bool,
    pub attachments: Vec<FileDisplay>,
}

/// Renders the ordered transcript into bubbles
#[derive(Debug, Default)]
pub struct MessageList {
    tracker: RevealTracker,
    has_preview_handler: bool,
}

impl MessageList {
    pub fn new(has_preview_handler: bool) -> Self {
        Self {
            tracker: RevealTracker::new(),
            has_preview_handler,
        }
    }

    pub fn render(
        &mut self,
        messages: &[ChatMessage],
        cx: &RenderContext,
        diagrams: &dyn DiagramRenderer,
    ) -> Vec<MessageView> {
        if messages.is_empty() {
            self.tracker.reset();
            return Vec::new();
        }

        messages
            .iter()
            .enumerate()
            .map(|(index, message)| MessageView {
                key: MessageKey::for_message(message, index),
                index,
                role: message.role(),
                is_status: message.is_status_message,
                text: message.text.clone(),
                reveal: self.tracker.observe(index, message),
                attachments: message
                    .attachments
                    .iter()
                    .map(|file| {
                        FileDisplay::for_attachment(file, self.has_preview_handler, cx, diagrams)
                    })
                    .collect(),
            })
            .collect()
    }

    pub fn tracker(&self) -> &RevealTracker {
        &self.tracker
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::preview::CdnMermaidRenderer;
    use crate::types::FileAttachment;

    fn render(list: &mut MessageList, messages: &[ChatMessage]) -> Vec<MessageView> {
        list.render(
            messages,
            &RenderContext::new(400.0, 1200.0, 800.0),
            &CdnMermaidRenderer::default(),
        )
    }

    fn transcript(bot_text: &str) -> Vec<ChatMessage> {
        vec![
            ChatMessage::user("hello").with_session("s1"),
            ChatMessage::status("thinking").with_session("s1"),
            ChatMessage::bot(bot_text).with_session("s1"),
        ]
    }

    #[test]
    fn test_bot_reveal_plays_once() {
        let mut list = MessageList::new(true);

        let first = render(&mut list, &transcript("partial"));
        assert!(first[2].reveal);
        assert_eq!(first[2].key.to_string(), "s1-2-bot");

        // Same identity, changed text: no replay
        let second = render(&mut list, &transcript("partial and more"));
        assert!(!second[2].reveal);
        assert_eq!(second[2].text, "partial and more");
        assert_eq!(second[2].key, first[2].key);
    }

    #[test]
    fn test_user_and_status_never_tracked() {
        let mut list = MessageList::new(false);
        let views = render(&mut list, &transcript("x"));
        assert!(!views[0].reveal);
        assert!(!views[1].reveal);
        assert!(views[1].is_status);
        assert!(!list.tracker().has_rendered(0));
        assert!(!list.tracker().has_rendered(1));
        assert_eq!(list.tracker().len(), 1);
    }

    #[test]
    fn test_empty_transcript_resets_tracking() {
        let mut list = MessageList::new(false);
        render(&mut list, &transcript("x"));
        assert!(render(&mut list, &[]).is_empty());
        assert!(list.tracker().is_empty());

        let views = render(&mut list, &transcript("x"));
        assert!(views[2].reveal);
    }

    #[test]
    fn test_pending_slot_reveals_when_bot_arrives() {
        let mut list = MessageList::new(false);
        let mut messages = vec![ChatMessage::user("q"), ChatMessage::status("working")];
        render(&mut list, &messages);

        // The status slot is replaced by the bot answer
        messages[1] = ChatMessage::bot("answer");
        let views = render(&mut list, &messages);
        assert!(views[1].reveal);
        assert!(!render(&mut list, &messages)[1].reveal);
    }

    #[test]
    fn test_session_change_changes_identity() {
        let a = MessageKey::for_message(&ChatMessage::bot("x").with_session("a"), 2);
        let b = MessageKey::for_message(&ChatMessage::bot("x").with_session("b"), 2);
        assert_ne!(a, b);
    }

    #[test]
    fn test_attachments_are_laid_out() {
        let mut list = MessageList::new(true);
        let msg = ChatMessage::bot("see file")
            .with_attachment(FileAttachment::from_bytes("page.html", b"<p>x</p>", None));
        let views = render(&mut list, &[msg]);
        assert_eq!(views[0].attachments.len(), 1);
        assert!(views[0].attachments[0].row().can_preview);
    }
}
