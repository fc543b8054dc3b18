//! Database migrations

use crate::error::Result;
use rusqlite::Connection;
use tracing::{debug, info};

/// Run all database migrations
pub fn run_migrations(conn: &Connection) -> Result<()> {
    info!("Running database migrations");

    conn.execute_batch(
        r#"
        CREATE TABLE IF NOT EXISTS migrations (
            id INTEGER PRIMARY KEY,
            name TEXT NOT NULL UNIQUE,
            applied_at DATETIME DEFAULT CURRENT_TIMESTAMP
        );
        "#,
    )?;

    let migrations: Vec<(&str, &str)> = vec![("001_key_values", MIGRATION_001_KEY_VALUES)];

    for (name, sql) in migrations {
        if !migration_applied(conn, name)? {
            debug!("Applying migration: {}", name);
            conn.execute_batch(sql)?;
            mark_migration_applied(conn, name)?;
            info!("Applied migration: {}", name);
        }
    }

    Ok(())
}

fn migration_applied(conn: &Connection, name: &str) -> Result<bool> {
    let count: i32 = conn.query_row(
        "SELECT COUNT(*) FROM migrations WHERE name = ?",
        [name],
        |row| row.get(0),
    )?;
    Ok(count > 0)
}

fn mark_migration_applied(conn: &Connection, name: &str) -> Result<()> {
    conn.execute("INSERT INTO migrations (name) VALUES (?)", [name])?;
    Ok(())
}

const MIGRATION_001_KEY_VALUES: &str = r#"
-- Client-side key-value pairs (tokens, theme)
CREATE TABLE IF NOT EXISTS key_values (
    key TEXT PRIMARY KEY,
    value TEXT NOT NULL,
    updated_at DATETIME NOT NULL
);
"#;
