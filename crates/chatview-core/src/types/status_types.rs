//! Status log entry types

use serde::{Deserialize, Serialize};

/// One transient status line
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct StatusEntry {
    pub id: String,
    pub message: String,
}

impl StatusEntry {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            message: message.into(),
        }
    }

    pub fn with_id(id: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            message: message.into(),
        }
    }
}
