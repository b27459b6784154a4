//! User-facing notifications for mutation results.

use serde::{Deserialize, Serialize};

use crate::mutation::MutationKind;

#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NoticeLevel {
    Success,
    Error,
}

/// A transient message shown after an operation; not persisted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notice {
    pub level: NoticeLevel,
    pub message: String,
}

impl Notice {
    pub fn success(kind: MutationKind) -> Self {
        let message = match kind {
            MutationKind::Add => "Item added successfully.",
            MutationKind::Remove => "Item removed successfully.",
            MutationKind::Delete => "Item deleted successfully.",
        };
        Self::new(NoticeLevel::Success, message)
    }

    pub fn failure(kind: MutationKind) -> Self {
        let message = match kind {
            MutationKind::Add => "Error adding item.",
            MutationKind::Remove => "Error removing item.",
            MutationKind::Delete => "Error deleting item.",
        };
        Self::new(NoticeLevel::Error, message)
    }

    pub fn empty_name() -> Self {
        Self::new(NoticeLevel::Error, "Item name cannot be empty.")
    }

    pub fn fetch_failed() -> Self {
        Self::new(NoticeLevel::Error, "Error fetching inventory.")
    }

    fn new(level: NoticeLevel, message: &str) -> Self {
        Self {
            level,
            message: message.to_string(),
        }
    }
}
