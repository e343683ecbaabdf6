//! # Notices
//!
//! Short user-visible confirmations ("Product added", "Cart emptied") raised
//! by the stores. Rendering them is the caller's business; the stores only
//! hand them to a [`NoticeSink`].

use serde::Serialize;
use std::sync::{Mutex, PoisonError};

/// How a notice should be presented.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum NoticeVariant {
    Info,
    /// Something was removed or failed.
    Destructive,
}

/// A user-visible confirmation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Notice {
    pub title: String,
    pub description: String,
    pub variant: NoticeVariant,
}

impl Notice {
    pub fn info(title: impl Into<String>, description: impl Into<String>) -> Self {
        Notice {
            title: title.into(),
            description: description.into(),
            variant: NoticeVariant::Info,
        }
    }

    pub fn destructive(title: impl Into<String>, description: impl Into<String>) -> Self {
        Notice {
            title: title.into(),
            description: description.into(),
            variant: NoticeVariant::Destructive,
        }
    }

    pub fn is_destructive(&self) -> bool {
        self.variant == NoticeVariant::Destructive
    }
}

/// Receiver of notices (implemented by the presentation layer).
pub trait NoticeSink: Send + Sync {
    fn notify(&self, notice: &Notice);
}

/// Drops every notice.
pub struct NoOpSink;

impl NoticeSink for NoOpSink {
    fn notify(&self, _notice: &Notice) {}
}

/// Records notices for later inspection.
#[derive(Default)]
pub struct CollectingSink {
    notices: Mutex<Vec<Notice>>,
}

impl CollectingSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Notices received so far.
    pub fn notices(&self) -> Vec<Notice> {
        self.notices
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Titles received so far, in order.
    pub fn titles(&self) -> Vec<String> {
        self.notices().into_iter().map(|n| n.title).collect()
    }
}

impl NoticeSink for CollectingSink {
    fn notify(&self, notice: &Notice) {
        self.notices
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(notice.clone());
    }
}
