// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Bounded notice queue with dedupe for OpenOTDR tools.

use serde::{Deserialize, Serialize};
use std::collections::VecDeque;

/// Notice severity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum NoticeKind {
    /// Informational note.
    Info,
    /// Warning that may need attention.
    Warn,
    /// Error requiring user awareness.
    Error,
}

impl NoticeKind {
    /// Lower-case label.
    pub const fn label(self) -> &'static str {
        match self {
            Self::Info => "info",
            Self::Warn => "warn",
            Self::Error => "error",
        }
    }
}

/// A message attached to a loaded trace.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notice {
    /// Severity.
    pub kind: NoticeKind,
    /// Short title line.
    pub title: String,
    /// Optional body text.
    pub body: Option<String>,
}

/// In-memory notice queue.
///
/// Holds at most `max` notices, dropping the oldest first. Pushing a notice
/// identical to one already queued is a no-op.
#[derive(Debug, Clone)]
pub struct NoticeQueue {
    queue: VecDeque<Notice>,
    max: usize,
}

impl NoticeQueue {
    /// Create a new queue with a maximum length.
    pub fn new(max: usize) -> Self {
        Self {
            queue: VecDeque::new(),
            max,
        }
    }

    /// Push a notice unless an identical one is already queued.
    ///
    /// Returns `false` when the notice was a duplicate or the queue has no
    /// capacity.
    pub fn push<S, B>(&mut self, kind: NoticeKind, title: S, body: B) -> bool
    where
        S: Into<String>,
        B: Into<Option<String>>,
    {
        if self.max == 0 {
            return false;
        }
        let notice = Notice {
            kind,
            title: title.into(),
            body: body.into(),
        };
        if self.queue.contains(&notice) {
            return false;
        }
        if self.queue.len() == self.max {
            self.queue.pop_front();
        }
        self.queue.push_back(notice);
        true
    }

    /// Queued notices, oldest first.
    pub fn iter(&self) -> impl Iterator<Item = &Notice> {
        self.queue.iter()
    }

    /// Number of queued notices.
    pub fn len(&self) -> usize {
        self.queue.len()
    }

    /// True when nothing is queued.
    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }

    /// Consume the queue, oldest first.
    pub fn into_vec(self) -> Vec<Notice> {
        self.queue.into()
    }
}
