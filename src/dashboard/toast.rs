//! Transient notifications.

use std::collections::VecDeque;

use chrono::{DateTime, Duration, Utc};
use serde::Serialize;

/// Oldest toasts are dropped past this many.
const MAX_TOASTS: usize = 20;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ToastKind {
    Success,
    Error,
    Info,
}

#[derive(Debug, Clone, Serialize)]
pub struct Toast {
    pub id: u64,
    pub kind: ToastKind,
    pub message: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct Toasts {
    next_id: u64,
    ttl: Duration,
    items: VecDeque<Toast>,
}

impl Toasts {
    pub fn new(ttl: std::time::Duration) -> Self {
        Self {
            next_id: 1,
            ttl: Duration::from_std(ttl).unwrap_or_else(|_| Duration::seconds(5)),
            items: VecDeque::new(),
        }
    }

    pub fn push(&mut self, kind: ToastKind, message: impl Into<String>) -> u64 {
        self.push_at(kind, message, Utc::now())
    }

    pub fn push_at(&mut self, kind: ToastKind, message: impl Into<String>, now: DateTime<Utc>) -> u64 {
        let id = self.next_id;
        self.next_id += 1;
        self.items.push_back(Toast {
            id,
            kind,
            message: message.into(),
            created_at: now,
        });
        while self.items.len() > MAX_TOASTS {
            self.items.pop_front();
        }
        id
    }

    pub fn success(&mut self, message: impl Into<String>) -> u64 {
        self.push(ToastKind::Success, message)
    }

    pub fn error(&mut self, message: impl Into<String>) -> u64 {
        self.push(ToastKind::Error, message)
    }

    pub fn info(&mut self, message: impl Into<String>) -> u64 {
        self.push(ToastKind::Info, message)
    }

    pub fn dismiss(&mut self, id: u64) -> bool {
        let before = self.items.len();
        self.items.retain(|t| t.id != id);
        self.items.len() != before
    }

    /// Drop expired toasts and return the rest, oldest first.
    pub fn active(&mut self, now: DateTime<Utc>) -> Vec<Toast> {
        let ttl = self.ttl;
        self.items.retain(|t| now - t.created_at < ttl);
        self.items.iter().cloned().collect()
    }

    pub fn clear(&mut self) {
        self.items.clear();
    }

    pub fn last(&self) -> Option<&Toast> {
        self.items.back()
    }
}
