//! User-facing activity log.
//!
//! A bounded ring buffer of human-readable entries that the UI polls with an
//! `after` cursor. Every entry is also mirrored to `tracing` at the matching
//! level. Purely observational: nothing reads it back to make decisions.

use std::collections::VecDeque;

use chrono::Utc;
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;

use crate::types::Timestamp;

/// Default number of retained entries.
pub const DEFAULT_CAPACITY: usize = 500;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Info,
    Success,
    Warning,
    Error,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogEntry {
    /// Monotonic sequence number, starting at 1.
    pub id: u64,
    pub timestamp: Timestamp,
    pub message: String,
    pub level: LogLevel,
}

struct Ring {
    entries: VecDeque<LogEntry>,
    next_id: u64,
}

pub struct ActivityLog {
    capacity: usize,
    ring: RwLock<Ring>,
}

impl Default for ActivityLog {
    fn default() -> Self {
        Self::with_capacity(DEFAULT_CAPACITY)
    }
}

impl ActivityLog {
    pub fn with_capacity(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            capacity,
            ring: RwLock::new(Ring {
                entries: VecDeque::with_capacity(capacity),
                next_id: 1,
            }),
        }
    }

    /// Append an entry, evicting the oldest one when full. Returns its id.
    pub async fn push(&self, level: LogLevel, message: impl Into<String>) -> u64 {
        let message = message.into();
        match level {
            LogLevel::Info | LogLevel::Success => tracing::info!(activity = %message),
            LogLevel::Warning => tracing::warn!(activity = %message),
            LogLevel::Error => tracing::error!(activity = %message),
        }

        let mut ring = self.ring.write().await;
        let id = ring.next_id;
        ring.next_id += 1;
        if ring.entries.len() == self.capacity {
            ring.entries.pop_front();
        }
        ring.entries.push_back(LogEntry {
            id,
            timestamp: Utc::now(),
            message,
            level,
        });
        id
    }

    pub async fn info(&self, message: impl Into<String>) -> u64 {
        self.push(LogLevel::Info, message).await
    }

    pub async fn success(&self, message: impl Into<String>) -> u64 {
        self.push(LogLevel::Success, message).await
    }

    pub async fn warning(&self, message: impl Into<String>) -> u64 {
        self.push(LogLevel::Warning, message).await
    }

    pub async fn error(&self, message: impl Into<String>) -> u64 {
        self.push(LogLevel::Error, message).await
    }

    /// Entries with an id strictly greater than `after`, oldest first.
    pub async fn since(&self, after: Option<u64>) -> Vec<LogEntry> {
        let after = after.unwrap_or(0);
        self.ring
            .read()
            .await
            .entries
            .iter()
            .filter(|e| e.id > after)
            .cloned()
            .collect()
    }

    /// Drop every entry. Sequence numbers keep increasing afterwards.
    pub async fn clear(&self) {
        self.ring.write().await.entries.clear();
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
