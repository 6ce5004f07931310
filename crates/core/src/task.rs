//! Task (job) records and their enums.
//!
//! A task is one torrent-creation unit tied to a single source file or
//! directory. Tasks are created already runnable (`running`, progress 0) and
//! the processor claims them by bumping progress to [`DISPATCHED_PROGRESS`].

use std::fmt;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::types::{TaskId, Timestamp};

/// Progress written when the processor claims a task.
///
/// Any `running` task with progress 0 is considered undispatched.
pub const DISPATCHED_PROGRESS: u8 = 5;

/// Progress of a successfully built artifact.
pub const COMPLETE_PROGRESS: u8 = 100;

/// Default language tag when neither the caller nor the config provides one.
pub const DEFAULT_LANGUAGE_TAG: &str = "MULTI";

// ---------------------------------------------------------------------------
// Category
// ---------------------------------------------------------------------------

/// Which configured media class governs a task's source and output roots.
///
/// Free-text spellings seen in requests (`"séries"`, `"tv"`, `"films"`,
/// `"movie"`...) are folded into the two variants at deserialization.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    #[serde(alias = "séries", alias = "serie", alias = "série", alias = "tv", alias = "show")]
    Series,
    #[serde(alias = "movie", alias = "films", alias = "film")]
    Movies,
}

impl Category {
    pub const ALL: [Category; 2] = [Category::Series, Category::Movies];

    /// Parse a free-text category label, case-insensitively.
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_lowercase().as_str() {
            "series" | "séries" | "serie" | "série" | "tv" | "show" => Some(Self::Series),
            "movies" | "movie" | "films" | "film" => Some(Self::Movies),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Series => "series",
            Self::Movies => "movies",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// Status
// ---------------------------------------------------------------------------

/// Lifecycle state of a task.
///
/// `pending -> running -> {completed | cancelled}`. Processing errors and
/// user cancellation both end in `cancelled`; the reason lives in the
/// activity log.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TaskStatus {
    Pending,
    Running,
    Completed,
    Cancelled,
}

impl TaskStatus {
    /// Whether the task has reached a terminal state.
    pub fn is_finished(self) -> bool {
        matches!(self, Self::Completed | Self::Cancelled)
    }
}

// ---------------------------------------------------------------------------
// Task
// ---------------------------------------------------------------------------

/// A persisted task record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Task {
    pub id: TaskId,
    pub name: String,
    pub source_path: PathBuf,
    pub category: Category,
    pub language_tag: String,
    pub status: TaskStatus,
    pub progress: u8,
    pub created_at: Timestamp,
}

impl Task {
    /// Whether the processor still has to pick this task up.
    pub fn is_undispatched(&self) -> bool {
        self.status == TaskStatus::Running && self.progress == 0
    }
}

/// Caller-supplied fields of a new task; the store fills in the rest.
#[derive(Debug, Clone)]
pub struct NewTask {
    pub name: String,
    pub source_path: PathBuf,
    pub category: Category,
    pub language_tag: String,
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
