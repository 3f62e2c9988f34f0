use std::fmt;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Server-assigned task identifier, opaque to the client.
///
/// Kept in whichever JSON form the server uses so it round-trips unchanged.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum TaskId {
    Int(u64),
    Str(String),
}

impl fmt::Display for TaskId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Int(id) => write!(f, "{id}"),
            Self::Str(id) => f.write_str(id),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum TaskStatus {
    #[default]
    Pending,
    #[serde(rename = "In Progress")]
    InProgress,
    Completed,
}

impl TaskStatus {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "Pending",
            Self::InProgress => "In Progress",
            Self::Completed => "Completed",
        }
    }

    /// Next status in display order, wrapping around.
    pub const fn next(self) -> Self {
        match self {
            Self::Pending => Self::InProgress,
            Self::InProgress => Self::Completed,
            Self::Completed => Self::Pending,
        }
    }

    pub const fn prev(self) -> Self {
        match self {
            Self::Pending => Self::Completed,
            Self::InProgress => Self::Pending,
            Self::Completed => Self::InProgress,
        }
    }
}

impl fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// View-only predicate over task status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StatusFilter {
    #[default]
    All,
    Only(TaskStatus),
}

impl StatusFilter {
    pub const OPTIONS: [StatusFilter; 4] = [
        Self::All,
        Self::Only(TaskStatus::Pending),
        Self::Only(TaskStatus::InProgress),
        Self::Only(TaskStatus::Completed),
    ];

    pub fn matches(self, task: &Task) -> bool {
        match self {
            Self::All => true,
            Self::Only(status) => task.status == status,
        }
    }

    pub const fn next(self) -> Self {
        match self {
            Self::All => Self::Only(TaskStatus::Pending),
            Self::Only(TaskStatus::Completed) => Self::All,
            Self::Only(status) => Self::Only(status.next()),
        }
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::All => "All",
            Self::Only(status) => status.as_str(),
        }
    }
}

/// A task as last confirmed by the server.
///
/// Fields the client does not model are kept in `extra` so that a full
/// update sends them back untouched.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Task {
    pub id: TaskId,
    pub title: String,
    pub description: String,
    pub status: TaskStatus,
    pub due_date: NaiveDate,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Task {
    pub fn from_draft(id: TaskId, draft: TaskDraft) -> Self {
        Self {
            id,
            title: draft.title,
            description: draft.description,
            status: draft.status,
            due_date: draft.due_date,
            extra: Map::new(),
        }
    }

    /// Shallow merge: every draft field replaces the stored one, the id and
    /// any unmodelled server fields are kept.
    pub fn merged_with(&self, draft: TaskDraft) -> Self {
        Self {
            id: self.id.clone(),
            title: draft.title,
            description: draft.description,
            status: draft.status,
            due_date: draft.due_date,
            extra: self.extra.clone(),
        }
    }
}

/// Validated form contents, also the body of a create request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskDraft {
    pub title: String,
    pub description: String,
    pub status: TaskStatus,
    pub due_date: NaiveDate,
}

/// Body of a status-only partial update.
#[derive(Debug, Serialize)]
pub struct StatusPatch {
    pub status: TaskStatus,
}
