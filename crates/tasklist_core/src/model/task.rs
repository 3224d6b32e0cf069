//! Task domain model.
//!
//! # Responsibility
//! - Define the persisted task record and the caller-supplied draft.
//! - Own title validation shared by every write path.
//!
//! # Invariants
//! - `TaskId` is assigned by the store and never reused.
//! - A draft title must be non-blank after trimming.
//! - `color` and `image_path` are opaque to core.

use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};

const MILLIS_PER_DAY: i64 = 24 * 60 * 60 * 1000;

/// Store-assigned task identity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TaskId(i64);

impl TaskId {
    pub fn new(value: i64) -> Self {
        Self(value)
    }

    pub fn get(self) -> i64 {
        self.0
    }
}

impl Display for TaskId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Packed 32-bit ARGB color. Core never interprets the value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TaskColor(pub u32);

impl TaskColor {
    pub const TRANSPARENT: Self = Self(0x0000_0000);
    pub const RED: Self = Self(0xFFFF_0000);
    pub const GREEN: Self = Self(0xFF00_FF00);
    pub const BLUE: Self = Self(0xFF00_00FF);
    pub const YELLOW: Self = Self(0xFFFF_FF00);
    pub const PURPLE: Self = Self(0xFFFF_00FF);
    /// Light blue used when the caller supplies no color.
    pub const DEFAULT: Self = Self(0xFF90_CAF9);

    pub fn argb(self) -> u32 {
        self.0
    }
}

impl Default for TaskColor {
    fn default() -> Self {
        Self::DEFAULT
    }
}

impl From<u32> for TaskColor {
    fn from(value: u32) -> Self {
        Self(value)
    }
}

/// Validation failures for task drafts and persisted rows.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TaskValidationError {
    /// Title is empty or whitespace only.
    BlankTitle,
}

impl Display for TaskValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::BlankTitle => write!(f, "title cannot be empty"),
        }
    }
}

impl Error for TaskValidationError {}

/// Caller-supplied field bundle for create/edit, before validation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskDraft {
    pub title: String,
    pub note: String,
    /// Unix epoch milliseconds.
    pub created_at: i64,
    pub color: TaskColor,
    pub image_path: Option<String>,
    /// Only set by create defaults today; edits overwrite it too.
    #[serde(default)]
    pub done: bool,
}

impl TaskDraft {
    /// Creates a draft with empty note, default color and no image.
    pub fn new(title: impl Into<String>, created_at: i64) -> Self {
        Self {
            title: title.into(),
            note: String::new(),
            created_at,
            color: TaskColor::DEFAULT,
            image_path: None,
            done: false,
        }
    }

    pub fn with_note(mut self, note: impl Into<String>) -> Self {
        self.note = note.into();
        self
    }

    pub fn with_color(mut self, color: TaskColor) -> Self {
        self.color = color;
        self
    }

    pub fn with_image_path(mut self, image_path: impl Into<String>) -> Self {
        self.image_path = Some(image_path.into());
        self
    }

    /// Checks write-path invariants.
    pub fn validate(&self) -> Result<(), TaskValidationError> {
        validate_title(&self.title)
    }
}

/// Persisted task record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Task {
    pub id: TaskId,
    pub title: String,
    pub note: String,
    /// Unix epoch milliseconds.
    pub created_at: i64,
    pub color: TaskColor,
    pub done: bool,
    pub image_path: Option<String>,
}

impl Task {
    /// Copies the editable fields into a draft, e.g. to pre-fill an edit form.
    pub fn to_draft(&self) -> TaskDraft {
        TaskDraft {
            title: self.title.clone(),
            note: self.note.clone(),
            created_at: self.created_at,
            color: self.color,
            image_path: self.image_path.clone(),
            done: self.done,
        }
    }

    /// Returns whether this task carries the same field values as `draft`.
    pub fn matches_draft(&self, draft: &TaskDraft) -> bool {
        self.to_draft() == *draft
    }
}

pub(crate) fn validate_title(title: &str) -> Result<(), TaskValidationError> {
    if title.trim().is_empty() {
        return Err(TaskValidationError::BlankTitle);
    }
    Ok(())
}

/// Zeroes hours, minutes, seconds and millis of a UTC epoch timestamp.
///
/// Date-only pickers produce day-granular `created_at` values.
pub fn truncate_to_day(epoch_ms: i64) -> i64 {
    epoch_ms - epoch_ms.rem_euclid(MILLIS_PER_DAY)
}
