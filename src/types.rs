//! Core data types for the to-do ledger.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Row id of a list.
pub type ListId = i64;

/// Row id of an item.
pub type ItemId = i64;

/// Maximum length of a list or item name, in characters.
pub const MAX_NAME_LEN: usize = 200;

/// A named to-do list scoped to one channel.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TodoList {
    pub id: ListId,

    /// Guild that owns the channel
    pub guild_id: i64,

    /// Channel the list lives in; names are unique per channel
    pub channel_id: i64,

    pub name: String,

    pub created_at: DateTime<Utc>,
}

/// A single entry of a list.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Item {
    pub id: ItemId,

    pub list_id: ListId,

    pub name: String,

    /// Rank within the list, 1 = first. Dense over 1..N.
    pub priority: i64,

    pub status: Status,

    pub created_at: DateTime<Utc>,
}

/// Item status states.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Status {
    #[default]
    Pending,
    InProgress,
    Done,
}

impl Status {
    /// All statuses in display order.
    pub const ALL: [Status; 3] = [Status::Pending, Status::InProgress, Status::Done];

    /// The persisted name of this status.
    pub fn as_str(&self) -> &'static str {
        match self {
            Status::Pending => "pending",
            Status::InProgress => "in_progress",
            Status::Done => "done",
        }
    }

    /// Marker shown next to items in list output.
    pub fn marker(&self) -> &'static str {
        match self {
            Status::Pending => "❌",
            Status::InProgress => "🔵",
            Status::Done => "✅",
        }
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Status {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "pending" => Ok(Status::Pending),
            "in_progress" => Ok(Status::InProgress),
            "done" => Ok(Status::Done),
            _ => Err(ValidationError::InvalidStatus(s.to_string())),
        }
    }
}

/// Validation errors for values supplied by the command layer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ValidationError {
    EmptyName,
    NameTooLong,
    InvalidCharacters,
    InvalidStatus(String),
    InvalidPriority(String),
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValidationError::EmptyName => write!(f, "name cannot be empty"),
            ValidationError::NameTooLong => write!(f, "name exceeds {} characters", MAX_NAME_LEN),
            ValidationError::InvalidCharacters => write!(f, "name contains control characters"),
            ValidationError::InvalidStatus(s) => {
                write!(f, "invalid status '{}': expected pending, in_progress or done", s)
            }
            ValidationError::InvalidPriority(s) => {
                write!(f, "invalid priority '{}': must be a positive integer", s)
            }
        }
    }
}

impl std::error::Error for ValidationError {}

/// Validate a list or item name.
pub fn validate_name(name: &str) -> Result<(), ValidationError> {
    if name.trim().is_empty() {
        return Err(ValidationError::EmptyName);
    }
    if name.chars().count() > MAX_NAME_LEN {
        return Err(ValidationError::NameTooLong);
    }
    if name.chars().any(|c| c.is_control()) {
        return Err(ValidationError::InvalidCharacters);
    }
    Ok(())
}

/// Parse a user-supplied priority. Only positive integers are accepted here;
/// the ledger still clamps whatever it receives into the valid range.
pub fn parse_priority(s: &str) -> Result<i64, ValidationError> {
    match s.trim().parse::<i64>() {
        Ok(p) if p >= 1 => Ok(p),
        _ => Err(ValidationError::InvalidPriority(s.to_string())),
    }
}
