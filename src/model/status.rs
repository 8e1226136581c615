/// URL status definitions for the analysis lifecycle
///
/// This module defines every status a URL record can hold while it moves
/// through the worker pool.
use std::fmt;

/// Represents the current status of a URL record
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UrlStatus {
    // ===== Active States =====
    /// Record is waiting for a worker
    Queued,

    /// A worker has picked the record up and is analyzing it
    Running,

    // ===== Terminal States =====
    /// Analysis finished and its results are persisted
    Done,

    /// Analysis or persistence failed
    Error,

    /// A caller asked for the analysis to stop
    Stopped,
}

impl UrlStatus {
    /// Returns true if no further automatic transition follows this status
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Done | Self::Error | Self::Stopped)
    }

    /// Returns true if the record is queued or being analyzed
    pub fn is_active(&self) -> bool {
        matches!(self, Self::Queued | Self::Running)
    }

    /// Returns true if moving from `self` to `next` respects the lifecycle
    ///
    /// Workers only move forward (`queued -> running -> done|error`). A caller
    /// may stop an active record, and may re-queue any record for a fresh run.
    pub fn can_transition_to(&self, next: UrlStatus) -> bool {
        match (self, next) {
            (_, Self::Queued) => true,
            (Self::Queued, Self::Running) => true,
            (Self::Running, Self::Done | Self::Error) => true,
            (Self::Queued | Self::Running, Self::Stopped) => true,
            _ => false,
        }
    }

    /// Converts the status to its database string representation
    pub fn to_db_string(&self) -> &'static str {
        match self {
            Self::Queued => "queued",
            Self::Running => "running",
            Self::Done => "done",
            Self::Error => "error",
            Self::Stopped => "stopped",
        }
    }

    /// Parses a status from its database string representation
    ///
    /// Returns None if the string doesn't match any known status.
    pub fn from_db_string(s: &str) -> Option<Self> {
        match s {
            "queued" => Some(Self::Queued),
            "running" => Some(Self::Running),
            "done" => Some(Self::Done),
            "error" => Some(Self::Error),
            "stopped" => Some(Self::Stopped),
            _ => None,
        }
    }

    /// Returns all possible statuses
    pub fn all_statuses() -> Vec<Self> {
        vec![
            Self::Queued,
            Self::Running,
            Self::Done,
            Self::Error,
            Self::Stopped,
        ]
    }
}

impl fmt::Display for UrlStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_db_string())
    }
}
