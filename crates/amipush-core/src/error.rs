//! Error types module
//!
//! Every stage of the publish workflow fails fast and reports through
//! [`PublishError`]. Variants are grouped so callers can tell apart
//! configuration mistakes, transport failures, the remote service violating
//! its own contract, and the deadline running out while work was still in
//! progress on the remote side.

use std::fmt::{Display, Formatter, Result as FmtResult};
use std::io;

/// Stage of the workflow an error or a deadline applies to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Upload,
    Import,
    Register,
}

impl Display for Phase {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        match self {
            Phase::Upload => write!(f, "upload"),
            Phase::Import => write!(f, "import"),
            Phase::Register => write!(f, "register"),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum PublishError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("{context}: {source}")]
    Io {
        context: String,
        #[source]
        source: io::Error,
    },

    #[error("{operation} failed: {message}")]
    Transport {
        operation: &'static str,
        message: String,
    },

    #[error("Error uploading part {part_number} of {total_parts}: {message}")]
    PartUpload {
        part_number: i32,
        total_parts: usize,
        message: String,
    },

    #[error("Deadline exceeded while uploading part {part_number} of {total_parts}")]
    PartTimedOut { part_number: i32, total_parts: usize },

    #[error("Remote service inconsistency: {0}")]
    RemoteInconsistency(String),

    #[error("Import task {task_id} ended with status '{status}': {message}")]
    ImportFailed {
        task_id: String,
        status: String,
        message: String,
    },

    #[error("Timed out waiting for import task {task_id} ({progress}% complete); it may still finish remotely")]
    ImportTimedOut { task_id: String, progress: String },

    #[error("Deadline exceeded during {phase} phase")]
    DeadlineExceeded { phase: Phase },

    #[error("Cancelled during {phase} phase")]
    Cancelled { phase: Phase },

    #[error("Error registering the image: {name}; {message}")]
    Registration { name: String, message: String },
}

/// Result type for publish operations
pub type PublishResult<T> = Result<T, PublishError>;

impl PublishError {
    pub fn io(context: impl Into<String>, source: io::Error) -> Self {
        PublishError::Io {
            context: context.into(),
            source,
        }
    }

    /// Get the error type name
    pub fn error_type(&self) -> &'static str {
        match self {
            PublishError::Config(_) => "Config",
            PublishError::Io { .. } => "Io",
            PublishError::Transport { .. } => "Transport",
            PublishError::PartUpload { .. } => "PartUpload",
            PublishError::PartTimedOut { .. } => "PartTimedOut",
            PublishError::RemoteInconsistency(_) => "RemoteInconsistency",
            PublishError::ImportFailed { .. } => "ImportFailed",
            PublishError::ImportTimedOut { .. } => "ImportTimedOut",
            PublishError::DeadlineExceeded { .. } => "DeadlineExceeded",
            PublishError::Cancelled { .. } => "Cancelled",
            PublishError::Registration { .. } => "Registration",
        }
    }

    /// True when the workflow ran out of time rather than failing outright.
    ///
    /// A timed out import may still complete on the remote side and can be
    /// resumed with its task id.
    pub fn is_timeout(&self) -> bool {
        matches!(
            self,
            PublishError::ImportTimedOut { .. }
                | PublishError::DeadlineExceeded { .. }
                | PublishError::PartTimedOut { .. }
        )
    }

    /// Import task id worth resuming, if this error left one behind
    pub fn resumable_task_id(&self) -> Option<&str> {
        match self {
            PublishError::ImportTimedOut { task_id, .. } => Some(task_id),
            _ => None,
        }
    }

    /// Suggested action for the operator
    pub fn suggested_action(&self) -> Option<&'static str> {
        match self {
            PublishError::Config(_) => Some("Fix the invocation flags and run again"),
            PublishError::ImportTimedOut { .. } => {
                Some("Re-run with --import-task-id to keep waiting for the import")
            }
            PublishError::DeadlineExceeded { .. } | PublishError::PartTimedOut { .. } => {
                Some("Increase --timeout")
            }
            PublishError::Registration { .. } => {
                Some("Check account quotas and image name policies")
            }
            PublishError::PartUpload { .. } => Some("Restart the whole upload"),
            _ => None,
        }
    }

    /// Get detailed error information including error chain
    pub fn detailed_message(&self) -> String {
        use std::error::Error;

        let mut details = self.to_string();

        let mut source = self.source();
        let mut depth = 0;
        while let Some(err) = source {
            depth += 1;
            if depth > 5 {
                details.push_str("\n  ... (truncated)");
                break;
            }
            details.push_str(&format!("\n  Caused by: {}", err));
            source = err.source();
        }

        if let Some(action) = self.suggested_action() {
            details.push_str(&format!("\n  Hint: {}", action));
        }

        details
    }
}
