use crate::models::ObjectLocation;

/// Request to convert a staged object into a block storage snapshot
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportRequest {
    pub description: String,
    pub disk_description: String,
    pub source: ObjectLocation,
    /// Disk format of the staged object, always "raw" for now
    pub format: String,
}

/// Observed state of an import task
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImportStatus {
    Pending,
    Active,
    Completed,
    Failed,
}

impl ImportStatus {
    /// Map the status string reported by the conversion service.
    ///
    /// Anything not recognised as terminal keeps the task in `Active` so the
    /// poller keeps waiting.
    pub fn from_remote(status: &str) -> Self {
        match status.to_ascii_lowercase().as_str() {
            "completed" => ImportStatus::Completed,
            "pending" => ImportStatus::Pending,
            "deleting" | "deleted" | "failed" | "error" => ImportStatus::Failed,
            _ => ImportStatus::Active,
        }
    }
}

/// Snapshot of a remote import task; only ever read, never written locally
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportTask {
    pub task_id: String,
    pub status: ImportStatus,
    /// Status string exactly as reported
    pub raw_status: String,
    pub progress: Option<String>,
    pub status_message: Option<String>,
    pub snapshot_id: Option<String>,
}

impl ImportTask {
    /// Progress percentage for display, "0" while unknown
    pub fn progress_or_zero(&self) -> &str {
        self.progress.as_deref().unwrap_or("0")
    }
}
