//! In-memory storage and image services sharing one call journal, so tests
//! can assert the order of calls across the whole pipeline.

#![allow(dead_code)]

use std::collections::VecDeque;
use std::path::Path;
use std::sync::{Arc, Mutex};

use amipush_compute::{ComputeError, ComputeResult, ImageService};
use amipush_core::{
    ImportRequest, ImportStatus, ImportTask, ObjectLocation, PublishConfig, RegistrationRequest,
};
use amipush_storage::{CompletedPart, ObjectStorage, StorageError, StorageResult};
use async_trait::async_trait;
use bytes::Bytes;
use tempfile::NamedTempFile;

pub type Journal = Arc<Mutex<Vec<String>>>;

pub const TASK_ID: &str = "import-snap-1";

pub struct MockStorage {
    journal: Journal,
    pub failing_part: Option<i32>,
}

impl MockStorage {
    pub fn new(journal: Journal) -> Self {
        Self {
            journal,
            failing_part: None,
        }
    }

    fn record(&self, entry: String) {
        self.journal.lock().unwrap().push(entry);
    }
}

#[async_trait]
impl ObjectStorage for MockStorage {
    async fn put_object(
        &self,
        location: &ObjectLocation,
        _source: &Path,
        content_length: u64,
        _content_type: &str,
    ) -> StorageResult<()> {
        self.record(format!("put {} {}", location.key, content_length));
        Ok(())
    }

    async fn create_multipart_upload(&self, location: &ObjectLocation) -> StorageResult<String> {
        self.record(format!("create {}", location.key));
        Ok("upload-1".to_string())
    }

    async fn upload_part(
        &self,
        _location: &ObjectLocation,
        _upload_id: &str,
        part_number: i32,
        body: Bytes,
    ) -> StorageResult<String> {
        self.record(format!("part {} {}", part_number, body.len()));
        if self.failing_part == Some(part_number) {
            return Err(StorageError::UploadFailed("connection reset".to_string()));
        }
        Ok(format!("etag-{}", part_number))
    }

    async fn complete_multipart_upload(
        &self,
        _location: &ObjectLocation,
        _upload_id: &str,
        parts: &[CompletedPart],
    ) -> StorageResult<()> {
        let numbers: Vec<String> = parts.iter().map(|p| p.part_number.to_string()).collect();
        self.record(format!("complete {}", numbers.join(",")));
        Ok(())
    }

    async fn abort_multipart_upload(
        &self,
        _location: &ObjectLocation,
        upload_id: &str,
    ) -> StorageResult<()> {
        self.record(format!("abort {}", upload_id));
        Ok(())
    }
}

pub struct MockImages {
    journal: Journal,
    /// Task states returned in order; the last one repeats
    tasks: Mutex<VecDeque<ImportTask>>,
    pub register_error: Option<String>,
}

impl MockImages {
    pub fn new(journal: Journal, tasks: Vec<ImportTask>) -> Self {
        Self {
            journal,
            tasks: Mutex::new(tasks.into()),
            register_error: None,
        }
    }

    fn record(&self, entry: String) {
        self.journal.lock().unwrap().push(entry);
    }
}

#[async_trait]
impl ImageService for MockImages {
    async fn import_snapshot(&self, request: &ImportRequest) -> ComputeResult<String> {
        self.record(format!(
            "import {} {}",
            request.source.key, request.description
        ));
        Ok(TASK_ID.to_string())
    }

    async fn describe_import_task(&self, task_id: &str) -> ComputeResult<Option<ImportTask>> {
        self.record(format!("describe {}", task_id));
        let mut tasks = self.tasks.lock().unwrap();
        if tasks.len() > 1 {
            Ok(tasks.pop_front())
        } else {
            Ok(tasks.front().cloned())
        }
    }

    async fn register_image(&self, request: &RegistrationRequest) -> ComputeResult<String> {
        self.record(format!("register {} {}", request.name, request.snapshot_id));
        match &self.register_error {
            Some(message) => Err(ComputeError::RequestFailed(message.clone())),
            None => Ok("ami-1".to_string()),
        }
    }
}

pub fn task(status: &str, progress: Option<&str>, snapshot_id: Option<&str>) -> ImportTask {
    ImportTask {
        task_id: TASK_ID.to_string(),
        status: ImportStatus::from_remote(status),
        raw_status: status.to_string(),
        progress: progress.map(str::to_string),
        status_message: None,
        snapshot_id: snapshot_id.map(str::to_string),
    }
}

pub fn journal() -> Journal {
    Arc::new(Mutex::new(Vec::new()))
}

pub fn entries(journal: &Journal) -> Vec<String> {
    journal.lock().unwrap().clone()
}

/// Temporary `.raw` image filled with `size` bytes
pub fn image_file(size: usize) -> NamedTempFile {
    use std::io::Write;

    let mut file = tempfile::Builder::new()
        .prefix("image")
        .suffix(".raw")
        .tempfile()
        .unwrap();
    let data: Vec<u8> = (0..size).map(|i| (i % 251) as u8).collect();
    file.write_all(&data).unwrap();
    file.flush().unwrap();
    file
}

/// Config publishing `file` to bucket `b` under the name `linuxkit`
pub fn config_for(file: &NamedTempFile) -> PublishConfig {
    let mut config = PublishConfig::new(file.path(), "b");
    config.name = Some("linuxkit".to_string());
    config
}
