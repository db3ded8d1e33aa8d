//! Scripted in-memory image service shared by the compute tests.

#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::Mutex;
use std::time::Duration;

use amipush_compute::{ComputeError, ComputeResult, ImageService};
use amipush_core::{ImportRequest, ImportStatus, ImportTask, RegistrationRequest};
use async_trait::async_trait;

pub type DescribeResponse = ComputeResult<Option<ImportTask>>;

#[derive(Default)]
pub struct MockImageService {
    pub import_requests: Mutex<Vec<ImportRequest>>,
    pub describe_calls: Mutex<Vec<String>>,
    pub registrations: Mutex<Vec<RegistrationRequest>>,
    pub import_response: Mutex<Option<ComputeResult<String>>>,
    /// Responses handed out in order; the last one repeats
    pub describe_responses: Mutex<VecDeque<DescribeResponse>>,
    pub register_response: Mutex<Option<ComputeResult<String>>>,
    /// Time each status query takes to answer
    pub describe_delay: Option<Duration>,
}

impl MockImageService {
    pub fn with_describe(responses: Vec<DescribeResponse>) -> Self {
        Self {
            describe_responses: Mutex::new(responses.into()),
            ..Self::default()
        }
    }

    pub fn describe_count(&self) -> usize {
        self.describe_calls.lock().unwrap().len()
    }
}

pub fn task(status: &str, progress: Option<&str>, snapshot_id: Option<&str>) -> ImportTask {
    ImportTask {
        task_id: "import-snap-1".to_string(),
        status: ImportStatus::from_remote(status),
        raw_status: status.to_string(),
        progress: progress.map(str::to_string),
        status_message: None,
        snapshot_id: snapshot_id.map(str::to_string),
    }
}

fn clone_response(response: &DescribeResponse) -> DescribeResponse {
    match response {
        Ok(task) => Ok(task.clone()),
        Err(ComputeError::RequestFailed(msg)) => Err(ComputeError::RequestFailed(msg.clone())),
        Err(ComputeError::MissingField(field)) => Err(ComputeError::MissingField(field)),
    }
}

#[async_trait]
impl ImageService for MockImageService {
    async fn import_snapshot(&self, request: &ImportRequest) -> ComputeResult<String> {
        self.import_requests.lock().unwrap().push(request.clone());
        self.import_response
            .lock()
            .unwrap()
            .take()
            .unwrap_or_else(|| Ok("import-snap-1".to_string()))
    }

    async fn describe_import_task(&self, task_id: &str) -> ComputeResult<Option<ImportTask>> {
        self.describe_calls
            .lock()
            .unwrap()
            .push(task_id.to_string());
        if let Some(delay) = self.describe_delay {
            tokio::time::sleep(delay).await;
        }
        let mut responses = self.describe_responses.lock().unwrap();
        if responses.len() > 1 {
            responses.pop_front().unwrap()
        } else {
            clone_response(responses.front().expect("no describe response scripted"))
        }
    }

    async fn register_image(&self, request: &RegistrationRequest) -> ComputeResult<String> {
        self.registrations.lock().unwrap().push(request.clone());
        self.register_response
            .lock()
            .unwrap()
            .take()
            .unwrap_or_else(|| Ok("ami-1".to_string()))
    }
}
