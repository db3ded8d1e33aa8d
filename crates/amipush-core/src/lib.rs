//! amipush Core Library
//!
//! This crate provides the domain models, error taxonomy, configuration, part
//! planning and the shared deadline used by every stage of the publish
//! workflow (upload → import snapshot → register image).

pub mod config;
pub mod constants;
pub mod deadline;
pub mod error;
pub mod models;
pub mod plan;

// Re-export commonly used types
pub use config::{BootMode, PublishConfig, RegistrationOptions, UploadSettings};
pub use deadline::Deadline;
pub use error::{Phase, PublishError, PublishResult};
pub use models::{
    ImportRequest, ImportStatus, ImportTask, ObjectLocation, PartDescriptor, RegistrationRequest,
    UploadStrategy, UploadTarget,
};
pub use plan::{plan, UploadPlan};
