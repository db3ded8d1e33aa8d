//! amipush Compute Library
//!
//! Compute side of the publish workflow: converting the uploaded object into
//! a snapshot through an asynchronous import task, and registering a
//! bootable machine image on top of that snapshot.

pub mod convert;
#[cfg(feature = "compute-ec2")]
pub mod ec2;
pub mod register;
pub mod traits;

// Re-export commonly used types
pub use convert::ConversionPoller;
#[cfg(feature = "compute-ec2")]
pub use ec2::Ec2ImageService;
pub use register::ImageRegistrar;
pub use traits::{ComputeError, ComputeResult, ImageService};
