//! Data models for the publish workflow
//!
//! Each sub-module holds the values exchanged by one stage of the pipeline.

mod image;
mod import;
mod upload;

pub use image::*;
pub use import::*;
pub use upload::*;
