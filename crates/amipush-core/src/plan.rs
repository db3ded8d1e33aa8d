//! Upload planning
//!
//! Decides between a single PUT and a multipart upload and splits the object
//! into contiguous byte ranges.

use crate::constants::MAX_MULTIPART_PARTS;
use crate::models::{PartDescriptor, UploadStrategy};

/// Strategy plus, for multipart uploads, the ordered parts to send
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadPlan {
    pub strategy: UploadStrategy,
    pub parts: Vec<PartDescriptor>,
}

/// Number of `part_size` parts needed to cover `total_size` bytes
pub fn part_count(total_size: u64, part_size: u64) -> u64 {
    total_size.div_ceil(part_size)
}

/// Plan the upload of `total_size` bytes.
///
/// Objects of at most `min_multipart_threshold` bytes use [`UploadStrategy::Simple`]
/// and get no parts. Larger objects are cut into `part_size` pieces, the last
/// one possibly shorter.
///
/// `part_size` must be non-zero and a multipart plan must need at most
/// [`MAX_MULTIPART_PARTS`] parts; [`UploadSettings::plan_for`] checks both
/// before calling this.
///
/// [`UploadSettings::plan_for`]: crate::config::UploadSettings::plan_for
pub fn plan(total_size: u64, min_multipart_threshold: u64, part_size: u64) -> UploadPlan {
    if total_size <= min_multipart_threshold {
        return UploadPlan {
            strategy: UploadStrategy::Simple,
            parts: Vec::new(),
        };
    }

    let count = part_count(total_size, part_size);
    debug_assert!(
        count <= MAX_MULTIPART_PARTS,
        "{} parts exceeds the multipart limit",
        count
    );

    let parts = (0..count)
        .map(|i| {
            let offset = i * part_size;
            PartDescriptor {
                // count <= MAX_MULTIPART_PARTS, so this fits
                part_number: (i + 1) as i32,
                offset,
                length: part_size.min(total_size - offset),
            }
        })
        .collect();

    UploadPlan {
        strategy: UploadStrategy::Multipart,
        parts,
    }
}
