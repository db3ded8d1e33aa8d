//! Machine image registration

use std::sync::Arc;

use amipush_core::{
    Deadline, Phase, PublishError, PublishResult, RegistrationOptions, RegistrationRequest,
};

use crate::traits::{ComputeError, ImageService};

pub struct ImageRegistrar {
    service: Arc<dyn ImageService>,
    deadline: Deadline,
}

impl ImageRegistrar {
    pub fn new(service: Arc<dyn ImageService>, deadline: Deadline) -> Self {
        Self { service, deadline }
    }

    /// Register `name` as a bootable image backed by `snapshot_id`.
    ///
    /// Options are validated before anything is sent. The call is made once
    /// and never retried, since a second success would create a duplicate
    /// image.
    pub async fn register(
        &self,
        name: &str,
        description: String,
        snapshot_id: &str,
        options: &RegistrationOptions,
    ) -> PublishResult<String> {
        options.validate()?;

        let request = RegistrationRequest::new(name, description, snapshot_id, options);

        let image_id = self
            .deadline
            .run(Phase::Register, self.service.register_image(&request))
            .await?
            .map_err(|e| match e {
                ComputeError::MissingField(field) => PublishError::RemoteInconsistency(format!(
                    "{} missing from RegisterImage response",
                    field
                )),
                ComputeError::RequestFailed(message) => PublishError::Registration {
                    name: name.to_string(),
                    message,
                },
            })?;

        tracing::info!(
            image_id = %image_id,
            name,
            boot_mode = %options.boot_mode,
            "Created AMI"
        );
        Ok(image_id)
    }
}
