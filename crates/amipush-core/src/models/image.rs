use crate::config::{BootMode, RegistrationOptions};
use crate::constants::{
    IMAGE_ARCHITECTURE, ROOT_DEVICE_NAME, ROOT_VOLUME_TYPE, TPM_VERSION, VIRTUALIZATION_TYPE,
};

/// Machine image registration, built once and submitted once
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegistrationRequest {
    pub name: String,
    pub description: String,
    pub architecture: String,
    pub root_device_name: String,
    pub snapshot_id: String,
    pub volume_type: String,
    pub delete_on_termination: bool,
    pub virtualization_type: String,
    pub boot_mode: BootMode,
    /// TPM version, only set for UEFI images
    pub tpm_support: Option<String>,
    pub ena_support: bool,
    pub sriov_net_support: Option<String>,
}

impl RegistrationRequest {
    /// Build the request for a single root volume backed by `snapshot_id`.
    ///
    /// `options` must already be validated.
    pub fn new(
        name: &str,
        description: String,
        snapshot_id: &str,
        options: &RegistrationOptions,
    ) -> Self {
        let tpm_support = match options.boot_mode {
            BootMode::Uefi if options.tpm => Some(TPM_VERSION.to_string()),
            _ => None,
        };

        Self {
            name: name.to_string(),
            description,
            architecture: IMAGE_ARCHITECTURE.to_string(),
            root_device_name: ROOT_DEVICE_NAME.to_string(),
            snapshot_id: snapshot_id.to_string(),
            volume_type: ROOT_VOLUME_TYPE.to_string(),
            delete_on_termination: true,
            virtualization_type: VIRTUALIZATION_TYPE.to_string(),
            boot_mode: options.boot_mode,
            tpm_support,
            ena_support: options.ena,
            sriov_net_support: options.sriov_net_support.clone(),
        }
    }
}
