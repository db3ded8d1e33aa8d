//! Image registrar tests.

mod helpers;

use std::sync::Arc;
use std::time::Duration;

use amipush_compute::{ComputeError, ImageRegistrar};
use amipush_core::{BootMode, Deadline, PublishError, RegistrationOptions};
use helpers::MockImageService;

fn registrar(service: Arc<MockImageService>) -> ImageRegistrar {
    ImageRegistrar::new(service, Deadline::after(Duration::from_secs(600)))
}

#[tokio::test]
async fn test_register_legacy_image() {
    let service = Arc::new(MockImageService::default());
    let options = RegistrationOptions::from_flags(false, false, true, "simple");

    let image_id = registrar(service.clone())
        .register("file", "amipush: file image".to_string(), "snap-1", &options)
        .await
        .unwrap();

    assert_eq!(image_id, "ami-1");
    let registrations = service.registrations.lock().unwrap();
    assert_eq!(registrations.len(), 1);
    let request = &registrations[0];
    assert_eq!(request.name, "file");
    assert_eq!(request.snapshot_id, "snap-1");
    assert_eq!(request.architecture, "x86_64");
    assert_eq!(request.root_device_name, "/dev/sda1");
    assert!(request.delete_on_termination);
    assert_eq!(request.boot_mode, BootMode::Legacy);
    assert_eq!(request.tpm_support, None);
    assert!(request.ena_support);
    assert_eq!(request.sriov_net_support.as_deref(), Some("simple"));
}

#[tokio::test]
async fn test_register_uefi_with_tpm() {
    let service = Arc::new(MockImageService::default());
    let options = RegistrationOptions::from_flags(true, true, false, "");

    registrar(service.clone())
        .register("file", "d".to_string(), "snap-1", &options)
        .await
        .unwrap();

    let request = &service.registrations.lock().unwrap()[0];
    assert_eq!(request.boot_mode, BootMode::Uefi);
    assert_eq!(request.tpm_support.as_deref(), Some("v2.0"));
    assert_eq!(request.sriov_net_support, None);
    assert!(!request.ena_support);
}

#[tokio::test]
async fn test_tpm_without_uefi_rejected_before_network() {
    let service = Arc::new(MockImageService::default());
    let options = RegistrationOptions::from_flags(false, true, false, "");

    let err = registrar(service.clone())
        .register("file", "d".to_string(), "snap-1", &options)
        .await
        .unwrap_err();

    assert!(matches!(err, PublishError::Config(_)));
    assert!(service.registrations.lock().unwrap().is_empty());
}

#[tokio::test]
async fn test_remote_error_is_verbatim() {
    let service = Arc::new(MockImageService::default());
    *service.register_response.lock().unwrap() = Some(Err(ComputeError::RequestFailed(
        "ResourceLimitExceeded: You have reached your quota of 5000 AMIs".to_string(),
    )));

    let err = registrar(service.clone())
        .register(
            "file",
            "d".to_string(),
            "snap-1",
            &RegistrationOptions::default(),
        )
        .await
        .unwrap_err();

    assert_eq!(
        err.to_string(),
        "Error registering the image: file; ResourceLimitExceeded: You have reached your quota of 5000 AMIs"
    );
    // No retry
    assert_eq!(service.registrations.lock().unwrap().len(), 1);
}

#[tokio::test]
async fn test_missing_image_id_is_inconsistent() {
    let service = Arc::new(MockImageService::default());
    *service.register_response.lock().unwrap() = Some(Err(ComputeError::MissingField("ImageId")));

    let err = registrar(service)
        .register(
            "file",
            "d".to_string(),
            "snap-1",
            &RegistrationOptions::default(),
        )
        .await
        .unwrap_err();
    assert!(matches!(err, PublishError::RemoteInconsistency(_)));
}
