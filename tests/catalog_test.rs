use camera_preview::catalog::CameraCatalog;
use camera_preview::errors::PreviewError;
use camera_preview::testing::{SimulatedBackend, SimulatedCamera};
use camera_preview::types::{CameraIdentity, FacingDirection, OutputFormat, Resolution};
use std::sync::Arc;

fn sizes() -> Vec<Resolution> {
    vec![Resolution::new(1920, 1080), Resolution::new(640, 480)]
}

#[test]
fn test_find_camera_returns_first_match() {
    let backend = SimulatedBackend::new(vec![
        SimulatedCamera::new("5", FacingDirection::Front, sizes()),
        SimulatedCamera::new("2", FacingDirection::Back, vec![Resolution::new(4032, 3024)]),
        SimulatedCamera::new("3", FacingDirection::Back, sizes()),
    ]);
    let catalog = CameraCatalog::new(Arc::new(backend));

    let found = catalog.find_camera(FacingDirection::Back).unwrap();
    assert_eq!(found.camera, CameraIdentity::new("2", FacingDirection::Back));
    assert_eq!(found.sizes, vec![Resolution::new(4032, 3024)]);

    let front = catalog.find_camera(FacingDirection::Front).unwrap();
    assert_eq!(front.camera.id, "5");
}

#[test]
fn test_find_camera_not_found() {
    let backend = SimulatedBackend::new(vec![SimulatedCamera::new(
        "0",
        FacingDirection::Back,
        sizes(),
    )]);
    let catalog = CameraCatalog::new(Arc::new(backend));

    let result = catalog.find_camera(FacingDirection::Front);
    assert_eq!(result, Err(PreviewError::NotFound(FacingDirection::Front)));
}

#[test]
fn test_find_camera_skips_external_cameras() {
    let backend = SimulatedBackend::new(vec![
        SimulatedCamera::external("usb0", sizes()),
        SimulatedCamera::new("1", FacingDirection::Back, sizes()),
    ]);
    let catalog = CameraCatalog::new(Arc::new(backend));

    assert_eq!(catalog.find_camera(FacingDirection::Back).unwrap().camera.id, "1");
    assert_eq!(
        catalog.list_cameras().unwrap(),
        vec![CameraIdentity::new("1", FacingDirection::Back)]
    );
}

#[test]
fn test_registry_failure_is_catalog_error() {
    let backend = SimulatedBackend::phone();
    backend.fail_registry("camera service unavailable");
    let catalog = CameraCatalog::new(Arc::new(backend));

    match catalog.find_camera(FacingDirection::Back) {
        Err(PreviewError::CatalogError(message)) => {
            assert!(message.contains("camera service unavailable"))
        }
        other => panic!("expected catalog error, got {:?}", other),
    }
    assert!(matches!(
        catalog.list_cameras(),
        Err(PreviewError::CatalogError(_))
    ));
}

#[test]
fn test_empty_registry_is_not_found() {
    let catalog = CameraCatalog::new(Arc::new(SimulatedBackend::new(Vec::new())));
    assert_eq!(
        catalog.find_camera(FacingDirection::Back),
        Err(PreviewError::NotFound(FacingDirection::Back))
    );
    assert!(catalog.list_cameras().unwrap().is_empty());
}

#[test]
fn test_list_cameras_in_registry_order() {
    let catalog = CameraCatalog::with_format(Arc::new(SimulatedBackend::phone()), OutputFormat::Yuv420);
    assert_eq!(catalog.format(), OutputFormat::Yuv420);
    assert_eq!(
        catalog.list_cameras().unwrap(),
        vec![
            CameraIdentity::new("0", FacingDirection::Back),
            CameraIdentity::new("1", FacingDirection::Front),
        ]
    );
}
