#[cfg(test)]
mod error_tests {
    use camera_preview::errors::{OpenFailureCause, PreviewError};
    use camera_preview::types::FacingDirection;
    use std::error::Error;

    #[test]
    fn test_platform_error_codes() {
        assert_eq!(OpenFailureCause::from_platform_code(1), OpenFailureCause::Busy);
        assert_eq!(OpenFailureCause::from_platform_code(2), OpenFailureCause::TooManyOpen);
        assert_eq!(OpenFailureCause::from_platform_code(3), OpenFailureCause::Disabled);
        assert_eq!(OpenFailureCause::from_platform_code(4), OpenFailureCause::FatalDevice);
        assert_eq!(OpenFailureCause::from_platform_code(5), OpenFailureCause::FatalService);
        assert_eq!(OpenFailureCause::from_platform_code(0), OpenFailureCause::Unknown);
        assert_eq!(OpenFailureCause::from_platform_code(-7), OpenFailureCause::Unknown);
    }

    #[test]
    fn test_open_failure_messages() {
        assert_eq!(OpenFailureCause::Busy.to_string(), "Camera in use");
        assert_eq!(OpenFailureCause::TooManyOpen.to_string(), "Maximum cameras in use");
        assert_eq!(OpenFailureCause::Disabled.to_string(), "Device policy");
        assert_eq!(OpenFailureCause::FatalDevice.to_string(), "Fatal (device)");
        assert_eq!(OpenFailureCause::FatalService.to_string(), "Fatal (service)");
        assert_eq!(OpenFailureCause::Unknown.to_string(), "Unknown");
    }

    #[test]
    fn test_device_open_failed_display() {
        let error = PreviewError::DeviceOpenFailed {
            camera_id: "1".to_string(),
            cause: OpenFailureCause::Busy,
        };
        assert_eq!(error.to_string(), "Camera 1 error: Camera in use");
        assert_eq!(error.user_message(), "Camera is in use by another application");
    }

    #[test]
    fn test_not_found_names_direction() {
        let error = PreviewError::NotFound(FacingDirection::Front);
        assert!(error.to_string().contains("front"));
        assert_eq!(error.user_message(), "No camera available");
    }

    #[test]
    fn test_error_implements_error_trait() {
        let error = PreviewError::SessionConfigFailed("rejected".to_string());
        let _error_trait: &dyn Error = &error;
        assert!(error.source().is_none());
        assert!(error.to_string().contains("rejected"));
    }

    #[test]
    fn test_all_error_variants_display() {
        let errors = vec![
            PreviewError::PermissionDenied,
            PreviewError::CatalogError("registry".to_string()),
            PreviewError::NotFound(FacingDirection::Back),
            PreviewError::DeviceOpenFailed {
                camera_id: "0".to_string(),
                cause: OpenFailureCause::FatalService,
            },
            PreviewError::SessionConfigFailed("session".to_string()),
            PreviewError::AlreadyOpening("0".to_string()),
            PreviewError::InvalidInput("input".to_string()),
            PreviewError::Surface("surface".to_string()),
            PreviewError::Cancelled("0".to_string()),
            PreviewError::CoordinatorClosed,
            PreviewError::NotSupported("platform".to_string()),
            PreviewError::Config("config".to_string()),
        ];

        for error in errors {
            assert!(!error.to_string().is_empty());
            assert!(!error.user_message().is_empty());
        }
    }

    #[test]
    fn test_error_serialization() {
        let error = PreviewError::DeviceOpenFailed {
            camera_id: "0".to_string(),
            cause: OpenFailureCause::Disabled,
        };
        let json = serde_json::to_string(&error).unwrap();
        assert!(json.contains("DeviceOpenFailed"));
        let back: PreviewError = serde_json::from_str(&json).unwrap();
        assert_eq!(back, error);
    }
}
