//! Plugin command tests that do not need camera hardware.

#[cfg(feature = "plugin")]
mod commands_session_tests {
    use crabshot::commands::session::{
        capture_photo, create_camera_session, dispose_camera_session, get_camera_session_state,
        get_last_capture, switch_camera,
    };
    use crabshot::{CrabshotConfig, SessionState};

    #[tokio::test]
    async fn test_unknown_session_is_reported() {
        let result = get_camera_session_state("missing".to_string()).await;
        let error = result.unwrap_err();
        assert!(error.contains("not found"));
        assert!(error.contains("missing"));
    }

    #[tokio::test]
    async fn test_invalid_config_rejected() {
        let mut config = CrabshotConfig::default();
        config.storage.jpeg_quality = 0;
        let result = create_camera_session(Some(config)).await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_session_without_config_uses_defaults() {
        let session_id = create_camera_session(None).await.unwrap();
        assert_eq!(
            get_camera_session_state(session_id.clone()).await,
            Ok(SessionState::Uninitialized)
        );
        dispose_camera_session(session_id).await.unwrap();
    }

    #[tokio::test]
    async fn test_new_session_lifecycle_without_hardware() {
        let session_id = create_camera_session(Some(CrabshotConfig::default()))
            .await
            .unwrap();

        let state = get_camera_session_state(session_id.clone()).await.unwrap();
        assert_eq!(state, SessionState::Uninitialized);

        // Not ready: capture is ignored and nothing is recorded.
        assert_eq!(capture_photo(session_id.clone()).await, Ok(None));
        assert_eq!(get_last_capture(session_id.clone()).await, Ok(None));

        // Nothing enumerated yet, so there is nothing to switch to.
        assert!(switch_camera(session_id.clone()).await.is_err());

        dispose_camera_session(session_id.clone()).await.unwrap();
        assert!(get_camera_session_state(session_id.clone()).await.is_err());

        // Disposing twice is harmless.
        assert!(dispose_camera_session(session_id).await.is_ok());
    }
}
