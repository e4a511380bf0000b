use tasksync_remote::{RemoteConfig, RemoteError};

#[test]
fn default_targets_public_firestore() {
    let config = RemoteConfig::default();
    assert_eq!(config.base_url, "https://firestore.googleapis.com");
    assert_eq!(config.database_id, "(default)");
    assert_eq!(config.probe_url, "http://www.google.com");
}

#[test]
fn documents_root_trims_trailing_slash() {
    let config = RemoteConfig {
        base_url: "http://localhost:8080/".into(),
        project_id: "demo".into(),
        ..RemoteConfig::default()
    };
    assert_eq!(
        config.documents_root(),
        "http://localhost:8080/v1/projects/demo/databases/(default)/documents"
    );
}

#[test]
fn partial_json_takes_defaults() {
    let config: RemoteConfig =
        serde_json::from_str(r#"{"project_id": "todo-app", "page_size": 50}"#).unwrap();
    assert_eq!(config.project_id, "todo-app");
    assert_eq!(config.page_size, 50);
    assert_eq!(config.request_timeout_secs, 30);
    assert_eq!(config.probe_timeout_ms, 3_000);
}

#[test]
fn serialization_roundtrip() {
    let config = RemoteConfig {
        project_id: "p".into(),
        ..RemoteConfig::default()
    };
    let json = serde_json::to_string(&config).unwrap();
    let back: RemoteConfig = serde_json::from_str(&json).unwrap();
    assert_eq!(back, config);
}

// --- Errors ---

#[test]
fn error_display() {
    assert_eq!(
        RemoteError::NotFound("users/u1/Tasks/x".into()).to_string(),
        "document not found: users/u1/Tasks/x"
    );
    assert_eq!(
        RemoteError::Status { status: 500, message: "boom".into() }.to_string(),
        "remote returned 500: boom"
    );
    assert_eq!(
        RemoteError::Timeout("add after 10000 ms".into()).to_string(),
        "remote operation timed out: add after 10000 ms"
    );
}

#[test]
fn only_transport_failures_are_connectivity() {
    assert!(RemoteError::Timeout("x".into()).is_connectivity());
    assert!(RemoteError::Status { status: 503, message: String::new() }.is_connectivity());
    assert!(!RemoteError::NotFound("x".into()).is_connectivity());
    assert!(!RemoteError::PermissionDenied("x".into()).is_connectivity());
    assert!(!RemoteError::InvalidDocument("x".into()).is_connectivity());
}
