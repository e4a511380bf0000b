use pretty_assertions::assert_eq;
use std::time::Duration;
use tasksync_engine::{EngineConfig, Session, SessionFile, SyncError};
use tasksync_types::{Collection, TenantId};
use tempfile::TempDir;

fn session(id: &str) -> Session {
    Session::new(TenantId::new(id).unwrap())
}

// --- Session ---

#[test]
fn session_scopes_paths_to_tenant() {
    let s = session("u1");
    assert_eq!(s.path(Collection::Tasks).to_string(), "users/u1/Tasks");
    assert_eq!(s.path(Collection::TaskTags).to_string(), "users/u1/TasksTag");
}

#[test]
fn save_load_and_clear() {
    let dir = TempDir::new().unwrap();
    let file = SessionFile::new(dir.path().join("nested").join("auth.json"));

    assert!(file.load().unwrap().is_none());
    file.save(&session("u1")).unwrap();
    assert_eq!(file.load().unwrap(), Some(session("u1")));

    file.clear().unwrap();
    assert!(file.load().unwrap().is_none());
    // Clearing twice is fine.
    file.clear().unwrap();
}

#[test]
fn session_file_uses_user_id_key() {
    let dir = TempDir::new().unwrap();
    let file = SessionFile::new(dir.path().join("auth.json"));
    file.save(&session("abc")).unwrap();

    let raw = std::fs::read_to_string(file.path()).unwrap();
    let json: serde_json::Value = serde_json::from_str(&raw).unwrap();
    assert_eq!(json, serde_json::json!({ "UserId": "abc" }));
}

#[test]
fn blank_user_id_means_signed_out() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("auth.json");
    std::fs::write(&path, r#"{"UserId":"  "}"#).unwrap();

    assert!(SessionFile::new(path).load().unwrap().is_none());
}

#[test]
fn user_id_with_path_segments_means_signed_out() {
    let dir = TempDir::new().unwrap();
    for raw in [r#"{"UserId":"u1/Tasks"}"#, r#"{"UserId":".."}"#] {
        let path = dir.path().join("auth.json");
        std::fs::write(&path, raw).unwrap();
        assert!(SessionFile::new(path).load().unwrap().is_none(), "{raw}");
    }
}

#[test]
fn corrupt_session_file_is_an_error() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("auth.json");
    std::fs::write(&path, "not json").unwrap();

    let err = SessionFile::new(path).load().unwrap_err();
    assert!(matches!(err, SyncError::Serialization(_)));
}

// --- Config ---

#[test]
fn config_defaults() {
    let config = EngineConfig::default();
    assert_eq!(config.database_path.to_str(), Some("TaskBase.db"));
    assert_eq!(config.session_path.to_str(), Some("auth.json"));
    assert_eq!(config.remote_deadline(), Duration::from_secs(10));
    assert_eq!(config.notice_capacity, 64);
}

#[test]
fn config_file_fills_missing_fields() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("tasksync.json");
    std::fs::write(
        &path,
        r#"{"remote_deadline_ms": 500, "remote": {"project_id": "p1"}}"#,
    )
    .unwrap();

    let config = EngineConfig::load(&path).unwrap();
    assert_eq!(config.remote_deadline(), Duration::from_millis(500));
    assert_eq!(config.remote.project_id, "p1");
    assert_eq!(config.remote.database_id, "(default)");
    assert_eq!(config.database_path.to_str(), Some("TaskBase.db"));
}

#[test]
fn missing_config_file_is_io_error() {
    let dir = TempDir::new().unwrap();
    let err = EngineConfig::load(dir.path().join("absent.json")).unwrap_err();
    assert!(matches!(err, SyncError::Io(_)));
    assert!(!err.is_fatal());
}

#[test]
fn tracing_init_is_idempotent() {
    tasksync_engine::init_tracing();
    tasksync_engine::init_tracing();
}
