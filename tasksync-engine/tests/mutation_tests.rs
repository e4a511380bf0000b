mod support;

use pretty_assertions::assert_eq;
use std::sync::atomic::Ordering;
use support::*;
use tasksync_engine::{Notice, SyncError};
use tasksync_types::{Collection, FieldValue, LocalId, RemoteId, SyncState};

// ── Create / search ──────────────────────────────────────────────

#[tokio::test]
async fn offline_create_is_pending_and_searchable() {
    let h = Harness::new(false);
    let task = h.engine.create_task("Buy milk", "").await.unwrap();

    let rows = h.local.get_tasks().unwrap();
    assert_eq!(rows.len(), 1);
    assert!(rows[0].remote_id().is_none());
    assert_eq!(rows[0].identity.local(), task.identity.local());

    let hits = h.engine.search("buy").await.unwrap();
    assert_eq!(hits.len(), 1);
    assert_eq!(hits[0].title, "Buy milk");
    assert!(h.engine.search("xyz").await.unwrap().is_empty());
    assert!(h.engine.search("milk").await.unwrap().is_empty());
    assert_eq!(h.remote.calls.total(), 0);
}

#[tokio::test]
async fn blank_search_reloads_full_set() {
    let h = Harness::new(true);
    h.remote.seed(Collection::Tasks, "r1", task_fields("Alpha", &[]));
    h.remote.seed(Collection::Tasks, "r2", task_fields("Beta", &[]));

    let all = h.engine.search("   ").await.unwrap();
    assert_eq!(all.len(), 2);
    assert_eq!(h.remote.calls.list.load(Ordering::SeqCst), 2);
    assert_eq!(h.engine.search("al").await.unwrap().len(), 1);
}

#[tokio::test]
async fn online_create_gets_remote_identity_immediately() {
    let h = Harness::new(true);
    let task = h.engine.create_task("Write report", "").await.unwrap();

    let remote = task.remote_id().cloned().unwrap();
    assert_eq!(task.identity.state(), SyncState::Synced);
    assert!(h.remote.doc(Collection::Tasks, &remote).is_some());
    assert!(h.local.get_pending_sync_tasks().unwrap().is_empty());
}

#[tokio::test]
async fn online_create_keeps_task_pending_when_remote_unreachable() {
    let h = Harness::new(true);
    h.remote.unreachable.store(true, Ordering::SeqCst);

    let task = h.engine.create_task("Buy milk", "").await.unwrap();
    assert!(task.is_pending());
    assert_eq!(h.local.get_pending_sync_tasks().unwrap().len(), 1);
}

#[tokio::test]
async fn online_create_rejected_by_remote_is_not_saved() {
    let mut h = Harness::new(true);
    h.remote.fail_add_titles.lock().unwrap().insert("nope".into());

    let err = h.engine.create_task("nope", "").await.unwrap_err();
    assert!(matches!(err, SyncError::Remote(_)));
    assert_eq!(h.local.counts().unwrap().tasks, 0);
    assert!(h.engine.tasks().await.is_empty());
    assert!(matches!(
        h.drain_notices().as_slice(),
        [Notice::OperationFailed { operation: "create task", .. }]
    ));
}

#[tokio::test]
async fn blank_title_is_rejected_before_any_store_call() {
    let h = Harness::new(true);
    let err = h.engine.create_task("  ", "").await.unwrap_err();
    assert!(matches!(err, SyncError::Types(_)));
    assert_eq!(h.remote.calls.total(), 0);
}

// ── Update ───────────────────────────────────────────────────────

#[tokio::test]
async fn online_update_merges_only_edited_fields() {
    let h = Harness::new(true);
    let mut fields = task_fields("Old", &["g1"]);
    fields.insert("IsDone".into(), true.into());
    h.remote.seed(Collection::Tasks, "r1", fields);
    h.engine.load().await.unwrap();
    let id = LocalId::new("r1");

    let task = h.engine.update_task(&id, "New", "more").await.unwrap();
    assert_eq!(task.identity.state(), SyncState::Synced);

    let doc = h.remote.doc(Collection::Tasks, &RemoteId::new("r1")).unwrap();
    assert_eq!(doc["Title"], FieldValue::from("New"));
    assert_eq!(doc["Description"], FieldValue::from("more"));
    assert_eq!(doc["IsDone"], FieldValue::Boolean(true));
    assert_eq!(doc["TagIds"], FieldValue::array([FieldValue::from("g1")]));
    assert_eq!(h.engine.tasks().await[0].title, "New");
}

#[tokio::test]
async fn update_of_unknown_task_is_not_found() {
    let h = Harness::new(false);
    let err = h
        .engine
        .update_task(&LocalId::new("missing"), "t", "")
        .await
        .unwrap_err();
    assert!(matches!(err, SyncError::NotFound(_)));
}

// ── Toggle complete ──────────────────────────────────────────────

#[tokio::test]
async fn toggle_on_vanished_document_reverts() {
    let mut h = Harness::new(true);
    h.remote.seed(Collection::Tasks, "r1", task_fields("Report", &[]));
    h.engine.load().await.unwrap();
    let id = LocalId::new("r1");

    h.remote.remove(Collection::Tasks, &RemoteId::new("r1"));
    let err = h.engine.set_complete(&id, true).await.unwrap_err();

    assert!(matches!(err, SyncError::DocumentVanished(_)));
    assert!(!h.engine.tasks().await[0].is_complete);
    assert!(!h.local.get_task(&id).unwrap().unwrap().is_complete);
    assert_eq!(h.remote.calls.update_field.load(Ordering::SeqCst), 0);
    assert_eq!(
        h.drain_notices(),
        vec![Notice::DocumentVanished { task_id: id }]
    );
}

#[tokio::test]
async fn toggle_online_writes_completion_field() {
    let h = Harness::new(true);
    h.remote.seed(Collection::Tasks, "r1", task_fields("Report", &[]));
    h.engine.load().await.unwrap();
    let id = LocalId::new("r1");

    let task = h.engine.set_complete(&id, true).await.unwrap();
    assert!(task.is_complete);
    assert_eq!(task.identity.state(), SyncState::Synced);
    assert_eq!(h.remote.calls.get.load(Ordering::SeqCst), 1);
    let doc = h.remote.doc(Collection::Tasks, &RemoteId::new("r1")).unwrap();
    assert_eq!(doc["IsDone"], FieldValue::Boolean(true));
    assert!(h.engine.tasks().await[0].is_complete);

    h.engine.set_complete(&id, false).await.unwrap();
    let doc = h.remote.doc(Collection::Tasks, &RemoteId::new("r1")).unwrap();
    assert_eq!(doc["IsDone"], FieldValue::Boolean(false));
}

#[tokio::test]
async fn toggle_failure_reverts_working_flag() {
    let h = Harness::new(true);
    h.remote.seed(Collection::Tasks, "r1", task_fields("Report", &[]));
    h.engine.load().await.unwrap();

    h.remote.unreachable.store(true, Ordering::SeqCst);
    let err = h
        .engine
        .set_complete(&LocalId::new("r1"), true)
        .await
        .unwrap_err();
    assert!(err.is_connectivity());
    assert!(!h.engine.tasks().await[0].is_complete);
}

#[tokio::test]
async fn toggle_of_pending_task_is_local_only() {
    let h = Harness::new(false);
    let task = h.engine.create_task("Buy milk", "").await.unwrap();

    h.set_online(true);
    let updated = h.engine.set_complete(task.identity.local(), true).await.unwrap();
    assert!(updated.is_complete);
    assert!(updated.is_pending());
    assert_eq!(h.remote.calls.total(), 0);
}

// ── Delete ───────────────────────────────────────────────────────

#[tokio::test]
async fn online_delete_removes_documents_rows_and_links() {
    let h = Harness::new(true);
    h.remote.seed(Collection::Tasks, "task1", task_fields("Report", &["tag1"]));
    h.remote.seed(Collection::Tags, "tag1", tag_fields("urgent"));
    h.remote.seed(
        Collection::TaskTags,
        "task1_tag1",
        tasksync_types::TaskTagLink::new(RemoteId::new("task1"), RemoteId::new("tag1"))
            .to_fields(),
    );
    h.engine.load().await.unwrap();
    assert_eq!(h.local.counts().unwrap().links, 1);

    h.engine.delete_task(&LocalId::new("task1")).await.unwrap();

    assert_eq!(h.remote.count(Collection::Tasks), 0);
    assert_eq!(h.remote.count(Collection::TaskTags), 0);
    let counts = h.local.counts().unwrap();
    assert_eq!(counts.tasks, 0);
    assert_eq!(counts.links, 0);
    assert_eq!(counts.pending_deletes, 0);
    assert!(h.engine.tasks().await.is_empty());
}

#[tokio::test]
async fn deleting_pending_task_never_touches_remote() {
    let h = Harness::new(false);
    let task = h.engine.create_task("draft", "").await.unwrap();

    h.set_online(true);
    h.engine.delete_task(task.identity.local()).await.unwrap();
    assert_eq!(h.remote.calls.total(), 0);
    assert_eq!(h.local.counts().unwrap().tasks, 0);
}

// ── Tags ─────────────────────────────────────────────────────────

#[tokio::test]
async fn assigning_same_tag_twice_is_a_no_op() {
    let h = Harness::new(true);
    h.remote.seed(Collection::Tasks, "task1", task_fields("Report", &[]));
    h.remote.seed(Collection::Tags, "tag1", tag_fields("urgent"));
    h.engine.load().await.unwrap();
    let task = LocalId::new("task1");
    let tag = LocalId::new("tag1");

    assert!(h.engine.assign_tag(&task, &tag).await.unwrap());
    assert!(!h.engine.assign_tag(&task, &tag).await.unwrap());

    let links = h.local.get_task_tags(&RemoteId::new("task1")).unwrap();
    assert_eq!(links.len(), 1);
    assert!(links[0].synced);
    assert_eq!(h.remote.count(Collection::TaskTags), 1);
    assert_eq!(h.remote.calls.set_merge.load(Ordering::SeqCst), 1);
    let doc = h.remote.doc(Collection::Tasks, &RemoteId::new("task1")).unwrap();
    assert_eq!(doc["TagIds"], FieldValue::array([FieldValue::from("tag1")]));

    let tagged = h.engine.tasks_with_tag(&RemoteId::new("tag1")).await;
    assert_eq!(tagged.len(), 1);
    assert!(h.engine.tasks_with_tag(&RemoteId::new("other")).await.is_empty());
}

#[tokio::test]
async fn assigning_to_pending_task_is_refused() {
    let h = Harness::new(false);
    let task = h.engine.create_task("draft", "").await.unwrap();
    let tag = h.engine.create_tag("home").await.unwrap();

    let err = h
        .engine
        .assign_tag(task.identity.local(), tag.identity.local())
        .await
        .unwrap_err();
    assert!(matches!(err, SyncError::NotSynced(_)));
    assert_eq!(h.local.counts().unwrap().links, 0);
}

#[tokio::test]
async fn online_create_and_rename_tag() {
    let h = Harness::new(true);
    let tag = h.engine.create_tag("hom").await.unwrap();
    let remote = tag.remote_id().cloned().unwrap();

    let renamed = h.engine.rename_tag(tag.identity.local(), "home").await.unwrap();
    assert_eq!(renamed.name, "home");
    assert_eq!(
        h.remote.doc(Collection::Tags, &remote).unwrap()["Name"],
        FieldValue::from("home")
    );
    assert_eq!(h.engine.tags().await[0].name, "home");
}

#[tokio::test]
async fn offline_rename_marks_tag_modified() {
    let h = Harness::new(true);
    h.remote.seed(Collection::Tags, "g1", tag_fields("old"));
    h.engine.load().await.unwrap();

    h.set_online(false);
    let tag = h.engine.rename_tag(&LocalId::new("g1"), "new").await.unwrap();
    assert_eq!(tag.identity.state(), SyncState::Modified);

    h.set_online(true);
    let outcome = h.engine.load().await.unwrap();
    assert_eq!(outcome.push.unwrap().tags_merged, 1);
    assert_eq!(outcome.tags[0].name, "new");
}
