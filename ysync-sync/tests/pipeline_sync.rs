#![cfg(unix)]

use std::fs;
use std::path::Path;

use tempfile::TempDir;
use ysync_core::{config, ChangeKind, Credentials};
use ysync_sync::{
    classify::AUTH_MESSAGE,
    pipeline::{self, SyncOptions, Workspace},
    store, SyncError,
};

/// Fake sync tool: copies `source/` into the output dir, fails when
/// `fail.flag` exists, and records `clean` calls in `clean.log`.
const FAKE_TOOL: &str = r#"#!/bin/sh
case "$1" in
  clean)
    echo cleaned >> clean.log
    if [ -f clean-fail.flag ]; then echo "Error: cache locked" >&2; exit 1; fi
    ;;
  sync)
    if [ "$2" != "--env" ] || [ ! -f "$3" ]; then echo "Error: bad env arg" >&2; exit 9; fi
    if [ -f fail.flag ]; then echo "Error: 401 Unauthorized" >&2; exit 1; fi
    mkdir -p content/yuque
    cp -R source/. content/yuque/
    echo "synced"
    ;;
  *)
    echo "fake 1.0.0"
    ;;
esac
"#;

fn setup() -> TempDir {
    let _ = env_logger::builder().is_test(true).try_init();
    let ws = TempDir::new().expect("workspace");
    let tool = ws.path().join("fake-elog.sh");
    fs::write(&tool, FAKE_TOOL).expect("write tool");

    let mut settings = config::load_at(ws.path()).expect("settings");
    settings.tool.program = "sh".to_string();
    settings.tool.args = vec![tool.display().to_string()];
    settings.tool.timeout_secs = 30;
    config::save_at(ws.path(), &settings).expect("save settings");

    config::write_credentials(
        &ws.path().join(".elog.env"),
        &Credentials {
            token: "t".to_string(),
            login: "me".to_string(),
            repo: "blog".to_string(),
            host: None,
        },
    )
    .expect("credentials");
    fs::create_dir_all(ws.path().join("source")).expect("source dir");
    ws
}

fn source_doc(ws: &Path, name: &str, title: &str, updated: &str) {
    fs::write(
        ws.join("source").join(name),
        format!("---\ntitle: {title}\nupdated: {updated}\n---\nbody text\n"),
    )
    .expect("write source doc");
}

async fn sync(ws: &Path, clean: bool) -> Result<pipeline::SyncOutcome, SyncError> {
    let workspace = Workspace::load(ws).expect("workspace");
    let invoker = workspace.invoker();
    pipeline::run(&workspace, &invoker, SyncOptions { clean }).await
}

#[tokio::test]
async fn first_sync_reports_every_document_as_added() {
    let ws = setup();
    source_doc(ws.path(), "a.md", "Alpha", "2024-01-01");
    source_doc(ws.path(), "b.md", "Beta", "2024-01-01");

    let outcome = sync(ws.path(), false).await.expect("sync");
    assert!(outcome.success());
    assert_eq!(outcome.report.summary.added, 2);
    assert_eq!(outcome.report.summary.total, 2);

    let out = ws.path().join("content/yuque");
    let index = store::load_index(&out).expect("load").expect("index");
    assert_eq!(index.total_documents, 2);
    let state = store::load_state(&out).expect("load").expect("state");
    assert!(state.last_sync_success);
    assert_eq!(state.total_documents, 2);
}

#[tokio::test]
async fn resync_without_changes_is_empty() {
    let ws = setup();
    source_doc(ws.path(), "a.md", "Alpha", "2024-01-01");
    sync(ws.path(), false).await.expect("first");

    let outcome = sync(ws.path(), false).await.expect("second");
    assert!(outcome.success());
    assert!(outcome.report.changes.is_empty());
}

#[tokio::test]
async fn updates_and_deletions_are_classified() {
    let ws = setup();
    source_doc(ws.path(), "a.md", "Alpha", "2024-01-01");
    source_doc(ws.path(), "b.md", "Beta", "2024-01-01");
    sync(ws.path(), false).await.expect("first");

    source_doc(ws.path(), "a.md", "Alpha", "2024-03-01");
    fs::remove_file(ws.path().join("source/b.md")).expect("rm source");
    fs::remove_file(ws.path().join("content/yuque/b.md")).expect("rm output");
    source_doc(ws.path(), "c.md", "Gamma", "2024-03-01");

    let outcome = sync(ws.path(), false).await.expect("second");
    let changes: Vec<_> = outcome
        .report
        .changes
        .iter()
        .map(|c| (c.kind, c.title.as_str()))
        .collect();
    assert_eq!(
        changes,
        vec![
            (ChangeKind::Updated, "Alpha"),
            (ChangeKind::Added, "Gamma"),
            (ChangeKind::Deleted, "Beta"),
        ]
    );
}

#[tokio::test]
async fn tool_failure_writes_failed_report_and_keeps_index() {
    let ws = setup();
    source_doc(ws.path(), "a.md", "Alpha", "2024-01-01");
    sync(ws.path(), false).await.expect("first");
    let out = ws.path().join("content/yuque");
    let index_before = fs::read_to_string(out.join("index.json")).expect("index");

    fs::write(ws.path().join("fail.flag"), "").expect("flag");
    source_doc(ws.path(), "b.md", "Beta", "2024-01-01");
    let outcome = sync(ws.path(), false).await.expect("pipeline still returns");

    assert!(!outcome.success());
    assert!(outcome.report.changes.is_empty());
    assert_eq!(outcome.report.summary.total, 1);
    assert_eq!(
        outcome.report.errors,
        Some(vec![AUTH_MESSAGE.to_string()])
    );
    assert_eq!(
        fs::read_to_string(out.join("index.json")).expect("index"),
        index_before
    );

    let state = store::load_state(&out).expect("load").expect("state");
    assert!(!state.last_sync_success);
    let report = store::load_report(&out).expect("load").expect("report");
    assert!(!report.success);
}

#[tokio::test]
async fn missing_credentials_abort_before_any_work() {
    let ws = setup();
    fs::remove_file(ws.path().join(".elog.env")).expect("rm env");

    let err = sync(ws.path(), false).await.unwrap_err();
    assert!(
        matches!(&err, SyncError::Config(e) if e.is_missing_configuration()),
        "got: {err}"
    );
    assert!(!ws.path().join("content/yuque/.sync-state.json").exists());
}

#[tokio::test]
async fn clean_runs_before_sync() {
    let ws = setup();
    source_doc(ws.path(), "a.md", "Alpha", "2024-01-01");

    let outcome = sync(ws.path(), true).await.expect("sync");
    assert!(outcome.success());
    assert!(ws.path().join("clean.log").exists());
}

#[tokio::test]
async fn failed_clean_skips_sync() {
    let ws = setup();
    source_doc(ws.path(), "a.md", "Alpha", "2024-01-01");
    fs::write(ws.path().join("clean-fail.flag"), "").expect("flag");

    let outcome = sync(ws.path(), true).await.expect("pipeline");
    assert!(!outcome.success());
    assert_eq!(
        outcome.report.errors,
        Some(vec!["Error: cache locked".to_string()])
    );
    assert!(!ws.path().join("content/yuque/a.md").exists());
}

#[tokio::test]
async fn missing_tool_binary_is_a_failed_run() {
    let ws = setup();
    let mut settings = config::load_at(ws.path()).expect("settings");
    settings.tool.program = "ysync-missing-tool-binary".to_string();
    settings.tool.args.clear();
    config::save_at(ws.path(), &settings).expect("save");

    let outcome = sync(ws.path(), false).await.expect("pipeline");
    assert!(!outcome.success());
    let errors = outcome.report.errors.expect("errors");
    assert!(errors[0].contains("failed to start"), "got: {errors:?}");
}
