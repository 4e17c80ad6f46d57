use std::fs;
use std::sync::Arc;
use std::time::SystemTime;

use chrono::{DateTime, TimeZone, Utc};
use drift_core::{context, Change, LocalMeta, PathContext, RemoteMeta};
use drift_sync::{
    store::StoreIndex, DirStore, PlanResolver, PullOrchestrator, PullOutcome, SyncError,
};
use tempfile::TempDir;

struct Workspace {
    _root: TempDir,
    _store: TempDir,
    ctx: PathContext,
    store: DirStore,
}

async fn workspace(window: usize) -> Workspace {
    let root = TempDir::new().expect("root");
    let store_dir = TempDir::new().expect("store");
    let ctx = context::init_at(root.path(), store_dir.path().to_path_buf(), Some(window))
        .expect("init");
    let store = DirStore::open(store_dir.path());
    store
        .save_index(&StoreIndex::default())
        .await
        .expect("index");
    Workspace {
        _root: root,
        _store: store_dir,
        ctx,
        store,
    }
}

fn stamp(day: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2022, 6, day, 12, 0, 0).unwrap()
}

fn meta(id: &str, content_ref: &str, mod_time: DateTime<Utc>) -> RemoteMeta {
    RemoteMeta {
        id: id.into(),
        content_ref: content_ref.into(),
        is_dir: false,
        mod_time,
        size: 0,
    }
}

fn write_plan(ws: &Workspace, changes: &[Change]) -> Arc<PlanResolver> {
    let path = ws.ctx.plan_path();
    fs::write(&path, serde_json::to_string_pretty(changes).unwrap()).expect("plan");
    Arc::new(PlanResolver::new(path))
}

fn orchestrator(ws: &Workspace, changes: &[Change]) -> PullOrchestrator {
    PullOrchestrator::new(
        ws.ctx.clone(),
        Arc::new(ws.store.clone()),
        write_plan(ws, changes),
    )
}

fn mtime(path: &std::path::Path) -> SystemTime {
    fs::metadata(path).unwrap().modified().unwrap()
}

#[tokio::test]
async fn scenario_a_five_adds_run_in_windows_of_four_and_one() {
    let ws = workspace(4).await;
    let mut changes = Vec::new();
    for i in 0..5u32 {
        let blob = format!("blob-{i}");
        ws.store
            .put_blob(&blob, format!("body {i}").as_bytes())
            .await
            .unwrap();
        changes.push(Change::add(
            format!("dir{i}/file{i}.txt"),
            meta(&i.to_string(), &blob, stamp(i + 1)),
        ));
    }

    let outcome = orchestrator(&ws, &changes).pull("").await.expect("pull");
    let report = match outcome {
        PullOutcome::Applied(report) => report,
        other => panic!("expected applied, got {other:?}"),
    };
    assert_eq!(report.windows, vec![4, 1]);

    for i in 0..5u32 {
        let path = ws.ctx.resolve(&format!("dir{i}/file{i}.txt")).unwrap();
        assert_eq!(fs::read_to_string(&path).unwrap(), format!("body {i}"));
        assert_eq!(mtime(&path), SystemTime::from(stamp(i + 1)));
    }
}

#[tokio::test]
async fn scenario_b_metadata_only_modify_sets_mtime() {
    let ws = workspace(4).await;
    let path = ws.ctx.resolve("notes.txt").unwrap();
    fs::write(&path, "unchanged body").unwrap();

    let change = Change::modify(
        "notes.txt",
        meta("n", "", stamp(9)),
        LocalMeta {
            local_path: path.clone(),
            is_dir: false,
            mod_time: None,
        },
    );
    orchestrator(&ws, &[change]).pull("").await.expect("pull");

    assert_eq!(fs::read_to_string(&path).unwrap(), "unchanged body");
    assert_eq!(mtime(&path), SystemTime::from(stamp(9)));
}

#[tokio::test]
async fn scenario_c_delete_of_missing_path_succeeds() {
    let ws = workspace(4).await;
    let path = ws.ctx.resolve("ghost/file.txt").unwrap();
    let change = Change::delete(
        "ghost/file.txt",
        LocalMeta {
            local_path: path,
            is_dir: false,
            mod_time: None,
        },
    );

    let outcome = orchestrator(&ws, &[change]).pull("").await.expect("pull");
    assert!(matches!(outcome, PullOutcome::Applied(_)));
}

#[tokio::test]
async fn scenario_d_failed_download_is_reported() {
    let ws = workspace(4).await;
    let change = Change::add("lost.bin", meta("l", "never-uploaded", stamp(3)));

    let err = orchestrator(&ws, &[change]).pull("").await.unwrap_err();
    match &err {
        SyncError::Incomplete { failed, .. } => {
            assert_eq!(failed.len(), 1);
            assert_eq!(failed[0].path, "lost.bin");
        }
        other => panic!("expected incomplete, got {other}"),
    }
    assert!(err.to_string().contains("lost.bin"));
}

#[tokio::test]
async fn sub_path_pull_only_applies_changes_below_it() {
    let ws = workspace(2).await;
    ws.store.put_blob("a", b"A").await.unwrap();
    ws.store.put_blob("b", b"B").await.unwrap();
    let mut index = StoreIndex::default();
    index
        .entries
        .insert("docs/a.md".into(), meta("a", "a", stamp(1)));
    index
        .entries
        .insert("src/b.rs".into(), meta("b", "b", stamp(1)));
    ws.store.save_index(&index).await.unwrap();

    let changes = vec![
        Change::add("docs/a.md", meta("a", "a", stamp(1))),
        Change::add("src/b.rs", meta("b", "b", stamp(1))),
    ];
    orchestrator(&ws, &changes).pull("docs").await.expect("pull");

    assert!(ws.ctx.resolve("docs/a.md").unwrap().exists());
    assert!(!ws.ctx.resolve("src/b.rs").unwrap().exists());
}

#[tokio::test]
async fn pulling_a_path_absent_from_the_store_is_a_noop() {
    let ws = workspace(4).await;
    let change = Change::add("elsewhere.txt", meta("e", "", stamp(1)));
    let outcome = orchestrator(&ws, &[change]).pull("not/there").await.expect("pull");
    assert!(matches!(outcome, PullOutcome::NothingToPull));
}
