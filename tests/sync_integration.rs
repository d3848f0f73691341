mod support;

use predicates::str::contains;
use support::SyncDir;

const EMPTY_SNAPSHOT: &str = r#"{"current": [], "completed": []}"#;

#[test]
fn init_creates_state_dir_and_config() {
    let dir = SyncDir::new();

    dir.tdsync()
        .arg("init")
        .assert()
        .success()
        .stdout(contains("initialized"));

    assert!(dir.state_dir().is_dir());
    assert!(dir.path().join(".tdsync.toml").is_file());
}

#[test]
fn init_is_idempotent() {
    let dir = SyncDir::new();
    dir.init();

    dir.tdsync()
        .arg("init")
        .assert()
        .success()
        .stdout(contains("nothing to do"));
}

#[test]
fn plan_requires_init() {
    let dir = SyncDir::new();
    dir.write_todo("- [ ] Buy milk\n");
    dir.write_snapshot(EMPTY_SNAPSHOT);

    dir.tdsync().arg("plan").assert().code(2);
}

#[test]
fn plan_errors_on_missing_todo_file() {
    let dir = SyncDir::new();
    dir.init();
    dir.write_snapshot(EMPTY_SNAPSHOT);

    dir.tdsync()
        .arg("plan")
        .assert()
        .code(2)
        .stderr(contains("File not found"));
}

#[test]
fn plan_reports_creation_without_persisting() {
    let dir = SyncDir::new();
    dir.init();
    dir.write_todo("- [ ] Buy milk !3\n");
    dir.write_snapshot(EMPTY_SNAPSHOT);

    dir.tdsync()
        .arg("plan")
        .assert()
        .success()
        .stdout(contains("create on remote: Buy milk"));

    assert!(dir.read_correlation_events().is_empty());
    assert!(dir.read_resolutions().is_empty());
}

#[test]
fn plan_emits_json_envelope() {
    let dir = SyncDir::new();
    dir.init();
    dir.write_todo("- [ ] Buy milk\n");
    dir.write_snapshot(EMPTY_SNAPSHOT);

    dir.tdsync()
        .args(["--json", "plan"])
        .assert()
        .success()
        .stdout(contains("\"schema_version\": \"tdsync.v1\""))
        .stdout(contains("\"command\": \"plan\""))
        .stdout(contains("\"status\": \"success\""));
}

#[test]
fn sync_establishes_correlation_for_exact_match() {
    let dir = SyncDir::new();
    dir.init();
    dir.write_todo("- [ ] Buy milk !3\n");
    dir.write_snapshot(
        r#"{"current": [{"id": "r-1", "content": "Buy milk", "priority": 2}], "completed": []}"#,
    );

    dir.tdsync().arg("sync").assert().success();

    let events = dir.read_correlation_events();
    assert_eq!(events.len(), 1);
    assert_eq!(events[0]["type"], "established");
    assert_eq!(events[0]["remote_id"], "r-1");

    // A second run recognizes the pair and appends nothing.
    dir.tdsync().arg("sync").assert().success();
    assert_eq!(dir.read_correlation_events().len(), 1);
}

#[test]
fn sync_records_priority_resolution() {
    let dir = SyncDir::new();
    dir.init();
    dir.write_todo("- [ ] Call dentist !1\n");
    dir.write_snapshot(
        r#"{"current": [{"id": "r-1", "content": "Call dentist", "priority": 2}], "completed": []}"#,
    );

    dir.tdsync()
        .arg("sync")
        .assert()
        .success()
        .stdout(contains("policy decisions: 1"));

    let resolutions = dir.read_resolutions();
    assert_eq!(resolutions.len(), 1);
    assert_eq!(resolutions[0]["decision"], "local-wins");
    assert_eq!(resolutions[0]["new_priority"], 1);
}

#[test]
fn sync_blocks_on_unresolved_conflict() {
    let dir = SyncDir::new();
    dir.init();
    dir.seed_correlation("1234", "r-1", "Call dentist", "Call dentist");
    dir.write_todo("- [ ] Call dentist ASAP (1234)\n");
    dir.write_snapshot(
        r#"{"current": [{"id": "r-1", "content": "Call dentist tomorrow"}], "completed": []}"#,
    );

    dir.tdsync()
        .arg("sync")
        .assert()
        .code(3)
        .stderr(contains("unresolved conflict"));

    // Nothing was persisted beyond the seeded event.
    assert_eq!(dir.read_correlation_events().len(), 1);
}

#[test]
fn sync_allow_conflicts_proceeds() {
    let dir = SyncDir::new();
    dir.init();
    dir.seed_correlation("1234", "r-1", "Call dentist", "Call dentist");
    dir.write_todo("- [ ] Call dentist ASAP (1234)\n");
    dir.write_snapshot(
        r#"{"current": [{"id": "r-1", "content": "Call dentist tomorrow"}], "completed": []}"#,
    );

    dir.tdsync()
        .args(["sync", "--allow-conflicts"])
        .assert()
        .success()
        .stdout(contains("conflict on 1234"));
}

#[test]
fn sync_records_completion_event() {
    let dir = SyncDir::new();
    dir.init();
    dir.seed_correlation("1234", "r-1", "Ship the package", "Ship the package");
    dir.write_todo("- [x] Ship the package (1234) @done(2026-08-20)\n");
    dir.write_snapshot(EMPTY_SNAPSHOT);

    dir.tdsync().arg("sync").assert().success();

    let events = dir.read_correlation_events();
    assert_eq!(events.len(), 2);
    assert_eq!(events[1]["type"], "completed");
    assert_eq!(events[1]["correlation_id"], "1234");
}

#[test]
fn sync_records_rename_as_contents_updated() {
    let dir = SyncDir::new();
    dir.init();
    dir.seed_correlation("1234", "r-1", "Call dentist", "Call dentist");
    dir.write_todo("- [ ] Call dentist ASAP (1234)\n");
    dir.write_snapshot(
        r#"{"current": [{"id": "r-1", "content": "Call dentist"}], "completed": []}"#,
    );

    dir.tdsync()
        .arg("sync")
        .assert()
        .success()
        .stdout(contains("update remote: Call dentist -> Call dentist ASAP"));

    let events = dir.read_correlation_events();
    assert_eq!(events.len(), 2);
    assert_eq!(events[1]["type"], "contents_updated");
    assert_eq!(events[1]["local_content"], "Call dentist ASAP");
}

#[test]
fn status_reports_store_summary() {
    let dir = SyncDir::new();
    dir.init();
    dir.write_todo("- [ ] Buy milk !3\n");
    dir.write_snapshot(
        r#"{"current": [{"id": "r-1", "content": "Buy milk", "priority": 2}], "completed": []}"#,
    );
    dir.tdsync().arg("sync").assert().success();

    dir.tdsync()
        .arg("status")
        .assert()
        .success()
        .stdout(contains("current correlations: 1"))
        .stdout(contains("conflict policy: local-wins"));
}

#[test]
fn malformed_todo_file_is_a_user_error() {
    let dir = SyncDir::new();
    dir.init();
    dir.write_todo("just some text\n");
    dir.write_snapshot(EMPTY_SNAPSHOT);

    dir.tdsync()
        .arg("plan")
        .assert()
        .code(2)
        .stderr(contains("Malformed todo file at line 1"));
}

#[test]
fn config_overrides_paths_and_policy() {
    let dir = SyncDir::new();
    dir.init();
    dir.write_file(
        ".tdsync.toml",
        r#"
todo_file = "tasks.txt"
remote_snapshot = "pull.json"

[resolve]
policy = "remote-wins"
"#,
    );
    dir.write_file("tasks.txt", "- [ ] Call dentist !1\n");
    dir.write_file(
        "pull.json",
        r#"{"current": [{"id": "r-1", "content": "Call dentist", "priority": 2}], "completed": []}"#,
    );

    dir.tdsync().arg("sync").assert().success();

    let resolutions = dir.read_resolutions();
    assert_eq!(resolutions.len(), 1);
    assert_eq!(resolutions[0]["decision"], "remote-wins");
    assert_eq!(resolutions[0]["new_priority"], 3);
}

#[test]
fn invalid_config_is_rejected() {
    let dir = SyncDir::new();
    dir.init();
    dir.write_file(
        ".tdsync.toml",
        r#"
[match]
similarity_threshold = 1.5
"#,
    );
    dir.write_todo("- [ ] Buy milk\n");
    dir.write_snapshot(EMPTY_SNAPSHOT);

    dir.tdsync()
        .arg("plan")
        .assert()
        .code(2)
        .stderr(contains("similarity_threshold"));
}
