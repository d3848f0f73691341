use std::fs;
use std::path::{Path, PathBuf};

use assert_cmd::Command;
use tempfile::TempDir;

pub struct SyncDir {
    dir: TempDir,
}

impl SyncDir {
    pub fn new() -> Self {
        let dir = tempfile::tempdir().expect("failed to create tempdir");
        Self { dir }
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    pub fn write_file(&self, rel_path: &str, contents: &str) -> PathBuf {
        let path = self.dir.path().join(rel_path);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).expect("create parent dirs");
        }
        fs::write(&path, contents).expect("write file");
        path
    }

    pub fn write_todo(&self, contents: &str) -> PathBuf {
        self.write_file("todo.txt", contents)
    }

    pub fn write_snapshot(&self, contents: &str) -> PathBuf {
        self.write_file("remote.json", contents)
    }

    pub fn state_dir(&self) -> PathBuf {
        self.dir.path().join(".tdsync")
    }

    pub fn correlations_log(&self) -> PathBuf {
        self.state_dir().join("correlations.jsonl")
    }

    pub fn resolutions_log(&self) -> PathBuf {
        self.state_dir().join("resolutions.jsonl")
    }

    pub fn tdsync(&self) -> Command {
        let mut cmd = Command::cargo_bin("tdsync").expect("binary");
        cmd.arg("--dir").arg(self.dir.path());
        cmd
    }

    pub fn init(&self) {
        self.tdsync().arg("init").assert().success();
    }

    pub fn read_correlation_events(&self) -> Vec<serde_json::Value> {
        self.read_jsonl(&self.correlations_log())
    }

    pub fn read_resolutions(&self) -> Vec<serde_json::Value> {
        self.read_jsonl(&self.resolutions_log())
    }

    fn read_jsonl(&self, path: &Path) -> Vec<serde_json::Value> {
        if !path.exists() {
            return Vec::new();
        }
        let contents = fs::read_to_string(path).expect("read log");
        contents
            .lines()
            .filter(|line| !line.trim().is_empty())
            .map(|line| serde_json::from_str(line).expect("parse log line"))
            .collect()
    }

    /// Seed an established correlation directly into the event log.
    pub fn seed_correlation(
        &self,
        corr_id: &str,
        remote_id: &str,
        local_content: &str,
        remote_content: &str,
    ) {
        let event = serde_json::json!({
            "event_id": format!("seed-{corr_id}"),
            "type": "established",
            "timestamp": "2026-08-01T00:00:00Z",
            "correlation_id": corr_id,
            "remote_id": remote_id,
            "local_content": local_content,
            "remote_content": remote_content,
        });
        let path = self.correlations_log();
        let mut contents = if path.exists() {
            fs::read_to_string(&path).expect("read log")
        } else {
            String::new()
        };
        contents.push_str(&event.to_string());
        contents.push('\n');
        fs::write(&path, contents).expect("write log");
    }
}
