//! tdsync init command implementation
//!
//! Creates the state directory and a default config at the sync root.

use std::path::{Path, PathBuf};

use crate::config::{Config, CONFIG_FILE};
use crate::error::{Error, Result};
use crate::output::{emit_success, HumanOutput, OutputOptions};
use crate::storage::Storage;

#[derive(serde::Serialize)]
struct InitReport {
    root: PathBuf,
    created: InitCreated,
}

#[derive(serde::Serialize)]
struct InitCreated {
    config: bool,
    state_dir: bool,
}

pub fn run(root: &Path, json: bool, quiet: bool) -> Result<()> {
    let storage = Storage::new(root);
    let created_state_dir = storage.init()?;
    let created_config = ensure_config(root)?;

    let report = InitReport {
        root: root.to_path_buf(),
        created: InitCreated {
            config: created_config,
            state_dir: created_state_dir,
        },
    };

    let mut created_items = Vec::new();
    if created_config {
        created_items.push(CONFIG_FILE);
    }
    if created_state_dir {
        created_items.push(".tdsync/");
    }

    let header = if created_items.is_empty() {
        "tdsync init: nothing to do".to_string()
    } else {
        "tdsync init: initialized".to_string()
    };

    let mut human = HumanOutput::new(header);
    human.push_summary("root", root.display().to_string());
    human.push_summary(
        "created",
        if created_items.is_empty() {
            "none".to_string()
        } else {
            created_items.join(", ")
        },
    );
    human.push_next_step("put your tasks in todo.txt");
    human.push_next_step("tdsync plan");

    emit_success(OutputOptions { json, quiet }, "init", &report, Some(&human))?;

    Ok(())
}

fn ensure_config(root: &Path) -> Result<bool> {
    let config_path = root.join(CONFIG_FILE);
    if config_path.exists() {
        if !config_path.is_file() {
            return Err(Error::OperationFailed(format!(
                "{CONFIG_FILE} exists but is not a file: {}",
                config_path.display()
            )));
        }
        return Ok(false);
    }

    let config = Config::default();
    config.save(&config_path)?;
    Ok(true)
}
