use std::fs;
use std::path::PathBuf;

use anyhow::{Context, anyhow};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(rename_all = "lowercase")]
pub enum RunStatus {
    Success,
    Failed,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct RunRecord {
    pub taskfile_name: String,
    pub taskfile_digest: String,
    pub target: String,
    pub planned_targets: usize,
    pub timestamp: DateTime<Utc>,
    pub status: RunStatus,
}

#[derive(Debug, Serialize, Deserialize, Default, Clone)]
pub struct History {
    #[serde(default)]
    pub runs: Vec<RunRecord>,
}

pub fn load_history() -> anyhow::Result<History> {
    let path = history_file_path()?;
    if !path.exists() {
        return Ok(History::default());
    }

    let data = fs::read_to_string(&path)
        .with_context(|| format!("reading history file at {}", path.display()))?;
    let history: History = serde_json::from_str(&data)
        .with_context(|| format!("parsing history file at {}", path.display()))?;
    Ok(history)
}

pub fn save_history(history: &History) -> anyhow::Result<()> {
    let path = history_file_path()?;
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("creating history directory {}", parent.display()))?;
    }

    let tmp_path = path.with_extension("tmp");
    let data = serde_json::to_string_pretty(history)?;
    fs::write(&tmp_path, data)
        .with_context(|| format!("writing temp history file {}", tmp_path.display()))?;
    fs::rename(&tmp_path, &path)
        .with_context(|| format!("committing history file to {}", path.display()))?;
    Ok(())
}

pub fn add_run_record(record: RunRecord) -> anyhow::Result<()> {
    let mut history = load_history()?;
    history.runs.push(record);
    save_history(&history)
}

fn history_file_path() -> anyhow::Result<PathBuf> {
    let base = dirs::data_dir()
        .ok_or_else(|| anyhow!("could not determine platform data directory"))?
        .join("chore-runner");
    Ok(base.join("history.json"))
}
