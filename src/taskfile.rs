use std::fs;
use std::path::{Path, PathBuf};

use anyhow::Context;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use thiserror::Error;

#[derive(Debug, Serialize, Deserialize)]
pub struct Taskfile {
    pub name: String,
    #[serde(default, rename = "default")]
    pub default_target: Option<String>,
    pub targets: Vec<TargetConfig>,
    /// Hex SHA-256 of the raw taskfile bytes, filled in at load time.
    #[serde(skip)]
    pub digest: String,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct TargetConfig {
    pub name: String,
    #[serde(default)]
    pub dependencies: Vec<String>,
    #[serde(default)]
    pub commands: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub workdir: Option<PathBuf>,
}

#[derive(Debug, Error)]
pub enum TaskfileValidationError {
    #[error("taskfile missing required field: {0}")]
    MissingField(String),
    #[error("taskfile defines no targets")]
    EmptyTargets,
    #[error("invalid target name: {0:?}")]
    InvalidTargetName(String),
    #[error("target '{target}' has an empty command at index {index}")]
    EmptyCommand { target: String, index: usize },
    #[error("target '{0}' declares an empty working directory")]
    EmptyWorkdir(String),
    #[error("target '{target}' declares an empty dependency name")]
    EmptyDependency { target: String },
    #[error("default target '{0}' is not defined")]
    UnknownDefaultTarget(String),
}

pub fn load_taskfile(path: &Path) -> anyhow::Result<Taskfile> {
    let data = fs::read_to_string(path)
        .with_context(|| format!("reading taskfile at {}", path.display()))?;
    let mut taskfile: Taskfile = serde_json::from_str(&data)
        .with_context(|| format!("parsing taskfile at {}", path.display()))?;
    taskfile.digest = content_digest(&data);
    validate_taskfile(taskfile)
        .with_context(|| format!("validating taskfile at {}", path.display()))
}

fn content_digest(data: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(data.as_bytes());
    format!("{:x}", hasher.finalize())
}

fn validate_taskfile(taskfile: Taskfile) -> Result<Taskfile, TaskfileValidationError> {
    if taskfile.name.trim().is_empty() {
        return Err(TaskfileValidationError::MissingField("name".to_string()));
    }

    if taskfile.targets.is_empty() {
        return Err(TaskfileValidationError::EmptyTargets);
    }

    for target in &taskfile.targets {
        validate_target_name(&target.name)?;

        for dependency in &target.dependencies {
            if dependency.trim().is_empty() {
                return Err(TaskfileValidationError::EmptyDependency {
                    target: target.name.clone(),
                });
            }
        }

        for (index, command) in target.commands.iter().enumerate() {
            if command.trim().is_empty() {
                return Err(TaskfileValidationError::EmptyCommand {
                    target: target.name.clone(),
                    index,
                });
            }
        }

        if let Some(workdir) = &target.workdir {
            if workdir.as_os_str().is_empty() {
                return Err(TaskfileValidationError::EmptyWorkdir(target.name.clone()));
            }
        }
    }

    if let Some(default) = &taskfile.default_target {
        if !taskfile.targets.iter().any(|t| &t.name == default) {
            return Err(TaskfileValidationError::UnknownDefaultTarget(
                default.clone(),
            ));
        }
    }

    Ok(taskfile)
}

fn validate_target_name(name: &str) -> Result<(), TaskfileValidationError> {
    if name.is_empty() || name.chars().any(char::is_whitespace) {
        return Err(TaskfileValidationError::InvalidTargetName(name.to_string()));
    }
    Ok(())
}
