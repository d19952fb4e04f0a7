use std::collections::HashMap;
use std::path::PathBuf;

use thiserror::Error;

use crate::taskfile::Taskfile;

/// A named unit of work: dependencies run first, then the commands, in order.
#[derive(Debug, Clone)]
pub struct Target {
    pub name: String,
    pub dependencies: Vec<String>,
    pub commands: Vec<String>,
    pub workdir: Option<PathBuf>,
}

/// Immutable set of target definitions. Populated once from a taskfile,
/// read-only for the rest of the invocation.
#[derive(Debug, Default)]
pub struct Registry {
    targets: Vec<Target>,
    by_name: HashMap<String, usize>,
}

#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("target '{0}' is defined more than once")]
    DuplicateTarget(String),
    #[error("unknown target '{0}'")]
    UnknownTarget(String),
}

impl Registry {
    pub fn from_taskfile(taskfile: &Taskfile) -> Result<Self, RegistryError> {
        let mut registry = Registry::default();
        for config in &taskfile.targets {
            registry.define(Target {
                name: config.name.clone(),
                dependencies: config.dependencies.clone(),
                commands: config.commands.clone(),
                workdir: config.workdir.clone(),
            })?;
        }
        Ok(registry)
    }

    pub fn define(&mut self, target: Target) -> Result<(), RegistryError> {
        if self.by_name.contains_key(&target.name) {
            return Err(RegistryError::DuplicateTarget(target.name));
        }
        self.by_name.insert(target.name.clone(), self.targets.len());
        self.targets.push(target);
        Ok(())
    }

    pub fn lookup(&self, name: &str) -> Result<&Target, RegistryError> {
        self.by_name
            .get(name)
            .map(|&index| &self.targets[index])
            .ok_or_else(|| RegistryError::UnknownTarget(name.to_string()))
    }

    /// Targets in declaration order.
    pub fn targets(&self) -> impl Iterator<Item = &Target> {
        self.targets.iter()
    }
}
