use std::path::Path;
use std::process::Command;

use anyhow::{Context, anyhow};
use serde::Serialize;

use crate::resolver::{ExecutionPlan, PlannedTarget};

#[derive(Debug, Serialize)]
pub struct RunOutcome {
    pub completed_targets: usize,
    pub total_targets: usize,
    pub commands_run: usize,
}

#[derive(Debug, thiserror::Error)]
pub enum ExecError {
    #[error("target '{target}' failed at command {index} (`{command}`): {message}")]
    CommandFailed {
        target: String,
        index: usize,
        command: String,
        message: String,
    },
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

/// Run every command of every planned target in order, halting at the first
/// failure. Commands are opaque shell text; only the exit status is observed.
/// Effects are at-least-once: nothing is rolled back on failure.
pub fn execute_plan(plan: &ExecutionPlan) -> Result<RunOutcome, ExecError> {
    println!(
        "Executing '{}' ({} target{})",
        plan.requested,
        plan.targets.len(),
        if plan.targets.len() == 1 { "" } else { "s" }
    );

    let mut commands_run = 0;
    for (idx, target) in plan.targets.iter().enumerate() {
        println!("==> [{}/{}] {}", idx + 1, plan.targets.len(), target.name);
        commands_run += execute_target(target)?;
    }

    Ok(RunOutcome {
        completed_targets: plan.targets.len(),
        total_targets: plan.targets.len(),
        commands_run,
    })
}

fn execute_target(target: &PlannedTarget) -> Result<usize, ExecError> {
    for (index, command) in target.commands.iter().enumerate() {
        println!("    $ {command}");
        run_command(command, target.workdir.as_deref()).map_err(|err| {
            ExecError::CommandFailed {
                target: target.name.clone(),
                index,
                command: command.clone(),
                message: err.to_string(),
            }
        })?;
    }
    Ok(target.commands.len())
}

fn run_command(command: &str, workdir: Option<&Path>) -> anyhow::Result<()> {
    let shell = if cfg!(windows) {
        ("cmd", "/C")
    } else {
        ("/bin/sh", "-c")
    };

    let mut invocation = Command::new(shell.0);
    invocation.arg(shell.1).arg(command);
    if let Some(dir) = workdir {
        if !dir.is_dir() {
            return Err(anyhow!("working directory {} does not exist", dir.display()));
        }
        invocation.current_dir(dir);
    }

    let status = invocation
        .status()
        .with_context(|| format!("spawning shell command: {command}"))?;

    if !status.success() {
        return Err(anyhow!("exited with status {:?}", status.code()));
    }

    Ok(())
}
