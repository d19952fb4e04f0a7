use std::path::PathBuf;

use anyhow::{Context, anyhow};
use chrono::Utc;
use clap::{Parser, Subcommand};

use crate::executor::{ExecError, execute_plan};
use crate::history::{RunRecord, RunStatus, add_run_record, load_history};
use crate::registry::Registry;
use crate::resolver::resolve;
use crate::taskfile::{Taskfile, load_taskfile};

#[derive(Debug, Parser)]
#[command(
    name = "chore-runner",
    version,
    about = "Dependency-ordered task runner for declarative taskfiles"
)]
pub struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// List the targets defined in the taskfile
    List {
        /// Path to the taskfile
        #[arg(short, long, default_value = "tasks.json")]
        file: PathBuf,
        /// Emit compact JSON instead of pretty output
        #[arg(long)]
        raw: bool,
    },
    /// Resolve a target's execution order without running anything
    Plan {
        /// Target to resolve; falls back to the taskfile's default target
        target: Option<String>,
        /// Path to the taskfile
        #[arg(short, long, default_value = "tasks.json")]
        file: PathBuf,
        /// Emit compact JSON instead of pretty output
        #[arg(long)]
        raw: bool,
    },
    /// Resolve a target and execute its plan
    Run {
        /// Target to run; falls back to the taskfile's default target
        target: Option<String>,
        /// Path to the taskfile
        #[arg(short, long, default_value = "tasks.json")]
        file: PathBuf,
        /// Emit compact JSON for the plan summary
        #[arg(long)]
        raw: bool,
    },
    /// Show recorded runs
    History {
        /// Emit compact JSON instead of pretty output
        #[arg(long)]
        raw: bool,
    },
}

/// Exit codes: 0 success, 1 command failure, 2 configuration error.
pub fn run() -> i32 {
    let cli = Cli::parse();
    match dispatch(cli) {
        Ok(()) => 0,
        Err(err) => {
            eprintln!("error: {err:#}");
            exit_code_for(&err)
        }
    }
}

fn dispatch(cli: Cli) -> anyhow::Result<()> {
    match cli.command {
        Commands::List { file, raw } => {
            let taskfile = load_taskfile(&file)?;
            let registry = Registry::from_taskfile(&taskfile)?;

            if raw {
                println!("{}", serde_json::to_string(&taskfile)?);
                return Ok(());
            }

            println!("Targets in {} ({}):", file.display(), taskfile.name);
            for target in registry.targets() {
                let mut line = format!("  {}", target.name);
                if taskfile.default_target.as_deref() == Some(target.name.as_str()) {
                    line.push_str(" (default)");
                }
                if !target.dependencies.is_empty() {
                    line.push_str(&format!("  <- {}", target.dependencies.join(", ")));
                }
                println!("{line}");
            }
        }
        Commands::Plan { target, file, raw } => {
            let taskfile = load_taskfile(&file)?;
            let registry = Registry::from_taskfile(&taskfile)?;
            let requested = select_target(target, &taskfile)?;
            let plan = resolve(&registry, &requested)?;

            if raw {
                println!("{}", serde_json::to_string(&plan)?);
            } else {
                println!("{}", serde_json::to_string_pretty(&plan)?);
            }
        }
        Commands::Run { target, file, raw } => {
            let taskfile = load_taskfile(&file)?;
            let registry = Registry::from_taskfile(&taskfile)?;
            let requested = select_target(target, &taskfile)?;
            let plan = resolve(&registry, &requested)?;

            if raw {
                println!("{}", serde_json::to_string(&plan)?);
            }

            let outcome = execute_plan(&plan);
            record_run(&taskfile, &requested, plan.targets.len(), outcome.is_ok());
            let outcome = outcome?;

            println!(
                "Completed {} of {} targets ({} commands)",
                outcome.completed_targets, outcome.total_targets, outcome.commands_run
            );
        }
        Commands::History { raw } => {
            let history = load_history().context("loading run history")?;
            if raw {
                println!("{}", serde_json::to_string(&history)?);
            } else {
                println!("{}", serde_json::to_string_pretty(&history)?);
            }
        }
    }

    Ok(())
}

fn select_target(explicit: Option<String>, taskfile: &Taskfile) -> anyhow::Result<String> {
    if let Some(target) = explicit {
        return Ok(target);
    }

    taskfile
        .default_target
        .clone()
        .ok_or_else(|| anyhow!("no target specified and the taskfile declares no default target"))
}

fn record_run(taskfile: &Taskfile, target: &str, planned_targets: usize, success: bool) {
    let record = RunRecord {
        taskfile_name: taskfile.name.clone(),
        taskfile_digest: taskfile.digest.clone(),
        target: target.to_string(),
        planned_targets,
        timestamp: Utc::now(),
        status: if success {
            RunStatus::Success
        } else {
            RunStatus::Failed
        },
    };

    // A history write failure must not mask the run's own result.
    if let Err(err) = add_run_record(record) {
        eprintln!("warning: could not record run history: {err:#}");
    }
}

fn exit_code_for(err: &anyhow::Error) -> i32 {
    if err.chain().any(|cause| cause.is::<ExecError>()) {
        1
    } else {
        2
    }
}
