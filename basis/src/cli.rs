use crate::{
    error::EngineError,
    persistence::{ContextRepository, FileContextRepository},
    strategy::context::TaskId,
};
use clap::{Parser, Subcommand};
use smol_str::SmolStr;
use std::path::PathBuf;

/// Cross-exchange delta-neutral arbitrage engine.
#[derive(Debug, Parser)]
#[command(name = "basis", version, about)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Start the engine and run until interrupted.
    Run {
        /// Path to the JSON configuration file.
        #[arg(long, env = "BASIS_CONFIG", default_value = "basis.json")]
        config: PathBuf,
        /// Emit JSON structured logs.
        #[arg(long)]
        json_logs: bool,
    },
    /// List persisted strategy tasks and their states.
    Tasks {
        /// State directory holding persisted task contexts.
        #[arg(long, env = "BASIS_STATE_DIR", default_value = ".basis-state")]
        state_dir: PathBuf,
    },
    /// Pause a running task by id.
    Pause {
        task_id: String,
        #[arg(long, env = "BASIS_STATE_DIR", default_value = ".basis-state")]
        state_dir: PathBuf,
    },
    /// Resume a paused task by id.
    Resume {
        task_id: String,
        #[arg(long, env = "BASIS_STATE_DIR", default_value = ".basis-state")]
        state_dir: PathBuf,
    },
    /// Print the persisted context of a task as JSON.
    DumpContext {
        task_id: String,
        #[arg(long, env = "BASIS_STATE_DIR", default_value = ".basis-state")]
        state_dir: PathBuf,
    },
}

/// List persisted tasks with their state and headline accounting.
pub async fn list_tasks(state_dir: PathBuf) -> Result<(), EngineError> {
    let repository = FileContextRepository::new(state_dir)?;
    let mut contexts = repository.load_all().await?;
    contexts.sort_by(|a, b| a.task_id.cmp(&b.task_id));

    if contexts.is_empty() {
        println!("no persisted tasks");
        return Ok(());
    }

    for context in contexts {
        println!(
            "{}  {}  {}  volume_usdt={}  failures={}",
            context.task_id,
            context.instrument,
            context.state.name(),
            context.total_volume_usdt,
            context.consecutive_failures,
        );
    }
    Ok(())
}

/// Write an operator control file observed by a running supervisor.
pub async fn write_control_command(
    state_dir: PathBuf,
    task_id: &str,
    command: &str,
) -> Result<(), EngineError> {
    let repository = FileContextRepository::new(state_dir.clone())?;
    let task_id = TaskId(SmolStr::new(task_id));

    if repository.load(&task_id).await?.is_none() {
        return Err(EngineError::Detection(format!(
            "no persisted task with id: {task_id}"
        )));
    }

    let control_dir = state_dir.join("control");
    tokio::fs::create_dir_all(&control_dir)
        .await
        .map_err(crate::error::PersistenceError::Io)?;
    tokio::fs::write(control_dir.join(format!("{task_id}")), command)
        .await
        .map_err(crate::error::PersistenceError::Io)?;

    println!("{command} requested for task {task_id}");
    Ok(())
}

/// Print the persisted context of a task as pretty JSON.
pub async fn dump_context(state_dir: PathBuf, task_id: &str) -> Result<(), EngineError> {
    let repository = FileContextRepository::new(state_dir)?;
    let task_id = TaskId(SmolStr::new(task_id));

    match repository.load(&task_id).await? {
        Some(context) => {
            let encoded = serde_json::to_string_pretty(&context)
                .map_err(crate::error::PersistenceError::Codec)?;
            println!("{encoded}");
            Ok(())
        }
        None => Err(EngineError::Detection(format!(
            "no persisted task with id: {task_id}"
        ))),
    }
}
