use basis::{
    cli::{Cli, Command, dump_context, list_tasks, write_control_command},
    config::Config,
    error::EngineError,
    logging::{init_json_logging, init_logging},
    supervisor::Supervisor,
};
use clap::Parser;
use tracing::{error, info};

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let result = match cli.command {
        Command::Run { config, json_logs } => {
            if json_logs {
                init_json_logging();
            } else {
                init_logging();
            }
            run(config).await
        }
        Command::Tasks { state_dir } => {
            init_logging();
            list_tasks(state_dir).await
        }
        Command::Pause { task_id, state_dir } => {
            init_logging();
            write_control_command(state_dir, &task_id, "pause").await
        }
        Command::Resume { task_id, state_dir } => {
            init_logging();
            write_control_command(state_dir, &task_id, "resume").await
        }
        Command::DumpContext { task_id, state_dir } => {
            init_logging();
            dump_context(state_dir, &task_id).await
        }
    };

    if let Err(error) = result {
        error!(%error, "fatal error");
        std::process::exit(1);
    }
}

async fn run(config_path: std::path::PathBuf) -> Result<(), EngineError> {
    let config = Config::from_json_file(&config_path)?;
    info!(environment = ?config.environment, "configuration loaded and validated");

    let mut supervisor = Supervisor::new(config)?;
    supervisor.run().await?;

    tokio::signal::ctrl_c()
        .await
        .map_err(basis::error::PersistenceError::Io)?;

    supervisor.shutdown().await;
    info!("engine stopped");
    Ok(())
}
