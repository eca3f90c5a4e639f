use anyhow::Result;
use clap::Subcommand;

use crate::cli::output::get_formatter;
use crate::error::TaskError;
use crate::models::{Config, OutputFormat};

#[derive(Debug, Subcommand)]
pub enum TaskCommand {
    /// Show the status of a single task
    Status {
        #[arg(required = true, help = "Task id returned at submission")]
        task_id: String,
    },

    /// List every task known to the durable store
    List,
}

pub async fn handle_task(cmd: TaskCommand, format: OutputFormat, _verbose: bool) -> Result<()> {
    let config = Config::load()?;
    let formatter = get_formatter(format);

    let store = super::open_store(&config)?;
    let manager = super::open_manager(&config, store)?;

    match cmd {
        TaskCommand::Status { task_id } => match manager.get_status(&task_id) {
            Ok(status) => {
                print!("{}", formatter.format_task(&status));
                Ok(())
            }
            Err(TaskError::NotFound(id)) => {
                print!("{}", formatter.format_error(&format!("task not found: {}", id)));
                std::process::exit(1);
            }
            Err(e) => Err(e.into()),
        },
        TaskCommand::List => {
            let tasks = manager.list_all()?;
            print!("{}", formatter.format_tasks(&tasks));
            Ok(())
        }
    }
}
