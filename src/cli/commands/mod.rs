//! Command execution.
//!
//! Dispatches parsed arguments to the individual command executors and
//! turns failures into exit codes with user feedback.

mod build;
mod pull;

use crate::cli::{Args, Command, OutputManager};
use crate::config::Config;
use crate::error::Result;

use build::execute_build;
use pull::execute_pull;

/// Execute the main command based on parsed arguments
pub async fn execute_command(args: Args) -> Result<i32> {
    let output = OutputManager::new();

    if let Err(validation_error) = args.validate() {
        output.error(&format!("Invalid arguments: {}", validation_error));
        return Ok(1);
    }

    let config = Config::from_env();

    let result = match &args.command {
        Command::Build { archive } => execute_build(archive, &config, &output).await,
        Command::Pull { image } => execute_pull(image, &config, &output).await,
    };

    match result {
        Ok(exit_code) => Ok(exit_code),
        Err(e) => {
            output.error(&format!("Command '{}' failed: {}", args.command.name(), e));

            let suggestions = e.recovery_suggestions();
            if !suggestions.is_empty() {
                output.println("\n💡 Recovery suggestions:");
                for suggestion in suggestions {
                    output.indent(&suggestion);
                }
            }

            Ok(1)
        }
    }
}
