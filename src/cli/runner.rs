//! CLI runner - executes commands

use crate::cli::commands::{Cli, Commands, JobArgs, OutputFormat};
use crate::error::{Error, Result};
use crate::job::TransformJob;
use crate::output::read_partitioned;
use crate::storage::StorageLocation;
use serde_json::{json, Value};
use tracing::info;

/// CLI runner
pub struct Runner {
    cli: Cli,
}

impl Runner {
    /// Create a new runner
    pub fn new(cli: Cli) -> Self {
        Self { cli }
    }

    /// Run the CLI command
    pub async fn run(&self) -> Result<()> {
        match &self.cli.command {
            Commands::Run(args) => self.run_job(args).await,
            Commands::Validate(args) => self.validate(args),
            Commands::Inspect { location, limit } => self.inspect(location, *limit).await,
        }
    }

    /// Run a job and print its summary
    async fn run_job(&self, args: &JobArgs) -> Result<()> {
        let config = args.to_config()?;
        let job = TransformJob::new(config);
        let result = job.run().await?;

        self.output_message(&json!({
            "type": "JOB_SUMMARY",
            "summary": result
        }));
        Ok(())
    }

    /// Validate a job config
    fn validate(&self, args: &JobArgs) -> Result<()> {
        let config = args.to_config()?;
        config.validate()?;

        info!(job = %config.job_name, "Config is valid");
        self.output_message(&json!({
            "type": "CONFIG_VALID",
            "config": config
        }));
        Ok(())
    }

    /// Print records of a partitioned output
    async fn inspect(&self, location: &str, limit: Option<usize>) -> Result<()> {
        let location = StorageLocation::source(location)?;
        let records = read_partitioned(&location).await?;
        let total = records.len();

        for record in records.into_iter().take(limit.unwrap_or(usize::MAX)) {
            self.output_message(&json!({
                "type": "RECORD",
                "partition": record.partition.to_path_string(),
                "object": record.object,
                "record": record.record
            }));
        }

        info!(records = total, "Output inspected");
        Ok(())
    }

    /// Print the failure message for an error
    pub fn report_failure(&self, error: &Error) {
        self.output_message(&failure_message(error));
    }

    /// Output a message to stdout
    fn output_message(&self, msg: &Value) {
        match self.cli.format {
            OutputFormat::Json => {
                println!("{}", serde_json::to_string(msg).unwrap_or_default());
            }
            OutputFormat::Pretty => {
                println!("{}", serde_json::to_string_pretty(msg).unwrap_or_default());
            }
        }
    }
}

/// `JOB_FAILED` message for an error
pub fn failure_message(error: &Error) -> Value {
    json!({
        "type": "JOB_FAILED",
        "error": {
            "kind": error.kind().as_str(),
            "message": error.to_string()
        }
    })
}
