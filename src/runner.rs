//! Invocation of the installed CLI
//!
//! Runs `guardian init --force` followed by `guardian run ...` and reports
//! where the SARIF results were written.

use std::path::PathBuf;
use std::sync::Arc;

use thiserror::Error;
use tracing::{debug, info, warn};

use crate::config::TaskConfig;
use crate::install::installer::InstalledCli;
use crate::pipeline::{DEFAULT_ARTIFACT_NAME, LoggingCommand};
use crate::process::{ProcessCommand, ProcessRunner};
use crate::version::directory::InstalledVersion;

/// Telemetry environment reported to the CLI by default
pub const DEFAULT_TELEMETRY_ENVIRONMENT: &str = "azdevops";

/// First CLI version whose `--export-file` exports all SARIF results
pub const EXPORT_FILE_MIN_VERSION: &str = "0.183.0";

#[derive(Debug, Error)]
pub enum RunError {
    #[error("Failed to start MSDO CLI {program}: {source}")]
    Spawn {
        program: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("MSDO CLI exited with an error exit code: {}", exit_code_text(.0))]
    ExitCode(Option<i32>),
}

fn exit_code_text(code: &Option<i32>) -> String {
    code.map_or_else(|| "none".to_string(), |code| code.to_string())
}

/// Options for a `guardian run` invocation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunOptions {
    /// Arguments forwarded after `run`
    pub args: Vec<String>,
    /// Exit codes treated as success
    pub successful_exit_codes: Vec<i32>,
    /// Upload the SARIF file as a build artifact
    pub publish: bool,
    pub artifact_name: String,
    pub telemetry_environment: String,
}

impl Default for RunOptions {
    fn default() -> Self {
        Self {
            args: Vec::new(),
            successful_exit_codes: vec![0],
            publish: true,
            artifact_name: DEFAULT_ARTIFACT_NAME.to_string(),
            telemetry_environment: DEFAULT_TELEMETRY_ENVIRONMENT.to_string(),
        }
    }
}

/// Outcome of a CLI run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunReport {
    pub exit_code: Option<i32>,
    pub succeeded: bool,
    pub sarif_file: PathBuf,
    /// Logging commands to emit after the run, in emission order
    pub commands: Vec<LoggingCommand>,
}

impl RunReport {
    /// Turn an unsuccessful exit code into an error
    pub fn check(&self) -> Result<(), RunError> {
        if self.succeeded {
            Ok(())
        } else {
            Err(RunError::ExitCode(self.exit_code))
        }
    }
}

/// Runs the installed CLI
pub struct CliRunner {
    config: TaskConfig,
    cli: InstalledCli,
    runner: Arc<dyn ProcessRunner>,
}

impl CliRunner {
    pub fn new(config: TaskConfig, cli: InstalledCli, runner: Arc<dyn ProcessRunner>) -> Self {
        Self {
            config,
            cli,
            runner,
        }
    }

    fn command(&self) -> ProcessCommand {
        ProcessCommand::new(&self.cli.location.executable).env(
            "GDN_SETTINGS_FOLDERS",
            format!("Install={}", self.config.packages_directory().display()),
        )
    }

    /// `guardian init --force`
    pub fn init_command(&self) -> ProcessCommand {
        self.command().arg("init").arg("--force")
    }

    /// Whether the installed CLI understands `--export-file`.
    ///
    /// Versions below 0.183.0 only export breaking results. An unknown version
    /// (an override install) is assumed to be current.
    pub fn exports_all_results(&self) -> bool {
        let Some(installed) = self.cli.version.as_deref().and_then(InstalledVersion::parse) else {
            return true;
        };
        InstalledVersion::parse(EXPORT_FILE_MIN_VERSION)
            .is_none_or(|minimum| installed.cmp_components(&minimum).is_ge())
    }

    /// `task.setvariable` for `MSDO_SARIF_FILE`, emitted before the CLI runs
    pub fn sarif_file_variable(&self) -> LoggingCommand {
        LoggingCommand::set_variable(
            "MSDO_SARIF_FILE",
            &self.config.sarif_file().display().to_string(),
        )
    }

    /// `guardian run <args> --logger-pipeline ... <export> --telemetry-environment <env>`
    pub fn run_command(&self, options: &RunOptions) -> ProcessCommand {
        let mut command = self
            .command()
            .arg("run")
            .args(options.args.iter().cloned())
            .arg("--logger-pipeline");

        debug!("GDN_LOGGERLEVEL = {:?}", self.config.logger_level);
        if self.config.system_debug {
            command = command
                .arg("--logger-level")
                .arg("trace")
                .arg("--logger-show-level");
        } else if let Some(level) = &self.config.logger_level {
            command = command.arg("--logger-level").arg(level.as_str());
        }

        command = if self.exports_all_results() {
            command.arg("--export-file")
        } else {
            command
                .arg("--export-breaking-results-to-file")
                .arg(self.config.sarif_file().to_string_lossy())
        };

        command
            .arg("--telemetry-environment")
            .arg(options.telemetry_environment.as_str())
    }

    /// Initialize the CLI. Failures are logged and otherwise ignored.
    pub async fn init(&self) {
        let command = self.init_command();
        match self.runner.run(&command).await {
            Ok(Some(0)) => debug!("MSDO CLI initialized"),
            Ok(code) => warn!("{} exited with {:?}", command, code),
            Err(e) => warn!("Failed to run {}: {}", command, e),
        }
    }

    /// Run the CLI and collect the pipeline logging commands to emit.
    ///
    /// [`CliRunner::sarif_file_variable`] is not part of the report; it is
    /// emitted before the run so it is set even when the CLI cannot start.
    pub async fn run(&self, options: &RunOptions) -> Result<RunReport, RunError> {
        let sarif_file = self.config.sarif_file();
        debug!("sarif_file = {:?}", sarif_file);

        let mut commands = Vec::new();

        let command = self.run_command(options);
        info!("Running Microsoft Security DevOps...");

        let exit_code = self
            .runner
            .run(&command)
            .await
            .map_err(|source| RunError::Spawn {
                program: command.program.clone(),
                source,
            })?;

        let succeeded =
            exit_code.is_some_and(|code| options.successful_exit_codes.contains(&code));

        if options.publish && sarif_file.exists() {
            commands.push(LoggingCommand::upload_artifact(
                &options.artifact_name,
                &sarif_file,
            ));
        }

        Ok(RunReport {
            exit_code,
            succeeded,
            sarif_file,
            commands,
        })
    }
}
