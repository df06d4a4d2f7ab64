//! Child process execution
//!
//! Child processes inherit stdout/stderr so their output lands directly in
//! the pipeline log.

#[cfg(test)]
use mockall::automock;

use std::fmt;
use std::path::PathBuf;
use std::process::Stdio;

use tokio::process::Command;
use tracing::{debug, instrument};

/// A program invocation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcessCommand {
    pub program: PathBuf,
    pub args: Vec<String>,
    /// Extra environment variables for the child
    pub envs: Vec<(String, String)>,
}

impl ProcessCommand {
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            envs: Vec::new(),
        }
    }

    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    pub fn env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.envs.push((key.into(), value.into()));
        self
    }
}

impl fmt::Display for ProcessCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.program.display())?;
        for arg in &self.args {
            write!(f, " {}", arg)?;
        }
        Ok(())
    }
}

/// Trait for running external programs
#[cfg_attr(test, automock)]
#[async_trait::async_trait]
pub trait ProcessRunner: Send + Sync {
    /// Run the command to completion.
    ///
    /// # Returns
    /// * `Ok(Some(code))` - The process exited with `code`
    /// * `Ok(None)` - The process was terminated by a signal
    /// * `Err(io::Error)` - The process could not be started
    async fn run(&self, command: &ProcessCommand) -> std::io::Result<Option<i32>>;
}

/// Runs programs with tokio, inheriting stdio
#[derive(Debug, Default, Clone, Copy)]
pub struct TokioProcessRunner;

#[async_trait::async_trait]
impl ProcessRunner for TokioProcessRunner {
    #[instrument(skip_all, fields(program = %command.program.display()))]
    async fn run(&self, command: &ProcessCommand) -> std::io::Result<Option<i32>> {
        debug!("Running: {}", command);

        let status = Command::new(&command.program)
            .args(&command.args)
            .envs(command.envs.iter().map(|(k, v)| (k, v)))
            .stdin(Stdio::null())
            .stdout(Stdio::inherit())
            .stderr(Stdio::inherit())
            .status()
            .await?;

        debug!("{} exited with {}", command.program.display(), status);
        Ok(status.code())
    }
}
