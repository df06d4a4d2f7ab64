use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use clap::{Args, Parser, Subcommand};
use tracing::debug;

use msdo_task::config::{CLI_EXECUTABLE_NAME, ENV_DIRECTORY, ENV_FILE_PATH, TaskConfig};
use msdo_task::install::fetchers::{FetcherKind, create_fetcher};
use msdo_task::install::{InstalledCli, Installer};
use msdo_task::logging;
use msdo_task::pipeline::{DEFAULT_ARTIFACT_NAME, LoggingCommand};
use msdo_task::process::TokioProcessRunner;
use msdo_task::runner::{CliRunner, DEFAULT_TELEMETRY_ENVIRONMENT, RunOptions};
use msdo_task::version::{VersionResolver, VersionSpecifier};

#[derive(Parser)]
#[command(name = "msdo-task")]
#[command(version, about = "Installs and runs the Microsoft Security DevOps CLI")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Args)]
struct InstallArgs {
    /// CLI version to install (exact, `Latest`, `LatestPreRelease` or `*` forms)
    #[arg(long = "version")]
    cli_version: Option<String>,

    /// Retries after a failed fetch attempt
    #[arg(long)]
    max_retries: Option<u32>,

    #[arg(long, value_enum, default_value_t)]
    fetcher: FetcherKind,
}

#[derive(Subcommand)]
enum Command {
    /// Install the CLI and export its location
    Install(InstallArgs),

    /// Install the CLI and run it
    Run {
        #[command(flatten)]
        install: InstallArgs,

        /// Do not publish the SARIF file as a build artifact
        #[arg(long)]
        no_publish: bool,

        #[arg(long, default_value = DEFAULT_ARTIFACT_NAME)]
        artifact_name: String,

        #[arg(long, default_value = DEFAULT_TELEMETRY_ENVIRONMENT)]
        telemetry_environment: String,

        /// Exit code treated as success; may be repeated (default: 0)
        #[arg(long = "success-exit-code")]
        success_exit_codes: Vec<i32>,

        /// Arguments passed to `guardian run`
        #[arg(last = true)]
        args: Vec<String>,
    },

    /// Print the latest version directory below a versions root
    Latest {
        versions_root: PathBuf,

        #[arg(long)]
        pre_release: bool,
    },
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let config = TaskConfig::from_env();
    logging::init(config.system_debug);

    let result = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?
        .block_on(execute(cli.command, config));

    if let Err(e) = &result {
        LoggingCommand::fail_task(&format!("{:#}", e)).emit();
    }
    result
}

async fn execute(command: Command, config: TaskConfig) -> anyhow::Result<()> {
    match command {
        Command::Install(args) => {
            install(args, config).await?;
            Ok(())
        }
        Command::Run {
            install: install_args,
            no_publish,
            artifact_name,
            telemetry_environment,
            success_exit_codes,
            args,
        } => {
            let (config, cli) = install(install_args, config).await?;
            let options = RunOptions {
                args,
                successful_exit_codes: if success_exit_codes.is_empty() {
                    vec![0]
                } else {
                    success_exit_codes
                },
                publish: !no_publish,
                artifact_name,
                telemetry_environment,
            };

            let runner = CliRunner::new(config, cli, Arc::new(TokioProcessRunner));
            runner.init().await;
            runner.sarif_file_variable().emit();
            let report = runner.run(&options).await?;
            for command in &report.commands {
                command.emit();
            }
            report.check()?;
            Ok(())
        }
        Command::Latest {
            versions_root,
            pre_release,
        } => {
            let resolver = VersionResolver::new(versions_root, CLI_EXECUTABLE_NAME);
            if let Some(directory) = resolver.find_latest_version_directory(pre_release)? {
                println!("{}", directory.display());
            }
            Ok(())
        }
    }
}

async fn install(
    args: InstallArgs,
    mut config: TaskConfig,
) -> anyhow::Result<(TaskConfig, InstalledCli)> {
    if let Some(version) = args.cli_version {
        config.cli_version = version;
    }
    if let Some(max_retries) = args.max_retries {
        config.max_retries = max_retries;
    }

    let spec: VersionSpecifier = config
        .cli_version_specifier()
        .with_context(|| format!("Invalid MSDO CLI version: {}", config.cli_version))?;
    debug!("spec = {:?}", spec);

    let fetcher = create_fetcher(args.fetcher, &config)?;
    let installer = Installer::new(config.clone(), fetcher);
    let cli = installer.install(&spec).await?;

    LoggingCommand::set_variable(ENV_FILE_PATH, &cli.location.executable.display().to_string())
        .emit();
    LoggingCommand::set_variable(ENV_DIRECTORY, &cli.location.directory.display().to_string())
        .emit();

    Ok((config, cli))
}
