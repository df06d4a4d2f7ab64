//! Package fetcher implementations

mod dotnet;
mod nuget;

pub use dotnet::{DotnetRestoreFetcher, RESTORE_PROJECT_FILE, nuget_version};
pub use nuget::{NugetFetcher, select_latest};

use std::sync::Arc;

use crate::config::TaskConfig;
use crate::install::error::FetchError;
use crate::install::fetcher::PackageFetcher;
use crate::process::TokioProcessRunner;

/// Available ways of fetching the CLI package
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum FetcherKind {
    /// Download straight from the NuGet v3 feed
    #[default]
    Nuget,
    /// Run `dotnet restore` on a generated project
    Dotnet,
}

/// Create the fetcher for `kind`
pub fn create_fetcher(
    kind: FetcherKind,
    config: &TaskConfig,
) -> Result<Arc<dyn PackageFetcher>, FetchError> {
    Ok(match kind {
        FetcherKind::Nuget => Arc::new(NugetFetcher::new()?),
        FetcherKind::Dotnet => Arc::new(DotnetRestoreFetcher::new(
            config.agent_directory(),
            Arc::new(TokioProcessRunner),
        )),
    })
}
