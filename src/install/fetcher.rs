//! Package fetcher trait for acquiring CLI packages from a package source

#[cfg(test)]
use mockall::automock;

use std::path::PathBuf;

use crate::install::error::FetchError;

/// What to fetch and where to put it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchRequest {
    /// Package source, e.g. `https://api.nuget.org/v3/index.json`
    pub source_url: String,
    /// Package id, e.g. `Microsoft.Security.DevOps.Cli`
    pub package_name: String,
    /// Version text as requested (`1.2.3`, `Latest`, ...)
    pub version: String,
    /// Packages directory; packages land in `<destination>/<id lowercase>/<version>/`
    pub destination: PathBuf,
}

/// Result of one successful fetch
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchOutcome {
    pub success: bool,
    /// Concrete version that was made available
    pub resolved_version: String,
    /// True when the package was already present and nothing was downloaded
    pub was_cached: bool,
}

/// Trait for fetching a package into a local packages directory
///
/// Implementations make a single attempt; retrying is the installer's job.
#[cfg_attr(test, automock)]
#[async_trait::async_trait]
pub trait PackageFetcher: Send + Sync {
    /// Fetch the package described by `request`
    ///
    /// # Returns
    /// * `Ok(FetchOutcome)` - The package is present below the destination
    /// * `Err(FetchError)` - The attempt failed (network, archive, process, ...)
    async fn fetch(&self, request: &FetchRequest) -> Result<FetchOutcome, FetchError>;
}
