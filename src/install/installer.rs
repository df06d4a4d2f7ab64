//! CLI installation
//!
//! Installation steps, in order:
//! 1. `MSDO_FILEPATH` override: accepted as-is
//! 2. `MSDO_DIRECTORY` override: executable derived from it
//! 3. Local agent, packages and versions directories are created
//! 4. Exact versions already on disk are used from the cache
//! 5. The package is fetched, retrying failed attempts
//! 6. The final location is resolved (latest directory for wildcards)
//! 7. The executable must exist, otherwise installation failed

use std::fs;
use std::path::Path;
use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::config::{CLI_EXECUTABLE_NAME, CLI_PACKAGE_NAME, TaskConfig};
use crate::install::error::{FetchError, InstallError};
use crate::install::fetcher::{FetchOutcome, FetchRequest, PackageFetcher};
use crate::version::location::ResolvedLocation;
use crate::version::resolver::VersionResolver;
use crate::version::specifier::VersionSpecifier;

/// How the CLI location was obtained
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InstallSource {
    /// `MSDO_FILEPATH` pointed at the executable
    FilePathOverride,
    /// `MSDO_DIRECTORY` pointed at the install directory
    DirectoryOverride,
    /// The requested exact version was already installed
    Cached,
    /// The package was fetched from the package source
    Fetched,
}

/// An installed CLI, handed to the invocation step
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstalledCli {
    pub location: ResolvedLocation,
    pub source: InstallSource,
    /// Installed version, when known from the directory layout
    pub version: Option<String>,
}

impl InstalledCli {
    fn new(location: ResolvedLocation, source: InstallSource) -> Self {
        let version = location.version().map(str::to_string);
        Self {
            location,
            source,
            version,
        }
    }
}

/// Installs the CLI package into the agent directory
pub struct Installer {
    config: TaskConfig,
    fetcher: Arc<dyn PackageFetcher>,
}

impl Installer {
    pub fn new(config: TaskConfig, fetcher: Arc<dyn PackageFetcher>) -> Self {
        Self { config, fetcher }
    }

    pub fn config(&self) -> &TaskConfig {
        &self.config
    }

    /// Make the requested CLI version available and return its location.
    ///
    /// Fetch failures are retried and only logged; the operation fails when
    /// the executable is missing once all attempts are done.
    pub async fn install(&self, spec: &VersionSpecifier) -> Result<InstalledCli, InstallError> {
        info!("Installing Microsoft Security DevOps Cli...");

        if let Some(file_path) = &self.config.file_path_override {
            info!(
                "MSDO CLI File Path overridden by %MSDO_FILEPATH%: {}",
                file_path.display()
            );
            return Ok(InstalledCli::new(
                ResolvedLocation::for_executable(file_path.clone()),
                InstallSource::FilePathOverride,
            ));
        }

        if let Some(directory) = &self.config.directory_override {
            info!(
                "MSDO CLI Directory overridden by %MSDO_DIRECTORY%: {}",
                directory.display()
            );
            let location = ResolvedLocation::in_directory(directory.clone(), CLI_EXECUTABLE_NAME);
            debug!("executable = {:?}", location.executable);
            return Ok(InstalledCli::new(location, InstallSource::DirectoryOverride));
        }

        let agent_directory = self.config.agent_directory();
        ensure_directory(&agent_directory)?;
        ensure_directory(&self.config.packages_directory())?;
        let versions_directory = self.config.versions_directory();
        ensure_directory(&versions_directory)?;

        let resolver = VersionResolver::new(self.config.versions_root(), CLI_EXECUTABLE_NAME);
        debug!("versions_root = {:?}", resolver.versions_root());

        if let Some(location) = resolver.installed_location(spec) {
            info!("MSDO CLI v{} already installed.", spec);
            return Ok(InstalledCli::new(location, InstallSource::Cached));
        }

        let request = FetchRequest {
            source_url: self.config.source_url.clone(),
            package_name: CLI_PACKAGE_NAME.to_string(),
            version: spec.to_string(),
            destination: versions_directory,
        };
        let last_fetch_error = self.fetch_with_retry(&request).await;

        let location = resolver
            .resolve_location(spec)
            .filter(|location| location.executable.exists())
            .ok_or_else(|| InstallError::NotFoundAfterInstall {
                version: spec.to_string(),
                last_fetch_error,
            })?;

        info!("MSDO CLI installed at {}", location.executable.display());
        Ok(InstalledCli::new(location, InstallSource::Fetched))
    }

    /// Fetch the package, making up to `max_retries + 1` attempts.
    ///
    /// Returns the error of the last attempt if none succeeded.
    async fn fetch_with_retry(&self, request: &FetchRequest) -> Option<FetchError> {
        let max_attempts = self.config.max_retries + 1;
        let mut last_error = None;

        for attempt in 1..=max_attempts {
            debug!(
                "Fetching {} {} (attempt {}/{})",
                request.package_name, request.version, attempt, max_attempts
            );

            match self.fetcher.fetch(request).await {
                Ok(FetchOutcome {
                    success: true,
                    resolved_version,
                    was_cached,
                }) => {
                    if was_cached {
                        info!("{} v{} found in package cache", request.package_name, resolved_version);
                    } else {
                        info!("Fetched {} v{}", request.package_name, resolved_version);
                    }
                    return None;
                }
                Ok(_) => {
                    warn!(
                        "Fetch attempt {}/{} for {} reported no success",
                        attempt, max_attempts, request.package_name
                    );
                }
                Err(e) => {
                    warn!(
                        "Fetch attempt {}/{} for {} failed: {}",
                        attempt, max_attempts, request.package_name, e
                    );
                    last_error = Some(e);
                }
            }
        }

        last_error
    }
}

fn ensure_directory(directory: &Path) -> Result<(), InstallError> {
    debug!("Ensuring directory {:?}", directory);
    fs::create_dir_all(directory).map_err(|source| InstallError::CreateDirectory {
        path: directory.to_path_buf(),
        source,
    })
}
