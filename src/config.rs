use std::path::PathBuf;

use crate::version::error::ResolveError;
use crate::version::specifier::VersionSpecifier;

// =============================================================================
// Package constants
// =============================================================================

/// CLI version installed when `MSDO_VERSION` is not set
pub const DEFAULT_CLI_VERSION: &str = "Latest";

/// Retries after the first failed fetch attempt (3 attempts in total)
pub const DEFAULT_MAX_RETRIES: u32 = 2;

/// NuGet package id of the CLI
pub const CLI_PACKAGE_NAME: &str = "Microsoft.Security.DevOps.Cli";

/// Executable name inside the package's `tools` folder
pub const CLI_EXECUTABLE_NAME: &str = "guardian";

/// Package source the CLI is fetched from
pub const NUGET_SOURCE_URL: &str = "https://api.nuget.org/v3/index.json";

/// Folder below the agent root that holds packages and versions
pub const AGENT_DIRECTORY_NAME: &str = "_msdo";

// =============================================================================
// Environment variables
// =============================================================================

pub const ENV_VERSION: &str = "MSDO_VERSION";
pub const ENV_FILE_PATH: &str = "MSDO_FILEPATH";
pub const ENV_DIRECTORY: &str = "MSDO_DIRECTORY";
pub const ENV_PACKAGES_DIRECTORY: &str = "MSDO_PACKAGES_DIRECTORY";
pub const ENV_AGENT_ROOT: &str = "AGENT_ROOTDIRECTORY";
pub const ENV_STAGING_DIRECTORY: &str = "BUILD_STAGINGDIRECTORY";
pub const ENV_GITHUB_WORKSPACE: &str = "GITHUB_WORKSPACE";
pub const ENV_LOGGER_LEVEL: &str = "GDN_LOGGERLEVEL";
pub const ENV_SYSTEM_DEBUG: &str = "SYSTEM_DEBUG";

/// Task configuration, read once from the environment
#[derive(Debug, Clone, PartialEq)]
pub struct TaskConfig {
    /// Requested CLI version text
    pub cli_version: String,
    /// Explicit executable path; skips installation entirely
    pub file_path_override: Option<PathBuf>,
    /// Explicit install directory; skips installation entirely
    pub directory_override: Option<PathBuf>,
    /// Packages cache directory used instead of `<agent dir>/packages`
    pub packages_directory_override: Option<PathBuf>,
    /// Root directory of the build agent
    pub agent_root: PathBuf,
    /// Directory the SARIF file is written below
    pub staging_directory: PathBuf,
    /// Logger level forwarded to the CLI
    pub logger_level: Option<String>,
    /// Pipeline debug mode
    pub system_debug: bool,
    pub max_retries: u32,
    pub source_url: String,
}

impl Default for TaskConfig {
    fn default() -> Self {
        Self {
            cli_version: DEFAULT_CLI_VERSION.to_string(),
            file_path_override: None,
            directory_override: None,
            packages_directory_override: None,
            agent_root: PathBuf::from("."),
            staging_directory: PathBuf::from("."),
            logger_level: None,
            system_debug: false,
            max_retries: DEFAULT_MAX_RETRIES,
            source_url: NUGET_SOURCE_URL.to_string(),
        }
    }
}

impl TaskConfig {
    /// Reads the configuration from the process environment.
    pub fn from_env() -> Self {
        Self::from_env_with(|key| std::env::var(key).ok(), dirs::home_dir())
    }

    /// Builds the configuration from an environment lookup.
    ///
    /// Empty or whitespace-only values count as unset. The agent root falls
    /// back to the home directory, then to the current directory.
    pub fn from_env_with<F>(lookup: F, home_dir: Option<PathBuf>) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());

        let agent_root = get(ENV_AGENT_ROOT)
            .map(PathBuf::from)
            .or(home_dir)
            .unwrap_or_else(|| PathBuf::from("."));

        let staging_directory = get(ENV_STAGING_DIRECTORY)
            .or_else(|| get(ENV_GITHUB_WORKSPACE))
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from("."));

        Self {
            cli_version: get(ENV_VERSION).unwrap_or_else(|| DEFAULT_CLI_VERSION.to_string()),
            file_path_override: get(ENV_FILE_PATH).map(PathBuf::from),
            directory_override: get(ENV_DIRECTORY).map(PathBuf::from),
            packages_directory_override: get(ENV_PACKAGES_DIRECTORY).map(PathBuf::from),
            agent_root,
            staging_directory,
            logger_level: get(ENV_LOGGER_LEVEL),
            system_debug: get(ENV_SYSTEM_DEBUG).is_some_and(|v| v.eq_ignore_ascii_case("true")),
            max_retries: DEFAULT_MAX_RETRIES,
            source_url: NUGET_SOURCE_URL.to_string(),
        }
    }

    /// The version specifier to install.
    ///
    /// `*` forms such as `1.*` are collapsed to `Latest`.
    pub fn cli_version_specifier(&self) -> Result<VersionSpecifier, ResolveError> {
        self.cli_version
            .parse::<VersionSpecifier>()
            .map(VersionSpecifier::normalized)
    }

    /// `<agent root>/_msdo`
    pub fn agent_directory(&self) -> PathBuf {
        self.agent_root.join(AGENT_DIRECTORY_NAME)
    }

    /// Packages cache directory, honoring `MSDO_PACKAGES_DIRECTORY`
    pub fn packages_directory(&self) -> PathBuf {
        self.packages_directory_override
            .clone()
            .unwrap_or_else(|| self.agent_directory().join("packages"))
    }

    /// Directory packages are restored into: `<agent dir>/versions`
    pub fn versions_directory(&self) -> PathBuf {
        self.agent_directory().join("versions")
    }

    /// Root of the per-version directories: `<versions dir>/<package id lowercase>`
    pub fn versions_root(&self) -> PathBuf {
        self.versions_directory()
            .join(CLI_PACKAGE_NAME.to_ascii_lowercase())
    }

    /// `<staging dir>/.gdn/msdo.sarif`
    pub fn sarif_file(&self) -> PathBuf {
        self.staging_directory.join(".gdn").join("msdo.sarif")
    }
}
