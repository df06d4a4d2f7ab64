//! `dotnet restore` package fetcher
//!
//! Restores a small generated project whose only job is to reference the
//! CLI package, letting NuGet place it in the packages directory.

use std::fs;
use std::path::PathBuf;
use std::sync::Arc;

use tracing::debug;

use crate::install::error::FetchError;
use crate::install::fetcher::{FetchOutcome, FetchRequest, PackageFetcher};
use crate::process::{ProcessCommand, ProcessRunner};
use crate::version::specifier::VersionSpecifier;

const DOTNET_PROGRAM: &str = "dotnet";

/// File name of the generated restore project
pub const RESTORE_PROJECT_FILE: &str = "msdo-task-lib.proj";

const RESTORE_PROJECT: &str = r#"<Project Sdk="Microsoft.NET.Sdk">
  <PropertyGroup>
    <TargetFramework>netstandard2.0</TargetFramework>
    <NoWarn>$(NoWarn);NU1603</NoWarn>
  </PropertyGroup>
  <ItemGroup>
    <PackageReference Include="$(MsdoPackageName)" Version="$(MsdoPackageVersion)" />
  </ItemGroup>
</Project>
"#;

/// Package fetcher backed by `dotnet restore`
pub struct DotnetRestoreFetcher {
    project_directory: PathBuf,
    runner: Arc<dyn ProcessRunner>,
}

impl DotnetRestoreFetcher {
    /// `project_directory` receives the generated restore project
    pub fn new(project_directory: impl Into<PathBuf>, runner: Arc<dyn ProcessRunner>) -> Self {
        Self {
            project_directory: project_directory.into(),
            runner,
        }
    }

    fn write_project(&self) -> Result<PathBuf, FetchError> {
        fs::create_dir_all(&self.project_directory)?;
        let project_file = self.project_directory.join(RESTORE_PROJECT_FILE);
        fs::write(&project_file, RESTORE_PROJECT)?;
        debug!("project_file = {:?}", project_file);
        Ok(project_file)
    }
}

/// NuGet version text for a requested version.
///
/// Latest maps to the floating range `*`, pre-releases included to `*-*`.
pub fn nuget_version(version: &str) -> String {
    match version.parse::<VersionSpecifier>() {
        Ok(VersionSpecifier::Exact(exact)) => exact,
        Ok(VersionSpecifier::LatestPreRelease(_)) => "*-*".to_string(),
        Ok(VersionSpecifier::Latest(raw)) if raw.contains('*') => raw,
        _ => "*".to_string(),
    }
}

#[async_trait::async_trait]
impl PackageFetcher for DotnetRestoreFetcher {
    async fn fetch(&self, request: &FetchRequest) -> Result<FetchOutcome, FetchError> {
        let project_file = self.write_project()?;
        let version = nuget_version(&request.version);

        let command = ProcessCommand::new(DOTNET_PROGRAM)
            .arg("restore")
            .arg(project_file.to_string_lossy())
            .arg(format!("/p:MsdoPackageName={}", request.package_name))
            .arg(format!("/p:MsdoPackageVersion={}", version))
            .arg("--packages")
            .arg(request.destination.to_string_lossy())
            .arg("--source")
            .arg(request.source_url.as_str())
            .env("DOTNET_NOLOGO", "1")
            .env("DOTNET_CLI_TELEMETRY_OPTOUT", "1");

        match self.runner.run(&command).await? {
            Some(0) => Ok(FetchOutcome {
                success: true,
                resolved_version: version,
                was_cached: false,
            }),
            code => Err(FetchError::Process {
                program: DOTNET_PROGRAM.to_string(),
                code,
            }),
        }
    }
}
