//! NuGet v3 package fetcher
//!
//! Downloads packages straight from a NuGet v3 feed:
//! 1. The service index (`index.json`) names the flat container base address
//! 2. `<base>/<id>/index.json` lists versions (only needed for "latest")
//! 3. `<base>/<id>/<version>/<id>.<version>.nupkg` is downloaded and unzipped
//!
//! Packages are unpacked into `<destination>/<id>/<version>/`, the same
//! layout `dotnet restore --packages` produces.

use std::fs::{self, File};
use std::io::{self, Cursor};
use std::path::{Path, PathBuf};

use semver::Version;
use serde::Deserialize;
use tracing::{debug, info, warn};

use crate::install::error::FetchError;
use crate::install::fetcher::{FetchOutcome, FetchRequest, PackageFetcher};
use crate::version::directory::InstalledVersion;
use crate::version::specifier::VersionSpecifier;

/// Service index resource type of the flat container
const PACKAGE_BASE_ADDRESS_TYPE: &str = "PackageBaseAddress/3.0.0";

/// Suffix of the staging directory a package is unpacked into before it is moved in place
const STAGING_SUFFIX: &str = ".partial";

#[derive(Debug, Deserialize)]
struct ServiceIndex {
    resources: Vec<ServiceResource>,
}

#[derive(Debug, Deserialize)]
struct ServiceResource {
    #[serde(rename = "@id")]
    id: String,
    #[serde(rename = "@type")]
    resource_type: String,
}

#[derive(Debug, Deserialize)]
struct VersionIndex {
    versions: Vec<String>,
}

/// Package fetcher for NuGet v3 feeds
pub struct NugetFetcher {
    client: reqwest::Client,
}

impl NugetFetcher {
    pub fn new() -> Result<Self, FetchError> {
        let client = reqwest::Client::builder()
            .user_agent(concat!("msdo-task/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self { client })
    }

    async fn get_json<T: serde::de::DeserializeOwned>(
        &self,
        url: &str,
        package_name: &str,
    ) -> Result<T, FetchError> {
        let response = self.get(url, package_name).await?;
        response.json::<T>().await.map_err(|e| {
            warn!("Failed to parse response from {}: {}", url, e);
            FetchError::InvalidResponse(e.to_string())
        })
    }

    async fn get(&self, url: &str, package_name: &str) -> Result<reqwest::Response, FetchError> {
        debug!("GET {}", url);
        let response = self.client.get(url).send().await?;
        let status = response.status();

        if status == reqwest::StatusCode::NOT_FOUND {
            return Err(FetchError::NotFound(package_name.to_string()));
        }

        if !status.is_success() {
            warn!("Package source returned status {}: {}", status, url);
            return Err(FetchError::Status {
                status: status.as_u16(),
                url: url.to_string(),
            });
        }

        Ok(response)
    }

    /// Flat container base address from the service index, without trailing slash
    async fn package_base_address(&self, request: &FetchRequest) -> Result<String, FetchError> {
        let index: ServiceIndex = self
            .get_json(&request.source_url, &request.package_name)
            .await?;

        index
            .resources
            .into_iter()
            .find(|resource| resource.resource_type == PACKAGE_BASE_ADDRESS_TYPE)
            .map(|resource| resource.id.trim_end_matches('/').to_string())
            .ok_or_else(|| {
                FetchError::InvalidResponse(format!(
                    "{} has no {} resource",
                    request.source_url, PACKAGE_BASE_ADDRESS_TYPE
                ))
            })
    }

    /// Concrete version to download for the request
    async fn resolve_version(
        &self,
        base_address: &str,
        package_id: &str,
        request: &FetchRequest,
    ) -> Result<String, FetchError> {
        let spec = request
            .version
            .parse::<VersionSpecifier>()
            .map_err(|e| FetchError::InvalidResponse(e.to_string()))?;

        if let VersionSpecifier::Exact(version) = &spec {
            return Ok(version.to_ascii_lowercase());
        }

        let url = format!("{}/{}/index.json", base_address, package_id);
        let index: VersionIndex = self.get_json(&url, &request.package_name).await?;

        select_latest(&index.versions, spec.includes_pre_release()).ok_or_else(|| {
            FetchError::NoMatchingVersion {
                package: request.package_name.clone(),
                version: request.version.clone(),
            }
        })
    }
}

#[async_trait::async_trait]
impl PackageFetcher for NugetFetcher {
    async fn fetch(&self, request: &FetchRequest) -> Result<FetchOutcome, FetchError> {
        let package_id = request.package_name.to_ascii_lowercase();
        let base_address = self.package_base_address(request).await?;
        let version = self.resolve_version(&base_address, &package_id, request).await?;

        let package_directory = request.destination.join(&package_id).join(&version);
        if package_directory.is_dir() {
            debug!("{} already present at {:?}", version, package_directory);
            return Ok(FetchOutcome {
                success: true,
                resolved_version: version,
                was_cached: true,
            });
        }

        let url = format!(
            "{base}/{id}/{version}/{id}.{version}.nupkg",
            base = base_address,
            id = package_id,
            version = version
        );
        info!("Downloading {} v{} from {}", request.package_name, version, url);

        let body = self.get(&url, &request.package_name).await?.bytes().await?;
        debug!("Downloaded {} bytes", body.len());

        let target = package_directory.clone();
        tokio::task::spawn_blocking(move || unpack_package(Cursor::new(body), &target))
            .await
            .map_err(|e| FetchError::Io(io::Error::other(e)))??;

        info!("Installed {} v{} to {:?}", request.package_name, version, package_directory);

        Ok(FetchOutcome {
            success: true,
            resolved_version: version,
            was_cached: false,
        })
    }
}

/// Highest version in the list, skipping pre-releases unless requested.
///
/// Only versions that are valid semver and also valid version directory
/// names are considered, so the unpacked package can be found again.
pub fn select_latest(versions: &[String], include_pre_release: bool) -> Option<String> {
    versions
        .iter()
        .filter(|v| InstalledVersion::parse(v).is_some())
        .filter_map(|v| Version::parse(v).ok().map(|parsed| (v, parsed)))
        .filter(|(_, parsed)| include_pre_release || parsed.pre.is_empty())
        .max_by(|(_, a), (_, b)| a.cmp(b))
        .map(|(original, _)| original.clone())
}

/// Unpack a `.nupkg` archive into `target`.
///
/// The archive is extracted next to `target` first and renamed into place,
/// so a version directory never holds a half-extracted package.
fn unpack_package<R: io::Read + io::Seek>(reader: R, target: &Path) -> Result<(), FetchError> {
    let staging = staging_directory(target);
    if staging.exists() {
        fs::remove_dir_all(&staging)?;
    }
    fs::create_dir_all(&staging)?;

    if let Err(e) = extract_zip(reader, &staging) {
        let _ = fs::remove_dir_all(&staging);
        return Err(e);
    }

    fs::rename(&staging, target)?;
    Ok(())
}

fn staging_directory(target: &Path) -> PathBuf {
    let mut name = target.file_name().unwrap_or_default().to_os_string();
    name.push(STAGING_SUFFIX);
    target.with_file_name(name)
}

fn extract_zip<R: io::Read + io::Seek>(reader: R, dest_dir: &Path) -> Result<(), FetchError> {
    let mut archive = zip::ZipArchive::new(reader)?;

    for i in 0..archive.len() {
        let mut entry = archive.by_index(i)?;
        let Some(entry_path) = entry.enclosed_name() else {
            debug!("Skipping unsafe path in package: {}", entry.name());
            continue;
        };

        let dest_path = dest_dir.join(&entry_path);

        if entry.is_dir() {
            fs::create_dir_all(&dest_path)?;
            continue;
        }

        if let Some(parent) = dest_path.parent() {
            fs::create_dir_all(parent)?;
        }

        let mut outfile = File::create(&dest_path)?;
        io::copy(&mut entry, &mut outfile)?;

        #[cfg(unix)]
        mark_tool_executable(&entry_path, &dest_path)?;
    }

    debug!("Package extraction complete");
    Ok(())
}

/// Package archives carry no Unix modes; everything under `tools/` is made executable.
#[cfg(unix)]
fn mark_tool_executable(entry_path: &Path, dest_path: &Path) -> io::Result<()> {
    use std::os::unix::fs::PermissionsExt;

    if entry_path.starts_with("tools") {
        fs::set_permissions(dest_path, fs::Permissions::from_mode(0o755))?;
    }
    Ok(())
}
