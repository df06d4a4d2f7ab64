//! Installed version resolution
//!
//! Answers two questions about a versions root:
//! - is a requested exact version already installed?
//! - which installed version directory is the latest one?

use std::fs;
use std::path::{Path, PathBuf};

use tracing::{debug, warn};

use crate::version::directory::{InstalledVersion, is_version_name};
use crate::version::error::ResolveError;
use crate::version::location::ResolvedLocation;
use crate::version::specifier::VersionSpecifier;

/// Resolves CLI versions against the directories below a versions root
#[derive(Debug, Clone)]
pub struct VersionResolver {
    versions_root: PathBuf,
    executable_name: String,
}

impl VersionResolver {
    pub fn new(versions_root: impl Into<PathBuf>, executable_name: impl Into<String>) -> Self {
        Self {
            versions_root: versions_root.into(),
            executable_name: executable_name.into(),
        }
    }

    pub fn versions_root(&self) -> &Path {
        &self.versions_root
    }

    /// Location of an exact version, whether or not it exists
    pub fn location_for(&self, version: &str) -> ResolvedLocation {
        ResolvedLocation::for_version(&self.versions_root, version, &self.executable_name)
    }

    /// Returns the location of `spec` if it is already installed.
    ///
    /// Wildcard specifiers never match the cache, so "latest" always goes
    /// through the package source.
    pub fn installed_location(&self, spec: &VersionSpecifier) -> Option<ResolvedLocation> {
        let VersionSpecifier::Exact(version) = spec else {
            debug!(
                "CLI version contains a latest quantifier: {}. Continuing with install...",
                spec
            );
            return None;
        };

        let location = self.location_for(version);
        debug!("Checking for installed CLI at {:?}", location.directory);

        location.directory.exists().then_some(location)
    }

    pub fn is_installed(&self, spec: &VersionSpecifier) -> bool {
        self.installed_location(spec).is_some()
    }

    /// Find the directory of the latest installed version.
    ///
    /// Entries that are not directories or whose names are not versions are
    /// skipped. Pre-release directories are skipped unless `include_pre_release`.
    pub fn find_latest_version_directory(
        &self,
        include_pre_release: bool,
    ) -> Result<Option<PathBuf>, ResolveError> {
        debug!(
            "Searching for all version folders in: {:?}",
            self.versions_root
        );

        let mut latest: Option<InstalledVersion> = None;

        for name in self.version_directory_names()? {
            debug!("Evaluating version directory: {}", name);

            let Some(version) = InstalledVersion::parse(&name) else {
                if is_version_name(&name) {
                    debug!("Skipping version directory with an out of range number: {}", name);
                } else {
                    debug!("Skipping invalid version directory: {}", name);
                }
                continue;
            };

            if version.is_pre_release() && !include_pre_release {
                debug!("Skipping pre-release version directory: {}", name);
                continue;
            }

            let is_latest = match &latest {
                None => true,
                Some(current) => version.supersedes(current, include_pre_release),
            };

            if is_latest {
                debug!("Setting latest version directory: {}", name);
                latest = Some(version);
            }
        }

        let latest_directory = latest.map(|version| self.versions_root.join(version.name()));
        debug!("latest_directory = {:?}", latest_directory);

        Ok(latest_directory)
    }

    /// Resolve the final install location after packages were fetched.
    ///
    /// Wildcards pick the latest installed directory; exact versions map
    /// straight to their location. Returns None when nothing qualifies.
    pub fn resolve_location(&self, spec: &VersionSpecifier) -> Option<ResolvedLocation> {
        match spec {
            VersionSpecifier::Exact(version) => Some(self.location_for(version)),
            _ => self
                .find_latest_version_directory(spec.includes_pre_release())
                .inspect_err(|e| warn!("Failed to find latest CLI version: {}", e))
                .ok()
                .flatten()
                .map(|package_directory| {
                    ResolvedLocation::for_package_directory(
                        &package_directory,
                        &self.executable_name,
                    )
                }),
        }
    }

    /// Names of the immediate subdirectories of the versions root.
    ///
    /// Symlinks are followed when checking for directories.
    fn version_directory_names(&self) -> Result<Vec<String>, ResolveError> {
        let read_dir_error = |source| ResolveError::ReadDir {
            path: self.versions_root.clone(),
            source,
        };

        let mut names = Vec::new();
        for entry in fs::read_dir(&self.versions_root).map_err(read_dir_error)? {
            let entry = entry.map_err(read_dir_error)?;
            let is_dir = fs::metadata(entry.path())
                .map(|metadata| metadata.is_dir())
                .unwrap_or(false);
            if !is_dir {
                continue;
            }

            match entry.file_name().into_string() {
                Ok(name) => names.push(name),
                Err(name) => debug!("Skipping non UTF-8 directory name: {:?}", name),
            }
        }

        Ok(names)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use tempfile::TempDir;

    fn create_versions_root(dirs: &[&str]) -> (TempDir, VersionResolver) {
        let temp_dir = TempDir::new().unwrap();
        for dir in dirs {
            fs::create_dir_all(temp_dir.path().join(dir)).unwrap();
        }
        let resolver = VersionResolver::new(temp_dir.path(), "guardian");
        (temp_dir, resolver)
    }

    fn latest_name(resolver: &VersionResolver, include_pre_release: bool) -> Option<String> {
        resolver
            .find_latest_version_directory(include_pre_release)
            .unwrap()
            .map(|path| path.file_name().unwrap().to_string_lossy().into_owned())
    }

    #[rstest]
    #[case(vec!["1.0.0", "1.2.0", "1.10.0"], false, Some("1.10.0"))]
    #[case(vec!["2.0.0-beta", "1.9.0"], false, Some("1.9.0"))]
    #[case(vec!["2.0.0-beta", "1.9.0"], true, Some("2.0.0-beta"))]
    #[case(vec![], false, None)]
    #[case(vec!["not-a-version", "1.0"], false, Some("1.0"))]
    #[case(vec!["not-a-version", "tools"], false, None)]
    #[case(vec!["2.0.0-beta"], false, None)]
    #[case(vec!["0.9", "0.10.1", "0.10"], false, Some("0.10.1"))]
    #[case(vec!["1.0.0-alpha", "1.0.0-beta"], true, Some("1.0.0-beta"))]
    #[case(vec!["1.0.0-beta", "1.0.0"], true, Some("1.0.0"))]
    #[case(vec!["1.2.3.4.5.6", "1.2.3.4.5.5"], false, Some("1.2.3.4.5.6"))]
    #[case(vec!["99999999999999999999999", "1.0.0"], false, Some("1.0.0"))]
    fn find_latest_version_directory_returns_expected(
        #[case] dirs: Vec<&str>,
        #[case] include_pre_release: bool,
        #[case] expected: Option<&str>,
    ) {
        let (_temp_dir, resolver) = create_versions_root(&dirs);

        assert_eq!(
            latest_name(&resolver, include_pre_release),
            expected.map(|s| s.to_string())
        );
    }

    #[test]
    fn find_latest_version_directory_ignores_files() {
        let (temp_dir, resolver) = create_versions_root(&["1.0.0"]);
        fs::write(temp_dir.path().join("9.9.9"), b"not a directory").unwrap();

        assert_eq!(latest_name(&resolver, false), Some("1.0.0".to_string()));
    }

    #[cfg(unix)]
    #[test]
    fn find_latest_version_directory_follows_symlinks() {
        let (temp_dir, resolver) = create_versions_root(&["1.0.0"]);
        let target = TempDir::new().unwrap();
        std::os::unix::fs::symlink(target.path(), temp_dir.path().join("3.0.0")).unwrap();

        assert_eq!(latest_name(&resolver, false), Some("3.0.0".to_string()));
    }

    #[test]
    fn find_latest_version_directory_returns_full_path() {
        let (temp_dir, resolver) = create_versions_root(&["1.0.0"]);

        assert_eq!(
            resolver.find_latest_version_directory(false).unwrap(),
            Some(temp_dir.path().join("1.0.0"))
        );
    }

    #[test]
    fn find_latest_version_directory_fails_for_missing_root() {
        let temp_dir = TempDir::new().unwrap();
        let resolver = VersionResolver::new(temp_dir.path().join("missing"), "guardian");

        assert!(matches!(
            resolver.find_latest_version_directory(false),
            Err(ResolveError::ReadDir { .. })
        ));
    }

    #[test]
    fn is_installed_returns_true_when_tools_directory_exists() {
        let (temp_dir, resolver) = create_versions_root(&["1.2.3/tools"]);
        let spec: VersionSpecifier = "1.2.3".parse().unwrap();

        assert!(resolver.is_installed(&spec));
        assert_eq!(
            resolver.installed_location(&spec).unwrap().executable,
            temp_dir.path().join("1.2.3").join("tools").join("guardian")
        );
    }

    #[test]
    fn is_installed_returns_false_when_version_missing() {
        let (_temp_dir, resolver) = create_versions_root(&["1.2.2/tools"]);

        assert!(!resolver.is_installed(&"1.2.3".parse().unwrap()));
    }

    #[test]
    fn is_installed_returns_false_when_tools_folder_missing() {
        let (_temp_dir, resolver) = create_versions_root(&["1.2.3"]);

        assert!(!resolver.is_installed(&"1.2.3".parse().unwrap()));
    }

    #[rstest]
    #[case("1.*")]
    #[case("Latest")]
    #[case("LatestPreRelease")]
    fn is_installed_is_false_for_wildcards_regardless_of_disk(#[case] spec: &str) {
        let (_temp_dir, resolver) = create_versions_root(&["1.0.0/tools", "1.2.3/tools"]);

        assert!(!resolver.is_installed(&spec.parse().unwrap()));
    }

    #[test]
    fn resolve_location_picks_latest_for_wildcard() {
        let (temp_dir, resolver) = create_versions_root(&["1.0.0", "1.1.0", "2.0.0-rc1"]);

        let location = resolver.resolve_location(&"Latest".parse().unwrap()).unwrap();

        assert_eq!(location.directory, temp_dir.path().join("1.1.0").join("tools"));
        assert_eq!(location.version(), Some("1.1.0"));
    }

    #[test]
    fn resolve_location_includes_pre_release_when_requested() {
        let (_temp_dir, resolver) = create_versions_root(&["1.0.0", "1.1.0", "2.0.0-rc1"]);

        let location = resolver
            .resolve_location(&"LatestPreRelease".parse().unwrap())
            .unwrap();

        assert_eq!(location.version(), Some("2.0.0-rc1"));
    }

    #[test]
    fn resolve_location_returns_none_when_root_missing() {
        let temp_dir = TempDir::new().unwrap();
        let resolver = VersionResolver::new(temp_dir.path().join("missing"), "guardian");

        assert_eq!(resolver.resolve_location(&"Latest".parse().unwrap()), None);
    }

    #[test]
    fn resolve_location_maps_exact_version_without_touching_disk() {
        let temp_dir = TempDir::new().unwrap();
        let resolver = VersionResolver::new(temp_dir.path(), "guardian");

        let location = resolver.resolve_location(&"1.2.3".parse().unwrap()).unwrap();

        assert_eq!(location, resolver.location_for("1.2.3"));
    }
}
