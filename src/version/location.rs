//! Install locations derived from the versions root

use std::path::{Path, PathBuf};

/// Folder inside each version directory that holds the CLI executable
pub const TOOLS_FOLDER: &str = "tools";

/// Where an installed CLI lives on disk
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedLocation {
    /// Directory containing the executable
    pub directory: PathBuf,
    /// Full path to the executable
    pub executable: PathBuf,
}

impl ResolvedLocation {
    /// Location of `version` below `versions_root`: `<root>/<version>/tools/<executable>`
    pub fn for_version(versions_root: &Path, version: &str, executable_name: &str) -> Self {
        Self::for_package_directory(&versions_root.join(version), executable_name)
    }

    /// Location inside an already known package directory: `<package>/tools/<executable>`
    pub fn for_package_directory(package_directory: &Path, executable_name: &str) -> Self {
        Self::in_directory(package_directory.join(TOOLS_FOLDER), executable_name)
    }

    /// Location for an explicit install directory holding the executable
    pub fn in_directory(directory: PathBuf, executable_name: &str) -> Self {
        let executable = directory.join(executable_name);
        Self {
            directory,
            executable,
        }
    }

    /// Location for an explicit executable path
    pub fn for_executable(executable: PathBuf) -> Self {
        let directory = executable
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_default();
        Self {
            directory,
            executable,
        }
    }

    /// The version directory name this location was derived from, if it
    /// follows the `<version>/tools` layout
    pub fn version(&self) -> Option<&str> {
        if self.directory.file_name()? != TOOLS_FOLDER {
            return None;
        }
        self.directory.parent()?.file_name()?.to_str()
    }
}
