use std::path::PathBuf;

use thiserror::Error;

/// Failure of a single package fetch attempt
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("Package not found: {0}")]
    NotFound(String),

    #[error("Unexpected status {status} from {url}")]
    Status { status: u16, url: String },

    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    #[error("No matching version of {package} for {version}")]
    NoMatchingVersion { package: String, version: String },

    #[error("Invalid package archive: {0}")]
    Archive(#[from] zip::result::ZipError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("{program} exited with {}", exit_description(.code))]
    Process { program: String, code: Option<i32> },
}

fn exit_description(code: &Option<i32>) -> String {
    match code {
        Some(code) => format!("code {code}"),
        None => "a signal".to_string(),
    }
}

/// Failure of the overall install operation
#[derive(Debug, Error)]
pub enum InstallError {
    #[error("Failed to create directory {path}: {source}")]
    CreateDirectory {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("MSDO CLI v{version} was not found after installation")]
    NotFoundAfterInstall {
        version: String,
        /// Last fetch failure, kept for diagnostics only
        #[source]
        last_fetch_error: Option<FetchError>,
    },
}
