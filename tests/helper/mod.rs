//! Shared integration test utilities

#![allow(dead_code)]

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use tempfile::TempDir;

use msdo_task::config::{CLI_EXECUTABLE_NAME, TaskConfig};
use msdo_task::install::{FetchError, FetchOutcome, FetchRequest, PackageFetcher};

/// Fetcher that lays out a package on disk after a number of failed attempts
pub struct FlakyFetcher {
    version: String,
    failures: usize,
    attempts: AtomicUsize,
}

impl FlakyFetcher {
    /// Succeeds on the first attempt
    pub fn new(version: &str) -> Self {
        Self::failing(version, 0)
    }

    /// Fails `failures` times before succeeding
    pub fn failing(version: &str, failures: usize) -> Self {
        Self {
            version: version.to_string(),
            failures,
            attempts: AtomicUsize::new(0),
        }
    }

    pub fn attempts(&self) -> usize {
        self.attempts.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl PackageFetcher for FlakyFetcher {
    async fn fetch(&self, request: &FetchRequest) -> Result<FetchOutcome, FetchError> {
        let attempt = self.attempts.fetch_add(1, Ordering::SeqCst) + 1;
        if attempt <= self.failures {
            return Err(FetchError::InvalidResponse(format!(
                "attempt {} failed",
                attempt
            )));
        }

        let package_directory = request
            .destination
            .join(request.package_name.to_ascii_lowercase())
            .join(&self.version);
        create_executable(&package_directory.join("tools"));

        Ok(FetchOutcome {
            success: true,
            resolved_version: self.version.clone(),
            was_cached: false,
        })
    }
}

/// Create `<directory>/guardian`
pub fn create_executable(directory: &Path) -> PathBuf {
    fs::create_dir_all(directory).unwrap();
    let executable = directory.join(CLI_EXECUTABLE_NAME);
    fs::write(&executable, b"#!/bin/sh\n").unwrap();
    executable
}

/// Create version directories below `root`
pub fn create_version_directories(root: &Path, names: &[&str]) {
    for name in names {
        fs::create_dir_all(root.join(name)).unwrap();
    }
}

/// Config rooted in a fresh temporary agent directory
pub fn create_test_config() -> (TempDir, TaskConfig) {
    let temp_dir = TempDir::new().unwrap();
    let config = TaskConfig {
        agent_root: temp_dir.path().join("agent"),
        staging_directory: temp_dir.path().join("staging"),
        ..TaskConfig::default()
    };
    (temp_dir, config)
}
