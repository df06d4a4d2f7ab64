//! CLI package installation
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────┐     ┌─────────────┐     ┌─────────────┐
//! │  Installer  │────▶│  Resolver   │     │   Fetcher   │
//! │ (overrides, │     │(cache check,│     │ (NuGet feed,│
//! │  retry)     │────▶│  latest)    │     │  dotnet)    │
//! └─────────────┘     └─────────────┘     └─────────────┘
//!        │                                       ▲
//!        └───────────────────────────────────────┘
//! ```
//!
//! # Modules
//!
//! - [`installer`]: Override checks, cache check, fetch retry and validation
//! - [`fetcher`]: Trait for acquiring a package from a package source
//! - [`fetchers`]: NuGet and `dotnet restore` fetchers
//! - [`error`]: Fetch and install error types

pub mod error;
pub mod fetcher;
pub mod fetchers;
pub mod installer;

pub use error::{FetchError, InstallError};
pub use fetcher::{FetchOutcome, FetchRequest, PackageFetcher};
pub use installer::{InstallSource, InstalledCli, Installer};
