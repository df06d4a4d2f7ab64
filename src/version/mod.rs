//! Version resolution for installed CLI packages
//!
//! Installed packages are laid out one directory per version below a
//! versions root:
//!
//! ```text
//! <versions root>/
//! ├── 0.182.0/tools/guardian
//! ├── 0.183.0/tools/guardian
//! └── 0.184.0-beta/tools/guardian
//! ```
//!
//! # Modules
//!
//! - [`specifier`]: Requested version (`1.2.3`, `Latest`, `1.*`, ...)
//! - [`directory`]: Version directory names and their ordering
//! - [`location`]: Directory/executable paths derived from a version
//! - [`resolver`]: Cache lookups and latest-version selection
//! - [`error`]: Error types for version resolution

pub mod directory;
pub mod error;
pub mod location;
pub mod resolver;
pub mod specifier;

pub use directory::{InstalledVersion, is_version_name};
pub use error::ResolveError;
pub use location::ResolvedLocation;
pub use resolver::VersionResolver;
pub use specifier::VersionSpecifier;
