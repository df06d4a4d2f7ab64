//! Requested CLI version specifiers
//!
//! Supported forms:
//! - `1.2.3`, `0.183.0-beta` - exact version (up to six numeric components)
//! - `Latest`, `*`, `1.*` - latest stable version
//! - `LatestPreRelease` - latest version including pre-releases

use std::fmt;
use std::str::FromStr;

use crate::version::directory::InstalledVersion;
use crate::version::error::ResolveError;

/// Marker that turns any specifier into a "resolve to latest" request.
pub const WILDCARD_MARKER: char = '*';

const LATEST_TOKEN: &str = "latest";
const LATEST_PRE_RELEASE_TOKEN: &str = "latestprerelease";

/// A requested version of the CLI package
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VersionSpecifier {
    /// An exact version, e.g. `1.2.3`
    Exact(String),
    /// Latest stable version. Keeps the raw text (`Latest`, `1.*`, ...)
    Latest(String),
    /// Latest version, pre-releases included
    LatestPreRelease(String),
}

impl VersionSpecifier {
    /// Returns true for `Latest` and `LatestPreRelease`
    pub fn is_wildcard(&self) -> bool {
        !matches!(self, VersionSpecifier::Exact(_))
    }

    /// Whether pre-release directories take part in latest-version resolution
    pub fn includes_pre_release(&self) -> bool {
        matches!(self, VersionSpecifier::LatestPreRelease(_))
    }

    /// The text the specifier was parsed from
    pub fn as_str(&self) -> &str {
        match self {
            VersionSpecifier::Exact(raw)
            | VersionSpecifier::Latest(raw)
            | VersionSpecifier::LatestPreRelease(raw) => raw,
        }
    }

    /// Collapses every wildcard form to the plain `Latest` token.
    ///
    /// Older task versions accepted `1.*`, which functionally meant latest.
    pub fn normalized(self) -> Self {
        match self {
            VersionSpecifier::Latest(raw) if raw.contains(WILDCARD_MARKER) => {
                VersionSpecifier::Latest("Latest".to_string())
            }
            other => other,
        }
    }
}

impl FromStr for VersionSpecifier {
    type Err = ResolveError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let raw = s.trim();
        if raw.is_empty() {
            return Err(ResolveError::InvalidSpecifier(s.to_string()));
        }

        let token: String = raw
            .chars()
            .filter(|c| *c != '-' && *c != '_')
            .collect::<String>()
            .to_ascii_lowercase();

        if token == LATEST_PRE_RELEASE_TOKEN {
            return Ok(VersionSpecifier::LatestPreRelease(raw.to_string()));
        }

        if token == LATEST_TOKEN || raw.contains(WILDCARD_MARKER) {
            return Ok(VersionSpecifier::Latest(raw.to_string()));
        }

        match InstalledVersion::parse(raw) {
            Some(_) => Ok(VersionSpecifier::Exact(raw.to_string())),
            None => Err(ResolveError::InvalidSpecifier(raw.to_string())),
        }
    }
}

impl fmt::Display for VersionSpecifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
