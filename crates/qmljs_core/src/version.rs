//! `major.minor` versions of QML modules and exported components.

use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// A module or component version such as `2.15`.
///
/// Components are exported from a module at a version; an import of the
/// module at version `v` sees every export whose version is `<= v`.
/// Ordering is lexicographic on `(major, minor)`.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ComponentVersion {
    major: i32,
    minor: i32,
}

pub const NO_VERSION: i32 = -1;
pub const MAX_VERSION: i32 = i32::MAX;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum VersionParseError {
    #[error("version '{0}' is missing the '.' separator")]
    MissingSeparator(String),
    #[error("version '{0}' has a non-numeric component")]
    NotANumber(String),
}

impl ComponentVersion {
    pub const fn new(major: i32, minor: i32) -> Self {
        Self { major, minor }
    }

    /// The version that compares greater than every real version.
    pub const fn max() -> Self {
        Self {
            major: MAX_VERSION,
            minor: MAX_VERSION,
        }
    }

    pub fn major(&self) -> i32 {
        self.major
    }

    pub fn minor(&self) -> i32 {
        self.minor
    }

    pub fn is_valid(&self) -> bool {
        self.major >= 0 && self.minor >= 0
    }
}

impl Default for ComponentVersion {
    /// An invalid version, used for C++-only exports and versionless imports.
    fn default() -> Self {
        Self {
            major: NO_VERSION,
            minor: NO_VERSION,
        }
    }
}

impl fmt::Display for ComponentVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.major, self.minor)
    }
}

impl FromStr for ComponentVersion {
    type Err = VersionParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        let (major, minor) = s
            .split_once('.')
            .ok_or_else(|| VersionParseError::MissingSeparator(s.to_string()))?;
        let major = major
            .parse::<i32>()
            .map_err(|_| VersionParseError::NotANumber(s.to_string()))?;
        let minor = minor
            .parse::<i32>()
            .map_err(|_| VersionParseError::NotANumber(s.to_string()))?;
        Ok(Self { major, minor })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_version() {
        let version: ComponentVersion = "2.15".parse().unwrap();
        assert_eq!(version.major(), 2);
        assert_eq!(version.minor(), 15);
        assert!(version.is_valid());
        assert_eq!(version.to_string(), "2.15");
    }

    #[test]
    fn test_parse_version_errors() {
        assert_eq!(
            "2".parse::<ComponentVersion>(),
            Err(VersionParseError::MissingSeparator("2".to_string()))
        );
        assert!(matches!(
            "2.x".parse::<ComponentVersion>(),
            Err(VersionParseError::NotANumber(_))
        ));
    }

    #[test]
    fn test_version_ordering() {
        assert!(ComponentVersion::new(2, 0) < ComponentVersion::new(2, 1));
        assert!(ComponentVersion::new(1, 9) < ComponentVersion::new(2, 0));
        assert!(ComponentVersion::new(6, 5) < ComponentVersion::max());
        assert!(ComponentVersion::default() < ComponentVersion::new(0, 0));
    }

    #[test]
    fn test_default_version_is_invalid() {
        let version = ComponentVersion::default();
        assert!(!version.is_valid());
        assert_eq!(version.to_string(), "-1.-1");
    }
}
