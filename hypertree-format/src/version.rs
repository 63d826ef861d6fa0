use crate::errors::{FormatError, FormatResult};
use serde::{Deserialize, Serialize};
use std::fmt::Display;

/// On-disk layout generation. The major number selects the decode routine.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum FormatVersion {
    /// One element per tree, untrimmed descriptor, level counts inferred.
    V0,
    /// One element per tree, trimmed descriptor, explicit level counts.
    V1,
    /// Grid-wide concatenated arrays.
    #[default]
    V2,
}

impl FormatVersion {
    pub fn major(self) -> u32 {
        match self {
            FormatVersion::V0 => 0,
            FormatVersion::V1 => 1,
            FormatVersion::V2 => 2,
        }
    }

    /// `"major.minor"` string stored in the document envelope.
    pub fn version_string(self) -> String {
        format!("{}.0", self.major())
    }

    /// Parses a `"major.minor"` or `"major"` version string. Minor versions are ignored.
    pub fn parse(version: &str) -> FormatResult<Self> {
        let major = version
            .trim()
            .split('.')
            .next()
            .and_then(|m| m.parse::<u32>().ok())
            .ok_or_else(|| FormatError::UnsupportedVersion(version.to_string()))?;
        match major {
            0 => Ok(FormatVersion::V0),
            1 => Ok(FormatVersion::V1),
            2 => Ok(FormatVersion::V2),
            _ => Err(FormatError::UnsupportedVersion(version.to_string())),
        }
    }
}

impl Display for FormatVersion {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.version_string())
    }
}

/// How the document is encoded on disk.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DataMode {
    /// Magic header followed by a bincode payload.
    #[default]
    Binary,
    /// Pretty-printed JSON.
    Ascii,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_versions() {
        assert_eq!(FormatVersion::parse("0.0").unwrap(), FormatVersion::V0);
        assert_eq!(FormatVersion::parse("1.0").unwrap(), FormatVersion::V1);
        assert_eq!(FormatVersion::parse("2.1").unwrap(), FormatVersion::V2);
        assert_eq!(FormatVersion::parse("2").unwrap(), FormatVersion::V2);
        assert!(matches!(
            FormatVersion::parse("3.0"),
            Err(FormatError::UnsupportedVersion(_))
        ));
        assert!(FormatVersion::parse("abc").is_err());
    }

    #[test]
    fn test_version_string() {
        assert_eq!(FormatVersion::V1.version_string(), "1.0");
        assert_eq!(FormatVersion::default().to_string(), "2.0");
    }
}
