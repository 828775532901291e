use std::fmt;

use serde::Serialize;
use thiserror::Error;

/// Reasons a raw cell value cannot be used as a folder name.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum InvalidIdentifier {
    #[error("identifier is empty or whitespace-only")]
    Blank,

    #[error("identifier '{0}' contains a path separator")]
    PathSeparator(String),

    #[error("identifier '{0}' refers to a relative directory")]
    RelativeComponent(String),

    #[error("identifier contains a NUL byte")]
    Nul,
}

/// A value read from the identifier column of one input row.
///
/// The string is kept verbatim. Only blank values are rejected at
/// construction; names that could escape the destination root are
/// detected with [`Identifier::validate_folder_name`] so the failure can
/// be reported against the row instead of aborting the batch.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct Identifier(String);

impl Identifier {
    pub fn new(value: impl Into<String>) -> Result<Self, InvalidIdentifier> {
        let value = value.into();
        if value.trim().is_empty() {
            return Err(InvalidIdentifier::Blank);
        }
        Ok(Identifier(value))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Checks that the identifier names exactly one direct child of a directory.
    pub fn validate_folder_name(&self) -> Result<(), InvalidIdentifier> {
        let name = self.0.as_str();
        if name.contains('\0') {
            return Err(InvalidIdentifier::Nul);
        }
        if name.contains('/') || name.contains('\\') {
            return Err(InvalidIdentifier::PathSeparator(name.to_string()));
        }
        if name == "." || name == ".." {
            return Err(InvalidIdentifier::RelativeComponent(name.to_string()));
        }
        Ok(())
    }
}

impl fmt::Display for Identifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for Identifier {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_blank_values_are_rejected() {
        assert_eq!(Identifier::new(""), Err(InvalidIdentifier::Blank));
        assert_eq!(Identifier::new("   \t"), Err(InvalidIdentifier::Blank));
    }

    #[test]
    fn test_value_is_kept_verbatim() {
        let id = Identifier::new(" A100 ").unwrap();
        assert_eq!(id.as_str(), " A100 ");
        assert_eq!(id.to_string(), " A100 ");
    }

    #[test]
    fn test_folder_name_validation() {
        assert!(Identifier::new("A100").unwrap().validate_folder_name().is_ok());
        assert!(Identifier::new("A100.v2").unwrap().validate_folder_name().is_ok());

        assert!(matches!(
            Identifier::new("a/b").unwrap().validate_folder_name(),
            Err(InvalidIdentifier::PathSeparator(_))
        ));
        assert!(matches!(
            Identifier::new("a\\b").unwrap().validate_folder_name(),
            Err(InvalidIdentifier::PathSeparator(_))
        ));
        assert!(matches!(
            Identifier::new("..").unwrap().validate_folder_name(),
            Err(InvalidIdentifier::RelativeComponent(_))
        ));
        assert_eq!(
            Identifier::new("a\0b").unwrap().validate_folder_name(),
            Err(InvalidIdentifier::Nul)
        );
    }
}
