#![allow(clippy::module_name_repetitions)]

//! Package manifest handling types for kiln
//!
//! Every fetched package carries a `manifest.toml` at the root of its
//! destination directory. The cache gate reads it back on cache hits and
//! the resolver receives it through the manifest write-back hook.

use crate::Version;
use kiln_errors::{Error, PackageError};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// File name of the manifest inside a package directory
pub const MANIFEST_FILE: &str = "manifest.toml";

/// Package manifest (manifest.toml contents)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Manifest {
    pub package: PackageInfo,
    /// Dependency name to requirement string
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub dependencies: BTreeMap<String, String>,
}

/// Package information section
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PackageInfo {
    pub name: String,
    pub version: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub license: Option<String>,
}

impl Manifest {
    /// Create a new manifest
    #[must_use]
    pub fn new(name: impl Into<String>, version: &Version) -> Self {
        Self {
            package: PackageInfo {
                name: name.into(),
                version: version.to_string(),
                description: None,
                license: None,
            },
            dependencies: BTreeMap::new(),
        }
    }

    /// Add a dependency requirement
    #[must_use]
    pub fn depends_on(mut self, name: impl Into<String>, requirement: impl Into<String>) -> Self {
        self.dependencies.insert(name.into(), requirement.into());
        self
    }

    /// Package name
    #[must_use]
    pub fn name(&self) -> &str {
        &self.package.name
    }

    /// Parse the package version
    ///
    /// # Errors
    ///
    /// Returns an error if the version string is not a valid semantic version.
    pub fn version(&self) -> Result<Version, Error> {
        Version::parse(&self.package.version).map_err(|e| {
            PackageError::InvalidManifest {
                message: format!("invalid version '{}': {e}", self.package.version),
            }
            .into()
        })
    }

    /// Parse from TOML string
    ///
    /// # Errors
    ///
    /// Returns an error if the TOML is malformed, a required field is missing,
    /// or the version is not a valid semantic version.
    pub fn from_toml(content: &str) -> Result<Self, Error> {
        let manifest: Self = toml::from_str(content).map_err(|e| PackageError::InvalidManifest {
            message: e.to_string(),
        })?;
        manifest.validate()?;
        Ok(manifest)
    }

    /// Serialize to TOML string
    ///
    /// # Errors
    ///
    /// Returns an error if the manifest cannot be serialized.
    pub fn to_toml(&self) -> Result<String, Error> {
        toml::to_string_pretty(self).map_err(|e| {
            PackageError::InvalidManifest {
                message: format!("failed to serialize manifest: {e}"),
            }
            .into()
        })
    }

    /// Validate manifest fields
    ///
    /// # Errors
    ///
    /// Returns an error if the name is empty or the version does not parse.
    pub fn validate(&self) -> Result<(), Error> {
        if self.package.name.trim().is_empty() {
            return Err(PackageError::InvalidManifest {
                message: "package name cannot be empty".to_string(),
            }
            .into());
        }
        self.version()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_manifest_with_dependencies() {
        let content = r#"
[package]
name = "left-pad"
version = "1.3.0"
description = "pad strings"

[dependencies]
leftish = "^2"
"#;
        let manifest = Manifest::from_toml(content).unwrap();
        assert_eq!(manifest.name(), "left-pad");
        assert_eq!(manifest.version().unwrap(), Version::new(1, 3, 0));
        assert_eq!(manifest.dependencies.get("leftish").unwrap(), "^2");
    }

    #[test]
    fn rejects_bad_version() {
        let content = "[package]\nname = \"x\"\nversion = \"one\"\n";
        let err = Manifest::from_toml(content).unwrap_err();
        assert!(matches!(
            err,
            Error::Package(PackageError::InvalidManifest { .. })
        ));
    }

    #[test]
    fn rejects_empty_name() {
        let manifest = Manifest::new("  ", &Version::new(1, 0, 0));
        assert!(manifest.validate().is_err());
    }

    #[test]
    fn toml_output_reads_back() {
        let manifest = Manifest::new("jq", &Version::new(1, 7, 1)).depends_on("oniguruma", "6");
        let text = manifest.to_toml().unwrap();
        assert!(text.contains("[package]"));
        assert_eq!(Manifest::from_toml(&text).unwrap(), manifest);
    }
}
