//! Package reference types handed over by the resolver

use serde::{Deserialize, Serialize};
use std::fmt;

/// Transport-type tag naming the fetch strategy for a remote
///
/// Kept as an open string so that lockfiles naming transports this build
/// does not know still load; the registry rejects them at fetch time.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Transport(String);

impl Transport {
    pub const TARBALL: &'static str = "tarball";
    pub const GIT: &'static str = "git";
    pub const COPY: &'static str = "copy";

    pub fn new(tag: impl Into<String>) -> Self {
        Self(tag.into())
    }

    #[must_use]
    pub fn tarball() -> Self {
        Self::new(Self::TARBALL)
    }

    #[must_use]
    pub fn git() -> Self {
        Self::new(Self::GIT)
    }

    #[must_use]
    pub fn copy() -> Self {
        Self::new(Self::COPY)
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Transport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Transport {
    fn from(tag: &str) -> Self {
        Self::new(tag)
    }
}

/// Where a package comes from and what is known about its content
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoteDescriptor {
    /// Transport used to fetch the package
    #[serde(rename = "type")]
    pub transport: Transport,
    /// Source locator as written by the resolver (URL, path, git remote)
    pub source: String,
    /// Locator pinned by a previous fetch (tarball URL with hash, git commit)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resolved: Option<String>,
    /// Content hash recorded by a previous fetch
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hash: Option<String>,
}

impl RemoteDescriptor {
    pub fn new(transport: impl Into<Transport>, source: impl Into<String>) -> Self {
        Self {
            transport: transport.into(),
            source: source.into(),
            resolved: None,
            hash: None,
        }
    }

    #[must_use]
    pub fn with_hash(mut self, hash: impl Into<String>) -> Self {
        self.hash = Some(hash.into());
        self
    }

    #[must_use]
    pub fn with_resolved(mut self, resolved: impl Into<String>) -> Self {
        self.resolved = Some(resolved.into());
        self
    }
}

/// One resolved package to materialize on disk
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PackageReference {
    pub name: String,
    /// Target version or locator chosen by the resolver
    pub version: String,
    pub remote: RemoteDescriptor,
    /// Failure to fetch an optional package does not abort the run
    #[serde(default)]
    pub optional: bool,
}

impl PackageReference {
    pub fn new(
        name: impl Into<String>,
        version: impl Into<String>,
        remote: RemoteDescriptor,
    ) -> Self {
        Self {
            name: name.into(),
            version: version.into(),
            remote,
            optional: false,
        }
    }

    #[must_use]
    pub fn optional(mut self, optional: bool) -> Self {
        self.optional = optional;
        self
    }
}

impl fmt::Display for PackageReference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@{}", self.name, self.version)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lockfile_entry_uses_type_key() {
        let json = r#"{
            "name": "left-pad",
            "version": "1.3.0",
            "remote": { "type": "tarball", "source": "https://example.com/left-pad.tgz" }
        }"#;
        let reference: PackageReference = serde_json::from_str(json).unwrap();
        assert_eq!(reference.remote.transport, Transport::tarball());
        assert!(!reference.optional);
        assert!(reference.remote.hash.is_none());

        let out = serde_json::to_value(&reference).unwrap();
        assert_eq!(out["remote"]["type"], "tarball");
        assert!(out["remote"].get("hash").is_none());
    }

    #[test]
    fn unknown_transport_still_parses() {
        let json = r#"{"name":"x","version":"1","remote":{"type":"svn","source":"svn://x"},"optional":true}"#;
        let reference: PackageReference = serde_json::from_str(json).unwrap();
        assert_eq!(reference.remote.transport.as_str(), "svn");
        assert!(reference.optional);
    }
}
