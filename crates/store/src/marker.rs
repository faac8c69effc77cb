//! Integrity marker committed into every completed destination

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// File name of the marker inside a destination directory
pub const MARKER_FILE: &str = ".kiln-metadata.json";

/// Written last; its presence is what makes a destination a cache hit
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IntegrityMarker {
    /// Content hash reported by the transport
    pub hash: String,
    /// Locator the transport resolved, if any
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resolved: Option<String>,
    /// Transport tag that produced the contents
    pub transport: String,
    pub fetched_at: DateTime<Utc>,
}

impl IntegrityMarker {
    #[must_use]
    pub fn new(
        hash: impl Into<String>,
        resolved: Option<String>,
        transport: impl Into<String>,
    ) -> Self {
        Self {
            hash: hash.into(),
            resolved,
            transport: transport.into(),
            fetched_at: Utc::now(),
        }
    }
}
