//! Fetch orchestration error types

use std::borrow::Cow;

use crate::UserFacingError;
use thiserror::Error;

#[derive(Debug, Clone, Error)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[non_exhaustive]
pub enum FetchError {
    #[error("unknown fetcher for {transport} (package {package})")]
    UnknownTransport { package: String, transport: String },

    #[error("failed to read cached package {package} at {path}: {message}")]
    CacheRead {
        package: String,
        path: String,
        message: String,
    },

    #[error("failed to fetch {package} via {transport}: {message}")]
    Transport {
        package: String,
        transport: String,
        message: String,
    },

    #[error("failed to clean up {path}: {message}")]
    Cleanup { path: String, message: String },

    #[error("fetch task failed: {message}")]
    TaskFailed { message: String },

    #[error("fetch of {package} timed out after {timeout_seconds}s")]
    Timeout {
        package: String,
        transport: String,
        timeout_seconds: u64,
    },
}

impl FetchError {
    /// Wrap any strategy failure for a package
    pub fn transport(
        package: impl Into<String>,
        transport: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self::Transport {
            package: package.into(),
            transport: transport.into(),
            message: message.into(),
        }
    }

    /// Package the error is attributed to
    #[must_use]
    pub fn package(&self) -> Option<&str> {
        match self {
            Self::UnknownTransport { package, .. }
            | Self::CacheRead { package, .. }
            | Self::Transport { package, .. }
            | Self::Timeout { package, .. } => Some(package),
            Self::Cleanup { .. } | Self::TaskFailed { .. } => None,
        }
    }
}

impl UserFacingError for FetchError {
    fn user_message(&self) -> Cow<'_, str> {
        Cow::Owned(self.to_string())
    }

    fn user_hint(&self) -> Option<&'static str> {
        match self {
            Self::UnknownTransport { .. } => {
                Some("The lockfile names a transport this build does not support.")
            }
            Self::CacheRead { .. } => {
                Some("Remove the cached package directory and run the fetch again.")
            }
            Self::Timeout { .. } => Some("Raise network.timeout or check connectivity."),
            _ => None,
        }
    }

    fn is_retryable(&self) -> bool {
        matches!(self, Self::Transport { .. } | Self::Timeout { .. })
    }

    fn user_code(&self) -> Option<&'static str> {
        let code = match self {
            Self::UnknownTransport { .. } => "fetch.unknown_transport",
            Self::CacheRead { .. } => "fetch.cache_read",
            Self::Transport { .. } => "fetch.transport",
            Self::Cleanup { .. } => "fetch.cleanup",
            Self::TaskFailed { .. } => "fetch.task_failed",
            Self::Timeout { .. } => "fetch.timeout",
        };
        Some(code)
    }
}
