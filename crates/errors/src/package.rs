//! Package-related error types

use std::borrow::Cow;

use crate::UserFacingError;
use thiserror::Error;

#[derive(Debug, Clone, Error)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum PackageError {
    #[error("package corrupted: {message}")]
    Corrupted { message: String },

    #[error("invalid manifest: {message}")]
    InvalidManifest { message: String },

    #[error("missing manifest: {path}")]
    MissingManifest { path: String },

    #[error("invalid package format: {message}")]
    InvalidFormat { message: String },
}

impl UserFacingError for PackageError {
    fn user_message(&self) -> Cow<'_, str> {
        Cow::Owned(self.to_string())
    }

    fn user_code(&self) -> Option<&'static str> {
        let code = match self {
            Self::Corrupted { .. } => "package.corrupted",
            Self::InvalidManifest { .. } => "package.invalid_manifest",
            Self::MissingManifest { .. } => "package.missing_manifest",
            Self::InvalidFormat { .. } => "package.invalid_format",
        };
        Some(code)
    }
}
