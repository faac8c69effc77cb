//! CLI error handling

use std::fmt;

use kiln_errors::UserFacingError;

/// CLI-specific error type
#[derive(Debug)]
pub enum CliError {
    /// Configuration error
    Config(kiln_errors::ConfigError),
    /// Fetch or cache error
    Fetch(kiln_errors::Error),
    /// Lockfile could not be read or written
    Lockfile(String),
    /// Invalid command arguments
    InvalidArguments(String),
    /// I/O error
    Io(std::io::Error),
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CliError::Config(e) => write!(f, "Configuration error: {e}"),
            CliError::Fetch(e) => {
                let message = e.user_message();
                write!(f, "{message}")?;
                if let Some(package) = e.package() {
                    write!(f, "\n  Package: {package}")?;
                }
                if let Some(code) = e.user_code() {
                    write!(f, "\n  Code: {code}")?;
                }
                if let Some(hint) = e.user_hint() {
                    write!(f, "\n  Hint: {hint}")?;
                }
                if e.is_retryable() {
                    write!(f, "\n  Retry: safe to retry this operation.")?;
                }
                Ok(())
            }
            CliError::Lockfile(msg) => write!(f, "Lockfile error: {msg}"),
            CliError::InvalidArguments(msg) => write!(f, "Invalid arguments: {msg}"),
            CliError::Io(e) => write!(f, "I/O error: {e}"),
        }
    }
}

impl std::error::Error for CliError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            CliError::Config(e) => Some(e),
            CliError::Fetch(e) => Some(e),
            CliError::Io(e) => Some(e),
            _ => None,
        }
    }
}

impl From<kiln_errors::ConfigError> for CliError {
    fn from(e: kiln_errors::ConfigError) -> Self {
        CliError::Config(e)
    }
}

impl From<kiln_errors::Error> for CliError {
    fn from(e: kiln_errors::Error) -> Self {
        CliError::Fetch(e)
    }
}

impl From<std::io::Error> for CliError {
    fn from(e: std::io::Error) -> Self {
        CliError::Io(e)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use kiln_errors::FetchError;

    #[test]
    fn fetch_errors_show_package_and_code() {
        let err = CliError::from(kiln_errors::Error::from(FetchError::UnknownTransport {
            package: "left-pad".to_string(),
            transport: "svn".to_string(),
        }));
        let rendered = err.to_string();
        assert!(rendered.contains("unknown fetcher for svn"));
        assert!(rendered.contains("Package: left-pad"));
        assert!(rendered.contains("Code: fetch.unknown_transport"));
    }
}
