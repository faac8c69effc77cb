//! Integration tests for error types

#[cfg(test)]
mod tests {
    use kiln_errors::*;

    #[test]
    fn test_error_conversion() {
        let fetch_err = FetchError::UnknownTransport {
            package: "left-pad".into(),
            transport: "svn".into(),
        };
        let err: Error = fetch_err.into();
        assert!(matches!(err, Error::Fetch(FetchError::UnknownTransport { .. })));
        assert_eq!(err.package(), Some("left-pad"));
    }

    #[test]
    fn test_unknown_transport_display() {
        let err = FetchError::UnknownTransport {
            package: "left-pad".into(),
            transport: "svn".into(),
        };
        assert_eq!(
            err.to_string(),
            "unknown fetcher for svn (package left-pad)"
        );
    }

    #[test]
    fn test_error_clone() {
        let err = FetchError::transport("jq", "tarball", "connection reset");
        let cloned = err.clone();
        assert_eq!(err.to_string(), cloned.to_string());
    }

    #[test]
    fn test_io_error_conversion() {
        let io_err = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "test");
        let storage_err: StorageError = io_err.into();
        assert!(matches!(storage_err, StorageError::PermissionDenied { .. }));
    }

    #[test]
    fn test_user_codes() {
        let err: Error = FetchError::CacheRead {
            package: "a".into(),
            path: "/tmp/a".into(),
            message: "bad manifest".into(),
        }
        .into();
        assert_eq!(err.user_code(), Some("fetch.cache_read"));
        assert!(err.user_hint().is_some());
        assert!(!err.is_retryable());

        let cleanup = FetchError::Cleanup {
            path: "/tmp/a".into(),
            message: "busy".into(),
        };
        assert_eq!(cleanup.package(), None);
    }
}
