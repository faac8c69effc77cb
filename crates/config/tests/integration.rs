//! Integration tests for config

#[cfg(test)]
mod tests {
    use kiln_config::*;
    use kiln_types::{ColorChoice, OutputFormat};
    use std::io::Write;
    use std::path::PathBuf;
    use std::sync::Mutex;
    use tempfile::NamedTempFile;

    // Mutex to ensure env var tests don't run concurrently
    static ENV_TEST_MUTEX: Mutex<()> = Mutex::new(());

    fn clear_env() {
        std::env::remove_var(constants::ENV_OUTPUT);
        std::env::remove_var(constants::ENV_CONCURRENCY);
        std::env::remove_var(constants::ENV_CACHE_DIR);
        std::env::remove_var(constants::ENV_FETCH_TIMEOUT);
    }

    #[tokio::test]
    async fn test_load_config_from_file() {
        let mut temp_file = NamedTempFile::new().unwrap();
        writeln!(
            temp_file,
            r#"
[general]
default_output = "plain"
concurrency = 6
color = "never"

[paths]
cache_path = "/var/cache/kiln"

[network]
timeout = 30
        "#
        )
        .unwrap();

        let config = Config::load_from_file(temp_file.path()).await.unwrap();
        assert_eq!(config.general.default_output, OutputFormat::Plain);
        assert_eq!(config.general.color, ColorChoice::Never);
        assert_eq!(config.concurrency(), 6);
        assert_eq!(config.cache_path(), PathBuf::from("/var/cache/kiln"));
        assert_eq!(config.network.timeout, 30);
        assert_eq!(config.network.retries, 3);
    }

    #[tokio::test]
    async fn test_missing_file_is_not_found() {
        let err = Config::load_from_file(std::path::Path::new("/nonexistent/kiln.toml"))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            kiln_errors::Error::Config(kiln_errors::ConfigError::NotFound { .. })
        ));
    }

    #[test]
    fn test_merge_env() {
        let _guard = ENV_TEST_MUTEX.lock().unwrap();
        clear_env();

        std::env::set_var(constants::ENV_OUTPUT, "json");
        std::env::set_var(constants::ENV_CONCURRENCY, "2");
        std::env::set_var(constants::ENV_CACHE_DIR, "/tmp/kiln-env-cache");

        let mut config = Config::default();
        config.merge_env().unwrap();

        assert_eq!(config.general.default_output, OutputFormat::Json);
        assert_eq!(config.concurrency(), 2);
        assert_eq!(config.cache_path(), PathBuf::from("/tmp/kiln-env-cache"));

        clear_env();
    }

    #[test]
    fn test_invalid_env_value() {
        let _guard = ENV_TEST_MUTEX.lock().unwrap();
        clear_env();

        std::env::set_var(constants::ENV_CONCURRENCY, "many");

        let mut config = Config::default();
        let result = config.merge_env();
        assert!(result.is_err());

        clear_env();
    }
}
