//! Fixed names and environment variables used by kiln

/// Directory name under the platform config/cache roots
pub const APP_DIR: &str = "kiln";

/// Config file name inside the config directory
pub const CONFIG_FILE: &str = "config.toml";

/// Package cache subdirectory inside the cache root
pub const PACKAGES_DIR: &str = "packages";

/// Upper bound for auto-detected fetch concurrency
pub const MAX_AUTO_CONCURRENCY: usize = 8;

pub const ENV_CONCURRENCY: &str = "KILN_CONCURRENCY";
pub const ENV_CACHE_DIR: &str = "KILN_CACHE_DIR";
pub const ENV_FETCH_TIMEOUT: &str = "KILN_FETCH_TIMEOUT";
pub const ENV_OUTPUT: &str = "KILN_OUTPUT";
