use std::path::PathBuf;

use txncat_engine::DEFAULT_PROMOTE_THRESHOLD;

/// Service configuration.
pub struct Config {
    pub port: u16,
    pub database: PathBuf,
    pub admin_token: String,
    pub promote_threshold: i64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            port: 8000,
            database: home_dir().join(".txncat").join("txncat.db"),
            admin_token: "admin-token".to_string(),
            promote_threshold: DEFAULT_PROMOTE_THRESHOLD,
        }
    }
}

impl Config {
    /// Defaults with any `TXNCAT_*` environment overrides applied.
    /// Unparsable values fall back to the default rather than failing.
    pub fn from_env() -> Self {
        let mut config = Self::default();
        if let Some(port) = env_parse("TXNCAT_PORT") {
            config.port = port;
        }
        if let Ok(path) = std::env::var("TXNCAT_DB") {
            if !path.is_empty() {
                config.database = PathBuf::from(path);
            }
        }
        if let Ok(token) = std::env::var("TXNCAT_ADMIN_TOKEN") {
            if !token.is_empty() {
                config.admin_token = token;
            }
        }
        if let Some(threshold) = env_parse("TXNCAT_PROMOTE_THRESHOLD") {
            config.promote_threshold = threshold;
        }
        config
    }
}

fn env_parse<T: std::str::FromStr>(key: &str) -> Option<T> {
    std::env::var(key).ok().and_then(|v| v.parse().ok())
}

fn home_dir() -> PathBuf {
    std::env::var("HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from("/tmp"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_service_conventions() {
        let config = Config::default();
        assert_eq!(config.port, 8000);
        assert_eq!(config.admin_token, "admin-token");
        assert_eq!(config.promote_threshold, 3);
        assert!(config.database.ends_with(".txncat/txncat.db"));
    }

    // env mutation lives in one test so parallel runs never race on it
    #[test]
    fn env_overrides_apply_and_garbage_falls_back() {
        std::env::set_var("TXNCAT_PORT", "9100");
        std::env::set_var("TXNCAT_DB", "/tmp/txncat-test.db");
        std::env::set_var("TXNCAT_ADMIN_TOKEN", "s3cret");
        std::env::set_var("TXNCAT_PROMOTE_THRESHOLD", "5");

        let config = Config::from_env();
        assert_eq!(config.port, 9100);
        assert_eq!(config.database, PathBuf::from("/tmp/txncat-test.db"));
        assert_eq!(config.admin_token, "s3cret");
        assert_eq!(config.promote_threshold, 5);

        std::env::set_var("TXNCAT_PORT", "not-a-port");
        let config = Config::from_env();
        assert_eq!(config.port, 8000);

        std::env::remove_var("TXNCAT_PORT");
        std::env::remove_var("TXNCAT_DB");
        std::env::remove_var("TXNCAT_ADMIN_TOKEN");
        std::env::remove_var("TXNCAT_PROMOTE_THRESHOLD");
    }
}
