//! Service configuration read from the environment.
use crate::error::ConfigError;
use std::env;
use std::net::SocketAddr;
use std::path::PathBuf;

pub const DEFAULT_BIND: &str = "127.0.0.1:3001";
pub const DEFAULT_SECRET: &str = "supersecret";
pub const DEFAULT_TOKEN_TTL_SECS: i64 = 3600;
/// 30 days.
pub const MAX_TOKEN_TTL_SECS: i64 = 30 * 24 * 60 * 60;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub bind: String,
    pub db_path: PathBuf,
    pub jwt_secret: String,
    pub token_ttl: String,
    /// Seeded at startup when both are set.
    pub admin_email: Option<String>,
    pub admin_password: Option<String>,
    pub log_level: String,
    pub json_logs: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            bind: DEFAULT_BIND.to_string(),
            db_path: PathBuf::from("petcare.db"),
            jwt_secret: DEFAULT_SECRET.to_string(),
            token_ttl: DEFAULT_TOKEN_TTL_SECS.to_string(),
            admin_email: None,
            admin_password: None,
            log_level: "info".to_string(),
            json_logs: false,
        }
    }
}

impl Config {
    /// Create configuration from environment variables.
    ///
    /// # Environment Variables
    ///
    /// - `PETCARE_BIND`: listen address (default: 127.0.0.1:3001)
    /// - `PETCARE_DB_PATH`: sled database directory (default: petcare.db)
    /// - `PETCARE_JWT_SECRET`: token signing key (default: supersecret)
    /// - `PETCARE_TOKEN_TTL_SECS`: token lifetime (default: 3600)
    /// - `PETCARE_ADMIN_EMAIL` / `PETCARE_ADMIN_PASSWORD`: admin account to seed
    /// - `PETCARE_LOG` or `RUST_LOG`: log filter (default: info)
    /// - `PETCARE_JSON_LOGS`: JSON log output (default: false)
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();
        Self {
            bind: lookup("PETCARE_BIND").unwrap_or(defaults.bind),
            db_path: lookup("PETCARE_DB_PATH")
                .map(PathBuf::from)
                .unwrap_or(defaults.db_path),
            jwt_secret: lookup("PETCARE_JWT_SECRET").unwrap_or(defaults.jwt_secret),
            token_ttl: lookup("PETCARE_TOKEN_TTL_SECS").unwrap_or(defaults.token_ttl),
            admin_email: lookup("PETCARE_ADMIN_EMAIL").filter(|v| !v.trim().is_empty()),
            admin_password: lookup("PETCARE_ADMIN_PASSWORD").filter(|v| !v.is_empty()),
            log_level: lookup("PETCARE_LOG")
                .or_else(|| lookup("RUST_LOG"))
                .unwrap_or(defaults.log_level),
            json_logs: lookup("PETCARE_JSON_LOGS")
                .map(|v| v.to_lowercase() == "true" || v == "1")
                .unwrap_or(defaults.json_logs),
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.bind_addr()?;
        self.token_ttl_secs()?;
        if self.jwt_secret.is_empty() {
            return Err(ConfigError::EmptySecret);
        }
        if self.db_path.as_os_str().is_empty() {
            return Err(ConfigError::EmptyDbPath);
        }
        Ok(())
    }

    pub fn bind_addr(&self) -> Result<SocketAddr, ConfigError> {
        self.bind
            .parse()
            .map_err(|_| ConfigError::InvalidBind(self.bind.clone()))
    }

    pub fn token_ttl_secs(&self) -> Result<i64, ConfigError> {
        match self.token_ttl.trim().parse::<i64>() {
            Ok(secs) if (1..=MAX_TOKEN_TTL_SECS).contains(&secs) => Ok(secs),
            _ => Err(ConfigError::InvalidTtl(self.token_ttl.clone())),
        }
    }

    pub fn uses_default_secret(&self) -> bool {
        self.jwt_secret == DEFAULT_SECRET
    }

    /// Admin credentials to seed, when both halves are configured.
    pub fn admin_seed(&self) -> Option<(&str, &str)> {
        match (&self.admin_email, &self.admin_password) {
            (Some(email), Some(password)) => Some((email.as_str(), password.as_str())),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config(vars: &[(&str, &str)]) -> Config {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn defaults_are_valid() {
        let config = config(&[]);
        assert!(config.validate().is_ok());
        assert!(config.uses_default_secret());
        assert_eq!(config.token_ttl_secs(), Ok(DEFAULT_TOKEN_TTL_SECS));
        assert_eq!(config.admin_seed(), None);
    }

    #[test]
    fn overrides_are_read() {
        let config = config(&[
            ("PETCARE_BIND", "0.0.0.0:8080"),
            ("PETCARE_TOKEN_TTL_SECS", "60"),
            ("PETCARE_ADMIN_EMAIL", "admin"),
            ("PETCARE_ADMIN_PASSWORD", "admin1234"),
            ("RUST_LOG", "debug"),
            ("PETCARE_JSON_LOGS", "true"),
        ]);

        assert_eq!(config.bind_addr().unwrap().port(), 8080);
        assert_eq!(config.token_ttl_secs(), Ok(60));
        assert_eq!(config.admin_seed(), Some(("admin", "admin1234")));
        assert_eq!(config.log_level, "debug");
        assert!(config.json_logs);
    }

    #[test]
    fn invalid_values_are_rejected() {
        assert!(matches!(
            config(&[("PETCARE_BIND", "nowhere")]).validate(),
            Err(ConfigError::InvalidBind(_))
        ));
        assert!(matches!(
            config(&[("PETCARE_TOKEN_TTL_SECS", "0")]).validate(),
            Err(ConfigError::InvalidTtl(_))
        ));
        let overflowing = i64::MAX.to_string();
        assert!(matches!(
            config(&[("PETCARE_TOKEN_TTL_SECS", overflowing.as_str())]).validate(),
            Err(ConfigError::InvalidTtl(_))
        ));
        assert!(matches!(
            config(&[("PETCARE_TOKEN_TTL_SECS", "2592001")]).validate(),
            Err(ConfigError::InvalidTtl(_))
        ));
        assert_eq!(
            config(&[("PETCARE_TOKEN_TTL_SECS", "2592000")]).token_ttl_secs(),
            Ok(MAX_TOKEN_TTL_SECS)
        );
        assert_eq!(
            config(&[("PETCARE_JWT_SECRET", "")]).validate(),
            Err(ConfigError::EmptySecret)
        );
    }
}
