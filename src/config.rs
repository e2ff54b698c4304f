use std::fmt;

use thiserror::Error;

/// Minimum accepted signing-secret length. Anything shorter is refused at
/// startup rather than silently weakening token security.
const MIN_JWT_SECRET_LEN: usize = 32;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("required environment variable {0} is not set")]
    Missing(&'static str),

    #[error("invalid value for {var}: {reason}")]
    Invalid { var: &'static str, reason: String },
}

/// Deployment environment, parsed from `ENVIRONMENT`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Environment {
    Development,
    Production,
    Test,
}

impl Environment {
    pub fn is_production(self) -> bool {
        matches!(self, Environment::Production)
    }
}

impl fmt::Display for Environment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Environment::Development => "development",
            Environment::Production => "production",
            Environment::Test => "test",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub jwt_secret: String,
    pub listen_addr: String,
    pub environment: Environment,
    pub allowed_origins: Vec<String>,
    // Database connection pool settings
    pub db_max_connections: u32,
    pub db_min_connections: u32,
    pub db_acquire_timeout_secs: u64,
    // Rate limiting (fixed window)
    pub rate_limit_max: u32,
    pub auth_rate_limit_max: u32,
    pub rate_limit_window_secs: u64,
}

impl Config {
    /// Load configuration from the environment.
    ///
    /// Required variables (`DATABASE_URL`, `JWT_SECRET`) fail loudly when
    /// missing or invalid; the process must not start with a weakened
    /// security posture.
    pub fn from_env() -> Result<Self, ConfigError> {
        let database_url =
            std::env::var("DATABASE_URL").map_err(|_| ConfigError::Missing("DATABASE_URL"))?;
        let jwt_secret =
            std::env::var("JWT_SECRET").map_err(|_| ConfigError::Missing("JWT_SECRET"))?;

        let environment = match std::env::var("ENVIRONMENT")
            .unwrap_or_else(|_| "development".to_string())
            .to_lowercase()
            .as_str()
        {
            "production" => Environment::Production,
            "test" => Environment::Test,
            _ => Environment::Development,
        };

        let allowed_origins = std::env::var("ALLOWED_ORIGINS")
            .unwrap_or_default()
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();

        let config = Self {
            database_url,
            jwt_secret,
            listen_addr: std::env::var("LISTEN_ADDR")
                .unwrap_or_else(|_| "0.0.0.0:8080".to_string()),
            environment,
            allowed_origins,
            db_max_connections: env_parse("DB_MAX_CONNECTIONS", 20),
            db_min_connections: env_parse("DB_MIN_CONNECTIONS", 5),
            // Acquisition timeout is deliberately short so pool exhaustion
            // surfaces as a retryable connection failure, not a hang.
            db_acquire_timeout_secs: env_parse("DB_ACQUIRE_TIMEOUT_SECS", 2),
            rate_limit_max: env_parse("RATE_LIMIT_MAX", 300),
            auth_rate_limit_max: env_parse("AUTH_RATE_LIMIT_MAX", 10),
            rate_limit_window_secs: env_parse("RATE_LIMIT_WINDOW_SECS", 900),
        };

        config.validate()?;
        Ok(config)
    }

    /// Validate configuration invariants.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.database_url.starts_with("postgres://")
            && !self.database_url.starts_with("postgresql://")
        {
            return Err(ConfigError::Invalid {
                var: "DATABASE_URL",
                reason: "must start with postgres:// or postgresql://".to_string(),
            });
        }

        if self.jwt_secret.len() < MIN_JWT_SECRET_LEN {
            return Err(ConfigError::Invalid {
                var: "JWT_SECRET",
                reason: format!("must be at least {MIN_JWT_SECRET_LEN} characters"),
            });
        }

        if self.listen_addr.is_empty() {
            return Err(ConfigError::Invalid {
                var: "LISTEN_ADDR",
                reason: "cannot be empty".to_string(),
            });
        }

        if self.environment.is_production() && self.allowed_origins.is_empty() {
            return Err(ConfigError::Invalid {
                var: "ALLOWED_ORIGINS",
                reason: "must list at least one origin in production".to_string(),
            });
        }

        if self.rate_limit_window_secs == 0 {
            return Err(ConfigError::Invalid {
                var: "RATE_LIMIT_WINDOW_SECS",
                reason: "must be greater than zero".to_string(),
            });
        }

        Ok(())
    }
}

fn env_parse<T: std::str::FromStr>(var: &str, default: T) -> T {
    std::env::var(var)
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or(default)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base_config() -> Config {
        Config {
            database_url: "postgres://localhost/sexton".to_string(),
            jwt_secret: "0123456789abcdef0123456789abcdef".to_string(),
            listen_addr: "127.0.0.1:8080".to_string(),
            environment: Environment::Development,
            allowed_origins: vec![],
            db_max_connections: 20,
            db_min_connections: 5,
            db_acquire_timeout_secs: 2,
            rate_limit_max: 300,
            auth_rate_limit_max: 10,
            rate_limit_window_secs: 900,
        }
    }

    #[test]
    fn accepts_valid_config() {
        assert!(base_config().validate().is_ok());
    }

    #[test]
    fn rejects_short_jwt_secret() {
        let mut config = base_config();
        config.jwt_secret = "short".to_string();
        assert!(matches!(
            config.validate(),
            Err(ConfigError::Invalid { var: "JWT_SECRET", .. })
        ));
    }

    #[test]
    fn rejects_non_postgres_database_url() {
        let mut config = base_config();
        config.database_url = "mysql://localhost/sexton".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn production_requires_allowed_origins() {
        let mut config = base_config();
        config.environment = Environment::Production;
        assert!(config.validate().is_err());

        config.allowed_origins = vec!["https://app.example.com".to_string()];
        assert!(config.validate().is_ok());
    }
}
