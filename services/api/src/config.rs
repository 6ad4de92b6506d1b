use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;
use tracing::Level;

/// A custom error type for configuration loading failures.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingVar(String),
    #[error("Invalid value for environment variable {0}: {1}")]
    InvalidValue(String, String),
}

/// Holds all configuration loaded from the environment at startup.
#[derive(Clone, Debug)]
pub struct Config {
    pub bind_address: SocketAddr,
    pub log_level: Level,
    pub default_role: String,
    /// JSON catalog replacing the built-in scenarios.
    pub scenarios_path: Option<PathBuf>,
    /// JSON-lines session store; in-memory when unset.
    pub session_store_path: Option<PathBuf>,
    pub response_delay_min: Duration,
    pub response_delay_max: Duration,
    pub rng_seed: Option<u64>,
}

fn parse_var<T>(name: &str) -> Result<Option<T>, ConfigError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    match std::env::var(name) {
        Ok(raw) => raw
            .trim()
            .parse::<T>()
            .map(Some)
            .map_err(|e| ConfigError::InvalidValue(name.to_string(), e.to_string())),
        Err(_) => Ok(None),
    }
}

impl Config {
    /// Loads configuration from environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Only load from .env in non-test mode to avoid contamination
        if !cfg!(test) {
            dotenvy::dotenv().ok();
        }

        let bind_address_str =
            std::env::var("BIND_ADDRESS").unwrap_or_else(|_| "0.0.0.0:3000".to_string());
        let bind_address = bind_address_str
            .parse::<SocketAddr>()
            .map_err(|e| ConfigError::InvalidValue("BIND_ADDRESS".to_string(), e.to_string()))?;

        let log_level_str = std::env::var("RUST_LOG").unwrap_or_else(|_| "INFO".to_string());
        let log_level = log_level_str.parse::<Level>().map_err(|_| {
            ConfigError::InvalidValue(
                "RUST_LOG".to_string(),
                format!("'{}' is not a valid log level", log_level_str),
            )
        })?;

        let default_role = std::env::var("DEFAULT_ROLE").unwrap_or_else(|_| "AE".to_string());
        if default_role.trim().is_empty() {
            return Err(ConfigError::InvalidValue(
                "DEFAULT_ROLE".to_string(),
                "must not be empty".to_string(),
            ));
        }

        let scenarios_path = std::env::var("SCENARIOS_PATH").ok().map(PathBuf::from);
        let session_store_path = std::env::var("SESSION_STORE_PATH").ok().map(PathBuf::from);

        let min_ms = parse_var::<u64>("RESPONSE_DELAY_MIN_MS")?.unwrap_or(1500);
        let max_ms = parse_var::<u64>("RESPONSE_DELAY_MAX_MS")?.unwrap_or(3500);
        if min_ms > max_ms {
            return Err(ConfigError::InvalidValue(
                "RESPONSE_DELAY_MIN_MS".to_string(),
                format!("{} exceeds RESPONSE_DELAY_MAX_MS ({})", min_ms, max_ms),
            ));
        }

        let rng_seed = parse_var::<u64>("RNG_SEED")?;

        Ok(Self {
            bind_address,
            log_level,
            default_role,
            scenarios_path,
            session_store_path,
            response_delay_min: Duration::from_millis(min_ms),
            response_delay_max: Duration::from_millis(max_ms),
            rng_seed,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;
    use std::env;

    fn clear_env_vars() {
        unsafe {
            env::remove_var("BIND_ADDRESS");
            env::remove_var("RUST_LOG");
            env::remove_var("DEFAULT_ROLE");
            env::remove_var("SCENARIOS_PATH");
            env::remove_var("SESSION_STORE_PATH");
            env::remove_var("RESPONSE_DELAY_MIN_MS");
            env::remove_var("RESPONSE_DELAY_MAX_MS");
            env::remove_var("RNG_SEED");
        }
    }

    #[test]
    fn test_config_error_display() {
        let missing_var = ConfigError::MissingVar("TEST_VAR".to_string());
        assert_eq!(
            format!("{}", missing_var),
            "Missing environment variable: TEST_VAR"
        );

        let invalid_value =
            ConfigError::InvalidValue("TEST_VAR".to_string(), "bad_value".to_string());
        assert_eq!(
            format!("{}", invalid_value),
            "Invalid value for environment variable TEST_VAR: bad_value"
        );
    }

    #[test]
    #[serial]
    fn test_config_defaults() {
        clear_env_vars();

        let config = Config::from_env().expect("Config should load successfully");

        assert_eq!(config.bind_address.to_string(), "0.0.0.0:3000");
        assert_eq!(config.log_level, Level::INFO);
        assert_eq!(config.default_role, "AE");
        assert_eq!(config.scenarios_path, None);
        assert_eq!(config.session_store_path, None);
        assert_eq!(config.response_delay_min, Duration::from_millis(1500));
        assert_eq!(config.response_delay_max, Duration::from_millis(3500));
        assert_eq!(config.rng_seed, None);
    }

    #[test]
    #[serial]
    fn test_config_custom_values() {
        clear_env_vars();
        unsafe {
            env::set_var("BIND_ADDRESS", "127.0.0.1:8080");
            env::set_var("RUST_LOG", "debug");
            env::set_var("DEFAULT_ROLE", "SDR");
            env::set_var("SCENARIOS_PATH", "/etc/cxse/scenarios.json");
            env::set_var("SESSION_STORE_PATH", "/var/lib/cxse/sessions.jsonl");
            env::set_var("RESPONSE_DELAY_MIN_MS", "0");
            env::set_var("RESPONSE_DELAY_MAX_MS", "10");
            env::set_var("RNG_SEED", "42");
        }

        let config = Config::from_env().expect("Config should load successfully");

        assert_eq!(config.bind_address.to_string(), "127.0.0.1:8080");
        assert_eq!(config.log_level, Level::DEBUG);
        assert_eq!(config.default_role, "SDR");
        assert_eq!(
            config.scenarios_path,
            Some(PathBuf::from("/etc/cxse/scenarios.json"))
        );
        assert_eq!(
            config.session_store_path,
            Some(PathBuf::from("/var/lib/cxse/sessions.jsonl"))
        );
        assert_eq!(config.response_delay_min, Duration::ZERO);
        assert_eq!(config.response_delay_max, Duration::from_millis(10));
        assert_eq!(config.rng_seed, Some(42));
        clear_env_vars();
    }

    #[test]
    #[serial]
    fn test_config_invalid_bind_address() {
        clear_env_vars();
        unsafe {
            env::set_var("BIND_ADDRESS", "not-a-valid-address");
        }

        let err = Config::from_env().unwrap_err();
        match err {
            ConfigError::InvalidValue(var, _) => assert_eq!(var, "BIND_ADDRESS"),
            _ => panic!("Expected InvalidValue for BIND_ADDRESS"),
        }
        clear_env_vars();
    }

    #[test]
    #[serial]
    fn test_config_invalid_log_level() {
        clear_env_vars();
        unsafe {
            env::set_var("RUST_LOG", "not-a-level");
        }

        let err = Config::from_env().unwrap_err();
        match err {
            ConfigError::InvalidValue(var, _) => assert_eq!(var, "RUST_LOG"),
            _ => panic!("Expected InvalidValue for RUST_LOG"),
        }
        clear_env_vars();
    }

    #[test]
    #[serial]
    fn test_config_delay_min_above_max() {
        clear_env_vars();
        unsafe {
            env::set_var("RESPONSE_DELAY_MIN_MS", "5000");
            env::set_var("RESPONSE_DELAY_MAX_MS", "1000");
        }

        let err = Config::from_env().unwrap_err();
        match err {
            ConfigError::InvalidValue(var, _) => assert_eq!(var, "RESPONSE_DELAY_MIN_MS"),
            _ => panic!("Expected InvalidValue for RESPONSE_DELAY_MIN_MS"),
        }
        clear_env_vars();
    }

    #[test]
    #[serial]
    fn test_config_non_numeric_seed() {
        clear_env_vars();
        unsafe {
            env::set_var("RNG_SEED", "lucky");
        }

        let err = Config::from_env().unwrap_err();
        match err {
            ConfigError::InvalidValue(var, _) => assert_eq!(var, "RNG_SEED"),
            _ => panic!("Expected InvalidValue for RNG_SEED"),
        }
        clear_env_vars();
    }
}
