use std::env;
use std::net::{IpAddr, SocketAddr};

use thiserror::Error;

use crate::cache::DEFAULT_TTL_MS;

/// Settings that change engine behaviour.
#[derive(Debug, Clone, PartialEq)]
pub struct EngineConfig {
    pub primary_state: String,
    pub primary_district: String,
    pub default_radius_km: f64,
    pub cache_ttl_ms: u64,
}

impl EngineConfig {
    pub fn new(
        primary_state: impl Into<String>,
        primary_district: impl Into<String>,
        default_radius_km: f64,
        cache_ttl_ms: u64,
    ) -> Result<Self, ConfigError> {
        let primary_state = primary_state.into().trim().to_string();
        let primary_district = primary_district.into().trim().to_string();
        if primary_state.is_empty() {
            return Err(ConfigError::Empty("primary state"));
        }
        if primary_district.is_empty() {
            return Err(ConfigError::Empty("primary district"));
        }
        if !default_radius_km.is_finite() || default_radius_km < 0.0 {
            return Err(ConfigError::InvalidRadius(default_radius_km));
        }
        Ok(Self {
            primary_state,
            primary_district,
            default_radius_km,
            cache_ttl_ms,
        })
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            primary_state: "Gujarat".to_string(),
            primary_district: "Ahmedabad".to_string(),
            default_radius_km: 50.0,
            cache_ttl_ms: DEFAULT_TTL_MS,
        }
    }
}

/// Settings controlling the HTTP server binding.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl ServerConfig {
    pub fn socket_addr(&self) -> Result<SocketAddr, ConfigError> {
        if self.host.eq_ignore_ascii_case("localhost") {
            return Ok(SocketAddr::new(IpAddr::from([127, 0, 0, 1]), self.port));
        }

        let ip: IpAddr = self
            .host
            .parse()
            .map_err(|source| ConfigError::InvalidHost { source })?;

        Ok(SocketAddr::new(ip, self.port))
    }
}

/// Tracing controls.
#[derive(Debug, Clone)]
pub struct TelemetryConfig {
    pub log_level: String,
}

/// Top-level configuration for the binary.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub engine: EngineConfig,
    pub server: ServerConfig,
    pub telemetry: TelemetryConfig,
}

impl AppConfig {
    /// Read `.env` (if present) and the process environment.
    pub fn load() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();
        let defaults = EngineConfig::default();

        let primary_state = var_or("LOCATOR_PRIMARY_STATE", &defaults.primary_state);
        let primary_district = var_or("LOCATOR_PRIMARY_DISTRICT", &defaults.primary_district);
        let default_radius_km = parse_var("LOCATOR_DEFAULT_RADIUS_KM", defaults.default_radius_km)?;
        let cache_ttl_ms = parse_var("LOCATOR_CACHE_TTL_MS", defaults.cache_ttl_ms)?;
        let engine = EngineConfig::new(primary_state, primary_district, default_radius_km, cache_ttl_ms)?;

        let host = var_or("LOCATOR_HOST", "127.0.0.1");
        let port = parse_var("LOCATOR_PORT", 3000u16)?;
        let log_level = var_or("LOCATOR_LOG_LEVEL", "info");

        Ok(Self {
            engine,
            server: ServerConfig { host, port },
            telemetry: TelemetryConfig { log_level },
        })
    }
}

fn var_or(name: &str, fallback: &str) -> String {
    env::var(name).unwrap_or_else(|_| fallback.to_string())
}

fn parse_var<T: std::str::FromStr>(name: &'static str, fallback: T) -> Result<T, ConfigError> {
    match env::var(name) {
        Ok(raw) => raw.trim().parse().map_err(|_| ConfigError::InvalidValue { name, value: raw }),
        Err(_) => Ok(fallback),
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{name} has an invalid value '{value}'")]
    InvalidValue { name: &'static str, value: String },
    #[error("{0} must not be empty")]
    Empty(&'static str),
    #[error("default radius must be a finite, non-negative number (got {0})")]
    InvalidRadius(f64),
    #[error("LOCATOR_HOST must parse to an IPv4 or IPv6 address")]
    InvalidHost { source: std::net::AddrParseError },
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Mutex, OnceLock};

    fn env_guard() -> &'static Mutex<()> {
        static GUARD: OnceLock<Mutex<()>> = OnceLock::new();
        GUARD.get_or_init(|| Mutex::new(()))
    }

    fn reset_env() {
        for name in [
            "LOCATOR_PRIMARY_STATE",
            "LOCATOR_PRIMARY_DISTRICT",
            "LOCATOR_DEFAULT_RADIUS_KM",
            "LOCATOR_CACHE_TTL_MS",
            "LOCATOR_HOST",
            "LOCATOR_PORT",
            "LOCATOR_LOG_LEVEL",
        ] {
            env::remove_var(name);
        }
    }

    #[test]
    fn test_load_uses_defaults_when_env_missing() {
        let _lock = env_guard().lock().expect("env mutex poisoned");
        reset_env();
        let config = AppConfig::load().expect("config loads with defaults");
        assert_eq!(config.engine, EngineConfig::default());
        assert_eq!(config.server.host, "127.0.0.1");
        assert_eq!(config.server.port, 3000);
        assert_eq!(config.telemetry.log_level, "info");
    }

    #[test]
    fn test_load_reads_engine_overrides() {
        let _lock = env_guard().lock().expect("env mutex poisoned");
        reset_env();
        env::set_var("LOCATOR_PRIMARY_STATE", "Maharashtra");
        env::set_var("LOCATOR_PRIMARY_DISTRICT", "Pune");
        env::set_var("LOCATOR_DEFAULT_RADIUS_KM", "25.5");
        env::set_var("LOCATOR_CACHE_TTL_MS", "1000");
        let config = AppConfig::load().expect("config loads");
        reset_env();
        assert_eq!(config.engine.primary_state, "Maharashtra");
        assert_eq!(config.engine.primary_district, "Pune");
        assert_eq!(config.engine.default_radius_km, 25.5);
        assert_eq!(config.engine.cache_ttl_ms, 1000);
    }

    #[test]
    fn test_load_rejects_unparseable_numbers() {
        let _lock = env_guard().lock().expect("env mutex poisoned");
        reset_env();
        env::set_var("LOCATOR_CACHE_TTL_MS", "five minutes");
        let err = AppConfig::load().unwrap_err();
        reset_env();
        assert!(matches!(err, ConfigError::InvalidValue { name: "LOCATOR_CACHE_TTL_MS", .. }));
    }

    #[test]
    fn test_load_rejects_negative_radius() {
        let _lock = env_guard().lock().expect("env mutex poisoned");
        reset_env();
        env::set_var("LOCATOR_DEFAULT_RADIUS_KM", "-3");
        let err = AppConfig::load().unwrap_err();
        reset_env();
        assert!(matches!(err, ConfigError::InvalidRadius(_)));
    }

    #[test]
    fn test_engine_config_validation() {
        assert!(EngineConfig::new("Gujarat", "Ahmedabad", 50.0, 0).is_ok());
        assert!(matches!(
            EngineConfig::new(" ", "Ahmedabad", 50.0, 0),
            Err(ConfigError::Empty("primary state"))
        ));
        assert!(EngineConfig::new("Gujarat", "Ahmedabad", f64::NAN, 0).is_err());
    }

    #[test]
    fn test_accepts_localhost_host() {
        let server = ServerConfig { host: "localhost".into(), port: 8080 };
        let addr = server.socket_addr().expect("localhost resolves");
        assert_eq!(addr, SocketAddr::new(IpAddr::from([127, 0, 0, 1]), 8080));
        let bad = ServerConfig { host: "not-an-ip".into(), port: 8080 };
        assert!(bad.socket_addr().is_err());
    }
}
