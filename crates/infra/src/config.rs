//! Configuration loading and representation.
//!
//! Everything is read from environment variables:
//!
//! | Variable | Meaning | Default |
//! |---|---|---|
//! | `DATABASE_URL` | Postgres connection URL | none (Postgres backends require it) |
//! | `STOCKORDER_DB_MAX_CONNECTIONS` | pool size | `10` |
//! | `STOCKORDER_DB_ACQUIRE_TIMEOUT_SECS` | pool acquire timeout | `5` |
//! | `STOCKORDER_TAX_RATE` | decimal fraction, e.g. `0.20` | `0.20` |
//! | `STOCKORDER_INVENTORY_POLICY` | `strict` or `warn` | `strict` |
//! | `STOCKORDER_LOG_FORMAT` | `json` or `pretty` | `json` |

use std::time::Duration;

use thiserror::Error;

use stockorder_core::TaxRate;
use stockorder_inventory::InventoryPolicy;
use stockorder_observability::LogFormat;

pub const DATABASE_URL: &str = "DATABASE_URL";
pub const DB_MAX_CONNECTIONS: &str = "STOCKORDER_DB_MAX_CONNECTIONS";
pub const DB_ACQUIRE_TIMEOUT_SECS: &str = "STOCKORDER_DB_ACQUIRE_TIMEOUT_SECS";
pub const TAX_RATE: &str = "STOCKORDER_TAX_RATE";
pub const INVENTORY_POLICY: &str = "STOCKORDER_INVENTORY_POLICY";
pub const LOG_FORMAT: &str = "STOCKORDER_LOG_FORMAT";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{0} must be set")]
    Missing(&'static str),

    #[error("invalid value for {var}: {message}")]
    Invalid { var: &'static str, message: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
    pub acquire_timeout: Duration,
}

impl DatabaseConfig {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            max_connections: 10,
            acquire_timeout: Duration::from_secs(5),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineConfig {
    pub database: Option<DatabaseConfig>,
    pub tax_rate: TaxRate,
    pub inventory_policy: InventoryPolicy,
    pub log_format: LogFormat,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            database: None,
            tax_rate: TaxRate::STANDARD,
            inventory_policy: InventoryPolicy::Strict,
            log_format: LogFormat::Json,
        }
    }
}

impl EngineConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the configuration from an arbitrary key lookup (tests pass a map).
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();

        let database = match lookup(DATABASE_URL).filter(|u| !u.trim().is_empty()) {
            Some(url) => {
                let mut db = DatabaseConfig::new(url);
                if let Some(raw) = lookup(DB_MAX_CONNECTIONS) {
                    db.max_connections = parse_with(DB_MAX_CONNECTIONS, &raw, |s| {
                        s.parse::<u32>()
                            .ok()
                            .filter(|n| *n > 0)
                            .ok_or_else(|| "expected a positive integer".to_string())
                    })?;
                }
                if let Some(raw) = lookup(DB_ACQUIRE_TIMEOUT_SECS) {
                    let secs = parse_with(DB_ACQUIRE_TIMEOUT_SECS, &raw, |s| {
                        s.parse::<u64>()
                            .map_err(|_| "expected a number of seconds".to_string())
                    })?;
                    db.acquire_timeout = Duration::from_secs(secs);
                }
                Some(db)
            }
            None => None,
        };

        let tax_rate = match lookup(TAX_RATE) {
            Some(raw) => parse_with(TAX_RATE, &raw, |s| {
                s.parse::<TaxRate>().map_err(|e| e.to_string())
            })?,
            None => defaults.tax_rate,
        };

        let inventory_policy = match lookup(INVENTORY_POLICY) {
            Some(raw) => parse_with(INVENTORY_POLICY, &raw, |s| {
                s.parse::<InventoryPolicy>().map_err(|e| e.to_string())
            })?,
            None => defaults.inventory_policy,
        };

        let log_format = match lookup(LOG_FORMAT) {
            Some(raw) => parse_with(LOG_FORMAT, &raw, |s| {
                s.parse::<LogFormat>().map_err(|e| e.to_string())
            })?,
            None => defaults.log_format,
        };

        Ok(Self {
            database,
            tax_rate,
            inventory_policy,
            log_format,
        })
    }

    pub fn require_database(&self) -> Result<&DatabaseConfig, ConfigError> {
        self.database.as_ref().ok_or(ConfigError::Missing(DATABASE_URL))
    }
}

fn parse_with<T>(
    var: &'static str,
    raw: &str,
    parse: impl FnOnce(&str) -> Result<T, String>,
) -> Result<T, ConfigError> {
    parse(raw.trim()).map_err(|message| ConfigError::Invalid { var, message })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn load(pairs: &[(&str, &str)]) -> Result<EngineConfig, ConfigError> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        EngineConfig::from_lookup(|k| map.get(k).cloned())
    }

    #[test]
    fn defaults_apply_when_nothing_is_set() {
        let cfg = load(&[]).unwrap();
        assert_eq!(cfg, EngineConfig::default());
        assert_eq!(cfg.require_database(), Err(ConfigError::Missing(DATABASE_URL)));
    }

    #[test]
    fn reads_every_setting() {
        let cfg = load(&[
            (DATABASE_URL, "postgres://localhost/store"),
            (DB_MAX_CONNECTIONS, "4"),
            (DB_ACQUIRE_TIMEOUT_SECS, "30"),
            (TAX_RATE, "0.055"),
            (INVENTORY_POLICY, "warn"),
            (LOG_FORMAT, "pretty"),
        ])
        .unwrap();

        let db = cfg.require_database().unwrap();
        assert_eq!(db.url, "postgres://localhost/store");
        assert_eq!(db.max_connections, 4);
        assert_eq!(db.acquire_timeout, Duration::from_secs(30));
        assert_eq!(cfg.tax_rate.basis_points(), 550);
        assert_eq!(cfg.inventory_policy, InventoryPolicy::WarnAndContinue);
        assert_eq!(cfg.log_format, LogFormat::Pretty);
    }

    #[test]
    fn invalid_values_name_the_variable() {
        let err = load(&[(TAX_RATE, "twenty percent")]).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { var, .. } if var == TAX_RATE));

        let err = load(&[(DATABASE_URL, "postgres://x"), (DB_MAX_CONNECTIONS, "0")]).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { var, .. } if var == DB_MAX_CONNECTIONS));

        let err = load(&[(INVENTORY_POLICY, "yolo")]).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { var, .. } if var == INVENTORY_POLICY));
    }

    #[test]
    fn blank_database_url_counts_as_unset() {
        let cfg = load(&[(DATABASE_URL, "   ")]).unwrap();
        assert!(cfg.database.is_none());
    }
}
