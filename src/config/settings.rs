//! Process settings read from the environment.

use crate::error::ConfigError;
use std::path::PathBuf;

pub const ENV_API_DEFINITION: &str = "RECORD_BRIDGE_API_DEFINITION";
pub const ENV_BIND: &str = "RECORD_BRIDGE_BIND";
pub const ENV_OPENAPI: &str = "RECORD_BRIDGE_OPENAPI";
pub const ENV_BODY_LIMIT: &str = "RECORD_BRIDGE_BODY_LIMIT";

const DEFAULT_BIND: &str = "127.0.0.1:3000";
const DEFAULT_BODY_LIMIT: usize = 1024 * 1024;

#[derive(Clone, Debug)]
pub struct Settings {
    pub api_definition: PathBuf,
    pub bind: String,
    /// OpenAPI document served at `.../openapi.json`, if any.
    pub openapi: Option<PathBuf>,
    pub body_limit: usize,
}

impl Settings {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from an arbitrary key lookup (environment in production, a map in tests).
    pub fn from_lookup<F>(get: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let api_definition = get(ENV_API_DEFINITION)
            .filter(|v| !v.trim().is_empty())
            .ok_or_else(|| ConfigError::Validation(format!("{} is not set", ENV_API_DEFINITION)))?;
        let body_limit = match get(ENV_BODY_LIMIT) {
            Some(v) => v.trim().parse().map_err(|_| {
                ConfigError::Validation(format!("{} must be a byte count, got '{}'", ENV_BODY_LIMIT, v))
            })?,
            None => DEFAULT_BODY_LIMIT,
        };
        Ok(Settings {
            api_definition: PathBuf::from(api_definition),
            bind: get(ENV_BIND).unwrap_or_else(|| DEFAULT_BIND.into()),
            openapi: get(ENV_OPENAPI).filter(|v| !v.trim().is_empty()).map(PathBuf::from),
            body_limit,
        })
    }
}
