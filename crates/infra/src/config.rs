//! Configuration loading and representation.
//!
//! Built-in defaults, then environment variables prefixed `PANELERP` with `__`
//! as the nesting separator (`PANELERP_CATALOG__BASE_URL`,
//! `PANELERP_LOGGING__FORMAT`, ...).

use std::time::Duration;

use config::{Config, Environment};
use serde::Deserialize;
use thiserror::Error;

use panelerp_auth::RetiredModules;
use panelerp_observability::LoggingSettings;

const ENV_PREFIX: &str = "PANELERP";
const RETIRED_ALIASES_KEY: &str = "authz.retired_modules.aliases";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error(transparent)]
    Load(#[from] config::ConfigError),

    #[error("invalid configuration: {0}")]
    Invalid(String),
}

#[derive(Debug, Clone, Deserialize)]
pub struct CatalogSettings {
    /// Base URL of the role catalog, e.g. `http://127.0.0.1:8080`.
    pub base_url: String,
    pub timeout_secs: u64,
}

impl CatalogSettings {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerSettings {
    pub addr: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct AuthzSettings {
    #[serde(default)]
    pub retired_modules: RetiredModules,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub catalog: CatalogSettings,
    pub server: ServerSettings,
    pub logging: LoggingSettings,
    #[serde(default)]
    pub authz: AuthzSettings,
}

impl AppConfig {
    /// Load from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::load(None)
    }

    /// Load with `vars` standing in for the process environment.
    pub fn from_vars<I>(vars: I) -> Result<Self, ConfigError>
    where
        I: IntoIterator<Item = (String, String)>,
    {
        Self::load(Some(vars.into_iter().collect()))
    }

    fn load(vars: Option<config::Map<String, String>>) -> Result<Self, ConfigError> {
        let retired = RetiredModules::v1();

        let settings = Config::builder()
            .set_default("catalog.base_url", "http://127.0.0.1:8080")?
            .set_default("catalog.timeout_secs", 10)?
            .set_default("server.addr", "0.0.0.0:8080")?
            .set_default("logging.filter", "info")?
            .set_default("logging.format", "json")?
            .set_default("authz.retired_modules.version", i64::from(retired.version))?
            .set_default(RETIRED_ALIASES_KEY, retired.aliases)?
            .add_source(
                Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator("_")
                    .separator("__")
                    .list_separator(",")
                    .with_list_parse_key(RETIRED_ALIASES_KEY)
                    .try_parsing(true)
                    .source(vars),
            )
            .build()?;

        let config: AppConfig = settings.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.catalog.base_url.trim().is_empty() {
            return Err(ConfigError::Invalid("catalog.base_url must not be empty".into()));
        }
        if self.catalog.timeout_secs == 0 {
            return Err(ConfigError::Invalid("catalog.timeout_secs must be > 0".into()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use panelerp_observability::LogFormat;
    use std::collections::HashMap;

    fn vars(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn defaults_apply_without_environment() {
        let cfg = AppConfig::from_vars(HashMap::new()).unwrap();
        assert_eq!(cfg.catalog.base_url, "http://127.0.0.1:8080");
        assert_eq!(cfg.catalog.timeout(), Duration::from_secs(10));
        assert_eq!(cfg.server.addr, "0.0.0.0:8080");
        assert_eq!(cfg.logging.filter, "info");
        assert_eq!(cfg.logging.format, LogFormat::Json);
        assert_eq!(cfg.authz.retired_modules, RetiredModules::v1());
    }

    #[test]
    fn environment_overrides_nested_keys() {
        let cfg = AppConfig::from_vars(vars(&[
            ("PANELERP_CATALOG__BASE_URL", "http://catalog.internal"),
            ("PANELERP_CATALOG__TIMEOUT_SECS", "3"),
            ("PANELERP_LOGGING__FORMAT", "pretty"),
        ]))
        .unwrap();
        assert_eq!(cfg.catalog.base_url, "http://catalog.internal");
        assert_eq!(cfg.catalog.timeout_secs, 3);
        assert_eq!(cfg.logging.format, LogFormat::Pretty);
    }

    #[test]
    fn retired_aliases_can_be_overridden_as_a_list() {
        let cfg = AppConfig::from_vars(vars(&[
            ("PANELERP_AUTHZ__RETIRED_MODULES__VERSION", "2"),
            ("PANELERP_AUTHZ__RETIRED_MODULES__ALIASES", "empleados,almacen viejo"),
        ]))
        .unwrap();
        assert_eq!(cfg.authz.retired_modules.version, 2);
        assert!(cfg.authz.retired_modules.is_retired("Almacén Viejo"));
        assert!(!cfg.authz.retired_modules.is_retired("diseño gráfico"));
    }

    #[test]
    fn zero_timeout_is_rejected() {
        let err = AppConfig::from_vars(vars(&[("PANELERP_CATALOG__TIMEOUT_SECS", "0")])).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));
    }

    #[test]
    fn blank_base_url_is_rejected() {
        let err = AppConfig::from_vars(vars(&[("PANELERP_CATALOG__BASE_URL", " ")])).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));
    }
}
