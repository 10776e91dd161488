//! Runtime configuration resolved from the environment.

use std::env;
use std::fmt::Display;
use std::str::FromStr;
use std::time::Duration;

use tracing::info;

use crate::content::fetch::{DEFAULT_MAX_DEPTH, DEFAULT_MAX_NODES, FetchLimits};
use crate::error::{ConfigError, ConfigResult};
use crate::store::http::{DEFAULT_API_VERSION, DEFAULT_BASE_URL};

/// Seconds a fetched content tree stays fresh in the cache.
const DEFAULT_CACHE_TTL_SECS: u64 = 300;

/// Ids of the workspace databases the portal reads and writes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DatabaseIds {
    pub clients: String,
    pub projects: String,
    pub deliverables: String,
    pub invoices: String,
    pub validations: String,
    /// Absent in workspaces that never enabled deliverable comments.
    pub comments: Option<String>,
}

/// Everything needed to stand a portal up against a hosted workspace.
#[derive(Debug, Clone)]
pub struct PortalConfig {
    pub api_key: String,
    pub base_url: String,
    pub api_version: String,
    pub databases: DatabaseIds,
    pub limits: FetchLimits,
    pub content_cache_ttl: Duration,
}

impl PortalConfig {
    /// Loads the configuration from process environment variables.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::MissingVar`] when a required variable is unset
    /// or empty, and [`ConfigError::InvalidVar`] when a numeric variable does
    /// not parse.
    pub fn from_env() -> ConfigResult<Self> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Loads the configuration through an arbitrary variable lookup.
    ///
    /// # Errors
    ///
    /// Same contract as [`PortalConfig::from_env`].
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> ConfigResult<Self> {
        Ok(Self {
            api_key: required(&lookup, "NOTION_API_KEY")?,
            base_url: defaulted(&lookup, "NOTION_BASE_URL", DEFAULT_BASE_URL),
            api_version: defaulted(&lookup, "NOTION_API_VERSION", DEFAULT_API_VERSION),
            databases: DatabaseIds {
                clients: required(&lookup, "NOTION_CLIENTS_DB_ID")?,
                projects: required(&lookup, "NOTION_PROJECTS_DB_ID")?,
                deliverables: required(&lookup, "NOTION_DELIVERABLES_DB_ID")?,
                invoices: required(&lookup, "NOTION_INVOICES_DB_ID")?,
                validations: required(&lookup, "NOTION_VALIDATIONS_DB_ID")?,
                comments: lookup("NOTION_COMMENTS_DB_ID").filter(|id| !id.is_empty()),
            },
            limits: FetchLimits {
                max_depth: parsed_or(&lookup, "PORTAIL_MAX_CONTENT_DEPTH", DEFAULT_MAX_DEPTH)?,
                max_nodes: parsed_or(&lookup, "PORTAIL_MAX_CONTENT_NODES", DEFAULT_MAX_NODES)?,
            },
            content_cache_ttl: Duration::from_secs(parsed_or(
                &lookup,
                "PORTAIL_CONTENT_CACHE_TTL",
                DEFAULT_CACHE_TTL_SECS,
            )?),
        })
    }
}

fn required(lookup: &impl Fn(&str) -> Option<String>, name: &str) -> ConfigResult<String> {
    lookup(name)
        .filter(|value| !value.is_empty())
        .ok_or_else(|| ConfigError::missing_var(name))
}

fn defaulted(lookup: &impl Fn(&str) -> Option<String>, name: &str, default: &str) -> String {
    lookup(name)
        .filter(|value| !value.is_empty())
        .unwrap_or_else(|| {
            info!("{name} not set, using default: {default}");
            default.to_string()
        })
}

fn parsed_or<T>(
    lookup: &impl Fn(&str) -> Option<String>,
    name: &str,
    default: T,
) -> ConfigResult<T>
where
    T: FromStr,
    T::Err: Display,
{
    match lookup(name).filter(|value| !value.is_empty()) {
        Some(raw) => raw
            .parse()
            .map_err(|err: T::Err| ConfigError::invalid_var(name, err.to_string())),
        None => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn base_vars() -> HashMap<&'static str, &'static str> {
        HashMap::from([
            ("NOTION_API_KEY", "secret_abc"),
            ("NOTION_CLIENTS_DB_ID", "db-clients"),
            ("NOTION_PROJECTS_DB_ID", "db-projets"),
            ("NOTION_DELIVERABLES_DB_ID", "db-livrables"),
            ("NOTION_INVOICES_DB_ID", "db-factures"),
            ("NOTION_VALIDATIONS_DB_ID", "db-validations"),
        ])
    }

    fn load(vars: &HashMap<&str, &str>) -> ConfigResult<PortalConfig> {
        PortalConfig::from_lookup(|name| vars.get(name).map(ToString::to_string))
    }

    #[test]
    fn test_load_applies_defaults() {
        let config = load(&base_vars()).unwrap();
        assert_eq!(config.api_key, "secret_abc");
        assert_eq!(config.base_url, DEFAULT_BASE_URL);
        assert_eq!(config.api_version, DEFAULT_API_VERSION);
        assert_eq!(config.databases.clients, "db-clients");
        assert_eq!(config.databases.comments, None);
        assert_eq!(config.limits, FetchLimits::default());
        assert_eq!(config.content_cache_ttl, Duration::from_secs(300));
    }

    #[test]
    fn test_load_reads_optional_vars() {
        let mut vars = base_vars();
        vars.insert("NOTION_COMMENTS_DB_ID", "db-commentaires");
        vars.insert("NOTION_BASE_URL", "https://store.example.test");
        vars.insert("PORTAIL_MAX_CONTENT_DEPTH", "3");
        vars.insert("PORTAIL_CONTENT_CACHE_TTL", "60");
        let config = load(&vars).unwrap();
        assert_eq!(config.databases.comments.as_deref(), Some("db-commentaires"));
        assert_eq!(config.base_url, "https://store.example.test");
        assert_eq!(config.limits.max_depth, 3);
        assert_eq!(config.limits.max_nodes, DEFAULT_MAX_NODES);
        assert_eq!(config.content_cache_ttl, Duration::from_secs(60));
    }

    #[test]
    fn test_missing_required_var_is_an_error() {
        let mut vars = base_vars();
        vars.remove("NOTION_API_KEY");
        let err = load(&vars).unwrap_err();
        assert!(matches!(err, ConfigError::MissingVar(name) if name == "NOTION_API_KEY"));
    }

    #[test]
    fn test_empty_required_var_is_an_error() {
        let mut vars = base_vars();
        vars.insert("NOTION_VALIDATIONS_DB_ID", "");
        let err = load(&vars).unwrap_err();
        assert!(matches!(err, ConfigError::MissingVar(name) if name == "NOTION_VALIDATIONS_DB_ID"));
    }

    #[test]
    fn test_unparseable_number_is_an_error() {
        let mut vars = base_vars();
        vars.insert("PORTAIL_MAX_CONTENT_NODES", "beaucoup");
        let err = load(&vars).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidVar { name, .. } if name == "PORTAIL_MAX_CONTENT_NODES"));
    }
}
