use std::env;
use std::path::PathBuf;

pub const DEFAULT_DATABASE_URL: &str = "sqlite://inventory.db";
pub const DEFAULT_DATA_DIR: &str = "data";
pub const DEFAULT_LOG_DIR: &str = "logs";

/// Locations shared by both batch jobs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InventoryConfig {
    pub database_url: String,
    pub data_dir: PathBuf,
    pub log_dir: PathBuf,
}

impl Default for InventoryConfig {
    fn default() -> Self {
        Self {
            database_url: DEFAULT_DATABASE_URL.to_string(),
            data_dir: PathBuf::from(DEFAULT_DATA_DIR),
            log_dir: PathBuf::from(DEFAULT_LOG_DIR),
        }
    }
}

impl InventoryConfig {
    /// Reads `INVENTORY_DATABASE_URL` (or `DATABASE_URL`), `INVENTORY_DATA_DIR`
    /// and `INVENTORY_LOG_DIR`, falling back to the defaults.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());
        let defaults = Self::default();

        Self {
            database_url: get("INVENTORY_DATABASE_URL")
                .or_else(|| get("DATABASE_URL"))
                .map(|raw| normalize_database_url(&raw))
                .unwrap_or(defaults.database_url),
            data_dir: get("INVENTORY_DATA_DIR")
                .map(PathBuf::from)
                .unwrap_or(defaults.data_dir),
            log_dir: get("INVENTORY_LOG_DIR")
                .map(PathBuf::from)
                .unwrap_or(defaults.log_dir),
        }
    }

    /// Applies command-line values on top of the environment.
    pub fn with_overrides(
        mut self,
        database_url: Option<String>,
        data_dir: Option<PathBuf>,
        log_dir: Option<PathBuf>,
    ) -> Self {
        if let Some(url) = database_url {
            self.database_url = normalize_database_url(&url);
        }
        if let Some(dir) = data_dir {
            self.data_dir = dir;
        }
        if let Some(dir) = log_dir {
            self.log_dir = dir;
        }
        self
    }
}

/// Accepts either a `sqlite:` URL or a bare file path.
pub fn normalize_database_url(raw: &str) -> String {
    let trimmed = raw.trim();
    if trimmed.starts_with("sqlite:") {
        trimmed.to_string()
    } else if trimmed == ":memory:" {
        "sqlite::memory:".to_string()
    } else {
        format!("sqlite://{trimmed}")
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::path::PathBuf;

    use super::{normalize_database_url, InventoryConfig};

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key: &str| map.get(key).cloned()
    }

    #[test]
    fn defaults_when_environment_is_empty() {
        let config = InventoryConfig::from_lookup(lookup(&[]));
        assert_eq!(config, InventoryConfig::default());
    }

    #[test]
    fn prefers_inventory_specific_database_url() {
        let config = InventoryConfig::from_lookup(lookup(&[
            ("DATABASE_URL", "sqlite://other.db"),
            ("INVENTORY_DATABASE_URL", "warehouse.db"),
        ]));
        assert_eq!(config.database_url, "sqlite://warehouse.db");
    }

    #[test]
    fn blank_values_are_ignored() {
        let config = InventoryConfig::from_lookup(lookup(&[("INVENTORY_DATA_DIR", "  ")]));
        assert_eq!(config.data_dir, PathBuf::from("data"));
    }

    #[test]
    fn overrides_win() {
        let config = InventoryConfig::from_lookup(lookup(&[("INVENTORY_LOG_DIR", "/var/log/inv")]))
            .with_overrides(None, Some(PathBuf::from("raw")), Some(PathBuf::from("out")));
        assert_eq!(config.data_dir, PathBuf::from("raw"));
        assert_eq!(config.log_dir, PathBuf::from("out"));
        assert_eq!(config.database_url, "sqlite://inventory.db");
    }

    #[test]
    fn normalizes_paths_and_memory() {
        assert_eq!(normalize_database_url("sqlite::memory:"), "sqlite::memory:");
        assert_eq!(normalize_database_url(":memory:"), "sqlite::memory:");
        assert_eq!(normalize_database_url("data/inv.db"), "sqlite://data/inv.db");
    }
}
