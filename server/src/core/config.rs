use std::path::{Path, PathBuf};

use anyhow::Result;
use serde::Deserialize;

use crate::data::filters::{Capabilities, DEFAULT_MAX_FILTERS};
use crate::data::sql::Backend;
use crate::utils::file::{expand_path, read_json};

use super::cli::CliConfig;
use super::constants::{APP_DOT_FOLDER, CONFIG_FILE_NAME, DEFAULT_GEOSPATIAL, MAX_FILTERS_LIMIT};

// =============================================================================
// File Configuration
// =============================================================================

#[derive(Debug, Default, Deserialize)]
pub struct FiltersFileConfig {
    pub geospatial: Option<bool>,
    pub max_filters: Option<usize>,
    pub dialect: Option<Backend>,
}

/// File-based configuration (JSON)
#[derive(Debug, Default, Deserialize)]
pub struct FileConfig {
    pub filters: Option<FiltersFileConfig>,
    #[serde(flatten)]
    pub extra: serde_json::Value,
}

impl FileConfig {
    /// Load configuration from a JSON file
    fn load_from_file(path: &Path) -> Result<Self> {
        tracing::debug!(path = %path.display(), "Loading config file");
        let config: Self = read_json(path, "config")?;
        tracing::trace!(config = ?config, "Parsed config file");
        Ok(config)
    }

    /// Warn about unknown fields in the config
    fn warn_unknown_fields(&self) {
        if let serde_json::Value::Object(map) = &self.extra
            && !map.is_empty()
        {
            let keys_str: String = map
                .keys()
                .map(|k| k.as_str())
                .collect::<Vec<_>>()
                .join(", ");
            tracing::warn!(
                fields = %keys_str,
                "Unknown fields in config file (possible typos)"
            );
        }
    }

    /// Merge another FileConfig into this one (other takes precedence)
    fn merge(&mut self, other: FileConfig) {
        if let Some(filters) = other.filters {
            let current = self.filters.get_or_insert_with(FiltersFileConfig::default);
            if filters.geospatial.is_some() {
                tracing::trace!(geospatial = ?filters.geospatial, "Merging filters.geospatial");
                current.geospatial = filters.geospatial;
            }
            if filters.max_filters.is_some() {
                tracing::trace!(max_filters = ?filters.max_filters, "Merging filters.max_filters");
                current.max_filters = filters.max_filters;
            }
            if filters.dialect.is_some() {
                tracing::trace!(dialect = ?filters.dialect, "Merging filters.dialect");
                current.dialect = filters.dialect;
            }
        }
    }
}

// =============================================================================
// Final Configuration
// =============================================================================

#[derive(Debug, Clone, PartialEq)]
pub struct FilterConfig {
    /// Geometry columns accept `coveredby`; otherwise they filter as text
    pub geospatial: bool,
    pub max_filters: usize,
    pub dialect: Backend,
}

impl FilterConfig {
    pub fn capabilities(&self) -> Capabilities {
        Capabilities {
            geospatial: self.geospatial,
        }
    }
}

impl Default for FilterConfig {
    fn default() -> Self {
        Self {
            geospatial: DEFAULT_GEOSPATIAL,
            max_filters: DEFAULT_MAX_FILTERS,
            dialect: Backend::default(),
        }
    }
}

/// Final merged application configuration
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AppConfig {
    pub filters: FilterConfig,
}

impl AppConfig {
    /// Load configuration from all sources
    ///
    /// Priority (lowest to highest):
    /// 1. Defaults
    /// 2. Profile directory config (~/.bridge/bridge.json)
    /// 3. Local directory config OR CLI-specified config path
    /// 4. CLI arguments (which include env var fallbacks via clap)
    pub fn load(cli: &CliConfig) -> Result<Self> {
        Self::load_layers(cli, get_profile_config_path(), PathBuf::from(CONFIG_FILE_NAME))
    }

    fn load_layers(cli: &CliConfig, profile_path: Option<PathBuf>, local: PathBuf) -> Result<Self> {
        tracing::debug!("Loading application configuration");
        tracing::trace!(cli = ?cli, "CLI config");

        let mut file_config = FileConfig::default();
        let mut found_configs: Vec<String> = Vec::new();

        // 1. Load from profile dir - skip if not exists
        if let Some(profile_path) = profile_path
            && profile_path.exists()
        {
            let profile_config = FileConfig::load_from_file(&profile_path)?;
            profile_config.warn_unknown_fields();
            file_config.merge(profile_config);
            found_configs.push(profile_path.display().to_string());
        }

        // 2. Load from CLI-specified path OR local directory
        let overlay_path = if let Some(ref path) = cli.config {
            let expanded = expand_path(&path.to_string_lossy());
            if !expanded.exists() {
                anyhow::bail!("Config file not found: {}", expanded.display());
            }
            Some(expanded)
        } else if local.exists() {
            Some(local)
        } else {
            None
        };

        if let Some(path) = overlay_path {
            let overlay_config = FileConfig::load_from_file(&path)?;
            overlay_config.warn_unknown_fields();
            file_config.merge(overlay_config);
            found_configs.push(path.display().to_string());
        }

        tracing::debug!(configs = ?found_configs, "Config files loaded");

        // 3. Layer configs: defaults -> file config -> CLI/env overrides
        let file_filters = file_config.filters.unwrap_or_default();
        let defaults = FilterConfig::default();
        let config = Self {
            filters: FilterConfig {
                geospatial: cli
                    .geospatial
                    .or(file_filters.geospatial)
                    .unwrap_or(defaults.geospatial),
                max_filters: cli
                    .max_filters
                    .or(file_filters.max_filters)
                    .unwrap_or(defaults.max_filters),
                dialect: cli
                    .dialect
                    .or(file_filters.dialect)
                    .unwrap_or(defaults.dialect),
            },
        };

        config.validate()?;
        tracing::debug!(
            geospatial = config.filters.geospatial,
            max_filters = config.filters.max_filters,
            dialect = %config.filters.dialect,
            "Configuration loaded"
        );
        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        let max = self.filters.max_filters;
        if max == 0 || max > MAX_FILTERS_LIMIT {
            anyhow::bail!(
                "Invalid filters.max_filters: {} (must be between 1 and {})",
                max,
                MAX_FILTERS_LIMIT
            );
        }
        Ok(())
    }
}

/// Get the profile config path (~/.bridge/bridge.json)
fn get_profile_config_path() -> Option<PathBuf> {
    dirs::home_dir().map(|h| h.join(APP_DOT_FOLDER).join(CONFIG_FILE_NAME))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn write(dir: &TempDir, name: &str, content: &str) -> PathBuf {
        let path = dir.path().join(name);
        fs::write(&path, content).unwrap();
        path
    }

    #[test]
    fn test_file_config_parse_empty() {
        let config: FileConfig = serde_json::from_str("{}").unwrap();
        assert!(config.filters.is_none());
    }

    #[test]
    fn test_file_config_parse_filters() {
        let json = r#"{ "filters": { "geospatial": false, "max_filters": 10, "dialect": "sqlite" } }"#;
        let config: FileConfig = serde_json::from_str(json).unwrap();
        let filters = config.filters.unwrap();
        assert_eq!(filters.geospatial, Some(false));
        assert_eq!(filters.max_filters, Some(10));
        assert_eq!(filters.dialect, Some(Backend::Sqlite));
    }

    #[test]
    fn test_file_config_parse_extra_fields() {
        let json = r#"{ "filters": {}, "unknown_field": 123 }"#;
        let config: FileConfig = serde_json::from_str(json).unwrap();
        assert_eq!(config.extra.get("unknown_field").unwrap(), 123);
    }

    #[test]
    fn test_file_config_merge() {
        let mut base: FileConfig =
            serde_json::from_str(r#"{ "filters": { "geospatial": false, "max_filters": 5 } }"#)
                .unwrap();
        let overlay: FileConfig =
            serde_json::from_str(r#"{ "filters": { "max_filters": 7, "dialect": "sqlite" } }"#)
                .unwrap();
        base.merge(overlay);

        let filters = base.filters.unwrap();
        assert_eq!(filters.geospatial, Some(false));
        assert_eq!(filters.max_filters, Some(7));
        assert_eq!(filters.dialect, Some(Backend::Sqlite));
    }

    #[test]
    fn test_load_defaults() {
        let dir = TempDir::new().unwrap();
        let config = AppConfig::load_layers(
            &CliConfig::default(),
            Some(dir.path().join("missing.json")),
            dir.path().join("bridge.json"),
        )
        .unwrap();
        assert_eq!(config, AppConfig::default());
        assert_eq!(config.filters.max_filters, DEFAULT_MAX_FILTERS);
    }

    #[test]
    fn test_load_layering() {
        let dir = TempDir::new().unwrap();
        let profile = write(
            &dir,
            "profile.json",
            r#"{ "filters": { "geospatial": false, "max_filters": 5 } }"#,
        );
        let local = write(&dir, "bridge.json", r#"{ "filters": { "max_filters": 8 } }"#);

        let config =
            AppConfig::load_layers(&CliConfig::default(), Some(profile.clone()), local.clone())
                .unwrap();
        assert!(!config.filters.geospatial);
        assert_eq!(config.filters.max_filters, 8);
        assert_eq!(config.filters.dialect, Backend::Postgres);

        let cli = CliConfig {
            max_filters: Some(3),
            dialect: Some(Backend::Sqlite),
            ..Default::default()
        };
        let config = AppConfig::load_layers(&cli, Some(profile), local).unwrap();
        assert_eq!(config.filters.max_filters, 3);
        assert_eq!(config.filters.dialect, Backend::Sqlite);
        assert!(!config.filters.capabilities().geospatial);
    }

    #[test]
    fn test_cli_config_path_replaces_local() {
        let dir = TempDir::new().unwrap();
        let local = write(&dir, "bridge.json", r#"{ "filters": { "max_filters": 8 } }"#);
        let explicit = write(&dir, "other.json", r#"{ "filters": { "max_filters": 9 } }"#);

        let cli = CliConfig {
            config: Some(explicit),
            ..Default::default()
        };
        let config = AppConfig::load_layers(&cli, None, local).unwrap();
        assert_eq!(config.filters.max_filters, 9);
    }

    #[test]
    fn test_missing_cli_config_path_fails() {
        let dir = TempDir::new().unwrap();
        let cli = CliConfig {
            config: Some(dir.path().join("nope.json")),
            ..Default::default()
        };
        let err = AppConfig::load_layers(&cli, None, dir.path().join("bridge.json")).unwrap_err();
        assert!(err.to_string().contains("Config file not found"));
    }

    #[test]
    fn test_invalid_json_fails_with_path() {
        let dir = TempDir::new().unwrap();
        let local = write(&dir, "bridge.json", "{ not json");
        let err = AppConfig::load_layers(&CliConfig::default(), None, local).unwrap_err();
        assert!(err.to_string().contains("Failed to parse config file"));
    }

    #[test]
    fn test_validate_max_filters() {
        let cli = CliConfig {
            max_filters: Some(0),
            ..Default::default()
        };
        let dir = TempDir::new().unwrap();
        assert!(AppConfig::load_layers(&cli, None, dir.path().join("bridge.json")).is_err());
    }
}
