//! Configuration file discovery and loading.
//!
//! Merge order (later overrides earlier):
//! 1. User global config (`~/.taluka-geo/config.yml`)
//! 2. Project config (`.taluka-geo/config.yml`)
//! 3. Local overrides (`.taluka-geo/config.local.yml`)
//!
//! An explicit `--config` file replaces discovery. Environment overrides are
//! applied last, then the result is validated.

use crate::config::merger::merge_configs;
use crate::config::schema::GeoConfig;
use crate::error::{GeoError, Result};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Directory holding configuration files.
pub const CONFIG_DIR: &str = ".taluka-geo";

/// Overrides `geocoder.endpoint`.
pub const ENV_ENDPOINT: &str = "TALUKA_GEO_ENDPOINT";

/// Overrides `cache.dir`.
pub const ENV_CACHE_DIR: &str = "TALUKA_GEO_CACHE_DIR";

/// Paths to configuration files in merge order.
#[derive(Debug, Clone, Default)]
pub struct ConfigPaths {
    /// User's global config: ~/.taluka-geo/config.yml
    pub user_global: Option<PathBuf>,

    /// Project config: .taluka-geo/config.yml
    pub project: Option<PathBuf>,

    /// Local overrides: .taluka-geo/config.local.yml
    pub project_local: Option<PathBuf>,
}

impl ConfigPaths {
    /// Discover config files for the given project root.
    pub fn discover(project_root: &Path) -> Self {
        Self::discover_with_home(project_root, dirs::home_dir().as_deref())
    }

    /// Discover config files using an explicit home directory.
    pub fn discover_with_home(project_root: &Path, home: Option<&Path>) -> Self {
        Self {
            user_global: home.and_then(|h| existing(h.join(CONFIG_DIR).join("config.yml"))),
            project: existing(project_root.join(CONFIG_DIR).join("config.yml")),
            project_local: existing(project_root.join(CONFIG_DIR).join("config.local.yml")),
        }
    }

    /// All existing config paths in merge order.
    pub fn all_existing(&self) -> Vec<&PathBuf> {
        [&self.user_global, &self.project, &self.project_local]
            .into_iter()
            .flatten()
            .collect()
    }
}

fn existing(path: PathBuf) -> Option<PathBuf> {
    path.exists().then_some(path)
}

/// Load a config file as a raw YAML value (for merging).
pub fn load_config_value(path: &Path) -> Result<serde_yaml::Value> {
    let content = fs::read_to_string(path).map_err(|e| {
        if e.kind() == std::io::ErrorKind::NotFound {
            GeoError::ConfigNotFound {
                path: path.to_path_buf(),
            }
        } else {
            GeoError::Io(e)
        }
    })?;

    serde_yaml::from_str(&content).map_err(|e| GeoError::ConfigParseError {
        path: path.to_path_buf(),
        message: e.to_string(),
    })
}

/// Parse YAML content into a [`GeoConfig`].
pub fn parse_config(content: &str, source_path: &Path) -> Result<GeoConfig> {
    if content.trim().is_empty() {
        return Ok(GeoConfig::default());
    }
    serde_yaml::from_str(content).map_err(|e| GeoError::ConfigParseError {
        path: source_path.to_path_buf(),
        message: e.to_string(),
    })
}

/// Merge the given layers into a typed config.
pub fn load_layers(paths: &[&PathBuf]) -> Result<GeoConfig> {
    let mut values = Vec::with_capacity(paths.len());
    for path in paths {
        debug!("Loading config layer {}", path.display());
        values.push(load_config_value(path)?);
    }

    let merged = merge_configs(&values);
    serde_yaml::from_value(merged).map_err(|e| GeoError::ConfigParseError {
        path: paths
            .last()
            .map(|p| p.to_path_buf())
            .unwrap_or_else(|| PathBuf::from(CONFIG_DIR)),
        message: format!("Failed to parse merged config: {}", e),
    })
}

/// Load and merge every discovered config file. No files means defaults.
pub fn load_merged_config(project_root: &Path) -> Result<GeoConfig> {
    let paths = ConfigPaths::discover(project_root);
    load_layers(&paths.all_existing())
}

/// Load an explicit file, or discover and merge.
pub fn load_config(project_root: &Path, config_override: Option<&Path>) -> Result<GeoConfig> {
    match config_override {
        Some(path) => {
            let content = fs::read_to_string(path).map_err(|e| {
                if e.kind() == std::io::ErrorKind::NotFound {
                    GeoError::ConfigNotFound {
                        path: path.to_path_buf(),
                    }
                } else {
                    GeoError::Io(e)
                }
            })?;
            parse_config(&content, path)
        }
        None => load_merged_config(project_root),
    }
}

/// Apply environment overrides using `lookup` to read variables.
pub fn apply_env_overrides<F>(config: &mut GeoConfig, lookup: F)
where
    F: Fn(&str) -> Option<String>,
{
    if let Some(endpoint) = lookup(ENV_ENDPOINT).filter(|v| !v.trim().is_empty()) {
        debug!("{} overrides geocoder endpoint", ENV_ENDPOINT);
        config.geocoder.endpoint = endpoint;
    }
    if let Some(dir) = lookup(ENV_CACHE_DIR).filter(|v| !v.trim().is_empty()) {
        debug!("{} overrides cache dir", ENV_CACHE_DIR);
        config.cache.dir = Some(PathBuf::from(dir));
    }
}

/// Check a loaded configuration for values the service cannot run with.
pub fn validate(config: &GeoConfig) -> Result<()> {
    if config.geocoder.endpoint.trim().is_empty() {
        return Err(GeoError::ConfigValidationError {
            message: "geocoder.endpoint must not be empty".to_string(),
        });
    }
    if config.geocoder.user_agent.trim().is_empty() {
        return Err(GeoError::ConfigValidationError {
            message: "geocoder.user_agent must not be empty".to_string(),
        });
    }
    if let Some(bounds) = &config.bounds {
        bounds.validate()?;
    }
    Ok(())
}

/// Load, apply process environment overrides and validate.
pub fn resolve_config(project_root: &Path, config_override: Option<&Path>) -> Result<GeoConfig> {
    let mut config = load_config(project_root, config_override)?;
    apply_env_overrides(&mut config, |name| std::env::var(name).ok());
    validate(&config)?;
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::static_table::BoundingBox;
    use std::collections::HashMap;
    use std::time::Duration;
    use tempfile::TempDir;

    fn write_layer(root: &Path, name: &str, content: &str) {
        let dir = root.join(CONFIG_DIR);
        fs::create_dir_all(&dir).unwrap();
        fs::write(dir.join(name), content).unwrap();
    }

    #[test]
    fn discover_finds_project_and_local() {
        let temp = TempDir::new().unwrap();
        write_layer(temp.path(), "config.yml", "context:\n  district: Sangli\n");
        write_layer(temp.path(), "config.local.yml", "cache:\n  enabled: false\n");

        let paths = ConfigPaths::discover_with_home(temp.path(), None);

        assert!(paths.project.is_some());
        assert!(paths.project_local.is_some());
        assert!(paths.user_global.is_none());
        assert_eq!(paths.all_existing().len(), 2);
    }

    #[test]
    fn discover_finds_user_global() {
        let home = TempDir::new().unwrap();
        let project = TempDir::new().unwrap();
        write_layer(home.path(), "config.yml", "geocoder:\n  timeout_secs: 5\n");

        let paths = ConfigPaths::discover_with_home(project.path(), Some(home.path()));

        assert!(paths.user_global.is_some());
        assert_eq!(paths.all_existing().len(), 1);
    }

    #[test]
    fn layers_merge_in_priority_order() {
        let home = TempDir::new().unwrap();
        let project = TempDir::new().unwrap();
        write_layer(
            home.path(),
            "config.yml",
            "geocoder:\n  timeout_secs: 5\n  request_delay_ms: 500\n",
        );
        write_layer(project.path(), "config.yml", "geocoder:\n  timeout_secs: 10\n");
        write_layer(project.path(), "config.local.yml", "context:\n  district: Satara\n");

        let paths = ConfigPaths::discover_with_home(project.path(), Some(home.path()));
        let config = load_layers(&paths.all_existing()).unwrap();

        assert_eq!(config.geocoder.timeout(), Duration::from_secs(10));
        assert_eq!(config.geocoder.request_delay_ms, 500);
        assert_eq!(config.context.district, "Satara");
    }

    #[test]
    fn no_files_gives_defaults() {
        let temp = TempDir::new().unwrap();
        let config = load_layers(&[]).unwrap();
        assert_eq!(config, GeoConfig::default());
        assert!(ConfigPaths::discover_with_home(temp.path(), None)
            .all_existing()
            .is_empty());
    }

    #[test]
    fn explicit_file_skips_discovery() {
        let temp = TempDir::new().unwrap();
        write_layer(temp.path(), "config.yml", "context:\n  district: Satara\n");
        let explicit = temp.path().join("other.yml");
        fs::write(&explicit, "context:\n  district: Kolhapur\n").unwrap();

        let config = load_config(temp.path(), Some(&explicit)).unwrap();

        assert_eq!(config.context.district, "Kolhapur");
    }

    #[test]
    fn explicit_missing_file_is_not_found() {
        let temp = TempDir::new().unwrap();
        let missing = temp.path().join("missing.yml");

        let err = load_config(temp.path(), Some(&missing)).unwrap_err();

        assert!(matches!(err, GeoError::ConfigNotFound { .. }));
    }

    #[test]
    fn invalid_yaml_is_parse_error() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("bad.yml");
        fs::write(&path, "geocoder: [unclosed").unwrap();

        let err = load_config(temp.path(), Some(&path)).unwrap_err();

        assert!(matches!(err, GeoError::ConfigParseError { .. }));
    }

    #[test]
    fn empty_file_is_default() {
        let config = parse_config("   \n", Path::new("config.yml")).unwrap();
        assert_eq!(config, GeoConfig::default());
    }

    #[test]
    fn env_overrides_endpoint_and_cache_dir() {
        let vars: HashMap<&str, &str> = [
            (ENV_ENDPOINT, "http://localhost:8080/search"),
            (ENV_CACHE_DIR, "/tmp/geo-cache"),
        ]
        .into_iter()
        .collect();
        let mut config = GeoConfig::default();

        apply_env_overrides(&mut config, |name| vars.get(name).map(|v| v.to_string()));

        assert_eq!(config.geocoder.endpoint, "http://localhost:8080/search");
        assert_eq!(config.cache.dir, Some(PathBuf::from("/tmp/geo-cache")));
    }

    #[test]
    fn blank_env_values_are_ignored() {
        let mut config = GeoConfig::default();
        apply_env_overrides(&mut config, |_| Some("  ".to_string()));
        assert_eq!(config, GeoConfig::default());
    }

    #[test]
    fn validate_rejects_empty_endpoint() {
        let mut config = GeoConfig::default();
        config.geocoder.endpoint = " ".to_string();
        assert!(matches!(
            validate(&config),
            Err(GeoError::ConfigValidationError { .. })
        ));
    }

    #[test]
    fn validate_rejects_empty_user_agent() {
        let mut config = GeoConfig::default();
        config.geocoder.user_agent = String::new();
        assert!(validate(&config).is_err());
    }

    #[test]
    fn validate_rejects_inverted_bounds() {
        let mut config = GeoConfig::default();
        config.bounds = Some(BoundingBox {
            min_lon: 76.0,
            max_lon: 75.0,
            ..BoundingBox::default()
        });
        assert!(validate(&config).is_err());

        config.bounds = Some(BoundingBox::default());
        assert!(validate(&config).is_ok());
    }
}
