use serde::Deserialize;
use std::path::Path;
use std::time::Duration;

use crate::catalog::{ModuleCatalog, PlantCatalog, SeedCatalog};
use crate::persistence::CatalogStore;

#[derive(Debug, Clone, Deserialize)]
pub struct CatalogConfig {
    #[serde(default = "default_modules_catalog")]
    pub modules_catalog: String,
    #[serde(default = "default_plants_catalog")]
    pub plants_catalog: String,
    #[serde(default = "default_seeds_catalog")]
    pub seeds_catalog: String,
    #[serde(default = "default_image_root")]
    pub image_root: String,
    #[serde(default = "default_image_source_dir")]
    pub image_source_dir: String,
    #[serde(default = "default_document_path")]
    pub document_path: String,
    #[serde(default = "default_log_level")]
    pub log_level: String,
    #[serde(default = "default_log_format")]
    pub log_format: String,
    #[serde(default = "default_lock_timeout_ms")]
    pub lock_timeout_ms: u64,
}

fn default_modules_catalog() -> String {
    "public/assets/json/plantsConfig/modules_config.json".to_string()
}
fn default_plants_catalog() -> String {
    "public/assets/json/plantsConfig/plants_config.json".to_string()
}
fn default_seeds_catalog() -> String {
    "public/assets/json/plantsConfig/seeds_config.json".to_string()
}
fn default_image_root() -> String {
    "public/assets/images/plantModules".to_string()
}
fn default_image_source_dir() -> String {
    "plants/images".to_string()
}
fn default_document_path() -> String {
    "plants/new_plants.json".to_string()
}
fn default_log_level() -> String {
    "info".to_string()
}
fn default_log_format() -> String {
    "pretty".to_string()
}
fn default_lock_timeout_ms() -> u64 {
    5000
}

impl Default for CatalogConfig {
    fn default() -> Self {
        CatalogConfig {
            modules_catalog: default_modules_catalog(),
            plants_catalog: default_plants_catalog(),
            seeds_catalog: default_seeds_catalog(),
            image_root: default_image_root(),
            image_source_dir: default_image_source_dir(),
            document_path: default_document_path(),
            log_level: default_log_level(),
            log_format: default_log_format(),
            lock_timeout_ms: default_lock_timeout_ms(),
        }
    }
}

impl CatalogConfig {
    /// Load from `path`, or use the defaults when no file was given.
    pub fn load(path: Option<&Path>) -> Result<Self, String> {
        match path {
            Some(p) => Self::from_file(p),
            None => Ok(Self::default()),
        }
    }

    pub fn from_file(path: &Path) -> Result<Self, String> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| format!("Cannot read {}: {}", path.display(), e))?;
        Self::from_toml_str(&content, path)
    }

    pub fn from_toml_str(content: &str, source_path: &Path) -> Result<Self, String> {
        let config: CatalogConfig =
            toml::from_str(content).map_err(|e| format!("{}: {}", source_path.display(), e))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), String> {
        let mut errors = Vec::new();

        let paths = [
            ("modules_catalog", &self.modules_catalog, "\"data/modules_config.json\""),
            ("plants_catalog", &self.plants_catalog, "\"data/plants_config.json\""),
            ("seeds_catalog", &self.seeds_catalog, "\"data/seeds_config.json\""),
            ("image_root", &self.image_root, "\"public/assets/images/plantModules\""),
            ("image_source_dir", &self.image_source_dir, "\"plants/images\""),
            ("document_path", &self.document_path, "\"plants/new_plants.json\""),
        ];
        for (name, value, example) in paths {
            if value.trim().is_empty() {
                errors.push(format!(
                    "{} must not be empty. Example: {} = {}",
                    name, name, example
                ));
            }
        }

        let catalogs = [&self.modules_catalog, &self.plants_catalog, &self.seeds_catalog];
        if catalogs[0] == catalogs[1] || catalogs[0] == catalogs[2] || catalogs[1] == catalogs[2] {
            errors.push(
                "modules_catalog, plants_catalog and seeds_catalog must be distinct files"
                    .to_string(),
            );
        }

        if self.lock_timeout_ms == 0 {
            errors.push(format!(
                "lock_timeout_ms must be > 0, got {}. Example: lock_timeout_ms = 5000",
                self.lock_timeout_ms
            ));
        }

        let valid_levels = ["error", "warn", "info", "debug", "trace"];
        if !valid_levels.contains(&self.log_level.as_str()) {
            errors.push(format!(
                "log_level must be one of {:?}, got '{}'. Example: log_level = \"info\"",
                valid_levels, self.log_level
            ));
        }

        let valid_formats = ["pretty", "json"];
        if !valid_formats.contains(&self.log_format.as_str()) {
            errors.push(format!(
                "log_format must be one of {:?}, got '{}'. Example: log_format = \"pretty\"",
                valid_formats, self.log_format
            ));
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors.join("\n"))
        }
    }

    pub fn lock_timeout(&self) -> Duration {
        Duration::from_millis(self.lock_timeout_ms)
    }

    pub fn module_store(&self) -> CatalogStore<ModuleCatalog> {
        CatalogStore::new(&self.modules_catalog, self.lock_timeout())
    }

    pub fn plant_store(&self) -> CatalogStore<PlantCatalog> {
        CatalogStore::new(&self.plants_catalog, self.lock_timeout())
    }

    pub fn seed_store(&self) -> CatalogStore<SeedCatalog> {
        CatalogStore::new(&self.seeds_catalog, self.lock_timeout())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;
    use tempfile::NamedTempFile;

    fn test_path() -> PathBuf {
        PathBuf::from("test-plantcatalog.toml")
    }

    #[test]
    fn valid_config_loads_all_fields() {
        let toml = r#"
            modules_catalog = "data/modules.json"
            plants_catalog = "data/plants.json"
            seeds_catalog = "data/seeds.json"
            image_root = "out/images"
            image_source_dir = "in/images"
            document_path = "in/new_plants.json"
            log_level = "debug"
            log_format = "json"
            lock_timeout_ms = 250
        "#;
        let config = CatalogConfig::from_toml_str(toml, &test_path()).unwrap();
        assert_eq!(config.modules_catalog, "data/modules.json");
        assert_eq!(config.plants_catalog, "data/plants.json");
        assert_eq!(config.seeds_catalog, "data/seeds.json");
        assert_eq!(config.image_root, "out/images");
        assert_eq!(config.image_source_dir, "in/images");
        assert_eq!(config.document_path, "in/new_plants.json");
        assert_eq!(config.log_level, "debug");
        assert_eq!(config.log_format, "json");
        assert_eq!(config.lock_timeout(), Duration::from_millis(250));
    }

    #[test]
    fn defaults_applied_for_empty_config() {
        let config = CatalogConfig::from_toml_str("", &test_path()).unwrap();
        assert_eq!(
            config.modules_catalog,
            "public/assets/json/plantsConfig/modules_config.json"
        );
        assert_eq!(config.image_root, "public/assets/images/plantModules");
        assert_eq!(config.document_path, "plants/new_plants.json");
        assert_eq!(config.log_level, "info");
        assert_eq!(config.log_format, "pretty");
        assert_eq!(config.lock_timeout_ms, 5000);
    }

    #[test]
    fn no_file_means_defaults() {
        let config = CatalogConfig::load(None).unwrap();
        assert_eq!(config.seeds_catalog, default_seeds_catalog());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn empty_path_rejected() {
        let err = CatalogConfig::from_toml_str(r#"image_root = """#, &test_path()).unwrap_err();
        assert!(err.contains("image_root"));
    }

    #[test]
    fn shared_catalog_paths_rejected() {
        let toml = r#"
            modules_catalog = "same.json"
            plants_catalog = "same.json"
        "#;
        let err = CatalogConfig::from_toml_str(toml, &test_path()).unwrap_err();
        assert!(err.contains("distinct"));
    }

    #[test]
    fn invalid_log_level_rejected() {
        let err =
            CatalogConfig::from_toml_str(r#"log_level = "verbose""#, &test_path()).unwrap_err();
        assert!(err.contains("log_level"));
    }

    #[test]
    fn multiple_errors_reported_together() {
        let toml = "lock_timeout_ms = 0\nlog_format = \"xml\"";
        let err = CatalogConfig::from_toml_str(toml, &test_path()).unwrap_err();
        assert!(err.contains("lock_timeout_ms"));
        assert!(err.contains("log_format"));
    }

    #[test]
    fn malformed_toml_includes_source_path() {
        let err =
            CatalogConfig::from_toml_str("image_root = [invalid", &test_path()).unwrap_err();
        assert!(err.contains("test-plantcatalog.toml"));
    }

    #[test]
    fn from_file_loads_valid_config() {
        let mut tmp = NamedTempFile::new().unwrap();
        use std::io::Write;
        writeln!(tmp, "lock_timeout_ms = 42").unwrap();
        let config = CatalogConfig::from_file(tmp.path()).unwrap();
        assert_eq!(config.lock_timeout_ms, 42);
    }

    #[test]
    fn from_file_missing_file_error() {
        let err = CatalogConfig::from_file(Path::new("/nonexistent/plantcatalog.toml")).unwrap_err();
        assert!(err.contains("Cannot read"));
    }
}
