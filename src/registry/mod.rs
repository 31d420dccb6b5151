pub mod error;
pub mod module;
pub mod plant;

pub use error::{CatalogKind, RegistryError};
pub use plant::{ModuleEntry, PlantDefinition, PlantRegistration};

use crate::catalog::{ModuleCatalog, PlantCatalog, SeedCatalog};
use crate::config::CatalogConfig;
use crate::persistence::CatalogStore;

/// The three catalogs plus the directory module images are written under.
#[derive(Debug, Clone)]
pub struct Registry {
    modules: CatalogStore<ModuleCatalog>,
    plants: CatalogStore<PlantCatalog>,
    seeds: CatalogStore<SeedCatalog>,
    image_root: String,
}

impl Registry {
    pub fn new(
        modules: CatalogStore<ModuleCatalog>,
        plants: CatalogStore<PlantCatalog>,
        seeds: CatalogStore<SeedCatalog>,
        image_root: impl Into<String>,
    ) -> Self {
        Registry {
            modules,
            plants,
            seeds,
            image_root: image_root.into(),
        }
    }

    pub fn from_config(config: &CatalogConfig) -> Self {
        Registry::new(
            config.module_store(),
            config.plant_store(),
            config.seed_store(),
            config.image_root.clone(),
        )
    }

    pub fn modules(&self) -> &CatalogStore<ModuleCatalog> {
        &self.modules
    }

    pub fn plants(&self) -> &CatalogStore<PlantCatalog> {
        &self.plants
    }

    pub fn seeds(&self) -> &CatalogStore<SeedCatalog> {
        &self.seeds
    }

    pub fn image_root(&self) -> &str {
        &self.image_root
    }
}

/// Registry rooted in a scratch directory, shared by the test modules.
#[cfg(test)]
pub(crate) fn test_registry(root: &std::path::Path) -> Registry {
    use std::time::Duration;

    let timeout = Duration::from_millis(500);
    Registry::new(
        CatalogStore::new(root.join("config").join("modules_config.json"), timeout),
        CatalogStore::new(root.join("config").join("plants_config.json"), timeout),
        CatalogStore::new(root.join("config").join("seeds_config.json"), timeout),
        root.join("images").to_string_lossy().into_owned(),
    )
}
