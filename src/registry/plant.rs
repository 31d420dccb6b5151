use std::collections::BTreeMap;
use tracing::{info, warn};

use super::module::check_identifiers;
use super::{CatalogKind, Registry, RegistryError};
use crate::catalog::{
    ModuleId, ModuleOption, PartModules, PlantOption, PlantSetting, plant_key, seed_key,
};

/// The seed-level data for a new plant.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlantDefinition {
    pub seed: String,
    pub plant: String,
    pub min_size: u32,
    pub max_size: u32,
    pub rarity: String,
    pub weight: u32,
}

impl PlantDefinition {
    pub fn key(&self) -> String {
        plant_key(&self.seed, &self.plant)
    }

    pub fn option(&self) -> PlantOption {
        PlantOption {
            min_size: self.min_size,
            max_size: self.max_size,
            rarity: self.rarity.clone(),
            weight: self.weight,
        }
    }
}

/// One module of a plant being registered, with its image bytes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModuleEntry {
    pub part: String,
    pub module: String,
    pub module_rarity: String,
    pub weight: u32,
    pub z_index: i64,
    pub image: Vec<u8>,
}

impl ModuleEntry {
    pub fn id(&self, plant: &PlantDefinition) -> ModuleId {
        ModuleId::new(&plant.seed, &plant.plant, &self.part, &self.module)
    }
}

/// What a successful registration wrote.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlantRegistration {
    pub plant_key: String,
    pub seed_key: String,
    pub module_keys: Vec<String>,
}

/// `part -> module -> {moduleRarity, weight}` for the plant catalog.
pub fn build_part_modules(entries: &[ModuleEntry]) -> PartModules {
    let mut parts: PartModules = BTreeMap::new();
    for entry in entries {
        parts.entry(entry.part.clone()).or_default().insert(
            entry.module.clone(),
            ModuleOption {
                module_rarity: entry.module_rarity.clone(),
                weight: entry.weight,
            },
        );
    }
    parts
}

fn validate(plant: &PlantDefinition, entries: &[ModuleEntry]) -> Result<(), RegistryError> {
    check_identifiers(&[("seed", plant.seed.as_str()), ("plant", plant.plant.as_str())])?;

    let mut seen = BTreeMap::new();
    for entry in entries {
        check_identifiers(&[("partType", entry.part.as_str()), ("moduleType", entry.module.as_str())])?;
        let key = entry.id(plant).key();
        if let Some(previous) = seen.insert(key.clone(), format!("{}/{}", entry.part, entry.module)) {
            return Err(RegistryError::MalformedInput(format!(
                "modules {} and {}/{} both map to key {}",
                previous, entry.part, entry.module, key
            )));
        }
    }
    Ok(())
}

impl Registry {
    /// Register a plant: every module, then the plant catalog, then the seed catalog.
    ///
    /// All three catalogs must be readable before anything is written, and
    /// without `allow_overwrite` every key is checked too. Failures after the
    /// first write are not rolled back.
    pub fn register_plant(
        &self,
        plant: &PlantDefinition,
        entries: &[ModuleEntry],
        allow_overwrite: bool,
    ) -> Result<PlantRegistration, RegistryError> {
        validate(plant, entries)?;

        let key = plant.key();
        info!(plant_key = %key, modules = entries.len(), "Registering plant");

        self.preflight(plant, entries, allow_overwrite)?;

        let mut module_keys = Vec::with_capacity(entries.len());
        for entry in entries {
            let id = entry.id(plant);
            self.register_module(&id, entry.z_index, &entry.image, allow_overwrite)?;
            module_keys.push(id.key());
        }

        let setting = PlantSetting {
            modules: build_part_modules(entries),
            rarity: None,
        };
        self.plants.update(|plants| {
            if plants.contains_key(&key) {
                if !allow_overwrite {
                    return Err(RegistryError::DuplicateKey {
                        catalog: CatalogKind::Plants,
                        key: key.clone(),
                    });
                }
                warn!(plant_key = %key, "Plant key already exists, overwriting");
            }
            plants.insert(key.clone(), setting);
            Ok(())
        })?;
        info!(path = %self.plants.path().display(), plant_key = %key, "Plant catalog updated");

        let seed = seed_key(&plant.seed);
        self.seeds.update(|seeds| {
            if !seeds.contains_key(&seed) {
                info!(seed = %seed, "Adding new seed");
            }
            seeds
                .entry(seed.clone())
                .or_default()
                .plants
                .insert(plant.plant.clone(), plant.option());
            Ok::<_, RegistryError>(())
        })?;
        info!(path = %self.seeds.path().display(), seed = %seed, "Seed catalog updated");

        Ok(PlantRegistration {
            plant_key: key,
            seed_key: seed,
            module_keys,
        })
    }

    fn preflight(
        &self,
        plant: &PlantDefinition,
        entries: &[ModuleEntry],
        allow_overwrite: bool,
    ) -> Result<(), RegistryError> {
        let modules = self.modules.try_load()?;
        let plants = self.plants.try_load()?;
        self.seeds.try_load()?;
        if allow_overwrite {
            return Ok(());
        }

        let key = plant.key();
        if plants.contains_key(&key) {
            return Err(RegistryError::DuplicateKey {
                catalog: CatalogKind::Plants,
                key,
            });
        }

        for entry in entries {
            let module_key = entry.id(plant).key();
            if modules.contains_key(&module_key) {
                return Err(RegistryError::DuplicateKey {
                    catalog: CatalogKind::Modules,
                    key: module_key,
                });
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::test_registry;
    use std::fs;
    use tempfile::TempDir;

    fn sakura() -> PlantDefinition {
        PlantDefinition {
            seed: "Art".to_string(),
            plant: "Sakura".to_string(),
            min_size: 100,
            max_size: 120,
            rarity: "SR".to_string(),
            weight: 60,
        }
    }

    fn entry(part: &str, module: &str, rarity: &str, weight: u32, z_index: i64) -> ModuleEntry {
        ModuleEntry {
            part: part.to_string(),
            module: module.to_string(),
            module_rarity: rarity.to_string(),
            weight,
            z_index,
            image: b"PNG".to_vec(),
        }
    }

    #[test]
    fn registers_modules_plant_and_seed() {
        let dir = TempDir::new().unwrap();
        let registry = test_registry(dir.path());
        let entries = vec![
            entry("Stem", "V1", "R", 100, 10),
            entry("Flower", "Petal_R", "R", 50, 20),
            entry("Flower", "Spike_SR", "SR", 20, 20),
        ];

        let result = registry.register_plant(&sakura(), &entries, false).unwrap();
        assert_eq!(result.plant_key, "ART_SAKURA");
        assert_eq!(result.seed_key, "art");
        assert_eq!(result.module_keys.len(), 3);

        let modules = registry.modules().load();
        assert!(modules.contains_key("ART_SAKURA_STEM_V1"));
        assert!(modules.contains_key("ART_SAKURA_FLOWER_SPIKE_SR"));

        let plants = registry.plants().load();
        let setting = &plants["ART_SAKURA"];
        assert_eq!(setting.modules["Flower"].len(), 2);
        assert_eq!(setting.modules["Flower"]["Spike_SR"].module_rarity, "SR");
        assert_eq!(setting.modules["Stem"]["V1"].weight, 100);
        assert!(setting.rarity.is_none());

        let seeds = registry.seeds().load();
        assert_eq!(seeds["art"].plants["Sakura"], sakura().option());
    }

    #[test]
    fn existing_seed_keeps_other_plants() {
        let dir = TempDir::new().unwrap();
        let registry = test_registry(dir.path());
        registry
            .register_plant(&sakura(), &[entry("Stem", "V1", "R", 100, 10)], false)
            .unwrap();

        let mut tulip = sakura();
        tulip.plant = "Tulip".to_string();
        registry
            .register_plant(&tulip, &[entry("Stem", "V1", "R", 100, 10)], false)
            .unwrap();

        let seeds = registry.seeds().load();
        assert_eq!(seeds.len(), 1);
        assert_eq!(seeds["art"].plants.len(), 2);
    }

    #[test]
    fn duplicate_plant_is_rejected_and_catalogs_unchanged() {
        let dir = TempDir::new().unwrap();
        let registry = test_registry(dir.path());
        registry
            .register_plant(&sakura(), &[entry("Stem", "V1", "R", 100, 10)], false)
            .unwrap();
        let plants_before = fs::read(registry.plants().path()).unwrap();
        let modules_before = fs::read(registry.modules().path()).unwrap();

        let mut changed = sakura();
        changed.weight = 1;
        let err = registry
            .register_plant(&changed, &[entry("Stem", "V1", "SR", 5, 99)], false)
            .unwrap_err();

        assert!(err.is_duplicate_key());
        assert_eq!(fs::read(registry.plants().path()).unwrap(), plants_before);
        assert_eq!(fs::read(registry.modules().path()).unwrap(), modules_before);
        assert_eq!(registry.seeds().load()["art"].plants["Sakura"].weight, 60);
    }

    #[test]
    fn new_module_on_existing_plant_is_rejected_before_writing() {
        let dir = TempDir::new().unwrap();
        let registry = test_registry(dir.path());
        registry
            .register_plant(&sakura(), &[entry("Stem", "V1", "R", 100, 10)], false)
            .unwrap();

        let err = registry
            .register_plant(&sakura(), &[entry("Leaf", "Round", "R", 100, 5)], false)
            .unwrap_err();

        assert!(matches!(
            err,
            RegistryError::DuplicateKey { catalog: CatalogKind::Plants, .. }
        ));
        assert!(!registry.modules().load().contains_key("ART_SAKURA_LEAF_ROUND"));
    }

    #[test]
    fn overwrite_replaces_plant_in_place() {
        let dir = TempDir::new().unwrap();
        let registry = test_registry(dir.path());
        registry
            .register_plant(&sakura(), &[entry("Stem", "V1", "R", 100, 10)], false)
            .unwrap();

        let mut changed = sakura();
        changed.rarity = "SSR".to_string();
        registry
            .register_plant(&changed, &[entry("Stem", "V2", "SR", 40, 12)], true)
            .unwrap();

        let plants = registry.plants().load();
        assert_eq!(plants.len(), 1);
        assert!(plants["ART_SAKURA"].modules["Stem"].contains_key("V2"));
        assert!(!plants["ART_SAKURA"].modules["Stem"].contains_key("V1"));
        assert_eq!(registry.seeds().load()["art"].plants["Sakura"].rarity, "SSR");
        // The replaced module entry is not deleted from the module catalog.
        assert_eq!(registry.modules().load().len(), 2);
    }

    #[test]
    fn colliding_module_keys_are_malformed() {
        let dir = TempDir::new().unwrap();
        let registry = test_registry(dir.path());
        let entries = vec![
            entry("Stem", "V1", "R", 100, 10),
            entry("stem", "v1", "R", 100, 10),
        ];

        let err = registry.register_plant(&sakura(), &entries, true).unwrap_err();
        assert!(matches!(err, RegistryError::MalformedInput(_)));
        assert!(registry.modules().load().is_empty());
    }

    #[test]
    fn unreadable_seed_entry_stops_before_any_write() {
        let dir = TempDir::new().unwrap();
        let registry = test_registry(dir.path());
        let seeds = r#"{ "art": { "plants": { "Old": { "minSize": "big" } } } }"#;
        fs::create_dir_all(registry.seeds().path().parent().unwrap()).unwrap();
        fs::write(registry.seeds().path(), seeds).unwrap();

        let err = registry
            .register_plant(&sakura(), &[entry("Stem", "V1", "R", 100, 10)], true)
            .unwrap_err();

        assert_eq!(err.kind(), "io");
        assert!(err.to_string().contains("'art'"));
        assert!(!registry.modules().path().exists());
        assert!(!registry.plants().path().exists());
        assert!(!dir.path().join("images").exists());
        assert_eq!(fs::read_to_string(registry.seeds().path()).unwrap(), seeds);
    }

    #[test]
    fn build_part_modules_groups_by_part() {
        let parts = build_part_modules(&[
            entry("Stem", "A", "R", 1, 0),
            entry("Leaf", "B", "SR", 2, 0),
            entry("Stem", "C", "R", 3, 0),
        ]);
        assert_eq!(parts.len(), 2);
        assert_eq!(parts["Stem"].len(), 2);
        assert_eq!(parts["Leaf"]["B"].weight, 2);
    }
}
