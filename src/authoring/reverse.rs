use std::collections::{BTreeMap, HashSet};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

use super::document::{AuthoringDocument, AuthoringModule};
use crate::catalog::keys::image_file_name;
use crate::catalog::{ModuleCatalog, module_key, plant_key, seed_key};
use crate::persistence::{CatalogStore, LoadState};
use crate::registry::{Registry, RegistryError};

/// A rebuilt document plus the module catalog entries it refers to.
#[derive(Debug, Clone, PartialEq)]
pub struct ReverseOutput {
    pub document: AuthoringDocument,
    pub modules: ModuleCatalog,
}

/// Result of copying module images out of the asset tree.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct ExportReport {
    pub copied: Vec<PathBuf>,
    pub skipped: Vec<PathBuf>,
}

fn load_required<T>(name: &str, store: &CatalogStore<BTreeMap<String, T>>) -> Result<BTreeMap<String, T>, RegistryError>
where
    T: serde::Serialize + serde::de::DeserializeOwned,
{
    info!(path = %store.path().display(), "Loading {} catalog", name);
    let (entries, state) = store.load_with_state();
    if entries.is_empty() {
        let why = match state {
            LoadState::Loaded => "empty".to_string(),
            other => other.to_string(),
        };
        return Err(RegistryError::NotFound(format!(
            "{} catalog {} is {}",
            name,
            store.path().display(),
            why
        )));
    }
    Ok(entries)
}

/// Rebuild the authoring document for one plant from the three catalogs.
pub fn reverse_generate(
    registry: &Registry,
    seed: &str,
    plant: &str,
) -> Result<AuthoringDocument, RegistryError> {
    reverse_generate_with_modules(registry, seed, plant).map(|out| out.document)
}

/// Like `reverse_generate`, also returning the referenced module entries.
///
/// Any empty catalog is fatal. Module entries missing from the module catalog
/// are skipped with a warning.
pub fn reverse_generate_with_modules(
    registry: &Registry,
    seed: &str,
    plant: &str,
) -> Result<ReverseOutput, RegistryError> {
    info!(seed = %seed, plant = %plant, "Reverse generating authoring document");

    let seeds = load_required("seed", registry.seeds())?;
    let plants = load_required("plant", registry.plants())?;
    let modules = load_required("module", registry.modules())?;

    let option = seeds
        .get(&seed_key(seed))
        .and_then(|s| s.plants.get(plant))
        .ok_or_else(|| {
            RegistryError::NotFound(format!("plant option {}/{} in seed catalog", seed, plant))
        })?;

    let key = plant_key(seed, plant);
    let setting = plants
        .get(&key)
        .filter(|s| !s.modules.is_empty())
        .ok_or_else(|| RegistryError::NotFound(format!("modules for {} in plant catalog", key)))?;

    let mut parts: BTreeMap<String, Vec<AuthoringModule>> = BTreeMap::new();
    let mut referenced = ModuleCatalog::new();

    for (part_type, options) in &setting.modules {
        let items = parts.entry(part_type.clone()).or_default();
        for (module_type, module_option) in options {
            let mkey = module_key(seed, plant, part_type, module_type);
            let Some(module_setting) = modules.get(&mkey) else {
                warn!(key = %mkey, "Module setting not found, skipping");
                continue;
            };

            items.push(AuthoringModule {
                module_type: module_type.clone(),
                module_rarity: module_option.module_rarity.clone(),
                weight: module_option.weight,
                z_index: module_setting.z_index,
                image_filename: image_file_name(&module_setting.img_path),
            });
            referenced.insert(mkey, module_setting.clone());
        }
    }

    if referenced.is_empty() {
        warn!(plant_key = %key, "No module settings found for this plant");
    }

    let rarity = if option.rarity.is_empty() {
        setting.rarity.clone().unwrap_or_default()
    } else {
        option.rarity.clone()
    };

    let document = AuthoringDocument {
        seed_type: seed.to_string(),
        plant_type: plant.to_string(),
        min_size: option.min_size,
        max_size: option.max_size,
        rarity,
        weight: option.weight,
        modules: parts,
    };

    info!(plant_key = %key, modules = referenced.len(), "Reverse generation complete");
    Ok(ReverseOutput {
        document,
        modules: referenced,
    })
}

/// Copy each module image into `dest` under its base name.
///
/// Best-effort: unreadable sources are logged and listed in `skipped`. Modules
/// share base names across parts, so only the first module (in key order) to
/// claim a name is copied and the rest are skipped.
pub fn export_images(modules: &ModuleCatalog, dest: &Path) -> Result<ExportReport, RegistryError> {
    fs::create_dir_all(dest).map_err(|e| RegistryError::io(dest, e))?;

    let mut report = ExportReport::default();
    let mut taken = HashSet::new();
    for (key, setting) in modules {
        let source = PathBuf::from(&setting.img_path);
        let name = image_file_name(&setting.img_path);
        if name.is_empty() {
            warn!(key = %key, "Module has no image path, skipping");
            report.skipped.push(source);
            continue;
        }

        if !taken.insert(name.clone()) {
            warn!(key = %key, name = %name, "Another module already exported this file name, skipping");
            report.skipped.push(source);
            continue;
        }

        let target = dest.join(&name);
        match fs::copy(&source, &target) {
            Ok(_) => {
                info!(from = %source.display(), to = %target.display(), "Image copied");
                report.copied.push(target);
            }
            Err(e) => {
                warn!(path = %source.display(), error = %e, "Cannot copy image, skipping");
                report.skipped.push(source);
            }
        }
    }
    Ok(report)
}

pub fn is_empty_dir(dir: &Path) -> Result<bool, RegistryError> {
    if !dir.exists() {
        return Ok(true);
    }
    let mut entries = fs::read_dir(dir).map_err(|e| RegistryError::io(dir, e))?;
    Ok(entries.next().is_none())
}

/// Remove everything inside `dir`, keeping the directory. Returns the number
/// of entries removed.
pub fn clear_directory(dir: &Path) -> Result<usize, RegistryError> {
    if !dir.exists() {
        return Ok(0);
    }

    let mut removed = 0;
    for entry in fs::read_dir(dir).map_err(|e| RegistryError::io(dir, e))? {
        let path = entry.map_err(|e| RegistryError::io(dir, e))?.path();
        let result = if path.is_dir() {
            fs::remove_dir_all(&path)
        } else {
            fs::remove_file(&path)
        };
        result.map_err(|e| RegistryError::io(&path, e))?;
        removed += 1;
    }
    info!(path = %dir.display(), removed, "Directory cleared");
    Ok(removed)
}
