use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Static per-module asset data stored in the module catalog.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModuleSetting {
    #[serde(rename = "imgPath", alias = "imagePath")]
    pub img_path: String,
    #[serde(rename = "zIndex")]
    pub z_index: i64,
}

/// Lottery data for one module variant inside a plant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModuleOption {
    #[serde(rename = "moduleRarity", default)]
    pub module_rarity: String,
    #[serde(default)]
    pub weight: u32,
}

/// part type -> module type -> option
pub type PartModules = BTreeMap<String, BTreeMap<String, ModuleOption>>;

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct PlantSetting {
    #[serde(default)]
    pub modules: PartModules,
    /// Written by older registrations only. The seed catalog's rarity wins.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rarity: Option<String>,
}

/// A plant as it appears under a seed, with its size range and draw weight.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlantOption {
    #[serde(rename = "minSize", default)]
    pub min_size: u32,
    #[serde(rename = "maxSize", default)]
    pub max_size: u32,
    #[serde(default)]
    pub rarity: String,
    #[serde(default)]
    pub weight: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct SeedSetting {
    #[serde(default)]
    pub plants: BTreeMap<String, PlantOption>,
}

pub type ModuleCatalog = BTreeMap<String, ModuleSetting>;
pub type PlantCatalog = BTreeMap<String, PlantSetting>;
pub type SeedCatalog = BTreeMap<String, SeedSetting>;
