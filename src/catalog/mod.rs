pub mod keys;
pub mod model;

pub use keys::{ModuleId, module_key, plant_key, seed_key};
pub use model::{
    ModuleCatalog, ModuleOption, ModuleSetting, PartModules, PlantCatalog, PlantOption,
    PlantSetting, SeedCatalog, SeedSetting,
};
