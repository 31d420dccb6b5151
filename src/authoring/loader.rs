use std::fs;
use std::io;
use std::path::Path;
use tracing::{debug, error, info};

use super::document::AuthoringDocument;
use crate::registry::{ModuleEntry, PlantDefinition, PlantRegistration, Registry, RegistryError};

impl AuthoringDocument {
    pub fn plant_definition(&self) -> PlantDefinition {
        PlantDefinition {
            seed: self.seed_type.clone(),
            plant: self.plant_type.clone(),
            min_size: self.min_size,
            max_size: self.max_size,
            rarity: self.rarity.clone(),
            weight: self.weight,
        }
    }
}

/// Read every referenced image from `image_dir`.
///
/// Any missing image aborts the whole load.
pub fn resolve_module_entries(
    document: &AuthoringDocument,
    image_dir: &Path,
) -> Result<Vec<ModuleEntry>, RegistryError> {
    let mut entries = Vec::with_capacity(document.module_count());

    for (part_type, items) in &document.modules {
        for item in items {
            let image_path = image_dir.join(&item.image_filename);
            let image = match fs::read(&image_path) {
                Ok(bytes) => bytes,
                Err(e) if e.kind() == io::ErrorKind::NotFound => {
                    return Err(RegistryError::MissingImage(image_path));
                }
                Err(e) => return Err(RegistryError::io(&image_path, e)),
            };
            debug!(path = %image_path.display(), bytes = image.len(), "Image read");

            entries.push(ModuleEntry {
                part: part_type.clone(),
                module: item.module_type.clone(),
                module_rarity: item.module_rarity.clone(),
                weight: item.weight,
                z_index: item.z_index,
                image,
            });
        }
    }

    if entries.is_empty() {
        return Err(RegistryError::MalformedInput(
            "document has no module items".to_string(),
        ));
    }

    Ok(entries)
}

/// Register an already-parsed document.
pub fn register_document(
    registry: &Registry,
    document: &AuthoringDocument,
    image_dir: &Path,
    allow_overwrite: bool,
) -> Result<PlantRegistration, RegistryError> {
    let entries = resolve_module_entries(document, image_dir)?;
    let result = registry.register_plant(&document.plant_definition(), &entries, allow_overwrite);

    match &result {
        Ok(registration) => info!(
            plant_key = %registration.plant_key,
            modules = registration.module_keys.len(),
            "Plant registered"
        ),
        Err(e) => error!(kind = e.kind(), error = %e, "Plant registration failed"),
    }
    result
}

/// Parse the authoring document at `document_path` and register it.
///
/// Nothing is written when the document is malformed or an image is missing.
pub fn load_and_register(
    registry: &Registry,
    document_path: &Path,
    image_dir: &Path,
    allow_overwrite: bool,
) -> Result<PlantRegistration, RegistryError> {
    let document = AuthoringDocument::from_file(document_path)?;
    info!(
        path = %document_path.display(),
        seed = %document.seed_type,
        plant = %document.plant_type,
        "Authoring document loaded"
    );
    register_document(registry, &document, image_dir, allow_overwrite)
}
