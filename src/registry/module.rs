use std::fs;
use tracing::{debug, info, warn};

use super::{CatalogKind, Registry, RegistryError};
use crate::catalog::{ModuleId, ModuleSetting};
use crate::persistence::write_atomic;

/// Reject identifiers that would produce an empty key or a path segment
/// reaching outside the image root.
pub(crate) fn check_identifiers(fields: &[(&str, &str)]) -> Result<(), RegistryError> {
    for (name, value) in fields {
        if value.trim().is_empty() {
            return Err(RegistryError::MalformedInput(format!(
                "{} must be a non-empty string",
                name
            )));
        }
        if value.contains(['/', '\\']) || matches!(value.trim(), "." | "..") {
            return Err(RegistryError::MalformedInput(format!(
                "{} '{}' must be a plain name without path separators",
                name, value
            )));
        }
    }
    Ok(())
}

impl Registry {
    /// Save one module image and record it in the module catalog.
    ///
    /// The image is written before the catalog entry. If the catalog save fails
    /// afterwards the image stays on disk without an entry; re-running with
    /// overwrite enabled converges.
    pub fn register_module(
        &self,
        id: &ModuleId,
        z_index: i64,
        image: &[u8],
        allow_overwrite: bool,
    ) -> Result<ModuleSetting, RegistryError> {
        check_identifiers(&[
            ("seed", id.seed.as_str()),
            ("plant", id.plant.as_str()),
            ("part", id.part.as_str()),
            ("module", id.module.as_str()),
        ])?;

        let key = id.key();
        let dir = id.image_dir(&self.image_root);
        let file_path = id.image_path(&self.image_root);
        let setting = ModuleSetting {
            img_path: id.image_path_string(&self.image_root),
            z_index,
        };

        info!(key = %key, "Registering module");

        self.modules.update(|modules| {
            if modules.contains_key(&key) {
                if !allow_overwrite {
                    return Err(RegistryError::DuplicateKey {
                        catalog: CatalogKind::Modules,
                        key: key.clone(),
                    });
                }
                warn!(key = %key, "Module key already exists, overwriting");
            }

            fs::create_dir_all(&dir).map_err(|e| RegistryError::io(&dir, e))?;
            write_atomic(&file_path, image)?;
            debug!(path = %file_path.display(), bytes = image.len(), "Image saved");

            modules.insert(key.clone(), setting.clone());
            Ok(setting.clone())
        })
    }
}
