use serde::de::{self, Deserializer, Visitor};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use crate::persistence::{to_pretty_json, write_atomic};
use crate::registry::RegistryError;

/// The hand-edited JSON used to submit one plant (`new_plants.json`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthoringDocument {
    #[serde(deserialize_with = "label")]
    pub seed_type: String,
    #[serde(deserialize_with = "label")]
    pub plant_type: String,
    pub min_size: u32,
    pub max_size: u32,
    #[serde(deserialize_with = "label")]
    pub rarity: String,
    pub weight: u32,
    /// part type -> module items
    pub modules: BTreeMap<String, Vec<AuthoringModule>>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthoringModule {
    #[serde(rename = "moduleType", deserialize_with = "label")]
    pub module_type: String,
    #[serde(rename = "moduleRarity", deserialize_with = "label")]
    pub module_rarity: String,
    pub weight: u32,
    #[serde(rename = "zIndex")]
    pub z_index: i64,
    #[serde(deserialize_with = "label")]
    pub image_filename: String,
}

/// Label fields may be written as integers; they are kept as strings.
fn label<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    struct LabelVisitor;

    impl Visitor<'_> for LabelVisitor {
        type Value = String;

        fn expecting(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
            write!(f, "a string or an integer")
        }

        fn visit_str<E: de::Error>(self, v: &str) -> Result<String, E> {
            Ok(v.to_string())
        }

        fn visit_string<E: de::Error>(self, v: String) -> Result<String, E> {
            Ok(v)
        }

        fn visit_i64<E: de::Error>(self, v: i64) -> Result<String, E> {
            Ok(v.to_string())
        }

        fn visit_u64<E: de::Error>(self, v: u64) -> Result<String, E> {
            Ok(v.to_string())
        }
    }

    deserializer.deserialize_any(LabelVisitor)
}

impl AuthoringDocument {
    pub fn from_file(path: &Path) -> Result<Self, RegistryError> {
        let content = fs::read_to_string(path).map_err(|e| RegistryError::io(path, e))?;
        Self::from_json_str(&content, path)
    }

    /// Parse and check a document. The first structural problem is reported.
    pub fn from_json_str(content: &str, source_path: &Path) -> Result<Self, RegistryError> {
        let document: AuthoringDocument = serde_json::from_str(content).map_err(|e| {
            RegistryError::MalformedInput(format!("{}: {}", source_path.display(), e))
        })?;
        document
            .validate()
            .map_err(|e| RegistryError::MalformedInput(format!("{}: {}", source_path.display(), e)))?;
        Ok(document)
    }

    pub fn validate(&self) -> Result<(), String> {
        if self.seed_type.trim().is_empty() {
            return Err("seed_type must not be empty".to_string());
        }
        if self.plant_type.trim().is_empty() {
            return Err("plant_type must not be empty".to_string());
        }
        for (part_type, items) in &self.modules {
            if part_type.trim().is_empty() {
                return Err("modules contains an empty part type".to_string());
            }
            for (i, item) in items.iter().enumerate() {
                if item.module_type.trim().is_empty() {
                    return Err(format!("modules.{}[{}].moduleType must not be empty", part_type, i));
                }
                if item.image_filename.trim().is_empty() {
                    return Err(format!(
                        "modules.{}[{}].image_filename must not be empty",
                        part_type, i
                    ));
                }
            }
        }
        Ok(())
    }

    pub fn module_count(&self) -> usize {
        self.modules.values().map(Vec::len).sum()
    }

    pub fn to_json(&self) -> Result<String, RegistryError> {
        let bytes = to_pretty_json(self)?;
        String::from_utf8(bytes).map_err(|e| RegistryError::Serialize(e.to_string()))
    }

    /// Write the document pretty-printed, creating parent directories.
    pub fn write_to(&self, path: &Path) -> Result<(), RegistryError> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|e| RegistryError::io(parent, e))?;
        }
        write_atomic(path, &to_pretty_json(self)?)?;
        Ok(())
    }
}
