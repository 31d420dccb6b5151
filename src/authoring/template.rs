use std::collections::BTreeMap;

use super::document::{AuthoringDocument, AuthoringModule};

/// A blank authoring document with `part_count` placeholder parts, each
/// holding one empty module item.
pub fn blank_document(part_count: usize) -> AuthoringDocument {
    let modules: BTreeMap<String, Vec<AuthoringModule>> = (0..part_count)
        .map(|i| {
            let item = AuthoringModule {
                module_type: format!("Type_V{}", i + 1),
                module_rarity: String::new(),
                weight: 0,
                z_index: 0,
                image_filename: String::new(),
            };
            (format!("PartType_{}", i + 1), vec![item])
        })
        .collect();

    AuthoringDocument {
        seed_type: String::new(),
        plant_type: String::new(),
        min_size: 0,
        max_size: 0,
        rarity: String::new(),
        weight: 0,
        modules,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::RegistryError;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn creates_one_module_per_part() {
        let doc = blank_document(3);
        assert_eq!(doc.modules.len(), 3);
        assert_eq!(doc.module_count(), 3);
        assert_eq!(doc.modules["PartType_2"][0].module_type, "Type_V2");
        assert!(doc.seed_type.is_empty());
    }

    #[test]
    fn zero_parts_gives_empty_modules() {
        assert!(blank_document(0).modules.is_empty());
    }

    #[test]
    fn written_template_parses_but_is_not_registrable() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("new_plants.json");
        blank_document(2).write_to(&path).unwrap();

        let text = fs::read_to_string(&path).unwrap();
        assert!(text.contains("\"PartType_1\""));
        assert!(text.contains("\"zIndex\": 0"));

        let err = crate::authoring::AuthoringDocument::from_file(&path).unwrap_err();
        assert!(matches!(err, RegistryError::MalformedInput(ref m) if m.contains("seed_type")));
    }
}
