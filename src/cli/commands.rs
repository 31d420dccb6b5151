use std::io::{self, BufRead, Write};
use std::path::Path;

use crate::authoring::{self, AuthoringDocument};
use crate::catalog::{module_key, plant_key, seed_key};
use crate::config::CatalogConfig;
use crate::registry::{Registry, RegistryError};

fn describe(e: &RegistryError) -> String {
    format!("[{}] {}", e.kind(), e)
}

/// Interpret a y/N answer. Anything but "y"/"yes" means no.
pub fn parse_answer(line: &str) -> bool {
    matches!(line.trim().to_lowercase().as_str(), "y" | "yes")
}

/// Ask a y/N question on `output`, reading the answer from `input`.
pub fn confirm_with(
    input: &mut impl BufRead,
    output: &mut impl Write,
    question: &str,
) -> io::Result<bool> {
    write!(output, "{} [y/N] ", question)?;
    output.flush()?;
    let mut line = String::new();
    input.read_line(&mut line)?;
    Ok(parse_answer(&line))
}

fn confirm(question: &str, assume_yes: bool) -> Result<bool, String> {
    if assume_yes {
        return Ok(true);
    }
    let stdin = io::stdin();
    confirm_with(&mut stdin.lock(), &mut io::stderr(), question)
        .map_err(|e| format!("Cannot read answer: {}", e))
}

/// Register the plant described by an authoring document.
///
/// A duplicate key without `--overwrite` asks whether to overwrite and
/// retries once.
pub fn register(
    config: &CatalogConfig,
    document: Option<&str>,
    images: Option<&str>,
    overwrite: bool,
    assume_yes: bool,
) -> Result<(), String> {
    let document_path = Path::new(document.unwrap_or(&config.document_path));
    let image_dir = Path::new(images.unwrap_or(&config.image_source_dir));
    let registry = Registry::from_config(config);

    let doc = AuthoringDocument::from_file(document_path).map_err(|e| describe(&e))?;
    eprintln!(
        "Registering {}/{} ({} modules) from {}",
        doc.seed_type,
        doc.plant_type,
        doc.module_count(),
        document_path.display()
    );

    let registration = match authoring::register_document(&registry, &doc, image_dir, overwrite) {
        Ok(r) => r,
        Err(e) if e.is_duplicate_key() && !overwrite => {
            let question = format!("{}\nOverwrite existing entries?", e);
            if !confirm(&question, assume_yes)? {
                return Err("Registration cancelled; catalogs unchanged".to_string());
            }
            authoring::register_document(&registry, &doc, image_dir, true)
                .map_err(|e| describe(&e))?
        }
        Err(e) => return Err(describe(&e)),
    };

    println!("Registered plant {}", registration.plant_key);
    for key in &registration.module_keys {
        println!("  module {}", key);
    }
    println!("  seed   {}", registration.seed_key);
    Ok(())
}

/// Rebuild an authoring document, optionally exporting its images.
pub fn reverse(
    config: &CatalogConfig,
    seed: &str,
    plant: &str,
    output: Option<&str>,
    export_dir: Option<&str>,
    clear: bool,
    assume_yes: bool,
) -> Result<(), String> {
    let registry = Registry::from_config(config);
    let out =
        authoring::reverse_generate_with_modules(&registry, seed, plant).map_err(|e| describe(&e))?;

    match output {
        Some(path) => {
            out.document
                .write_to(Path::new(path))
                .map_err(|e| describe(&e))?;
            eprintln!("Authoring document written to {}", path);
        }
        None => println!("{}", out.document.to_json().map_err(|e| describe(&e))?),
    }

    if let Some(dir) = export_dir {
        let dest = Path::new(dir);
        if clear && !authoring::is_empty_dir(dest).map_err(|e| describe(&e))? {
            let question = format!("Clear all files in {}?", dest.display());
            if confirm(&question, assume_yes)? {
                let removed = authoring::clear_directory(dest).map_err(|e| describe(&e))?;
                eprintln!("Removed {} entries from {}", removed, dest.display());
            } else {
                eprintln!("Keeping existing files in {}", dest.display());
            }
        }

        let report = authoring::export_images(&out.modules, dest).map_err(|e| describe(&e))?;
        eprintln!(
            "Copied {} image(s) to {}, skipped {}",
            report.copied.len(),
            dest.display(),
            report.skipped.len()
        );
        for path in &report.skipped {
            eprintln!("  skipped {}", path.display());
        }
    }

    Ok(())
}

/// Write a blank authoring document with `parts` placeholder parts.
pub fn template(
    config: &CatalogConfig,
    parts: usize,
    output: Option<&str>,
    assume_yes: bool,
) -> Result<(), String> {
    let path = Path::new(output.unwrap_or(&config.document_path));
    if path.exists() {
        let question = format!("{} exists. Replace it?", path.display());
        if !confirm(&question, assume_yes)? {
            return Err("Template not written".to_string());
        }
    }

    authoring::blank_document(parts)
        .write_to(path)
        .map_err(|e| describe(&e))?;
    println!("{} reset with {} part(s)", path.display(), parts);
    Ok(())
}

/// Print catalog entries for a seed, or for one plant of that seed.
pub fn show(config: &CatalogConfig, seed: &str, plant: Option<&str>) -> Result<(), String> {
    let registry = Registry::from_config(config);
    let seeds = registry.seeds().load();
    let seed_setting = seeds
        .get(&seed_key(seed))
        .ok_or_else(|| format!("Seed '{}' not found in {}", seed, registry.seeds().path().display()))?;

    match plant {
        None => {
            println!("=== Seed {} ===", seed_key(seed));
            println!(
                "{:<24} {:>8} {:>8} {:>8} {:>8}",
                "Plant", "MinSize", "MaxSize", "Rarity", "Weight"
            );
            println!("{}", "-".repeat(60));
            for (name, option) in &seed_setting.plants {
                println!(
                    "{:<24} {:>8} {:>8} {:>8} {:>8}",
                    name, option.min_size, option.max_size, option.rarity, option.weight
                );
            }
            println!("\n{} plant(s)", seed_setting.plants.len());
        }
        Some(plant) => {
            let option = seed_setting
                .plants
                .get(plant)
                .ok_or_else(|| format!("Plant '{}' not found under seed '{}'", plant, seed))?;
            let key = plant_key(seed, plant);
            let plants = registry.plants().load();
            let setting = plants
                .get(&key)
                .ok_or_else(|| format!("Plant key {} not found in plant catalog", key))?;
            let modules = registry.modules().load();

            println!("=== Plant {} ===", key);
            println!("Size: {}-{}", option.min_size, option.max_size);
            println!("Rarity: {}", option.rarity);
            println!("Weight: {}", option.weight);
            for (part, options) in &setting.modules {
                println!();
                println!("--- {} ---", part);
                for (module, module_option) in options {
                    let mkey = module_key(seed, plant, part, module);
                    match modules.get(&mkey) {
                        Some(m) => println!(
                            "  {}: {} (weight {}) z={} {}",
                            module, module_option.module_rarity, module_option.weight, m.z_index, m.img_path
                        ),
                        None => println!(
                            "  {}: {} (weight {}) [missing module entry {}]",
                            module, module_option.module_rarity, module_option.weight, mkey
                        ),
                    }
                }
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use std::io::Cursor;
    use tempfile::TempDir;

    fn config_in(dir: &TempDir) -> CatalogConfig {
        let root = dir.path();
        CatalogConfig {
            modules_catalog: root.join("cfg/modules.json").to_string_lossy().into_owned(),
            plants_catalog: root.join("cfg/plants.json").to_string_lossy().into_owned(),
            seeds_catalog: root.join("cfg/seeds.json").to_string_lossy().into_owned(),
            image_root: root.join("assets").to_string_lossy().into_owned(),
            image_source_dir: root.join("images").to_string_lossy().into_owned(),
            document_path: root.join("new_plants.json").to_string_lossy().into_owned(),
            ..CatalogConfig::default()
        }
    }

    fn write_sample(config: &CatalogConfig) {
        fs::create_dir_all(&config.image_source_dir).unwrap();
        fs::write(Path::new(&config.image_source_dir).join("stem.png"), b"PNG").unwrap();
        fs::write(
            &config.document_path,
            r#"{ "seed_type": "Art", "plant_type": "Sakura", "min_size": 1, "max_size": 2,
                 "rarity": "R", "weight": 3,
                 "modules": { "Stem": [ { "moduleType": "V1", "moduleRarity": "R", "weight": 100,
                                          "zIndex": 10, "image_filename": "stem.png" } ] } }"#,
        )
        .unwrap();
    }

    #[test]
    fn answers_other_than_yes_mean_no() {
        assert!(parse_answer("y\n"));
        assert!(parse_answer(" YES "));
        assert!(!parse_answer("\n"));
        assert!(!parse_answer("n"));
        assert!(!parse_answer("yep"));
    }

    #[test]
    fn confirm_with_writes_prompt_and_reads_answer() {
        let mut input = Cursor::new(b"y\n".to_vec());
        let mut output = Vec::new();
        assert!(confirm_with(&mut input, &mut output, "Overwrite?").unwrap());
        assert_eq!(String::from_utf8(output).unwrap(), "Overwrite? [y/N] ");

        let mut eof = Cursor::new(Vec::new());
        assert!(!confirm_with(&mut eof, &mut Vec::new(), "Clear?").unwrap());
    }

    #[test]
    fn register_then_reregister_with_assume_yes() {
        let dir = TempDir::new().unwrap();
        let config = config_in(&dir);
        write_sample(&config);

        register(&config, None, None, false, false).unwrap();
        register(&config, None, None, false, true).unwrap();

        let registry = Registry::from_config(&config);
        assert_eq!(registry.modules().load().len(), 1);
    }

    #[test]
    fn register_reports_classified_error() {
        let dir = TempDir::new().unwrap();
        let config = config_in(&dir);
        write_sample(&config);
        fs::remove_file(Path::new(&config.image_source_dir).join("stem.png")).unwrap();

        let err = register(&config, None, None, false, true).unwrap_err();
        assert!(err.starts_with("[missing-image]"));
    }

    #[test]
    fn reverse_writes_document_and_exports_images() {
        let dir = TempDir::new().unwrap();
        let config = config_in(&dir);
        write_sample(&config);
        register(&config, None, None, false, false).unwrap();

        let out = dir.path().join("reversed.json");
        let export = dir.path().join("scratch");
        fs::create_dir_all(&export).unwrap();
        fs::write(export.join("stale.png"), b"old").unwrap();

        reverse(
            &config,
            "Art",
            "Sakura",
            Some(out.to_str().unwrap()),
            Some(export.to_str().unwrap()),
            true,
            true,
        )
        .unwrap();

        let doc = AuthoringDocument::from_file(&out).unwrap();
        assert_eq!(doc.modules["Stem"][0].image_filename, "v1.png");
        assert!(export.join("v1.png").exists());
        assert!(!export.join("stale.png").exists());
    }

    #[test]
    fn template_replaces_existing_with_assume_yes() {
        let dir = TempDir::new().unwrap();
        let config = config_in(&dir);
        fs::write(&config.document_path, "{}").unwrap();

        template(&config, 2, None, true).unwrap();
        let text = fs::read_to_string(&config.document_path).unwrap();
        assert!(text.contains("PartType_2"));
    }

    #[test]
    fn show_unknown_seed_fails() {
        let dir = TempDir::new().unwrap();
        let config = config_in(&dir);
        assert!(show(&config, "Nope", None).unwrap_err().contains("Nope"));
    }
}
