use std::path::PathBuf;

const SEEDS_DIR: &str = "seeds";
const PLANTS_DIR: &str = "plants";
const PARTS_DIR: &str = "parts";
const MODULES_DIR: &str = "modules";

/// Identifies one module slot variant: seed / plant / part / module.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ModuleId {
    pub seed: String,
    pub plant: String,
    pub part: String,
    pub module: String,
}

impl ModuleId {
    pub fn new(seed: &str, plant: &str, part: &str, module: &str) -> Self {
        ModuleId {
            seed: seed.to_string(),
            plant: plant.to_string(),
            part: part.to_string(),
            module: module.to_string(),
        }
    }

    pub fn key(&self) -> String {
        module_key(&self.seed, &self.plant, &self.part, &self.module)
    }

    pub fn plant_key(&self) -> String {
        plant_key(&self.seed, &self.plant)
    }

    /// Full on-disk location of this module's image under `root`.
    pub fn image_path(&self, root: &str) -> PathBuf {
        PathBuf::from(self.image_path_string(root))
    }

    /// The same location rendered with `/` separators, as stored in `imgPath`.
    pub fn image_path_string(&self, root: &str) -> String {
        let mut segments = image_dir_segments(root, &self.seed, &self.plant, &self.part, &self.module);
        segments.push(module_image_filename(&self.module));
        segments.join("/")
    }

    pub fn image_dir(&self, root: &str) -> PathBuf {
        module_image_dir(root, &self.seed, &self.plant, &self.part, &self.module)
    }
}

impl std::fmt::Display for ModuleId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}/{}/{}", self.seed, self.plant, self.part, self.module)
    }
}

fn join_upper(parts: &[&str]) -> String {
    parts
        .iter()
        .map(|p| p.to_uppercase())
        .collect::<Vec<_>>()
        .join("_")
}

/// Global module catalog key, e.g. `ART_SAKURAA_STEM_THIN_V3`.
///
/// Inputs are upper-cased, so names differing only in case collide.
pub fn module_key(seed: &str, plant: &str, part: &str, module: &str) -> String {
    join_upper(&[seed, plant, part, module])
}

/// Plant catalog key, e.g. `ART_SAKURAA`.
pub fn plant_key(seed: &str, plant: &str) -> String {
    join_upper(&[seed, plant])
}

/// Seed catalog key: the lower-cased seed name.
pub fn seed_key(seed: &str) -> String {
    seed.to_lowercase()
}

/// Image file name inside a module directory. Always `.png`, whatever the
/// source format was.
pub fn module_image_filename(module: &str) -> String {
    format!("{}.png", module.to_lowercase())
}

fn image_dir_segments(root: &str, seed: &str, plant: &str, part: &str, module: &str) -> Vec<String> {
    let root = root.trim_end_matches(['/', '\\']);
    let mut segments = Vec::with_capacity(9);
    if !root.is_empty() {
        segments.push(root.to_string());
    }
    segments.extend([
        SEEDS_DIR.to_string(),
        seed.to_lowercase(),
        PLANTS_DIR.to_string(),
        plant.to_lowercase(),
        PARTS_DIR.to_string(),
        part.to_lowercase(),
        MODULES_DIR.to_string(),
        module.to_lowercase(),
    ]);
    segments
}

/// `root/seeds/<seed>/plants/<plant>/parts/<part>/modules/<module>`, all
/// identifiers lower-cased.
pub fn module_image_dir(root: &str, seed: &str, plant: &str, part: &str, module: &str) -> PathBuf {
    image_dir_segments(root, seed, plant, part, module)
        .iter()
        .fold(PathBuf::new(), |acc, s| acc.join(s))
}

/// Base name of a stored `imgPath`, accepting either separator.
pub fn image_file_name(img_path: &str) -> String {
    img_path
        .rsplit(['/', '\\'])
        .next()
        .unwrap_or_default()
        .to_string()
}
