use std::io;
use std::path::{Path, PathBuf};

use crate::persistence::CatalogError;

/// Which of the three catalogs an error refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CatalogKind {
    Modules,
    Plants,
    Seeds,
}

impl std::fmt::Display for CatalogKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CatalogKind::Modules => write!(f, "module"),
            CatalogKind::Plants => write!(f, "plant"),
            CatalogKind::Seeds => write!(f, "seed"),
        }
    }
}

/// Errors raised while registering or reverse-generating plants.
#[derive(Debug)]
pub enum RegistryError {
    /// The key already exists and overwrite was not permitted.
    DuplicateKey { catalog: CatalogKind, key: String },
    NotFound(String),
    MalformedInput(String),
    MissingImage(PathBuf),
    Io { path: PathBuf, source: io::Error },
    Serialize(String),
    Locked(PathBuf),
}

impl RegistryError {
    pub fn io(path: &Path, source: io::Error) -> Self {
        RegistryError::Io {
            path: path.to_path_buf(),
            source,
        }
    }

    /// Short stable classification used when reporting failures.
    pub fn kind(&self) -> &'static str {
        match self {
            RegistryError::DuplicateKey { .. } => "duplicate-key",
            RegistryError::NotFound(_) => "not-found",
            RegistryError::MalformedInput(_) => "malformed-input",
            RegistryError::MissingImage(_) => "missing-image",
            RegistryError::Io { .. } | RegistryError::Serialize(_) => "io",
            RegistryError::Locked(_) => "locked",
        }
    }

    pub fn is_duplicate_key(&self) -> bool {
        matches!(self, RegistryError::DuplicateKey { .. })
    }
}

impl std::fmt::Display for RegistryError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RegistryError::DuplicateKey { catalog, key } => write!(
                f,
                "{} key already exists: {} (enable overwrite to replace it)",
                catalog, key
            ),
            RegistryError::NotFound(what) => write!(f, "Not found: {}", what),
            RegistryError::MalformedInput(e) => write!(f, "Malformed input: {}", e),
            RegistryError::MissingImage(path) => {
                write!(f, "Image file not found: {}", path.display())
            }
            RegistryError::Io { path, source } => {
                write!(f, "I/O error on {}: {}", path.display(), source)
            }
            RegistryError::Serialize(e) => write!(f, "Serialization error: {}", e),
            RegistryError::Locked(path) => write!(
                f,
                "Catalog is locked by another process: {} (remove it if no registration is running)",
                path.display()
            ),
        }
    }
}

impl std::error::Error for RegistryError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            RegistryError::Io { source, .. } => Some(source),
            _ => None,
        }
    }
}

impl From<CatalogError> for RegistryError {
    fn from(e: CatalogError) -> Self {
        match e {
            CatalogError::Io { path, source } => RegistryError::Io { path, source },
            CatalogError::Serialize(msg) => RegistryError::Serialize(msg),
            e @ CatalogError::Schema { .. } => RegistryError::Serialize(e.to_string()),
            CatalogError::Locked(path) => RegistryError::Locked(path),
        }
    }
}
