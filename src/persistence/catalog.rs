use serde::{Deserialize, Serialize};
use serde::de::DeserializeOwned;
use std::fs::{self, OpenOptions};
use std::io::{self, Write};
use std::marker::PhantomData;
use std::path::{Path, PathBuf};
use std::thread;
use std::time::{Duration, Instant};
use tracing::{debug, warn};

const LOCK_POLL: Duration = Duration::from_millis(25);

/// What `load_with_state` found on disk.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadState {
    Loaded,
    Missing,
    Corrupt,
}

impl std::fmt::Display for LoadState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LoadState::Loaded => write!(f, "loaded"),
            LoadState::Missing => write!(f, "missing"),
            LoadState::Corrupt => write!(f, "corrupt"),
        }
    }
}

/// Errors that can occur while reading or writing a catalog file.
#[derive(Debug)]
pub enum CatalogError {
    Io { path: PathBuf, source: io::Error },
    Serialize(String),
    /// Valid JSON whose entries do not fit the catalog's entry type.
    Schema {
        path: PathBuf,
        entry: Option<String>,
        detail: String,
    },
    Locked(PathBuf),
}

impl CatalogError {
    fn io(path: &Path, source: io::Error) -> Self {
        CatalogError::Io {
            path: path.to_path_buf(),
            source,
        }
    }
}

impl std::fmt::Display for CatalogError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CatalogError::Io { path, source } => {
                write!(f, "I/O error on {}: {}", path.display(), source)
            }
            CatalogError::Serialize(e) => write!(f, "Serialization error: {}", e),
            CatalogError::Schema {
                path,
                entry: Some(entry),
                detail,
            } => write!(
                f,
                "Catalog {} has an unreadable entry '{}': {} (fix or remove it before registering)",
                path.display(),
                entry,
                detail
            ),
            CatalogError::Schema {
                path,
                entry: None,
                detail,
            } => write!(
                f,
                "Catalog {} does not have the expected layout: {}",
                path.display(),
                detail
            ),
            CatalogError::Locked(path) => write!(
                f,
                "Catalog is locked by another process: {} (remove it if no registration is running)",
                path.display()
            ),
        }
    }
}

impl std::error::Error for CatalogError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            CatalogError::Io { source, .. } => Some(source),
            _ => None,
        }
    }
}

/// One JSON catalog file.
///
/// A missing or unparsable file reads as an empty mapping. `update` is stricter:
/// it refuses to rewrite a file it cannot read, or one that is valid JSON but
/// holds entries of the wrong shape. Writes go through a temporary file and a
/// rename, so readers never observe a half-written file.
#[derive(Debug, Clone)]
pub struct CatalogStore<T> {
    path: PathBuf,
    lock_timeout: Duration,
    _entries: PhantomData<T>,
}

impl<T> CatalogStore<T>
where
    T: Serialize + DeserializeOwned + Default,
{
    pub fn new(path: impl Into<PathBuf>, lock_timeout: Duration) -> Self {
        CatalogStore {
            path: path.into(),
            lock_timeout,
            _entries: PhantomData,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load the catalog, falling back to an empty mapping.
    pub fn load(&self) -> T {
        self.load_with_state().0
    }

    /// Load the catalog and report whether the file was present and parsable.
    pub fn load_with_state(&self) -> (T, LoadState) {
        let content = match fs::read_to_string(&self.path) {
            Ok(c) => c,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                debug!(path = %self.path.display(), "Catalog not found, starting empty");
                return (T::default(), LoadState::Missing);
            }
            Err(e) => {
                warn!(path = %self.path.display(), error = %e, "Cannot read catalog, starting empty");
                return (T::default(), LoadState::Corrupt);
            }
        };

        match serde_json::from_str(&content) {
            Ok(entries) => (entries, LoadState::Loaded),
            Err(e) => {
                warn!(path = %self.path.display(), error = %e, "Invalid catalog JSON, starting empty");
                (T::default(), LoadState::Corrupt)
            }
        }
    }

    /// Load the catalog for a write.
    ///
    /// A missing file is empty and a file that is not JSON at all is replaced.
    /// Read failures and entries that do not fit `T` are errors, so the next
    /// save cannot drop data that was merely unexpected.
    pub fn try_load(&self) -> Result<T, CatalogError> {
        let content = match fs::read_to_string(&self.path) {
            Ok(c) => c,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(T::default()),
            Err(e) => return Err(CatalogError::io(&self.path, e)),
        };

        let value: serde_json::Value = match serde_json::from_str(&content) {
            Ok(v) => v,
            Err(e) => {
                warn!(path = %self.path.display(), error = %e, "Invalid catalog JSON, it will be replaced");
                return Ok(T::default());
            }
        };

        T::deserialize(&value).map_err(|e| self.schema_error(&value, e))
    }

    /// Name the first top-level entry that fails to deserialize on its own.
    fn schema_error(&self, value: &serde_json::Value, error: serde_json::Error) -> CatalogError {
        let entry = value.as_object().and_then(|entries| {
            entries
                .iter()
                .find(|(key, entry)| {
                    let mut single = serde_json::Map::new();
                    single.insert((*key).clone(), (*entry).clone());
                    T::deserialize(&serde_json::Value::Object(single)).is_err()
                })
                .map(|(key, _)| key.clone())
        });
        CatalogError::Schema {
            path: self.path.clone(),
            entry,
            detail: error.to_string(),
        }
    }

    /// Write the catalog, creating parent directories and replacing any existing file.
    pub fn save(&self, entries: &T) -> Result<(), CatalogError> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|e| CatalogError::io(parent, e))?;
        }

        let encoded = to_pretty_json(entries)?;
        write_atomic(&self.path, &encoded)
    }

    /// Read-modify-write under an exclusive lock file.
    ///
    /// The catalog is saved only when `apply` returns `Ok`. A catalog that
    /// `try_load` rejects is left untouched.
    pub fn update<R, E>(&self, apply: impl FnOnce(&mut T) -> Result<R, E>) -> Result<R, E>
    where
        E: From<CatalogError>,
    {
        let _lock = self.acquire_lock()?;
        let mut entries = self.try_load()?;
        let result = apply(&mut entries)?;
        self.save(&entries)?;
        Ok(result)
    }

    fn lock_path(&self) -> PathBuf {
        sibling_path(&self.path, ".", ".lock")
    }

    fn acquire_lock(&self) -> Result<CatalogLock, CatalogError> {
        let lock_path = self.lock_path();
        if let Some(parent) = lock_path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|e| CatalogError::io(parent, e))?;
        }

        let deadline = Instant::now() + self.lock_timeout;
        loop {
            match OpenOptions::new()
                .write(true)
                .create_new(true)
                .open(&lock_path)
            {
                Ok(mut file) => {
                    let _ = writeln!(file, "{}", std::process::id());
                    return Ok(CatalogLock { path: lock_path });
                }
                Err(e) if e.kind() == io::ErrorKind::AlreadyExists => {
                    if Instant::now() >= deadline {
                        return Err(CatalogError::Locked(lock_path));
                    }
                    thread::sleep(LOCK_POLL);
                }
                Err(e) => return Err(CatalogError::io(&lock_path, e)),
            }
        }
    }
}

/// Removes the lock file when dropped.
struct CatalogLock {
    path: PathBuf,
}

impl Drop for CatalogLock {
    fn drop(&mut self) {
        if let Err(e) = fs::remove_file(&self.path) {
            warn!(path = %self.path.display(), error = %e, "Cannot remove catalog lock");
        }
    }
}

/// `dir/<prefix><file name><suffix>` next to `path`.
fn sibling_path(path: &Path, prefix: &str, suffix: &str) -> PathBuf {
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    path.with_file_name(format!("{}{}{}", prefix, name, suffix))
}

/// Pretty JSON with 4-space indentation and a trailing newline.
pub fn to_pretty_json<T: Serialize + ?Sized>(value: &T) -> Result<Vec<u8>, CatalogError> {
    let mut buf = Vec::new();
    let formatter = serde_json::ser::PrettyFormatter::with_indent(b"    ");
    let mut ser = serde_json::Serializer::with_formatter(&mut buf, formatter);
    value
        .serialize(&mut ser)
        .map_err(|e| CatalogError::Serialize(e.to_string()))?;
    buf.push(b'\n');
    Ok(buf)
}

/// Write to a temp file next to `target`, then rename over it.
pub fn write_atomic(target: &Path, data: &[u8]) -> Result<(), CatalogError> {
    let tmp = sibling_path(target, ".", ".tmp");

    if let Err(e) = fs::write(&tmp, data) {
        let _ = fs::remove_file(&tmp);
        return Err(CatalogError::io(&tmp, e));
    }

    if let Err(e) = fs::rename(&tmp, target) {
        let _ = fs::remove_file(&tmp);
        return Err(CatalogError::io(target, e));
    }

    Ok(())
}
