use std::fs;
use std::path::Path;

use anyhow::{bail, Context, Result};
use serde::de::DeserializeOwned;
use serde::Serialize;

/// Filesystem access used by the pipelines and the transformer.
pub trait Storage {
    fn read(&self, path: &Path) -> Result<Vec<u8>>;
    /// Create or overwrite `path`, creating parent directories as needed.
    fn write(&self, path: &Path, contents: &[u8]) -> Result<()>;
    fn exists(&self, path: &Path) -> bool;
}

pub struct FsStorage;

impl Storage for FsStorage {
    fn read(&self, path: &Path) -> Result<Vec<u8>> {
        fs::read(path).with_context(|| format!("Failed to read {}", path.display()))
    }

    fn write(&self, path: &Path, contents: &[u8]) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create {}", parent.display()))?;
        }
        fs::write(path, contents).with_context(|| format!("Failed to write {}", path.display()))
    }

    fn exists(&self, path: &Path) -> bool {
        path.is_file()
    }
}

/// Write the whole record list at once, pretty-printed, non-ASCII kept verbatim.
pub fn save_records<S: Storage, T: Serialize>(storage: &S, path: &Path, records: &[T]) -> Result<()> {
    let json = serde_json::to_string_pretty(records)?;
    storage.write(path, json.as_bytes())
}

pub fn load_records<S: Storage, T: DeserializeOwned>(storage: &S, path: &Path) -> Result<Vec<T>> {
    if !storage.exists(path) {
        bail!(
            "Scraped data not found at {}. Run the scraper first.",
            path.display()
        );
    }
    let bytes = storage.read(path)?;
    serde_json::from_slice(&bytes).with_context(|| format!("Malformed record list in {}", path.display()))
}

/// Copy `from` to `to`. Returns `false` without touching anything when
/// `from` does not exist.
pub fn copy_if_exists<S: Storage>(storage: &S, from: &Path, to: &Path) -> Result<bool> {
    if !storage.exists(from) {
        return Ok(false);
    }
    let bytes = storage.read(from)?;
    storage.write(to, &bytes)?;
    Ok(true)
}

#[cfg(test)]
pub mod memory {
    use std::cell::RefCell;
    use std::collections::BTreeMap;
    use std::path::{Path, PathBuf};

    use anyhow::{anyhow, Result};

    use super::Storage;

    #[derive(Default)]
    pub struct MemStorage {
        pub files: RefCell<BTreeMap<PathBuf, Vec<u8>>>,
    }

    impl MemStorage {
        pub fn with_file(self, path: &str, contents: &[u8]) -> Self {
            self.files
                .borrow_mut()
                .insert(PathBuf::from(path), contents.to_vec());
            self
        }

        pub fn text(&self, path: &str) -> Option<String> {
            self.files
                .borrow()
                .get(Path::new(path))
                .map(|b| String::from_utf8_lossy(b).into_owned())
        }
    }

    impl Storage for MemStorage {
        fn read(&self, path: &Path) -> Result<Vec<u8>> {
            self.files
                .borrow()
                .get(path)
                .cloned()
                .ok_or_else(|| anyhow!("no such file: {}", path.display()))
        }

        fn write(&self, path: &Path, contents: &[u8]) -> Result<()> {
            self.files
                .borrow_mut()
                .insert(path.to_path_buf(), contents.to_vec());
            Ok(())
        }

        fn exists(&self, path: &Path) -> bool {
            self.files.borrow().contains_key(path)
        }
    }
}
