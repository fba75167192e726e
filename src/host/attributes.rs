//! Persisted string attributes.
//!
//! Each attribute lives in its own file, named by the blake3 hash of the
//! attribute name so arbitrary names are safe on every filesystem.

use crate::error::{BacktrackError, Result};
use std::path::{Path, PathBuf};

#[derive(Debug, Clone)]
pub struct AttributeStore {
    dir: PathBuf,
}

impl AttributeStore {
    /// Store under the user cache directory, e.g. `~/.cache/<app_name>`.
    pub fn open_default(app_name: &str) -> Result<Self> {
        let cache_dir = dirs::cache_dir().ok_or_else(|| {
            BacktrackError::Storage("Could not determine cache directory".to_string())
        })?;
        Ok(Self::at(cache_dir.join(app_name)))
    }

    pub fn at(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn attr_path(&self, name: &str) -> PathBuf {
        self.dir.join(blake3::hash(name.as_bytes()).to_hex().as_str())
    }

    pub fn try_get(&self, name: &str) -> Result<Option<String>> {
        let path = self.attr_path(name);
        match std::fs::read_to_string(&path) {
            Ok(content) => Ok(Some(content)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(BacktrackError::Storage(format!(
                "Error reading attribute \"{}\" from {:?}: {}",
                name, path, e
            ))),
        }
    }

    pub fn try_set(&self, name: &str, value: &str) -> Result<()> {
        std::fs::create_dir_all(&self.dir).map_err(|e| {
            BacktrackError::Storage(format!("Error creating {:?}: {}", self.dir, e))
        })?;

        let path = self.attr_path(name);
        std::fs::write(&path, value).map_err(|e| {
            BacktrackError::Storage(format!(
                "Error writing attribute \"{}\" to {:?}: {}",
                name, path, e
            ))
        })
    }

    /// The stored value, or an empty string if absent or unreadable.
    pub fn get(&self, name: &str) -> String {
        match self.try_get(name) {
            Ok(value) => value.unwrap_or_default(),
            Err(e) => {
                log::error!("{}", e);
                String::new()
            }
        }
    }

    /// Create or overwrite an attribute. Failures are logged.
    pub fn set(&self, name: &str, value: &str) {
        if let Err(e) = self.try_set(name, value) {
            log::error!("{}", e);
        }
    }
}
