//! Configuration document loader.
//!
//! Loads every `*.json` document from a configuration directory into a
//! named cache of [`HarnessConfig`] values. Explicitly constructed and
//! owned by the caller; parse and read failures fail fast.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use tracing::{debug, info, warn};

use crate::domain::{HarnessConfig, ServiceConfig};
use crate::error::ConfigError;

#[derive(Debug)]
pub struct ConfigLoader {
    config_dir: PathBuf,
    cache: HashMap<String, HarnessConfig>,
}

impl ConfigLoader {
    /// Load all configuration documents from `config_dir`.
    ///
    /// A missing directory yields an empty loader (the harness may run with
    /// providers configured programmatically); an unreadable or unparsable
    /// document is an error.
    pub fn from_dir(config_dir: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let mut loader = Self {
            config_dir: config_dir.as_ref().to_path_buf(),
            cache: HashMap::new(),
        };
        loader.load_all()?;
        Ok(loader)
    }

    fn load_all(&mut self) -> Result<(), ConfigError> {
        if !self.config_dir.exists() {
            warn!(dir = %self.config_dir.display(), "[ConfigLoader] Config directory not found");
            return Ok(());
        }

        let entries = fs::read_dir(&self.config_dir).map_err(|source| ConfigError::Io {
            path: self.config_dir.clone(),
            source,
        })?;

        for entry in entries.flatten() {
            let path = entry.path();
            if path.extension().and_then(|e| e.to_str()) != Some("json") {
                continue;
            }
            let name = match path.file_stem().and_then(|s| s.to_str()) {
                Some(s) => s.to_string(),
                None => continue,
            };
            self.load_document(name, &path)?;
        }

        info!(
            documents = self.cache.len(),
            "[ConfigLoader] All configurations loaded"
        );
        Ok(())
    }

    fn load_document(&mut self, name: String, path: &Path) -> Result<(), ConfigError> {
        let raw = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let config: HarnessConfig =
            serde_json::from_str(&raw).map_err(|source| ConfigError::Parse {
                name: name.clone(),
                source,
            })?;
        debug!(name = %name, services = config.services.len(), "[ConfigLoader] Loaded configuration");
        self.cache.insert(name, config);
        Ok(())
    }

    pub fn get(&self, name: &str) -> Option<&HarnessConfig> {
        self.cache.get(name)
    }

    pub fn get_all(&self) -> &HashMap<String, HarnessConfig> {
        &self.cache
    }

    /// Look up a service section across all loaded documents.
    pub fn service_config(&self, service_type: &str) -> Option<&ServiceConfig> {
        self.cache
            .values()
            .find_map(|config| config.service(service_type))
    }

    /// Re-read one document from disk.
    pub fn reload(&mut self, name: &str) -> Result<(), ConfigError> {
        let path = self.config_dir.join(format!("{}.json", name));
        if path.exists() {
            self.load_document(name.to_string(), &path)
        } else {
            warn!(name = %name, "[ConfigLoader] Configuration file not found");
            Ok(())
        }
    }

    /// Drop the cache and re-read everything.
    pub fn reload_all(&mut self) -> Result<(), ConfigError> {
        self.cache.clear();
        self.load_all()
    }
}
