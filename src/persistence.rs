//! # Settings Persistence
//!
//! A tenant's [`PrintSettings`] are stored as one JSON document. The editor
//! loads them when it opens and writes the whole aggregate back on save;
//! there is no partial update and no conflict detection, so the last writer
//! wins.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use tracing::{debug, info};

use crate::error::PrintError;
use crate::model::PrintSettings;

pub trait PrintSettingsStore {
    /// Stored settings for a tenant, or `None` if it has never saved any.
    fn load(&self, tenant: &str) -> Result<Option<PrintSettings>, PrintError>;

    fn save(&mut self, tenant: &str, settings: &PrintSettings) -> Result<(), PrintError>;

    /// Stored settings, or the generic defaults on first use.
    fn load_or_default(&self, tenant: &str) -> Result<PrintSettings, PrintError> {
        Ok(self.load(tenant)?.unwrap_or_default())
    }
}

/// One `<tenant>.json` file per tenant in a directory.
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    dir: PathBuf,
}

impl JsonFileStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn path_for(&self, tenant: &str) -> PathBuf {
        self.dir.join(format!("{}.json", sanitize_tenant(tenant)))
    }
}

impl PrintSettingsStore for JsonFileStore {
    fn load(&self, tenant: &str) -> Result<Option<PrintSettings>, PrintError> {
        let path = self.path_for(tenant);
        let json = match fs::read_to_string(&path) {
            Ok(s) => s,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!(tenant, path = %path.display(), "no stored print settings");
                return Ok(None);
            }
            Err(e) => {
                return Err(PrintError::Store(format!(
                    "Failed to read '{}': {}",
                    path.display(),
                    e
                )))
            }
        };
        let settings: PrintSettings = serde_json::from_str(&json)?;
        debug!(tenant, "loaded print settings");
        Ok(Some(settings))
    }

    fn save(&mut self, tenant: &str, settings: &PrintSettings) -> Result<(), PrintError> {
        let path = self.path_for(tenant);
        let json = serde_json::to_string_pretty(settings)?;
        fs::create_dir_all(&self.dir).map_err(|e| {
            PrintError::Store(format!("Failed to create '{}': {}", self.dir.display(), e))
        })?;
        // Write beside the target, then rename, so a crash never leaves half a file.
        let tmp = path.with_extension("json.tmp");
        fs::write(&tmp, json)
            .and_then(|_| fs::rename(&tmp, &path))
            .map_err(|e| PrintError::Store(format!("Failed to write '{}': {}", path.display(), e)))?;
        info!(tenant, path = %path.display(), "saved print settings");
        Ok(())
    }
}

/// Settings held in memory, keyed by tenant.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    tenants: HashMap<String, PrintSettings>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl PrintSettingsStore for MemoryStore {
    fn load(&self, tenant: &str) -> Result<Option<PrintSettings>, PrintError> {
        Ok(self.tenants.get(tenant).cloned())
    }

    fn save(&mut self, tenant: &str, settings: &PrintSettings) -> Result<(), PrintError> {
        self.tenants.insert(tenant.to_string(), settings.clone());
        Ok(())
    }
}

/// Keep tenant ids from escaping the store directory.
fn sanitize_tenant(tenant: &str) -> String {
    let cleaned: String = tenant
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '-' || c == '_' { c } else { '_' })
        .collect();
    if cleaned.is_empty() {
        "_".to_string()
    } else {
        cleaned
    }
}
