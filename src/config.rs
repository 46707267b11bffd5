//! Export configuration.
//!
//! Options come from three layers, later ones winning: built-in defaults,
//! an optional JSON file, then the `CLINIC_PRINT_OUTPUT_DIR` and
//! `CLINIC_PRINT_SCALE` environment variables. The CLI applies its flags on
//! top of whatever this module returns.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::PrintError;

/// CSS pixels per millimetre at 96 DPI.
pub const DEFAULT_PX_PER_MM: f64 = 96.0 / 25.4;
/// Device pixels per CSS pixel when capturing a page.
pub const DEFAULT_RASTER_SCALE: f64 = 2.0;

pub const ENV_OUTPUT_DIR: &str = "CLINIC_PRINT_OUTPUT_DIR";
pub const ENV_SCALE: &str = "CLINIC_PRINT_SCALE";

fn default_px_per_mm() -> f64 {
    DEFAULT_PX_PER_MM
}

fn default_raster_scale() -> f64 {
    DEFAULT_RASTER_SCALE
}

fn default_output_dir() -> PathBuf {
    PathBuf::from(".")
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportOptions {
    /// Density of the off-screen page.
    #[serde(default = "default_px_per_mm")]
    pub px_per_mm: f64,

    /// Capture resolution multiplier.
    #[serde(default = "default_raster_scale")]
    pub raster_scale: f64,

    /// Where the directory sink writes PDFs.
    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,
}

impl Default for ExportOptions {
    fn default() -> Self {
        Self {
            px_per_mm: DEFAULT_PX_PER_MM,
            raster_scale: DEFAULT_RASTER_SCALE,
            output_dir: default_output_dir(),
        }
    }
}

impl ExportOptions {
    /// Read options from a JSON file. Missing keys take their defaults.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, PrintError> {
        let json = std::fs::read_to_string(path.as_ref())?;
        Ok(serde_json::from_str(&json)?)
    }

    /// Apply environment overrides from the process environment.
    pub fn with_env(self) -> Self {
        self.with_env_from(|key| std::env::var(key).ok())
    }

    /// Apply environment overrides read through `lookup`.
    pub fn with_env_from<F: Fn(&str) -> Option<String>>(mut self, lookup: F) -> Self {
        if let Some(dir) = lookup(ENV_OUTPUT_DIR).filter(|d| !d.trim().is_empty()) {
            self.output_dir = PathBuf::from(dir);
        }
        if let Some(raw) = lookup(ENV_SCALE) {
            match raw.trim().parse::<f64>() {
                Ok(scale) if scale.is_finite() && scale > 0.0 => self.raster_scale = scale,
                _ => warn!(value = %raw, "ignoring invalid {}", ENV_SCALE),
            }
        }
        self
    }

    /// Defaults, then `path` if given, then the environment.
    pub fn load(path: Option<&Path>) -> Result<Self, PrintError> {
        let base = match path {
            Some(p) => Self::from_file(p)?,
            None => Self::default(),
        };
        Ok(base.with_env())
    }
}
