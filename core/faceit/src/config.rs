use std::path::PathBuf;
use std::time::Duration;

use crate::catalog::CatalogColumns;
use crate::fetch::DEFAULT_FETCH_TIMEOUT;
#[cfg(feature = "rustface")]
use crate::rustface_backend::DetectorSettings;

/// Catalog file read when no path is given.
pub const DEFAULT_CATALOG_PATH: &str = "resources/artwork_data.csv";

/// SeetaFace frontal model loaded when no path is given.
pub const DEFAULT_MODEL_PATH: &str = "model/seeta_fd_frontal_v1.0.bin";

/// Output folder, relative to the working directory.
pub const DEFAULT_OUTPUT_FOLDER: &str = "catalog";

/// Settings for one catalog pass.
///
/// Every field has a default, so `Config::default()` reproduces a plain
/// run with no arguments.
#[derive(Debug, Clone)]
pub struct Config {
    pub catalog_path: PathBuf,
    pub model_path: PathBuf,
    pub output_folder: PathBuf,
    pub columns: CatalogColumns,
    pub fetch_timeout: Duration,
    /// Directory for downloads; the system temp directory when `None`.
    pub temp_dir: Option<PathBuf>,
    #[cfg(feature = "rustface")]
    pub detector: DetectorSettings,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            catalog_path: DEFAULT_CATALOG_PATH.into(),
            model_path: DEFAULT_MODEL_PATH.into(),
            output_folder: DEFAULT_OUTPUT_FOLDER.into(),
            columns: CatalogColumns::default(),
            fetch_timeout: DEFAULT_FETCH_TIMEOUT,
            temp_dir: None,
            #[cfg(feature = "rustface")]
            detector: DetectorSettings::default(),
        }
    }
}

impl Config {
    pub fn catalog_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.catalog_path = path.into();
        self
    }

    pub fn model_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.model_path = path.into();
        self
    }

    pub fn output_folder(mut self, path: impl Into<PathBuf>) -> Self {
        self.output_folder = path.into();
        self
    }

    pub fn columns(mut self, columns: CatalogColumns) -> Self {
        self.columns = columns;
        self
    }

    /// Set the per-download timeout (default: 30s).
    pub fn fetch_timeout(mut self, timeout: Duration) -> Self {
        self.fetch_timeout = timeout;
        self
    }

    pub fn temp_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.temp_dir = Some(dir.into());
        self
    }

    #[cfg(feature = "rustface")]
    pub fn detector(mut self, settings: DetectorSettings) -> Self {
        self.detector = settings;
        self
    }
}
