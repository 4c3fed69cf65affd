//! Extract tagged face crops from an artwork catalog.
//!
//! A catalog is a delimited file whose rows name an artist, a title and a
//! source image URL. [`CatalogPipeline`] walks it row by row, downloads each
//! image, runs a [`FaceDetector`] over it and writes every face it finds as
//! `<artist>_<title>_<index>.png`.
//!
//! # Example
//!
//! ```no_run
//! use faceit::{CatalogPipeline, Config};
//!
//! let config = Config::default().output_folder("catalog");
//! let pipeline = CatalogPipeline::from_config(&config).unwrap();
//! let summary = pipeline
//!     .run_path(&config.catalog_path, config.columns)
//!     .unwrap();
//! println!("wrote {} face crops", summary.files_written);
//! ```

mod catalog;
mod config;
mod crop;
mod error;
/// Face detection traits and data types.
pub mod face_detector;
mod fetch;
mod pipeline;
#[cfg(feature = "rustface")]
/// Built-in SeetaFace-based face detector backend.
pub mod rustface_backend;

pub use catalog::{sanitize, CatalogColumns, CatalogReader, CatalogRecord};
pub use config::{Config, DEFAULT_CATALOG_PATH, DEFAULT_MODEL_PATH, DEFAULT_OUTPUT_FOLDER};
pub use crop::{face_crop_region, CropExport, CropExporter, CropRegion};
/// Error type returned by faceit operations.
pub use error::{FaceItError, Result};
/// Face detection trait and face bounding-box type.
pub use face_detector::{FaceBounds, FaceDetector};
pub use fetch::{decode_image, parse_image_url, HttpFetcher, ImageFetcher, DEFAULT_FETCH_TIMEOUT};
pub use pipeline::{CatalogPipeline, RecordError, RecordOutcome, RunSummary, Stage};
#[cfg(feature = "rustface")]
/// Built-in detector that loads a SeetaFace model file.
pub use rustface_backend::{DetectorSettings, RustfaceDetector};
