//! Sequential catalog pass: read a row, fetch its image, detect faces,
//! export crops, repeat.
//!
//! The pass moves through `NotStarted → ReadingHeader → ReadingRecord`,
//! then `Fetching → Detecting → Exporting` for every row with an image URL,
//! and ends in `Done` when the catalog runs out. Only failing to open or read
//! the catalog aborts a pass; per-record failures are logged and skipped.

use std::fmt;
use std::io::Read;
use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::{debug, error, info, warn};

use crate::catalog::{CatalogColumns, CatalogReader, CatalogRecord};
use crate::crop::CropExporter;
use crate::error::{FaceItError, Result};
use crate::face_detector::FaceDetector;
use crate::fetch::{decode_image, ImageFetcher};

/// Per-record step that failed.
///
/// Exporting never fails a whole record; failed writes are counted in
/// [`RecordOutcome::failed_writes`] instead.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Fetching,
    /// Decoding the download and running the detector.
    Detecting,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Stage::Fetching => "fetching",
            Stage::Detecting => "detecting",
        };
        f.write_str(name)
    }
}

/// A failure confined to one catalog record.
#[derive(Debug, Error)]
#[error("{stage} failed: {source}")]
pub struct RecordError {
    pub stage: Stage,
    #[source]
    pub source: FaceItError,
}

impl RecordError {
    fn at(stage: Stage) -> impl Fn(FaceItError) -> RecordError {
        move |source| RecordError { stage, source }
    }
}

/// Result of processing one record end to end.
#[derive(Debug, Clone, PartialEq)]
pub struct RecordOutcome {
    pub tag: String,
    /// Number of faces the detector reported.
    pub faces: usize,
    /// Files actually written, in detection order.
    pub files: Vec<PathBuf>,
    /// Crops that could not be written.
    pub failed_writes: usize,
}

/// Counters for one catalog pass.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunSummary {
    /// Data rows parsed into records.
    pub records: usize,
    pub skipped_empty_url: usize,
    pub malformed: usize,
    pub fetch_attempts: usize,
    pub fetch_failures: usize,
    pub decode_failures: usize,
    pub export_failures: usize,
    pub faces: usize,
    pub files_written: usize,
}

/// Drives a catalog through fetch, detection and export.
pub struct CatalogPipeline {
    fetcher: Box<dyn ImageFetcher>,
    detector: Box<dyn FaceDetector>,
    exporter: CropExporter,
}

impl CatalogPipeline {
    pub fn new(
        fetcher: Box<dyn ImageFetcher>,
        detector: Box<dyn FaceDetector>,
        exporter: CropExporter,
    ) -> Self {
        Self {
            fetcher,
            detector,
            exporter,
        }
    }

    /// Build the production pipeline: HTTP fetcher, SeetaFace detector and
    /// an exporter writing to the configured folder.
    ///
    /// Loads the face model once; a missing or corrupt model is fatal.
    #[cfg(feature = "rustface")]
    pub fn from_config(config: &crate::Config) -> Result<Self> {
        use crate::fetch::HttpFetcher;
        use crate::rustface_backend::RustfaceDetector;

        let detector = RustfaceDetector::from_path(&config.model_path, config.detector)?;
        let mut fetcher = HttpFetcher::new(config.fetch_timeout)?;
        if let Some(dir) = &config.temp_dir {
            fetcher = fetcher.temp_dir(dir);
        }

        Ok(Self::new(
            Box::new(fetcher),
            Box::new(detector),
            CropExporter::new(&config.output_folder),
        ))
    }

    pub fn exporter(&self) -> &CropExporter {
        &self.exporter
    }

    /// Open `catalog` and run one full pass over it.
    pub fn run_path(&self, catalog: &Path, columns: CatalogColumns) -> Result<RunSummary> {
        info!(catalog = %catalog.display(), "reading catalog");
        let reader = CatalogReader::open(catalog, columns)?;
        self.run(reader)
    }

    /// Run one full pass over an already opened catalog.
    pub fn run<R: Read>(&self, mut catalog: CatalogReader<R>) -> Result<RunSummary> {
        let mut summary = RunSummary::default();

        if !catalog.read_header()? {
            info!("catalog is empty, nothing to do");
            return Ok(summary);
        }

        self.exporter.ensure_folder()?;

        for row in catalog {
            let record = match row {
                Ok(record) => record,
                Err(e @ FaceItError::MalformedRow { .. }) => {
                    warn!("skipping {e}");
                    summary.malformed += 1;
                    continue;
                }
                Err(e) => return Err(e),
            };
            summary.records += 1;

            if !record.has_image() {
                debug!(line = record.line, "no image url, skipping");
                summary.skipped_empty_url += 1;
                continue;
            }

            summary.fetch_attempts += 1;
            match self.process_record(&record) {
                Ok(outcome) => {
                    summary.faces += outcome.faces;
                    summary.files_written += outcome.files.len();
                    summary.export_failures += outcome.failed_writes;
                }
                Err(e) => {
                    error!(line = record.line, url = %record.image_url, "{e}");
                    match e.stage {
                        Stage::Fetching => summary.fetch_failures += 1,
                        Stage::Detecting => summary.decode_failures += 1,
                    }
                }
            }
        }

        info!(
            records = summary.records,
            fetched = summary.fetch_attempts - summary.fetch_failures,
            faces = summary.faces,
            files = summary.files_written,
            "catalog pass complete"
        );
        Ok(summary)
    }

    /// Fetch, detect and export a single record.
    ///
    /// The download is removed before this returns, whatever the outcome.
    pub fn process_record(
        &self,
        record: &CatalogRecord,
    ) -> std::result::Result<RecordOutcome, RecordError> {
        let tag = record.tag();

        let download = self
            .fetcher
            .fetch(&record.image_url)
            .map_err(RecordError::at(Stage::Fetching))?;
        let image = decode_image(download.path()).map_err(RecordError::at(Stage::Detecting))?;
        drop(download);

        let faces = self.detector.detect(&image.to_luma8());
        debug!(tag = %tag, faces = faces.len(), "detection finished");

        let export = self.exporter.export(&image, &faces, &tag);

        Ok(RecordOutcome {
            tag,
            faces: faces.len(),
            files: export.written,
            failed_writes: export.failed,
        })
    }
}
