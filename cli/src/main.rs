use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use faceit::{
    CatalogColumns, CatalogPipeline, Config, CropExporter, DetectorSettings, HttpFetcher,
    RustfaceDetector, DEFAULT_CATALOG_PATH, DEFAULT_MODEL_PATH, DEFAULT_OUTPUT_FOLDER,
};

mod logging;

/// Extract tagged face crops from an artwork catalog.
///
/// With no arguments, performs one pass over the bundled catalog and writes
/// crops to ./catalog.
#[derive(Parser, Debug)]
#[command(name = "faceit", version)]
struct Args {
    /// Catalog file (CSV, first row is a header)
    #[arg(long, env = "FACEIT_CATALOG", default_value = DEFAULT_CATALOG_PATH)]
    catalog: PathBuf,

    /// SeetaFace frontal face model
    #[arg(long, env = "FACEIT_MODEL", default_value = DEFAULT_MODEL_PATH)]
    model: PathBuf,

    /// Output folder for face crops
    #[arg(long, env = "FACEIT_OUTPUT", default_value = DEFAULT_OUTPUT_FOLDER)]
    output: PathBuf,

    /// Column holding the artist name
    #[arg(long, env = "FACEIT_ARTIST_COLUMN", default_value_t = 2)]
    artist_column: usize,

    /// Column holding the artwork title
    #[arg(long, env = "FACEIT_TITLE_COLUMN", default_value_t = 5)]
    title_column: usize,

    /// Column holding the image URL
    #[arg(long, env = "FACEIT_URL_COLUMN", default_value_t = 18)]
    url_column: usize,

    /// Per-image download timeout in seconds
    #[arg(long, env = "FACEIT_TIMEOUT_SECS", default_value_t = 30)]
    timeout_secs: u64,

    /// Smallest face edge in pixels the detector looks for
    #[arg(long, env = "FACEIT_MIN_FACE_SIZE", default_value_t = 20)]
    min_face_size: u32,

    /// Log level
    #[arg(long, env = "FACEIT_LOG_LEVEL", default_value = "info")]
    log_level: String,
}

impl Args {
    fn into_config(self) -> Config {
        let detector = DetectorSettings {
            min_face_size: self.min_face_size,
            ..DetectorSettings::default()
        };

        Config::default()
            .catalog_path(self.catalog)
            .model_path(self.model)
            .output_folder(self.output)
            .columns(CatalogColumns {
                artist: self.artist_column,
                title: self.title_column,
                image_url: self.url_column,
            })
            .fetch_timeout(Duration::from_secs(self.timeout_secs))
            .detector(detector)
    }
}

fn main() -> Result<()> {
    let args = Args::parse();
    logging::init(&args.log_level)?;

    let config = args.into_config();
    tracing::info!("Catalog: {}", config.catalog_path.display());
    tracing::info!("Output folder: {}", config.output_folder.display());

    let detector = RustfaceDetector::from_path(&config.model_path, config.detector)
        .with_context(|| format!("loading face model {}", config.model_path.display()))?;
    let mut fetcher =
        HttpFetcher::new(config.fetch_timeout).context("building http client")?;
    if let Some(dir) = &config.temp_dir {
        fetcher = fetcher.temp_dir(dir);
    }
    let pipeline = CatalogPipeline::new(
        Box::new(fetcher),
        Box::new(detector),
        CropExporter::new(&config.output_folder),
    );

    let summary = pipeline
        .run_path(&config.catalog_path, config.columns)
        .with_context(|| format!("processing catalog {}", config.catalog_path.display()))?;

    tracing::info!(
        "Processed {} records: {} faces, {} files written, {} failed",
        summary.records,
        summary.faces,
        summary.files_written,
        summary.fetch_failures + summary.decode_failures + summary.export_failures
    );

    Ok(())
}
