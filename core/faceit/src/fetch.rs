use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::Duration;

use image::{DynamicImage, ImageReader};
use tempfile::NamedTempFile;
use tracing::debug;
use url::Url;

use crate::error::{FaceItError, Result};

/// Default timeout for a single image download.
pub const DEFAULT_FETCH_TIMEOUT: Duration = Duration::from_secs(30);

const USER_AGENT: &str = concat!("faceit/", env!("CARGO_PKG_VERSION"));

/// Retrieves a remote image into a local temporary file.
///
/// The returned file is owned by the caller and removed when dropped, so
/// every fetch gets its own path.
pub trait ImageFetcher {
    fn fetch(&self, url: &str) -> Result<NamedTempFile>;
}

/// Blocking HTTP(S) fetcher.
pub struct HttpFetcher {
    client: reqwest::blocking::Client,
    temp_dir: Option<PathBuf>,
}

impl HttpFetcher {
    pub fn new(timeout: Duration) -> Result<Self> {
        let client = reqwest::blocking::Client::builder()
            .timeout(timeout)
            .user_agent(USER_AGENT)
            .build()
            .map_err(|e| FaceItError::HttpClient(e.to_string()))?;

        Ok(Self {
            client,
            temp_dir: None,
        })
    }

    /// Place downloads in `dir` instead of the system temp directory.
    pub fn temp_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.temp_dir = Some(dir.into());
        self
    }

    fn temp_file(&self) -> Result<NamedTempFile> {
        let mut builder = tempfile::Builder::new();
        builder.prefix("faceit-");
        let file = match &self.temp_dir {
            Some(dir) => builder.tempfile_in(dir)?,
            None => builder.tempfile()?,
        };
        Ok(file)
    }
}

impl ImageFetcher for HttpFetcher {
    fn fetch(&self, url: &str) -> Result<NamedTempFile> {
        let parsed = parse_image_url(url)?;
        let fetch_error = |e: reqwest::Error| FaceItError::Fetch {
            url: url.to_string(),
            reason: e.to_string(),
        };

        let mut response = self
            .client
            .get(parsed)
            .send()
            .and_then(|r| r.error_for_status())
            .map_err(fetch_error)?;

        let mut file = self.temp_file()?;
        let bytes = response.copy_to(&mut file).map_err(fetch_error)?;
        file.flush()?;

        debug!(url, bytes, path = %file.path().display(), "downloaded image");
        Ok(file)
    }
}

/// Parse an absolute http(s) URL.
pub fn parse_image_url(url: &str) -> Result<Url> {
    let invalid = |reason: String| FaceItError::InvalidUrl {
        url: url.to_string(),
        reason,
    };

    let parsed = Url::parse(url).map_err(|e| invalid(e.to_string()))?;
    match parsed.scheme() {
        "http" | "https" => Ok(parsed),
        other => Err(invalid(format!("unsupported scheme {other:?}"))),
    }
}

/// Decode a downloaded image, sniffing the format from its contents.
pub fn decode_image(path: &Path) -> Result<DynamicImage> {
    ImageReader::open(path)?
        .with_guessed_format()?
        .decode()
        .map_err(|e| FaceItError::DecodeError(e.to_string()))
}
