use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum FaceItError {
    #[error("failed to open catalog {path}: {source}")]
    CatalogOpen {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to read catalog: {0}")]
    CatalogRead(String),

    #[error("malformed catalog row at line {line}: {reason}")]
    MalformedRow { line: u64, reason: String },

    #[error("invalid image url {url:?}: {reason}")]
    InvalidUrl { url: String, reason: String },

    #[error("failed to build http client: {0}")]
    HttpClient(String),

    #[error("failed to fetch {url}: {reason}")]
    Fetch { url: String, reason: String },

    #[error("failed to decode image: {0}")]
    DecodeError(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("failed to load face model: {0}")]
    Model(String),
}

pub type Result<T> = std::result::Result<T, FaceItError>;
