use std::path::PathBuf;

use thiserror::Error;
use url::Url;

/// Why a single image fetch did not produce a displayable image.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("server answered with status {0}")]
    Status(u16),

    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("failed to read {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("{0} does not point to a local file")]
    NotAFile(Url),

    #[error("unsupported url scheme `{0}`")]
    UnsupportedScheme(String),

    #[error("failed to decode image: {0}")]
    Decode(#[from] image::ImageError),
}

/// Errors while turning command line sources into identifiers.
#[derive(Debug, Error)]
pub enum SourceError {
    #[error("failed to read directory {path:?}: {source}")]
    ReadDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("no image files found in directory {0:?}")]
    NoImages(PathBuf),

    #[error("{path:?} is not a usable image source: {source}")]
    BadPath {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("cannot express {0:?} as a file url")]
    NotAbsolute(PathBuf),
}
