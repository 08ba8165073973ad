use std::path::PathBuf;
use thiserror::Error;

/// Errors raised while preparing the dataset or recovering brightness labels.
///
/// Only a few of these abort a run. The builder and the classifier catch the
/// per-batch and per-sequence variants, log them and carry on.
#[derive(Debug, Error)]
pub enum PrepError {
    #[error("io error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("json parse error at {path}: {source}")]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("image error at {path}: {source}")]
    Image {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },
    #[error("placeholder {width}x{height} for {path} is too large")]
    PlaceholderTooLarge {
        path: PathBuf,
        width: u32,
        height: u32,
    },
    #[error("frame has no pixels: {path}")]
    EmptyFrame { path: PathBuf },
    #[error("annotation file not found: {path}")]
    MissingBatchAnnotation { path: PathBuf },
    #[error("image '{file_name}' of batch {batch} not found under {image_root}")]
    UnresolvedImagePath {
        batch: String,
        file_name: String,
        image_root: PathBuf,
    },
    #[error("invalid glob pattern '{pattern}': {source}")]
    Pattern {
        pattern: String,
        #[source]
        source: glob::PatternError,
    },
    #[error("no batch folders found ({searched})")]
    NoBatchesFound { searched: String },
    #[error("no sequences with readable frames found")]
    NoSequencesFound,
    #[error("cannot cluster an empty set of values")]
    EmptyInput,
    #[error("cluster count must be at least 1")]
    InvalidClusterCount,
}

impl PrepError {
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        PrepError::Io {
            path: path.into(),
            source,
        }
    }
}

pub type PrepResult<T> = Result<T, PrepError>;
