use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Low-level failure while pulling bytes off disk or out of an archive.
#[derive(Error, Debug)]
pub enum ReadError {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),
    #[error("zip error: {0}")]
    Zip(#[from] zip::result::ZipError),
    #[error("rar error: {0}")]
    Rar(String),
    #[error("unrecognized archive format")]
    UnknownFormat,
}

#[derive(Error, Debug)]
pub enum ViewerError {
    #[error("{} is not readable: {source}", .path.display())]
    NotReadable {
        path: PathBuf,
        #[source]
        source: ReadError,
    },
    #[error("{} has no entry named {entry:?}", .archive.display())]
    EntryNotFound { archive: PathBuf, entry: String },
    #[error("image decode failed: {0}")]
    DecodeFailed(#[from] image::ImageError),
    #[error("pixel buffer of {len} does not match {width}x{height}")]
    RasterSize { width: u32, height: u32, len: usize },
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
}

impl ViewerError {
    pub(crate) fn not_readable(path: impl Into<PathBuf>, source: impl Into<ReadError>) -> Self {
        ViewerError::NotReadable {
            path: path.into(),
            source: source.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, ViewerError>;
