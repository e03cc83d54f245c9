use std::fs;
use std::path::Path;

use crate::archive;
use crate::error::{Result, ViewerError};
use crate::file_ref::FileRef;
use crate::raster::ArgbImage;

// ---------------------------------------------------------------------------
// Encoded byte-data
// ---------------------------------------------------------------------------

pub fn read_raw(path: &Path) -> Result<Vec<u8>> {
    fs::read(path).map_err(|e| ViewerError::not_readable(path, e))
}

/// Bytes of the entry whose raw pathname equals `entry`.
pub fn read_archive(archive_path: &Path, entry: &[u8]) -> Result<Vec<u8>> {
    match archive::read_entry(archive_path, entry) {
        Ok(Some(data)) => Ok(data),
        Ok(None) => Err(ViewerError::EntryNotFound {
            archive: archive_path.to_path_buf(),
            entry: String::from_utf8_lossy(entry).into_owned(),
        }),
        Err(e) => Err(ViewerError::not_readable(archive_path, e)),
    }
}

pub fn read(file: &FileRef) -> Result<Vec<u8>> {
    match file {
        FileRef::Raw { path } => read_raw(path),
        FileRef::Archive {
            archive_path,
            entry,
        } => read_archive(archive_path, entry),
        FileRef::Invalid => {
            debug_assert!(false, "read() on an invalid FileRef");
            Err(ViewerError::not_readable(
                "",
                std::io::Error::from(std::io::ErrorKind::NotFound),
            ))
        }
    }
}

// ---------------------------------------------------------------------------
// Decoding
// ---------------------------------------------------------------------------

/// Decode encoded image bytes into an ARGB32 raster. The format is taken
/// from the content, not from any file name.
pub fn decode(bytes: &[u8]) -> Result<ArgbImage> {
    let img = image::load_from_memory(bytes)?;
    let rgba = img.to_rgba8();
    let (width, height) = rgba.dimensions();
    ArgbImage::from_rgba8(width, height, rgba.as_raw())
}
