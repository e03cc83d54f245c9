//! Archive access.
//!
//! This is the only module that knows archive library APIs. Everything above
//! it sees an archive as an ordered list of raw entry names and a way to read
//! one entry by that name.
//!
//! Formats are detected from magic bytes, not from the file extension:
//!
//! | Magic                      | Format             |
//! |----------------------------|--------------------|
//! | `PK\x03\x04`, `PK\x05\x06` | zip / cbz          |
//! | `Rar!\x1a\x07`             | rar / cbr          |
//! | `\x1f\x8b`                 | gzip-filtered tar  |
//! | `BZh1`..`BZh9`             | bzip2-filtered tar |
//! | `\xfd7zXZ\0`               | xz-filtered tar    |
//! | `ustar` at offset 257      | tar / cbt          |

use std::fs::File;
use std::io::{self, Read, Seek, SeekFrom};
use std::path::Path;

use bzip2::read::BzDecoder;
use flate2::read::GzDecoder;
use xz2::read::XzDecoder;

use crate::error::ReadError;

const SNIFF_LEN: usize = 512;
const TAR_MAGIC_OFFSET: usize = 257;
const XZ_MAGIC: &[u8] = &[0xfd, b'7', b'z', b'X', b'Z', 0x00];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArchiveKind {
    Zip,
    Rar,
    Tar(TarFilter),
}

/// Stream compression wrapped around a tar archive.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TarFilter {
    None,
    Gzip,
    Bzip2,
    Xz,
}

impl TarFilter {
    fn decoder(self, file: File) -> Box<dyn Read> {
        match self {
            TarFilter::None => Box::new(file),
            TarFilter::Gzip => Box::new(GzDecoder::new(file)),
            TarFilter::Bzip2 => Box::new(BzDecoder::new(file)),
            TarFilter::Xz => Box::new(XzDecoder::new(file)),
        }
    }
}

pub fn detect(head: &[u8]) -> Option<ArchiveKind> {
    if head.starts_with(b"PK\x03\x04") || head.starts_with(b"PK\x05\x06") {
        Some(ArchiveKind::Zip)
    } else if head.starts_with(b"Rar!\x1a\x07") {
        Some(ArchiveKind::Rar)
    } else if head.starts_with(&[0x1f, 0x8b]) {
        Some(ArchiveKind::Tar(TarFilter::Gzip))
    } else if head.len() >= 4 && head.starts_with(b"BZh") && (b'1'..=b'9').contains(&head[3]) {
        Some(ArchiveKind::Tar(TarFilter::Bzip2))
    } else if head.starts_with(XZ_MAGIC) {
        Some(ArchiveKind::Tar(TarFilter::Xz))
    } else if head.len() >= TAR_MAGIC_OFFSET + 5
        && &head[TAR_MAGIC_OFFSET..TAR_MAGIC_OFFSET + 5] == b"ustar"
    {
        Some(ArchiveKind::Tar(TarFilter::None))
    } else {
        None
    }
}

fn sniff(file: &mut File) -> io::Result<Vec<u8>> {
    let mut head = Vec::with_capacity(SNIFF_LEN);
    file.by_ref().take(SNIFF_LEN as u64).read_to_end(&mut head)?;
    file.seek(SeekFrom::Start(0))?;
    Ok(head)
}

fn open(path: &Path) -> Result<(ArchiveKind, File), ReadError> {
    let mut file = File::open(path)?;
    let head = sniff(&mut file)?;
    let kind = detect(&head).ok_or(ReadError::UnknownFormat)?;
    Ok((kind, file))
}

/// Raw names of all file entries, in archive order.
///
/// An archive that breaks partway through still yields the names read
/// before the damage, with a warning. Only an archive with no readable
/// entry at all is an error.
pub fn list_entries(path: &Path) -> Result<Vec<Vec<u8>>, ReadError> {
    let (kind, file) = open(path)?;
    let mut names = Vec::new();
    let outcome = match kind {
        ArchiveKind::Zip => list_zip(file, &mut names),
        ArchiveKind::Rar => list_rar(path, &mut names),
        ArchiveKind::Tar(filter) => walk_tar(filter.decoder(file), |name, _| {
            names.push(name.to_vec());
            Ok(Walk::Continue)
        }),
    };
    match outcome {
        Ok(()) => Ok(names),
        Err(e) if !names.is_empty() => {
            log::warn!(
                "{:?} is damaged after {} entries: {}",
                path,
                names.len(),
                e
            );
            Ok(names)
        }
        Err(e) => Err(e),
    }
}

/// Data of the first file entry whose raw pathname equals `entry`, if any.
pub fn read_entry(path: &Path, entry: &[u8]) -> Result<Option<Vec<u8>>, ReadError> {
    let (kind, file) = open(path)?;
    match kind {
        ArchiveKind::Zip => read_zip(file, entry),
        ArchiveKind::Rar => read_rar(path, entry),
        ArchiveKind::Tar(filter) => {
            let mut found = None;
            walk_tar(filter.decoder(file), |name, reader| {
                if name != entry {
                    return Ok(Walk::Continue);
                }
                let mut data = Vec::new();
                reader.read_to_end(&mut data)?;
                found = Some(data);
                Ok(Walk::Stop)
            })?;
            Ok(found)
        }
    }
}

// ---------------------------------------------------------------------------
// zip
// ---------------------------------------------------------------------------

// Names come from the raw (undecompressed) view, so an entry whose
// compression method is unsupported is still listed and only fails to read.

fn list_zip(file: File, names: &mut Vec<Vec<u8>>) -> Result<(), ReadError> {
    let mut zip = zip::ZipArchive::new(file)?;
    for i in 0..zip.len() {
        match zip.by_index_raw(i) {
            Ok(entry) if entry.is_dir() => {}
            Ok(entry) => names.push(entry.name_raw().to_vec()),
            Err(e) => log::warn!("Skipping zip entry #{}: {}", i, e),
        }
    }
    Ok(())
}

fn read_zip(file: File, entry: &[u8]) -> Result<Option<Vec<u8>>, ReadError> {
    let mut zip = zip::ZipArchive::new(file)?;
    let index = (0..zip.len()).find(|&i| {
        zip.by_index_raw(i)
            .map(|e| !e.is_dir() && e.name_raw() == entry)
            .unwrap_or(false)
    });
    let Some(index) = index else {
        return Ok(None);
    };
    let mut file = zip.by_index(index)?;
    let mut data = Vec::with_capacity(file.size() as usize);
    file.read_to_end(&mut data)?;
    Ok(Some(data))
}

// ---------------------------------------------------------------------------
// rar
// ---------------------------------------------------------------------------

fn rar_error(e: impl std::fmt::Display) -> ReadError {
    ReadError::Rar(e.to_string())
}

fn rar_name(filename: &Path) -> Vec<u8> {
    filename.as_os_str().as_encoded_bytes().to_vec()
}

fn list_rar(path: &Path, names: &mut Vec<Vec<u8>>) -> Result<(), ReadError> {
    let listing = unrar::Archive::new(path)
        .open_for_listing()
        .map_err(rar_error)?;
    for header in listing {
        let header = header.map_err(rar_error)?;
        if header.is_file() {
            names.push(rar_name(&header.filename));
        }
    }
    Ok(())
}

fn read_rar(path: &Path, entry: &[u8]) -> Result<Option<Vec<u8>>, ReadError> {
    let mut archive = unrar::Archive::new(path)
        .open_for_processing()
        .map_err(rar_error)?;
    while let Some(header) = archive.read_header().map_err(rar_error)? {
        let wanted = header.entry().is_file() && rar_name(&header.entry().filename) == entry;
        if wanted {
            let (data, _) = header.read().map_err(rar_error)?;
            return Ok(Some(data));
        }
        archive = header.skip().map_err(rar_error)?;
    }
    Ok(None)
}

// ---------------------------------------------------------------------------
// tar
// ---------------------------------------------------------------------------

/// Visitor verdict after looking at one entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Walk {
    Continue,
    Stop,
}

/// Visit every regular-file entry in order. Entries the visitor does not
/// read are skipped.
fn walk_tar<R: Read, F>(reader: R, mut visit: F) -> Result<(), ReadError>
where
    F: FnMut(&[u8], &mut dyn Read) -> Result<Walk, ReadError>,
{
    let mut tar = tar::Archive::new(reader);
    for entry in tar.entries()? {
        let mut entry = entry?;
        if !entry.header().entry_type().is_file() {
            continue;
        }
        let name = entry.path_bytes().into_owned();
        if visit(&name, &mut entry)? == Walk::Stop {
            break;
        }
    }
    Ok(())
}

#[cfg(test)]
pub(crate) mod fixtures {
    use std::fs::File;
    use std::io::Write;
    use std::path::Path;

    use flate2::Compression;
    use flate2::write::GzEncoder;
    use zip::CompressionMethod;
    use zip::write::SimpleFileOptions;

    pub fn write_zip(path: &Path, entries: &[(&str, &[u8])]) {
        let with_method: Vec<_> = entries
            .iter()
            .map(|&(name, data)| (name, data, CompressionMethod::Stored))
            .collect();
        write_zip_with(path, &with_method);
    }

    /// Zip with a `pages/` directory entry and a compression method per file.
    pub fn write_zip_with(path: &Path, entries: &[(&str, &[u8], CompressionMethod)]) {
        let mut zip = zip::ZipWriter::new(File::create(path).unwrap());
        let dir_options = SimpleFileOptions::default();
        zip.add_directory("pages/", dir_options).unwrap();
        for &(name, data, method) in entries {
            let options = SimpleFileOptions::default().compression_method(method);
            zip.start_file(name, options).unwrap();
            zip.write_all(data).unwrap();
        }
        zip.finish().unwrap();
    }

    /// Rewrite the method field of `name` in both the local and the central
    /// header.
    pub fn patch_zip_method(path: &Path, name: &str, method: u16) {
        let mut bytes = std::fs::read(path).unwrap();
        let name = name.as_bytes();
        let mut patched = 0;
        for at in 0..bytes.len().saturating_sub(46) {
            let (method_at, len_at, name_at) = match &bytes[at..at + 4] {
                b"PK\x03\x04" => (at + 8, at + 26, at + 30),
                b"PK\x01\x02" => (at + 10, at + 28, at + 46),
                _ => continue,
            };
            let len = u16::from_le_bytes([bytes[len_at], bytes[len_at + 1]]) as usize;
            if bytes.get(name_at..name_at + len) == Some(name) {
                bytes[method_at..method_at + 2].copy_from_slice(&method.to_le_bytes());
                patched += 1;
            }
        }
        assert_eq!(patched, 2, "headers for {:?} not found", name);
        std::fs::write(path, bytes).unwrap();
    }

    fn append_tar<W: Write>(builder: &mut tar::Builder<W>, entries: &[(&str, &[u8])]) {
        for (name, data) in entries {
            let mut header = tar::Header::new_gnu();
            header.set_size(data.len() as u64);
            header.set_mode(0o644);
            builder.append_data(&mut header, name, *data).unwrap();
        }
    }

    pub fn write_tar(path: &Path, entries: &[(&str, &[u8])]) {
        let mut builder = tar::Builder::new(File::create(path).unwrap());
        append_tar(&mut builder, entries);
        builder.finish().unwrap();
    }

    pub fn write_tar_gz(path: &Path, entries: &[(&str, &[u8])]) {
        let gz = GzEncoder::new(File::create(path).unwrap(), Compression::default());
        let mut builder = tar::Builder::new(gz);
        append_tar(&mut builder, entries);
        builder.into_inner().unwrap().finish().unwrap();
    }

    pub fn write_tar_bz2(path: &Path, entries: &[(&str, &[u8])]) {
        let bz = bzip2::write::BzEncoder::new(
            File::create(path).unwrap(),
            bzip2::Compression::default(),
        );
        let mut builder = tar::Builder::new(bz);
        append_tar(&mut builder, entries);
        builder.into_inner().unwrap().finish().unwrap();
    }

    pub fn write_tar_xz(path: &Path, entries: &[(&str, &[u8])]) {
        let xz = xz2::write::XzEncoder::new(File::create(path).unwrap(), 6);
        let mut builder = tar::Builder::new(xz);
        append_tar(&mut builder, entries);
        builder.into_inner().unwrap().finish().unwrap();
    }

    /// Tar whose entry names are arbitrary bytes.
    #[cfg(unix)]
    pub fn write_tar_raw_names(path: &Path, entries: &[(&[u8], &[u8])]) {
        use std::ffi::OsStr;
        use std::os::unix::ffi::OsStrExt;

        let mut builder = tar::Builder::new(File::create(path).unwrap());
        for (name, data) in entries {
            let mut header = tar::Header::new_gnu();
            header.set_size(data.len() as u64);
            header.set_mode(0o644);
            builder
                .append_data(&mut header, Path::new(OsStr::from_bytes(name)), *data)
                .unwrap();
        }
        builder.finish().unwrap();
    }

    fn rar_head_crc(block: &[u8]) -> [u8; 2] {
        let mut crc = flate2::Crc::new();
        crc.update(block);
        (crc.sum() as u16).to_le_bytes()
    }

    /// RAR 2.0 archive holding stored (uncompressed) files.
    pub fn write_rar(path: &Path, entries: &[(&str, &[u8])]) {
        let mut out = b"Rar!\x1a\x07\x00".to_vec();
        // Main archive header, no flags.
        out.extend_from_slice(&[0xcf, 0x90, 0x73, 0x00, 0x00, 0x0d, 0x00]);
        out.extend_from_slice(&[0; 6]);
        for (name, data) in entries {
            let mut data_crc = flate2::Crc::new();
            data_crc.update(data);

            let mut block = vec![0x74];
            block.extend_from_slice(&0x8000u16.to_le_bytes());
            block.extend_from_slice(&(32 + name.len() as u16).to_le_bytes());
            block.extend_from_slice(&(data.len() as u32).to_le_bytes());
            block.extend_from_slice(&(data.len() as u32).to_le_bytes());
            block.push(2);
            block.extend_from_slice(&data_crc.sum().to_le_bytes());
            block.extend_from_slice(&0x0021_0000u32.to_le_bytes());
            block.push(20);
            block.push(0x30);
            block.extend_from_slice(&(name.len() as u16).to_le_bytes());
            block.extend_from_slice(&0x20u32.to_le_bytes());
            block.extend_from_slice(name.as_bytes());

            out.extend_from_slice(&rar_head_crc(&block));
            out.extend_from_slice(&block);
            out.extend_from_slice(data);
        }
        // End of archive.
        out.extend_from_slice(&[0xc4, 0x3d, 0x7b, 0x00, 0x40, 0x07, 0x00]);
        std::fs::write(path, out).unwrap();
    }
}
