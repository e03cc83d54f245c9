use std::fmt::Write as _;
use std::path::{Path, PathBuf};

/// One image source: a file on disk, or one entry inside an archive.
///
/// Archive entries keep the raw pathname bytes exactly as the archive stores
/// them, so names in legacy encodings still match on read-back.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub enum FileRef {
    Raw {
        path: PathBuf,
    },
    Archive {
        archive_path: PathBuf,
        entry: Vec<u8>,
    },
    #[default]
    Invalid,
}

impl FileRef {
    pub fn raw(path: impl Into<PathBuf>) -> Self {
        FileRef::Raw { path: path.into() }
    }

    pub fn archive(archive_path: impl Into<PathBuf>, entry: impl Into<Vec<u8>>) -> Self {
        FileRef::Archive {
            archive_path: archive_path.into(),
            entry: entry.into(),
        }
    }

    pub fn is_valid(&self) -> bool {
        !matches!(self, FileRef::Invalid)
    }

    /// The file to open on disk: the archive itself for archive entries.
    pub fn physical_path(&self) -> &Path {
        debug_assert!(self.is_valid(), "physical_path() on an invalid FileRef");
        match self {
            FileRef::Raw { path } => path,
            FileRef::Archive { archive_path, .. } => archive_path,
            FileRef::Invalid => Path::new(""),
        }
    }

    /// Short name shown to the user: the last path component of the file or
    /// of the archive entry.
    pub fn logical_name(&self) -> String {
        debug_assert!(self.is_valid(), "logical_name() on an invalid FileRef");
        match self {
            FileRef::Raw { path } => path
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_default(),
            FileRef::Archive { entry, .. } => {
                let name = entry.rsplit(|&b| b == b'/').next().unwrap_or(entry.as_slice());
                String::from_utf8_lossy(name).into_owned()
            }
            FileRef::Invalid => String::new(),
        }
    }

    /// Playlist row text: the full entry path for archives, the path for files.
    pub fn label(&self) -> String {
        match self {
            FileRef::Raw { path } => path.display().to_string(),
            FileRef::Archive { entry, .. } => String::from_utf8_lossy(entry).into_owned(),
            FileRef::Invalid => String::new(),
        }
    }

    /// Injective key for the byte cache.
    ///
    /// `Raw` keys are the path text, `Archive` keys are
    /// `archive_path + "/" + entry_text`. Text is rendered from raw bytes with
    /// `%` and non-UTF-8 bytes percent-escaped, so distinct byte strings never
    /// share a key.
    pub fn cache_key(&self) -> String {
        debug_assert!(self.is_valid(), "cache_key() on an invalid FileRef");
        let mut key = String::new();
        match self {
            FileRef::Raw { path } => {
                escape_into(&mut key, path.as_os_str().as_encoded_bytes());
            }
            FileRef::Archive {
                archive_path,
                entry,
            } => {
                escape_into(&mut key, archive_path.as_os_str().as_encoded_bytes());
                key.push('/');
                escape_into(&mut key, entry);
            }
            FileRef::Invalid => {}
        }
        key
    }
}

fn escape_into(out: &mut String, bytes: &[u8]) {
    for chunk in bytes.utf8_chunks() {
        for ch in chunk.valid().chars() {
            if ch == '%' {
                out.push_str("%25");
            } else {
                out.push(ch);
            }
        }
        for b in chunk.invalid() {
            let _ = write!(out, "%{b:02X}");
        }
    }
}
