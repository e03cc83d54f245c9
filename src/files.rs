use std::fs;
use std::path::{Path, PathBuf};
use std::time::Instant;

use crate::archive;
use crate::file_ref::FileRef;

/// Extensions accepted into the playlist, compared case-insensitively.
pub const READABLE_EXTENSIONS: &[&str] = &[
    "jpg", "jpeg", "png", "pbm", "ppm", "pgm", "pnm", "bmp", "gif", "tiff", "xbm", "xpm",
];

/// Extension test on a raw name (a path or an archive entry name).
pub fn is_readable_name(name: &[u8]) -> bool {
    let base = name.rsplit(|&b| b == b'/').next().unwrap_or(name);
    let Some(dot) = base.iter().rposition(|&b| b == b'.') else {
        return false;
    };
    let ext = &base[dot + 1..];
    READABLE_EXTENSIONS
        .iter()
        .any(|known| ext.eq_ignore_ascii_case(known.as_bytes()))
}

pub fn is_image_file(path: &Path) -> bool {
    path.extension()
        .map(|e| {
            READABLE_EXTENSIONS
                .iter()
                .any(|known| e.as_encoded_bytes().eq_ignore_ascii_case(known.as_bytes()))
        })
        .unwrap_or(false)
}

/// Expand `paths` into image sources, in order.
///
/// Readable image files become `Raw` refs. Any other regular file is tried
/// as an archive and contributes one ref per readable entry. Directories are
/// entered while `depth > 0`, one level per step, children sorted by name.
pub fn scan_paths(paths: &[PathBuf], depth: u32, sink: &mut dyn FnMut(FileRef)) -> usize {
    let start_time = Instant::now();
    let mut count = 0;
    scan_level(paths, depth, &mut |f| {
        count += 1;
        sink(f);
    });
    log::info!(
        "Scan complete in {:.2}s. Found {} images.",
        start_time.elapsed().as_secs_f64(),
        count
    );
    count
}

fn scan_level(paths: &[PathBuf], depth: u32, sink: &mut dyn FnMut(FileRef)) {
    for path in paths {
        if path.is_file() {
            if is_image_file(path) {
                sink(FileRef::raw(path.clone()));
            } else {
                scan_archive(path, sink);
            }
        } else if depth > 0 && path.is_dir() {
            let children = descending_children(path);
            scan_level(&children, depth - 1, sink);
        }
    }
}

fn scan_archive(path: &Path, sink: &mut dyn FnMut(FileRef)) {
    match archive::list_entries(path) {
        Ok(entries) => {
            let before = entries.len();
            let mut kept = 0;
            for entry in entries.into_iter().filter(|e| is_readable_name(e)) {
                sink(FileRef::archive(path, entry));
                kept += 1;
            }
            log::info!(
                "Archive {:?}: {} of {} entries are images",
                path,
                kept,
                before
            );
        }
        Err(e) => log::warn!("Skipping {:?}: {}", path, e),
    }
}

/// Sorted directory children whose canonical path lies strictly below the
/// directory's own canonical path. Symlinks pointing back up the tree fail
/// this test, which stops loops.
fn descending_children(dir: &Path) -> Vec<PathBuf> {
    let Ok(canonical_dir) = fs::canonicalize(dir) else {
        return Vec::new();
    };
    let Ok(entries) = fs::read_dir(dir) else {
        return Vec::new();
    };
    let mut children: Vec<PathBuf> = entries
        .filter_map(|e| e.ok())
        .map(|e| e.path())
        .filter(|p| {
            fs::canonicalize(p)
                .map(|c| c != canonical_dir && c.starts_with(&canonical_dir))
                .unwrap_or(false)
        })
        .collect();
    children.sort();
    log::debug!("Scanning {:?} ({} entries)", dir, children.len());
    children
}
