use std::collections::HashSet;
use std::path::{Path, PathBuf};

use crate::file_ref::FileRef;
use crate::files;

/// Stable identity of a playlist row; survives removals of other rows.
pub type ItemId = u64;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlaylistItem {
    pub id: ItemId,
    pub file: FileRef,
    pub label: String,
    /// Set while the item sits in the last completed prefetch window.
    pub prefetched: bool,
}

/// What a removal did to the visible state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Removal {
    pub removed: usize,
    /// One of the removed rows was on screen.
    pub shown_removed: bool,
    pub now_empty: bool,
}

/// Ordered image sources with a cursor.
///
/// `cursor` is `None` exactly when the list is empty; otherwise it indexes a
/// valid row.
#[derive(Debug, Default)]
pub struct Playlist {
    items: Vec<PlaylistItem>,
    cursor: Option<usize>,
    next_id: ItemId,
}

impl Playlist {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn cursor(&self) -> Option<usize> {
        self.cursor
    }

    pub fn items(&self) -> &[PlaylistItem] {
        &self.items
    }

    pub fn get(&self, row: usize) -> Option<&PlaylistItem> {
        self.items.get(row)
    }

    fn push(&mut self, file: FileRef) {
        debug_assert!(file.is_valid());
        let label = file.label();
        self.items.push(PlaylistItem {
            id: self.next_id,
            file,
            label,
            prefetched: false,
        });
        self.next_id += 1;
    }

    /// Append a file if its extension is readable.
    pub fn append_file(&mut self, path: impl Into<PathBuf>) -> bool {
        let path = path.into();
        if !files::is_image_file(&path) {
            return false;
        }
        self.push(FileRef::raw(path));
        true
    }

    /// Append one archive entry if its name has a readable extension.
    pub fn append_archive_entry(&mut self, archive_path: &Path, entry: &[u8]) -> bool {
        if !files::is_readable_name(entry) {
            return false;
        }
        self.push(FileRef::archive(archive_path, entry));
        true
    }

    /// Ingest files, archives and directories; see [`files::scan_paths`].
    /// Returns how many items were added. An unset cursor moves to row 0.
    pub fn open_paths(&mut self, paths: &[PathBuf], depth: u32) -> usize {
        let added = files::scan_paths(paths, depth, &mut |file| {
            if file.is_valid() {
                self.push(file);
            }
        });
        if self.cursor.is_none() && !self.items.is_empty() {
            self.cursor = Some(0);
        }
        added
    }

    /// Number of rows shown at once: 2 in spread mode with at least two
    /// items, otherwise 1 (0 when empty).
    pub fn display_count(&self, spread: bool) -> usize {
        let c = if spread { 2 } else { 1 };
        c.min(self.items.len())
    }

    /// Rows on screen, starting at the cursor and wrapping around.
    pub fn shown_indices(&self, display_count: usize) -> Vec<usize> {
        let n = self.items.len();
        match self.cursor {
            Some(c) if n > 0 => (0..display_count.min(n)).map(|i| (c + i) % n).collect(),
            _ => Vec::new(),
        }
    }

    pub fn shown_files(&self, display_count: usize) -> Vec<FileRef> {
        self.shown_indices(display_count)
            .into_iter()
            .map(|i| self.items[i].file.clone())
            .collect()
    }

    /// Move the cursor by `k` pages of `display_count` rows, wrapping.
    pub fn advance(&mut self, k: isize, display_count: usize) {
        let n = self.items.len();
        let Some(c) = self.cursor else {
            return;
        };
        if n == 0 {
            return;
        }
        let step = k * display_count as isize;
        self.cursor = Some((c as isize + step).rem_euclid(n as isize) as usize);
    }

    /// Put the cursor on `row`. Out-of-range rows are ignored.
    pub fn jump_to(&mut self, row: usize) -> bool {
        if row < self.items.len() {
            self.cursor = Some(row);
            true
        } else {
            false
        }
    }

    /// Reset the cursor to the first row, if any.
    pub fn rewind(&mut self) {
        self.cursor = if self.items.is_empty() { None } else { Some(0) };
    }

    /// Delete `rows` (indices into the current list).
    ///
    /// Deleting the cursor row moves the cursor to `max(cursor - 1, 0)`; each
    /// deleted row before the cursor shifts it down by one.
    pub fn remove(&mut self, rows: &[usize], display_count: usize) -> Removal {
        let n = self.items.len();
        let Some(mut cursor) = self.cursor else {
            return Removal::default();
        };

        let mut doomed: Vec<usize> = rows.iter().copied().filter(|&r| r < n).collect();
        doomed.sort_unstable();
        doomed.dedup();
        if doomed.is_empty() {
            return Removal::default();
        }

        let shown: HashSet<usize> = self.shown_indices(display_count).into_iter().collect();
        let original_cursor = cursor;
        let shown_removed = doomed.iter().any(|row| shown.contains(row));
        for &row in &doomed {
            if row <= original_cursor {
                cursor = cursor.saturating_sub(1);
            }
        }

        let doomed_set: HashSet<usize> = doomed.iter().copied().collect();
        let mut row = 0;
        self.items.retain(|_| {
            let keep = !doomed_set.contains(&row);
            row += 1;
            keep
        });

        self.cursor = if self.items.is_empty() {
            None
        } else {
            Some(cursor.min(self.items.len() - 1))
        };

        Removal {
            removed: doomed.len(),
            shown_removed,
            now_empty: self.items.is_empty(),
        }
    }

    pub fn clear(&mut self) {
        self.items.clear();
        self.cursor = None;
    }

    /// Mark exactly the items in `ids` as prefetched.
    pub fn set_prefetched(&mut self, ids: &HashSet<ItemId>) {
        for item in &mut self.items {
            item.prefetched = ids.contains(&item.id);
        }
    }

    pub fn clear_prefetched(&mut self) {
        for item in &mut self.items {
            item.prefetched = false;
        }
    }
}
