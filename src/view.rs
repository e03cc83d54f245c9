//! Foreground orchestration: cursor moves, mode changes and resizes turn
//! into decode → compose → resample passes, with the prefetcher kept busy
//! around the cursor.

use std::collections::HashSet;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};

use crossbeam_channel::{Receiver, Sender, TrySendError};

use crate::cache::ByteCache;
use crate::composite;
use crate::config::{self, ViewerConfig};
pub use crate::config::ViewMode;
use crate::error::{Result, ViewerError};
use crate::file_ref::FileRef;
use crate::loader;
use crate::playlist::{ItemId, Playlist, Removal};
use crate::prefetch::{Prefetcher, Waker};
use crate::raster::ArgbImage;
use crate::resample::{self, Interpolation};

/// Notifications for the display shell.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ViewEvent {
    /// A new scaled image (possibly empty) is ready.
    Changed,
    SlideshowStopped,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ViewState {
    pub spread: bool,
    pub right_binding: bool,
    pub view_mode: ViewMode,
    pub interpolation: Interpolation,
    pub custom_scale: f64,
    pub widget_size: (u32, u32),
    pub open_dir_depth: u32,
    pub cache_capacity: usize,
    pub slideshow_interval: Duration,
}

impl From<&ViewerConfig> for ViewState {
    fn from(c: &ViewerConfig) -> Self {
        Self {
            spread: c.spread,
            right_binding: c.right_binding,
            view_mode: c.view_mode,
            interpolation: c.interpolation,
            custom_scale: c.custom_scale,
            widget_size: (0, 0),
            open_dir_depth: c.open_dir_depth,
            cache_capacity: c.cache_capacity,
            slideshow_interval: c.slideshow_interval(),
        }
    }
}

/// Resampler factor for a composite of `image` size shown in `widget`.
///
/// The fit modes only ever shrink.
pub fn select_scale(mode: ViewMode, custom: f64, image: (u32, u32), widget: (u32, u32)) -> f64 {
    let (iw, ih) = image;
    let (ww, wh) = widget;
    match mode {
        ViewMode::FullSize => 1.0,
        ViewMode::CustomScale => custom,
        ViewMode::FitWindow | ViewMode::FitImage => {
            if iw == 0 || ih == 0 || ww == 0 || wh == 0 {
                return 1.0;
            }
            let ws = if ww < iw { ww as f64 / iw as f64 } else { 1.0 };
            let hs = if wh < ih { wh as f64 / ih as f64 } else { 1.0 };
            if mode == ViewMode::FitWindow {
                ws.min(hs)
            } else {
                ws
            }
        }
    }
}

/// Playlist rows to prefetch around `cursor`, in window order.
///
/// With `plen = min(capacity, len)` the window covers offsets
/// `[-(plen/2 - 1), plen/2 + plen%2 + 1)` from the cursor, wrapped into the
/// list. Empty when either `capacity` or `len` is zero.
pub fn prefetch_window(cursor: usize, len: usize, capacity: usize) -> Vec<usize> {
    let plen = capacity.min(len) as isize;
    if plen == 0 {
        return Vec::new();
    }
    let l = plen / 2 - 1;
    let r = plen / 2 + plen % 2 + 1;
    let n = len as isize;
    let mut seen = HashSet::new();
    (-l..r)
        .map(|i| (cursor as isize + i).rem_euclid(n) as usize)
        .filter(|row| seen.insert(*row))
        .collect()
}

// ---------------------------------------------------------------------------
// Controller
// ---------------------------------------------------------------------------

/// Undrained events kept before the oldest are dropped.
pub const EVENT_QUEUE: usize = 64;

pub struct ViewController {
    state: ViewState,
    playlist: Playlist,
    cache: Arc<ByteCache>,
    prefetcher: Prefetcher,
    /// Window computed by the latest prefetch restart.
    window: Vec<FileRef>,
    /// Window waiting for the running pass to finish.
    pending: Option<Vec<FileRef>>,
    originals: Vec<ArgbImage>,
    composite: ArgbImage,
    scaled: ArgbImage,
    playing: bool,
    events_tx: Sender<ViewEvent>,
    events_rx: Receiver<ViewEvent>,
}

impl ViewController {
    pub fn new(config: &ViewerConfig) -> Result<Self> {
        config.validate()?;
        let cache = Arc::new(ByteCache::new(config.cache_capacity));
        let prefetcher = Prefetcher::new(Arc::downgrade(&cache));
        let (events_tx, events_rx) = crossbeam_channel::bounded(EVENT_QUEUE);
        Ok(Self {
            state: ViewState::from(config),
            playlist: Playlist::new(),
            cache,
            prefetcher,
            window: Vec::new(),
            pending: None,
            originals: Vec::new(),
            composite: ArgbImage::empty(),
            scaled: ArgbImage::empty(),
            playing: false,
            events_tx,
            events_rx,
        })
    }

    /// Hook run on the prefetch thread whenever a pass reports; the shell
    /// uses it to schedule a [`poll_prefetch`](Self::poll_prefetch).
    pub fn set_prefetch_waker(&mut self, waker: Waker) {
        self.prefetcher.set_waker(waker);
    }

    // --- accessors ---------------------------------------------------------

    pub fn state(&self) -> &ViewState {
        &self.state
    }

    pub fn playlist(&self) -> &Playlist {
        &self.playlist
    }

    pub fn cache(&self) -> &Arc<ByteCache> {
        &self.cache
    }

    pub fn scaled_image(&self) -> &ArgbImage {
        &self.scaled
    }

    pub fn composite(&self) -> &ArgbImage {
        &self.composite
    }

    /// Decoded images of the shown rows, in playlist order.
    pub fn originals(&self) -> &[ArgbImage] {
        &self.originals
    }

    pub fn effective_scale(&self) -> f64 {
        select_scale(
            self.state.view_mode,
            self.state.custom_scale,
            self.composite.size(),
            self.state.widget_size,
        )
    }

    pub fn display_count(&self) -> usize {
        self.playlist.display_count(self.state.spread)
    }

    /// Row of the `i`-th shown image.
    pub fn current_index(&self, i: usize) -> Option<usize> {
        self.playlist
            .shown_indices(self.display_count())
            .get(i)
            .copied()
    }

    pub fn current_file_names(&self) -> Vec<String> {
        self.playlist
            .shown_files(self.display_count())
            .iter()
            .map(FileRef::logical_name)
            .collect()
    }

    /// Cache keys of the most recently computed prefetch window.
    pub fn scheduled_keys(&self) -> Vec<String> {
        self.window.iter().map(FileRef::cache_key).collect()
    }

    /// A pass is running or queued.
    pub fn is_prefetching(&self) -> bool {
        self.prefetcher.is_running() || self.pending.is_some()
    }

    /// Notification queue. It holds at most [`EVENT_QUEUE`] events; when it
    /// is full the oldest one is discarded, so a shell that never drains it
    /// only loses stale notifications.
    pub fn events(&self) -> &Receiver<ViewEvent> {
        &self.events_rx
    }

    // --- playlist ----------------------------------------------------------

    /// Add files, archives and directories. Returns how many images were
    /// added.
    pub fn open(&mut self, paths: &[PathBuf]) -> usize {
        let shown = self.originals.len();
        let added = self.playlist.open_paths(paths, self.state.open_dir_depth);
        log::info!("Opened {} images ({} total)", added, self.playlist.len());

        let refresh = shown == 0 || (self.state.right_binding && shown != 2);
        if refresh && !self.playlist.is_empty() {
            self.playlist.rewind();
            self.show();
        } else if added > 0 {
            self.start_prefetch();
        }
        added
    }

    pub fn clear(&mut self) {
        self.prefetcher.cancel();
        self.pending = None;
        self.window.clear();
        self.playlist.clear();
        self.release();
    }

    pub fn remove(&mut self, rows: &[usize]) -> Removal {
        let removal = self.playlist.remove(rows, self.display_count());
        if removal.removed == 0 {
            return removal;
        }
        if removal.now_empty {
            self.window.clear();
            self.pending = None;
            self.release();
        } else if removal.shown_removed {
            self.show();
        } else {
            self.start_prefetch();
        }
        removal
    }

    // --- navigation --------------------------------------------------------

    /// Move by `k` pages, wrapping around the playlist.
    pub fn advance(&mut self, k: isize) {
        if self.playlist.is_empty() {
            return;
        }
        self.playlist.advance(k, self.display_count());
        self.show();
    }

    pub fn next(&mut self) {
        self.advance(1);
    }

    pub fn previous(&mut self) {
        self.advance(-1);
    }

    pub fn jump_to(&mut self, row: usize) -> bool {
        if !self.playlist.jump_to(row) {
            return false;
        }
        self.show();
        true
    }

    // --- settings ----------------------------------------------------------

    /// Switch the view mode; `scale` replaces the custom factor when given.
    pub fn set_view_mode(&mut self, mode: ViewMode, scale: Option<f64>) -> Result<()> {
        let scale = scale.unwrap_or(self.state.custom_scale);
        config::check_scale(scale)?;
        let changed =
            mode != self.state.view_mode || !resample::fuzzy_eq(scale, self.state.custom_scale);
        self.state.view_mode = mode;
        self.state.custom_scale = scale;
        if changed {
            self.rescale();
        }
        Ok(())
    }

    pub fn set_interpolation(&mut self, mode: Interpolation) {
        if mode == self.state.interpolation {
            return;
        }
        self.state.interpolation = mode;
        self.rescale();
    }

    pub fn set_spread(&mut self, spread: bool) {
        if spread == self.state.spread {
            return;
        }
        self.state.spread = spread;
        if !self.playlist.is_empty() {
            self.show();
        }
    }

    pub fn set_right_binding(&mut self, right_binding: bool) {
        if right_binding == self.state.right_binding {
            return;
        }
        self.state.right_binding = right_binding;
        if !self.originals.is_empty() {
            self.recompose();
        }
    }

    /// Resize the byte cache. The running pass is cancelled and a new one
    /// starts once it has reported.
    pub fn set_cache_capacity(&mut self, capacity: usize) {
        self.prefetcher.cancel();
        self.cache.set_capacity(capacity);
        self.state.cache_capacity = capacity;
        if capacity == 0 {
            self.playlist.clear_prefetched();
        }
        self.start_prefetch();
    }

    pub fn set_open_dir_depth(&mut self, depth: u32) {
        self.state.open_dir_depth = depth;
    }

    pub fn set_slideshow_interval(&mut self, interval: Duration) -> Result<()> {
        if interval.is_zero() {
            return Err(ViewerError::InvalidConfig(
                "slideshow interval must be greater than zero".into(),
            ));
        }
        self.state.slideshow_interval = interval;
        Ok(())
    }

    /// The display area changed size; only the fit modes rescale.
    pub fn on_resize(&mut self, width: u32, height: u32) {
        if self.state.widget_size == (width, height) {
            return;
        }
        self.state.widget_size = (width, height);
        if matches!(self.state.view_mode, ViewMode::FitWindow | ViewMode::FitImage)
            && !self.composite.is_empty()
        {
            self.rescale();
        }
    }

    // --- slideshow ---------------------------------------------------------

    pub fn start_slideshow(&mut self) {
        self.playing = true;
    }

    pub fn stop_slideshow(&mut self) {
        if self.playing {
            self.playing = false;
            self.emit(ViewEvent::SlideshowStopped);
        }
    }

    pub fn is_playing_slideshow(&self) -> bool {
        self.playing
    }

    pub fn slideshow_interval(&self) -> Duration {
        self.state.slideshow_interval
    }

    /// One timer tick: step forward, or stop when there is nothing left.
    pub fn slideshow_tick(&mut self) {
        if !self.playing {
            return;
        }
        if self.playlist.is_empty() {
            self.stop_slideshow();
        } else {
            self.next();
        }
    }

    // --- prefetch ----------------------------------------------------------

    /// Handle finished prefetch passes. Marks rows whose bytes the pass left
    /// in the cache, then starts the pending window if there is one.
    /// Returns the number of reports handled.
    pub fn poll_prefetch(&mut self) -> usize {
        let mut handled = 0;
        while let Ok(report) = self.prefetcher.finished().try_recv() {
            handled += 1;
            let keys: HashSet<&str> = report
                .keys
                .iter()
                .map(String::as_str)
                .filter(|k| self.cache.contains(k))
                .collect();
            let ids: HashSet<ItemId> = self
                .playlist
                .items()
                .iter()
                .filter(|item| keys.contains(item.file.cache_key().as_str()))
                .map(|item| item.id)
                .collect();
            self.playlist.set_prefetched(&ids);
        }

        if self.pending.is_some() && !self.prefetcher.is_running() {
            self.prefetcher.wait();
            if let Some(list) = self.pending.take() {
                self.prefetcher.schedule(list);
                self.prefetcher.start();
            }
        }
        handled
    }

    fn start_prefetch(&mut self) {
        let Some(cursor) = self.playlist.cursor() else {
            return;
        };
        let rows = prefetch_window(cursor, self.playlist.len(), self.cache.capacity());
        self.window = rows
            .iter()
            .filter_map(|&row| self.playlist.get(row))
            .map(|item| item.file.clone())
            .collect();

        if self.prefetcher.is_running() {
            self.pending = Some(self.window.clone());
        } else {
            self.pending = None;
            self.prefetcher.schedule(self.window.clone());
            self.prefetcher.start();
        }
    }

    // --- display pipeline --------------------------------------------------

    /// Decode the shown rows and run the rest of the pipeline.
    fn show(&mut self) {
        let start_time = Instant::now();
        let files = self.playlist.shown_files(self.display_count());
        self.originals = files.iter().map(|f| self.load_slot(f)).collect();
        log::debug!(
            "Decoded {} image(s) in {:.3}s",
            self.originals.len(),
            start_time.elapsed().as_secs_f64()
        );
        self.start_prefetch();
        self.recompose();
    }

    fn load_slot(&self, file: &FileRef) -> ArgbImage {
        let key = file.cache_key();
        let bytes = match self.cache.get_copy(&key) {
            Some(bytes) => Ok(bytes),
            None => loader::read(file).inspect(|bytes| {
                if self.cache.capacity() > 0 {
                    self.cache.insert(key.clone(), bytes.clone());
                }
            }),
        };
        match bytes.and_then(|b| loader::decode(&b)) {
            Ok(img) => img,
            Err(e) => {
                log::warn!("Cannot show {}: {}", file.label(), e);
                ArgbImage::empty()
            }
        }
    }

    fn recompose(&mut self) {
        self.composite = composite::compose(&self.originals, self.state.right_binding);
        self.rescale();
    }

    fn rescale(&mut self) {
        if self.composite.is_empty() {
            self.scaled = ArgbImage::empty();
        } else {
            let scale = self.effective_scale();
            self.scaled = resample::resample(&self.composite, scale, self.state.interpolation);
        }
        self.emit(ViewEvent::Changed);
    }

    fn release(&mut self) {
        self.originals.clear();
        self.composite = ArgbImage::empty();
        self.scaled = ArgbImage::empty();
        self.emit(ViewEvent::Changed);
    }

    fn emit(&self, event: ViewEvent) {
        let mut event = event;
        loop {
            match self.events_tx.try_send(event) {
                Ok(()) | Err(TrySendError::Disconnected(_)) => return,
                Err(TrySendError::Full(back)) => {
                    let _ = self.events_rx.try_recv();
                    event = back;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgba, RgbaImage};
    use std::fs;
    use tempfile::TempDir;

    fn write_png(dir: &TempDir, name: &str, w: u32, h: u32, c: [u8; 4]) -> PathBuf {
        let path = dir.path().join(name);
        RgbaImage::from_pixel(w, h, Rgba(c)).save(&path).unwrap();
        path
    }

    fn controller(config: ViewerConfig) -> ViewController {
        ViewController::new(&config).unwrap()
    }

    fn drain(vc: &ViewController) -> Vec<ViewEvent> {
        vc.events().try_iter().collect()
    }

    fn settle(vc: &mut ViewController) {
        for _ in 0..500 {
            vc.poll_prefetch();
            if !vc.is_prefetching() {
                vc.poll_prefetch();
                return;
            }
            std::thread::sleep(Duration::from_millis(5));
        }
        panic!("prefetch did not settle");
    }

    #[test]
    fn window_matches_examples() {
        assert_eq!(prefetch_window(7, 10, 5), vec![6, 7, 8, 9, 0]);
        assert_eq!(prefetch_window(0, 10, 4), vec![9, 0, 1, 2]);
        assert_eq!(prefetch_window(0, 3, 20), vec![0, 1, 2]);
        assert_eq!(prefetch_window(0, 2, 2), vec![0, 1]);
        assert_eq!(prefetch_window(2, 5, 1), vec![3]);
        assert!(prefetch_window(0, 5, 0).is_empty());
        assert!(prefetch_window(0, 0, 5).is_empty());
    }

    #[test]
    fn window_size_is_min_of_capacity_and_length() {
        for n in 1..12 {
            for k in 1..12 {
                for c in 0..n {
                    let w = prefetch_window(c, n, k);
                    assert_eq!(w.len(), k.min(n), "n={n} k={k} c={c}");
                    assert!(w.iter().all(|&r| r < n));
                }
            }
        }
    }

    #[test]
    fn scale_selection() {
        let img = (2000, 1000);
        assert_eq!(select_scale(ViewMode::FullSize, 3.0, img, (800, 600)), 1.0);
        assert_eq!(select_scale(ViewMode::CustomScale, 3.0, img, (800, 600)), 3.0);
        assert_eq!(select_scale(ViewMode::FitWindow, 1.0, img, (800, 600)), 0.4);
        assert_eq!(select_scale(ViewMode::FitImage, 1.0, img, (800, 600)), 0.4);
        assert_eq!(select_scale(ViewMode::FitWindow, 1.0, img, (1800, 500)), 0.5);
        assert_eq!(select_scale(ViewMode::FitImage, 1.0, img, (1800, 500)), 0.9);
        // Never enlarges.
        assert_eq!(select_scale(ViewMode::FitWindow, 1.0, (10, 10), (800, 600)), 1.0);
        assert_eq!(select_scale(ViewMode::FitWindow, 1.0, (0, 0), (800, 600)), 1.0);
    }

    #[test]
    fn open_shows_first_image() {
        let tmp = TempDir::new().unwrap();
        write_png(&tmp, "a.png", 4, 3, [255, 0, 0, 255]);
        write_png(&tmp, "b.png", 2, 2, [0, 255, 0, 255]);
        let mut vc = controller(ViewerConfig::default());

        assert_eq!(vc.open(&[tmp.path().to_path_buf()]), 2);
        assert_eq!(vc.current_index(0), Some(0));
        assert_eq!(vc.current_file_names(), vec!["a.png".to_string()]);
        assert_eq!(vc.scaled_image().size(), (4, 3));
        assert_eq!(vc.scaled_image().pixel(0, 0), 0xFFFF_0000);
        assert!(drain(&vc).contains(&ViewEvent::Changed));
        settle(&mut vc);
    }

    #[test]
    fn second_open_keeps_cursor() {
        let tmp = TempDir::new().unwrap();
        let a = write_png(&tmp, "a.png", 1, 1, [1, 1, 1, 255]);
        let b = write_png(&tmp, "b.png", 1, 1, [2, 2, 2, 255]);
        let c = write_png(&tmp, "c.png", 1, 1, [3, 3, 3, 255]);
        let mut vc = controller(ViewerConfig::default());
        vc.open(&[a, b]);
        vc.next();
        vc.open(&[c]);
        assert_eq!(vc.current_index(0), Some(1));
        assert_eq!(vc.playlist().len(), 3);
        settle(&mut vc);
    }

    #[test]
    fn spread_and_binding_recompose() {
        let tmp = TempDir::new().unwrap();
        let a = write_png(&tmp, "a.png", 3, 4, [255, 0, 0, 255]);
        let b = write_png(&tmp, "b.png", 2, 2, [0, 0, 255, 255]);
        let mut vc = controller(ViewerConfig::default());
        vc.open(&[a, b]);

        vc.set_spread(true);
        assert_eq!(vc.display_count(), 2);
        assert_eq!(vc.composite().size(), (5, 4));
        assert_eq!(vc.composite().pixel(0, 0), 0xFFFF_0000);
        assert_eq!(vc.composite().pixel(4, 0), 0xFFFF_FFFF);
        assert_eq!(vc.composite().pixel(4, 1), 0xFF00_00FF);

        vc.set_right_binding(true);
        assert_eq!(vc.composite().pixel(0, 1), 0xFF00_00FF);
        assert_eq!(vc.composite().pixel(4, 0), 0xFFFF_0000);
        settle(&mut vc);
    }

    #[test]
    fn fit_window_follows_resize() {
        let tmp = TempDir::new().unwrap();
        let a = write_png(&tmp, "a.png", 200, 100, [9, 9, 9, 255]);
        let mut vc = controller(ViewerConfig::default());
        vc.on_resize(100, 100);
        vc.open(&[a]);
        assert_eq!(vc.scaled_image().size(), (200, 100));

        vc.set_view_mode(ViewMode::FitWindow, None).unwrap();
        assert_eq!(vc.scaled_image().size(), (100, 50));
        vc.on_resize(50, 10);
        assert_eq!(vc.effective_scale(), 0.1);
        assert_eq!(vc.scaled_image().size(), (20, 10));

        drain(&vc);
        vc.set_view_mode(ViewMode::FitWindow, None).unwrap();
        assert!(drain(&vc).is_empty());
        assert!(vc.set_view_mode(ViewMode::CustomScale, Some(0.0)).is_err());
        vc.set_view_mode(ViewMode::CustomScale, Some(2.0)).unwrap();
        assert_eq!(vc.scaled_image().size(), (400, 200));
        settle(&mut vc);
    }

    #[test]
    fn undrained_events_stay_bounded() {
        let tmp = TempDir::new().unwrap();
        let a = write_png(&tmp, "a.png", 2, 2, [0, 0, 0, 255]);
        let mut vc = controller(ViewerConfig::default());
        vc.open(&[a]);
        for i in 0..200 {
            let mode = if i % 2 == 0 {
                Interpolation::Nearest
            } else {
                Interpolation::Bicubic
            };
            vc.set_interpolation(mode);
            assert!(vc.events().len() <= EVENT_QUEUE);
        }
        vc.start_slideshow();
        vc.stop_slideshow();
        let events = drain(&vc);
        assert_eq!(events.len(), EVENT_QUEUE);
        assert_eq!(events.last(), Some(&ViewEvent::SlideshowStopped));
        settle(&mut vc);
    }

    #[test]
    fn huge_custom_scale_is_rejected_without_change() {
        let tmp = TempDir::new().unwrap();
        let a = write_png(&tmp, "a.png", 4, 4, [0, 0, 0, 255]);
        let mut vc = controller(ViewerConfig::default());
        vc.open(&[a]);
        vc.set_view_mode(ViewMode::CustomScale, Some(2.0)).unwrap();
        drain(&vc);

        let err = vc.set_view_mode(ViewMode::CustomScale, Some(3.0e9));
        assert!(matches!(err, Err(ViewerError::InvalidConfig(_))));
        assert!(vc.set_view_mode(ViewMode::FitWindow, Some(f64::NAN)).is_err());
        assert_eq!(vc.effective_scale(), 2.0);
        assert_eq!(vc.scaled_image().size(), (8, 8));
        assert!(drain(&vc).is_empty());
        settle(&mut vc);
    }

    #[test]
    fn unreadable_slot_degrades_to_empty() {
        let tmp = TempDir::new().unwrap();
        let good = write_png(&tmp, "good.png", 2, 2, [0, 0, 0, 255]);
        let bad = tmp.path().join("bad.png");
        fs::write(&bad, b"not an image").unwrap();
        let mut vc = controller(ViewerConfig {
            spread: true,
            ..Default::default()
        });
        vc.open(&[bad, good]);
        assert_eq!(vc.originals().len(), 2);
        assert!(vc.originals()[0].is_empty());
        assert_eq!(vc.composite().size(), (2, 2));
        settle(&mut vc);
    }

    #[test]
    fn removing_last_rows_releases_images() {
        let tmp = TempDir::new().unwrap();
        let a = write_png(&tmp, "a.png", 1, 1, [0, 0, 0, 255]);
        let mut vc = controller(ViewerConfig::default());
        vc.open(&[a]);
        drain(&vc);
        let r = vc.remove(&[0]);
        assert!(r.now_empty);
        assert!(vc.scaled_image().is_empty());
        assert!(vc.originals().is_empty());
        assert_eq!(drain(&vc), vec![ViewEvent::Changed]);
        vc.next();
        assert_eq!(vc.current_index(0), None);
        settle(&mut vc);
    }

    #[test]
    fn clear_empties_everything() {
        let tmp = TempDir::new().unwrap();
        let a = write_png(&tmp, "a.png", 1, 1, [0, 0, 0, 255]);
        let mut vc = controller(ViewerConfig::default());
        vc.open(&[a]);
        vc.clear();
        assert!(vc.playlist().is_empty());
        assert!(vc.scaled_image().is_empty());
        assert!(vc.scheduled_keys().is_empty());
        settle(&mut vc);
    }

    #[test]
    fn prefetch_marks_window_rows() {
        let tmp = TempDir::new().unwrap();
        let paths: Vec<PathBuf> = (0..6)
            .map(|i| write_png(&tmp, &format!("{i}.png"), 1, 1, [i, 0, 0, 255]))
            .collect();
        let mut vc = controller(ViewerConfig {
            cache_capacity: 3,
            ..Default::default()
        });
        vc.open(&paths);
        settle(&mut vc);

        let window = prefetch_window(0, 6, 3);
        let marked: Vec<usize> = (0..6)
            .filter(|&r| vc.playlist().get(r).unwrap().prefetched)
            .collect();
        let mut expected = window.clone();
        expected.sort_unstable();
        assert_eq!(marked, expected);
        assert!(vc.cache().len() <= 3);

        vc.set_cache_capacity(0);
        settle(&mut vc);
        assert!(vc.cache().is_empty());
        assert!(vc.playlist().items().iter().all(|i| !i.prefetched));
        assert!(vc.scheduled_keys().is_empty());
    }

    #[test]
    fn slideshow_ticks_and_stops() {
        let tmp = TempDir::new().unwrap();
        let a = write_png(&tmp, "a.png", 1, 1, [0, 0, 0, 255]);
        let b = write_png(&tmp, "b.png", 1, 1, [0, 0, 0, 255]);
        let mut vc = controller(ViewerConfig::default());
        vc.open(&[a, b]);

        vc.slideshow_tick();
        assert_eq!(vc.current_index(0), Some(0));
        vc.start_slideshow();
        vc.slideshow_tick();
        assert_eq!(vc.current_index(0), Some(1));

        vc.clear();
        drain(&vc);
        vc.slideshow_tick();
        assert!(!vc.is_playing_slideshow());
        assert_eq!(drain(&vc), vec![ViewEvent::SlideshowStopped]);
        vc.stop_slideshow();
        assert!(drain(&vc).is_empty());
        assert!(vc.set_slideshow_interval(Duration::ZERO).is_err());
        settle(&mut vc);
    }
}
