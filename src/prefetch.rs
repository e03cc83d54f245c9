use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Weak};
use std::thread::{self, JoinHandle};
use std::time::Instant;

use crossbeam_channel::{Receiver, Sender};

use crate::cache::ByteCache;
use crate::file_ref::FileRef;
use crate::loader;

pub type Waker = Arc<dyn Fn() + Send + Sync>;

/// Summary of one finished pass; the `finished` signal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PassReport {
    /// Keys of the list the pass was started with.
    pub keys: Vec<String>,
    /// Entries read from disk and inserted by this pass.
    pub fetched: usize,
    pub cancelled: bool,
}

// ---------------------------------------------------------------------------
// Prefetch worker
// ---------------------------------------------------------------------------

/// Background filler for the byte cache.
///
/// One worker thread at a time walks the scheduled list in order and reads
/// every entry the cache does not hold yet. The cache mutex is only taken for
/// the presence test and the insert; reads happen outside it.
pub struct Prefetcher {
    cache: Weak<ByteCache>,
    targets: Vec<FileRef>,
    cancel: Arc<AtomicBool>,
    running: Arc<AtomicBool>,
    handle: Option<JoinHandle<()>>,
    finished_tx: Sender<PassReport>,
    finished_rx: Receiver<PassReport>,
    waker: Option<Waker>,
}

impl Prefetcher {
    pub fn new(cache: Weak<ByteCache>) -> Self {
        let (finished_tx, finished_rx) = crossbeam_channel::unbounded();
        Self {
            cache,
            targets: Vec::new(),
            cancel: Arc::new(AtomicBool::new(false)),
            running: Arc::new(AtomicBool::new(false)),
            handle: None,
            finished_tx,
            finished_rx,
            waker: None,
        }
    }

    /// Called from the worker after each report is sent.
    pub fn set_waker(&mut self, waker: Waker) {
        self.waker = Some(waker);
    }

    pub fn schedule(&mut self, list: Vec<FileRef>) {
        self.targets = list;
    }

    pub fn scheduled(&self) -> &[FileRef] {
        &self.targets
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::Acquire)
    }

    /// Begin a pass over the scheduled list. Returns `false` without doing
    /// anything while a pass is still running.
    pub fn start(&mut self) -> bool {
        if self.is_running() {
            return false;
        }
        // Reap the previous worker; it has already reported.
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }

        self.cancel.store(false, Ordering::Release);
        self.running.store(true, Ordering::Release);

        let pass = Pass {
            cache: self.cache.clone(),
            targets: self.targets.clone(),
            cancel: Arc::clone(&self.cancel),
        };
        let running = Arc::clone(&self.running);
        let tx = self.finished_tx.clone();
        let waker = self.waker.clone();

        let spawned = thread::Builder::new()
            .name("prefetch".into())
            .spawn(move || {
                let report = pass.run();
                // Report first so reports arrive in pass order.
                let _ = tx.send(report);
                running.store(false, Ordering::Release);
                if let Some(wake) = waker {
                    wake();
                }
            });

        match spawned {
            Ok(handle) => {
                self.handle = Some(handle);
                true
            }
            Err(e) => {
                log::error!("Failed to spawn prefetch worker: {}", e);
                self.running.store(false, Ordering::Release);
                false
            }
        }
    }

    /// Ask the running pass to stop before its next entry.
    pub fn cancel(&self) {
        self.cancel.store(true, Ordering::Release);
    }

    /// Block until the current worker, if any, has exited.
    pub fn wait(&mut self) {
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }

    /// The `finished` signal: one report per pass.
    pub fn finished(&self) -> &Receiver<PassReport> {
        &self.finished_rx
    }
}

impl Drop for Prefetcher {
    fn drop(&mut self) {
        self.cancel();
        self.wait();
    }
}

struct Pass {
    cache: Weak<ByteCache>,
    targets: Vec<FileRef>,
    cancel: Arc<AtomicBool>,
}

impl Pass {
    fn run(self) -> PassReport {
        let start_time = Instant::now();
        let keys: Vec<String> = self.targets.iter().map(FileRef::cache_key).collect();
        let mut report = PassReport {
            keys,
            fetched: 0,
            cancelled: false,
        };

        let Some(cache) = self.cache.upgrade() else {
            return report;
        };
        if cache.capacity() == 0 {
            return report;
        }

        for (file, key) in self.targets.iter().zip(&report.keys) {
            if self.cancel.load(Ordering::Acquire) {
                report.cancelled = true;
                break;
            }
            // A hit is promoted so the window outlives older entries.
            if cache.touch(key) {
                continue;
            }
            match loader::read(file) {
                Ok(bytes) => {
                    log::debug!("[prefetch] cached {}", key);
                    cache.insert(key.clone(), bytes);
                    report.fetched += 1;
                }
                Err(e) => log::warn!("[prefetch] {}", e),
            }
        }

        log::debug!(
            "[prefetch] pass done in {:.3}s: {} fetched of {}{}",
            start_time.elapsed().as_secs_f64(),
            report.fetched,
            report.keys.len(),
            if report.cancelled { " (cancelled)" } else { "" }
        );
        report
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use std::time::Duration;
    use tempfile::TempDir;

    fn files(tmp: &TempDir, n: usize) -> Vec<FileRef> {
        (0..n)
            .map(|i| {
                let path = tmp.path().join(format!("{i}.png"));
                fs::write(&path, vec![i as u8; 4]).unwrap();
                FileRef::raw(path)
            })
            .collect()
    }

    fn next_report(p: &Prefetcher) -> PassReport {
        p.finished().recv_timeout(Duration::from_secs(10)).unwrap()
    }

    #[test]
    fn pass_fills_the_cache() {
        let tmp = TempDir::new().unwrap();
        let list = files(&tmp, 3);
        let cache = Arc::new(ByteCache::new(10));
        let mut p = Prefetcher::new(Arc::downgrade(&cache));
        p.schedule(list.clone());
        assert!(p.start());

        let report = next_report(&p);
        assert_eq!(report.fetched, 3);
        assert!(!report.cancelled);
        for f in &list {
            assert_eq!(
                cache.get_copy(&f.cache_key()),
                Some(fs::read(f.physical_path()).unwrap())
            );
        }
    }

    #[test]
    fn cached_entries_are_skipped() {
        let tmp = TempDir::new().unwrap();
        let list = files(&tmp, 2);
        let cache = Arc::new(ByteCache::new(10));
        cache.insert(list[0].cache_key(), b"already".to_vec());

        let mut p = Prefetcher::new(Arc::downgrade(&cache));
        p.schedule(list.clone());
        p.start();
        assert_eq!(next_report(&p).fetched, 1);
        assert_eq!(cache.get_copy(&list[0].cache_key()), Some(b"already".to_vec()));
    }

    #[test]
    fn zero_capacity_returns_immediately() {
        let tmp = TempDir::new().unwrap();
        let cache = Arc::new(ByteCache::new(0));
        let mut p = Prefetcher::new(Arc::downgrade(&cache));
        p.schedule(files(&tmp, 2));
        p.start();
        let report = next_report(&p);
        assert_eq!(report.fetched, 0);
        assert!(cache.is_empty());
    }

    #[test]
    fn missing_files_are_skipped() {
        let tmp = TempDir::new().unwrap();
        let mut list = files(&tmp, 1);
        list.insert(0, FileRef::raw(tmp.path().join("gone.png")));
        let cache = Arc::new(ByteCache::new(10));
        let mut p = Prefetcher::new(Arc::downgrade(&cache));
        p.schedule(list);
        p.start();
        assert_eq!(next_report(&p).fetched, 1);
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn cancelled_before_first_entry_reads_nothing() {
        let tmp = TempDir::new().unwrap();
        let cache = Arc::new(ByteCache::new(10));
        let pass = Pass {
            cache: Arc::downgrade(&cache),
            targets: files(&tmp, 3),
            cancel: Arc::new(AtomicBool::new(true)),
        };
        let report = pass.run();
        assert!(report.cancelled);
        assert_eq!(report.fetched, 0);
        assert!(cache.is_empty());
    }

    #[test]
    fn dropped_cache_ends_the_pass() {
        let tmp = TempDir::new().unwrap();
        let cache = Arc::new(ByteCache::new(10));
        let weak = Arc::downgrade(&cache);
        drop(cache);
        let mut p = Prefetcher::new(weak);
        p.schedule(files(&tmp, 2));
        p.start();
        assert_eq!(next_report(&p).fetched, 0);
    }

    #[test]
    fn waker_runs_after_each_pass() {
        let tmp = TempDir::new().unwrap();
        let cache = Arc::new(ByteCache::new(10));
        let (tx, rx) = crossbeam_channel::unbounded();
        let mut p = Prefetcher::new(Arc::downgrade(&cache));
        p.set_waker(Arc::new(move || {
            let _ = tx.send(());
        }));
        p.schedule(files(&tmp, 1));
        p.start();
        rx.recv_timeout(Duration::from_secs(10)).unwrap();
        assert!(!p.is_running());
        p.wait();
        p.start();
        rx.recv_timeout(Duration::from_secs(10)).unwrap();
    }
}
