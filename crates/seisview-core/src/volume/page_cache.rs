//! Byte-budgeted LRU cache of storage pages shared by extraction workers.

use std::collections::{BTreeMap, HashMap};
use std::io;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

/// Counters describing cache behaviour since creation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CacheStats {
    /// Requests served from a resident page.
    pub hits: u64,
    /// Requests that had to read the page from storage.
    pub faults: u64,
    /// Pages dropped to stay within the budget.
    pub evictions: u64,
    /// Bytes currently resident.
    pub resident_bytes: usize,
    /// Pages currently resident.
    pub resident_pages: usize,
}

struct ResidentPage {
    data: Arc<[u8]>,
    last_used: u64,
}

#[derive(Default)]
struct LruState {
    pages: HashMap<u64, ResidentPage>,
    /// Access tick -> page index, oldest first.
    recency: BTreeMap<u64, u64>,
    tick: u64,
    stats: CacheStats,
}

impl LruState {
    fn touch(&mut self, page: u64) -> Option<Arc<[u8]>> {
        self.tick += 1;
        let tick = self.tick;
        let entry = self.pages.get_mut(&page)?;
        self.recency.remove(&entry.last_used);
        entry.last_used = tick;
        self.recency.insert(tick, page);
        Some(Arc::clone(&entry.data))
    }

    fn evict_to(&mut self, budget: usize) {
        // The most recent page always stays, even if it alone exceeds the budget.
        while self.stats.resident_bytes > budget && self.pages.len() > 1 {
            let Some((_, page)) = self.recency.pop_first() else {
                break;
            };
            if let Some(evicted) = self.pages.remove(&page) {
                self.stats.resident_bytes -= evicted.data.len();
                self.stats.evictions += 1;
                log::trace!("evicted page {page} ({} bytes)", evicted.data.len());
            }
        }
        self.stats.resident_pages = self.pages.len();
    }
}

/// A least-recently-used cache of fixed-size storage pages.
///
/// Pages are handed out as `Arc<[u8]>`, so a page evicted while an extraction
/// is still reading it stays alive until that reader drops it. Loading happens
/// outside the lock; concurrent readers of different pages never wait on each
/// other's I/O.
pub struct PageCache {
    page_size: usize,
    budget_bytes: usize,
    state: Mutex<LruState>,
}

impl PageCache {
    /// Creates an empty cache.
    pub fn new(page_size: usize, budget_bytes: usize) -> Self {
        Self {
            page_size: page_size.max(1),
            budget_bytes,
            state: Mutex::new(LruState::default()),
        }
    }

    fn lock(&self) -> MutexGuard<'_, LruState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Size of one page in bytes.
    pub fn page_size(&self) -> usize {
        self.page_size
    }

    /// Resident memory budget in bytes.
    pub fn budget_bytes(&self) -> usize {
        self.budget_bytes
    }

    /// Returns a resident page, loading it with `load` on a miss.
    pub fn get_or_load<F>(&self, page: u64, load: F) -> io::Result<Arc<[u8]>>
    where
        F: FnOnce() -> io::Result<Vec<u8>>,
    {
        {
            let mut state = self.lock();
            if let Some(data) = state.touch(page) {
                state.stats.hits += 1;
                return Ok(data);
            }
        }

        let data: Arc<[u8]> = load()?.into();

        let mut state = self.lock();
        state.stats.faults += 1;
        // Another reader may have loaded the same page while we were reading.
        if let Some(existing) = state.touch(page) {
            return Ok(existing);
        }
        let tick = state.tick;
        state.stats.resident_bytes += data.len();
        state.pages.insert(
            page,
            ResidentPage {
                data: Arc::clone(&data),
                last_used: tick,
            },
        );
        state.recency.insert(tick, page);
        log::trace!("faulted page {page} ({} bytes)", data.len());
        state.evict_to(self.budget_bytes);
        Ok(data)
    }

    /// Returns true if a page is resident.
    pub fn contains(&self, page: u64) -> bool {
        self.lock().pages.contains_key(&page)
    }

    /// Returns the resident page indices in ascending order.
    pub fn resident_pages(&self) -> Vec<u64> {
        let mut pages: Vec<u64> = self.lock().pages.keys().copied().collect();
        pages.sort_unstable();
        pages
    }

    /// Returns a snapshot of the cache counters.
    pub fn stats(&self) -> CacheStats {
        self.lock().stats
    }

    /// Drops every resident page. Counters other than residency are kept.
    pub fn clear(&mut self) {
        let state = self.state.get_mut().unwrap_or_else(PoisonError::into_inner);
        state.pages.clear();
        state.recency.clear();
        state.stats.resident_bytes = 0;
        state.stats.resident_pages = 0;
    }
}

impl std::fmt::Debug for PageCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PageCache")
            .field("page_size", &self.page_size)
            .field("budget_bytes", &self.budget_bytes)
            .field("stats", &self.stats())
            .finish()
    }
}
