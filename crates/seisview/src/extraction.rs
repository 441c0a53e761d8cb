//! Running slice extractions off the input/render thread.
//!
//! [`SlicePlane`](seisview_structures::SlicePlane) only produces
//! [`ExtractionRequest`]s; a dispatcher runs them against the
//! [`VolumeStore`] and hands results back when the scene drains it.

use std::collections::BTreeMap;
use std::sync::Arc;
use std::thread::{self, JoinHandle};

use crossbeam_channel::{Receiver, Sender, TrySendError};
use seisview_core::{Result, Slice2D, SlicePlaneId, VolumeStore, WorkerOptions};
use seisview_structures::ExtractionRequest;

/// A finished extraction on its way back to its plane.
#[derive(Debug)]
pub struct ExtractionResult {
    pub plane: SlicePlaneId,
    pub seq: u64,
    pub result: Result<Slice2D>,
}

fn run(store: &VolumeStore, request: &ExtractionRequest) -> ExtractionResult {
    ExtractionResult {
        plane: request.plane,
        seq: request.seq,
        result: store.try_extract_slice(request.axis, request.position as i64, &request.extent),
    }
}

/// Runs extraction requests and returns their results.
pub trait ExtractionDispatcher: Send {
    /// Queues a request.
    fn dispatch(&mut self, request: ExtractionRequest);

    /// Returns all results that finished since the last call.
    fn drain(&mut self) -> Vec<ExtractionResult>;

    /// Total number of requests dispatched so far.
    fn dispatched(&self) -> u64;
}

/// Runs each request synchronously on the calling thread.
///
/// Useful for tests and tools; an interactive viewer should use
/// [`ExtractionWorkerPool`].
#[derive(Debug)]
pub struct InlineExtractor {
    store: Arc<VolumeStore>,
    completed: Vec<ExtractionResult>,
    dispatched: u64,
}

impl InlineExtractor {
    pub fn new(store: Arc<VolumeStore>) -> Self {
        Self {
            store,
            completed: Vec::new(),
            dispatched: 0,
        }
    }
}

impl ExtractionDispatcher for InlineExtractor {
    fn dispatch(&mut self, request: ExtractionRequest) {
        self.dispatched += 1;
        self.completed.push(run(&self.store, &request));
    }

    fn drain(&mut self) -> Vec<ExtractionResult> {
        std::mem::take(&mut self.completed)
    }

    fn dispatched(&self) -> u64 {
        self.dispatched
    }
}

/// A fixed pool of worker threads fed through a bounded queue.
///
/// When the queue is full the request is parked, one slot per plane, and
/// resubmitted on the next [`drain`](ExtractionDispatcher::drain). A newer
/// request for the same plane replaces the parked one, since the plane
/// would discard the older result anyway.
pub struct ExtractionWorkerPool {
    requests: Option<Sender<ExtractionRequest>>,
    results: Receiver<ExtractionResult>,
    parked: BTreeMap<SlicePlaneId, ExtractionRequest>,
    workers: Vec<JoinHandle<()>>,
    dispatched: u64,
}

impl ExtractionWorkerPool {
    /// Spawns `options.threads` workers sharing `store`.
    pub fn new(store: Arc<VolumeStore>, options: &WorkerOptions) -> Result<Self> {
        let (request_tx, request_rx) = crossbeam_channel::bounded::<ExtractionRequest>(options.queue_depth);
        let (result_tx, result_rx) = crossbeam_channel::unbounded();

        let mut workers = Vec::with_capacity(options.threads);
        for i in 0..options.threads {
            let store = Arc::clone(&store);
            let requests = request_rx.clone();
            let results = result_tx.clone();
            let handle = thread::Builder::new()
                .name(format!("seisview-extract-{i}"))
                .spawn(move || {
                    for request in &requests {
                        if results.send(run(&store, &request)).is_err() {
                            break;
                        }
                    }
                })?;
            workers.push(handle);
        }
        log::debug!(
            "started {} extraction workers (queue depth {})",
            options.threads,
            options.queue_depth
        );

        Ok(Self {
            requests: Some(request_tx),
            results: result_rx,
            parked: BTreeMap::new(),
            workers,
            dispatched: 0,
        })
    }

    /// Number of requests waiting for queue space.
    pub fn parked(&self) -> usize {
        self.parked.len()
    }

    fn submit(&mut self, request: ExtractionRequest) {
        let Some(sender) = &self.requests else {
            return;
        };
        match sender.try_send(request) {
            Ok(()) => {}
            Err(TrySendError::Full(request)) => {
                log::debug!("extraction queue full, parking request for {:?}", request.plane);
                self.parked.insert(request.plane, request);
            }
            Err(TrySendError::Disconnected(request)) => {
                log::warn!("extraction workers gone, dropping request for {:?}", request.plane);
            }
        }
    }
}

impl ExtractionDispatcher for ExtractionWorkerPool {
    fn dispatch(&mut self, request: ExtractionRequest) {
        self.dispatched += 1;
        self.parked.remove(&request.plane);
        self.submit(request);
    }

    fn drain(&mut self) -> Vec<ExtractionResult> {
        let parked = std::mem::take(&mut self.parked);
        for request in parked.into_values() {
            self.submit(request);
        }
        self.results.try_iter().collect()
    }

    fn dispatched(&self) -> u64 {
        self.dispatched
    }
}

impl std::fmt::Debug for ExtractionWorkerPool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ExtractionWorkerPool")
            .field("workers", &self.workers.len())
            .field("parked", &self.parked.len())
            .field("dispatched", &self.dispatched)
            .finish()
    }
}

impl Drop for ExtractionWorkerPool {
    fn drop(&mut self) {
        // Closing the queue ends every worker loop.
        self.requests = None;
        for handle in self.workers.drain(..) {
            if handle.join().is_err() {
                log::warn!("extraction worker panicked");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::{Duration, Instant};

    use seisview_core::{Axis, CacheOptions, SliceExtent, VolumeShape};

    fn store() -> Arc<VolumeStore> {
        let shape = VolumeShape::new(8, 8, 8);
        let samples: Vec<f32> = (0..shape.num_samples()).map(|v| v as f32).collect();
        Arc::new(VolumeStore::from_samples(shape, &samples, &CacheOptions::default()).unwrap())
    }

    fn request(store: &VolumeStore, plane: u32, seq: u64, position: usize) -> ExtractionRequest {
        ExtractionRequest {
            plane: SlicePlaneId(plane),
            seq,
            axis: Axis::Z,
            position,
            extent: SliceExtent::full(&store.shape(), Axis::Z),
        }
    }

    fn drain_until(pool: &mut ExtractionWorkerPool, count: usize) -> Vec<ExtractionResult> {
        let deadline = Instant::now() + Duration::from_secs(10);
        let mut results = Vec::new();
        while results.len() < count && Instant::now() < deadline {
            results.extend(pool.drain());
            thread::sleep(Duration::from_millis(1));
        }
        results
    }

    #[test]
    fn test_inline_extractor_runs_immediately() {
        let store = store();
        let mut inline = InlineExtractor::new(Arc::clone(&store));
        inline.dispatch(request(&store, 1, 1, 3));
        assert_eq!(inline.dispatched(), 1);
        let results = inline.drain();
        assert_eq!(results.len(), 1);
        let slice = results[0].result.as_ref().unwrap();
        assert_eq!((slice.width, slice.height), (8, 8));
        assert_eq!(slice.position, 3);
        assert!(inline.drain().is_empty());
    }

    #[test]
    fn test_worker_pool_returns_all_results() {
        let store = store();
        let options = WorkerOptions {
            threads: 3,
            queue_depth: 16,
        };
        let mut pool = ExtractionWorkerPool::new(Arc::clone(&store), &options).unwrap();
        for plane in 0..5 {
            pool.dispatch(request(&store, plane, 1, plane as usize));
        }
        let mut results = drain_until(&mut pool, 5);
        assert_eq!(results.len(), 5);
        results.sort_by_key(|r| r.plane);
        for (i, r) in results.iter().enumerate() {
            assert_eq!(r.plane, SlicePlaneId(i as u32));
            assert_eq!(r.result.as_ref().unwrap().position, i);
        }
    }

    #[test]
    fn test_full_queue_parks_newest_request_per_plane() {
        let store = store();
        // No workers: the queue never drains.
        let options = WorkerOptions {
            threads: 0,
            queue_depth: 1,
        };
        let mut pool = ExtractionWorkerPool::new(Arc::clone(&store), &options).unwrap();
        pool.dispatch(request(&store, 1, 1, 1));
        assert_eq!(pool.parked(), 0);
        pool.dispatch(request(&store, 2, 1, 1));
        pool.dispatch(request(&store, 2, 2, 5));
        assert_eq!(pool.parked(), 1);
        assert_eq!(pool.parked[&SlicePlaneId(2)].seq, 2);
        assert!(pool.drain().is_empty());
        assert_eq!(pool.parked(), 1);
        assert_eq!(pool.dispatched(), 3);
    }
}
