//! Ordering and failure handling of asynchronous extractions.

use std::io;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::{Duration, Instant};

use seisview::*;

/// Holds requests until the test decides when and in which order they finish.
#[derive(Clone, Default)]
struct ManualDispatcher {
    pending: Arc<Mutex<Vec<ExtractionRequest>>>,
    ready: Arc<Mutex<Vec<ExtractionResult>>>,
}

impl ManualDispatcher {
    fn take_pending(&self) -> Vec<ExtractionRequest> {
        std::mem::take(&mut *self.pending.lock().unwrap())
    }

    fn complete(&self, store: &VolumeStore, request: &ExtractionRequest) {
        let result =
            store.try_extract_slice(request.axis, request.position as i64, &request.extent);
        self.ready.lock().unwrap().push(ExtractionResult {
            plane: request.plane,
            seq: request.seq,
            result,
        });
    }
}

impl ExtractionDispatcher for ManualDispatcher {
    fn dispatch(&mut self, request: ExtractionRequest) {
        self.pending.lock().unwrap().push(request);
    }

    fn drain(&mut self) -> Vec<ExtractionResult> {
        std::mem::take(&mut *self.ready.lock().unwrap())
    }

    fn dispatched(&self) -> u64 {
        0
    }
}

fn depth_volume(n: usize) -> Arc<VolumeStore> {
    let shape = VolumeShape::new(n, n, n);
    let samples: Vec<f32> = (0..shape.num_samples()).map(|v| (v % n) as f32).collect();
    Arc::new(VolumeStore::from_samples(shape, &samples, &CacheOptions::default()).unwrap())
}

fn manual_scene(store: &Arc<VolumeStore>) -> (SceneGraph, ManualDispatcher) {
    let manual = ManualDispatcher::default();
    let scene = SceneGraph::new(
        Arc::clone(store),
        Options::default(),
        Box::new(manual.clone()),
        Box::new(CpuPickPass::new(64, 64)),
    )
    .unwrap();
    (scene, manual)
}

#[test]
fn test_out_of_order_results_apply_only_latest() {
    let store = depth_volume(40);
    let (mut scene, manual) = manual_scene(&store);
    let id = scene.add_slice_plane(Axis::Z, 10, (0.0, 40.0)).unwrap();
    scene.set_slice_position(id, 20);
    scene.set_slice_position(id, 30);

    let mut requests = manual.take_pending();
    assert_eq!(requests.len(), 3);
    requests.reverse();
    for request in &requests {
        manual.complete(&store, request);
    }
    assert_eq!(scene.poll_extractions(), 1);
    let plane = scene.plane(id).unwrap();
    assert_eq!(plane.samples().unwrap().position, 30);
    assert_eq!(plane.samples().unwrap().get(0, 0), Some(30.0));
}

#[test]
fn test_late_stale_result_does_not_overwrite() {
    let store = depth_volume(40);
    let (mut scene, manual) = manual_scene(&store);
    let id = scene.add_slice_plane(Axis::Z, 5, (0.0, 40.0)).unwrap();
    scene.set_slice_position(id, 25);
    let requests = manual.take_pending();

    manual.complete(&store, &requests[1]);
    assert_eq!(scene.poll_extractions(), 1);
    let generation = scene.plane(id).unwrap().texture().generation();

    manual.complete(&store, &requests[0]);
    assert_eq!(scene.poll_extractions(), 0);
    let plane = scene.plane(id).unwrap();
    assert_eq!(plane.samples().unwrap().position, 25);
    assert_eq!(plane.texture().generation(), generation);
}

/// Reads from memory until switched off, then fails every read.
struct FlakyBackend {
    inner: InMemoryBackend,
    broken: AtomicBool,
}

impl StorageBackend for FlakyBackend {
    fn read_at(&self, offset: u64, buf: &mut [u8]) -> io::Result<()> {
        if self.broken.load(Ordering::SeqCst) {
            return Err(io::Error::other("device unplugged"));
        }
        self.inner.read_at(offset, buf)
    }

    fn len(&self) -> u64 {
        self.inner.len()
    }
}

#[test]
fn test_storage_failure_keeps_last_good_texture() {
    let shape = VolumeShape::new(8, 8, 8);
    let samples: Vec<f32> = (0..shape.num_samples()).map(|v| v as f32).collect();
    let backend = Arc::new(FlakyBackend {
        inner: InMemoryBackend::from_f32(&samples, ByteOrder::Little),
        broken: AtomicBool::new(false),
    });
    // One resident page at most, so moving the slice must hit storage again.
    let cache = CacheOptions {
        page_size: 64,
        budget_bytes: 64,
    };
    let layout = VolumeLayout::new(shape, ElementType::F32, ByteOrder::Little);
    let store = Arc::new(VolumeStore::new(layout, backend.clone(), &cache).unwrap());

    let mut scene = SceneGraph::inline(Arc::clone(&store), Options::default(), 64, 64).unwrap();
    let id = scene.add_slice_plane(Axis::Z, 2, (0.0, 512.0)).unwrap();
    assert_eq!(scene.poll_extractions(), 1);
    let before = scene.plane(id).unwrap().texture().clone();

    backend.broken.store(true, Ordering::SeqCst);
    assert!(scene.set_slice_position(id, 6));
    assert_eq!(scene.poll_extractions(), 0);

    let plane = scene.plane(id).unwrap();
    assert_eq!(plane.position(), 6);
    assert_eq!(plane.samples().unwrap().position, 2);
    assert_eq!(plane.texture(), &before);
}

#[test]
fn test_worker_pool_converges_on_final_position() {
    let store = depth_volume(32);
    let mut scene = SceneGraph::threaded(Arc::clone(&store), Options::default(), 64, 64).unwrap();
    let id = scene.add_slice_plane(Axis::Z, 0, (0.0, 32.0)).unwrap();
    for position in 1..32 {
        scene.set_slice_position(id, position);
    }
    assert_eq!(scene.dispatched_extractions(), 32);

    let deadline = Instant::now() + Duration::from_secs(10);
    loop {
        scene.poll_extractions();
        let plane = scene.plane(id).unwrap();
        if plane.applied_seq() == Some(plane.latest_seq()) {
            break;
        }
        assert!(Instant::now() < deadline, "extraction never arrived");
        thread::sleep(Duration::from_millis(2));
    }
    let samples = scene.plane(id).unwrap().samples().unwrap();
    assert_eq!(samples.position, 31);
    assert_eq!(samples.get(1, 1), Some(31.0));
}
