//! [`VolumeStore`]: clamped, paged slice extraction.

use std::sync::Arc;

use super::backend::{FileBackend, InMemoryBackend, StorageBackend};
use super::layout::{ByteOrder, ElementType, VolumeDescriptor, VolumeLayout, VolumeShape};
use super::page_cache::{CacheStats, PageCache};
use super::slice::{Slice2D, SliceExtent};
use crate::axis::Axis;
use crate::error::{Result, SeisviewError};
use crate::options::CacheOptions;

/// A read-only volume with paged, cached slice extraction.
///
/// The store is shared between extraction workers behind an `Arc`; all
/// methods take `&self`.
pub struct VolumeStore {
    layout: VolumeLayout,
    backend: Arc<dyn StorageBackend>,
    cache: PageCache,
}

impl VolumeStore {
    /// Creates a store over an arbitrary backend.
    ///
    /// The page size is rounded up to a whole number of elements.
    pub fn new(
        layout: VolumeLayout,
        backend: Arc<dyn StorageBackend>,
        cache: &CacheOptions,
    ) -> Result<Self> {
        let needed = layout.checked_end().ok_or_else(|| {
            SeisviewError::InvalidConfig(format!(
                "volume {}x{}x{} of {:?} is too large to address",
                layout.shape.nx, layout.shape.ny, layout.shape.nz, layout.element_type
            ))
        })?;
        if backend.len() < needed {
            return Err(SeisviewError::SizeMismatch {
                expected: needed as usize,
                actual: backend.len() as usize,
            });
        }
        let element_size = layout.element_type.size();
        let page_size = cache.page_size.max(1).div_ceil(element_size) * element_size;
        log::debug!(
            "volume {}x{}x{} {:?}, page size {page_size}, budget {} bytes",
            layout.shape.nx,
            layout.shape.ny,
            layout.shape.nz,
            layout.element_type,
            cache.budget_bytes
        );
        Ok(Self {
            layout,
            backend,
            cache: PageCache::new(page_size, cache.budget_bytes),
        })
    }

    /// Creates an in-memory store from `f32` samples in row-major order.
    pub fn from_samples(shape: VolumeShape, samples: &[f32], cache: &CacheOptions) -> Result<Self> {
        let expected = shape.num_samples();
        if samples.len() != expected {
            return Err(SeisviewError::SizeMismatch {
                expected,
                actual: samples.len(),
            });
        }
        let backend = InMemoryBackend::from_f32(samples, ByteOrder::Little);
        Self::new(
            VolumeLayout::new(shape, ElementType::F32, ByteOrder::Little),
            Arc::new(backend),
            cache,
        )
    }

    /// Opens a raw volume file described by `desc`.
    pub fn open(desc: &VolumeDescriptor, cache: &CacheOptions) -> Result<Self> {
        let backend = FileBackend::open(&desc.path)?;
        Self::new(desc.layout(), Arc::new(backend), cache)
    }

    /// Returns the sample layout.
    pub fn layout(&self) -> &VolumeLayout {
        &self.layout
    }

    /// Returns the volume dimensions.
    pub fn shape(&self) -> VolumeShape {
        self.layout.shape
    }

    /// Returns the whole cross-section normal to `axis`.
    pub fn full_extent(&self, axis: Axis) -> SliceExtent {
        SliceExtent::full(&self.layout.shape, axis)
    }

    /// Returns the page cache counters.
    pub fn cache_stats(&self) -> CacheStats {
        self.cache.stats()
    }

    /// Returns the indices of resident pages.
    pub fn resident_pages(&self) -> Vec<u64> {
        self.cache.resident_pages()
    }

    /// Returns the page holding sample `(i, j, k)`.
    pub fn page_of(&self, i: usize, j: usize, k: usize) -> u64 {
        self.layout.data_offset(i, j, k) / self.cache.page_size() as u64
    }

    fn load_page(&self, page: u64) -> std::io::Result<Vec<u8>> {
        let page_size = self.cache.page_size() as u64;
        let start = page * page_size;
        let end = (start + page_size).min(self.layout.data_len());
        let mut buf = vec![0u8; end.saturating_sub(start) as usize];
        self.backend.read_at(self.layout.base_offset + start, &mut buf)?;
        Ok(buf)
    }

    /// Reads one sample with every index clamped into the volume.
    ///
    /// Returns the background value for an empty volume.
    pub fn sample(&self, i: i64, j: i64, k: i64) -> Result<f32> {
        let shape = &self.layout.shape;
        let (Some(i), Some(j), Some(k)) = (
            shape.clamp_index(Axis::X, i),
            shape.clamp_index(Axis::Y, j),
            shape.clamp_index(Axis::Z, k),
        ) else {
            return Ok(Slice2D::BACKGROUND);
        };
        let mut reader = PageReader::new(self);
        Ok(reader.read(self.layout.data_offset(i, j, k))?)
    }

    /// Extracts the slice normal to `axis` at `position`.
    ///
    /// The position and extent are clamped to the volume. Only the pages
    /// covering the requested samples are faulted in. Storage errors are
    /// returned; see [`VolumeStore::extract_slice`] for the infallible form.
    pub fn try_extract_slice(
        &self,
        axis: Axis,
        position: i64,
        extent: &SliceExtent,
    ) -> Result<Slice2D> {
        let shape = &self.layout.shape;
        let extent = extent.clamped(shape, axis);
        let (width, height) = (extent.width(), extent.height());
        let Some(position) = shape.clamp_index(axis, position) else {
            return Ok(Slice2D::background(axis, 0, width, height));
        };

        let (u_axis, v_axis) = axis.plane_axes();
        let mut reader = PageReader::new(self);
        let mut data = Vec::with_capacity(width * height);
        let mut index = [0usize; 3];
        index[axis.index()] = position;
        for v in extent.v.clone() {
            index[v_axis.index()] = v;
            for u in extent.u.clone() {
                index[u_axis.index()] = u;
                let offset = self.layout.data_offset(index[0], index[1], index[2]);
                data.push(reader.read(offset)?);
            }
        }

        Ok(Slice2D {
            axis,
            position,
            width,
            height,
            data,
        })
    }

    /// Extracts a slice, substituting an all-background slice on storage failure.
    pub fn extract_slice(&self, axis: Axis, position: i64, extent: &SliceExtent) -> Slice2D {
        self.try_extract_slice(axis, position, extent)
            .unwrap_or_else(|err| {
                log::warn!("slice extraction {axis}={position} failed: {err}");
                let extent = extent.clamped(&self.layout.shape, axis);
                let position = self
                    .layout
                    .shape
                    .clamp_index(axis, position)
                    .unwrap_or_default();
                Slice2D::background(axis, position, extent.width(), extent.height())
            })
    }
}

impl std::fmt::Debug for VolumeStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VolumeStore")
            .field("layout", &self.layout)
            .field("cache", &self.cache)
            .finish_non_exhaustive()
    }
}

/// Walks sample offsets while holding on to the last page it touched.
struct PageReader<'a> {
    store: &'a VolumeStore,
    current: Option<(u64, Arc<[u8]>)>,
}

impl<'a> PageReader<'a> {
    fn new(store: &'a VolumeStore) -> Self {
        Self {
            store,
            current: None,
        }
    }

    fn read(&mut self, data_offset: u64) -> std::io::Result<f32> {
        let page_size = self.store.cache.page_size() as u64;
        let page = data_offset / page_size;
        let within = (data_offset % page_size) as usize;

        let cached = match &self.current {
            Some((p, bytes)) if *p == page => Some(Arc::clone(bytes)),
            _ => None,
        };
        let bytes = if let Some(bytes) = cached {
            bytes
        } else {
            let store = self.store;
            let bytes = store.cache.get_or_load(page, || store.load_page(page))?;
            self.current = Some((page, Arc::clone(&bytes)));
            bytes
        };

        let element = self.store.layout.element_type;
        Ok(element.decode(
            &bytes[within..within + element.size()],
            self.store.layout.byte_order,
        ))
    }
}
