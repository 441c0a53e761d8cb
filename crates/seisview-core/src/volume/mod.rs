//! Out-of-core volume access.
//!
//! A volume is a logical `Nx × Ny × Nz` array of scalar samples stored
//! row-major in some [`StorageBackend`]. [`VolumeStore`] extracts axis-aligned
//! slices from it, faulting only the storage pages a slice touches into a
//! shared [`PageCache`].

mod backend;
mod layout;
mod page_cache;
mod slice;
mod store;

pub use backend::{FileBackend, InMemoryBackend, StorageBackend};
pub use layout::{ByteOrder, ElementType, VolumeDescriptor, VolumeLayout, VolumeShape};
pub use page_cache::{CacheStats, PageCache};
pub use slice::{Slice2D, SliceExtent};
pub use store::VolumeStore;
