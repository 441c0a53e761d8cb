//! Byte storage behind a volume: in-memory buffers and memory-mapped files.

use std::fs::File;
use std::io;
use std::path::{Path, PathBuf};

use memmap2::{Mmap, MmapOptions};

use super::layout::ByteOrder;

/// Random-access byte storage behind a volume.
///
/// Implementations must be callable from several extraction workers at once.
pub trait StorageBackend: Send + Sync {
    /// Fills `buf` with the bytes starting at `offset`.
    ///
    /// Fails with `UnexpectedEof` if the range runs past the end.
    fn read_at(&self, offset: u64, buf: &mut [u8]) -> io::Result<()>;

    /// Total number of bytes available.
    fn len(&self) -> u64;

    /// Returns true if the storage holds no bytes.
    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Storage held entirely in memory.
#[derive(Debug, Clone, Default)]
pub struct InMemoryBackend {
    bytes: Vec<u8>,
}

impl InMemoryBackend {
    /// Wraps raw bytes.
    pub fn new(bytes: Vec<u8>) -> Self {
        Self { bytes }
    }

    /// Encodes `f32` samples with the given byte order.
    pub fn from_f32(samples: &[f32], order: ByteOrder) -> Self {
        let mut bytes = Vec::with_capacity(samples.len() * 4);
        for &s in samples {
            match order {
                ByteOrder::Little => bytes.extend_from_slice(&s.to_le_bytes()),
                ByteOrder::Big => bytes.extend_from_slice(&s.to_be_bytes()),
            }
        }
        Self { bytes }
    }

    /// Returns the stored bytes.
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }
}

impl StorageBackend for InMemoryBackend {
    fn read_at(&self, offset: u64, buf: &mut [u8]) -> io::Result<()> {
        copy_range(&self.bytes, offset, buf)
    }

    fn len(&self) -> u64 {
        self.bytes.len() as u64
    }
}

/// Copies `bytes[offset..offset + buf.len()]` into `buf`.
fn copy_range(bytes: &[u8], offset: u64, buf: &mut [u8]) -> io::Result<()> {
    let start = usize::try_from(offset)
        .map_err(|_| io::Error::new(io::ErrorKind::UnexpectedEof, "offset past end"))?;
    let end = start
        .checked_add(buf.len())
        .filter(|&end| end <= bytes.len())
        .ok_or_else(|| io::Error::new(io::ErrorKind::UnexpectedEof, "read past end"))?;
    buf.copy_from_slice(&bytes[start..end]);
    Ok(())
}

/// Storage backed by a read-only memory map of a file on disk.
///
/// Reads take no lock, so extraction workers fault pages concurrently. Only
/// the ranges requested through [`StorageBackend::read_at`] are touched.
/// The file must not be truncated while the backend is alive.
#[derive(Debug)]
pub struct FileBackend {
    path: PathBuf,
    /// `None` for an empty file, which cannot be mapped.
    map: Option<Mmap>,
}

impl FileBackend {
    /// Opens and maps a file for reading.
    pub fn open(path: impl AsRef<Path>) -> io::Result<Self> {
        let path = path.as_ref().to_path_buf();
        let file = File::open(&path)?;
        let len = file.metadata()?.len();
        let map = if len == 0 {
            None
        } else {
            // SAFETY: the map is read-only and the file is opened by us; callers
            // must not truncate it while the backend is alive.
            #[allow(unsafe_code)]
            let map = unsafe { MmapOptions::new().map(&file)? };
            Some(map)
        };
        log::debug!("mapped volume file {} ({len} bytes)", path.display());
        Ok(Self { path, map })
    }

    /// Returns the path of the backing file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn bytes(&self) -> &[u8] {
        self.map.as_deref().unwrap_or(&[])
    }
}

impl StorageBackend for FileBackend {
    fn read_at(&self, offset: u64, buf: &mut [u8]) -> io::Result<()> {
        copy_range(self.bytes(), offset, buf)
    }

    fn len(&self) -> u64 {
        self.bytes().len() as u64
    }
}
