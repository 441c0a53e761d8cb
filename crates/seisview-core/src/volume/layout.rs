//! Sample layout: volume dimensions, element types and byte offsets.

use std::path::{Path, PathBuf};

use half::f16;
use serde::{Deserialize, Serialize};

use crate::axis::Axis;
use crate::error::{Result, SeisviewError};

/// Dimensions of a volume in samples.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct VolumeShape {
    pub nx: usize,
    pub ny: usize,
    pub nz: usize,
}

impl VolumeShape {
    /// Creates a shape.
    pub fn new(nx: usize, ny: usize, nz: usize) -> Self {
        Self { nx, ny, nz }
    }

    /// Returns the number of samples along an axis.
    pub fn len(&self, axis: Axis) -> usize {
        match axis {
            Axis::X => self.nx,
            Axis::Y => self.ny,
            Axis::Z => self.nz,
        }
    }

    /// Returns the total number of samples, saturating at `usize::MAX`.
    ///
    /// Use [`VolumeShape::checked_num_samples`] where an oversized shape must
    /// be rejected.
    pub fn num_samples(&self) -> usize {
        self.checked_num_samples().unwrap_or(usize::MAX)
    }

    /// Returns the total number of samples, or `None` if it overflows `usize`.
    pub fn checked_num_samples(&self) -> Option<usize> {
        self.nx.checked_mul(self.ny)?.checked_mul(self.nz)
    }

    /// Returns true if any dimension is zero.
    pub fn is_empty(&self) -> bool {
        self.nx == 0 || self.ny == 0 || self.nz == 0
    }

    /// Clamps an index to `[0, len - 1]` along an axis.
    ///
    /// Returns `None` only when the axis has no samples at all.
    pub fn clamp_index(&self, axis: Axis, index: i64) -> Option<usize> {
        let len = self.len(axis);
        if len == 0 {
            return None;
        }
        Some(index.clamp(0, len as i64 - 1) as usize)
    }

    /// Returns the index unchanged if it is in range.
    pub fn checked_index(&self, axis: Axis, index: i64) -> Result<usize> {
        let len = self.len(axis);
        if index < 0 || index as u64 >= len as u64 {
            return Err(SeisviewError::OutOfRangeIndex { axis, index, len });
        }
        Ok(index as usize)
    }

    /// Row-major linear sample index of `(i, j, k)`.
    ///
    /// Indices must lie inside a shape whose sample count fits in `u64`;
    /// [`VolumeStore`](crate::VolumeStore) checks this on construction.
    pub fn linear_index(&self, i: usize, j: usize, k: usize) -> u64 {
        (i as u64 * self.ny as u64 + j as u64) * self.nz as u64 + k as u64
    }
}

/// Byte order of stored samples.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum ByteOrder {
    #[default]
    Little,
    Big,
}

/// Scalar type of stored samples.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ElementType {
    U8,
    I8,
    U16,
    I16,
    U32,
    I32,
    F16,
    F32,
    F64,
}

impl ElementType {
    /// Size of one element in bytes.
    pub fn size(self) -> usize {
        match self {
            ElementType::U8 | ElementType::I8 => 1,
            ElementType::U16 | ElementType::I16 | ElementType::F16 => 2,
            ElementType::U32 | ElementType::I32 | ElementType::F32 => 4,
            ElementType::F64 => 8,
        }
    }

    /// Decodes one element from exactly `self.size()` bytes.
    pub fn decode(self, bytes: &[u8], order: ByteOrder) -> f32 {
        macro_rules! read {
            ($t:ty, $n:literal) => {{
                let mut raw = [0u8; $n];
                raw.copy_from_slice(&bytes[..$n]);
                match order {
                    ByteOrder::Little => <$t>::from_le_bytes(raw),
                    ByteOrder::Big => <$t>::from_be_bytes(raw),
                }
            }};
        }
        match self {
            ElementType::U8 => f32::from(bytes[0]),
            ElementType::I8 => f32::from(bytes[0] as i8),
            ElementType::U16 => f32::from(read!(u16, 2)),
            ElementType::I16 => f32::from(read!(i16, 2)),
            ElementType::U32 => read!(u32, 4) as f32,
            ElementType::I32 => read!(i32, 4) as f32,
            ElementType::F16 => f16::from_bits(read!(u16, 2)).to_f32(),
            ElementType::F32 => read!(f32, 4),
            ElementType::F64 => read!(f64, 8) as f32,
        }
    }
}

/// How samples are laid out in the backing storage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct VolumeLayout {
    pub shape: VolumeShape,
    pub element_type: ElementType,
    pub byte_order: ByteOrder,
    /// Byte offset of sample `(0, 0, 0)`.
    pub base_offset: u64,
}

impl VolumeLayout {
    /// Creates a layout with no header.
    pub fn new(shape: VolumeShape, element_type: ElementType, byte_order: ByteOrder) -> Self {
        Self {
            shape,
            element_type,
            byte_order,
            base_offset: 0,
        }
    }

    /// Bytes occupied by the samples, excluding the header. Saturates at
    /// `u64::MAX`.
    pub fn data_len(&self) -> u64 {
        self.checked_data_len().unwrap_or(u64::MAX)
    }

    /// Bytes occupied by the samples, or `None` if the shape cannot be
    /// addressed with 64-bit offsets.
    pub fn checked_data_len(&self) -> Option<u64> {
        let shape = &self.shape;
        (shape.nx as u64)
            .checked_mul(shape.ny as u64)?
            .checked_mul(shape.nz as u64)?
            .checked_mul(self.element_type.size() as u64)
    }

    /// Header plus sample bytes, or `None` on overflow.
    pub fn checked_end(&self) -> Option<u64> {
        self.base_offset.checked_add(self.checked_data_len()?)
    }

    /// Offset of `(i, j, k)` relative to the start of the sample data.
    pub fn data_offset(&self, i: usize, j: usize, k: usize) -> u64 {
        self.shape.linear_index(i, j, k) * self.element_type.size() as u64
    }

    /// Absolute byte offset of `(i, j, k)` in the backing storage:
    /// `base + (i*Ny*Nz + j*Nz + k) * element_size`.
    pub fn byte_offset(&self, i: usize, j: usize, k: usize) -> u64 {
        self.base_offset + self.data_offset(i, j, k)
    }
}

/// Serializable description of a volume stored in a raw file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VolumeDescriptor {
    pub path: PathBuf,
    pub shape: VolumeShape,
    pub element_type: ElementType,
    #[serde(default)]
    pub byte_order: ByteOrder,
    #[serde(default)]
    pub base_offset: u64,
}

impl VolumeDescriptor {
    /// Returns the sample layout described.
    pub fn layout(&self) -> VolumeLayout {
        VolumeLayout {
            shape: self.shape,
            element_type: self.element_type,
            byte_order: self.byte_order,
            base_offset: self.base_offset,
        }
    }

    /// Reads a descriptor from a JSON file. A relative `path` inside it is
    /// resolved against the descriptor's directory.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let mut desc: Self = serde_json::from_str(&std::fs::read_to_string(path)?)?;
        if desc.path.is_relative() {
            if let Some(dir) = path.parent() {
                desc.path = dir.join(&desc.path);
            }
        }
        Ok(desc)
    }
}
