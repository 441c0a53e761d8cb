//! CPU-side slice textures.

/// Colour-mapped pixels of a slice, ready to be uploaded to a GPU texture.
///
/// `generation` increases on every content change so an uploader can tell
/// whether its copy is current.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SliceTexture {
    width: usize,
    height: usize,
    rgba: Vec<u8>,
    generation: u64,
}

impl SliceTexture {
    /// Creates an empty texture.
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces the texture content.
    pub fn update(&mut self, width: usize, height: usize, rgba: Vec<u8>) {
        debug_assert_eq!(rgba.len(), width * height * 4);
        self.width = width;
        self.height = height;
        self.rgba = rgba;
        self.generation += 1;
    }

    /// Width in pixels.
    pub fn width(&self) -> usize {
        self.width
    }

    /// Height in pixels.
    pub fn height(&self) -> usize {
        self.height
    }

    /// Packed RGBA8 pixels, row-major.
    pub fn rgba(&self) -> &[u8] {
        &self.rgba
    }

    /// Number of content changes so far.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Returns true if no content has been uploaded yet.
    pub fn is_empty(&self) -> bool {
        self.rgba.is_empty()
    }

    /// Returns the RGBA value of one pixel.
    pub fn pixel(&self, x: usize, y: usize) -> Option<[u8; 4]> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let i = (y * self.width + x) * 4;
        self.rgba.get(i..i + 4).map(|p| [p[0], p[1], p[2], p[3]])
    }
}
