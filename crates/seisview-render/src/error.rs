//! Rendering error types.

use thiserror::Error;

/// Errors that can occur during rendering operations.
#[derive(Error, Debug)]
pub enum RenderError {
    /// Failed to create wgpu adapter.
    #[error("failed to create graphics adapter")]
    AdapterCreationFailed,

    /// Failed to create wgpu device.
    #[error("failed to create graphics device: {0}")]
    DeviceCreationFailed(#[from] wgpu::RequestDeviceError),

    /// Mapping a readback buffer failed.
    #[error("buffer map failed: {0}")]
    BufferMapFailed(#[from] wgpu::BufferAsyncError),

    /// The GPU did not finish in time or the readback channel closed.
    #[error("timeout waiting for GPU")]
    Timeout,

    /// A read fell outside the render target.
    #[error("pixel ({x}, {y}) outside {width}x{height} target")]
    OutOfBounds { x: u32, y: u32, width: u32, height: u32 },
}

/// A specialized Result type for rendering operations.
pub type RenderResult<T> = std::result::Result<T, RenderError>;

impl From<RenderError> for seisview_core::SeisviewError {
    fn from(err: RenderError) -> Self {
        seisview_core::SeisviewError::Render(err.to_string())
    }
}
