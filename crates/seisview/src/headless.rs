//! GPU resources that do not need a window.

use pollster::FutureExt;
use seisview_core::Result;
use seisview_render::WgpuPickPass;

/// Creates a wgpu pick pass on its own headless device.
///
/// Fails when no adapter is available (for example on CI machines without a
/// GPU or software rasterizer); callers can fall back to
/// [`CpuPickPass`](seisview_render::CpuPickPass).
pub fn gpu_pick_pass(width: u32, height: u32) -> Result<WgpuPickPass> {
    let pass = WgpuPickPass::new_headless(width, height).block_on()?;
    log::info!("using GPU pick pass ({width}x{height})");
    Ok(pass)
}
