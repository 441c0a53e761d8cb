//! Draw-call interface between scenes and a rendering backend.

use glam::{Vec2, Vec3, Vec4};

use crate::camera::Camera;
use crate::error::RenderResult;
use crate::texture::SliceTexture;

/// A textured slice quad.
#[derive(Debug, Clone, Copy)]
pub struct SliceDraw<'a> {
    pub name: &'a str,
    /// World-space corners in winding order; texture `(0, 0)` maps to `corners[0]`.
    pub corners: [Vec3; 4],
    pub texture: &'a SliceTexture,
    pub highlighted: bool,
    /// The texture shows a drag preview rather than committed data.
    pub preview: bool,
}

/// A line segment in world space, or in pixels for overlays.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LineSegment {
    pub start: Vec3,
    pub end: Vec3,
    pub color: Vec4,
    /// Width in pixels.
    pub width: f32,
    /// `start`/`end` x and y are pixel coordinates drawn over the scene.
    pub screen_space: bool,
}

/// A filled screen-space disc.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DiscDraw {
    pub center: Vec2,
    pub radius: f32,
    pub color: Vec4,
}

/// Receives the visible content of one frame.
///
/// A frame is `begin_frame`, any number of draws, then `end_frame`.
pub trait FrameRenderer {
    fn begin_frame(&mut self, camera: &Camera, background: Vec3) -> RenderResult<()>;
    fn draw_slice(&mut self, slice: &SliceDraw<'_>) -> RenderResult<()>;
    fn draw_lines(&mut self, lines: &[LineSegment]) -> RenderResult<()>;
    fn draw_disc(&mut self, disc: &DiscDraw) -> RenderResult<()>;
    fn end_frame(&mut self) -> RenderResult<()>;
}

/// Summary of one slice draw kept by [`RecordingRenderer`].
#[derive(Debug, Clone, PartialEq)]
pub struct RecordedSlice {
    pub name: String,
    pub corners: [Vec3; 4],
    pub texture_size: (usize, usize),
    pub generation: u64,
    pub highlighted: bool,
    pub preview: bool,
}

/// Everything drawn between one `begin_frame` and `end_frame`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RecordedFrame {
    pub background: Vec3,
    pub viewport: (u32, u32),
    pub slices: Vec<RecordedSlice>,
    pub lines: Vec<LineSegment>,
    pub discs: Vec<DiscDraw>,
}

/// A renderer that records draw calls instead of rasterizing them.
///
/// Used for headless runs and to inspect what a scene submits.
#[derive(Debug, Default)]
pub struct RecordingRenderer {
    current: Option<RecordedFrame>,
    frames: Vec<RecordedFrame>,
}

impl RecordingRenderer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Completed frames, oldest first.
    pub fn frames(&self) -> &[RecordedFrame] {
        &self.frames
    }

    /// The most recently completed frame.
    pub fn last_frame(&self) -> Option<&RecordedFrame> {
        self.frames.last()
    }

    fn current(&mut self) -> &mut RecordedFrame {
        self.current.get_or_insert_with(RecordedFrame::default)
    }
}

impl FrameRenderer for RecordingRenderer {
    fn begin_frame(&mut self, camera: &Camera, background: Vec3) -> RenderResult<()> {
        self.current = Some(RecordedFrame {
            background,
            viewport: camera.viewport(),
            ..RecordedFrame::default()
        });
        Ok(())
    }

    fn draw_slice(&mut self, slice: &SliceDraw<'_>) -> RenderResult<()> {
        let recorded = RecordedSlice {
            name: slice.name.to_string(),
            corners: slice.corners,
            texture_size: (slice.texture.width(), slice.texture.height()),
            generation: slice.texture.generation(),
            highlighted: slice.highlighted,
            preview: slice.preview,
        };
        self.current().slices.push(recorded);
        Ok(())
    }

    fn draw_lines(&mut self, lines: &[LineSegment]) -> RenderResult<()> {
        self.current().lines.extend_from_slice(lines);
        Ok(())
    }

    fn draw_disc(&mut self, disc: &DiscDraw) -> RenderResult<()> {
        self.current().discs.push(*disc);
        Ok(())
    }

    fn end_frame(&mut self) -> RenderResult<()> {
        if let Some(frame) = self.current.take() {
            self.frames.push(frame);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_recording_renderer_collects_frame() {
        let camera = Camera::new(64, 32);
        let mut texture = SliceTexture::new();
        texture.update(2, 1, vec![0; 8]);
        let mut renderer = RecordingRenderer::new();

        renderer.begin_frame(&camera, Vec3::ONE).unwrap();
        renderer
            .draw_slice(&SliceDraw {
                name: "z",
                corners: [Vec3::ZERO; 4],
                texture: &texture,
                highlighted: true,
                preview: false,
            })
            .unwrap();
        renderer
            .draw_disc(&DiscDraw {
                center: Vec2::new(4.0, 4.0),
                radius: 3.0,
                color: Vec4::ONE,
            })
            .unwrap();
        renderer.end_frame().unwrap();

        let frame = renderer.last_frame().unwrap();
        assert_eq!(frame.viewport, (64, 32));
        assert_eq!(frame.slices.len(), 1);
        assert_eq!(frame.slices[0].texture_size, (2, 1));
        assert!(frame.slices[0].highlighted);
        assert_eq!(frame.discs.len(), 1);
        assert!(frame.lines.is_empty());
    }
}
