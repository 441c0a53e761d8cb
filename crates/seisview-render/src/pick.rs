//! Id-buffer rendering for entity picking.
//!
//! The id-buffer is an offscreen target where each pickable entity is drawn
//! flat-shaded in a colour that encodes its [`PickId`], with depth testing so
//! the nearest entity wins. Reading back the pixel under the cursor and
//! decoding it tells us what was clicked, with exact occlusion and no CPU
//! ray/geometry tests. When two entities land at exactly the same depth the
//! lowest pick id wins.

use glam::{Vec2, Vec3, Vec4};
use seisview_core::PickId;

use crate::camera::Camera;
use crate::error::{RenderError, RenderResult};

/// Number of segments used to tessellate screen-space discs.
const DISC_SEGMENTS: usize = 32;

/// Geometry an entity occupies in the id-buffer.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PickShape {
    /// A planar quad in world space, corners in winding order.
    WorldQuad([Vec3; 4]),
    /// A filled disc in pixel coordinates, drawn in front of all world geometry.
    ScreenDisc { center: Vec2, radius: f32 },
}

/// One entity's contribution to the pick pass.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PickPrimitive {
    pub id: PickId,
    pub shape: PickShape,
}

/// Tessellates a shape into clip-space triangles, clipped against the near plane.
pub fn clip_space_triangles(camera: &Camera, shape: &PickShape) -> Vec<[Vec4; 3]> {
    match *shape {
        PickShape::WorldQuad(corners) => {
            let view_proj = camera.view_projection_matrix();
            let polygon: Vec<Vec4> = corners.iter().map(|c| view_proj * c.extend(1.0)).collect();
            fan(&clip_near(&polygon))
        }
        PickShape::ScreenDisc { center, radius } => {
            let ring: Vec<Vec4> = (0..DISC_SEGMENTS)
                .map(|i| {
                    let angle = i as f32 / DISC_SEGMENTS as f32 * std::f32::consts::TAU;
                    let p = center + Vec2::new(angle.cos(), angle.sin()) * radius;
                    camera.screen_to_ndc(p).extend(0.0).extend(1.0)
                })
                .collect();
            fan(&ring)
        }
    }
}

/// Keeps the part of a clip-space polygon with `z >= 0` (in front of the near plane).
fn clip_near(polygon: &[Vec4]) -> Vec<Vec4> {
    let mut out = Vec::with_capacity(polygon.len() + 2);
    for (i, &cur) in polygon.iter().enumerate() {
        let next = polygon[(i + 1) % polygon.len()];
        let (cur_in, next_in) = (cur.z >= 0.0, next.z >= 0.0);
        if cur_in {
            out.push(cur);
        }
        if cur_in != next_in {
            let t = cur.z / (cur.z - next.z);
            out.push(cur.lerp(next, t));
        }
    }
    out
}

fn fan(polygon: &[Vec4]) -> Vec<[Vec4; 3]> {
    if polygon.len() < 3 {
        return Vec::new();
    }
    (1..polygon.len() - 1)
        .map(|i| [polygon[0], polygon[i], polygon[i + 1]])
        .collect()
}

/// A full readback of the id-buffer. 0 marks background.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IdBuffer {
    width: u32,
    height: u32,
    ids: Vec<u32>,
}

impl IdBuffer {
    /// Creates a buffer cleared to background.
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            ids: vec![0; width as usize * height as usize],
        }
    }

    /// Creates a buffer from raw ids, row-major.
    pub fn from_ids(width: u32, height: u32, ids: Vec<u32>) -> Self {
        debug_assert_eq!(ids.len(), width as usize * height as usize);
        Self { width, height, ids }
    }

    /// Width in pixels.
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Height in pixels.
    pub fn height(&self) -> u32 {
        self.height
    }

    /// Raw ids, row-major.
    pub fn ids(&self) -> &[u32] {
        &self.ids
    }

    /// Returns the id at a pixel, or 0 outside the buffer.
    pub fn id_at(&self, x: u32, y: u32) -> u32 {
        if x >= self.width || y >= self.height {
            return 0;
        }
        self.ids[y as usize * self.width as usize + x as usize]
    }

    /// Copies the square neighbourhood of `(x, y)` with the given radius.
    pub fn region(&self, x: u32, y: u32, radius: u32) -> RenderResult<IdRegion> {
        let bounds = RegionBounds::new(x, y, radius, self.width, self.height)?;
        let mut ids = Vec::with_capacity(bounds.width as usize * bounds.height as usize);
        for ry in bounds.y0..bounds.y0 + bounds.height {
            for rx in bounds.x0..bounds.x0 + bounds.width {
                ids.push(self.id_at(rx, ry));
            }
        }
        Ok(bounds.into_region(x, y, ids))
    }
}

/// Pixel rectangle of a neighbourhood read, clipped to the target.
#[derive(Debug, Clone, Copy)]
pub(crate) struct RegionBounds {
    pub x0: u32,
    pub y0: u32,
    pub width: u32,
    pub height: u32,
}

impl RegionBounds {
    pub(crate) fn new(
        x: u32,
        y: u32,
        radius: u32,
        width: u32,
        height: u32,
    ) -> RenderResult<Self> {
        if x >= width || y >= height {
            return Err(RenderError::OutOfBounds {
                x,
                y,
                width,
                height,
            });
        }
        let x0 = x.saturating_sub(radius);
        let y0 = y.saturating_sub(radius);
        let x1 = x.saturating_add(radius).min(width - 1);
        let y1 = y.saturating_add(radius).min(height - 1);
        Ok(Self {
            x0,
            y0,
            width: x1 - x0 + 1,
            height: y1 - y0 + 1,
        })
    }

    pub(crate) fn into_region(self, center_x: u32, center_y: u32, ids: Vec<u32>) -> IdRegion {
        IdRegion {
            x0: self.x0,
            y0: self.y0,
            width: self.width,
            height: self.height,
            center: (center_x, center_y),
            ids,
        }
    }
}

/// A neighbourhood of id-buffer pixels around a query point.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IdRegion {
    pub x0: u32,
    pub y0: u32,
    pub width: u32,
    pub height: u32,
    /// The queried pixel, in buffer coordinates.
    pub center: (u32, u32),
    pub ids: Vec<u32>,
}

impl IdRegion {
    /// Returns the id at a pixel in buffer coordinates, or 0 outside the region.
    pub fn id_at(&self, x: u32, y: u32) -> u32 {
        if x < self.x0 || y < self.y0 || x >= self.x0 + self.width || y >= self.y0 + self.height {
            return 0;
        }
        self.ids[((y - self.y0) * self.width + (x - self.x0)) as usize]
    }

    /// The hit closest to the centre: the centre pixel if it is a hit, otherwise
    /// the lowest id on the nearest ring that has any hit.
    pub fn nearest_hit(&self) -> Option<u32> {
        let (cx, cy) = (i64::from(self.center.0), i64::from(self.center.1));
        let max_ring = i64::from(self.width.max(self.height));
        for ring in 0..=max_ring {
            let mut best: Option<u32> = None;
            for dy in -ring..=ring {
                for dx in -ring..=ring {
                    if dx.abs().max(dy.abs()) != ring {
                        continue;
                    }
                    let (x, y) = (cx + dx, cy + dy);
                    if x < 0 || y < 0 {
                        continue;
                    }
                    let id = self.id_at(x as u32, y as u32);
                    if id != 0 && best.map_or(true, |b| id < b) {
                        best = Some(id);
                    }
                }
            }
            if best.is_some() {
                return best;
            }
        }
        None
    }
}

/// An offscreen pass that renders pick ids and reads them back.
///
/// Implementations exist for the CPU ([`CpuPickPass`]) and for wgpu
/// ([`crate::WgpuPickPass`]).
pub trait PickPass {
    /// Resizes the offscreen target.
    fn resize(&mut self, width: u32, height: u32);

    /// Returns the target size in pixels.
    fn size(&self) -> (u32, u32);

    /// Clears the target and draws every primitive with depth testing.
    fn render(&mut self, camera: &Camera, primitives: &[PickPrimitive]) -> RenderResult<()>;

    /// Reads the square neighbourhood of a pixel.
    fn read_region(&self, x: u32, y: u32, radius: u32) -> RenderResult<IdRegion>;

    /// Reads the whole target.
    fn read_buffer(&self) -> RenderResult<IdBuffer>;
}

/// A software rasterizer implementation of the pick pass.
///
/// Samples pixel centres and interpolates depth linearly in screen space, which
/// matches what a GPU does for `z / w`.
#[derive(Debug, Clone)]
pub struct CpuPickPass {
    buffer: IdBuffer,
    depth: Vec<f32>,
}

impl CpuPickPass {
    /// Creates a pass with a target of the given size.
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            buffer: IdBuffer::new(width, height),
            depth: vec![1.0; width as usize * height as usize],
        }
    }

    /// Returns the last rendered buffer without copying.
    pub fn id_buffer(&self) -> &IdBuffer {
        &self.buffer
    }

    fn clear(&mut self) {
        self.buffer.ids.fill(0);
        self.depth.fill(1.0);
    }

    fn write(&mut self, x: u32, y: u32, depth: f32, id: u32) {
        let i = y as usize * self.buffer.width as usize + x as usize;
        let (cur_depth, cur_id) = (self.depth[i], self.buffer.ids[i]);
        if depth < cur_depth || (depth == cur_depth && (cur_id == 0 || id < cur_id)) {
            self.depth[i] = depth;
            self.buffer.ids[i] = id;
        }
    }

    fn rasterize(&mut self, camera: &Camera, triangle: &[Vec4; 3], id: u32) {
        let s = triangle.map(|v| camera.ndc_to_screen(v.truncate() / v.w));
        let area = edge(s[0], s[1], s[2]);
        if area.abs() < 1e-12 {
            return;
        }
        let sign = area.signum();

        let (w, h) = (self.buffer.width as f32, self.buffer.height as f32);
        let min_x = s.iter().map(|p| p.x).fold(f32::INFINITY, f32::min);
        let max_x = s.iter().map(|p| p.x).fold(f32::NEG_INFINITY, f32::max);
        let min_y = s.iter().map(|p| p.y).fold(f32::INFINITY, f32::min);
        let max_y = s.iter().map(|p| p.y).fold(f32::NEG_INFINITY, f32::max);
        if max_x < 0.0 || max_y < 0.0 || min_x >= w || min_y >= h {
            return;
        }
        let x0 = (min_x - 0.5).floor().max(0.0) as u32;
        let y0 = (min_y - 0.5).floor().max(0.0) as u32;
        let x1 = (max_x.ceil() as u32).min(self.buffer.width - 1);
        let y1 = (max_y.ceil() as u32).min(self.buffer.height - 1);

        for py in y0..=y1 {
            for px in x0..=x1 {
                let p = Vec3::new(px as f32 + 0.5, py as f32 + 0.5, 0.0);
                let b0 = edge(s[1], s[2], p) * sign;
                let b1 = edge(s[2], s[0], p) * sign;
                let b2 = edge(s[0], s[1], p) * sign;
                if b0 < 0.0 || b1 < 0.0 || b2 < 0.0 {
                    continue;
                }
                let depth = (b0 * s[0].z + b1 * s[1].z + b2 * s[2].z) / area.abs();
                if !(0.0..=1.0).contains(&depth) {
                    continue;
                }
                self.write(px, py, depth, id);
            }
        }
    }
}

/// Twice the signed area of `(a, b, p)` in the screen plane.
fn edge(a: Vec3, b: Vec3, p: Vec3) -> f32 {
    (b.x - a.x) * (p.y - a.y) - (b.y - a.y) * (p.x - a.x)
}

impl PickPass for CpuPickPass {
    fn resize(&mut self, width: u32, height: u32) {
        if (width, height) != self.size() {
            *self = Self::new(width, height);
        }
    }

    fn size(&self) -> (u32, u32) {
        (self.buffer.width, self.buffer.height)
    }

    fn render(&mut self, camera: &Camera, primitives: &[PickPrimitive]) -> RenderResult<()> {
        let (w, h) = camera.viewport();
        self.resize(w, h);
        self.clear();
        for primitive in primitives {
            for triangle in clip_space_triangles(camera, &primitive.shape) {
                self.rasterize(camera, &triangle, primitive.id.get());
            }
        }
        Ok(())
    }

    fn read_region(&self, x: u32, y: u32, radius: u32) -> RenderResult<IdRegion> {
        self.buffer.region(x, y, radius)
    }

    fn read_buffer(&self) -> RenderResult<IdBuffer> {
        Ok(self.buffer.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::camera::CameraState;

    fn id(raw: u32) -> PickId {
        PickId::new(raw).unwrap()
    }

    /// Looks straight down -Y at the origin.
    fn front_camera() -> Camera {
        Camera::with_state(
            200,
            200,
            CameraState {
                center: Vec3::ZERO,
                azimuth: 0.0,
                elevation: 0.0,
                distance: 10.0,
                fov: 45.0,
            },
        )
    }

    /// Square in the XZ plane at the given y, half-size `r`.
    fn quad_at_y(y: f32, r: f32) -> PickShape {
        PickShape::WorldQuad([
            Vec3::new(-r, y, -r),
            Vec3::new(r, y, -r),
            Vec3::new(r, y, r),
            Vec3::new(-r, y, r),
        ])
    }

    #[test]
    fn test_single_quad_covers_center_only() {
        let camera = front_camera();
        let mut pass = CpuPickPass::new(200, 200);
        pass.render(
            &camera,
            &[PickPrimitive {
                id: id(7),
                shape: quad_at_y(0.0, 1.0),
            }],
        )
        .unwrap();
        let buffer = pass.read_buffer().unwrap();
        assert_eq!(buffer.id_at(100, 100), 7);
        assert_eq!(buffer.id_at(2, 2), 0);
    }

    #[test]
    fn test_nearer_quad_wins_regardless_of_order() {
        let camera = front_camera();
        // The eye sits at -Y, so smaller y is nearer.
        let near = PickPrimitive {
            id: id(9),
            shape: quad_at_y(-2.0, 1.0),
        };
        let far = PickPrimitive {
            id: id(3),
            shape: quad_at_y(2.0, 3.0),
        };
        for order in [[near, far], [far, near]] {
            let mut pass = CpuPickPass::new(200, 200);
            pass.render(&camera, &order).unwrap();
            assert_eq!(pass.id_buffer().id_at(100, 100), 9);
        }
    }

    #[test]
    fn test_equal_depth_lowest_id_wins() {
        let camera = front_camera();
        let a = PickPrimitive {
            id: id(12),
            shape: quad_at_y(0.0, 1.0),
        };
        let b = PickPrimitive {
            id: id(5),
            shape: quad_at_y(0.0, 1.0),
        };
        for order in [[a, b], [b, a]] {
            let mut pass = CpuPickPass::new(200, 200);
            pass.render(&camera, &order).unwrap();
            assert_eq!(pass.id_buffer().id_at(100, 100), 5);
        }
    }

    #[test]
    fn test_screen_disc_in_front_of_world() {
        let camera = front_camera();
        let mut pass = CpuPickPass::new(200, 200);
        pass.render(
            &camera,
            &[
                PickPrimitive {
                    id: id(1),
                    shape: quad_at_y(-5.0, 50.0),
                },
                PickPrimitive {
                    id: id(2),
                    shape: PickShape::ScreenDisc {
                        center: Vec2::new(50.0, 50.0),
                        radius: 10.0,
                    },
                },
            ],
        )
        .unwrap();
        assert_eq!(pass.id_buffer().id_at(50, 50), 2);
        assert_eq!(pass.id_buffer().id_at(150, 150), 1);
    }

    #[test]
    fn test_quad_crossing_eye_is_clipped() {
        let camera = front_camera();
        // A floor quad reaching behind the eye still rasterizes its visible part.
        let floor = PickShape::WorldQuad([
            Vec3::new(-5.0, -50.0, -1.0),
            Vec3::new(5.0, -50.0, -1.0),
            Vec3::new(5.0, 50.0, -1.0),
            Vec3::new(-5.0, 50.0, -1.0),
        ]);
        let triangles = clip_space_triangles(&camera, &floor);
        assert!(!triangles.is_empty());
        for tri in &triangles {
            for v in tri {
                assert!(v.z >= -1e-4);
            }
        }
        let mut pass = CpuPickPass::new(200, 200);
        pass.render(&camera, &[PickPrimitive { id: id(4), shape: floor }])
            .unwrap();
        assert_eq!(pass.id_buffer().id_at(100, 150), 4);
    }

    #[test]
    fn test_region_nearest_hit() {
        let mut ids = vec![0; 25];
        ids[0] = 8; // (0, 0): ring 2 from centre
        ids[3 * 5 + 3] = 6; // (3, 3): ring 1
        ids[5 + 3] = 4; // (3, 1): ring 1
        let buffer = IdBuffer::from_ids(5, 5, ids);
        assert_eq!(buffer.region(2, 2, 2).unwrap().nearest_hit(), Some(4));
        assert_eq!(buffer.region(2, 2, 0).unwrap().nearest_hit(), None);
        assert_eq!(buffer.region(0, 0, 0).unwrap().nearest_hit(), Some(8));
        assert!(matches!(
            buffer.region(5, 0, 1),
            Err(RenderError::OutOfBounds { .. })
        ));
    }
}
