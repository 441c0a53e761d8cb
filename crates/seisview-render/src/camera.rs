//! Turntable camera and view management.
//!
//! The camera orbits a pivot point with Z as the world up axis. Its whole
//! interactive state is the small [`CameraState`] value; every operation is a
//! pure function of the previous state and the input delta, so a sequence of
//! pointer events can be replayed exactly.

use glam::{Mat4, Vec2, Vec3, Vec4};
use seisview_core::InteractionOptions;

/// Camera projection mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ProjectionMode {
    /// Perspective projection.
    #[default]
    Perspective,
    /// Orthographic projection.
    Orthographic,
}

/// The replayable part of the camera.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CameraState {
    /// Orbit pivot in world space.
    pub center: Vec3,
    /// Rotation about the world Z axis, degrees in `[0, 360)`.
    pub azimuth: f32,
    /// Angle above the XY plane, degrees.
    pub elevation: f32,
    /// Distance from the pivot to the eye.
    pub distance: f32,
    /// Vertical field of view, degrees.
    pub fov: f32,
}

impl Default for CameraState {
    fn default() -> Self {
        Self {
            center: Vec3::ZERO,
            azimuth: 30.0,
            elevation: 30.0,
            distance: 5.0,
            fov: 45.0,
        }
    }
}

impl CameraState {
    /// Unit vector from the pivot towards the eye.
    pub fn eye_direction(&self) -> Vec3 {
        let (sin_az, cos_az) = self.azimuth.to_radians().sin_cos();
        let (sin_el, cos_el) = self.elevation.to_radians().sin_cos();
        Vec3::new(cos_el * sin_az, -cos_el * cos_az, sin_el)
    }

    /// Eye position in world space.
    pub fn eye(&self) -> Vec3 {
        self.center + self.eye_direction() * self.distance
    }

    /// Orbits by a pointer delta in pixels.
    #[must_use]
    pub fn rotated(self, delta: Vec2, degrees_per_pixel: f32, elevation_limit: f32) -> Self {
        Self {
            azimuth: (self.azimuth - delta.x * degrees_per_pixel).rem_euclid(360.0),
            elevation: (self.elevation + delta.y * degrees_per_pixel)
                .clamp(-elevation_limit, elevation_limit),
            ..self
        }
    }

    /// Scales the distance to the pivot.
    #[must_use]
    pub fn zoomed(self, factor: f32, min_distance: f32) -> Self {
        Self {
            distance: (self.distance * factor).max(min_distance),
            ..self
        }
    }

    /// Moves the pivot by a world-space offset.
    #[must_use]
    pub fn panned(self, offset: Vec3) -> Self {
        Self {
            center: self.center + offset,
            ..self
        }
    }
}

/// A 3D camera for viewing the scene.
#[derive(Debug, Clone)]
pub struct Camera {
    state: CameraState,
    initial: CameraState,
    /// Viewport size in pixels.
    viewport: (u32, u32),
    /// Near clipping plane.
    pub near: f32,
    /// Far clipping plane.
    pub far: f32,
    /// Projection mode.
    pub projection_mode: ProjectionMode,
    /// Pointer sensitivities and limits.
    pub interaction: InteractionOptions,
}

impl Camera {
    /// Creates a camera for a viewport of the given pixel size.
    pub fn new(width: u32, height: u32) -> Self {
        Self::with_state(width, height, CameraState::default())
    }

    /// Creates a camera whose current and reset state is `state`.
    pub fn with_state(width: u32, height: u32, state: CameraState) -> Self {
        Self {
            state,
            initial: state,
            viewport: (width.max(1), height.max(1)),
            near: 0.01,
            far: 1000.0,
            projection_mode: ProjectionMode::Perspective,
            interaction: InteractionOptions::default(),
        }
    }

    /// Returns the current state.
    pub fn state(&self) -> CameraState {
        self.state
    }

    /// Replaces the current state without touching the reset state.
    pub fn set_state(&mut self, state: CameraState) {
        self.state = state;
    }

    /// Returns the state restored by [`Camera::reset`].
    pub fn initial_state(&self) -> CameraState {
        self.initial
    }

    /// Stores the state restored by [`Camera::reset`].
    pub fn set_initial(&mut self, state: CameraState) {
        self.initial = state;
    }

    /// Restores the stored initial state.
    pub fn reset(&mut self) {
        self.state = self.initial;
    }

    /// Returns the viewport size in pixels.
    pub fn viewport(&self) -> (u32, u32) {
        self.viewport
    }

    /// Sets the viewport size in pixels.
    pub fn set_viewport(&mut self, width: u32, height: u32) {
        self.viewport = (width.max(1), height.max(1));
    }

    /// Width over height.
    pub fn aspect_ratio(&self) -> f32 {
        self.viewport.0 as f32 / self.viewport.1 as f32
    }

    /// Orbits by a pointer delta in pixels.
    pub fn rotate(&mut self, delta: Vec2) {
        self.state = self.state.rotated(
            delta,
            self.interaction.rotate_speed,
            self.interaction.elevation_limit,
        );
    }

    /// Zooms from a secondary-button vertical drag in pixels (down zooms out).
    pub fn zoom_drag(&mut self, delta_y: f32) {
        self.zoom((delta_y * self.interaction.zoom_speed).exp());
    }

    /// Zooms from wheel notches (positive zooms in).
    pub fn wheel(&mut self, notches: f32) {
        self.zoom(self.interaction.wheel_zoom_factor.powf(-notches));
    }

    /// Multiplies the eye distance by `factor`.
    pub fn zoom(&mut self, factor: f32) {
        self.state = self.state.zoomed(factor, self.interaction.min_distance);
    }

    /// Translates the pivot so the scene follows a pointer delta in pixels.
    pub fn pan(&mut self, delta: Vec2) {
        let pixel = self.pixel_size_at(self.state.center);
        let offset = (-self.right() * delta.x + self.up() * delta.y) * pixel;
        self.state = self.state.panned(offset);
    }

    /// Eye position in world space.
    pub fn eye(&self) -> Vec3 {
        self.state.eye()
    }

    /// Returns the camera's forward direction.
    pub fn forward(&self) -> Vec3 {
        -self.state.eye_direction()
    }

    /// Returns the camera's right direction.
    pub fn right(&self) -> Vec3 {
        self.forward().cross(Vec3::Z).normalize_or(Vec3::X)
    }

    /// Returns the camera's screen-up direction.
    pub fn up(&self) -> Vec3 {
        self.right().cross(self.forward())
    }

    /// Returns the view matrix.
    pub fn view_matrix(&self) -> Mat4 {
        Mat4::look_at_rh(self.eye(), self.state.center, Vec3::Z)
    }

    /// Returns the projection matrix (depth range `[0, 1]`).
    pub fn projection_matrix(&self) -> Mat4 {
        let fov = self.state.fov.to_radians();
        match self.projection_mode {
            ProjectionMode::Perspective => {
                Mat4::perspective_rh(fov, self.aspect_ratio(), self.near, self.far)
            }
            ProjectionMode::Orthographic => {
                let half_height = self.state.distance * (fov * 0.5).tan();
                let half_width = half_height * self.aspect_ratio();
                Mat4::orthographic_rh(
                    -half_width,
                    half_width,
                    -half_height,
                    half_height,
                    self.near,
                    self.far,
                )
            }
        }
    }

    /// Returns the combined view-projection matrix.
    pub fn view_projection_matrix(&self) -> Mat4 {
        self.projection_matrix() * self.view_matrix()
    }

    /// Size in world units of one pixel at the depth of `point`.
    pub fn pixel_size_at(&self, point: Vec3) -> f32 {
        let depth = match self.projection_mode {
            ProjectionMode::Perspective => (point - self.eye()).dot(self.forward()).max(self.near),
            ProjectionMode::Orthographic => self.state.distance,
        };
        2.0 * depth * (self.state.fov.to_radians() * 0.5).tan() / self.viewport.1 as f32
    }

    /// Projects a world point to pixel coordinates (y down) and depth in `[0, 1]`.
    ///
    /// Returns `None` for points behind the eye.
    pub fn project(&self, point: Vec3) -> Option<Vec3> {
        let clip = self.view_projection_matrix() * point.extend(1.0);
        if clip.w <= f32::EPSILON {
            return None;
        }
        let ndc = clip.truncate() / clip.w;
        Some(self.ndc_to_screen(ndc))
    }

    /// Converts normalized device coordinates to pixels, keeping depth.
    pub fn ndc_to_screen(&self, ndc: Vec3) -> Vec3 {
        let (w, h) = (self.viewport.0 as f32, self.viewport.1 as f32);
        Vec3::new((ndc.x + 1.0) * 0.5 * w, (1.0 - ndc.y) * 0.5 * h, ndc.z)
    }

    /// Converts pixel coordinates to normalized device x/y.
    pub fn screen_to_ndc(&self, screen: Vec2) -> Vec2 {
        let (w, h) = (self.viewport.0 as f32, self.viewport.1 as f32);
        Vec2::new(screen.x / w * 2.0 - 1.0, 1.0 - screen.y / h * 2.0)
    }

    /// Returns the world-space ray through a pixel as `(origin, direction)`.
    pub fn screen_ray(&self, screen: Vec2) -> Option<(Vec3, Vec3)> {
        let ndc = self.screen_to_ndc(screen);
        let inv = self.view_projection_matrix().inverse();
        let near = inv * Vec4::new(ndc.x, ndc.y, 0.0, 1.0);
        let far = inv * Vec4::new(ndc.x, ndc.y, 1.0, 1.0);
        if near.w.abs() < 1e-6 || far.w.abs() < 1e-6 {
            return None;
        }
        let origin = near.truncate() / near.w;
        let direction = (far.truncate() / far.w - origin).normalize_or_zero();
        if direction == Vec3::ZERO {
            return None;
        }
        Some((origin, direction))
    }

    /// Frames an axis-aligned box and makes the result the reset state.
    pub fn look_at_box(&mut self, min: Vec3, max: Vec3) {
        let size = (max - min).length().max(self.interaction.min_distance);
        let state = CameraState {
            center: (min + max) * 0.5,
            distance: size * 1.5,
            ..self.initial
        };
        self.near = size * 0.001;
        self.far = size * 100.0;
        self.state = state;
        self.initial = state;
    }
}

impl Default for Camera {
    fn default() -> Self {
        Self::new(1280, 720)
    }
}
