//! Orbit camera used for 3D views.
//!
//! The camera orbits the transform origin (the midpoint of the three axis
//! ranges). Angles are in degrees.

use glam::{Mat4, Vec3};

/// Elevation envelope applied when bounds checking is enabled.
///
/// Keeps the camera off the poles, where the view would flip handedness.
pub const ELEVATION_LIMIT: f32 = 89.0;

/// Hard elevation clamp applied regardless of bounds checking.
const ELEVATION_HARD_LIMIT: f32 = 90.0;

const DEFAULT_DISTANCE: f32 = 5.0;

/// Projection model.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Default)]
pub enum Projection {
    #[default]
    Orthographic,
    Perspective,
}

/// Orbit-style camera: azimuth/elevation/distance around a pivot.
#[derive(Debug, Clone, PartialEq)]
pub struct OrbitCamera {
    azimuth: f32,
    elevation: f32,
    distance: f32,
    projection: Projection,
    bounds_check: bool,

    field_of_view: f32,
    near: f32,
    far: f32,
    scale: Vec3,
}

impl Default for OrbitCamera {
    fn default() -> Self {
        Self::new(45.0, 0.1, 100.0)
    }
}

impl OrbitCamera {
    /// Creates a camera with the given vertical field of view (degrees) and
    /// clipping planes. Starts orthographic, looking down -Z.
    pub fn new(field_of_view: f32, near: f32, far: f32) -> Self {
        Self {
            azimuth: 0.0,
            elevation: 0.0,
            distance: DEFAULT_DISTANCE,
            projection: Projection::Orthographic,
            bounds_check: false,
            field_of_view,
            near,
            far,
            scale: Vec3::ONE,
        }
    }

    // ── angles ────────────────────────────────────────────────────────────

    #[inline]
    pub fn azimuth(&self) -> f32 {
        self.azimuth
    }

    #[inline]
    pub fn elevation(&self) -> f32 {
        self.elevation
    }

    /// Sets the azimuth, wrapping into `[-180, 180)`.
    pub fn set_azimuth(&mut self, azimuth: f32) {
        if !azimuth.is_finite() {
            return;
        }
        self.azimuth = (azimuth + 180.0).rem_euclid(360.0) - 180.0;
    }

    pub fn change_azimuth(&mut self, delta: f32) {
        self.set_azimuth(self.azimuth + delta);
    }

    /// Sets the elevation, clamping (never wrapping) to the active envelope.
    pub fn set_elevation(&mut self, elevation: f32) {
        if !elevation.is_finite() {
            return;
        }
        let limit = self.elevation_limit();
        self.elevation = elevation.clamp(-limit, limit);
    }

    pub fn change_elevation(&mut self, delta: f32) {
        self.set_elevation(self.elevation + delta);
    }

    /// Current elevation envelope, in degrees either side of the horizon.
    #[inline]
    pub fn elevation_limit(&self) -> f32 {
        if self.bounds_check { ELEVATION_LIMIT } else { ELEVATION_HARD_LIMIT }
    }

    #[inline]
    pub fn bounds_check(&self) -> bool {
        self.bounds_check
    }

    /// Enables or disables the elevation envelope. Enabling re-clamps the
    /// current elevation.
    pub fn set_bounds_check(&mut self, enabled: bool) {
        self.bounds_check = enabled;
        self.set_elevation(self.elevation);
    }

    // ── distance / projection ─────────────────────────────────────────────

    #[inline]
    pub fn distance(&self) -> f32 {
        self.distance
    }

    pub fn set_distance(&mut self, distance: f32) {
        if distance.is_finite() && distance > 0.0 {
            self.distance = distance;
        }
    }

    #[inline]
    pub fn projection(&self) -> Projection {
        self.projection
    }

    #[inline]
    pub fn is_orthographic(&self) -> bool {
        self.projection == Projection::Orthographic
    }

    pub fn use_orthographic(&mut self) {
        self.projection = Projection::Orthographic;
    }

    pub fn use_perspective(&mut self) {
        self.projection = Projection::Perspective;
    }

    #[inline]
    pub fn field_of_view(&self) -> f32 {
        self.field_of_view
    }

    pub fn set_field_of_view(&mut self, degrees: f32) {
        self.field_of_view = degrees.clamp(1.0, 179.0);
    }

    #[inline]
    pub fn clipping_planes(&self) -> (f32, f32) {
        (self.near, self.far)
    }

    #[inline]
    pub fn scale(&self) -> Vec3 {
        self.scale
    }

    pub fn set_scale(&mut self, scale: Vec3) {
        self.scale = scale;
    }

    // ── matrices ──────────────────────────────────────────────────────────

    /// Rotation applied around the pivot: elevation about X, then azimuth about Y.
    pub fn rotation(&self) -> Mat4 {
        Mat4::from_rotation_x(self.elevation.to_radians())
            * Mat4::from_rotation_y(self.azimuth.to_radians())
    }

    /// World-to-view matrix: pull back by `distance`, rotate, then scale.
    pub fn view_matrix(&self) -> Mat4 {
        Mat4::from_translation(Vec3::new(0.0, 0.0, -self.distance))
            * self.rotation()
            * Mat4::from_scale(self.scale)
    }

    /// View-to-clip matrix for the given aspect ratio (width / height).
    pub fn projection_matrix(&self, aspect: f32) -> Mat4 {
        let aspect = if aspect.is_finite() && aspect > 0.0 { aspect } else { 1.0 };
        match self.projection {
            Projection::Orthographic => {
                Mat4::orthographic_rh(-aspect, aspect, -1.0, 1.0, self.near, self.far)
            }
            Projection::Perspective => Mat4::perspective_rh(
                self.field_of_view.to_radians(),
                aspect,
                self.near,
                self.far,
            ),
        }
    }
}
