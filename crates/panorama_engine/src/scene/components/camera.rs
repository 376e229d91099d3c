//! Camera component
//!
//! Holds the view and projection matrices for its owner. Both are rebuilt on
//! every update: the projection from the field of view and the viewport
//! aspect, the view from the owner's position looking along its forward axis.

use crate::core::CameraConfig;
use crate::foundation::math::{utils, Mat4, Mat4Ext, Transform};
use crate::render::CameraMatrices;

/// Perspective camera attached to an actor
#[derive(Debug, Clone, PartialEq)]
pub struct CameraComponent {
    fov_degrees: f32,
    near: f32,
    far: f32,
    view: Mat4,
    projection: Mat4,
}

impl CameraComponent {
    /// Create a camera with a vertical field of view in degrees
    ///
    /// A lens that fails [`CameraConfig::validate`] is replaced by the
    /// default one.
    pub fn new(fov_degrees: f32, near: f32, far: f32) -> Self {
        let mut lens = CameraConfig { fov_degrees, near, far };
        if let Err(e) = lens.validate() {
            log::warn!("Camera lens rejected, using defaults: {}", e);
            lens = CameraConfig::default();
        }
        Self {
            fov_degrees: lens.fov_degrees,
            near: lens.near,
            far: lens.far,
            view: Mat4::identity(),
            projection: Mat4::identity(),
        }
    }

    /// Create a camera from configuration
    pub fn from_config(config: &CameraConfig) -> Self {
        Self::new(config.fov_degrees, config.near, config.far)
    }

    /// Change the field of view (applied on the next projection)
    ///
    /// Values outside (0, 180) degrees are ignored.
    pub fn set_fov(&mut self, fov_degrees: f32) {
        if fov_degrees > 0.0 && fov_degrees < 180.0 {
            self.fov_degrees = fov_degrees;
        } else {
            log::warn!("Ignoring field of view {}", fov_degrees);
        }
    }

    /// Vertical field of view in degrees
    pub fn fov(&self) -> f32 {
        self.fov_degrees
    }

    /// Near and far clipping distances
    pub fn clip_planes(&self) -> (f32, f32) {
        (self.near, self.far)
    }

    fn lens(&self) -> CameraConfig {
        CameraConfig {
            fov_degrees: self.fov_degrees,
            near: self.near,
            far: self.far,
        }
    }

    /// Recompute the projection for a viewport aspect ratio
    ///
    /// Keeps the previous projection if the lens is unusable.
    pub fn project(&mut self, aspect: f32) {
        if self.lens().validate().is_err() {
            return;
        }
        let aspect = if aspect.is_finite() && aspect > 0.0 { aspect } else { 1.0 };
        self.projection = Mat4::perspective(utils::deg_to_rad(self.fov_degrees), aspect, self.near, self.far);
    }

    /// Recompute the view from the owner's transform
    pub fn view(&mut self, transform: &Transform) {
        let eye = transform.position;
        self.view = Mat4::look_at(eye, eye + transform.forward(), transform.up());
    }

    /// Refresh both matrices
    pub fn update(&mut self, transform: &Transform, aspect: f32) {
        self.project(aspect);
        self.view(transform);
    }

    /// Current view matrix
    pub fn view_matrix(&self) -> Mat4 {
        self.view
    }

    /// Current projection matrix
    pub fn projection_matrix(&self) -> Mat4 {
        self.projection
    }

    /// Matrices for the renderer
    pub fn matrices(&self) -> CameraMatrices {
        CameraMatrices {
            view: self.view,
            projection: self.projection,
        }
    }
}

impl Default for CameraComponent {
    fn default() -> Self {
        Self::from_config(&CameraConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::foundation::math::{Point3, Vec3, Vec4};
    use approx::assert_relative_eq;

    #[test]
    fn test_view_puts_forward_on_negative_z() {
        let mut camera = CameraComponent::default();
        let transform = Transform::from_position(Vec3::new(1.0, 2.0, 3.0));
        camera.view(&transform);

        let ahead = camera.view_matrix().transform_point(&Point3::new(1.0, 2.0, 1.0));
        assert_relative_eq!(ahead, Point3::new(0.0, 0.0, -2.0), epsilon = 1e-5);
    }

    #[test]
    fn test_projection_uses_aspect() {
        let mut camera = CameraComponent::new(90.0, 0.1, 100.0);
        camera.project(2.0);
        let p = camera.projection_matrix();
        assert_relative_eq!(p[(1, 1)], 1.0, epsilon = 1e-5);
        assert_relative_eq!(p[(0, 0)], 0.5, epsilon = 1e-5);
    }

    #[test]
    fn test_degenerate_aspect_falls_back() {
        let mut camera = CameraComponent::default();
        camera.project(0.0);
        let clip = camera.projection_matrix() * Vec4::new(0.0, 0.0, -1.0, 1.0);
        assert!(clip.iter().all(|c| c.is_finite()));
    }

    #[test]
    fn test_degenerate_lens_falls_back_to_defaults() {
        let mut camera = CameraComponent::new(70.0, 1.0, 1.0);
        assert_eq!(camera.clip_planes(), (0.1, 1000.0));

        camera.update(&Transform::identity(), 1.5);
        assert!(camera.projection_matrix().iter().all(|c| c.is_finite()));
    }

    #[test]
    fn test_out_of_range_fov_ignored() {
        let mut camera = CameraComponent::new(60.0, 0.1, 10.0);
        camera.set_fov(180.0);
        camera.set_fov(-5.0);
        assert_eq!(camera.fov(), 60.0);
        camera.set_fov(90.0);
        assert_eq!(camera.fov(), 90.0);
    }

    #[test]
    fn test_update_refreshes_both() {
        let mut camera = CameraComponent::default();
        camera.update(&Transform::from_position(Vec3::new(0.0, 0.0, 5.0)), 16.0 / 9.0);
        assert_ne!(camera.view_matrix(), Mat4::identity());
        assert_ne!(camera.projection_matrix(), Mat4::identity());
    }
}
