//! Math utilities and types
//!
//! Provides the fundamental math types used by actors, the camera and the
//! renderer. Everything is `f32` and right-handed with +Y up, matching the
//! OpenGL clip-space conventions the shaders expect.

pub use nalgebra::{
    Vector2, Vector3, Vector4,
    Matrix4,
    UnitQuaternion,
};

/// 2D vector type
pub type Vec2 = Vector2<f32>;

/// 3D vector type
pub type Vec3 = Vector3<f32>;

/// 4D vector type
pub type Vec4 = Vector4<f32>;

/// 4x4 matrix type
pub type Mat4 = Matrix4<f32>;

/// 3D point type
pub type Point3 = nalgebra::Point3<f32>;

/// Quaternion type for rotations
pub type Quat = UnitQuaternion<f32>;

/// Transform representing position, rotation, and scale
///
/// Every actor carries one. The model matrix is always composed as
/// `T(position) * S(scale) * R(rotation)`; movement integration and the mesh
/// draw path both go through [`Transform::model_matrix`] so the order can
/// never diverge between them.
#[derive(Debug, Clone, PartialEq)]
pub struct Transform {
    /// Position in 3D space
    pub position: Vec3,

    /// Rotation quaternion
    pub rotation: Quat,

    /// Scale factors
    pub scale: Vec3,
}

impl Default for Transform {
    fn default() -> Self {
        Self {
            position: Vec3::zeros(),
            rotation: Quat::identity(),
            scale: Vec3::new(1.0, 1.0, 1.0),
        }
    }
}

impl Transform {
    /// Create a new identity transform
    pub fn identity() -> Self {
        Self::default()
    }

    /// Create a transform with only position
    pub fn from_position(position: Vec3) -> Self {
        Self {
            position,
            ..Default::default()
        }
    }

    /// Create a transform with position, rotation and scale
    pub const fn new(position: Vec3, rotation: Quat, scale: Vec3) -> Self {
        Self {
            position,
            rotation,
            scale,
        }
    }

    /// Model matrix: translate, then scale, then rotate (`T * S * R`)
    pub fn model_matrix(&self) -> Mat4 {
        Mat4::new_translation(&self.position)
            * Mat4::new_nonuniform_scaling(&self.scale)
            * self.rotation.to_homogeneous()
    }

    /// Direction the transform is facing (rotated -Z)
    pub fn forward(&self) -> Vec3 {
        self.rotation * -Vec3::z()
    }

    /// Right-hand direction (rotated +X)
    pub fn right(&self) -> Vec3 {
        self.rotation * Vec3::x()
    }

    /// Local up direction (rotated +Y)
    pub fn up(&self) -> Vec3 {
        self.rotation * Vec3::y()
    }

    /// Apply this transform to a point
    pub fn transform_point(&self, point: Point3) -> Point3 {
        self.model_matrix().transform_point(&point)
    }
}

/// Math constants
pub mod constants {
    /// Pi constant
    pub const PI: f32 = std::f32::consts::PI;

    /// Pi / 2
    pub const HALF_PI: f32 = PI * 0.5;

    /// Degrees to radians conversion factor
    pub const DEG_TO_RAD: f32 = PI / 180.0;
}

/// Math utility functions
pub mod utils {
    use super::constants;

    /// Convert degrees to radians
    pub fn deg_to_rad(degrees: f32) -> f32 {
        degrees * constants::DEG_TO_RAD
    }
}

/// Extension trait for Mat4 with additional convenience methods
pub trait Mat4Ext {
    /// Create an OpenGL perspective projection matrix (depth mapped to [-1, 1])
    fn perspective(fov_y: f32, aspect: f32, near: f32, far: f32) -> Mat4;

    /// Create a right-handed look-at view matrix
    fn look_at(eye: Vec3, target: Vec3, up: Vec3) -> Mat4;
}

impl Mat4Ext for Mat4 {
    fn perspective(fov_y: f32, aspect: f32, near: f32, far: f32) -> Mat4 {
        nalgebra::Perspective3::new(aspect, fov_y, near, far).to_homogeneous()
    }

    fn look_at(eye: Vec3, target: Vec3, up: Vec3) -> Mat4 {
        Mat4::look_at_rh(&Point3::from(eye), &Point3::from(target), &up)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn sample() -> Transform {
        Transform::new(
            Vec3::new(1.0, 2.0, 3.0),
            Quat::from_axis_angle(&Vec3::y_axis(), 0.7),
            Vec3::new(2.0, 0.5, 1.5),
        )
    }

    #[test]
    fn test_default_is_identity() {
        let transform = Transform::default();
        assert_eq!(transform.model_matrix(), Mat4::identity());
        assert_eq!(transform.scale, Vec3::new(1.0, 1.0, 1.0));
    }

    #[test]
    fn test_model_matrix_is_translate_scale_rotate() {
        let t = sample();
        let expected = Mat4::new_translation(&t.position)
            * Mat4::new_nonuniform_scaling(&t.scale)
            * t.rotation.to_homogeneous();
        assert_relative_eq!(t.model_matrix(), expected, epsilon = 1e-6);
    }

    #[test]
    fn test_model_matrix_order_matters() {
        let t = sample();
        let translate = Mat4::new_translation(&t.position);
        let scale = Mat4::new_nonuniform_scaling(&t.scale);
        let rotate = t.rotation.to_homogeneous();

        let model = t.model_matrix();
        assert!((model - translate * rotate * scale).abs().max() > 1e-3);
        assert!((model - rotate * scale * translate).abs().max() > 1e-3);
        assert!((model - scale * translate * rotate).abs().max() > 1e-3);
    }

    #[test]
    fn test_forward_follows_rotation() {
        let mut t = Transform::identity();
        assert_relative_eq!(t.forward(), Vec3::new(0.0, 0.0, -1.0));

        t.rotation = Quat::from_axis_angle(&Vec3::y_axis(), constants::HALF_PI);
        assert_relative_eq!(t.forward(), Vec3::new(-1.0, 0.0, 0.0), epsilon = 1e-6);
        assert_relative_eq!(t.right(), Vec3::new(0.0, 0.0, -1.0), epsilon = 1e-6);
    }

    #[test]
    fn test_look_at_maps_target_onto_negative_z() {
        let view = Mat4::look_at(Vec3::new(0.0, 0.0, 5.0), Vec3::zeros(), Vec3::y());
        let p = view.transform_point(&Point3::origin());
        assert_relative_eq!(p, Point3::new(0.0, 0.0, -5.0), epsilon = 1e-6);
    }

    #[test]
    fn test_perspective_depth_range() {
        let proj = Mat4::perspective(utils::deg_to_rad(70.0), 16.0 / 9.0, 0.1, 100.0);
        let near = proj * Vec4::new(0.0, 0.0, -0.1, 1.0);
        let far = proj * Vec4::new(0.0, 0.0, -100.0, 1.0);
        assert_relative_eq!(near.z / near.w, -1.0, epsilon = 1e-4);
        assert_relative_eq!(far.z / far.w, 1.0, epsilon = 1e-4);
    }
}
