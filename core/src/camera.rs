//! Camera with fixed projection and a look-to view matrix.
//!
//! Camera *motion* (mouse/keyboard integration) belongs to the embedding
//! application; this type only owns the matrices and the state they are
//! derived from.

use crate::math::{self, Mat4, Vec3};

/// Vertical field of view in degrees.
const FOV_Y_DEGREES: f32 = 80.0;
const NEAR_PLANE: f32 = 0.1;
const FAR_PLANE: f32 = 1000.0;

/// Perspective camera in the row-vector convention.
#[derive(Debug, Clone)]
pub struct Camera {
    position: Vec3,
    direction: Vec3,
    up: Vec3,
    projection: Mat4,
    view: Mat4,
}

impl Camera {
    /// Create a camera for a target of the given pixel dimensions.
    ///
    /// Starts at (0, 1.5, 4) looking slightly downward along -Z.
    pub fn new(width: u32, height: u32) -> Self {
        let aspect = width as f32 / height as f32;
        let projection =
            math::perspective_fov_rh(FOV_Y_DEGREES.to_radians(), aspect, NEAR_PLANE, FAR_PLANE);

        let mut camera = Self {
            position: Vec3::new(0.0, 1.5, 4.0),
            direction: Vec3::new(0.0, -0.3, -1.0),
            up: Vec3::new(0.0, 1.0, 0.0),
            projection,
            view: Mat4::identity(),
        };
        camera.update_view_matrix();
        camera
    }

    /// Recompute the view matrix from position, direction, and up.
    pub fn update_view_matrix(&mut self) {
        self.view = math::look_to_rh(self.position, self.direction, self.up);
    }

    /// Move the camera and refresh the view matrix.
    pub fn set_position(&mut self, position: Vec3) {
        self.position = position;
        self.update_view_matrix();
    }

    /// Aim the camera and refresh the view matrix.
    pub fn set_direction(&mut self, direction: Vec3) {
        self.direction = direction;
        self.update_view_matrix();
    }

    #[inline]
    pub fn position(&self) -> Vec3 {
        self.position
    }

    #[inline]
    pub fn view_matrix(&self) -> &Mat4 {
        &self.view
    }

    #[inline]
    pub fn projection_matrix(&self) -> &Mat4 {
        &self.projection
    }

    /// Combined `view * projection` in row-vector order.
    pub fn view_projection(&self) -> Mat4 {
        self.view * self.projection
    }
}
