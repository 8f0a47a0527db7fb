//! Math type aliases and matrix helpers.
//!
//! The renderer uses the **row-vector convention**: vectors are rows,
//! transforms compose left to right (`world = scale * rotation *
//! translation`), and matrices are handed to the GPU transposed. The
//! constructors below produce the same numeric layouts as the classic
//! D3D helper library, so a hand-computed reference matrix matches
//! element for element.

pub use nalgebra;

/// 2D vector (f32).
pub type Vec2 = nalgebra::Vector2<f32>;

/// 3D vector (f32).
pub type Vec3 = nalgebra::Vector3<f32>;

/// 4D vector (f32).
pub type Vec4 = nalgebra::Vector4<f32>;

/// 4x4 matrix (f32).
pub type Mat4 = nalgebra::Matrix4<f32>;

// ===== Transform constructors (row-vector convention) =====

/// Translation matrix: identity with the offset in the last row.
pub fn translation(offset: Vec3) -> Mat4 {
    #[rustfmt::skip]
    let result = Mat4::new(
        1.0,      0.0,      0.0,      0.0,
        0.0,      1.0,      0.0,      0.0,
        0.0,      0.0,      1.0,      0.0,
        offset.x, offset.y, offset.z, 1.0,
    );
    result
}

/// Non-uniform scaling matrix.
pub fn scaling(scale: Vec3) -> Mat4 {
    Mat4::from_diagonal(&Vec4::new(scale.x, scale.y, scale.z, 1.0))
}

/// Rotation about the X axis by `angle` radians.
pub fn rotation_x(angle: f32) -> Mat4 {
    let (s, c) = angle.sin_cos();
    #[rustfmt::skip]
    let result = Mat4::new(
        1.0, 0.0, 0.0, 0.0,
        0.0, c,   s,   0.0,
        0.0, -s,  c,   0.0,
        0.0, 0.0, 0.0, 1.0,
    );
    result
}

/// Rotation about the Y axis by `angle` radians.
pub fn rotation_y(angle: f32) -> Mat4 {
    let (s, c) = angle.sin_cos();
    #[rustfmt::skip]
    let result = Mat4::new(
        c,   0.0, -s,  0.0,
        0.0, 1.0, 0.0, 0.0,
        s,   0.0, c,   0.0,
        0.0, 0.0, 0.0, 1.0,
    );
    result
}

/// Rotation about the Z axis by `angle` radians.
pub fn rotation_z(angle: f32) -> Mat4 {
    let (s, c) = angle.sin_cos();
    #[rustfmt::skip]
    let result = Mat4::new(
        c,   s,   0.0, 0.0,
        -s,  c,   0.0, 0.0,
        0.0, 0.0, 1.0, 0.0,
        0.0, 0.0, 0.0, 1.0,
    );
    result
}

// ===== Camera matrices =====

/// Right-handed perspective projection with depth range [0, 1].
///
/// `fov_y` is the vertical field of view in radians. Matches
/// `XMMatrixPerspectiveFovRH`.
pub fn perspective_fov_rh(fov_y: f32, aspect: f32, znear: f32, zfar: f32) -> Mat4 {
    let h = 1.0 / (fov_y * 0.5).tan();
    let w = h / aspect;
    let range = zfar / (znear - zfar);
    #[rustfmt::skip]
    let result = Mat4::new(
        w,   0.0, 0.0,           0.0,
        0.0, h,   0.0,           0.0,
        0.0, 0.0, range,         -1.0,
        0.0, 0.0, range * znear, 0.0,
    );
    result
}

/// Right-handed view matrix for a camera at `eye` looking along `dir`.
///
/// `dir` does not need to be normalized. Matches `XMMatrixLookToRH`.
pub fn look_to_rh(eye: Vec3, dir: Vec3, up: Vec3) -> Mat4 {
    let z_axis = (-dir).normalize();
    let x_axis = up.cross(&z_axis).normalize();
    let y_axis = z_axis.cross(&x_axis);
    #[rustfmt::skip]
    let result = Mat4::new(
        x_axis.x,          y_axis.x,          z_axis.x,          0.0,
        x_axis.y,          y_axis.y,          z_axis.y,          0.0,
        x_axis.z,          y_axis.z,          z_axis.z,          0.0,
        -x_axis.dot(&eye), -y_axis.dot(&eye), -z_axis.dot(&eye), 1.0,
    );
    result
}

// ===== GPU hand-off =====

/// Flatten a matrix into 16 floats, row by row.
///
/// Combined with [`Mat4::transpose`] this is the form the shaders expect
/// for inline root constants.
pub fn to_row_major_array(m: &Mat4) -> [f32; 16] {
    let mut out = [0.0f32; 16];
    for row in 0..4 {
        for col in 0..4 {
            out[row * 4 + col] = m[(row, col)];
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn translation_lives_in_last_row() {
        let t = translation(Vec3::new(1.0, 2.0, 3.0));
        assert_eq!(t[(3, 0)], 1.0);
        assert_eq!(t[(3, 1)], 2.0);
        assert_eq!(t[(3, 2)], 3.0);
        assert_eq!(t[(3, 3)], 1.0);
        assert_eq!(t[(0, 0)], 1.0);
    }

    #[test]
    fn scaling_is_diagonal() {
        let s = scaling(Vec3::new(2.0, 3.0, 4.0));
        assert_eq!(s[(0, 0)], 2.0);
        assert_eq!(s[(1, 1)], 3.0);
        assert_eq!(s[(2, 2)], 4.0);
        assert_eq!(s[(3, 3)], 1.0);
    }

    #[test]
    fn rotations_at_zero_are_identity() {
        assert_eq!(rotation_x(0.0), Mat4::identity());
        assert_eq!(rotation_y(0.0), Mat4::identity());
        assert_eq!(rotation_z(0.0), Mat4::identity());
    }

    #[test]
    fn row_vector_translation_moves_point() {
        // v' = v * T in the row-vector convention.
        let t = translation(Vec3::new(5.0, 0.0, 0.0));
        let v = nalgebra::RowVector4::new(1.0, 2.0, 3.0, 1.0);
        let moved = v * t;
        assert_eq!(moved[0], 6.0);
        assert_eq!(moved[1], 2.0);
        assert_eq!(moved[2], 3.0);
    }

    #[test]
    fn perspective_matches_reference_elements() {
        let fov = 80.0f32.to_radians();
        let p = perspective_fov_rh(fov, 16.0 / 9.0, 0.1, 1000.0);
        let h = 1.0 / (fov * 0.5).tan();
        assert!((p[(1, 1)] - h).abs() < 1e-6);
        assert!((p[(0, 0)] - h / (16.0 / 9.0)).abs() < 1e-6);
        assert!((p[(2, 3)] + 1.0).abs() < 1e-6);
        // range = zf / (zn - zf)
        assert!((p[(2, 2)] - 1000.0 / (0.1 - 1000.0)).abs() < 1e-6);
    }

    #[test]
    fn look_to_rh_at_origin_down_negative_z_is_identity() {
        let v = look_to_rh(
            Vec3::zeros(),
            Vec3::new(0.0, 0.0, -1.0),
            Vec3::new(0.0, 1.0, 0.0),
        );
        assert!((v - Mat4::identity()).abs().max() < 1e-6);
    }

    #[test]
    fn row_major_array_is_row_by_row() {
        #[rustfmt::skip]
        let m = Mat4::new(
            1.0,  2.0,  3.0,  4.0,
            5.0,  6.0,  7.0,  8.0,
            9.0,  10.0, 11.0, 12.0,
            13.0, 14.0, 15.0, 16.0,
        );
        let a = to_row_major_array(&m);
        assert_eq!(a[0], 1.0);
        assert_eq!(a[1], 2.0);
        assert_eq!(a[4], 5.0);
        assert_eq!(a[15], 16.0);
    }
}
