//! The fixed isometric view used for block icons.
//!
//! Icons are built in a rotated space and the whole batch is drawn with
//! [`IsoProjection::transform`] applied. The icon's screen position therefore
//! has to be rotated the opposite way first, so that it ends up back on the
//! requested pixel once the transform is applied.

use cgmath::{Deg, Matrix4, Vector3};

/// Yaw of the icon view, in degrees.
const YAW_DEGREES: f32 = 45.0;
/// Pitch of the icon view, in degrees.
const PITCH_DEGREES: f32 = 30.0;

/// Isometric transform plus the trigonometry needed to invert it.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct IsoProjection {
    /// Rotation applied to every icon vertex at draw time
    pub transform: Matrix4<f32>,
    cos_x: f32,
    sin_x: f32,
    cos_y: f32,
    sin_y: f32,
}

impl IsoProjection {
    /// Builds the standard 45° yaw / 30° pitch projection.
    pub fn new() -> Self {
        let transform = Matrix4::from_angle_x(Deg(-PITCH_DEGREES))
            * Matrix4::from_angle_y(Deg(YAW_DEGREES));

        let (sin_x, cos_x) = PITCH_DEGREES.to_radians().sin_cos();
        let (sin_y, cos_y) = (-YAW_DEGREES).to_radians().sin_cos();

        Self {
            transform,
            cos_x,
            sin_x,
            cos_y,
            sin_y,
        }
    }

    /// Converts an icon size in pixels to the half-extent of the cube in
    /// isometric space. The finished cube is `2 * size` pixels wide.
    ///
    /// A unit cube rotated by 45° is `2 * cos_y` wide on screen.
    pub fn scale_for(&self, size: f32) -> f32 {
        size / (2.0 * self.cos_y)
    }

    /// Moves a screen position into isometric space, then shifts it half a
    /// pixel so that texels land on pixel centres.
    pub fn screen_to_iso(&self, x: f32, y: f32) -> Vector3<f32> {
        let mut pos = self.unrotate(x, y);
        pos.x -= 0.5;
        pos.y -= 0.5;
        pos
    }

    /// Inverse of [`IsoProjection::transform`] applied to `(x, y, 0)`.
    pub fn unrotate(&self, x: f32, y: f32) -> Vector3<f32> {
        let pos = Vector3::new(x, y, 0.0);
        let pos = rotate_x(pos, self.cos_x, -self.sin_x);
        rotate_y(pos, self.cos_y, -self.sin_y)
    }
}

impl Default for IsoProjection {
    fn default() -> Self {
        Self::new()
    }
}

fn rotate_x(pos: Vector3<f32>, cos_a: f32, sin_a: f32) -> Vector3<f32> {
    Vector3::new(
        pos.x,
        cos_a * pos.y + sin_a * pos.z,
        -sin_a * pos.y + cos_a * pos.z,
    )
}

fn rotate_y(pos: Vector3<f32>, cos_a: f32, sin_a: f32) -> Vector3<f32> {
    Vector3::new(
        cos_a * pos.x - sin_a * pos.z,
        pos.y,
        sin_a * pos.x + cos_a * pos.z,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use cgmath::Vector4;

    fn close(a: f32, b: f32) -> bool {
        (a - b).abs() < 1e-3
    }

    #[test]
    fn transform_undoes_unrotate() {
        let projection = IsoProjection::new();
        for &(x, y) in &[(0.0, 0.0), (120.0, 40.0), (-35.5, 610.25)] {
            let iso = projection.unrotate(x, y);
            let screen = projection.transform * Vector4::new(iso.x, iso.y, iso.z, 1.0);
            assert!(close(screen.x, x), "x: {} vs {}", screen.x, x);
            assert!(close(screen.y, y), "y: {} vs {}", screen.y, y);
            assert!(close(screen.z, 0.0), "z: {}", screen.z);
        }
    }

    #[test]
    fn screen_to_iso_applies_half_pixel_offset() {
        let projection = IsoProjection::new();
        let plain = projection.unrotate(10.0, 20.0);
        let shifted = projection.screen_to_iso(10.0, 20.0);
        assert!(close(plain.x - shifted.x, 0.5));
        assert!(close(plain.y - shifted.y, 0.5));
        assert!(close(plain.z, shifted.z));
    }

    #[test]
    fn scale_accounts_for_rotated_width() {
        let projection = IsoProjection::new();
        let expected = 32.0 / (2.0 * std::f32::consts::FRAC_1_SQRT_2);
        assert!(close(projection.scale_for(32.0), expected));
    }
}
