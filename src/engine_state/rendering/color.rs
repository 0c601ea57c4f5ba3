//! Packed 8-bit colours used for icon vertices.
//!
//! Icon faces are lit with fixed shade factors rather than real lighting, so a
//! side face reads darker than the top face. Tinted blocks (water, leaves) are
//! multiplied by their fog colour on top of that.

use serde::{Deserialize, Serialize};

/// Shade applied to faces pointing along the X axis.
pub const SHADE_X: f32 = 0.6;
/// Shade applied to faces pointing along the Z axis.
pub const SHADE_Z: f32 = 0.8;
/// Shade applied to the bottom face.
pub const SHADE_Y_BOTTOM: f32 = 0.5;

/// An RGBA colour with one byte per channel.
///
/// Matches the `Unorm8x4` vertex attribute, so it can be copied straight into
/// a vertex buffer.
#[repr(C)]
#[derive(
    Copy, Clone, Debug, PartialEq, Eq, Hash, bytemuck::Pod, bytemuck::Zeroable, Serialize, Deserialize,
)]
pub struct PackedColor {
    /// Red channel
    pub r: u8,
    /// Green channel
    pub g: u8,
    /// Blue channel
    pub b: u8,
    /// Alpha channel
    #[serde(default = "opaque")]
    pub a: u8,
}

fn opaque() -> u8 {
    u8::MAX
}

impl PackedColor {
    /// Fully opaque white.
    pub const WHITE: PackedColor = PackedColor::new(255, 255, 255, 255);

    /// Creates a colour from its four channels.
    pub const fn new(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    /// Multiplies the colour channels by `t`, truncating. Alpha is untouched.
    pub fn scale(self, t: f32) -> Self {
        Self {
            r: (self.r as f32 * t) as u8,
            g: (self.g as f32 * t) as u8,
            b: (self.b as f32 * t) as u8,
            a: self.a,
        }
    }

    /// Returns the X side, Z side and bottom shades of this colour.
    pub fn shaded(self) -> (Self, Self, Self) {
        (
            self.scale(SHADE_X),
            self.scale(SHADE_Z),
            self.scale(SHADE_Y_BOTTOM),
        )
    }

    /// Multiplies this colour by `tint`, channel by channel, in 0..=255 space.
    pub fn tint(self, tint: PackedColor) -> Self {
        let mul = |a: u8, b: u8| ((a as u16 * b as u16) / 255) as u8;
        Self {
            r: mul(self.r, tint.r),
            g: mul(self.g, tint.g),
            b: mul(self.b, tint.b),
            a: self.a,
        }
    }

    /// The colour as the `[u8; 4]` a vertex stores.
    pub fn to_array(self) -> [u8; 4] {
        [self.r, self.g, self.b, self.a]
    }
}

impl Default for PackedColor {
    fn default() -> Self {
        Self::WHITE
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn white_shades_match_face_factors() {
        let (x, z, bottom) = PackedColor::WHITE.shaded();
        assert_eq!(x, PackedColor::new(153, 153, 153, 255));
        assert_eq!(z, PackedColor::new(204, 204, 204, 255));
        assert_eq!(bottom, PackedColor::new(127, 127, 127, 255));
    }

    #[test]
    fn tint_by_white_is_identity() {
        let c = PackedColor::new(10, 200, 77, 128);
        assert_eq!(c.tint(PackedColor::WHITE), c);
    }

    #[test]
    fn tint_keeps_alpha_of_base() {
        let c = PackedColor::WHITE.tint(PackedColor::new(51, 102, 255, 0));
        assert_eq!(c, PackedColor::new(51, 102, 255, 255));
    }

    #[test]
    fn alpha_defaults_to_opaque_when_deserialized() {
        let c: PackedColor = serde_json::from_str(r#"{"r":1,"g":2,"b":3}"#).unwrap();
        assert_eq!(c.a, 255);
    }
}
