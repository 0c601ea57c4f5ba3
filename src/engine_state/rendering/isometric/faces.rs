//! Quad emission for the two icon shapes: cuboids and crossed sprites.
//!
//! Everything here works in isometric space, relative to an icon origin and
//! scale computed by the drawer. Each function returns one quad.

use cgmath::Vector3;

use crate::engine_state::{
    rendering::{
        atlas::{TextureRec, UV2_SCALE},
        color::PackedColor,
        vertex::IconVertex,
    },
    voxels::block::BlockDefinition,
};

/// Maps a block-space coordinate in 0..1 onto the icon.
///
/// Larger block coordinates land further towards negative isometric space,
/// which is what puts the visible faces towards the viewer.
fn iso_coord(scale: f32, value: f32, origin: f32) -> f32 {
    scale * (1.0 - value * 2.0) + origin
}

/// Corners of a block's bounding box on the icon, plus the box itself for
/// texture coordinates.
#[derive(Copy, Clone, Debug)]
pub struct CuboidFaces {
    x1: f32,
    x2: f32,
    y1: f32,
    y2: f32,
    z1: f32,
    z2: f32,
    /// Bounding box with Y flipped, since texture V grows downwards.
    tex_min: Vector3<f32>,
    tex_max: Vector3<f32>,
    tint: Option<PackedColor>,
}

impl CuboidFaces {
    /// Places `block` at `origin` with half-extent `scale`.
    pub fn new(block: &BlockDefinition, scale: f32, origin: Vector3<f32>) -> Self {
        let min = block.min_bb();
        let max = block.max_bb();

        Self {
            x1: iso_coord(scale, min.x, origin.x),
            x2: iso_coord(scale, max.x, origin.x),
            y1: iso_coord(scale, min.y, origin.y),
            y2: iso_coord(scale, max.y, origin.y),
            z1: iso_coord(scale, min.z, origin.z),
            z2: iso_coord(scale, max.z, origin.z),
            tex_min: Vector3::new(min.x, 1.0 - min.y, min.z),
            tex_max: Vector3::new(max.x, 1.0 - max.y, max.z),
            tint: block.tinted.then_some(block.fog_color),
        }
    }

    fn color(&self, color: PackedColor) -> PackedColor {
        match self.tint {
            Some(tint) => color.tint(tint),
            None => color,
        }
    }

    /// The face pointing towards positive X.
    pub fn x_max(&self, color: PackedColor, v_origin: f32, inv_tile: f32) -> [IconVertex; 4] {
        let u1 = 1.0 - self.tex_min.z;
        let u2 = (1.0 - self.tex_max.z) * UV2_SCALE;
        let v1 = v_origin + self.tex_max.y * inv_tile;
        let v2 = v_origin + self.tex_min.y * inv_tile * UV2_SCALE;
        let c = self.color(color);

        [
            IconVertex::new(self.x2, self.y2, self.z1, u1, v1, c),
            IconVertex::new(self.x2, self.y2, self.z2, u2, v1, c),
            IconVertex::new(self.x2, self.y1, self.z2, u2, v2, c),
            IconVertex::new(self.x2, self.y1, self.z1, u1, v2, c),
        ]
    }

    /// The face pointing towards negative Z.
    pub fn z_min(&self, color: PackedColor, v_origin: f32, inv_tile: f32) -> [IconVertex; 4] {
        let u1 = 1.0 - self.tex_min.x;
        let u2 = (1.0 - self.tex_max.x) * UV2_SCALE;
        let v1 = v_origin + self.tex_max.y * inv_tile;
        let v2 = v_origin + self.tex_min.y * inv_tile * UV2_SCALE;
        let c = self.color(color);

        [
            IconVertex::new(self.x2, self.y1, self.z1, u2, v2, c),
            IconVertex::new(self.x1, self.y1, self.z1, u1, v2, c),
            IconVertex::new(self.x1, self.y2, self.z1, u1, v1, c),
            IconVertex::new(self.x2, self.y2, self.z1, u2, v1, c),
        ]
    }

    /// The top face.
    pub fn y_max(&self, color: PackedColor, v_origin: f32, inv_tile: f32) -> [IconVertex; 4] {
        let u1 = self.tex_min.x;
        let u2 = self.tex_max.x * UV2_SCALE;
        let v1 = v_origin + self.tex_min.z * inv_tile;
        let v2 = v_origin + self.tex_max.z * inv_tile * UV2_SCALE;
        let c = self.color(color);

        [
            IconVertex::new(self.x2, self.y2, self.z1, u2, v1, c),
            IconVertex::new(self.x1, self.y2, self.z1, u1, v1, c),
            IconVertex::new(self.x1, self.y2, self.z2, u1, v2, c),
            IconVertex::new(self.x2, self.y2, self.z2, u2, v2, c),
        ]
    }
}

/// Which half of a crossed sprite a quad covers.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum SpriteHalf {
    /// Block coordinates 0.5 to 1.1, texture U 0 to 0.5
    First,
    /// Block coordinates -0.1 to 0.5, texture U 0.5 to 1
    Second,
}

impl SpriteHalf {
    fn coords(self) -> (f32, f32) {
        match self {
            SpriteHalf::First => (0.5, 1.1),
            SpriteHalf::Second => (-0.1, 0.5),
        }
    }

    fn tex_u(self) -> (f32, f32) {
        match self {
            SpriteHalf::First => (0.0, 0.5 * UV2_SCALE),
            SpriteHalf::Second => (0.5, UV2_SCALE),
        }
    }
}

/// Builds the halves of a sprite icon: two planes crossing at the icon origin.
#[derive(Copy, Clone, Debug)]
pub struct SpriteQuads {
    scale: f32,
    origin: Vector3<f32>,
    min_y: f32,
    max_y: f32,
    color: PackedColor,
}

impl SpriteQuads {
    /// Places a sprite at `origin` with half-extent `scale`.
    pub fn new(block: &BlockDefinition, scale: f32, origin: Vector3<f32>) -> Self {
        let color = if block.tinted {
            PackedColor::WHITE.tint(block.fog_color)
        } else {
            PackedColor::WHITE
        };

        Self {
            scale,
            origin,
            min_y: iso_coord(scale, 0.0, origin.y),
            max_y: iso_coord(scale, 1.1, origin.y),
            color,
        }
    }

    /// Half of the quad lying in the plane `z = origin.z`.
    pub fn z_quad(&self, half: SpriteHalf, rec: TextureRec) -> [IconVertex; 4] {
        let (c1, c2) = half.coords();
        let (u1, u2) = half.tex_u();
        let min_x = iso_coord(self.scale, c1, self.origin.x);
        let max_x = iso_coord(self.scale, c2, self.origin.x);
        let z = self.origin.z;

        [
            IconVertex::new(min_x, self.min_y, z, u2, rec.v2, self.color),
            IconVertex::new(min_x, self.max_y, z, u2, rec.v1, self.color),
            IconVertex::new(max_x, self.max_y, z, u1, rec.v1, self.color),
            IconVertex::new(max_x, self.min_y, z, u1, rec.v2, self.color),
        ]
    }

    /// Half of the quad lying in the plane `x = origin.x`.
    pub fn x_quad(&self, half: SpriteHalf, rec: TextureRec) -> [IconVertex; 4] {
        let (c1, c2) = half.coords();
        let (u1, u2) = half.tex_u();
        let min_z = iso_coord(self.scale, c1, self.origin.z);
        let max_z = iso_coord(self.scale, c2, self.origin.z);
        let x = self.origin.x;

        [
            IconVertex::new(x, self.min_y, min_z, u2, rec.v2, self.color),
            IconVertex::new(x, self.max_y, min_z, u2, rec.v1, self.color),
            IconVertex::new(x, self.max_y, max_z, u1, rec.v1, self.color),
            IconVertex::new(x, self.min_y, max_z, u1, rec.v2, self.color),
        ]
    }
}
