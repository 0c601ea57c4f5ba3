//! Isometric block icon drawer.
//!
//! Icons are emitted into a staging buffer owned by [`IsometricDrawer`] and
//! handed to an [`IconTarget`] in as few draw calls as possible. A draw only
//! happens when the next quad needs a different 1D atlas, when the staging
//! buffer is full, or when the batch ends.
//!
//! ```ignore
//! let mut batch = drawer.begin_batch(&mut renderer, &registry, &atlas);
//! for (i, block) in hotbar.iter().enumerate() {
//!     let (x, y) = layout.slot_center(i);
//!     batch.draw(*block, 32.0, x, y)?;
//! }
//! let stats = batch.end();
//! ```

use cgmath::Matrix4;
use log::trace;

use crate::{
    engine_state::{
        rendering::{
            atlas::{TerrainAtlas1D, TextureLoc},
            color::PackedColor,
            vertex::IconVertex,
        },
        voxels::block::{block_side::BlockSide, BlockId, BlockRegistry},
    },
    error::IconResult,
};

use faces::{CuboidFaces, SpriteHalf, SpriteQuads};
pub use projection::IsoProjection;

mod faces;
mod projection;

/// Vertices per emitted quad.
pub const VERTICES_PER_QUAD: usize = 4;
/// Smallest staging buffer the drawer accepts: one full sprite icon.
pub const MIN_STAGING_VERTICES: usize = 4 * VERTICES_PER_QUAD;

/// The graphics device as seen by the drawer.
///
/// Quads arrive as groups of four vertices and are expected to be drawn as
/// two triangles each, through a shared quad index buffer.
pub trait IconTarget {
    /// Applies `transform` to everything drawn until the matching pop.
    fn push_transform(&mut self, transform: Matrix4<f32>);

    /// Restores the transform that was active before the last push.
    fn pop_transform(&mut self);

    /// Makes the given 1D atlas the texture for subsequent draws.
    fn bind_atlas(&mut self, atlas_index: usize);

    /// Draws `vertices.len() / 4` quads with the currently bound atlas.
    fn draw_quads(&mut self, vertices: &[IconVertex]);
}

/// Counters describing a finished batch.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct BatchStats {
    /// Icons that produced geometry
    pub icons: usize,
    /// Vertices handed to the target
    pub vertices: usize,
    /// `draw_quads` calls made
    pub draw_calls: usize,
    /// `bind_atlas` calls made
    pub atlas_binds: usize,
}

/// Emits isometric block icons into a reusable staging buffer.
pub struct IsometricDrawer {
    projection: IsoProjection,
    staging: Vec<IconVertex>,
    capacity: usize,
    color_normal: PackedColor,
    color_x_side: PackedColor,
    color_z_side: PackedColor,
}

impl IsometricDrawer {
    /// Creates a drawer whose staging buffer holds `capacity_vertices`
    /// vertices, rounded down to whole quads and raised to
    /// [`MIN_STAGING_VERTICES`] if smaller.
    pub fn new(capacity_vertices: usize) -> Self {
        let capacity = (capacity_vertices - capacity_vertices % VERTICES_PER_QUAD)
            .max(MIN_STAGING_VERTICES);
        let color_normal = PackedColor::WHITE;
        let (color_x_side, color_z_side, _) = color_normal.shaded();

        Self {
            projection: IsoProjection::new(),
            staging: Vec::with_capacity(capacity),
            capacity,
            color_normal,
            color_x_side,
            color_z_side,
        }
    }

    /// Size of the staging buffer in vertices.
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// The projection icons are drawn with.
    pub fn projection(&self) -> &IsoProjection {
        &self.projection
    }

    /// Starts a batch. The isometric transform is pushed onto `target`
    /// immediately and popped when the batch ends or is dropped.
    pub fn begin_batch<'a, T: IconTarget>(
        &'a mut self,
        target: &'a mut T,
        registry: &'a BlockRegistry,
        atlas: &'a TerrainAtlas1D,
    ) -> IconBatch<'a, T> {
        self.staging.clear();
        target.push_transform(self.projection.transform);

        IconBatch {
            drawer: self,
            target,
            registry,
            atlas,
            last_atlas: None,
            stats: BatchStats::default(),
            finished: false,
        }
    }
}

/// A batch of icons in progress. Ends on [`IconBatch::end`] or on drop.
pub struct IconBatch<'a, T: IconTarget> {
    drawer: &'a mut IsometricDrawer,
    target: &'a mut T,
    registry: &'a BlockRegistry,
    atlas: &'a TerrainAtlas1D,
    last_atlas: Option<usize>,
    stats: BatchStats,
    finished: bool,
}

impl<'a, T: IconTarget> IconBatch<'a, T> {
    /// Emits the icon for `block` centred on `(x, y)`. A full cube ends up
    /// `2 * size` pixels wide.
    ///
    /// Gas blocks emit nothing. Unknown blocks are an error and leave the
    /// batch untouched.
    pub fn draw(&mut self, block: BlockId, size: f32, x: f32, y: f32) -> IconResult<()> {
        let registry = self.registry;
        let definition = registry.get(block)?;
        if !definition.draw.is_visible() {
            return Ok(());
        }

        let projection = self.drawer.projection;
        let scale = projection.scale_for(size);
        let origin = projection.screen_to_iso(x, y);

        if definition.draw.is_cuboid() {
            let faces = CuboidFaces::new(definition, scale, origin);
            let (x_side, z_side) = if definition.full_bright {
                (self.drawer.color_normal, self.drawer.color_normal)
            } else {
                (self.drawer.color_x_side, self.drawer.color_z_side)
            };
            let top = self.drawer.color_normal;
            let inv_tile = self.atlas.inv_tile_size();

            let v_origin = self.bind_texture(definition.textures.get(BlockSide::XMax));
            self.push_quad(faces.x_max(x_side, v_origin, inv_tile));

            let v_origin = self.bind_texture(definition.textures.get(BlockSide::ZMin));
            self.push_quad(faces.z_min(z_side, v_origin, inv_tile));

            let v_origin = self.bind_texture(definition.textures.get(BlockSide::YMax));
            self.push_quad(faces.y_max(top, v_origin, inv_tile));
        } else {
            let sprite = SpriteQuads::new(definition, scale, origin);
            let loc = definition.textures.get(BlockSide::XMax);

            for (half, along_x) in [
                (SpriteHalf::First, true),
                (SpriteHalf::First, false),
                (SpriteHalf::Second, false),
                (SpriteHalf::Second, true),
            ] {
                let (index, rec) = self.atlas.tex_rec(loc, 1);
                self.use_atlas(index);
                let quad = if along_x {
                    sprite.x_quad(half, rec)
                } else {
                    sprite.z_quad(half, rec)
                };
                self.push_quad(quad);
            }
        }

        self.stats.icons += 1;
        Ok(())
    }

    /// Vertices emitted but not yet handed to the target.
    pub fn pending_vertices(&self) -> usize {
        self.drawer.staging.len()
    }

    /// Counters so far.
    pub fn stats(&self) -> BatchStats {
        self.stats
    }

    /// Draws whatever is pending, pops the transform and returns the counters.
    pub fn end(mut self) -> BatchStats {
        self.finish();
        self.stats
    }

    /// Looks up the strip for `loc`, switching atlas if needed, and returns
    /// the V offset of its row.
    fn bind_texture(&mut self, loc: TextureLoc) -> f32 {
        self.use_atlas(self.atlas.index(loc));
        self.atlas.row(loc) as f32 * self.atlas.inv_tile_size()
    }

    /// Flushes and rebinds when `index` differs from the bound atlas.
    fn use_atlas(&mut self, index: usize) {
        if self.last_atlas == Some(index) {
            return;
        }
        if self.last_atlas.is_some() {
            self.draw_pending();
        }

        trace!("Binding icon atlas {index}");
        self.last_atlas = Some(index);
        self.target.bind_atlas(index);
        self.stats.atlas_binds += 1;
    }

    fn push_quad(&mut self, quad: [IconVertex; VERTICES_PER_QUAD]) {
        if self.drawer.staging.len() + VERTICES_PER_QUAD > self.drawer.capacity {
            self.draw_pending();
        }
        self.drawer.staging.extend_from_slice(&quad);
    }

    fn draw_pending(&mut self) {
        let staging = &mut self.drawer.staging;
        if staging.is_empty() {
            return;
        }

        trace!("Flushing {} icon vertices", staging.len());
        self.target.draw_quads(staging);
        self.stats.vertices += staging.len();
        self.stats.draw_calls += 1;
        staging.clear();
    }

    fn finish(&mut self) {
        if self.finished {
            return;
        }
        self.finished = true;
        self.draw_pending();
        self.target.pop_transform();
    }
}

impl<T: IconTarget> Drop for IconBatch<'_, T> {
    fn drop(&mut self) {
        self.finish();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine_state::voxels::block::{BlockDefinition, FaceTextures};

    #[derive(Debug, PartialEq)]
    enum Call {
        Push,
        Pop,
        Bind(usize),
        Draw(usize),
    }

    #[derive(Default)]
    struct Recorder {
        calls: Vec<Call>,
        vertices: Vec<IconVertex>,
    }

    impl IconTarget for Recorder {
        fn push_transform(&mut self, _transform: Matrix4<f32>) {
            self.calls.push(Call::Push);
        }

        fn pop_transform(&mut self) {
            self.calls.push(Call::Pop);
        }

        fn bind_atlas(&mut self, atlas_index: usize) {
            self.calls.push(Call::Bind(atlas_index));
        }

        fn draw_quads(&mut self, vertices: &[IconVertex]) {
            self.calls.push(Call::Draw(vertices.len()));
            self.vertices.extend_from_slice(vertices);
        }
    }

    fn single_strip() -> TerrainAtlas1D {
        TerrainAtlas1D::new(256, 16, 4096).unwrap()
    }

    #[test]
    fn capacity_is_whole_quads_and_at_least_one_sprite() {
        assert_eq!(IsometricDrawer::new(103).capacity(), 100);
        assert_eq!(IsometricDrawer::new(3).capacity(), MIN_STAGING_VERTICES);
    }

    #[test]
    fn gas_emits_nothing() {
        let registry = BlockRegistry::default();
        let atlas = single_strip();
        let mut drawer = IsometricDrawer::new(256);
        let mut target = Recorder::default();

        let mut batch = drawer.begin_batch(&mut target, &registry, &atlas);
        batch.draw(BlockId::AIR, 32.0, 10.0, 10.0).unwrap();
        let stats = batch.end();

        assert_eq!(stats, BatchStats::default());
        assert_eq!(target.calls, vec![Call::Push, Call::Pop]);
    }

    #[test]
    fn cube_emits_three_shaded_faces() {
        let registry = BlockRegistry::default();
        let atlas = single_strip();
        let mut drawer = IsometricDrawer::new(256);
        let mut target = Recorder::default();

        let mut batch = drawer.begin_batch(&mut target, &registry, &atlas);
        batch.draw(BlockId(1), 32.0, 10.0, 10.0).unwrap();
        assert_eq!(batch.pending_vertices(), 12);
        batch.end();

        assert_eq!(
            target.calls,
            vec![Call::Push, Call::Bind(0), Call::Draw(12), Call::Pop]
        );
        assert_eq!(target.vertices[0].color, [153, 153, 153, 255]);
        assert_eq!(target.vertices[4].color, [204, 204, 204, 255]);
        assert_eq!(target.vertices[8].color, [255, 255, 255, 255]);
    }

    #[test]
    fn full_bright_faces_are_unshaded() {
        let registry = BlockRegistry::default();
        let atlas = single_strip();
        let mut drawer = IsometricDrawer::new(256);
        let mut target = Recorder::default();

        let lava = registry
            .ids()
            .find(|id| registry.get(*id).unwrap().name == "Lava")
            .unwrap();
        drawer
            .begin_batch(&mut target, &registry, &atlas)
            .draw(lava, 32.0, 0.0, 0.0)
            .unwrap();

        assert!(target.vertices.iter().all(|v| v.color == [255; 4]));
    }

    #[test]
    fn sprite_emits_four_quads() {
        let registry = BlockRegistry::default();
        let atlas = single_strip();
        let mut drawer = IsometricDrawer::new(256);
        let mut target = Recorder::default();

        let mut batch = drawer.begin_batch(&mut target, &registry, &atlas);
        batch.draw(BlockId(6), 32.0, 0.0, 0.0).unwrap();
        let stats = batch.end();

        assert_eq!(stats.icons, 1);
        assert_eq!(stats.vertices, 16);
        assert_eq!(
            target.calls,
            vec![Call::Push, Call::Bind(0), Call::Draw(16), Call::Pop]
        );
    }

    #[test]
    fn sprite_quads_cross_in_fixed_order() {
        let registry = BlockRegistry::default();
        let atlas = single_strip();
        let mut drawer = IsometricDrawer::new(256);
        let origin = drawer.projection().screen_to_iso(20.0, 30.0);
        let mut target = Recorder::default();

        drawer
            .begin_batch(&mut target, &registry, &atlas)
            .draw(BlockId(6), 32.0, 20.0, 30.0)
            .unwrap();

        let quads: Vec<&[IconVertex]> = target.vertices.chunks(VERTICES_PER_QUAD).collect();
        assert_eq!(quads.len(), 4);

        let in_x_plane = |quad: &[IconVertex]| quad.iter().all(|v| v.position[0] == origin.x);
        let in_z_plane = |quad: &[IconVertex]| quad.iter().all(|v| v.position[2] == origin.z);
        assert!(in_x_plane(quads[0]));
        assert!(in_z_plane(quads[1]));
        assert!(in_z_plane(quads[2]));
        assert!(in_x_plane(quads[3]));

        // First halves sample the left of the tile, second halves the right.
        let u_range = |quad: &[IconVertex]| {
            quad.iter()
                .map(|v| v.tex_coords[0])
                .fold((f32::MAX, f32::MIN), |(lo, hi), u| (lo.min(u), hi.max(u)))
        };
        for quad in &quads[..2] {
            let (lo, hi) = u_range(quad);
            assert_eq!(lo, 0.0);
            assert!(hi <= 0.5);
        }
        for quad in &quads[2..] {
            let (lo, hi) = u_range(quad);
            assert_eq!(lo, 0.5);
            assert!(hi > 0.5 && hi <= 1.0);
        }
    }

    #[test]
    fn tinted_sprite_takes_the_fog_color() {
        let fog = PackedColor::new(120, 200, 80, 255);
        let mut fern = BlockDefinition::sprite("Fern", 5);
        fern.tinted = true;
        fern.fog_color = fog;
        let registry = BlockRegistry::new(vec![fern]);
        let atlas = single_strip();
        let mut drawer = IsometricDrawer::new(256);
        let mut target = Recorder::default();

        drawer
            .begin_batch(&mut target, &registry, &atlas)
            .draw(BlockId(0), 32.0, 0.0, 0.0)
            .unwrap();

        let expected = PackedColor::WHITE.tint(fog).to_array();
        assert_eq!(target.vertices.len(), 16);
        assert!(target.vertices.iter().all(|v| v.color == expected));
    }

    #[test]
    fn atlas_change_flushes_before_binding() {
        let registry = BlockRegistry::new(vec![
            BlockDefinition::cube("Low", FaceTextures::all(1)),
            BlockDefinition::cube("Mixed", FaceTextures::top_side_bottom(70, 1, 1)),
        ]);
        let atlas = TerrainAtlas1D::new(256, 16, 16 * 64).unwrap();
        let mut drawer = IsometricDrawer::new(256);
        let mut target = Recorder::default();

        let mut batch = drawer.begin_batch(&mut target, &registry, &atlas);
        batch.draw(BlockId(0), 32.0, 0.0, 0.0).unwrap();
        batch.draw(BlockId(1), 32.0, 40.0, 0.0).unwrap();
        let stats = batch.end();

        // Low: 3 faces; Mixed: sides stay on strip 0, top moves to strip 1.
        assert_eq!(
            target.calls,
            vec![
                Call::Push,
                Call::Bind(0),
                Call::Draw(20),
                Call::Bind(1),
                Call::Draw(4),
                Call::Pop
            ]
        );
        assert_eq!(stats.atlas_binds, 2);
        assert_eq!(stats.draw_calls, 2);
    }

    #[test]
    fn full_staging_buffer_flushes_without_rebinding() {
        let registry = BlockRegistry::default();
        let atlas = single_strip();
        let mut drawer = IsometricDrawer::new(MIN_STAGING_VERTICES);
        let mut target = Recorder::default();

        let mut batch = drawer.begin_batch(&mut target, &registry, &atlas);
        batch.draw(BlockId(1), 32.0, 0.0, 0.0).unwrap();
        batch.draw(BlockId(1), 32.0, 40.0, 0.0).unwrap();
        batch.end();

        assert_eq!(
            target.calls,
            vec![
                Call::Push,
                Call::Bind(0),
                Call::Draw(16),
                Call::Draw(8),
                Call::Pop
            ]
        );
    }

    #[test]
    fn dropping_a_batch_ends_it() {
        let registry = BlockRegistry::default();
        let atlas = single_strip();
        let mut drawer = IsometricDrawer::new(256);
        let mut target = Recorder::default();

        {
            let mut batch = drawer.begin_batch(&mut target, &registry, &atlas);
            batch.draw(BlockId(3), 32.0, 0.0, 0.0).unwrap();
        }

        assert_eq!(target.calls.last(), Some(&Call::Pop));
        assert_eq!(target.vertices.len(), 12);
    }

    #[test]
    fn unknown_block_leaves_batch_untouched() {
        let registry = BlockRegistry::default();
        let atlas = single_strip();
        let mut drawer = IsometricDrawer::new(256);
        let mut target = Recorder::default();

        let mut batch = drawer.begin_batch(&mut target, &registry, &atlas);
        assert!(batch.draw(BlockId(500), 32.0, 0.0, 0.0).is_err());
        assert_eq!(batch.pending_vertices(), 0);
        assert_eq!(batch.stats(), BatchStats::default());
    }

    #[test]
    fn each_batch_starts_with_an_unbound_atlas() {
        let registry = BlockRegistry::default();
        let atlas = single_strip();
        let mut drawer = IsometricDrawer::new(256);
        let mut target = Recorder::default();

        for _ in 0..2 {
            let mut batch = drawer.begin_batch(&mut target, &registry, &atlas);
            batch.draw(BlockId(1), 32.0, 0.0, 0.0).unwrap();
        }

        let binds = target
            .calls
            .iter()
            .filter(|c| matches!(c, Call::Bind(_)))
            .count();
        assert_eq!(binds, 2);
    }
}
