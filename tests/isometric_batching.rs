//! Drives the isometric drawer through a recording target, the same way the
//! viewer drives the WebGPU renderer.

use block_icons::{
    screen_projection, BatchStats, BlockDefinition, BlockId, BlockRegistry, DrawList,
    FaceTextures, FrameRecorder, IconTarget, IconVertex, InventoryLayout, IsometricDrawer,
    TerrainAtlas1D, MIN_STAGING_VERTICES, VERTICES_PER_QUAD,
};
use cgmath::{Matrix4, SquareMatrix, Vector4};

#[derive(Debug, Clone, PartialEq)]
enum Command {
    PushTransform,
    PopTransform,
    BindAtlas(usize),
    DrawQuads(usize),
}

/// Records every call and keeps the transform stack like a real target.
#[derive(Default)]
struct RecordingTarget {
    commands: Vec<Command>,
    vertices: Vec<IconVertex>,
    transforms: Vec<Matrix4<f32>>,
    /// Frame buffer bookkeeping, as the WebGPU renderer does it
    draw_list: Option<DrawList>,
    bound: Option<usize>,
}

impl RecordingTarget {
    fn with_frame_buffer(capacity: u32) -> Self {
        Self {
            draw_list: Some(DrawList::new(capacity)),
            ..Self::default()
        }
    }

    fn draw_calls(&self) -> usize {
        self.commands
            .iter()
            .filter(|c| matches!(c, Command::DrawQuads(_)))
            .count()
    }
}

impl IconTarget for RecordingTarget {
    fn push_transform(&mut self, transform: Matrix4<f32>) {
        self.commands.push(Command::PushTransform);
        self.transforms.push(transform);
    }

    fn pop_transform(&mut self) {
        self.commands.push(Command::PopTransform);
        self.transforms.pop();
    }

    fn bind_atlas(&mut self, atlas_index: usize) {
        self.commands.push(Command::BindAtlas(atlas_index));
        self.bound = Some(atlas_index);
    }

    fn draw_quads(&mut self, vertices: &[IconVertex]) {
        assert_eq!(vertices.len() % VERTICES_PER_QUAD, 0);
        self.commands.push(Command::DrawQuads(vertices.len()));
        self.vertices.extend_from_slice(vertices);
        if let (Some(list), Some(atlas)) = (self.draw_list.as_mut(), self.bound) {
            let transform = self
                .transforms
                .last()
                .copied()
                .unwrap_or_else(Matrix4::identity);
            list.record(atlas, transform, vertices.len() as u32);
        }
    }
}

fn hotbar(registry: &BlockRegistry) -> Vec<BlockId> {
    registry
        .ids()
        .filter(|id| registry.get(*id).unwrap().draw.is_visible())
        .collect()
}

#[test]
fn whole_registry_in_one_strip_is_a_single_draw() {
    let registry = BlockRegistry::default();
    let atlas = TerrainAtlas1D::new(256, 16, 4096).unwrap();
    let layout = InventoryLayout::new(9, 48.0, 32.0, [24.0, 24.0]);
    let mut drawer = IsometricDrawer::new(4096);
    let mut target = RecordingTarget::default();

    let blocks = hotbar(&registry);
    let mut batch = drawer.begin_batch(&mut target, &registry, &atlas);
    for (slot, block) in blocks.iter().enumerate() {
        let (x, y) = layout.slot_center(slot);
        batch.draw(*block, layout.icon_size, x, y).unwrap();
    }
    let stats = batch.end();

    assert_eq!(stats.icons, blocks.len());
    assert_eq!(stats.draw_calls, 1);
    assert_eq!(stats.atlas_binds, 1);
    assert_eq!(stats.vertices, target.vertices.len());
    assert!(target.transforms.is_empty());
    assert_eq!(target.commands.first(), Some(&Command::PushTransform));
    assert_eq!(target.commands.last(), Some(&Command::PopTransform));
}

#[test]
fn small_strips_split_the_batch_per_atlas_change() {
    let registry = BlockRegistry::new(vec![
        BlockDefinition::cube("A", FaceTextures::all(0)),
        BlockDefinition::cube("B", FaceTextures::all(20)),
        BlockDefinition::cube("C", FaceTextures::all(1)),
    ]);
    // 16 tiles per strip: tile 20 lives in strip 1.
    let atlas = TerrainAtlas1D::new(256, 16, 256).unwrap();
    let mut drawer = IsometricDrawer::new(4096);
    let mut target = RecordingTarget::default();

    let mut batch = drawer.begin_batch(&mut target, &registry, &atlas);
    for (i, id) in [BlockId(0), BlockId(1), BlockId(2)].into_iter().enumerate() {
        batch.draw(id, 32.0, i as f32 * 40.0, 0.0).unwrap();
    }
    let stats = batch.end();

    assert_eq!(
        target.commands,
        vec![
            Command::PushTransform,
            Command::BindAtlas(0),
            Command::DrawQuads(12),
            Command::BindAtlas(1),
            Command::DrawQuads(12),
            Command::BindAtlas(0),
            Command::DrawQuads(12),
            Command::PopTransform,
        ]
    );
    assert_eq!(
        stats,
        BatchStats {
            icons: 3,
            vertices: 36,
            draw_calls: 3,
            atlas_binds: 3,
        }
    );
}

#[test]
fn staging_overflow_flushes_whole_quads_in_order() {
    let registry = BlockRegistry::default();
    let atlas = TerrainAtlas1D::new(256, 16, 4096).unwrap();
    let mut drawer = IsometricDrawer::new(MIN_STAGING_VERTICES);
    let mut target = RecordingTarget::with_frame_buffer(1024);

    let mut batch = drawer.begin_batch(&mut target, &registry, &atlas);
    for slot in 0..10 {
        batch.draw(BlockId(1), 32.0, slot as f32 * 40.0, 0.0).unwrap();
    }
    let stats = batch.end();

    assert_eq!(stats.vertices, 10 * 12);
    assert!(target.draw_calls() > 1);
    assert!(target
        .commands
        .iter()
        .all(|c| !matches!(c, Command::DrawQuads(n) if *n > MIN_STAGING_VERTICES)));

    // Consecutive flushes on one strip collapse into a single GPU draw.
    let list = target.draw_list.as_ref().unwrap();
    assert_eq!(list.draws().len(), 1);
    assert_eq!(list.used_vertices(), 120);
}

#[test]
fn icons_land_centred_on_their_slot() {
    let registry = BlockRegistry::default();
    let atlas = TerrainAtlas1D::new(256, 16, 4096).unwrap();
    let mut drawer = IsometricDrawer::new(256);
    let transform = drawer.projection().transform;
    let mut target = RecordingTarget::default();

    let mut batch = drawer.begin_batch(&mut target, &registry, &atlas);
    batch.draw(BlockId(1), 32.0, 100.0, 60.0).unwrap();
    batch.end();

    let (mut min_x, mut max_x) = (f32::MAX, f32::MIN);
    let (mut min_y, mut max_y) = (f32::MAX, f32::MIN);
    for vertex in &target.vertices {
        let [x, y, z] = vertex.position;
        let screen = transform * Vector4::new(x, y, z, 1.0);
        min_x = min_x.min(screen.x);
        max_x = max_x.max(screen.x);
        min_y = min_y.min(screen.y);
        max_y = max_y.max(screen.y);
    }

    // The outline of a unit cube is symmetric about its centre on screen.
    let centre_x = (min_x + max_x) / 2.0;
    let centre_y = (min_y + max_y) / 2.0;
    assert!((centre_x - 100.0).abs() < 0.75, "centre x was {centre_x}");
    assert!((centre_y - 60.0).abs() < 0.75, "centre y was {centre_y}");
    assert!((max_x - min_x - 64.0).abs() < 0.05, "width was {}", max_x - min_x);
}

#[test]
fn transform_is_invertible() {
    let drawer = IsometricDrawer::new(256);
    assert!(drawer.projection().transform.invert().is_some());
}

#[test]
fn frame_draws_use_the_isometric_transform_after_the_batch_ends() {
    let registry = BlockRegistry::default();
    let atlas = TerrainAtlas1D::new(256, 16, 4096).unwrap();
    let mut drawer = IsometricDrawer::new(4096);
    let iso = drawer.projection().transform;
    let screen = screen_projection(800.0, 600.0);

    let mut frame = FrameRecorder::new(1024);
    frame.begin_frame(screen);
    let mut batch = drawer.begin_batch(&mut frame, &registry, &atlas);
    batch.draw(BlockId(1), 32.0, 100.0, 60.0).unwrap();
    batch.end();

    // The pop at the end of the batch leaves only the screen projection.
    assert_eq!(frame.active_transform(), screen);

    let list = frame.draw_list();
    assert_eq!(list.draws().len(), 1);
    assert_eq!(list.transforms()[list.draws()[0].transform], screen * iso);
    assert_eq!(frame.dropped_vertices(), 0);
}
