//! Grid placement of icons, inventory style.

/// A grid of square slots, filled row by row from the top left.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct InventoryLayout {
    /// Slots per row, at least one
    pub columns: u32,
    /// Distance between neighbouring slot centres in pixels
    pub slot_size: f32,
    /// Icon size as passed to the drawer: half the icon's width in pixels
    pub icon_size: f32,
    /// Centre of slot 0 in pixels
    pub origin: [f32; 2],
}

impl InventoryLayout {
    /// Smallest and largest icon size the viewer allows.
    pub const ICON_SIZE_RANGE: (f32, f32) = (4.0, 128.0);

    /// A layout with at least one column.
    pub fn new(columns: u32, slot_size: f32, icon_size: f32, origin: [f32; 2]) -> Self {
        Self {
            columns: columns.max(1),
            slot_size,
            icon_size,
            origin,
        }
    }

    /// Centre of slot `index` in pixels.
    pub fn slot_center(&self, index: usize) -> (f32, f32) {
        let columns = self.columns.max(1) as usize;
        let column = (index % columns) as f32;
        let row = (index / columns) as f32;

        (
            self.origin[0] + column * self.slot_size,
            self.origin[1] + row * self.slot_size,
        )
    }

    /// Rows needed to show `slots` slots.
    pub fn rows_for(&self, slots: usize) -> usize {
        slots.div_ceil(self.columns.max(1) as usize)
    }

    /// Grows or shrinks the icons by `delta`, keeping the slot pitch at least
    /// as large as the icon's width.
    pub fn resize_icons(&mut self, delta: f32) {
        let (min, max) = Self::ICON_SIZE_RANGE;
        self.icon_size = (self.icon_size + delta).clamp(min, max);
        self.slot_size = self.slot_size.max(self.icon_size * 2.0);
    }

    /// Moves the whole grid by `(dx, dy)` pixels.
    pub fn translate(&mut self, dx: f32, dy: f32) {
        self.origin[0] += dx;
        self.origin[1] += dy;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn slots_fill_rows_left_to_right() {
        let layout = InventoryLayout::new(3, 40.0, 32.0, [20.0, 30.0]);

        assert_eq!(layout.slot_center(0), (20.0, 30.0));
        assert_eq!(layout.slot_center(2), (100.0, 30.0));
        assert_eq!(layout.slot_center(3), (20.0, 70.0));
    }

    #[test]
    fn rows_round_up() {
        let layout = InventoryLayout::new(9, 40.0, 32.0, [0.0, 0.0]);

        assert_eq!(layout.rows_for(0), 0);
        assert_eq!(layout.rows_for(9), 1);
        assert_eq!(layout.rows_for(10), 2);
    }

    #[test]
    fn zero_columns_behaves_as_one() {
        let layout = InventoryLayout::new(0, 10.0, 8.0, [0.0, 0.0]);
        assert_eq!(layout.slot_center(2), (0.0, 20.0));
        assert_eq!(layout.rows_for(2), 2);
    }

    #[test]
    fn icon_size_is_clamped_and_slots_grow_with_it() {
        let mut layout = InventoryLayout::new(9, 48.0, 32.0, [0.0, 0.0]);

        layout.resize_icons(-8.0);
        assert_eq!(layout.icon_size, 24.0);
        assert_eq!(layout.slot_size, 48.0);

        layout.resize_icons(16.0);
        assert_eq!(layout.icon_size, 40.0);
        assert_eq!(layout.slot_size, 80.0);

        layout.resize_icons(-1000.0);
        assert_eq!(layout.icon_size, InventoryLayout::ICON_SIZE_RANGE.0);
    }
}
