//! Legalizer area construction: seeding, growth, and absorption.
//!
//! A legalization pass groups the blocks of one type into disjoint
//! rectangular areas, each holding no more blocks than its tile capacity
//! allows. Areas are seeded on occupied cells spiralling out from the grid
//! center, then grown one lattice step at a time, swallowing any neighbour
//! area they run into. The surviving (unabsorbed) areas are fed to the
//! recursive bipartitioner.
//!
//! Areas live in a single arena (`Vec`) for the duration of one pass; the
//! per-cell pointer grid stores arena indices, so no reference cycles exist
//! between the grid and the areas.

use super::BlockMatrix;
use crate::legalizer::partition::Rect;
use quadra_device::{BlockType, BlockTypeId, Device};

/// A rectangular group of same-type blocks, aligned to the type's
/// `(repeat, height)` lattice.
#[derive(Debug, Clone)]
pub(crate) struct LegalizerArea {
    pub(crate) left: i32,
    pub(crate) top: i32,
    pub(crate) right: i32,
    pub(crate) bottom: i32,
    /// Stable indices of the blocks assigned to this area.
    pub(crate) blocks: Vec<usize>,
    /// Set when a growing neighbour has taken over this area's extent.
    pub(crate) absorbed: bool,
    num_tiles: u32,
    tile_capacity: f64,
    repeat: i32,
    height: i32,
}

impl LegalizerArea {
    fn seed(x: i32, y: i32, tile_capacity: f64, repeat: i32, height: i32) -> Self {
        Self {
            left: x,
            top: y,
            right: x,
            bottom: y,
            blocks: Vec::new(),
            absorbed: false,
            num_tiles: 0,
            tile_capacity,
            repeat,
            height,
        }
    }

    /// Number of blocks currently assigned.
    fn occupation(&self) -> usize {
        self.blocks.len()
    }

    /// Number of blocks the area may hold at the current tile capacity.
    fn capacity(&self) -> f64 {
        self.num_tiles as f64 * self.tile_capacity
    }

    fn increment_tiles(&mut self) {
        self.num_tiles += 1;
    }

    /// Extends the rectangle by one lattice step in the given direction.
    fn grow(&mut self, dx: i32, dy: i32) {
        match (dx, dy) {
            (-1, 0) => self.left -= self.repeat,
            (1, 0) => self.right += self.repeat,
            (0, -1) => self.top -= self.height,
            (0, 1) => self.bottom += self.height,
            _ => {}
        }
    }

    pub(crate) fn rect(&self) -> Rect {
        Rect {
            left: self.left,
            top: self.top,
            right: self.right,
            bottom: self.bottom,
        }
    }
}

/// Per-cell area ownership for one legalization pass.
struct PointerGrid {
    height: i32,
    cells: Vec<Option<usize>>,
}

impl PointerGrid {
    fn new(width: i32, height: i32) -> Self {
        Self {
            height,
            cells: vec![None; (width * height) as usize],
        }
    }

    fn get(&self, x: i32, y: i32) -> Option<usize> {
        self.cells[(x * self.height + y) as usize]
    }

    fn set(&mut self, x: i32, y: i32, area: usize) {
        self.cells[(x * self.height + y) as usize] = Some(area);
    }
}

/// Builds the disjoint area set for one block type.
///
/// Cells are visited in an outward diamond spiral from the grid center; each
/// occupied, unowned cell seeds a 1x1 area which is immediately grown until
/// its occupation fits its capacity or no direction can grow further.
pub(crate) fn build_areas(
    device: &Device,
    block_type: &BlockType,
    ty: BlockTypeId,
    matrix: &BlockMatrix,
    tile_capacity: f64,
) -> Vec<LegalizerArea> {
    let width = device.width() as i32;
    let height = device.height() as i32;
    let mut areas: Vec<LegalizerArea> = Vec::new();
    let mut pointers = PointerGrid::new(width, height);

    let x_center = width / 2;
    let y_center = height / 2;
    let max_dimension = x_center.max(y_center);

    let mut builder = AreaBuilder {
        device,
        ty,
        matrix,
        tile_capacity,
        repeat: block_type.repeat as i32,
        height: block_type.height as i32,
        grid_width: width,
        grid_height: height,
    };

    builder.try_new_area(&mut areas, &mut pointers, x_center, y_center);
    for dist1 in 1..max_dimension {
        for dist2 in -dist1..dist1 {
            builder.try_new_area(&mut areas, &mut pointers, x_center + dist1, y_center + dist2);
            builder.try_new_area(&mut areas, &mut pointers, x_center - dist1, y_center - dist2);
            builder.try_new_area(&mut areas, &mut pointers, x_center + dist2, y_center - dist1);
            builder.try_new_area(&mut areas, &mut pointers, x_center - dist2, y_center + dist1);
        }
    }

    areas
}

struct AreaBuilder<'a> {
    device: &'a Device,
    ty: BlockTypeId,
    matrix: &'a BlockMatrix,
    tile_capacity: f64,
    repeat: i32,
    height: i32,
    grid_width: i32,
    grid_height: i32,
}

impl AreaBuilder<'_> {
    fn try_new_area(
        &mut self,
        areas: &mut Vec<LegalizerArea>,
        pointers: &mut PointerGrid,
        x: i32,
        y: i32,
    ) {
        if x > 0
            && x < self.grid_width - 1
            && y > 0
            && y < self.grid_height - 1
            && !self.matrix.bucket(x, y).is_empty()
            && pointers.get(x, y).is_none()
        {
            self.new_area(areas, pointers, x, y);
        }
    }

    fn new_area(
        &mut self,
        areas: &mut Vec<LegalizerArea>,
        pointers: &mut PointerGrid,
        x: i32,
        y: i32,
    ) {
        let id = areas.len();
        let mut area = LegalizerArea::seed(x, y, self.tile_capacity, self.repeat, self.height);
        area.increment_tiles();
        area.blocks.extend_from_slice(self.matrix.bucket(x, y));
        areas.push(area);
        pointers.set(x, y, id);

        let mut directions: [(i32, i32); 4] = [(1, 0), (0, 1), (-1, 0), (0, -1)];
        // 0: original direction, 1: flipped, 2: exhausted both ways
        let mut statuses = [0u8; 4];
        let mut exhausted = 0;
        let mut dir = 0;

        while areas[id].occupation() as f64 > areas[id].capacity() && exhausted < 4 {
            if statuses[dir] == 0 && !self.growth_possible(&areas[id], directions[dir]) {
                directions[dir] = (-directions[dir].0, -directions[dir].1);
                statuses[dir] = 1;
            }
            if statuses[dir] == 1 && !self.growth_possible(&areas[id], directions[dir]) {
                statuses[dir] = 2;
                exhausted += 1;
            }
            if statuses[dir] != 2 {
                let mut goal = areas[id].rect();
                grow_rect(&mut goal, directions[dir], self.repeat, self.height);
                self.grow_to(areas, pointers, id, goal);
            }
            dir = (dir + 1) % 4;
        }
    }

    fn growth_possible(&self, area: &LegalizerArea, direction: (i32, i32)) -> bool {
        match direction {
            (0, 1) => area.bottom + 2 * self.height <= self.grid_height - 1,
            (0, -1) => area.top - self.height >= 1,
            (1, 0) => area.right + self.repeat <= self.grid_width - 2,
            _ => area.left - self.repeat >= 1,
        }
    }

    /// Extends the area cell by cell until it covers `goal`, absorbing any
    /// unabsorbed neighbour it sweeps over (the neighbour's extent is folded
    /// into the goal, so its cells and blocks are swept up too).
    fn grow_to(
        &mut self,
        areas: &mut [LegalizerArea],
        pointers: &mut PointerGrid,
        id: usize,
        mut goal: Rect,
    ) {
        loop {
            let area = areas[id].rect();
            let (rows, columns) = if area.left != goal.left {
                areas[id].grow(-1, 0);
                ((area.top, area.bottom), (area.left - self.repeat, area.left - self.repeat))
            } else if area.right != goal.right {
                areas[id].grow(1, 0);
                ((area.top, area.bottom), (area.right + self.repeat, area.right + self.repeat))
            } else if area.top != goal.top {
                areas[id].grow(0, -1);
                ((area.top - self.height, area.top - self.height), (area.left, area.right))
            } else if area.bottom != goal.bottom {
                areas[id].grow(0, 1);
                ((area.bottom + self.height, area.bottom + self.height), (area.left, area.right))
            } else {
                return;
            };

            let mut y = rows.0;
            while y <= rows.1 {
                let mut x = columns.0;
                while x <= columns.1 {
                    if pointers.get(x, y) == Some(id) {
                        x += self.repeat;
                        continue;
                    }

                    if let Some(neighbour) = pointers.get(x, y) {
                        if !areas[neighbour].absorbed {
                            areas[neighbour].absorbed = true;
                            goal.left = goal.left.min(areas[neighbour].left);
                            goal.right = goal.right.max(areas[neighbour].right);
                            goal.top = goal.top.min(areas[neighbour].top);
                            goal.bottom = goal.bottom.max(areas[neighbour].bottom);
                        }
                    }

                    pointers.set(x, y, id);
                    areas[id].blocks.extend_from_slice(self.matrix.bucket(x, y));
                    if self
                        .device
                        .site(x, y)
                        .is_some_and(|site| site.ty == self.ty)
                    {
                        areas[id].increment_tiles();
                    }

                    x += self.repeat;
                }
                y += self.height;
            }
        }
    }
}

fn grow_rect(rect: &mut Rect, direction: (i32, i32), repeat: i32, height: i32) {
    match direction {
        (-1, 0) => rect.left -= repeat,
        (1, 0) => rect.right += repeat,
        (0, -1) => rect.top -= height,
        (0, 1) => rect.bottom += height,
        _ => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::legalizer::BlockMatrix;
    use quadra_device::Device;

    fn clb_matrix(device: &Device, cells: &[(i32, i32, usize)]) -> BlockMatrix {
        let mut matrix = BlockMatrix::new(device.width() as i32, device.height() as i32);
        for &(x, y, block) in cells {
            matrix.push(x, y, block);
        }
        matrix
    }

    #[test]
    fn lone_cell_seeds_one_area() {
        let device = Device::new(8, 8).unwrap();
        let clb = device.clb_type_id();
        let block_type = device.block_type(clb).clone();
        let matrix = clb_matrix(&device, &[(4, 4, 0)]);

        let areas = build_areas(&device, &block_type, clb, &matrix, 1.0);
        assert_eq!(areas.len(), 1);
        assert!(!areas[0].absorbed);
        assert_eq!(areas[0].blocks, vec![0]);
        assert_eq!(areas[0].rect().left, 4);
        assert_eq!(areas[0].rect().right, 4);
    }

    #[test]
    fn overloaded_cell_grows() {
        let device = Device::new(8, 8).unwrap();
        let clb = device.clb_type_id();
        let block_type = device.block_type(clb).clone();
        let matrix = clb_matrix(&device, &[(4, 4, 0), (4, 4, 1), (4, 4, 2), (4, 4, 3)]);

        let areas = build_areas(&device, &block_type, clb, &matrix, 1.0);
        assert_eq!(areas.len(), 1);
        let area = &areas[0];
        let tiles = ((area.right - area.left) + 1) * ((area.bottom - area.top) + 1);
        assert!(tiles >= 4, "area holds {tiles} tiles for 4 blocks");
    }

    #[test]
    fn growth_absorbs_neighbour() {
        let device = Device::new(8, 8).unwrap();
        let clb = device.clb_type_id();
        let block_type = device.block_type(clb).clone();
        // The center cell seeds a small satisfied area first; the heavily
        // overloaded cell next to it then grows left over it.
        let mut cells = vec![(4, 4, 0)];
        cells.extend((1..9).map(|b| (5, 4, b)));
        let matrix = clb_matrix(&device, &cells);

        let areas = build_areas(&device, &block_type, clb, &matrix, 1.0);
        assert!(areas.iter().any(|a| a.absorbed), "no area was absorbed");

        // Every block sits in exactly one unabsorbed area.
        let mut seen = vec![0usize; 9];
        for area in areas.iter().filter(|a| !a.absorbed) {
            for &b in &area.blocks {
                seen[b] += 1;
            }
        }
        assert_eq!(seen, vec![1; 9]);
    }

    #[test]
    fn unabsorbed_rectangles_are_disjoint() {
        let device = Device::new(10, 10).unwrap();
        let clb = device.clb_type_id();
        let block_type = device.block_type(clb).clone();
        let matrix = clb_matrix(
            &device,
            &[
                (2, 2, 0),
                (2, 2, 1),
                (7, 7, 2),
                (7, 7, 3),
                (5, 5, 4),
                (5, 5, 5),
            ],
        );

        let areas = build_areas(&device, &block_type, clb, &matrix, 1.0);
        let live: Vec<_> = areas.iter().filter(|a| !a.absorbed).collect();
        for (i, a) in live.iter().enumerate() {
            for b in live.iter().skip(i + 1) {
                let overlap = a.left <= b.right
                    && b.left <= a.right
                    && a.top <= b.bottom
                    && b.top <= a.bottom;
                assert!(!overlap, "areas overlap");
            }
        }
    }

    #[test]
    fn growth_respects_grid_bounds() {
        let device = Device::new(6, 6).unwrap();
        let clb = device.clb_type_id();
        let block_type = device.block_type(clb).clone();
        // Far more blocks than the grid can hold in one column: force maximal growth.
        let cells: Vec<(i32, i32, usize)> = (0..16).map(|b| (1, 1, b)).collect();
        let matrix = clb_matrix(&device, &cells);

        let areas = build_areas(&device, &block_type, clb, &matrix, 1.0);
        for area in &areas {
            assert!(area.left >= 1);
            assert!(area.right <= 4);
            assert!(area.top >= 1);
            assert!(area.bottom <= 4);
        }
    }

    #[test]
    fn hard_lattice_growth() {
        let mut device = Device::new(10, 10).unwrap();
        let mult = device.add_hard_type("MULT", 2, 3, 2).unwrap();
        let block_type = device.block_type(mult).clone();
        let matrix = clb_matrix(&device, &[(5, 5, 0), (5, 5, 1), (5, 5, 2)]);

        let areas = build_areas(&device, &block_type, mult, &matrix, 1.0);
        assert_eq!(areas.len(), 1);
        let area = &areas[0];
        // Rectangle stays on the lattice.
        assert_eq!((area.left - 2) % 3, 0);
        assert_eq!((area.top - 1) % 2, 0);
        let cols = (area.right - area.left) / 3 + 1;
        let rows = (area.bottom - area.top) / 2 + 1;
        assert!(cols * rows >= 3);
    }
}
