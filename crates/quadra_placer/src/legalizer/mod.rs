//! Legalization: snapping linear coordinates to legal grid sites.
//!
//! Each pass buckets every block of a type into its closest legal site, grows
//! disjoint areas around overfull cells ([`area`]), and recursively
//! bipartitions each area onto distinct sites ([`partition`]). The result
//! lands in the temporary legal arrays; when it beats the best known cost at
//! tile capacity <= 1, it becomes the new best legal solution.
//!
//! The temporary arrays double as the anchor points the next linear solve
//! pulls toward; the best arrays provide the fixed coordinates of blocks
//! outside the solved type.

mod area;
mod partition;

use crate::cost::CostCalculator;
use crate::error::{PlaceResult, PlacerError};
use partition::Axis;
use quadra_device::{BlockCategory, BlockType, BlockTypeId, Device};
use quadra_netlist::BlockRegistry;

#[cfg(test)]
pub(crate) use area::build_areas;

/// Per-cell block buckets for one legalization pass.
pub(crate) struct BlockMatrix {
    height: i32,
    buckets: Vec<Vec<usize>>,
}

impl BlockMatrix {
    pub(crate) fn new(width: i32, height: i32) -> Self {
        Self {
            height,
            buckets: vec![Vec::new(); (width * height) as usize],
        }
    }

    pub(crate) fn push(&mut self, x: i32, y: i32, block: usize) {
        self.buckets[(x * self.height + y) as usize].push(block);
    }

    pub(crate) fn bucket(&self, x: i32, y: i32) -> &[usize] {
        &self.buckets[(x * self.height + y) as usize]
    }
}

/// Returns the legal site closest to a linear position, by the category's
/// own policy: quadrant selection for I/O pads, an outward-stepping column
/// search for CLBs, and lattice rounding for hard blocks.
fn closest_site(
    device: &Device,
    block_type: &BlockType,
    ty: BlockTypeId,
    x: f64,
    y: f64,
) -> PlaceResult<(i32, i32)> {
    let width = device.width() as i32;
    let height = device.height() as i32;

    match block_type.category {
        BlockCategory::Io => {
            let clamp_x = |v: f64| (v.round() as i32).clamp(1, width - 2);
            let clamp_y = |v: f64| (v.round() as i32).clamp(1, height - 2);
            // The grid diagonals split the border into four quadrants.
            Ok(if x > y {
                if x > height as f64 - y - 1.0 {
                    (width - 1, clamp_y(y)) // right
                } else {
                    (clamp_x(x), 0) // top
                }
            } else if x > height as f64 - y - 1.0 {
                (clamp_x(x), height - 1) // bottom
            } else {
                (0, clamp_y(y)) // left
            })
        }

        BlockCategory::Clb => {
            let row = y.clamp(1.0, (height - 2) as f64).round() as i32;

            // Hard-block columns interleave arbitrarily with CLB columns, so
            // the closest matching column is found by stepping outward.
            let mut column = x.round() as i32;
            let mut step = 1;
            let mut direction = if x > column as f64 { 1 } else { -1 };
            loop {
                if column > 0 && column < width - 1 && device.column_type(column as u32) == ty {
                    return Ok((column, row));
                }
                if step > 2 * width {
                    return Err(PlacerError::Integrity(format!(
                        "no column of type '{}' on the device",
                        block_type.name
                    )));
                }
                column += direction * step;
                step += 1;
                direction = -direction;
            }
        }

        BlockCategory::Hard => {
            let start = block_type.start as i32;
            let repeat = block_type.repeat as i32;
            let block_height = block_type.height as i32;

            let num_rows = (height - 2) / block_height;
            let num_columns = (width - start - 2) / repeat + 1;

            let column_index = ((x - start as f64) / repeat as f64)
                .clamp(0.0, (num_columns - 1) as f64)
                .round() as i32;
            let row_index = ((y - 1.0) / block_height as f64)
                .clamp(0.0, (num_rows - 1) as f64)
                .round() as i32;

            Ok((column_index * repeat + start, row_index * block_height + 1))
        }
    }
}

/// Legal placement state across a session: the temporary solution of the
/// current pass and the best solution ever scored.
pub struct Legalizer {
    num_io: usize,
    tmp_x: Vec<i32>,
    tmp_y: Vec<i32>,
    best_x: Vec<i32>,
    best_y: Vec<i32>,
    best_cost: f64,
}

impl Legalizer {
    /// Creates the legalizer, pinning every I/O pad's coordinates from its
    /// device site.
    ///
    /// # Errors
    ///
    /// Returns [`PlacerError::Configuration`] when an I/O pad has no site on
    /// the device.
    pub fn new(device: &Device, registry: &BlockRegistry) -> PlaceResult<Self> {
        let num_blocks = registry.num_blocks();
        let num_io = registry.num_io();

        let mut this = Self {
            num_io,
            tmp_x: vec![0; num_blocks],
            tmp_y: vec![0; num_blocks],
            best_x: vec![0; num_blocks],
            best_y: vec![0; num_blocks],
            best_cost: f64::MAX,
        };

        for i in 0..num_io {
            let (x, y) = device.block_site(i as u32).ok_or_else(|| {
                PlacerError::Configuration(format!("I/O pad at index {i} has no device site"))
            })?;
            this.best_x[i] = x as i32;
            this.best_y[i] = y as i32;
        }
        this.tmp_x.copy_from_slice(&this.best_x);
        this.tmp_y.copy_from_slice(&this.best_y);

        Ok(this)
    }

    /// The anchor points for pseudo-nets: the most recent legal solution.
    pub fn anchors_x(&self) -> &[i32] {
        &self.tmp_x
    }

    /// See [`anchors_x`](Self::anchors_x).
    pub fn anchors_y(&self) -> &[i32] {
        &self.tmp_y
    }

    /// The best legal X coordinates scored so far (I/O entries are fixed).
    pub fn best_legal_x(&self) -> &[i32] {
        &self.best_x
    }

    /// The best legal Y coordinates scored so far.
    pub fn best_legal_y(&self) -> &[i32] {
        &self.best_y
    }

    /// The cost of the best legal solution, `f64::MAX` before the first one.
    pub fn best_cost(&self) -> f64 {
        self.best_cost
    }

    /// Runs one legalization pass over every movable block type, then scores
    /// the candidate and updates the best legal solution on improvement.
    #[allow(clippy::too_many_arguments)]
    pub fn legalize(
        &mut self,
        device: &mut Device,
        registry: &BlockRegistry,
        cost: &mut dyn CostCalculator,
        linear_x: &[f64],
        linear_y: &[f64],
        tile_capacity: f64,
        legalize_io: bool,
    ) -> PlaceResult<()> {
        if legalize_io && self.num_io > 0 {
            let matrix = self.build_block_matrix(device, registry, 0, linear_x, linear_y)?;
            self.legalize_io_blocks(device, &matrix);
        }

        for type_index in 1..device.type_count() {
            self.legalize_block_type(
                device,
                registry,
                type_index,
                linear_x,
                linear_y,
                tile_capacity,
            )?;
        }

        self.update_best_legal(device, cost, tile_capacity)
    }

    /// Buckets every block of one type into its closest legal site.
    fn build_block_matrix(
        &self,
        device: &Device,
        registry: &BlockRegistry,
        type_index: usize,
        linear_x: &[f64],
        linear_y: &[f64],
    ) -> PlaceResult<BlockMatrix> {
        let ty = BlockTypeId::from_raw(type_index as u32);
        let block_type = device.block_type(ty);
        let mut matrix = BlockMatrix::new(device.width() as i32, device.height() as i32);
        for index in registry.type_range(type_index) {
            let (x, y) = closest_site(device, block_type, ty, linear_x[index], linear_y[index])?;
            matrix.push(x, y, index);
        }
        Ok(matrix)
    }

    /// Distributes the I/O pads evenly over the border ring.
    ///
    /// Walks the `2 * (width + height - 4)` non-corner border sites clockwise
    /// from `(1, 0)`, consuming the bucketed pads in walk order; after site
    /// `s`, `floor(blocks_per_site * (s + 1))` pads have been emitted.
    fn legalize_io_blocks(&mut self, device: &Device, matrix: &BlockMatrix) {
        let perimeter = device.perimeter_sites();
        let blocks_per_site = self.num_io as f64 / perimeter.len() as f64;

        let ordered: Vec<usize> = perimeter
            .iter()
            .flat_map(|&(x, y)| matrix.bucket(x as i32, y as i32).iter().copied())
            .collect();
        debug_assert_eq!(ordered.len(), self.num_io);

        let mut placed = 0;
        for (site_index, &(x, y)) in perimeter.iter().enumerate() {
            let emitted = (blocks_per_site * (site_index + 1) as f64).floor() as usize;
            while placed < emitted.min(self.num_io) {
                let block = ordered[placed];
                self.tmp_x[block] = x as i32;
                self.tmp_y[block] = y as i32;
                placed += 1;
            }
        }
        // Guard against float rounding leaving a straggler unplaced.
        if let Some(&(x, y)) = perimeter.last() {
            while placed < ordered.len() {
                let block = ordered[placed];
                self.tmp_x[block] = x as i32;
                self.tmp_y[block] = y as i32;
                placed += 1;
            }
        }
    }

    /// Legalizes all blocks of one movable type.
    fn legalize_block_type(
        &mut self,
        device: &Device,
        registry: &BlockRegistry,
        type_index: usize,
        linear_x: &[f64],
        linear_y: &[f64],
        tile_capacity: f64,
    ) -> PlaceResult<()> {
        if registry.type_range(type_index).is_empty() {
            return Ok(());
        }

        let ty = BlockTypeId::from_raw(type_index as u32);
        let block_type = device.block_type(ty).clone();
        let matrix = self.build_block_matrix(device, registry, type_index, linear_x, linear_y)?;
        let areas = area::build_areas(device, &block_type, ty, &matrix, tile_capacity);

        for area in areas {
            if !area.absorbed {
                let rect = area.rect();
                partition::legalize_area(
                    device,
                    &block_type,
                    ty,
                    linear_x,
                    linear_y,
                    &mut self.tmp_x,
                    &mut self.tmp_y,
                    rect,
                    area.blocks,
                    Axis::X,
                )?;
            }
        }
        Ok(())
    }

    /// Scores the temporary solution and promotes it to best on strict
    /// improvement at tile capacity <= 1.
    ///
    /// Calculators that read committed state get the candidate committed
    /// first; when the candidate loses, the device is reverted to the best
    /// solution.
    fn update_best_legal(
        &mut self,
        device: &mut Device,
        cost: &mut dyn CostCalculator,
        tile_capacity: f64,
    ) -> PlaceResult<()> {
        let update = cost.requires_device_update();
        if update {
            Self::apply(device, &self.tmp_x, &self.tmp_y)?;
        }

        let new_cost = cost.calculate(&self.tmp_x, &self.tmp_y);

        if new_cost < self.best_cost && tile_capacity <= 1.0 {
            self.best_x[self.num_io..].copy_from_slice(&self.tmp_x[self.num_io..]);
            self.best_y[self.num_io..].copy_from_slice(&self.tmp_y[self.num_io..]);
            self.best_cost = new_cost;
        } else if update {
            Self::apply(device, &self.best_x, &self.best_y)?;
        }
        Ok(())
    }

    /// Commits the best legal solution to the device occupancy.
    ///
    /// # Errors
    ///
    /// Returns [`PlacerError::Integrity`] when no legal solution was ever
    /// scored, and bubbles device errors for conflicting sites.
    pub fn commit_best(&self, device: &mut Device) -> PlaceResult<()> {
        if self.best_cost == f64::MAX {
            return Err(PlacerError::Integrity(
                "no legal placement was found to commit".into(),
            ));
        }
        Self::apply(device, &self.best_x, &self.best_y)
    }

    /// Rewrites the device occupancy from a coordinate set, block handles
    /// being the registry indices.
    fn apply(device: &mut Device, x: &[i32], y: &[i32]) -> PlaceResult<()> {
        device.clear_occupants();
        for (index, (&bx, &by)) in x.iter().zip(y).enumerate() {
            let (bx, by) = match (u32::try_from(bx), u32::try_from(by)) {
                (Ok(bx), Ok(by)) => (bx, by),
                _ => {
                    return Err(PlacerError::Integrity(format!(
                        "block index {index} has no legal coordinates"
                    )))
                }
            };
            device.place_block(bx, by, index as u32)?;
        }
        Ok(())
    }

    #[cfg(test)]
    pub(crate) fn set_tmp_for_test(&mut self, x: &[i32], y: &[i32]) {
        self.tmp_x.copy_from_slice(x);
        self.tmp_y.copy_from_slice(y);
    }

    #[cfg(test)]
    pub(crate) fn set_best_for_test(&mut self, x: &[i32], y: &[i32]) {
        self.best_x.copy_from_slice(x);
        self.best_y.copy_from_slice(y);
        self.best_cost = 0.0;
    }

    #[cfg(test)]
    pub(crate) fn tmp_for_test(&self) -> (&[i32], &[i32]) {
        (&self.tmp_x, &self.tmp_y)
    }
}
