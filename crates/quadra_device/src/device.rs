//! The device grid: typed columns, sites, and block occupancy.

use crate::error::DeviceError;
use crate::ids::BlockTypeId;
use crate::types::{BlockCategory, BlockType};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A single placement site on the grid.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Serialize, Deserialize)]
pub struct Site {
    /// Column of the site.
    pub x: u32,
    /// Row of the site (for multi-row hard blocks, the top row).
    pub y: u32,
    /// The block type this site accepts.
    pub ty: BlockTypeId,
}

/// A rectangular FPGA-like device grid with typed columns.
///
/// The border ring carries I/O pad sites (corners excluded). Interior columns
/// default to CLB and can be carved into hard-block columns via
/// [`add_hard_type`](Self::add_hard_type). Occupancy maps sites to
/// caller-defined `u32` block handles; the placer uses its stable block
/// indices as handles.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Device {
    width: u32,
    height: u32,
    types: Vec<BlockType>,
    columns: Vec<BlockTypeId>,
    occupants: Vec<Option<u32>>,
    block_sites: BTreeMap<u32, (u32, u32)>,
}

impl Device {
    /// Creates a `width` x `height` grid with an I/O border ring and CLB
    /// interior columns.
    ///
    /// # Errors
    ///
    /// Returns [`DeviceError::Configuration`] if either dimension is below 3
    /// (one interior row/column plus the border).
    pub fn new(width: u32, height: u32) -> Result<Self, DeviceError> {
        if width < 3 || height < 3 {
            return Err(DeviceError::Configuration(format!(
                "grid must be at least 3x3, got {width}x{height}"
            )));
        }

        let io = BlockTypeId::from_raw(0);
        let clb = BlockTypeId::from_raw(1);
        let mut columns = vec![clb; width as usize];
        columns[0] = io;
        columns[width as usize - 1] = io;

        Ok(Self {
            width,
            height,
            types: vec![BlockType::io(), BlockType::clb()],
            columns,
            occupants: vec![None; (width * height) as usize],
            block_sites: BTreeMap::new(),
        })
    }

    /// Registers a hard-block type and carves its columns out of the interior.
    ///
    /// Sites of the new type occur at columns `start + k * repeat` and rows
    /// `1 + r * height` whose full footprint fits inside the interior.
    ///
    /// # Errors
    ///
    /// Returns [`DeviceError::Configuration`] when the lattice is degenerate,
    /// falls outside the interior, or collides with another hard-block type.
    pub fn add_hard_type(
        &mut self,
        name: impl Into<String>,
        start: u32,
        repeat: u32,
        height: u32,
    ) -> Result<BlockTypeId, DeviceError> {
        let name = name.into();
        if repeat == 0 || height == 0 {
            return Err(DeviceError::Configuration(format!(
                "hard type '{name}' must have repeat >= 1 and height >= 1"
            )));
        }
        if start == 0 || start > self.width - 2 {
            return Err(DeviceError::Configuration(format!(
                "hard type '{name}' start column {start} is outside the interior"
            )));
        }
        if height > self.height - 2 {
            return Err(DeviceError::Configuration(format!(
                "hard type '{name}' height {height} does not fit a {}-row interior",
                self.height - 2
            )));
        }

        let mut x = start;
        while x <= self.width - 2 {
            let current = self.columns[x as usize];
            if self.types[current.as_raw() as usize].category == BlockCategory::Hard {
                return Err(DeviceError::Configuration(format!(
                    "hard type '{name}' column {x} collides with type '{}'",
                    self.types[current.as_raw() as usize].name
                )));
            }
            x += repeat;
        }

        let id = BlockTypeId::from_raw(self.types.len() as u32);
        let mut x = start;
        while x <= self.width - 2 {
            self.columns[x as usize] = id;
            x += repeat;
        }
        self.types.push(BlockType::hard(name, start, repeat, height));
        Ok(id)
    }

    /// Returns the grid width.
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Returns the grid height.
    pub fn height(&self) -> u32 {
        self.height
    }

    /// Returns the block type table. Index 0 is I/O, index 1 is CLB.
    pub fn types(&self) -> &[BlockType] {
        &self.types
    }

    /// Returns the block type with the given ID.
    pub fn block_type(&self, id: BlockTypeId) -> &BlockType {
        &self.types[id.as_raw() as usize]
    }

    /// Returns the ID of the I/O pad type.
    pub fn io_type_id(&self) -> BlockTypeId {
        BlockTypeId::from_raw(0)
    }

    /// Returns the ID of the CLB type.
    pub fn clb_type_id(&self) -> BlockTypeId {
        BlockTypeId::from_raw(1)
    }

    /// Returns the number of block types, including I/O.
    pub fn type_count(&self) -> usize {
        self.types.len()
    }

    /// Returns the number of movable (non-I/O) block types.
    pub fn movable_type_count(&self) -> usize {
        self.types.len() - 1
    }

    /// Returns the type of the given column. Border columns are I/O.
    pub fn column_type(&self, x: u32) -> BlockTypeId {
        self.columns[x as usize]
    }

    /// Returns the site at `(x, y)`, if the coordinate is one.
    ///
    /// Border cells (corners included) are I/O sites. An interior cell is a
    /// site when its column type has a site anchored there: every row for CLB
    /// columns, lattice rows with a full in-grid footprint for hard-block
    /// columns.
    pub fn site(&self, x: i32, y: i32) -> Option<Site> {
        if x < 0 || y < 0 || x >= self.width as i32 || y >= self.height as i32 {
            return None;
        }
        let (x, y) = (x as u32, y as u32);

        let on_x_border = x == 0 || x == self.width - 1;
        let on_y_border = y == 0 || y == self.height - 1;
        if on_x_border || on_y_border {
            return Some(Site {
                x,
                y,
                ty: self.io_type_id(),
            });
        }

        let ty = self.columns[x as usize];
        match self.types[ty.as_raw() as usize].category {
            BlockCategory::Io => None,
            BlockCategory::Clb => Some(Site { x, y, ty }),
            BlockCategory::Hard => {
                let h = self.types[ty.as_raw() as usize].height;
                let anchored = (y - 1) % h == 0;
                let fits = y + h - 1 <= self.height - 2;
                (anchored && fits).then_some(Site { x, y, ty })
            }
        }
    }

    /// Returns the block handle occupying `(x, y)`, if any.
    pub fn occupant(&self, x: u32, y: u32) -> Option<u32> {
        self.occupants[(x * self.height + y) as usize]
    }

    /// Returns the site coordinates of a placed block handle.
    pub fn block_site(&self, handle: u32) -> Option<(u32, u32)> {
        self.block_sites.get(&handle).copied()
    }

    /// Places a block handle on the site at `(x, y)`.
    ///
    /// # Errors
    ///
    /// [`DeviceError::InvalidSite`] when `(x, y)` is not a site,
    /// [`DeviceError::FullSite`] when another block occupies it, and
    /// [`DeviceError::Configuration`] when the handle is already placed.
    pub fn place_block(&mut self, x: u32, y: u32, handle: u32) -> Result<(), DeviceError> {
        if self.site(x as i32, y as i32).is_none() {
            return Err(DeviceError::InvalidSite {
                x: x as i32,
                y: y as i32,
            });
        }
        if self.block_sites.contains_key(&handle) {
            return Err(DeviceError::Configuration(format!(
                "block handle {handle} is already placed"
            )));
        }
        let slot = (x * self.height + y) as usize;
        if let Some(other) = self.occupants[slot] {
            if other != handle {
                return Err(DeviceError::FullSite { x, y });
            }
        }
        self.occupants[slot] = Some(handle);
        self.block_sites.insert(handle, (x, y));
        Ok(())
    }

    /// Removes a block handle from the grid. Unplaced handles are ignored.
    pub fn remove_block(&mut self, handle: u32) {
        if let Some((x, y)) = self.block_sites.remove(&handle) {
            self.occupants[(x * self.height + y) as usize] = None;
        }
    }

    /// Clears the entire occupancy map.
    pub fn clear_occupants(&mut self) {
        self.occupants.fill(None);
        self.block_sites.clear();
    }

    /// Returns the border I/O sites in clockwise walk order, starting at
    /// `(1, 0)` and excluding the four corners.
    ///
    /// The walk covers exactly `2 * (width + height - 4)` sites: the top row
    /// left to right, the right column top to bottom, the bottom row right to
    /// left, and the left column bottom to top.
    pub fn perimeter_sites(&self) -> Vec<(u32, u32)> {
        let (w, h) = (self.width, self.height);
        let mut sites = Vec::with_capacity((2 * (w + h - 4)) as usize);
        for x in 1..w - 1 {
            sites.push((x, 0));
        }
        for y in 1..h - 1 {
            sites.push((w - 1, y));
        }
        for x in (1..w - 1).rev() {
            sites.push((x, h - 1));
        }
        for y in (1..h - 1).rev() {
            sites.push((0, y));
        }
        sites
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn mult_device() -> Device {
        let mut device = Device::new(10, 10).unwrap();
        device.add_hard_type("MULT", 2, 3, 2).unwrap();
        device
    }

    #[test]
    fn minimum_grid() {
        assert!(Device::new(3, 3).is_ok());
        assert!(Device::new(2, 6).is_err());
        assert!(Device::new(6, 2).is_err());
    }

    #[test]
    fn border_columns_are_io() {
        let device = Device::new(6, 6).unwrap();
        assert_eq!(device.column_type(0), device.io_type_id());
        assert_eq!(device.column_type(5), device.io_type_id());
        for x in 1..5 {
            assert_eq!(device.column_type(x), device.clb_type_id());
        }
    }

    #[test]
    fn border_cells_are_io_sites() {
        let device = Device::new(6, 6).unwrap();
        for (x, y) in [(0, 0), (5, 5), (1, 0), (0, 1), (5, 3)] {
            let site = device.site(x, y).unwrap();
            assert_eq!(site.ty, device.io_type_id());
        }
    }

    #[test]
    fn out_of_grid_is_not_a_site() {
        let device = Device::new(6, 6).unwrap();
        assert!(device.site(-1, 2).is_none());
        assert!(device.site(2, -1).is_none());
        assert!(device.site(6, 2).is_none());
        assert!(device.site(2, 6).is_none());
    }

    #[test]
    fn clb_sites_on_every_interior_row() {
        let device = Device::new(6, 6).unwrap();
        for y in 1..5 {
            let site = device.site(2, y).unwrap();
            assert_eq!(site.ty, device.clb_type_id());
        }
    }

    #[test]
    fn hard_columns_carved_from_interior() {
        let device = mult_device();
        let mult = BlockTypeId::from_raw(2);
        assert_eq!(device.column_type(2), mult);
        assert_eq!(device.column_type(5), mult);
        assert_eq!(device.column_type(8), mult);
        assert_eq!(device.column_type(3), device.clb_type_id());
    }

    #[test]
    fn hard_sites_on_row_lattice() {
        let device = mult_device();
        // height 2 on a 10-row grid: anchors at y in {1, 3, 5, 7}
        for y in [1, 3, 5, 7] {
            assert!(device.site(2, y).is_some(), "expected site at (2, {y})");
        }
        for y in [2, 4, 6, 8] {
            assert!(device.site(2, y).is_none(), "no anchor expected at (2, {y})");
        }
    }

    #[test]
    fn hard_type_collision_rejected() {
        let mut device = Device::new(10, 10).unwrap();
        device.add_hard_type("MULT", 2, 3, 2).unwrap();
        let err = device.add_hard_type("RAM", 2, 4, 4);
        assert!(err.is_err());
    }

    #[test]
    fn hard_type_validation() {
        let mut device = Device::new(10, 10).unwrap();
        assert!(device.add_hard_type("BAD", 0, 3, 2).is_err());
        assert!(device.add_hard_type("BAD", 9, 3, 2).is_err());
        assert!(device.add_hard_type("BAD", 2, 0, 2).is_err());
        assert!(device.add_hard_type("BAD", 2, 3, 0).is_err());
        assert!(device.add_hard_type("BAD", 2, 3, 9).is_err());
    }

    #[test]
    fn occupancy_roundtrip() {
        let mut device = Device::new(6, 6).unwrap();
        device.place_block(2, 3, 7).unwrap();
        assert_eq!(device.occupant(2, 3), Some(7));
        assert_eq!(device.block_site(7), Some((2, 3)));

        device.remove_block(7);
        assert_eq!(device.occupant(2, 3), None);
        assert_eq!(device.block_site(7), None);
    }

    #[test]
    fn full_site_rejected() {
        let mut device = Device::new(6, 6).unwrap();
        device.place_block(2, 3, 7).unwrap();
        let err = device.place_block(2, 3, 8).unwrap_err();
        assert!(matches!(err, DeviceError::FullSite { x: 2, y: 3 }));
    }

    #[test]
    fn double_placement_rejected() {
        let mut device = Device::new(6, 6).unwrap();
        device.place_block(2, 3, 7).unwrap();
        assert!(device.place_block(3, 3, 7).is_err());
    }

    #[test]
    fn invalid_site_rejected() {
        let mut device = mult_device();
        // (2, 2) is inside a MULT column but off the row lattice.
        let err = device.place_block(2, 2, 7).unwrap_err();
        assert!(matches!(err, DeviceError::InvalidSite { .. }));
    }

    #[test]
    fn clear_occupants() {
        let mut device = Device::new(6, 6).unwrap();
        device.place_block(2, 3, 7).unwrap();
        device.place_block(1, 0, 8).unwrap();
        device.clear_occupants();
        assert_eq!(device.occupant(2, 3), None);
        assert_eq!(device.block_site(8), None);
    }

    #[test]
    fn perimeter_walk_is_clockwise_and_corner_free() {
        let device = Device::new(6, 6).unwrap();
        let sites = device.perimeter_sites();
        assert_eq!(sites.len(), 2 * (6 + 6 - 4));
        assert_eq!(sites[0], (1, 0));
        assert_eq!(sites[4], (5, 1));
        assert_eq!(*sites.last().unwrap(), (0, 1));
        for &(x, y) in &sites {
            assert!(device.site(x as i32, y as i32).is_some());
        }
    }

    #[test]
    fn serde_roundtrip() {
        let mut device = mult_device();
        device.place_block(2, 3, 1).unwrap();
        let json = serde_json::to_string(&device).unwrap();
        let restored: Device = serde_json::from_str(&json).unwrap();
        assert_eq!(restored.width(), 10);
        assert_eq!(restored.occupant(2, 3), Some(1));
        assert_eq!(restored.column_type(5), BlockTypeId::from_raw(2));
    }
}
