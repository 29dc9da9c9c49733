//! Stable block indices, grouped by block type.
//!
//! The placer works on dense coordinate arrays, one slot per block. The
//! [`BlockRegistry`] fixes the array layout once at session start: I/O pads
//! occupy `[0, num_io)`, followed by one contiguous range per movable type in
//! device type-table order. Indices never change after construction.

use crate::data::Netlist;
use crate::ids::BlockId;
use quadra_device::Device;
use std::ops::Range;

/// Errors detected while building a [`BlockRegistry`].
#[derive(Debug, thiserror::Error)]
pub enum RegistryError {
    /// The device type table does not start with an I/O type.
    #[error("device type table must start with an I/O type")]
    MissingIoType,

    /// A block references a type ID outside the device type table.
    #[error("block '{name}' references unknown block type {type_id}")]
    UnknownType {
        /// Name of the offending block.
        name: String,
        /// The out-of-range type ID.
        type_id: u32,
    },

    /// A block's category disagrees with its device type's category.
    #[error("block '{name}' category does not match device type '{type_name}'")]
    CategoryMismatch {
        /// Name of the offending block.
        name: String,
        /// Name of the device type the block references.
        type_name: String,
    },
}

/// Stable integer indices for every block, I/O pads first.
///
/// `type_start` has one entry per device type plus a terminator:
/// `type_start[0] = 0`, `type_start[1] = num_io`, and
/// `type_start[type_count] = num_blocks`, monotonically non-decreasing.
#[derive(Debug, Clone)]
pub struct BlockRegistry {
    order: Vec<BlockId>,
    indices: Vec<usize>,
    type_start: Vec<usize>,
}

impl BlockRegistry {
    /// Builds the registry from a netlist against a device type table.
    ///
    /// Blocks keep their netlist insertion order within each type range, so
    /// the layout is deterministic.
    ///
    /// # Errors
    ///
    /// Returns a [`RegistryError`] when the device type table does not start
    /// with I/O, or when a block references a missing or mismatched type.
    pub fn build(netlist: &Netlist, device: &Device) -> Result<Self, RegistryError> {
        if device.types().is_empty()
            || device.types()[0].category != quadra_device::BlockCategory::Io
        {
            return Err(RegistryError::MissingIoType);
        }

        let type_count = device.type_count();
        let mut buckets: Vec<Vec<BlockId>> = vec![Vec::new(); type_count];
        for block in &netlist.blocks {
            let t = block.ty.as_raw() as usize;
            if t >= type_count {
                return Err(RegistryError::UnknownType {
                    name: block.name.clone(),
                    type_id: block.ty.as_raw(),
                });
            }
            if device.types()[t].category != block.category {
                return Err(RegistryError::CategoryMismatch {
                    name: block.name.clone(),
                    type_name: device.types()[t].name.clone(),
                });
            }
            buckets[t].push(block.id);
        }

        let mut order = Vec::with_capacity(netlist.block_count());
        let mut type_start = Vec::with_capacity(type_count + 1);
        for bucket in &buckets {
            type_start.push(order.len());
            order.extend_from_slice(bucket);
        }
        type_start.push(order.len());

        let mut indices = vec![usize::MAX; netlist.block_count()];
        for (index, id) in order.iter().enumerate() {
            indices[id.as_raw() as usize] = index;
        }

        Ok(Self {
            order,
            indices,
            type_start,
        })
    }

    /// Returns the total number of registered blocks.
    pub fn num_blocks(&self) -> usize {
        self.order.len()
    }

    /// Returns the number of I/O pads (indices `[0, num_io)`).
    pub fn num_io(&self) -> usize {
        self.type_start[1]
    }

    /// Returns the number of movable (non-I/O) blocks.
    pub fn num_movable(&self) -> usize {
        self.num_blocks() - self.num_io()
    }

    /// Returns the number of movable block types.
    pub fn movable_type_count(&self) -> usize {
        self.type_start.len() - 2
    }

    /// Returns the per-type start offsets, terminated by `num_blocks`.
    pub fn type_start(&self) -> &[usize] {
        &self.type_start
    }

    /// Returns the index range of the given device type.
    pub fn type_range(&self, type_index: usize) -> Range<usize> {
        self.type_start[type_index]..self.type_start[type_index + 1]
    }

    /// Returns the index range solved by the given solve mode.
    ///
    /// Mode 0 frees every movable block; mode `m >= 1` frees only the blocks
    /// of movable type `m` (device type `m`, type 0 being I/O).
    pub fn active_range(&self, solve_mode: usize) -> Range<usize> {
        if solve_mode == 0 {
            self.num_io()..self.num_blocks()
        } else {
            self.type_range(solve_mode)
        }
    }

    /// Returns the stable index of a block.
    pub fn index_of(&self, block: BlockId) -> usize {
        self.indices[block.as_raw() as usize]
    }

    /// Returns the block at a stable index.
    pub fn block_at(&self, index: usize) -> BlockId {
        self.order[index]
    }

    /// Iterates over `(index, block)` pairs in index order.
    pub fn iter(&self) -> impl Iterator<Item = (usize, BlockId)> + '_ {
        self.order.iter().copied().enumerate()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::Block;
    use quadra_device::{BlockCategory, BlockTypeId};

    fn block(name: &str, ty: u32, category: BlockCategory) -> Block {
        Block {
            id: BlockId::from_raw(0),
            name: name.into(),
            ty: BlockTypeId::from_raw(ty),
            category,
        }
    }

    fn mixed_fixture() -> (Netlist, Device) {
        let mut device = Device::new(10, 10).unwrap();
        device.add_hard_type("MULT", 2, 3, 2).unwrap();

        let mut nl = Netlist::new();
        // Interleave types to prove grouping is by type, not insertion order.
        nl.add_block(block("clb_0", 1, BlockCategory::Clb));
        nl.add_block(block("pad_0", 0, BlockCategory::Io));
        nl.add_block(block("mult_0", 2, BlockCategory::Hard));
        nl.add_block(block("clb_1", 1, BlockCategory::Clb));
        nl.add_block(block("pad_1", 0, BlockCategory::Io));
        (nl, device)
    }

    #[test]
    fn groups_io_first_then_types() {
        let (nl, device) = mixed_fixture();
        let reg = BlockRegistry::build(&nl, &device).unwrap();

        assert_eq!(reg.num_blocks(), 5);
        assert_eq!(reg.num_io(), 2);
        assert_eq!(reg.num_movable(), 3);
        assert_eq!(reg.type_start(), &[0, 2, 4, 5]);

        assert_eq!(nl.block(reg.block_at(0)).name, "pad_0");
        assert_eq!(nl.block(reg.block_at(1)).name, "pad_1");
        assert_eq!(nl.block(reg.block_at(2)).name, "clb_0");
        assert_eq!(nl.block(reg.block_at(3)).name, "clb_1");
        assert_eq!(nl.block(reg.block_at(4)).name, "mult_0");
    }

    #[test]
    fn type_start_is_monotone() {
        let (nl, device) = mixed_fixture();
        let reg = BlockRegistry::build(&nl, &device).unwrap();
        let starts = reg.type_start();
        assert_eq!(starts[0], 0);
        assert_eq!(*starts.last().unwrap(), reg.num_blocks());
        assert!(starts.windows(2).all(|w| w[0] <= w[1]));
    }

    #[test]
    fn index_of_inverts_block_at() {
        let (nl, device) = mixed_fixture();
        let reg = BlockRegistry::build(&nl, &device).unwrap();
        for (index, id) in reg.iter() {
            assert_eq!(reg.index_of(id), index);
        }
        let _ = nl;
    }

    #[test]
    fn active_ranges() {
        let (nl, device) = mixed_fixture();
        let reg = BlockRegistry::build(&nl, &device).unwrap();
        assert_eq!(reg.active_range(0), 2..5); // all movable
        assert_eq!(reg.active_range(1), 2..4); // CLBs
        assert_eq!(reg.active_range(2), 4..5); // MULTs
        assert_eq!(reg.movable_type_count(), 2);
    }

    #[test]
    fn empty_type_gets_empty_range() {
        let mut device = Device::new(10, 10).unwrap();
        device.add_hard_type("MULT", 2, 3, 2).unwrap();
        let mut nl = Netlist::new();
        nl.add_block(block("clb_0", 1, BlockCategory::Clb));
        let reg = BlockRegistry::build(&nl, &device).unwrap();
        assert_eq!(reg.active_range(2), 1..1);
    }

    #[test]
    fn unknown_type_rejected() {
        let device = Device::new(6, 6).unwrap();
        let mut nl = Netlist::new();
        nl.add_block(block("weird", 9, BlockCategory::Hard));
        let err = BlockRegistry::build(&nl, &device).unwrap_err();
        assert!(matches!(err, RegistryError::UnknownType { .. }));
    }

    #[test]
    fn category_mismatch_rejected() {
        let device = Device::new(6, 6).unwrap();
        let mut nl = Netlist::new();
        nl.add_block(block("pad_as_clb", 1, BlockCategory::Io));
        let err = BlockRegistry::build(&nl, &device).unwrap_err();
        assert!(matches!(err, RegistryError::CategoryMismatch { .. }));
    }
}
