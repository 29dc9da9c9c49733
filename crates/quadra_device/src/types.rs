//! Block categories and block types.
//!
//! Every placeable entity belongs to one of three categories: I/O pads on the
//! device border, general logic (CLB) filling the interior, or a hard block
//! (multiplier, RAM, ...) whose sites occur on a column/row lattice. The
//! three categories drive different closest-site and legalization policies,
//! so they are a tagged variant rather than a trait hierarchy.

use serde::{Deserialize, Serialize};

/// The category of a block type.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Serialize, Deserialize)]
pub enum BlockCategory {
    /// An I/O pad on the device border ring.
    Io,
    /// A general logic block; every interior row of a CLB column is a site.
    Clb,
    /// A hard block; sites repeat on the `(start, repeat, height)` lattice.
    Hard,
}

/// A block type in a device's type table.
///
/// For hard blocks, sites exist at columns `x = start + k * repeat` and rows
/// `y = 1 + r * height`, as long as the full `height`-row footprint stays
/// inside the interior of the grid. I/O and CLB types use `repeat = 1` and
/// `height = 1`.
#[derive(Clone, PartialEq, Eq, Debug, Serialize, Deserialize)]
pub struct BlockType {
    /// Human-readable type name (e.g., "IO", "CLB", "MULT").
    pub name: String,
    /// The category this type belongs to.
    pub category: BlockCategory,
    /// First column of the hard-block lattice (unused for I/O and CLB).
    pub start: u32,
    /// Column period of the lattice (1 for I/O and CLB).
    pub repeat: u32,
    /// Number of rows a single block occupies (1 for I/O and CLB).
    pub height: u32,
}

impl BlockType {
    /// Creates the I/O pad type.
    pub fn io() -> Self {
        Self {
            name: "IO".into(),
            category: BlockCategory::Io,
            start: 0,
            repeat: 1,
            height: 1,
        }
    }

    /// Creates the general logic (CLB) type.
    pub fn clb() -> Self {
        Self {
            name: "CLB".into(),
            category: BlockCategory::Clb,
            start: 0,
            repeat: 1,
            height: 1,
        }
    }

    /// Creates a hard-block type with the given column/row lattice.
    pub fn hard(name: impl Into<String>, start: u32, repeat: u32, height: u32) -> Self {
        Self {
            name: name.into(),
            category: BlockCategory::Hard,
            start,
            repeat,
            height,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn io_type() {
        let t = BlockType::io();
        assert_eq!(t.category, BlockCategory::Io);
        assert_eq!(t.repeat, 1);
        assert_eq!(t.height, 1);
    }

    #[test]
    fn clb_type() {
        let t = BlockType::clb();
        assert_eq!(t.category, BlockCategory::Clb);
        assert_eq!(t.name, "CLB");
    }

    #[test]
    fn hard_type() {
        let t = BlockType::hard("MULT", 2, 3, 2);
        assert_eq!(t.category, BlockCategory::Hard);
        assert_eq!(t.start, 2);
        assert_eq!(t.repeat, 3);
        assert_eq!(t.height, 2);
    }

    #[test]
    fn serde_roundtrip() {
        let t = BlockType::hard("RAM", 4, 6, 4);
        let json = serde_json::to_string(&t).unwrap();
        let restored: BlockType = serde_json::from_str(&json).unwrap();
        assert_eq!(t, restored);
    }
}
