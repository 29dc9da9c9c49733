//! Core netlist data structures.
//!
//! Defines the placement netlist: blocks (with their device block type and
//! category), pins (block connection points), and nets (one source pin plus
//! one or more sink pins). The [`Netlist`] is an arena of all three; entity
//! IDs are indices into its vectors.

use crate::ids::{BlockId, NetId, PinId};
use quadra_device::{BlockCategory, BlockTypeId};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// A block in the placement netlist.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Block {
    /// The unique ID of this block.
    pub id: BlockId,
    /// Human-readable block name (e.g., "clb_12", "pad_rst").
    pub name: String,
    /// The device block type this block must be placed on.
    pub ty: BlockTypeId,
    /// The category of the block type (I/O pads are never moved).
    pub category: BlockCategory,
}

/// A pin on a block.
///
/// Pins are the endpoints nets connect; each pin belongs to exactly one block.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Pin {
    /// The unique ID of this pin.
    pub id: PinId,
    /// The block that owns this pin.
    pub block: BlockId,
}

/// A net in the placement netlist.
///
/// Connects one source pin to one or more sink pins. A net with fewer than
/// two pins contributes nothing to placement.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Net {
    /// The unique ID of this net.
    pub id: NetId,
    /// Human-readable net name.
    pub name: String,
    /// The source (driver) pin.
    pub source: PinId,
    /// The sink pins.
    pub sinks: Vec<PinId>,
}

impl Net {
    /// Returns the total number of pins on this net.
    pub fn num_pins(&self) -> usize {
        1 + self.sinks.len()
    }
}

/// The placement netlist: an arena of blocks, pins, and nets.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Netlist {
    /// All blocks in the netlist.
    pub blocks: Vec<Block>,
    /// All pins in the netlist.
    pub pins: Vec<Pin>,
    /// All nets in the netlist.
    pub nets: Vec<Net>,
    /// Auxiliary index: block name to ID (rebuilt on deserialization).
    #[serde(skip)]
    pub block_by_name: HashMap<String, BlockId>,
}

impl Netlist {
    /// Creates an empty netlist.
    pub fn new() -> Self {
        Self {
            blocks: Vec::new(),
            pins: Vec::new(),
            nets: Vec::new(),
            block_by_name: HashMap::new(),
        }
    }

    /// Adds a block and returns its ID.
    pub fn add_block(&mut self, mut block: Block) -> BlockId {
        let id = BlockId::from_raw(self.blocks.len() as u32);
        block.id = id;
        self.block_by_name.insert(block.name.clone(), id);
        self.blocks.push(block);
        id
    }

    /// Adds a pin on the given block and returns its ID.
    pub fn add_pin(&mut self, block: BlockId) -> PinId {
        let id = PinId::from_raw(self.pins.len() as u32);
        self.pins.push(Pin { id, block });
        id
    }

    /// Adds a net and returns its ID.
    pub fn add_net(&mut self, mut net: Net) -> NetId {
        let id = NetId::from_raw(self.nets.len() as u32);
        net.id = id;
        self.nets.push(net);
        id
    }

    /// Returns the block with the given ID.
    pub fn block(&self, id: BlockId) -> &Block {
        &self.blocks[id.as_raw() as usize]
    }

    /// Returns the pin with the given ID.
    pub fn pin(&self, id: PinId) -> &Pin {
        &self.pins[id.as_raw() as usize]
    }

    /// Returns the net with the given ID.
    pub fn net(&self, id: NetId) -> &Net {
        &self.nets[id.as_raw() as usize]
    }

    /// Returns the number of blocks.
    pub fn block_count(&self) -> usize {
        self.blocks.len()
    }

    /// Returns the number of nets.
    pub fn net_count(&self) -> usize {
        self.nets.len()
    }

    /// Returns the number of pins.
    pub fn pin_count(&self) -> usize {
        self.pins.len()
    }

    /// Rebuilds auxiliary indices after deserialization.
    pub fn rebuild_indices(&mut self) {
        self.block_by_name.clear();
        for (i, block) in self.blocks.iter().enumerate() {
            self.block_by_name
                .insert(block.name.clone(), BlockId::from_raw(i as u32));
        }
    }
}

impl Default for Netlist {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn clb(name: &str) -> Block {
        Block {
            id: BlockId::from_raw(0),
            name: name.into(),
            ty: BlockTypeId::from_raw(1),
            category: BlockCategory::Clb,
        }
    }

    #[test]
    fn empty_netlist() {
        let nl = Netlist::new();
        assert_eq!(nl.block_count(), 0);
        assert_eq!(nl.net_count(), 0);
        assert_eq!(nl.pin_count(), 0);
    }

    #[test]
    fn add_block_assigns_sequential_ids() {
        let mut nl = Netlist::new();
        let a = nl.add_block(clb("a"));
        let b = nl.add_block(clb("b"));
        assert_eq!(a.as_raw(), 0);
        assert_eq!(b.as_raw(), 1);
        assert_eq!(nl.block(b).name, "b");
        assert_eq!(nl.block_by_name["a"], a);
    }

    #[test]
    fn add_net_and_pins() {
        let mut nl = Netlist::new();
        let a = nl.add_block(clb("a"));
        let b = nl.add_block(clb("b"));
        let src = nl.add_pin(a);
        let snk = nl.add_pin(b);
        let net = nl.add_net(Net {
            id: NetId::from_raw(0),
            name: "n0".into(),
            source: src,
            sinks: vec![snk],
        });

        assert_eq!(nl.net(net).num_pins(), 2);
        assert_eq!(nl.pin(nl.net(net).source).block, a);
        assert_eq!(nl.pin(nl.net(net).sinks[0]).block, b);
    }

    #[test]
    fn single_pin_net() {
        let mut nl = Netlist::new();
        let a = nl.add_block(clb("a"));
        let src = nl.add_pin(a);
        let net = nl.add_net(Net {
            id: NetId::from_raw(0),
            name: "dangling".into(),
            source: src,
            sinks: vec![],
        });
        assert_eq!(nl.net(net).num_pins(), 1);
    }

    #[test]
    fn rebuild_indices() {
        let mut nl = Netlist::new();
        nl.add_block(clb("a"));
        nl.block_by_name.clear();
        nl.rebuild_indices();
        assert!(nl.block_by_name.contains_key("a"));
    }

    #[test]
    fn serde_roundtrip() {
        let mut nl = Netlist::new();
        let a = nl.add_block(clb("a"));
        let src = nl.add_pin(a);
        nl.add_net(Net {
            id: NetId::from_raw(0),
            name: "n0".into(),
            source: src,
            sinks: vec![],
        });

        let json = serde_json::to_string(&nl).unwrap();
        let mut restored: Netlist = serde_json::from_str(&json).unwrap();
        restored.rebuild_indices();
        assert_eq!(restored.block_count(), 1);
        assert!(restored.block_by_name.contains_key("a"));
    }
}
