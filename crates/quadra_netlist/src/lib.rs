//! Netlist data structures for the Quadra analytical placer.
//!
//! This crate holds the placement view of a packed design: blocks (I/O pads,
//! CLBs, hard blocks), pins, and source-to-sinks nets, plus the
//! [`BlockRegistry`] that assigns every block the stable integer index the
//! placer's dense coordinate arrays are keyed by.

#![warn(missing_docs)]

pub mod data;
pub mod ids;
pub mod registry;

pub use data::{Block, Net, Netlist, Pin};
pub use ids::{BlockId, NetId, PinId};
pub use registry::{BlockRegistry, RegistryError};
