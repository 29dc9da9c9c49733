//! Device grid model for the Quadra analytical placer.
//!
//! This crate describes the placement target: a rectangular grid whose border
//! ring carries I/O pad sites and whose interior columns are typed. A column
//! either holds general logic (CLB) sites on every interior row, or belongs to
//! a hard-block type whose sites repeat on a column/row lattice.
//!
//! The [`Device`] is a mostly read-only view consumed by the placer; the only
//! write surface is the block-to-site occupancy used when a placement is
//! committed.

#![warn(missing_docs)]

pub mod device;
pub mod error;
pub mod ids;
pub mod types;

pub use device::{Device, Site};
pub use error::DeviceError;
pub use ids::BlockTypeId;
pub use types::{BlockCategory, BlockType};
