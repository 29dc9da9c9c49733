//! Analytical placement engine for heterogeneous FPGA-like devices.
//!
//! Given a [`Netlist`](quadra_netlist::Netlist) of I/O pads, CLBs, and hard
//! blocks, and a [`Device`](quadra_device::Device) grid with typed columns,
//! the placer assigns every movable block a legal site minimizing
//! (optionally timing-weighted) wirelength.
//!
//! The engine alternates two stages:
//!
//! 1. **Solve** — build a sparse symmetric positive-definite system from the
//!    bound-to-bound net model plus pseudo-net anchors, and solve it with
//!    Jacobi-preconditioned conjugate gradients ([`matrix`]).
//! 2. **Legalize** — snap the real-valued solution to legal, column-typed,
//!    non-overlapping sites with area growth and recursive bipartition
//!    ([`legalizer`]), keeping the best legal solution ever scored.
//!
//! Anchor strength grows each cycle, pulling the linear solution toward
//! legality; solve modes rotate over "all blocks" and each movable type.
//!
//! # Usage
//!
//! ```no_run
//! use quadra_device::Device;
//! use quadra_netlist::Netlist;
//! use quadra_placer::{place, PlacerOptions};
//!
//! let mut device = Device::new(30, 30).unwrap();
//! let netlist = Netlist::new();
//! let summary = place(&mut device, &netlist, PlacerOptions::default()).unwrap();
//! println!("placed at cost {}", summary.cost);
//! ```
//!
//! Timing-driven flows build an [`AnalyticalPlacer`] directly and pass their
//! own [`TimingOracle`] and [`CostCalculator`].

#![warn(missing_docs)]

pub mod cost;
pub mod error;
pub mod legalizer;
pub mod matrix;
pub mod options;
pub mod placer;
pub mod seed;
mod system;
pub mod timing;

pub use cost::{CostCalculator, WirelengthCost};
pub use error::{PlaceResult, PlacerError};
pub use legalizer::Legalizer;
pub use matrix::Crs;
pub use options::PlacerOptions;
pub use placer::{AnalyticalPlacer, PlacementSummary};
pub use seed::assign_io_sites;
pub use timing::{TableTiming, TimingOracle, UniformTiming};

use quadra_device::Device;
use quadra_netlist::Netlist;

/// Runs a wirelength-driven placement session with default cost scoring.
///
/// Builds the session, places, and commits the best legal solution to the
/// device occupancy.
///
/// # Errors
///
/// Propagates configuration and integrity errors from the session.
pub fn place(
    device: &mut Device,
    netlist: &Netlist,
    options: PlacerOptions,
) -> PlaceResult<PlacementSummary> {
    let mut session = AnalyticalPlacer::new(device, netlist, options)?;
    let mut cost = WirelengthCost::new(netlist, session.registry());
    session.place(&mut cost, &UniformTiming)
}
