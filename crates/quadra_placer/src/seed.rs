//! Initial fixed-I/O assignment.
//!
//! The solver needs every I/O pad pinned to a device site before the first
//! system is built. Designs with a user-supplied pinout arrive fully placed;
//! for the rest, this pass scatters the unplaced pads evenly over the free
//! border sites, walking the perimeter clockwise.

use crate::error::{PlaceResult, PlacerError};
use quadra_device::Device;
use quadra_netlist::BlockRegistry;

/// Places every unplaced I/O pad on a free perimeter site.
///
/// Pads already placed (a fixed pinout) are left alone. The remaining pads
/// are spread evenly over the free sites in clockwise walk order, in
/// registry index order.
///
/// # Errors
///
/// Returns [`PlacerError::Integrity`] when more pads are unplaced than free
/// perimeter sites remain.
pub fn assign_io_sites(device: &mut Device, registry: &BlockRegistry) -> PlaceResult<()> {
    let num_io = registry.num_io();
    let unplaced: Vec<usize> = (0..num_io)
        .filter(|&i| device.block_site(i as u32).is_none())
        .collect();
    if unplaced.is_empty() {
        return Ok(());
    }

    let free: Vec<(u32, u32)> = device
        .perimeter_sites()
        .into_iter()
        .filter(|&(x, y)| device.occupant(x, y).is_none())
        .collect();
    if unplaced.len() > free.len() {
        return Err(PlacerError::Integrity(format!(
            "{} I/O pads for {} free perimeter sites",
            unplaced.len(),
            free.len()
        )));
    }

    let pads_per_site = unplaced.len() as f64 / free.len() as f64;
    let mut placed = 0;
    for (site_index, &(x, y)) in free.iter().enumerate() {
        let emitted = (pads_per_site * (site_index + 1) as f64).floor() as usize;
        while placed < emitted.min(unplaced.len()) {
            device.place_block(x, y, unplaced[placed] as u32)?;
            placed += 1;
        }
    }
    // Guard against float rounding leaving a straggler unplaced.
    if placed < unplaced.len() {
        for &(x, y) in &free {
            if placed == unplaced.len() {
                break;
            }
            if device.occupant(x, y).is_none() {
                device.place_block(x, y, unplaced[placed] as u32)?;
                placed += 1;
            }
        }
    }
    Ok(())
}
