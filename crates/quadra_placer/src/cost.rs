//! Placement cost calculators.
//!
//! A cost calculator scores a candidate legal placement given the dense
//! coordinate arrays. The legalizer uses the score to decide whether the
//! candidate replaces the best known solution. Calculators that derive their
//! score from committed device state (e.g., an external timing analyzer)
//! declare so via [`requires_device_update`](CostCalculator::requires_device_update),
//! and the legalizer commits the candidate before scoring and reverts it when
//! the candidate loses.

use crate::timing::TimingOracle;
use quadra_netlist::{BlockRegistry, Netlist};

/// Scores candidate legal placements.
pub trait CostCalculator {
    /// Whether [`calculate`](Self::calculate) reads committed device state
    /// rather than just the coordinate arrays.
    fn requires_device_update(&self) -> bool {
        false
    }

    /// Returns the scalar cost of the placement in `x`/`y`, indexed by the
    /// registry's stable block indices. Lower is better.
    fn calculate(&mut self, x: &[i32], y: &[i32]) -> f64;
}

/// The pin indices and weight of one multi-pin net.
#[derive(Debug, Clone)]
struct NetSpan {
    pins: Vec<usize>,
    weight: f64,
}

/// Half-perimeter wirelength cost, optionally timing-weighted.
///
/// Sums, over every net with at least two pins, the semi-perimeter of the
/// bounding box of its pins' coordinates, scaled by the net's weight. HPWL
/// is the standard placement metric; minimizing it tends to produce good
/// routability.
#[derive(Debug, Clone)]
pub struct WirelengthCost {
    spans: Vec<NetSpan>,
}

impl WirelengthCost {
    /// Builds a plain wirelength cost (every net weighs 1.0).
    pub fn new(netlist: &Netlist, registry: &BlockRegistry) -> Self {
        Self::build(netlist, registry, |_| 1.0)
    }

    /// Builds a timing-weighted wirelength cost, scaling each net's
    /// bounding box by the oracle's net weight.
    pub fn timing_weighted(
        netlist: &Netlist,
        registry: &BlockRegistry,
        timing: &dyn TimingOracle,
    ) -> Self {
        Self::build(netlist, registry, |net| timing.net_weight(net))
    }

    fn build(
        netlist: &Netlist,
        registry: &BlockRegistry,
        weight: impl Fn(quadra_netlist::NetId) -> f64,
    ) -> Self {
        let mut spans = Vec::new();
        for net in &netlist.nets {
            if net.num_pins() < 2 {
                continue;
            }
            let mut pins = Vec::with_capacity(net.num_pins());
            pins.push(registry.index_of(netlist.pin(net.source).block));
            for &sink in &net.sinks {
                pins.push(registry.index_of(netlist.pin(sink).block));
            }
            spans.push(NetSpan {
                pins,
                weight: weight(net.id),
            });
        }
        Self { spans }
    }
}

impl CostCalculator for WirelengthCost {
    fn calculate(&mut self, x: &[i32], y: &[i32]) -> f64 {
        let mut total = 0.0;
        for span in &self.spans {
            let mut min_x = i32::MAX;
            let mut max_x = i32::MIN;
            let mut min_y = i32::MAX;
            let mut max_y = i32::MIN;
            for &pin in &span.pins {
                min_x = min_x.min(x[pin]);
                max_x = max_x.max(x[pin]);
                min_y = min_y.min(y[pin]);
                max_y = max_y.max(y[pin]);
            }
            total += span.weight * ((max_x - min_x) + (max_y - min_y)) as f64;
        }
        total
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::timing::TableTiming;
    use quadra_device::{BlockCategory, BlockTypeId, Device};
    use quadra_netlist::{Block, BlockId, Net, NetId};

    fn fixture() -> (Netlist, BlockRegistry) {
        let device = Device::new(8, 8).unwrap();
        let mut nl = Netlist::new();
        for i in 0..3 {
            nl.add_block(Block {
                id: BlockId::from_raw(0),
                name: format!("clb_{i}"),
                ty: BlockTypeId::from_raw(1),
                category: BlockCategory::Clb,
            });
        }
        let pins: Vec<_> = (0..3)
            .map(|i| nl.add_pin(BlockId::from_raw(i)))
            .collect();
        nl.add_net(Net {
            id: NetId::from_raw(0),
            name: "n0".into(),
            source: pins[0],
            sinks: vec![pins[1], pins[2]],
        });
        // A single-pin net must not contribute.
        let lone = nl.add_pin(BlockId::from_raw(0));
        nl.add_net(Net {
            id: NetId::from_raw(0),
            name: "lone".into(),
            source: lone,
            sinks: vec![],
        });
        let registry = BlockRegistry::build(&nl, &device).unwrap();
        (nl, registry)
    }

    #[test]
    fn hpwl_of_bounding_box() {
        let (nl, registry) = fixture();
        let mut cost = WirelengthCost::new(&nl, &registry);
        // blocks at (1,1), (4,1), (2,5): bbox 3 + 4
        let value = cost.calculate(&[1, 4, 2], &[1, 1, 5]);
        assert_eq!(value, 7.0);
    }

    #[test]
    fn coincident_pins_cost_zero() {
        let (nl, registry) = fixture();
        let mut cost = WirelengthCost::new(&nl, &registry);
        assert_eq!(cost.calculate(&[3, 3, 3], &[2, 2, 2]), 0.0);
    }

    #[test]
    fn single_pin_net_contributes_nothing() {
        let (nl, registry) = fixture();
        let cost = WirelengthCost::new(&nl, &registry);
        assert_eq!(cost.spans.len(), 1);
    }

    #[test]
    fn timing_weight_scales_net() {
        let (nl, registry) = fixture();
        let mut table = TableTiming::new();
        table.set(NetId::from_raw(0), 2.0);
        let mut cost = WirelengthCost::timing_weighted(&nl, &registry, &table);
        assert_eq!(cost.calculate(&[1, 4, 2], &[1, 1, 5]), 14.0);
    }

    #[test]
    fn wirelength_does_not_need_device_update() {
        let (nl, registry) = fixture();
        let cost = WirelengthCost::new(&nl, &registry);
        assert!(!cost.requires_device_update());
    }
}
