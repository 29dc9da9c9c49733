//! Timing oracle interface.
//!
//! Timing analysis happens outside the placer. The placer only reads one
//! scalar per net: the sum of the costs of the net's timing edges, used to
//! scale spring weights on timing-driven solves. Nets the oracle knows
//! nothing about weigh 1.0.

use quadra_netlist::NetId;
use std::collections::HashMap;

/// Read-only source of per-net timing weights.
pub trait TimingOracle {
    /// Returns the timing weight of a net (1.0 when the net has no timing
    /// information).
    fn net_weight(&self, net: NetId) -> f64;
}

/// An oracle that weighs every net 1.0.
///
/// Used for pure wirelength-driven placement.
#[derive(Debug, Clone, Copy, Default)]
pub struct UniformTiming;

impl TimingOracle for UniformTiming {
    fn net_weight(&self, _net: NetId) -> f64 {
        1.0
    }
}

/// A snapshot of per-net timing weights, typically produced by an external
/// timing graph before a placement session.
#[derive(Debug, Clone, Default)]
pub struct TableTiming {
    weights: HashMap<NetId, f64>,
}

impl TableTiming {
    /// Creates an empty table; every net weighs 1.0 until filled in.
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds the table from per-net timing edge costs, summing each net's
    /// edge costs into its weight.
    pub fn from_edge_costs<I, E>(nets: I) -> Self
    where
        I: IntoIterator<Item = (NetId, E)>,
        E: IntoIterator<Item = f64>,
    {
        let mut weights = HashMap::new();
        for (net, edges) in nets {
            weights.insert(net, edges.into_iter().sum());
        }
        Self { weights }
    }

    /// Sets the weight of a single net.
    pub fn set(&mut self, net: NetId, weight: f64) {
        self.weights.insert(net, weight);
    }
}

impl TimingOracle for TableTiming {
    fn net_weight(&self, net: NetId) -> f64 {
        self.weights.get(&net).copied().unwrap_or(1.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn uniform_is_one() {
        assert_eq!(UniformTiming.net_weight(NetId::from_raw(3)), 1.0);
    }

    #[test]
    fn unknown_net_is_one() {
        let table = TableTiming::new();
        assert_eq!(table.net_weight(NetId::from_raw(0)), 1.0);
    }

    #[test]
    fn edge_costs_sum() {
        let table = TableTiming::from_edge_costs([
            (NetId::from_raw(0), vec![0.5, 0.25]),
            (NetId::from_raw(1), vec![2.0]),
        ]);
        assert_eq!(table.net_weight(NetId::from_raw(0)), 0.75);
        assert_eq!(table.net_weight(NetId::from_raw(1)), 2.0);
    }

    #[test]
    fn set_overrides() {
        let mut table = TableTiming::new();
        table.set(NetId::from_raw(4), 3.5);
        assert_eq!(table.net_weight(NetId::from_raw(4)), 3.5);
    }
}
