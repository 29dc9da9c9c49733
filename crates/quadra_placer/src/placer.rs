//! The placement loop: alternating solves and legalizations.
//!
//! An [`AnalyticalPlacer`] session seeds the linear coordinates, runs a batch
//! of anchor-free solves, legalizes once to obtain the first anchors, then
//! cycles solve mode rotation + legalization while the anchor strength grows.
//! The best legal solution ever scored is committed to the device at the end.

use crate::cost::CostCalculator;
use crate::error::PlaceResult;
use crate::legalizer::Legalizer;
use crate::options::PlacerOptions;
use crate::seed;
use crate::system;
use crate::timing::TimingOracle;
use quadra_device::Device;
use quadra_netlist::{BlockRegistry, Netlist};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// The outcome of a completed placement session.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PlacementSummary {
    /// Cost of the committed placement.
    pub cost: f64,
    /// Number of main solve + legalize cycles run.
    pub iterations: usize,
}

/// An analytical placement session over one device and netlist.
///
/// The session owns the coordinate arrays and the legalizer state; the device
/// is borrowed mutably for its whole lifetime and must be treated as
/// read-only by everyone else until [`place`](Self::place) returns.
pub struct AnalyticalPlacer<'a> {
    device: &'a mut Device,
    netlist: &'a Netlist,
    registry: BlockRegistry,
    options: PlacerOptions,
    legalizer: Legalizer,
    linear_x: Vec<f64>,
    linear_y: Vec<f64>,
    solve_mode: usize,
    pseudo_weight_factor: f64,
}

impl<'a> AnalyticalPlacer<'a> {
    /// Prepares a session: validates the options, builds the block registry,
    /// assigns perimeter sites to unplaced I/O pads, and seeds the linear
    /// coordinates (pads at their sites, movable blocks uniformly random over
    /// the interior from the session seed).
    pub fn new(
        device: &'a mut Device,
        netlist: &'a Netlist,
        options: PlacerOptions,
    ) -> PlaceResult<Self> {
        options.validate()?;
        let registry = BlockRegistry::build(netlist, device)?;
        seed::assign_io_sites(device, &registry)?;
        let legalizer = Legalizer::new(device, &registry)?;

        let mut rng = StdRng::seed_from_u64(options.seed);
        let num_blocks = registry.num_blocks();
        let mut linear_x = vec![0.0; num_blocks];
        let mut linear_y = vec![0.0; num_blocks];
        for i in 0..registry.num_io() {
            linear_x[i] = legalizer.best_legal_x()[i] as f64;
            linear_y[i] = legalizer.best_legal_y()[i] as f64;
        }
        let width = device.width() as f64;
        let height = device.height() as f64;
        for i in registry.num_io()..num_blocks {
            linear_x[i] = 1.0 + rng.gen::<f64>() * (width - 2.0);
            linear_y[i] = 1.0 + rng.gen::<f64>() * (height - 2.0);
        }

        Ok(Self {
            device,
            netlist,
            registry,
            options,
            legalizer,
            linear_x,
            linear_y,
            solve_mode: 0,
            pseudo_weight_factor: 0.0,
        })
    }

    /// A human-readable name for the placer variant.
    pub fn name(&self) -> &'static str {
        if self.options.timing_driven {
            "timing driven analytical placer"
        } else {
            "wirelength driven analytical placer"
        }
    }

    /// The block index registry of this session.
    pub fn registry(&self) -> &BlockRegistry {
        &self.registry
    }

    /// The solve mode of the most recent iteration.
    pub fn solve_mode(&self) -> usize {
        self.solve_mode
    }

    /// The accumulated pseudo-net strength.
    pub fn pseudo_weight_factor(&self) -> f64 {
        self.pseudo_weight_factor
    }

    /// The cost of the best legal solution so far.
    pub fn best_cost(&self) -> f64 {
        self.legalizer.best_cost()
    }

    /// Runs the full placement schedule and commits the best legal solution
    /// to the device.
    pub fn place(
        &mut self,
        cost: &mut dyn CostCalculator,
        timing: &dyn TimingOracle,
    ) -> PlaceResult<PlacementSummary> {
        self.initial_phase(cost, timing)?;
        for iteration in 0..self.options.main_iterations {
            self.iterate(iteration, cost, timing)?;
        }
        self.legalizer.commit_best(self.device)?;

        let summary = PlacementSummary {
            cost: self.legalizer.best_cost(),
            iterations: self.options.main_iterations,
        };
        log::info!(
            "{}: finished at cost {:.1} after {} iterations",
            self.name(),
            summary.cost,
            summary.iterations
        );
        Ok(summary)
    }

    /// Anchor-free solves followed by the first legalization, which
    /// initializes the anchor points.
    pub(crate) fn initial_phase(
        &mut self,
        cost: &mut dyn CostCalculator,
        timing: &dyn TimingOracle,
    ) -> PlaceResult<()> {
        for _ in 0..self.options.initial_solves {
            system::solve_linear(
                self.netlist,
                &self.registry,
                timing,
                &self.options,
                &self.legalizer,
                &mut self.linear_x,
                &mut self.linear_y,
                true,
                0,
                0.0,
            );
        }

        self.legalizer.legalize(
            self.device,
            &self.registry,
            cost,
            &self.linear_x,
            &self.linear_y,
            self.options.tile_capacity(0),
            self.options.legalize_io,
        )?;
        log::info!(
            "{}: initial legalization at cost {:.1}",
            self.name(),
            self.legalizer.best_cost()
        );
        Ok(())
    }

    /// One main cycle: rotate the solve mode, strengthen the anchors on the
    /// full and CLB modes, solve, and legalize. Returns the best cost.
    pub(crate) fn iterate(
        &mut self,
        iteration: usize,
        cost: &mut dyn CostCalculator,
        timing: &dyn TimingOracle,
    ) -> PlaceResult<f64> {
        self.solve_mode = (self.solve_mode + 1) % (self.registry.movable_type_count() + 1);
        if self.solve_mode <= 1 {
            self.pseudo_weight_factor += self.options.anchor_step_alpha;
        }

        system::solve_linear(
            self.netlist,
            &self.registry,
            timing,
            &self.options,
            &self.legalizer,
            &mut self.linear_x,
            &mut self.linear_y,
            false,
            self.solve_mode,
            self.pseudo_weight_factor,
        );

        let capacity = self.options.tile_capacity(iteration + 1);
        self.legalizer.legalize(
            self.device,
            &self.registry,
            cost,
            &self.linear_x,
            &self.linear_y,
            capacity,
            false,
        )?;

        log::info!(
            "iteration {iteration}: mode {}, pseudo weight {:.2}, capacity {:.2}, best cost {:.1}",
            self.solve_mode,
            self.pseudo_weight_factor,
            capacity,
            self.legalizer.best_cost()
        );
        Ok(self.legalizer.best_cost())
    }
}
