//! Bound-to-bound linear system assembly and solve driver.
//!
//! Each solve builds two independent systems (X and Y) over the active index
//! range, assembles springs from the bound-to-bound net model plus pseudo-net
//! anchors, solves both with conjugate gradients, and writes the solutions
//! back into the linear coordinate arrays.
//!
//! Spring weights follow `2 / (k * delta)` with `k = nb_pins - 1` and `delta`
//! floored, so coincident pins stay finite and the matrix stays strictly
//! diagonally dominant once a fixed pin or an anchor touches a connected
//! component.

use crate::legalizer::Legalizer;
use crate::matrix::Crs;
use crate::options::PlacerOptions;
use crate::timing::TimingOracle;
use quadra_device::BlockCategory;
use quadra_netlist::{Block, BlockRegistry, Netlist};

/// One axis of the quadratic problem: matrix, right-hand side, and the
/// offset mapping global block indices to matrix rows.
pub(crate) struct AxisSystem {
    pub(crate) matrix: Crs,
    pub(crate) rhs: Vec<f64>,
    start: usize,
}

impl AxisSystem {
    fn new(dimension: usize, start: usize) -> Self {
        Self {
            matrix: Crs::new(dimension),
            rhs: vec![0.0; dimension],
            start,
        }
    }

    /// Adds a spring between two movable blocks.
    fn add_pair(&mut self, a: usize, b: usize, weight: f64) {
        let (a, b) = (a - self.start, b - self.start);
        self.matrix.add(a, a, weight);
        self.matrix.add(b, b, weight);
        self.matrix.add(a, b, -weight);
        self.matrix.add(b, a, -weight);
    }

    /// Adds a spring between a movable block and a fixed coordinate. Anchor
    /// pseudo-nets use the same shape.
    fn add_fixed(&mut self, a: usize, position: f64, weight: f64) {
        let a = a - self.start;
        self.matrix.add(a, a, weight);
        self.rhs[a] += weight * position;
    }
}

/// Extreme pins of one net on one axis. `None` indices are fixed pins.
struct Extremes {
    min: f64,
    min_index: Option<usize>,
    max: f64,
    max_index: Option<usize>,
}

fn scan_extremes(entries: &[(Option<usize>, f64)]) -> Extremes {
    let mut ext = Extremes {
        min: f64::MAX,
        min_index: None,
        max: f64::MIN,
        max_index: None,
    };
    for &(index, coord) in entries {
        if coord > ext.max {
            ext.max = coord;
            ext.max_index = index;
        }
        if coord < ext.min {
            ext.min = coord;
            ext.min_index = index;
        }
    }
    ext
}

fn is_fixed(block: &Block, solve_mode: usize) -> bool {
    if block.category == BlockCategory::Io {
        return true;
    }
    if solve_mode == 0 {
        return false;
    }
    block.ty.as_raw() as usize != solve_mode
}

/// Assembles the X and Y systems for the given solve configuration.
#[allow(clippy::too_many_arguments)]
pub(crate) fn build_systems(
    netlist: &Netlist,
    registry: &BlockRegistry,
    timing: &dyn TimingOracle,
    options: &PlacerOptions,
    legalizer: &Legalizer,
    linear_x: &[f64],
    linear_y: &[f64],
    first_solve: bool,
    solve_mode: usize,
    pseudo_weight_factor: f64,
) -> (AxisSystem, AxisSystem) {
    let range = registry.active_range(solve_mode);
    let start = range.start;
    let mut sys_x = AxisSystem::new(range.len(), start);
    let mut sys_y = AxisSystem::new(range.len(), start);
    let floor = options.delta_floor;

    // Pseudo-net anchors pull every active block toward its last legal
    // position, with strength growing over the session.
    if !first_solve {
        let anchors_x = legalizer.anchors_x();
        let anchors_y = legalizer.anchors_y();
        for i in range.clone() {
            let delta_x = (anchors_x[i] as f64 - linear_x[i]).abs().max(floor);
            sys_x.add_fixed(i, anchors_x[i] as f64, 2.0 * pseudo_weight_factor / delta_x);
            let delta_y = (anchors_y[i] as f64 - linear_y[i]).abs().max(floor);
            sys_y.add_fixed(i, anchors_y[i] as f64, 2.0 * pseudo_weight_factor / delta_y);
        }
    }

    let best_x = legalizer.best_legal_x();
    let best_y = legalizer.best_legal_y();

    let mut entries_x: Vec<(Option<usize>, f64)> = Vec::new();
    let mut entries_y: Vec<(Option<usize>, f64)> = Vec::new();

    for net in &netlist.nets {
        let nb_pins = net.num_pins();
        if nb_pins < 2 {
            continue;
        }

        let timing_weight = if !first_solve && options.timing_driven {
            timing.net_weight(net.id)
        } else {
            1.0
        };

        // Gather pin coordinates in net order: source first, then sinks.
        // Fixed pins (I/O pads and blocks outside the solved type) contribute
        // their best legal coordinates; movable pins their linear ones.
        entries_x.clear();
        entries_y.clear();
        let pins = std::iter::once(net.source).chain(net.sinks.iter().copied());
        for pin in pins {
            let block = netlist.block(netlist.pin(pin).block);
            let index = registry.index_of(block.id);
            if is_fixed(block, solve_mode) {
                entries_x.push((None, best_x[index] as f64));
                entries_y.push((None, best_y[index] as f64));
            } else {
                entries_x.push((Some(index), linear_x[index]));
                entries_y.push((Some(index), linear_y[index]));
            }
        }

        let base_weight = 2.0 / (nb_pins - 1) as f64 * timing_weight;
        build_axis(&mut sys_x, &entries_x, base_weight, floor);
        build_axis(&mut sys_y, &entries_y, base_weight, floor);
    }

    (sys_x, sys_y)
}

/// Adds one net's springs to one axis system.
///
/// `base_weight` is `2 / (nb_pins - 1)` scaled by the net timing weight;
/// each spring divides it by its own floored coordinate gap.
fn build_axis(sys: &mut AxisSystem, entries: &[(Option<usize>, f64)], base_weight: f64, floor: f64) {
    let ext = scan_extremes(entries);
    let weight = |delta: f64| base_weight / delta.max(floor);

    // Bound-bound spring between the two extremes.
    match (ext.min_index, ext.max_index) {
        (None, None) => {} // both extremes fixed: nothing to add
        (Some(min), Some(max)) => {
            if min != max {
                sys.add_pair(min, max, weight(ext.max - ext.min));
            }
        }
        (Some(min), None) => sys.add_fixed(min, ext.max, weight(ext.max - ext.min)),
        (None, Some(max)) => sys.add_fixed(max, ext.min, weight(ext.max - ext.min)),
    }

    // Bound-inner springs from every movable non-extreme pin to both bounds.
    for &(index, coord) in entries {
        let Some(index) = index else { continue };
        if Some(index) != ext.min_index {
            let w = weight((coord - ext.max).abs());
            match ext.max_index {
                Some(max) if max != index => sys.add_pair(index, max, w),
                Some(_) => {}
                None => sys.add_fixed(index, ext.max, w),
            }
        }
        if Some(index) != ext.max_index {
            let w = weight((coord - ext.min).abs());
            match ext.min_index {
                Some(min) if min != index => sys.add_pair(index, min, w),
                Some(_) => {}
                None => sys.add_fixed(index, ext.min, w),
            }
        }
    }

    // Bound-inner springs from fixed pins to movable bounds. When a bound is
    // itself a fixed pin, the first fixed position that coincides with it is
    // that pin and is skipped once per bound.
    let mut first_max = true;
    let mut first_min = true;
    for &(index, coord) in entries {
        if index.is_some() {
            continue;
        }
        if !(coord == ext.min && ext.min_index.is_none() && first_max) {
            if let Some(max) = ext.max_index {
                sys.add_fixed(max, coord, weight((coord - ext.max).abs()));
            }
        } else {
            first_max = false;
        }
        if !(coord == ext.max && ext.max_index.is_none() && first_min) {
            if let Some(min) = ext.min_index {
                sys.add_fixed(min, coord, weight((coord - ext.min).abs()));
            }
        } else {
            first_min = false;
        }
    }
}

/// Builds and solves both axis systems, writing the solutions back into the
/// active slice of `linear_x`/`linear_y`.
///
/// An asymmetric or non-finite matrix is a programmer error in the builder:
/// the solve is skipped and the linear coordinates are left untouched.
#[allow(clippy::too_many_arguments)]
pub(crate) fn solve_linear(
    netlist: &Netlist,
    registry: &BlockRegistry,
    timing: &dyn TimingOracle,
    options: &PlacerOptions,
    legalizer: &Legalizer,
    linear_x: &mut [f64],
    linear_y: &mut [f64],
    first_solve: bool,
    solve_mode: usize,
    pseudo_weight_factor: f64,
) {
    let range = registry.active_range(solve_mode);
    if range.is_empty() {
        return;
    }

    let (sys_x, sys_y) = build_systems(
        netlist,
        registry,
        timing,
        options,
        legalizer,
        linear_x,
        linear_y,
        first_solve,
        solve_mode,
        pseudo_weight_factor,
    );

    if !sys_x.matrix.is_symmetric_and_finite() || !sys_y.matrix.is_symmetric_and_finite() {
        log::warn!("solve mode {solve_mode}: asymmetric or non-finite system, skipping solve");
        return;
    }

    let solution_x = sys_x
        .matrix
        .solve(&sys_x.rhs, options.cg_epsilon, options.cg_max_iterations);
    let solution_y = sys_y
        .matrix
        .solve(&sys_y.rhs, options.cg_epsilon, options.cg_max_iterations);

    for (offset, i) in range.enumerate() {
        linear_x[i] = solution_x[offset];
        linear_y[i] = solution_y[offset];
    }
}
