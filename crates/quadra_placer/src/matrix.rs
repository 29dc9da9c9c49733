//! Row-compressed symmetric sparse matrix and conjugate-gradient solver.
//!
//! The linear system builder emits symmetric contributions explicitly, so the
//! matrix stores whatever it is given; [`Crs::is_symmetric_and_finite`] exists
//! to assert the builder held up its end. The solver is plain conjugate
//! gradients with Jacobi (diagonal) preconditioning, which is enough because
//! the bound-to-bound construction keeps the matrix strictly diagonally
//! dominant once anchors or fixed pins are present.

/// A sparse square matrix in row-compressed form.
///
/// Rows hold `(column, value)` pairs sorted by column. [`add`](Self::add)
/// accumulates into existing entries, so repeated contributions at the same
/// coordinate sum up — the contract the star model relies on.
#[derive(Debug, Clone)]
pub struct Crs {
    rows: Vec<Vec<(usize, f64)>>,
}

impl Crs {
    /// Creates an `n` x `n` zero matrix.
    pub fn new(n: usize) -> Self {
        Self {
            rows: vec![Vec::new(); n],
        }
    }

    /// Returns the matrix dimension.
    pub fn dimension(&self) -> usize {
        self.rows.len()
    }

    /// Adds `delta` to the entry at `(i, j)`.
    pub fn add(&mut self, i: usize, j: usize, delta: f64) {
        let row = &mut self.rows[i];
        match row.binary_search_by_key(&j, |&(col, _)| col) {
            Ok(pos) => row[pos].1 += delta,
            Err(pos) => row.insert(pos, (j, delta)),
        }
    }

    /// Returns the entry at `(i, j)` (zero if never touched).
    pub fn get(&self, i: usize, j: usize) -> f64 {
        self.rows[i]
            .binary_search_by_key(&j, |&(col, _)| col)
            .map(|pos| self.rows[i][pos].1)
            .unwrap_or(0.0)
    }

    /// Checks that every stored entry is finite and mirrored at the
    /// transposed coordinate.
    ///
    /// A failure here means the system builder emitted asymmetric
    /// contributions — a programmer error, not an input problem.
    pub fn is_symmetric_and_finite(&self) -> bool {
        for (i, row) in self.rows.iter().enumerate() {
            for &(j, value) in row {
                if !value.is_finite() || self.get(j, i) != value {
                    return false;
                }
            }
        }
        true
    }

    /// Computes `out = self * v`.
    fn mul_vec(&self, v: &[f64], out: &mut [f64]) {
        for (i, row) in self.rows.iter().enumerate() {
            let mut sum = 0.0;
            for &(j, value) in row {
                sum += value * v[j];
            }
            out[i] = sum;
        }
    }

    /// Solves `self * x = b` with Jacobi-preconditioned conjugate gradients.
    ///
    /// Terminates when `‖r‖₂ / ‖b‖₂ <= epsilon` or after `max_iterations`
    /// steps; hitting the cap is a numeric stall and the best iterate so far
    /// is returned (the outer placement loop reattempts next cycle).
    pub fn solve(&self, b: &[f64], epsilon: f64, max_iterations: usize) -> Vec<f64> {
        let n = self.dimension();
        debug_assert_eq!(b.len(), n);

        let b_norm = norm(b);
        if n == 0 || b_norm == 0.0 {
            return vec![0.0; n];
        }

        // Jacobi preconditioner: divide by the diagonal where it is positive.
        let diag: Vec<f64> = (0..n).map(|i| self.get(i, i)).collect();
        let precondition = |r: &[f64], z: &mut [f64]| {
            for i in 0..n {
                z[i] = if diag[i] > 0.0 { r[i] / diag[i] } else { r[i] };
            }
        };

        let mut x = vec![0.0; n];
        let mut r = b.to_vec();
        let mut z = vec![0.0; n];
        precondition(&r, &mut z);
        let mut p = z.clone();
        let mut rz = dot(&r, &z);
        let mut ap = vec![0.0; n];

        for iteration in 0..max_iterations {
            if norm(&r) / b_norm <= epsilon {
                return x;
            }

            self.mul_vec(&p, &mut ap);
            let p_ap = dot(&p, &ap);
            if p_ap <= 0.0 || !p_ap.is_finite() {
                log::debug!("cg: search direction degenerated at iteration {iteration}");
                return x;
            }

            let alpha = rz / p_ap;
            for i in 0..n {
                x[i] += alpha * p[i];
                r[i] -= alpha * ap[i];
            }

            precondition(&r, &mut z);
            let rz_next = dot(&r, &z);
            let beta = rz_next / rz;
            rz = rz_next;
            for i in 0..n {
                p[i] = z[i] + beta * p[i];
            }
        }

        log::debug!(
            "cg: stalled after {max_iterations} iterations, residual {:.3e}",
            norm(&r) / b_norm
        );
        x
    }
}

fn dot(a: &[f64], b: &[f64]) -> f64 {
    a.iter().zip(b).map(|(x, y)| x * y).sum()
}

fn norm(v: &[f64]) -> f64 {
    dot(v, v).sqrt()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn add_accumulates() {
        let mut m = Crs::new(3);
        m.add(0, 1, 2.0);
        m.add(0, 1, 0.5);
        assert_eq!(m.get(0, 1), 2.5);
        assert_eq!(m.get(1, 0), 0.0);
    }

    #[test]
    fn untouched_entries_are_zero() {
        let m = Crs::new(2);
        assert_eq!(m.get(0, 0), 0.0);
        assert_eq!(m.get(1, 0), 0.0);
    }

    #[test]
    fn symmetry_check() {
        let mut m = Crs::new(2);
        m.add(0, 0, 2.0);
        m.add(1, 1, 2.0);
        m.add(0, 1, -1.0);
        m.add(1, 0, -1.0);
        assert!(m.is_symmetric_and_finite());

        m.add(0, 1, -0.5);
        assert!(!m.is_symmetric_and_finite());
    }

    #[test]
    fn non_finite_detected() {
        let mut m = Crs::new(1);
        m.add(0, 0, f64::NAN);
        assert!(!m.is_symmetric_and_finite());
    }

    #[test]
    fn solve_diagonal_system() {
        let mut m = Crs::new(3);
        m.add(0, 0, 2.0);
        m.add(1, 1, 4.0);
        m.add(2, 2, 8.0);
        let x = m.solve(&[2.0, 2.0, 2.0], 1e-8, 100);
        assert!((x[0] - 1.0).abs() < 1e-6);
        assert!((x[1] - 0.5).abs() < 1e-6);
        assert!((x[2] - 0.25).abs() < 1e-6);
    }

    #[test]
    fn solve_spd_system() {
        // [4 1; 1 3] x = [1; 2] has solution [1/11, 7/11].
        let mut m = Crs::new(2);
        m.add(0, 0, 4.0);
        m.add(1, 1, 3.0);
        m.add(0, 1, 1.0);
        m.add(1, 0, 1.0);
        let x = m.solve(&[1.0, 2.0], 1e-10, 100);
        assert!((x[0] - 1.0 / 11.0).abs() < 1e-6);
        assert!((x[1] - 7.0 / 11.0).abs() < 1e-6);
    }

    #[test]
    fn zero_rhs_short_circuits() {
        let mut m = Crs::new(2);
        m.add(0, 0, 1.0);
        m.add(1, 1, 1.0);
        assert_eq!(m.solve(&[0.0, 0.0], 1e-4, 100), vec![0.0, 0.0]);
    }

    #[test]
    fn empty_system() {
        let m = Crs::new(0);
        assert!(m.solve(&[], 1e-4, 100).is_empty());
    }

    #[test]
    fn stall_returns_best_iterate() {
        let mut m = Crs::new(2);
        m.add(0, 0, 4.0);
        m.add(1, 1, 3.0);
        m.add(0, 1, 1.0);
        m.add(1, 0, 1.0);
        // One iteration is not enough to converge; the partial iterate comes
        // back finite instead of an error.
        let x = m.solve(&[1.0, 2.0], 1e-12, 1);
        assert!(x.iter().all(|v| v.is_finite()));
    }
}
