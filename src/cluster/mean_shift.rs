//! Mean shift clustering.
//!
//! # The Algorithm (Fukunaga & Hostetler 1975; Comaniciu & Meer 2002)
//!
//! Mean shift performs gradient ascent on a kernel density estimate without
//! ever materializing the estimate. Starting from a seed position `x`, one
//! step replaces `x` with the kernel-weighted mean of its neighborhood:
//!
//! ```text
//! x' = Σᵢ g(‖x - xᵢ‖²/h²) xᵢ / Σᵢ g(‖x - xᵢ‖²/h²)
//! ```
//!
//! where `g = -k'` is the negative derivative of the kernel profile and `h`
//! is the bandwidth. The displacement `x' - x` (the *mean shift vector*)
//! points along the density gradient, so repeating the step walks the seed
//! to a local density maximum, a **mode**. Seeds that climb to the same
//! mode belong to the same cluster; the number of clusters falls out of the
//! data instead of being a parameter.
//!
//! ## Pipeline
//!
//! 1. **Seeds**: one per input point, or one per occupied grid cell of side
//!    `2h` when bin seeding is on (a large-input optimization: the cell
//!    count bounds the number of trajectories).
//! 2. **Trajectories**: each seed is iterated independently against a
//!    read-only k-d tree over the original points, querying a `3h` window
//!    per step (a truncation of the kernel support), until the shift norm
//!    drops below `tolerance · h` or the iteration budget runs out.
//! 3. **Suppression**: converged positions closer than `h` to an earlier
//!    survivor are folded into it; survivors become the modes.
//! 4. **Labeling**: every converged seed takes its nearest mode's label,
//!    and each input point takes the label of its nearest converged seed
//!    (a second k-d tree over the trajectory endpoints).
//!
//! Seed trajectories share no mutable state, so step 2 parallelizes
//! trivially; steps 3 and 4 run after all trajectories have finished.
//!
//! ## Caveats
//!
//! - **Bandwidth sensitivity**: too small fragments, too large merges.
//! - **Seeds that stall**: a seed that exhausts its iteration budget simply
//!   stops where it is; inspect [`MeanShiftResult::converged`] when that
//!   distinction matters.
//! - **Suppression cost**: O(S²) over seeds. With bin seeding, S is the
//!   number of occupied cells rather than the number of points.
//!
//! ## References
//!
//! Fukunaga & Hostetler (1975). "The Estimation of the Gradient of a
//! Density Function, with Applications in Pattern Recognition." IEEE
//! Trans. Inf. Theory 21(1).
//!
//! Comaniciu & Meer (2002). "Mean Shift: A Robust Approach Toward Feature
//! Space Analysis." IEEE TPAMI 24(5).

use std::collections::HashMap;

use ndarray::Array2;

use super::traits::Clustering;
use crate::distance::{Euclidean, Metric};
use crate::error::{Error, Result};
use crate::kernel::{DensityKernel, GaussianKernel};
use crate::spatial::KdTree;

#[cfg(feature = "parallel")]
use rayon::prelude::*;

/// How seed trajectories are scheduled.
///
/// Every trajectory reads only the shared read-only index and its own
/// position buffer, so the policy never changes numerical results; it
/// exists so callers (tests in particular) can force strictly sequential
/// processing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ExecutionPolicy {
    /// Iterate seeds one at a time on the calling thread.
    Sequential,
    /// Fan trajectories out over a thread pool. Falls back to sequential
    /// when the `parallel` feature is disabled.
    #[default]
    Parallel,
}

/// Mean shift clustering algorithm.
#[derive(Debug, Clone)]
pub struct MeanShift<K: DensityKernel = GaussianKernel, M: Metric = Euclidean> {
    /// Bandwidth: kernel scale, search window factor, and mode merge radius.
    bandwidth: f32,
    /// Kernel profile supplying neighbor weights.
    kernel: K,
    /// Distance metric used by the index, suppression, and classification.
    metric: M,
    /// Convergence bound as a fraction of the bandwidth.
    tolerance: f32,
    /// Iteration budget per seed.
    max_iter: usize,
    /// Seed from occupancy bins instead of one seed per point.
    bin_seeding: bool,
    /// Minimum occupancy for a bin to emit a seed.
    min_bin_occupancy: usize,
    /// Trajectory scheduling policy.
    policy: ExecutionPolicy,
}

/// Outcome of a [`MeanShift::fit`] run.
#[derive(Debug, Clone)]
pub struct MeanShiftResult {
    /// Cluster label for each input point.
    pub labels: Vec<usize>,
    /// Surviving mode positions; labels index into this.
    pub modes: Vec<Vec<f32>>,
    /// Iterations spent by each seed. Seeds are not points: with bin
    /// seeding there is one entry per emitted bin, in sorted cell order.
    pub iterations: Vec<usize>,
    /// Whether each seed met the convergence bound within the budget.
    /// A `false` entry is not an error; the seed stopped where it was.
    pub converged: Vec<bool>,
}

/// Endpoint of one seed's trajectory.
struct SeedRun {
    position: Vec<f32>,
    iterations: usize,
    converged: bool,
}

impl MeanShift {
    /// Create a mean shift clusterer with the Gaussian kernel and Euclidean
    /// distance.
    ///
    /// # Arguments
    ///
    /// * `bandwidth` - Neighborhood scale `h`. Weighting normalizes
    ///   distances by `h`, trajectories search a `3h` window, and candidate
    ///   modes closer than `h` are merged.
    pub fn new(bandwidth: f32) -> Self {
        Self {
            bandwidth,
            kernel: GaussianKernel,
            metric: Euclidean,
            tolerance: 1e-3,
            max_iter: 100,
            bin_seeding: false,
            min_bin_occupancy: 1,
            policy: ExecutionPolicy::default(),
        }
    }
}

impl<K: DensityKernel, M: Metric> MeanShift<K, M> {
    /// Replace the kernel profile.
    pub fn with_kernel<K2: DensityKernel>(self, kernel: K2) -> MeanShift<K2, M> {
        MeanShift {
            bandwidth: self.bandwidth,
            kernel,
            metric: self.metric,
            tolerance: self.tolerance,
            max_iter: self.max_iter,
            bin_seeding: self.bin_seeding,
            min_bin_occupancy: self.min_bin_occupancy,
            policy: self.policy,
        }
    }

    /// Replace the distance metric. The index, mode suppression, and final
    /// classification all use the same metric.
    pub fn with_metric<M2: Metric>(self, metric: M2) -> MeanShift<K, M2> {
        MeanShift {
            bandwidth: self.bandwidth,
            kernel: self.kernel,
            metric,
            tolerance: self.tolerance,
            max_iter: self.max_iter,
            bin_seeding: self.bin_seeding,
            min_bin_occupancy: self.min_bin_occupancy,
            policy: self.policy,
        }
    }

    /// Set the convergence tolerance as a fraction of the bandwidth
    /// (default 1e-3).
    pub fn with_tolerance(mut self, tolerance: f32) -> Self {
        self.tolerance = tolerance;
        self
    }

    /// Set the per-seed iteration budget (default 100).
    pub fn with_max_iter(mut self, max_iter: usize) -> Self {
        self.max_iter = max_iter;
        self
    }

    /// Seed from occupancy bins of side `2h` instead of one seed per point.
    pub fn with_bin_seeding(mut self, enabled: bool) -> Self {
        self.bin_seeding = enabled;
        self
    }

    /// Minimum occupancy for a bin to emit a seed (default 1, which admits
    /// every non-empty bin). Only observed when bin seeding is on.
    pub fn with_min_bin_occupancy(mut self, occupancy: usize) -> Self {
        self.min_bin_occupancy = occupancy;
        self
    }

    /// Set the trajectory scheduling policy.
    pub fn with_policy(mut self, policy: ExecutionPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Run the full mode-seeking pass.
    ///
    /// Returns one label per input point plus the discovered modes and
    /// per-seed convergence diagnostics.
    ///
    /// # Errors
    ///
    /// Fails before any iteration starts on empty input, non-positive
    /// bandwidth, or ragged point dimensions. A trajectory that produces a
    /// non-finite position reports [`Error::NonFinite`] after all
    /// trajectories have finished.
    pub fn fit(&self, data: &[Vec<f32>]) -> Result<MeanShiftResult> {
        if data.is_empty() {
            return Err(Error::EmptyInput);
        }
        if !(self.bandwidth > 0.0) {
            return Err(Error::InvalidParameter {
                name: "bandwidth",
                message: "must be positive",
            });
        }

        let n = data.len();
        let dimension = data[0].len();
        if dimension == 0 {
            return Err(Error::InvalidParameter {
                name: "data",
                message: "points need at least one coordinate",
            });
        }

        // Convert to ndarray, validating row lengths.
        let mut flat: Vec<f32> = Vec::with_capacity(n * dimension);
        for point in data {
            if point.len() != dimension {
                return Err(Error::DimensionMismatch {
                    expected: dimension,
                    found: point.len(),
                });
            }
            flat.extend(point);
        }
        let matrix = Array2::from_shape_vec((n, dimension), flat)
            .map_err(|e| Error::Other(e.to_string()))?;

        // Read-only index over the original points; trajectories only read it.
        let index = KdTree::build_with_metric(
            dimension,
            (0..n).map(|i| matrix.row(i).to_vec()).collect(),
            (0..n).collect(),
            self.metric.clone(),
        )?;

        let seeds: Vec<Vec<f32>> = if self.bin_seeding {
            self.bin_seeds(&matrix)?
        } else {
            (0..n).map(|i| matrix.row(i).to_vec()).collect()
        };

        let run = |(i, seed): (usize, Vec<f32>)| self.shift_seed(&index, i, seed);

        #[cfg(feature = "parallel")]
        let runs: Vec<Result<SeedRun>> = match self.policy {
            ExecutionPolicy::Parallel => {
                seeds.into_par_iter().enumerate().map(run).collect()
            }
            ExecutionPolicy::Sequential => seeds.into_iter().enumerate().map(run).collect(),
        };
        #[cfg(not(feature = "parallel"))]
        let runs: Vec<Result<SeedRun>> = seeds.into_iter().enumerate().map(run).collect();

        // Trajectory failures surface only after every seed has finished.
        let mut finished = Vec::with_capacity(runs.len());
        for outcome in runs {
            finished.push(outcome?);
        }

        let (modes, seed_labels) = self.suppress(&finished);

        // Classify the original points against every converged trajectory
        // endpoint, not just the surviving modes.
        let assignment = KdTree::build_with_metric(
            dimension,
            finished.iter().map(|r| r.position.clone()).collect(),
            seed_labels,
            self.metric.clone(),
        )?;
        let mut labels = Vec::with_capacity(n);
        for i in 0..n {
            let point = matrix.row(i).to_vec();
            let hit = assignment.k_nearest(&point, 1)?;
            let nearest = hit
                .nearest()
                .ok_or_else(|| Error::Other("assignment index is empty".to_string()))?;
            labels.push(*nearest.item.value());
        }

        Ok(MeanShiftResult {
            labels,
            modes,
            iterations: finished.iter().map(|r| r.iterations).collect(),
            converged: finished.iter().map(|r| r.converged).collect(),
        })
    }

    /// Occupancy-binned seeding: one seed per sufficiently occupied grid
    /// cell of side `2h`, placed at the cell's lower corner.
    fn bin_seeds(&self, matrix: &Array2<f32>) -> Result<Vec<Vec<f32>>> {
        let bin_size = 2.0 * self.bandwidth;
        let mut bins: HashMap<Vec<i64>, usize> = HashMap::new();
        for i in 0..matrix.nrows() {
            let cell: Vec<i64> = matrix
                .row(i)
                .iter()
                .map(|x| (x / bin_size).floor() as i64)
                .collect();
            *bins.entry(cell).or_insert(0) += 1;
        }

        // Hash order is not reproducible across runs; emit seeds in sorted
        // cell order so mode discovery order is stable.
        let mut cells: Vec<(Vec<i64>, usize)> = bins.into_iter().collect();
        cells.sort();

        let seeds: Vec<Vec<f32>> = cells
            .into_iter()
            .filter(|(_, occupancy)| *occupancy >= self.min_bin_occupancy)
            .map(|(cell, _)| cell.into_iter().map(|c| c as f32 * bin_size).collect())
            .collect();
        if seeds.is_empty() {
            return Err(Error::InvalidParameter {
                name: "min_bin_occupancy",
                message: "filtered out every occupied bin",
            });
        }
        Ok(seeds)
    }

    /// Gradient-ascent trajectory for one seed, mutating its buffer in
    /// place until the shift norm drops below `tolerance * bandwidth` or
    /// the iteration budget runs out (which is not an error).
    fn shift_seed(
        &self,
        index: &KdTree<usize, M>,
        seed_index: usize,
        mut seed: Vec<f32>,
    ) -> Result<SeedRun> {
        // 3h truncation of the kernel support; heavier-tailed kernels than
        // the ones shipped here would need a wider window
        let window = 3.0 * self.bandwidth;
        let bound = f64::from(self.tolerance * self.bandwidth);
        let mut mean = vec![0f64; seed.len()];

        for iteration in 1..=self.max_iter {
            let neighbors = index.radius_query(&seed, window)?;

            let mut total = 0f64;
            mean.fill(0.0);
            for neighbor in &neighbors {
                let u = neighbor.distance / self.bandwidth;
                let weight = -f64::from(self.kernel.derivative(u * u));
                for (m, x) in mean.iter_mut().zip(neighbor.item.position()) {
                    *m += weight * f64::from(*x);
                }
                total += weight;
            }
            if total != 0.0 {
                for m in &mut mean {
                    *m /= total;
                }
            } else {
                // no usable neighborhood: the seed stays put this iteration
                for (m, s) in mean.iter_mut().zip(&seed) {
                    *m = f64::from(*s);
                }
            }

            let mut shift = 0f64;
            for (s, m) in seed.iter().zip(&mean) {
                let d = f64::from(*s) - *m;
                shift += d * d;
            }
            for (s, m) in seed.iter_mut().zip(&mean) {
                *s = *m as f32;
            }

            if seed.iter().any(|x| !x.is_finite()) {
                return Err(Error::NonFinite { seed: seed_index });
            }
            if shift.sqrt() < bound {
                return Ok(SeedRun {
                    position: seed,
                    iterations: iteration,
                    converged: true,
                });
            }
        }

        Ok(SeedRun {
            position: seed,
            iterations: self.max_iter,
            converged: false,
        })
    }

    /// Non-maximum suppression over trajectory endpoints, then nearest-mode
    /// labeling of every seed.
    fn suppress(&self, finished: &[SeedRun]) -> (Vec<Vec<f32>>, Vec<usize>) {
        let mut duplicate = vec![false; finished.len()];
        for i in 0..finished.len() {
            if duplicate[i] {
                continue;
            }
            for j in (i + 1)..finished.len() {
                if !duplicate[j]
                    && self
                        .metric
                        .distance(&finished[i].position, &finished[j].position)
                        < self.bandwidth
                {
                    duplicate[j] = true;
                }
            }
        }

        let modes: Vec<Vec<f32>> = finished
            .iter()
            .zip(&duplicate)
            .filter(|(_, dup)| !**dup)
            .map(|(run, _)| run.position.clone())
            .collect();

        // every seed, suppressed or not, is labeled by its nearest survivor
        let seed_labels: Vec<usize> = finished
            .iter()
            .map(|run| {
                let mut best = 0;
                let mut best_distance = f32::MAX;
                for (label, mode) in modes.iter().enumerate() {
                    let d = self.metric.distance(&run.position, mode);
                    if d < best_distance {
                        best_distance = d;
                        best = label;
                    }
                }
                best
            })
            .collect();

        (modes, seed_labels)
    }
}

impl<K: DensityKernel, M: Metric> Clustering for MeanShift<K, M> {
    fn fit_predict(&self, data: &[Vec<f32>]) -> Result<Vec<usize>> {
        Ok(self.fit(data)?.labels)
    }

    /// Mean shift discovers the number of clusters from the data, so this
    /// returns 0.
    fn n_clusters(&self) -> usize {
        0
    }
}
