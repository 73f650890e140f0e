//! # modal
//!
//! Density-mode clustering: a mean-shift mode seeker over an exact k-d tree.
//!
//! Mean shift discovers the number of clusters from the data: every point
//! climbs the estimated density until it reaches a mode, nearby modes are
//! merged, and points that climbed to the same mode share a label. The
//! spatial index ([`KdTree`]) answers exact radius and k-nearest queries
//! and is reusable on its own; [`MeanShift`] drives it through the kernel
//! and metric seams ([`DensityKernel`], [`Metric`]).

pub mod cluster;
pub mod distance;
/// Error types used across `modal`.
pub mod error;
pub mod kernel;
pub mod metrics;
pub mod spatial;

pub use cluster::{Clustering, ExecutionPolicy, MeanShift, MeanShiftResult};
pub use distance::{Euclidean, Manhattan, Metric};
pub use error::{Error, Result};
pub use kernel::{DensityKernel, EpanechnikovKernel, GaussianKernel, UniformKernel};
pub use metrics::{ari, nmi, purity};
pub use spatial::{KdNode, KdTree, Neighbor, NeighborList};
