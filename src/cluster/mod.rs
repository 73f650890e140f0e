//! Density-mode clustering.
//!
//! Mean shift groups points without being told how many groups to find: it
//! treats the point set as samples from an unknown density, climbs every
//! point (or bin seed) uphill to a local maximum of that density, merges
//! maxima that land within one bandwidth of each other, and labels each
//! point by the maximum its neighborhood climbed to.
//!
//! Contrast with the usual suspects:
//!
//! | Algorithm | Cluster count | Shape assumption |
//! |-----------|---------------|------------------|
//! | K-means | fixed up front | spherical, similar size |
//! | Mean shift | discovered | none (density peaks) |
//! | DBSCAN | discovered | density-connected regions |
//!
//! The single knob that matters is the **bandwidth**: it scales the kernel
//! weighting, sets the `3h` neighborhood search window, and is the merge
//! radius for discovered modes. Small bandwidths fragment the data into
//! many modes; large bandwidths blur distinct groups into one.
//!
//! ## Usage
//!
//! ```rust
//! use modal::{Clustering, MeanShift, UniformKernel};
//!
//! let data = vec![
//!     vec![0.0, 0.0],
//!     vec![0.1, 0.1],
//!     vec![10.0, 10.0],
//!     vec![10.1, 10.1],
//! ];
//!
//! let labels = MeanShift::new(1.0)
//!     .with_kernel(UniformKernel)
//!     .fit_predict(&data)
//!     .unwrap();
//!
//! assert_eq!(labels[0], labels[1]);
//! assert_eq!(labels[2], labels[3]);
//! assert_ne!(labels[0], labels[2]);
//! ```

mod mean_shift;
mod traits;

pub use mean_shift::{ExecutionPolicy, MeanShift, MeanShiftResult};
pub use traits::Clustering;
