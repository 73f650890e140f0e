//! Clustering traits.

use crate::error::Result;

/// Trait for clustering algorithms.
pub trait Clustering {
    /// Fit the model to data and return cluster assignments.
    ///
    /// Returns a vector of cluster labels, one per input point.
    fn fit_predict(&self, data: &[Vec<f32>]) -> Result<Vec<usize>>;

    /// The configured number of clusters.
    ///
    /// Algorithms that discover the number of clusters from the data
    /// return 0; count the distinct labels after `fit_predict` instead.
    fn n_clusters(&self) -> usize;
}
