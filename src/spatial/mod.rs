//! Spatial indexing: an exact k-d tree and its neighbor collections.
//!
//! The index is built once from a fixed point set and is read-only
//! afterwards, which makes it safe to query from many threads at once.
//! Queries are exact: a radius or k-nearest query returns precisely the
//! points a brute-force linear scan would.
//!
//! ```rust
//! use modal::KdTree;
//!
//! let points = vec![vec![0.0, 0.0], vec![1.0, 0.0], vec![0.0, 1.0]];
//! let tree = KdTree::build(2, points, vec![0usize, 1, 2]).unwrap();
//!
//! let hits = tree.radius_query(&[0.0, 0.0], 1.0).unwrap();
//! assert_eq!(hits.len(), 3);
//!
//! let nearest = tree.k_nearest(&[0.9, 0.1], 1).unwrap();
//! assert_eq!(*nearest.nearest().unwrap().item.value(), 1);
//! ```

mod kdtree;
mod neighbors;

pub use kdtree::{KdNode, KdTree};
pub use neighbors::{Neighbor, NeighborList};
