//! k-d tree: exact bounded nearest-neighbor search.
//!
//! # The Structure (Bentley, 1975)
//!
//! A k-d tree is a binary space partition over D-dimensional points. Every
//! node stores one point and splits the remaining points along one
//! coordinate axis: points with a coordinate at most the split value go
//! left, strictly greater go right. The split axis cycles round-robin with
//! depth.
//!
//! ## Construction
//!
//! Each level sorts its point range along the level's axis and promotes the
//! median point to the node; the point at the median is pushed past any
//! duplicates of its coordinate so equal coordinates always land in the
//! left subtree. Sorting per level costs O(N log² N) overall, which is fine
//! for indexes that are built once per clustering run and then only read.
//!
//! ## Queries
//!
//! Both queries are depth-first branch-and-bound traversals. The child
//! whose half-space contains the query is visited first; the sibling is
//! visited only when the splitting hyperplane is close enough that it could
//! still hide a match: within the query radius, or (for k-nearest) closer
//! than the current farthest candidate once `k` candidates are held.
//! Results are exact: identical to a brute-force linear scan. Pruning only
//! skips subtrees that provably contain no match, provided the metric
//! satisfies the triangle inequality.
//!
//! ## References
//!
//! Bentley (1975). "Multidimensional Binary Search Trees Used for
//! Associative Searching." CACM 18(9).
//!
//! Friedman, Bentley & Finkel (1977). "An Algorithm for Finding Best
//! Matches in Logarithmic Expected Time." ACM TOMS 3(3).

use std::cmp::Ordering;

use super::neighbors::NeighborList;
use crate::distance::{Euclidean, Metric};
use crate::error::{Error, Result};

/// A node of the k-d tree.
///
/// Each node exclusively owns its two optional children. For a node with
/// split axis `a` and split value `v = position[a]`, every point in the
/// left subtree satisfies `coord[a] <= v` and every point in the right
/// subtree satisfies `coord[a] > v`.
#[derive(Debug, Clone)]
pub struct KdNode<V> {
    position: Vec<f32>,
    value: V,
    axis: usize,
    left: Option<Box<KdNode<V>>>,
    right: Option<Box<KdNode<V>>>,
}

impl<V> KdNode<V> {
    /// The indexed point.
    pub fn position(&self) -> &[f32] {
        &self.position
    }

    /// The value attached to the point at construction.
    pub fn value(&self) -> &V {
        &self.value
    }

    /// The coordinate axis this node splits on.
    pub fn axis(&self) -> usize {
        self.axis
    }
}

/// An exact k-d tree over fixed-dimension points.
///
/// Built once from a point set, read-only afterwards. Queries return the
/// same candidates a brute-force scan over the point set would.
#[derive(Debug, Clone)]
pub struct KdTree<V, M: Metric = Euclidean> {
    root: Option<Box<KdNode<V>>>,
    dimension: usize,
    len: usize,
    metric: M,
}

impl<V> KdTree<V> {
    /// Build a tree with the Euclidean metric.
    pub fn build(dimension: usize, points: Vec<Vec<f32>>, values: Vec<V>) -> Result<Self> {
        Self::build_with_metric(dimension, points, values, Euclidean)
    }
}

impl<V, M: Metric> KdTree<V, M> {
    /// Build a tree with a custom metric.
    ///
    /// `points[i]` is stored with `values[i]` attached. An empty point set
    /// yields an empty tree whose queries return empty collections.
    pub fn build_with_metric(
        dimension: usize,
        points: Vec<Vec<f32>>,
        values: Vec<V>,
        metric: M,
    ) -> Result<Self> {
        if dimension == 0 {
            return Err(Error::InvalidParameter {
                name: "dimension",
                message: "must be at least 1",
            });
        }
        if points.len() != values.len() {
            return Err(Error::ShapeMismatch {
                expected: format!("{} values", points.len()),
                actual: format!("{} values", values.len()),
            });
        }
        if let Some(point) = points.iter().find(|p| p.len() != dimension) {
            return Err(Error::DimensionMismatch {
                expected: dimension,
                found: point.len(),
            });
        }

        let len = points.len();
        let items: Vec<(Vec<f32>, V)> = points.into_iter().zip(values).collect();
        let root = build_node(items, 0, dimension);
        Ok(Self {
            root,
            dimension,
            len,
            metric,
        })
    }

    /// Number of indexed points.
    pub fn len(&self) -> usize {
        self.len
    }

    /// Whether the tree indexes no points.
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Dimension of the indexed points.
    pub fn dimension(&self) -> usize {
        self.dimension
    }

    /// All points within `radius` of `query`, closest first.
    pub fn radius_query(&self, query: &[f32], radius: f32) -> Result<NeighborList<&KdNode<V>>> {
        self.check_query(query)?;
        let mut found = NeighborList::unbounded();
        if let Some(root) = &self.root {
            self.collect_radius(root, query, radius, &mut found);
        }
        Ok(found)
    }

    /// The `k` points closest to `query`, closest first.
    ///
    /// Returns fewer than `k` candidates only when the tree holds fewer
    /// than `k` points.
    pub fn k_nearest(&self, query: &[f32], k: usize) -> Result<NeighborList<&KdNode<V>>> {
        self.check_query(query)?;
        if k == 0 {
            return Err(Error::InvalidParameter {
                name: "k",
                message: "must be at least 1",
            });
        }
        let mut found = NeighborList::bounded(k);
        if let Some(root) = &self.root {
            self.collect_nearest(root, query, &mut found);
        }
        Ok(found)
    }

    fn check_query(&self, query: &[f32]) -> Result<()> {
        if query.len() != self.dimension {
            return Err(Error::DimensionMismatch {
                expected: self.dimension,
                found: query.len(),
            });
        }
        Ok(())
    }

    fn collect_radius<'a>(
        &'a self,
        node: &'a KdNode<V>,
        query: &[f32],
        radius: f32,
        found: &mut NeighborList<&'a KdNode<V>>,
    ) {
        let distance = self.metric.distance(query, &node.position);
        if distance <= radius {
            let _ = found.try_add(node, distance);
        }

        let split = node.position[node.axis];
        let (near, far) = if query[node.axis] <= split {
            (&node.left, &node.right)
        } else {
            (&node.right, &node.left)
        };
        if let Some(child) = near {
            self.collect_radius(child, query, radius, found);
        }
        if let Some(child) = far {
            if self.metric.axis_distance(query[node.axis], split) <= radius {
                self.collect_radius(child, query, radius, found);
            }
        }
    }

    fn collect_nearest<'a>(
        &'a self,
        node: &'a KdNode<V>,
        query: &[f32],
        found: &mut NeighborList<&'a KdNode<V>>,
    ) {
        let distance = self.metric.distance(query, &node.position);
        let _ = found.try_add(node, distance);

        let split = node.position[node.axis];
        let (near, far) = if query[node.axis] <= split {
            (&node.left, &node.right)
        } else {
            (&node.right, &node.left)
        };
        if let Some(child) = near {
            self.collect_nearest(child, query, found);
        }
        if let Some(child) = far {
            // until the collection fills up, the sibling can always hide a
            // better candidate
            let plane = self.metric.axis_distance(query[node.axis], split);
            let descend = !found.is_full()
                || found.farthest().map_or(true, |f| plane <= f.distance);
            if descend {
                self.collect_nearest(child, query, found);
            }
        }
    }
}

/// Round-robin split axis, median by sort. The median is pushed past any
/// duplicates of its coordinate so the right subtree is strictly greater.
fn build_node<V>(
    mut items: Vec<(Vec<f32>, V)>,
    depth: usize,
    dimension: usize,
) -> Option<Box<KdNode<V>>> {
    if items.is_empty() {
        return None;
    }
    let axis = depth % dimension;
    items.sort_unstable_by(|a, b| {
        a.0[axis]
            .partial_cmp(&b.0[axis])
            .unwrap_or(Ordering::Equal)
    });

    let mut median = items.len() / 2;
    while median + 1 < items.len() && items[median + 1].0[axis] == items[median].0[axis] {
        median += 1;
    }

    let right_items = items.split_off(median + 1);
    let (position, value) = items.pop()?;
    Some(Box::new(KdNode {
        position,
        value,
        axis,
        left: build_node(items, depth + 1, dimension),
        right: build_node(right_items, depth + 1, dimension),
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::distance::Manhattan;
    use rand::prelude::*;

    fn random_points(n: usize, dimension: usize, seed: u64) -> Vec<Vec<f32>> {
        let mut rng = StdRng::seed_from_u64(seed);
        (0..n)
            .map(|_| (0..dimension).map(|_| rng.random_range(-1.0f32..1.0)).collect())
            .collect()
    }

    fn brute_radius(points: &[Vec<f32>], query: &[f32], radius: f32) -> Vec<usize> {
        points
            .iter()
            .enumerate()
            .filter(|(_, p)| Euclidean.distance(query, p) <= radius)
            .map(|(i, _)| i)
            .collect()
    }

    #[test]
    fn test_empty_tree_queries_return_empty() {
        let tree: KdTree<usize> = KdTree::build(3, vec![], vec![]).unwrap();
        assert!(tree.is_empty());
        assert!(tree.radius_query(&[0.0, 0.0, 0.0], 1.0).unwrap().is_empty());
        assert!(tree.k_nearest(&[0.0, 0.0, 0.0], 5).unwrap().is_empty());
    }

    #[test]
    fn test_query_dimension_mismatch() {
        let tree = KdTree::build(2, vec![vec![0.0, 0.0]], vec![0usize]).unwrap();
        assert!(matches!(
            tree.radius_query(&[0.0, 0.0, 0.0], 1.0),
            Err(Error::DimensionMismatch {
                expected: 2,
                found: 3
            })
        ));
        assert!(tree.k_nearest(&[0.0], 1).is_err());
    }

    #[test]
    fn test_build_validation() {
        // ragged point
        assert!(KdTree::build(2, vec![vec![0.0, 0.0], vec![1.0]], vec![0usize, 1]).is_err());
        // points/values length mismatch
        assert!(KdTree::build(2, vec![vec![0.0, 0.0]], vec![0usize, 1]).is_err());
        // zero-dimensional space
        assert!(KdTree::<usize>::build(0, vec![], vec![]).is_err());
    }

    #[test]
    fn test_k_nearest_zero_is_rejected() {
        let tree = KdTree::build(2, vec![vec![0.0, 0.0]], vec![0usize]).unwrap();
        assert!(matches!(
            tree.k_nearest(&[0.0, 0.0], 0),
            Err(Error::InvalidParameter { .. })
        ));
    }

    #[test]
    fn test_self_query_at_zero_radius() {
        let points = vec![
            vec![1.0, 2.0, 3.0],
            vec![-4.0, 0.5, 2.0],
            vec![7.0, -3.0, 1.5],
        ];
        let tree = KdTree::build(3, points.clone(), vec![10usize, 20, 30]).unwrap();
        for (point, value) in points.iter().zip([10usize, 20, 30]) {
            let hits = tree.radius_query(point, 0.0).unwrap();
            assert_eq!(hits.len(), 1);
            let hit = hits.nearest().unwrap();
            assert_eq!(hit.distance, 0.0);
            assert_eq!(*hit.item.value(), value);
        }
    }

    #[test]
    fn test_radius_query_matches_brute_force() {
        let points = random_points(400, 3, 7);
        let tree = KdTree::build(3, points.clone(), (0..points.len()).collect()).unwrap();
        let mut rng = StdRng::seed_from_u64(11);
        for _ in 0..40 {
            let query: Vec<f32> = (0..3).map(|_| rng.random_range(-1.0f32..1.0)).collect();
            let radius = rng.random_range(0.0f32..0.8);

            let mut found: Vec<usize> = tree
                .radius_query(&query, radius)
                .unwrap()
                .iter()
                .map(|n| *n.item.value())
                .collect();
            found.sort_unstable();

            let mut expected = brute_radius(&points, &query, radius);
            expected.sort_unstable();
            assert_eq!(found, expected);
        }
    }

    #[test]
    fn test_k_nearest_matches_brute_force_for_all_k() {
        let points = random_points(60, 3, 17);
        let n = points.len();
        let tree = KdTree::build(3, points.clone(), (0..n).collect()).unwrap();
        let query = vec![0.1f32, -0.2, 0.3];

        let mut expected: Vec<f32> = points
            .iter()
            .map(|p| Euclidean.distance(&query, p))
            .collect();
        expected.sort_by(|a, b| a.partial_cmp(b).unwrap());

        for k in 1..=n {
            let hits = tree.k_nearest(&query, k).unwrap();
            assert_eq!(hits.len(), k);
            let distances: Vec<f32> = hits.iter().map(|h| h.distance).collect();
            assert_eq!(distances[..], expected[..k]);
        }

        // asking for more than the tree holds returns everything
        let hits = tree.k_nearest(&query, n + 5).unwrap();
        assert_eq!(hits.len(), n);
    }

    #[test]
    fn test_results_sorted_ascending() {
        let points = random_points(200, 2, 3);
        let tree = KdTree::build(2, points.clone(), (0..points.len()).collect()).unwrap();
        let hits = tree.radius_query(&[0.0, 0.0], 1.5).unwrap();
        assert!(!hits.is_empty());

        let distances: Vec<f32> = hits.iter().map(|n| n.distance).collect();
        for pair in distances.windows(2) {
            assert!(pair[0] <= pair[1]);
        }
        assert_eq!(hits.nearest().map(|n| n.distance), distances.first().copied());
        assert_eq!(hits.farthest().map(|n| n.distance), distances.last().copied());
    }

    #[test]
    fn test_duplicate_points() {
        let points = vec![vec![1.0, 1.0]; 12];
        let tree = KdTree::build(2, points, (0..12).collect::<Vec<usize>>()).unwrap();

        let hits = tree.radius_query(&[1.0, 1.0], 0.0).unwrap();
        assert_eq!(hits.len(), 12);

        let hits = tree.k_nearest(&[1.0, 1.0], 5).unwrap();
        assert_eq!(hits.len(), 5);
        assert!(hits.iter().all(|n| n.distance == 0.0));
    }

    #[test]
    fn test_manhattan_metric_matches_brute_force() {
        let points = random_points(150, 2, 23);
        let tree =
            KdTree::build_with_metric(2, points.clone(), (0..points.len()).collect(), Manhattan)
                .unwrap();
        let mut rng = StdRng::seed_from_u64(29);
        for _ in 0..20 {
            let query: Vec<f32> = (0..2).map(|_| rng.random_range(-1.0f32..1.0)).collect();
            let radius = rng.random_range(0.0f32..1.0);

            let mut found: Vec<usize> = tree
                .radius_query(&query, radius)
                .unwrap()
                .iter()
                .map(|n| *n.item.value())
                .collect();
            found.sort_unstable();

            let mut expected: Vec<usize> = points
                .iter()
                .enumerate()
                .filter(|(_, p)| Manhattan.distance(&query, p) <= radius)
                .map(|(i, _)| i)
                .collect();
            expected.sort_unstable();
            assert_eq!(found, expected);
        }
    }

    #[test]
    fn test_values_survive_construction() {
        let points = vec![vec![10.0, 20.0], vec![30.0, 40.0], vec![50.0, 60.0]];
        let values = vec![100usize, 200, 300];
        let tree = KdTree::build(2, points.clone(), values.clone()).unwrap();
        for (point, value) in points.iter().zip(values) {
            let hit = tree.k_nearest(point, 1).unwrap();
            assert_eq!(*hit.nearest().unwrap().item.value(), value);
        }
    }
}
