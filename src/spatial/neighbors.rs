//! Ordered, capacity-limited neighbor accumulation for tree queries.

/// A neighbor candidate paired with its distance to the query.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Neighbor<C> {
    /// The matched item (for tree queries, a node reference).
    pub item: C,
    /// Distance from the query point.
    pub distance: f32,
}

/// An ordered collection of neighbor candidates, ascending by distance.
///
/// With a positive capacity the collection keeps only the closest
/// `capacity` candidates, evicting the farthest when a closer one arrives;
/// capacity 0 means unbounded. Candidates at equal distance keep their
/// insertion order. Each collection is owned by a single query call, so
/// there is no concurrent mutation to guard against.
#[derive(Debug, Clone)]
pub struct NeighborList<C> {
    entries: Vec<Neighbor<C>>,
    capacity: usize,
}

impl<C> NeighborList<C> {
    /// Create an unbounded collection.
    pub fn unbounded() -> Self {
        Self {
            entries: Vec::new(),
            capacity: 0,
        }
    }

    /// Create a collection that keeps at most `capacity` candidates.
    pub fn bounded(capacity: usize) -> Self {
        Self {
            entries: Vec::with_capacity(capacity),
            capacity,
        }
    }

    /// Offer a candidate; returns whether it was kept.
    ///
    /// A full collection accepts the candidate only if it is strictly
    /// closer than the current farthest, which is then evicted.
    pub fn try_add(&mut self, item: C, distance: f32) -> bool {
        if self.capacity > 0 && self.entries.len() == self.capacity {
            match self.entries.last() {
                Some(farthest) if distance < farthest.distance => {
                    let _ = self.entries.pop();
                }
                _ => return false,
            }
        }
        let at = self.entries.partition_point(|n| n.distance <= distance);
        self.entries.insert(at, Neighbor { item, distance });
        true
    }

    /// The closest candidate kept so far.
    pub fn nearest(&self) -> Option<&Neighbor<C>> {
        self.entries.first()
    }

    /// The farthest candidate currently kept.
    pub fn farthest(&self) -> Option<&Neighbor<C>> {
        self.entries.last()
    }

    /// Number of candidates currently kept.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the collection holds no candidates.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Whether a bounded collection has reached its capacity.
    pub fn is_full(&self) -> bool {
        self.capacity > 0 && self.entries.len() == self.capacity
    }

    /// Remove every candidate.
    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// Candidates in ascending distance order.
    pub fn iter(&self) -> std::slice::Iter<'_, Neighbor<C>> {
        self.entries.iter()
    }
}

impl<'a, C> IntoIterator for &'a NeighborList<C> {
    type Item = &'a Neighbor<C>;
    type IntoIter = std::slice::Iter<'a, Neighbor<C>>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl<C> IntoIterator for NeighborList<C> {
    type Item = Neighbor<C>;
    type IntoIter = std::vec::IntoIter<Neighbor<C>>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.into_iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unbounded_accepts_everything() {
        let mut list = NeighborList::unbounded();
        assert!(list.try_add("far", 9.0));
        assert!(list.try_add("near", 1.0));
        assert!(list.try_add("mid", 4.0));
        assert_eq!(list.len(), 3);
        let order: Vec<&str> = list.iter().map(|n| n.item).collect();
        assert_eq!(order, ["near", "mid", "far"]);
    }

    #[test]
    fn test_bounded_evicts_farthest() {
        let mut list = NeighborList::bounded(2);
        assert!(list.try_add(0, 5.0));
        assert!(list.try_add(1, 3.0));
        assert!(list.is_full());

        // too far: rejected outright
        assert!(!list.try_add(2, 7.0));
        assert_eq!(list.len(), 2);

        // closer: evicts the current farthest
        assert!(list.try_add(3, 1.0));
        assert_eq!(list.len(), 2);
        assert_eq!(list.nearest().map(|n| n.item), Some(3));
        assert_eq!(list.farthest().map(|n| n.item), Some(1));
    }

    #[test]
    fn test_capacity_invariant_under_arbitrary_adds() {
        let mut list = NeighborList::bounded(4);
        let distances = [5.0, 2.0, 8.0, 1.0, 9.0, 3.0, 7.0, 0.5, 6.0, 2.5];
        for (item, &distance) in distances.iter().enumerate() {
            let _ = list.try_add(item, distance);
            assert!(list.len() <= 4);
            let sorted: Vec<f32> = list.iter().map(|n| n.distance).collect();
            for pair in sorted.windows(2) {
                assert!(pair[0] <= pair[1]);
            }
            assert_eq!(list.nearest().map(|n| n.distance), sorted.first().copied());
            assert_eq!(list.farthest().map(|n| n.distance), sorted.last().copied());
        }

        // only the four smallest distances survive
        let kept: Vec<f32> = list.iter().map(|n| n.distance).collect();
        assert_eq!(kept, vec![0.5, 1.0, 2.0, 2.5]);
    }

    #[test]
    fn test_equal_distances_keep_insertion_order() {
        let mut list = NeighborList::unbounded();
        let _ = list.try_add("a", 1.0);
        let _ = list.try_add("b", 1.0);
        let _ = list.try_add("c", 0.5);
        let order: Vec<&str> = list.iter().map(|n| n.item).collect();
        assert_eq!(order, ["c", "a", "b"]);
    }

    #[test]
    fn test_clear_resets() {
        let mut list = NeighborList::bounded(3);
        let _ = list.try_add(1, 1.0);
        let _ = list.try_add(2, 2.0);
        list.clear();
        assert!(list.is_empty());
        assert!(list.nearest().is_none());
        assert!(list.farthest().is_none());
        assert!(list.try_add(3, 10.0));
    }
}
