use kiddo::{ImmutableKdTree, SquaredEuclidean};
use nalgebra::Point3;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Neighbor {
    pub slab_idx: usize,
    pub distance_sq: f64,
}

/// Radius queries over the Cartesian positions of a periodic slab.
///
/// Backed by an immutable k-d tree, which tolerates the many slab images that
/// share a coordinate along one axis.
pub struct SlabIndex {
    tree: Option<ImmutableKdTree<f64, 3>>,
}

impl SlabIndex {
    pub fn new(positions: &[Point3<f64>]) -> Self {
        if positions.is_empty() {
            return Self { tree: None };
        }
        let points: Vec<[f64; 3]> = positions.iter().map(|p| [p.x, p.y, p.z]).collect();
        Self {
            tree: Some(ImmutableKdTree::new_from_slice(&points)),
        }
    }

    /// All entries within `sqrt(radius_sq)` of `query`, ordered by slab index.
    pub fn within(&self, query: &Point3<f64>, radius_sq: f64) -> Vec<Neighbor> {
        let Some(tree) = &self.tree else {
            return Vec::new();
        };
        let mut found: Vec<Neighbor> = tree
            .within_unsorted::<SquaredEuclidean>(&[query.x, query.y, query.z], radius_sq)
            .into_iter()
            .map(|nn| Neighbor {
                slab_idx: nn.item as usize,
                distance_sq: nn.distance,
            })
            .collect();
        found.sort_unstable_by_key(|n| n.slab_idx);
        found
    }
}
