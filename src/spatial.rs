//! Spatial indexing for fast position-to-grain lookups
//!
//! This module is only available with the `spatial-index` feature.

#[cfg(feature = "spatial-index")]
use glam::DVec2;
#[cfg(feature = "spatial-index")]
use kiddo::immutable::float::kdtree::ImmutableKdTree;
#[cfg(feature = "spatial-index")]
use kiddo::SquaredEuclidean;

#[cfg(feature = "spatial-index")]
use crate::grain::GrainMap;

/// KD-tree over grain centers
///
/// Maps a coordinate (for example a crack-path node read back from a solver
/// result) to the grain whose center is nearest. Grain ids are sparse, so the
/// tree stores positions into `ids` rather than ids directly.
#[cfg(feature = "spatial-index")]
#[derive(Clone)]
pub struct SpatialIndex {
    tree: Option<ImmutableKdTree<f64, usize, 2, 32>>,
    ids: Vec<usize>,
}

#[cfg(feature = "spatial-index")]
impl SpatialIndex {
    /// Build the index from the centers of a grain map
    ///
    /// # Example
    ///
    /// ```
    /// use voronoi_polycrystal::*;
    ///
    /// # #[cfg(feature = "spatial-index")]
    /// # {
    /// let mut grains = GrainMap::new();
    /// grains.insert(4, Grain::new(4, vec![], DVec2::new(1.0, 1.0)));
    /// grains.insert(9, Grain::new(9, vec![], DVec2::new(3.0, 1.0)));
    ///
    /// let index = SpatialIndex::new(&grains);
    /// assert_eq!(index.find_nearest(DVec2::new(2.8, 0.7)), Some(9));
    /// # }
    /// ```
    pub fn new(grains: &GrainMap) -> Self {
        let ids: Vec<usize> = grains.keys().copied().collect();
        let points: Vec<[f64; 2]> = grains.values().map(|g| [g.center.x, g.center.y]).collect();

        let tree = if points.is_empty() {
            None
        } else {
            Some(ImmutableKdTree::new_from_slice(&points))
        };

        Self { tree, ids }
    }

    /// Id of the grain whose center is nearest to `position`
    ///
    /// Returns `None` only when the index holds no grains.
    pub fn find_nearest(&self, position: DVec2) -> Option<usize> {
        let tree = self.tree.as_ref()?;
        let result = tree.nearest_one::<SquaredEuclidean>(&[position.x, position.y]);
        self.ids.get(result.item).copied()
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.ids.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }
}
