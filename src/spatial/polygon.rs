use crate::math::{OrientedBox, Point2d};
use crate::ElementId;
use itertools::Itertools;
use rstar::primitives::{GeomWithData, Rectangle};
use rstar::{RTree, AABB};
use std::collections::HashMap;

type Footprint = Rectangle<[f64; 2]>;
type Entry = GeomWithData<Footprint, ElementId>;

/// An R-tree over element footprints.
///
/// Each element is stored as the axis-aligned bounding box of its polygon.
/// Queries return every element whose box touches the query region, so
/// callers needing exact overlap test the polygons themselves.
#[derive(Default)]
pub struct PolygonIndex {
    tree: RTree<Entry>,
    footprints: HashMap<ElementId, Footprint>,
}

fn footprint_of(vertices: &[Point2d; 4]) -> Footprint {
    let (min_x, max_x) = vertices
        .iter()
        .map(|v| v.x)
        .minmax()
        .into_option()
        .unwrap_or_default();
    let (min_y, max_y) = vertices
        .iter()
        .map(|v| v.y)
        .minmax()
        .into_option()
        .unwrap_or_default();
    Rectangle::from_corners([min_x, min_y], [max_x, max_y])
}

impl PolygonIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds an index from scratch, which is cheaper than inserting one by one.
    pub fn bulk_load(polygons: impl IntoIterator<Item = (ElementId, [Point2d; 4])>) -> Self {
        let footprints = polygons
            .into_iter()
            .map(|(id, vertices)| (id, footprint_of(&vertices)))
            .collect::<HashMap<_, _>>();
        let entries = footprints
            .iter()
            .map(|(id, rect)| GeomWithData::new(*rect, *id))
            .collect();
        Self {
            tree: RTree::bulk_load(entries),
            footprints,
        }
    }

    /// Inserts or replaces the polygon of an element.
    pub fn insert(&mut self, id: ElementId, vertices: &[Point2d; 4]) {
        self.remove(id);
        let rect = footprint_of(vertices);
        self.tree.insert(GeomWithData::new(rect, id));
        self.footprints.insert(id, rect);
    }

    /// Removes an element. Returns false if it was not present.
    pub fn remove(&mut self, id: ElementId) -> bool {
        let Some(rect) = self.footprints.remove(&id) else {
            return false;
        };
        self.tree.remove(&GeomWithData::new(rect, id));
        true
    }

    pub fn contains(&self, id: ElementId) -> bool {
        self.footprints.contains_key(&id)
    }

    pub fn len(&self) -> usize {
        self.footprints.len()
    }

    pub fn is_empty(&self) -> bool {
        self.footprints.is_empty()
    }

    /// Elements whose bounding box intersects the axis-aligned box `[min, max]`.
    pub fn query_box(&self, min: Point2d, max: Point2d) -> Vec<ElementId> {
        let envelope = AABB::from_corners([min.x, min.y], [max.x, max.y]);
        self.tree
            .locate_in_envelope_intersecting(&envelope)
            .map(|entry| entry.data)
            .unique()
            .collect()
    }

    /// Candidates for overlapping `obb`: the elements whose bounding box meets its envelope.
    pub fn query_polygon(&self, obb: &OrientedBox) -> Vec<ElementId> {
        let (min, max) = obb.envelope();
        self.query_box(min, max)
    }

    /// The element whose bounding box is nearest to `point`.
    pub fn nearest(&self, point: Point2d) -> Option<ElementId> {
        self.tree
            .nearest_neighbor(&[point.x, point.y])
            .map(|entry| entry.data)
    }

    /// The element nearest to `point` other than `exclude`.
    pub fn nearest_except(&self, point: Point2d, exclude: ElementId) -> Option<ElementId> {
        self.tree
            .nearest_neighbor_iter(&[point.x, point.y])
            .map(|entry| entry.data)
            .find(|id| *id != exclude)
    }
}
