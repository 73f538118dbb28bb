//! Convex polygon shapes and the shape intersection predicate
//!
//! A shape is an immutable, closed, counter-clockwise polygon in model space.
//! Entities place it in the world with an `Affine2` (rotation by orientation,
//! then translation by position) and many entities may share one shape.
//!
//! The intersection predicate is deliberately not a separating-axis test: it
//! reports a hit when some vertex of one shape lies on the inner side of every
//! edge of the other (checked in both directions). Two shapes crossing without
//! either containing a vertex of the other are missed. Interpenetration
//! resolution is tuned against this behavior, so keep it as is.

use std::collections::HashMap;
use std::sync::Arc;

use glam::{Affine2, Vec2};

use crate::error::ShapeError;
use crate::polar_to_cartesian;

/// One polygon edge in model space (`start` → `end`)
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Edge {
    pub start: Vec2,
    pub end: Vec2,
}

impl Edge {
    /// Outward normal (unnormalized) for a counter-clockwise polygon
    #[inline]
    pub fn normal(&self) -> Vec2 {
        Vec2::new(self.end.y - self.start.y, self.start.x - self.end.x)
    }

    #[inline]
    pub fn midpoint(&self) -> Vec2 {
        (self.start + self.end) * 0.5
    }
}

/// Immutable convex polygon
#[derive(Debug, Clone, PartialEq)]
pub struct ConvexShape {
    vertices: Vec<Vec2>,
    /// Average of the vertices
    center: Vec2,
    /// Largest distance from `center` to a vertex
    radius: f32,
}

impl ConvexShape {
    /// Build a shape from an ordered vertex loop
    ///
    /// Clockwise input is reversed so every edge normal points outward.
    pub fn new(mut vertices: Vec<Vec2>) -> Result<Self, ShapeError> {
        if vertices.len() < 3 {
            return Err(ShapeError::TooFewVertices {
                got: vertices.len(),
            });
        }
        if let Some(index) = vertices.iter().position(|v| !v.is_finite()) {
            return Err(ShapeError::NonFinite { index });
        }

        let area = signed_area(&vertices);
        if area.abs() <= f32::EPSILON {
            return Err(ShapeError::Degenerate);
        }
        if area < 0.0 {
            vertices.reverse();
        }

        let center = vertices.iter().copied().sum::<Vec2>() / vertices.len() as f32;
        let radius = vertices
            .iter()
            .map(|v| v.distance_squared(center))
            .fold(0.0_f32, f32::max)
            .sqrt();

        Ok(Self {
            vertices,
            center,
            radius,
        })
    }

    /// Regular polygon approximating a circle, centered on the origin
    pub fn circle(radius: f32, subdivisions: usize) -> Result<Self, ShapeError> {
        let step = std::f32::consts::TAU / subdivisions.max(1) as f32;
        let vertices = (0..subdivisions)
            .map(|i| polar_to_cartesian(radius, step * i as f32))
            .collect();
        Self::new(vertices)
    }

    /// Axis-aligned rectangle centered on the origin
    pub fn rectangle(width: f32, height: f32) -> Result<Self, ShapeError> {
        let (hw, hh) = (width / 2.0, height / 2.0);
        Self::new(vec![
            Vec2::new(-hw, -hh),
            Vec2::new(hw, -hh),
            Vec2::new(hw, hh),
            Vec2::new(-hw, hh),
        ])
    }

    pub fn vertices(&self) -> &[Vec2] {
        &self.vertices
    }

    pub fn vertex_count(&self) -> usize {
        self.vertices.len()
    }

    /// Edge `i` joins vertex `i` to vertex `i + 1` (wrapping)
    pub fn edge(&self, index: usize) -> Edge {
        let next = (index + 1) % self.vertices.len();
        Edge {
            start: self.vertices[index],
            end: self.vertices[next],
        }
    }

    pub fn edges(&self) -> impl Iterator<Item = Edge> + '_ {
        (0..self.vertices.len()).map(|i| self.edge(i))
    }

    /// Averaged center in model space
    pub fn center(&self) -> Vec2 {
        self.center
    }

    /// Bounding radius around `center`
    pub fn radius(&self) -> f32 {
        self.radius
    }

    /// Cheap bounding-circle pre-check
    pub fn bounds_overlap(
        &self,
        other: &ConvexShape,
        transform: &Affine2,
        other_transform: &Affine2,
    ) -> bool {
        let a = transform.transform_point2(self.center);
        let b = other_transform.transform_point2(other.center);
        a.distance(b) <= self.radius + other.radius
    }

    /// Narrow-phase predicate (see module docs)
    pub fn intersects(
        &self,
        other: &ConvexShape,
        transform: &Affine2,
        other_transform: &Affine2,
    ) -> bool {
        self.any_vertex_inside(other, transform, other_transform)
            || other.any_vertex_inside(self, other_transform, transform)
    }

    /// True if some vertex of `self` has every edge of `other` facing away
    fn any_vertex_inside(
        &self,
        other: &ConvexShape,
        transform: &Affine2,
        other_transform: &Affine2,
    ) -> bool {
        self.vertices.iter().any(|&vertex| {
            let vertex = transform.transform_point2(vertex);
            other.edges().all(|edge| {
                let midpoint = other_transform.transform_point2(edge.midpoint());
                let normal = other_transform.transform_vector2(edge.normal());
                (midpoint - vertex).dot(normal) >= 0.0
            })
        })
    }
}

/// Free-function form of [`ConvexShape::intersects`]
#[inline]
pub fn intersects(
    a: &ConvexShape,
    b: &ConvexShape,
    transform_a: &Affine2,
    transform_b: &Affine2,
) -> bool {
    a.intersects(b, transform_a, transform_b)
}

/// Signed polygon area (positive for counter-clockwise)
fn signed_area(vertices: &[Vec2]) -> f32 {
    let n = vertices.len();
    (0..n)
        .map(|i| vertices[i].perp_dot(vertices[(i + 1) % n]))
        .sum::<f32>()
        * 0.5
}

/// Named shapes built once at arena setup and shared by entities
#[derive(Debug, Clone, Default)]
pub struct ShapeRegistry {
    shapes: HashMap<String, Arc<ConvexShape>>,
}

impl ShapeRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register (or replace) a shape, returning the shared handle
    pub fn insert(&mut self, name: impl Into<String>, shape: ConvexShape) -> Arc<ConvexShape> {
        let shape = Arc::new(shape);
        self.shapes.insert(name.into(), Arc::clone(&shape));
        shape
    }

    pub fn get(&self, name: &str) -> Result<Arc<ConvexShape>, ShapeError> {
        self.shapes
            .get(name)
            .cloned()
            .ok_or_else(|| ShapeError::UnknownShape {
                name: name.to_string(),
            })
    }

    pub fn len(&self) -> usize {
        self.shapes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.shapes.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use std::f32::consts::PI;

    fn place(x: f32, y: f32, angle: f32) -> Affine2 {
        Affine2::from_angle_translation(angle, Vec2::new(x, y))
    }

    #[test]
    fn test_too_few_vertices() {
        let err = ConvexShape::new(vec![Vec2::ZERO, Vec2::X]).unwrap_err();
        assert_eq!(err, ShapeError::TooFewVertices { got: 2 });
    }

    #[test]
    fn test_degenerate_rejected() {
        let err = ConvexShape::new(vec![Vec2::ZERO, Vec2::X, Vec2::X * 2.0]).unwrap_err();
        assert_eq!(err, ShapeError::Degenerate);
    }

    #[test]
    fn test_clockwise_input_normals_point_outward() {
        let shape = ConvexShape::new(vec![
            Vec2::new(-1.0, 1.0),
            Vec2::new(1.0, 1.0),
            Vec2::new(1.0, -1.0),
            Vec2::new(-1.0, -1.0),
        ])
        .unwrap();
        for edge in shape.edges() {
            // Outward: normal points the same way as the midpoint from center
            assert!(edge.normal().dot(edge.midpoint() - shape.center()) > 0.0);
        }
    }

    #[test]
    fn test_circle_center_and_radius() {
        let shape = ConvexShape::circle(60.0, 24).unwrap();
        assert_eq!(shape.vertex_count(), 24);
        assert!(shape.center().length() < 1e-3);
        assert!((shape.radius() - 60.0).abs() < 1e-3);
    }

    #[test]
    fn test_overlapping_circles_intersect() {
        let a = ConvexShape::circle(10.0, 12).unwrap();
        let b = ConvexShape::circle(10.0, 12).unwrap();
        assert!(a.intersects(&b, &place(0.0, 0.0, 0.0), &place(15.0, 0.0, 0.0)));
        assert!(!a.intersects(&b, &place(0.0, 0.0, 0.0), &place(25.0, 0.0, 0.0)));
    }

    #[test]
    fn test_contained_shape_intersects() {
        let big = ConvexShape::rectangle(100.0, 100.0).unwrap();
        let small = ConvexShape::circle(2.0, 6).unwrap();
        let origin = place(0.0, 0.0, 0.0);
        let inside = place(10.0, -20.0, 0.3);
        assert!(big.intersects(&small, &origin, &inside));
        assert!(small.intersects(&big, &inside, &origin));
    }

    #[test]
    fn test_rotation_is_respected() {
        // A thin bar: rotated 90 degrees it reaches a point straight above
        let bar = ConvexShape::rectangle(40.0, 2.0).unwrap();
        let dot = ConvexShape::circle(0.5, 3).unwrap();
        let above = place(0.0, 15.0, 0.0);
        assert!(!bar.intersects(&dot, &place(0.0, 0.0, 0.0), &above));
        assert!(bar.intersects(&dot, &place(0.0, 0.0, PI / 2.0), &above));
    }

    #[test]
    fn test_crossing_bars_are_missed() {
        // Known approximation: a plus sign has no vertex inside the other bar
        let bar = ConvexShape::rectangle(40.0, 2.0).unwrap();
        let origin = place(0.0, 0.0, 0.0);
        let crossed = place(0.0, 0.0, PI / 2.0);
        assert!(!bar.intersects(&bar, &origin, &crossed));
        assert!(bar.bounds_overlap(&bar, &origin, &crossed));
    }

    #[test]
    fn test_bounds_overlap() {
        let a = ConvexShape::circle(5.0, 6).unwrap();
        let b = ConvexShape::circle(5.0, 6).unwrap();
        assert!(a.bounds_overlap(&b, &place(0.0, 0.0, 0.0), &place(9.9, 0.0, 0.0)));
        assert!(!a.bounds_overlap(&b, &place(0.0, 0.0, 0.0), &place(10.5, 0.0, 0.0)));
    }

    #[test]
    fn test_registry_lookup() {
        let mut registry = ShapeRegistry::new();
        let shared = registry.insert("obstacle", ConvexShape::circle(40.0, 24).unwrap());
        let fetched = registry.get("obstacle").unwrap();
        assert!(Arc::ptr_eq(&shared, &fetched));
        assert!(matches!(
            registry.get("missing"),
            Err(ShapeError::UnknownShape { .. })
        ));
    }

    proptest! {
        #[test]
        fn prop_intersection_is_symmetric(
            ax in -50.0f32..50.0, ay in -50.0f32..50.0, aa in 0.0f32..6.28,
            bx in -50.0f32..50.0, by in -50.0f32..50.0, ba in 0.0f32..6.28,
            w in 1.0f32..40.0, h in 1.0f32..40.0, r in 1.0f32..30.0,
        ) {
            let a = ConvexShape::rectangle(w, h).unwrap();
            let b = ConvexShape::circle(r, 7).unwrap();
            let ta = place(ax, ay, aa);
            let tb = place(bx, by, ba);
            prop_assert_eq!(a.intersects(&b, &ta, &tb), b.intersects(&a, &tb, &ta));
            prop_assert_eq!(intersects(&a, &b, &ta, &tb), intersects(&b, &a, &tb, &ta));
        }

        #[test]
        fn prop_narrow_hit_implies_bounds_overlap(
            bx in -80.0f32..80.0, by in -80.0f32..80.0, ba in 0.0f32..6.28,
        ) {
            let a = ConvexShape::circle(20.0, 12).unwrap();
            let b = ConvexShape::rectangle(30.0, 10.0).unwrap();
            let ta = place(0.0, 0.0, 0.0);
            let tb = place(bx, by, ba);
            if a.intersects(&b, &ta, &tb) {
                prop_assert!(a.bounds_overlap(&b, &ta, &tb));
            }
        }
    }
}
