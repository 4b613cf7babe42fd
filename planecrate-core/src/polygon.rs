//! Convex planar polygons with plane splitting and clipping

use crate::plane::{Plane, Side};
use crate::point::*;
use crate::traits::{BoundingBox, Drawable};
use itertools::Itertools;

/// A convex polygon lying in `plane`, wound counter-clockwise around its normal
#[derive(Debug, Clone, PartialEq)]
pub struct ConvexPolygon {
    pub vertices: Vec<Point3d>,
    pub plane: Plane,
}

impl ConvexPolygon {
    pub fn new(vertices: Vec<Point3d>, plane: Plane) -> Self {
        Self { vertices, plane }
    }

    /// The part of `plane` inside `bbox`.
    ///
    /// Starts from a square on the plane large enough to cover the box and
    /// clips it by the six box sides. `None` when the plane misses the box.
    pub fn from_plane_in_box(plane: &Plane, bbox: &BoundingBox, eps: f64) -> Option<Self> {
        let center = plane.project(&bbox.center());
        let half = bbox.diagonal().max(1.0) * 2.0;
        let (u, v) = plane.basis();
        let square = vec![
            center + (-u - v) * half,
            center + (u - v) * half,
            center + (u + v) * half,
            center + (-u + v) * half,
        ];
        let mut polygon = Self::new(square, *plane);
        for side in bbox.half_spaces().iter() {
            polygon = polygon.clip(side, eps)?;
        }
        Some(polygon)
    }

    pub fn len(&self) -> usize {
        self.vertices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vertices.is_empty()
    }

    /// Boundary segments in winding order
    pub fn edges(&self) -> impl Iterator<Item = (Point3d, Point3d)> + '_ {
        self.vertices.iter().copied().circular_tuple_windows()
    }

    pub fn area(&self) -> f64 {
        if self.vertices.len() < 3 {
            return 0.0;
        }
        let origin = self.vertices[0];
        let mut sum = Vector3d::zeros();
        for (a, b) in self.vertices[1..].iter().tuple_windows() {
            sum += (a - origin).cross(&(b - origin));
        }
        0.5 * sum.norm()
    }

    pub fn centroid(&self) -> Option<Point3d> {
        centroid(&self.vertices)
    }

    /// Whether the projection of `point` on the polygon plane lies inside the polygon
    pub fn contains(&self, point: &Point3d, eps: f64) -> bool {
        if self.vertices.len() < 3 {
            return false;
        }
        let p = self.plane.project(point);
        self.edges().all(|(a, b)| {
            let edge = b - a;
            let len = edge.norm();
            if len < f64::EPSILON {
                return true;
            }
            edge.cross(&(p - a)).dot(&self.plane.normal) / len >= -eps
        })
    }

    /// Split by a plane into the parts in front of and behind it.
    ///
    /// Crossing points are added to both parts. A polygon lying on the plane
    /// is returned as the front part.
    pub fn split(&self, plane: &Plane, eps: f64) -> (Option<ConvexPolygon>, Option<ConvexPolygon>) {
        let sides: Vec<Side> = self.vertices.iter().map(|p| plane.side(p, eps)).collect();
        let has_front = sides.contains(&Side::Front);
        let has_back = sides.contains(&Side::Back);

        match (has_front, has_back) {
            (false, false) | (true, false) => return (Some(self.clone()), None),
            (false, true) => return (None, Some(self.clone())),
            (true, true) => {}
        }

        let mut front = Vec::with_capacity(self.vertices.len() + 1);
        let mut back = Vec::with_capacity(self.vertices.len() + 1);
        let n = self.vertices.len();
        for i in 0..n {
            let j = (i + 1) % n;
            let (pi, pj) = (self.vertices[i], self.vertices[j]);
            match sides[i] {
                Side::Front => front.push(pi),
                Side::Back => back.push(pi),
                Side::On => {
                    front.push(pi);
                    back.push(pi);
                }
            }
            let spanning = matches!(
                (sides[i], sides[j]),
                (Side::Front, Side::Back) | (Side::Back, Side::Front)
            );
            if spanning {
                if let Some(hit) = plane.intersect_segment(&pi, &pj) {
                    front.push(hit);
                    back.push(hit);
                }
            }
        }

        let make = |vertices: Vec<Point3d>| {
            let polygon = ConvexPolygon::new(vertices, self.plane);
            (polygon.len() >= 3 && polygon.area() > eps * eps).then_some(polygon)
        };
        (make(front), make(back))
    }

    /// Keep the part behind `plane`
    pub fn clip(&self, plane: &Plane, eps: f64) -> Option<ConvexPolygon> {
        self.split(plane, eps).1
    }
}

impl Drawable for ConvexPolygon {
    fn bounding_box(&self) -> BoundingBox {
        BoundingBox::from_points(&self.vertices)
    }
}
