//! Core traits for planecrate

use crate::{plane::Plane, point::*};
use serde::{Deserialize, Serialize};

/// Axis-aligned bounding box
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub min: Point3d,
    pub max: Point3d,
}

impl BoundingBox {
    /// Box around a set of points; collapses to the origin when empty
    pub fn from_points<'a, I>(points: I) -> Self
    where
        I: IntoIterator<Item = &'a Point3d>,
    {
        let mut iter = points.into_iter();
        let first = match iter.next() {
            Some(p) => *p,
            None => {
                return Self {
                    min: Point3d::origin(),
                    max: Point3d::origin(),
                }
            }
        };
        let (mut min, mut max) = (first, first);
        for p in iter {
            min.x = min.x.min(p.x);
            min.y = min.y.min(p.y);
            min.z = min.z.min(p.z);

            max.x = max.x.max(p.x);
            max.y = max.y.max(p.y);
            max.z = max.z.max(p.z);
        }
        Self { min, max }
    }

    pub fn extent(&self) -> Vector3d {
        self.max - self.min
    }

    pub fn diagonal(&self) -> f64 {
        self.extent().norm()
    }

    /// Total area of the six box sides
    pub fn surface_area(&self) -> f64 {
        let e = self.extent();
        2.0 * (e.x * e.y + e.y * e.z + e.z * e.x)
    }

    pub fn center(&self) -> Point3d {
        nalgebra::center(&self.min, &self.max)
    }

    /// Grow the box by `margin` on every side
    pub fn enlarged(&self, margin: f64) -> Self {
        let offset = Vector3d::repeat(margin);
        Self {
            min: self.min - offset,
            max: self.max + offset,
        }
    }

    pub fn contains(&self, point: &Point3d, eps: f64) -> bool {
        (0..3).all(|i| point[i] >= self.min[i] - eps && point[i] <= self.max[i] + eps)
    }

    /// The six side planes with outward normals; the box is the back side of all of them
    pub fn half_spaces(&self) -> [Plane; 6] {
        let axes = [Vector3d::x(), Vector3d::y(), Vector3d::z()];
        let mut planes = [Plane {
            normal: Vector3d::x(),
            d: 0.0,
        }; 6];
        for (i, axis) in axes.iter().enumerate() {
            planes[2 * i] = Plane {
                normal: *axis,
                d: -self.max[i],
            };
            planes[2 * i + 1] = Plane {
                normal: -*axis,
                d: self.min[i],
            };
        }
        planes
    }
}

/// Trait for objects with a spatial extent
pub trait Drawable {
    /// Get the bounding box of the object
    fn bounding_box(&self) -> BoundingBox;

    /// Get the center point of the object
    fn center(&self) -> Point3d {
        self.bounding_box().center()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_bounding_box_measures() {
        let points = vec![
            Point3d::new(0.0, 0.0, 0.0),
            Point3d::new(2.0, 1.0, 0.5),
            Point3d::new(1.0, 3.0, 4.0),
        ];
        let bbox = BoundingBox::from_points(&points);
        assert_eq!(bbox.min, Point3d::new(0.0, 0.0, 0.0));
        assert_eq!(bbox.max, Point3d::new(2.0, 3.0, 4.0));
        assert_relative_eq!(bbox.surface_area(), 2.0 * (6.0 + 12.0 + 8.0));
        assert_relative_eq!(bbox.diagonal(), 29.0_f64.sqrt());
        assert_relative_eq!(bbox.center(), Point3d::new(1.0, 1.5, 2.0));
    }

    #[test]
    fn test_empty_box() {
        let bbox = BoundingBox::from_points(&Vec::<Point3d>::new());
        assert_eq!(bbox.diagonal(), 0.0);
        assert_eq!(bbox.surface_area(), 0.0);
    }

    #[test]
    fn test_half_spaces_contain_box() {
        let bbox = BoundingBox {
            min: Point3d::new(-1.0, -2.0, -3.0),
            max: Point3d::new(1.0, 2.0, 3.0),
        };
        let inside = Point3d::new(0.5, -1.5, 2.5);
        let outside = Point3d::new(0.0, 0.0, 3.5);
        assert!(bbox.half_spaces().iter().all(|p| p.signed_distance(&inside) <= 0.0));
        assert!(bbox.half_spaces().iter().any(|p| p.signed_distance(&outside) > 0.0));
        assert!(bbox.contains(&inside, 0.0));
        assert!(!bbox.contains(&outside, 0.0));
        assert!(bbox.enlarged(1.0).contains(&outside, 0.0));
    }
}
