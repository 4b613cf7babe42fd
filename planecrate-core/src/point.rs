//! Point types and related functionality

use nalgebra::{Point3, Vector3};

/// A 3D point with double precision coordinates
pub type Point3d = Point3<f64>;

/// A 3D vector with double precision components
pub type Vector3d = Vector3<f64>;

/// An RGB color
pub type Color = [u8; 3];

/// Arithmetic mean of a set of points, `None` when empty
pub fn centroid<'a, I>(points: I) -> Option<Point3d>
where
    I: IntoIterator<Item = &'a Point3d>,
{
    let mut sum = Vector3d::zeros();
    let mut count = 0usize;
    for p in points {
        sum += p.coords;
        count += 1;
    }
    if count == 0 {
        return None;
    }
    Some(Point3d::from(sum / count as f64))
}
