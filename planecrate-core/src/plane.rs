//! Planes, least-squares plane fitting and plane/plane intersection lines

use crate::point::*;
use nalgebra::{Matrix3, SymmetricEigen};
use serde::{Deserialize, Serialize};

/// Tolerance for unit-vector comparisons
pub const EPSILON: f64 = 1e-9;

/// Minimum `|n_a × n_b|` for two planes to count as intersecting
pub const PARALLEL_TOLERANCE: f64 = 1e-6;

/// Position of a point relative to a plane
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Side {
    Front,
    Back,
    On,
}

/// An oriented plane `normal · p + d = 0` with unit normal
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Plane {
    pub normal: Vector3d,
    pub d: f64,
}

/// Result of a least-squares plane fit
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PlaneFit {
    pub plane: Plane,
    /// Fit quality in [0, 1]; 1 means all points are coplanar
    pub quality: f64,
    pub centroid: Point3d,
}

impl Plane {
    /// Plane through `point` with the given normal. Returns `None` for a zero normal.
    pub fn from_point_normal(point: &Point3d, normal: &Vector3d) -> Option<Self> {
        let norm = normal.norm();
        if norm < EPSILON {
            return None;
        }
        let normal = normal / norm;
        Some(Self {
            normal,
            d: -normal.dot(&point.coords),
        })
    }

    /// Least-squares plane through a set of points.
    ///
    /// The normal is the eigenvector of the smallest eigenvalue of the
    /// covariance matrix. The quality is `1 - λmin / λmid`, so a flat point set
    /// scores 1 and an isotropic one scores 0. Fewer than three points, or
    /// points that are coincident or collinear, have no defined plane.
    pub fn fit(points: &[Point3d]) -> Option<PlaneFit> {
        if points.len() < 3 {
            return None;
        }
        let centroid = centroid(points)?;
        let mut covariance = Matrix3::<f64>::zeros();
        for p in points {
            let diff = p - centroid;
            covariance += diff * diff.transpose();
        }
        covariance /= points.len() as f64;

        let eigen = SymmetricEigen::new(covariance);
        let mut order = [0usize, 1, 2];
        order.sort_by(|&a, &b| eigen.eigenvalues[a].total_cmp(&eigen.eigenvalues[b]));
        let lambda_min = eigen.eigenvalues[order[0]].max(0.0);
        let lambda_mid = eigen.eigenvalues[order[1]];
        let lambda_max = eigen.eigenvalues[order[2]];

        if lambda_max <= 0.0 || lambda_mid <= 1e-12 * lambda_max {
            return None;
        }

        let normal: Vector3d = eigen.eigenvectors.column(order[0]).into_owned();
        let plane = Self::from_point_normal(&centroid, &normal)?;
        let quality = (1.0 - lambda_min / lambda_mid).clamp(0.0, 1.0);
        Some(PlaneFit {
            plane,
            quality,
            centroid,
        })
    }

    /// Signed distance, positive on the side the normal points to.
    #[inline]
    pub fn signed_distance(&self, point: &Point3d) -> f64 {
        self.normal.dot(&point.coords) + self.d
    }

    #[inline]
    pub fn distance(&self, point: &Point3d) -> f64 {
        self.signed_distance(point).abs()
    }

    #[inline]
    pub fn squared_distance(&self, point: &Point3d) -> f64 {
        let dist = self.signed_distance(point);
        dist * dist
    }

    /// Orthogonal projection of a point onto the plane
    pub fn project(&self, point: &Point3d) -> Point3d {
        point - self.normal * self.signed_distance(point)
    }

    pub fn side(&self, point: &Point3d, eps: f64) -> Side {
        let dist = self.signed_distance(point);
        if dist > eps {
            Side::Front
        } else if dist < -eps {
            Side::Back
        } else {
            Side::On
        }
    }

    pub fn flipped(&self) -> Self {
        Self {
            normal: -self.normal,
            d: -self.d,
        }
    }

    /// Absolute cosine of the angle between the two normals
    pub fn alignment(&self, other: &Plane) -> f64 {
        self.normal.dot(&other.normal).abs()
    }

    pub fn is_parallel(&self, other: &Plane) -> bool {
        self.normal.cross(&other.normal).norm() < PARALLEL_TOLERANCE
    }

    /// Point where the segment `a`-`b` crosses the plane
    pub fn intersect_segment(&self, a: &Point3d, b: &Point3d) -> Option<Point3d> {
        let da = self.signed_distance(a);
        let db = self.signed_distance(b);
        let denom = da - db;
        if denom.abs() < f64::EPSILON || da * db > 0.0 {
            return None;
        }
        let t = da / denom;
        Some(a + (b - a) * t)
    }

    /// Line shared by two planes, `None` when they are parallel.
    pub fn intersection_line(&self, other: &Plane) -> Option<Line3> {
        let direction = self.normal.cross(&other.normal);
        let det = direction.norm_squared();
        if direction.norm() < PARALLEL_TOLERANCE {
            return None;
        }
        // Point on the line as a combination of both normals
        let (h1, h2) = (-self.d, -other.d);
        let c = self.normal.dot(&other.normal);
        let a = (h1 - h2 * c) / det;
        let b = (h2 - h1 * c) / det;
        let point = Point3d::from(self.normal * a + other.normal * b);
        Some(Line3 {
            point,
            direction: direction / det.sqrt(),
        })
    }

    /// Two orthonormal vectors spanning the plane, right-handed with the normal.
    pub fn basis(&self) -> (Vector3d, Vector3d) {
        let helper = if self.normal.x.abs() < 0.9 {
            Vector3d::x()
        } else {
            Vector3d::y()
        };
        let u = self.normal.cross(&helper).normalize();
        let v = self.normal.cross(&u);
        (u, v)
    }
}

/// Infinite line `point + t · direction` with unit direction
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Line3 {
    pub point: Point3d,
    pub direction: Vector3d,
}

impl Line3 {
    pub fn point_at(&self, t: f64) -> Point3d {
        self.point + self.direction * t
    }

    /// Parameter of the orthogonal projection of `p` on the line
    pub fn parameter(&self, p: &Point3d) -> f64 {
        (p - self.point).dot(&self.direction)
    }

    pub fn distance(&self, p: &Point3d) -> f64 {
        (p - self.point_at(self.parameter(p))).norm()
    }
}
