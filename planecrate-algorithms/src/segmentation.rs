//! Planar segmentation
//!
//! Faces are grouped into planar charts by region growing from the most planar
//! faces, followed by a refinement pass merging near-parallel charts that fit
//! each other's plane.

use crate::segment::fit_plane_to_faces;
use planecrate_core::primitives::splitmix64;
use planecrate_core::{Color, Error, Plane, PolygonMesh, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use tracing::{debug, info};

/// Region-growing planar segmentation parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlanarSegmentation {
    /// Maximum distance of a face vertex from its chart plane
    pub dist_threshold: f64,
    /// Ring radius of the neighborhood used for each seed's initial plane
    pub num_rings: usize,
    /// Charts whose planes differ by less than this angle may merge
    pub angle_threshold_deg: f64,
    /// Share of a chart's faces that must fit the other chart's plane to merge
    pub min_fitting_ratio: f64,
}

impl Default for PlanarSegmentation {
    fn default() -> Self {
        Self {
            dist_threshold: 0.8,
            num_rings: 3,
            angle_threshold_deg: 10.0,
            min_fitting_ratio: 0.2,
        }
    }
}

/// A chart while segmentation is running
#[derive(Debug, Clone)]
struct Region {
    faces: Vec<usize>,
    plane: Option<Plane>,
}

impl PlanarSegmentation {
    pub fn new(dist_threshold: f64, num_rings: usize) -> Self {
        Self {
            dist_threshold,
            num_rings,
            ..Self::default()
        }
    }

    pub fn with_angle_threshold(mut self, degrees: f64) -> Self {
        self.angle_threshold_deg = degrees;
        self
    }

    pub fn with_min_fitting_ratio(mut self, ratio: f64) -> Self {
        self.min_fitting_ratio = ratio;
        self
    }

    pub fn validate(&self) -> Result<()> {
        if !self.dist_threshold.is_finite() || self.dist_threshold <= 0.0 {
            return Err(Error::InvalidParameter(format!(
                "distance threshold must be positive, got {}",
                self.dist_threshold
            )));
        }
        if !(self.angle_threshold_deg > 0.0 && self.angle_threshold_deg < 90.0) {
            return Err(Error::InvalidParameter(format!(
                "angle threshold must be in (0, 90) degrees, got {}",
                self.angle_threshold_deg
            )));
        }
        if !(0.0..=1.0).contains(&self.min_fitting_ratio) {
            return Err(Error::InvalidParameter(format!(
                "fitting ratio must be in [0, 1], got {}",
                self.min_fitting_ratio
            )));
        }
        Ok(())
    }

    /// Partition the mesh faces into planar charts.
    ///
    /// Requires face planarity. Writes the chart, color, area and covered
    /// area attributes and returns the number of charts. Chart ids are dense
    /// and ordered by each chart's smallest face id; the result depends only
    /// on the mesh and the parameters.
    pub fn apply(&self, mesh: &mut PolygonMesh) -> Result<usize> {
        self.validate()?;
        let planarity = mesh.face_planarity()?.to_vec();
        mesh.attributes.clear_segmentation();

        let regions = self.grow_regions(mesh, &planarity);
        let grown = regions.len();
        let regions = self.refine(mesh, regions);
        let merged = grown - regions.len();

        let segment_count = write_charts(mesh, regions)?;
        info!(
            segments = segment_count,
            grown,
            merged,
            dist_threshold = self.dist_threshold,
            "planar segmentation finished"
        );
        Ok(segment_count)
    }

    fn fits(&self, mesh: &PolygonMesh, face: usize, plane: &Plane) -> bool {
        let limit = self.dist_threshold * self.dist_threshold;
        mesh.face(face)
            .iter()
            .all(|&v| plane.squared_distance(mesh.vertex(v)) <= limit)
    }

    /// Plane a seed starts growing from: the k-ring plane when the seed fits it,
    /// otherwise the seed's own plane
    fn initial_plane(&self, mesh: &PolygonMesh, seed: usize) -> Option<Plane> {
        let ring = mesh.topology().face_k_ring(seed, self.num_rings);
        if let Some(plane) = fit_plane_to_faces(mesh, &ring) {
            if self.fits(mesh, seed, &plane) {
                return Some(plane);
            }
        }
        fit_plane_to_faces(mesh, &[seed])
            .or_else(|| Plane::from_point_normal(&mesh.face_centroid(seed), &mesh.face_normal(seed)))
    }

    fn grow_regions(&self, mesh: &PolygonMesh, planarity: &[f64]) -> Vec<Region> {
        let topology = mesh.topology();
        let mut order: Vec<usize> = (0..mesh.face_count()).collect();
        order.sort_by(|&a, &b| planarity[b].total_cmp(&planarity[a]).then(a.cmp(&b)));

        let mut assigned = vec![false; mesh.face_count()];
        let mut regions = Vec::new();

        for seed in order {
            if assigned[seed] {
                continue;
            }
            let mut plane = self.initial_plane(mesh, seed);
            let mut faces = vec![seed];
            assigned[seed] = true;

            let mut frontier = vec![seed];
            while !frontier.is_empty() {
                let candidates: BTreeSet<usize> = frontier
                    .iter()
                    .flat_map(|&f| topology.face_k_ring(f, 1))
                    .filter(|&f| !assigned[f])
                    .collect();
                frontier.clear();

                if let Some(current) = plane {
                    for f in candidates {
                        if self.fits(mesh, f, &current) {
                            assigned[f] = true;
                            faces.push(f);
                            frontier.push(f);
                        }
                    }
                }

                if !frontier.is_empty() {
                    plane = fit_plane_to_faces(mesh, &faces).or(plane);
                }
            }

            faces.sort_unstable();
            debug!(seed, faces = faces.len(), "region grown");
            regions.push(Region { faces, plane });
        }
        regions
    }

    fn fitting_ratio_reached(&self, mesh: &PolygonMesh, faces: &[usize], plane: &Plane) -> bool {
        let fitting = faces.iter().filter(|&&f| self.fits(mesh, f, plane)).count();
        fitting as f64 / faces.len() as f64 >= self.min_fitting_ratio
    }

    /// Merge near-parallel charts until no pair qualifies.
    ///
    /// Smaller charts are tried first; a merged chart goes to the end of the
    /// list with a refitted plane.
    fn refine(&self, mesh: &PolygonMesh, mut regions: Vec<Region>) -> Vec<Region> {
        let cos_threshold = self.angle_threshold_deg.to_radians().cos();

        loop {
            let mut order: Vec<usize> = (0..regions.len()).collect();
            order.sort_by_key(|&r| (regions[r].faces.len(), r));

            let mut pair = None;
            'search: for (i, &a) in order.iter().enumerate() {
                let Some(plane_a) = regions[a].plane else { continue };
                for &b in &order[i + 1..] {
                    let Some(plane_b) = regions[b].plane else { continue };
                    if plane_a.alignment(&plane_b) <= cos_threshold {
                        continue;
                    }
                    if self.fitting_ratio_reached(mesh, &regions[a].faces, &plane_b)
                        || self.fitting_ratio_reached(mesh, &regions[b].faces, &plane_a)
                    {
                        pair = Some((a, b));
                        break 'search;
                    }
                }
            }

            let Some((a, b)) = pair else { break };
            let (first, second) = (a.max(b), a.min(b));
            let removed_first = regions.remove(first);
            let removed_second = regions.remove(second);
            let mut faces = removed_first.faces;
            faces.extend(removed_second.faces);
            faces.sort_unstable();
            let plane = fit_plane_to_faces(mesh, &faces).or(removed_first.plane);
            debug!(faces = faces.len(), "charts merged");
            regions.push(Region { faces, plane });
        }
        regions
    }
}

/// Deterministic chart color with every component in 100..=255
pub fn chart_color(id: usize) -> Color {
    let hash = splitmix64(id as u64);
    let channel = |shift: u32| 100 + (hash >> shift) as u8 % 156;
    [channel(0), channel(16), channel(32)]
}

/// Relabel regions densely by smallest face id and store all chart attributes
fn write_charts(mesh: &mut PolygonMesh, mut regions: Vec<Region>) -> Result<usize> {
    regions.retain(|r| !r.faces.is_empty());
    regions.sort_by_key(|r| r.faces[0]);

    let face_count = mesh.face_count();
    let mut charts = vec![usize::MAX; face_count];
    let mut colors = vec![[0u8; 3]; face_count];
    let mut areas = vec![0.0; face_count];
    let mut covered = vec![0.0; face_count];

    for (id, region) in regions.iter().enumerate() {
        let color = chart_color(id);
        // Final plane over the whole chart, not the one growing stopped with
        let normal = fit_plane_to_faces(mesh, &region.faces)
            .or(region.plane)
            .map(|p| p.normal);
        for &f in &region.faces {
            let area = mesh.face_area(f);
            charts[f] = id;
            colors[f] = color;
            areas[f] = area;
            covered[f] = match normal {
                Some(n) => area * mesh.face_normal(f).dot(&n).abs(),
                None => area,
            };
        }
    }

    if let Some(f) = charts.iter().position(|&c| c == usize::MAX) {
        return Err(Error::Algorithm(format!("face {} was left without a chart", f)));
    }

    mesh.set_charts(charts)?;
    mesh.set_colors(colors)?;
    mesh.set_areas(areas)?;
    mesh.set_covered_areas(covered)?;
    Ok(regions.len())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parallel::WorkerPool;
    use crate::planarity::Planarity;
    use planecrate_core::primitives::{folded_strip, grid_plane, subdivided_cube};
    use planecrate_core::Point3d;

    fn segmented(mut mesh: PolygonMesh, dist: f64, num_rings: usize) -> (PolygonMesh, usize) {
        Planarity::with_pool(WorkerPool::sequential())
            .compute(&mut mesh, num_rings)
            .unwrap();
        let count = PlanarSegmentation::new(dist, num_rings).apply(&mut mesh).unwrap();
        (mesh, count)
    }

    fn assert_partition(mesh: &PolygonMesh, count: usize) {
        let charts = mesh.charts().unwrap();
        assert_eq!(charts.len(), mesh.face_count());
        let used: BTreeSet<usize> = charts.iter().copied().collect();
        assert_eq!(used, (0..count).collect::<BTreeSet<_>>());
    }

    #[test]
    fn test_flat_grid_is_one_chart() {
        let (mesh, count) = segmented(grid_plane(6, 6, 1.0).unwrap(), 0.1, 2);
        assert_eq!(count, 1);
        assert_partition(&mesh, count);
    }

    #[test]
    fn test_cube_has_six_charts() {
        let (mesh, count) = segmented(subdivided_cube(6, 10.0, 0.01).unwrap(), 0.5, 3);
        assert_eq!(count, 6);
        assert_partition(&mesh, count);

        // Each chart is one cube side
        let charts = mesh.charts().unwrap();
        for f in 0..mesh.face_count() {
            for g in 0..mesh.face_count() {
                if charts[f] == charts[g] {
                    assert!(mesh.face_normal(f).dot(&mesh.face_normal(g)) > 0.99);
                }
            }
        }
    }

    #[test]
    fn test_folded_strip_has_two_charts() {
        let (mesh, count) = segmented(folded_strip(4.0, 4.0, 2.0, 8, 8, 4).unwrap(), 0.1, 3);
        assert_eq!(count, 2);
        assert_partition(&mesh, count);
        // Face 0 is on the floor and gets the first id
        assert_eq!(mesh.charts().unwrap()[0], 0);
    }

    #[test]
    fn test_covered_area_and_colors() {
        let (mesh, count) = segmented(subdivided_cube(4, 10.0, 0.0).unwrap(), 0.5, 2);
        assert_eq!(count, 6);
        let areas = mesh.areas().unwrap();
        let covered = mesh.covered_areas().unwrap();
        for f in 0..mesh.face_count() {
            assert!(covered[f] <= areas[f] + 1e-9);
            assert!((covered[f] - areas[f]).abs() < 1e-6);
        }
        for color in mesh.colors().unwrap() {
            assert!(color.iter().all(|&c| c >= 100));
        }
    }

    #[test]
    fn test_deterministic() {
        let (a, count_a) = segmented(subdivided_cube(5, 10.0, 0.05).unwrap(), 0.5, 2);
        let (b, count_b) = segmented(subdivided_cube(5, 10.0, 0.05).unwrap(), 0.5, 2);
        assert_eq!(count_a, count_b);
        assert_eq!(a.charts().unwrap(), b.charts().unwrap());
    }

    #[test]
    fn test_refinement_merges_coplanar_pieces() {
        // Two flat grids in the same plane, not connected to each other
        let vertices = vec![
            Point3d::new(0.0, 0.0, 0.0),
            Point3d::new(1.0, 0.0, 0.0),
            Point3d::new(1.0, 1.0, 0.0),
            Point3d::new(0.0, 1.0, 0.0),
            Point3d::new(3.0, 0.0, 0.0),
            Point3d::new(4.0, 0.0, 0.0),
            Point3d::new(4.0, 1.0, 0.0),
            Point3d::new(3.0, 1.0, 0.0),
        ];
        let faces = vec![vec![0, 1, 2], vec![0, 2, 3], vec![4, 5, 6], vec![4, 6, 7]];
        let mesh = PolygonMesh::new(vertices, faces).unwrap();
        let (mesh, count) = segmented(mesh, 0.1, 1);
        assert_eq!(count, 1);
        assert_eq!(mesh.charts().unwrap(), &[0, 0, 0, 0]);
    }

    #[test]
    fn test_requires_planarity() {
        let mut mesh = grid_plane(2, 2, 1.0).unwrap();
        let result = PlanarSegmentation::default().apply(&mut mesh);
        assert!(matches!(result, Err(Error::MissingAttribute(_))));
    }

    #[test]
    fn test_rejects_bad_parameters() {
        assert!(PlanarSegmentation::new(0.0, 3).validate().is_err());
        assert!(PlanarSegmentation::new(f64::NAN, 3).validate().is_err());
        assert!(PlanarSegmentation::new(0.5, 3).with_min_fitting_ratio(1.5).validate().is_err());
        assert!(PlanarSegmentation::new(0.5, 3).with_angle_threshold(95.0).validate().is_err());
        assert!(PlanarSegmentation::new(0.5, 3).validate().is_ok());
    }

    #[test]
    fn test_chart_color_range() {
        for id in 0..64 {
            assert!(chart_color(id).iter().all(|&c| c >= 100));
        }
        assert_ne!(chart_color(0), chart_color(1));
    }
}
