//! Vertex welding by spatial hashing.
//!
//! STL files store every triangle with its own three corners, so a closed
//! surface arrives as a soup in which each shared vertex appears once per
//! incident triangle. Welding collapses those copies into one canonical vertex
//! and rewrites triangle indices to match.
//!
//! Identity here is approximate. Each position is discretized into a grid of
//! `resolution` buckets per axis, scaled to the length of the bounding box
//! diagonal, and positions that land in the same bucket on all three axes
//! are treated as one vertex. Two consequences follow:
//! - distinct vertices closer than one cell can be merged by mistake;
//! - copies of one vertex that straddle a bucket boundary are not merged.
//!
//! Exact copies, which is what STL exporters produce, always share a bucket.

use hashbrown::HashMap;
use hashbrown::hash_map::Entry;
use nalgebra::Point3;
use tracing::{debug, info, warn};

use crate::Mesh;
use crate::error::{MeshError, MeshResult};
use crate::geometry::BoundBox;
use crate::tracing_ext::OperationTimer;

/// Default number of buckets per axis.
pub const DEFAULT_WELD_RESOLUTION: u32 = 2500;

/// Largest resolution whose cube still fits an `i64` key.
pub const MAX_WELD_RESOLUTION: u32 = 2_097_151;

/// Discretizes positions inside a bounding box into scalar grid keys.
#[derive(Debug, Clone, Copy)]
pub struct SpatialHash {
    min: Point3<f64>,
    /// Buckets per unit length; zero when the box has no usable extent.
    scale: f64,
    resolution: i64,
}

impl SpatialHash {
    /// Create a hash over `bbox` with `resolution` buckets per axis.
    ///
    /// A resolution of zero is treated as one bucket; anything above
    /// [`MAX_WELD_RESOLUTION`] is capped to it.
    pub fn new(bbox: &BoundBox, resolution: u32) -> Self {
        if resolution > MAX_WELD_RESOLUTION {
            warn!(
                "Weld resolution {} exceeds {}, capping",
                resolution, MAX_WELD_RESOLUTION
            );
        }
        let resolution = i64::from(resolution.clamp(1, MAX_WELD_RESOLUTION));
        let diag = bbox.diagonal_length();
        let scale = if diag.is_finite() && diag > 0.0 {
            resolution as f64 / diag
        } else {
            0.0
        };
        let min = if bbox.is_empty() {
            Point3::origin()
        } else {
            bbox.min
        };

        Self {
            min,
            scale,
            resolution,
        }
    }

    /// Buckets per axis.
    #[inline]
    pub fn resolution(&self) -> i64 {
        self.resolution
    }

    /// Per-axis bucket of `p`, each in `0..resolution`.
    #[inline]
    pub fn bucket(&self, p: &Point3<f64>) -> [i64; 3] {
        let offset = p - self.min;
        [offset.x, offset.y, offset.z].map(|d| {
            // `as` saturates and maps NaN to zero.
            ((d * self.scale).floor() as i64).clamp(0, self.resolution - 1)
        })
    }

    /// Scalar key of `p`: x bucket is the most significant digit in base `resolution`.
    #[inline]
    pub fn key(&self, p: &Point3<f64>) -> i64 {
        let [x, y, z] = self.bucket(p);
        let r = self.resolution;
        x * r * r + y * r + z
    }
}

/// Statistics from a weld pass.
#[derive(Debug, Clone, PartialEq)]
pub struct WeldReport {
    /// Vertex count before welding.
    pub original_vertices: usize,
    /// Vertex count after welding.
    pub welded_vertices: usize,
    /// Number of vertices that hashed onto an already-seen key.
    pub duplicates: usize,
    /// Bounding box used for hashing.
    pub bounds: BoundBox,
}

/// Merge vertices that share a spatial-hash key and reindex all triangles.
///
/// The first vertex seen for each key becomes canonical and keeps its relative
/// order. Triangles are remapped into a scratch list first; on any failure the
/// mesh is left unchanged. On success vertex normals and the cached Euler
/// characteristic are cleared.
///
/// # Errors
///
/// - [`MeshError::InvalidVertexIndex`] if a triangle points past the vertex list.
/// - [`MeshError::WeldLookupMiss`] if a corner's key was never registered.
pub fn weld_vertices(mesh: &mut Mesh, resolution: u32) -> MeshResult<WeldReport> {
    let timer = OperationTimer::with_context("weld_vertices", mesh.triangle_count(), mesh.vertex_count());
    let _entered = timer.span().enter();

    let bounds = mesh.bounds();
    let hash = SpatialHash::new(&bounds, resolution);
    let original_vertices = mesh.vertices.len();

    let mut lookup: HashMap<i64, u32> = HashMap::with_capacity(original_vertices);
    let mut welded: Vec<Point3<f64>> = Vec::new();
    let mut duplicates = 0;

    for p in &mesh.vertices {
        match lookup.entry(hash.key(p)) {
            Entry::Vacant(slot) => {
                slot.insert(welded.len() as u32);
                welded.push(*p);
            }
            Entry::Occupied(_) => duplicates += 1,
        }
    }

    let mut remapped = mesh.triangles.clone();
    for (triangle_index, tri) in remapped.iter_mut().enumerate() {
        for (corner, index) in tri.v.iter_mut().enumerate() {
            let p = mesh.vertices.get(*index as usize).ok_or_else(|| {
                MeshError::invalid_vertex_index(triangle_index, *index, original_vertices)
            })?;
            let key = hash.key(p);
            *index = *lookup.get(&key).ok_or(MeshError::WeldLookupMiss {
                triangle_index,
                corner,
                key,
            })?;
        }
    }

    info!(
        "Welded vertices: {} duplicates found of {}, {} remain",
        duplicates,
        original_vertices,
        welded.len()
    );
    debug!(
        "Weld bounds: [{:.4}, {:.4}, {:.4}] to [{:.4}, {:.4}, {:.4}], diagonal {:.4}",
        bounds.min.x,
        bounds.min.y,
        bounds.min.z,
        bounds.max.x,
        bounds.max.y,
        bounds.max.z,
        bounds.diagonal_length()
    );

    let report = WeldReport {
        original_vertices,
        welded_vertices: welded.len(),
        duplicates,
        bounds,
    };

    mesh.vertices = welded;
    mesh.triangles = remapped;
    mesh.normals.clear();
    mesh.euler = None;

    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Triangle;

    fn unit_box() -> BoundBox {
        BoundBox::from_points(&[Point3::new(0.0, 0.0, 0.0), Point3::new(1.0, 1.0, 1.0)])
    }

    /// Two triangles of a unit square, stored as a soup (6 vertices, 2 shared twice).
    fn square_soup() -> Mesh {
        let a = Point3::new(0.0, 0.0, 0.0);
        let b = Point3::new(1.0, 0.0, 0.0);
        let c = Point3::new(1.0, 1.0, 0.0);
        let d = Point3::new(0.0, 1.0, 0.0);
        let mut mesh = Mesh::new();
        mesh.install_soup(
            vec![a, b, c, a, c, d],
            vec![Triangle::new([0, 1, 2]), Triangle::new([3, 4, 5])],
        );
        mesh
    }

    #[test]
    fn test_key_positional_encoding() {
        let hash = SpatialHash::new(&unit_box(), 2500);
        let diag = 3.0_f64.sqrt();

        // One cell is diag / 2500 wide on every axis.
        let cell = diag / 2500.0;
        let p = Point3::new(3.5 * cell, 2.5 * cell, 1.5 * cell);
        assert_eq!(hash.bucket(&p), [3, 2, 1]);
        assert_eq!(hash.key(&p), 3 * 2500 * 2500 + 2 * 2500 + 1);
        assert_eq!(hash.key(&Point3::origin()), 0);
    }

    #[test]
    fn test_key_clamps_max_corner() {
        // A box that is a straight line: the max corner sits exactly one
        // diagonal away and would land in bucket `resolution`.
        let bbox = BoundBox::from_points(&[Point3::new(0.0, 0.0, 0.0), Point3::new(0.0, 0.0, 1.0)]);
        let hash = SpatialHash::new(&bbox, 10);
        assert_eq!(hash.bucket(&Point3::new(0.0, 0.0, 1.0)), [0, 0, 9]);
        assert_ne!(
            hash.key(&Point3::new(0.0, 0.0, 1.0)),
            hash.key(&Point3::new(0.0, 0.1, 0.0))
        );
    }

    #[test]
    fn test_key_caps_oversized_resolution() {
        let hash = SpatialHash::new(&unit_box(), 3_000_000);
        assert_eq!(hash.resolution(), i64::from(MAX_WELD_RESOLUTION));

        // The far corner has the largest bucket on every axis.
        let r = hash.resolution();
        let far = Point3::new(1.0, 1.0, 1.0);
        let [x, y, z] = hash.bucket(&far);
        assert!(x < r && y < r && z < r);
        assert_eq!(hash.key(&far), x * r * r + y * r + z);
        assert!(hash.key(&far) > 0);

        let hash = SpatialHash::new(&unit_box(), u32::MAX);
        assert_eq!(hash.resolution(), i64::from(MAX_WELD_RESOLUTION));
    }

    #[test]
    fn test_weld_oversized_resolution() {
        let config = crate::config::MeshConfig {
            weld_resolution: 3_000_000,
            ..Default::default()
        };
        let soup = square_soup();
        let mut mesh = Mesh::with_config(config);
        mesh.install_soup(soup.vertices().to_vec(), soup.triangles().to_vec());

        let report = mesh.weld().unwrap();
        assert_eq!(report.welded_vertices, 4);
        assert_eq!(report.duplicates, 2);
    }

    #[test]
    fn test_key_degenerate_box() {
        let bbox = BoundBox::from_points(&[Point3::new(2.0, 2.0, 2.0)]);
        let hash = SpatialHash::new(&bbox, 2500);
        assert_eq!(hash.key(&Point3::new(2.0, 2.0, 2.0)), 0);

        let empty = SpatialHash::new(&BoundBox::new(), 2500);
        assert_eq!(empty.key(&Point3::new(1.0, 2.0, 3.0)), 0);
    }

    #[test]
    fn test_close_points_collapse() {
        let hash = SpatialHash::new(&unit_box(), 2500);
        let cell = 3.0_f64.sqrt() / 2500.0;
        let p = Point3::new(100.2 * cell, 40.5 * cell, 7.5 * cell);
        let q = Point3::new(100.7 * cell, 40.4 * cell, 7.6 * cell);
        assert_eq!(hash.bucket(&p), [100, 40, 7]);
        assert_eq!(hash.key(&p), hash.key(&q));

        let far = Point3::new(105.5 * cell, 40.5 * cell, 7.5 * cell);
        assert_ne!(hash.key(&p), hash.key(&far));
    }

    #[test]
    fn test_weld_square_soup() {
        let mut mesh = square_soup();
        let report = weld_vertices(&mut mesh, DEFAULT_WELD_RESOLUTION).unwrap();

        assert_eq!(report.original_vertices, 6);
        assert_eq!(report.duplicates, 2);
        assert_eq!(report.welded_vertices, 4);
        assert_eq!(mesh.vertex_count(), 4);
        assert_eq!(mesh.triangles()[0].v, [0, 1, 2]);
        assert_eq!(mesh.triangles()[1].v, [0, 2, 3]);
    }

    #[test]
    fn test_weld_preserves_first_seen_order() {
        let mut mesh = square_soup();
        let before: Vec<_> = mesh.vertices().to_vec();
        weld_vertices(&mut mesh, DEFAULT_WELD_RESOLUTION).unwrap();
        assert_eq!(mesh.vertices(), &[before[0], before[1], before[2], before[5]]);
    }

    #[test]
    fn test_weld_keeps_triangle_normals() {
        let mut mesh = square_soup();
        mesh.triangles[1].normal = nalgebra::Vector3::z();
        weld_vertices(&mut mesh, DEFAULT_WELD_RESOLUTION).unwrap();
        assert_eq!(mesh.triangles()[1].normal, nalgebra::Vector3::z());
    }

    #[test]
    fn test_weld_no_duplicates_is_identity() {
        let mut mesh = Mesh::from_indexed(
            vec![
                Point3::new(0.0, 0.0, 0.0),
                Point3::new(1.0, 0.0, 0.0),
                Point3::new(0.0, 1.0, 0.0),
            ],
            &[[0, 1, 2]],
        )
        .unwrap();
        let report = weld_vertices(&mut mesh, DEFAULT_WELD_RESOLUTION).unwrap();
        assert_eq!(report.duplicates, 0);
        assert_eq!(mesh.triangles()[0].v, [0, 1, 2]);
    }

    #[test]
    fn test_weld_coarse_resolution_merges_distinct_points() {
        let mut mesh = Mesh::from_indexed(
            vec![
                Point3::new(0.0, 0.0, 0.0),
                Point3::new(0.01, 0.0, 0.0),
                Point3::new(10.0, 0.0, 0.0),
                Point3::new(0.0, 10.0, 0.0),
            ],
            &[[0, 2, 3], [1, 2, 3]],
        )
        .unwrap();

        let report = weld_vertices(&mut mesh, 10).unwrap();
        assert_eq!(report.duplicates, 1);
        assert_eq!(mesh.triangles()[0].v, mesh.triangles()[1].v);
    }

    #[test]
    fn test_weld_invalid_index_leaves_mesh_untouched() {
        let mut mesh = square_soup();
        mesh.triangles[1].v[2] = 99;

        let result = weld_vertices(&mut mesh, DEFAULT_WELD_RESOLUTION);
        assert!(matches!(
            result,
            Err(MeshError::InvalidVertexIndex {
                triangle_index: 1,
                vertex_index: 99,
                ..
            })
        ));
        assert_eq!(mesh.vertex_count(), 6);
        assert_eq!(mesh.triangles()[0].v, [0, 1, 2]);
    }

    #[test]
    fn test_weld_empty_mesh() {
        let mut mesh = Mesh::new();
        let report = weld_vertices(&mut mesh, DEFAULT_WELD_RESOLUTION).unwrap();
        assert_eq!(report.original_vertices, 0);
        assert_eq!(report.welded_vertices, 0);
        assert!(report.bounds.is_empty());
    }
}
