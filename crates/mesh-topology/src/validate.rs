//! Topological validation.
//!
//! Two checks run on top of the reconstructed edge set:
//!
//! - **Basic validity**: every vertex is an endpoint of some edge and every edge
//!   endpoint lies inside the mesh bounding box.
//! - **Manifold validity**: the Euler characteristic is even, every edge is used
//!   by exactly two triangles and every vertex touches at least three edges.
//!
//! Both are necessary conditions only. A mesh that passes the manifold check
//! can still have a pinched vertex fan or self-intersections.
//!
//! Failing a check is a verdict, not an error: checks return
//! `Result<(), Violation>` and the `Mesh` wrappers return `bool`.

use std::fmt;

use tracing::{info, warn};

use crate::Mesh;
use crate::edges::{EdgeSet, edge_key};
use crate::tracing_ext::{OperationTimer, log_validity};
use crate::types::Edge;

/// Euler characteristic `V - E + F`.
#[inline]
pub fn euler_characteristic(vertices: usize, edges: usize, faces: usize) -> i64 {
    vertices as i64 - edges as i64 + faces as i64
}

/// The first rule a mesh broke.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Violation {
    /// A vertex is not an endpoint of any edge.
    DanglingVertex { vertex: usize },
    /// An edge endpoint is outside the bounding box or past the vertex list.
    EdgeOutOfBounds { edge: [u32; 2] },
    /// A closed orientable surface has `V - E + F = 2 - 2g`, always even.
    OddEulerCharacteristic { euler: i64 },
    /// An edge is not shared by exactly two triangles.
    EdgeIncidence { edge: [u32; 2], faces: u32 },
    /// A vertex touches fewer than three edges, so its fan cannot close.
    OpenVertexRing { vertex: usize, edges: u32 },
}

impl fmt::Display for Violation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Violation::DanglingVertex { vertex } => {
                write!(f, "vertex {} is not part of any edge", vertex)
            }
            Violation::EdgeOutOfBounds { edge } => {
                write!(f, "edge {}-{} lies outside the mesh bounds", edge[0], edge[1])
            }
            Violation::OddEulerCharacteristic { euler } => {
                write!(f, "Euler characteristic {} is odd", euler)
            }
            Violation::EdgeIncidence { edge, faces } => write!(
                f,
                "edge {}-{} is used by {} triangles (expected 2)",
                edge[0], edge[1], faces
            ),
            Violation::OpenVertexRing { vertex, edges } => write!(
                f,
                "vertex {} touches only {} edges (need at least 3)",
                vertex, edges
            ),
        }
    }
}

/// Check that no vertex dangles and no edge leaves the bounding box.
///
/// `edges` must have been built from `mesh`'s current triangles.
pub fn check_basic(mesh: &Mesh, edges: &EdgeSet) -> Result<(), Violation> {
    let degrees = edges.vertex_degrees(mesh.vertex_count());
    if let Some(vertex) = degrees.iter().position(|&d| d == 0) {
        return Err(Violation::DanglingVertex { vertex });
    }

    let bbox = mesh.bounds();
    let vertices = mesh.vertices();
    for edge in edges.edges() {
        let inside = edge.v.iter().all(|&i| {
            vertices
                .get(i as usize)
                .is_some_and(|p| bbox.contains(p))
        });
        if !inside {
            return Err(Violation::EdgeOutOfBounds { edge: edge.v });
        }
    }

    Ok(())
}

/// Check the three manifold conditions, stopping at the first failure.
///
/// Edge incidence is tallied again from the triangles rather than read from
/// [`Edge::faces`], so a stale or hand-edited edge set is still judged
/// against the real connectivity.
pub fn check_manifold(mesh: &Mesh, edges: &EdgeSet, euler: i64) -> Result<(), Violation> {
    if euler % 2 != 0 {
        return Err(Violation::OddEulerCharacteristic { euler });
    }

    let mut incidence = vec![0u32; edges.len()];
    for tri in mesh.triangles() {
        for (a, b) in tri.directed_edges() {
            match edges.position(a, b) {
                Some(i) => incidence[i] += 1,
                None => {
                    let (a, b) = edge_key(a, b);
                    return Err(Violation::EdgeIncidence {
                        edge: [a, b],
                        faces: 0,
                    });
                }
            }
        }
    }
    if let Some((edge, &faces)) = edges
        .edges()
        .iter()
        .zip(&incidence)
        .find(|&(_, &count)| count != 2)
    {
        return Err(Violation::EdgeIncidence {
            edge: edge.v,
            faces,
        });
    }

    let degrees = edges.vertex_degrees(mesh.vertex_count());
    if let Some((vertex, &count)) = degrees.iter().enumerate().find(|&(_, &d)| d < 3) {
        return Err(Violation::OpenVertexRing {
            vertex,
            edges: count,
        });
    }

    Ok(())
}

/// Counts, Euler characteristic and both verdicts for one mesh.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidityReport {
    pub vertex_count: usize,
    pub edge_count: usize,
    pub triangle_count: usize,
    pub euler: i64,
    /// Outcome of [`check_basic`].
    pub basic: Result<(), Violation>,
    /// Outcome of [`check_manifold`].
    pub manifold: Result<(), Violation>,
    /// Edges whose two triangles wind consistently.
    pub oriented_edge_count: usize,
}

impl ValidityReport {
    pub fn is_basic_valid(&self) -> bool {
        self.basic.is_ok()
    }

    pub fn is_manifold(&self) -> bool {
        self.manifold.is_ok()
    }

    /// Both checks passed.
    pub fn is_valid(&self) -> bool {
        self.is_basic_valid() && self.is_manifold()
    }

    /// Manifold and every edge consistently wound.
    pub fn is_consistently_oriented(&self) -> bool {
        self.is_manifold() && self.oriented_edge_count == self.edge_count
    }

    /// Genus implied by the Euler characteristic, for manifold meshes.
    pub fn genus(&self) -> Option<i64> {
        self.is_manifold().then(|| (2 - self.euler) / 2)
    }
}

impl fmt::Display for ValidityReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Validity Report:")?;
        writeln!(f, "  Vertices: {}", self.vertex_count)?;
        writeln!(f, "  Edges: {}", self.edge_count)?;
        writeln!(f, "  Triangles: {}", self.triangle_count)?;
        writeln!(f, "  Euler characteristic: {}", self.euler)?;

        match &self.basic {
            Ok(()) => writeln!(f, "  Basic: yes")?,
            Err(v) => writeln!(f, "  Basic: NO ({})", v)?,
        }
        match &self.manifold {
            Ok(()) => writeln!(f, "  Manifold: yes")?,
            Err(v) => writeln!(f, "  Manifold: NO ({})", v)?,
        }

        writeln!(
            f,
            "  Oriented edges: {} of {}",
            self.oriented_edge_count, self.edge_count
        )?;

        if let Some(genus) = self.genus() {
            writeln!(f, "  Genus: {}", genus)?;
        }

        Ok(())
    }
}

/// Run both checks against a single edge reconstruction.
///
/// Caches the Euler characteristic on the mesh and logs the verdicts.
pub fn validate_mesh(mesh: &mut Mesh) -> ValidityReport {
    let timer = OperationTimer::with_context("validate_mesh", mesh.triangle_count(), mesh.vertex_count());
    let _entered = timer.span().enter();

    let edges = EdgeSet::build(mesh.triangles());
    let euler = euler_characteristic(mesh.vertex_count(), edges.len(), mesh.triangle_count());
    mesh.euler = Some(euler);

    let report = ValidityReport {
        vertex_count: mesh.vertex_count(),
        edge_count: edges.len(),
        triangle_count: mesh.triangle_count(),
        euler,
        basic: check_basic(mesh, &edges),
        manifold: check_manifold(mesh, &edges, euler),
        oriented_edge_count: edges.edges().iter().filter(|e| e.oriented).count(),
    };

    log_validity(&report);
    report
}

impl Mesh {
    /// Reconstruct edges, cache the Euler characteristic and run the basic check.
    pub fn basic_validity(&mut self) -> bool {
        let (edges, _) = self.cache_euler();
        match check_basic(self, &edges) {
            Ok(()) => {
                info!("Basic validity: ok");
                true
            }
            Err(violation) => {
                warn!("Basic validity failed: {}", violation);
                false
            }
        }
    }

    /// Reconstruct edges, recompute the Euler characteristic and run the
    /// manifold check.
    pub fn manifold_validity(&mut self) -> bool {
        let (edges, euler) = self.cache_euler();
        match check_manifold(self, &edges, euler) {
            Ok(()) => {
                info!("Manifold validity: ok (Euler characteristic {})", euler);
                true
            }
            Err(violation) => {
                warn!("Manifold validity failed: {}", violation);
                false
            }
        }
    }

    /// True if any endpoint of `edges` lies outside the bounding box of the
    /// triangulated surface, or indexes past the vertex list.
    ///
    /// Only vertices referenced by a triangle contribute to the box, so
    /// vertices appended without triangles count as outside unless they fall
    /// within the surface's extent.
    pub fn edges_out_of_bounds(&self, edges: &[Edge]) -> bool {
        let bbox = self.surface_bounds();
        edges.iter().flat_map(|e| e.v).any(|i| {
            self.vertices
                .get(i as usize)
                .is_none_or(|p| !bbox.contains(p))
        })
    }

    fn cache_euler(&mut self) -> (EdgeSet, i64) {
        let edges = EdgeSet::build(&self.triangles);
        let euler = euler_characteristic(self.vertices.len(), edges.len(), self.triangles.len());
        self.euler = Some(euler);
        (edges, euler)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use nalgebra::Point3;

    fn make_tetrahedron() -> Mesh {
        Mesh::from_indexed(
            vec![
                Point3::new(0.0, 0.0, 0.0),
                Point3::new(1.0, 0.0, 0.0),
                Point3::new(0.0, 1.0, 0.0),
                Point3::new(0.0, 0.0, 1.0),
            ],
            &[[0, 2, 1], [0, 1, 3], [1, 2, 3], [0, 3, 2]],
        )
        .unwrap()
    }

    fn make_unit_cube() -> Mesh {
        Mesh::from_indexed(
            vec![
                Point3::new(0.0, 0.0, 0.0),
                Point3::new(1.0, 0.0, 0.0),
                Point3::new(1.0, 1.0, 0.0),
                Point3::new(0.0, 1.0, 0.0),
                Point3::new(0.0, 0.0, 1.0),
                Point3::new(1.0, 0.0, 1.0),
                Point3::new(1.0, 1.0, 1.0),
                Point3::new(0.0, 1.0, 1.0),
            ],
            &[
                [0, 2, 1],
                [0, 3, 2],
                [4, 5, 6],
                [4, 6, 7],
                [0, 1, 5],
                [0, 5, 4],
                [3, 7, 6],
                [3, 6, 2],
                [0, 4, 7],
                [0, 7, 3],
                [1, 2, 6],
                [1, 6, 5],
            ],
        )
        .unwrap()
    }

    #[test]
    fn test_euler_characteristic() {
        assert_eq!(euler_characteristic(8, 18, 12), 2);
        assert_eq!(euler_characteristic(4, 6, 4), 2);
        assert_eq!(euler_characteristic(3, 3, 1), 1);
        assert_eq!(euler_characteristic(0, 5, 0), -5);
    }

    #[test]
    fn test_cube_is_valid() {
        let mut mesh = make_unit_cube();
        assert!(mesh.euler_characteristic().is_none());

        assert!(mesh.basic_validity());
        assert_eq!(mesh.euler_characteristic(), Some(2));
        assert!(mesh.manifold_validity());

        let report = mesh.validate();
        assert!(report.is_valid());
        assert!(report.is_consistently_oriented());
        assert_eq!(report.edge_count, 18);
        assert_eq!(report.genus(), Some(0));
    }

    #[test]
    fn test_tetrahedron_is_valid() {
        let mut mesh = make_tetrahedron();
        let report = validate_mesh(&mut mesh);
        assert_eq!(report.euler, 2);
        assert!(report.is_valid());
        assert!(report.is_consistently_oriented());
    }

    #[test]
    fn test_single_triangle() {
        let mut mesh = Mesh::from_indexed(
            vec![
                Point3::new(0.0, 0.0, 0.0),
                Point3::new(1.0, 0.0, 0.0),
                Point3::new(0.0, 1.0, 0.0),
            ],
            &[[0, 1, 2]],
        )
        .unwrap();

        assert!(mesh.basic_validity());
        assert!(!mesh.manifold_validity());
        let report = mesh.validate();
        assert_eq!(
            report.manifold,
            Err(Violation::OddEulerCharacteristic { euler: 1 })
        );
    }

    #[test]
    fn test_dangling_vertex() {
        let mut mesh = make_unit_cube();
        let mut verts = mesh.vertices().to_vec();
        verts.push(Point3::new(0.5, 0.5, 0.5));
        mesh.set_vertices(verts).unwrap();

        assert!(!mesh.basic_validity());
        let edges = EdgeSet::build(mesh.triangles());
        assert_eq!(
            check_basic(&mesh, &edges),
            Err(Violation::DanglingVertex { vertex: 8 })
        );
    }

    #[test]
    fn test_edge_out_of_bounds_for_bad_index() {
        let mesh = make_unit_cube();
        let mut tris = mesh.triangles().to_vec();
        tris.push(crate::types::Triangle::new([0, 1, 20]));
        let edges = EdgeSet::build(&tris);
        assert_eq!(
            check_basic(&mesh, &edges),
            Err(Violation::EdgeOutOfBounds { edge: [1, 20] })
        );
    }

    #[test]
    fn test_open_mesh_fails_incidence() {
        // Cube with two non-adjacent triangles removed: chi = 8 - 18 + 10 = 0.
        let cube = make_unit_cube();
        let faces: Vec<[u32; 3]> = cube
            .triangles()
            .iter()
            .enumerate()
            .filter(|&(i, _)| i != 0 && i != 2)
            .map(|(_, t)| t.v)
            .collect();
        let mut mesh = Mesh::from_indexed(cube.vertices().to_vec(), &faces).unwrap();

        let report = mesh.validate();
        assert_eq!(report.euler, 0);
        assert!(report.is_basic_valid());
        assert!(matches!(
            report.manifold,
            Err(Violation::EdgeIncidence { faces: 1, .. })
        ));
        assert_eq!(report.genus(), None);
    }

    #[test]
    fn test_non_manifold_fin() {
        // Tetrahedron plus a fin sharing edge 0-1.
        let tet = make_tetrahedron();
        let mut verts = tet.vertices().to_vec();
        verts.push(Point3::new(0.5, -1.0, 0.0));
        let mut faces: Vec<[u32; 3]> = tet.triangles().iter().map(|t| t.v).collect();
        faces.push([0, 4, 1]);
        // chi = 5 - 8 + 5 = 2
        let mut mesh = Mesh::from_indexed(verts, &faces).unwrap();

        let report = mesh.validate();
        assert_eq!(report.euler, 2);
        assert_eq!(
            report.manifold,
            Err(Violation::EdgeIncidence {
                edge: [1, 0],
                faces: 3
            })
        );
    }

    #[test]
    fn test_stale_edge_set_is_detected() {
        let mesh = make_unit_cube();
        let edges = EdgeSet::build(&mesh.triangles()[..10]);
        let result = check_manifold(&mesh, &edges, 2);
        assert!(matches!(result, Err(Violation::EdgeIncidence { .. })));
    }

    #[test]
    fn test_open_vertex_ring() {
        // Closed tetrahedron plus one vertex no edge reaches.
        let mut with_extra = make_tetrahedron();
        let mut verts = with_extra.vertices().to_vec();
        verts.push(Point3::new(0.1, 0.1, 0.1));
        with_extra.set_vertices(verts).unwrap();

        let edges = EdgeSet::build(with_extra.triangles());
        assert_eq!(
            check_manifold(&with_extra, &edges, 2),
            Err(Violation::OpenVertexRing {
                vertex: 4,
                edges: 0
            })
        );
    }

    #[test]
    fn test_edges_out_of_bounds() {
        let mut mesh = make_unit_cube();
        let inside = [Edge::new(0, 6), Edge::new(3, 5)];
        assert!(!mesh.edges_out_of_bounds(&inside));

        let mut verts = mesh.vertices().to_vec();
        verts.push(Point3::new(5.0, 5.0, 5.0));
        verts.push(Point3::new(6.0, -5.0, 5.0));
        mesh.set_vertices(verts).unwrap();

        assert!(mesh.edges_out_of_bounds(&[Edge::new(8, 9)]));
        assert!(mesh.edges_out_of_bounds(&[Edge::new(0, 9)]));
        assert!(mesh.edges_out_of_bounds(&[Edge::new(0, 42)]));
        assert!(!mesh.edges_out_of_bounds(&inside));
        assert!(!mesh.basic_validity());
    }

    #[test]
    fn test_report_display() {
        let mut mesh = make_unit_cube();
        let text = mesh.validate().to_string();
        assert!(text.contains("Euler characteristic: 2"));
        assert!(text.contains("Manifold: yes"));
        assert!(text.contains("Genus: 0"));
    }
}
