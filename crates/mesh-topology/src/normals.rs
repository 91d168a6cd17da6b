//! Face and vertex normal derivation.
//!
//! Face normals follow the right-hand rule over the triangle's winding order.
//! Vertex normals are the renormalized mean of the unit normals of all incident
//! triangles, so face normals must be derived (or loaded) first.

use nalgebra::{Point3, Vector3};
use tracing::{debug, warn};

use crate::Mesh;
use crate::config::IsolatedVertexPolicy;
use crate::error::{MeshError, MeshResult};
use crate::geometry::normalize_or_zero;

/// Outcome of vertex normal derivation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NormalReport {
    /// Vertices with no incident triangles; their normal was left at zero.
    pub isolated: Vec<usize>,
}

impl NormalReport {
    /// True if every vertex received an averaged normal.
    pub fn is_complete(&self) -> bool {
        self.isolated.is_empty()
    }
}

/// Unit normal of the triangle `a, b, c`.
///
/// Both edge vectors from `a` are normalized before the cross product. A
/// degenerate triangle yields the zero vector.
pub fn face_normal(a: &Point3<f64>, b: &Point3<f64>, c: &Point3<f64>) -> Vector3<f64> {
    let e0 = normalize_or_zero(&(b - a));
    let e1 = normalize_or_zero(&(c - a));
    normalize_or_zero(&e0.cross(&e1))
}

/// Recompute every triangle's face normal from its winding.
pub fn derive_face_normals(mesh: &mut Mesh) {
    let vertices = &mesh.vertices;
    for tri in &mut mesh.triangles {
        let [a, b, c] = tri.v.map(|i| &vertices[i as usize]);
        tri.normal = face_normal(a, b, c);
    }

    debug!("Derived face normals for {} triangles", mesh.triangles.len());
}

/// Average incident face normals into per-vertex normals.
///
/// Vertices with no incident triangles are handled by `policy`: with
/// [`IsolatedVertexPolicy::Skip`] they get a zero normal and are listed in the
/// report; with [`IsolatedVertexPolicy::Reject`] the call fails on the first one
/// and the mesh keeps its previous normals.
pub fn derive_vertex_normals(
    mesh: &mut Mesh,
    policy: IsolatedVertexPolicy,
) -> MeshResult<NormalReport> {
    let vertex_count = mesh.vertices.len();
    let mut accum: Vec<Vector3<f64>> = vec![Vector3::zeros(); vertex_count];
    let mut incidence: Vec<u32> = vec![0; vertex_count];

    for tri in &mesh.triangles {
        let n = normalize_or_zero(&tri.normal);
        for &i in &tri.v {
            accum[i as usize] += n;
            incidence[i as usize] += 1;
        }
    }

    let mut report = NormalReport::default();
    for (idx, (sum, &count)) in accum.iter_mut().zip(&incidence).enumerate() {
        if count == 0 {
            if policy == IsolatedVertexPolicy::Reject {
                return Err(MeshError::IsolatedVertex { vertex_index: idx });
            }
            report.isolated.push(idx);
            continue;
        }
        *sum = normalize_or_zero(&(*sum / f64::from(count)));
    }

    if !report.is_complete() {
        warn!(
            "{} vertices have no incident triangles; their normals were left at zero",
            report.isolated.len()
        );
    }

    mesh.normals = accum;
    debug!("Derived vertex normals for {} vertices", vertex_count);

    Ok(report)
}
