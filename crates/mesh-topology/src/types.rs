//! Core mesh data types.

use nalgebra::{Point3, Vector3};

use crate::config::MeshConfig;
use crate::error::{MeshError, MeshResult};
use crate::geometry::BoundBox;
use crate::normals::face_normal;
use crate::render::Transform;

/// RGBA color with floating point components in [0, 1].
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "config", derive(serde::Serialize, serde::Deserialize))]
pub struct Color {
    pub r: f32,
    pub g: f32,
    pub b: f32,
    pub a: f32,
}

impl Color {
    /// Create a new color from RGBA components.
    #[inline]
    pub const fn new(r: f32, g: f32, b: f32, a: f32) -> Self {
        Self { r, g, b, a }
    }

    /// Components as `[r, g, b, a]`.
    #[inline]
    pub fn to_array(&self) -> [f32; 4] {
        [self.r, self.g, self.b, self.a]
    }
}

impl Default for Color {
    /// Translucent blue-grey used for meshes without an explicit color.
    fn default() -> Self {
        Self::new(0.7, 0.7, 0.75, 0.4)
    }
}

/// A triangle as three vertex indices plus its cached face normal.
///
/// The cyclic order of `v` is the winding order; counter-clockwise when viewed
/// from outside gives an outward normal by the right-hand rule.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Triangle {
    /// Indices into the owning mesh's vertex list.
    pub v: [u32; 3],
    /// Face normal (unit length once derived, zero for degenerate faces).
    pub normal: Vector3<f64>,
}

impl Triangle {
    /// Create a triangle with a zero normal.
    #[inline]
    pub fn new(v: [u32; 3]) -> Self {
        Self {
            v,
            normal: Vector3::zeros(),
        }
    }

    /// Create a triangle with a known normal.
    #[inline]
    pub fn with_normal(v: [u32; 3], normal: Vector3<f64>) -> Self {
        Self { v, normal }
    }

    /// The three directed edges in winding order: (v0,v1), (v1,v2), (v2,v0).
    #[inline]
    pub fn directed_edges(&self) -> [(u32, u32); 3] {
        let [a, b, c] = self.v;
        [(a, b), (b, c), (c, a)]
    }
}

/// An undirected edge between two vertices.
///
/// `v` keeps the direction of the first triangle that produced the edge.
/// `oriented` records whether the second triangle sharing the edge traversed it
/// in the opposite direction, i.e. whether the two faces wind consistently.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Edge {
    /// Endpoint vertex indices.
    pub v: [u32; 2],
    /// Consistent winding across the edge.
    pub oriented: bool,
    /// Number of triangles that use this edge.
    pub faces: u32,
}

impl Edge {
    /// Create a free-standing edge (no incident faces, not oriented).
    #[inline]
    pub fn new(a: u32, b: u32) -> Self {
        Self {
            v: [a, b],
            oriented: false,
            faces: 0,
        }
    }

    /// Order-independent identity of the edge.
    #[inline]
    pub fn key(&self) -> (u32, u32) {
        crate::edges::edge_key(self.v[0], self.v[1])
    }

    /// Exact structural match: same endpoints in either order.
    #[inline]
    pub fn matches(&self, other: &Edge) -> bool {
        self.key() == other.key()
    }
}

/// A bounding sphere over a subset of triangles.
///
/// Carried for display and picking collaborators; nothing in this crate builds
/// or queries sphere hierarchies.
#[derive(Debug, Clone, PartialEq)]
pub struct BoundSphere {
    pub center: Point3<f64>,
    pub radius: f64,
    /// Triangles enclosed by the sphere.
    pub triangles: Vec<u32>,
}

impl BoundSphere {
    /// Strict containment test (points on the surface are outside).
    pub fn contains(&self, p: &Point3<f64>) -> bool {
        (p - self.center).norm_squared() < self.radius * self.radius
    }
}

/// Display-only state carried alongside the geometry.
#[derive(Debug, Clone, PartialEq)]
pub struct DisplayState {
    pub color: Color,
    pub transform: Transform,
    pub bound_spheres: Vec<BoundSphere>,
}

impl DisplayState {
    /// Identity placement with the given color and no spheres.
    pub fn with_color(color: Color) -> Self {
        Self {
            color,
            transform: Transform::default(),
            bound_spheres: Vec::new(),
        }
    }
}

/// A triangle mesh with indexed vertices, per-face normals and per-vertex normals.
///
/// The mesh owns its lists exclusively. Every triangle index is valid for the
/// vertex list at all times: mutators that could break this reject the change.
#[derive(Debug, Clone)]
pub struct Mesh {
    pub(crate) vertices: Vec<Point3<f64>>,
    pub(crate) triangles: Vec<Triangle>,
    /// Parallel to `vertices` once derived, empty before.
    pub(crate) normals: Vec<Vector3<f64>>,
    /// Valid only after a validity check has run on the current geometry.
    pub(crate) euler: Option<i64>,
    display: DisplayState,
    config: MeshConfig,
}

impl Mesh {
    /// Create a new empty mesh with the default configuration.
    pub fn new() -> Self {
        Self::with_config(MeshConfig::default())
    }

    /// Create a new empty mesh with an explicit configuration.
    pub fn with_config(config: MeshConfig) -> Self {
        Self {
            vertices: Vec::new(),
            triangles: Vec::new(),
            normals: Vec::new(),
            euler: None,
            display: DisplayState::with_color(config.default_color),
            config,
        }
    }

    /// Build a mesh from indexed geometry and derive its face normals.
    ///
    /// # Example
    ///
    /// ```
    /// use mesh_topology::Mesh;
    /// use nalgebra::Point3;
    ///
    /// let mesh = Mesh::from_indexed(
    ///     vec![
    ///         Point3::new(0.0, 0.0, 0.0),
    ///         Point3::new(1.0, 0.0, 0.0),
    ///         Point3::new(0.0, 1.0, 0.0),
    ///     ],
    ///     &[[0, 1, 2]],
    /// )
    /// .unwrap();
    /// assert_eq!(mesh.triangles()[0].normal.z, 1.0);
    /// ```
    pub fn from_indexed(vertices: Vec<Point3<f64>>, faces: &[[u32; 3]]) -> MeshResult<Self> {
        let mut mesh = Self::new();
        mesh.set_geometry(vertices, faces)?;
        Ok(mesh)
    }

    /// Replace all geometry with indexed data and derive face normals.
    ///
    /// Vertex normals and the cached Euler characteristic are cleared. On error
    /// the mesh is left unchanged.
    pub fn set_geometry(&mut self, vertices: Vec<Point3<f64>>, faces: &[[u32; 3]]) -> MeshResult<()> {
        check_indices(faces.iter(), vertices.len())?;

        self.triangles = faces
            .iter()
            .map(|&v| {
                let [a, b, c] = v.map(|i| vertices[i as usize]);
                Triangle::with_normal(v, face_normal(&a, &b, &c))
            })
            .collect();
        self.vertices = vertices;
        self.normals.clear();
        self.euler = None;
        Ok(())
    }

    /// Install a parsed triangle soup as-is (no index checking, no normals).
    pub(crate) fn install_soup(&mut self, vertices: Vec<Point3<f64>>, triangles: Vec<Triangle>) {
        self.vertices = vertices;
        self.triangles = triangles;
        self.normals.clear();
        self.euler = None;
    }

    /// Reset to an empty mesh with default display state.
    pub fn clear(&mut self) {
        self.vertices.clear();
        self.triangles.clear();
        self.normals.clear();
        self.euler = None;
        self.display = DisplayState::with_color(self.config.default_color);
    }

    /// The configuration this mesh was created with.
    #[inline]
    pub fn config(&self) -> &MeshConfig {
        &self.config
    }

    /// Display-only state (color, placement, bounding spheres).
    #[inline]
    pub fn display(&self) -> &DisplayState {
        &self.display
    }

    /// Mutable display-only state.
    #[inline]
    pub fn display_mut(&mut self) -> &mut DisplayState {
        &mut self.display
    }

    /// Number of vertices in the mesh.
    #[inline]
    pub fn vertex_count(&self) -> usize {
        self.vertices.len()
    }

    /// Number of triangles in the mesh.
    #[inline]
    pub fn triangle_count(&self) -> usize {
        self.triangles.len()
    }

    /// Check if mesh is empty (no vertices or no triangles).
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.vertices.is_empty() || self.triangles.is_empty()
    }

    /// Vertex positions.
    #[inline]
    pub fn vertices(&self) -> &[Point3<f64>] {
        &self.vertices
    }

    /// Replace the vertex list.
    ///
    /// The new list must still cover every index used by a triangle. Vertex
    /// normals and the cached Euler characteristic are invalidated.
    pub fn set_vertices(&mut self, vertices: Vec<Point3<f64>>) -> MeshResult<()> {
        check_indices(self.triangles.iter().map(|t| &t.v), vertices.len())?;
        self.vertices = vertices;
        self.normals.clear();
        self.euler = None;
        Ok(())
    }

    /// Triangles with their cached face normals.
    #[inline]
    pub fn triangles(&self) -> &[Triangle] {
        &self.triangles
    }

    /// Per-vertex normals; empty until derived.
    #[inline]
    pub fn vertex_normals(&self) -> &[Vector3<f64>] {
        &self.normals
    }

    /// Euler characteristic from the last validity check, if still current.
    #[inline]
    pub fn euler_characteristic(&self) -> Option<i64> {
        self.euler
    }

    /// Positions of the three corners of a triangle.
    pub fn triangle_positions(&self, triangle_idx: usize) -> Option<[Point3<f64>; 3]> {
        self.triangles
            .get(triangle_idx)
            .map(|t| t.v.map(|i| self.vertices[i as usize]))
    }

    /// Bounding box of every vertex in the list.
    pub fn bounds(&self) -> BoundBox {
        BoundBox::from_points(&self.vertices)
    }

    /// Bounding box of the vertices referenced by at least one triangle.
    ///
    /// Stray vertices appended to the list do not widen this box.
    pub fn surface_bounds(&self) -> BoundBox {
        let mut bbox = BoundBox::new();
        for tri in &self.triangles {
            for &i in &tri.v {
                bbox.include(&self.vertices[i as usize]);
            }
        }
        bbox
    }

    /// Exact structural match: index of the first vertex equal to `p`.
    ///
    /// Linear scan with exact coordinate comparison; welding uses proximity
    /// hashing instead.
    pub fn find_vertex(&self, p: &Point3<f64>) -> Option<usize> {
        self.vertices.iter().position(|v| v == p)
    }

    /// Recenter on the origin and scale uniformly so the largest side of the
    /// bounding box equals `side_len`.
    ///
    /// Does nothing for an empty mesh or one with zero extent.
    pub fn box_fit(&mut self, side_len: f64) {
        let bbox = self.bounds();
        let Some(center) = bbox.center() else {
            return;
        };

        let diag = bbox.diagonal();
        let largest = diag.x.max(diag.y).max(diag.z);
        if largest <= 0.0 {
            return;
        }

        let scale = side_len / largest;
        let shift = -center.coords;
        for p in &mut self.vertices {
            p.coords = (p.coords + shift) * scale;
        }
    }
}

impl Default for Mesh {
    fn default() -> Self {
        Self::new()
    }
}

fn check_indices<'a>(
    faces: impl Iterator<Item = &'a [u32; 3]>,
    vertex_count: usize,
) -> MeshResult<()> {
    for (triangle_index, face) in faces.enumerate() {
        if let Some(&bad) = face.iter().find(|&&i| i as usize >= vertex_count) {
            return Err(MeshError::invalid_vertex_index(
                triangle_index,
                bad,
                vertex_count,
            ));
        }
    }
    Ok(())
}
