//! Triangle mesh ingestion, welding and topological validation.
//!
//! This crate loads triangle soups from binary STL, welds coincident corners
//! into an indexed mesh, derives face and vertex normals, reconstructs edge
//! adjacency and checks the result against the combinatorial conditions a
//! closed 2-manifold must satisfy.
//!
//! # Features
//!
//! - **File I/O**: read and write binary STL
//! - **Welding**: spatial-hash vertex merging with a configurable grid resolution
//! - **Normals**: right-hand-rule face normals and averaged vertex normals
//! - **Topology**: undirected edges with winding consistency, Euler characteristic
//! - **Validation**: basic sanity (no dangling vertices or stray edges) and
//!   manifold conditions (even Euler characteristic, two faces per edge,
//!   closed vertex rings)
//! - **Rendering hand-off**: flattened buffers for any [`View`] backend
//!
//! # Coordinate System
//!
//! Right-handed. Face winding is **counter-clockwise (CCW) when viewed from
//! outside** the mesh, so normals point outward by the right-hand rule.
//!
//! # Quick Start
//!
//! ```no_run
//! use mesh_topology::Mesh;
//!
//! let mut mesh = Mesh::new();
//! let report = mesh.read_stl("bunny.stl").unwrap();
//! println!("welded {} duplicate corners", report.weld.duplicates);
//!
//! let validity = mesh.validate();
//! println!("{}", validity);
//!
//! mesh.write_stl("bunny_welded.stl").unwrap();
//! ```
//!
//! # Building Meshes in Code
//!
//! ```
//! use mesh_topology::Mesh;
//! use nalgebra::Point3;
//!
//! // A tetrahedron with outward winding.
//! let mut mesh = Mesh::from_indexed(
//!     vec![
//!         Point3::new(0.0, 0.0, 0.0),
//!         Point3::new(1.0, 0.0, 0.0),
//!         Point3::new(0.0, 1.0, 0.0),
//!         Point3::new(0.0, 0.0, 1.0),
//!     ],
//!     &[[0, 2, 1], [0, 1, 3], [1, 2, 3], [0, 3, 2]],
//! )
//! .unwrap();
//!
//! assert!(mesh.basic_validity());
//! assert!(mesh.manifold_validity());
//! assert_eq!(mesh.euler_characteristic(), Some(2));
//! ```
//!
//! # Error Handling
//!
//! Fallible operations return [`MeshResult<T>`]. Errors carry a machine-readable
//! [`ErrorCode`] and implement [`miette::Diagnostic`]:
//!
//! ```no_run
//! use mesh_topology::{Mesh, MeshError};
//!
//! let mut mesh = Mesh::new();
//! match mesh.read_stl("model.stl") {
//!     Ok(report) => println!("loaded {} triangles", report.triangles),
//!     Err(MeshError::IoRead { path, .. }) => eprintln!("cannot read {:?}", path),
//!     Err(e) => eprintln!("{} ({})", e, e.code()),
//! }
//! ```
//!
//! A failed validity check is not an error. [`Mesh::basic_validity`] and
//! [`Mesh::manifold_validity`] return `bool`; [`Mesh::validate`] returns a
//! [`ValidityReport`] naming the first [`Violation`] of each check.
//!
//! # Configuration
//!
//! [`MeshConfig`] is fixed at construction and controls the weld resolution,
//! the handling of isolated vertices, the source of load-time face normals and
//! whether validity diagnostics run after a load. With the `config` feature
//! it can be read from TOML.
//!
//! # Logging
//!
//! Progress and diagnostics are emitted through `tracing`; see [`tracing_ext`].

mod error;
mod types;

pub mod config;
pub mod edges;
pub mod geometry;
pub mod io;
pub mod normals;
pub mod render;
pub mod tracing_ext;
pub mod validate;
pub mod weld;

pub use error::{ErrorCode, MeshError, MeshLocation, MeshResult};
pub use types::{BoundSphere, Color, DisplayState, Edge, Mesh, Triangle};

pub use config::{FaceNormalSource, IsolatedVertexPolicy, MeshConfig};
#[cfg(feature = "config")]
pub use config::ConfigError;
pub use edges::{EdgeSet, edge_key, find_edge};
pub use geometry::BoundBox;
pub use io::{LoadReport, StlSoup, load_stl, load_stl_bytes, parse_stl, read_stl, save_stl, write_stl};
pub use normals::{NormalReport, derive_face_normals, derive_vertex_normals, face_normal};
pub use render::{RenderBuffers, Transform, View};
pub use validate::{ValidityReport, Violation, check_basic, check_manifold, euler_characteristic, validate_mesh};
pub use weld::{DEFAULT_WELD_RESOLUTION, MAX_WELD_RESOLUTION, SpatialHash, WeldReport, weld_vertices};

pub use tracing_ext::OperationTimer;

// Convenience methods on Mesh
impl Mesh {
    /// Load a binary STL file into a new mesh with the default configuration.
    pub fn load(path: impl AsRef<std::path::Path>) -> MeshResult<Self> {
        let mut mesh = Self::new();
        mesh.read_stl(path)?;
        Ok(mesh)
    }

    /// Replace this mesh with the contents of a binary STL file.
    ///
    /// The mesh keeps its configuration. On error it is left unchanged.
    pub fn read_stl(&mut self, path: impl AsRef<std::path::Path>) -> MeshResult<LoadReport> {
        io::load_stl(self, path.as_ref())
    }

    /// Save the mesh as binary STL.
    pub fn write_stl(&self, path: impl AsRef<std::path::Path>) -> MeshResult<()> {
        io::save_stl(self, path.as_ref())
    }

    /// Weld coincident vertices using the configured resolution.
    pub fn weld(&mut self) -> MeshResult<WeldReport> {
        let resolution = self.config().weld_resolution;
        weld::weld_vertices(self, resolution)
    }

    /// Recompute face normals from winding, then average vertex normals
    /// according to the configured isolated-vertex policy.
    pub fn derive_normals(&mut self) -> MeshResult<NormalReport> {
        normals::derive_face_normals(self);
        let policy = self.config().isolated_vertices;
        normals::derive_vertex_normals(self, policy)
    }

    /// Run both validity checks and return the full report.
    ///
    /// Also caches the Euler characteristic.
    pub fn validate(&mut self) -> ValidityReport {
        validate::validate_mesh(self)
    }
}
