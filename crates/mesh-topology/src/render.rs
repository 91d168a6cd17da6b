//! Hand-off of mesh geometry to a rendering backend.
//!
//! The crate does not draw anything. It flattens the mesh into GPU-friendly
//! buffers and passes them to a [`View`], which uploads them however it likes
//! and hands back its own draw parameters.

use nalgebra::{Matrix4, Rotation3, Vector3};
use tracing::debug;

use crate::Mesh;
use crate::types::Color;

/// Placement of a mesh in the scene.
///
/// Rotation angles are in radians and applied X first, then Y, then Z.
#[derive(Debug, Clone, PartialEq)]
pub struct Transform {
    pub translation: Vector3<f32>,
    /// Rotation about the X, Y and Z axes.
    pub rotation: Vector3<f32>,
    /// Uniform scale factor.
    pub scale: f32,
}

impl Default for Transform {
    fn default() -> Self {
        Self {
            translation: Vector3::zeros(),
            rotation: Vector3::zeros(),
            scale: 1.0,
        }
    }
}

impl Transform {
    /// Model matrix `T * Rz * Ry * Rx * S`.
    pub fn matrix(&self) -> Matrix4<f32> {
        let rx = Rotation3::from_axis_angle(&Vector3::x_axis(), self.rotation.x);
        let ry = Rotation3::from_axis_angle(&Vector3::y_axis(), self.rotation.y);
        let rz = Rotation3::from_axis_angle(&Vector3::z_axis(), self.rotation.z);

        Matrix4::new_translation(&self.translation)
            * rz.to_homogeneous()
            * ry.to_homogeneous()
            * rx.to_homogeneous()
            * Matrix4::new_scaling(self.scale)
    }
}

/// Flattened geometry ready for upload.
#[derive(Debug, Clone, PartialEq)]
pub struct RenderBuffers {
    pub positions: Vec<[f32; 3]>,
    /// Per-vertex normals, parallel to `positions`; empty if not derived.
    pub normals: Vec<[f32; 3]>,
    /// Three indices per triangle.
    pub indices: Vec<u32>,
    pub model: Matrix4<f32>,
    pub color: Color,
}

impl RenderBuffers {
    /// Flatten the geometry and display state of `mesh`.
    pub fn from_mesh(mesh: &Mesh) -> Self {
        let positions = mesh
            .vertices()
            .iter()
            .map(|p| [p.x as f32, p.y as f32, p.z as f32])
            .collect();
        let normals = mesh
            .vertex_normals()
            .iter()
            .map(|n| [n.x as f32, n.y as f32, n.z as f32])
            .collect();
        let indices = mesh.triangles().iter().flat_map(|t| t.v).collect();

        let display = mesh.display();
        Self {
            positions,
            normals,
            indices,
            model: display.transform.matrix(),
            color: display.color,
        }
    }

    #[inline]
    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }
}

/// A rendering backend that can take ownership of mesh buffers.
pub trait View {
    /// Whatever the backend needs later to issue the draw call.
    type DrawParams;

    /// Upload `buffers`; `None` if the backend could not bind them.
    fn bind_buffers(&mut self, buffers: &RenderBuffers) -> Option<Self::DrawParams>;
}

impl Mesh {
    /// Flatten this mesh and bind it to `view`.
    pub fn gen_geometry<V: View>(&self, view: &mut V) -> Option<V::DrawParams> {
        let buffers = RenderBuffers::from_mesh(self);
        debug!(
            "Binding {} vertices, {} triangles for rendering",
            buffers.positions.len(),
            buffers.triangle_count()
        );
        view.bind_buffers(&buffers)
    }
}
