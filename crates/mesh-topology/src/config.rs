//! Construction-time configuration for a [`Mesh`](crate::Mesh).
//!
//! `MeshConfig` carries the defaults a mesh falls back to (display color) and the
//! switches for behavior that has more than one reasonable answer: what to do
//! with vertices that no triangle touches, and where load-time face normals come
//! from.
//!
//! With the `config` feature enabled the configuration can be stored as TOML:
//!
//! ```toml
//! weld_resolution = 4000
//! isolated_vertices = "reject"
//! face_normals = "from_file"
//! load_diagnostics = false
//!
//! [default_color]
//! r = 0.2
//! g = 0.4
//! b = 0.8
//! a = 1.0
//! ```

use crate::types::Color;
use crate::weld::DEFAULT_WELD_RESOLUTION;

/// What vertex-normal averaging does with a vertex that has no incident triangles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(
    feature = "config",
    derive(serde::Serialize, serde::Deserialize),
    serde(rename_all = "snake_case")
)]
pub enum IsolatedVertexPolicy {
    /// Store a zero normal, log a warning and report the vertex.
    #[default]
    Skip,
    /// Fail the whole derivation with [`MeshError::IsolatedVertex`](crate::MeshError::IsolatedVertex).
    Reject,
}

/// Where face normals come from when an STL file is loaded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(
    feature = "config",
    derive(serde::Serialize, serde::Deserialize),
    serde(rename_all = "snake_case")
)]
pub enum FaceNormalSource {
    /// Derive from vertex winding (right-hand rule) after welding.
    #[default]
    Recompute,
    /// Keep the normal stored in each STL record.
    FromFile,
}

/// Mesh configuration.
///
/// # Example
///
/// ```
/// use mesh_topology::{IsolatedVertexPolicy, Mesh, MeshConfig};
///
/// let config = MeshConfig {
///     isolated_vertices: IsolatedVertexPolicy::Reject,
///     ..Default::default()
/// };
/// let mesh = Mesh::with_config(config);
/// assert!(mesh.is_empty());
/// ```
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(
    feature = "config",
    derive(serde::Serialize, serde::Deserialize),
    serde(default)
)]
pub struct MeshConfig {
    /// Buckets per axis used by the welding spatial hash.
    ///
    /// Two positions closer than `diagonal / weld_resolution` on every axis
    /// usually collapse into one vertex. Values above
    /// [`MAX_WELD_RESOLUTION`](crate::weld::MAX_WELD_RESOLUTION) are capped.
    ///
    /// Default: `2500`
    pub weld_resolution: u32,

    /// Handling of zero-incidence vertices during normal averaging.
    ///
    /// Default: [`IsolatedVertexPolicy::Skip`]
    pub isolated_vertices: IsolatedVertexPolicy,

    /// Source of face normals on load.
    ///
    /// Default: [`FaceNormalSource::Recompute`]
    pub face_normals: FaceNormalSource,

    /// Color used when the mesh has none of its own, and restored by `clear`.
    pub default_color: Color,

    /// Run basic and manifold validity after loading and log the verdicts.
    ///
    /// Default: `true`
    pub load_diagnostics: bool,
}

impl Default for MeshConfig {
    fn default() -> Self {
        Self {
            weld_resolution: DEFAULT_WELD_RESOLUTION,
            isolated_vertices: IsolatedVertexPolicy::default(),
            face_normals: FaceNormalSource::default(),
            default_color: Color::default(),
            load_diagnostics: true,
        }
    }
}

#[cfg(feature = "config")]
impl MeshConfig {
    /// Parse a configuration from a TOML string.
    pub fn from_toml(toml_str: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(toml_str)
    }

    /// Load a configuration from a TOML file.
    pub fn from_toml_file(path: impl AsRef<std::path::Path>) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        Ok(toml::from_str(&contents)?)
    }

    /// Serialize the configuration to a TOML string.
    pub fn to_toml(&self) -> Result<String, toml::ser::Error> {
        toml::to_string_pretty(self)
    }
}

/// Errors from loading a [`MeshConfig`] file.
#[cfg(feature = "config")]
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// I/O error reading the config file.
    #[error("failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    /// TOML parse error.
    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),
}
