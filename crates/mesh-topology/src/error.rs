//! Error types for mesh ingestion and processing.
//!
//! Every fallible operation in this crate returns [`MeshResult`]. Errors carry:
//! - A machine-readable [`ErrorCode`] (`MESH-XXXX`)
//! - Location information where it is known (vertex, triangle or file)
//! - Help text rendered through `miette`
//!
//! # Error Codes
//!
//! - `MESH-1xxx`: I/O errors (file reading, writing, parsing)
//! - `MESH-2xxx`: Data-integrity faults (indices, welding, normal averaging)
//! - `MESH-4xxx`: Format errors (malformed or unrepresentable data)
//!
//! Topological validation failures are *not* errors; see
//! [`Violation`](crate::validate::Violation).

use miette::Diagnostic;
use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for mesh operations.
pub type MeshResult<T> = Result<T, MeshError>;

/// Machine-readable error codes for mesh operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCode {
    // I/O errors (1xxx)
    /// MESH-1001: Failed to read file
    IoRead = 1001,
    /// MESH-1002: Failed to write file
    IoWrite = 1002,
    /// MESH-1003: Failed to parse file contents
    ParseError = 1003,

    // Data-integrity errors (2xxx)
    /// MESH-2001: Triangle references invalid vertex index
    InvalidVertexIndex = 2001,
    /// MESH-2005: Welding could not resolve a triangle corner
    WeldLookupMiss = 2005,
    /// MESH-2006: Vertex has no incident triangles during normal averaging
    IsolatedVertex = 2006,

    // Format errors (4xxx)
    /// MESH-4002: Malformed file structure
    MalformedFile = 4002,
    /// MESH-4003: Mesh cannot be represented in the target format
    Unrepresentable = 4003,
}

impl ErrorCode {
    /// Returns the error code as a string in the format `MESH-XXXX`.
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorCode::IoRead => "MESH-1001",
            ErrorCode::IoWrite => "MESH-1002",
            ErrorCode::ParseError => "MESH-1003",
            ErrorCode::InvalidVertexIndex => "MESH-2001",
            ErrorCode::WeldLookupMiss => "MESH-2005",
            ErrorCode::IsolatedVertex => "MESH-2006",
            ErrorCode::MalformedFile => "MESH-4002",
            ErrorCode::Unrepresentable => "MESH-4003",
        }
    }
}

impl std::fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Location information for mesh errors.
#[derive(Debug, Clone, PartialEq)]
pub enum MeshLocation {
    /// Error at a specific vertex.
    Vertex { index: usize },
    /// Error at a specific triangle, optionally at one of its corners.
    Triangle { index: usize, corner: Option<usize> },
    /// Error in a file.
    File { path: PathBuf },
}

impl std::fmt::Display for MeshLocation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MeshLocation::Vertex { index } => write!(f, "vertex {}", index),
            MeshLocation::Triangle {
                index,
                corner: Some(corner),
            } => write!(f, "triangle {} corner {}", index, corner),
            MeshLocation::Triangle { index, corner: None } => write!(f, "triangle {}", index),
            MeshLocation::File { path } => write!(f, "{}", path.display()),
        }
    }
}

/// Errors that can occur while loading, welding or saving a mesh.
#[derive(Debug, Error, Diagnostic)]
pub enum MeshError {
    /// Error reading from a file.
    #[error("failed to read mesh from {path}")]
    #[diagnostic(
        code(mesh::io::read),
        help("Check that the file exists and is readable. Try: ls -la {}", path.display())
    )]
    IoRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Error writing to a file.
    #[error("failed to write mesh to {path}")]
    #[diagnostic(
        code(mesh::io::write),
        help("Check that the directory exists and is writable")
    )]
    IoWrite {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A file was read but its contents could not be parsed.
    #[error("failed to parse mesh from {path}: {details}")]
    #[diagnostic(
        code(mesh::parse::error),
        help("Only binary STL is supported. Try re-exporting from the original software.")
    )]
    ParseError { path: PathBuf, details: String },

    /// An in-memory binary STL buffer is malformed (too small or truncated).
    #[error("malformed binary STL: {details}")]
    #[diagnostic(
        code(mesh::format::malformed),
        help("The buffer must hold an 80-byte header, a triangle count and 50 bytes per triangle.")
    )]
    MalformedStl { details: String },

    /// The mesh holds more triangles than binary STL can count.
    #[error("cannot write {count} triangles to binary STL (limit is u32::MAX)")]
    #[diagnostic(code(mesh::format::too_many_triangles))]
    TooManyTriangles { count: usize },

    /// Invalid vertex index in triangle data.
    #[error(
        "invalid vertex index: triangle {triangle_index} references vertex {vertex_index}, but mesh only has {vertex_count} vertices"
    )]
    #[diagnostic(
        code(mesh::integrity::vertex_index),
        help("Triangle indices must address the vertex list; check how the mesh was built.")
    )]
    InvalidVertexIndex {
        triangle_index: usize,
        vertex_index: u32,
        vertex_count: usize,
    },

    /// Welding could not find the canonical vertex for a triangle corner.
    #[error("weld lookup miss: triangle {triangle_index} corner {corner} hashed to unknown key {key}")]
    #[diagnostic(
        code(mesh::integrity::weld_lookup),
        help("The vertex list changed between hashing and remapping; weld on an unmodified mesh.")
    )]
    WeldLookupMiss {
        triangle_index: usize,
        corner: usize,
        key: i64,
    },

    /// A vertex has no incident triangles, so its normal cannot be averaged.
    #[error("vertex {vertex_index} has no incident triangles")]
    #[diagnostic(
        code(mesh::integrity::isolated_vertex),
        help("Remove unreferenced vertices or use IsolatedVertexPolicy::Skip.")
    )]
    IsolatedVertex { vertex_index: usize },
}

impl MeshError {
    /// Returns the machine-readable error code.
    pub fn code(&self) -> ErrorCode {
        match self {
            MeshError::IoRead { .. } => ErrorCode::IoRead,
            MeshError::IoWrite { .. } => ErrorCode::IoWrite,
            MeshError::ParseError { .. } => ErrorCode::ParseError,
            MeshError::MalformedStl { .. } => ErrorCode::MalformedFile,
            MeshError::TooManyTriangles { .. } => ErrorCode::Unrepresentable,
            MeshError::InvalidVertexIndex { .. } => ErrorCode::InvalidVertexIndex,
            MeshError::WeldLookupMiss { .. } => ErrorCode::WeldLookupMiss,
            MeshError::IsolatedVertex { .. } => ErrorCode::IsolatedVertex,
        }
    }

    /// Returns location information if available.
    pub fn location(&self) -> Option<MeshLocation> {
        match self {
            MeshError::IoRead { path, .. }
            | MeshError::IoWrite { path, .. }
            | MeshError::ParseError { path, .. } => Some(MeshLocation::File { path: path.clone() }),
            MeshError::InvalidVertexIndex { triangle_index, .. } => Some(MeshLocation::Triangle {
                index: *triangle_index,
                corner: None,
            }),
            MeshError::WeldLookupMiss {
                triangle_index,
                corner,
                ..
            } => Some(MeshLocation::Triangle {
                index: *triangle_index,
                corner: Some(*corner),
            }),
            MeshError::IsolatedVertex { vertex_index } => Some(MeshLocation::Vertex {
                index: *vertex_index,
            }),
            MeshError::MalformedStl { .. } | MeshError::TooManyTriangles { .. } => None,
        }
    }

    // Constructor helpers for common error patterns

    /// Create an IoRead error.
    pub fn io_read(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        MeshError::IoRead {
            path: path.into(),
            source,
        }
    }

    /// Create an IoWrite error.
    pub fn io_write(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        MeshError::IoWrite {
            path: path.into(),
            source,
        }
    }

    /// Create a MalformedStl error.
    pub fn malformed_stl(details: impl Into<String>) -> Self {
        MeshError::MalformedStl {
            details: details.into(),
        }
    }

    /// Create an InvalidVertexIndex error.
    pub fn invalid_vertex_index(
        triangle_index: usize,
        vertex_index: u32,
        vertex_count: usize,
    ) -> Self {
        MeshError::InvalidVertexIndex {
            triangle_index,
            vertex_index,
            vertex_count,
        }
    }

    /// Attach a file path to a byte-level parse failure.
    ///
    /// `MalformedStl` becomes `ParseError` for `path`; other errors pass through.
    pub fn with_path(self, path: impl Into<PathBuf>) -> Self {
        match self {
            MeshError::MalformedStl { details } => MeshError::ParseError {
                path: path.into(),
                details,
            },
            other => other,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_codes() {
        let err = MeshError::invalid_vertex_index(5, 100, 50);
        assert_eq!(err.code(), ErrorCode::InvalidVertexIndex);
        assert_eq!(err.code().as_str(), "MESH-2001");

        let err = MeshError::IsolatedVertex { vertex_index: 3 };
        assert_eq!(err.code().to_string(), "MESH-2006");
    }

    #[test]
    fn test_location_info() {
        let err = MeshError::WeldLookupMiss {
            triangle_index: 7,
            corner: 2,
            key: 42,
        };
        assert_eq!(
            err.location(),
            Some(MeshLocation::Triangle {
                index: 7,
                corner: Some(2)
            })
        );
        assert!(MeshError::malformed_stl("short").location().is_none());
    }

    #[test]
    fn test_with_path_promotes_malformed() {
        let err = MeshError::malformed_stl("truncated").with_path("cube.stl");
        match err {
            MeshError::ParseError { path, details } => {
                assert_eq!(path, PathBuf::from("cube.stl"));
                assert_eq!(details, "truncated");
            }
            other => panic!("Expected ParseError, got {:?}", other),
        }

        let err = MeshError::IsolatedVertex { vertex_index: 1 }.with_path("x.stl");
        assert!(matches!(err, MeshError::IsolatedVertex { vertex_index: 1 }));
    }

    #[test]
    fn test_error_display() {
        let err = MeshError::invalid_vertex_index(5, 100, 50);
        let display = format!("{}", err);
        assert!(display.contains("triangle 5"));
        assert!(display.contains("vertex 100"));
        assert!(display.contains("50 vertices"));
    }
}
