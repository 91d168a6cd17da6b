//! Tracing helpers for mesh operations.
//!
//! The crate only emits events; installing a subscriber is up to the host:
//!
//! ```rust,ignore
//! use tracing_subscriber::{fmt, prelude::*, EnvFilter};
//!
//! tracing_subscriber::registry()
//!     .with(fmt::layer())
//!     .with(EnvFilter::from_default_env())
//!     .init();
//!
//! // RUST_LOG=mesh_topology=debug for weld and normal statistics
//! ```
//!
//! # Log Levels
//!
//! - **WARN**: data integrity faults (isolated vertices, failed validity checks)
//! - **INFO**: load, weld and validity summaries, operation timing
//! - **DEBUG**: intermediate statistics such as the weld bounding box
//! - **TRACE**: per-element detail

use std::path::Path;
use std::time::Instant;

use tracing::{Span, debug, info, warn};

use crate::Mesh;
use crate::validate::ValidityReport;

/// Logs the duration of an operation when dropped.
///
/// Enter [`span`](Self::span) to attach the operation's events to it:
///
/// ```rust,ignore
/// fn weld(mesh: &mut Mesh) {
///     let timer = OperationTimer::new("weld");
///     let _entered = timer.span().enter();
///     // ...
/// } // logs elapsed_ms here
/// ```
pub struct OperationTimer {
    name: &'static str,
    start: Instant,
    span: Span,
}

impl OperationTimer {
    pub fn new(name: &'static str) -> Self {
        let span = tracing::info_span!("mesh_operation", operation = name);
        debug!(target: "mesh_topology::timing", operation = name, "Starting operation");
        Self {
            name,
            start: Instant::now(),
            span,
        }
    }

    /// Create a timer whose span also records the mesh size.
    pub fn with_context(name: &'static str, triangle_count: usize, vertex_count: usize) -> Self {
        let span = tracing::info_span!(
            "mesh_operation",
            operation = name,
            triangles = triangle_count,
            vertices = vertex_count
        );
        debug!(
            target: "mesh_topology::timing",
            operation = name,
            triangles = triangle_count,
            vertices = vertex_count,
            "Starting operation"
        );
        Self {
            name,
            start: Instant::now(),
            span,
        }
    }

    pub fn elapsed_ms(&self) -> f64 {
        self.start.elapsed().as_secs_f64() * 1000.0
    }

    pub fn span(&self) -> &Span {
        &self.span
    }
}

impl Drop for OperationTimer {
    fn drop(&mut self) {
        info!(
            target: "mesh_topology::timing",
            operation = self.name,
            elapsed_ms = format!("{:.2}", self.elapsed_ms()),
            "Operation completed"
        );
    }
}

/// Log vertex/triangle counts and extent at debug level.
pub fn log_mesh_stats(mesh: &Mesh, context: &str) {
    let dims = mesh.bounds().diagonal();

    debug!(
        target: "mesh_topology::mesh_state",
        context = context,
        vertices = mesh.vertex_count(),
        triangles = mesh.triangle_count(),
        dimensions = format!("{:.2} x {:.2} x {:.2}", dims.x, dims.y, dims.z),
        "Mesh state"
    );
}

/// Log both validity verdicts; failures go out at warn level.
pub fn log_validity(report: &ValidityReport) {
    if report.is_valid() {
        info!(
            target: "mesh_topology::validation",
            vertices = report.vertex_count,
            edges = report.edge_count,
            triangles = report.triangle_count,
            euler = report.euler,
            "Mesh is basic- and manifold-valid"
        );
    } else {
        warn!(
            target: "mesh_topology::validation",
            euler = report.euler,
            basic = report.basic.err().map(|v| v.to_string()).unwrap_or_else(|| "ok".into()),
            manifold = report.manifold.err().map(|v| v.to_string()).unwrap_or_else(|| "ok".into()),
            "Mesh validation found issues"
        );
    }
}

/// Log the outcome of a file read or write.
pub fn log_io_operation(operation: &str, path: &Path, success: bool) {
    if success {
        info!(
            target: "mesh_topology::io",
            operation = operation,
            path = path.display().to_string(),
            "I/O operation completed"
        );
    } else {
        warn!(
            target: "mesh_topology::io",
            operation = operation,
            path = path.display().to_string(),
            "I/O operation failed"
        );
    }
}
