//! Binary STL reading and writing.
//!
//! Layout (all values little-endian):
//!
//! | Offset | Size | Field |
//! |---|---|---|
//! | 0 | 80 | header, kept on read, zeroed on write |
//! | 80 | 4 | triangle count (`u32`) |
//! | 84 + 50·i | 12 | face normal (3 × `f32`) |
//! | | 36 | three corner positions (3 × 3 × `f32`) |
//! | | 2 | attribute byte count, ignored on read, zero on write |
//!
//! Reading yields a triangle soup: every corner becomes its own vertex. The
//! load functions then weld the soup, derive normals and optionally run the
//! validity checks. Writing goes through `stl_io`.
//!
//! The reader is hand-written rather than `stl_io::create_stl_reader`: that
//! reader sniffs a `solid` prefix as ASCII and merges corners by exact
//! position, while welding here needs the raw soup.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use nalgebra::{Point3, Vector3};
use tracing::{debug, info};

use crate::Mesh;
use crate::config::FaceNormalSource;
use crate::error::{MeshError, MeshResult};
use crate::normals::{NormalReport, derive_face_normals, derive_vertex_normals};
use crate::tracing_ext::{OperationTimer, log_io_operation, log_mesh_stats};
use crate::types::Triangle;
use crate::weld::{WeldReport, weld_vertices};

/// Size of the free-form header.
pub const HEADER_LEN: usize = 80;
/// Size of one triangle record.
pub const RECORD_LEN: usize = 50;

const COUNT_OFFSET: usize = HEADER_LEN;
const DATA_OFFSET: usize = HEADER_LEN + 4;

/// Unwelded contents of an STL file.
#[derive(Debug, Clone)]
pub struct StlSoup {
    /// Free-form header, as stored.
    pub header: [u8; HEADER_LEN],
    /// Three entries per triangle, in file order.
    pub vertices: Vec<Point3<f64>>,
    /// Triangle `i` references vertices `3i`, `3i + 1`, `3i + 2` and keeps the
    /// normal stored in its record.
    pub triangles: Vec<Triangle>,
}

/// Bounds-checked little-endian reader over a byte slice.
struct StlCursor<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> StlCursor<'a> {
    fn new(data: &'a [u8], pos: usize) -> Self {
        Self { data, pos }
    }

    fn take<const N: usize>(&mut self) -> MeshResult<[u8; N]> {
        let end = self.pos + N;
        let bytes = self.data.get(self.pos..end).ok_or_else(|| {
            MeshError::malformed_stl(format!(
                "unexpected end of data at byte {} (need {} more, {} available)",
                self.pos,
                N,
                self.data.len().saturating_sub(self.pos)
            ))
        })?;
        self.pos = end;
        let mut out = [0u8; N];
        out.copy_from_slice(bytes);
        Ok(out)
    }

    fn read_u32(&mut self) -> MeshResult<u32> {
        self.take::<4>().map(u32::from_le_bytes)
    }

    fn read_f32(&mut self) -> MeshResult<f32> {
        self.take::<4>().map(f32::from_le_bytes)
    }

    /// Three finite floats; NaN or infinity is malformed.
    fn read_vec3(&mut self) -> MeshResult<[f64; 3]> {
        let start = self.pos;
        let v = [self.read_f32()?, self.read_f32()?, self.read_f32()?];
        if let Some(bad) = v.iter().find(|c| !c.is_finite()) {
            return Err(MeshError::malformed_stl(format!(
                "non-finite value {} in vector at byte {}",
                bad, start
            )));
        }
        Ok(v.map(f64::from))
    }

    fn remaining(&self) -> usize {
        self.data.len().saturating_sub(self.pos)
    }
}

/// Parse a binary STL buffer into a triangle soup.
///
/// # Errors
///
/// [`MeshError::MalformedStl`] if the buffer is not longer than the 84-byte
/// header and count, ends inside a triangle record, or holds a NaN or
/// infinite normal or vertex component.
pub fn parse_stl(data: &[u8]) -> MeshResult<StlSoup> {
    if data.len() <= DATA_OFFSET {
        return Err(MeshError::malformed_stl(format!(
            "file is {} bytes, binary STL needs more than {}",
            data.len(),
            DATA_OFFSET
        )));
    }

    let mut header = [0u8; HEADER_LEN];
    header.copy_from_slice(&data[..HEADER_LEN]);

    let mut cursor = StlCursor::new(data, COUNT_OFFSET);
    let count = cursor.read_u32()? as usize;

    let needed = count.saturating_mul(RECORD_LEN);
    if cursor.remaining() < needed {
        return Err(MeshError::malformed_stl(format!(
            "header declares {} triangles ({} bytes) but only {} bytes follow",
            count,
            needed,
            cursor.remaining()
        )));
    }

    let mut vertices = Vec::with_capacity(count * 3);
    let mut triangles = Vec::with_capacity(count);

    for i in 0..count {
        let [nx, ny, nz] = cursor.read_vec3()?;
        for _ in 0..3 {
            let [x, y, z] = cursor.read_vec3()?;
            vertices.push(Point3::new(x, y, z));
        }
        let _attributes = cursor.take::<2>()?;

        let base = (i * 3) as u32;
        triangles.push(Triangle::with_normal(
            [base, base + 1, base + 2],
            Vector3::new(nx, ny, nz),
        ));
    }

    if cursor.remaining() > 0 {
        debug!(
            "Ignoring {} trailing bytes after {} triangles",
            cursor.remaining(),
            count
        );
    }

    Ok(StlSoup {
        header,
        vertices,
        triangles,
    })
}

/// Read and parse a binary STL file.
pub fn read_stl(path: &Path) -> MeshResult<StlSoup> {
    let data = std::fs::read(path).map_err(|e| {
        log_io_operation("read", path, false);
        MeshError::io_read(path, e)
    })?;
    let soup = parse_stl(&data).map_err(|e| e.with_path(path))?;
    log_io_operation("read", path, true);
    Ok(soup)
}

/// Summary of a load.
#[derive(Debug, Clone, PartialEq)]
pub struct LoadReport {
    /// Triangles read from the file.
    pub triangles: usize,
    /// Vertices before welding (three per triangle).
    pub raw_vertices: usize,
    pub weld: WeldReport,
    pub normals: NormalReport,
    /// Basic validity verdict, if load diagnostics ran.
    pub basic_valid: Option<bool>,
    /// Manifold validity verdict, if load diagnostics ran.
    pub manifold_valid: Option<bool>,
    /// Euler characteristic, if load diagnostics ran.
    pub euler: Option<i64>,
}

/// Replace the contents of `mesh` with the STL file at `path`.
///
/// The soup is welded with the mesh's configured resolution, face normals are
/// taken from the file or recomputed per [`FaceNormalSource`], and vertex
/// normals are averaged. With `load_diagnostics` enabled both validity checks
/// run afterwards; their verdicts are reported, never raised.
///
/// On any error `mesh` is left exactly as it was.
pub fn load_stl(mesh: &mut Mesh, path: &Path) -> MeshResult<LoadReport> {
    let timer = OperationTimer::new("load_stl");
    let _entered = timer.span().enter();
    info!("Loading STL from {:?}", path);

    let soup = read_stl(path)?;
    install_soup(mesh, soup)
}

/// Replace the contents of `mesh` with an in-memory binary STL buffer.
pub fn load_stl_bytes(mesh: &mut Mesh, data: &[u8]) -> MeshResult<LoadReport> {
    let timer = OperationTimer::new("load_stl_bytes");
    let _entered = timer.span().enter();
    let soup = parse_stl(data)?;
    install_soup(mesh, soup)
}

fn install_soup(mesh: &mut Mesh, soup: StlSoup) -> MeshResult<LoadReport> {
    let config = mesh.config().clone();
    let triangles = soup.triangles.len();
    let raw_vertices = soup.vertices.len();
    debug!(
        "STL contains {} triangles, {} raw vertices",
        triangles, raw_vertices
    );

    let mut loaded = Mesh::with_config(config.clone());
    loaded.install_soup(soup.vertices, soup.triangles);

    let weld = weld_vertices(&mut loaded, config.weld_resolution)?;
    if config.face_normals == FaceNormalSource::Recompute {
        derive_face_normals(&mut loaded);
    }
    let normals = derive_vertex_normals(&mut loaded, config.isolated_vertices)?;

    let (basic_valid, manifold_valid) = if config.load_diagnostics {
        (
            Some(loaded.basic_validity()),
            Some(loaded.manifold_validity()),
        )
    } else {
        (None, None)
    };

    *mesh = loaded;
    log_mesh_stats(mesh, "after load");
    info!(
        "Loaded mesh: {} vertices, {} triangles",
        mesh.vertex_count(),
        mesh.triangle_count()
    );

    Ok(LoadReport {
        triangles,
        raw_vertices,
        weld,
        normals,
        basic_valid,
        manifold_valid,
        euler: mesh.euler_characteristic(),
    })
}

fn stl_triangle_count(mesh: &Mesh) -> MeshResult<u32> {
    u32::try_from(mesh.triangle_count()).map_err(|_| MeshError::TooManyTriangles {
        count: mesh.triangle_count(),
    })
}

fn stl_triangles(mesh: &Mesh) -> Vec<stl_io::Triangle> {
    let vertices = mesh.vertices();
    let vertex = |i: u32| {
        let p = &vertices[i as usize];
        stl_io::Vertex::new([p.x as f32, p.y as f32, p.z as f32])
    };

    mesh.triangles()
        .iter()
        .map(|tri| {
            let n = &tri.normal;
            stl_io::Triangle {
                normal: stl_io::Normal::new([n.x as f32, n.y as f32, n.z as f32]),
                vertices: tri.v.map(vertex),
            }
        })
        .collect()
}

/// Write `mesh` as binary STL to any writer.
///
/// Each record carries the triangle's cached face normal.
pub fn write_stl<W: Write>(mesh: &Mesh, mut writer: W) -> MeshResult<()> {
    stl_triangle_count(mesh)?;
    let triangles = stl_triangles(mesh);
    stl_io::write_stl(&mut writer, triangles.iter())
        .and_then(|()| writer.flush())
        .map_err(|e| MeshError::io_write("<writer>", e))
}

/// Write `mesh` as binary STL to `path`, replacing any existing file.
pub fn save_stl(mesh: &Mesh, path: &Path) -> MeshResult<()> {
    let timer = OperationTimer::new("save_stl");
    let _entered = timer.span().enter();
    info!("Saving mesh to {:?}", path);

    let count = stl_triangle_count(mesh)?;
    let file = File::create(path).map_err(|e| MeshError::io_write(path, e))?;
    let mut writer = BufWriter::new(file);

    let triangles = stl_triangles(mesh);
    let result = stl_io::write_stl(&mut writer, triangles.iter()).and_then(|()| writer.flush());
    log_io_operation("write", path, result.is_ok());
    result.map_err(|e| MeshError::io_write(path, e))?;

    info!("Saved {} triangles to {:?}", count, path);
    Ok(())
}
