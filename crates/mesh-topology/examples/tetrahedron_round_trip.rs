//! Write a tetrahedron as binary STL, load it back through the full pipeline
//! and print its validity report.
//!
//! Run with: cargo run -p mesh-topology --example tetrahedron_round_trip

use mesh_topology::{Mesh, MeshResult};
use nalgebra::Point3;

fn main() -> MeshResult<()> {
    let tetrahedron = Mesh::from_indexed(
        vec![
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(10.0, 0.0, 0.0),
            Point3::new(0.0, 10.0, 0.0),
            Point3::new(0.0, 0.0, 10.0),
        ],
        &[[0, 2, 1], [0, 1, 3], [1, 2, 3], [0, 3, 2]],
    )?;

    let path = std::env::temp_dir().join("mesh_topology_tetrahedron.stl");
    tetrahedron.write_stl(&path)?;

    let mut mesh = Mesh::new();
    let load = mesh.read_stl(&path)?;
    println!(
        "read {} triangles, welded {} corners into {} vertices",
        load.triangles, load.raw_vertices, load.weld.welded_vertices
    );

    print!("{}", mesh.validate());
    Ok(())
}
