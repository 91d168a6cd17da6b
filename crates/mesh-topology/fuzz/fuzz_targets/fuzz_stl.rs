#![no_main]

use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    // Parsing and the full load pipeline must not panic on any input.
    let _ = mesh_topology::parse_stl(data);

    let mut mesh = mesh_topology::Mesh::new();
    if mesh_topology::load_stl_bytes(&mut mesh, data).is_ok() {
        let _ = mesh.validate();
    }
});
