use cgmath::{InnerSpace, Vector3};
use park_scene::data_structures::{model::MeshData, shape};

fn assert_well_formed(name: &str, mesh: &MeshData) {
    assert!(mesh.triangle_count() > 0, "{} has no triangles", name);
    assert_eq!(mesh.indices.len() % 3, 0, "{} has a dangling index", name);
    let count = mesh.vertices.len() as u32;
    assert!(
        mesh.indices.iter().all(|&i| i < count),
        "{} indexes past its vertices",
        name
    );
    for vertex in &mesh.vertices {
        let length = Vector3::from(vertex.normal).magnitude();
        assert!((length - 1.0).abs() < 1e-3, "{} has a normal of length {}", name, length);
    }
    assert_counter_clockwise(name, mesh);
}

/// Front faces wind counter-clockwise, i.e. the winding normal agrees with the vertex normals.
fn assert_counter_clockwise(name: &str, mesh: &MeshData) {
    for (t, triangle) in mesh.indices.chunks_exact(3).enumerate() {
        let [p0, p1, p2] = [0, 1, 2].map(|k| Vector3::from(mesh.vertices[triangle[k] as usize].position));
        let winding = (p1 - p0).cross(p2 - p0);
        if winding.magnitude2() < 1e-12 {
            continue;
        }
        let shading = triangle.iter().fold(Vector3::new(0.0, 0.0, 0.0), |acc, &i| {
            acc + Vector3::from(mesh.vertices[i as usize].normal)
        });
        assert!(
            winding.dot(shading) > 0.0,
            "{} triangle {} winds clockwise",
            name,
            t
        );
    }
}

#[test]
fn generated_shapes_are_well_formed() {
    let shapes = [
        ("cuboid", shape::cuboid(1.0, 2.0, 3.0)),
        ("plane", shape::plane(10.0, 10.0, 2.0)),
        ("upright_plane", shape::upright_plane(4.0, 1.0)),
        ("sphere", shape::sphere(1.0, 16, 12)),
        ("cylinder", shape::cylinder(0.5, 0.8, 2.0, 12)),
        ("cone", shape::cone(1.0, 2.0, 12)),
        ("torus_arc", shape::torus_arc(5.0, 0.3, 8, 24, std::f32::consts::PI)),
        ("tetrahedron", shape::tetrahedron(1.0)),
        ("octahedron", shape::octahedron(1.0)),
        ("icosahedron", shape::icosahedron(1.0)),
    ];
    for (name, mesh) in &shapes {
        assert_well_formed(name, mesh);
    }
}

#[test]
fn plane_faces_up() {
    let mesh = shape::plane(2.0, 2.0, 1.0);

    for vertex in &mesh.vertices {
        assert_eq!(vertex.normal, [0.0, 1.0, 0.0]);
        assert_eq!(vertex.position[1], 0.0);
    }
}

#[test]
fn sphere_vertices_lie_on_the_radius() {
    let mesh = shape::sphere(2.5, 12, 8);

    for vertex in &mesh.vertices {
        let r = Vector3::from(vertex.position).magnitude();
        assert!((r - 2.5).abs() < 1e-4, "vertex at distance {}", r);
    }
}

#[test]
fn cuboid_spans_its_extents() {
    let mesh = shape::cuboid(2.0, 4.0, 6.0);

    let max = mesh.vertices.iter().fold([f32::MIN; 3], |acc, v| {
        [acc[0].max(v.position[0]), acc[1].max(v.position[1]), acc[2].max(v.position[2])]
    });
    assert_eq!(max, [1.0, 2.0, 3.0]);
    assert_eq!(mesh.triangle_count(), 12);
}
