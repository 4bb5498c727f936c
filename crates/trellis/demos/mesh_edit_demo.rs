//! Demo: build a ground grid, punch a cube hole through it, and report
//! the resulting geometry, all against the headless device.

use trellis::*;

fn main() {
    env_logger::init();

    // A 10x10 grid of quads over [-5, 5]^2 in the XZ plane.
    let n = 10usize;
    let mut positions = Vec::new();
    for i in 0..=n {
        for j in 0..=n {
            positions.push(Vec3::new(i as f32 - 5.0, 0.0, j as f32 - 5.0));
        }
    }
    let mut triangles = Vec::new();
    for i in 0..n {
        for j in 0..n {
            let v0 = (i * (n + 1) + j) as u32;
            let v1 = v0 + (n + 1) as u32;
            let v2 = v1 + 1;
            let v3 = v0 + 1;
            triangles.push([v0, v1, v2]);
            triangles.push([v0, v2, v3]);
        }
    }
    let mut mesh = Mesh::from_triangles("ground", positions, triangles);

    let device = HeadlessDevice::new();
    mesh.create(&device);
    mesh.evaluate(&device, GraphDirection::Downstream);
    println!(
        "grid: {} verts, {} tris, area {:.1}",
        mesh.vertex_count(),
        mesh.live_triangle_count(),
        mesh.surface_area(None)
    );

    // Punch a 2x2 hole around a half-integer center so the cube walls do
    // not land on grid lines.
    let mat = Mat4::from_translation(Vec3::new(0.5, 0.0, 0.5));
    mesh.punch_cube_hole(&mat, &mat.inverse(), 0.001);
    mesh.evaluate(&device, GraphDirection::Downstream);
    println!(
        "punched: {} verts, {} tris, area {:.1}",
        mesh.vertex_count(),
        mesh.live_triangle_count(),
        mesh.surface_area(None)
    );

    // The hole center is empty; the surrounding floor is not.
    let center_hit = mesh.get_closest_tri(Vec3::new(0.5, 0.0, 0.5), 0.4);
    let floor_hit = mesh.get_closest_tri(Vec3::new(4.0, 0.0, 4.0), 0.4);
    println!("hole center hit: {center_hit:?}, floor hit: {floor_hit:?}");

    // Pick a triangle with a ray from above.
    let mut pick = RayPickVisitor::new(Vec3::new(4.0, 10.0, 4.0), -Vec3::Y, PickMode::Shaded);
    if mesh.pick(&mut pick) {
        let hit = pick.closest_hit().unwrap();
        println!(
            "pick hit element {} at {:?} (distance {:.2})",
            hit.element, hit.world_position, hit.distance
        );
    }
}
