//! Integration tests driving mesh and curve nodes through the structure
//! lifecycle against the headless device.

use trellis::*;

fn ground_mesh() -> Mesh {
    Mesh::from_triangles(
        "ground",
        vec![
            Vec3::new(-2.0, 0.0, -2.0),
            Vec3::new(2.0, 0.0, -2.0),
            Vec3::new(2.0, 0.0, 2.0),
            Vec3::new(-2.0, 0.0, 2.0),
        ],
        vec![[0, 1, 2], [0, 2, 3]],
    )
}

#[test]
fn mesh_create_evaluate_delete_cycle() {
    let device = HeadlessDevice::new();
    let mut mesh = ground_mesh();

    // Create allocates one index and one vertex buffer.
    mesh.create(&device);
    assert_eq!(device.allocation_count(), 2);

    // Static buffers reallocate on evaluation.
    mesh.evaluate(&device, GraphDirection::Downstream);
    assert_eq!(device.allocation_count(), 4);

    let (min, max) = mesh.bounding_box().expect("bounds after evaluate");
    assert_eq!(min, Vec3::new(-2.0, 0.0, -2.0));
    assert_eq!(max, Vec3::new(2.0, 0.0, 2.0));

    // Delete then create again: the node is reusable.
    mesh.delete();
    mesh.create(&device);
    assert_eq!(device.allocation_count(), 6);
}

#[test]
fn mesh_edit_then_evaluate_shrinks_buffers() {
    let device = HeadlessDevice::new();
    let mut mesh = ground_mesh();
    mesh.create(&device);

    mesh.delete_triangles(&[1]);
    mesh.evaluate(&device, GraphDirection::Downstream);

    // Geometry arrays compacted before the buffers repopulated.
    assert_eq!(mesh.vertex_count(), 3);
    assert_eq!(mesh.live_triangle_count(), 1);
    let (_, max) = mesh.bounding_box().unwrap();
    assert_eq!(max, Vec3::new(2.0, 0.0, 2.0));
}

#[test]
fn mesh_survives_allocation_failure() {
    let device = HeadlessDevice::new();
    let mut mesh = ground_mesh();

    device.fail_next_allocation();
    mesh.create(&device);

    // One buffer failed, the node stays usable; the next pass recovers.
    mesh.evaluate(&device, GraphDirection::Downstream);
    assert!(mesh.bounding_box().is_some());
}

#[test]
fn curve_evaluate_tessellates_and_sizes_buffer() {
    let device = HeadlessDevice::new();
    let mut curve = Curve::with_control_points(
        "loop",
        CurveKind::CatmullRom,
        vec![
            Vec3::new(0.0, 0.0, 0.0),
            Vec3::new(1.0, 0.0, 0.0),
            Vec3::new(1.0, 0.0, 1.0),
            Vec3::new(0.0, 0.0, 1.0),
        ],
    );
    curve.set_closed(true);
    curve.set_resolution(5);

    curve.create(&device);
    curve.evaluate(&device, GraphDirection::Downstream);

    // 4 spans of 5 samples each for the closed curve.
    assert_eq!(curve.points().len(), 20);
    assert!((curve.curve_length() - 4.0).abs() < 0.5);
}

#[test]
fn curve_control_point_edits_flow_through_evaluation() {
    let device = HeadlessDevice::new();
    let mut curve = Curve::new("editable");
    curve.create(&device);

    curve.insert_control_point(0, Vec3::ZERO);
    curve.insert_control_point(1, Vec3::X);
    curve.evaluate(&device, GraphDirection::Downstream);
    assert_eq!(curve.points().len(), 2);

    curve.remove_control_point(1);
    curve.evaluate(&device, GraphDirection::Downstream);
    assert_eq!(curve.points().len(), 1);
}

#[test]
fn pick_dispatches_by_mode() {
    let mesh = ground_mesh();

    // Shaded picking intersects the interior of a triangle. The ray is kept
    // away from the quad's diagonal so the wireframe pass has nothing to hit.
    let mut shaded = RayPickVisitor::new(Vec3::new(1.0, 5.0, 0.5), -Vec3::Y, PickMode::Shaded);
    assert!(mesh.pick(&mut shaded));

    // Wireframe picking wants an edge; the same interior ray misses.
    let mut wire = RayPickVisitor::new(Vec3::new(1.0, 5.0, 0.5), -Vec3::Y, PickMode::Wireframe);
    assert!(!mesh.pick(&mut wire));

    let mut on_edge = RayPickVisitor::new(Vec3::new(0.0, 5.0, -2.0), -Vec3::Y, PickMode::Wireframe);
    assert!(mesh.pick(&mut on_edge));
}

#[test]
fn structures_as_trait_objects() {
    let device = HeadlessDevice::new();
    let mut nodes: Vec<Box<dyn Structure>> = vec![
        Box::new(ground_mesh()),
        Box::new(Curve::with_control_points(
            "c",
            CurveKind::Linear,
            vec![Vec3::ZERO, Vec3::X],
        )),
    ];

    for node in &mut nodes {
        node.create(&device);
        node.evaluate(&device, GraphDirection::Downstream);
    }

    assert_eq!(nodes[0].type_name(), "Mesh");
    assert_eq!(nodes[1].type_name(), "Curve");
    assert!(nodes.iter().all(|n| n.bounding_box().is_some()));
}

#[test]
fn persisted_fields_roundtrip_json() {
    let mut mesh = ground_mesh();
    mesh.set_normals(vec![Vec3::Y; 4]);
    mesh.set_base_uvs(vec![Vec2::ZERO; 4]);

    let json = serde_json::to_string(&mesh).unwrap();
    let restored: Mesh = serde_json::from_str(&json).unwrap();
    assert_eq!(restored.positions(), mesh.positions());
    assert_eq!(restored.triangles(), mesh.triangles());
    assert_eq!(restored.base_uvs(), mesh.base_uvs());

    let mut curve = Curve::with_control_points(
        "c",
        CurveKind::BSpline,
        vec![Vec3::ZERO, Vec3::X, Vec3::Y, Vec3::Z],
    );
    curve.set_resolution(12);
    let json = serde_json::to_string(&curve).unwrap();
    let restored: Curve = serde_json::from_str(&json).unwrap();
    assert_eq!(restored.resolution(), 12);
    assert_eq!(restored.control_points(), curve.control_points());
}
