//! Demo: tessellate a closed Catmull-Rom loop at a few resolutions.

use trellis::*;

fn main() {
    env_logger::init();

    let control: Vec<Vec3> = (0..8)
        .map(|i| {
            let a = i as f32 / 8.0 * std::f32::consts::TAU;
            Vec3::new(a.cos() * 3.0, (2.0 * a).sin() * 0.5, a.sin() * 3.0)
        })
        .collect();

    let device = HeadlessDevice::new();
    for resolution in [2u32, 8, 32] {
        let mut curve =
            Curve::with_control_points("loop", CurveKind::CatmullRom, control.clone());
        curve.set_closed(true);
        curve.set_resolution(resolution);

        curve.create(&device);
        curve.evaluate(&device, GraphDirection::Downstream);
        println!(
            "resolution {:>2}: {:>3} points, length {:.3}",
            resolution,
            curve.points().len(),
            curve.curve_length()
        );
    }

    // Project a point onto the densest curve.
    let mut curve = Curve::with_control_points("loop", CurveKind::CatmullRom, control);
    curve.set_closed(true);
    curve.set_resolution(32);
    curve.create(&device);
    curve.evaluate(&device, GraphDirection::Downstream);

    let probe = Vec3::new(4.0, 0.0, 0.0);
    let projected = curve.project_point_on_curve(probe).unwrap();
    println!(
        "probe {probe:?} projects to {projected:?} ({:.3} away)",
        curve.distance_to_curve(probe).unwrap()
    );
}
