use super::*;
use crate::scene::points::FlowedPoint;
use nalgebra::{Isometry3, Point3, Translation3, UnitQuaternion, Vector3};

fn canvas() -> Canvas {
    Canvas::new(16, 12)
}

fn k() -> Intrinsics {
    Intrinsics::from_canvas(canvas())
}

fn identity_view() -> RenderView {
    RenderView::relative_to_source(k(), &Pose::identity(), &Pose::identity())
}

fn point_at_pixel(u: f32, v: f32, z: f32, color: [f32; 3], side: Side) -> FlowedPoint {
    FlowedPoint {
        position: k().unproject(u, v, z),
        color,
        alpha: 1.0,
        layer: 0,
        side,
        flow: [0.0, 0.0],
    }
}

fn renderer() -> PointCloudRenderer {
    let mut s = RasterSettings::new(canvas());
    s.background = [0.1, 0.2, 0.3];
    PointCloudRenderer::new(s).unwrap()
}

#[test]
fn empty_set_renders_background() {
    let frame = renderer()
        .render(&FlowedPointSet::empty(2), &identity_view(), 0.3)
        .unwrap();
    assert_eq!(frame.canvas(), canvas());
    assert_eq!(frame.stats.covered_pixels, 0);
    for px in frame.rgb.data().chunks_exact(3) {
        assert_eq!(px, &[0.1, 0.2, 0.3]);
    }
    assert!(frame.coverage.data().iter().all(|&c| c == 0.0));
    assert_eq!(frame.features.channels(), 2);
}

#[test]
fn points_outside_the_view_render_background() {
    let behind = FlowedPoint {
        position: Point3::new(0.0, 0.0, -2.0),
        ..point_at_pixel(8.0, 6.0, 2.0, [1.0, 0.0, 0.0], Side::Forward)
    };
    let off_screen = point_at_pixel(-40.0, 6.0, 2.0, [1.0, 0.0, 0.0], Side::Forward);
    let set = FlowedPointSet::from_parts(0, vec![behind, off_screen], Vec::new()).unwrap();
    let frame = renderer().render(&set, &identity_view(), 0.0).unwrap();
    assert_eq!(frame.stats.points_in_view, 0);
    assert_eq!(frame.stats.covered_pixels, 0);
}

#[test]
fn nearer_point_occludes_farther_point() {
    let far = point_at_pixel(8.0, 6.0, 5.0, [0.0, 0.0, 1.0], Side::Forward);
    let near = point_at_pixel(8.0, 6.0, 2.0, [1.0, 0.0, 0.0], Side::Forward);
    // Input order must not matter.
    for pts in [vec![far, near], vec![near, far]] {
        let set = FlowedPointSet::from_parts(0, pts, Vec::new()).unwrap();
        let frame = renderer().render(&set, &identity_view(), 0.0).unwrap();
        let c = frame.rgb.pixel(8, 6);
        assert!(c[0] > 0.98, "{c:?}");
        assert!(c[2] < 0.02, "{c:?}");
        assert!((frame.depth.at(8, 6) - 2.0).abs() < 0.1);
    }
}

#[test]
fn translucent_front_point_lets_back_color_through() {
    let mut front = point_at_pixel(8.0, 6.0, 2.0, [1.0, 0.0, 0.0], Side::Forward);
    front.alpha = 0.5;
    let back = point_at_pixel(8.0, 6.0, 4.0, [0.0, 0.0, 1.0], Side::Forward);
    let set = FlowedPointSet::from_parts(0, vec![front, back], Vec::new()).unwrap();
    let frame = renderer().render(&set, &identity_view(), 0.0).unwrap();
    let c = frame.rgb.pixel(8, 6);
    assert!(c[0] > 0.4 && c[0] < 0.6, "{c:?}");
    assert!(c[2] > 0.4 && c[2] < 0.6, "{c:?}");
}

#[test]
fn temporally_closer_side_dominates() {
    let f = point_at_pixel(8.0, 6.0, 2.0, [1.0, 0.0, 0.0], Side::Forward);
    let b = point_at_pixel(8.0, 6.0, 2.0, [0.0, 1.0, 0.0], Side::Backward);
    let set = FlowedPointSet::from_parts(0, vec![f, b], Vec::new()).unwrap();
    let r = renderer();

    let early = r.render(&set, &identity_view(), 0.1).unwrap();
    let mid = r.render(&set, &identity_view(), 0.5).unwrap();
    let late = r.render(&set, &identity_view(), 0.9).unwrap();

    let (e, m, l) = (
        early.rgb.pixel(8, 6),
        mid.rgb.pixel(8, 6),
        late.rgb.pixel(8, 6),
    );
    assert!(e[0] > e[1]);
    assert!((m[0] - m[1]).abs() < 1e-5);
    assert!(l[1] > l[0]);
    assert!(e[0] > m[0] && m[0] > l[0]);
}

#[test]
fn single_pass_content_still_shows_at_the_far_end() {
    let b = point_at_pixel(8.0, 6.0, 2.0, [0.0, 1.0, 0.0], Side::Backward);
    let set = FlowedPointSet::from_parts(0, vec![b], Vec::new()).unwrap();
    let frame = renderer().render(&set, &identity_view(), 0.0).unwrap();
    assert!(frame.rgb.pixel(8, 6)[1] > 0.99);
}

#[test]
fn features_are_composited_like_color() {
    let near = point_at_pixel(4.0, 4.0, 2.0, [1.0, 1.0, 1.0], Side::Forward);
    let far = point_at_pixel(4.0, 4.0, 6.0, [1.0, 1.0, 1.0], Side::Forward);
    let set = FlowedPointSet::from_parts(2, vec![near, far], vec![1.0, -1.0, 5.0, 5.0]).unwrap();
    let frame = renderer().render(&set, &identity_view(), 0.0).unwrap();
    let f = frame.features.pixel(4, 4);
    assert!((f[0] - 1.0).abs() < 0.1, "{f:?}");
    assert!((f[1] + 1.0).abs() < 0.1, "{f:?}");
    assert_eq!(frame.features.pixel(12, 10), &[0.0f32, 0.0]);
}

#[test]
fn camera_motion_shifts_the_image() {
    let p = point_at_pixel(8.0, 6.0, 2.0, [1.0, 1.0, 1.0], Side::Forward);
    let set = FlowedPointSet::from_parts(0, vec![p], Vec::new()).unwrap();
    // Moving the camera right makes content move left on screen.
    let shift = 2.0 * 2.0 / k().fx;
    let motion = Pose::from_translation(Vector3::new(shift, 0.0, 0.0));
    let view = RenderView::relative_to_source(k(), &Pose::identity(), &motion);
    let frame = renderer().render(&set, &view, 0.0).unwrap();
    assert!(frame.coverage.at(6, 6) > 0.9);
    assert_eq!(frame.coverage.at(8, 6), 0.0);
}

#[test]
fn non_identity_source_pose_is_honoured() {
    let source = Pose::from_isometry(Isometry3::from_parts(
        Translation3::new(0.5, -0.25, 1.0),
        UnitQuaternion::from_euler_angles(0.05, 0.1, -0.2),
    ));
    // A point lifted by the source camera lands on its own pixel when rendered back from it.
    let position = source.transform_point(&k().unproject(5.0, 7.0, 3.0));
    let p = FlowedPoint {
        position,
        ..point_at_pixel(0.0, 0.0, 1.0, [0.0, 1.0, 0.0], Side::Forward)
    };
    let set = FlowedPointSet::from_parts(0, vec![p], Vec::new()).unwrap();
    let view = RenderView::relative_to_source(k(), &source, &Pose::identity());
    let frame = renderer().render(&set, &view, 0.0).unwrap();
    assert!(frame.coverage.at(5, 7) > 0.9);
    assert!((frame.depth.at(5, 7) - 3.0).abs() < 1e-3);
}

#[test]
fn custom_policy_is_used() {
    use crate::render::blend::NearestSidePolicy;
    let f = point_at_pixel(8.0, 6.0, 2.0, [1.0, 0.0, 0.0], Side::Forward);
    let b = point_at_pixel(8.0, 6.0, 2.0, [0.0, 1.0, 0.0], Side::Backward);
    let set = FlowedPointSet::from_parts(0, vec![f, b], Vec::new()).unwrap();
    let r = PointCloudRenderer::with_policy(RasterSettings::new(canvas()), NearestSidePolicy)
        .unwrap();
    let frame = r.render(&set, &identity_view(), 0.4).unwrap();
    assert_eq!(frame.rgb.pixel(8, 6), &[1.0f32, 0.0, 0.0]);
}

#[test]
fn settings_are_validated() {
    assert!(PointCloudRenderer::new(RasterSettings::new(Canvas::new(0, 4))).is_err());
    let mut s = RasterSettings::new(canvas());
    s.point_radius_px = 0.0;
    assert!(PointCloudRenderer::new(s).is_err());
    assert!(
        renderer()
            .render(&FlowedPointSet::empty(0), &identity_view(), f32::NAN)
            .is_err()
    );
}

#[test]
fn canvases_beyond_the_sort_key_range_are_rejected() {
    let at_limit = RasterSettings::new(Canvas::new(1 << 16, 1 << 16));
    assert!(at_limit.validate().is_ok());
    let over = RasterSettings::new(Canvas::new((1 << 16) + 1, 1 << 16));
    assert!(matches!(
        PointCloudRenderer::new(over),
        Err(CinemagraphError::Validation(_))
    ));
}
