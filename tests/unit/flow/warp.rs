use super::*;
use crate::flow::field::FlowField;
use crate::flow::integrate::{EulerScheme, FlowIntegrator};
use crate::scene::builder::LayeredSceneBuilder;
use crate::scene::layers::Layer;

fn layer(w: u32, h: u32, depth: f32, mask: impl Fn(u32, u32) -> bool) -> Layer {
    Layer::new(
        Grid::filled(w, h, 4, 1.0),
        Grid::filled(w, h, 1, depth),
        Grid::filled(w, h, 1, 0.0),
        Grid::from_fn(w, h, mask),
    )
    .unwrap()
}

fn setup(layers: Vec<Layer>) -> (LayeredScene, PointSet, SceneFlowWarper) {
    let scene = LayeredScene::new(layers).unwrap();
    let k = Intrinsics::from_canvas(scene.canvas());
    let (points, _) = LayeredSceneBuilder::new(k, Pose::identity())
        .build(&scene)
        .unwrap();
    let warper = SceneFlowWarper::new(&scene, k, Pose::identity(), Kernel::square(3).unwrap());
    (scene, points, warper)
}

#[test]
fn empty_masks_fail_with_empty_scene_flow() {
    let (scene, points, warper) = setup(vec![layer(4, 4, 2.0, |_, _| false)]);
    assert!(points.is_empty());
    let zero = IntegratedDisplacement::zeros(scene.canvas());
    let err = warper.warp_both(&points, &zero, &zero, true).unwrap_err();
    match err {
        CinemagraphError::EmptySceneFlow(msg) => {
            assert!(msg.contains("forward and backward"));
            assert!(msg.contains("layers 0..1"));
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn zero_displacement_keeps_positions() {
    let (scene, points, warper) = setup(vec![layer(5, 4, 3.0, |_, _| true)]);
    let zero = IntegratedDisplacement::zeros(scene.canvas());
    let out = warper.warp(&points, Side::Forward, &zero, true).unwrap();
    assert_eq!(out.len(), points.len());
    for (a, b) in out.points().iter().zip(points.points()) {
        assert!((a.position - b.position).norm() < 1e-6);
        assert_eq!(a.side, Side::Forward);
    }
}

#[test]
fn side_labels_travel_with_each_pass() {
    let (scene, points, warper) = setup(vec![layer(4, 3, 2.0, |x, _| x != 0)]);
    let field = FlowField::uniform(scene.canvas(), [1.0, 0.0]).unwrap();
    let i = FlowIntegrator::new(field, EulerScheme::FixedField);
    let all = warper
        .warp_both(&points, &i.forward(1, 0).unwrap(), &i.backward(1, 3).unwrap(), true)
        .unwrap();
    assert_eq!(all.len(), 2 * points.len());
    assert_eq!(all.count_side(Side::Forward), points.len());
    assert_eq!(all.count_side(Side::Backward), points.len());
    let tags = all.side_tags();
    assert!(tags[..points.len()].iter().all(|&s| s == Side::Forward));
    assert!(tags[points.len()..].iter().all(|&s| s == Side::Backward));
}

#[test]
fn displacement_moves_points_in_image_plane_at_same_depth() {
    let (scene, points, warper) = setup(vec![layer(8, 8, 2.0, |_, _| true)]);
    let field = FlowField::uniform(scene.canvas(), [2.0, -1.0]).unwrap();
    let d = FlowIntegrator::new(field, EulerScheme::FixedField)
        .integrate(1)
        .unwrap();
    let out = warper.warp(&points, Side::Forward, &d, false).unwrap();
    let k = Intrinsics::from_canvas(scene.canvas());
    for (a, src) in out.points().iter().zip(points.points()) {
        assert!((a.position.z - 2.0).abs() < 1e-6);
        let uv = k.project(&a.position).unwrap();
        assert!((uv.x - (src.pixel[0] as f32 + 2.0)).abs() < 1e-4);
        assert!((uv.y - (src.pixel[1] as f32 - 1.0)).abs() < 1e-4);
        assert_eq!(a.flow, [2.0, -1.0]);
    }
}

#[test]
fn background_layers_warp_only_with_inpainted() {
    let (scene, points, warper) = setup(vec![
        layer(6, 6, 2.0, |x, _| x < 3),
        layer(6, 6, 4.0, |_, _| true),
    ]);
    let zero = IntegratedDisplacement::zeros(scene.canvas());
    let base_only = warper.warp(&points, Side::Forward, &zero, false).unwrap();
    assert_eq!(base_only.len(), 18);
    assert!(base_only.points().iter().all(|p| p.layer == 0));
    let all = warper.warp(&points, Side::Forward, &zero, true).unwrap();
    assert_eq!(all.len(), 18 + 36);
}

#[test]
fn background_flow_extends_across_dilated_support_only() {
    // Observed content covers the left half; flow is defined there only.
    let (scene, _, warper) = setup(vec![
        layer(8, 2, 2.0, |x, _| x < 4),
        layer(8, 2, 4.0, |_, _| true),
    ]);
    let field = FlowField::uniform(scene.canvas(), [1.0, 0.5]).unwrap();
    let d = FlowIntegrator::new(field, EulerScheme::FixedField)
        .integrate(2)
        .unwrap();
    let ext = warper.extend_displacement(&d).unwrap();
    assert_eq!(ext.pixel(1, 0), &[2.0f32, 1.0]);
    // Kernel 3 reaches one pixel past the support.
    assert_eq!(ext.pixel(4, 1), &[2.0f32, 1.0]);
    assert_eq!(ext.pixel(5, 0), &[0.0f32, 0.0]);
    assert_eq!(ext.pixel(7, 1), &[0.0f32, 0.0]);
}

#[test]
fn mismatched_displacement_is_rejected() {
    let (_, points, warper) = setup(vec![layer(4, 4, 2.0, |_, _| true)]);
    let wrong = IntegratedDisplacement::zeros(Canvas::new(3, 4));
    assert!(warper.warp(&points, Side::Backward, &wrong, true).is_err());
}
