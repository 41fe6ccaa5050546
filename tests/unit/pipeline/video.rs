use super::*;
use crate::camera::path::{CameraPathGenerator, PathType};
use crate::encode::sink::InMemorySink;
use crate::flow::field::FlowField;
use crate::foundation::core::{Canvas, Grid};
use crate::pipeline::collaborators::{ConstantDepth, SingleLayerDecomposer, ZeroFlow};
use crate::scene::layers::{Layer, LayeredScene};
use nalgebra::Vector3;

fn gradient_scene(w: u32, h: u32) -> LayeredScene {
    let mut data = Vec::with_capacity((w * h * 3) as usize);
    for y in 0..h {
        for x in 0..w {
            data.extend_from_slice(&[x as f32 / w as f32, y as f32 / h as f32, 0.5]);
        }
    }
    let rgb = Grid::new(w, h, 3, data).unwrap();
    let layer = Layer::opaque(&rgb, Grid::filled(w, h, 1, 2.0)).unwrap();
    LayeredScene::new(vec![layer]).unwrap()
}

fn context(flow: [f32; 2]) -> StaticScene {
    let scene = gradient_scene(12, 10);
    let canvas = scene.canvas();
    let flow = FlowField::uniform(canvas, flow).unwrap();
    let opts = SceneOptions::for_canvas(canvas, &PipelineConfig::default()).unwrap();
    StaticScene::new(scene, flow, opts).unwrap()
}

fn lateral_path(n: usize) -> CameraPath {
    CameraPathGenerator::new(PathType::DoubleStraightLine, Vector3::new(-0.1, 0.0, 0.0)).generate(n)
}

#[test]
fn chunk_size_and_pool_validation() {
    assert_eq!(normalized_chunk_size(0), 1);
    assert_eq!(normalized_chunk_size(8), 8);
    assert!(build_thread_pool(Some(0)).is_err());
    assert!(build_thread_pool(Some(2)).is_ok());
}

#[test]
fn sequential_run_writes_every_frame_in_order() {
    let ctx = context([0.5, 0.0]);
    let renderer = PointCloudRenderer::new(RasterSettings::new(ctx.canvas())).unwrap();
    let mut sink = InMemorySink::new();
    let report = render_video(
        &ctx,
        &renderer,
        &lateral_path(5),
        &FrameAssembler::new(1),
        &mut sink,
        EncodeSettings::default(),
        &RenderThreading::default(),
    )
    .unwrap();

    assert_eq!(report.frames, 5);
    assert_eq!(report.scene_points, 120);
    assert_eq!(report.dropped_pixels, 0);
    assert!(sink.is_finished());
    let idx: Vec<u64> = sink.frames().iter().map(|(i, _)| i.0).collect();
    assert_eq!(idx, vec![0, 1, 2, 3, 4]);
    assert!(sink.frames().iter().all(|(_, f)| f.dimensions() == (10, 8)));
    assert_eq!(sink.config().map(|c| c.fps), Some(25));
}

#[test]
fn parallel_chunks_match_sequential_output() {
    let ctx = context([0.25, -0.25]);
    let renderer = PointCloudRenderer::new(RasterSettings::new(ctx.canvas())).unwrap();
    let path = lateral_path(7);
    let assembler = FrameAssembler::new(2);

    let mut seq = InMemorySink::new();
    render_video(
        &ctx,
        &renderer,
        &path,
        &assembler,
        &mut seq,
        EncodeSettings::default(),
        &RenderThreading::default(),
    )
    .unwrap();

    let mut par = InMemorySink::new();
    let threading = RenderThreading {
        parallel: true,
        chunk_size: 3,
        threads: Some(2),
    };
    render_video(
        &ctx,
        &renderer,
        &path,
        &assembler,
        &mut par,
        EncodeSettings::default(),
        &threading,
    )
    .unwrap();

    assert_eq!(seq.frames(), par.frames());
}

#[test]
fn failure_mid_run_aborts_the_sink() {
    let ctx = context([0.0, 0.0]);
    let renderer = PointCloudRenderer::new(RasterSettings::new(Canvas::new(8, 8))).unwrap();
    let mut sink = InMemorySink::new();
    let err = render_video(
        &ctx,
        &renderer,
        &lateral_path(3),
        &FrameAssembler::new(1),
        &mut sink,
        EncodeSettings::default(),
        &RenderThreading::default(),
    )
    .unwrap_err();
    assert!(matches!(err, CinemagraphError::Validation(_)));
    assert!(sink.is_aborted());
    assert!(sink.frames().is_empty());
}

#[test]
fn run_photo_downsamples_before_building_the_scene() {
    let photo = image::RgbImage::from_pixel(16, 12, image::Rgb([40, 80, 120]));
    let config = PipelineConfig {
        n_frames: 3,
        ds_factor: 2.0,
        crop: 1,
        ..PipelineConfig::default()
    };
    let collaborators = Collaborators {
        depth: Box::new(ConstantDepth::new(3.0).unwrap()),
        decomposer: Box::new(SingleLayerDecomposer),
        flow: Box::new(ZeroFlow),
    };
    let mut sink = InMemorySink::new();
    let report = run_photo(&config, &photo, &collaborators, &mut sink).unwrap();
    assert_eq!(report.frames, 3);
    assert_eq!(report.scene_points, 8 * 6);
    assert!(sink.frames().iter().all(|(_, f)| f.dimensions() == (6, 4)));
}

#[test]
fn run_photo_rejects_crop_larger_than_photo() {
    let photo = image::RgbImage::new(8, 8);
    let config = PipelineConfig {
        n_frames: 2,
        ..PipelineConfig::default()
    };
    let collaborators = Collaborators {
        depth: Box::new(ConstantDepth::new(1.0).unwrap()),
        decomposer: Box::new(SingleLayerDecomposer),
        flow: Box::new(ZeroFlow),
    };
    let mut sink = InMemorySink::new();
    assert!(matches!(
        run_photo(&config, &photo, &collaborators, &mut sink),
        Err(CinemagraphError::Encoding(_))
    ));
    assert!(sink.config().is_none());
}

#[test]
fn still_frame_matches_first_video_frame() {
    let photo = image::RgbImage::from_fn(10, 10, |x, y| {
        image::Rgb([(x * 20) as u8, (y * 20) as u8, 90])
    });
    let config = PipelineConfig {
        n_frames: 4,
        crop: 2,
        ..PipelineConfig::default()
    };
    let collaborators = Collaborators {
        depth: Box::new(ConstantDepth::new(2.0).unwrap()),
        decomposer: Box::new(SingleLayerDecomposer),
        flow: Box::new(ZeroFlow),
    };
    let run = PreparedRun::prepare(&config, &photo, &collaborators).unwrap();
    let still = run.render_still(0).unwrap();
    assert_eq!(still.dimensions(), (6, 6));
    assert!(run.render_still(4).is_err());

    let mut sink = InMemorySink::new();
    run_photo(&config, &photo, &collaborators, &mut sink).unwrap();
    assert_eq!(sink.frames()[0].1, still);
}

#[cfg(unix)]
#[test]
fn failed_encoder_leaves_no_video_behind() {
    use crate::encode::ffmpeg::{FfmpegSink, FfmpegSinkOpts};
    use std::os::unix::fs::PermissionsExt as _;

    let dir = std::env::temp_dir().join(format!("cinemagraph_run_{}", std::process::id()));
    std::fs::create_dir_all(&dir).unwrap();
    let program = dir.join("ffmpeg");
    std::fs::write(
        &program,
        "#!/bin/sh\n\
         if [ \"$1\" = \"-version\" ]; then exit 0; fi\n\
         for last; do :; done\n\
         cat > /dev/null\n\
         printf partial > \"$last\"\n\
         echo 'encoder blew up' >&2\n\
         exit 1\n",
    )
    .unwrap();
    std::fs::set_permissions(&program, std::fs::Permissions::from_mode(0o755)).unwrap();

    let out = dir.join("output").join("side_flow_scale=1.0.mp4");
    let mut opts = FfmpegSinkOpts::new(&out);
    opts.program = program;
    let mut sink = FfmpegSink::new(opts);

    let photo = image::RgbImage::from_pixel(8, 6, image::Rgb([40, 80, 120]));
    let config = PipelineConfig {
        n_frames: 3,
        crop: 1,
        ..PipelineConfig::default()
    };
    let collaborators = Collaborators {
        depth: Box::new(ConstantDepth::new(2.0).unwrap()),
        decomposer: Box::new(SingleLayerDecomposer),
        flow: Box::new(ZeroFlow),
    };
    let err = run_photo(&config, &photo, &collaborators, &mut sink).unwrap_err();
    assert!(matches!(err, CinemagraphError::Encoding(_)), "{err}");
    assert!(!out.exists());
    let _ = std::fs::remove_dir_all(&dir);
}
