use rayon::prelude::*;

use crate::assemble::assembler::{EncodeSettings, FrameAssembler};
use crate::camera::path::CameraPath;
use crate::config::{PipelineConfig, RenderThreading};
use crate::encode::sink::FrameSink;
use crate::foundation::error::{CinemagraphError, CinemagraphResult};
use crate::pipeline::collaborators::Collaborators;
use crate::pipeline::context::{SceneOptions, StaticScene};
use crate::pipeline::frame::render_frame;
use crate::pipeline::photo::{downsample, photo_grid};
use crate::render::blend::CompositingPolicy;
use crate::render::frame::RenderedFrame;
use crate::render::rasterize::{PointCloudRenderer, RasterSettings};

/// Summary of one encoded video.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct VideoReport {
    /// Frames written to the sink.
    pub frames: u64,
    /// Points in the static scene.
    pub scene_points: usize,
    /// Layer pixels dropped for invalid depth.
    pub dropped_pixels: usize,
    /// Largest number of warped points rasterized in one frame.
    pub max_frame_points: usize,
    /// Smallest covered fraction over all frames.
    pub min_covered_fraction: f32,
}

impl VideoReport {
    fn observe(&mut self, frame: &RenderedFrame) {
        let covered = frame.covered_fraction();
        self.min_covered_fraction = if self.frames == 0 {
            covered
        } else {
            self.min_covered_fraction.min(covered)
        };
        self.max_frame_points = self.max_frame_points.max(frame.stats.points_total);
        self.frames += 1;
    }
}

/// Render every frame of `path` and stream it, cropped, into `sink` in index order.
///
/// Frames are rendered in chunks of `threading.chunk_size`; a chunk renders on a dedicated pool
/// when `threading.parallel` is set. On any error the sink is aborted and nothing is kept.
#[tracing::instrument(skip_all, fields(frames = path.len(), parallel = threading.parallel))]
pub fn render_video<P: CompositingPolicy>(
    ctx: &StaticScene,
    renderer: &PointCloudRenderer<P>,
    path: &CameraPath,
    assembler: &FrameAssembler,
    sink: &mut dyn FrameSink,
    settings: EncodeSettings,
    threading: &RenderThreading,
) -> CinemagraphResult<VideoReport> {
    let n = path.len();
    if n == 0 {
        return Err(CinemagraphError::validation("camera path has no frames"));
    }
    let chunk_size = normalized_chunk_size(threading.chunk_size);
    let pool = if threading.parallel {
        Some(build_thread_pool(threading.threads)?)
    } else {
        None
    };

    let mut report = VideoReport {
        scene_points: ctx.points().len(),
        dropped_pixels: ctx.report().dropped(),
        ..VideoReport::default()
    };
    let mut session = assembler.begin(sink, ctx.canvas(), settings)?;

    let mut chunk_start = 0;
    while chunk_start < n {
        let chunk_end = (chunk_start + chunk_size).min(n);
        let frames: Vec<RenderedFrame> = match &pool {
            Some(pool) => pool.install(|| {
                (chunk_start..chunk_end)
                    .into_par_iter()
                    .map(|i| render_frame(ctx, renderer, path, i))
                    .collect::<CinemagraphResult<Vec<_>>>()
            })?,
            None => (chunk_start..chunk_end)
                .map(|i| render_frame(ctx, renderer, path, i))
                .collect::<CinemagraphResult<Vec<_>>>()?,
        };
        for frame in &frames {
            session.push(frame)?;
            report.observe(frame);
        }
        chunk_start = chunk_end;
    }

    let written = session.finish()?;
    debug_assert_eq!(written, report.frames);
    Ok(report)
}

/// Everything a run needs after the collaborators have been called.
#[derive(Debug)]
pub struct PreparedRun {
    /// Camera poses, one per frame.
    pub path: CameraPath,
    /// Frozen scene and flow.
    pub scene: StaticScene,
    /// Rasterizer sized to the scene.
    pub renderer: PointCloudRenderer,
    /// Cropping assembler.
    pub assembler: FrameAssembler,
    /// Encoder rate and quality.
    pub settings: EncodeSettings,
}

impl PreparedRun {
    /// Resolve `config` against `photo` and call each collaborator once.
    ///
    /// The camera path is resolved first, so an unknown path tag fails before any collaborator
    /// is called.
    #[tracing::instrument(skip_all, fields(path = %config.path, n_frames = config.n_frames))]
    pub fn prepare(
        config: &PipelineConfig,
        photo: &image::RgbImage,
        collaborators: &Collaborators,
    ) -> CinemagraphResult<Self> {
        config.validate()?;
        let camera = config.camera_path()?;
        let path = camera.generate(config.n_frames);

        let photo = downsample(photo, config.ds_factor);
        let rgb = photo_grid(&photo)?;
        let canvas = rgb.canvas();
        let assembler = FrameAssembler::new(config.crop);
        assembler.cropped_canvas(canvas)?;
        tracing::info!(
            w = canvas.width,
            h = canvas.height,
            path = %camera.path_type(),
            "preparing scene"
        );

        let depth = collaborators.depth.estimate_depth(&rgb)?;
        let scene = collaborators.decomposer.decompose(&rgb, depth)?;
        let flow = collaborators
            .flow
            .estimate_flow(&scene)?
            .scaled(1.0 / config.flow_scale)?;

        let scene = StaticScene::new(scene, flow, SceneOptions::for_canvas(canvas, config)?)?;
        let renderer = PointCloudRenderer::new(RasterSettings {
            canvas,
            point_radius_px: config.point_radius_px,
            background: config.background,
        })?;
        Ok(Self {
            path,
            scene,
            renderer,
            assembler,
            settings: EncodeSettings {
                fps: config.fps,
                quality: config.quality,
            },
        })
    }

    /// Render and assemble a single frame.
    pub fn render_still(&self, index: usize) -> CinemagraphResult<image::RgbImage> {
        let frame = render_frame(&self.scene, &self.renderer, &self.path, index)?;
        self.assembler.convert(&frame)
    }
}

/// Turn one photo into a space-time video streamed into `sink`.
///
/// Nothing is written to `sink` when preparation fails.
pub fn run_photo(
    config: &PipelineConfig,
    photo: &image::RgbImage,
    collaborators: &Collaborators,
    sink: &mut dyn FrameSink,
) -> CinemagraphResult<VideoReport> {
    let run = PreparedRun::prepare(config, photo, collaborators)?;
    let report = render_video(
        &run.scene,
        &run.renderer,
        &run.path,
        &run.assembler,
        sink,
        run.settings,
        &config.threading,
    )?;
    tracing::info!(
        frames = report.frames,
        min_covered = report.min_covered_fraction,
        "run finished"
    );
    Ok(report)
}

fn build_thread_pool(threads: Option<usize>) -> CinemagraphResult<rayon::ThreadPool> {
    if let Some(n) = threads
        && n == 0
    {
        return Err(CinemagraphError::validation(
            "render threading 'threads' must be >= 1 when set",
        ));
    }

    let mut builder = rayon::ThreadPoolBuilder::new();
    if let Some(n) = threads {
        builder = builder.num_threads(n);
    }
    builder
        .build()
        .map_err(|e| CinemagraphError::Other(anyhow::anyhow!("failed to build rayon thread pool: {e}")))
}

fn normalized_chunk_size(chunk_size: usize) -> usize {
    chunk_size.max(1)
}

#[cfg(test)]
#[path = "../../tests/unit/pipeline/video.rs"]
mod tests;
