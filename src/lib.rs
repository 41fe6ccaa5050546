//! Cinemagraph turns a single photo into a short space-time video.
//!
//! The photo is split into depth-ordered layers and lifted to a 3D point cloud. A dense flow
//! field animates the points over time while a virtual camera moves along a named trajectory;
//! every frame is rasterized on the CPU and streamed into a [`FrameSink`].
//!
//! - Resolve a [`PipelineConfig`] and its camera path
//! - Build a [`StaticScene`] once from the collaborators' outputs
//! - Render frames with [`render_frame`] or a whole video with [`render_video`] / [`run_photo`]
#![forbid(unsafe_code)]

/// Frame assembly.
pub mod assemble;
/// Camera model and trajectories.
pub mod camera;
/// Run configuration.
pub mod config;
/// Encoding sinks.
pub mod encode;
/// Scene flow.
pub mod flow;
pub mod foundation;
/// Per-photo orchestration.
pub mod pipeline;
/// Point-cloud rasterization.
pub mod render;
/// Layered scenes and point clouds.
pub mod scene;

pub use crate::foundation::core::{Canvas, FrameIndex, Grid};
pub use crate::foundation::error::{CinemagraphError, CinemagraphResult};

pub use crate::assemble::assembler::{EncodeSettings, FrameAssembler};
pub use crate::camera::intrinsics::Intrinsics;
pub use crate::camera::path::{CameraPath, CameraPathGenerator, PathType};
pub use crate::camera::pose::Pose;
pub use crate::config::{PipelineConfig, RenderThreading};
pub use crate::encode::ffmpeg::{FfmpegSink, FfmpegSinkOpts};
pub use crate::encode::png::PngSequenceSink;
pub use crate::encode::sink::{FrameSink, InMemorySink, SinkConfig};
pub use crate::encode::tee::TeeSink;
pub use crate::flow::field::FlowField;
pub use crate::flow::integrate::{EulerScheme, FlowIntegrator, IntegratedDisplacement};
pub use crate::flow::warp::SceneFlowWarper;
pub use crate::pipeline::collaborators::{
    Collaborators, ConstantDepth, DepthEstimator, DisparityPngDepth, FloFlowReader,
    SceneDecomposer, SceneFlowEstimator, SingleLayerDecomposer, ZeroFlow,
};
pub use crate::pipeline::context::{SceneOptions, StaticScene};
pub use crate::pipeline::frame::render_frame;
pub use crate::pipeline::video::{PreparedRun, VideoReport, render_video, run_photo};
pub use crate::render::blend::{CompositingPolicy, NearestSidePolicy, TemporalBlendPolicy};
pub use crate::render::frame::RenderedFrame;
pub use crate::render::rasterize::{PointCloudRenderer, RasterSettings, RenderView};
pub use crate::scene::builder::{BuildReport, LayeredSceneBuilder};
pub use crate::scene::layers::{Layer, LayeredScene};
pub use crate::scene::points::{FlowedPointSet, PointSet, Side};
