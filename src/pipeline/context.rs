use crate::camera::intrinsics::Intrinsics;
use crate::camera::pose::Pose;
use crate::config::PipelineConfig;
use crate::flow::field::FlowField;
use crate::flow::integrate::{EulerScheme, FlowIntegrator};
use crate::flow::morph::Kernel;
use crate::flow::warp::SceneFlowWarper;
use crate::foundation::core::Canvas;
use crate::foundation::error::{CinemagraphError, CinemagraphResult};
use crate::scene::builder::{BuildReport, LayeredSceneBuilder};
use crate::scene::layers::LayeredScene;
use crate::scene::points::PointSet;

/// How a [`StaticScene`] is lifted and animated.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SceneOptions {
    /// Source camera intrinsics.
    pub intrinsics: Intrinsics,
    /// Source camera-to-world transform.
    pub source_pose: Pose,
    /// Dilation kernel for extending the flow onto background layers.
    pub kernel: Kernel,
    /// Euler variant.
    pub integration: EulerScheme,
    /// Warp background layers as well as the base layer.
    pub with_inpainted: bool,
}

impl SceneOptions {
    /// Options for a photo of `canvas`: default intrinsics, identity source pose.
    pub fn for_canvas(canvas: Canvas, config: &PipelineConfig) -> CinemagraphResult<Self> {
        Ok(Self {
            intrinsics: Intrinsics::from_canvas(canvas),
            source_pose: Pose::identity(),
            kernel: Kernel::square(config.dilation_kernel)?,
            integration: config.integration,
            with_inpainted: config.with_inpainted,
        })
    }
}

/// Everything computed once per photo and shared, read-only, by every frame.
#[derive(Clone, Debug)]
pub struct StaticScene {
    intrinsics: Intrinsics,
    source_pose: Pose,
    scene: LayeredScene,
    points: PointSet,
    report: BuildReport,
    integrator: FlowIntegrator,
    warper: SceneFlowWarper,
    with_inpainted: bool,
}

impl StaticScene {
    /// Lift `scene` to points and prepare `flow` for integration.
    ///
    /// `flow` must cover the scene canvas.
    #[tracing::instrument(skip_all, fields(layers = scene.len(), w = scene.canvas().width, h = scene.canvas().height))]
    pub fn new(
        scene: LayeredScene,
        flow: FlowField,
        opts: SceneOptions,
    ) -> CinemagraphResult<Self> {
        if flow.canvas() != scene.canvas() {
            return Err(CinemagraphError::validation(format!(
                "flow is {}x{}, scene is {}x{}",
                flow.canvas().width,
                flow.canvas().height,
                scene.canvas().width,
                scene.canvas().height
            )));
        }
        let builder = LayeredSceneBuilder::new(opts.intrinsics, opts.source_pose);
        let (points, report) = builder.build(&scene)?;
        let warper = SceneFlowWarper::new(&scene, opts.intrinsics, opts.source_pose, opts.kernel);
        tracing::info!(
            points = points.len(),
            dropped = report.dropped(),
            "static scene ready"
        );
        Ok(Self {
            intrinsics: opts.intrinsics,
            source_pose: opts.source_pose,
            scene,
            points,
            report,
            integrator: FlowIntegrator::new(flow, opts.integration),
            warper,
            with_inpainted: opts.with_inpainted,
        })
    }

    pub fn canvas(&self) -> Canvas {
        self.scene.canvas()
    }

    pub fn intrinsics(&self) -> &Intrinsics {
        &self.intrinsics
    }

    pub fn source_pose(&self) -> &Pose {
        &self.source_pose
    }

    pub fn scene(&self) -> &LayeredScene {
        &self.scene
    }

    /// Points of every valid layer pixel, at the source time.
    pub fn points(&self) -> &PointSet {
        &self.points
    }

    /// Pixels kept and dropped while lifting the scene.
    pub fn report(&self) -> &BuildReport {
        &self.report
    }

    pub fn integrator(&self) -> &FlowIntegrator {
        &self.integrator
    }

    pub fn warper(&self) -> &SceneFlowWarper {
        &self.warper
    }

    pub fn with_inpainted(&self) -> bool {
        self.with_inpainted
    }
}
