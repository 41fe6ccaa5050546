use crate::camera::path::CameraPath;
use crate::foundation::error::{CinemagraphError, CinemagraphResult};
use crate::pipeline::context::StaticScene;
use crate::render::blend::CompositingPolicy;
use crate::render::frame::RenderedFrame;
use crate::render::rasterize::{PointCloudRenderer, RenderView};
use crate::scene::points::Side;

/// Normalized time of frame `index` out of `n_frames`: `index / n_frames`.
pub fn frame_time(index: usize, n_frames: usize) -> f32 {
    if n_frames == 0 {
        return 0.0;
    }
    index as f32 / n_frames as f32
}

/// Render frame `index` of `path`.
///
/// Pure in its inputs: the forward pass integrates `index` steps from the first frame, the
/// backward pass integrates the reversed flow from the last frame, both are warped, combined and
/// rasterized from the camera at `path.poses[index]`.
#[tracing::instrument(skip(ctx, renderer, path), fields(n_frames = path.len()))]
pub fn render_frame<P: CompositingPolicy>(
    ctx: &StaticScene,
    renderer: &PointCloudRenderer<P>,
    path: &CameraPath,
    index: usize,
) -> CinemagraphResult<RenderedFrame> {
    let n = path.len();
    let Some(motion) = path.poses.get(index) else {
        return Err(CinemagraphError::validation(format!(
            "frame {index} is outside a {n}-frame path"
        )));
    };
    if renderer.settings().canvas != ctx.canvas() {
        return Err(CinemagraphError::validation(format!(
            "renderer canvas {:?} does not match scene canvas {:?}",
            renderer.settings().canvas,
            ctx.canvas()
        )));
    }

    let last = (n - 1) as u64;
    let forward = ctx.integrator().forward(index as u64, 0)?;
    let backward = ctx.integrator().backward(index as u64, last)?;
    let points = ctx.warper().warp_both(
        ctx.points(),
        &forward,
        &backward,
        ctx.with_inpainted(),
    )?;

    let view = RenderView::relative_to_source(*ctx.intrinsics(), ctx.source_pose(), motion);
    let frame = renderer.render(&points, &view, frame_time(index, n))?;
    tracing::debug!(
        index,
        forward = points.count_side(Side::Forward),
        backward = points.count_side(Side::Backward),
        covered = frame.stats.covered_pixels,
        "frame rendered"
    );
    Ok(frame)
}
