use rayon::prelude::*;

use crate::camera::intrinsics::Intrinsics;
use crate::camera::pose::Pose;
use crate::foundation::core::{Canvas, Grid};
use crate::foundation::error::{CinemagraphError, CinemagraphResult};
use crate::render::blend::{CompositingPolicy, TemporalBlendPolicy};
use crate::render::frame::{RasterStats, RenderedFrame};
use crate::scene::points::{FlowedPointSet, Side};

/// Points closer than this to the camera plane are culled.
pub const NEAR_PLANE: f32 = 1e-3;

/// Remaining transmittance below which a pass stops accumulating a pixel.
const MIN_TRANSMITTANCE: f32 = 1e-4;

/// Blended opacity below which a pixel is treated as uncovered.
const MIN_COVERAGE: f32 = 1e-6;

/// Target camera for one frame.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RenderView {
    /// Target intrinsics.
    pub intrinsics: Intrinsics,
    /// World-to-camera transform of the target view.
    pub world_to_camera: Pose,
}

impl RenderView {
    /// View of a camera that moved by `motion` relative to the source camera at `source_pose`.
    ///
    /// Both poses are camera-to-world; the result maps world points into the moved camera.
    pub fn relative_to_source(intrinsics: Intrinsics, source_pose: &Pose, motion: &Pose) -> Self {
        Self {
            intrinsics,
            world_to_camera: source_pose.compose(motion).inverse(),
        }
    }
}

/// Largest canvas the rasterizer accepts.
pub const MAX_CANVAS_PIXELS: u64 = 1 << 32;

/// Static rasterizer settings.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RasterSettings {
    /// Output size.
    pub canvas: Canvas,
    /// Footprint radius of a point, in pixels.
    pub point_radius_px: f32,
    /// Color of uncovered pixels.
    pub background: [f32; 3],
}

impl RasterSettings {
    /// Settings for `canvas` with a 1.5 px footprint on black.
    pub fn new(canvas: Canvas) -> Self {
        Self {
            canvas,
            point_radius_px: 1.5,
            background: [0.0; 3],
        }
    }

    /// Reject empty or oversized canvases and degenerate footprints.
    ///
    /// Pixel indices live in 32 bits of the fragment sort key.
    pub fn validate(&self) -> CinemagraphResult<()> {
        if self.canvas.is_empty() {
            return Err(CinemagraphError::validation(
                "render canvas must be non-empty",
            ));
        }
        let pixels = u64::from(self.canvas.width) * u64::from(self.canvas.height);
        if pixels > MAX_CANVAS_PIXELS {
            return Err(CinemagraphError::validation(format!(
                "render canvas {}x{} exceeds {MAX_CANVAS_PIXELS} pixels",
                self.canvas.width, self.canvas.height
            )));
        }
        if !(self.point_radius_px.is_finite() && self.point_radius_px > 0.0) {
            return Err(CinemagraphError::validation(format!(
                "point radius must be positive, got {}",
                self.point_radius_px
            )));
        }
        Ok(())
    }
}

/// One point's contribution to one pixel.
#[derive(Clone, Copy, Debug)]
struct Fragment {
    /// Pixel index in the high 32 bits, depth bits in the low 32 bits.
    key: u64,
    point: u32,
    coverage: f32,
}

impl Fragment {
    fn pixel(&self) -> usize {
        (self.key >> 32) as usize
    }
}

/// Splats a flowed point cloud into a target view.
///
/// Each point covers the pixels within `point_radius_px` of its projection with a coverage that
/// falls off quadratically. Samples of each pass are composited front to back; the two passes are
/// then mixed by the [`CompositingPolicy`] weights for the requested time.
#[derive(Clone, Debug)]
pub struct PointCloudRenderer<P = TemporalBlendPolicy> {
    settings: RasterSettings,
    policy: P,
}

impl PointCloudRenderer<TemporalBlendPolicy> {
    /// Renderer using the default temporal blend.
    pub fn new(settings: RasterSettings) -> CinemagraphResult<Self> {
        Self::with_policy(settings, TemporalBlendPolicy::default())
    }
}

impl<P: CompositingPolicy> PointCloudRenderer<P> {
    /// Renderer with a custom compositing policy.
    pub fn with_policy(settings: RasterSettings, policy: P) -> CinemagraphResult<Self> {
        settings.validate()?;
        Ok(Self { settings, policy })
    }

    /// Static settings.
    pub fn settings(&self) -> &RasterSettings {
        &self.settings
    }

    /// Active policy.
    pub fn policy(&self) -> &P {
        &self.policy
    }

    /// Render `points` into `view` at normalized time `time`.
    ///
    /// Never fails for lack of visible points: an empty or fully culled set yields a background
    /// frame.
    #[tracing::instrument(skip(self, points, view), fields(points = points.len()))]
    pub fn render(
        &self,
        points: &FlowedPointSet,
        view: &RenderView,
        time: f32,
    ) -> CinemagraphResult<RenderedFrame> {
        if !time.is_finite() {
            return Err(CinemagraphError::validation(format!(
                "render time must be finite, got {time}"
            )));
        }
        if points.len() > u32::MAX as usize {
            return Err(CinemagraphError::validation(format!(
                "too many points to rasterize: {}",
                points.len()
            )));
        }
        let time = time.clamp(0.0, 1.0);

        let (mut fragments, points_in_view) = self.splat(points, view);
        fragments.par_sort_unstable_by_key(|f| (f.key, f.point));

        let canvas = self.settings.canvas;
        let mut offsets = vec![0usize; canvas.pixel_count() + 1];
        for f in &fragments {
            offsets[f.pixel() + 1] += 1;
        }
        for i in 1..offsets.len() {
            offsets[i] += offsets[i - 1];
        }

        let weights = [
            self.policy.side_weight(Side::Forward, time),
            self.policy.side_weight(Side::Backward, time),
        ];
        let feature_dim = points.feature_dim();
        let rows: Vec<RowOutput> = (0..canvas.height)
            .into_par_iter()
            .map(|y| {
                let mut row = RowOutput::new(canvas.width as usize, feature_dim);
                let mut acc = PassAccumulator::new(feature_dim);
                for x in 0..canvas.width as usize {
                    let pixel = y as usize * canvas.width as usize + x;
                    let samples = &fragments[offsets[pixel]..offsets[pixel + 1]];
                    acc.reset();
                    for f in samples {
                        let i = f.point as usize;
                        let p = &points.points()[i];
                        let opacity = self.policy.sample_opacity(p.alpha, f.coverage);
                        let depth = f32::from_bits(f.key as u32);
                        acc.add(p.side, opacity, &p.color, depth, points.features_of(i));
                    }
                    row.write(x, &acc, weights, self.settings.background);
                }
                row
            })
            .collect();

        let frame = assemble_rows(rows, canvas, feature_dim, time, |covered| RasterStats {
            points_total: points.len(),
            points_in_view,
            fragments: fragments.len(),
            covered_pixels: covered,
        })?;
        tracing::debug!(
            fragments = frame.stats.fragments,
            covered = frame.stats.covered_pixels,
            "frame rasterized"
        );
        Ok(frame)
    }

    fn splat(&self, points: &FlowedPointSet, view: &RenderView) -> (Vec<Fragment>, usize) {
        let canvas = self.settings.canvas;
        let r = self.settings.point_radius_px;
        let r2 = r * r;
        let per_point: Vec<Vec<Fragment>> = points
            .points()
            .par_iter()
            .enumerate()
            .map(|(i, p)| {
                let cam = view.world_to_camera.transform_point(&p.position);
                if cam.z < NEAR_PLANE {
                    return Vec::new();
                }
                let Some(uv) = view.intrinsics.project(&cam) else {
                    return Vec::new();
                };
                let x0 = (uv.x - r).ceil().max(0.0);
                let x1 = (uv.x + r).floor().min(canvas.width as f32 - 1.0);
                let y0 = (uv.y - r).ceil().max(0.0);
                let y1 = (uv.y + r).floor().min(canvas.height as f32 - 1.0);
                if !(x0 <= x1 && y0 <= y1) {
                    return Vec::new();
                }
                let depth_bits = cam.z.to_bits() as u64;
                let mut out = Vec::new();
                for py in y0 as u32..=y1 as u32 {
                    for px in x0 as u32..=x1 as u32 {
                        let dx = px as f32 - uv.x;
                        let dy = py as f32 - uv.y;
                        let d2 = dx * dx + dy * dy;
                        if d2 >= r2 {
                            continue;
                        }
                        let pixel = py as u64 * canvas.width as u64 + px as u64;
                        out.push(Fragment {
                            key: (pixel << 32) | depth_bits,
                            point: i as u32,
                            coverage: 1.0 - d2 / r2,
                        });
                    }
                }
                out
            })
            .collect();
        let in_view = per_point.iter().filter(|f| !f.is_empty()).count();
        (per_point.into_iter().flatten().collect(), in_view)
    }
}

/// Front-to-back accumulation of one pixel, kept separately per pass.
struct PassAccumulator {
    transmittance: [f32; 2],
    color: [[f32; 3]; 2],
    opacity: [f32; 2],
    depth: [f32; 2],
    features: [Vec<f32>; 2],
}

impl PassAccumulator {
    fn new(feature_dim: usize) -> Self {
        Self {
            transmittance: [1.0; 2],
            color: [[0.0; 3]; 2],
            opacity: [0.0; 2],
            depth: [0.0; 2],
            features: [vec![0.0; feature_dim], vec![0.0; feature_dim]],
        }
    }

    fn reset(&mut self) {
        self.transmittance = [1.0; 2];
        self.color = [[0.0; 3]; 2];
        self.opacity = [0.0; 2];
        self.depth = [0.0; 2];
        for f in &mut self.features {
            f.fill(0.0);
        }
    }

    fn add(&mut self, side: Side, opacity: f32, color: &[f32; 3], depth: f32, features: &[f32]) {
        let s = side.index();
        let t = self.transmittance[s];
        if t < MIN_TRANSMITTANCE || opacity <= 0.0 {
            return;
        }
        let w = opacity * t;
        for c in 0..3 {
            self.color[s][c] += w * color[c];
        }
        for (acc, v) in self.features[s].iter_mut().zip(features) {
            *acc += w * v;
        }
        self.opacity[s] += w;
        self.depth[s] += w * depth;
        self.transmittance[s] = t * (1.0 - opacity);
    }
}

struct RowOutput {
    rgb: Vec<f32>,
    coverage: Vec<f32>,
    depth: Vec<f32>,
    features: Vec<f32>,
    feature_dim: usize,
    covered: usize,
}

impl RowOutput {
    fn new(width: usize, feature_dim: usize) -> Self {
        Self {
            rgb: vec![0.0; width * 3],
            coverage: vec![0.0; width],
            depth: vec![0.0; width],
            features: vec![0.0; width * feature_dim],
            feature_dim,
            covered: 0,
        }
    }

    fn write(&mut self, x: usize, acc: &PassAccumulator, weights: [f32; 2], bg: [f32; 3]) {
        let den = weights[0] * acc.opacity[0] + weights[1] * acc.opacity[1];
        if den < MIN_COVERAGE {
            self.rgb[x * 3..x * 3 + 3].copy_from_slice(&bg);
            return;
        }
        self.covered += 1;
        for c in 0..3 {
            self.rgb[x * 3 + c] =
                (weights[0] * acc.color[0][c] + weights[1] * acc.color[1][c]) / den;
        }
        let weight_sum = weights[0] + weights[1];
        self.coverage[x] = if weight_sum > 0.0 {
            den / weight_sum
        } else {
            0.0
        };
        self.depth[x] = (weights[0] * acc.depth[0] + weights[1] * acc.depth[1]) / den;
        let fd = self.feature_dim;
        for k in 0..fd {
            self.features[x * fd + k] =
                (weights[0] * acc.features[0][k] + weights[1] * acc.features[1][k]) / den;
        }
    }
}

fn assemble_rows(
    rows: Vec<RowOutput>,
    canvas: Canvas,
    feature_dim: usize,
    time: f32,
    stats: impl FnOnce(usize) -> RasterStats,
) -> CinemagraphResult<RenderedFrame> {
    let n = canvas.pixel_count();
    let mut rgb = Vec::with_capacity(n * 3);
    let mut coverage = Vec::with_capacity(n);
    let mut depth = Vec::with_capacity(n);
    let mut features = Vec::with_capacity(n * feature_dim);
    let mut covered = 0;
    for row in rows {
        rgb.extend(row.rgb);
        coverage.extend(row.coverage);
        depth.extend(row.depth);
        features.extend(row.features);
        covered += row.covered;
    }
    let (w, h) = (canvas.width, canvas.height);
    Ok(RenderedFrame {
        time,
        rgb: Grid::new(w, h, 3, rgb)?,
        coverage: Grid::new(w, h, 1, coverage)?,
        depth: Grid::new(w, h, 1, depth)?,
        features: Grid::new(w, h, feature_dim, features)?,
        stats: stats(covered),
    })
}

#[cfg(test)]
#[path = "../../tests/unit/render/rasterize.rs"]
mod tests;
