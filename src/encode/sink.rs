use crate::foundation::core::FrameIndex;
use crate::foundation::error::{CinemagraphError, CinemagraphResult};

/// Configuration provided to a [`FrameSink`] before the first frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SinkConfig {
    /// Frame width in pixels.
    pub width: u32,
    /// Frame height in pixels.
    pub height: u32,
    /// Frames per second.
    pub fps: u32,
    /// Encoder quality on a `0..=10` scale, 10 being best.
    pub quality: u8,
}

impl SinkConfig {
    /// Reject zero sizes, zero fps and out-of-range quality.
    pub fn validate(&self) -> CinemagraphResult<()> {
        if self.width == 0 || self.height == 0 {
            return Err(CinemagraphError::encoding(
                "sink width/height must be non-zero",
            ));
        }
        if self.fps == 0 {
            return Err(CinemagraphError::encoding("sink fps must be non-zero"));
        }
        if self.quality > 10 {
            return Err(CinemagraphError::encoding(format!(
                "sink quality must be within 0..=10, got {}",
                self.quality
            )));
        }
        Ok(())
    }
}

/// Consumer of assembled 8-bit frames.
///
/// Ordering contract: `push_frame` is called in strictly increasing [`FrameIndex`] order, between
/// one `begin` and one `end` or `abort`.
pub trait FrameSink: Send {
    /// Called once before any frame is pushed.
    fn begin(&mut self, cfg: SinkConfig) -> CinemagraphResult<()>;
    /// Push one frame.
    fn push_frame(&mut self, idx: FrameIndex, frame: &image::RgbImage) -> CinemagraphResult<()>;
    /// Finalize the output after the last frame.
    fn end(&mut self) -> CinemagraphResult<()>;
    /// Discard everything written since `begin`. Safe to call at any time.
    fn abort(&mut self);
}

/// Rejects out-of-order pushes and frames of the wrong size.
#[derive(Debug, Default)]
pub(crate) struct OrderGuard {
    last: Option<FrameIndex>,
}

impl OrderGuard {
    pub(crate) fn reset(&mut self) {
        self.last = None;
    }

    pub(crate) fn check(
        &mut self,
        cfg: &SinkConfig,
        idx: FrameIndex,
        frame: &image::RgbImage,
    ) -> CinemagraphResult<()> {
        if let Some(last) = self.last
            && idx <= last
        {
            return Err(CinemagraphError::encoding(format!(
                "frame {} pushed after frame {}",
                idx.0, last.0
            )));
        }
        if frame.width() != cfg.width || frame.height() != cfg.height {
            return Err(CinemagraphError::encoding(format!(
                "frame size mismatch: got {}x{}, expected {}x{}",
                frame.width(),
                frame.height(),
                cfg.width,
                cfg.height
            )));
        }
        self.last = Some(idx);
        Ok(())
    }
}

/// In-memory sink for tests and debugging.
#[derive(Debug, Default)]
pub struct InMemorySink {
    cfg: Option<SinkConfig>,
    frames: Vec<(FrameIndex, image::RgbImage)>,
    guard: OrderGuard,
    finished: bool,
    aborted: bool,
}

impl InMemorySink {
    /// Create an empty sink.
    pub fn new() -> Self {
        Self::default()
    }

    /// Configuration captured in `begin`, if any.
    pub fn config(&self) -> Option<&SinkConfig> {
        self.cfg.as_ref()
    }

    /// Captured frames, in push order.
    pub fn frames(&self) -> &[(FrameIndex, image::RgbImage)] {
        &self.frames
    }

    /// Whether `end` completed.
    pub fn is_finished(&self) -> bool {
        self.finished
    }

    /// Whether the output was discarded.
    pub fn is_aborted(&self) -> bool {
        self.aborted
    }
}

impl FrameSink for InMemorySink {
    fn begin(&mut self, cfg: SinkConfig) -> CinemagraphResult<()> {
        cfg.validate()?;
        self.cfg = Some(cfg);
        self.frames.clear();
        self.guard.reset();
        self.finished = false;
        self.aborted = false;
        Ok(())
    }

    fn push_frame(&mut self, idx: FrameIndex, frame: &image::RgbImage) -> CinemagraphResult<()> {
        let cfg = self
            .cfg
            .as_ref()
            .ok_or_else(|| CinemagraphError::encoding("in-memory sink not started"))?;
        self.guard.check(cfg, idx, frame)?;
        self.frames.push((idx, frame.clone()));
        Ok(())
    }

    fn end(&mut self) -> CinemagraphResult<()> {
        if self.cfg.is_none() {
            return Err(CinemagraphError::encoding("in-memory sink not started"));
        }
        self.finished = true;
        Ok(())
    }

    fn abort(&mut self) {
        self.frames.clear();
        self.aborted = true;
        self.finished = false;
    }
}

#[cfg(test)]
#[path = "../../tests/unit/encode/sink.rs"]
mod tests;
