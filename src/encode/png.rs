use std::path::{Path, PathBuf};

use crate::encode::ffmpeg::ensure_parent_dir;
use crate::encode::sink::{FrameSink, OrderGuard, SinkConfig};
use crate::foundation::core::FrameIndex;
use crate::foundation::error::{CinemagraphError, CinemagraphResult};

/// Writes every frame as `<dir>/<prefix>_<index>.png`.
#[derive(Debug)]
pub struct PngSequenceSink {
    dir: PathBuf,
    prefix: String,
    cfg: Option<SinkConfig>,
    guard: OrderGuard,
    written: Vec<PathBuf>,
}

impl PngSequenceSink {
    /// Sink writing into `dir` with file names starting with `prefix`.
    pub fn new(dir: impl Into<PathBuf>, prefix: impl Into<String>) -> Self {
        Self {
            dir: dir.into(),
            prefix: prefix.into(),
            cfg: None,
            guard: OrderGuard::default(),
            written: Vec::new(),
        }
    }

    /// Path of frame `idx`.
    pub fn frame_path(&self, idx: FrameIndex) -> PathBuf {
        self.dir.join(format!("{}_{}.png", self.prefix, idx.0))
    }

    /// Files written since `begin`.
    pub fn written(&self) -> &[PathBuf] {
        &self.written
    }

    /// Output directory.
    pub fn dir(&self) -> &Path {
        &self.dir
    }
}

impl FrameSink for PngSequenceSink {
    fn begin(&mut self, cfg: SinkConfig) -> CinemagraphResult<()> {
        cfg.validate()?;
        std::fs::create_dir_all(&self.dir).map_err(|e| {
            CinemagraphError::io(format!(
                "failed to create frame directory '{}': {e}",
                self.dir.display()
            ))
        })?;
        self.cfg = Some(cfg);
        self.guard.reset();
        self.written.clear();
        Ok(())
    }

    fn push_frame(&mut self, idx: FrameIndex, frame: &image::RgbImage) -> CinemagraphResult<()> {
        let cfg = self
            .cfg
            .as_ref()
            .ok_or_else(|| CinemagraphError::encoding("png sink not started"))?;
        self.guard.check(cfg, idx, frame)?;
        let path = self.frame_path(idx);
        ensure_parent_dir(&path)?;
        frame.save(&path).map_err(|e| {
            CinemagraphError::encoding(format!("failed to write '{}': {e}", path.display()))
        })?;
        self.written.push(path);
        Ok(())
    }

    fn end(&mut self) -> CinemagraphResult<()> {
        if self.cfg.take().is_none() {
            return Err(CinemagraphError::encoding("png sink not started"));
        }
        tracing::debug!(frames = self.written.len(), dir = %self.dir.display(), "frames saved");
        Ok(())
    }

    fn abort(&mut self) {
        for path in self.written.drain(..) {
            let _ = std::fs::remove_file(path);
        }
        self.cfg = None;
    }
}
