use std::ffi::OsString;
use std::io::Read;
use std::path::{Path, PathBuf};
use std::process::{Child, ChildStdin, Command, Stdio};

use crate::encode::sink::{FrameSink, OrderGuard, SinkConfig};
use crate::foundation::core::FrameIndex;
use crate::foundation::error::{CinemagraphError, CinemagraphResult};

/// Options for [`FfmpegSink`] MP4 output.
#[derive(Clone, Debug)]
pub struct FfmpegSinkOpts {
    /// Output MP4 file path.
    pub out_path: PathBuf,
    /// Overwrite output file if it already exists.
    pub overwrite: bool,
    /// Encoder executable, resolved through `PATH` when not a path.
    pub program: PathBuf,
}

impl FfmpegSinkOpts {
    /// Create options for outputting an MP4 to `out_path`.
    pub fn new(out_path: impl Into<PathBuf>) -> Self {
        Self {
            out_path: out_path.into(),
            overwrite: true,
            program: PathBuf::from("ffmpeg"),
        }
    }
}

/// Constant rate factor for a `0..=10` quality, 10 being best.
pub fn crf_for_quality(quality: u8) -> u32 {
    let q = 1.0 - f64::from(quality.min(10)) / 10.0;
    (q * 51.0) as u32
}

/// Sink that spawns the system `ffmpeg` and streams raw RGB frames to its stdin.
///
/// Dropping the sink before [`FrameSink::end`] aborts the encode and removes the partial file.
pub struct FfmpegSink {
    opts: FfmpegSinkOpts,

    child: Option<Child>,
    stdin: Option<ChildStdin>,
    stderr_drain: Option<std::thread::JoinHandle<std::io::Result<Vec<u8>>>>,

    cfg: Option<SinkConfig>,
    guard: OrderGuard,
}

impl FfmpegSink {
    /// Create a new sink that streams into `ffmpeg`.
    pub fn new(opts: FfmpegSinkOpts) -> Self {
        Self {
            opts,
            child: None,
            stdin: None,
            stderr_drain: None,
            cfg: None,
            guard: OrderGuard::default(),
        }
    }

    /// Output path.
    pub fn out_path(&self) -> &Path {
        &self.opts.out_path
    }

    /// Command-line arguments passed to `ffmpeg` for `cfg`.
    pub fn command_args(&self, cfg: &SinkConfig) -> Vec<OsString> {
        let mut args: Vec<OsString> = Vec::new();
        let mut push = |s: &str| args.push(s.into());
        push(if self.opts.overwrite { "-y" } else { "-n" });
        for a in [
            "-loglevel",
            "error",
            "-f",
            "rawvideo",
            "-pix_fmt",
            "rgb24",
            "-s",
            &format!("{}x{}", cfg.width, cfg.height),
            "-r",
            &cfg.fps.to_string(),
            "-i",
            "pipe:0",
            "-an",
        ] {
            push(a);
        }
        // yuv420p needs even dimensions.
        if !cfg.width.is_multiple_of(2) || !cfg.height.is_multiple_of(2) {
            push("-vf");
            push("pad=ceil(iw/2)*2:ceil(ih/2)*2");
        }
        for a in [
            "-c:v",
            "libx264",
            "-crf",
            &crf_for_quality(cfg.quality).to_string(),
            "-pix_fmt",
            "yuv420p",
            "-movflags",
            "+faststart",
        ] {
            push(a);
        }
        args.push(self.opts.out_path.clone().into_os_string());
        args
    }

    fn remove_partial(&self) {
        if self.opts.out_path.exists()
            && let Err(e) = std::fs::remove_file(&self.opts.out_path)
        {
            tracing::warn!(
                path = %self.opts.out_path.display(),
                error = %e,
                "failed to remove partial video"
            );
        }
    }

    fn join_stderr(&mut self) -> CinemagraphResult<Vec<u8>> {
        match self.stderr_drain.take() {
            Some(handle) => handle
                .join()
                .map_err(|_| CinemagraphError::encoding("ffmpeg stderr drain thread panicked"))?
                .map_err(|e| CinemagraphError::encoding(format!("ffmpeg stderr read failed: {e}"))),
            None => Ok(Vec::new()),
        }
    }
}

impl FrameSink for FfmpegSink {
    fn begin(&mut self, cfg: SinkConfig) -> CinemagraphResult<()> {
        cfg.validate()?;

        ensure_parent_dir(&self.opts.out_path)?;
        if !self.opts.overwrite && self.opts.out_path.exists() {
            return Err(CinemagraphError::encoding(format!(
                "output file '{}' already exists",
                self.opts.out_path.display()
            )));
        }

        if !program_runs(&self.opts.program) {
            return Err(CinemagraphError::encoding(format!(
                "ffmpeg is required for MP4 encoding, but '{}' could not be run",
                self.opts.program.display()
            )));
        }

        let mut child = Command::new(&self.opts.program)
            .args(self.command_args(&cfg))
            .stdin(Stdio::piped())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| {
                CinemagraphError::encoding(format!(
                    "failed to spawn ffmpeg (is it installed and on PATH?): {e}"
                ))
            })?;

        let stdin = child
            .stdin
            .take()
            .ok_or_else(|| CinemagraphError::encoding("failed to open ffmpeg stdin"))?;
        let mut stderr = child
            .stderr
            .take()
            .ok_or_else(|| CinemagraphError::encoding("failed to open ffmpeg stderr"))?;
        let stderr_drain = std::thread::spawn(move || {
            let mut stderr_bytes = Vec::new();
            stderr.read_to_end(&mut stderr_bytes)?;
            Ok(stderr_bytes)
        });

        tracing::debug!(path = %self.opts.out_path.display(), "ffmpeg started");
        self.child = Some(child);
        self.stdin = Some(stdin);
        self.stderr_drain = Some(stderr_drain);
        self.cfg = Some(cfg);
        self.guard.reset();
        Ok(())
    }

    fn push_frame(&mut self, idx: FrameIndex, frame: &image::RgbImage) -> CinemagraphResult<()> {
        let cfg = self
            .cfg
            .as_ref()
            .ok_or_else(|| CinemagraphError::encoding("ffmpeg sink not started"))?;
        self.guard.check(cfg, idx, frame)?;

        let Some(stdin) = self.stdin.as_mut() else {
            return Err(CinemagraphError::encoding("ffmpeg sink is already finalized"));
        };

        use std::io::Write as _;
        stdin.write_all(frame.as_raw()).map_err(|e| {
            CinemagraphError::encoding(format!("failed to write frame to ffmpeg stdin: {e}"))
        })?;
        Ok(())
    }

    fn end(&mut self) -> CinemagraphResult<()> {
        drop(self.stdin.take());
        let mut child = self
            .child
            .take()
            .ok_or_else(|| CinemagraphError::encoding("ffmpeg sink not started"))?;

        let status = child.wait().map_err(|e| {
            CinemagraphError::encoding(format!("failed to wait for ffmpeg to finish: {e}"))
        })?;
        let stderr_bytes = self.join_stderr()?;

        if !status.success() {
            self.cfg = None;
            self.remove_partial();
            let stderr = String::from_utf8_lossy(&stderr_bytes);
            return Err(CinemagraphError::encoding(format!(
                "ffmpeg exited with status {}: {}",
                status,
                stderr.trim()
            )));
        }

        self.cfg = None;
        Ok(())
    }

    fn abort(&mut self) {
        drop(self.stdin.take());
        let started = self.cfg.take().is_some();
        if let Some(mut child) = self.child.take() {
            let _ = child.kill();
            let _ = child.wait();
        }
        let _ = self.join_stderr();
        if !started {
            return;
        }
        self.remove_partial();
        tracing::warn!(path = %self.opts.out_path.display(), "ffmpeg encode aborted");
    }
}

impl Drop for FfmpegSink {
    fn drop(&mut self) {
        self.abort();
    }
}

/// Ensure the parent directory of `path` exists.
pub fn ensure_parent_dir(path: &Path) -> CinemagraphResult<()> {
    if let Some(parent) = path.parent() {
        use anyhow::Context as _;
        std::fs::create_dir_all(parent)
            .with_context(|| format!("failed to create output directory '{}'", parent.display()))?;
    }
    Ok(())
}

fn program_runs(program: &Path) -> bool {
    Command::new(program)
        .arg("-version")
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status()
        .map(|s| s.success())
        .unwrap_or(false)
}

#[cfg(test)]
#[path = "../../tests/unit/encode/ffmpeg.rs"]
mod tests;
