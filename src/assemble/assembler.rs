use crate::encode::sink::{FrameSink, SinkConfig};
use crate::foundation::core::{Canvas, FrameIndex};
use crate::foundation::error::{CinemagraphError, CinemagraphResult};
use crate::render::frame::RenderedFrame;

/// Output rate and quality handed to the encoder.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct EncodeSettings {
    /// Frames per second.
    pub fps: u32,
    /// Quality on a `0..=10` scale.
    pub quality: u8,
}

impl Default for EncodeSettings {
    fn default() -> Self {
        Self { fps: 25, quality: 8 }
    }
}

/// Turns rendered frames into cropped 8-bit images and feeds them to a sink in order.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FrameAssembler {
    crop: u32,
}

impl FrameAssembler {
    /// Assembler removing `crop` pixels from every edge.
    pub fn new(crop: u32) -> Self {
        Self { crop }
    }

    /// Border margin.
    pub fn crop(&self) -> u32 {
        self.crop
    }

    /// Size of a frame of `canvas` after cropping.
    pub fn cropped_canvas(&self, canvas: Canvas) -> CinemagraphResult<Canvas> {
        let margin = 2 * u64::from(self.crop);
        if margin >= u64::from(canvas.width) || margin >= u64::from(canvas.height) {
            return Err(CinemagraphError::encoding(format!(
                "crop of {} px leaves nothing of a {}x{} frame",
                self.crop, canvas.width, canvas.height
            )));
        }
        Ok(Canvas::new(
            canvas.width - 2 * self.crop,
            canvas.height - 2 * self.crop,
        ))
    }

    /// Quantize and crop one frame.
    pub fn convert(&self, frame: &RenderedFrame) -> CinemagraphResult<image::RgbImage> {
        let out = self.cropped_canvas(frame.canvas())?;
        let full = frame.to_rgb8()?;
        Ok(image::imageops::crop_imm(&full, self.crop, self.crop, out.width, out.height).to_image())
    }

    /// Quantize and crop a whole sequence.
    ///
    /// Fails with [`CinemagraphError::Encoding`] on an empty sequence or mixed frame sizes.
    pub fn assemble(&self, frames: &[RenderedFrame]) -> CinemagraphResult<Vec<image::RgbImage>> {
        let first = check_sequence(frames)?;
        self.cropped_canvas(first)?;
        frames.iter().map(|f| self.convert(f)).collect()
    }

    /// Start streaming frames of size `canvas` into `sink`.
    pub fn begin<'s>(
        &self,
        sink: &'s mut dyn FrameSink,
        canvas: Canvas,
        settings: EncodeSettings,
    ) -> CinemagraphResult<AssemblySession<'s>> {
        let out = self.cropped_canvas(canvas)?;
        sink.begin(SinkConfig {
            width: out.width,
            height: out.height,
            fps: settings.fps,
            quality: settings.quality,
        })?;
        Ok(AssemblySession {
            assembler: *self,
            sink,
            canvas,
            pushed: 0,
            finished: false,
        })
    }

    /// Assemble `frames` and write them to `sink`, in slice order.
    #[tracing::instrument(skip_all, fields(frames = frames.len(), crop = self.crop))]
    pub fn write_all(
        &self,
        frames: &[RenderedFrame],
        sink: &mut dyn FrameSink,
        settings: EncodeSettings,
    ) -> CinemagraphResult<u64> {
        let canvas = check_sequence(frames)?;
        let mut session = self.begin(sink, canvas, settings)?;
        for frame in frames {
            session.push(frame)?;
        }
        session.finish()
    }
}

fn check_sequence(frames: &[RenderedFrame]) -> CinemagraphResult<Canvas> {
    let Some(first) = frames.first() else {
        return Err(CinemagraphError::encoding("no frames to assemble"));
    };
    let canvas = first.canvas();
    if let Some((i, f)) = frames
        .iter()
        .enumerate()
        .find(|(_, f)| f.canvas() != canvas)
    {
        return Err(CinemagraphError::encoding(format!(
            "frame {i} is {}x{}, expected {}x{}",
            f.canvas().width,
            f.canvas().height,
            canvas.width,
            canvas.height
        )));
    }
    Ok(canvas)
}

/// An open sink receiving frames of one sequence.
///
/// Dropping a session that was not finished aborts the sink, so partial output is discarded.
pub struct AssemblySession<'s> {
    assembler: FrameAssembler,
    sink: &'s mut dyn FrameSink,
    canvas: Canvas,
    pushed: u64,
    finished: bool,
}

impl AssemblySession<'_> {
    /// Convert and push the next frame.
    pub fn push(&mut self, frame: &RenderedFrame) -> CinemagraphResult<()> {
        if frame.canvas() != self.canvas {
            return Err(CinemagraphError::encoding(format!(
                "frame {} is {}x{}, expected {}x{}",
                self.pushed,
                frame.canvas().width,
                frame.canvas().height,
                self.canvas.width,
                self.canvas.height
            )));
        }
        let img = self.assembler.convert(frame)?;
        self.sink.push_frame(FrameIndex(self.pushed), &img)?;
        self.pushed += 1;
        Ok(())
    }

    /// Frames pushed so far.
    pub fn pushed(&self) -> u64 {
        self.pushed
    }

    /// Finalize the sink. Fails with [`CinemagraphError::Encoding`] when no frame was pushed.
    pub fn finish(mut self) -> CinemagraphResult<u64> {
        if self.pushed == 0 {
            return Err(CinemagraphError::encoding("no frames to assemble"));
        }
        self.sink.end()?;
        self.finished = true;
        Ok(self.pushed)
    }
}

impl Drop for AssemblySession<'_> {
    fn drop(&mut self) {
        if !self.finished {
            self.sink.abort();
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/assemble/assembler.rs"]
mod tests;
