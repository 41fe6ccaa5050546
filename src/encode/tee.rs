use crate::encode::sink::{FrameSink, SinkConfig};
use crate::foundation::core::FrameIndex;
use crate::foundation::error::CinemagraphResult;

/// Forwards every call to two sinks, `primary` first.
///
/// A failure in either sink aborts both.
#[derive(Debug)]
pub struct TeeSink<A, B> {
    primary: A,
    secondary: B,
}

impl<A: FrameSink, B: FrameSink> TeeSink<A, B> {
    pub fn new(primary: A, secondary: B) -> Self {
        Self { primary, secondary }
    }

    pub fn primary(&self) -> &A {
        &self.primary
    }

    pub fn secondary(&self) -> &B {
        &self.secondary
    }

    pub fn into_inner(self) -> (A, B) {
        (self.primary, self.secondary)
    }

    fn both<T>(&mut self, r: CinemagraphResult<T>) -> CinemagraphResult<T> {
        if r.is_err() {
            self.abort();
        }
        r
    }
}

impl<A: FrameSink, B: FrameSink> FrameSink for TeeSink<A, B> {
    fn begin(&mut self, cfg: SinkConfig) -> CinemagraphResult<()> {
        let r = self.primary.begin(cfg.clone());
        self.both(r)?;
        let r = self.secondary.begin(cfg);
        self.both(r)
    }

    fn push_frame(&mut self, idx: FrameIndex, frame: &image::RgbImage) -> CinemagraphResult<()> {
        let r = self.primary.push_frame(idx, frame);
        self.both(r)?;
        let r = self.secondary.push_frame(idx, frame);
        self.both(r)
    }

    fn end(&mut self) -> CinemagraphResult<()> {
        let r = self.primary.end();
        self.both(r)?;
        let r = self.secondary.end();
        self.both(r)
    }

    fn abort(&mut self) {
        self.primary.abort();
        self.secondary.abort();
    }
}
