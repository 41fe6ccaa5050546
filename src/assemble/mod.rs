//! Frame assembly: quantization, border cropping and hand-off to a sink.

/// The frame assembler.
pub mod assembler;
