use std::io::{Read, Write};
use std::path::Path;

use crate::flow::field::FlowField;
use crate::foundation::core::Grid;
use crate::foundation::error::{CinemagraphError, CinemagraphResult};

/// Middlebury `.flo` header tag (`"PIEH"` read as little-endian `f32`).
pub const FLO_TAG: f32 = 202_021.25;

/// Largest accepted side length, guarding against corrupt headers.
const MAX_SIDE: i32 = 1 << 16;

/// Decode a Middlebury `.flo` stream: tag, width and height as `i32`, then interleaved
/// `(dx, dy)` `f32` pairs in row-major order, all little-endian.
pub fn read_flo(mut r: impl Read) -> CinemagraphResult<FlowField> {
    let mut word = [0u8; 4];
    r.read_exact(&mut word)
        .map_err(|e| CinemagraphError::io(format!("flo header: {e}")))?;
    if f32::from_le_bytes(word) != FLO_TAG {
        return Err(CinemagraphError::validation(
            "not a .flo file (bad PIEH tag)",
        ));
    }
    let mut dims = [0i32; 2];
    for d in &mut dims {
        r.read_exact(&mut word)
            .map_err(|e| CinemagraphError::io(format!("flo header: {e}")))?;
        *d = i32::from_le_bytes(word);
    }
    let [w, h] = dims;
    if !(1..=MAX_SIDE).contains(&w) || !(1..=MAX_SIDE).contains(&h) {
        return Err(CinemagraphError::validation(format!(
            "implausible .flo size {w}x{h}"
        )));
    }
    let count = w as usize * h as usize * 2;
    let mut bytes = vec![0u8; count * 4];
    r.read_exact(&mut bytes)
        .map_err(|e| CinemagraphError::io(format!("flo data truncated: {e}")))?;
    let data = bytes
        .chunks_exact(4)
        .map(|b| f32::from_le_bytes([b[0], b[1], b[2], b[3]]))
        .collect();
    FlowField::new(Grid::new(w as u32, h as u32, 2, data)?)
}

/// Encode a flow field as a Middlebury `.flo` stream.
pub fn write_flo(field: &FlowField, mut w: impl Write) -> CinemagraphResult<()> {
    let canvas = field.canvas();
    let mut out = Vec::with_capacity(12 + field.grid().data().len() * 4);
    out.extend_from_slice(&FLO_TAG.to_le_bytes());
    out.extend_from_slice(&(canvas.width as i32).to_le_bytes());
    out.extend_from_slice(&(canvas.height as i32).to_le_bytes());
    for v in field.grid().data() {
        out.extend_from_slice(&v.to_le_bytes());
    }
    w.write_all(&out)?;
    Ok(())
}

/// Read a `.flo` file.
pub fn load_flo(path: &Path) -> CinemagraphResult<FlowField> {
    let file = std::fs::File::open(path).map_err(|e| {
        CinemagraphError::io(format!("failed to open '{}': {e}", path.display()))
    })?;
    read_flo(std::io::BufReader::new(file))
}

#[cfg(test)]
#[path = "../../tests/unit/pipeline/flo.rs"]
mod tests;
