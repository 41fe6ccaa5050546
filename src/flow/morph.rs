use rayon::prelude::*;

use crate::foundation::core::Grid;
use crate::foundation::error::{CinemagraphError, CinemagraphResult};

/// Square, all-ones structuring element of odd side length.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Kernel {
    size: u32,
}

impl Kernel {
    /// A `size x size` kernel. `size` must be odd.
    pub fn square(size: u32) -> CinemagraphResult<Self> {
        if size == 0 || size % 2 == 0 {
            return Err(CinemagraphError::validation(format!(
                "dilation kernel size must be odd, got {size}"
            )));
        }
        Ok(Self { size })
    }

    /// Side length.
    pub fn size(self) -> u32 {
        self.size
    }

    /// Half the side length, rounded down.
    pub fn radius(self) -> u32 {
        self.size / 2
    }
}

/// Binary dilation: a pixel is set when any pixel under the kernel is set.
pub fn dilate(mask: &Grid<bool>, kernel: Kernel) -> Grid<bool> {
    let r = kernel.radius();
    if r == 0 {
        return mask.clone();
    }
    let (w, h) = (mask.width(), mask.height());
    let data: Vec<bool> = (0..h)
        .into_par_iter()
        .flat_map_iter(|y| {
            let y0 = y.saturating_sub(r);
            let y1 = (y + r).min(h.saturating_sub(1));
            (0..w).map(move |x| {
                let x0 = x.saturating_sub(r);
                let x1 = (x + r).min(w - 1);
                (y0..=y1).any(|yy| (x0..=x1).any(|xx| mask.at(xx, yy)))
            })
        })
        .collect();
    Grid::from_fn(w, h, |x, y| data[y as usize * w as usize + x as usize])
}
