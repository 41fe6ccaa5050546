use crate::foundation::error::{CinemagraphError, CinemagraphResult};

/// Output frame index (0-based, increasing with time).
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, serde::Serialize, serde::Deserialize,
)]
pub struct FrameIndex(pub u64);

/// Pixel dimensions of an image or map.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub struct Canvas {
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
}

impl Canvas {
    /// Build a canvas size.
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    /// `width * height`.
    pub fn pixel_count(self) -> usize {
        self.width as usize * self.height as usize
    }

    /// Whether either side is zero.
    pub fn is_empty(self) -> bool {
        self.width == 0 || self.height == 0
    }
}

/// Dense, row-major, channel-interleaved 2D map.
///
/// Used for every pixel-aligned quantity of the pipeline: depth, masks, features, flow.
#[derive(Clone, Debug, PartialEq)]
pub struct Grid<T> {
    width: u32,
    height: u32,
    channels: usize,
    data: Vec<T>,
}

impl<T: Copy> Grid<T> {
    /// Wrap `data`, which must hold exactly `width * height * channels` values.
    pub fn new(width: u32, height: u32, channels: usize, data: Vec<T>) -> CinemagraphResult<Self> {
        let expected = (width as usize)
            .checked_mul(height as usize)
            .and_then(|n| n.checked_mul(channels))
            .ok_or_else(|| CinemagraphError::validation("grid size overflow"))?;
        if data.len() != expected {
            return Err(CinemagraphError::validation(format!(
                "grid data length {} does not match {}x{}x{}",
                data.len(),
                width,
                height,
                channels
            )));
        }
        Ok(Self {
            width,
            height,
            channels,
            data,
        })
    }

    /// A grid with every value set to `value`.
    pub fn filled(width: u32, height: u32, channels: usize, value: T) -> Self {
        Self {
            width,
            height,
            channels,
            data: vec![value; width as usize * height as usize * channels],
        }
    }

    /// Build a grid by evaluating `f(x, y)` for every pixel (single channel).
    pub fn from_fn(width: u32, height: u32, mut f: impl FnMut(u32, u32) -> T) -> Self {
        let mut data = Vec::with_capacity(width as usize * height as usize);
        for y in 0..height {
            for x in 0..width {
                data.push(f(x, y));
            }
        }
        Self {
            width,
            height,
            channels: 1,
            data,
        }
    }

    /// Width in pixels.
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Height in pixels.
    pub fn height(&self) -> u32 {
        self.height
    }

    /// Values per pixel.
    pub fn channels(&self) -> usize {
        self.channels
    }

    /// Pixel dimensions.
    pub fn canvas(&self) -> Canvas {
        Canvas::new(self.width, self.height)
    }

    /// Raw values.
    pub fn data(&self) -> &[T] {
        &self.data
    }

    /// Raw values, mutable.
    pub fn data_mut(&mut self) -> &mut [T] {
        &mut self.data
    }

    /// Consume into raw values.
    pub fn into_data(self) -> Vec<T> {
        self.data
    }

    /// Apply `f` to every value, keeping the shape.
    pub fn map<U: Copy>(&self, f: impl FnMut(T) -> U) -> Grid<U> {
        Grid {
            width: self.width,
            height: self.height,
            channels: self.channels,
            data: self.data.iter().copied().map(f).collect(),
        }
    }

    /// Whether `other` covers the same pixels (channel count may differ).
    pub fn same_canvas<U>(&self, other: &Grid<U>) -> bool {
        self.width == other.width && self.height == other.height
    }

    /// Linear pixel index.
    #[inline]
    pub fn pixel_index(&self, x: u32, y: u32) -> usize {
        y as usize * self.width as usize + x as usize
    }

    /// All channels of one pixel.
    #[inline]
    pub fn pixel(&self, x: u32, y: u32) -> &[T] {
        let start = self.pixel_index(x, y) * self.channels;
        &self.data[start..start + self.channels]
    }

    /// All channels of one pixel, mutable.
    #[inline]
    pub fn pixel_mut(&mut self, x: u32, y: u32) -> &mut [T] {
        let start = self.pixel_index(x, y) * self.channels;
        &mut self.data[start..start + self.channels]
    }

    /// First channel of one pixel.
    #[inline]
    pub fn at(&self, x: u32, y: u32) -> T {
        self.data[self.pixel_index(x, y) * self.channels]
    }
}

impl Grid<f32> {
    /// Bilinear resample to `width x height`, sampling pixel centers.
    ///
    /// Values are interpolated as-is; vector fields must be rescaled by the caller.
    pub fn resize_bilinear(&self, width: u32, height: u32) -> Self {
        if width == self.width && height == self.height {
            return self.clone();
        }
        let c = self.channels;
        let mut data = Vec::with_capacity(width as usize * height as usize * c);
        if self.width == 0 || self.height == 0 {
            data.resize(width as usize * height as usize * c, 0.0);
            return Self {
                width,
                height,
                channels: c,
                data,
            };
        }
        let sx = self.width as f32 / width.max(1) as f32;
        let sy = self.height as f32 / height.max(1) as f32;
        let max_x = (self.width - 1) as f32;
        let max_y = (self.height - 1) as f32;
        for y in 0..height {
            let fy = ((y as f32 + 0.5) * sy - 0.5).clamp(0.0, max_y);
            let y0 = fy.floor() as u32;
            let y1 = (y0 + 1).min(self.height - 1);
            let wy = fy - y0 as f32;
            for x in 0..width {
                let fx = ((x as f32 + 0.5) * sx - 0.5).clamp(0.0, max_x);
                let x0 = fx.floor() as u32;
                let x1 = (x0 + 1).min(self.width - 1);
                let wx = fx - x0 as f32;
                let (p00, p10) = (self.pixel(x0, y0), self.pixel(x1, y0));
                let (p01, p11) = (self.pixel(x0, y1), self.pixel(x1, y1));
                for k in 0..c {
                    let top = p00[k] + (p10[k] - p00[k]) * wx;
                    let bottom = p01[k] + (p11[k] - p01[k]) * wx;
                    data.push(top + (bottom - top) * wy);
                }
            }
        }
        Self {
            width,
            height,
            channels: c,
            data,
        }
    }

    /// Position of the first NaN/infinite value, if any.
    pub fn first_non_finite(&self) -> Option<(u32, u32)> {
        if self.channels == 0 || self.width == 0 {
            return None;
        }
        self.data.iter().position(|v| !v.is_finite()).map(|i| {
            let px = i / self.channels;
            (
                (px % self.width as usize) as u32,
                (px / self.width as usize) as u32,
            )
        })
    }
}
