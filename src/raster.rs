use crate::error::{Result, ViewerError};

/// Opaque white, used for the padding bands of a composite.
pub const WHITE: u32 = 0xFFFF_FFFF;

#[inline]
pub fn argb(a: u8, r: u8, g: u8, b: u8) -> u32 {
    (a as u32) << 24 | (r as u32) << 16 | (g as u32) << 8 | b as u32
}

#[inline]
pub fn alpha(p: u32) -> u8 {
    (p >> 24) as u8
}

#[inline]
pub fn red(p: u32) -> u8 {
    (p >> 16) as u8
}

#[inline]
pub fn green(p: u32) -> u8 {
    (p >> 8) as u8
}

#[inline]
pub fn blue(p: u32) -> u8 {
    p as u8
}

/// Channels in `[a, r, g, b]` order.
#[inline]
pub fn channels(p: u32) -> [u8; 4] {
    [alpha(p), red(p), green(p), blue(p)]
}

/// An ARGB32 raster, row-major, one `0xAARRGGBB` word per pixel.
///
/// Pixel `(x, y)` lives at `pixels[y * width + x]`. Decoded images, the
/// composite and the scaled output all use this one type.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ArgbImage {
    pub width: u32,
    pub height: u32,
    pub pixels: Vec<u32>,
}

impl ArgbImage {
    /// The 0×0 image that stands in for a slot that failed to load.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Transparent black image of the given size.
    pub fn new(width: u32, height: u32) -> Self {
        Self::filled(width, height, 0)
    }

    pub fn filled(width: u32, height: u32, color: u32) -> Self {
        Self {
            width,
            height,
            pixels: vec![color; width as usize * height as usize],
        }
    }

    /// Wrap a row-major buffer; its length must be `width * height`.
    pub fn from_pixels(width: u32, height: u32, pixels: Vec<u32>) -> Result<Self> {
        if pixels.len() != width as usize * height as usize {
            return Err(ViewerError::RasterSize {
                width,
                height,
                len: pixels.len(),
            });
        }
        Ok(Self {
            width,
            height,
            pixels,
        })
    }

    /// Pack an RGBA8 buffer (as produced by the `image` crate) into ARGB32.
    pub fn from_rgba8(width: u32, height: u32, rgba: &[u8]) -> Result<Self> {
        let pixels = rgba
            .chunks_exact(4)
            .map(|p| argb(p[3], p[0], p[1], p[2]))
            .collect();
        Self::from_pixels(width, height, pixels)
    }

    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }

    pub fn size(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    #[inline]
    pub fn pixel(&self, x: u32, y: u32) -> u32 {
        self.pixels[y as usize * self.width as usize + x as usize]
    }

    pub fn row(&self, y: u32) -> &[u32] {
        let w = self.width as usize;
        let start = y as usize * w;
        &self.pixels[start..start + w]
    }
}
