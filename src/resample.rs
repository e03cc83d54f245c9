//! Software resampling of ARGB rasters.
//!
//! Output pixel `(x, y)` is sampled at source position `(x / s, y / s)`.
//! All three kernels work per channel on `0xAARRGGBB` words and run rows in
//! parallel; the result does not depend on the thread count.

use rayon::prelude::*;

use crate::raster::{ArgbImage, argb, channels};

/// Largest output raster `resample` will allocate, in pixels.
pub const MAX_OUTPUT_PIXELS: f64 = (1u64 << 28) as f64;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Interpolation {
    Nearest,
    #[default]
    Bilinear,
    Bicubic,
}

impl Interpolation {
    pub const ALL: [Interpolation; 3] = [
        Interpolation::Nearest,
        Interpolation::Bilinear,
        Interpolation::Bicubic,
    ];
}

/// Relative comparison with 12 significant digits.
pub fn fuzzy_eq(a: f64, b: f64) -> bool {
    (a - b).abs() * 1_000_000_000_000.0 <= a.abs().min(b.abs())
}

/// Scale `src` by `scale` with the chosen kernel.
///
/// The output is `⌊W·s⌋ × ⌊H·s⌋`. A scale fuzzy-equal to 1 returns the
/// source unchanged. An output larger than [`MAX_OUTPUT_PIXELS`] is refused
/// with a warning and an empty raster.
pub fn resample(src: &ArgbImage, scale: f64, mode: Interpolation) -> ArgbImage {
    debug_assert!(scale.is_finite() && scale > 0.0, "bad scale {scale}");
    if !(scale.is_finite() && scale > 0.0) {
        return ArgbImage::empty();
    }
    if fuzzy_eq(scale, 1.0) {
        return src.clone();
    }

    let nw_f = (src.width as f64 * scale).floor();
    let nh_f = (src.height as f64 * scale).floor();
    if nw_f * nh_f > MAX_OUTPUT_PIXELS || nw_f > u32::MAX as f64 || nh_f > u32::MAX as f64 {
        log::warn!(
            "refusing to resample {}x{} by {scale}: output would be {nw_f}x{nh_f}",
            src.width,
            src.height
        );
        return ArgbImage::empty();
    }
    let nw = nw_f as u32;
    let nh = nh_f as u32;
    if nw == 0 || nh == 0 || src.is_empty() {
        return ArgbImage::new(nw, nh);
    }

    let mut out = ArgbImage::new(nw, nh);
    match mode {
        Interpolation::Nearest => nearest(src, scale, &mut out),
        Interpolation::Bilinear => bilinear(src, scale, &mut out),
        Interpolation::Bicubic => bicubic(src, scale, &mut out),
    }
    out
}

// ---------------------------------------------------------------------------
// Nearest neighbour
// ---------------------------------------------------------------------------

fn nearest(src: &ArgbImage, s: f64, out: &mut ArgbImage) {
    let x_last = src.width as usize - 1;
    let y_last = src.height as usize - 1;
    let columns: Vec<usize> = (0..out.width)
        .map(|x| ((x as f64 / s + 0.5).floor() as usize).min(x_last))
        .collect();

    out.pixels
        .par_chunks_mut(out.width as usize)
        .enumerate()
        .for_each(|(y, row)| {
            let sy = ((y as f64 / s + 0.5).floor() as usize).min(y_last);
            let src_row = src.row(sy as u32);
            for (dst, &sx) in row.iter_mut().zip(&columns) {
                *dst = src_row[sx];
            }
        });
}

// ---------------------------------------------------------------------------
// Bilinear
// ---------------------------------------------------------------------------

fn bilinear(src: &ArgbImage, s: f64, out: &mut ArgbImage) {
    let w = src.width as usize;
    let x_last = w - 1;
    let y_last = src.height as usize - 1;

    // (column, column + 1, x - [x]) per output column.
    let columns: Vec<(usize, usize, f64)> = (0..out.width)
        .map(|x| {
            let u = x as f64 / s;
            let xg = u.floor();
            let i = (xg as usize).min(x_last);
            (i, (i + 1).min(x_last), u - xg)
        })
        .collect();

    out.pixels
        .par_chunks_mut(out.width as usize)
        .enumerate()
        .for_each(|(y, row)| {
            let v = y as f64 / s;
            let yg = v.floor();
            let dv = v - yg;
            let j0 = (yg as usize).min(y_last) * w;
            let j1 = (yg as usize + 1).min(y_last) * w;

            for (dst, &(i0, i1, du)) in row.iter_mut().zip(&columns) {
                let t1 = (1.0 - du) * (1.0 - dv);
                let t2 = (1.0 - du) * dv;
                let t3 = du * (1.0 - dv);
                let t4 = du * dv;

                let p00 = channels(src.pixels[j0 + i0]);
                let p01 = channels(src.pixels[j1 + i0]);
                let p10 = channels(src.pixels[j0 + i1]);
                let p11 = channels(src.pixels[j1 + i1]);

                let mut c = [0u8; 4];
                for k in 0..4 {
                    let acc = t1 * p00[k] as f64
                        + t2 * p01[k] as f64
                        + t3 * p10[k] as f64
                        + t4 * p11[k] as f64;
                    c[k] = acc as u8;
                }
                *dst = argb(c[0], c[1], c[2], c[3]);
            }
        });
}

// ---------------------------------------------------------------------------
// Bicubic
// ---------------------------------------------------------------------------

/// Cubic convolution kernel with a = -1.
fn bicubic_h(t: f64) -> f64 {
    let u = t.abs();
    if u <= 1.0 {
        u * u * u - 2.0 * u * u + 1.0
    } else if u <= 2.0 {
        -(u * u * u) + 5.0 * u * u - 8.0 * u + 4.0
    } else {
        0.0
    }
}

fn weights(f: f64) -> [f64; 4] {
    [
        bicubic_h(1.0 + f),
        bicubic_h(f),
        bicubic_h(1.0 - f),
        bicubic_h(2.0 - f),
    ]
}

/// `d1 · P · d3ᵀ`, truncated toward zero and clamped to a byte.
fn bicubic_dot(d1: &[f64; 4], p: &[[f64; 4]; 4], d3: &[f64; 4]) -> u8 {
    let mut temp = [0.0; 4];
    for (j, t) in temp.iter_mut().enumerate() {
        *t = d1[0] * p[0][j] + d1[1] * p[1][j] + d1[2] * p[2][j] + d1[3] * p[3][j];
    }
    let v = (temp[0] * d3[0] + temp[1] * d3[1] + temp[2] * d3[2] + temp[3] * d3[3]) as i32;
    v.clamp(0, 255) as u8
}

fn bicubic(src: &ArgbImage, s: f64, out: &mut ArgbImage) {
    let w = src.width as i64;
    let h = src.height as i64;

    // Clamped source columns and x weights per output column.
    let columns: Vec<([usize; 4], [f64; 4])> = (0..out.width)
        .map(|x| {
            let u = x as f64 / s;
            let xg = u as i64;
            let xs = [0, 1, 2, 3].map(|j| (xg + j - 1).clamp(0, w - 1) as usize);
            (xs, weights(u - xg as f64))
        })
        .collect();

    out.pixels
        .par_chunks_mut(out.width as usize)
        .enumerate()
        .for_each(|(y, row)| {
            let v = y as f64 / s;
            let yg = v as i64;
            let d1 = weights(v - yg as f64);
            let rows = [0, 1, 2, 3].map(|i| (yg + i - 1).clamp(0, h - 1) as usize * w as usize);

            for (dst, (xs, d3)) in row.iter_mut().zip(&columns) {
                // Per channel 4x4 neighbourhoods, indexed [channel][i][j].
                let mut p = [[[0.0f64; 4]; 4]; 4];
                for (i, &ry) in rows.iter().enumerate() {
                    for (j, &cx) in xs.iter().enumerate() {
                        let px = channels(src.pixels[ry + cx]);
                        for k in 0..4 {
                            p[k][i][j] = px[k] as f64;
                        }
                    }
                }
                *dst = argb(
                    bicubic_dot(&d1, &p[0], d3),
                    bicubic_dot(&d1, &p[1], d3),
                    bicubic_dot(&d1, &p[2], d3),
                    bicubic_dot(&d1, &p[3], d3),
                );
            }
        });
}
