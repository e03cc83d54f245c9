use folio::raster::{ArgbImage, channels};

// Constants
pub const BG_COLOR: [u8; 4] = [31, 31, 31, 255]; // ~0.12 * 255

/// Pack RGB into softbuffer u32 format: 0x00RRGGBB.
pub fn rgb(r: u8, g: u8, b: u8) -> u32 {
    (r as u32) << 16 | (g as u32) << 8 | b as u32
}

/// Unpack softbuffer u32 into (r, g, b).
fn unpack_rgb(v: u32) -> (u8, u8, u8) {
    ((v >> 16) as u8, (v >> 8) as u8, v as u8)
}

/// Copy `src` into the framebuffer with its top-left corner at `(x0, y0)`,
/// blending translucent pixels over what is already there. Parts outside
/// the framebuffer are clipped.
pub fn blit_argb(dst: &mut [u32], dst_w: u32, dst_h: u32, src: &ArgbImage, x0: i32, y0: i32) {
    let dx_start = x0.max(0) as u32;
    let dy_start = y0.max(0) as u32;
    let dx_end = (x0 as i64 + src.width as i64).clamp(0, dst_w as i64) as u32;
    let dy_end = (y0 as i64 + src.height as i64).clamp(0, dst_h as i64) as u32;

    for dy in dy_start..dy_end {
        let sy = (dy as i64 - y0 as i64) as u32;
        let src_row = src.row(sy);
        for dx in dx_start..dx_end {
            let sx = (dx as i64 - x0 as i64) as usize;
            let di = dy as usize * dst_w as usize + dx as usize;

            let [a, r, g, b] = channels(src_row[sx]);
            let sa = a as u32;
            if sa == 255 {
                dst[di] = rgb(r, g, b);
            } else if sa > 0 {
                let inv = 255 - sa;
                let (dr, dg, db) = unpack_rgb(dst[di]);
                let r = ((r as u32 * sa + dr as u32 * inv) / 255) as u8;
                let g = ((g as u32 * sa + dg as u32 * inv) / 255) as u8;
                let b = ((b as u32 * sa + db as u32 * inv) / 255) as u8;
                dst[di] = rgb(r, g, b);
            }
        }
    }
}
