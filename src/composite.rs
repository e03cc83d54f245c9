use crate::raster::{ArgbImage, WHITE};

/// Concatenate the shown images left to right into one raster.
///
/// The result is as wide as all inputs together and as tall as the tallest.
/// Shorter images are centred vertically; the bands above and below them are
/// opaque white. With `right_binding` the input order is reversed, so the
/// first playlist image ends up on the right.
pub fn compose(images: &[ArgbImage], right_binding: bool) -> ArgbImage {
    let width: u32 = images.iter().map(|i| i.width).sum();
    let height = images.iter().map(|i| i.height).max().unwrap_or(0);
    if width == 0 || height == 0 {
        return ArgbImage::new(width, height);
    }

    let mut order: Vec<&ArgbImage> = images.iter().collect();
    if right_binding {
        order.reverse();
    }

    let mut out = ArgbImage::filled(width, height, WHITE);
    let stride = width as usize;
    let mut x0 = 0usize;
    for img in order {
        let w = img.width as usize;
        if w == 0 {
            continue;
        }
        let top = ((height - img.height) / 2) as usize;
        for y in 0..img.height as usize {
            let dst = (top + y) * stride + x0;
            out.pixels[dst..dst + w].copy_from_slice(&img.pixels[y * w..(y + 1) * w]);
        }
        x0 += w;
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn solid(w: u32, h: u32, c: u32) -> ArgbImage {
        ArgbImage::filled(w, h, c)
    }

    #[test]
    fn single_image_is_copied() {
        let img = ArgbImage::from_pixels(2, 2, vec![1, 2, 3, 4]).unwrap();
        assert_eq!(compose(&[img.clone()], false), img);
        assert_eq!(compose(&[img.clone()], true), img);
    }

    #[test]
    fn columns_follow_binding_order() {
        let a = solid(3, 2, 0xFF00_0001);
        let b = solid(2, 2, 0xFF00_0002);

        let left = compose(&[a.clone(), b.clone()], false);
        assert_eq!(left.size(), (5, 2));
        for y in 0..2 {
            for x in 0..3 {
                assert_eq!(left.pixel(x, y), 0xFF00_0001);
            }
            for x in 3..5 {
                assert_eq!(left.pixel(x, y), 0xFF00_0002);
            }
        }

        let right = compose(&[a, b], true);
        for y in 0..2 {
            for x in 0..2 {
                assert_eq!(right.pixel(x, y), 0xFF00_0002);
            }
            for x in 2..5 {
                assert_eq!(right.pixel(x, y), 0xFF00_0001);
            }
        }
    }

    #[test]
    fn shorter_image_is_centred_on_white() {
        let tall = solid(2, 60, 0xFF11_1111);
        let short = solid(3, 40, 0xFF22_2222);
        let c = compose(&[short, tall], false);
        assert_eq!(c.size(), (5, 60));
        for x in 0..3 {
            for y in 0..10 {
                assert_eq!(c.pixel(x, y), WHITE);
            }
            for y in 10..50 {
                assert_eq!(c.pixel(x, y), 0xFF22_2222);
            }
            for y in 50..60 {
                assert_eq!(c.pixel(x, y), WHITE);
            }
        }
        for y in 0..60 {
            assert_eq!(c.pixel(4, y), 0xFF11_1111);
        }
    }

    #[test]
    fn odd_margin_puts_extra_row_at_bottom() {
        let c = compose(&[solid(1, 4, 7), solid(1, 1, 9)], false);
        let column: Vec<u32> = (0..4).map(|y| c.pixel(1, y)).collect();
        assert_eq!(column, vec![WHITE, 9, WHITE, WHITE]);
    }

    #[test]
    fn empty_slots_take_no_width() {
        let a = solid(2, 3, 5);
        let c = compose(&[ArgbImage::empty(), a.clone()], false);
        assert_eq!(c, a);
        assert!(compose(&[ArgbImage::empty(), ArgbImage::empty()], false).is_empty());
        assert!(compose(&[], false).is_empty());
    }
}
