//! Canvas allocation and slice compositing
//!
//! The compositor owns the destination buffer for the whole assembly: slices
//! are placed top to bottom at `viewport_height * i * scale`, each placement
//! an opaque overwrite. When no height limiting occurred, the final slice is
//! first cropped to the bottom `remainder * scale` rows — the last scroll
//! step cannot move past the page bottom, so the tail capture re-shows rows
//! the previous slice already drew. When limiting did occur the canvas is
//! sized to be filled by uncropped slices and the bottom edge simply clips.

use crate::geometry::PageMetrics;
use crate::{Error, Result};
use image::{imageops, ImageFormat, Rgba, RgbaImage};
use std::io::Cursor;
use std::path::Path;

/// Leading bytes of every PNG artifact this crate writes
pub const PNG_SIGNATURE: [u8; 8] = [0x89, b'P', b'N', b'G', 0x0d, 0x0a, 0x1a, 0x0a];

const CANVAS_BACKGROUND: Rgba<u8> = Rgba([255, 255, 255, 255]);

/// Decode one viewport capture (PNG bytes) into an RGBA buffer.
pub fn decode_capture(bytes: &[u8]) -> Result<RgbaImage> {
    Ok(image::load_from_memory_with_format(bytes, ImageFormat::Png)?.to_rgba8())
}

/// Allocate the destination canvas: opaque white, alpha-capable.
pub fn blank_canvas(width: u32, height: u32) -> RgbaImage {
    RgbaImage::from_pixel(width, height, CANVAS_BACKGROUND)
}

/// Crop a slice to its bottom `crop_height` rows, full width.
pub fn crop_bottom(slice: &RgbaImage, crop_height: u32) -> RgbaImage {
    let crop_height = crop_height.min(slice.height());
    let top = slice.height() - crop_height;
    imageops::crop_imm(slice, 0, top, slice.width(), crop_height).to_image()
}

/// Composite decoded slices onto a fresh canvas per the metrics.
pub fn stitch(slices: &[RgbaImage], metrics: &PageMetrics) -> Result<RgbaImage> {
    let width = slices
        .first()
        .map(|s| s.width())
        .ok_or_else(|| Error::Image("no captures to stitch".to_string()))?;

    let mut canvas = blank_canvas(width, metrics.canvas_height());

    for (i, slice) in slices.iter().enumerate() {
        let offset = i64::from(metrics.offset_for(i as u32));
        let is_last = i + 1 == slices.len();

        if is_last && !metrics.clamped {
            let tail = crop_bottom(slice, metrics.crop_height());
            if tail.height() > 0 {
                imageops::replace(&mut canvas, &tail, 0, offset);
            }
        } else {
            imageops::replace(&mut canvas, slice, 0, offset);
        }
    }

    Ok(canvas)
}

/// Encode the canvas as PNG bytes.
pub fn encode_png(canvas: &RgbaImage) -> Result<Vec<u8>> {
    let mut out = Cursor::new(Vec::new());
    canvas.write_to(&mut out, ImageFormat::Png)?;
    Ok(out.into_inner())
}

/// Write the canvas to `path` as PNG regardless of the path's extension.
pub fn write_png<P: AsRef<Path>>(canvas: &RgbaImage, path: P) -> Result<()> {
    canvas.save_with_format(path, ImageFormat::Png)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    // A tiny slice whose rows are solid colors, top to bottom.
    fn slice_of_rows(width: u32, rows: &[u8]) -> RgbaImage {
        let mut img = RgbaImage::new(width, rows.len() as u32);
        for (y, level) in rows.iter().enumerate() {
            for x in 0..width {
                img.put_pixel(x, y as u32, Rgba([*level, 0, 0, 255]));
            }
        }
        img
    }

    fn row_level(img: &RgbaImage, y: u32) -> u8 {
        img.get_pixel(0, y)[0]
    }

    #[test]
    fn blank_canvas_is_opaque_white() {
        let canvas = blank_canvas(3, 2);
        assert_eq!(canvas.dimensions(), (3, 2));
        for p in canvas.pixels() {
            assert_eq!(*p, Rgba([255, 255, 255, 255]));
        }
    }

    #[test]
    fn crop_bottom_keeps_the_tail_rows() {
        let slice = slice_of_rows(2, &[10, 20, 30, 40]);
        let tail = crop_bottom(&slice, 1);
        assert_eq!(tail.dimensions(), (2, 1));
        assert_eq!(row_level(&tail, 0), 40);
    }

    #[test]
    fn crop_bottom_larger_than_slice_is_the_whole_slice() {
        let slice = slice_of_rows(2, &[10, 20]);
        let tail = crop_bottom(&slice, 5);
        assert_eq!(tail.height(), 2);
    }

    #[test]
    fn final_slice_is_cropped_when_not_clamped() {
        // viewport 2, page 3: two captures, the second taken at the page
        // bottom so it re-shows row B.
        let metrics = PageMetrics::from_raw(2, 3, 1, None, 65500);
        assert_eq!(metrics.slices, 1);
        assert_eq!(metrics.remainder, 1);

        let top = slice_of_rows(2, &[1, 2]);
        let bottom = slice_of_rows(2, &[2, 3]);
        let canvas = stitch(&[top, bottom], &metrics).unwrap();

        assert_eq!(canvas.dimensions(), (2, 3));
        assert_eq!(row_level(&canvas, 0), 1);
        assert_eq!(row_level(&canvas, 1), 2);
        assert_eq!(row_level(&canvas, 2), 3);
    }

    #[test]
    fn final_slice_is_placed_uncropped_when_clamped() {
        // viewport 2, natural 5, limit 3: the canvas is exactly filled by
        // uncropped slices and the bottom edge clips the second one.
        let metrics = PageMetrics::from_raw(2, 5, 1, Some(3), 65500);
        assert!(metrics.clamped);
        assert_eq!(metrics.slices, 1);

        let top = slice_of_rows(2, &[1, 2]);
        let next = slice_of_rows(2, &[3, 4]);
        let canvas = stitch(&[top, next], &metrics).unwrap();

        assert_eq!(canvas.dimensions(), (2, 3));
        assert_eq!(row_level(&canvas, 0), 1);
        assert_eq!(row_level(&canvas, 1), 2);
        assert_eq!(row_level(&canvas, 2), 3);
    }

    #[test]
    fn zero_remainder_crop_places_nothing() {
        // viewport 2, page 4: three captures, the last crops to zero rows
        // and must not disturb what slice 1 already placed.
        let metrics = PageMetrics::from_raw(2, 4, 1, None, 65500);
        assert_eq!(metrics.captures(), 3);

        let a = slice_of_rows(2, &[1, 2]);
        let b = slice_of_rows(2, &[3, 4]);
        let dup = slice_of_rows(2, &[3, 4]);
        let canvas = stitch(&[a, b, dup], &metrics).unwrap();

        assert_eq!(canvas.dimensions(), (2, 4));
        assert_eq!(row_level(&canvas, 2), 3);
        assert_eq!(row_level(&canvas, 3), 4);
    }

    #[test]
    fn stitching_nothing_is_an_error() {
        let metrics = PageMetrics::from_raw(2, 4, 1, None, 65500);
        assert!(stitch(&[], &metrics).is_err());
    }

    #[test]
    fn encoded_canvas_starts_with_png_signature() {
        let canvas = blank_canvas(4, 4);
        let bytes = encode_png(&canvas).unwrap();
        assert_eq!(&bytes[0..8], &PNG_SIGNATURE);
    }
}
