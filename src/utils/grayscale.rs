/// Frame to luminance reduction.
///
/// NV21 and gray frames already carry luminance in their leading plane, so
/// those paths are row copies of the crop region. RGB/RGBA frames use
/// Y = 0.299*R + 0.587*G + 0.114*B in fast integer form,
/// Y = (76*R + 150*G + 29*B) >> 8, rows processed in parallel.
use crate::models::{CropRect, Frame, PixelFormat};
use image::GrayImage;
use rayon::prelude::*;

/// Coefficients for grayscale conversion: Y = (76*R + 150*G + 29*B) >> 8
const COEF_R: i32 = 76;
const COEF_G: i32 = 150;
const COEF_B: i32 = 29;

#[inline]
fn luma(r: u8, g: u8, b: u8) -> u8 {
    let lum = (COEF_R * r as i32 + COEF_G * g as i32 + COEF_B * b as i32) >> 8;
    lum.min(255) as u8
}

/// Reduce a frame to the cropped grayscale image the worker analyzes
pub fn frame_to_gray(frame: &Frame) -> GrayImage {
    let region = frame.region();
    let src_width = frame.width() as usize;
    let pixels = frame.pixels();

    match frame.format() {
        PixelFormat::Nv21 | PixelFormat::Gray => copy_luma_plane(pixels, src_width, region),
        PixelFormat::Rgb => packed_to_gray(pixels, src_width, region, 3),
        PixelFormat::Rgba => packed_to_gray(pixels, src_width, region, 4),
    }
}

fn copy_luma_plane(plane: &[u8], src_width: usize, region: CropRect) -> GrayImage {
    let mut gray = GrayImage::new(region.width, region.height);
    let width = region.width as usize;
    let left = region.left as usize;
    let top = region.top as usize;

    let out: &mut [u8] = &mut gray;
    for (y, row) in out.chunks_exact_mut(width).enumerate() {
        let start = (top + y) * src_width + left;
        row.copy_from_slice(&plane[start..start + width]);
    }

    gray
}

/// Convert packed RGB/RGBA to grayscale using parallel processing
/// Processes rows in parallel for multi-core speedup
fn packed_to_gray(packed: &[u8], src_width: usize, region: CropRect, bpp: usize) -> GrayImage {
    let mut gray = GrayImage::new(region.width, region.height);
    let width = region.width as usize;
    let left = region.left as usize;
    let top = region.top as usize;

    let out: &mut [u8] = &mut gray;
    out.par_chunks_mut(width).enumerate().for_each(|(y, row)| {
        let row_start = ((top + y) * src_width + left) * bpp;
        for (x, dst) in row.iter_mut().enumerate() {
            let idx = row_start + x * bpp;
            *dst = luma(packed[idx], packed[idx + 1], packed[idx + 2]);
        }
    });

    gray
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rgb_to_grayscale() {
        // white, black, red, green
        let rgb = vec![255, 255, 255, 0, 0, 0, 255, 0, 0, 0, 255, 0];
        let frame = Frame::new(rgb, PixelFormat::Rgb, 2, 2).unwrap();
        let gray = frame_to_gray(&frame);
        assert_eq!(gray.dimensions(), (2, 2));
        assert!(gray.get_pixel(0, 0)[0] >= 254);
        assert_eq!(gray.get_pixel(1, 0)[0], 0);
        let red = gray.get_pixel(0, 1)[0];
        assert!(red > 0 && red < 255);
        assert!(gray.get_pixel(1, 1)[0] > 100);
    }

    #[test]
    fn test_rgba_ignores_alpha() {
        let rgba = vec![255, 128, 64, 0, 255, 128, 64, 255];
        let frame = Frame::new(rgba, PixelFormat::Rgba, 2, 1).unwrap();
        let gray = frame_to_gray(&frame);
        assert_eq!(gray.get_pixel(0, 0), gray.get_pixel(1, 0));
    }

    #[test]
    fn test_nv21_crop_reads_luma_plane() {
        // 4x4 luma plane with values 0..16, followed by a 4x2 VU plane
        let mut nv21: Vec<u8> = (0..16).collect();
        nv21.extend(std::iter::repeat_n(128u8, 8));
        let frame = Frame::copy_from(&nv21, PixelFormat::Nv21, 4, 4)
            .unwrap()
            .with_crop(CropRect::new(1, 2, 2, 2))
            .unwrap();

        let gray = frame_to_gray(&frame);
        assert_eq!(gray.dimensions(), (2, 2));
        assert_eq!(gray.as_raw(), &vec![9, 10, 13, 14]);
    }

    #[test]
    fn test_rgb_crop() {
        let mut rgb = vec![0u8; 3 * 3 * 3];
        // pixel (2, 1) white
        let idx = (3 + 2) * 3;
        rgb[idx..idx + 3].copy_from_slice(&[255, 255, 255]);
        let frame = Frame::new(rgb, PixelFormat::Rgb, 3, 3)
            .unwrap()
            .with_crop(CropRect::new(1, 1, 2, 2))
            .unwrap();
        let gray = frame_to_gray(&frame);
        assert!(gray.get_pixel(1, 0)[0] >= 254);
        assert_eq!(gray.get_pixel(0, 0)[0], 0);
    }
}
