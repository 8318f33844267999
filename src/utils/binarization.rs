//! Grayscale thresholding primitives.
//!
//! All functions return a new `GrayImage` holding only 0 (black) and
//! 255 (white), which is the form the matrix decoder expects.

use image::GrayImage;

const BLACK: u8 = 0;
const WHITE: u8 = 255;

/// Binarize with Otsu's method. Pixels below the Otsu level become black.
///
/// `fallback` is used when the histogram cannot be split into two classes
/// (e.g. a single intensity).
pub fn otsu_binarize(gray: &GrayImage, fallback: u8) -> GrayImage {
    let threshold = otsu_level(gray.as_raw()).unwrap_or(fallback);
    threshold_binarize(gray, threshold)
}

/// Calculate Otsu's optimal threshold, or `None` for a single-class histogram
pub fn otsu_level(gray: &[u8]) -> Option<u8> {
    // Build histogram
    let mut histogram = [0u64; 256];
    for &pixel in gray {
        histogram[pixel as usize] += 1;
    }

    let total_pixels = gray.len() as f64;
    let total_sum: u64 = histogram
        .iter()
        .enumerate()
        .map(|(i, &c)| i as u64 * c)
        .sum();

    let mut max_variance = 0.0;
    let mut optimal_threshold = None;
    let mut class1_pixels = 0u64;
    let mut class1_sum = 0u64;

    // class1 = intensities strictly below `threshold`
    for threshold in 1..=255usize {
        class1_pixels += histogram[threshold - 1];
        class1_sum += (threshold as u64 - 1) * histogram[threshold - 1];
        let class2_pixels = gray.len() as u64 - class1_pixels;

        if class1_pixels == 0 || class2_pixels == 0 {
            continue;
        }

        let class1_mean = class1_sum as f64 / class1_pixels as f64;
        let class2_mean = (total_sum - class1_sum) as f64 / class2_pixels as f64;

        let weight1 = class1_pixels as f64 / total_pixels;
        let weight2 = class2_pixels as f64 / total_pixels;

        let variance = weight1 * weight2 * (class1_mean - class2_mean).powi(2);

        if variance > max_variance {
            max_variance = variance;
            optimal_threshold = Some(threshold as u8);
        }
    }

    optimal_threshold
}

/// Simple global threshold binarization
pub fn threshold_binarize(gray: &GrayImage, threshold: u8) -> GrayImage {
    let mut binary = gray.clone();
    for pixel in binary.iter_mut() {
        *pixel = if *pixel < threshold { BLACK } else { WHITE };
    }
    binary
}

/// Local mean thresholding.
///
/// A pixel becomes white iff it is brighter than the mean of the
/// `block_size x block_size` window centred on it minus `offset`. Windows
/// that overhang the image repeat the nearest edge pixel, so every mean is
/// taken over the full block. `block_size` is expected to be odd.
pub fn adaptive_mean_binarize(gray: &GrayImage, block_size: u32, offset: i32) -> GrayImage {
    let (width, height) = gray.dimensions();
    if width == 0 || height == 0 {
        return gray.clone();
    }
    let (w, h) = (width as usize, height as usize);
    let block = block_size.max(1) as usize;
    let radius = block / 2;

    let padded_width = w + 2 * radius;
    let padded = replicate_border(gray.as_raw(), w, h, radius);
    let integral = integral_image(&padded, padded_width, h + 2 * radius);
    let stride = padded_width + 1;
    let area = (block * block) as i64;
    let offset = offset as i64 * area;

    let mut binary = GrayImage::new(width, height);
    let src = gray.as_raw();
    let out: &mut [u8] = &mut binary;

    for y in 0..h {
        // padded rows y..y + block hold the window centred on source row y
        let top = y * stride;
        let bottom = (y + block) * stride;
        for x in 0..w {
            let sum = (integral[bottom + x + block] + integral[top + x]
                - integral[top + x + block]
                - integral[bottom + x]) as i64;

            // value > sum / area - offset, kept in integers
            let idx = y * w + x;
            out[idx] = if src[idx] as i64 * area > sum - offset {
                WHITE
            } else {
                BLACK
            };
        }
    }

    binary
}

/// Copy of `gray` grown by `pad` pixels on every side, repeating edge pixels
fn replicate_border(gray: &[u8], width: usize, height: usize, pad: usize) -> Vec<u8> {
    let padded_width = width + 2 * pad;
    let mut padded = Vec::with_capacity(padded_width * (height + 2 * pad));
    for py in 0..height + 2 * pad {
        let y = py.saturating_sub(pad).min(height - 1);
        let row = &gray[y * width..(y + 1) * width];
        padded.extend(std::iter::repeat_n(row[0], pad));
        padded.extend_from_slice(row);
        padded.extend(std::iter::repeat_n(row[width - 1], pad));
    }
    padded
}

/// Summed-area table with a zero top row and left column
fn integral_image(gray: &[u8], width: usize, height: usize) -> Vec<u64> {
    let stride = width + 1;
    let mut integral = vec![0u64; stride * (height + 1)];
    for y in 0..height {
        let mut row_sum = 0u64;
        for x in 0..width {
            row_sum += gray[y * width + x] as u64;
            integral[(y + 1) * stride + x + 1] = integral[y * stride + x + 1] + row_sum;
        }
    }
    integral
}

#[cfg(test)]
mod tests {
    use super::*;

    fn image(width: u32, height: u32, pixels: Vec<u8>) -> GrayImage {
        GrayImage::from_raw(width, height, pixels).unwrap()
    }

    #[test]
    fn test_threshold_binarize() {
        let gray = image(2, 2, vec![100, 150, 200, 50]);
        let binary = threshold_binarize(&gray, 128);

        // Pixels < 128 should be black
        assert_eq!(binary.as_raw(), &vec![0, 255, 255, 0]);
    }

    #[test]
    fn test_otsu_binarize() {
        // Create a simple two-class image
        let mut gray = vec![50u8; 50]; // Dark class
        gray.extend(vec![200u8; 50]); // Light class

        let binary = otsu_binarize(&image(10, 10, gray), 128);

        // Top half should be black, bottom half white
        assert_eq!(binary.get_pixel(0, 0)[0], 0);
        assert_eq!(binary.get_pixel(0, 7)[0], 255);
    }

    #[test]
    fn test_otsu_level_single_class() {
        assert_eq!(otsu_level(&[77u8; 64]), None);
        assert_eq!(otsu_level(&[]), None);
    }

    #[test]
    fn test_otsu_flat_image_uses_fallback() {
        let flat = image(4, 4, vec![60u8; 16]);
        // 60 >= fallback 50 -> white everywhere
        let binary = otsu_binarize(&flat, 50);
        assert!(binary.iter().all(|&p| p == 255));
        // 60 < fallback 80 -> black everywhere
        let binary = otsu_binarize(&flat, 80);
        assert!(binary.iter().all(|&p| p == 0));
    }

    #[test]
    fn test_adaptive_uniform_is_white() {
        // value == local mean, and mean - offset < value
        let flat = image(20, 20, vec![90u8; 400]);
        let binary = adaptive_mean_binarize(&flat, 5, 3);
        assert!(binary.iter().all(|&p| p == 255));
    }

    #[test]
    fn test_adaptive_follows_local_contrast() {
        // Left half dim, right half bright; a dark dot in each half.
        let (w, h) = (40u32, 10u32);
        let mut pixels = vec![0u8; (w * h) as usize];
        for y in 0..h {
            for x in 0..w {
                pixels[(y * w + x) as usize] = if x < 20 { 60 } else { 220 };
            }
        }
        pixels[(5 * w + 8) as usize] = 20;
        pixels[(5 * w + 30) as usize] = 160;

        let binary = adaptive_mean_binarize(&image(w, h, pixels), 7, 3);
        assert_eq!(binary.get_pixel(8, 5)[0], 0);
        assert_eq!(binary.get_pixel(30, 5)[0], 0);
        assert_eq!(binary.get_pixel(2, 2)[0], 255);
        assert_eq!(binary.get_pixel(35, 2)[0], 255);
    }

    #[test]
    fn test_adaptive_border_window_repeats_edge() {
        // at x = 0 the window is 60 60 60 66 66, mean 62.4; a shrunken
        // window would see 60 66 66 (mean 64) and turn the pixel black
        let row = image(8, 1, vec![60, 66, 66, 66, 66, 66, 66, 66]);
        let binary = adaptive_mean_binarize(&row, 5, 3);
        assert_eq!(binary.get_pixel(0, 0)[0], 255);
        assert!(binary.iter().all(|&p| p == 255));
    }

    #[test]
    fn test_adaptive_corner_dot_stays_black() {
        let mut pixels = vec![120u8; 16];
        pixels[0] = 0;
        let binary = adaptive_mean_binarize(&image(4, 4, pixels), 3, 3);
        // the dot fills four of the nine replicated samples: mean 66.7
        assert_eq!(binary.get_pixel(0, 0)[0], 0);
        assert_eq!(binary.get_pixel(3, 3)[0], 255);
    }

    #[test]
    fn test_adaptive_empty_image() {
        let empty = GrayImage::new(0, 0);
        assert_eq!(adaptive_mean_binarize(&empty, 55, 3).dimensions(), (0, 0));
    }

    #[test]
    fn test_replicate_border() {
        let padded = replicate_border(&[1, 2, 3, 4], 2, 2, 1);
        assert_eq!(
            padded,
            vec![1, 1, 2, 2, 1, 1, 2, 2, 3, 3, 4, 4, 3, 3, 4, 4]
        );
    }

    #[test]
    fn test_integral_image() {
        let integral = integral_image(&[1, 2, 3, 4], 2, 2);
        // stride 3: [0 0 0 | 0 1 3 | 0 4 10]
        assert_eq!(integral, vec![0, 0, 0, 0, 1, 3, 0, 4, 10]);
    }
}
