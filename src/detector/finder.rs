/// Finder pattern detection using 1:1:3:1:1 ratio scanning with early termination optimizations
use crate::models::Point;
use image::GrayImage;

/// Binarized pixels below this are treated as black
const DARK_LEVEL: u8 = 128;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FinderPattern {
    pub center: Point,
    pub module_size: f32,
    /// Number of scanlines that hit this pattern
    pub hits: usize,
}

impl FinderPattern {
    pub fn new(x: f32, y: f32, module_size: f32) -> Self {
        Self {
            center: Point::new(x, y),
            module_size,
            hits: 1,
        }
    }
}

pub struct FinderDetector;

impl FinderDetector {
    /// Scan a binarized image (0 = black, 255 = white) for finder patterns
    pub fn detect(binary: &GrayImage) -> Vec<FinderPattern> {
        let (width, height) = binary.dimensions();
        let mut candidates = Vec::new();
        if width == 0 {
            return candidates;
        }

        for y in 0..height {
            // Early termination 1: Skip rows with low variance (no edges)
            if !Self::has_significant_edges(binary, y, width) {
                continue;
            }

            candidates.extend(Self::scan_row(binary, y, width));
        }

        Self::merge_candidates(candidates)
    }

    #[inline]
    fn is_dark(binary: &GrayImage, x: u32, y: u32) -> bool {
        binary.get_pixel(x, y)[0] < DARK_LEVEL
    }

    /// Check if row has enough edge transitions to potentially contain patterns
    fn has_significant_edges(binary: &GrayImage, y: u32, width: u32) -> bool {
        // Sample every 4th pixel to check for edges quickly
        let mut transitions = 0;
        let mut prev_color = Self::is_dark(binary, 0, y);

        for x in (4..width).step_by(4) {
            let color = Self::is_dark(binary, x, y);
            if color != prev_color {
                transitions += 1;
                prev_color = color;

                if transitions >= 3 {
                    return true;
                }
            }
        }

        // Require at least 2 transitions for a row to be considered
        transitions >= 2
    }

    fn scan_row(binary: &GrayImage, y: u32, width: u32) -> Vec<FinderPattern> {
        let mut candidates = Vec::new();
        let mut run_lengths: Vec<usize> = Vec::new();
        let mut run_colors: Vec<bool> = Vec::new();
        let mut run_start = 0u32;
        let mut current_color = Self::is_dark(binary, 0, y);

        // Early termination 2: Max patterns per row
        const MAX_PATTERNS_PER_ROW: usize = 5;

        // x == width closes the final run
        for x in 1..=width {
            let color = if x < width {
                Self::is_dark(binary, x, y)
            } else {
                !current_color
            };
            if color == current_color {
                continue;
            }

            run_lengths.push((x - run_start) as usize);
            run_colors.push(current_color);
            run_start = x;
            current_color = color;

            if run_colors.len() < 5 {
                continue;
            }
            let end_idx = run_colors.len();
            let colors = &run_colors[end_idx - 5..end_idx];
            let lengths = &run_lengths[end_idx - 5..end_idx];

            // Pattern should be: black-white-black-white-black
            if colors[0] && !colors[1] && colors[2] && !colors[3] && colors[4] {
                if !Self::quick_ratio_check(lengths) {
                    continue;
                }
                if let Some(pattern) = Self::check_pattern(lengths, x as usize, y as usize) {
                    candidates.push(pattern);

                    if candidates.len() >= MAX_PATTERNS_PER_ROW {
                        break;
                    }
                }
            }
        }

        candidates
    }

    /// Quick ratio validation - rough check before expensive floating-point math
    fn quick_ratio_check(lengths: &[usize]) -> bool {
        let b1 = lengths[0];
        let w1 = lengths[1];
        let b2 = lengths[2];
        let w2 = lengths[3];
        let b3 = lengths[4];

        let total = b1 + w1 + b2 + w2 + b3;

        if total < 21 {
            // Minimum 7 modules at 3 pixels each
            return false;
        }

        // b2 should be roughly 2-4x larger than b1 and b3
        let b2_min = b1.min(b3);
        if b2 < b2_min * 2 || b2 > b2_min * 5 {
            return false;
        }

        // Check whites are roughly equal and similar to outer blacks
        let outer_avg = (b1 + b3 + w1 + w2) / 4;
        let w1_ok = w1 >= outer_avg / 2 && w1 <= outer_avg * 2;
        let w2_ok = w2 >= outer_avg / 2 && w2 <= outer_avg * 2;

        w1_ok && w2_ok
    }

    fn check_pattern(lengths: &[usize], end_x: usize, y: usize) -> Option<FinderPattern> {
        if lengths.len() != 5 {
            return None;
        }

        let total = lengths.iter().sum::<usize>() as f32;
        let unit = total / 7.0;
        let expected = [1.0, 1.0, 3.0, 1.0, 1.0];

        const TOL: f32 = 0.5;
        let fits = lengths
            .iter()
            .zip(expected)
            .all(|(&len, ratio)| (len as f32 / unit - ratio).abs() <= TOL);
        if !fits {
            return None;
        }

        let (b2, w2, b3) = (lengths[2] as f32, lengths[3] as f32, lengths[4] as f32);
        let center_x = end_x as f32 - b3 - w2 - b2 / 2.0;
        Some(FinderPattern::new(center_x, y as f32 + 0.5, unit))
    }

    /// Cluster row hits into pattern centers (hit-weighted running mean)
    fn merge_candidates(candidates: Vec<FinderPattern>) -> Vec<FinderPattern> {
        let mut merged: Vec<FinderPattern> = Vec::new();

        for candidate in candidates {
            let existing = merged.iter_mut().find(|existing| {
                let reach = (existing.module_size * 2.5).max(5.0);
                existing.center.distance(&candidate.center) < reach
            });

            match existing {
                Some(existing) => {
                    let n = existing.hits as f32;
                    let k = n + 1.0;
                    existing.center = Point::new(
                        (existing.center.x * n + candidate.center.x) / k,
                        (existing.center.y * n + candidate.center.y) / k,
                    );
                    existing.module_size = (existing.module_size * n + candidate.module_size) / k;
                    existing.hits += 1;
                }
                None => merged.push(candidate),
            }
        }

        merged
    }
}
