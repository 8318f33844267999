use super::finder::{FinderDetector, FinderPattern};
use crate::engine::RegionLocator;
use crate::error::EngineError;
use crate::models::{Point, Rect};
use crate::utils::binarization::otsu_binarize;
use image::GrayImage;

/// Only the strongest candidates take part in triple search
const MAX_CANDIDATES: usize = 24;

/// Locates a QR-shaped region from its three finder patterns.
///
/// Nothing is decoded: the result is the padded bounding box of the best
/// finder triple, for hosts that want to steer the user toward a code.
#[derive(Debug, Clone)]
pub struct FinderRegionLocator {
    /// Binarization level used when Otsu cannot split the histogram
    pub fallback_level: u8,
    /// Minimum scanline hits per pattern, in module sizes
    pub min_hits_per_module: f32,
}

impl Default for FinderRegionLocator {
    fn default() -> Self {
        Self {
            fallback_level: 128,
            min_hits_per_module: 1.5,
        }
    }
}

impl FinderRegionLocator {
    /// Bounding rect of the best finder triple in `gray`, if any
    pub fn find(&self, gray: &GrayImage) -> Option<Rect> {
        let binary = otsu_binarize(gray, self.fallback_level);
        let mut patterns: Vec<FinderPattern> = FinderDetector::detect(&binary)
            .into_iter()
            .filter(|p| p.hits as f32 >= p.module_size * self.min_hits_per_module)
            .collect();
        patterns.sort_by(|a, b| b.hits.cmp(&a.hits));
        patterns.truncate(MAX_CANDIDATES);

        let [tl, tr, bl] = best_triple(&patterns)?;
        let module = (tl.module_size + tr.module_size + bl.module_size) / 3.0;
        let br = Point::new(
            tr.center.x + bl.center.x - tl.center.x,
            tr.center.y + bl.center.y - tl.center.y,
        );
        let corners = [tl.center, tr.center, bl.center, br];
        Some(padded_bounds(&corners, module * 3.5, gray.dimensions()))
    }
}

impl RegionLocator for FinderRegionLocator {
    fn locate(&mut self, image: &GrayImage) -> Result<Option<Rect>, EngineError> {
        Ok(self.find(image))
    }
}

/// Lowest-scoring valid triple, ordered (right-angle corner, then the others)
fn best_triple(patterns: &[FinderPattern]) -> Option<[FinderPattern; 3]> {
    let mut best: Option<(f32, [FinderPattern; 3])> = None;

    for i in 0..patterns.len() {
        for j in (i + 1)..patterns.len() {
            for k in (j + 1)..patterns.len() {
                let Some((score, ordered)) = score_triple(&patterns[i], &patterns[j], &patterns[k])
                else {
                    continue;
                };
                if best.as_ref().is_none_or(|(s, _)| score < *s) {
                    best = Some((score, ordered));
                }
            }
        }
    }

    best.map(|(_, triple)| triple)
}

/// Lower is better. `None` when the three points cannot be one code.
fn score_triple(
    a: &FinderPattern,
    b: &FinderPattern,
    c: &FinderPattern,
) -> Option<(f32, [FinderPattern; 3])> {
    let sizes = [a.module_size, b.module_size, c.module_size];
    let min_size = sizes.iter().fold(f32::INFINITY, |m, &s| m.min(s));
    let max_size = sizes.iter().fold(0.0f32, |m, &s| m.max(s));
    if min_size <= 0.0 {
        return None;
    }
    let size_ratio = max_size / min_size;
    if size_ratio > 2.0 {
        return None;
    }

    let d_ab = a.center.distance(&b.center);
    let d_ac = a.center.distance(&c.center);
    let d_bc = b.center.distance(&c.center);
    let min_d = d_ab.min(d_ac).min(d_bc);
    let max_d = d_ab.max(d_ac).max(d_bc);

    let avg_module = (a.module_size + b.module_size + c.module_size) / 3.0;
    // finder centers of the smallest code are 14 modules apart
    if min_d < avg_module * 7.0 {
        return None;
    }
    let distortion = max_d / min_d;
    if distortion > 5.0 {
        return None;
    }

    // cosine at each vertex; the right-angle vertex is the top-left pattern
    let cos_at = |p: &Point, q: &Point, r: &Point| {
        let (v1x, v1y) = (q.x - p.x, q.y - p.y);
        let (v2x, v2y) = (r.x - p.x, r.y - p.y);
        let denom = (v1x * v1x + v1y * v1y).sqrt() * (v2x * v2x + v2y * v2y).sqrt();
        ((v1x * v2x + v1y * v2y) / denom).abs()
    };
    let cos = [
        cos_at(&a.center, &b.center, &c.center),
        cos_at(&b.center, &a.center, &c.center),
        cos_at(&c.center, &a.center, &b.center),
    ];
    let (corner, best_cos) = cos
        .iter()
        .copied()
        .enumerate()
        .fold((0, f32::INFINITY), |best, (i, v)| if v < best.1 { (i, v) } else { best });
    if best_cos >= 0.4 {
        return None;
    }

    let ordered = match corner {
        0 => [*a, *b, *c],
        1 => [*b, *a, *c],
        _ => [*c, *a, *b],
    };
    Some((size_ratio * 2.0 + distortion + best_cos, ordered))
}

fn padded_bounds(points: &[Point], pad: f32, (width, height): (u32, u32)) -> Rect {
    let min_x = points.iter().fold(f32::INFINITY, |m, p| m.min(p.x)) - pad;
    let max_x = points.iter().fold(f32::NEG_INFINITY, |m, p| m.max(p.x)) + pad;
    let min_y = points.iter().fold(f32::INFINITY, |m, p| m.min(p.y)) - pad;
    let max_y = points.iter().fold(f32::NEG_INFINITY, |m, p| m.max(p.y)) + pad;

    let x0 = min_x.clamp(0.0, width as f32) as u32;
    let y0 = min_y.clamp(0.0, height as f32) as u32;
    let x1 = max_x.clamp(0.0, width as f32) as u32;
    let y1 = max_y.clamp(0.0, height as f32) as u32;
    Rect::new(x0, y0, x1.saturating_sub(x0), y1.saturating_sub(y0))
}
