//! Synthetic frames and a reference decoder for tests and benchmarks.
//!
//! [`ModuleGrid`] is a deterministic QR-like module layout (three finder
//! patterns plus seeded data modules). [`render`] turns it into a gray frame
//! under a chosen [`Lighting`], and [`GridReader`] is a matrix decoder that
//! "decodes" a frame by sampling module centers against the known layout.

use crate::engine::MatrixDecoder;
use crate::error::EngineError;
use crate::models::{BarcodeFormat, EngineResult, Point};
use image::{GrayImage, Luma};

/// Modules of one finder pattern side
const FINDER_SIDE: usize = 7;

/// Square grid of dark/light modules
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModuleGrid {
    size: usize,
    dark: Vec<bool>,
}

impl ModuleGrid {
    /// Grid of `size x size` modules: finders in three corners, separators
    /// around them, every other module drawn from an LCG seeded with `seed`.
    ///
    /// `size` must be at least 15 so the finders and separators fit.
    pub fn new(size: usize, seed: u64) -> Self {
        let mut state = seed;
        let mut dark = Vec::with_capacity(size * size);
        let origins = [(0, 0), (0, size - FINDER_SIDE), (size - FINDER_SIDE, 0)];

        for row in 0..size {
            for col in 0..size {
                let fixed = origins
                    .iter()
                    .find_map(|&(fr, fc)| finder_module(row, col, fr, fc));
                let module = fixed.unwrap_or_else(|| {
                    state = state
                        .wrapping_mul(6364136223846793005)
                        .wrapping_add(1442695040888963407);
                    (state >> 33) & 1 == 1
                });
                dark.push(module);
            }
        }

        Self { size, dark }
    }

    /// Modules per side
    pub fn size(&self) -> usize {
        self.size
    }

    /// Whether the module at (`row`, `col`) is dark
    pub fn is_dark(&self, row: usize, col: usize) -> bool {
        self.dark[row * self.size + col]
    }

    /// Module under `quarter_turns` of rotation, indexed in the rotated grid
    fn is_dark_rotated(&self, quarter_turns: usize, row: usize, col: usize) -> bool {
        let n = self.size - 1;
        match quarter_turns % 4 {
            0 => self.is_dark(row, col),
            1 => self.is_dark(n - col, row),
            2 => self.is_dark(n - row, n - col),
            _ => self.is_dark(col, n - row),
        }
    }

    /// Center modules of the top-left, top-right and bottom-left finders
    fn finder_centers(&self) -> [(usize, usize); 3] {
        let far = self.size - 4;
        [(3, 3), (3, far), (far, 3)]
    }
}

/// `Some(dark)` when (`row`, `col`) belongs to the finder at (`fr`, `fc`) or
/// its one-module separator
fn finder_module(row: usize, col: usize, fr: usize, fc: usize) -> Option<bool> {
    let (row, col, fr, fc) = (row as isize, col as isize, fr as isize, fc as isize);
    let side = FINDER_SIDE as isize;
    let in_zone = |v: isize, origin: isize| v >= origin - 1 && v <= origin + side;
    if !in_zone(row, fr) || !in_zone(col, fc) {
        return None;
    }
    let (dr, dc) = (row - fr, col - fc);
    if !(0..side).contains(&dr) || !(0..side).contains(&dc) {
        return Some(false);
    }
    let ring = (dr - 3).abs().max((dc - 3).abs());
    Some(ring == 3 || ring <= 1)
}

/// How a rendered frame is lit
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Lighting {
    /// Same light level everywhere; dark modules are `light - contrast`
    Uniform {
        /// Light module level
        light: u8,
        /// Light minus dark
        contrast: u8,
    },
    /// Light level ramps linearly from `left` to `right` across the frame
    Gradient {
        /// Level at the first column
        left: u8,
        /// Level at the last column
        right: u8,
        /// Light minus dark
        contrast: u8,
    },
}

impl Lighting {
    fn light_at(self, x: u32, width: u32) -> u8 {
        match self {
            Lighting::Uniform { light, .. } => light,
            Lighting::Gradient { left, right, .. } => {
                let span = width.saturating_sub(1).max(1) as f64;
                let t = x as f64 / span;
                let level = left as f64 + (right as f64 - left as f64) * t;
                level.round().clamp(0.0, 255.0) as u8
            }
        }
    }

    fn contrast(self) -> u8 {
        match self {
            Lighting::Uniform { contrast, .. } | Lighting::Gradient { contrast, .. } => contrast,
        }
    }
}

/// Layout of a rendered grid: module size and quiet zone, both in pixels
/// and modules respectively
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GridLayout {
    /// Pixels per module side
    pub module_px: u32,
    /// Light modules around the grid
    pub quiet_modules: u32,
}

impl Default for GridLayout {
    fn default() -> Self {
        Self {
            module_px: 8,
            quiet_modules: 4,
        }
    }
}

impl GridLayout {
    /// Side length in pixels of a rendered `grid`
    pub fn side_px(&self, grid: &ModuleGrid) -> u32 {
        (grid.size() as u32 + 2 * self.quiet_modules) * self.module_px
    }

    /// Pixel at the center of module (`row`, `col`), rounded down
    fn sample_at(&self, row: usize, col: usize) -> (u32, u32) {
        let x = (self.quiet_modules + col as u32) * self.module_px + self.module_px / 2;
        let y = (self.quiet_modules + row as u32) * self.module_px + self.module_px / 2;
        (x, y)
    }

    /// Exact center of module (`row`, `col`) in pixel-index coordinates
    fn center_of(&self, row: usize, col: usize) -> Point {
        let half = (self.module_px as f32 - 1.0) / 2.0;
        Point::new(
            ((self.quiet_modules + col as u32) * self.module_px) as f32 + half,
            ((self.quiet_modules + row as u32) * self.module_px) as f32 + half,
        )
    }
}

/// Render `grid` as a square gray frame
pub fn render(grid: &ModuleGrid, layout: GridLayout, lighting: Lighting) -> GrayImage {
    let side = layout.side_px(grid);
    let quiet = layout.quiet_modules as i64;
    let n = grid.size() as i64;
    let contrast = lighting.contrast();

    GrayImage::from_fn(side, side, |x, y| {
        let light = lighting.light_at(x, side);
        let col = (x / layout.module_px) as i64 - quiet;
        let row = (y / layout.module_px) as i64 - quiet;
        let inside = (0..n).contains(&row) && (0..n).contains(&col);
        if inside && grid.is_dark(row as usize, col as usize) {
            Luma([light.saturating_sub(contrast)])
        } else {
            Luma([light])
        }
    })
}

/// Uniform gray frame, e.g. a covered lens
pub fn flat(width: u32, height: u32, level: u8) -> GrayImage {
    GrayImage::from_pixel(width, height, Luma([level]))
}

/// NV21 buffer whose luma plane is `gray` and whose chroma is neutral
pub fn to_nv21(gray: &GrayImage) -> Vec<u8> {
    let (width, height) = gray.dimensions();
    let chroma = (width.div_ceil(2) * height.div_ceil(2) * 2) as usize;
    let mut nv21 = Vec::with_capacity(gray.as_raw().len() + chroma);
    nv21.extend_from_slice(gray.as_raw());
    nv21.resize(nv21.len() + chroma, 128);
    nv21
}

/// Reference decoder for frames produced by [`render`].
///
/// Samples every module center (dark below 128) and compares against the
/// known grid in all four orientations. Succeeds when no more than
/// `tolerance` of the modules disagree, reporting the finder centers of the
/// image it was given.
#[derive(Debug, Clone)]
pub struct GridReader {
    grid: ModuleGrid,
    layout: GridLayout,
    payload: String,
    /// Fraction of modules allowed to disagree
    pub tolerance: f32,
}

impl GridReader {
    /// Reader for `grid` rendered with `layout`, answering with `payload`
    pub fn new(grid: ModuleGrid, layout: GridLayout, payload: impl Into<String>) -> Self {
        Self {
            grid,
            layout,
            payload: payload.into(),
            tolerance: 0.05,
        }
    }

    /// Module disagreements for each quarter-turn orientation
    pub fn mismatches(&self, image: &GrayImage) -> Option<[usize; 4]> {
        let side = self.layout.side_px(&self.grid);
        if image.dimensions() != (side, side) {
            return None;
        }
        let n = self.grid.size();
        let mut counts = [0usize; 4];
        for (turns, count) in counts.iter_mut().enumerate() {
            for row in 0..n {
                for col in 0..n {
                    let (x, y) = self.layout.sample_at(row, col);
                    let sampled_dark = image.get_pixel(x, y)[0] < 128;
                    if sampled_dark != self.grid.is_dark_rotated(turns, row, col) {
                        *count += 1;
                    }
                }
            }
        }
        Some(counts)
    }

    /// Where the grid's finder centers sit under `turns` quarter turns
    fn finder_points(&self, turns: usize) -> Vec<Point> {
        let n = self.grid.size() - 1;
        self.grid
            .finder_centers()
            .iter()
            .map(|&(r, c)| {
                let (row, col) = match turns % 4 {
                    0 => (r, c),
                    1 => (c, n - r),
                    2 => (n - r, n - c),
                    _ => (n - c, r),
                };
                self.layout.center_of(row, col)
            })
            .collect()
    }
}

impl MatrixDecoder for GridReader {
    fn decode(&mut self, image: &GrayImage) -> Result<EngineResult, EngineError> {
        let Some(counts) = self.mismatches(image) else {
            return Ok(EngineResult::not_found());
        };
        let allowed = (self.grid.size() * self.grid.size()) as f32 * self.tolerance;
        let best = counts
            .iter()
            .enumerate()
            .min_by_key(|&(_, &count)| count)
            .filter(|&(_, &count)| count as f32 <= allowed);

        Ok(match best {
            Some((turns, _)) => EngineResult::decoded(
                self.payload.clone(),
                BarcodeFormat::QrCode,
                self.finder_points(turns),
            ),
            None => EngineResult::not_found(),
        })
    }
}
