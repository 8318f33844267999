use crate::error::FrameError;

/// Pixel layout of a camera frame
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PixelFormat {
    /// YUV 4:2:0 semi-planar (Android camera default). Only the leading
    /// luma plane is read; the interleaved VU plane may be omitted.
    Nv21,
    /// 8-bit luminance, one byte per pixel
    Gray,
    /// Packed RGB, 3 bytes per pixel
    Rgb,
    /// Packed RGBA, 4 bytes per pixel (alpha ignored)
    Rgba,
}

impl PixelFormat {
    /// Minimum number of bytes a `width x height` buffer must hold
    pub fn min_len(&self, width: u32, height: u32) -> usize {
        let pixels = width as usize * height as usize;
        match self {
            PixelFormat::Nv21 | PixelFormat::Gray => pixels,
            PixelFormat::Rgb => pixels * 3,
            PixelFormat::Rgba => pixels * 4,
        }
    }
}

/// Region of interest inside a frame, in source pixel coordinates
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CropRect {
    /// Left edge
    pub left: u32,
    /// Top edge
    pub top: u32,
    /// Width
    pub width: u32,
    /// Height
    pub height: u32,
}

impl CropRect {
    /// Create a crop rectangle (not yet clamped)
    pub fn new(left: u32, top: u32, width: u32, height: u32) -> Self {
        Self {
            left,
            top,
            width,
            height,
        }
    }

    /// Fit the crop to a source frame.
    ///
    /// The bottom edge is clamped to the source height, the right edge to the
    /// source width, and if the clamped height ends up below the width the
    /// width is shrunk to match (square-or-narrower region).
    pub fn clamp_to(self, source_width: u32, source_height: u32) -> Result<Self, FrameError> {
        if self.width == 0
            || self.height == 0
            || self.left >= source_width
            || self.top >= source_height
        {
            return Err(FrameError::CropOutOfBounds {
                left: self.left,
                top: self.top,
                width: self.width,
                height: self.height,
                source_width,
                source_height,
            });
        }

        let height = self.height.min(source_height - self.top);
        let mut width = self.width.min(source_width - self.left);
        if height < width {
            width = height;
        }

        Ok(Self {
            left: self.left,
            top: self.top,
            width,
            height,
        })
    }
}

/// One camera frame owned by the scheduler until the worker consumes it.
///
/// Pixels are always copied in; nothing here borrows caller memory.
#[derive(Debug, Clone)]
pub struct Frame {
    pixels: Vec<u8>,
    format: PixelFormat,
    width: u32,
    height: u32,
    crop: Option<CropRect>,
}

impl Frame {
    /// Wrap an owned pixel buffer, validating its length against the format
    pub fn new(
        pixels: Vec<u8>,
        format: PixelFormat,
        width: u32,
        height: u32,
    ) -> Result<Self, FrameError> {
        if width == 0 || height == 0 {
            return Err(FrameError::ZeroDimension);
        }
        let expected = format.min_len(width, height);
        if pixels.len() < expected {
            return Err(FrameError::BufferTooShort {
                got: pixels.len(),
                expected,
            });
        }
        Ok(Self {
            pixels,
            format,
            width,
            height,
            crop: None,
        })
    }

    /// Copy a caller-owned buffer into a new frame
    pub fn copy_from(
        pixels: &[u8],
        format: PixelFormat,
        width: u32,
        height: u32,
    ) -> Result<Self, FrameError> {
        let expected = format.min_len(width, height);
        if pixels.len() < expected {
            return Err(FrameError::BufferTooShort {
                got: pixels.len(),
                expected,
            });
        }
        Self::new(pixels[..expected].to_vec(), format, width, height)
    }

    /// Attach a crop, clamped to this frame's dimensions
    pub fn with_crop(mut self, crop: CropRect) -> Result<Self, FrameError> {
        self.crop = Some(crop.clamp_to(self.width, self.height)?);
        Ok(self)
    }

    /// Raw pixel bytes
    pub fn pixels(&self) -> &[u8] {
        &self.pixels
    }

    /// Pixel layout
    pub fn format(&self) -> PixelFormat {
        self.format
    }

    /// Source width
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Source height
    pub fn height(&self) -> u32 {
        self.height
    }

    /// Effective (clamped) crop, if any
    pub fn crop(&self) -> Option<CropRect> {
        self.crop
    }

    /// Region the worker will actually analyze
    pub fn region(&self) -> CropRect {
        self.crop
            .unwrap_or_else(|| CropRect::new(0, 0, self.width, self.height))
    }
}
