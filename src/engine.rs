//! Seams for the external decode engines.
//!
//! The cascade never calls an engine directly; every call goes through
//! [`guarded`], which turns both returned errors and panics into an
//! [`EngineError`] so a misbehaving engine can only fail its own stage.

use crate::detector::FinderRegionLocator;
use crate::error::EngineError;
use crate::models::{EngineResult, Rect, Symbol};
use image::GrayImage;
use std::panic::{self, AssertUnwindSafe};

/// Matrix/linear barcode decoder fed with (usually binarized) images
pub trait MatrixDecoder: Send {
    /// Attempt to read one symbol from `image`
    fn decode(&mut self, image: &GrayImage) -> Result<EngineResult, EngineError>;
}

impl<F> MatrixDecoder for F
where
    F: FnMut(&GrayImage) -> Result<EngineResult, EngineError> + Send,
{
    fn decode(&mut self, image: &GrayImage) -> Result<EngineResult, EngineError> {
        self(image)
    }
}

/// Secondary scan engine working on a raw luminance buffer
pub trait SymbolScanner: Send {
    /// Return every symbol found in the `width x height` luma buffer
    fn scan(&mut self, luma: &[u8], width: u32, height: u32) -> Result<Vec<Symbol>, EngineError>;
}

impl<F> SymbolScanner for F
where
    F: FnMut(&[u8], u32, u32) -> Result<Vec<Symbol>, EngineError> + Send,
{
    fn scan(&mut self, luma: &[u8], width: u32, height: u32) -> Result<Vec<Symbol>, EngineError> {
        self(luma, width, height)
    }
}

/// Heuristic locator for code-shaped regions (no content decoding)
pub trait RegionLocator: Send {
    /// Bounding rect of the most likely code region, if any
    fn locate(&mut self, image: &GrayImage) -> Result<Option<Rect>, EngineError>;
}

/// The collaborators one cascade talks to
pub struct Engines {
    /// Used by the primary, threshold and adaptive stages
    pub matrix: Box<dyn MatrixDecoder>,
    /// Used by the secondary-engine stage; the stage misses when absent
    pub scanner: Option<Box<dyn SymbolScanner>>,
    /// Used by the heuristic stage; the stage misses when absent
    pub locator: Option<Box<dyn RegionLocator>>,
}

impl Engines {
    /// Matrix decoder plus the built-in finder-pattern locator, no scanner
    pub fn new(matrix: impl MatrixDecoder + 'static) -> Self {
        Self {
            matrix: Box::new(matrix),
            scanner: None,
            locator: Some(Box::new(FinderRegionLocator::default())),
        }
    }

    /// Add a secondary scan engine
    pub fn with_scanner(mut self, scanner: impl SymbolScanner + 'static) -> Self {
        self.scanner = Some(Box::new(scanner));
        self
    }

    /// Replace the region locator
    pub fn with_locator(mut self, locator: impl RegionLocator + 'static) -> Self {
        self.locator = Some(Box::new(locator));
        self
    }

    /// Disable the heuristic fallback
    pub fn without_locator(mut self) -> Self {
        self.locator = None;
        self
    }
}

/// Run one engine call, containing panics.
pub fn guarded<T>(call: impl FnOnce() -> Result<T, EngineError>) -> Result<T, EngineError> {
    match panic::catch_unwind(AssertUnwindSafe(call)) {
        Ok(result) => result,
        Err(payload) => Err(EngineError::Panicked(panic_message(payload.as_ref()))),
    }
}

/// Best-effort text of a panic payload
pub(crate) fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic payload".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_guarded_passes_results_through() {
        assert_eq!(guarded(|| Ok::<_, EngineError>(7)), Ok(7));
        assert_eq!(
            guarded(|| Err::<u8, _>(EngineError::fault("bad"))),
            Err(EngineError::Fault("bad".into()))
        );
    }

    #[test]
    fn test_guarded_contains_panics() {
        let result: Result<u8, _> = guarded(|| panic!("engine blew up"));
        assert_eq!(result, Err(EngineError::Panicked("engine blew up".into())));

        let code = 42;
        let result: Result<u8, _> = guarded(|| panic!("code {code}"));
        assert_eq!(result, Err(EngineError::Panicked("code 42".into())));
    }

    #[test]
    fn test_closures_are_engines() {
        let mut calls = 0;
        let mut decoder = |_: &GrayImage| -> Result<EngineResult, EngineError> {
            calls += 1;
            Ok(EngineResult::not_found())
        };
        let img = GrayImage::new(2, 2);
        assert!(!MatrixDecoder::decode(&mut decoder, &img).unwrap().is_valid());
        assert_eq!(calls, 1);
    }
}
