pub mod frame;
pub mod outcome;
pub mod point;
pub mod rect;

pub use frame::{CropRect, Frame, PixelFormat};
pub use outcome::{BarcodeFormat, DecodeOutcome, DecodeStatus, EngineResult, Symbol, SymbolKind};
pub use point::Point;
pub use rect::Rect;
