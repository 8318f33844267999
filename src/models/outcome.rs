use super::Point;
use std::fmt;

/// Barcode symbologies an engine may report
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BarcodeFormat {
    /// QR Code (Model 2 / Micro)
    QrCode,
    /// Data Matrix
    DataMatrix,
    /// Aztec
    Aztec,
    /// PDF417
    Pdf417,
    /// Code 128
    Code128,
    /// Code 39
    Code39,
    /// Code 93
    Code93,
    /// Codabar
    Codabar,
    /// EAN-13
    Ean13,
    /// EAN-8
    Ean8,
    /// UPC-A
    UpcA,
    /// UPC-E
    UpcE,
    /// Interleaved 2 of 5
    Itf,
}

impl fmt::Display for BarcodeFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            BarcodeFormat::QrCode => "QR_CODE",
            BarcodeFormat::DataMatrix => "DATA_MATRIX",
            BarcodeFormat::Aztec => "AZTEC",
            BarcodeFormat::Pdf417 => "PDF_417",
            BarcodeFormat::Code128 => "CODE_128",
            BarcodeFormat::Code39 => "CODE_39",
            BarcodeFormat::Code93 => "CODE_93",
            BarcodeFormat::Codabar => "CODABAR",
            BarcodeFormat::Ean13 => "EAN_13",
            BarcodeFormat::Ean8 => "EAN_8",
            BarcodeFormat::UpcA => "UPC_A",
            BarcodeFormat::UpcE => "UPC_E",
            BarcodeFormat::Itf => "ITF",
        };
        f.write_str(name)
    }
}

/// Status word returned by the matrix decoder
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DecodeStatus {
    /// A symbol was read
    NoError,
    /// No symbol located
    NotFound,
    /// Symbol located but its format was not recognized
    FormatError,
    /// Symbol located but error correction failed
    ChecksumError,
}

/// Raw reply from a [`MatrixDecoder`](crate::engine::MatrixDecoder)
#[derive(Debug, Clone, PartialEq)]
pub struct EngineResult {
    /// Engine status
    pub status: DecodeStatus,
    /// Decoded text, if any
    pub text: Option<String>,
    /// Recognized symbology, if any
    pub format: Option<BarcodeFormat>,
    /// Result points in the coordinates of the image handed to the engine
    pub points: Vec<Point>,
}

impl EngineResult {
    /// A successful read
    pub fn decoded(text: impl Into<String>, format: BarcodeFormat, points: Vec<Point>) -> Self {
        Self {
            status: DecodeStatus::NoError,
            text: Some(text.into()),
            format: Some(format),
            points,
        }
    }

    /// Nothing found
    pub fn not_found() -> Self {
        Self {
            status: DecodeStatus::NotFound,
            text: None,
            format: None,
            points: Vec::new(),
        }
    }

    /// True iff the read carries non-empty text and a recognized format.
    /// Only valid results end the cascade.
    pub fn is_valid(&self) -> bool {
        self.status == DecodeStatus::NoError
            && self.format.is_some()
            && self.text.as_deref().is_some_and(|t| !t.is_empty())
    }
}

/// Symbol types reported by a [`SymbolScanner`](crate::engine::SymbolScanner)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SymbolKind {
    /// QR Code; the only kind the cascade accepts
    QrCode,
    /// EAN-13
    Ean13,
    /// EAN-8
    Ean8,
    /// UPC-A
    UpcA,
    /// Code 128
    Code128,
    /// Anything else
    Other,
}

/// One symbol read by the scanner
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Symbol {
    /// Symbol type
    pub kind: SymbolKind,
    /// Decoded data
    pub text: String,
}

impl Symbol {
    /// Create a new symbol
    pub fn new(kind: SymbolKind, text: impl Into<String>) -> Self {
        Self {
            kind,
            text: text.into(),
        }
    }
}

/// Terminal result of one cascade run, delivered to the result sink
#[derive(Debug, Clone, PartialEq)]
pub enum DecodeOutcome {
    /// A symbol was decoded
    Success {
        /// Decoded text (never empty)
        text: String,
        /// Symbology
        format: BarcodeFormat,
        /// Result points in gray-image coordinates (may be empty)
        points: Vec<Point>,
    },
    /// No symbol decoded, but a code-shaped region was located.
    /// Points are top-left, top-right, bottom-left.
    NotFoundWithGeometry {
        /// Approximate corners
        points: Vec<Point>,
    },
    /// Nothing decoded or located
    NotFound,
}

impl DecodeOutcome {
    /// True for outcomes that stop the cascade
    pub fn is_terminal(&self) -> bool {
        !matches!(self, DecodeOutcome::NotFound)
    }

    /// True for [`DecodeOutcome::Success`]
    pub fn is_success(&self) -> bool {
        matches!(self, DecodeOutcome::Success { .. })
    }

    /// Decoded text, when successful
    pub fn text(&self) -> Option<&str> {
        match self {
            DecodeOutcome::Success { text, .. } => Some(text),
            _ => None,
        }
    }
}
