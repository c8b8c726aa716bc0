use thiserror::Error;

use super::flags::SectionKind;
use super::layout;

/// Errors returned by position-report decoding.
///
/// Every variant aborts decoding of the whole remaining buffer; messages
/// decoded earlier in the same call are discarded.
///
/// # Examples
/// ```
/// use poseshark_core::PositionError;
///
/// let err = PositionError::UnsupportedVersion { version: 1 };
/// assert!(err.to_string().contains("unsupported version"));
/// assert_eq!(err.issue_id(), "PS-UNSUPPORTED-VERSION");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PositionError {
    #[error("payload too short: need {needed} bytes, got {actual}")]
    TooShort { needed: usize, actual: usize },
    #[error("zero-length message at offset {offset}")]
    ZeroLength { offset: usize },
    #[error("unsupported version: {version}")]
    UnsupportedVersion { version: u16 },
    #[error("{section} section overruns message: need {needed} bytes, {available} available")]
    SectionOverrun {
        section: SectionKind,
        needed: usize,
        available: usize,
    },
    #[error("declared message size {size} is below the {} byte header", layout::HEADER_LEN)]
    SizeBelowHeader { size: u16 },
}

impl PositionError {
    /// Stable identifier used when aggregating failures in reports.
    pub fn issue_id(&self) -> &'static str {
        match self {
            PositionError::TooShort { .. } => "PS-TOO-SHORT",
            PositionError::ZeroLength { .. } => "PS-ZERO-LENGTH",
            PositionError::UnsupportedVersion { .. } => "PS-UNSUPPORTED-VERSION",
            PositionError::SectionOverrun { .. } => "PS-SECTION-OVERRUN",
            PositionError::SizeBelowHeader { .. } => "PS-SIZE-BELOW-HEADER",
        }
    }
}

/// Rejected `--allow-source` style entry.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid source address '{input}': expected an IP address or a MAC address (aa:bb:cc:dd:ee:ff)")]
pub struct AllowEntryError {
    pub input: String,
}
