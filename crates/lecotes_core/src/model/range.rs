//! Half-open character interval over a text's content.
//!
//! # Invariants
//! - `start < end`; empty ranges are never constructed.
//! - `end <= text_len` for the text the range was validated against.
//! - Offsets count `char`s (Unicode scalar values) of the content.

use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Validated `[start, end)` span anchoring an annotation.
///
/// Immutable once an annotation has been created with it. Decoding checks
/// ordering only; the text bound is re-checked with `validate_within`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "RawSpanRange")]
pub struct SpanRange {
    start: usize,
    end: usize,
}

#[derive(Deserialize)]
struct RawSpanRange {
    start: i64,
    end: i64,
}

impl TryFrom<RawSpanRange> for SpanRange {
    type Error = RangeError;

    fn try_from(value: RawSpanRange) -> Result<Self, Self::Error> {
        Self::new(value.start, value.end, usize::MAX)
    }
}

/// Reasons a span fails validation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RangeError {
    /// `start` was negative.
    NegativeStart { start: i64 },
    /// `end` was not strictly greater than `start`.
    Empty { start: i64, end: i64 },
    /// `end` points past the end of the text.
    OutOfBounds { end: i64, text_len: usize },
}

impl Display for RangeError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NegativeStart { start } => {
                write!(f, "range start must be non-negative, got {start}")
            }
            Self::Empty { start, end } => {
                write!(f, "range end ({end}) must be > start ({start})")
            }
            Self::OutOfBounds { end, text_len } => {
                write!(f, "range end ({end}) exceeds text length ({text_len})")
            }
        }
    }
}

impl Error for RangeError {}

impl SpanRange {
    /// Validates caller input against the content length and builds a span.
    ///
    /// Inputs are signed so that negative offsets coming from a UI selection
    /// are reported instead of wrapping.
    pub fn new(start: i64, end: i64, text_len: usize) -> Result<Self, RangeError> {
        if start < 0 {
            return Err(RangeError::NegativeStart { start });
        }
        if end <= start {
            return Err(RangeError::Empty { start, end });
        }
        let text_len_i64 = i64::try_from(text_len).unwrap_or(i64::MAX);
        if end > text_len_i64 {
            return Err(RangeError::OutOfBounds { end, text_len });
        }

        // Both bounds are in `0..=text_len` here, so the casts are lossless.
        Ok(Self {
            start: start as usize,
            end: end as usize,
        })
    }

    /// Inclusive start offset.
    pub fn start(&self) -> usize {
        self.start
    }

    /// Exclusive end offset.
    pub fn end(&self) -> usize {
        self.end
    }

    /// Number of characters covered.
    pub fn len(&self) -> usize {
        self.end - self.start
    }

    /// Always `false` for a validated span; provided for API symmetry.
    pub fn is_empty(&self) -> bool {
        self.start >= self.end
    }

    /// Re-checks an existing span, e.g. one decoded from an external payload.
    pub fn validate_within(&self, text_len: usize) -> Result<(), RangeError> {
        Self::new(to_i64(self.start), to_i64(self.end), text_len).map(|_| ())
    }

    /// Returns the quoted substring of `content` covered by this span.
    ///
    /// Offsets past the end of `content` are clamped.
    pub fn slice<'a>(&self, content: &'a str) -> &'a str {
        let start = byte_offset(content, self.start);
        let end = byte_offset(content, self.end);
        &content[start..end]
    }
}

/// Converts a char offset into a byte offset, clamping at the content end.
pub(crate) fn byte_offset(content: &str, char_offset: usize) -> usize {
    content
        .char_indices()
        .nth(char_offset)
        .map_or(content.len(), |(byte_index, _)| byte_index)
}

fn to_i64(value: usize) -> i64 {
    i64::try_from(value).unwrap_or(i64::MAX)
}

#[cfg(test)]
mod tests {
    use super::{RangeError, SpanRange};

    #[test]
    fn rejects_empty_and_negative_ranges() {
        assert_eq!(
            SpanRange::new(5, 5, 100).unwrap_err(),
            RangeError::Empty { start: 5, end: 5 }
        );
        assert_eq!(
            SpanRange::new(-1, 5, 100).unwrap_err(),
            RangeError::NegativeStart { start: -1 }
        );
        assert_eq!(
            SpanRange::new(7, 3, 100).unwrap_err(),
            RangeError::Empty { start: 7, end: 3 }
        );
    }

    #[test]
    fn accepts_full_text_and_rejects_past_end() {
        let full = SpanRange::new(0, 100, 100).expect("full span is valid");
        assert_eq!((full.start(), full.end(), full.len()), (0, 100, 100));

        let err = SpanRange::new(0, 101, 100).expect_err("end past text must fail");
        assert_eq!(
            err,
            RangeError::OutOfBounds {
                end: 101,
                text_len: 100
            }
        );
    }

    #[test]
    fn slice_counts_chars_not_bytes() {
        let content = "naïve café";
        let range = SpanRange::new(6, 10, content.chars().count()).expect("valid span");
        assert_eq!(range.slice(content), "café");
    }

    #[test]
    fn validate_within_catches_shrunken_text() {
        let range = SpanRange::new(2, 8, 10).expect("valid span");
        assert!(range.validate_within(10).is_ok());
        assert!(range.validate_within(5).is_err());
    }
}
