//! Error types for the replay decoder.
//!
//! Every stage of the pipeline reports failures through [`ParserError`].
//! Only [`ParserError::BufferEmptyOrTooLarge`] (and configuration or I/O
//! problems outside the decode path) abort a parse; every other kind is
//! captured per stage and surfaced on the result as an [`Issue`], so a
//! later stage failing never discards what an earlier stage decoded.

use serde::Serialize;
use thiserror::Error;

/// The main error type for replay decoding operations.
///
/// # Example
///
/// ```
/// use bw_replay::error::{ErrorKind, ParserError};
///
/// let err = ParserError::out_of_bounds(4, 10, 12);
/// assert_eq!(err.kind(), ErrorKind::OutOfBounds);
/// assert!(err.to_string().contains("position 10"));
/// ```
#[derive(Error, Debug)]
pub enum ParserError {
    /// An I/O error occurred while reading a replay or option file.
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    /// The input buffer is empty or larger than the configured maximum.
    #[error("Replay buffer rejected: {size} bytes (allowed 1..={max})")]
    BufferEmptyOrTooLarge {
        /// Size of the rejected buffer.
        size: usize,
        /// Configured maximum size.
        max: usize,
    },

    /// A read would run past the end of the buffer.
    #[error("Out of bounds: {requested} bytes requested at position {position}, buffer has {len}")]
    OutOfBounds {
        /// Number of bytes the read needed.
        requested: usize,
        /// Cursor position at the time of the read.
        position: usize,
        /// Total buffer length.
        len: usize,
    },

    /// No known signature and no plausible compressed candidate was found.
    #[error("Format unrecognized: {reason}")]
    FormatUnrecognized {
        /// Why detection gave up.
        reason: String,
    },

    /// A single header field could not be resolved.
    #[error("Header field unresolved: {field}")]
    HeaderFieldUnresolved {
        /// Name of the unresolved field.
        field: &'static str,
    },

    /// No candidate player table layout yielded two valid players.
    #[error("Player table unresolved after trying {layouts_tried} layouts")]
    PlayerTableUnresolved {
        /// Number of layouts attempted.
        layouts_tried: usize,
    },

    /// Every decode strategy failed its acceptance threshold.
    #[error("Command stream unresolved: {reason}")]
    CommandStreamUnresolved {
        /// Summary of why the strategies were rejected.
        reason: String,
    },

    /// The decoder gave up after too many consecutive resync failures.
    #[error("Command stream truncated at offset 0x{offset:X} after {events} events")]
    CommandStreamTruncated {
        /// Events decoded before the truncation.
        events: usize,
        /// Offset where decoding stopped.
        offset: usize,
    },

    /// Inflating a candidate region failed.
    #[error("Decompression failed: {reason}")]
    DecompressionError {
        /// A description of the decompression failure.
        reason: String,
    },

    /// Parse options failed validation.
    #[error("Invalid configuration: {reason}")]
    InvalidConfig {
        /// What is wrong with the options.
        reason: String,
    },
}

/// Coarse classification of a [`ParserError`].
///
/// The kind is what crosses into external collaborators: it serializes to a
/// stable snake-case name and maps to a distinct status code, so a surrounding
/// service can tell "unsupported format" apart from "internal failure".
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// I/O failure outside the decode path.
    Io,
    /// Input validation failure.
    BufferEmptyOrTooLarge,
    /// Bounds-checked read failure.
    OutOfBounds,
    /// Detector found nothing it recognises.
    FormatUnrecognized,
    /// A header field is unknown.
    HeaderFieldUnresolved,
    /// Player table could not be located.
    PlayerTableUnresolved,
    /// No decode strategy succeeded.
    CommandStreamUnresolved,
    /// Partial command decode.
    CommandStreamTruncated,
    /// Inflate failure.
    Decompression,
    /// Bad parse options.
    InvalidConfig,
}

impl ErrorKind {
    /// Returns whether an error of this kind aborts the whole parse.
    #[must_use]
    pub const fn is_fatal(self) -> bool {
        matches!(
            self,
            ErrorKind::Io | ErrorKind::BufferEmptyOrTooLarge | ErrorKind::InvalidConfig
        )
    }

    /// Returns an HTTP-style status code for surfaces that expose the decoder.
    ///
    /// An unrecognized format maps to `415`. Other non-fatal kinds map to
    /// `200` because they accompany a partial result.
    #[must_use]
    pub const fn status(self) -> u16 {
        match self {
            ErrorKind::BufferEmptyOrTooLarge => 413,
            ErrorKind::InvalidConfig => 400,
            ErrorKind::Io | ErrorKind::OutOfBounds | ErrorKind::Decompression => 500,
            ErrorKind::FormatUnrecognized => 415,
            ErrorKind::HeaderFieldUnresolved
            | ErrorKind::PlayerTableUnresolved
            | ErrorKind::CommandStreamUnresolved
            | ErrorKind::CommandStreamTruncated => 200,
        }
    }
}

impl ParserError {
    /// Creates an `OutOfBounds` error.
    #[must_use]
    pub fn out_of_bounds(requested: usize, position: usize, len: usize) -> Self {
        ParserError::OutOfBounds {
            requested,
            position,
            len,
        }
    }

    /// Returns the coarse kind of this error.
    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        match self {
            ParserError::IoError(_) => ErrorKind::Io,
            ParserError::BufferEmptyOrTooLarge { .. } => ErrorKind::BufferEmptyOrTooLarge,
            ParserError::OutOfBounds { .. } => ErrorKind::OutOfBounds,
            ParserError::FormatUnrecognized { .. } => ErrorKind::FormatUnrecognized,
            ParserError::HeaderFieldUnresolved { .. } => ErrorKind::HeaderFieldUnresolved,
            ParserError::PlayerTableUnresolved { .. } => ErrorKind::PlayerTableUnresolved,
            ParserError::CommandStreamUnresolved { .. } => ErrorKind::CommandStreamUnresolved,
            ParserError::CommandStreamTruncated { .. } => ErrorKind::CommandStreamTruncated,
            ParserError::DecompressionError { .. } => ErrorKind::Decompression,
            ParserError::InvalidConfig { .. } => ErrorKind::InvalidConfig,
        }
    }
}

/// A non-fatal stage failure recorded on a parse result.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Issue {
    /// Kind of the underlying error.
    pub kind: ErrorKind,
    /// Human-readable description.
    pub message: String,
}

impl From<&ParserError> for Issue {
    fn from(err: &ParserError) -> Self {
        Issue {
            kind: err.kind(),
            message: err.to_string(),
        }
    }
}

/// A specialized Result type for decoding operations.
pub type Result<T> = std::result::Result<T, ParserError>;
