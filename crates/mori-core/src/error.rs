//! Error types for modifier and paragraph operations.
//!
//! Every failing single operation leaves the paragraph untouched; callers treat
//! `Err` as "nothing happened".

use thiserror::Error;

use crate::types::ModifierType;

/// Errors returned by modifier-store, structural, and track-change operations.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum ModifierError {
    /// The type name does not correspond to any known modifier.
    #[error("unknown modifier type: {0}")]
    UnknownType(String),

    /// `end` lies before `start`.
    #[error("inverted range: end {end} is before start {start}")]
    InvertedRange { start: i32, end: i32 },

    /// A position or range falls outside the paragraph content.
    #[error("range {start}..{end} is outside content of length {len}")]
    OutOfBounds { start: i32, end: i32, len: i32 },

    /// The type needs a payload and none was supplied.
    #[error("modifier type {0} requires a payload")]
    MissingPayload(ModifierType),

    /// The payload could not be read as the type's payload shape.
    #[error("payload does not match modifier type {ty}: {reason}")]
    PayloadMismatch { ty: ModifierType, reason: String },

    /// No modifier exists at the requested index.
    #[error("no modifier at index {0}")]
    IndexOutOfRange(usize),

    /// The modifier at the index is not an unaccepted track change.
    #[error("modifier at index {0} is not a pending track change")]
    NotPending(usize),

    /// The type cannot be recorded as a tracked edit.
    #[error("{0} is not a track-change modifier type")]
    NotTrackChange(ModifierType),
}
