//! Error Types
//!
//! This module defines the error types used throughout the crate.
//!
//! # Overview
//!
//! The main error type [`PoseError`] covers the failure modes of the editing
//! and mapping APIs:
//! - Rejected edit or playback parameters
//! - Duplicate bone mappings and clip names
//! - Name lookups that miss
//! - Internal invariant violations
//!
//! Per-frame work (advancing play time, posing, retargeting) never returns an
//! error: a missing bone degrades to its bind pose and a zero-length range
//! holds position.
//!
//! # Usage
//!
//! Fallible APIs return [`Result<T>`] which is an alias for
//! `std::result::Result<T, PoseError>`.
//!
//! ```rust,ignore
//! use posekit::errors::{PoseError, Result};
//!
//! fn shrink(track: &mut TransformTrack) -> Result<()> {
//!     *track = track.reduce(2)?;
//!     Ok(())
//! }
//! ```

use std::fmt;

use thiserror::Error;

/// Which column of a bone mapping table an operation refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MappingSide {
    Source,
    Target,
}

impl fmt::Display for MappingSide {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MappingSide::Source => f.write_str("source"),
            MappingSide::Target => f.write_str("target"),
        }
    }
}

/// The main error type for the crate.
#[derive(Error, Debug)]
pub enum PoseError {
    // ========================================================================
    // Argument Errors
    // ========================================================================
    /// A parameter was rejected before anything was mutated.
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    // ========================================================================
    // Uniqueness Errors
    // ========================================================================
    /// The bone is already part of an active mapping.
    #[error("Conflict: {side} bone '{bone}' is already mapped")]
    Conflict {
        /// Name of the bone that is already mapped
        bone: String,
        /// Column in which the bone was found
        side: MappingSide,
    },

    /// A clip with this name already exists in the library.
    #[error("Conflict: an animation named '{0}' already exists")]
    DuplicateName(String),

    // ========================================================================
    // Lookup Errors
    // ========================================================================
    /// A bone or clip name did not resolve.
    #[error("Not found: {0}")]
    NotFound(String),

    // ========================================================================
    // Internal Errors
    // ========================================================================
    /// An internal invariant was violated. Indicates a programming error.
    #[error("Illegal state: {0}")]
    IllegalState(String),

    // ========================================================================
    // Format & Parsing Errors
    // ========================================================================
    /// JSON parsing error.
    #[error("JSON parse error: {0}")]
    JsonError(#[from] serde_json::Error),
}

impl PoseError {
    /// Returns true for the `Conflict` family of errors.
    #[must_use]
    pub fn is_conflict(&self) -> bool {
        matches!(self, PoseError::Conflict { .. } | PoseError::DuplicateName(_))
    }
}

/// Alias for `Result<T, PoseError>`.
pub type Result<T> = std::result::Result<T, PoseError>;
