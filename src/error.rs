//! Error types shared by the experiment and metric modules

use std::path::PathBuf;
use thiserror::Error;

/// Result type for study operations
pub type StudyResult<T> = Result<T, StudyError>;

/// Errors raised while sampling, judging or scoring
#[derive(Debug, Error)]
pub enum StudyError {
    /// A pool holds fewer eligible items than a trial needs
    #[error("pool has {available} eligible item(s), {requested} requested")]
    InsufficientPool {
        /// Items the caller asked for
        requested: usize,
        /// Items actually available
        available: usize,
    },

    /// A candidate name does not decode to the expected integer tuple
    #[error("malformed identifier '{name}': {reason}")]
    MalformedIdentifier {
        /// The offending name
        name: String,
        /// What went wrong
        reason: String,
    },

    /// Metric inputs differ in size
    #[error("shape mismatch: reference is {}x{}, candidate is {}x{}", reference.0, reference.1, candidate.0, candidate.1)]
    ShapeMismatch {
        /// Reference (width, height)
        reference: (u32, u32),
        /// Candidate (width, height)
        candidate: (u32, u32),
    },

    /// Image is smaller than the metric window
    #[error("image of {width}x{height} is smaller than the {window}x{window} window")]
    TooSmall {
        width: u32,
        height: u32,
        window: u32,
    },

    /// A category directory has no groundtruth image
    #[error("category {} has no groundtruth image", .0.display())]
    MissingReference(PathBuf),

    /// The user picked a slot that was not presented
    #[error("selection {index} is out of range for {presented} candidate(s)")]
    InvalidSelection { index: usize, presented: usize },

    /// The action does not apply to this kind of session
    #[error("'{action}' is not available in this session")]
    UnsupportedAction { action: String },

    /// IO error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Image decoding or encoding error
    #[error("image error: {0}")]
    Image(#[from] image::ImageError),
}

impl StudyError {
    /// Create a malformed identifier error
    #[must_use]
    pub fn malformed(name: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::MalformedIdentifier {
            name: name.into(),
            reason: reason.into(),
        }
    }

    /// Whether the error only invalidates the current trial.
    ///
    /// Pool, shape and I/O errors mean the session itself is misconfigured.
    #[must_use]
    pub fn is_trial_local(&self) -> bool {
        matches!(
            self,
            Self::MalformedIdentifier { .. }
                | Self::InvalidSelection { .. }
                | Self::UnsupportedAction { .. }
        )
    }
}
