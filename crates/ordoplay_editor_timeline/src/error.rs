// SPDX-License-Identifier: MIT OR Apache-2.0
//! Error types for timeline operations.
//!
//! Every failure is local and recoverable: a failing operation performs
//! no mutation and leaves the timeline exactly as it was.

use crate::layer::LayerId;

/// Coarse classification of a [`TimelineError`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCategory {
    /// A referenced layer, keyframe or tween does not exist
    NotFound,
    /// The operation would break a uniqueness or non-overlap invariant
    Conflict,
    /// Structurally invalid input
    InvalidArgument,
    /// An observer vetoed the operation
    Cancelled,
    /// Snapshot or config text could not be read or written
    Serialization,
}

/// Error type for timeline operations
#[derive(Debug, thiserror::Error)]
pub enum TimelineError {
    /// Layer or folder not found
    #[error("Layer not found: {0}")]
    LayerNotFound(LayerId),

    /// No keyframe at the given frame
    #[error("Keyframe not found: layer {layer}, frame {frame}")]
    KeyframeNotFound {
        /// Layer that was searched
        layer: LayerId,
        /// Requested frame
        frame: u32,
    },

    /// No tween with the given endpoints
    #[error("Tween not found: layer {layer}, frames {start}..={end}")]
    TweenNotFound {
        /// Layer that was searched
        layer: LayerId,
        /// Requested start frame
        start: u32,
        /// Requested end frame
        end: u32,
    },

    /// A keyframe already occupies the frame
    #[error("Keyframe already exists: layer {layer}, frame {frame}")]
    KeyframeExists {
        /// Target layer
        layer: LayerId,
        /// Occupied frame
        frame: u32,
    },

    /// The tween interval intersects an existing tween
    #[error("Tween {start}..={end} overlaps an existing tween on layer {layer}")]
    TweenOverlap {
        /// Target layer
        layer: LayerId,
        /// Requested start frame
        start: u32,
        /// Requested end frame
        end: u32,
    },

    /// A moved keyframe would land on an occupied frame
    #[error("Frame {frame} on layer {layer} is already occupied")]
    FrameCollision {
        /// Target layer
        layer: LayerId,
        /// Colliding frame
        frame: u32,
    },

    /// Structurally invalid input
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// A before-delete observer vetoed the deletion
    #[error("Deletion of {0} was cancelled")]
    Cancelled(LayerId),

    /// JSON snapshot could not be parsed or written
    #[error("Snapshot JSON error: {0}")]
    SnapshotJson(#[from] serde_json::Error),

    /// RON text could not be parsed
    #[error("RON parse error: {0}")]
    RonParse(#[from] ron::error::SpannedError),

    /// RON text could not be written
    #[error("RON write error: {0}")]
    RonWrite(#[from] ron::Error),

    /// Snapshot parsed but violates the timeline invariants
    #[error("Invalid snapshot: {0}")]
    InvalidSnapshot(String),
}

impl TimelineError {
    /// Map this error onto the coarse taxonomy
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::LayerNotFound(_) | Self::KeyframeNotFound { .. } | Self::TweenNotFound { .. } => {
                ErrorCategory::NotFound
            }
            Self::KeyframeExists { .. } | Self::TweenOverlap { .. } | Self::FrameCollision { .. } => {
                ErrorCategory::Conflict
            }
            Self::InvalidArgument(_) => ErrorCategory::InvalidArgument,
            Self::Cancelled(_) => ErrorCategory::Cancelled,
            Self::SnapshotJson(_) | Self::RonParse(_) | Self::RonWrite(_) | Self::InvalidSnapshot(_) => {
                ErrorCategory::Serialization
            }
        }
    }

    pub(crate) fn invalid(message: impl Into<String>) -> Self {
        Self::InvalidArgument(message.into())
    }
}

/// Result type for timeline operations
pub type Result<T> = std::result::Result<T, TimelineError>;
