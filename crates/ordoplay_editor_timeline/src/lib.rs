// SPDX-License-Identifier: MIT OR Apache-2.0
//! Timeline data engine for OrdoPlay Editor.
//!
//! This crate models a keyframe animation timeline:
//! - Layers and folders arranged in a tree
//! - Per-layer keyframes holding property snapshots
//! - Motion tweens with easing between adjacent keyframes
//! - Frame insertion and deletion that ripple through keyframes and tweens
//! - Keyframe move, copy and paste
//! - Continuous-time evaluation of every visible layer
//! - JSON and RON snapshots
//!
//! ## Architecture
//!
//! [`Timeline`] is the single mutation surface. It owns a [`LayerTree`]
//! arena and an [`EventBus`]; every successful edit emits exactly one
//! [`TimelineEvent`]. Time is measured in frames throughout, with
//! [`TimelineConfig::frame_rate`] used only for conversion to seconds.

pub mod clipboard;
pub mod config;
pub mod easing;
pub mod error;
pub mod evaluate;
pub mod event;
pub mod keyframe;
pub mod layer;
pub mod snapshot;
pub mod timeline;
pub mod tree;
pub mod tween;

pub use clipboard::{Clipboard, ClipboardEntry, KeyframeRef, MoveReport, PasteReport};
pub use config::TimelineConfig;
pub use easing::Easing;
pub use error::{ErrorCategory, Result, TimelineError};
pub use evaluate::{evaluate_tree, Evaluation, DEFAULT_HIT_TOLERANCE};
pub use event::{DeleteRequest, EventBus, EventKind, MovedKeyframe, SubscriptionId, TimelineEvent};
pub use keyframe::{Interpolation, Keyframe, KeyframeId, PropertyMap, PropertyValue};
pub use layer::{FrameDeletion, Layer, LayerId, LayerKind};
pub use snapshot::{LayerSnapshot, TimelineSnapshot};
pub use timeline::Timeline;
pub use tree::LayerTree;
pub use tween::Tween;
