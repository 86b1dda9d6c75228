// SPDX-License-Identifier: MIT OR Apache-2.0
//! Motion tweens between keyframe pairs.

use crate::easing::Easing;
use serde::{Deserialize, Serialize};

/// An interpolated span between two keyframes on the same layer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Tween {
    /// Frame of the starting keyframe
    pub start_frame: u32,
    /// Frame of the ending keyframe
    pub end_frame: u32,
    /// Easing applied to the progress
    #[serde(rename = "type", default)]
    pub easing: Easing,
}

impl Tween {
    /// Create a new tween
    pub fn new(start_frame: u32, end_frame: u32, easing: Easing) -> Self {
        Self {
            start_frame,
            end_frame,
            easing,
        }
    }

    /// Whether two closed intervals share at least one frame
    ///
    /// Touching endpoints count: `[0, 5]` and `[5, 10]` overlap.
    pub fn overlaps(&self, start: u32, end: u32) -> bool {
        let contains = |frame: u32| frame >= self.start_frame && frame <= self.end_frame;
        contains(start) || contains(end) || (start <= self.start_frame && end >= self.end_frame)
    }

    /// Whether `frame` lies inside the span
    ///
    /// The start frame itself belongs to the keyframe, not the tween.
    pub fn covers(&self, frame: u32) -> bool {
        frame > self.start_frame && frame <= self.end_frame
    }

    /// Whether the tween links exactly this keyframe pair
    pub fn links(&self, start: u32, end: u32) -> bool {
        self.start_frame == start && self.end_frame == end
    }

    /// Number of frames spanned
    pub fn length(&self) -> u32 {
        self.end_frame.saturating_sub(self.start_frame)
    }
}
