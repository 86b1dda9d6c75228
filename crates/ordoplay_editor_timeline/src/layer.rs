// SPDX-License-Identifier: MIT OR Apache-2.0
//! Layer definitions and the per-layer keyframe/tween store.
//!
//! All frame arithmetic lives here. A layer keeps its keyframes sorted
//! strictly ascending by frame and its tweens sorted by start frame with
//! no two closed intervals intersecting.

use crate::easing::Easing;
use crate::error::{Result, TimelineError};
use crate::keyframe::Keyframe;
use crate::tween::Tween;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Unique identifier for a layer or folder
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct LayerId(pub Uuid);

impl LayerId {
    /// Create a new random layer ID
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for LayerId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for LayerId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

impl std::str::FromStr for LayerId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Uuid::parse_str(s).map(Self)
    }
}

/// Kind of timeline object
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LayerKind {
    /// Track holding keyframes and tweens
    Layer,
    /// Group of child layers
    Folder,
}

impl LayerKind {
    /// Get the display name
    pub fn name(&self) -> &'static str {
        match self {
            Self::Layer => "layer",
            Self::Folder => "folder",
        }
    }
}

/// Keyframes and tweens dropped by [`Layer::delete_frames`]
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FrameDeletion {
    /// Frames of the removed keyframes
    pub removed_keyframes: Vec<u32>,
    /// Tweens that no longer span any frames
    pub removed_tweens: Vec<Tween>,
}

/// A layer or folder in the timeline
#[derive(Debug, Clone, PartialEq)]
pub struct Layer {
    /// Unique layer ID
    pub id: LayerId,
    /// Display name
    pub name: String,
    /// Layer or folder
    pub kind: LayerKind,
    /// Whether the layer is evaluated
    pub visible: bool,
    /// Whether the layer is locked for editing in the UI
    pub locked: bool,
    /// Display color
    pub color: [u8; 3],
    /// Owning folder, `None` at the root
    pub parent: Option<LayerId>,
    pub(crate) children: Vec<LayerId>,
    pub(crate) keyframes: Vec<Keyframe>,
    pub(crate) tweens: Vec<Tween>,
}

impl Layer {
    /// Create a new, empty layer or folder
    pub fn new(name: impl Into<String>, kind: LayerKind, color: [u8; 3]) -> Self {
        Self {
            id: LayerId::new(),
            name: name.into(),
            kind,
            visible: true,
            locked: false,
            color,
            parent: None,
            children: Vec::new(),
            keyframes: Vec::new(),
            tweens: Vec::new(),
        }
    }

    /// Whether this is a folder
    pub fn is_folder(&self) -> bool {
        self.kind == LayerKind::Folder
    }

    /// Child IDs in display order (folders only)
    pub fn children(&self) -> &[LayerId] {
        &self.children
    }

    /// Get all keyframes, sorted by frame
    pub fn keyframes(&self) -> &[Keyframe] {
        &self.keyframes
    }

    /// Get all tweens, sorted by start frame
    pub fn tweens(&self) -> &[Tween] {
        &self.tweens
    }

    /// Get keyframe count
    pub fn keyframe_count(&self) -> usize {
        self.keyframes.len()
    }

    /// Get the keyframe at exactly `frame`
    pub fn keyframe_at(&self, frame: u32) -> Option<&Keyframe> {
        self.position(frame).ok().map(|idx| &self.keyframes[idx])
    }

    pub(crate) fn keyframe_at_mut(&mut self, frame: u32) -> Option<&mut Keyframe> {
        match self.position(frame) {
            Ok(idx) => Some(&mut self.keyframes[idx]),
            Err(_) => None,
        }
    }

    /// Get keyframes in a frame range (inclusive)
    pub fn keyframes_in_range(&self, start: u32, end: u32) -> Vec<&Keyframe> {
        self.keyframes
            .iter()
            .filter(|k| k.frame >= start && k.frame <= end)
            .collect()
    }

    /// Frame of the last keyframe
    pub fn last_frame(&self) -> Option<u32> {
        self.keyframes.last().map(|k| k.frame)
    }

    /// Find the keyframes bracketing a continuous time
    ///
    /// Returns the last keyframe at or before `time` and the first one
    /// strictly after it.
    pub fn surrounding(&self, time: f32) -> (Option<&Keyframe>, Option<&Keyframe>) {
        let next_idx = self.keyframes.partition_point(|k| k.time() <= time);
        let prev = next_idx.checked_sub(1).map(|idx| &self.keyframes[idx]);
        (prev, self.keyframes.get(next_idx))
    }

    /// Get the tween covering `frame` (start exclusive, end inclusive)
    pub fn tween_at(&self, frame: u32) -> Option<&Tween> {
        self.tweens.iter().find(|t| t.covers(frame))
    }

    /// Get the tween linking exactly this keyframe pair
    pub fn tween_between(&self, start: u32, end: u32) -> Option<&Tween> {
        self.tweens.iter().find(|t| t.links(start, end))
    }

    fn position(&self, frame: u32) -> std::result::Result<usize, usize> {
        self.keyframes.binary_search_by_key(&frame, |k| k.frame)
    }

    fn ensure_track(&self) -> Result<()> {
        if self.is_folder() {
            return Err(TimelineError::invalid(format!(
                "{} is a folder and holds no keyframes",
                self.id
            )));
        }
        Ok(())
    }

    /// Insert a keyframe, rejecting an occupied frame
    pub fn insert_keyframe(&mut self, keyframe: Keyframe) -> Result<()> {
        self.ensure_track()?;
        match self.position(keyframe.frame) {
            Ok(_) => Err(TimelineError::KeyframeExists {
                layer: self.id,
                frame: keyframe.frame,
            }),
            Err(idx) => {
                self.keyframes.insert(idx, keyframe);
                Ok(())
            }
        }
    }

    /// Remove the keyframe at exactly `frame`
    ///
    /// Tweens and other keyframes are left where they are.
    pub fn delete_keyframe(&mut self, frame: u32) -> Result<Keyframe> {
        self.ensure_track()?;
        match self.position(frame) {
            Ok(idx) => Ok(self.keyframes.remove(idx)),
            Err(_) => Err(TimelineError::KeyframeNotFound {
                layer: self.id,
                frame,
            }),
        }
    }

    /// Ripple-insert one frame of time at `frame`
    ///
    /// Keyframes at or after `frame` move one frame later. Tweens starting
    /// at or after `frame` move as a whole; a tween that starts before
    /// `frame` but ends at or after it only has its end pushed out.
    /// Content already on the last representable frame cannot shift, so
    /// the insert is refused before anything moves.
    pub fn insert_frame(&mut self, frame: u32) -> Result<()> {
        self.ensure_track()?;
        let at_limit = self.last_frame() == Some(u32::MAX)
            || self.tweens.iter().any(|t| t.end_frame == u32::MAX);
        if at_limit {
            return Err(TimelineError::invalid(format!(
                "inserting a frame at {frame} would push content past frame {}",
                u32::MAX
            )));
        }
        for kf in self.keyframes.iter_mut().filter(|k| k.frame >= frame) {
            kf.frame += 1;
        }
        for tween in &mut self.tweens {
            if tween.start_frame >= frame {
                tween.start_frame += 1;
                tween.end_frame += 1;
            } else if tween.end_frame >= frame {
                tween.end_frame += 1;
            }
        }
        self.sort();
        Ok(())
    }

    /// Delete the inclusive frame range `start..=end`, closing the gap
    ///
    /// Keyframes in the range are removed and later ones shift down by the
    /// range length. Tweens entirely inside the range are dropped. Other
    /// tweens are mapped endpoint by endpoint: an endpoint after the range
    /// shifts down, an endpoint before it stays, a start inside it snaps to
    /// `start` and an end inside it snaps to `start - 1`. A tween that no
    /// longer spans at least one frame is dropped.
    pub fn delete_frames(&mut self, start: u32, end: u32) -> Result<FrameDeletion> {
        self.ensure_track()?;
        if start > end {
            return Err(TimelineError::invalid(format!(
                "frame range {start}..={end} is reversed"
            )));
        }
        // Range length minus one; `0..=u32::MAX` has no u32 length
        let span = end - start;
        let mut deletion = FrameDeletion::default();

        self.keyframes.retain(|k| {
            let inside = k.frame >= start && k.frame <= end;
            if inside {
                deletion.removed_keyframes.push(k.frame);
            }
            !inside
        });
        for kf in self.keyframes.iter_mut().filter(|k| k.frame > end) {
            kf.frame = kf.frame - span - 1;
        }

        let mut kept = Vec::with_capacity(self.tweens.len());
        for mut tween in self.tweens.drain(..) {
            if tween.start_frame >= start && tween.end_frame <= end {
                deletion.removed_tweens.push(tween);
                continue;
            }
            let (new_start, new_end) = (
                map_start(tween.start_frame, start, end, span),
                map_end(tween.end_frame, start, end, span),
            );
            match (new_start, new_end) {
                (s, Some(e)) if s < e => {
                    tween.start_frame = s;
                    tween.end_frame = e;
                    kept.push(tween);
                }
                _ => deletion.removed_tweens.push(tween),
            }
        }
        self.tweens = kept;
        self.sort();
        Ok(deletion)
    }

    /// Validate and add a tween between two existing keyframes
    pub fn create_tween(&mut self, start: u32, end: u32, easing: Easing) -> Result<Tween> {
        self.ensure_track()?;
        if start >= end {
            return Err(TimelineError::invalid(format!(
                "tween start {start} must be before end {end}"
            )));
        }
        for frame in [start, end] {
            if self.keyframe_at(frame).is_none() {
                return Err(TimelineError::invalid(format!(
                    "tween endpoint {frame} is not a keyframe on layer {}",
                    self.id
                )));
            }
        }
        if self.tweens.iter().any(|t| t.overlaps(start, end)) {
            return Err(TimelineError::TweenOverlap {
                layer: self.id,
                start,
                end,
            });
        }
        let tween = Tween::new(start, end, easing);
        self.tweens.push(tween);
        self.sort();
        Ok(tween)
    }

    /// Remove the tween with exactly these endpoints
    pub fn remove_tween(&mut self, start: u32, end: u32) -> Result<Tween> {
        self.ensure_track()?;
        let idx = self
            .tweens
            .iter()
            .position(|t| t.links(start, end))
            .ok_or(TimelineError::TweenNotFound {
                layer: self.id,
                start,
                end,
            })?;
        Ok(self.tweens.remove(idx))
    }

    /// Change the easing of an existing tween, returning the old easing
    pub fn set_tween_easing(&mut self, start: u32, end: u32, easing: Easing) -> Result<Easing> {
        let id = self.id;
        let tween = self
            .tweens
            .iter_mut()
            .find(|t| t.links(start, end))
            .ok_or(TimelineError::TweenNotFound {
                layer: id,
                start,
                end,
            })?;
        Ok(std::mem::replace(&mut tween.easing, easing))
    }

    fn sort(&mut self) {
        self.keyframes.sort_by_key(|k| k.frame);
        self.tweens.sort_by_key(|t| t.start_frame);
    }
}

fn map_start(frame: u32, start: u32, end: u32, span: u32) -> u32 {
    if frame > end {
        frame - span - 1
    } else if frame >= start {
        start
    } else {
        frame
    }
}

fn map_end(frame: u32, start: u32, end: u32, span: u32) -> Option<u32> {
    if frame > end {
        Some(frame - span - 1)
    } else if frame >= start {
        start.checked_sub(1)
    } else {
        Some(frame)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::keyframe::PropertyMap;

    fn layer_with(frames: &[u32]) -> Layer {
        let mut layer = Layer::new("Test", LayerKind::Layer, [0, 0, 0]);
        for &frame in frames {
            layer.insert_keyframe(Keyframe::new(frame, PropertyMap::new())).unwrap();
        }
        layer
    }

    fn frames(layer: &Layer) -> Vec<u32> {
        layer.keyframes().iter().map(|k| k.frame).collect()
    }

    fn spans(layer: &Layer) -> Vec<(u32, u32)> {
        layer.tweens().iter().map(|t| (t.start_frame, t.end_frame)).collect()
    }

    #[test]
    fn test_insert_keeps_order() {
        let layer = layer_with(&[8, 2, 5]);
        assert_eq!(frames(&layer), vec![2, 5, 8]);
    }

    #[test]
    fn test_insert_duplicate_conflicts() {
        let mut layer = layer_with(&[5]);
        let err = layer.insert_keyframe(Keyframe::blank(5)).unwrap_err();
        assert!(matches!(err, TimelineError::KeyframeExists { frame: 5, .. }));
        assert_eq!(layer.keyframe_count(), 1);
    }

    #[test]
    fn test_folder_rejects_keyframes() {
        let mut folder = Layer::new("Group", LayerKind::Folder, [0, 0, 0]);
        assert!(folder.insert_keyframe(Keyframe::blank(0)).is_err());
        assert!(folder.insert_frame(0).is_err());
    }

    #[test]
    fn test_delete_keyframe_leaves_tweens() {
        let mut layer = layer_with(&[0, 10]);
        layer.create_tween(0, 10, Easing::Linear).unwrap();
        layer.delete_keyframe(10).unwrap();
        assert_eq!(frames(&layer), vec![0]);
        assert_eq!(spans(&layer), vec![(0, 10)]);
        assert!(matches!(
            layer.delete_keyframe(10),
            Err(TimelineError::KeyframeNotFound { frame: 10, .. })
        ));
    }

    #[test]
    fn test_insert_frame_ripples() {
        let mut layer = layer_with(&[0, 4, 6, 10, 12]);
        layer.create_tween(0, 4, Easing::Linear).unwrap();
        layer.create_tween(6, 10, Easing::Linear).unwrap();
        layer.insert_frame(5).unwrap();
        assert_eq!(frames(&layer), vec![0, 4, 7, 11, 13]);
        assert_eq!(spans(&layer), vec![(0, 4), (7, 11)]);
    }

    #[test]
    fn test_insert_frame_inside_tween_extends_end() {
        let mut layer = layer_with(&[2, 8]);
        layer.create_tween(2, 8, Easing::Linear).unwrap();
        layer.insert_frame(5).unwrap();
        assert_eq!(spans(&layer), vec![(2, 9)]);
        layer.insert_frame(2).unwrap();
        assert_eq!(spans(&layer), vec![(3, 10)]);
        assert_eq!(frames(&layer), vec![3, 10]);
    }

    #[test]
    fn test_delete_frames_cut_inside_tween() {
        let mut layer = layer_with(&[2, 5, 8]);
        layer.create_tween(2, 5, Easing::Linear).unwrap();
        let deletion = layer.delete_frames(3, 4).unwrap();
        assert!(deletion.removed_keyframes.is_empty());
        assert_eq!(frames(&layer), vec![2, 3, 6]);
        assert_eq!(spans(&layer), vec![(2, 3)]);
    }

    #[test]
    fn test_delete_frames_drops_contained_tween() {
        let mut layer = layer_with(&[0, 3, 5, 9]);
        layer.create_tween(3, 5, Easing::Linear).unwrap();
        let deletion = layer.delete_frames(2, 6).unwrap();
        assert_eq!(deletion.removed_keyframes, vec![3, 5]);
        assert_eq!(deletion.removed_tweens.len(), 1);
        assert_eq!(frames(&layer), vec![0, 4]);
        assert!(layer.tweens().is_empty());
    }

    #[test]
    fn test_delete_frames_shifts_later_tweens() {
        let mut layer = layer_with(&[0, 10, 20]);
        layer.create_tween(10, 20, Easing::Linear).unwrap();
        layer.delete_frames(2, 4).unwrap();
        assert_eq!(frames(&layer), vec![0, 7, 17]);
        assert_eq!(spans(&layer), vec![(7, 17)]);
    }

    #[test]
    fn test_delete_frames_keeps_tweens_disjoint() {
        let mut layer = layer_with(&[0, 3, 5, 9]);
        layer.create_tween(0, 3, Easing::Linear).unwrap();
        layer.create_tween(5, 9, Easing::Linear).unwrap();
        layer.delete_frames(2, 4).unwrap();
        assert_eq!(spans(&layer), vec![(0, 1), (2, 6)]);
    }

    #[test]
    fn test_delete_frames_rejects_reversed_range() {
        let mut layer = layer_with(&[0]);
        assert!(layer.delete_frames(4, 2).is_err());
    }

    #[test]
    fn test_insert_then_delete_round_trip() {
        let mut layer = layer_with(&[0, 3, 7, 12]);
        layer.create_tween(0, 3, Easing::Linear).unwrap();
        layer.create_tween(7, 12, Easing::EaseInQuad).unwrap();
        let before = (frames(&layer), spans(&layer));
        for point in [1, 5, 9, 13] {
            layer.insert_frame(point).unwrap();
            layer.delete_frames(point, point).unwrap();
            assert_eq!((frames(&layer), spans(&layer)), before, "at {point}");
        }
    }

    #[test]
    fn test_delete_whole_frame_range() {
        let mut layer = layer_with(&[0, 5, u32::MAX]);
        layer.create_tween(0, 5, Easing::Linear).unwrap();
        let deletion = layer.delete_frames(0, u32::MAX).unwrap();
        assert_eq!(deletion.removed_keyframes, vec![0, 5, u32::MAX]);
        assert_eq!(deletion.removed_tweens.len(), 1);
        assert!(layer.keyframes().is_empty());
        assert!(layer.tweens().is_empty());
    }

    #[test]
    fn test_delete_frames_up_to_last_frame() {
        let mut layer = layer_with(&[2, 9, u32::MAX]);
        layer.create_tween(2, 9, Easing::Linear).unwrap();
        layer.delete_frames(5, u32::MAX).unwrap();
        assert_eq!(frames(&layer), vec![2]);
        assert_eq!(spans(&layer), vec![(2, 4)]);
    }

    #[test]
    fn test_delete_frames_shifts_from_high_frames() {
        let mut layer = layer_with(&[1, u32::MAX - 1, u32::MAX]);
        layer.create_tween(u32::MAX - 1, u32::MAX, Easing::Linear).unwrap();
        layer.delete_frames(0, 0).unwrap();
        assert_eq!(frames(&layer), vec![0, u32::MAX - 2, u32::MAX - 1]);
        assert_eq!(spans(&layer), vec![(u32::MAX - 2, u32::MAX - 1)]);
    }

    #[test]
    fn test_insert_frame_refuses_content_at_last_frame() {
        let mut layer = layer_with(&[0, u32::MAX]);
        let before = frames(&layer);
        assert!(matches!(layer.insert_frame(0), Err(TimelineError::InvalidArgument(_))));
        assert_eq!(frames(&layer), before);
    }

    #[test]
    fn test_insert_frame_refuses_tween_ending_at_last_frame() {
        let mut layer = layer_with(&[3, u32::MAX]);
        layer.create_tween(3, u32::MAX, Easing::Linear).unwrap();
        layer.delete_keyframe(u32::MAX).unwrap();
        assert!(matches!(layer.insert_frame(10), Err(TimelineError::InvalidArgument(_))));
        assert_eq!(frames(&layer), vec![3]);
        assert_eq!(spans(&layer), vec![(3, u32::MAX)]);
    }

    #[test]
    fn test_insert_frame_fills_up_to_last_frame() {
        let mut layer = layer_with(&[u32::MAX - 1]);
        layer.insert_frame(0).unwrap();
        assert_eq!(frames(&layer), vec![u32::MAX]);
    }

    #[test]
    fn test_create_tween_validation() {
        let mut layer = layer_with(&[0, 3, 5, 8]);
        assert!(matches!(
            layer.create_tween(5, 5, Easing::Linear),
            Err(TimelineError::InvalidArgument(_))
        ));
        assert!(matches!(
            layer.create_tween(0, 4, Easing::Linear),
            Err(TimelineError::InvalidArgument(_))
        ));
        layer.create_tween(0, 5, Easing::Linear).unwrap();
        assert!(matches!(
            layer.create_tween(3, 8, Easing::Linear),
            Err(TimelineError::TweenOverlap { .. })
        ));
        assert!(matches!(
            layer.create_tween(5, 8, Easing::Linear),
            Err(TimelineError::TweenOverlap { .. })
        ));
        assert_eq!(spans(&layer), vec![(0, 5)]);
    }

    #[test]
    fn test_tween_lookup_and_removal() {
        let mut layer = layer_with(&[0, 4]);
        layer.create_tween(0, 4, Easing::Linear).unwrap();
        assert!(layer.tween_at(0).is_none());
        assert!(layer.tween_at(1).is_some());
        assert!(layer.tween_at(4).is_some());
        assert!(layer.remove_tween(0, 3).is_err());
        assert_eq!(layer.set_tween_easing(0, 4, Easing::EaseOutCubic).unwrap(), Easing::Linear);
        let removed = layer.remove_tween(0, 4).unwrap();
        assert_eq!(removed.easing, Easing::EaseOutCubic);
        assert!(layer.tweens().is_empty());
    }

    #[test]
    fn test_surrounding() {
        let layer = layer_with(&[2, 6]);
        let (prev, next) = layer.surrounding(1.0);
        assert!(prev.is_none());
        assert_eq!(next.map(|k| k.frame), Some(2));
        let (prev, next) = layer.surrounding(2.0);
        assert_eq!(prev.map(|k| k.frame), Some(2));
        assert_eq!(next.map(|k| k.frame), Some(6));
        let (prev, next) = layer.surrounding(9.0);
        assert_eq!(prev.map(|k| k.frame), Some(6));
        assert!(next.is_none());
    }

    #[test]
    fn test_layer_id_parse() {
        let id = LayerId::new();
        let parsed: LayerId = id.to_string().parse().unwrap();
        assert_eq!(parsed, id);
        assert!("not-a-uuid".parse::<LayerId>().is_err());
    }
}
