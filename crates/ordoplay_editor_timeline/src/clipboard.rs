// SPDX-License-Identifier: MIT OR Apache-2.0
//! Keyframe clipboard and cross-layer moves.
//!
//! Keyframes are addressed as `layer:frame` references. A move is
//! all-or-nothing; a paste skips occupied frames and reports them.

use crate::error::{Result, TimelineError};
use crate::event::MovedKeyframe;
use crate::keyframe::{Keyframe, KeyframeId};
use crate::layer::{Layer, LayerId};
use crate::tree::LayerTree;
use std::collections::HashSet;

/// Address of a keyframe: the owning layer and its frame
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct KeyframeRef {
    /// Owning layer
    pub layer: LayerId,
    /// Keyframe frame
    pub frame: u32,
}

impl KeyframeRef {
    /// Create a new reference
    pub fn new(layer: LayerId, frame: u32) -> Self {
        Self { layer, frame }
    }
}

impl std::fmt::Display for KeyframeRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}", self.layer, self.frame)
    }
}

impl std::str::FromStr for KeyframeRef {
    type Err = TimelineError;

    fn from_str(s: &str) -> Result<Self> {
        let (layer, frame) = s
            .rsplit_once(':')
            .ok_or_else(|| TimelineError::invalid(format!("keyframe reference `{s}` has no `:`")))?;
        let layer = layer
            .parse()
            .map_err(|e| TimelineError::invalid(format!("bad layer id in `{s}`: {e}")))?;
        let frame = frame
            .parse()
            .map_err(|e| TimelineError::invalid(format!("bad frame in `{s}`: {e}")))?;
        Ok(Self { layer, frame })
    }
}

/// A copied keyframe and the layer it came from
#[derive(Debug, Clone, PartialEq)]
pub struct ClipboardEntry {
    /// Layer the keyframe was copied from
    pub source_layer: LayerId,
    /// Snapshot of the keyframe at copy time
    pub keyframe: Keyframe,
}

/// Outcome of a paste
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PasteReport {
    /// Frames that received a keyframe
    pub applied: Vec<u32>,
    /// Frames skipped because a keyframe was already there
    pub skipped: Vec<u32>,
}

impl PasteReport {
    /// Number of pasted keyframes
    pub fn applied_count(&self) -> usize {
        self.applied.len()
    }

    /// Number of skipped keyframes
    pub fn skipped_count(&self) -> usize {
        self.skipped.len()
    }
}

/// Outcome of a move
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MoveReport {
    /// Offset applied to every keyframe
    pub offset: i64,
    /// Every relocated keyframe
    pub moved: Vec<MovedKeyframe>,
}

/// Clipboard slot holding immutable keyframe snapshots
#[derive(Debug, Clone, Default)]
pub struct Clipboard {
    entries: Vec<ClipboardEntry>,
}

impl Clipboard {
    /// Create an empty clipboard
    pub fn new() -> Self {
        Self::default()
    }

    /// Copied entries in selection order
    pub fn entries(&self) -> &[ClipboardEntry] {
        &self.entries
    }

    /// Number of copied keyframes
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether nothing has been copied
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Drop the clipboard contents
    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// Lowest copied frame
    pub fn min_frame(&self) -> Option<u32> {
        self.entries.iter().map(|e| e.keyframe.frame).min()
    }

    /// Replace the contents with snapshots of the referenced keyframes
    ///
    /// Fails without touching the clipboard if any reference is dangling.
    pub fn copy(&mut self, tree: &LayerTree, refs: &[KeyframeRef]) -> Result<usize> {
        let mut entries = Vec::with_capacity(refs.len());
        for r in dedup(refs) {
            let keyframe = tree
                .layer(r.layer)?
                .keyframe_at(r.frame)
                .ok_or(TimelineError::KeyframeNotFound {
                    layer: r.layer,
                    frame: r.frame,
                })?;
            entries.push(ClipboardEntry {
                source_layer: r.layer,
                keyframe: keyframe.clone(),
            });
        }
        self.entries = entries;
        Ok(self.entries.len())
    }

    /// Paste into `target` with the lowest copied frame landing on `frame`
    ///
    /// Keyframes that would land on an occupied frame are skipped.
    pub(crate) fn paste(&self, tree: &mut LayerTree, target: LayerId, frame: u32) -> Result<PasteReport> {
        let min = self
            .min_frame()
            .ok_or_else(|| TimelineError::invalid("clipboard is empty"))?;
        let layer = tree.layer_mut(target)?;
        ensure_track(layer)?;

        let mut report = PasteReport::default();
        for entry in &self.entries {
            let to_frame = (entry.keyframe.frame - min)
                .checked_add(frame)
                .ok_or_else(|| TimelineError::invalid(format!("paste at {frame} overflows the frame range")))?;
            if layer.keyframe_at(to_frame).is_some() {
                report.skipped.push(to_frame);
                continue;
            }
            let mut keyframe = entry.keyframe.clone();
            keyframe.id = KeyframeId::new();
            keyframe.frame = to_frame;
            layer.insert_keyframe(keyframe)?;
            report.applied.push(to_frame);
        }
        Ok(report)
    }
}

fn dedup(refs: &[KeyframeRef]) -> Vec<KeyframeRef> {
    let mut seen = HashSet::with_capacity(refs.len());
    refs.iter().copied().filter(|r| seen.insert(*r)).collect()
}

fn ensure_track(layer: &Layer) -> Result<()> {
    if layer.is_folder() {
        return Err(TimelineError::invalid(format!("{} is a folder", layer.id)));
    }
    Ok(())
}

/// Move keyframes into `target`, the first reference landing on `target_frame`
///
/// The offset from the first reference applies to every keyframe. The
/// move is rejected as a whole if any destination frame is occupied by a
/// keyframe that is not itself being moved.
pub(crate) fn move_keyframes(
    tree: &mut LayerTree,
    refs: &[KeyframeRef],
    target: LayerId,
    target_frame: u32,
) -> Result<MoveReport> {
    let refs = dedup(refs);
    let first = refs
        .first()
        .ok_or_else(|| TimelineError::invalid("no keyframes selected"))?;
    ensure_track(tree.layer(target)?)?;
    for r in &refs {
        if tree.layer(r.layer)?.keyframe_at(r.frame).is_none() {
            return Err(TimelineError::KeyframeNotFound {
                layer: r.layer,
                frame: r.frame,
            });
        }
    }

    let offset = i64::from(target_frame) - i64::from(first.frame);
    let mut plan = Vec::with_capacity(refs.len());
    let mut destinations = HashSet::with_capacity(refs.len());
    let moving: HashSet<KeyframeRef> = refs.iter().copied().collect();
    let target_layer = tree.layer(target)?;
    for r in &refs {
        let to_frame = u32::try_from(i64::from(r.frame) + offset).map_err(|_| {
            TimelineError::invalid(format!("keyframe {r} would move outside the frame range"))
        })?;
        let occupied = target_layer.keyframe_at(to_frame).is_some()
            && !moving.contains(&KeyframeRef::new(target, to_frame));
        if occupied || !destinations.insert(to_frame) {
            return Err(TimelineError::FrameCollision {
                layer: target,
                frame: to_frame,
            });
        }
        plan.push(MovedKeyframe {
            from_layer: r.layer,
            from_frame: r.frame,
            to_frame,
        });
    }

    let mut lifted = Vec::with_capacity(plan.len());
    for step in &plan {
        let mut keyframe = tree.layer_mut(step.from_layer)?.delete_keyframe(step.from_frame)?;
        keyframe.frame = step.to_frame;
        lifted.push(keyframe);
    }
    let target_layer = tree.layer_mut(target)?;
    for keyframe in lifted {
        target_layer.insert_keyframe(keyframe)?;
    }

    Ok(MoveReport { offset, moved: plan })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::keyframe::PropertyMap;
    use crate::layer::LayerKind;

    fn tree_with(layers: &[&[u32]]) -> (LayerTree, Vec<LayerId>) {
        let mut tree = LayerTree::new();
        let mut ids = Vec::new();
        for frames in layers {
            let mut layer = Layer::new("L", LayerKind::Layer, [0, 0, 0]);
            for &frame in *frames {
                layer
                    .insert_keyframe(Keyframe::new(frame, PropertyMap::new()).with_property("f", frame as f32))
                    .unwrap();
            }
            ids.push(layer.id);
            tree.insert(layer, None);
        }
        (tree, ids)
    }

    fn frames(tree: &LayerTree, id: LayerId) -> Vec<u32> {
        tree.get(id).unwrap().keyframes().iter().map(|k| k.frame).collect()
    }

    #[test]
    fn test_ref_parse() {
        let id = LayerId::new();
        let r: KeyframeRef = format!("{id}:12").parse().unwrap();
        assert_eq!(r, KeyframeRef::new(id, 12));
        assert_eq!(r.to_string().parse::<KeyframeRef>().unwrap(), r);
        assert!("nonsense".parse::<KeyframeRef>().is_err());
        assert!(format!("{id}:-1").parse::<KeyframeRef>().is_err());
    }

    #[test]
    fn test_copy_paste_skips_occupied() {
        let (mut tree, ids) = tree_with(&[&[2, 4], &[12]]);
        let (a, b) = (ids[0], ids[1]);
        let mut clipboard = Clipboard::new();
        clipboard
            .copy(&tree, &[KeyframeRef::new(a, 2), KeyframeRef::new(a, 4)])
            .unwrap();
        let report = clipboard.paste(&mut tree, b, 10).unwrap();
        assert_eq!(report.applied, vec![10]);
        assert_eq!(report.skipped, vec![12]);
        assert_eq!(frames(&tree, b), vec![10, 12]);
        let pasted = tree.get(b).unwrap().keyframe_at(10).unwrap();
        assert_ne!(pasted.id, tree.get(a).unwrap().keyframe_at(2).unwrap().id);
    }

    #[test]
    fn test_paste_offsets_from_minimum() {
        let (mut tree, ids) = tree_with(&[&[6, 3], &[]]);
        let mut clipboard = Clipboard::new();
        clipboard
            .copy(&tree, &[KeyframeRef::new(ids[0], 6), KeyframeRef::new(ids[0], 3)])
            .unwrap();
        let report = clipboard.paste(&mut tree, ids[1], 0).unwrap();
        assert_eq!(report.applied, vec![3, 0]);
        assert_eq!(frames(&tree, ids[1]), vec![0, 3]);
    }

    #[test]
    fn test_copy_is_all_or_nothing() {
        let (tree, ids) = tree_with(&[&[1]]);
        let mut clipboard = Clipboard::new();
        clipboard.copy(&tree, &[KeyframeRef::new(ids[0], 1)]).unwrap();
        assert!(clipboard
            .copy(&tree, &[KeyframeRef::new(ids[0], 1), KeyframeRef::new(ids[0], 9)])
            .is_err());
        assert_eq!(clipboard.len(), 1);
    }

    #[test]
    fn test_paste_empty_clipboard_fails() {
        let (mut tree, ids) = tree_with(&[&[]]);
        assert!(matches!(
            Clipboard::new().paste(&mut tree, ids[0], 0),
            Err(TimelineError::InvalidArgument(_))
        ));
    }

    #[test]
    fn test_move_uses_first_reference_offset() {
        let (mut tree, ids) = tree_with(&[&[4, 2], &[], &[9]]);
        let (a, b, target) = (ids[0], ids[1], ids[2]);
        tree.layer_mut(b)
            .unwrap()
            .insert_keyframe(Keyframe::new(3, PropertyMap::new()))
            .unwrap();
        let report = move_keyframes(
            &mut tree,
            &[KeyframeRef::new(a, 4), KeyframeRef::new(a, 2), KeyframeRef::new(b, 3)],
            target,
            5,
        )
        .unwrap();
        assert_eq!(report.offset, 1);
        assert_eq!(frames(&tree, target), vec![3, 4, 5, 9]);
        assert!(frames(&tree, a).is_empty());
        assert!(frames(&tree, b).is_empty());
    }

    #[test]
    fn test_move_collision_aborts() {
        let (mut tree, ids) = tree_with(&[&[0, 1], &[5]]);
        let (source, target) = (ids[0], ids[1]);
        let before = tree.clone();
        let err = move_keyframes(
            &mut tree,
            &[KeyframeRef::new(source, 0), KeyframeRef::new(source, 1)],
            target,
            4,
        )
        .unwrap_err();
        assert!(matches!(err, TimelineError::FrameCollision { frame: 5, .. }));
        assert_eq!(tree, before);
    }

    #[test]
    fn test_move_within_layer_over_moved_frames() {
        let (mut tree, ids) = tree_with(&[&[0, 1, 2]]);
        let layer = ids[0];
        move_keyframes(
            &mut tree,
            &[KeyframeRef::new(layer, 0), KeyframeRef::new(layer, 1), KeyframeRef::new(layer, 2)],
            layer,
            1,
        )
        .unwrap();
        assert_eq!(frames(&tree, layer), vec![1, 2, 3]);
        let moved = tree.get(layer).unwrap().keyframe_at(1).unwrap();
        assert_eq!(moved.properties["f"].as_number(), Some(0.0));
    }

    #[test]
    fn test_move_rejects_negative_frames() {
        let (mut tree, ids) = tree_with(&[&[5, 1]]);
        let layer = ids[0];
        let err = move_keyframes(
            &mut tree,
            &[KeyframeRef::new(layer, 5), KeyframeRef::new(layer, 1)],
            layer,
            2,
        )
        .unwrap_err();
        assert!(matches!(err, TimelineError::InvalidArgument(_)));
        assert_eq!(frames(&tree, layer), vec![1, 5]);
    }

    #[test]
    fn test_move_missing_keyframe() {
        let (mut tree, ids) = tree_with(&[&[0], &[]]);
        assert!(matches!(
            move_keyframes(&mut tree, &[KeyframeRef::new(ids[0], 7)], ids[1], 0),
            Err(TimelineError::KeyframeNotFound { frame: 7, .. })
        ));
    }
}
