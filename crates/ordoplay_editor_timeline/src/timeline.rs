// SPDX-License-Identifier: MIT OR Apache-2.0
//! The timeline root.
//!
//! [`Timeline`] owns the layer tree, the event bus, the clipboard and the
//! time state. Every mutation goes through it so that each successful
//! edit emits exactly one [`TimelineEvent`]. A timeline holds no internal
//! locks; hosts sharing one across threads must serialize mutating calls.

use crate::clipboard::{self, Clipboard, KeyframeRef, MoveReport, PasteReport};
use crate::config::TimelineConfig;
use crate::easing::Easing;
use crate::error::{Result, TimelineError};
use crate::evaluate::{evaluate_tree, Evaluation};
use crate::event::{DeleteRequest, EventBus, EventKind, SubscriptionId, TimelineEvent};
use crate::keyframe::{Keyframe, KeyframeId, PropertyMap, PropertyValue};
use crate::layer::{FrameDeletion, Layer, LayerId, LayerKind};
use crate::snapshot::{LayerSnapshot, TimelineSnapshot};
use crate::tree::LayerTree;
use crate::tween::Tween;

/// Keyframe-based animation timeline
#[derive(Debug)]
pub struct Timeline {
    /// Layers and folders
    tree: LayerTree,
    /// Change notifications
    events: EventBus,
    /// Copied keyframes
    clipboard: Clipboard,
    /// Settings the timeline was created with
    config: TimelineConfig,
    /// Playhead position in frames
    current_time: f32,
    /// Duration in frames
    duration: f32,
    /// Pixels per frame (display only)
    time_scale: f32,
    /// Layers created so far, for default names and colors
    layers_created: usize,
    /// Folders created so far, for default names
    folders_created: usize,
}

impl Timeline {
    /// Create an empty timeline with default settings
    pub fn new() -> Self {
        Self::from_valid_config(TimelineConfig::default())
    }

    /// Create an empty timeline from validated settings
    pub fn with_config(config: TimelineConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self::from_valid_config(config))
    }

    fn from_valid_config(config: TimelineConfig) -> Self {
        tracing::info!(
            duration = config.duration,
            frame_rate = config.frame_rate,
            "Created timeline"
        );
        Self {
            tree: LayerTree::new(),
            events: EventBus::new(),
            clipboard: Clipboard::new(),
            current_time: 0.0,
            duration: config.duration,
            time_scale: config.time_scale,
            layers_created: 0,
            folders_created: 0,
            config,
        }
    }

    /// Create a timeline from a snapshot
    pub fn from_snapshot(snapshot: &TimelineSnapshot) -> Result<Self> {
        let mut timeline = Self::new();
        timeline.import_snapshot(snapshot)?;
        Ok(timeline)
    }

    fn emit(&mut self, event: TimelineEvent) {
        self.events.emit(&event);
    }

    // --- Subscriptions ---

    /// Register a callback for every event
    pub fn subscribe(&mut self, callback: impl FnMut(&TimelineEvent) + Send + 'static) -> SubscriptionId {
        self.events.subscribe(callback)
    }

    /// Register a callback for one kind of event
    pub fn subscribe_kind(
        &mut self,
        kind: EventKind,
        callback: impl FnMut(&TimelineEvent) + Send + 'static,
    ) -> SubscriptionId {
        self.events.subscribe_kind(kind, callback)
    }

    /// Register a before-delete hook that may veto deletions
    pub fn on_before_delete(&mut self, hook: impl FnMut(&mut DeleteRequest) + Send + 'static) -> SubscriptionId {
        self.events.on_before_delete(hook)
    }

    /// Remove a subscription or hook
    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        self.events.unsubscribe(id)
    }

    // --- Layer tree ---

    /// Add a layer, at the root unless `parent` is an existing folder
    pub fn add_layer(&mut self, name: Option<&str>, parent: Option<LayerId>) -> LayerId {
        self.layers_created += 1;
        let name = name
            .map(str::to_string)
            .unwrap_or_else(|| format!("{} {}", self.config.default_layer_name, self.layers_created));
        self.add_object(name, LayerKind::Layer, parent)
    }

    /// Add a folder, at the root unless `parent` is an existing folder
    pub fn add_folder(&mut self, name: Option<&str>, parent: Option<LayerId>) -> LayerId {
        self.folders_created += 1;
        let name = name
            .map(str::to_string)
            .unwrap_or_else(|| format!("{} {}", self.config.default_folder_name, self.folders_created));
        self.add_object(name, LayerKind::Folder, parent)
    }

    fn add_object(&mut self, name: String, kind: LayerKind, parent: Option<LayerId>) -> LayerId {
        let color = self
            .config
            .color_for(self.layers_created + self.folders_created - 1);
        let layer = Layer::new(name, kind, color);
        let id = layer.id;
        let placed = self.tree.insert(layer, parent);
        if parent.is_some() && placed.is_none() {
            tracing::debug!(?parent, %id, "Parent is not a folder, added at root");
        }
        tracing::debug!(%id, kind = kind.name(), "Added object");
        self.emit(TimelineEvent::ObjectAdded {
            id,
            kind,
            parent: placed,
        });
        id
    }

    /// Delete a layer or folder with everything it owns
    ///
    /// Before-delete hooks run first; if any cancels, nothing changes and
    /// `Cancelled` is returned. Returns the IDs of every removed object.
    pub fn delete_object(&mut self, id: LayerId) -> Result<Vec<LayerId>> {
        let kind = self.tree.layer(id)?.kind;
        let mut request = DeleteRequest::new(id, kind, self.tree.subtree(id));
        if !self.events.confirm_delete(&mut request) {
            tracing::warn!(%id, "Delete cancelled by observer");
            return Err(TimelineError::Cancelled(id));
        }
        let removed: Vec<LayerId> = self.tree.remove(id)?.iter().map(|layer| layer.id).collect();
        tracing::debug!(%id, count = removed.len(), "Deleted object");
        self.emit(TimelineEvent::ObjectDeleted {
            id,
            removed: removed.clone(),
        });
        Ok(removed)
    }

    /// Rename a layer or folder
    pub fn rename_object(&mut self, id: LayerId, name: impl Into<String>) -> Result<()> {
        let new_name = name.into();
        let old_name = self.tree.rename(id, new_name.clone())?;
        tracing::debug!(%id, %old_name, %new_name, "Renamed object");
        self.emit(TimelineEvent::ObjectRenamed {
            id,
            old_name,
            new_name,
        });
        Ok(())
    }

    /// Move an object within its parent; returns the clamped index
    pub fn reorder_object(&mut self, id: LayerId, new_index: usize) -> Result<usize> {
        let (old_index, new_index) = self.tree.reorder(id, new_index)?;
        tracing::debug!(%id, old_index, new_index, "Reordered object");
        self.emit(TimelineEvent::ObjectReordered {
            id,
            old_index,
            new_index,
        });
        Ok(new_index)
    }

    /// Move an object under another folder (`None` for the root)
    pub fn reparent_object(&mut self, id: LayerId, new_parent: Option<LayerId>) -> Result<()> {
        let old_parent = self.tree.reparent(id, new_parent)?;
        tracing::debug!(%id, ?old_parent, ?new_parent, "Reparented object");
        self.emit(TimelineEvent::ObjectReparented {
            id,
            old_parent,
            new_parent,
        });
        Ok(())
    }

    /// Flip visibility; returns the new value
    pub fn toggle_visibility(&mut self, id: LayerId) -> Result<bool> {
        let layer = self.tree.layer_mut(id)?;
        let old = layer.visible;
        layer.visible = !old;
        tracing::debug!(%id, visible = !old, "Toggled visibility");
        self.emit(TimelineEvent::VisibilityToggled { id, old, new: !old });
        Ok(!old)
    }

    /// Flip the lock flag; returns the new value
    pub fn toggle_lock(&mut self, id: LayerId) -> Result<bool> {
        let layer = self.tree.layer_mut(id)?;
        let old = layer.locked;
        layer.locked = !old;
        tracing::debug!(%id, locked = !old, "Toggled lock");
        self.emit(TimelineEvent::LockToggled { id, old, new: !old });
        Ok(!old)
    }

    /// Change the display color
    pub fn set_layer_color(&mut self, id: LayerId, color: [u8; 3]) -> Result<()> {
        let layer = self.tree.layer_mut(id)?;
        let old = std::mem::replace(&mut layer.color, color);
        tracing::debug!(%id, ?old, new = ?color, "Recolored object");
        self.emit(TimelineEvent::ObjectRecolored { id, old, new: color });
        Ok(())
    }

    // --- Keyframes ---

    /// Insert a keyframe holding the layer's current state at `frame`
    pub fn insert_keyframe(&mut self, layer: LayerId, frame: u32) -> Result<KeyframeId> {
        let properties = self
            .tree
            .layer(layer)?
            .evaluate(frame as f32, self.config.hit_tolerance);
        self.insert(layer, Keyframe::new(frame, properties))
    }

    /// Insert a blank keyframe at `frame`
    pub fn insert_blank_keyframe(&mut self, layer: LayerId, frame: u32) -> Result<KeyframeId> {
        self.insert(layer, Keyframe::blank(frame))
    }

    /// Insert a keyframe with explicit properties
    pub fn insert_keyframe_with(&mut self, layer: LayerId, frame: u32, properties: PropertyMap) -> Result<KeyframeId> {
        self.insert(layer, Keyframe::new(frame, properties))
    }

    fn insert(&mut self, layer_id: LayerId, keyframe: Keyframe) -> Result<KeyframeId> {
        let (id, frame, blank) = (keyframe.id, keyframe.frame, keyframe.is_empty);
        if let Err(err) = self.tree.layer_mut(layer_id)?.insert_keyframe(keyframe) {
            tracing::debug!(layer = %layer_id, frame, "Keyframe insert rejected: {err}");
            return Err(err);
        }
        tracing::debug!(layer = %layer_id, frame, blank, "Inserted keyframe");
        self.emit(TimelineEvent::KeyframeAdded {
            layer: layer_id,
            frame,
            blank,
        });
        Ok(id)
    }

    /// Write one property of an existing keyframe
    pub fn set_keyframe_property(
        &mut self,
        layer: LayerId,
        frame: u32,
        key: impl Into<String>,
        value: impl Into<PropertyValue>,
    ) -> Result<()> {
        let key = key.into();
        self.tree
            .layer_mut(layer)?
            .keyframe_at_mut(frame)
            .ok_or(TimelineError::KeyframeNotFound { layer, frame })?
            .set_property(key.clone(), value);
        tracing::debug!(%layer, frame, property = %key, "Updated keyframe property");
        self.emit(TimelineEvent::KeyframeUpdated {
            layer,
            frame,
            property: key,
        });
        Ok(())
    }

    /// Remove the keyframe at exactly `frame`; tweens are left alone
    pub fn delete_keyframe(&mut self, layer: LayerId, frame: u32) -> Result<Keyframe> {
        let removed = self.tree.layer_mut(layer)?.delete_keyframe(frame)?;
        tracing::debug!(%layer, frame, "Deleted keyframe");
        self.emit(TimelineEvent::KeyframeRemoved { layer, frame });
        Ok(removed)
    }

    /// Ripple-insert one frame at `frame`
    pub fn insert_frame(&mut self, layer: LayerId, frame: u32) -> Result<()> {
        self.tree.layer_mut(layer)?.insert_frame(frame)?;
        tracing::debug!(%layer, frame, "Inserted frame");
        self.emit(TimelineEvent::FrameInserted { layer, frame });
        Ok(())
    }

    /// Delete the inclusive frame range and close the gap
    pub fn delete_frames(&mut self, layer: LayerId, start: u32, end: u32) -> Result<FrameDeletion> {
        let deletion = self.tree.layer_mut(layer)?.delete_frames(start, end)?;
        tracing::debug!(
            %layer,
            start,
            end,
            keyframes = deletion.removed_keyframes.len(),
            tweens = deletion.removed_tweens.len(),
            "Deleted frames"
        );
        self.emit(TimelineEvent::FramesDeleted {
            layer,
            start,
            end,
            removed_keyframes: deletion.removed_keyframes.clone(),
            removed_tweens: deletion.removed_tweens.len(),
        });
        Ok(deletion)
    }

    // --- Tweens ---

    /// Create a motion tween between two existing keyframes
    pub fn create_motion_tween(&mut self, layer: LayerId, start: u32, end: u32, easing: Easing) -> Result<Tween> {
        let tween = match self.tree.layer_mut(layer)?.create_tween(start, end, easing) {
            Ok(tween) => tween,
            Err(err) => {
                tracing::debug!(%layer, start, end, "Tween rejected: {err}");
                return Err(err);
            }
        };
        tracing::debug!(%layer, start, end, easing = easing.name(), "Created tween");
        self.emit(TimelineEvent::TweenAdded {
            layer,
            start,
            end,
            easing,
        });
        Ok(tween)
    }

    /// Remove the tween with exactly these endpoints
    pub fn remove_tween(&mut self, layer: LayerId, start: u32, end: u32) -> Result<Tween> {
        let tween = self.tree.layer_mut(layer)?.remove_tween(start, end)?;
        tracing::debug!(%layer, start, end, "Removed tween");
        self.emit(TimelineEvent::TweenRemoved { layer, start, end });
        Ok(tween)
    }

    /// Change a tween's easing
    pub fn set_tween_easing(&mut self, layer: LayerId, start: u32, end: u32, easing: Easing) -> Result<()> {
        let old = self.tree.layer_mut(layer)?.set_tween_easing(start, end, easing)?;
        tracing::debug!(%layer, start, end, old = old.name(), new = easing.name(), "Changed tween easing");
        self.emit(TimelineEvent::TweenUpdated {
            layer,
            start,
            end,
            old,
            new: easing,
        });
        Ok(())
    }

    /// Get the tween covering `frame` (start exclusive, end inclusive)
    pub fn tween_at_frame(&self, layer: LayerId, frame: u32) -> Result<Option<&Tween>> {
        Ok(self.tree.layer(layer)?.tween_at(frame))
    }

    // --- Clipboard and moves ---

    /// Move keyframes into `target`, the first reference landing on `frame`
    pub fn move_keyframes(&mut self, refs: &[KeyframeRef], target: LayerId, frame: u32) -> Result<MoveReport> {
        let report = match clipboard::move_keyframes(&mut self.tree, refs, target, frame) {
            Ok(report) => report,
            Err(err) => {
                tracing::debug!(%target, frame, "Move rejected: {err}");
                return Err(err);
            }
        };
        tracing::debug!(%target, offset = report.offset, count = report.moved.len(), "Moved keyframes");
        self.emit(TimelineEvent::KeyframesMoved {
            target,
            offset: report.offset,
            moved: report.moved.clone(),
        });
        Ok(report)
    }

    /// Snapshot keyframes into the clipboard; returns how many were copied
    pub fn copy_keyframes(&mut self, refs: &[KeyframeRef]) -> Result<usize> {
        let count = self.clipboard.copy(&self.tree, refs)?;
        tracing::debug!(count, "Copied keyframes");
        Ok(count)
    }

    /// Paste the clipboard into `target`, the lowest copied frame landing on `frame`
    pub fn paste_keyframes(&mut self, target: LayerId, frame: u32) -> Result<PasteReport> {
        let report = self.clipboard.paste(&mut self.tree, target, frame)?;
        tracing::debug!(
            %target,
            applied = report.applied_count(),
            skipped = report.skipped_count(),
            "Pasted keyframes"
        );
        self.emit(TimelineEvent::KeyframesPasted {
            layer: target,
            applied: report.applied.clone(),
            skipped: report.skipped.clone(),
        });
        Ok(report)
    }

    /// Current clipboard contents
    pub fn clipboard(&self) -> &Clipboard {
        &self.clipboard
    }

    // --- Evaluation and queries ---

    /// Evaluate every visible layer at `time` (in frames)
    pub fn evaluate_at_time(&self, time: f32) -> Evaluation {
        evaluate_tree(&self.tree, time, self.config.hit_tolerance)
    }

    /// Evaluate one layer at `time`, regardless of visibility
    pub fn evaluate_layer(&self, layer: LayerId, time: f32) -> Result<PropertyMap> {
        Ok(self.tree.layer(layer)?.evaluate(time, self.config.hit_tolerance))
    }

    /// Keyframes within `tolerance` of `time`, in display order
    pub fn keyframes_at_time(&self, time: f32, tolerance: f32) -> Vec<(LayerId, &Keyframe)> {
        self.layers_flat()
            .into_iter()
            .flat_map(|(_, layer)| {
                layer
                    .keyframes()
                    .iter()
                    .filter(move |k| (k.time() - time).abs() <= tolerance)
                    .map(move |k| (layer.id, k))
            })
            .collect()
    }

    /// Get a layer by ID
    pub fn layer(&self, id: LayerId) -> Option<&Layer> {
        self.tree.get(id)
    }

    /// The layer tree
    pub fn tree(&self) -> &LayerTree {
        &self.tree
    }

    /// Root-level IDs in display order
    pub fn root_ids(&self) -> &[LayerId] {
        self.tree.roots()
    }

    /// Child IDs of a folder in display order
    pub fn children(&self, id: LayerId) -> Result<&[LayerId]> {
        Ok(self.tree.layer(id)?.children())
    }

    /// All layers depth-first with their nesting depth
    pub fn layers_flat(&self) -> Vec<(usize, &Layer)> {
        self.tree
            .walk()
            .into_iter()
            .filter_map(|(depth, id)| self.tree.get(id).map(|layer| (depth, layer)))
            .collect()
    }

    /// Nested view of the tree
    pub fn layers_tree(&self) -> Result<Vec<LayerSnapshot>> {
        self.tree
            .roots()
            .iter()
            .map(|&id| LayerSnapshot::capture(&self.tree, id))
            .collect()
    }

    /// Frame of the last keyframe on any layer
    pub fn content_duration(&self) -> u32 {
        self.tree.iter().filter_map(Layer::last_frame).max().unwrap_or(0)
    }

    // --- Time state ---

    /// Playhead position in frames
    pub fn current_time(&self) -> f32 {
        self.current_time
    }

    /// Move the playhead, clamped to `[0, duration]`; returns the applied time
    pub fn set_current_time(&mut self, time: f32) -> f32 {
        let new = if time.is_nan() { 0.0 } else { time.clamp(0.0, self.duration) };
        let old = std::mem::replace(&mut self.current_time, new);
        if old != new {
            self.emit(TimelineEvent::CurrentTimeChanged { old, new });
        }
        new
    }

    /// Duration in frames
    pub fn duration(&self) -> f32 {
        self.duration
    }

    /// Set the duration; the playhead is pulled back inside if needed
    pub fn set_duration(&mut self, duration: f32) -> Result<()> {
        if duration.is_nan() || duration < 0.0 {
            return Err(TimelineError::invalid(format!(
                "duration must not be negative, got {duration}"
            )));
        }
        let old = std::mem::replace(&mut self.duration, duration);
        if old != duration {
            self.emit(TimelineEvent::DurationChanged { old, new: duration });
        }
        if self.current_time > duration {
            self.set_current_time(duration);
        }
        Ok(())
    }

    /// Grow the duration to `time + padding` if that exceeds it
    ///
    /// Returns whether the duration changed.
    pub fn auto_extend_duration(&mut self, time: f32, padding: f32) -> bool {
        let wanted = time + padding;
        if wanted.is_nan() || wanted <= self.duration {
            return false;
        }
        let old = std::mem::replace(&mut self.duration, wanted);
        tracing::debug!(old, new = wanted, "Extended duration");
        self.emit(TimelineEvent::DurationChanged { old, new: wanted });
        true
    }

    /// [`Self::auto_extend_duration`] with the configured padding
    pub fn auto_extend(&mut self, time: f32) -> bool {
        self.auto_extend_duration(time, self.config.auto_extend_padding)
    }

    /// Pixels per frame (display only)
    pub fn time_scale(&self) -> f32 {
        self.time_scale
    }

    /// Settings the timeline was created with
    pub fn config(&self) -> &TimelineConfig {
        &self.config
    }

    /// Convert frame number to seconds
    pub fn frame_to_time(&self, frame: u32) -> f32 {
        frame as f32 / self.config.frame_rate
    }

    /// Convert seconds to frame number
    pub fn time_to_frame(&self, seconds: f32) -> u32 {
        (seconds.max(0.0) * self.config.frame_rate) as u32
    }

    // --- Snapshots ---

    /// Capture the whole timeline
    pub fn export_snapshot(&self) -> Result<TimelineSnapshot> {
        TimelineSnapshot::capture(&self.tree, self.duration, self.current_time, self.time_scale)
    }

    /// Export as pretty JSON
    pub fn to_json(&self) -> Result<String> {
        let json = self.export_snapshot()?.to_json()?;
        tracing::info!(layers = self.tree.len(), "Exported timeline snapshot");
        Ok(json)
    }

    /// Export as pretty RON
    pub fn to_ron(&self) -> Result<String> {
        self.export_snapshot()?.to_ron()
    }

    /// Replace the whole timeline with a snapshot
    ///
    /// The snapshot is fully validated first; on error nothing changes.
    pub fn import_snapshot(&mut self, snapshot: &TimelineSnapshot) -> Result<()> {
        let tree = match snapshot.build_tree() {
            Ok(tree) => tree,
            Err(err) => {
                tracing::warn!("Rejected timeline snapshot: {err}");
                return Err(err);
            }
        };
        self.tree = tree;
        self.duration = snapshot.duration;
        self.current_time = snapshot.current_time.clamp(0.0, snapshot.duration);
        self.time_scale = snapshot.time_scale;
        let layer_count = self.tree.len();
        tracing::info!(layer_count, "Imported timeline snapshot");
        self.emit(TimelineEvent::SnapshotImported { layer_count });
        Ok(())
    }

    /// Import a JSON snapshot; malformed input leaves the timeline untouched
    pub fn import_json(&mut self, text: &str) -> Result<()> {
        let snapshot = TimelineSnapshot::from_json(text).inspect_err(|err| {
            tracing::warn!("Unreadable timeline JSON: {err}");
        })?;
        self.import_snapshot(&snapshot)
    }

    /// Import a RON snapshot; malformed input leaves the timeline untouched
    pub fn import_ron(&mut self, text: &str) -> Result<()> {
        let snapshot = TimelineSnapshot::from_ron(text).inspect_err(|err| {
            tracing::warn!("Unreadable timeline RON: {err}");
        })?;
        self.import_snapshot(&snapshot)
    }
}

impl Default for Timeline {
    fn default() -> Self {
        Self::new()
    }
}
