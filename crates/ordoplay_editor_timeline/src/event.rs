// SPDX-License-Identifier: MIT OR Apache-2.0
//! Change notifications.
//!
//! Every successful mutation emits exactly one [`TimelineEvent`] after the
//! mutation has completed. Consumers subscribe to everything or to a
//! single [`EventKind`]. Deletion additionally runs the before-delete
//! hooks first, any of which may veto it.

use crate::easing::Easing;
use crate::layer::{LayerId, LayerKind};

/// Kind tag of a [`TimelineEvent`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    /// A layer or folder was added
    ObjectAdded,
    /// A layer or folder (and its subtree) was deleted
    ObjectDeleted,
    /// A layer or folder was renamed
    ObjectRenamed,
    /// A layer or folder moved within its parent
    ObjectReordered,
    /// A layer or folder moved to another parent
    ObjectReparented,
    /// Visibility flag flipped
    VisibilityToggled,
    /// Lock flag flipped
    LockToggled,
    /// Display color changed
    ObjectRecolored,
    /// A keyframe was inserted
    KeyframeAdded,
    /// A keyframe was removed
    KeyframeRemoved,
    /// A keyframe property was written
    KeyframeUpdated,
    /// One frame was ripple-inserted
    FrameInserted,
    /// A frame range was deleted
    FramesDeleted,
    /// Keyframes moved across layers
    KeyframesMoved,
    /// Clipboard keyframes were pasted
    KeyframesPasted,
    /// A tween was created
    TweenAdded,
    /// A tween was removed
    TweenRemoved,
    /// A tween's easing changed
    TweenUpdated,
    /// The playhead moved
    CurrentTimeChanged,
    /// The timeline duration changed
    DurationChanged,
    /// The whole tree was replaced from a snapshot
    SnapshotImported,
}

impl EventKind {
    /// Stable event name
    pub fn name(&self) -> &'static str {
        match self {
            Self::ObjectAdded => "object-added",
            Self::ObjectDeleted => "object-deleted",
            Self::ObjectRenamed => "object-renamed",
            Self::ObjectReordered => "object-reordered",
            Self::ObjectReparented => "object-reparented",
            Self::VisibilityToggled => "visibility-toggled",
            Self::LockToggled => "lock-toggled",
            Self::ObjectRecolored => "object-recolored",
            Self::KeyframeAdded => "keyframe-added",
            Self::KeyframeRemoved => "keyframe-removed",
            Self::KeyframeUpdated => "keyframe-updated",
            Self::FrameInserted => "frame-inserted",
            Self::FramesDeleted => "frames-deleted",
            Self::KeyframesMoved => "keyframes-moved",
            Self::KeyframesPasted => "keyframes-pasted",
            Self::TweenAdded => "tween-added",
            Self::TweenRemoved => "tween-removed",
            Self::TweenUpdated => "tween-updated",
            Self::CurrentTimeChanged => "current-time-changed",
            Self::DurationChanged => "duration-changed",
            Self::SnapshotImported => "snapshot-imported",
        }
    }
}

impl std::fmt::Display for EventKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// One keyframe relocated by a move
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MovedKeyframe {
    /// Layer the keyframe came from
    pub from_layer: LayerId,
    /// Frame it came from
    pub from_frame: u32,
    /// Frame it landed on in the target layer
    pub to_frame: u32,
}

/// Structured change notification
#[derive(Debug, Clone, PartialEq)]
pub enum TimelineEvent {
    /// A layer or folder was added
    ObjectAdded {
        /// New object
        id: LayerId,
        /// Layer or folder
        kind: LayerKind,
        /// Folder it was placed in
        parent: Option<LayerId>,
    },
    /// An object and its subtree were deleted
    ObjectDeleted {
        /// Requested object
        id: LayerId,
        /// Every removed object, the requested one first
        removed: Vec<LayerId>,
    },
    /// An object was renamed
    ObjectRenamed {
        /// Renamed object
        id: LayerId,
        /// Previous name
        old_name: String,
        /// New name
        new_name: String,
    },
    /// An object moved within its parent
    ObjectReordered {
        /// Moved object
        id: LayerId,
        /// Previous index
        old_index: usize,
        /// New index
        new_index: usize,
    },
    /// An object moved to another parent
    ObjectReparented {
        /// Moved object
        id: LayerId,
        /// Previous parent
        old_parent: Option<LayerId>,
        /// New parent
        new_parent: Option<LayerId>,
    },
    /// Visibility flipped
    VisibilityToggled {
        /// Affected object
        id: LayerId,
        /// Previous value
        old: bool,
        /// New value
        new: bool,
    },
    /// Lock flipped
    LockToggled {
        /// Affected object
        id: LayerId,
        /// Previous value
        old: bool,
        /// New value
        new: bool,
    },
    /// Display color changed
    ObjectRecolored {
        /// Affected object
        id: LayerId,
        /// Previous color
        old: [u8; 3],
        /// New color
        new: [u8; 3],
    },
    /// A keyframe was inserted
    KeyframeAdded {
        /// Owning layer
        layer: LayerId,
        /// Keyframe frame
        frame: u32,
        /// Whether it is a blank keyframe
        blank: bool,
    },
    /// A keyframe was removed
    KeyframeRemoved {
        /// Owning layer
        layer: LayerId,
        /// Removed frame
        frame: u32,
    },
    /// A keyframe property was written
    KeyframeUpdated {
        /// Owning layer
        layer: LayerId,
        /// Keyframe frame
        frame: u32,
        /// Written property
        property: String,
    },
    /// One frame was ripple-inserted
    FrameInserted {
        /// Affected layer
        layer: LayerId,
        /// Insertion point
        frame: u32,
    },
    /// A frame range was deleted
    FramesDeleted {
        /// Affected layer
        layer: LayerId,
        /// First deleted frame
        start: u32,
        /// Last deleted frame
        end: u32,
        /// Frames of removed keyframes
        removed_keyframes: Vec<u32>,
        /// Number of dropped tweens
        removed_tweens: usize,
    },
    /// Keyframes moved into a target layer
    KeyframesMoved {
        /// Destination layer
        target: LayerId,
        /// Frame offset applied to every keyframe
        offset: i64,
        /// Every relocated keyframe
        moved: Vec<MovedKeyframe>,
    },
    /// Clipboard keyframes were pasted
    KeyframesPasted {
        /// Destination layer
        layer: LayerId,
        /// Frames that received a keyframe
        applied: Vec<u32>,
        /// Frames skipped because they were occupied
        skipped: Vec<u32>,
    },
    /// A tween was created
    TweenAdded {
        /// Owning layer
        layer: LayerId,
        /// Start frame
        start: u32,
        /// End frame
        end: u32,
        /// Easing
        easing: Easing,
    },
    /// A tween was removed
    TweenRemoved {
        /// Owning layer
        layer: LayerId,
        /// Start frame
        start: u32,
        /// End frame
        end: u32,
    },
    /// A tween's easing changed
    TweenUpdated {
        /// Owning layer
        layer: LayerId,
        /// Start frame
        start: u32,
        /// End frame
        end: u32,
        /// Previous easing
        old: Easing,
        /// New easing
        new: Easing,
    },
    /// The playhead moved
    CurrentTimeChanged {
        /// Previous time
        old: f32,
        /// New time
        new: f32,
    },
    /// The duration changed
    DurationChanged {
        /// Previous duration
        old: f32,
        /// New duration
        new: f32,
    },
    /// The tree was replaced from a snapshot
    SnapshotImported {
        /// Number of layers and folders now present
        layer_count: usize,
    },
}

impl TimelineEvent {
    /// Get the kind tag
    pub fn kind(&self) -> EventKind {
        match self {
            Self::ObjectAdded { .. } => EventKind::ObjectAdded,
            Self::ObjectDeleted { .. } => EventKind::ObjectDeleted,
            Self::ObjectRenamed { .. } => EventKind::ObjectRenamed,
            Self::ObjectReordered { .. } => EventKind::ObjectReordered,
            Self::ObjectReparented { .. } => EventKind::ObjectReparented,
            Self::VisibilityToggled { .. } => EventKind::VisibilityToggled,
            Self::LockToggled { .. } => EventKind::LockToggled,
            Self::ObjectRecolored { .. } => EventKind::ObjectRecolored,
            Self::KeyframeAdded { .. } => EventKind::KeyframeAdded,
            Self::KeyframeRemoved { .. } => EventKind::KeyframeRemoved,
            Self::KeyframeUpdated { .. } => EventKind::KeyframeUpdated,
            Self::FrameInserted { .. } => EventKind::FrameInserted,
            Self::FramesDeleted { .. } => EventKind::FramesDeleted,
            Self::KeyframesMoved { .. } => EventKind::KeyframesMoved,
            Self::KeyframesPasted { .. } => EventKind::KeyframesPasted,
            Self::TweenAdded { .. } => EventKind::TweenAdded,
            Self::TweenRemoved { .. } => EventKind::TweenRemoved,
            Self::TweenUpdated { .. } => EventKind::TweenUpdated,
            Self::CurrentTimeChanged { .. } => EventKind::CurrentTimeChanged,
            Self::DurationChanged { .. } => EventKind::DurationChanged,
            Self::SnapshotImported { .. } => EventKind::SnapshotImported,
        }
    }

    /// Stable event name
    pub fn name(&self) -> &'static str {
        self.kind().name()
    }

    /// Layers touched by this event
    pub fn layers(&self) -> Vec<LayerId> {
        match self {
            Self::ObjectDeleted { removed, .. } => removed.clone(),
            Self::ObjectAdded { id, .. }
            | Self::ObjectRenamed { id, .. }
            | Self::ObjectReordered { id, .. }
            | Self::ObjectReparented { id, .. }
            | Self::VisibilityToggled { id, .. }
            | Self::LockToggled { id, .. }
            | Self::ObjectRecolored { id, .. } => vec![*id],
            Self::KeyframeAdded { layer, .. }
            | Self::KeyframeRemoved { layer, .. }
            | Self::KeyframeUpdated { layer, .. }
            | Self::FrameInserted { layer, .. }
            | Self::FramesDeleted { layer, .. }
            | Self::KeyframesPasted { layer, .. }
            | Self::TweenAdded { layer, .. }
            | Self::TweenRemoved { layer, .. }
            | Self::TweenUpdated { layer, .. } => vec![*layer],
            Self::KeyframesMoved { target, moved, .. } => {
                let mut layers = vec![*target];
                for m in moved {
                    if !layers.contains(&m.from_layer) {
                        layers.push(m.from_layer);
                    }
                }
                layers
            }
            Self::CurrentTimeChanged { .. }
            | Self::DurationChanged { .. }
            | Self::SnapshotImported { .. } => Vec::new(),
        }
    }
}

/// Cancellable notification raised before an object is deleted
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeleteRequest {
    /// Object about to be deleted
    pub id: LayerId,
    /// Layer or folder
    pub kind: LayerKind,
    /// The object and its whole subtree
    pub subtree: Vec<LayerId>,
    cancelled: bool,
}

impl DeleteRequest {
    /// Create a new, uncancelled request
    pub fn new(id: LayerId, kind: LayerKind, subtree: Vec<LayerId>) -> Self {
        Self {
            id,
            kind,
            subtree,
            cancelled: false,
        }
    }

    /// Veto the deletion
    pub fn cancel(&mut self) {
        self.cancelled = true;
    }

    /// Whether any hook vetoed the deletion
    pub fn is_cancelled(&self) -> bool {
        self.cancelled
    }
}

/// Callback type for change notifications
pub type EventCallback = Box<dyn FnMut(&TimelineEvent) + Send>;

/// Callback type for before-delete hooks
pub type DeleteHook = Box<dyn FnMut(&mut DeleteRequest) + Send>;

/// Handle returned by subscriptions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

struct Listener {
    id: SubscriptionId,
    kind: Option<EventKind>,
    callback: EventCallback,
}

/// Synchronous dispatcher for timeline events
#[derive(Default)]
pub struct EventBus {
    next_id: u64,
    /// Change listeners, global or filtered by kind
    listeners: Vec<Listener>,
    /// Before-delete hooks
    delete_hooks: Vec<(SubscriptionId, DeleteHook)>,
}

impl EventBus {
    /// Create an empty bus
    pub fn new() -> Self {
        Self::default()
    }

    fn allocate_id(&mut self) -> SubscriptionId {
        self.next_id += 1;
        SubscriptionId(self.next_id)
    }

    /// Register a callback for every event
    pub fn subscribe(&mut self, callback: impl FnMut(&TimelineEvent) + Send + 'static) -> SubscriptionId {
        let id = self.allocate_id();
        self.listeners.push(Listener {
            id,
            kind: None,
            callback: Box::new(callback),
        });
        id
    }

    /// Register a callback for one kind of event
    pub fn subscribe_kind(
        &mut self,
        kind: EventKind,
        callback: impl FnMut(&TimelineEvent) + Send + 'static,
    ) -> SubscriptionId {
        let id = self.allocate_id();
        self.listeners.push(Listener {
            id,
            kind: Some(kind),
            callback: Box::new(callback),
        });
        id
    }

    /// Register a before-delete hook
    pub fn on_before_delete(&mut self, hook: impl FnMut(&mut DeleteRequest) + Send + 'static) -> SubscriptionId {
        let id = self.allocate_id();
        self.delete_hooks.push((id, Box::new(hook)));
        id
    }

    /// Remove a listener or hook; returns whether it existed
    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        let before = self.listeners.len() + self.delete_hooks.len();
        self.listeners.retain(|l| l.id != id);
        self.delete_hooks.retain(|(hook_id, _)| *hook_id != id);
        before != self.listeners.len() + self.delete_hooks.len()
    }

    /// Number of registered listeners and hooks
    pub fn subscriber_count(&self) -> usize {
        self.listeners.len() + self.delete_hooks.len()
    }

    /// Deliver an event to matching listeners, in registration order
    pub fn emit(&mut self, event: &TimelineEvent) {
        let kind = event.kind();
        tracing::trace!(event = kind.name(), "timeline event");
        for listener in &mut self.listeners {
            if listener.kind.map_or(true, |k| k == kind) {
                (listener.callback)(event);
            }
        }
    }

    /// Run every before-delete hook; returns `false` if any vetoed
    pub fn confirm_delete(&mut self, request: &mut DeleteRequest) -> bool {
        for (_, hook) in &mut self.delete_hooks {
            hook(request);
        }
        !request.is_cancelled()
    }
}

impl std::fmt::Debug for EventBus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventBus")
            .field("listeners", &self.listeners.len())
            .field("delete_hooks", &self.delete_hooks.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use parking_lot::Mutex;
    use std::sync::Arc;

    #[test]
    fn test_kind_filtering() {
        let mut bus = EventBus::new();
        let all = Arc::new(Mutex::new(Vec::new()));
        let only_added = Arc::new(Mutex::new(Vec::new()));
        let sink = all.clone();
        bus.subscribe(move |e| sink.lock().push(e.name()));
        let sink = only_added.clone();
        bus.subscribe_kind(EventKind::KeyframeAdded, move |e| sink.lock().push(e.name()));

        let layer = LayerId::new();
        bus.emit(&TimelineEvent::KeyframeAdded { layer, frame: 1, blank: false });
        bus.emit(&TimelineEvent::FrameInserted { layer, frame: 1 });

        assert_eq!(*all.lock(), vec!["keyframe-added", "frame-inserted"]);
        assert_eq!(*only_added.lock(), vec!["keyframe-added"]);
    }

    #[test]
    fn test_unsubscribe() {
        let mut bus = EventBus::new();
        let count = Arc::new(Mutex::new(0));
        let sink = count.clone();
        let id = bus.subscribe(move |_| *sink.lock() += 1);
        bus.emit(&TimelineEvent::SnapshotImported { layer_count: 0 });
        assert!(bus.unsubscribe(id));
        assert!(!bus.unsubscribe(id));
        bus.emit(&TimelineEvent::SnapshotImported { layer_count: 0 });
        assert_eq!(*count.lock(), 1);
    }

    #[test]
    fn test_delete_veto() {
        let mut bus = EventBus::new();
        let id = LayerId::new();
        let mut request = DeleteRequest::new(id, LayerKind::Layer, vec![id]);
        assert!(bus.confirm_delete(&mut request));

        bus.on_before_delete(|req| req.cancel());
        let mut request = DeleteRequest::new(id, LayerKind::Layer, vec![id]);
        assert!(!bus.confirm_delete(&mut request));
        assert!(request.is_cancelled());
    }

    #[test]
    fn test_moved_event_layers() {
        let (a, b, target) = (LayerId::new(), LayerId::new(), LayerId::new());
        let event = TimelineEvent::KeyframesMoved {
            target,
            offset: 3,
            moved: vec![
                MovedKeyframe { from_layer: a, from_frame: 1, to_frame: 4 },
                MovedKeyframe { from_layer: b, from_frame: 2, to_frame: 5 },
                MovedKeyframe { from_layer: a, from_frame: 3, to_frame: 6 },
            ],
        };
        assert_eq!(event.layers(), vec![target, a, b]);
        assert_eq!(event.kind(), EventKind::KeyframesMoved);
    }
}
