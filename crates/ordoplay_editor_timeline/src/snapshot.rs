// SPDX-License-Identifier: MIT OR Apache-2.0
//! Serializable timeline snapshots.
//!
//! The payload nests children, keyframes and tweens inside each layer:
//! `{ layers, duration, currentTime, timeScale }`. Building a tree from a
//! snapshot validates every invariant first, so a rejected snapshot never
//! leaves a half-imported tree behind.

use crate::error::{Result, TimelineError};
use crate::keyframe::Keyframe;
use crate::layer::{Layer, LayerId, LayerKind};
use crate::tree::LayerTree;
use crate::tween::Tween;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};

/// One layer or folder with everything it owns
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LayerSnapshot {
    /// Layer ID
    pub id: LayerId,
    /// Display name
    pub name: String,
    /// Layer or folder
    #[serde(rename = "type")]
    pub kind: LayerKind,
    /// Visibility flag
    #[serde(default = "default_true")]
    pub visible: bool,
    /// Lock flag
    #[serde(default)]
    pub locked: bool,
    /// Display color
    #[serde(default = "default_color")]
    pub color: [u8; 3],
    /// Parent folder; informational, the nesting is authoritative
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_id: Option<LayerId>,
    /// Child layers (folders only)
    #[serde(default)]
    pub children: Vec<LayerSnapshot>,
    /// Keyframes (layers only)
    #[serde(default)]
    pub keyframes: Vec<Keyframe>,
    /// Tweens (layers only)
    #[serde(default)]
    pub tweens: Vec<Tween>,
}

fn default_true() -> bool {
    true
}

fn default_color() -> [u8; 3] {
    [150, 150, 150]
}

impl LayerSnapshot {
    /// Capture a layer and its subtree
    ///
    /// Nodes are built in reverse depth-first order, so every child is
    /// finished before its parent collects it.
    pub fn capture(tree: &LayerTree, id: LayerId) -> Result<Self> {
        let mut built: HashMap<LayerId, LayerSnapshot> = HashMap::new();
        for node in tree.subtree(id).into_iter().rev() {
            let layer = tree.layer(node)?;
            let children = layer
                .children()
                .iter()
                .filter_map(|child| built.remove(child))
                .collect();
            built.insert(node, Self::from_layer(layer, children));
        }
        built.remove(&id).ok_or(TimelineError::LayerNotFound(id))
    }

    fn from_layer(layer: &Layer, children: Vec<LayerSnapshot>) -> Self {
        Self {
            id: layer.id,
            name: layer.name.clone(),
            kind: layer.kind,
            visible: layer.visible,
            locked: layer.locked,
            color: layer.color,
            parent_id: layer.parent,
            children,
            keyframes: layer.keyframes().to_vec(),
            tweens: layer.tweens().to_vec(),
        }
    }

    fn to_layer(&self) -> Result<Layer> {
        let mut layer = Layer::new(self.name.clone(), self.kind, self.color);
        layer.id = self.id;
        layer.visible = self.visible;
        layer.locked = self.locked;

        if layer.is_folder() {
            if !self.keyframes.is_empty() || !self.tweens.is_empty() {
                return Err(TimelineError::InvalidSnapshot(format!(
                    "folder {} carries keyframes or tweens",
                    self.id
                )));
            }
            return Ok(layer);
        }
        if !self.children.is_empty() {
            return Err(TimelineError::InvalidSnapshot(format!(
                "layer {} has children but is not a folder",
                self.id
            )));
        }

        for keyframe in &self.keyframes {
            layer.insert_keyframe(keyframe.clone()).map_err(|_| {
                TimelineError::InvalidSnapshot(format!(
                    "layer {} has two keyframes at frame {}",
                    self.id, keyframe.frame
                ))
            })?;
        }

        let mut tweens = self.tweens.clone();
        tweens.sort_by_key(|t| t.start_frame);
        for (idx, tween) in tweens.iter().enumerate() {
            if tween.start_frame >= tween.end_frame {
                return Err(TimelineError::InvalidSnapshot(format!(
                    "layer {} has an empty tween {}..={}",
                    self.id, tween.start_frame, tween.end_frame
                )));
            }
            if tweens[..idx]
                .iter()
                .any(|other| other.overlaps(tween.start_frame, tween.end_frame))
            {
                return Err(TimelineError::InvalidSnapshot(format!(
                    "layer {} has overlapping tweens at {}..={}",
                    self.id, tween.start_frame, tween.end_frame
                )));
            }
        }
        layer.tweens = tweens;
        Ok(layer)
    }
}

/// Whole-timeline snapshot
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimelineSnapshot {
    /// Root layers with their subtrees
    pub layers: Vec<LayerSnapshot>,
    /// Duration in frames
    pub duration: f32,
    /// Playhead position in frames
    #[serde(default)]
    pub current_time: f32,
    /// Pixels per frame (display only)
    #[serde(default = "default_time_scale")]
    pub time_scale: f32,
}

fn default_time_scale() -> f32 {
    10.0
}

impl TimelineSnapshot {
    /// Capture the whole tree
    pub fn capture(tree: &LayerTree, duration: f32, current_time: f32, time_scale: f32) -> Result<Self> {
        let layers = tree
            .roots()
            .iter()
            .map(|&id| LayerSnapshot::capture(tree, id))
            .collect::<Result<Vec<_>>>()?;
        Ok(Self {
            layers,
            duration,
            current_time,
            time_scale,
        })
    }

    /// Parse a JSON snapshot
    pub fn from_json(text: &str) -> Result<Self> {
        Ok(serde_json::from_str(text)?)
    }

    /// Serialize to pretty JSON
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Parse a RON snapshot
    pub fn from_ron(text: &str) -> Result<Self> {
        Ok(ron::from_str(text)?)
    }

    /// Serialize to pretty RON
    pub fn to_ron(&self) -> Result<String> {
        Ok(ron::ser::to_string_pretty(self, ron::ser::PrettyConfig::default())?)
    }

    /// Validate the snapshot and build a fresh tree from it
    pub fn build_tree(&self) -> Result<LayerTree> {
        if self.duration.is_nan() || self.duration < 0.0 {
            return Err(TimelineError::InvalidSnapshot(format!(
                "duration must not be negative, got {}",
                self.duration
            )));
        }
        if self.time_scale.is_nan() || self.time_scale <= 0.0 {
            return Err(TimelineError::InvalidSnapshot(format!(
                "timeScale must be positive, got {}",
                self.time_scale
            )));
        }

        let mut tree = LayerTree::new();
        let mut seen = HashSet::new();
        let mut stack: Vec<(&LayerSnapshot, Option<LayerId>)> =
            self.layers.iter().rev().map(|layer| (layer, None)).collect();
        while let Some((snapshot, parent)) = stack.pop() {
            if !seen.insert(snapshot.id) {
                return Err(TimelineError::InvalidSnapshot(format!(
                    "duplicate layer id {}",
                    snapshot.id
                )));
            }
            let layer = snapshot.to_layer()?;
            tree.insert(layer, parent);
            stack.extend(snapshot.children.iter().rev().map(|child| (child, Some(snapshot.id))));
        }
        Ok(tree)
    }
}
