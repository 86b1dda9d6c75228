// SPDX-License-Identifier: MIT OR Apache-2.0
//! Continuous-time evaluation of layer state.
//!
//! Evaluation is read-only: it never mutates the tree, so evaluating the
//! same time twice without an edit in between yields identical output.

use crate::keyframe::{Interpolation, PropertyMap};
use crate::layer::{Layer, LayerId};
use crate::tree::LayerTree;
use indexmap::IndexMap;

/// Default window within which a query time counts as a keyframe hit
pub const DEFAULT_HIT_TOLERANCE: f32 = 0.001;

/// Evaluated property snapshot per visible layer, in display order
pub type Evaluation = IndexMap<LayerId, PropertyMap>;

impl Layer {
    /// Reconstruct this layer's properties at `time` (in frames)
    ///
    /// An exact keyframe hit returns that keyframe verbatim. Between two
    /// keyframes linked by a tween the properties are blended with the
    /// tween's easing; otherwise the last keyframe holds. Before the first
    /// keyframe the layer has no state.
    pub fn evaluate(&self, time: f32, tolerance: f32) -> PropertyMap {
        let (prev, next) = self.surrounding(time);
        let Some(prev) = prev else {
            return PropertyMap::new();
        };
        if (prev.time() - time).abs() <= tolerance {
            return prev.properties.clone();
        }
        if let Some(next) = next {
            if let Some(tween) = self.tween_between(prev.frame, next.frame) {
                let span = next.time() - prev.time();
                let progress = (time - prev.time()) / span;
                let eased = tween.easing.apply(progress);
                return Interpolation::blend(&prev.properties, &next.properties, eased);
            }
        }
        prev.properties.clone()
    }
}

/// Evaluate every effectively visible, non-folder layer at `time`
pub fn evaluate_tree(tree: &LayerTree, time: f32, tolerance: f32) -> Evaluation {
    tree.walk()
        .into_iter()
        .filter_map(|(_, id)| tree.get(id))
        .filter(|layer| !layer.is_folder() && tree.is_effectively_visible(layer.id))
        .map(|layer| (layer.id, layer.evaluate(time, tolerance)))
        .collect()
}
