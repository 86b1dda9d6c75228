// SPDX-License-Identifier: MIT OR Apache-2.0
//! Layer/folder hierarchy.
//!
//! Layers live in a flat arena keyed by [`LayerId`]. Ownership edges are
//! the `children` lists of folders (plus the root list); `parent` is a
//! plain back-reference used for lookup and reparenting.

use crate::error::{Result, TimelineError};
use crate::layer::{Layer, LayerId};
use indexmap::IndexMap;

/// Arena-backed tree of layers and folders
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LayerTree {
    /// All layers by ID
    nodes: IndexMap<LayerId, Layer>,
    /// Root-level layers in display order
    roots: Vec<LayerId>,
}

impl LayerTree {
    /// Create an empty tree
    pub fn new() -> Self {
        Self::default()
    }

    /// Total number of layers and folders
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Whether the tree has no layers
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Whether a layer exists
    pub fn contains(&self, id: LayerId) -> bool {
        self.nodes.contains_key(&id)
    }

    /// Get a layer by ID
    pub fn get(&self, id: LayerId) -> Option<&Layer> {
        self.nodes.get(&id)
    }

    /// Get a layer by ID or fail with `LayerNotFound`
    pub fn layer(&self, id: LayerId) -> Result<&Layer> {
        self.nodes.get(&id).ok_or(TimelineError::LayerNotFound(id))
    }

    pub(crate) fn layer_mut(&mut self, id: LayerId) -> Result<&mut Layer> {
        self.nodes.get_mut(&id).ok_or(TimelineError::LayerNotFound(id))
    }

    /// Root-level IDs in display order
    pub fn roots(&self) -> &[LayerId] {
        &self.roots
    }

    /// Ordered IDs under `parent` (`None` for the root)
    pub fn siblings(&self, parent: Option<LayerId>) -> &[LayerId] {
        match parent.and_then(|id| self.nodes.get(&id)) {
            Some(folder) => &folder.children,
            None => &self.roots,
        }
    }

    fn siblings_mut(&mut self, parent: Option<LayerId>) -> &mut Vec<LayerId> {
        match parent {
            Some(id) if self.nodes.contains_key(&id) => &mut self.nodes[&id].children,
            _ => &mut self.roots,
        }
    }

    /// Position of a layer within its parent's children
    pub fn index_in_parent(&self, id: LayerId) -> Option<usize> {
        let parent = self.nodes.get(&id)?.parent;
        self.siblings(parent).iter().position(|&other| other == id)
    }

    /// Insert a layer under `parent`
    ///
    /// A parent that is missing or not a folder falls back to the root.
    /// Returns the parent the layer actually landed under.
    pub fn insert(&mut self, mut layer: Layer, parent: Option<LayerId>) -> Option<LayerId> {
        let parent = parent.filter(|id| self.nodes.get(id).is_some_and(Layer::is_folder));
        layer.parent = parent;
        let id = layer.id;
        self.nodes.insert(id, layer);
        self.siblings_mut(parent).push(id);
        parent
    }

    /// Remove a layer and its whole subtree
    ///
    /// Returns the removed layers, the requested one first.
    pub fn remove(&mut self, id: LayerId) -> Result<Vec<Layer>> {
        let parent = self.layer(id)?.parent;
        self.siblings_mut(parent).retain(|&other| other != id);
        let removed = self
            .subtree(id)
            .into_iter()
            .filter_map(|node| self.nodes.shift_remove(&node))
            .collect();
        Ok(removed)
    }

    /// IDs of a layer and all its descendants in depth-first order
    pub fn subtree(&self, id: LayerId) -> Vec<LayerId> {
        let mut out = Vec::new();
        let mut stack = vec![id];
        while let Some(current) = stack.pop() {
            let Some(layer) = self.nodes.get(&current) else {
                continue;
            };
            out.push(current);
            stack.extend(layer.children.iter().rev().copied());
        }
        out
    }

    /// Whether `ancestor` is `id` or one of its ancestors
    pub fn is_ancestor(&self, ancestor: LayerId, id: LayerId) -> bool {
        let mut current = Some(id);
        while let Some(node) = current {
            if node == ancestor {
                return true;
            }
            current = self.nodes.get(&node).and_then(|layer| layer.parent);
        }
        false
    }

    /// Rename a layer, returning the old name
    pub fn rename(&mut self, id: LayerId, name: impl Into<String>) -> Result<String> {
        let layer = self.layer_mut(id)?;
        Ok(std::mem::replace(&mut layer.name, name.into()))
    }

    /// Move a layer within its parent's children
    ///
    /// The index is clamped to the last position. Returns the old and new
    /// index.
    pub fn reorder(&mut self, id: LayerId, new_index: usize) -> Result<(usize, usize)> {
        let parent = self.layer(id)?.parent;
        let siblings = self.siblings_mut(parent);
        let old_index = siblings
            .iter()
            .position(|&other| other == id)
            .ok_or(TimelineError::LayerNotFound(id))?;
        let new_index = new_index.min(siblings.len() - 1);
        let moved = siblings.remove(old_index);
        siblings.insert(new_index, moved);
        Ok((old_index, new_index))
    }

    /// Move a layer under another folder (`None` for the root)
    ///
    /// The layer is appended after the destination's existing children.
    /// Returns the previous parent.
    pub fn reparent(&mut self, id: LayerId, new_parent: Option<LayerId>) -> Result<Option<LayerId>> {
        let old_parent = self.layer(id)?.parent;
        if let Some(target) = new_parent {
            let folder = self.layer(target)?;
            if !folder.is_folder() {
                return Err(TimelineError::invalid(format!("{target} is not a folder")));
            }
            if self.is_ancestor(id, target) {
                return Err(TimelineError::invalid(format!(
                    "cannot move {id} into itself or its own descendant"
                )));
            }
        }
        self.siblings_mut(old_parent).retain(|&other| other != id);
        self.siblings_mut(new_parent).push(id);
        self.layer_mut(id)?.parent = new_parent;
        Ok(old_parent)
    }

    /// Depth-first walk of the whole tree as `(depth, id)` pairs
    pub fn walk(&self) -> Vec<(usize, LayerId)> {
        let mut out = Vec::with_capacity(self.nodes.len());
        let mut stack: Vec<(usize, LayerId)> = self.roots.iter().rev().map(|&id| (0, id)).collect();
        while let Some((depth, id)) = stack.pop() {
            let Some(layer) = self.nodes.get(&id) else {
                continue;
            };
            out.push((depth, id));
            stack.extend(layer.children.iter().rev().map(|&child| (depth + 1, child)));
        }
        out
    }

    /// Whether a layer and all its ancestors are visible
    pub fn is_effectively_visible(&self, id: LayerId) -> bool {
        let mut current = Some(id);
        while let Some(node) = current {
            match self.nodes.get(&node) {
                Some(layer) if layer.visible => current = layer.parent,
                _ => return false,
            }
        }
        true
    }

    /// Iterate over all layers in arena order
    pub fn iter(&self) -> impl Iterator<Item = &Layer> {
        self.nodes.values()
    }
}
