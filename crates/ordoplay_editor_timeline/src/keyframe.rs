// SPDX-License-Identifier: MIT OR Apache-2.0
//! Keyframe definitions and property interpolation.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Unique identifier for a keyframe
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct KeyframeId(pub Uuid);

impl KeyframeId {
    /// Create a new random keyframe ID
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for KeyframeId {
    fn default() -> Self {
        Self::new()
    }
}

/// Value of a single animated property
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PropertyValue {
    /// Scalar number
    Number(f32),
    /// 2D vector
    Vec2([f32; 2]),
    /// 3D vector
    Vec3([f32; 3]),
    /// Color (RGBA) or any 4-component vector
    Vec4([f32; 4]),
    /// Boolean flag
    Bool(bool),
    /// Opaque text (symbol name, label, asset path)
    Text(String),
}

/// Property snapshot keyed by property name
pub type PropertyMap = IndexMap<String, PropertyValue>;

/// A keyframe on a layer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Keyframe {
    /// Unique keyframe ID
    pub id: KeyframeId,
    /// Frame index, unique within the owning layer
    pub frame: u32,
    /// Placeholder keyframe with deliberately empty content
    #[serde(default)]
    pub is_empty: bool,
    /// Property snapshot at this frame
    #[serde(default)]
    pub properties: PropertyMap,
}

impl Keyframe {
    /// Create a new keyframe with content
    pub fn new(frame: u32, properties: PropertyMap) -> Self {
        Self {
            id: KeyframeId::new(),
            frame,
            is_empty: false,
            properties,
        }
    }

    /// Create a blank keyframe
    pub fn blank(frame: u32) -> Self {
        Self {
            id: KeyframeId::new(),
            frame,
            is_empty: true,
            properties: PropertyMap::new(),
        }
    }

    /// Set a property value
    pub fn with_property(mut self, key: impl Into<String>, value: impl Into<PropertyValue>) -> Self {
        self.set_property(key, value);
        self
    }

    /// Set a property value; a blank keyframe stops being blank
    pub fn set_property(&mut self, key: impl Into<String>, value: impl Into<PropertyValue>) {
        self.properties.insert(key.into(), value.into());
        self.is_empty = false;
    }

    /// Frame position on the continuous time axis
    pub fn time(&self) -> f32 {
        self.frame as f32
    }
}

/// Interpolation utilities
pub struct Interpolation;

impl Interpolation {
    /// Linear interpolation between two floats
    pub fn lerp(a: f32, b: f32, t: f32) -> f32 {
        a + (b - a) * t
    }

    /// Component-wise interpolation of fixed-size vectors
    pub fn lerp_array<const N: usize>(a: [f32; N], b: [f32; N], t: f32) -> [f32; N] {
        let mut out = a;
        for (slot, (x, y)) in out.iter_mut().zip(a.iter().zip(b.iter())) {
            *slot = Self::lerp(*x, *y, t);
        }
        out
    }

    /// Blend two property snapshots at eased progress `t`
    ///
    /// Keys present on only one side carry that side's value. Numeric
    /// values of matching shape blend linearly; anything else snaps from
    /// `start` to `end` once `t` reaches one half.
    pub fn blend(start: &PropertyMap, end: &PropertyMap, t: f32) -> PropertyMap {
        let mut out = PropertyMap::with_capacity(start.len().max(end.len()));
        for (key, a) in start {
            let value = match end.get(key) {
                Some(b) => a.interpolate(b, t),
                None => a.clone(),
            };
            out.insert(key.clone(), value);
        }
        for (key, b) in end {
            if !start.contains_key(key) {
                out.insert(key.clone(), b.clone());
            }
        }
        out
    }
}

impl PropertyValue {
    /// Interpolate towards `other`
    pub fn interpolate(&self, other: &PropertyValue, t: f32) -> PropertyValue {
        match (self, other) {
            (Self::Number(a), Self::Number(b)) => Self::Number(Interpolation::lerp(*a, *b, t)),
            (Self::Vec2(a), Self::Vec2(b)) => Self::Vec2(Interpolation::lerp_array(*a, *b, t)),
            (Self::Vec3(a), Self::Vec3(b)) => Self::Vec3(Interpolation::lerp_array(*a, *b, t)),
            (Self::Vec4(a), Self::Vec4(b)) => Self::Vec4(Interpolation::lerp_array(*a, *b, t)),
            // Discrete values (and mismatched shapes) step at the midpoint
            _ if t >= 0.5 => other.clone(),
            _ => self.clone(),
        }
    }

    /// Whether the value can be blended continuously
    pub fn is_numeric(&self) -> bool {
        matches!(self, Self::Number(_) | Self::Vec2(_) | Self::Vec3(_) | Self::Vec4(_))
    }

    /// Get as float if possible
    pub fn as_number(&self) -> Option<f32> {
        match self {
            Self::Number(v) => Some(*v),
            _ => None,
        }
    }

    /// Get as text if possible
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(v) => Some(v),
            _ => None,
        }
    }
}

impl From<f32> for PropertyValue {
    fn from(value: f32) -> Self {
        Self::Number(value)
    }
}

impl From<f64> for PropertyValue {
    fn from(value: f64) -> Self {
        Self::Number(value as f32)
    }
}

impl From<[f32; 2]> for PropertyValue {
    fn from(value: [f32; 2]) -> Self {
        Self::Vec2(value)
    }
}

impl From<[f32; 3]> for PropertyValue {
    fn from(value: [f32; 3]) -> Self {
        Self::Vec3(value)
    }
}

impl From<[f32; 4]> for PropertyValue {
    fn from(value: [f32; 4]) -> Self {
        Self::Vec4(value)
    }
}

impl From<bool> for PropertyValue {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl From<&str> for PropertyValue {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<String> for PropertyValue {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn props(entries: &[(&str, PropertyValue)]) -> PropertyMap {
        entries.iter().map(|(k, v)| (k.to_string(), v.clone())).collect()
    }

    #[test]
    fn test_blank_keyframe() {
        let mut kf = Keyframe::blank(4);
        assert!(kf.is_empty);
        assert!(kf.properties.is_empty());
        kf.set_property("x", 1.0);
        assert!(!kf.is_empty);
    }

    #[test]
    fn test_blend_numbers() {
        let a = props(&[("x", 0.0.into()), ("pos", [0.0, 10.0].into())]);
        let b = props(&[("x", 100.0.into()), ("pos", [10.0, 20.0].into())]);
        let mid = Interpolation::blend(&a, &b, 0.5);
        assert_eq!(mid["x"], PropertyValue::Number(50.0));
        assert_eq!(mid["pos"], PropertyValue::Vec2([5.0, 15.0]));
    }

    #[test]
    fn test_blend_snaps_discrete_values() {
        let a = props(&[("symbol", "walk".into()), ("visible", true.into())]);
        let b = props(&[("symbol", "run".into()), ("visible", false.into())]);
        let early = Interpolation::blend(&a, &b, 0.49);
        assert_eq!(early["symbol"], PropertyValue::Text("walk".into()));
        assert_eq!(early["visible"], PropertyValue::Bool(true));
        let late = Interpolation::blend(&a, &b, 0.5);
        assert_eq!(late["symbol"], PropertyValue::Text("run".into()));
        assert_eq!(late["visible"], PropertyValue::Bool(false));
    }

    #[test]
    fn test_blend_one_sided_keys() {
        let a = props(&[("x", 1.0.into()), ("only_start", 7.0.into())]);
        let b = props(&[("x", 3.0.into()), ("only_end", "tag".into())]);
        let out = Interpolation::blend(&a, &b, 0.25);
        assert_eq!(out["only_start"], PropertyValue::Number(7.0));
        assert_eq!(out["only_end"], PropertyValue::Text("tag".into()));
        assert_eq!(out["x"], PropertyValue::Number(1.5));
    }

    #[test]
    fn test_mismatched_shapes_step() {
        let a = PropertyValue::Number(1.0);
        let b = PropertyValue::Vec2([1.0, 2.0]);
        assert_eq!(a.interpolate(&b, 0.2), a);
        assert_eq!(a.interpolate(&b, 0.8), b);
    }

    #[test]
    fn test_untagged_json() {
        let kf = Keyframe::new(2, PropertyMap::new())
            .with_property("x", 1.5)
            .with_property("label", "hello");
        let json = serde_json::to_string(&kf).unwrap();
        assert!(json.contains("\"isEmpty\":false"));
        let back: Keyframe = serde_json::from_str(&json).unwrap();
        assert_eq!(back, kf);
    }
}
