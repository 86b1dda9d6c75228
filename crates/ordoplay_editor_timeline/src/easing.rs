// SPDX-License-Identifier: MIT OR Apache-2.0
//! Easing curves applied to tween progress.

use serde::{Deserialize, Serialize};

/// Named easing function for a tween
///
/// Names round-trip through their camelCase form (`"easeInQuad"`); an
/// unknown name falls back to [`Easing::Linear`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Easing {
    /// Constant speed
    #[default]
    Linear,
    /// Quadratic acceleration
    EaseInQuad,
    /// Quadratic deceleration
    EaseOutQuad,
    /// Quadratic acceleration then deceleration
    EaseInOutQuad,
    /// Cubic acceleration
    EaseInCubic,
    /// Cubic deceleration
    EaseOutCubic,
    /// Cubic acceleration then deceleration
    EaseInOutCubic,
}

impl Easing {
    /// All easing functions in the catalog
    pub const ALL: [Easing; 7] = [
        Easing::Linear,
        Easing::EaseInQuad,
        Easing::EaseOutQuad,
        Easing::EaseInOutQuad,
        Easing::EaseInCubic,
        Easing::EaseOutCubic,
        Easing::EaseInOutCubic,
    ];

    /// Get the canonical name
    pub fn name(&self) -> &'static str {
        match self {
            Self::Linear => "linear",
            Self::EaseInQuad => "easeInQuad",
            Self::EaseOutQuad => "easeOutQuad",
            Self::EaseInOutQuad => "easeInOutQuad",
            Self::EaseInCubic => "easeInCubic",
            Self::EaseOutCubic => "easeOutCubic",
            Self::EaseInOutCubic => "easeInOutCubic",
        }
    }

    /// Look up an easing by name, falling back to linear
    pub fn from_name(name: &str) -> Self {
        Self::ALL
            .into_iter()
            .find(|easing| easing.name() == name)
            .unwrap_or_default()
    }

    /// Remap linear progress to eased progress
    ///
    /// `progress` is clamped to `[0, 1]` first, so 0 and 1 map to
    /// themselves for every curve.
    pub fn apply(&self, progress: f32) -> f32 {
        let p = if progress.is_nan() { 0.0 } else { progress.clamp(0.0, 1.0) };
        match self {
            Self::Linear => p,
            Self::EaseInQuad => p * p,
            Self::EaseOutQuad => p * (2.0 - p),
            Self::EaseInOutQuad => {
                if p < 0.5 {
                    2.0 * p * p
                } else {
                    -1.0 + (4.0 - 2.0 * p) * p
                }
            }
            Self::EaseInCubic => p * p * p,
            Self::EaseOutCubic => {
                let inv = 1.0 - p;
                1.0 - inv * inv * inv
            }
            Self::EaseInOutCubic => {
                if p < 0.5 {
                    4.0 * p * p * p
                } else {
                    let q = 2.0 * p - 2.0;
                    (p - 1.0) * q * q + 1.0
                }
            }
        }
    }
}

impl From<String> for Easing {
    fn from(name: String) -> Self {
        Self::from_name(&name)
    }
}

impl From<Easing> for String {
    fn from(easing: Easing) -> Self {
        easing.name().to_string()
    }
}

impl std::fmt::Display for Easing {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn approx(a: f32, b: f32) -> bool {
        (a - b).abs() < 1e-6
    }

    #[test]
    fn test_endpoints_are_fixed() {
        for easing in Easing::ALL {
            assert_eq!(easing.apply(0.0), 0.0, "{easing}");
            assert_eq!(easing.apply(1.0), 1.0, "{easing}");
        }
    }

    #[test]
    fn test_progress_is_clamped() {
        for easing in Easing::ALL {
            assert_eq!(easing.apply(-0.5), 0.0);
            assert_eq!(easing.apply(3.0), 1.0);
        }
    }

    #[test]
    fn test_known_values() {
        assert!(approx(Easing::Linear.apply(0.25), 0.25));
        assert!(approx(Easing::EaseInQuad.apply(0.5), 0.25));
        assert!(approx(Easing::EaseOutQuad.apply(0.5), 0.75));
        assert!(approx(Easing::EaseInOutQuad.apply(0.25), 0.125));
        assert!(approx(Easing::EaseInOutQuad.apply(0.5), 0.5));
        assert!(approx(Easing::EaseInOutQuad.apply(0.75), 0.875));
        assert!(approx(Easing::EaseInCubic.apply(0.5), 0.125));
        assert!(approx(Easing::EaseOutCubic.apply(0.5), 0.875));
        assert!(approx(Easing::EaseInOutCubic.apply(0.25), 0.0625));
        assert!(approx(Easing::EaseInOutCubic.apply(0.5), 0.5));
        assert!(approx(Easing::EaseInOutCubic.apply(0.75), 0.9375));
    }

    #[test]
    fn test_monotonic() {
        for easing in Easing::ALL {
            let mut last = 0.0;
            for step in 0..=100 {
                let value = easing.apply(step as f32 / 100.0);
                assert!(value + 1e-6 >= last, "{easing} not monotonic at {step}");
                last = value;
            }
        }
    }

    #[test]
    fn test_names() {
        for easing in Easing::ALL {
            assert_eq!(Easing::from_name(easing.name()), easing);
        }
        assert_eq!(Easing::from_name("bounce"), Easing::Linear);
    }

    #[test]
    fn test_serde_by_name() {
        let json = serde_json::to_string(&Easing::EaseOutCubic).unwrap();
        assert_eq!(json, "\"easeOutCubic\"");
        let parsed: Easing = serde_json::from_str("\"elastic\"").unwrap();
        assert_eq!(parsed, Easing::Linear);
    }
}
