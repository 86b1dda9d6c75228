// SPDX-License-Identifier: MIT OR Apache-2.0
//! Timeline configuration.

use crate::error::{Result, TimelineError};
use crate::evaluate::DEFAULT_HIT_TOLERANCE;
use serde::{Deserialize, Serialize};

/// Default layer colors, cycled as layers are created
pub const DEFAULT_PALETTE: [[u8; 3]; 6] = [
    [100, 150, 255],
    [150, 255, 100],
    [255, 200, 100],
    [200, 100, 255],
    [255, 100, 150],
    [100, 220, 220],
];

/// Settings for a new timeline
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TimelineConfig {
    /// Initial duration in frames
    pub duration: f32,
    /// Frames per second, used for frame/seconds conversion
    pub frame_rate: f32,
    /// Pixels per frame (display only)
    pub time_scale: f32,
    /// Window within which a query time counts as a keyframe hit
    pub hit_tolerance: f32,
    /// Extra frames added when the duration auto-extends
    pub auto_extend_padding: f32,
    /// Base name for new layers
    pub default_layer_name: String,
    /// Base name for new folders
    pub default_folder_name: String,
    /// Colors assigned to new layers in turn
    pub palette: Vec<[u8; 3]>,
}

impl Default for TimelineConfig {
    fn default() -> Self {
        Self {
            duration: 120.0,
            frame_rate: 24.0,
            time_scale: 10.0,
            hit_tolerance: DEFAULT_HIT_TOLERANCE,
            auto_extend_padding: 10.0,
            default_layer_name: "Layer".to_string(),
            default_folder_name: "Folder".to_string(),
            palette: DEFAULT_PALETTE.to_vec(),
        }
    }
}

impl TimelineConfig {
    /// Parse and validate a RON config; missing fields take defaults
    pub fn from_ron(text: &str) -> Result<Self> {
        let config: TimelineConfig = ron::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Serialize to pretty RON
    pub fn to_ron(&self) -> Result<String> {
        let pretty = ron::ser::PrettyConfig::default().struct_names(true);
        Ok(ron::ser::to_string_pretty(self, pretty)?)
    }

    /// Check value ranges
    pub fn validate(&self) -> Result<()> {
        if self.frame_rate.is_nan() || self.frame_rate <= 0.0 {
            return Err(TimelineError::invalid(format!(
                "frame_rate must be positive, got {}",
                self.frame_rate
            )));
        }
        if self.duration.is_nan() || self.duration < 0.0 {
            return Err(TimelineError::invalid(format!(
                "duration must not be negative, got {}",
                self.duration
            )));
        }
        if self.hit_tolerance.is_nan() || self.hit_tolerance < 0.0 {
            return Err(TimelineError::invalid(format!(
                "hit_tolerance must not be negative, got {}",
                self.hit_tolerance
            )));
        }
        if self.auto_extend_padding.is_nan() || self.auto_extend_padding < 0.0 {
            return Err(TimelineError::invalid("auto_extend_padding must not be negative"));
        }
        Ok(())
    }

    /// Color for the `index`-th created layer
    pub fn color_for(&self, index: usize) -> [u8; 3] {
        if self.palette.is_empty() {
            return [150, 150, 150];
        }
        self.palette[index % self.palette.len()]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        let config = TimelineConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.hit_tolerance, 0.001);
    }

    #[test]
    fn test_partial_ron_uses_defaults() {
        let config = TimelineConfig::from_ron("(frame_rate: 30.0, duration: 48.0)").unwrap();
        assert_eq!(config.frame_rate, 30.0);
        assert_eq!(config.duration, 48.0);
        assert_eq!(config.default_layer_name, "Layer");
    }

    #[test]
    fn test_ron_round_trip() {
        let config = TimelineConfig {
            frame_rate: 12.0,
            palette: vec![[1, 2, 3]],
            ..Default::default()
        };
        let text = config.to_ron().unwrap();
        assert_eq!(TimelineConfig::from_ron(&text).unwrap(), config);
    }

    #[test]
    fn test_invalid_values_rejected() {
        assert!(matches!(
            TimelineConfig::from_ron("(frame_rate: 0.0)"),
            Err(TimelineError::InvalidArgument(_))
        ));
        assert!(matches!(
            TimelineConfig::from_ron("(duration: -1.0)"),
            Err(TimelineError::InvalidArgument(_))
        ));
        assert!(matches!(
            TimelineConfig::from_ron("(frame_rate: "),
            Err(TimelineError::RonParse(_))
        ));
    }

    #[test]
    fn test_palette_cycles() {
        let config = TimelineConfig {
            palette: vec![[1, 1, 1], [2, 2, 2]],
            ..Default::default()
        };
        assert_eq!(config.color_for(3), [2, 2, 2]);
        let empty = TimelineConfig {
            palette: Vec::new(),
            ..Default::default()
        };
        assert_eq!(empty.color_for(0), [150, 150, 150]);
    }
}
