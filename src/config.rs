//! Surface configuration, stored as JSON

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::contour::ContourStrategy;
use crate::curve::CurveStyle;
use crate::display::{DEFAULT_HEIGHT, DEFAULT_WIDTH};
use crate::domain::{DomainBounds, DomainPoint, DEFAULT_STEP};
use crate::error::{HeatmapError, Result};
use crate::gradient::{GradientRegistry, GradientScheme, Rgb, DEFAULT_SCHEME};
use crate::payoff::NamedPayoff;

/// Largest accepted surface side, in pixels
pub const MAX_SURFACE_SIDE: u32 = 16_384;

/// Everything a host hands the surface, in one file
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HeatmapConfig {
    pub width: u32,
    pub height: u32,
    pub bounds: DomainBounds,
    pub payoff: NamedPayoff,
    /// Active gradient, by registry name
    pub scheme: String,
    /// Extra schemes merged over the built-in registry
    pub schemes: BTreeMap<String, GradientScheme>,
    /// Asset point whose indifference curve is drawn on the static frame
    pub reference_point: Option<DomainPoint>,
    /// Grid step of the extremum search
    pub step: f64,
    pub strategy: ContourStrategy,
    pub clamp_percent: bool,
    pub reference_style: CurveStyle,
    pub reference_color: Rgb,
    pub hover_style: CurveStyle,
    pub hover_color: Rgb,
    /// Minimum spacing of pointer-move events handed to the surface
    pub move_throttle_ms: u64,
    pub leave_throttle_ms: u64,
}

impl Default for HeatmapConfig {
    fn default() -> Self {
        Self {
            width: DEFAULT_WIDTH,
            height: DEFAULT_HEIGHT,
            bounds: DomainBounds::default(),
            payoff: NamedPayoff::default(),
            scheme: DEFAULT_SCHEME.to_string(),
            schemes: BTreeMap::new(),
            reference_point: Some(DomainPoint::new(4.0, 1.5)),
            step: DEFAULT_STEP,
            strategy: ContourStrategy::default(),
            clamp_percent: false,
            reference_style: CurveStyle::Flag,
            reference_color: [0, 0, 0],
            hover_style: CurveStyle::Flag,
            hover_color: [0, 0, 0],
            move_throttle_ms: 50,
            leave_throttle_ms: 35,
        }
    }
}

impl HeatmapConfig {
    /// Built-in schemes plus the ones declared in this config
    pub fn registry(&self) -> Result<GradientRegistry> {
        let mut registry = GradientRegistry::builtin();
        for (name, scheme) in &self.schemes {
            registry.insert(name.clone(), scheme.clone())?;
        }
        Ok(registry)
    }

    pub fn validate(&self) -> Result<()> {
        if self.width == 0 || self.height == 0 {
            return Err(HeatmapError::InvalidConfig(format!(
                "surface size {}x{} is empty",
                self.width, self.height
            )));
        }
        if self.width > MAX_SURFACE_SIDE || self.height > MAX_SURFACE_SIDE {
            return Err(HeatmapError::InvalidConfig(format!(
                "surface size {}x{} exceeds {} pixels per side",
                self.width, self.height, MAX_SURFACE_SIDE
            )));
        }
        self.bounds.validate()?;
        if !(self.step.is_finite() && self.step > 0.0) {
            return Err(HeatmapError::InvalidConfig(format!(
                "extremum step must be positive, got {}",
                self.step
            )));
        }
        if let ContourStrategy::Band { tolerance } = self.strategy {
            if !(tolerance.is_finite() && tolerance > 0.0) {
                return Err(HeatmapError::InvalidConfig(format!(
                    "band tolerance must be positive, got {}",
                    tolerance
                )));
            }
        }
        let registry = self.registry()?;
        registry.resolve(&self.scheme)?;
        Ok(())
    }

    /// Save config to a JSON file
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        fs::write(path, json)?;
        Ok(())
    }

    /// Load and validate config from a JSON file
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let json = fs::read_to_string(path)?;
        let config: Self = serde_json::from_str(&json)?;
        config.validate()?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gradient::ColorStop;

    #[test]
    fn test_default_is_valid() {
        HeatmapConfig::default().validate().unwrap();
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let config: HeatmapConfig =
            serde_json::from_str(r#"{"scheme":"blue","width":400,"height":400}"#).unwrap();
        assert_eq!(config.scheme, "blue");
        assert_eq!(config.width, 400);
        assert_eq!(config.bounds, DomainBounds::default());
        assert_eq!(config.move_throttle_ms, 50);
        config.validate().unwrap();
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        let mut config = HeatmapConfig::default();
        config.scheme = "missing".into();
        assert!(matches!(config.validate(), Err(HeatmapError::UnknownScheme(_))));

        let mut config = HeatmapConfig::default();
        config.step = 0.0;
        assert!(config.validate().is_err());

        let mut config = HeatmapConfig::default();
        config.bounds.min_x = 9.0;
        assert!(matches!(config.validate(), Err(HeatmapError::InvalidBounds(_))));

        let mut config = HeatmapConfig::default();
        config.strategy = ContourStrategy::Band { tolerance: -1.0 };
        assert!(config.validate().is_err());

        let mut config = HeatmapConfig::default();
        config.width = MAX_SURFACE_SIDE + 1;
        assert!(matches!(config.validate(), Err(HeatmapError::InvalidConfig(_))));
        config.width = MAX_SURFACE_SIDE;
        config.validate().unwrap();
    }

    #[test]
    fn test_custom_scheme_is_registered() {
        let mut config = HeatmapConfig::default();
        config.schemes.insert(
            "dusk".into(),
            GradientScheme::Explicit(vec![ColorStop([10, 0, 40], 0.0), ColorStop([250, 120, 60], 1.0)]),
        );
        config.scheme = "dusk".into();
        config.validate().unwrap();
        assert!(config.registry().unwrap().contains("red"));
    }

    #[test]
    fn test_save_load() {
        let path = std::env::temp_dir().join(format!("payoff-heatmap-{}.json", std::process::id()));
        let mut config = HeatmapConfig::default();
        config.scheme = "rainbow".into();
        config.strategy = ContourStrategy::Band { tolerance: 0.5 };
        config.save(&path).unwrap();
        let loaded = HeatmapConfig::load(&path).unwrap();
        let _ = fs::remove_file(&path);
        assert_eq!(loaded, config);
    }
}
