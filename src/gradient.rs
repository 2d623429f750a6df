//! Color gradients for mapping a normalized payoff to RGB
//!
//! Two scheme shapes coexist in one registry:
//! - uniform: a list of colors spread evenly over [0, 1]
//! - explicit: a list of `(color, position)` stops sorted by position

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::{HeatmapError, Result};

/// RGB triple
pub type Rgb = [u8; 3];

/// Returned when uniform-stop index arithmetic falls off either end
pub const FALLBACK_COLOR: Rgb = [255, 120, 210];

/// Scheme used when nothing else is selected
pub const DEFAULT_SCHEME: &str = "red";

/// A color stop at an explicit position in [0, 1]
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ColorStop(pub Rgb, pub f64);

/// Named gradient definition
///
/// JSON shape picks the variant: `[[r,g,b], ...]` is uniform,
/// `[[[r,g,b], pos], ...]` is explicit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum GradientScheme {
    Uniform(Vec<Rgb>),
    Explicit(Vec<ColorStop>),
}

impl GradientScheme {
    pub fn uniform(colors: Vec<Rgb>) -> Result<Self> {
        let scheme = Self::Uniform(colors);
        scheme.validate()?;
        Ok(scheme)
    }

    pub fn explicit(stops: Vec<ColorStop>) -> Result<Self> {
        let scheme = Self::Explicit(stops);
        scheme.validate()?;
        Ok(scheme)
    }

    pub fn validate(&self) -> Result<()> {
        match self {
            Self::Uniform(colors) => {
                if colors.is_empty() {
                    return Err(HeatmapError::InvalidScheme("no colors".into()));
                }
            },
            Self::Explicit(stops) => {
                if stops.is_empty() {
                    return Err(HeatmapError::InvalidScheme("no stops".into()));
                }
                if let Some(bad) = stops.iter().find(|s| !(0.0..=1.0).contains(&s.1)) {
                    return Err(HeatmapError::InvalidScheme(format!(
                        "stop position {} outside [0, 1]",
                        bad.1
                    )));
                }
                if stops.windows(2).any(|w| w[0].1 > w[1].1) {
                    return Err(HeatmapError::InvalidScheme(
                        "stop positions must be ascending".into(),
                    ));
                }
            },
        }
        Ok(())
    }

    pub fn first_color(&self) -> Rgb {
        match self {
            Self::Uniform(colors) => colors.first().copied().unwrap_or(FALLBACK_COLOR),
            Self::Explicit(stops) => stops.first().map_or(FALLBACK_COLOR, |s| s.0),
        }
    }

    pub fn last_color(&self) -> Rgb {
        match self {
            Self::Uniform(colors) => colors.last().copied().unwrap_or(FALLBACK_COLOR),
            Self::Explicit(stops) => stops.last().map_or(FALLBACK_COLOR, |s| s.0),
        }
    }

    /// Color for `percent` (nominally in [0, 1], not clamped)
    pub fn color_at(&self, percent: f64) -> Rgb {
        match self {
            Self::Uniform(colors) => uniform_color(colors, percent),
            Self::Explicit(stops) => explicit_color(stops, percent),
        }
    }
}

/// Component-wise `weight * a + (1 - weight) * b`, rounded into a byte
#[inline]
fn mix(a: Rgb, b: Rgb, weight: f64) -> Rgb {
    let channel = |i: usize| {
        let v = weight * a[i] as f64 + (1.0 - weight) * b[i] as f64;
        if v.is_nan() {
            0
        } else {
            v.round().clamp(0.0, 255.0) as u8
        }
    };
    [channel(0), channel(1), channel(2)]
}

fn uniform_color(colors: &[Rgb], percent: f64) -> Rgb {
    if colors.len() == 1 {
        return colors[0];
    }
    let scaled = percent * (colors.len() - 1) as f64;
    let low = scaled.floor();
    let high = scaled.ceil();
    if !scaled.is_finite() || low < 0.0 || high >= colors.len() as f64 {
        return FALLBACK_COLOR;
    }
    let frac = scaled - low;
    mix(colors[high as usize], colors[low as usize], frac)
}

fn explicit_color(stops: &[ColorStop], percent: f64) -> Rgb {
    for pair in stops.windows(2) {
        let (ColorStop(low_color, low_pos), ColorStop(high_color, high_pos)) = (pair[0], pair[1]);
        if percent >= low_pos && percent <= high_pos {
            if high_pos == low_pos {
                return low_color;
            }
            // Weight runs from 1 at the lower stop to 0 at the upper one
            let interp = 1.0 - (percent - low_pos) / (high_pos - low_pos);
            return mix(low_color, high_color, interp);
        }
    }
    stops.last().map_or(FALLBACK_COLOR, |s| s.0)
}

/// Named schemes available to the surface
#[derive(Debug, Clone, PartialEq)]
pub struct GradientRegistry {
    schemes: BTreeMap<String, GradientScheme>,
}

impl GradientRegistry {
    /// Registry with no schemes
    pub fn empty() -> Self {
        Self {
            schemes: BTreeMap::new(),
        }
    }

    /// Registry preloaded with the built-in schemes
    pub fn builtin() -> Self {
        let mut registry = Self::empty();
        let uniform = [
            ("red", vec![[255, 255, 255], [255, 180, 180], [220, 20, 20], [120, 0, 0]]),
            ("blue", vec![[255, 255, 255], [150, 190, 255], [20, 70, 220], [0, 20, 110]]),
            ("green", vec![[255, 255, 255], [170, 230, 170], [30, 160, 60], [0, 80, 20]]),
            ("grayscale", vec![[0, 0, 0], [255, 255, 255]]),
            (
                "viridis",
                vec![[68, 1, 84], [59, 82, 139], [33, 145, 140], [94, 201, 98], [253, 231, 37]],
            ),
        ];
        for (name, colors) in uniform {
            registry.schemes.insert(name.to_string(), GradientScheme::Uniform(colors));
        }

        let explicit = [
            (
                "rainbow",
                vec![
                    ColorStop([150, 0, 90], 0.0),
                    ColorStop([0, 0, 200], 0.125),
                    ColorStop([0, 25, 255], 0.25),
                    ColorStop([0, 152, 255], 0.375),
                    ColorStop([44, 255, 150], 0.5),
                    ColorStop([151, 255, 0], 0.625),
                    ColorStop([255, 234, 0], 0.75),
                    ColorStop([255, 111, 0], 0.875),
                    ColorStop([255, 0, 0], 1.0),
                ],
            ),
            (
                "heat",
                vec![
                    ColorStop([0, 0, 0], 0.0),
                    ColorStop([200, 0, 0], 0.4),
                    ColorStop([255, 160, 0], 0.75),
                    ColorStop([255, 255, 220], 1.0),
                ],
            ),
        ];
        for (name, stops) in explicit {
            registry.schemes.insert(name.to_string(), GradientScheme::Explicit(stops));
        }
        registry
    }

    /// Add or replace a scheme after validating it
    pub fn insert(&mut self, name: impl Into<String>, scheme: GradientScheme) -> Result<()> {
        scheme.validate()?;
        self.schemes.insert(name.into(), scheme);
        Ok(())
    }

    pub fn get(&self, name: &str) -> Option<&GradientScheme> {
        self.schemes.get(name)
    }

    pub fn resolve(&self, name: &str) -> Result<&GradientScheme> {
        self.get(name)
            .ok_or_else(|| HeatmapError::UnknownScheme(name.to_string()))
    }

    pub fn contains(&self, name: &str) -> bool {
        self.schemes.contains_key(name)
    }

    /// Scheme names in sorted order
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.schemes.keys().map(String::as_str)
    }
}

impl Default for GradientRegistry {
    fn default() -> Self {
        Self::builtin()
    }
}
