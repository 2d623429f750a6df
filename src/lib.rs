//! Payoff heatmaps with indifference curves
//!
//! A two-variable payoff function is sampled over a rectangular domain,
//! colored through a gradient, and overlaid with level curves: a fixed one
//! through a reference point and a live one under the pointer.

pub mod config;
pub mod contour;
pub mod curve;
pub mod display;
pub mod domain;
pub mod error;
pub mod field;
pub mod gradient;
pub mod heatmap;
pub mod hover;
pub mod payoff;
pub mod surface;
pub mod util;

pub use config::HeatmapConfig;
pub use contour::{ContourStrategy, Isoline, IsolineExtractor, MarchingSquares, ThresholdBand};
pub use curve::{CurveRenderer, CurveStyle};
pub use display::PixelBuffer;
pub use domain::{find_maximum, DomainBounds, DomainPoint};
pub use error::{EvalError, HeatmapError, Result};
pub use field::ScalarField;
pub use gradient::{ColorStop, GradientRegistry, GradientScheme, Rgb};
pub use heatmap::{HeatmapFrame, RasterHeatmapGenerator};
pub use hover::{HoverOutcome, HoverOverlayController, HoverState, PointerEvent, SurfaceRect};
pub use payoff::{NamedPayoff, PayoffFunction};
pub use surface::HeatmapSurface;
