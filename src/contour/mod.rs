//! Isoline (indifference curve) extraction from a [`ScalarField`]
//!
//! Two strategies share one trait:
//! - [`MarchingSquares`]: walks only the quadtree cells that bracket the
//!   target and chains interpolated edge crossings into polylines
//! - [`ThresholdBand`]: scans every pixel column-major and keeps those
//!   within a tolerance of the target
//!
//! One strategy is picked per surface and used for both the reference and
//! the hover curve.

mod band;
mod marching;

pub use band::{BandSample, ThresholdBand, DEFAULT_TOLERANCE};
pub use marching::MarchingSquares;

use serde::{Deserialize, Serialize};

use crate::field::ScalarField;

/// A point in pixel space (x = column, y = row), possibly fractional
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PixelPoint {
    pub x: f64,
    pub y: f64,
}

impl PixelPoint {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Pixel containing this point
    #[inline]
    pub fn cell(&self) -> (i32, i32) {
        (self.x.floor() as i32, self.y.floor() as i32)
    }
}

/// An ordered run of points along an isoline
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Polyline {
    pub points: Vec<PixelPoint>,
    pub closed: bool,
}

/// Every polyline found for one target value
#[derive(Debug, Clone, PartialEq)]
pub struct Isoline {
    pub level: f64,
    pub polylines: Vec<Polyline>,
}

impl Isoline {
    pub fn empty(level: f64) -> Self {
        Self {
            level,
            polylines: Vec::new(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.polylines.iter().all(|p| p.points.is_empty())
    }

    pub fn point_count(&self) -> usize {
        self.polylines.iter().map(|p| p.points.len()).sum()
    }

    /// Pixels covered by the isoline's points
    pub fn cells(&self) -> impl Iterator<Item = (i32, i32)> + '_ {
        self.polylines
            .iter()
            .flat_map(|p| p.points.iter().map(PixelPoint::cell))
    }
}

/// Produces the isoline of a scalar field at a target value
pub trait IsolineExtractor {
    /// Empty when `target` is outside the field's sampled range
    fn extract(&self, field: &ScalarField, target: f64) -> Isoline;

    /// Strategy name for logs
    fn name(&self) -> &str;
}

/// Strategy selection as stored in config
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ContourStrategy {
    #[default]
    Marching,
    Band { tolerance: f64 },
}

impl ContourStrategy {
    pub fn extractor(&self) -> Box<dyn IsolineExtractor> {
        match *self {
            Self::Marching => Box::new(MarchingSquares),
            Self::Band { tolerance } => Box::new(ThresholdBand::new(tolerance)),
        }
    }
}

/// Cells touching the left, right, or bottom edge produce artifacts and are skipped
#[inline]
fn is_border_cell(cx: u32, cy: u32, width: u32, height: u32) -> bool {
    cx == 0 || cx + 2 >= width || cy + 2 >= height
}

/// Same rule for single pixels
#[inline]
fn is_border_pixel(col: u32, row: u32, width: u32, height: u32) -> bool {
    col == 0 || col + 1 >= width || row + 1 >= height
}
