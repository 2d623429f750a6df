//! Threshold-band scan: every pixel within a tolerance of the target

use std::time::Instant;

use log::trace;

use super::{is_border_pixel, Isoline, IsolineExtractor, PixelPoint, Polyline};
use crate::field::ScalarField;

/// Default band half-width, in payoff units
pub const DEFAULT_TOLERANCE: f64 = 0.3;

/// A pixel whose payoff fell inside the band
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BandSample {
    pub col: u32,
    pub row: u32,
    pub value: f64,
}

#[derive(Debug, Clone, Copy)]
pub struct ThresholdBand {
    tolerance: f64,
}

impl ThresholdBand {
    pub fn new(tolerance: f64) -> Self {
        Self { tolerance }
    }

    /// Column-major scan, so samples come out left to right
    pub fn scan(&self, field: &ScalarField, target: f64) -> Vec<BandSample> {
        if !field.brackets(target) {
            return Vec::new();
        }
        let (w, h) = (field.width(), field.height());
        let mut samples = Vec::new();
        for col in 0..w {
            for row in 0..h {
                if is_border_pixel(col, row, w, h) {
                    continue;
                }
                let value = field.value(col, row);
                if (value - target).abs() < self.tolerance {
                    samples.push(BandSample { col, row, value });
                }
            }
        }
        samples
    }
}

impl Default for ThresholdBand {
    fn default() -> Self {
        Self::new(DEFAULT_TOLERANCE)
    }
}

impl IsolineExtractor for ThresholdBand {
    fn extract(&self, field: &ScalarField, target: f64) -> Isoline {
        let start = Instant::now();
        let samples = self.scan(field, target);
        trace!(
            "band scan level {} +/- {}: {} pixels in {:.2}ms",
            target,
            self.tolerance,
            samples.len(),
            start.elapsed().as_secs_f64() * 1000.0
        );
        if samples.is_empty() {
            return Isoline::empty(target);
        }
        let points = samples
            .iter()
            .map(|s| PixelPoint::new(s.col as f64, s.row as f64))
            .collect();
        Isoline {
            level: target,
            polylines: vec![Polyline {
                points,
                closed: false,
            }],
        }
    }

    fn name(&self) -> &str {
        "band"
    }
}
