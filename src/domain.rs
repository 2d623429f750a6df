//! Domain bounds, pixel <-> domain mapping, and the brute-force extremum search
//!
//! Pixel row 0 is the top of the raster and maps to `max_y`; column 0 maps
//! to `min_x`. Every forward and inverse mapping in the crate goes through
//! [`DomainBounds`] so the heatmap and the hover curve stay aligned.

use std::time::Instant;

use log::{debug, warn};
use serde::{Deserialize, Serialize};

use crate::error::{HeatmapError, Result};
use crate::payoff::PayoffFunction;

/// Default grid step for [`find_maximum`], in domain units
pub const DEFAULT_STEP: f64 = 0.01;

/// Slack when counting grid steps so `(6 - 2) / 0.01` lands on 400, not 399
const STEP_EPSILON: f64 = 1e-9;

/// A point in domain (asset) space
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DomainPoint {
    pub x: f64,
    pub y: f64,
}

impl DomainPoint {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// Rectangular domain, `min < max` on both axes
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DomainBounds {
    pub min_x: f64,
    pub max_x: f64,
    pub min_y: f64,
    pub max_y: f64,
}

impl DomainBounds {
    pub fn new(min_x: f64, max_x: f64, min_y: f64, max_y: f64) -> Result<Self> {
        let bounds = Self {
            min_x,
            max_x,
            min_y,
            max_y,
        };
        bounds.validate()?;
        Ok(bounds)
    }

    pub fn validate(&self) -> Result<()> {
        let finite = [self.min_x, self.max_x, self.min_y, self.max_y]
            .iter()
            .all(|v| v.is_finite());
        if !finite {
            return Err(HeatmapError::InvalidBounds(format!("{:?} is not finite", self)));
        }
        if self.min_x >= self.max_x {
            return Err(HeatmapError::InvalidBounds(format!(
                "min_x ({}) must be below max_x ({})",
                self.min_x, self.max_x
            )));
        }
        if self.min_y >= self.max_y {
            return Err(HeatmapError::InvalidBounds(format!(
                "min_y ({}) must be below max_y ({})",
                self.min_y, self.max_y
            )));
        }
        Ok(())
    }

    #[inline]
    pub fn width(&self) -> f64 {
        self.max_x - self.min_x
    }

    #[inline]
    pub fn height(&self) -> f64 {
        self.max_y - self.min_y
    }

    /// Inclusive containment on both axes
    #[inline]
    pub fn contains(&self, p: DomainPoint) -> bool {
        p.x >= self.min_x && p.x <= self.max_x && p.y >= self.min_y && p.y <= self.max_y
    }

    /// Map a (possibly fractional) pixel position on a `w`x`h` surface to domain space
    #[inline]
    pub fn pixel_to_domain(&self, col: f64, row: f64, w: u32, h: u32) -> DomainPoint {
        let w = w as f64;
        let h = h as f64;
        DomainPoint {
            x: (col * self.width()) / w + self.min_x,
            y: ((h - row) * self.height()) / h + self.min_y,
        }
    }

    /// Inverse of [`pixel_to_domain`](Self::pixel_to_domain)
    #[inline]
    pub fn domain_to_pixel(&self, p: DomainPoint, w: u32, h: u32) -> (f64, f64) {
        let w = w as f64;
        let h = h as f64;
        let col = (p.x - self.min_x) * w / self.width();
        let row = h - (p.y - self.min_y) * h / self.height();
        (col, row)
    }
}

impl Default for DomainBounds {
    fn default() -> Self {
        Self {
            min_x: 2.0,
            max_x: 6.0,
            min_y: 1.0,
            max_y: 7.0,
        }
    }
}

/// Brute-force maximum of `payoff` over a grid covering `bounds`.
///
/// Both axes run from min to max inclusive at `step`. Samples where the
/// payoff fails are skipped. Returns `f64::NEG_INFINITY` when no sample
/// succeeds.
pub fn find_maximum<P>(payoff: &P, bounds: &DomainBounds, step: f64) -> f64
where
    P: PayoffFunction + ?Sized,
{
    let step = if step.is_finite() && step > 0.0 {
        step
    } else {
        warn!("invalid extremum step {}, using {}", step, DEFAULT_STEP);
        DEFAULT_STEP
    };

    let start = Instant::now();
    let nx = (bounds.width() / step + STEP_EPSILON).floor() as u64;
    let ny = (bounds.height() / step + STEP_EPSILON).floor() as u64;

    let mut max = f64::NEG_INFINITY;
    let mut skipped = 0u64;

    // Indexing by step count keeps the grid free of accumulated float drift
    for i in 0..=nx {
        let x = bounds.min_x + i as f64 * step;
        for j in 0..=ny {
            let y = bounds.min_y + j as f64 * step;
            match payoff.evaluate(x, y) {
                Ok(v) if v > max => max = v,
                Ok(_) => {},
                Err(_) => skipped += 1,
            }
        }
    }

    if skipped > 0 {
        warn!("extremum search skipped {} failing samples", skipped);
    }
    debug!(
        "max utility {} over {}x{} grid in {:.2}ms",
        max,
        nx + 1,
        ny + 1,
        start.elapsed().as_secs_f64() * 1000.0
    );
    max
}
