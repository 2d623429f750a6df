//! Full-surface raster generation
//!
//! Every pixel is mapped to the domain, evaluated, colored by
//! `payoff / max_utility`, and its payoff kept in the [`ScalarField`] that
//! later isoline queries read.

use std::time::Instant;

use log::debug;

use crate::display::PixelBuffer;
use crate::domain::DomainBounds;
use crate::error::{HeatmapError, Result};
use crate::field::ScalarField;
use crate::gradient::GradientScheme;
use crate::payoff::PayoffFunction;

/// A rendered raster and the payoff samples behind it
#[derive(Debug, Clone)]
pub struct HeatmapFrame {
    pub buffer: PixelBuffer,
    pub field: ScalarField,
}

/// Produces heatmap frames of a fixed surface size
#[derive(Debug, Clone, Copy)]
pub struct RasterHeatmapGenerator {
    width: u32,
    height: u32,
    clamp_percent: bool,
}

impl RasterHeatmapGenerator {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            clamp_percent: false,
        }
    }

    /// Clamp `payoff / max_utility` into [0, 1] before the gradient lookup.
    /// Off by default: out-of-range payoffs reach the gradient unchanged.
    pub fn with_clamped_percent(mut self, clamp: bool) -> Self {
        self.clamp_percent = clamp;
        self
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    /// Render one frame. The first failing payoff evaluation aborts it.
    pub fn render<P>(
        &self,
        payoff: &P,
        bounds: &DomainBounds,
        max_utility: f64,
        scheme: &GradientScheme,
    ) -> Result<HeatmapFrame>
    where
        P: PayoffFunction + ?Sized,
    {
        let start = Instant::now();
        let (w, h) = (self.width, self.height);
        let mut buffer = PixelBuffer::with_size(w, h);
        let mut values = Vec::with_capacity(w as usize * h as usize);

        for row in 0..h {
            for col in 0..w {
                let p = bounds.pixel_to_domain(col as f64, row as f64, w, h);
                let payoff = payoff
                    .evaluate(p.x, p.y)
                    .map_err(|source| HeatmapError::Evaluation {
                        x: p.x,
                        y: p.y,
                        source,
                    })?;
                values.push(payoff);

                let mut percent = payoff / max_utility;
                if self.clamp_percent {
                    percent = percent.clamp(0.0, 1.0);
                }
                buffer.set_pixel(col as i32, row as i32, scheme.color_at(percent));
            }
        }

        let field = ScalarField::new(w, h, values);
        debug!(
            "heatmap {}x{} (payoff {:.3}..{:.3}) in {:.2}ms",
            w,
            h,
            field.min(),
            field.max(),
            start.elapsed().as_secs_f64() * 1000.0
        );
        Ok(HeatmapFrame { buffer, field })
    }
}
