//! The owning controller for one heatmap surface
//!
//! Cached stages and what invalidates them:
//!
//! ```text
//! bounds, payoff ──> max utility ──> raster + field ──> baseline ──> hover
//!             scheme ───────────────┘                 │
//!                       reference point ──────────────┘
//! ```
//!
//! A setter drops the stages downstream of it; [`HeatmapSurface::render`]
//! rebuilds whatever is missing. Rendering with missing inputs is a no-op.

use std::sync::Arc;

use log::{debug, info, trace, warn};

use crate::config::HeatmapConfig;
use crate::contour::{ContourStrategy, IsolineExtractor};
use crate::curve::{CurveRenderer, CurveStyle};
use crate::display::PixelBuffer;
use crate::domain::{find_maximum, DomainBounds, DomainPoint, DEFAULT_STEP};
use crate::error::{HeatmapError, Result};
use crate::field::ScalarField;
use crate::gradient::{GradientRegistry, GradientScheme, Rgb};
use crate::heatmap::RasterHeatmapGenerator;
use crate::hover::{HoverOutcome, HoverOverlayController, HoverState, OverlayInputs, PointerEvent};
use crate::payoff::PayoffFunction;

pub struct HeatmapSurface {
    generator: RasterHeatmapGenerator,
    registry: GradientRegistry,
    step: f64,
    extractor: Box<dyn IsolineExtractor>,
    reference_renderer: CurveRenderer,

    // Inputs
    bounds: Option<DomainBounds>,
    payoff: Option<Arc<dyn PayoffFunction>>,
    scheme_name: Option<String>,
    scheme: Option<GradientScheme>,
    reference_point: Option<DomainPoint>,

    // Cached stages
    max_utility: Option<f64>,
    raster: Option<PixelBuffer>,
    field: Option<ScalarField>,
    reference_utility: Option<f64>,
    baseline: Option<PixelBuffer>,

    frame: PixelBuffer,
    hover: HoverOverlayController,
}

impl HeatmapSurface {
    /// Empty surface of the given size; nothing renders until inputs are set
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            generator: RasterHeatmapGenerator::new(width, height),
            registry: GradientRegistry::builtin(),
            step: DEFAULT_STEP,
            extractor: ContourStrategy::default().extractor(),
            reference_renderer: CurveRenderer::new(CurveStyle::Flag, [0, 0, 0]),
            bounds: None,
            payoff: None,
            scheme_name: None,
            scheme: None,
            reference_point: None,
            max_utility: None,
            raster: None,
            field: None,
            reference_utility: None,
            baseline: None,
            frame: PixelBuffer::with_size(width, height),
            hover: HoverOverlayController::new(CurveRenderer::new(CurveStyle::Flag, [0, 0, 0])),
        }
    }

    /// Surface with every input taken from `config`
    pub fn from_config(config: &HeatmapConfig) -> Result<Self> {
        config.validate()?;
        let mut surface = Self::new(config.width, config.height);
        surface.registry = config.registry()?;
        surface.step = config.step;
        surface.generator = surface.generator.with_clamped_percent(config.clamp_percent);
        surface.extractor = config.strategy.extractor();
        surface.reference_renderer = CurveRenderer::new(config.reference_style, config.reference_color);
        surface.hover = HoverOverlayController::new(CurveRenderer::new(config.hover_style, config.hover_color));
        surface.set_bounds(config.bounds)?;
        surface.set_payoff(config.payoff.into_fn());
        surface.set_scheme(&config.scheme)?;
        surface.set_reference_point(config.reference_point);
        Ok(surface)
    }

    // ========================================================================
    // Inputs
    // ========================================================================

    pub fn set_bounds(&mut self, bounds: DomainBounds) -> Result<()> {
        bounds.validate()?;
        if self.bounds != Some(bounds) {
            self.bounds = Some(bounds);
            self.invalidate_max_utility();
        }
        Ok(())
    }

    pub fn set_payoff(&mut self, payoff: impl PayoffFunction + 'static) {
        self.payoff = Some(Arc::new(payoff));
        self.invalidate_max_utility();
    }

    /// Select a registered gradient by name
    pub fn set_scheme(&mut self, name: &str) -> Result<()> {
        let scheme = self.registry.resolve(name)?.clone();
        if self.scheme.as_ref() != Some(&scheme) {
            self.scheme = Some(scheme);
            self.invalidate_raster();
        }
        self.scheme_name = Some(name.to_string());
        Ok(())
    }

    pub fn register_scheme(&mut self, name: &str, scheme: GradientScheme) -> Result<()> {
        self.registry.insert(name, scheme)?;
        // Re-resolve in case the active scheme was replaced
        if self.scheme_name.as_deref() == Some(name) {
            self.set_scheme(name)?;
        }
        Ok(())
    }

    pub fn set_reference_point(&mut self, point: Option<DomainPoint>) {
        if self.reference_point != point {
            self.reference_point = point;
            self.reference_utility = None;
            self.invalidate_baseline();
        }
    }

    pub fn set_extremum_step(&mut self, step: f64) -> Result<()> {
        if !(step.is_finite() && step > 0.0) {
            return Err(HeatmapError::InvalidConfig(format!(
                "extremum step must be positive, got {}",
                step
            )));
        }
        if step != self.step {
            self.step = step;
            self.invalidate_max_utility();
        }
        Ok(())
    }

    pub fn set_strategy(&mut self, strategy: ContourStrategy) {
        self.extractor = strategy.extractor();
        self.invalidate_baseline();
    }

    pub fn set_curve_styles(&mut self, reference: (CurveStyle, Rgb), hover: (CurveStyle, Rgb)) {
        self.reference_renderer = CurveRenderer::new(reference.0, reference.1);
        self.hover = HoverOverlayController::new(CurveRenderer::new(hover.0, hover.1));
        self.invalidate_baseline();
    }

    fn invalidate_max_utility(&mut self) {
        self.max_utility = None;
        self.reference_utility = None;
        self.invalidate_raster();
    }

    fn invalidate_raster(&mut self) {
        self.raster = None;
        self.field = None;
        self.invalidate_baseline();
    }

    fn invalidate_baseline(&mut self) {
        self.baseline = None;
        self.hover.reset();
    }

    // ========================================================================
    // Rendering
    // ========================================================================

    /// Rebuild every stale stage. Missing inputs make this a no-op.
    ///
    /// A failing payoff during raster generation aborts the frame; the
    /// previously presented frame is left as it was.
    pub fn render(&mut self) -> Result<()> {
        let (Some(bounds), Some(payoff)) = (self.bounds, self.payoff.clone()) else {
            trace!("render skipped: bounds or payoff not set");
            return Ok(());
        };

        let max_utility = match self.max_utility {
            Some(max) => max,
            None => {
                let max = find_maximum(payoff.as_ref(), &bounds, self.step);
                self.max_utility = Some(max);
                max
            },
        };
        if !max_utility.is_finite() {
            debug!("render skipped: no finite payoff in domain");
            return Ok(());
        }

        let Some(scheme) = self.scheme.as_ref() else {
            trace!("render skipped: no gradient scheme");
            return Ok(());
        };

        if self.raster.is_none() || self.field.is_none() {
            let frame = self
                .generator
                .render(payoff.as_ref(), &bounds, max_utility, scheme)?;
            self.raster = Some(frame.buffer);
            self.field = Some(frame.field);
        }

        if self.baseline.is_none() {
            self.rebuild_baseline(&bounds, payoff.as_ref());
        }
        Ok(())
    }

    /// Static frame: clean raster plus the reference curve, then snapshot it.
    /// A reference point whose payoff fails is left off the frame.
    fn rebuild_baseline(&mut self, bounds: &DomainBounds, payoff: &dyn PayoffFunction) {
        let (Some(raster), Some(field)) = (self.raster.as_ref(), self.field.as_ref()) else {
            return;
        };
        self.frame.copy_from(raster);
        self.reference_utility = None;

        if let Some(point) = self.reference_point {
            match payoff.evaluate(point.x, point.y) {
                Ok(utility) => {
                    if !bounds.contains(point) {
                        debug!("reference point ({}, {}) lies outside the domain", point.x, point.y);
                    }
                    let isoline = self.extractor.extract(field, utility);
                    self.reference_renderer.draw(&mut self.frame, &isoline);
                    self.reference_utility = Some(utility);
                    info!(
                        "reference curve at utility {:.3} ({} points, {})",
                        utility,
                        isoline.point_count(),
                        self.extractor.name()
                    );
                },
                Err(e) => {
                    warn!(
                        "reference payoff at ({}, {}) failed, curve skipped: {}",
                        point.x, point.y, e
                    );
                },
            }
        }

        self.baseline = Some(self.frame.clone());
        self.hover.reset();
    }

    // ========================================================================
    // Pointer events
    // ========================================================================

    pub fn on_pointer_move(&mut self, event: &PointerEvent) -> HoverOutcome {
        let (Some(bounds), Some(payoff), Some(field), Some(baseline)) = (
            self.bounds.as_ref(),
            self.payoff.as_deref(),
            self.field.as_ref(),
            self.baseline.as_ref(),
        ) else {
            trace!("pointer move before first render, ignored");
            return HoverOutcome::Ignored;
        };
        let inputs = OverlayInputs {
            bounds,
            payoff,
            field,
            extractor: self.extractor.as_ref(),
            baseline,
        };
        self.hover.pointer_move(event, &inputs, &mut self.frame)
    }

    pub fn on_pointer_leave(&mut self) -> HoverOutcome {
        match self.baseline.as_ref() {
            Some(baseline) => self.hover.pointer_leave(baseline, &mut self.frame),
            None => HoverOutcome::Ignored,
        }
    }

    /// Put the baseline snapshot back on screen, dropping any hover curve
    pub fn restore_baseline(&mut self) {
        if let Some(baseline) = self.baseline.as_ref() {
            self.frame.copy_from(baseline);
            self.hover.reset();
        }
    }

    // ========================================================================
    // Read-only views
    // ========================================================================

    /// Presentable RGBA frame
    pub fn frame(&self) -> &PixelBuffer {
        &self.frame
    }

    pub fn baseline(&self) -> Option<&PixelBuffer> {
        self.baseline.as_ref()
    }

    pub fn field(&self) -> Option<&ScalarField> {
        self.field.as_ref()
    }

    pub fn max_utility(&self) -> Option<f64> {
        self.max_utility
    }

    pub fn reference_utility(&self) -> Option<f64> {
        self.reference_utility
    }

    pub fn hover_state(&self) -> HoverState {
        self.hover.state()
    }

    pub fn bounds(&self) -> Option<DomainBounds> {
        self.bounds
    }

    pub fn scheme_name(&self) -> Option<&str> {
        self.scheme_name.as_deref()
    }

    pub fn registry(&self) -> &GradientRegistry {
        &self.registry
    }

    pub fn width(&self) -> u32 {
        self.frame.width()
    }

    pub fn height(&self) -> u32 {
        self.frame.height()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn squares_plus_cubes(x: f64, y: f64) -> f64 {
        x * x + y * y * y
    }

    fn small_surface() -> HeatmapSurface {
        let mut surface = HeatmapSurface::new(80, 60);
        surface.set_extremum_step(0.05).unwrap();
        surface.set_bounds(DomainBounds::default()).unwrap();
        surface.set_payoff(squares_plus_cubes);
        surface.set_scheme("red").unwrap();
        surface
    }

    #[test]
    fn test_render_without_inputs_is_noop() {
        let mut surface = HeatmapSurface::new(20, 20);
        let blank = surface.frame().clone();
        surface.render().unwrap();
        assert!(surface.baseline().is_none());
        assert_eq!(surface.frame(), &blank);

        // Bounds and payoff but no scheme: max is found, nothing drawn
        surface.set_bounds(DomainBounds::default()).unwrap();
        surface.set_payoff(squares_plus_cubes);
        surface.set_extremum_step(0.5).unwrap();
        surface.render().unwrap();
        assert!(surface.max_utility().is_some());
        assert!(surface.field().is_none());
        assert_eq!(surface.frame(), &blank);
    }

    #[test]
    fn test_render_builds_every_stage() {
        let mut surface = small_surface();
        surface.set_reference_point(Some(DomainPoint::new(4.0, 1.5)));
        surface.render().unwrap();
        assert!((surface.max_utility().unwrap() - 379.0).abs() < 1e-6);
        assert!(surface.field().is_some());
        assert_eq!(surface.baseline(), Some(surface.frame()));
        assert!((surface.reference_utility().unwrap() - 19.375).abs() < 1e-9);
    }

    #[test]
    fn test_scheme_change_keeps_max_utility() {
        let mut surface = small_surface();
        surface.render().unwrap();
        let before = surface.frame().clone();

        surface.set_scheme("blue").unwrap();
        assert!(surface.max_utility().is_some());
        assert!(surface.baseline().is_none());
        surface.render().unwrap();
        assert_ne!(surface.frame(), &before);
    }

    #[test]
    fn test_unknown_scheme_is_rejected() {
        let mut surface = small_surface();
        assert!(matches!(surface.set_scheme("plaid"), Err(HeatmapError::UnknownScheme(_))));
        assert_eq!(surface.scheme_name(), Some("red"));
    }

    #[test]
    fn test_payoff_change_invalidates_max() {
        let mut surface = small_surface();
        surface.render().unwrap();
        surface.set_payoff(|x: f64, y: f64| x + y);
        assert!(surface.max_utility().is_none());
        surface.render().unwrap();
        assert!((surface.max_utility().unwrap() - 13.0).abs() < 1e-6);
    }

    #[test]
    fn test_failed_raster_keeps_previous_frame() {
        let mut surface = small_surface();
        surface.render().unwrap();
        let shown = surface.frame().clone();

        // Finite on the coarse search grid corner, NaN elsewhere
        surface.set_payoff(|x: f64, y: f64| if x < 3.0 { x + y } else { f64::NAN });
        let err = surface.render().unwrap_err();
        assert!(matches!(err, HeatmapError::Evaluation { .. }));
        assert_eq!(surface.frame(), &shown);
        assert!(surface.baseline().is_none());
    }

    #[test]
    fn test_reference_point_change_reuses_raster() {
        let mut surface = small_surface();
        surface.render().unwrap();
        let plain = surface.frame().clone();

        surface.set_reference_point(Some(DomainPoint::new(4.0, 4.0)));
        assert!(surface.field().is_some());
        surface.render().unwrap();
        assert_ne!(surface.frame(), &plain);

        surface.set_reference_point(None);
        surface.render().unwrap();
        assert_eq!(surface.frame(), &plain);
    }

    #[test]
    fn test_hover_cycle() {
        let mut surface = small_surface();
        surface.render().unwrap();
        let baseline = surface.baseline().unwrap().clone();

        let event = PointerEvent::at_pixel(40.0, 30.0, 80, 60);
        assert!(matches!(surface.on_pointer_move(&event), HoverOutcome::Drawn { .. }));
        assert!(surface.hover_state().is_active());
        assert_ne!(surface.frame(), &baseline);

        assert_eq!(surface.on_pointer_leave(), HoverOutcome::Cleared);
        assert_eq!(surface.frame(), &baseline);
    }

    #[test]
    fn test_restore_twice_is_idempotent() {
        let mut surface = small_surface();
        surface.render().unwrap();
        surface.on_pointer_move(&PointerEvent::at_pixel(20.0, 20.0, 80, 60));

        surface.restore_baseline();
        let once = surface.frame().clone();
        surface.restore_baseline();
        assert_eq!(surface.frame(), &once);
        assert_eq!(Some(&once), surface.baseline());
    }

    #[test]
    fn test_failing_reference_point_keeps_hover() {
        let log_surface = || {
            let mut surface = HeatmapSurface::new(80, 60);
            surface.set_extremum_step(0.05).unwrap();
            surface.set_bounds(DomainBounds::default()).unwrap();
            surface.set_payoff(|x: f64, y: f64| x.ln() + y);
            surface.set_scheme("red").unwrap();
            surface
        };
        let mut plain = log_surface();
        plain.render().unwrap();

        // ln(-1) is NaN
        let mut surface = log_surface();
        surface.set_reference_point(Some(DomainPoint::new(-1.0, 2.0)));
        surface.render().unwrap();
        assert!(surface.reference_utility().is_none());
        assert_eq!(surface.baseline(), Some(plain.frame()));
        assert_eq!(surface.frame(), plain.frame());

        let event = PointerEvent::at_pixel(40.0, 30.0, 80, 60);
        assert!(matches!(surface.on_pointer_move(&event), HoverOutcome::Drawn { .. }));
        assert_eq!(surface.on_pointer_leave(), HoverOutcome::Cleared);
    }

    #[test]
    fn test_out_of_domain_move_keeps_active_curve() {
        let mut surface = small_surface();
        surface.render().unwrap();
        surface.on_pointer_move(&PointerEvent::at_pixel(40.0, 30.0, 80, 60));
        let state = surface.hover_state();
        let drawn = surface.frame().clone();

        let outside = PointerEvent::at_pixel(85.0, 30.0, 80, 60);
        assert_eq!(surface.on_pointer_move(&outside), HoverOutcome::Ignored);
        assert!(surface.hover_state().is_active());
        assert_eq!(surface.hover_state(), state);
        assert_eq!(surface.frame(), &drawn);
    }

    #[test]
    fn test_pointer_before_render_is_ignored() {
        let mut surface = small_surface();
        let event = PointerEvent::at_pixel(10.0, 10.0, 80, 60);
        assert_eq!(surface.on_pointer_move(&event), HoverOutcome::Ignored);
        assert_eq!(surface.on_pointer_leave(), HoverOutcome::Ignored);
    }

    #[test]
    fn test_from_config() {
        let mut config = HeatmapConfig::default();
        config.width = 60;
        config.height = 40;
        config.step = 0.1;
        config.scheme = "viridis".into();
        let mut surface = HeatmapSurface::from_config(&config).unwrap();
        surface.render().unwrap();
        assert_eq!(surface.scheme_name(), Some("viridis"));
        assert!(surface.baseline().is_some());
        assert_eq!(surface.width(), 60);
    }
}
