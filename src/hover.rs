//! Pointer-driven indifference curve
//!
//! ```text
//! Idle   --move (in domain)--> Active   draw curve
//! Active --move (in domain)--> Active   restore baseline, draw curve
//! Active --leave-----------> Idle     restore baseline
//! any    --move (outside)----> same     ignored
//! ```
//!
//! The baseline snapshot is blitted back in one copy before every redraw,
//! so the heatmap itself is never regenerated on pointer movement.

use std::time::Instant;

use log::{trace, warn};

use crate::contour::IsolineExtractor;
use crate::curve::CurveRenderer;
use crate::display::PixelBuffer;
use crate::domain::{DomainBounds, DomainPoint};
use crate::field::ScalarField;
use crate::payoff::PayoffFunction;

/// Viewport rectangle of the rendered surface, as reported by the host
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SurfaceRect {
    pub left: f64,
    pub top: f64,
    pub width: f64,
    pub height: f64,
}

/// Pointer position in viewport coordinates plus the surface's rectangle
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PointerEvent {
    pub x: f64,
    pub y: f64,
    pub rect: SurfaceRect,
}

impl PointerEvent {
    /// Event for a surface drawn unscaled at the viewport origin
    pub fn at_pixel(col: f64, row: f64, width: u32, height: u32) -> Self {
        Self {
            x: col,
            y: row,
            rect: SurfaceRect {
                left: 0.0,
                top: 0.0,
                width: width as f64,
                height: height as f64,
            },
        }
    }

    /// Position in surface pixels, scaled when the rectangle is resized
    pub fn surface_position(&self, width: u32, height: u32) -> (f64, f64) {
        let mut col = self.x - self.rect.left;
        let mut row = self.y - self.rect.top;
        if self.rect.width > 0.0 {
            col *= width as f64 / self.rect.width;
        }
        if self.rect.height > 0.0 {
            row *= height as f64 / self.rect.height;
        }
        (col, row)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum HoverState {
    #[default]
    Idle,
    Active {
        last: DomainPoint,
        utility: f64,
    },
}

impl HoverState {
    pub fn is_active(&self) -> bool {
        matches!(self, Self::Active { .. })
    }
}

/// Read-only view of what a hover redraw needs
pub struct OverlayInputs<'a> {
    pub bounds: &'a DomainBounds,
    pub payoff: &'a dyn PayoffFunction,
    pub field: &'a ScalarField,
    pub extractor: &'a dyn IsolineExtractor,
    pub baseline: &'a PixelBuffer,
}

/// Result of one pointer event
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum HoverOutcome {
    /// Nothing changed on screen
    Ignored,
    /// Curve drawn for this domain point and payoff
    Drawn { point: DomainPoint, utility: f64 },
    /// Hover curve erased
    Cleared,
}

#[derive(Debug, Clone)]
pub struct HoverOverlayController {
    state: HoverState,
    renderer: CurveRenderer,
}

impl HoverOverlayController {
    pub fn new(renderer: CurveRenderer) -> Self {
        Self {
            state: HoverState::Idle,
            renderer,
        }
    }

    pub fn state(&self) -> HoverState {
        self.state
    }

    /// Forget any drawn curve without touching the frame (after a re-render)
    pub fn reset(&mut self) {
        self.state = HoverState::Idle;
    }

    pub fn pointer_move(
        &mut self,
        event: &PointerEvent,
        inputs: &OverlayInputs<'_>,
        frame: &mut PixelBuffer,
    ) -> HoverOutcome {
        let start = Instant::now();
        let (w, h) = (frame.width(), frame.height());
        let (col, row) = event.surface_position(w, h);
        let point = inputs.bounds.pixel_to_domain(col, row, w, h);

        // Entering the surface can report a position one pixel outside it
        if !inputs.bounds.contains(point) {
            trace!("pointer at ({:.1}, {:.1}) outside domain, ignored", col, row);
            return HoverOutcome::Ignored;
        }

        let utility = match inputs.payoff.evaluate(point.x, point.y) {
            Ok(v) => v,
            Err(e) => {
                warn!("hover payoff at ({}, {}) failed: {}", point.x, point.y, e);
                return HoverOutcome::Ignored;
            },
        };

        let isoline = inputs.extractor.extract(inputs.field, utility);

        if self.state.is_active() {
            frame.copy_from(inputs.baseline);
        }
        self.renderer.draw(frame, &isoline);
        self.state = HoverState::Active {
            last: point,
            utility,
        };

        trace!(
            "hover curve at ({:.3}, {:.3}) utility {:.3}: {} points in {:.2}ms",
            point.x,
            point.y,
            utility,
            isoline.point_count(),
            start.elapsed().as_secs_f64() * 1000.0
        );
        HoverOutcome::Drawn { point, utility }
    }

    pub fn pointer_leave(&mut self, baseline: &PixelBuffer, frame: &mut PixelBuffer) -> HoverOutcome {
        if !self.state.is_active() {
            return HoverOutcome::Ignored;
        }
        frame.copy_from(baseline);
        self.state = HoverState::Idle;
        HoverOutcome::Cleared
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::contour::MarchingSquares;
    use crate::curve::CurveStyle;

    struct Fixture {
        bounds: DomainBounds,
        field: ScalarField,
        baseline: PixelBuffer,
    }

    fn sum(x: f64, y: f64) -> f64 {
        x + y
    }

    fn fixture() -> Fixture {
        let bounds = DomainBounds::default();
        let (w, h) = (60, 40);
        let values = (0..h)
            .flat_map(|row| (0..w).map(move |col| (col, row)))
            .map(|(col, row)| {
                let p = bounds.pixel_to_domain(col as f64, row as f64, w, h);
                sum(p.x, p.y)
            })
            .collect();
        let mut baseline = PixelBuffer::with_size(w, h);
        baseline.clear([200, 200, 200]);
        Fixture {
            bounds,
            field: ScalarField::new(w, h, values),
            baseline,
        }
    }

    fn inputs(f: &Fixture) -> OverlayInputs<'_> {
        OverlayInputs {
            bounds: &f.bounds,
            payoff: &sum,
            field: &f.field,
            extractor: &MarchingSquares,
            baseline: &f.baseline,
        }
    }

    fn controller() -> HoverOverlayController {
        HoverOverlayController::new(CurveRenderer::new(CurveStyle::Flag, [0, 0, 0]))
    }

    #[test]
    fn test_first_move_activates() {
        let f = fixture();
        let mut hover = controller();
        let mut frame = f.baseline.clone();
        let out = hover.pointer_move(&PointerEvent::at_pixel(30.0, 20.0, 60, 40), &inputs(&f), &mut frame);
        assert!(matches!(out, HoverOutcome::Drawn { .. }));
        assert!(hover.state().is_active());
        assert_ne!(frame, f.baseline);
    }

    #[test]
    fn test_outside_domain_is_ignored() {
        let f = fixture();
        let mut hover = controller();
        let mut frame = f.baseline.clone();
        // One pixel past the right edge
        let out = hover.pointer_move(&PointerEvent::at_pixel(61.0, 20.0, 60, 40), &inputs(&f), &mut frame);
        assert_eq!(out, HoverOutcome::Ignored);
        assert_eq!(hover.state(), HoverState::Idle);
        assert_eq!(frame, f.baseline);
    }

    #[test]
    fn test_outside_move_keeps_active_curve() {
        let f = fixture();
        let mut hover = controller();
        let mut frame = f.baseline.clone();
        hover.pointer_move(&PointerEvent::at_pixel(30.0, 20.0, 60, 40), &inputs(&f), &mut frame);
        let state = hover.state();
        let drawn = frame.clone();

        let out = hover.pointer_move(&PointerEvent::at_pixel(30.0, -2.0, 60, 40), &inputs(&f), &mut frame);
        assert_eq!(out, HoverOutcome::Ignored);
        assert!(hover.state().is_active());
        assert_eq!(hover.state(), state);
        assert_eq!(frame, drawn);
    }

    #[test]
    fn test_second_move_erases_first_curve() {
        let f = fixture();
        let mut hover = controller();
        let mut frame = f.baseline.clone();
        hover.pointer_move(&PointerEvent::at_pixel(15.0, 20.0, 60, 40), &inputs(&f), &mut frame);

        let mut only_second = f.baseline.clone();
        let mut fresh = controller();
        let event = PointerEvent::at_pixel(45.0, 20.0, 60, 40);
        fresh.pointer_move(&event, &inputs(&f), &mut only_second);

        hover.pointer_move(&event, &inputs(&f), &mut frame);
        assert_eq!(frame, only_second);
    }

    #[test]
    fn test_leave_restores_baseline() {
        let f = fixture();
        let mut hover = controller();
        let mut frame = f.baseline.clone();
        assert_eq!(hover.pointer_leave(&f.baseline, &mut frame), HoverOutcome::Ignored);

        hover.pointer_move(&PointerEvent::at_pixel(30.0, 20.0, 60, 40), &inputs(&f), &mut frame);
        assert_eq!(hover.pointer_leave(&f.baseline, &mut frame), HoverOutcome::Cleared);
        assert_eq!(frame, f.baseline);
        assert_eq!(hover.state(), HoverState::Idle);
    }

    #[test]
    fn test_scaled_rect() {
        let event = PointerEvent {
            x: 110.0,
            y: 60.0,
            rect: SurfaceRect {
                left: 10.0,
                top: 20.0,
                width: 200.0,
                height: 80.0,
            },
        };
        assert_eq!(event.surface_position(100, 40), (50.0, 20.0));
    }
}
