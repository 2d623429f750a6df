//! Drawing isolines onto a pixel buffer

use serde::{Deserialize, Serialize};

use crate::contour::{Isoline, PixelPoint};
use crate::display::PixelBuffer;
use crate::gradient::Rgb;

/// How an isoline is put on the surface
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CurveStyle {
    /// Color each point's pixel directly
    #[default]
    Flag,
    /// Smooth anti-aliased stroke through the points
    Spline,
}

/// Stroke or flag curves in a single color
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CurveRenderer {
    pub style: CurveStyle,
    pub color: Rgb,
}

impl CurveRenderer {
    pub fn new(style: CurveStyle, color: Rgb) -> Self {
        Self { style, color }
    }

    pub fn draw(&self, buffer: &mut PixelBuffer, isoline: &Isoline) {
        match self.style {
            CurveStyle::Flag => flag_cells(buffer, isoline.cells(), self.color),
            CurveStyle::Spline => {
                for line in &isoline.polylines {
                    stroke_spline(buffer, &line.points, self.color);
                }
            },
        }
    }
}

/// Set every listed pixel to `color`
pub fn flag_cells(buffer: &mut PixelBuffer, cells: impl IntoIterator<Item = (i32, i32)>, color: Rgb) {
    for (x, y) in cells {
        buffer.set_pixel(x, y, color);
    }
}

/// Smooth stroke through an ordered run of points.
///
/// Each consecutive pair is drawn as two quadratic segments meeting at the
/// pair's midpoint, with control points at the quarter points. Fewer than
/// two points draw nothing.
pub fn stroke_spline(buffer: &mut PixelBuffer, points: &[PixelPoint], color: Rgb) {
    if points.len() < 2 {
        return;
    }
    for pair in points.windows(2) {
        let (a, b) = (pair[0], pair[1]);
        let at = |t: f64| ((a.x + (b.x - a.x) * t) as f32, (a.y + (b.y - a.y) * t) as f32);
        let start = at(0.0);
        let quarter = at(0.25);
        let mid = at(0.5);
        let three_quarter = at(0.75);
        let end = at(1.0);
        buffer.quad_bezier_aa(start, quarter, mid, color);
        buffer.quad_bezier_aa(mid, three_quarter, end, color);
    }
}
