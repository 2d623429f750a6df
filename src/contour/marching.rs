//! Marching squares over the quadtree-indexed cells of a scalar field

use std::collections::HashMap;
use std::time::Instant;

use log::trace;

use super::{is_border_cell, Isoline, IsolineExtractor, PixelPoint, Polyline};
use crate::field::ScalarField;

/// A cell edge, identified by its top/left sample
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
enum Edge {
    /// From (x, y) to (x + 1, y)
    Horizontal(u32, u32),
    /// From (x, y) to (x, y + 1)
    Vertical(u32, u32),
}

/// Indexed marching squares
#[derive(Debug, Clone, Copy, Default)]
pub struct MarchingSquares;

impl IsolineExtractor for MarchingSquares {
    fn extract(&self, field: &ScalarField, target: f64) -> Isoline {
        if !field.brackets(target) {
            return Isoline::empty(target);
        }
        let start = Instant::now();

        let mut crossings: HashMap<Edge, PixelPoint> = HashMap::new();
        let mut segments: Vec<(Edge, Edge)> = Vec::new();
        let (w, h) = (field.width(), field.height());

        field.index().for_each_candidate(target, |cx, cy| {
            if is_border_cell(cx, cy, w, h) {
                return;
            }
            march_cell(field, cx, cy, target, &mut crossings, &mut segments);
        });

        let polylines = chain(&segments, &crossings);
        trace!(
            "marching squares level {}: {} segments, {} polylines in {:.2}ms",
            target,
            segments.len(),
            polylines.len(),
            start.elapsed().as_secs_f64() * 1000.0
        );
        Isoline {
            level: target,
            polylines,
        }
    }

    fn name(&self) -> &str {
        "marching"
    }
}

/// Crossing point along an edge, `(target - v0) / (v1 - v0)` of the way from v0
#[inline]
fn interpolate(field: &ScalarField, edge: Edge, target: f64) -> PixelPoint {
    let (x0, y0, x1, y1) = match edge {
        Edge::Horizontal(x, y) => (x, y, x + 1, y),
        Edge::Vertical(x, y) => (x, y, x, y + 1),
    };
    let v0 = field.value(x0, y0);
    let v1 = field.value(x1, y1);
    let t = if v1 == v0 {
        0.5
    } else {
        ((target - v0) / (v1 - v0)).clamp(0.0, 1.0)
    };
    PixelPoint::new(
        x0 as f64 + t * (x1 as f64 - x0 as f64),
        y0 as f64 + t * (y1 as f64 - y0 as f64),
    )
}

fn march_cell(
    field: &ScalarField,
    cx: u32,
    cy: u32,
    target: f64,
    crossings: &mut HashMap<Edge, PixelPoint>,
    segments: &mut Vec<(Edge, Edge)>,
) {
    let tl = field.value(cx, cy);
    let tr = field.value(cx + 1, cy);
    let br = field.value(cx + 1, cy + 1);
    let bl = field.value(cx, cy + 1);

    let mut case = 0u8;
    if tl >= target {
        case |= 1;
    }
    if tr >= target {
        case |= 2;
    }
    if br >= target {
        case |= 4;
    }
    if bl >= target {
        case |= 8;
    }

    let top = Edge::Horizontal(cx, cy);
    let bottom = Edge::Horizontal(cx, cy + 1);
    let left = Edge::Vertical(cx, cy);
    let right = Edge::Vertical(cx + 1, cy);

    // Saddles are resolved by the cell's mean value
    let center_above = (tl + tr + br + bl) / 4.0 >= target;

    let mut push = |a: Edge, b: Edge| {
        for e in [a, b] {
            crossings
                .entry(e)
                .or_insert_with(|| interpolate(field, e, target));
        }
        segments.push((a, b));
    };

    match case {
        0 | 15 => {},
        1 | 14 => push(left, top),
        2 | 13 => push(top, right),
        3 | 12 => push(left, right),
        4 | 11 => push(right, bottom),
        6 | 9 => push(top, bottom),
        7 | 8 => push(left, bottom),
        5 if center_above => {
            push(left, bottom);
            push(top, right);
        },
        5 => {
            push(left, top);
            push(right, bottom);
        },
        10 if center_above => {
            push(left, top);
            push(right, bottom);
        },
        10 => {
            push(top, right);
            push(left, bottom);
        },
        _ => {},
    }
}

/// Join segments sharing an edge into polylines
fn chain(segments: &[(Edge, Edge)], crossings: &HashMap<Edge, PixelPoint>) -> Vec<Polyline> {
    let mut by_edge: HashMap<Edge, Vec<usize>> = HashMap::with_capacity(segments.len() * 2);
    for (i, &(a, b)) in segments.iter().enumerate() {
        by_edge.entry(a).or_default().push(i);
        by_edge.entry(b).or_default().push(i);
    }

    let mut used = vec![false; segments.len()];
    let next_from = |edge: Edge, used: &[bool]| -> Option<usize> {
        by_edge
            .get(&edge)
            .and_then(|ids| ids.iter().copied().find(|&i| !used[i]))
    };
    let other_end = |i: usize, edge: Edge| -> Edge {
        let (a, b) = segments[i];
        if a == edge {
            b
        } else {
            a
        }
    };

    let mut polylines = Vec::new();
    for start in 0..segments.len() {
        if used[start] {
            continue;
        }
        used[start] = true;
        let (first, second) = segments[start];

        let mut forward = vec![second];
        let mut tail = second;
        while let Some(i) = next_from(tail, &used) {
            used[i] = true;
            tail = other_end(i, tail);
            forward.push(tail);
        }

        let closed = tail == first;
        let mut backward = Vec::new();
        if closed {
            forward.pop();
        } else {
            let mut head = first;
            while let Some(i) = next_from(head, &used) {
                used[i] = true;
                head = other_end(i, head);
                backward.push(head);
            }
        }

        let points = backward
            .iter()
            .rev()
            .chain(std::iter::once(&first))
            .chain(forward.iter())
            .filter_map(|e| crossings.get(e).copied())
            .collect();
        polylines.push(Polyline { points, closed });
    }
    polylines
}

#[cfg(test)]
mod tests {
    use super::*;

    fn field_from(width: u32, height: u32, f: impl Fn(f64, f64) -> f64) -> ScalarField {
        let values = (0..height)
            .flat_map(|row| (0..width).map(move |col| (col, row)))
            .map(|(col, row)| f(col as f64, row as f64))
            .collect();
        ScalarField::new(width, height, values)
    }

    #[test]
    fn test_vertical_line() {
        // Crosses 10.5 between columns 10 and 11
        let field = field_from(30, 20, |x, _| x);
        let iso = MarchingSquares.extract(&field, 10.5);
        assert_eq!(iso.polylines.len(), 1);
        let line = &iso.polylines[0];
        assert!(!line.closed);
        for p in &line.points {
            assert!((p.x - 10.5).abs() < 1e-9);
        }
        // Cell rows 0..=17 survive the border rule, giving crossings on rows 0..=18
        assert_eq!(line.points.len(), 19);
    }

    #[test]
    fn test_polyline_is_ordered() {
        let field = field_from(30, 30, |x, y| x + y);
        let iso = MarchingSquares.extract(&field, 25.3);
        assert_eq!(iso.polylines.len(), 1);
        for pair in iso.polylines[0].points.windows(2) {
            let d = ((pair[0].x - pair[1].x).powi(2) + (pair[0].y - pair[1].y).powi(2)).sqrt();
            assert!(d <= 1.5, "gap of {} between consecutive points", d);
        }
    }

    #[test]
    fn test_closed_ring() {
        let field = field_from(40, 40, |x, y| ((x - 20.0).powi(2) + (y - 20.0).powi(2)).sqrt());
        let iso = MarchingSquares.extract(&field, 8.0);
        assert_eq!(iso.polylines.len(), 1);
        assert!(iso.polylines[0].closed);
    }

    #[test]
    fn test_border_cells_excluded() {
        // Contour hugging the left column only
        let field = field_from(20, 20, |x, _| x);
        let iso = MarchingSquares.extract(&field, 0.5);
        assert!(iso.is_empty());
        let iso = MarchingSquares.extract(&field, 18.5);
        assert!(iso.is_empty());
    }

    #[test]
    fn test_saddle_produces_two_segments() {
        #[rustfmt::skip]
        let values = vec![
            0.0, 0.0, 0.0, 0.0,
            0.0, 1.0, 0.0, 0.0,
            0.0, 0.0, 1.0, 0.0,
            0.0, 0.0, 0.0, 0.0,
        ];
        let field = ScalarField::new(4, 4, values);
        let mut crossings = HashMap::new();
        let mut segments = Vec::new();
        march_cell(&field, 1, 1, 0.5, &mut crossings, &mut segments);
        assert_eq!(segments.len(), 2);
        assert_eq!(crossings.len(), 4);
    }

    #[test]
    fn test_interpolation_fraction() {
        let field = ScalarField::new(2, 2, vec![2.0, 6.0, 2.0, 6.0]);
        let p = interpolate(&field, Edge::Horizontal(0, 0), 3.0);
        assert!((p.x - 0.25).abs() < 1e-12);
        assert_eq!(p.y, 0.0);
    }
}
