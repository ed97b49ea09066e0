//! Minimal SVG line chart for progress values.

use std::fmt::Write;

const PADDING: f64 = 2.0;

/// Render `points` as an SVG polyline scaled to `width` x `height`.
///
/// Values are plotted left to right in the order given. Fewer than two points
/// draw a flat line through the middle (or nothing for an empty slice).
pub fn sparkline_svg(points: &[f64], width: u32, height: u32) -> String {
    let w = f64::from(width.max(1));
    let h = f64::from(height.max(1));

    let mut svg = format!(
        r#"<svg xmlns="http://www.w3.org/2000/svg" width="{width}" height="{height}" viewBox="0 0 {width} {height}">"#
    );

    if !points.is_empty() {
        let coords = polyline_points(points, w, h);
        let _ = write!(
            svg,
            r#"<polyline fill="none" stroke="currentColor" stroke-width="1.5" points="{coords}"/>"#
        );
    }

    svg.push_str("</svg>");
    svg
}

fn polyline_points(points: &[f64], w: f64, h: f64) -> String {
    let finite: Vec<f64> = points
        .iter()
        .map(|v| if v.is_finite() { *v } else { 0.0 })
        .collect();
    let min = finite.iter().copied().fold(f64::INFINITY, f64::min);
    let max = finite.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let range = max - min;

    let inner_w = (w - 2.0 * PADDING).max(0.0);
    let inner_h = (h - 2.0 * PADDING).max(0.0);

    let y_of = |v: f64| {
        if range == 0.0 {
            h / 2.0
        } else {
            PADDING + inner_h - (v - min) / range * inner_h
        }
    };

    if finite.len() == 1 {
        let y = y_of(finite[0]);
        return format!("{:.1},{:.1} {:.1},{:.1}", PADDING, y, PADDING + inner_w, y);
    }

    let step = inner_w / (finite.len() - 1) as f64;
    finite
        .iter()
        .enumerate()
        .map(|(i, v)| format!("{:.1},{:.1}", PADDING + step * i as f64, y_of(*v)))
        .collect::<Vec<_>>()
        .join(" ")
}
