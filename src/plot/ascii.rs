//! ASCII/Unicode plotting for terminal output.
//!
//! This is intentionally "dumb" (fixed-size grid), optimized for:
//! - quick visual sanity checks in a terminal
//! - deterministic output (helpful for golden tests)
//!
//! Numeric curves draw grid points as `o` joined by a `-` line. Categorical
//! curves render one labelled horizontal bar per level.

use crate::domain::IceTable;

/// Render one ICE table.
pub fn render_ice_plot(table: &IceTable, width: usize, height: usize) -> String {
    if table.is_categorical() {
        render_bars(table, width)
    } else {
        render_curve(table, width, height)
    }
}

fn render_curve(table: &IceTable, width: usize, height: usize) -> String {
    let width = width.max(10);
    let height = height.max(5);

    let points: Vec<(f64, f64)> = table
        .rows
        .iter()
        .filter_map(|r| r.value.as_number().map(|x| (x, r.response)))
        .filter(|(x, y)| x.is_finite() && y.is_finite())
        .collect();

    let (x_min, x_max) = range(points.iter().map(|p| p.0)).unwrap_or((0.0, 1.0));
    let (y_min, y_max) = range(points.iter().map(|p| p.1)).unwrap_or((0.0, 1.0));
    let (y_min, y_max) = pad_range(y_min, y_max, 0.05);

    let mut grid = vec![vec![' '; width]; height];
    let mut prev = None;
    for &(x, y) in &points {
        let px = map_x(x, x_min, x_max, width);
        let py = map_y(y, y_min, y_max, height);
        if let Some((x0, y0)) = prev {
            draw_line(&mut grid, x0, y0, px, py, '-');
        }
        prev = Some((px, py));
    }
    // Points go last so they overlay the line.
    for &(x, y) in &points {
        grid[map_y(y, y_min, y_max, height)][map_x(x, x_min, x_max, width)] = 'o';
    }

    let mut out = String::new();
    out.push_str(&format!(
        "Plot: {}=[{x_min:.3}, {x_max:.3}] | response=[{y_min:.4}, {y_max:.4}]\n",
        table.column()
    ));
    for row in grid {
        out.push_str(row.into_iter().collect::<String>().trim_end());
        out.push('\n');
    }
    out
}

fn render_bars(table: &IceTable, width: usize) -> String {
    let labels: Vec<String> = table.rows.iter().map(|r| r.value.to_string()).collect();
    let label_width = labels.iter().map(|l| l.chars().count()).max().unwrap_or(0);
    let bar_width = width.saturating_sub(label_width + 12).max(5);

    let (lo, hi) = range(table.rows.iter().map(|r| r.response)).unwrap_or((0.0, 1.0));
    let lo = lo.min(0.0);
    let span = if hi > lo { hi - lo } else { 1.0 };

    let mut out = String::new();
    out.push_str(&format!("Plot: {} | response by level\n", table.column()));
    for (label, row) in labels.iter().zip(&table.rows) {
        let n = if row.response.is_finite() {
            (((row.response - lo) / span) * bar_width as f64).round() as usize
        } else {
            0
        };
        out.push_str(&format!(
            "{label:<label_width$} |{} {:.4}\n",
            "#".repeat(n.min(bar_width)),
            row.response
        ));
    }
    out
}

fn range(values: impl Iterator<Item = f64>) -> Option<(f64, f64)> {
    let mut min = f64::INFINITY;
    let mut max = f64::NEG_INFINITY;
    for v in values.filter(|v| v.is_finite()) {
        min = min.min(v);
        max = max.max(v);
    }
    if !(min.is_finite() && max.is_finite()) {
        return None;
    }
    if max > min { Some((min, max)) } else { Some((min - 0.5, max + 0.5)) }
}

fn pad_range(min: f64, max: f64, frac: f64) -> (f64, f64) {
    let span = (max - min).abs();
    let pad = (span * frac).max(1e-12);
    (min - pad, max + pad)
}

fn map_x(x: f64, x_min: f64, x_max: f64, width: usize) -> usize {
    let width = width.max(2);
    let u = ((x - x_min) / (x_max - x_min)).clamp(0.0, 1.0);
    (u * (width as f64 - 1.0)).round() as usize
}

fn map_y(y: f64, y_min: f64, y_max: f64, height: usize) -> usize {
    let height = height.max(2);
    let u = ((y - y_min) / (y_max - y_min)).clamp(0.0, 1.0);
    // y=top is max -> row 0
    (height as f64 - 1.0 - (u * (height as f64 - 1.0))).round() as usize
}

/// Integer line drawing (Bresenham-ish).
fn draw_line(grid: &mut [Vec<char>], x0: usize, y0: usize, x1: usize, y1: usize, ch: char) {
    let mut x0 = x0 as isize;
    let mut y0 = y0 as isize;
    let x1 = x1 as isize;
    let y1 = y1 as isize;

    let dx = (x1 - x0).abs();
    let sx = if x0 < x1 { 1 } else { -1 };
    let dy = -(y1 - y0).abs();
    let sy = if y0 < y1 { 1 } else { -1 };
    let mut err = dx + dy;

    loop {
        if y0 >= 0
            && (y0 as usize) < grid.len()
            && x0 >= 0
            && (x0 as usize) < grid[0].len()
            && grid[y0 as usize][x0 as usize] == ' '
        {
            grid[y0 as usize][x0 as usize] = ch;
        }

        if x0 == x1 && y0 == y1 {
            break;
        }
        let e2 = 2 * err;
        if e2 >= dy {
            err += dy;
            x0 += sx;
        }
        if e2 <= dx {
            err += dx;
            y0 += sy;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{GridValue, IceRow, ValueType};

    #[test]
    fn flat_curve_golden_snapshot() {
        let rows = [0.0, 5.0, 10.0]
            .iter()
            .map(|&x| IceRow { value: GridValue::Number(x), response: 1.0 })
            .collect();
        let table = IceTable::new("m", "x", 0, ValueType::Double, rows);
        let txt = render_ice_plot(&table, 11, 5);
        let expected = concat!(
            "Plot: x=[0.000, 10.000] | response=[0.4500, 1.5500]\n",
            "\n",
            "\n",
            "o----o----o\n",
            "\n",
            "\n",
        );
        assert_eq!(txt, expected);
    }

    #[test]
    fn categorical_renders_one_bar_per_level() {
        let rows = [("red", 0.2), ("green", 0.8)]
            .iter()
            .map(|&(l, r)| IceRow { value: GridValue::Label(l.to_string()), response: r })
            .collect();
        let table = IceTable::new("m", "color", 0, ValueType::String, rows);
        let txt = render_ice_plot(&table, 40, 5);
        let lines: Vec<&str> = txt.lines().collect();
        assert_eq!(lines.len(), 3);
        assert!(lines[1].starts_with("red   |"));
        assert!(lines[2].starts_with("green |"));
        assert!(lines[2].matches('#').count() > lines[1].matches('#').count());
    }
}
