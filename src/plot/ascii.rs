//! ASCII plotting of an expiry sweep for terminal output.
//!
//! Fixed-size grid, deterministic output. Days to expiry on x, price on y.
//!
//! Plot elements:
//! - priced points: `o`
//! - segments between consecutive priced points: `-`
//!
//! Rows without a price are skipped; the line bridges over them.

use crate::domain::PredictionResult;

/// Render a sweep plot.
pub fn render_sweep_plot(results: &[PredictionResult], width: usize, height: usize) -> String {
    let width = width.max(10);
    let height = height.max(5);

    let points: Vec<(f64, f64)> = results
        .iter()
        .filter_map(|r| r.price().map(|p| (f64::from(r.days_to_expiry), p)))
        .collect();

    if points.is_empty() {
        return "Plot: no prices available\n".to_string();
    }

    let (d_min, d_max) = range(points.iter().map(|&(d, _)| d)).unwrap_or((0.0, 1.0));
    let (y_min, y_max) = range(points.iter().map(|&(_, y)| y)).unwrap_or((0.0, 1.0));
    let (d_min, d_max) = widen(d_min, d_max);
    let (y_min, y_max) = pad_range(y_min, y_max, 0.05);

    let mut grid = vec![vec![' '; width]; height];

    // Line first so points overlay it.
    let mut prev = None;
    for &(d, y) in &points {
        let cell = (map_x(d, d_min, d_max, width), map_y(y, y_min, y_max, height));
        if let Some(start) = prev {
            draw_line(&mut grid, start, cell, '-');
        }
        prev = Some(cell);
    }
    for &(d, y) in &points {
        grid[map_y(y, y_min, y_max, height)][map_x(d, d_min, d_max, width)] = 'o';
    }

    let mut out = String::new();
    out.push_str(&format!(
        "Plot: days=[{d_min:.0}, {d_max:.0}] | price=[{y_min:.2}, {y_max:.2}]\n"
    ));
    for row in grid {
        out.push_str(row.into_iter().collect::<String>().trim_end());
        out.push('\n');
    }
    out
}

fn range(values: impl Iterator<Item = f64>) -> Option<(f64, f64)> {
    let (min, max) = values.fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), v| {
        (lo.min(v), hi.max(v))
    });
    (min.is_finite() && max.is_finite()).then_some((min, max))
}

/// Single-point sweeps still need a non-empty span.
fn widen(min: f64, max: f64) -> (f64, f64) {
    if max > min { (min, max) } else { (min - 1.0, max + 1.0) }
}

fn pad_range(min: f64, max: f64, frac: f64) -> (f64, f64) {
    let span = (max - min).abs();
    let pad = if span > 0.0 { span * frac } else { min.abs().max(1.0) * frac };
    (min - pad, max + pad)
}

fn map_x(v: f64, min: f64, max: f64, width: usize) -> usize {
    let u = ((v - min) / (max - min)).clamp(0.0, 1.0);
    (u * (width as f64 - 1.0)).round() as usize
}

fn map_y(y: f64, y_min: f64, y_max: f64, height: usize) -> usize {
    let u = ((y - y_min) / (y_max - y_min)).clamp(0.0, 1.0);
    // max price on row 0
    (height as f64 - 1.0 - (u * (height as f64 - 1.0))).round() as usize
}

/// Integer line drawing (Bresenham-ish). Only fills blank cells.
fn draw_line(grid: &mut [Vec<char>], from: (usize, usize), to: (usize, usize), ch: char) {
    let (mut x0, mut y0) = (from.0 as isize, from.1 as isize);
    let (x1, y1) = (to.0 as isize, to.1 as isize);

    let dx = (x1 - x0).abs();
    let sx = if x0 < x1 { 1 } else { -1 };
    let dy = -(y1 - y0).abs();
    let sy = if y0 < y1 { 1 } else { -1 };
    let mut err = dx + dy;

    loop {
        if let Some(cell) = grid.get_mut(y0 as usize).and_then(|row| row.get_mut(x0 as usize)) {
            if *cell == ' ' {
                *cell = ch;
            }
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
    use chrono::NaiveDate;

    use super::*;
    use crate::domain::Department;
    use crate::error::RowFailure;

    fn row(days: u32, price: Option<f64>) -> PredictionResult {
        PredictionResult {
            dept_id: Department::Foods2,
            days_to_expiry: days,
            date: NaiveDate::from_ymd_opt(2024, 1, 15).unwrap(),
            city: None,
            predicted_price: price.ok_or(RowFailure::Inference {
                department: Department::Foods2,
                message: "boom".into(),
            }),
        }
    }

    #[test]
    fn plot_golden_snapshot_small() {
        let results = vec![row(1, Some(100.0)), row(5, None), row(10, Some(110.0))];
        let txt = render_sweep_plot(&results, 10, 5);
        let expected = concat!(
            "Plot: days=[1, 10] | price=[99.50, 110.50]\n",
            "        -o\n",
            "      --\n",
            "    --\n",
            "  --\n",
            "o-\n",
        );
        assert_eq!(txt, expected);
    }

    #[test]
    fn nothing_to_plot() {
        let txt = render_sweep_plot(&[row(1, None)], 20, 8);
        assert_eq!(txt, "Plot: no prices available\n");
    }

    #[test]
    fn single_point_is_centered() {
        let txt = render_sweep_plot(&[row(3, Some(5.0))], 11, 5);
        let lines: Vec<&str> = txt.lines().collect();
        assert_eq!(lines.len(), 6);
        assert_eq!(lines[3], "     o");
    }
}
