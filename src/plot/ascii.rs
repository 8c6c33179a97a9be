//! ASCII plotting for terminal output.
//!
//! Fixed-size character grids, deterministic for golden tests.
//!
//! Plot elements:
//! - histogram bars: `#`
//! - scatter density: `.` `:` `o` `O` `@` (1, 2, 3-4, 5-8, more points per cell)

use crate::math::histogram;

/// Render a vertical-bar histogram with one bin per column.
pub fn render_histogram(values: &[f64], label: &str, width: usize, height: usize) -> String {
    let width = width.max(1);
    let height = height.max(1);

    let Some((lo, hi)) = finite_range(values) else {
        return format!("Histogram: {label} | no data\n");
    };
    let counts = histogram(values, lo, hi, width);
    let peak = counts.iter().copied().max().unwrap_or(0).max(1);
    let bars: Vec<usize> = counts
        .iter()
        .map(|&c| ((c as f64 / peak as f64) * height as f64).round() as usize)
        .collect();

    let mut out = String::new();
    out.push_str(&format!(
        "Histogram: {label} in [{lo:.3}, {hi:.3}] | n={} | max bin={peak}\n",
        values.len()
    ));
    for level in (1..=height).rev() {
        let row: String = bars.iter().map(|&b| if b >= level { '#' } else { ' ' }).collect();
        out.push_str(&row);
        out.push('\n');
    }
    out.push_str(&"-".repeat(width));
    out.push('\n');
    out
}

/// Render a density scatter plot of `(xs[i], ys[i])`.
pub fn render_scatter(
    xs: &[f64],
    ys: &[f64],
    x_label: &str,
    y_label: &str,
    width: usize,
    height: usize,
) -> String {
    let width = width.max(2);
    let height = height.max(2);

    let (Some(x_range), Some(y_range)) = (finite_range(xs), finite_range(ys)) else {
        return format!("Scatter: {x_label} vs {y_label} | no data\n");
    };
    let (x_min, x_max) = pad_range(widen(x_range), 0.05);
    let (y_min, y_max) = pad_range(widen(y_range), 0.05);

    let mut counts = vec![vec![0usize; width]; height];
    for (&x, &y) in xs.iter().zip(ys) {
        if !(x.is_finite() && y.is_finite()) {
            continue;
        }
        let col = map_x(x, x_min, x_max, width);
        let row = map_y(y, y_min, y_max, height);
        counts[row][col] += 1;
    }

    let mut out = String::new();
    out.push_str(&format!(
        "Scatter: {x_label}=[{x_min:.3}, {x_max:.3}] | {y_label}=[{y_min:.3}, {y_max:.3}]\n"
    ));
    for row in counts {
        out.push_str(&row.into_iter().map(density_char).collect::<String>());
        out.push('\n');
    }
    out
}

fn density_char(count: usize) -> char {
    match count {
        0 => ' ',
        1 => '.',
        2 => ':',
        3..=4 => 'o',
        5..=8 => 'O',
        _ => '@',
    }
}

/// Min and max of the finite values, if any.
fn finite_range(values: &[f64]) -> Option<(f64, f64)> {
    let mut min = f64::INFINITY;
    let mut max = f64::NEG_INFINITY;
    for &v in values.iter().filter(|v| v.is_finite()) {
        min = min.min(v);
        max = max.max(v);
    }
    (min <= max).then_some((min, max))
}

/// Give a single-valued range unit width so it can be mapped.
fn widen((min, max): (f64, f64)) -> (f64, f64) {
    if max > min { (min, max) } else { (min - 0.5, max + 0.5) }
}

fn pad_range((min, max): (f64, f64), frac: f64) -> (f64, f64) {
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
