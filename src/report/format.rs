//! Formatted terminal output for priors, posteriors and presets.

use crate::data::SampleColumn;
use crate::domain::Preset;
use crate::error::AppError;
use crate::infer::{Consistency, MatchDiagnostics, Posterior, PriorComparison};
use crate::math::{ColumnSummary, KsTest};
use crate::plot::{render_histogram, render_scatter};
use crate::prior::{GenerationReport, Prior};

/// Dataset, configuration and per-column statistics of a prior.
pub fn format_prior_summary(prior: &Prior) -> String {
    let mut out = String::new();

    out.push_str("=== archeo - Prior ===\n");
    out.push_str(&format!("Rows: {}\n", prior.len()));
    match prior.config() {
        Some(config) => out.push_str(&format!("Config: {config}\n")),
        None => out.push_str("Config: (not recorded)\n"),
    }
    let tol = prior.tolerances();
    out.push_str(&format!(
        "Tolerances: mass={} spin={} | match mode: {}\n",
        tol.mass(),
        tol.spin(),
        prior.match_mode()
    ));
    if let Some(report) = prior.report() {
        out.push('\n');
        out.push_str(&format_generation_report(report));
    }

    out.push_str("\nColumns:\n");
    let rows: Vec<(&str, ColumnSummary)> = SampleColumn::ALL
        .iter()
        .filter_map(|&c| ColumnSummary::from_values(&prior.column(c)).map(|s| (c.name(), s)))
        .collect();
    out.push_str(&format_summary_table(&rows));

    out
}

pub fn format_generation_report(report: &GenerationReport) -> String {
    let mut out = String::new();
    out.push_str("Generation:\n");
    out.push_str(&format!("- model: {}\n", report.model));
    out.push_str(&format!("- seed: {}\n", report.seed));
    out.push_str(&format!(
        "- kept {} of {} ({} dropped, {} extrapolated)\n",
        report.kept,
        report.requested,
        report.dropped_total(),
        report.extrapolated
    ));
    for (reason, count) in &report.dropped {
        out.push_str(&format!("  dropped {count:>8} {reason}\n"));
    }
    if !report.ancestry.is_empty() {
        let parts: Vec<String> = report.ancestry.iter().map(|c| format!("m_{}", c.index())).collect();
        out.push_str(&format!("- inherited from remnants: {}\n", parts.join(", ")));
    }
    out.push_str(&format!(
        "- generated at {} in {:.2}s\n",
        report.generated_at.format("%Y-%m-%d %H:%M:%S UTC"),
        report.elapsed_seconds
    ));
    out
}

/// Histograms of the remnant properties and the remnant mass-spin plane.
pub fn format_prior_plots(prior: &Prior, width: usize, height: usize) -> String {
    let m_f = prior.column(SampleColumn::MF);
    let a_f = prior.column(SampleColumn::AF);

    let mut out = String::new();
    for column in [SampleColumn::MF, SampleColumn::AF, SampleColumn::KF] {
        out.push_str(&render_histogram(&prior.column(column), column.name(), width, height));
        out.push('\n');
    }
    out.push_str(&render_scatter(&m_f, &a_f, "m_f", "a_f", width, height));
    out
}

/// Match diagnostics, consistency checks and progenitor summaries.
pub fn format_posterior_summary(posterior: &Posterior) -> String {
    let mut out = String::new();

    out.push_str("=== archeo - Posterior ===\n");
    out.push_str(&format!("Component: m_{}\n", posterior.component().index()));
    let tol = posterior.tolerances();
    out.push_str(&format!(
        "Tolerances: mass={} spin={} | match mode: {}\n",
        tol.mass(),
        tol.spin(),
        posterior.match_mode()
    ));
    out.push_str(&format_diagnostics(posterior.diagnostics()));

    if posterior.is_empty() {
        out.push_str("\nNo prior rows matched the observed samples.\n");
        return out;
    }

    out.push_str("\nConsistency (observed vs matched remnants):\n");
    out.push_str(&format_consistency(&posterior.consistency()));

    out.push_str("\nProgenitor parameters:\n");
    let summary = posterior.summary();
    let rows: Vec<(&str, ColumnSummary)> = summary.entries.iter().map(|e| (e.column, e.summary)).collect();
    out.push_str(&format_summary_table(&rows));

    out
}

fn format_diagnostics(d: &MatchDiagnostics) -> String {
    let mut out = String::new();
    out.push_str(&format!(
        "Draws: {} | matched draws: {} ({:.2}%) | posterior rows: {}\n",
        d.n_draws,
        d.n_matched_draws,
        100.0 * d.match_rate,
        d.n_matched_rows
    ));
    out.push_str(&format!(
        "Prior rows: {} | mean likelihood: {:.3e}\n",
        d.prior_size, d.mean_likelihood
    ));
    if d.is_low() {
        out.push_str("Warning: low match rate; consider wider tolerances or a denser prior.\n");
    }
    out
}

fn format_consistency(c: &Consistency) -> String {
    let mut out = String::new();
    for (name, test) in [("m_f", c.mass), ("a_f", c.spin)] {
        out.push_str(&format!("- {name}: {}\n", fmt_ks(test)));
    }
    out
}

fn fmt_ks(test: Option<KsTest>) -> String {
    match test {
        Some(t) => format!("KS D={:.4} p={:.4} (n={} vs {})", t.statistic, t.p_value, t.n1, t.n2),
        None => "n/a".to_string(),
    }
}

/// Per-parameter Bayes factors and their product.
pub fn format_prior_comparison(comparison: &PriorComparison) -> String {
    let mut out = String::new();
    out.push_str("=== archeo - Prior comparison ===\n");
    out.push_str(&format!("Bins per parameter: {}\n", comparison.bins));
    out.push_str(format!("{:<10} {:>14}\n", "column", "bayes factor").trim_end());
    out.push('\n');
    out.push_str(format!("{:-<10} {:-<14}\n", "", "").trim_end());
    out.push('\n');
    for f in &comparison.factors {
        out.push_str(&format!("{:<10} {:>14}\n", truncate(f.column, 10), fmt_num(f.bayes_factor)));
    }
    out.push_str(&format!("Cumulative Bayes factor: {}\n", fmt_num(comparison.cumulative)));
    out
}

/// One line per built-in preset with its configuration.
pub fn format_presets() -> Result<String, AppError> {
    let mut out = String::new();
    for preset in Preset::ALL {
        let config = preset.config()?;
        out.push_str(&format!("{:<26} {config}\n", preset.name()));
    }
    Ok(out)
}

fn format_summary_table(rows: &[(&str, ColumnSummary)]) -> String {
    let mut out = String::new();
    out.push_str(
        format!(
            "{:<10} {:>8} {:>12} {:>12} {:>12} {:>12} {:>12} {:>12} {:>12}\n",
            "column", "n", "mean", "std", "min", "p05", "p50", "p95", "max"
        )
        .trim_end(),
    );
    out.push('\n');
    out.push_str(
        format!(
            "{:-<10} {:-<8} {:-<12} {:-<12} {:-<12} {:-<12} {:-<12} {:-<12} {:-<12}\n",
            "", "", "", "", "", "", "", "", ""
        )
        .trim_end(),
    );
    out.push('\n');

    for (name, s) in rows {
        out.push_str(&format!(
            "{:<10} {:>8} {:>12} {:>12} {:>12} {:>12} {:>12} {:>12} {:>12}\n",
            truncate(name, 10),
            s.count,
            fmt_num(s.mean),
            fmt_num(s.std),
            fmt_num(s.min),
            fmt_num(s.p05),
            fmt_num(s.p50),
            fmt_num(s.p95),
            fmt_num(s.max),
        ));
    }
    out
}

fn fmt_num(v: f64) -> String {
    if v != 0.0 && (v.abs() >= 1e5 || v.abs() < 1e-3) {
        format!("{v:.3e}")
    } else {
        format!("{v:.4}")
    }
}

fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        return s.to_string();
    }
    let mut out: String = s.chars().take(max.saturating_sub(1)).collect();
    out.push('.');
    out
}
