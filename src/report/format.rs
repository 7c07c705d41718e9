//! Formatted terminal output for age results.
//!
//! Formatting lives in one place so the engine stays free of presentation
//! code and output changes stay local.

use crate::age::{AgeWizard, CombinedPdf};
use crate::domain::{Abundance, Diagnostic};
use crate::grid::{time_bins, StackedGrids};

/// Width of the longest bar in the combined PDF histogram.
const BAR_WIDTH: usize = 40;
/// Bins below this probability are left out of the histogram.
const HISTOGRAM_FLOOR: f64 = 1e-3;

/// Header plus one row per source: most likely age and, when a range is
/// given, the probability of lying inside it.
pub fn format_source_summary(wizard: &AgeWizard, age_range: Option<(f64, f64)>) -> String {
    let mut out = String::new();
    out.push_str("=== ages - Stellar Age Estimates ===\n");
    out.push_str(&format!(
        "Model: {} | planes {}x{} | sources: {}\n\n",
        wizard.model().kind().display_name(),
        wizard.model().shape().0,
        wizard.model().shape().1,
        wizard.sources().len()
    ));

    let in_range = age_range.map(|(a, b)| wizard.probability_in_age_range(a, b));
    let range_label = age_range
        .map(|(a, b)| format!("P[{:.2},{:.2}]", a.min(b), a.max(b)))
        .unwrap_or_default();

    out.push_str(format!("{:<24} {:>10} {:>14}", "name", "log(age)", range_label).trim_end());
    out.push('\n');
    out.push_str(format!("{:-<24} {:-<10} {:-<14}", "", "", "").trim_end());
    out.push('\n');

    for (i, (name, age)) in wizard.sources().iter().zip(wizard.most_likely_ages()).enumerate() {
        let age = age.map(|a| format!("{a:.1}")).unwrap_or_else(|| "-".to_string());
        let p = in_range
            .as_ref()
            .map(|p| format!("{:.4}", p[i]))
            .unwrap_or_default();
        out.push_str(format!("{:<24} {:>10} {:>14}", truncate(name, 24), age, p).trim_end());
        out.push('\n');
    }

    out
}

/// Combined PDF: which sources entered, the peak, and a text histogram.
pub fn format_combined(combined: &CombinedPdf, age_range: Option<(f64, f64)>) -> String {
    let mut out = String::new();
    out.push_str(&format!(
        "\nCombined PDF ({} sources): {}\n",
        combined.sources_used().len(),
        combined.sources_used().join(", ")
    ));

    match combined.most_likely_age() {
        Some(age) => out.push_str(&format!("Most likely log(age/yr): {age:.1}\n")),
        None => out.push_str("Most likely log(age/yr): - (combined PDF is zero everywhere)\n"),
    }
    if let Some((a, b)) = age_range {
        out.push_str(&format!(
            "P(log age in [{:.2}, {:.2}]): {:.4}\n",
            a.min(b),
            a.max(b),
            combined.probability_in_age_range(a, b)
        ));
    }

    let peak = combined.values().iter().copied().fold(0.0, f64::max);
    if peak > 0.0 {
        out.push('\n');
        for (t, &p) in combined.time_bins().iter().zip(combined.values()) {
            if p < HISTOGRAM_FLOOR {
                continue;
            }
            let len = ((p / peak) * BAR_WIDTH as f64).round() as usize;
            out.push_str(format!("{t:>5.1} {p:>7.4} {}", "#".repeat(len)).trim_end());
            out.push('\n');
        }
    }

    out
}

/// Per-class totals of a stacked grid.
pub fn format_stack(stacked: &StackedGrids) -> String {
    let bins = time_bins();
    let label = |bin: usize| bins.get(bin).map(|t| format!("{t:.1}")).unwrap_or_else(|| "11.1".to_string());

    let mut out = String::new();
    out.push_str(&format!(
        "Stacked bins {}..{} (log age {} to {}, end exclusive)\n",
        stacked.bins.start,
        stacked.bins.end,
        label(stacked.bins.start),
        label(stacked.bins.end)
    ));
    for (class, plane) in Abundance::ALL
        .iter()
        .zip([&stacked.high, &stacked.medium, &stacked.low])
    {
        out.push_str(&format!("  {:<8} {:.6e}\n", class.display_name(), plane.sum()));
    }
    out.push_str(&format!("  {:<8} {:.6e}\n", "all", stacked.all.sum()));
    out
}

/// Diagnostics as an indented list; empty when there are none.
pub fn format_diagnostics(diagnostics: &[Diagnostic]) -> String {
    if diagnostics.is_empty() {
        return String::new();
    }
    let mut out = format!("\nDiagnostics ({}):\n", diagnostics.len());
    for d in diagnostics {
        out.push_str(&format!("  - {}\n", d.message));
    }
    out
}

fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        return s.to_string();
    }
    let mut out: String = s.chars().take(max.saturating_sub(1)).collect();
    out.push('.');
    out
}
