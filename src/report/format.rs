//! Render fit results and measurements as aligned plain text.

use std::fmt::Write as _;

use crate::domain::{FitResult, MeasureKind, Measurement};

/// Multi-line summary of a fit: model, convergence, quality, parameters.
pub fn format_fit_report(result: &FitResult) -> String {
    let mut out = String::new();

    let _ = writeln!(out, "Model: {}", result.model);
    let _ = writeln!(
        out,
        "Converged: {} ({} iterations)",
        if result.converged { "yes" } else { "no" },
        result.iterations
    );
    let _ = writeln!(
        out,
        "N: {}   SSE: {:.6e}   RMSE: {:.6e}",
        result.x.len(),
        result.sse,
        result.rmse
    );

    let name_width = result
        .params
        .iter()
        .map(|p| p.name.len())
        .max()
        .unwrap_or(0);

    let _ = writeln!(out, "Parameters:");
    for p in &result.params {
        let stderr = if p.stderr.is_nan() {
            "n/a".to_string()
        } else {
            format!("{:.6e}", p.stderr)
        };
        let _ = writeln!(
            out,
            "  {:name_width$} = {:>14.6e} +/- {}{}",
            p.name,
            p.value,
            stderr,
            if p.fixed { "  (fixed)" } else { "" },
        );
    }

    out
}

/// One-line summary of a measurement.
pub fn format_measurement(m: &Measurement) -> String {
    let label = match m.kind {
        MeasureKind::Mean => "mean".to_string(),
        MeasureKind::Median => "median".to_string(),
        MeasureKind::Min => "min".to_string(),
        MeasureKind::Max => "max".to_string(),
        MeasureKind::AbsMax => "abs max".to_string(),
        MeasureKind::Peak {
            positive,
            half_width,
        } => format!(
            "{} peak (+/-{} pts)",
            if positive { "positive" } else { "negative" },
            half_width
        ),
    };
    format!("{label}: y = {:.6} at x = {:.6} (n = {})", m.y, m.x, m.n)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::FittedParam;

    #[test]
    fn fit_report_mentions_everything_that_matters() {
        let result = FitResult {
            model: "exponential".into(),
            params: vec![
                FittedParam {
                    name: "a".into(),
                    value: 2.0,
                    stderr: 0.01,
                    fixed: false,
                },
                FittedParam {
                    name: "c".into(),
                    value: 0.1,
                    stderr: f64::NAN,
                    fixed: true,
                },
            ],
            x: vec![0.0, 0.1],
            fitted: vec![2.1, 1.9],
            residuals: vec![0.0, 0.0],
            sse: 0.0,
            rmse: 0.0,
            converged: true,
            iterations: 7,
        };

        let report = format_fit_report(&result);
        assert!(report.contains("Model: exponential"));
        assert!(report.contains("Converged: yes (7 iterations)"));
        assert!(report.contains("(fixed)"));
        assert!(report.contains("n/a"));
    }

    #[test]
    fn measurement_line() {
        let m = Measurement {
            kind: MeasureKind::Peak {
                positive: false,
                half_width: 2,
            },
            x: 0.25,
            y: -120.5,
            n: 41,
        };
        let line = format_measurement(&m);
        assert!(line.contains("negative peak"));
        assert!(line.contains("n = 41"));
    }
}
