use typemaster::analytics::PerformanceSample;

/// Compute X (seconds) and Y (WPM) bounds for the results chart
pub fn compute_chart_params(samples: &[PerformanceSample], elapsed_secs: u64) -> (f64, f64) {
    let highest_wpm = samples.iter().map(|s| s.wpm).max().unwrap_or(0) as f64;

    let overall_duration = match samples.last() {
        Some(s) => s.t,
        None => elapsed_secs as f64,
    }
    .max(1.0);

    (overall_duration, highest_wpm.max(1.0))
}

/// Format a simple numeric label consistently
pub fn format_label(val: f64) -> String {
    if (val - val.round()).abs() < f64::EPSILON {
        format!("{}", val.round())
    } else {
        format!("{val:.2}")
    }
}
