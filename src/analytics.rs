use crate::metrics;
use crate::scorer::{score, Outcome};
use itertools::Itertools;

/// Live figures captured once per countdown tick.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PerformanceSample {
    /// Seconds since the session started.
    pub t: f64,
    pub wpm: u32,
    pub accuracy: u32,
    pub characters: usize,
}

impl PerformanceSample {
    pub fn new(t: f64, wpm: u32, accuracy: u32, characters: usize) -> Self {
        Self {
            t,
            wpm,
            accuracy,
            characters,
        }
    }

    /// Capture a sample from the running counters.
    pub fn capture(t: f64, correct_count: usize, typed_count: usize) -> Self {
        let m = metrics::compute(correct_count, typed_count, t);
        Self::new(t, m.wpm, m.accuracy, typed_count)
    }
}

impl From<PerformanceSample> for (f64, f64) {
    fn from(p: PerformanceSample) -> Self {
        (p.t, p.wpm as f64)
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AdvancedStats {
    pub max_wpm: u32,
    pub avg_wpm: u32,
    pub min_accuracy: u32,
    /// 0..=100, 100 when the speed never varied.
    pub consistency: u32,
    pub std_dev: f64,
}

impl AdvancedStats {
    /// Summarize the speed trace. Needs at least two samples.
    pub fn from_samples(samples: &[PerformanceSample]) -> Option<Self> {
        if samples.len() < 2 {
            return None;
        }

        let wpms: Vec<f64> = samples.iter().map(|s| s.wpm as f64).collect();
        let max_wpm = samples.iter().map(|s| s.wpm).max()?;
        let min_wpm = samples.iter().map(|s| s.wpm).min()?;
        let min_accuracy = samples.iter().map(|s| s.accuracy).min()?;
        let avg = mean(&wpms)?;
        let avg_wpm = avg.round() as u32;

        let consistency = if avg_wpm == 0 {
            100
        } else {
            let spread = ((max_wpm - min_wpm) as f64 / avg_wpm as f64 * 100.0).round();
            (100.0 - spread).max(0.0) as u32
        };

        Some(Self {
            max_wpm,
            avg_wpm,
            min_accuracy,
            consistency,
            std_dev: std_dev(&wpms)?,
        })
    }
}

/// Where and how the typed text diverged from the reference.
#[derive(Debug, Clone, PartialEq)]
pub struct ErrorAnalysis {
    pub error_positions: Vec<usize>,
    /// (expected, typed, count), most frequent first.
    pub common_errors: Vec<(char, char, usize)>,
    /// Percentage of typed characters that were wrong.
    pub error_rate: f64,
}

impl ErrorAnalysis {
    /// Errors typed past the end of the reference count as positions but
    /// have no expected character, so they are left out of `common_errors`.
    pub fn analyze(reference: &str, typed: &str) -> Self {
        let (state, verdicts) = score(reference, typed);

        let error_positions: Vec<usize> = verdicts
            .iter()
            .positions(|v| *v == Outcome::Incorrect)
            .collect();

        let common_errors = reference
            .chars()
            .zip(typed.chars())
            .filter(|(expected, got)| expected != got)
            .counts()
            .into_iter()
            .map(|((expected, got), n)| (expected, got, n))
            .sorted_by(|a, b| b.2.cmp(&a.2).then(a.0.cmp(&b.0)).then(a.1.cmp(&b.1)))
            .collect();

        let error_rate = if state.typed_count == 0 {
            0.0
        } else {
            state.error_count as f64 / state.typed_count as f64 * 100.0
        };

        Self {
            error_positions,
            common_errors,
            error_rate,
        }
    }
}

pub fn mean(data: &[f64]) -> Option<f64> {
    match data.len() {
        0 => None,
        count => Some(data.iter().sum::<f64>() / count as f64),
    }
}

/// Population standard deviation.
pub fn std_dev(data: &[f64]) -> Option<f64> {
    let data_mean = mean(data)?;
    let variance = data
        .iter()
        .map(|value| {
            let diff = data_mean - *value;
            diff * diff
        })
        .sum::<f64>()
        / data.len() as f64;

    Some(variance.sqrt())
}
