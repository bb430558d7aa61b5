use crate::scorer::ScoreState;

/// Characters counted as one word, the usual typing-test convention.
pub const CHARS_PER_WORD: usize = 5;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Metrics {
    pub wpm: u32,
    pub cpm: u32,
    /// Percentage in 0..=100.
    pub accuracy: u32,
}

/// Derive speed and accuracy from the correct/typed counts and the elapsed time.
///
/// A negative elapsed time is clamped to zero, and zero elapsed time yields
/// zero speeds instead of dividing by zero. With nothing typed the accuracy is
/// 100: no attempts, no errors.
pub fn compute(correct_count: usize, typed_count: usize, elapsed_secs: f64) -> Metrics {
    let elapsed_minutes = elapsed_secs.max(0.0) / 60.0;

    let (wpm, cpm) = if elapsed_minutes > 0.0 {
        let correct = correct_count as f64;
        (
            (correct / CHARS_PER_WORD as f64 / elapsed_minutes).round() as u32,
            (correct / elapsed_minutes).round() as u32,
        )
    } else {
        (0, 0)
    };

    let accuracy = if typed_count == 0 {
        100
    } else {
        ((correct_count as f64 / typed_count as f64) * 100.0).round() as u32
    };

    Metrics { wpm, cpm, accuracy }
}

/// Approximate (correct, incorrect) word counts. Not a real tokenization.
pub fn word_counts(score: &ScoreState) -> (usize, usize) {
    (
        score.correct_count / CHARS_PER_WORD,
        score.error_count / CHARS_PER_WORD,
    )
}
