/// Per-position verdict of the typed text against the reference.
#[derive(Clone, Debug, Copy, PartialEq, Eq)]
pub enum Outcome {
    Correct,
    Incorrect,
    /// Reference position the user has not reached yet. Never counted.
    Untyped,
}

/// Aggregate counts for the text typed so far.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ScoreState {
    pub typed_count: usize,
    pub correct_count: usize,
    pub error_count: usize,
}

/// Compare `typed` against `reference` position by position.
///
/// The verdict list covers every position of either string: typed positions
/// are `Correct` or `Incorrect` (anything typed past the end of the reference
/// is `Incorrect`), and reference positions beyond the typed text are
/// `Untyped`. Comparison is exact `char` equality with no normalization.
pub fn score(reference: &str, typed: &str) -> (ScoreState, Vec<Outcome>) {
    let mut expected = reference.chars();
    let mut state = ScoreState::default();
    let mut verdicts = Vec::with_capacity(reference.len().max(typed.len()));

    for c in typed.chars() {
        let outcome = match expected.next() {
            Some(e) if e == c => Outcome::Correct,
            _ => Outcome::Incorrect,
        };
        match outcome {
            Outcome::Correct => state.correct_count += 1,
            _ => state.error_count += 1,
        }
        state.typed_count += 1;
        verdicts.push(outcome);
    }

    verdicts.extend(expected.map(|_| Outcome::Untyped));

    (state, verdicts)
}
