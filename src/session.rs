use crate::analytics::PerformanceSample;
use crate::clock::{Clock, SystemClock};
use crate::error::{Error, Result};
use crate::history::{HistoryStore, SessionResult};
use crate::metrics::{self, Metrics};
use crate::scorer::{self, Outcome, ScoreState};
use crate::storage::KvStore;
use chrono::{DateTime, Local};
use std::sync::mpsc::{self, Receiver, Sender};
use std::time::{Duration, SystemTime};
use tracing::{debug, info};

/// Countdown granularity.
pub const TICK_INTERVAL: Duration = Duration::from_secs(1);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionStatus {
    Idle,
    Running,
    Finished,
}

/// Notifications for whoever renders the session.
#[derive(Debug, Clone, PartialEq)]
pub enum SessionEvent {
    Started { duration_secs: u64 },
    Tick { seconds_remaining: u64 },
    Finished(SessionResult),
    Reset,
}

#[derive(Debug, Clone)]
pub struct Session {
    pub reference: String,
    pub reference_len: usize,
    pub started_at: SystemTime,
    pub ended_at: Option<SystemTime>,
    pub duration_secs: u64,
    pub seconds_remaining: u64,
}

/// Handle for the pending countdown tick. Dropping it cancels the countdown.
#[derive(Debug, Clone, Copy)]
struct TickSchedule {
    next_tick: SystemTime,
}

impl TickSchedule {
    fn starting_at(now: SystemTime) -> Self {
        Self {
            next_tick: now + TICK_INTERVAL,
        }
    }

    fn is_due(&self, now: SystemTime) -> bool {
        now >= self.next_tick
    }

    fn advance(&mut self) {
        self.next_tick += TICK_INTERVAL;
    }
}

/// Time spent suspended, excluded from the session's elapsed time.
#[derive(Debug, Clone, Copy, Default)]
struct PauseLedger {
    suspended_at: Option<SystemTime>,
    total: Duration,
}

impl PauseLedger {
    fn suspended_until(&self, now: SystemTime) -> Duration {
        let ongoing = self
            .suspended_at
            .map(|at| now.duration_since(at).unwrap_or_default())
            .unwrap_or_default();
        self.total + ongoing
    }
}

/// Owns the lifecycle of one typing session at a time:
/// Idle → Running → Finished, back to Idle on reset.
pub struct SessionController<S: KvStore, C: Clock = SystemClock> {
    clock: C,
    history: HistoryStore<S>,
    status: SessionStatus,
    session: Option<Session>,
    typed: String,
    score: ScoreState,
    outcomes: Vec<Outcome>,
    schedule: Option<TickSchedule>,
    pauses: PauseLedger,
    samples: Vec<PerformanceSample>,
    last_result: Option<SessionResult>,
    subscribers: Vec<Sender<SessionEvent>>,
}

impl<S: KvStore> SessionController<S, SystemClock> {
    pub fn new(history: HistoryStore<S>) -> Self {
        Self::with_clock(history, SystemClock)
    }
}

impl<S: KvStore, C: Clock> SessionController<S, C> {
    pub fn with_clock(history: HistoryStore<S>, clock: C) -> Self {
        Self {
            clock,
            history,
            status: SessionStatus::Idle,
            session: None,
            typed: String::new(),
            score: ScoreState::default(),
            outcomes: Vec::new(),
            schedule: None,
            pauses: PauseLedger::default(),
            samples: Vec::new(),
            last_result: None,
            subscribers: Vec::new(),
        }
    }

    /// Register a listener for session notifications.
    pub fn subscribe(&mut self) -> Receiver<SessionEvent> {
        let (tx, rx) = mpsc::channel();
        self.subscribers.push(tx);
        rx
    }

    fn emit(&mut self, event: SessionEvent) {
        self.subscribers.retain(|tx| tx.send(event.clone()).is_ok());
    }

    /// Begin a new session. A running session is reset first.
    ///
    /// Fails with [`Error::InvalidInput`] for an empty reference text or a
    /// zero duration, leaving the controller untouched.
    pub fn start(&mut self, reference: &str, duration_secs: u64) -> Result<()> {
        if reference.is_empty() {
            return Err(Error::InvalidInput("reference text is empty".into()));
        }
        if duration_secs == 0 {
            return Err(Error::InvalidInput("duration must be at least one second".into()));
        }

        if self.status == SessionStatus::Running {
            self.reset();
        }

        let now = self.clock.now();
        self.session = Some(Session {
            reference: reference.to_string(),
            reference_len: reference.chars().count(),
            started_at: now,
            ended_at: None,
            duration_secs,
            seconds_remaining: duration_secs,
        });
        self.typed.clear();
        let (score, outcomes) = scorer::score(reference, "");
        self.score = score;
        self.outcomes = outcomes;
        self.samples.clear();
        self.pauses = PauseLedger::default();
        self.last_result = None;
        self.schedule = Some(TickSchedule::starting_at(now));
        self.status = SessionStatus::Running;

        info!(
            "session started: {} chars, {}s",
            reference.chars().count(),
            duration_secs
        );
        self.emit(SessionEvent::Started { duration_secs });
        Ok(())
    }

    /// Rescore the whole typed text. Ignored unless running.
    ///
    /// Reaching the end of the reference finishes the session immediately.
    pub fn submit_input(&mut self, typed: &str) {
        if self.status != SessionStatus::Running {
            return;
        }
        let Some(session) = self.session.as_ref() else {
            return;
        };

        let (score, outcomes) = scorer::score(&session.reference, typed);
        let reference_len = session.reference_len;
        self.score = score;
        self.outcomes = outcomes;
        self.typed = typed.to_string();

        if score.typed_count >= reference_len {
            self.finish();
        }
    }

    /// Fire every countdown tick that has come due. Call this from the event
    /// loop; it does nothing while idle, finished or suspended.
    pub fn poll(&mut self) {
        let now = self.clock.now();
        while self.status == SessionStatus::Running {
            match self.schedule.as_mut() {
                Some(schedule) if schedule.is_due(now) => schedule.advance(),
                _ => break,
            }
            self.on_tick();
        }
    }

    fn on_tick(&mut self) {
        let Some(session) = self.session.as_mut() else {
            return;
        };
        session.seconds_remaining = session.seconds_remaining.saturating_sub(1);
        let seconds_remaining = session.seconds_remaining;

        let sample = PerformanceSample::capture(
            self.active_elapsed().as_secs_f64(),
            self.score.correct_count,
            self.score.typed_count,
        );
        self.samples.push(sample);

        self.emit(SessionEvent::Tick { seconds_remaining });

        if seconds_remaining == 0 {
            self.finish();
        }
    }

    /// End the running session and record its result. The first call wins;
    /// later calls return `None`.
    pub fn finish(&mut self) -> Option<SessionResult> {
        if self.status != SessionStatus::Running {
            return None;
        }

        let now = self.clock.now();
        self.schedule = None;
        let elapsed = self.active_elapsed_at(now);
        if let Some(session) = self.session.as_mut() {
            session.ended_at = Some(now);
        }
        self.status = SessionStatus::Finished;

        let elapsed_secs = elapsed.as_secs_f64();
        let m = metrics::compute(
            self.score.correct_count,
            self.score.typed_count,
            elapsed_secs,
        );
        let (correct_words, incorrect_words) = metrics::word_counts(&self.score);
        let result = SessionResult {
            timestamp: DateTime::<Local>::from(now),
            wpm: m.wpm,
            cpm: m.cpm,
            accuracy: m.accuracy,
            elapsed_secs: elapsed_secs.round() as u64,
            correct_words,
            incorrect_words,
            total_chars_typed: self.score.typed_count,
        };

        info!(
            "session finished: {} wpm, {} cpm, {}% accuracy in {:.1}s",
            result.wpm, result.cpm, result.accuracy, elapsed_secs
        );
        self.history.append(result.clone());
        self.last_result = Some(result.clone());
        self.emit(SessionEvent::Finished(result.clone()));
        Some(result)
    }

    /// Drop the current session, whatever its state.
    pub fn reset(&mut self) {
        self.schedule = None;
        self.session = None;
        self.typed.clear();
        self.score = ScoreState::default();
        self.outcomes.clear();
        self.samples.clear();
        self.pauses = PauseLedger::default();
        self.last_result = None;
        self.status = SessionStatus::Idle;
        debug!("session reset");
        self.emit(SessionEvent::Reset);
    }

    /// Pause the countdown, e.g. when the terminal loses focus. The paused
    /// time is excluded from the elapsed time used for the metrics.
    pub fn suspend(&mut self) {
        if self.status != SessionStatus::Running || self.pauses.suspended_at.is_some() {
            return;
        }
        self.schedule = None;
        self.pauses.suspended_at = Some(self.clock.now());
        debug!("session suspended");
    }

    /// Restart the countdown from the last remaining-time value.
    pub fn resume(&mut self) {
        if self.status != SessionStatus::Running {
            return;
        }
        let Some(suspended_at) = self.pauses.suspended_at.take() else {
            return;
        };
        let now = self.clock.now();
        self.pauses.total += now.duration_since(suspended_at).unwrap_or_default();
        self.schedule = Some(TickSchedule::starting_at(now));
        debug!("session resumed");
    }

    fn active_elapsed(&self) -> Duration {
        self.active_elapsed_at(self.clock.now())
    }

    fn active_elapsed_at(&self, now: SystemTime) -> Duration {
        let Some(session) = self.session.as_ref() else {
            return Duration::ZERO;
        };
        let end = session.ended_at.unwrap_or(now);
        end.duration_since(session.started_at)
            .unwrap_or_default()
            .saturating_sub(self.pauses.suspended_until(end))
    }

    /// Metrics for the text typed so far, against the active elapsed time.
    pub fn live_metrics(&self) -> Metrics {
        metrics::compute(
            self.score.correct_count,
            self.score.typed_count,
            self.active_elapsed().as_secs_f64(),
        )
    }

    pub fn status(&self) -> SessionStatus {
        self.status
    }

    pub fn is_running(&self) -> bool {
        self.status == SessionStatus::Running
    }

    pub fn is_suspended(&self) -> bool {
        self.pauses.suspended_at.is_some()
    }

    pub fn session(&self) -> Option<&Session> {
        self.session.as_ref()
    }

    pub fn reference(&self) -> Option<&str> {
        self.session.as_ref().map(|s| s.reference.as_str())
    }

    pub fn typed(&self) -> &str {
        &self.typed
    }

    pub fn score(&self) -> ScoreState {
        self.score
    }

    pub fn outcomes(&self) -> &[Outcome] {
        &self.outcomes
    }

    pub fn seconds_remaining(&self) -> Option<u64> {
        self.session.as_ref().map(|s| s.seconds_remaining)
    }

    pub fn samples(&self) -> &[PerformanceSample] {
        &self.samples
    }

    pub fn last_result(&self) -> Option<&SessionResult> {
        self.last_result.as_ref()
    }

    pub fn history(&self) -> &HistoryStore<S> {
        &self.history
    }

    pub fn history_mut(&mut self) -> &mut HistoryStore<S> {
        &mut self.history
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use crate::storage::MemoryStore;
    use assert_matches::assert_matches;

    fn controller() -> (SessionController<MemoryStore, ManualClock>, ManualClock) {
        let clock = ManualClock::default();
        let controller =
            SessionController::with_clock(HistoryStore::new(MemoryStore::new()), clock.clone());
        (controller, clock)
    }

    fn tick(controller: &mut SessionController<MemoryStore, ManualClock>, clock: &ManualClock) {
        clock.advance(TICK_INTERVAL);
        controller.poll();
    }

    #[test]
    fn test_new_controller_is_idle() {
        let (controller, _) = controller();
        assert_eq!(controller.status(), SessionStatus::Idle);
        assert!(controller.session().is_none());
        assert_eq!(controller.seconds_remaining(), None);
    }

    #[test]
    fn test_start_rejects_empty_reference() {
        let (mut controller, _) = controller();
        assert_matches!(controller.start("", 60), Err(Error::InvalidInput(_)));
        assert_eq!(controller.status(), SessionStatus::Idle);
    }

    #[test]
    fn test_start_rejects_zero_duration() {
        let (mut controller, _) = controller();
        assert_matches!(controller.start("abc", 0), Err(Error::InvalidInput(_)));
        assert_eq!(controller.status(), SessionStatus::Idle);
    }

    #[test]
    fn test_invalid_start_keeps_running_session() {
        let (mut controller, _) = controller();
        controller.start("abc", 30).unwrap();
        controller.submit_input("a");
        assert!(controller.start("", 30).is_err());
        assert!(controller.is_running());
        assert_eq!(controller.typed(), "a");
    }

    #[test]
    fn test_start_runs_with_zeroed_score() {
        let (mut controller, _) = controller();
        controller.start("hello", 15).unwrap();
        assert_eq!(controller.status(), SessionStatus::Running);
        assert_eq!(controller.score(), ScoreState::default());
        assert_eq!(controller.seconds_remaining(), Some(15));
        assert_eq!(controller.outcomes().len(), 5);
    }

    #[test]
    fn test_submit_input_ignored_when_idle() {
        let (mut controller, _) = controller();
        controller.submit_input("abc");
        assert_eq!(controller.score(), ScoreState::default());
        assert_eq!(controller.status(), SessionStatus::Idle);
    }

    #[test]
    fn test_submit_input_rescores_from_scratch() {
        let (mut controller, _) = controller();
        controller.start("cat dog", 60).unwrap();
        controller.submit_input("cap");
        assert_eq!(controller.score().error_count, 1);
        controller.submit_input("ca");
        assert_eq!(
            controller.score(),
            ScoreState {
                typed_count: 2,
                correct_count: 2,
                error_count: 0
            }
        );
    }

    #[test]
    fn test_ticks_count_down_and_expire() {
        let (mut controller, clock) = controller();
        let events = controller.subscribe();
        controller.start("some text", 3).unwrap();

        tick(&mut controller, &clock);
        assert_eq!(controller.seconds_remaining(), Some(2));
        tick(&mut controller, &clock);
        tick(&mut controller, &clock);

        assert_eq!(controller.status(), SessionStatus::Finished);
        let received: Vec<SessionEvent> = events.try_iter().collect();
        assert_eq!(received[0], SessionEvent::Started { duration_secs: 3 });
        assert_eq!(received[1], SessionEvent::Tick { seconds_remaining: 2 });
        assert_eq!(received[3], SessionEvent::Tick { seconds_remaining: 0 });
        assert_matches!(received[4], SessionEvent::Finished(_));
    }

    #[test]
    fn test_late_poll_fires_every_missed_tick() {
        let (mut controller, clock) = controller();
        controller.start("abc", 10).unwrap();
        clock.advance(Duration::from_millis(3500));
        controller.poll();
        assert_eq!(controller.seconds_remaining(), Some(7));
        assert_eq!(controller.samples().len(), 3);
    }

    #[test]
    fn test_expiry_with_nothing_typed() {
        let (mut controller, clock) = controller();
        controller.start("abc", 2).unwrap();
        tick(&mut controller, &clock);
        tick(&mut controller, &clock);

        let result = controller.last_result().unwrap();
        assert_eq!(result.wpm, 0);
        assert_eq!(result.cpm, 0);
        assert_eq!(result.accuracy, 100);
        assert_eq!(result.elapsed_secs, 2);
    }

    #[test]
    fn test_completion_finishes_early_with_actual_elapsed() {
        let (mut controller, clock) = controller();
        controller.start("hello world", 60).unwrap();
        clock.advance(Duration::from_secs(30));
        controller.submit_input("hello world");

        assert_eq!(controller.status(), SessionStatus::Finished);
        let result = controller.last_result().unwrap();
        assert_eq!(result.wpm, 4);
        assert_eq!(result.cpm, 22);
        assert_eq!(result.accuracy, 100);
        assert_eq!(result.elapsed_secs, 30);
        assert_eq!(result.total_chars_typed, 11);
        assert_eq!(result.correct_words, 2);
    }

    #[test]
    fn test_finish_is_idempotent() {
        let (mut controller, clock) = controller();
        controller.start("abc", 60).unwrap();
        clock.advance(Duration::from_secs(5));
        assert!(controller.finish().is_some());
        assert!(controller.finish().is_none());
        assert_eq!(controller.history().list().len(), 1);
    }

    #[test]
    fn test_finish_when_idle_is_noop() {
        let (mut controller, _) = controller();
        assert!(controller.finish().is_none());
        assert!(controller.history().list().is_empty());
    }

    #[test]
    fn test_no_ticks_after_finish() {
        let (mut controller, clock) = controller();
        controller.start("ab", 60).unwrap();
        controller.submit_input("ab");
        let remaining = controller.seconds_remaining();
        tick(&mut controller, &clock);
        assert_eq!(controller.seconds_remaining(), remaining);
    }

    #[test]
    fn test_reset_from_any_state() {
        let (mut controller, clock) = controller();
        let events = controller.subscribe();
        controller.start("abc", 10).unwrap();
        controller.submit_input("ab");
        controller.reset();

        assert_eq!(controller.status(), SessionStatus::Idle);
        assert!(controller.session().is_none());
        assert_eq!(controller.score(), ScoreState::default());

        // cancelled countdown stays cancelled
        tick(&mut controller, &clock);
        assert_eq!(controller.seconds_remaining(), None);
        assert_matches!(events.try_iter().last(), Some(SessionEvent::Reset));

        controller.reset();
        assert_eq!(controller.status(), SessionStatus::Idle);
    }

    #[test]
    fn test_start_while_running_resets_first() {
        let (mut controller, _) = controller();
        controller.start("first", 10).unwrap();
        controller.submit_input("fi");
        controller.start("second", 20).unwrap();

        assert_eq!(controller.reference(), Some("second"));
        assert_eq!(controller.score(), ScoreState::default());
        assert_eq!(controller.seconds_remaining(), Some(20));
        assert!(controller.history().list().is_empty());
    }

    #[test]
    fn test_restart_after_finish() {
        let (mut controller, _) = controller();
        controller.start("ab", 10).unwrap();
        controller.submit_input("ab");
        controller.start("cd", 10).unwrap();
        assert!(controller.is_running());
        assert!(controller.last_result().is_none());
    }

    #[test]
    fn test_suspend_freezes_countdown_and_elapsed() {
        let (mut controller, clock) = controller();
        controller.start("hello world", 60).unwrap();
        clock.advance(Duration::from_secs(10));
        controller.poll();
        assert_eq!(controller.seconds_remaining(), Some(50));

        controller.suspend();
        assert!(controller.is_suspended());
        clock.advance(Duration::from_secs(120));
        controller.poll();
        assert_eq!(controller.seconds_remaining(), Some(50));

        controller.resume();
        clock.advance(Duration::from_secs(20));
        controller.poll();
        assert_eq!(controller.seconds_remaining(), Some(30));

        controller.submit_input("hello world");
        let result = controller.last_result().unwrap();
        assert_eq!(result.elapsed_secs, 30);
        assert_eq!(result.wpm, 4);
    }

    #[test]
    fn test_suspend_outside_running_is_ignored() {
        let (mut controller, _) = controller();
        controller.suspend();
        assert!(!controller.is_suspended());
        controller.resume();
        assert_eq!(controller.status(), SessionStatus::Idle);
    }

    #[test]
    fn test_finish_while_suspended_excludes_pause() {
        let (mut controller, clock) = controller();
        controller.start("abcdefghij", 60).unwrap();
        controller.submit_input("abcde");
        clock.advance(Duration::from_secs(6));
        controller.suspend();
        clock.advance(Duration::from_secs(600));
        let result = controller.finish().unwrap();
        assert_eq!(result.elapsed_secs, 6);
        assert_eq!(result.cpm, 50);
    }

    #[test]
    fn test_clock_rolling_back_clamps_elapsed() {
        let (mut controller, clock) = controller();
        controller.start("abc", 60).unwrap();
        controller.submit_input("a");
        clock.rewind(Duration::from_secs(5));
        let result = controller.finish().unwrap();
        assert_eq!(result.elapsed_secs, 0);
        assert_eq!(result.wpm, 0);
        assert_eq!(result.accuracy, 100);
    }

    #[test]
    fn test_live_metrics() {
        let (mut controller, clock) = controller();
        controller.start("hello world", 60).unwrap();
        controller.submit_input("hello");
        clock.advance(Duration::from_secs(30));
        let m = controller.live_metrics();
        assert_eq!(m.cpm, 10);
        assert_eq!(m.wpm, 2);
        assert_eq!(m.accuracy, 100);
    }

    #[test]
    fn test_dropped_subscriber_is_pruned() {
        let (mut controller, _) = controller();
        drop(controller.subscribe());
        controller.start("abc", 5).unwrap();
        assert!(controller.subscribers.is_empty());
    }
}
