use crate::clock::{Clock, SystemClock};
use crate::config::Config;
use crate::history::SessionResult;
use crate::passages::{select_text, PassageSet, TextMode};
use crate::runtime::AppEvent;
use crate::session::{SessionController, SessionEvent};
use crate::storage::KvStore;
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use std::sync::mpsc::Receiver;
use tracing::{info, warn};

pub const EMPTY_TEXT_NOTICE: &str = "Please enter some text or select random text mode.";

pub const QUIT_PROMPT: &str =
    "You have an active typing test. Are you sure you want to leave? (y/n)";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Screen {
    Setup,
    Typing,
    Results,
    History,
    ConfirmClear,
    /// Asked before quitting in the middle of a session.
    ConfirmQuit,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Continue,
    Quit,
}

/// Presentation state around the session controller: which screen is up,
/// the input buffer, and the user's settings.
pub struct App<S: KvStore, C: Clock = SystemClock> {
    pub controller: SessionController<S, C>,
    pub config: Config,
    pub passages: PassageSet,
    pub screen: Screen,
    pub input: String,
    pub notice: Option<String>,
    pub editing_custom_text: bool,
    pub history_scroll: usize,
    history_log: Vec<SessionResult>,
    history_return: Screen,
    quit_return: Screen,
    session_events: Receiver<SessionEvent>,
}

impl<S: KvStore, C: Clock> App<S, C> {
    pub fn new(mut controller: SessionController<S, C>, config: Config) -> Self {
        let session_events = controller.subscribe();
        Self {
            controller,
            config,
            passages: PassageSet::english(),
            screen: Screen::Setup,
            input: String::new(),
            notice: None,
            editing_custom_text: false,
            history_scroll: 0,
            history_log: Vec::new(),
            history_return: Screen::Setup,
            quit_return: Screen::Setup,
            session_events,
        }
    }

    /// Handle one runtime event, then fire any countdown ticks that came due.
    pub fn handle_event(&mut self, event: AppEvent) -> Action {
        let action = match event {
            AppEvent::Key(key) => self.handle_key(key),
            AppEvent::Focus(false) => {
                self.controller.suspend();
                Action::Continue
            }
            // the quit prompt keeps the countdown held
            AppEvent::Focus(true) if self.screen == Screen::ConfirmQuit => Action::Continue,
            AppEvent::Focus(true) => {
                self.controller.resume();
                Action::Continue
            }
            AppEvent::Resize | AppEvent::Tick => Action::Continue,
        };
        self.controller.poll();
        self.drain_session_events();
        action
    }

    fn drain_session_events(&mut self) {
        while let Ok(event) = self.session_events.try_recv() {
            if let SessionEvent::Finished(result) = event {
                info!("showing results: {} wpm", result.wpm);
                match self.screen {
                    Screen::Typing => self.screen = Screen::Results,
                    Screen::ConfirmQuit if self.quit_return == Screen::Typing => {
                        self.quit_return = Screen::Results
                    }
                    _ => {}
                }
            }
        }
    }

    pub fn handle_key(&mut self, key: KeyEvent) -> Action {
        if key.modifiers.contains(KeyModifiers::CONTROL) {
            match key.code {
                KeyCode::Char('c') if self.screen == Screen::ConfirmQuit => return Action::Quit,
                KeyCode::Char('c') => return self.request_quit(),
                KeyCode::Char('r') => {
                    self.reset();
                    return Action::Continue;
                }
                _ => {}
            }
        }

        match self.screen {
            Screen::Setup => self.on_setup_key(key),
            Screen::Typing => self.on_typing_key(key),
            Screen::Results => self.on_results_key(key),
            Screen::History => self.on_history_key(key),
            Screen::ConfirmClear => self.on_confirm_clear_key(key),
            Screen::ConfirmQuit => self.on_confirm_quit_key(key),
        }
    }

    fn on_setup_key(&mut self, key: KeyEvent) -> Action {
        if self.editing_custom_text {
            let text = self.config.custom_text.get_or_insert_with(String::new);
            match key.code {
                KeyCode::Enter | KeyCode::Esc => self.editing_custom_text = false,
                KeyCode::Backspace => {
                    text.pop();
                }
                KeyCode::Char(c) => text.push(c),
                _ => {}
            }
            return Action::Continue;
        }

        match key.code {
            KeyCode::Enter => self.start_session(),
            KeyCode::Char('d') => self.config.duration = self.config.duration.next(),
            KeyCode::Char('m') => self.config.text_mode = self.config.text_mode.toggle(),
            KeyCode::Char('e') => {
                self.config.text_mode = TextMode::Custom;
                self.editing_custom_text = true;
            }
            KeyCode::Char('h') => self.open_history(),
            KeyCode::Esc | KeyCode::Char('q') => return self.request_quit(),
            _ => {}
        }
        Action::Continue
    }

    fn on_typing_key(&mut self, key: KeyEvent) -> Action {
        match key.code {
            KeyCode::Esc => self.reset(),
            KeyCode::Backspace => {
                if self.input.pop().is_some() {
                    self.controller.submit_input(&self.input);
                }
            }
            // shortcuts like ctrl+w are not text
            KeyCode::Char(_)
                if key
                    .modifiers
                    .intersects(KeyModifiers::CONTROL | KeyModifiers::ALT) => {}
            KeyCode::Char(c) => {
                self.input.push(c);
                self.controller.submit_input(&self.input);
            }
            _ => {}
        }
        Action::Continue
    }

    /// Letters are ignored here: the countdown can end mid-word and the
    /// next keystrokes still belong to the typist.
    fn on_results_key(&mut self, key: KeyEvent) -> Action {
        match key.code {
            KeyCode::Enter => self.start_session(),
            KeyCode::Tab => self.open_history(),
            KeyCode::Esc => self.reset(),
            _ => {}
        }
        Action::Continue
    }

    fn on_history_key(&mut self, key: KeyEvent) -> Action {
        match key.code {
            KeyCode::Up => self.history_scroll = self.history_scroll.saturating_sub(1),
            KeyCode::Down => {
                self.history_scroll =
                    (self.history_scroll + 1).min(self.history_log.len().saturating_sub(1))
            }
            KeyCode::Home => self.history_scroll = 0,
            KeyCode::Char('c') => self.screen = Screen::ConfirmClear,
            KeyCode::Esc | KeyCode::Char('b') | KeyCode::Char('h') => {
                self.screen = self.history_return
            }
            KeyCode::Char('q') => return Action::Quit,
            _ => {}
        }
        Action::Continue
    }

    fn on_confirm_clear_key(&mut self, key: KeyEvent) -> Action {
        if let KeyCode::Char('y') | KeyCode::Char('Y') = key.code {
            if self.controller.history_mut().clear() {
                info!("history cleared");
            }
            self.history_log = self.controller.history().list();
            self.history_scroll = 0;
        }
        self.screen = Screen::History;
        Action::Continue
    }

    fn on_confirm_quit_key(&mut self, key: KeyEvent) -> Action {
        if let KeyCode::Char('y') | KeyCode::Char('Y') = key.code {
            return Action::Quit;
        }
        self.screen = self.quit_return;
        self.controller.resume();
        Action::Continue
    }

    /// Quit, unless a session is running; then ask first and hold the
    /// countdown while the prompt is up.
    fn request_quit(&mut self) -> Action {
        if !self.controller.is_running() {
            return Action::Quit;
        }
        self.quit_return = self.screen;
        self.controller.suspend();
        self.screen = Screen::ConfirmQuit;
        Action::Continue
    }

    fn open_history(&mut self) {
        self.history_return = self.screen;
        self.history_log = self.controller.history().list();
        self.history_scroll = 0;
        self.screen = Screen::History;
    }

    /// History as of the last time the history screen was opened or cleared.
    pub fn history_log(&self) -> &[SessionResult] {
        &self.history_log
    }

    /// Screen to go back to when the quit prompt is dismissed.
    pub fn quit_return(&self) -> Screen {
        self.quit_return
    }

    /// Start a session with a text chosen from the current settings.
    pub fn start_session(&mut self) {
        let text = select_text(
            &self.passages,
            self.config.text_mode,
            self.config.custom_text.as_deref(),
            false,
        );
        match self.controller.start(&text, self.config.duration.secs()) {
            Ok(()) => {
                self.input.clear();
                self.notice = None;
                self.screen = Screen::Typing;
            }
            Err(e) => {
                warn!("could not start session: {}", e);
                self.notice = Some(EMPTY_TEXT_NOTICE.to_string());
                self.screen = Screen::Setup;
            }
        }
    }

    pub fn reset(&mut self) {
        self.controller.reset();
        self.input.clear();
        self.screen = Screen::Setup;
    }
}
