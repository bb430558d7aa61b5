mod ui;

use clap::{error::ErrorKind, CommandFactory, Parser};
use crossterm::{
    event::{DisableFocusChange, EnableFocusChange},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
    tty::IsTty,
};
use ratatui::{
    backend::{Backend, CrosstermBackend},
    Terminal,
};
use std::{
    error::Error,
    fs::OpenOptions,
    io::{self, stdin},
    path::PathBuf,
    sync::Mutex,
    time::Duration,
};
use tracing::warn;
use typemaster::{
    app::{Action, App},
    app_dirs::AppDirs,
    config::{ConfigStore, FileConfigStore, SessionDuration},
    history::HistoryStore,
    passages::TextMode,
    runtime::{CrosstermEventSource, FixedTicker, Runner},
    session::SessionController,
    storage::{KvStore, MemoryStore, SqliteStore},
};

const TICK_RATE_MS: u64 = 100;

/// typing speed practice with live wpm, accuracy and session history
#[derive(Parser, Debug, Clone)]
#[clap(
    version,
    about,
    long_about = "A typing speed practice TUI: type a passage against the clock, watch WPM, CPM and accuracy live, and review your last 50 sessions."
)]
pub struct Cli {
    /// session length in seconds
    #[clap(short = 'd', long, value_enum)]
    duration: Option<SessionDuration>,

    /// custom text to type instead of a random sample passage
    #[clap(short = 'p', long)]
    prompt: Option<String>,

    /// print past sessions and exit
    #[clap(long)]
    history: bool,

    /// write past sessions to a CSV file and exit
    #[clap(long, value_name = "PATH")]
    export_history: Option<PathBuf>,
}

fn main() -> Result<(), Box<dyn Error>> {
    let cli = Cli::parse();
    init_logging();

    let history = HistoryStore::new(open_store());

    if let Some(path) = &cli.export_history {
        let rows = history.export_csv(path)?;
        println!("exported {} sessions to {}", rows, path.display());
        return Ok(());
    }

    if cli.history {
        print_history(&history);
        return Ok(());
    }

    if !stdin().is_tty() {
        let mut cmd = Cli::command();
        cmd.error(ErrorKind::Io, "stdin must be a tty").exit();
    }

    let config_store = FileConfigStore::new();
    let mut config = config_store.load();
    // one-off overrides are not written back
    let persist_config = cli.duration.is_none() && cli.prompt.is_none();
    if let Some(duration) = cli.duration {
        config.duration = duration;
    }
    if let Some(prompt) = &cli.prompt {
        config.text_mode = TextMode::Custom;
        config.custom_text = Some(prompt.clone());
    }

    enable_raw_mode()?;

    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableFocusChange)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let mut app = App::new(SessionController::new(history), config);
    if cli.prompt.is_some() {
        app.start_session();
    }
    let outcome = start_tui(&mut terminal, &mut app);

    disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        DisableFocusChange,
        LeaveAlternateScreen
    )?;
    terminal.show_cursor()?;

    if persist_config {
        if let Err(e) = config_store.save(&app.config) {
            warn!("could not save config to {:?}: {}", config_store.path(), e);
        }
    }

    outcome
}

fn start_tui<B: Backend, S: KvStore>(
    terminal: &mut Terminal<B>,
    app: &mut App<S>,
) -> Result<(), Box<dyn Error>> {
    let runner = Runner::new(
        CrosstermEventSource::new(),
        FixedTicker::new(Duration::from_millis(TICK_RATE_MS)),
    );

    loop {
        terminal.draw(|f| ui::draw(app, f))?;

        if app.handle_event(runner.step()) == Action::Quit {
            break;
        }
    }

    Ok(())
}

/// Log to a file under the state directory; the terminal belongs to the TUI.
fn init_logging() {
    let Some(path) = AppDirs::log_path() else {
        return;
    };
    if let Some(parent) = path.parent() {
        if std::fs::create_dir_all(parent).is_err() {
            return;
        }
    }
    let Ok(file) = OpenOptions::new().create(true).append(true).open(&path) else {
        return;
    };

    tracing_subscriber::fmt()
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .with_max_level(tracing::Level::INFO)
        .init();
}

fn open_store() -> Box<dyn KvStore> {
    match SqliteStore::open_default() {
        Ok(store) => Box::new(store),
        Err(e) => {
            warn!("history database unavailable, keeping history in memory: {}", e);
            Box::new(MemoryStore::new())
        }
    }
}

fn print_history<S: KvStore>(history: &HistoryStore<S>) {
    let log = history.list();
    if log.is_empty() {
        println!("{}", ui::history::EMPTY_HISTORY);
        return;
    }
    for result in &log {
        println!("{}", ui::history::summary_line(result));
    }
}
