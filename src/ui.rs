pub mod charting;
pub mod history;
pub mod results;

use ratatui::{
    buffer::Buffer,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Clear, Paragraph, Widget, Wrap},
    Frame,
};
use typemaster::{
    app::{App, Screen, QUIT_PROMPT},
    clock::Clock,
    passages::TextMode,
    scorer::Outcome,
    storage::KvStore,
};
use unicode_width::UnicodeWidthStr;

const HORIZONTAL_MARGIN: u16 = 5;
const VERTICAL_MARGIN: u16 = 2;

pub fn draw<S: KvStore, C: Clock>(app: &App<S, C>, f: &mut Frame) {
    f.render_widget(AppView(app), f.area());
}

/// Renders whichever screen the app is on.
pub struct AppView<'a, S: KvStore, C: Clock>(pub &'a App<S, C>);

impl<S: KvStore, C: Clock> Widget for AppView<'_, S, C> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let app = self.0;
        let screen = match app.screen {
            Screen::ConfirmQuit => app.quit_return(),
            screen => screen,
        };
        match screen {
            Screen::Setup => render_setup(app, area, buf),
            Screen::Typing | Screen::ConfirmQuit => render_typing(app, area, buf),
            Screen::Results => results::render_results(app, area, buf),
            Screen::History | Screen::ConfirmClear => history::render_history(app, area, buf),
        }
        if app.screen == Screen::ConfirmQuit {
            render_quit_prompt(area, buf);
        }
    }
}

/// Overlay the quit question on the bottom line.
fn render_quit_prompt(area: Rect, buf: &mut Buffer) {
    if area.height == 0 {
        return;
    }
    let line = Rect::new(area.x, area.bottom() - 1, area.width, 1);
    Clear.render(line, buf);
    Paragraph::new(Span::styled(QUIT_PROMPT, bold().fg(Color::Red)))
        .alignment(Alignment::Center)
        .render(line, buf);
}

fn bold() -> Style {
    Style::default().add_modifier(Modifier::BOLD)
}

fn dim_bold() -> Style {
    bold().add_modifier(Modifier::DIM)
}

fn italic() -> Style {
    Style::default().add_modifier(Modifier::ITALIC)
}

fn render_setup<S: KvStore, C: Clock>(app: &App<S, C>, area: Rect, buf: &mut Buffer) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .horizontal_margin(HORIZONTAL_MARGIN)
        .vertical_margin(VERTICAL_MARGIN)
        .constraints([
            Constraint::Length(2), // title
            Constraint::Min(4),    // settings
            Constraint::Length(1), // notice
            Constraint::Length(1), // legend
        ])
        .split(area);

    Paragraph::new(Span::styled(
        "typemaster",
        bold().fg(Color::Magenta),
    ))
    .alignment(Alignment::Center)
    .render(chunks[0], buf);

    let config = &app.config;
    let mut lines = vec![
        Line::from(vec![
            Span::styled("duration  ", dim_bold()),
            Span::styled(config.duration.to_string(), bold()),
        ]),
        Line::from(vec![
            Span::styled("text      ", dim_bold()),
            Span::styled(config.text_mode.to_string(), bold()),
        ]),
    ];

    if config.text_mode == TextMode::Custom || app.editing_custom_text {
        let text = config.custom_text.as_deref().unwrap_or_default();
        let mut custom = vec![
            Span::styled("custom    ", dim_bold()),
            Span::styled(text.to_string(), bold().fg(Color::Cyan)),
        ];
        if app.editing_custom_text {
            custom.push(Span::styled(
                "_",
                bold().add_modifier(Modifier::SLOW_BLINK),
            ));
        }
        lines.push(Line::from(custom));
    }

    Paragraph::new(lines)
        .wrap(Wrap { trim: false })
        .render(chunks[1], buf);

    if let Some(notice) = &app.notice {
        Paragraph::new(Span::styled(notice.as_str(), bold().fg(Color::Red)))
            .alignment(Alignment::Center)
            .render(chunks[2], buf);
    }

    let legend = if app.editing_custom_text {
        "(enter) done / (backspace) delete"
    } else {
        "(enter) start / (d)uration / (m)ode / (e)dit text / (h)istory / (esc)ape"
    };
    Paragraph::new(Span::styled(legend, italic())).render(chunks[3], buf);
}

fn render_typing<S: KvStore, C: Clock>(app: &App<S, C>, area: Rect, buf: &mut Buffer) {
    let controller = &app.controller;
    let reference = controller.reference().unwrap_or_default();

    let green_bold_style = bold().fg(Color::Green);
    let red_bold_style = bold().fg(Color::Red);
    let underlined_dim_bold_style = dim_bold().add_modifier(Modifier::UNDERLINED);

    let max_chars_per_line = area.width.saturating_sub(HORIZONTAL_MARGIN * 2).max(1);
    let prompt_occupied_lines = if reference.width() <= max_chars_per_line as usize {
        1
    } else {
        ((reference.width() as f64 / max_chars_per_line as f64).ceil() + 1.0) as u16
    };
    let padding = area.height.saturating_sub(prompt_occupied_lines + 4) / 2;

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .horizontal_margin(HORIZONTAL_MARGIN)
        .constraints([
            Constraint::Length(padding),
            Constraint::Length(2), // live stats
            Constraint::Length(prompt_occupied_lines),
            Constraint::Min(1),
            Constraint::Length(1), // legend
        ])
        .split(area);

    let cursor = controller.typed().chars().count();
    let spans = reference
        .chars()
        .zip(controller.outcomes())
        .enumerate()
        .map(|(idx, (expected, outcome))| match outcome {
            Outcome::Correct => Span::styled(expected.to_string(), green_bold_style),
            Outcome::Incorrect => Span::styled(
                match expected {
                    ' ' => "·".to_owned(),
                    c => c.to_string(),
                },
                red_bold_style,
            ),
            Outcome::Untyped if idx == cursor => {
                Span::styled(expected.to_string(), underlined_dim_bold_style)
            }
            Outcome::Untyped => Span::styled(expected.to_string(), dim_bold()),
        })
        .collect::<Vec<Span>>();

    Paragraph::new(Line::from(spans))
        .alignment(if prompt_occupied_lines == 1 {
            // short prompts read better centered
            Alignment::Center
        } else {
            Alignment::Left
        })
        .wrap(Wrap { trim: true })
        .render(chunks[2], buf);

    let metrics = controller.live_metrics();
    let mut stats = format!(
        "{}s   {} wpm   {} cpm   {}% acc",
        controller.seconds_remaining().unwrap_or_default(),
        metrics.wpm,
        metrics.cpm,
        metrics.accuracy
    );
    if controller.is_suspended() {
        stats.push_str("   PAUSED");
    }
    Paragraph::new(Span::styled(stats, dim_bold()))
        .alignment(Alignment::Center)
        .render(chunks[1], buf);

    Paragraph::new(Span::styled("(esc) reset / (ctrl+c) quit", italic()))
        .render(chunks[4], buf);
}
