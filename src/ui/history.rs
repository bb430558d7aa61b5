use chrono::Local;
use ratatui::{
    buffer::Buffer,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::Span,
    widgets::{Block, Borders, Cell, Paragraph, Row, Table, Widget},
};
use time_humanize::{Accuracy, HumanTime, Tense};
use typemaster::{
    app::{App, Screen},
    clock::Clock,
    history::SessionResult,
    storage::KvStore,
};

use super::{HORIZONTAL_MARGIN, VERTICAL_MARGIN};

pub const EMPTY_HISTORY: &str =
    "No practice history yet. Complete a test to see your results here!";

/// How long ago a session finished, e.g. "5 minutes ago".
pub fn format_age(result: &SessionResult) -> String {
    let age = (Local::now() - result.timestamp)
        .to_std()
        .unwrap_or_default();
    HumanTime::from(age).to_text_en(Accuracy::Rough, Tense::Past)
}

/// One-line plain-text summary, used by `--history`.
pub fn summary_line(result: &SessionResult) -> String {
    format!(
        "{}  WPM: {:>3}  CPM: {:>4}  Accuracy: {:>3}%  Time: {}s",
        result.timestamp.format("%Y-%m-%d %H:%M"),
        result.wpm,
        result.cpm,
        result.accuracy,
        result.elapsed_secs
    )
}

fn accuracy_color(accuracy: u32) -> Color {
    match accuracy {
        95..=u32::MAX => Color::Green,
        85..=94 => Color::Yellow,
        _ => Color::Red,
    }
}

fn present_row(result: &SessionResult) -> Row<'static> {
    Row::new(vec![
        Cell::from(result.timestamp.format("%Y-%m-%d %H:%M").to_string()),
        Cell::from(format_age(result)),
        Cell::from(result.wpm.to_string()),
        Cell::from(result.cpm.to_string()),
        Cell::from(format!("{}%", result.accuracy))
            .style(Style::default().fg(accuracy_color(result.accuracy))),
        Cell::from(format!("{}s", result.elapsed_secs)),
    ])
}

pub fn render_history<S: KvStore, C: Clock>(app: &App<S, C>, area: Rect, buf: &mut Buffer) {
    let log = app.history_log();

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .horizontal_margin(HORIZONTAL_MARGIN)
        .vertical_margin(VERTICAL_MARGIN)
        .constraints([
            Constraint::Min(3),    // table
            Constraint::Length(1), // confirmation
            Constraint::Length(1), // legend
        ])
        .split(area);

    let block = Block::default()
        .borders(Borders::ALL)
        .title(format!("History ({} sessions)", log.len()));

    if log.is_empty() {
        Paragraph::new(Span::styled(
            EMPTY_HISTORY,
            Style::default().add_modifier(Modifier::ITALIC),
        ))
        .alignment(Alignment::Center)
        .block(block)
        .render(chunks[0], buf);
    } else {
        // rows that fit inside the borders and header
        let visible_rows = chunks[0].height.saturating_sub(3).max(1) as usize;
        let max_scroll = log.len().saturating_sub(visible_rows);
        let scroll = app.history_scroll.min(max_scroll);

        let header = Row::new(vec!["Date", "When", "WPM", "CPM", "Accuracy", "Time"]).style(
            Style::default()
                .fg(Color::Cyan)
                .add_modifier(Modifier::BOLD),
        );
        let rows: Vec<Row> = log
            .iter()
            .skip(scroll)
            .take(visible_rows)
            .map(present_row)
            .collect();

        Table::new(
            rows,
            [
                Constraint::Length(17),
                Constraint::Length(16),
                Constraint::Length(6),
                Constraint::Length(6),
                Constraint::Length(9),
                Constraint::Length(6),
            ],
        )
        .header(header)
        .block(block)
        .render(chunks[0], buf);
    }

    if app.screen == Screen::ConfirmClear {
        Paragraph::new(Span::styled(
            "Are you sure you want to clear all practice history? (y/n)",
            Style::default().fg(Color::Red).add_modifier(Modifier::BOLD),
        ))
        .alignment(Alignment::Center)
        .render(chunks[1], buf);
    }

    Paragraph::new(Span::styled(
        "(↑/↓) scroll / (c)lear / (esc) back / (q)uit",
        Style::default().add_modifier(Modifier::ITALIC),
    ))
    .render(chunks[2], buf);
}
