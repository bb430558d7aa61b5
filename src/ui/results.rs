use ratatui::{
    buffer::Buffer,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::Span,
    widgets::{Axis, Chart, Dataset, GraphType, Paragraph, Widget},
};
use typemaster::{
    analytics::{AdvancedStats, ErrorAnalysis},
    app::App,
    clock::Clock,
    storage::KvStore,
};

use super::{charting, HORIZONTAL_MARGIN, VERTICAL_MARGIN};

/// Describe a character for the error summary, making whitespace visible.
fn visible(c: char) -> String {
    match c {
        ' ' => "␣".to_string(),
        c => c.to_string(),
    }
}

pub fn render_results<S: KvStore, C: Clock>(app: &App<S, C>, area: Rect, buf: &mut Buffer) {
    let controller = &app.controller;
    let Some(result) = controller.last_result() else {
        return;
    };

    let bold_style = Style::default().add_modifier(Modifier::BOLD);
    let italic_style = Style::default().add_modifier(Modifier::ITALIC);
    let magenta_style = Style::default().fg(Color::Magenta);
    let detail_style = Style::default()
        .fg(Color::Cyan)
        .add_modifier(Modifier::ITALIC);

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .horizontal_margin(HORIZONTAL_MARGIN)
        .vertical_margin(VERTICAL_MARGIN)
        .constraints([
            Constraint::Min(1),    // chart
            Constraint::Length(1), // headline stats
            Constraint::Length(1), // word counts
            Constraint::Length(1), // advanced stats
            Constraint::Length(1), // error summary
            Constraint::Length(1), // padding
            Constraint::Length(1), // legend
        ])
        .split(area);

    let samples = controller.samples();
    let (overall_duration, highest_wpm) =
        charting::compute_chart_params(samples, result.elapsed_secs);
    let points: Vec<(f64, f64)> = samples.iter().map(|s| (*s).into()).collect();

    let datasets = vec![Dataset::default()
        .marker(ratatui::symbols::Marker::Braille)
        .style(magenta_style)
        .graph_type(GraphType::Line)
        .data(&points)];

    Chart::new(datasets)
        .x_axis(
            Axis::default()
                .title("seconds")
                .bounds([1.0, overall_duration])
                .labels(vec![
                    Span::styled("1", bold_style),
                    Span::styled(charting::format_label(overall_duration), bold_style),
                ]),
        )
        .y_axis(
            Axis::default()
                .title("wpm")
                .bounds([0.0, highest_wpm])
                .labels(vec![
                    Span::styled("0", bold_style),
                    Span::styled(charting::format_label(highest_wpm), bold_style),
                ]),
        )
        .render(chunks[0], buf);

    Paragraph::new(Span::styled(
        format!(
            "{} wpm   {} cpm   {}% acc   {}s",
            result.wpm, result.cpm, result.accuracy, result.elapsed_secs
        ),
        bold_style,
    ))
    .alignment(Alignment::Center)
    .render(chunks[1], buf);

    Paragraph::new(Span::styled(
        format!(
            "{} correct words   {} incorrect words   {} chars typed",
            result.correct_words, result.incorrect_words, result.total_chars_typed
        ),
        detail_style,
    ))
    .alignment(Alignment::Center)
    .render(chunks[2], buf);

    if let Some(stats) = AdvancedStats::from_samples(samples) {
        Paragraph::new(Span::styled(
            format!(
                "peak {} wpm   avg {} wpm   min {}% acc   {}% consistency   {:.2} sd",
                stats.max_wpm, stats.avg_wpm, stats.min_accuracy, stats.consistency, stats.std_dev
            ),
            detail_style,
        ))
        .alignment(Alignment::Center)
        .render(chunks[3], buf);
    }

    let analysis = ErrorAnalysis::analyze(
        controller.reference().unwrap_or_default(),
        controller.typed(),
    );
    let error_summary = if analysis.error_positions.is_empty() {
        "no errors".to_string()
    } else {
        let worst = analysis
            .common_errors
            .iter()
            .take(3)
            .map(|(expected, got, n)| format!("{}→{} ×{}", visible(*expected), visible(*got), n))
            .collect::<Vec<_>>()
            .join("  ");
        format!("{:.1}% errors   {}", analysis.error_rate, worst)
    };
    Paragraph::new(Span::styled(error_summary, detail_style))
        .alignment(Alignment::Center)
        .render(chunks[4], buf);

    Paragraph::new(Span::styled(
        "(enter) retry / (tab) history / (esc) back / (ctrl+c) quit",
        italic_style,
    ))
    .render(chunks[6], buf);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ui::tests::{render_to_string, test_app, type_keys};
    use std::time::Duration;
    use typemaster::{config::SessionDuration, runtime::AppEvent};

    #[test]
    fn results_show_final_metrics() {
        let (mut app, clock) = test_app("hello world");
        app.config.duration = SessionDuration::OneTwenty;
        app.start_session();
        clock.advance(Duration::from_secs(30));
        app.handle_event(AppEvent::Tick);
        type_keys(&mut app, "hello world");

        let rendered = render_to_string(&app);
        assert!(rendered.contains("4 wpm"));
        assert!(rendered.contains("22 cpm"));
        assert!(rendered.contains("100% acc"));
        assert!(rendered.contains("no errors"));
        assert!(rendered.contains("(enter) retry"));
    }

    #[test]
    fn results_summarize_errors() {
        let (mut app, clock) = test_app("aaaa");
        app.start_session();
        clock.advance(Duration::from_secs(2));
        app.handle_event(AppEvent::Tick);
        type_keys(&mut app, "abab");

        let rendered = render_to_string(&app);
        assert!(rendered.contains("50% acc"));
        assert!(rendered.contains("a→b ×2"));
    }

    #[test]
    fn visible_space() {
        assert_eq!(visible(' '), "␣");
        assert_eq!(visible('x'), "x");
    }
}
