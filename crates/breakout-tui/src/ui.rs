use crate::app::{App, Focus, FormField};
use breakout_application::reporting::summary_metrics;
use breakout_infrastructure::reporting::{breakout_headers, format_breakout_row};
use ratatui::layout::{Alignment, Constraint, Direction, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Cell, Paragraph, Row, Table, Wrap};
use ratatui::Frame;

pub fn draw(frame: &mut Frame, app: &mut App) {
    let size = frame.area();
    let outer = Layout::default()
        .direction(Direction::Vertical)
        .constraints(
            [
                Constraint::Length(1),
                Constraint::Min(10),
                Constraint::Length(8),
            ]
            .as_ref(),
        )
        .split(size);

    let body = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Length(42), Constraint::Min(20)].as_ref())
        .split(outer[1]);

    draw_title(frame, outer[0], app);
    draw_form(frame, body[0], app);
    draw_results(frame, body[1], app);
    draw_logs(frame, outer[2], app);
}

fn draw_title(frame: &mut Frame, area: Rect, app: &App) {
    let version = env!("CARGO_PKG_VERSION");
    let mut spans = vec![Span::styled(
        format!("Volume Breakout Analyzer v{version}"),
        Style::default().add_modifier(Modifier::BOLD),
    )];
    if app.running {
        let elapsed = app
            .started_at
            .map(|at| at.elapsed().as_secs())
            .unwrap_or(0);
        spans.push(Span::styled(
            format!("  {} analyzing ({elapsed}s)", app.spinner_char()),
            Style::default().fg(Color::Yellow),
        ));
    }
    frame.render_widget(
        Paragraph::new(Line::from(spans)).alignment(Alignment::Center),
        area,
    );
}

fn draw_form(frame: &mut Frame, area: Rect, app: &App) {
    let focused = app.focus == Focus::Form;
    let mut lines = Vec::new();
    for field in FormField::ALL {
        let selected = focused && app.form.selected == field;
        let marker = if selected { "> " } else { "  " };
        let label_style = if selected {
            Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD)
        } else {
            Style::default()
        };
        lines.push(Line::from(Span::styled(
            format!("{marker}{}", field.label()),
            label_style,
        )));

        let input = app.form.input(field);
        let value = if selected {
            let split = input
                .value
                .char_indices()
                .nth(input.cursor)
                .map(|(idx, _)| idx)
                .unwrap_or(input.value.len());
            format!("    {}|{}", &input.value[..split], &input.value[split..])
        } else {
            format!("    {}", input.value)
        };
        lines.push(Line::from(value));
    }

    lines.push(Line::from(""));
    lines.push(Line::from("Enter/F5 analyze  Ctrl-E export"));
    lines.push(Line::from("Tab results  Esc quit"));

    if let Some(err) = &app.last_error {
        lines.push(Line::from(""));
        lines.push(Line::from(Span::styled(
            format!("error: {err}"),
            Style::default().fg(Color::Red),
        )));
    }
    if let Some(info) = &app.info_message {
        lines.push(Line::from(""));
        lines.push(Line::from(Span::styled(
            info.clone(),
            Style::default().fg(Color::Green),
        )));
    }

    frame.render_widget(
        Paragraph::new(lines)
            .block(panel("Parameters", focused))
            .wrap(Wrap { trim: false }),
        area,
    );
}

fn draw_results(frame: &mut Frame, area: Rect, app: &App) {
    let focused = app.focus == Focus::Results;
    let Some(analysis) = app.analysis.as_ref() else {
        frame.render_widget(
            Paragraph::new("Run an analysis to see breakout sessions.")
                .block(panel("Results", focused)),
            area,
        );
        return;
    };

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(8), Constraint::Min(3)].as_ref())
        .split(area);

    let mut summary_lines = vec![Line::from(format!(
        "{}  {}..{}  sessions={} flagged={}",
        analysis.symbol,
        analysis.range.start,
        analysis.range.end,
        analysis.sessions(),
        analysis.flagged_sessions()
    ))];
    match analysis.summary.as_ref() {
        Some(summary) => {
            for (label, value) in summary_metrics(summary, analysis.params.holding_period) {
                summary_lines.push(Line::from(format!("{label:<22}{value}")));
            }
        }
        None => summary_lines.push(Line::from(analysis.no_breakouts_message())),
    }
    frame.render_widget(
        Paragraph::new(summary_lines).block(panel("Summary", focused)),
        chunks[0],
    );

    let headers = breakout_headers(&analysis.params);
    let header = Row::new(headers.iter().map(|h| Cell::from(h.clone())))
        .style(Style::default().add_modifier(Modifier::BOLD));
    let visible = chunks[1].height.saturating_sub(3) as usize;
    let rows: Vec<Row> = analysis
        .events
        .iter()
        .enumerate()
        .skip(app.results_scroll)
        .take(visible.max(1))
        .map(|(idx, event)| {
            let style = if focused && idx == app.results_scroll {
                Style::default().fg(Color::Yellow)
            } else if event.holding_return_pct >= 0.0 {
                Style::default().fg(Color::Green)
            } else {
                Style::default().fg(Color::Red)
            };
            Row::new(format_breakout_row(event).map(Cell::from)).style(style)
        })
        .collect();
    let widths = [
        Constraint::Length(10),
        Constraint::Length(12),
        Constraint::Length(14),
        Constraint::Length(16),
        Constraint::Length(14),
        Constraint::Length(12),
        Constraint::Length(11),
        Constraint::Length(13),
    ];
    let title = format!(
        "Breakouts ({}/{})",
        (app.results_scroll + 1).min(analysis.events.len()),
        analysis.events.len()
    );
    frame.render_widget(
        Table::new(rows, widths)
            .header(header)
            .column_spacing(1)
            .block(panel(&title, focused)),
        chunks[1],
    );
}

fn draw_logs(frame: &mut Frame, area: Rect, app: &App) {
    let max_lines = area.height.saturating_sub(2) as usize;
    let visible = app.logs.lock().window(max_lines, app.log_scroll);
    let text: Vec<Line> = visible.into_iter().map(Line::from).collect();
    frame.render_widget(
        Paragraph::new(text)
            .block(Block::default().title("Logs").borders(Borders::ALL))
            .wrap(Wrap { trim: false }),
        area,
    );
}

fn panel(title: &str, focused: bool) -> Block<'static> {
    let style = if focused {
        Style::default().fg(Color::Cyan)
    } else {
        Style::default()
    };
    Block::default()
        .title(title.to_string())
        .borders(Borders::ALL)
        .border_style(style)
}
