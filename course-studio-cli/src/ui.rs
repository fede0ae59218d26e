use crate::format::{format_response, FormattedLine};
use crate::rich_text::TextStyle;
use crate::state::{ChatEntry, Field, ScrollLimits, ViewState};
use course_studio_shared::Operation;
use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph, Wrap},
    Frame,
};
use std::path::Path;

fn style_for(style: TextStyle) -> Style {
    match style {
        TextStyle::Plain => Style::default(),
        TextStyle::Label => Style::default().add_modifier(Modifier::BOLD),
        TextStyle::Heading => Style::default()
            .fg(Color::Cyan)
            .add_modifier(Modifier::BOLD | Modifier::UNDERLINED),
        TextStyle::Strong => Style::default().add_modifier(Modifier::BOLD),
        TextStyle::Emphasis => Style::default().add_modifier(Modifier::ITALIC),
        TextStyle::Code => Style::default().fg(Color::Yellow),
        TextStyle::Muted => Style::default().fg(Color::DarkGray),
    }
}

fn to_line(line: FormattedLine) -> Line<'static> {
    let mut spans = Vec::with_capacity(line.spans.len() + 1);
    if line.indent > 0 {
        spans.push(Span::raw(" ".repeat(line.indent as usize)));
    }
    spans.extend(
        line.spans
            .into_iter()
            .map(|span| Span::styled(span.text, style_for(span.style))),
    );
    Line::from(spans)
}

fn to_offset(rows: usize) -> u16 {
    u16::try_from(rows).unwrap_or(u16::MAX)
}

/// Draws one frame and returns how far each scrollable panel could move.
pub fn draw(f: &mut Frame, state: &ViewState, history_log: Option<&Path>) -> ScrollLimits {
    let sidebar_width = if state.sidebar_open() {
        Constraint::Percentage(40)
    } else {
        Constraint::Length(16)
    };
    let columns = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([sidebar_width, Constraint::Min(20)])
        .split(f.area());

    let history = render_sidebar(f, state, columns[0]);
    let response = render_main(f, state, history_log, columns[1]);
    ScrollLimits { response, history }
}

fn render_main(f: &mut Frame, state: &ViewState, history_log: Option<&Path>, area: Rect) -> usize {
    let fields = Field::visible_for(state.operation());

    let mut constraints = vec![Constraint::Length(1), Constraint::Length(3)];
    constraints.extend(fields.iter().map(|_| Constraint::Length(3)));
    constraints.push(Constraint::Min(3));
    constraints.push(Constraint::Length(1));

    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints(constraints)
        .split(area);

    let title = Paragraph::new(Line::from(Span::styled(
        "Course Content Generator",
        Style::default().add_modifier(Modifier::BOLD),
    )))
    .centered();
    f.render_widget(title, rows[0]);

    render_operation(f, state.operation(), rows[1]);

    for (idx, field) in fields.iter().enumerate() {
        render_field(f, state, *field, rows[2 + idx]);
    }

    render_help(f, state, history_log, rows[3 + fields.len()]);
    render_response(f, state, rows[2 + fields.len()])
}

fn render_operation(f: &mut Frame, operation: Operation, area: Rect) {
    let position = Operation::ALL
        .iter()
        .position(|op| *op == operation)
        .map_or(0, |idx| idx + 1);
    let line = Line::from(vec![
        Span::styled("◀ ", Style::default().fg(Color::DarkGray)),
        Span::styled(
            operation.label(),
            Style::default().fg(Color::Green).add_modifier(Modifier::BOLD),
        ),
        Span::styled(" ▶", Style::default().fg(Color::DarkGray)),
        Span::styled(
            format!("  {}/{}", position, Operation::ALL.len()),
            Style::default().fg(Color::DarkGray),
        ),
    ]);
    let selector = Paragraph::new(line).block(
        Block::default()
            .borders(Borders::ALL)
            .title("Operation (Ctrl-N / Ctrl-P)"),
    );
    f.render_widget(selector, area);
}

fn render_field(f: &mut Frame, state: &ViewState, field: Field, area: Rect) {
    let focused = state.focused() == field;
    let text = state.field(field);
    let border = if focused {
        Style::default().fg(Color::Cyan)
    } else {
        Style::default().fg(Color::White)
    };

    let widget = Paragraph::new(text).block(
        Block::default()
            .borders(Borders::ALL)
            .title(field.title(state.operation()))
            .border_style(border),
    );
    f.render_widget(widget, area);

    if focused && area.width > 2 {
        let cursor_x = area.x + 1 + text.chars().count() as u16;
        f.set_cursor_position((cursor_x.min(area.x + area.width - 2), area.y + 1));
    }
}

fn render_response(f: &mut Frame, state: &ViewState, area: Rect) -> usize {
    let lines: Vec<Line> = if state.is_loading() {
        vec![Line::from(Span::styled(
            "Generating ●●●",
            Style::default().fg(Color::Yellow),
        ))]
    } else if let Some((operation, response)) = state.active_response() {
        format_response(operation, response)
            .into_iter()
            .map(to_line)
            .collect()
    } else {
        vec![Line::from(Span::styled(
            "Nothing submitted yet. Fill in the form and press Enter.",
            Style::default().fg(Color::DarkGray),
        ))]
    };

    let block = Block::default().borders(Borders::ALL).title("Response");
    let inner = block.inner(area);
    let body = Paragraph::new(lines).wrap(Wrap { trim: false });
    let max_scroll = body
        .line_count(inner.width)
        .saturating_sub(inner.height as usize);
    let scroll = state.scroll().min(max_scroll);
    f.render_widget(body.block(block).scroll((to_offset(scroll), 0)), area);
    max_scroll
}

fn render_help(f: &mut Frame, state: &ViewState, history_log: Option<&Path>, area: Rect) {
    let mut text = String::from(
        "Enter submit · Tab field · Esc clear · Ctrl-B history · ↑↓ scroll · Shift-↑↓ history scroll · Ctrl-Q quit",
    );
    if state.pending_count() > 1 {
        text.push_str(&format!(" · {} requests in flight", state.pending_count()));
    }
    if let Some(path) = history_log {
        text.push_str(&format!(" · log: {}", path.display()));
    }
    let help = Paragraph::new(Span::styled(text, Style::default().fg(Color::DarkGray)));
    f.render_widget(help, area);
}

fn entry_lines(entry: &ChatEntry) -> Vec<Line<'static>> {
    let label = Style::default().add_modifier(Modifier::BOLD);
    let value = Style::default().fg(Color::Gray);

    let mut lines = vec![
        Line::from(Span::styled("Option:", label)),
        Line::from(Span::styled(entry.operation.label(), value)),
        Line::from(Span::styled("User:", label)),
        Line::from(Span::styled(entry.user_input.clone(), value)),
    ];
    if let Some(doubt) = &entry.doubt {
        lines.push(Line::from(Span::styled("User's Doubt:", label)));
        lines.push(Line::from(Span::styled(doubt.clone(), value)));
    }
    if let Some(answers) = &entry.user_answer {
        lines.push(Line::from(Span::styled("User's Answers:", label)));
        lines.push(Line::from(Span::styled(answers.clone(), value)));
    }
    lines.push(Line::from(Span::styled("Response:", label)));
    lines.extend(
        format_response(entry.operation, entry.response.view())
            .into_iter()
            .map(to_line),
    );
    lines.push(Line::from(Span::styled(
        "────────",
        Style::default().fg(Color::DarkGray),
    )));
    lines
}

fn render_sidebar(f: &mut Frame, state: &ViewState, area: Rect) -> usize {
    let history = state.history();

    if !state.sidebar_open() {
        let collapsed = Paragraph::new(vec![
            Line::from(format!("{} entries", history.len())),
            Line::from(Span::styled("Ctrl-B open", Style::default().fg(Color::DarkGray))),
        ])
        .block(Block::default().borders(Borders::ALL).title("History"));
        f.render_widget(collapsed, area);
        return 0;
    }

    let lines: Vec<Line> = history.iter().flat_map(entry_lines).collect();
    let block = Block::default()
        .borders(Borders::ALL)
        .title("Chat History (Ctrl-B close)");
    let inner = block.inner(area);
    let body = Paragraph::new(lines).wrap(Wrap { trim: false });

    // Offsets count wrapped rows up from the bottom so the newest entry stays in view
    let max_scroll = body
        .line_count(inner.width)
        .saturating_sub(inner.height as usize);
    let top = max_scroll - state.history_scroll().min(max_scroll);
    f.render_widget(body.block(block).scroll((to_offset(top), 0)), area);
    max_scroll
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::response::{GenericResponse, ResponsePayload};
    use crate::state::{Action, FieldEdit};
    use ratatui::{backend::TestBackend, Terminal};

    /// Draws a 100x30 frame and returns the text in columns `0..width`.
    fn render(state: &ViewState, width: u16) -> (String, ScrollLimits) {
        let backend = TestBackend::new(100, 30);
        let mut terminal = Terminal::new(backend).unwrap();
        let mut limits = ScrollLimits::default();
        terminal
            .draw(|f| limits = draw(f, state, None))
            .unwrap();
        let buffer = terminal.backend().buffer().clone();
        let mut out = String::new();
        for y in 0..buffer.area.height {
            for x in 0..width.min(buffer.area.width) {
                out.push_str(buffer[(x, y)].symbol());
            }
            out.push('\n');
        }
        (out, limits)
    }

    fn screen(state: &ViewState) -> String {
        render(state, 100).0
    }

    fn complete_summary(state: &mut ViewState, text: String) {
        let crate::state::Effect::Dispatch(submission) = state.apply(Action::SubmitStart) else {
            panic!("submit did not dispatch");
        };
        state.apply(Action::SubmitSuccess {
            seq: submission.seq,
            payload: ResponsePayload::Generic(GenericResponse::Text(text)),
        });
    }

    #[test]
    fn shows_placeholder_then_loading_then_response() {
        let mut state = ViewState::new();
        assert!(screen(&state).contains("Nothing submitted yet"));

        state.apply(Action::SelectOperation(Operation::GenerateModules));
        state.apply(Action::Edit(FieldEdit::Insert('x')));
        let crate::state::Effect::Dispatch(submission) = state.apply(Action::SubmitStart) else {
            panic!("submit did not dispatch");
        };
        assert!(screen(&state).contains("Generating"));

        state.apply(Action::SubmitSuccess {
            seq: submission.seq,
            payload: ResponsePayload::Modules(vec!["Module 1".into(), "Module 2".into()]),
        });
        let rendered = screen(&state);
        assert!(rendered.contains("• Module 1"));
        assert!(rendered.contains("• Module 2"));
        assert!(rendered.contains("1 entries"));
    }

    #[test]
    fn open_sidebar_replays_history_entries() {
        let mut state = ViewState::new();
        state.apply(Action::SelectOperation(Operation::ClarifyDoubt));
        state.apply(Action::FocusPrevious);
        for c in "why".chars() {
            state.apply(Action::Edit(FieldEdit::Insert(c)));
        }
        let crate::state::Effect::Dispatch(submission) = state.apply(Action::SubmitStart) else {
            panic!("submit did not dispatch");
        };
        state.apply(Action::SubmitError {
            seq: submission.seq,
        });
        state.apply(Action::ToggleSidebar);

        let rendered = screen(&state);
        assert!(rendered.contains("Chat History"));
        assert!(rendered.contains("User's Doubt:"));
        assert!(rendered.contains("Your doubt"));
    }

    #[test]
    fn sidebar_keeps_newest_wrapped_entry_in_view() {
        let mut state = ViewState::new();
        state.apply(Action::SelectOperation(Operation::GenerateSummary));
        for i in 0..3 {
            complete_summary(&mut state, format!("{}NEWEST{i}", "lorem ipsum ".repeat(25)));
        }
        state.apply(Action::ToggleSidebar);

        let (sidebar, limits) = render(&state, 40);
        assert!(sidebar.contains("NEWEST2"), "{sidebar}");
        assert!(!sidebar.contains("NEWEST0"), "{sidebar}");
        assert!(limits.history > 0);

        state.apply(Action::SetScrollLimits(limits));
        state.apply(Action::HistoryScrollUp(limits.history));
        let (sidebar, _) = render(&state, 40);
        assert!(sidebar.contains("NEWEST0"), "{sidebar}");
        assert!(!sidebar.contains("NEWEST2"), "{sidebar}");
    }

    #[test]
    fn response_shows_operation_title() {
        let mut state = ViewState::new();
        state.apply(Action::SelectOperation(Operation::ClarifyDoubt));
        complete_summary(&mut state, "Because.".into());
        let rendered = screen(&state);
        assert!(rendered.contains("Answer:"));
        assert!(rendered.contains("Because."));
    }
}
