use ratatui::Frame;
use ratatui::layout::{Alignment, Constraint, Direction, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Paragraph};

use crate::app::App;
use crate::model::{LogLine, LogTone};

const BG: Color = Color::Rgb(9, 15, 25);
const PANEL: Color = Color::Rgb(16, 27, 44);
const ACCENT: Color = Color::Rgb(52, 211, 153);
const MUTED: Color = Color::Rgb(140, 156, 178);
const WARN: Color = Color::Rgb(251, 191, 36);
const ERROR: Color = Color::Rgb(248, 113, 113);
const PL_A: Color = Color::Rgb(17, 94, 89);
const PL_B: Color = Color::Rgb(30, 64, 175);

pub fn render(frame: &mut Frame, app: &mut App) {
    let root = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Min(3),
            Constraint::Length(1),
            Constraint::Length(1),
        ])
        .split(frame.area());

    render_log(frame, root[0], app);
    render_status(frame, root[1], app);
    render_command_line(frame, root[2], app);
}

fn render_log(frame: &mut Frame, area: Rect, app: &mut App) {
    app.set_log_page_size(log_rows_visible(area));

    let lines = app
        .log_lines()
        .iter()
        .map(styled_log_line)
        .collect::<Vec<_>>();
    let block = Block::default()
        .title(format!(
            " {} ",
            compact_text(app.log_title(), area.width.saturating_sub(4) as usize)
        ))
        .borders(Borders::ALL)
        .border_style(Style::default().fg(MUTED))
        .style(Style::default().bg(PANEL));
    let paragraph = Paragraph::new(lines)
        .block(block)
        .style(Style::default().fg(Color::White))
        .scroll((app.log_scroll(), 0));

    frame.render_widget(paragraph, area);
}

fn styled_log_line(line: &LogLine) -> Line<'static> {
    let style = match line.tone {
        LogTone::Output => Style::default().fg(Color::White),
        LogTone::Info => Style::default().fg(ACCENT),
        LogTone::Warn => Style::default().fg(WARN),
        LogTone::Error => Style::default().fg(ERROR).add_modifier(Modifier::BOLD),
    };
    Line::from(Span::styled(line.text.clone(), style))
}

fn render_status(frame: &mut Frame, area: Rect, app: &App) {
    let env_bg = if app.namespace().is_empty() { WARN } else { PL_A };
    let env_fg = if app.namespace().is_empty() {
        Color::Black
    } else {
        Color::White
    };

    let unit = app.selected_unit();
    let mut spans = Vec::new();
    push_powerline_segment(
        &mut spans,
        format!(" {} ", app.status_line()),
        env_fg,
        env_bg,
        if unit.is_empty() { BG } else { PL_B },
    );
    if !unit.is_empty() {
        push_powerline_segment(&mut spans, format!(" Pod: {unit} "), Color::White, PL_B, BG);
    }

    let Some(hint) = app.hint() else {
        frame.render_widget(
            Paragraph::new(Line::from(spans)).style(Style::default().bg(BG)),
            area,
        );
        return;
    };

    let left_width = spans_width(&spans) as u16;
    let chunks = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Length(left_width), Constraint::Min(1)])
        .split(area);
    frame.render_widget(
        Paragraph::new(Line::from(spans)).style(Style::default().bg(BG)),
        chunks[0],
    );
    frame.render_widget(
        Paragraph::new(Line::from(Span::styled(
            compact_text(hint, chunks[1].width as usize),
            Style::default().fg(MUTED),
        )))
        .style(Style::default().bg(BG))
        .alignment(Alignment::Right),
        chunks[1],
    );
}

fn render_command_line(frame: &mut Frame, area: Rect, app: &App) {
    let visible = tail_text(app.input(), area.width.saturating_sub(1) as usize);
    let cursor_x = area.x + visible.chars().count() as u16;
    frame.render_widget(
        Paragraph::new(Line::from(Span::styled(
            visible,
            Style::default().fg(Color::White).bg(PL_B),
        )))
        .style(Style::default().bg(BG)),
        area,
    );
    frame.set_cursor_position((cursor_x, area.y));
}

fn push_powerline_segment(
    spans: &mut Vec<Span<'static>>,
    content: impl Into<String>,
    fg: Color,
    bg: Color,
    next_bg: Color,
) {
    spans.push(Span::styled(
        content.into(),
        Style::default().fg(fg).bg(bg).add_modifier(Modifier::BOLD),
    ));
    spans.push(Span::styled("", Style::default().fg(bg).bg(next_bg)));
}

fn spans_width(spans: &[Span<'_>]) -> usize {
    spans.iter().map(|span| span.content.chars().count()).sum()
}

fn log_rows_visible(area: Rect) -> u16 {
    area.height.saturating_sub(2).max(1)
}

fn compact_text(value: &str, max_chars: usize) -> String {
    if value.chars().count() <= max_chars {
        return value.to_string();
    }

    if max_chars <= 1 {
        return "…".to_string();
    }

    let mut out = value
        .chars()
        .take(max_chars.saturating_sub(1))
        .collect::<String>();
    out.push('…');
    out
}

// Keeps the end of the line visible so the cursor never leaves the screen.
fn tail_text(value: &str, max_chars: usize) -> String {
    let count = value.chars().count();
    if count <= max_chars {
        return value.to_string();
    }

    value.chars().skip(count - max_chars).collect()
}
