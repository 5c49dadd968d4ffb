use std::time::{SystemTime, UNIX_EPOCH};

use ratatui::{
    layout::{Alignment, Constraint, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph, Wrap},
    Frame,
};
use unicode_width::UnicodeWidthStr;

use crate::core::app::{App, ChatEntry, LlmAvailability, ResultDialog};
use crate::core::message::ChatRole;
use crate::core::step::{RitualStep, StepNavigator};

const SPINNER: [&str; 4] = ["◐", "◓", "◑", "◒"];

pub fn ui(f: &mut Frame, app: &App) {
    let [header, body, footer] = Layout::vertical([
        Constraint::Length(1),
        Constraint::Min(0),
        Constraint::Length(1),
    ])
    .areas(f.area());

    f.render_widget(step_bar(&app.navigator), header);
    render_step_panel(f, app, body);
    f.render_widget(
        Paragraph::new(footer_hint(app)).style(Style::default().fg(Color::DarkGray)),
        footer,
    );

    if let Some(dialog) = &app.dialog {
        render_result_dialog(f, app, dialog);
    }
    if let Some(alert) = &app.alert {
        render_alert(f, alert);
    }
}

fn step_bar(navigator: &StepNavigator) -> Paragraph<'static> {
    let mut spans = Vec::new();
    for (index, step) in RitualStep::ALL.into_iter().enumerate() {
        if index > 0 {
            spans.push(Span::styled(" › ", Style::default().fg(Color::DarkGray)));
        }
        let style = if navigator.is_visible(step) {
            Style::default()
                .fg(Color::Yellow)
                .add_modifier(Modifier::BOLD)
        } else {
            Style::default().fg(Color::DarkGray)
        };
        spans.push(Span::styled(step.title(), style));
    }
    Paragraph::new(Line::from(spans))
}

fn footer_hint(app: &App) -> &'static str {
    if app.alert.is_some() {
        return "Enter 確定";
    }
    if app.dialog.is_some() {
        return "Enter 送出 · Shift/Alt+Enter 換行 · Esc 關閉並重新開始 · Ctrl+C 離開";
    }
    match app.step() {
        RitualStep::Question => "Enter 開始擲筊 · Esc 離開",
        RitualStep::Blocks => "Enter/Space 擲筊 · Esc 重新開始",
        RitualStep::Draw => "Enter/Space 抽籤 · Esc 重新開始",
        RitualStep::Result => "r 重新開始 · Esc 離開",
    }
}

fn render_step_panel(f: &mut Frame, app: &App, area: Rect) {
    let step = app.step();
    let lines = match step {
        RitualStep::Question => vec![
            Line::from(""),
            Line::from("請先在心中默念姓名、生辰與住址，"),
            Line::from("再誠心稟明想請示的事情。"),
            Line::from(""),
            Line::from(Span::styled(
                "準備好了就按 Enter",
                Style::default().add_modifier(Modifier::BOLD),
            )),
        ],
        RitualStep::Blocks => blocks_lines(app),
        RitualStep::Draw => draw_lines(app),
        RitualStep::Result => vec![Line::from(""), Line::from("籤詩已收起。")],
    };

    let panel = Paragraph::new(lines)
        .alignment(Alignment::Center)
        .wrap(Wrap { trim: false })
        .block(
            Block::default()
                .title(step.title())
                .borders(Borders::ALL)
                .border_style(Style::default().fg(Color::Red)),
        );
    f.render_widget(panel, area);
}

fn blocks_lines(app: &App) -> Vec<Line<'static>> {
    let panel = &app.blocks;
    let faces = if panel.throwing {
        format!("{}   {}", spinner_frame(), spinner_frame())
    } else {
        match panel.faces {
            Some([first, second]) => format!("{}   {}", first.glyph(), second.glyph()),
            None => "◗   ◖".to_string(),
        }
    };

    let mut lines = vec![
        Line::from(""),
        Line::from(Span::styled(
            faces,
            Style::default()
                .fg(Color::Red)
                .add_modifier(Modifier::BOLD),
        )),
        Line::from(""),
    ];
    if panel.throwing {
        lines.push(Line::from("筊杯落地中…"));
    } else if !panel.message.is_empty() {
        lines.push(Line::from(Span::styled(
            panel.message.clone(),
            Style::default().fg(Color::Yellow),
        )));
    } else {
        lines.push(Line::from("按 Enter 擲筊，請示神明"));
    }
    lines
}

fn draw_lines(app: &App) -> Vec<Line<'static>> {
    if app.draw.shaking {
        return vec![
            Line::from(""),
            Line::from(Span::styled(
                format!("{} 搖籤中 {}", spinner_frame(), spinner_frame()),
                Style::default().fg(Color::Yellow),
            )),
        ];
    }
    vec![
        Line::from(""),
        Line::from("神明應允，請抽籤。"),
        Line::from(""),
        Line::from(Span::styled(
            "按 Enter 搖動籤筒",
            Style::default().add_modifier(Modifier::BOLD),
        )),
    ]
}

fn render_result_dialog(f: &mut Frame, app: &App, dialog: &ResultDialog) {
    let area = centered_rect(92, 92, f.area());
    f.render_widget(Clear, area);

    let outer = Block::default()
        .title(dialog.lot().heading())
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Yellow));
    let inner = outer.inner(area);
    f.render_widget(outer, area);

    let card_width = card_column_width(dialog.lot().card_width(), inner.width);
    let [card_area, chat_area] =
        Layout::horizontal([Constraint::Length(card_width), Constraint::Min(0)]).areas(inner);

    f.render_widget(lot_card(dialog), card_area);
    render_chat(f, app, dialog, chat_area);
}

/// The card keeps its natural width (plus borders and padding) when the
/// screen allows it, and never takes more than half.
fn card_column_width(card_width: usize, available: u16) -> u16 {
    u16::try_from(card_width)
        .unwrap_or(u16::MAX)
        .saturating_add(4)
        .min(available / 2)
}

fn lot_card(dialog: &ResultDialog) -> Paragraph<'static> {
    let lot = dialog.lot();
    let mut lines = vec![Line::from(Span::styled(
        format!("籤等：{}", lot.level_display()),
        Style::default().add_modifier(Modifier::BOLD),
    ))];
    for (label, body) in lot.sections() {
        lines.push(Line::from(""));
        lines.push(Line::from(Span::styled(
            format!("【{label}】"),
            Style::default().fg(Color::Red),
        )));
        lines.extend(body.lines().map(|line| Line::from(line.to_string())));
    }
    Paragraph::new(lines)
        .wrap(Wrap { trim: false })
        .block(Block::default().borders(Borders::RIGHT))
}

fn render_chat(f: &mut Frame, app: &App, dialog: &ResultDialog, area: Rect) {
    let input_height = (app.input.lines().len() as u16).clamp(1, 4) + 2;
    let [status_area, log_area, input_area] = Layout::vertical([
        Constraint::Length(1),
        Constraint::Min(0),
        Constraint::Length(input_height),
    ])
    .areas(area);

    f.render_widget(llm_status_line(dialog.llm()), status_area);

    let text_lines: Vec<String> = dialog.log().iter().flat_map(entry_lines).collect();
    let scroll = wrapped_height(&text_lines, log_area.width).saturating_sub(log_area.height);
    let lines: Vec<Line> = text_lines.into_iter().map(Line::from).collect();
    f.render_widget(
        Paragraph::new(lines)
            .wrap(Wrap { trim: false })
            .scroll((scroll, 0)),
        log_area,
    );

    f.render_widget(&app.input, input_area);
}

fn llm_status_line(llm: &LlmAvailability) -> Paragraph<'static> {
    let (text, color) = match llm {
        LlmAvailability::Checking => ("AI 解籤：檢查中…".to_string(), Color::DarkGray),
        LlmAvailability::Connected => ("AI 解籤：已連線".to_string(), Color::Green),
        LlmAvailability::Unavailable(message) => (message.clone(), Color::Red),
    };
    Paragraph::new(text).style(Style::default().fg(color))
}

fn entry_lines(entry: &ChatEntry) -> Vec<String> {
    let speaker = match entry.role {
        ChatRole::User => "你",
        ChatRole::Assistant => "籤師",
    };
    let body = if entry.is_waiting() {
        format!("{} 思考中…", spinner_frame())
    } else {
        entry.content.clone()
    };

    let mut lines: Vec<String> = body
        .lines()
        .enumerate()
        .map(|(index, line)| {
            if index == 0 {
                format!("{speaker}：{line}")
            } else {
                format!("    {line}")
            }
        })
        .collect();
    if lines.is_empty() {
        lines.push(format!("{speaker}："));
    }
    lines.push(String::new());
    lines
}

/// Rows `lines` occupy once wrapped to `width` columns.
fn wrapped_height(lines: &[String], width: u16) -> u16 {
    let width = usize::from(width.max(1));
    let rows: usize = lines
        .iter()
        .map(|line| UnicodeWidthStr::width(line.as_str()).div_ceil(width).max(1))
        .sum();
    u16::try_from(rows).unwrap_or(u16::MAX)
}

fn render_alert(f: &mut Frame, message: &str) {
    let area = centered_rect(50, 20, f.area());
    f.render_widget(Clear, area);
    let widget = Paragraph::new(vec![
        Line::from(""),
        Line::from(message.to_string()),
        Line::from(""),
        Line::from(Span::styled(
            "Enter 確定",
            Style::default().fg(Color::DarkGray),
        )),
    ])
    .alignment(Alignment::Center)
    .wrap(Wrap { trim: false })
    .block(
        Block::default()
            .title("提示")
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::Red)),
    );
    f.render_widget(widget, area);
}

fn spinner_frame() -> &'static str {
    let millis = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|elapsed| elapsed.as_millis())
        .unwrap_or_default();
    SPINNER[(millis / 150) as usize % SPINNER.len()]
}

fn centered_rect(percent_x: u16, percent_y: u16, area: Rect) -> Rect {
    let popup_layout = Layout::vertical([
        Constraint::Percentage((100 - percent_y) / 2),
        Constraint::Percentage(percent_y),
        Constraint::Percentage((100 - percent_y) / 2),
    ])
    .split(area);

    Layout::horizontal([
        Constraint::Percentage((100 - percent_x) / 2),
        Constraint::Percentage(percent_x),
        Constraint::Percentage((100 - percent_x) / 2),
    ])
    .split(popup_layout[1])[1]
}
