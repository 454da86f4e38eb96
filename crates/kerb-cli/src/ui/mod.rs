//! TUI rendering: header, active tab, status bar, then any open dialog.

pub mod dialog;
pub mod form;
pub mod records;
pub mod stats;

use chrono::Local;
use kerb_core::{coordinator::ConnectionStatus, stats::Tone, store::RecordStore};
use ratatui::{
  Frame,
  layout::{Constraint, Direction, Layout, Rect},
  style::{Color, Modifier, Style},
  text::{Line, Span},
  widgets::{Block, Paragraph, Tabs},
};
use strum::IntoEnumIterator;

use crate::app::{App, NoticeKind, Tab};

// ─── Root draw ────────────────────────────────────────────────────────────────

/// Main draw function called each frame.
pub fn draw<S: RecordStore>(f: &mut Frame, app: &App<S>) {
  let rows = Layout::default()
    .direction(Direction::Vertical)
    .constraints([
      Constraint::Length(1), // header
      Constraint::Min(0),    // body
      Constraint::Length(1), // status bar
    ])
    .split(f.area());

  draw_header(f, rows[0], app);
  match app.tab {
    Tab::Waste | Tab::Water => records::draw(f, rows[1], app),
    Tab::Stats => stats::draw(f, rows[1], app),
    Tab::Form => form::draw(f, rows[1], app),
  }
  draw_status(f, rows[2], app);

  if let Some(modal) = &app.modal {
    dialog::draw(f, modal, app);
  }
}

/// Colour used wherever a water method's tone is shown.
pub fn tone_color(tone: Tone) -> Color {
  match tone {
    Tone::Good => Color::Green,
    Tone::Pending => Color::Yellow,
    Tone::Poor => Color::Red,
    Tone::Neutral => Color::Gray,
  }
}

// ─── Header ───────────────────────────────────────────────────────────────────

fn draw_header<S: RecordStore>(f: &mut Frame, area: Rect, app: &App<S>) {
  let block = Block::default().style(Style::default().bg(Color::DarkGray));
  let inner = block.inner(area);
  f.render_widget(block, area);

  let (status_label, status_color) = match app.coordinator.connection_status() {
    ConnectionStatus::Loading => ("● connecting", Color::Yellow),
    ConnectionStatus::Online => ("● online", Color::Green),
    ConnectionStatus::Offline => ("● offline", Color::Red),
  };
  let date = Local::now().format("%Y-%m-%d").to_string();
  let right = Line::from(vec![
    Span::styled(status_label, Style::default().fg(status_color)),
    Span::styled(format!("  {date} "), Style::default().fg(Color::Gray)),
  ]);
  let right_width = right.width() as u16;

  let cols = Layout::default()
    .direction(Direction::Horizontal)
    .constraints([Constraint::Min(0), Constraint::Length(right_width)])
    .split(inner);

  let selected = Tab::iter().position(|t| t == app.tab).unwrap_or(0);
  let titles = Tab::iter()
    .enumerate()
    .map(|(i, t)| format!("{} {t}", i + 1));
  let tabs = Tabs::new(titles)
    .select(selected)
    .style(Style::default().fg(Color::White))
    .highlight_style(
      Style::default()
        .fg(Color::Black)
        .bg(Color::Cyan)
        .add_modifier(Modifier::BOLD),
    )
    .divider("│");

  f.render_widget(tabs, cols[0]);
  f.render_widget(Paragraph::new(right), cols[1]);
}

// ─── Status bar ───────────────────────────────────────────────────────────────

fn draw_status<S: RecordStore>(f: &mut Frame, area: Rect, app: &App<S>) {
  let (mode_label, mode_color) = if app.busy().is_some() {
    ("BUSY", Color::Yellow)
  } else if app.modal.is_some() {
    ("CONFIRM", Color::Magenta)
  } else if app.search_active {
    ("SEARCH", Color::Cyan)
  } else if app.tab == Tab::Form {
    ("EDIT", Color::Green)
  } else {
    ("NORMAL", Color::Cyan)
  };

  let hints = match app.tab {
    _ if app.search_active => "Type to filter  Enter keep  Esc clear",
    Tab::Waste | Tab::Water => {
      "jk move  / search  m more  Enter detail  e edit  d delete  n new  r reload  q quit"
    }
    Tab::Stats => "1-4 tabs  r reload  c check connection  q quit",
    Tab::Form => {
      "Tab/↑↓ field  ←→ choose  Space toggle  Ctrl-S save  Esc back"
    }
  };

  let (text, text_style) = match (app.busy(), &app.notice) {
    (Some(label), _) => (label.to_string(), Style::default().fg(Color::Yellow)),
    (None, Some(notice)) => {
      let color = match notice.kind {
        NoticeKind::Info => Color::Gray,
        NoticeKind::Success => Color::Green,
        NoticeKind::Warning => Color::Yellow,
        NoticeKind::Error => Color::Red,
      };
      (notice.text.clone(), Style::default().fg(color))
    }
    (None, None) => (hints.to_string(), Style::default().fg(Color::DarkGray)),
  };

  let line = Line::from(vec![
    Span::styled(
      format!(" {mode_label} "),
      Style::default()
        .fg(Color::Black)
        .bg(mode_color)
        .add_modifier(Modifier::BOLD),
    ),
    Span::styled(format!("  {text}"), text_style),
  ]);
  f.render_widget(
    Paragraph::new(line).style(Style::default().bg(Color::Black)),
    area,
  );
}
