//! Entry form pane.

use kerb_core::{stats::WaterCategory, store::RecordStore};
use ratatui::{
  Frame,
  layout::Rect,
  style::{Color, Modifier, Style},
  text::{Line, Span},
  widgets::{Block, Borders, Paragraph},
};

use super::tone_color;
use crate::{
  app::App,
  form::{Field, FieldKind, Form},
};

const LABEL_WIDTH: usize = 16;

pub fn draw<S: RecordStore>(f: &mut Frame, area: Rect, app: &App<S>) {
  let form = &app.form;
  let title = match &form.editing {
    Some(record) => format!(" Editing {} ", record.full_name),
    None => " New record ".to_string(),
  };
  let block = Block::default()
    .title(title)
    .borders(Borders::ALL)
    .border_style(Style::default().fg(Color::DarkGray));

  let mut lines: Vec<Line> = Vec::new();
  let mut focus_line = 0;
  for field in form.fields() {
    if field == form.focus {
      focus_line = lines.len();
    }
    field_lines(form, field, &mut lines);
  }

  // Keep the focused field on screen.
  let height = block.inner(area).height as usize;
  let scroll = focus_line.saturating_sub(height.saturating_sub(4));

  f.render_widget(
    Paragraph::new(lines).block(block).scroll((scroll as u16, 0)),
    area,
  );
}

fn field_lines(form: &Form, field: Field, out: &mut Vec<Line<'static>>) {
  let focused = field == form.focus;
  let label_style = if focused {
    Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD)
  } else {
    Style::default().fg(Color::DarkGray)
  };
  let marker = if focused { "▶ " } else { "  " };
  let label = Span::styled(
    format!("{marker}{:<width$}", field.to_string(), width = LABEL_WIDTH),
    label_style,
  );

  match field.kind() {
    FieldKind::Text => {
      let mut value = form.value(field);
      if focused {
        value.push('_');
      }
      out.push(Line::from(vec![label, Span::raw(value)]));
    }
    FieldKind::Choice(_) => {
      let value = form.value(field);
      let value = if focused { format!("‹ {value} ›") } else { value };
      out.push(Line::from(vec![label, Span::raw(value)]));
    }
    FieldKind::Multi(options) => {
      if !focused {
        let value = form.value(field);
        let value = if value.is_empty() { "(none)".to_string() } else { value };
        out.push(Line::from(vec![label, Span::raw(value)]));
        return;
      }
      out.push(Line::from(label));
      for (i, option) in options.iter().enumerate() {
        let tick = if form.is_selected(field, option) { "[x]" } else { "[ ]" };
        let mut style = if field == Field::WaterMethods {
          Style::default().fg(tone_color(WaterCategory::tone_of(option)))
        } else {
          Style::default()
        };
        if i == form.option_cursor {
          style = style.add_modifier(Modifier::REVERSED);
        }
        out.push(Line::from(Span::styled(
          format!("{:indent$}{tick} {option}", "", indent = LABEL_WIDTH + 2),
          style,
        )));
      }
    }
  }
}
