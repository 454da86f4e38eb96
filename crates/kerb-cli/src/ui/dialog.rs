//! Popups drawn over the active tab.

use kerb_core::{record::Record, stats::WaterCategory, store::RecordStore};
use ratatui::{
  Frame,
  layout::{Constraint, Flex, Layout, Rect},
  style::{Color, Modifier, Style},
  text::{Line, Span},
  widgets::{Block, Borders, Clear, Paragraph, Wrap},
};

use super::tone_color;
use crate::app::{App, Modal};

pub fn draw<S: RecordStore>(f: &mut Frame, modal: &Modal, app: &App<S>) {
  match modal {
    Modal::ConfirmDelete { name, .. } => confirm(
      f,
      " Delete record ",
      vec![
        Line::from(format!("Delete the record for {name}?")),
        Line::from("This cannot be undone."),
      ],
    ),
    Modal::ConfirmDuplicate {
      pending,
      duplicate_of,
    } => confirm(
      f,
      " Duplicate name ",
      vec![
        Line::from(format!(
          "A record named {} already exists ({}, {}).",
          pending.name(),
          duplicate_of.community,
          duplicate_of.street,
        )),
        Line::from("Save anyway?"),
      ],
    ),
    Modal::Detail { id } => match app.coordinator.record(id) {
      Some(record) => detail(f, record),
      None => confirm(f, " Detail ", vec![Line::from("Record no longer exists.")]),
    },
  }
}

fn centered(area: Rect, width: u16, height: u16) -> Rect {
  let [row] = Layout::vertical([Constraint::Length(height)])
    .flex(Flex::Center)
    .areas(area);
  let [cell] = Layout::horizontal([Constraint::Length(width)])
    .flex(Flex::Center)
    .areas(row);
  cell
}

fn popup(title: &str) -> Block<'_> {
  Block::default()
    .title(title)
    .borders(Borders::ALL)
    .border_style(Style::default().fg(Color::Yellow))
}

fn confirm(f: &mut Frame, title: &str, mut lines: Vec<Line<'static>>) {
  lines.push(Line::from(""));
  lines.push(Line::from(vec![
    Span::styled("[y]", Style::default().fg(Color::Green).add_modifier(Modifier::BOLD)),
    Span::raw(" yes   "),
    Span::styled("[n]", Style::default().fg(Color::Red).add_modifier(Modifier::BOLD)),
    Span::raw(" no"),
  ]));
  let area = centered(f.area(), 60, lines.len() as u16 + 2);
  f.render_widget(Clear, area);
  f.render_widget(
    Paragraph::new(lines)
      .wrap(Wrap { trim: true })
      .block(popup(title)),
    area,
  );
}

fn detail(f: &mut Frame, record: &Record) {
  let label = Style::default().fg(Color::DarkGray);
  let field = |name: &'static str, value: String| {
    Line::from(vec![Span::styled(format!("{name:<14}"), label), Span::raw(value)])
  };

  let mut lines = vec![
    field("Name", record.full_name.clone()),
    field("Shop", record.shop_name.clone().unwrap_or_default()),
    field("Phone", record.phone.clone()),
    field("Household", record.household_size.to_string()),
    field("Address type", record.display_address_type().to_string()),
    field(
      "Address",
      format!("{} {}, {}", record.address, record.street, record.community),
    ),
    field("Surveyor", record.responsible_person.clone()),
    field("Recorded", record.timestamp.clone()),
    Line::from(""),
    Line::from(Span::styled("Waste", label)),
  ];
  lines.extend(record.waste_methods.iter().map(|m| Line::from(format!("  • {m}"))));
  lines.push(Line::from(Span::styled("Wastewater", label)));
  lines.extend(record.water_methods.iter().map(|m| {
    Line::from(Span::styled(
      format!("  • {m}"),
      Style::default().fg(tone_color(WaterCategory::tone_of(m))),
    ))
  }));
  lines.push(Line::from(""));
  if let Some(url) = record.navigation_url() {
    lines.push(field("Map", url));
  }
  if let Some(url) = &record.image_url {
    lines.push(field("Photo", url.clone()));
  }
  lines.push(Line::from(""));
  lines.push(Line::from(Span::styled(
    "[e] edit  [d] delete  [Esc] close",
    label,
  )));

  let area = centered(f.area(), 80, lines.len() as u16 + 2);
  f.render_widget(Clear, area);
  f.render_widget(
    Paragraph::new(lines)
      .wrap(Wrap { trim: false })
      .block(popup(" Record ")),
    area,
  );
}
