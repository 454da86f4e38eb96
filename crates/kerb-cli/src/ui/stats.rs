//! Statistics dashboard: summary cards, method charts, surveyor counts.

use kerb_core::{
  stats::{Statistics, WaterCategory},
  store::RecordStore,
};
use ratatui::{
  Frame,
  layout::{Constraint, Direction, Layout, Rect},
  style::{Color, Modifier, Style},
  text::{Line, Span},
  widgets::{Bar, BarChart, BarGroup, Block, Borders, List, ListItem, Paragraph},
};

use super::tone_color;
use crate::app::App;

pub fn draw<S: RecordStore>(f: &mut Frame, area: Rect, app: &App<S>) {
  let stats = app.coordinator.statistics();

  let rows = Layout::default()
    .direction(Direction::Vertical)
    .constraints([Constraint::Length(4), Constraint::Min(0)])
    .split(area);
  draw_cards(f, rows[0], &stats);

  let cols = Layout::default()
    .direction(Direction::Horizontal)
    .constraints([
      Constraint::Percentage(35),
      Constraint::Percentage(40),
      Constraint::Percentage(25),
    ])
    .split(rows[1]);
  draw_waste(f, cols[0], &stats);
  draw_water(f, cols[1], &stats);
  draw_responsible(f, cols[2], &stats);
}

fn draw_cards(f: &mut Frame, area: Rect, stats: &Statistics) {
  let cards = [
    ("Households", stats.total.to_string()),
    ("Avg. household size", format!("{:.1}", stats.average_household_size)),
    ("Waste methods", stats.waste_method_total().to_string()),
    (
      "Grease traps",
      stats.water_count(WaterCategory::TrapInstalled).to_string(),
    ),
  ];
  let cols = Layout::default()
    .direction(Direction::Horizontal)
    .constraints([Constraint::Ratio(1, 4); 4])
    .split(area);

  for ((label, value), area) in cards.into_iter().zip(cols.iter()) {
    let block = Block::default()
      .title(format!(" {label} "))
      .borders(Borders::ALL)
      .border_style(Style::default().fg(Color::DarkGray));
    f.render_widget(
      Paragraph::new(Line::from(Span::styled(
        value,
        Style::default()
          .fg(Color::Cyan)
          .add_modifier(Modifier::BOLD),
      )))
      .block(block),
      *area,
    );
  }
}

fn chart_block(title: &str) -> Block<'_> {
  Block::default()
    .title(format!(" {title} "))
    .borders(Borders::ALL)
    .border_style(Style::default().fg(Color::DarkGray))
}

fn draw_waste(f: &mut Frame, area: Rect, stats: &Statistics) {
  let bars: Vec<Bar> = stats
    .waste
    .iter()
    .map(|(bucket, n)| {
      Bar::default()
        .label(Line::from(bucket.to_string()))
        .value(*n as u64)
        .style(Style::default().fg(Color::Cyan))
    })
    .collect();
  f.render_widget(
    BarChart::default()
      .block(chart_block("Food waste"))
      .direction(Direction::Horizontal)
      .bar_width(1)
      .bar_gap(1)
      .data(BarGroup::default().bars(&bars)),
    area,
  );
}

fn draw_water(f: &mut Frame, area: Rect, stats: &Statistics) {
  let bars: Vec<Bar> = stats
    .water
    .iter()
    .map(|(category, n)| {
      Bar::default()
        .label(Line::from(category.to_string()))
        .value(*n as u64)
        .style(Style::default().fg(tone_color(category.tone())))
    })
    .collect();
  f.render_widget(
    BarChart::default()
      .block(chart_block("Wastewater"))
      .direction(Direction::Horizontal)
      .bar_width(1)
      .bar_gap(1)
      .data(BarGroup::default().bars(&bars)),
    area,
  );
}

fn draw_responsible(f: &mut Frame, area: Rect, stats: &Statistics) {
  let block = chart_block("Surveyors");
  if stats.responsible.is_empty() {
    f.render_widget(
      Paragraph::new("No records.")
        .style(Style::default().fg(Color::DarkGray))
        .block(block),
      area,
    );
    return;
  }
  let items: Vec<ListItem> = stats
    .responsible
    .iter()
    .map(|(name, n)| {
      ListItem::new(Line::from(vec![
        Span::styled(format!("{n:>4}  "), Style::default().fg(Color::Cyan)),
        Span::raw(name.clone()),
      ]))
    })
    .collect();
  f.render_widget(List::new(items).block(block), area);
}
