//! Waste and wastewater tables.

use kerb_core::{record::Record, stats::WaterCategory, store::RecordStore};
use ratatui::{
  Frame,
  layout::{Constraint, Rect},
  style::{Color, Modifier, Style},
  text::{Line, Span},
  widgets::{Block, Borders, Cell, Paragraph, Row, Table, TableState},
};

use super::tone_color;
use crate::app::{App, Tab, TableView};

/// Render the table for the active tab into `area`.
pub fn draw<S: RecordStore>(f: &mut Frame, area: Rect, app: &App<S>) {
  let view = app.table_view();

  let title = if app.query.is_empty() {
    format!(" {} ({}) ", app.tab, view.total)
  } else {
    format!(" {} ({}/{}) ", app.tab, view.matched, view.total)
  };
  let block = Block::default()
    .title(title)
    .borders(Borders::ALL)
    .border_style(Style::default().fg(Color::DarkGray));
  let mut inner = block.inner(area);
  f.render_widget(block, area);

  // Footer line: search bar or paging summary.
  if inner.height > 2 {
    let footer_area = Rect {
      y: inner.y + inner.height - 1,
      height: 1,
      ..inner
    };
    inner.height -= 1;
    f.render_widget(footer(app, &view), footer_area);
  }

  if view.rows.is_empty() {
    let text = if let Some(label) = app.busy() {
      label
    } else if app.query.is_empty() {
      "No records yet. Press n to add one."
    } else {
      "No records match the search."
    };
    f.render_widget(
      Paragraph::new(text).style(Style::default().fg(Color::DarkGray)),
      inner,
    );
    return;
  }

  let methods_heading = if app.tab == Tab::Water { "Wastewater" } else { "Waste" };
  let header = Row::new(["Name", "Community", "Street", methods_heading, "Surveyor"]);
  let widths = [
    Constraint::Percentage(20),
    Constraint::Percentage(15),
    Constraint::Percentage(15),
    Constraint::Percentage(35),
    Constraint::Percentage(15),
  ];

  let rows: Vec<Row> = view.rows.iter().map(|r| row(app.tab, r)).collect();

  let mut state = TableState::default();
  state.select(Some(app.cursor));

  f.render_stateful_widget(
    Table::new(rows, widths)
      .header(header.style(Style::default().add_modifier(Modifier::BOLD)))
      .row_highlight_style(
        Style::default()
          .bg(Color::Blue)
          .fg(Color::White)
          .add_modifier(Modifier::BOLD),
      ),
    inner,
    &mut state,
  );
}

fn row(tab: Tab, record: &Record) -> Row<'static> {
  let methods = if tab == Tab::Water {
    let spans: Vec<Span> = record
      .water_methods
      .iter()
      .enumerate()
      .flat_map(|(i, m)| {
        let sep = (i > 0).then(|| Span::raw(", "));
        let label = Span::styled(
          m.clone(),
          Style::default().fg(tone_color(WaterCategory::tone_of(m))),
        );
        sep.into_iter().chain(std::iter::once(label))
      })
      .collect();
    Line::from(spans)
  } else {
    Line::from(record.waste_methods.join(", "))
  };

  Row::new(vec![
    Cell::from(record.full_name.clone()),
    Cell::from(record.community.clone()),
    Cell::from(record.street.clone()),
    Cell::from(methods),
    Cell::from(record.responsible_person.clone()),
  ])
}

fn footer<S: RecordStore>(app: &App<S>, view: &TableView) -> Paragraph<'static> {
  if app.search_active || !app.query.is_empty() {
    let text = if app.search_active {
      format!("/{}_", app.query)
    } else {
      format!("/{}", app.query)
    };
    return Paragraph::new(text).style(Style::default().fg(Color::Yellow));
  }
  let shown = view.rows.len();
  let text = if view.can_load_more {
    format!("showing {shown}, {} more  [m] load more", view.remaining)
  } else if view.remaining > 0 {
    format!("showing {shown} of {}; search to narrow the list", view.matched)
  } else {
    format!("showing {shown}")
  };
  Paragraph::new(text).style(Style::default().fg(Color::DarkGray))
}
