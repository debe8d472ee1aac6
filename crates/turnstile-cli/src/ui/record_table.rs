//! Records table — the main pane.

use chrono::Local;
use ratatui::{
  Frame,
  layout::{Constraint, Rect},
  style::{Color, Modifier, Style},
  text::Span,
  widgets::{Block, Borders, Cell, Row, Table, TableState},
};
use turnstile_core::{record::Stage, store::RecordStore};

use crate::app::App;

/// Render the records table into `area`.
pub fn draw<S: RecordStore>(f: &mut Frame, area: Rect, app: &App<S>) {
  let filtered = app.filtered_records();
  let total = app.records.len();

  // Title with count.
  let title = if app.filter_active || !app.filter.is_empty() {
    format!(" Records ({}/{}) ", filtered.len(), total)
  } else {
    format!(" Records ({total}) ")
  };

  let block = Block::default()
    .title(title)
    .borders(Borders::ALL)
    .border_style(Style::default().fg(Color::DarkGray));

  let header = Row::new(vec![
    "Name",
    "Plate",
    "ID card",
    "Stage 1",
    "Stage 2",
    "Stage 3",
  ])
  .style(Style::default().add_modifier(Modifier::BOLD));

  let rows: Vec<Row> = filtered
    .iter()
    .map(|record| {
      Row::new(vec![
        Cell::from(record.name.clone()),
        Cell::from(record.license_plate.clone()),
        Cell::from(record.identity_card_number.clone()),
        stage_cell(&record.stages.one),
        stage_cell(&record.stages.two),
        stage_cell(&record.stages.three),
      ])
    })
    .collect();

  let mut inner_area = block.inner(area);
  f.render_widget(block, area);

  // If a filter is active or set, show a filter bar at the bottom.
  if (app.filter_active || !app.filter.is_empty()) && inner_area.height > 2 {
    let filter_area = Rect {
      x:      inner_area.x,
      y:      inner_area.y + inner_area.height - 1,
      width:  inner_area.width,
      height: 1,
    };
    inner_area.height = inner_area.height.saturating_sub(1);

    let filter_text = if app.filter_active {
      format!("/{}_", app.filter)
    } else {
      format!("/{}", app.filter)
    };
    f.render_widget(
      ratatui::widgets::Paragraph::new(filter_text)
        .style(Style::default().fg(Color::Yellow)),
      filter_area,
    );
  }

  let mut state = TableState::default();
  state.select(if filtered.is_empty() {
    None
  } else {
    Some(app.cursor)
  });

  let table = Table::new(
    rows,
    [
      Constraint::Min(16),
      Constraint::Length(8),
      Constraint::Length(11),
      Constraint::Length(10),
      Constraint::Length(10),
      Constraint::Length(10),
    ],
  )
  .header(header)
  .row_highlight_style(
    Style::default()
      .bg(Color::Blue)
      .fg(Color::White)
      .add_modifier(Modifier::BOLD),
  );

  f.render_stateful_widget(table, inner_area, &mut state);
}

/// A checked stage shows a completed indicator plus the scan time as
/// hour:minute; a pending stage shows a pending indicator.
fn stage_cell(stage: &Stage) -> Cell<'static> {
  match stage {
    Stage::Checked { scan_time } => {
      let hhmm = scan_time.with_timezone(&Local).format("%H:%M");
      Cell::from(Span::styled(
        format!("✔ {hhmm}"),
        Style::default().fg(Color::Green),
      ))
    }
    Stage::Pending => Cell::from(Span::styled(
      "pending",
      Style::default().fg(Color::DarkGray),
    )),
  }
}
