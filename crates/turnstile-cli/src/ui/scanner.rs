//! Scanner overlay.

use ratatui::{
  Frame,
  layout::Rect,
  style::{Color, Style},
  text::{Line, Span},
  widgets::{Block, Borders, Clear, Paragraph},
};
use turnstile_core::store::RecordStore;

use crate::{app::App, ui::centered_rect};

/// Render the scanner as a centered popup.
pub fn draw<S: RecordStore>(f: &mut Frame, area: Rect, app: &App<S>) {
  let popup = centered_rect(64, 7, area);
  f.render_widget(Clear, popup);

  let block = Block::default()
    .title(" Scan code ")
    .borders(Borders::ALL)
    .border_style(Style::default().fg(Color::Cyan));
  let inner = block.inner(popup);
  f.render_widget(block, popup);

  let mut lines = vec![
    Line::from(Span::styled(
      "Paste payload text or enter the path to a QR image:",
      Style::default().fg(Color::Gray),
    )),
    Line::from(format!("> {}_", app.scanner.input)),
    Line::from(""),
  ];

  // Decode errors are per-frame noise: shown inline, scanning continues.
  if let Some(err) = &app.scanner.error {
    lines.push(Line::from(Span::styled(
      err.clone(),
      Style::default().fg(Color::Red),
    )));
  }

  f.render_widget(Paragraph::new(lines), inner);
}
