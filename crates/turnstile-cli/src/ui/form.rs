//! Registration form overlay.

use ratatui::{
  Frame,
  layout::Rect,
  style::{Color, Modifier, Style},
  text::{Line, Span},
  widgets::{Block, Borders, Clear, Paragraph},
};
use turnstile_core::store::RecordStore;

use crate::{
  app::{App, FormField},
  ui::centered_rect,
};

const FIELDS: [(FormField, &str, &str); 3] = [
  (FormField::Name, "Name", "John Doe"),
  (FormField::LicensePlate, "License plate", "ABC-123"),
  (FormField::IdentityCard, "Identity card number", "1234567890"),
];

/// Render the registration form as a centered popup.
pub fn draw<S: RecordStore>(f: &mut Frame, area: Rect, app: &App<S>) {
  let popup = centered_rect(60, 13, area);
  f.render_widget(Clear, popup);

  let block = Block::default()
    .title(" New record ")
    .borders(Borders::ALL)
    .border_style(Style::default().fg(Color::Cyan));
  let inner = block.inner(popup);
  f.render_widget(block, popup);

  let mut lines: Vec<Line> = Vec::new();

  for (field, label, placeholder) in FIELDS {
    let focused = app.form.focus == field;
    let value = app.form.field(field);

    let label_style = if focused {
      Style::default()
        .fg(Color::Cyan)
        .add_modifier(Modifier::BOLD)
    } else {
      Style::default().fg(Color::Gray)
    };

    let value_span = if value.is_empty() && !focused {
      Span::styled(placeholder.to_string(), Style::default().fg(Color::DarkGray))
    } else if focused {
      Span::raw(format!("{value}_"))
    } else {
      Span::raw(value.to_string())
    };

    lines.push(Line::from(vec![
      Span::styled(format!("{label:<22}"), label_style),
      value_span,
    ]));

    // Inline format hint under a non-empty invalid field.
    match app.form.field_error(field) {
      Some(rule) => lines.push(Line::from(Span::styled(
        format!("{:<22}{rule}", ""),
        Style::default().fg(Color::Red),
      ))),
      None => lines.push(Line::from("")),
    }
  }

  lines.push(Line::from(""));
  let submit_hint = if app.form.is_valid() {
    Span::styled(
      "Enter to create",
      Style::default().fg(Color::Green),
    )
  } else {
    // Submission stays disabled until all fields pass their format rules.
    Span::styled(
      "Fill in all fields to enable submission",
      Style::default().fg(Color::DarkGray),
    )
  };
  lines.push(Line::from(submit_hint));

  f.render_widget(Paragraph::new(lines), inner);
}
