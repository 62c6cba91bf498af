pub mod components;
pub mod renderfns;

use crate::app::App;
use components::{draw_vacancy_detail, draw_vacancy_table};
use ratatui::prelude::*;
use ratatui::widgets::TableState;
use renderfns::{draw_footer, draw_header};

/// Main draw function
pub fn draw(frame: &mut Frame, app: &mut App) {
  let chunks = Layout::default()
    .direction(Direction::Vertical)
    .constraints([
      Constraint::Length(1), // Header
      Constraint::Min(1),    // Main content
      Constraint::Length(1), // Footer
    ])
    .split(frame.area());

  draw_header(
    frame,
    chunks[0],
    &app.title(),
    app.endpoint(),
    app.snapshot().freshness,
  );

  // Listing on the left, selected vacancy on the right
  let content = if app.selected().is_some() {
    Layout::default()
      .direction(Direction::Horizontal)
      .constraints([Constraint::Percentage(60), Constraint::Percentage(40)])
      .split(chunks[1])
  } else {
    Layout::default()
      .constraints([Constraint::Min(1)])
      .split(chunks[1])
  };

  let mut table_state = app.table_state().clone();
  {
    let rows = app.visible_rows();
    let selected_uid = app.selected().map(|r| r.uid.as_str());
    draw_vacancy_table(
      frame,
      content[0],
      app.snapshot(),
      &rows,
      app.listing(),
      selected_uid,
      &mut table_state,
    );
  }
  // Rendering may scroll the table; keep its offset
  *app.table_state() = table_state;

  if let (Some(vacancy), Some(area)) = (app.selected(), content.get(1)) {
    draw_vacancy_detail(frame, *area, vacancy);
  }

  let parts = match app.overlay_hint() {
    Some(hint) => vec![hint.to_string()],
    None => app.status_parts(),
  };
  let message = app.message().map(|m| (m.text.as_str(), m.level));
  draw_footer(frame, chunks[2], &parts, message);

  app.render_overlays(frame, chunks[1]);
}

/// Clamp the highlighted row into `0..len`
pub fn ensure_valid_selection(state: &mut TableState, len: usize) {
  if len == 0 {
    state.select(None);
  } else {
    match state.selected() {
      Some(i) if i >= len => state.select(Some(len - 1)),
      None => state.select(Some(0)),
      _ => {}
    }
  }
}
