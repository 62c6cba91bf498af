use crate::ui::renderfns::{format_relative, status_color, truncate};
use chrono::Local;
use jobdesk::cache::CacheSnapshot;
use jobdesk::vacancy::listing::{ListingView, SortColumn};
use jobdesk::vacancy::VacancyRecord;
use ratatui::prelude::*;
use ratatui::widgets::{Block, Borders, Cell, Paragraph, Row, Table, TableState};

/// Draw the vacancy listing. `rows` are already filtered and sorted.
pub fn draw_vacancy_table(
  frame: &mut Frame,
  area: Rect,
  snapshot: &CacheSnapshot<Vec<VacancyRecord>>,
  rows: &[&VacancyRecord],
  listing: &ListingView,
  selected_uid: Option<&str>,
  state: &mut TableState,
) {
  let title = if snapshot.is_pending() {
    " Vacancies (loading...) ".to_string()
  } else if let Some(err) = &snapshot.error {
    format!(" Vacancies ({}) (error: {}) ", rows.len(), err)
  } else {
    format!(" Vacancies ({}) ", rows.len())
  };

  let block = Block::default()
    .title(title)
    .title_alignment(Alignment::Center)
    .borders(Borders::ALL)
    .border_style(Style::default().fg(Color::Blue));

  if rows.is_empty() {
    let content = if snapshot.is_pending() {
      "Loading vacancies..."
    } else if snapshot.is_errored() && snapshot.value.is_none() {
      "Failed to load vacancies. Press 'r' to retry."
    } else if !listing.company_filter.is_empty() {
      "No vacancies match the filter."
    } else {
      "No vacancies captured yet."
    };
    let paragraph = Paragraph::new(content)
      .block(block)
      .style(Style::default().fg(Color::DarkGray));
    frame.render_widget(paragraph, area);
    return;
  }

  let header_cells = [
    (SortColumn::Company, "Company"),
    (SortColumn::Title, "Title"),
    (SortColumn::Location, "Location"),
    (SortColumn::Status, "Status"),
    (SortColumn::Created, "Created"),
  ]
  .into_iter()
  .map(|(column, label)| {
    if column == listing.sort {
      let arrow = if listing.descending { "▼" } else { "▲" };
      Cell::from(format!("{} {}", label, arrow)).style(Style::default().fg(Color::Yellow).bold())
    } else {
      Cell::from(label).style(Style::default().fg(Color::DarkGray).bold())
    }
  });
  let header = Row::new(header_cells).height(1);

  let now = Local::now().naive_local();
  let table_rows: Vec<Row> = rows
    .iter()
    .map(|vacancy| {
      let created = vacancy
        .date_created
        .map(|dt| format_relative(dt.with_timezone(&Local).naive_local(), now))
        .unwrap_or_default();
      let marker = if selected_uid == Some(vacancy.uid.as_str()) {
        "● "
      } else {
        "  "
      };

      Row::new(vec![
        Cell::from(Line::from(vec![
          Span::styled(marker, Style::default().fg(Color::Green)),
          Span::styled(truncate(&vacancy.company, 24), Style::default().fg(Color::Cyan)),
        ])),
        Cell::from(truncate(&vacancy.title, 48)),
        Cell::from(truncate(vacancy.location.as_deref().unwrap_or("-"), 20)),
        Cell::from(vacancy.status.as_str()).style(Style::default().fg(status_color(vacancy.status))),
        Cell::from(created).style(Style::default().fg(Color::DarkGray)),
      ])
    })
    .collect();

  let widths = [
    Constraint::Length(28),
    Constraint::Min(20),
    Constraint::Length(20),
    Constraint::Length(13),
    Constraint::Length(22),
  ];

  let table = Table::new(table_rows, widths)
    .header(header)
    .block(block)
    .row_highlight_style(
      Style::default()
        .bg(Color::DarkGray)
        .add_modifier(Modifier::BOLD),
    )
    .highlight_symbol("> ");

  frame.render_stateful_widget(table, area, state);
}
