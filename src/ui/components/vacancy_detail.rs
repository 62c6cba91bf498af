use crate::ui::renderfns::{format_relative, status_color};
use chrono::{DateTime, Local, Utc};
use jobdesk::vacancy::VacancyRecord;
use ratatui::prelude::*;
use ratatui::widgets::{Block, Borders, Paragraph, Wrap};

/// Draw the selected vacancy. Fields missing after a session restore show
/// as "-" until the vacancy is selected again.
pub fn draw_vacancy_detail(frame: &mut Frame, area: Rect, vacancy: &VacancyRecord) {
  let block = Block::default()
    .title(format!(" {} ", vacancy.company))
    .title_alignment(Alignment::Center)
    .borders(Borders::ALL)
    .border_style(Style::default().fg(Color::Green));

  let inner = block.inner(area);
  frame.render_widget(block, area);

  let chunks = Layout::default()
    .direction(Direction::Vertical)
    .constraints([
      Constraint::Length(9), // Fields
      Constraint::Length(1), // Separator
      Constraint::Min(1),    // Description
    ])
    .split(inner);

  let now = Local::now().naive_local();
  let fields = vec![
    Line::from(Span::styled(&vacancy.title, Style::default().bold())),
    field_line("Status", vacancy.status.as_str(), status_color(vacancy.status)),
    field_line("Location", or_dash(vacancy.location.as_deref()), Color::White),
    field_line("Workplace", or_dash(vacancy.workplace_type.as_deref()), Color::White),
    field_line("Contract", or_dash(vacancy.contract_type.as_deref()), Color::White),
    field_line("Level", or_dash(vacancy.experience_level.as_deref()), Color::White),
    field_line("Created", &relative(vacancy.date_created, now), Color::White),
    field_line("Posting", or_dash(Some(&vacancy.url)), Color::Blue),
    field_line("Company", or_dash(Some(&vacancy.company_url)), Color::Blue),
  ];
  frame.render_widget(Paragraph::new(fields), chunks[0]);

  let sep = Paragraph::new("─".repeat(chunks[1].width as usize))
    .style(Style::default().fg(Color::DarkGray));
  frame.render_widget(sep, chunks[1]);

  let desc = vacancy.description.as_deref().unwrap_or("No description");
  let desc_para = Paragraph::new(desc).wrap(Wrap { trim: true });
  frame.render_widget(desc_para, chunks[2]);
}

fn field_line<'a>(label: &'a str, value: &str, color: Color) -> Line<'a> {
  Line::from(vec![
    Span::styled(format!("{:<10}", label), Style::default().fg(Color::DarkGray)),
    Span::styled(value.to_string(), Style::default().fg(color)),
  ])
}

fn or_dash(value: Option<&str>) -> &str {
  match value {
    Some(v) if !v.is_empty() => v,
    _ => "-",
  }
}

fn relative(at: Option<DateTime<Utc>>, now: chrono::NaiveDateTime) -> String {
  at.map(|dt| format_relative(dt.with_timezone(&Local).naive_local(), now))
    .unwrap_or_else(|| "-".to_string())
}
