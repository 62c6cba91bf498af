use chrono::NaiveDateTime;
use jobdesk::vacancy::VacancyStatus;
use ratatui::prelude::Color;

/// Truncate a string to at most `max_len` characters, adding "..." if truncated
pub fn truncate(s: &str, max_len: usize) -> String {
  if s.chars().count() <= max_len {
    s.to_string()
  } else {
    let kept: String = s.chars().take(max_len.saturating_sub(3)).collect();
    format!("{}...", kept)
  }
}

/// Display color for a vacancy status
pub fn status_color(status: VacancyStatus) -> Color {
  match status {
    VacancyStatus::Created => Color::White,
    VacancyStatus::Applied => Color::Cyan,
    VacancyStatus::Interviewing => Color::Yellow,
    VacancyStatus::Rejected => Color::Red,
    VacancyStatus::Withdrawn => Color::DarkGray,
  }
}

/// Calendar-relative rendering of a timestamp:
/// "14:05", "Yesterday at 14:05", "Last Monday at 14:05", "Tomorrow at 14:05",
/// "Friday at 14:05", otherwise "dd/mm/yyyy".
pub fn format_relative(at: NaiveDateTime, now: NaiveDateTime) -> String {
  let days = (at.date() - now.date()).num_days();
  let time = at.format("%H:%M");
  match days {
    -6..=-2 => format!("Last {} at {}", at.format("%A"), time),
    -1 => format!("Yesterday at {}", time),
    0 => time.to_string(),
    1 => format!("Tomorrow at {}", time),
    2..=6 => format!("{} at {}", at.format("%A"), time),
    _ => at.format("%d/%m/%Y").to_string(),
  }
}
