use jobdesk::cache::Freshness;
use ratatui::prelude::*;
use ratatui::widgets::Paragraph;

/// Draw the header bar with title, endpoint, sync state and shortcuts
pub fn draw_header(frame: &mut Frame, area: Rect, title: &str, endpoint: &str, freshness: Freshness) {
  let (sync_label, sync_color) = sync_indicator(freshness);

  let mut spans = vec![
    Span::styled(format!(" {} ", title), Style::default().fg(Color::Cyan).bold()),
    Span::styled("│", Style::default().fg(Color::DarkGray)),
    Span::styled(
      format!(" {} ", extract_host(endpoint)),
      Style::default().fg(Color::White),
    ),
    Span::styled("│", Style::default().fg(Color::DarkGray)),
    Span::styled(format!(" {} ", sync_label), Style::default().fg(sync_color)),
    Span::raw(" "),
  ];

  for (key, label) in [
    ("<:>", "command"),
    ("</>", "filter"),
    ("<m>", "mark"),
    ("<d>", "delete"),
    ("<r>", "refresh"),
    ("<q>", "quit"),
  ] {
    spans.push(Span::raw("  "));
    spans.push(Span::styled(key, Style::default().fg(Color::Cyan)));
    spans.push(Span::styled(
      format!(" {}", label),
      Style::default().fg(Color::DarkGray),
    ));
  }

  let paragraph = Paragraph::new(Line::from(spans)).style(Style::default().bg(Color::Black));

  frame.render_widget(paragraph, area);
}

fn sync_indicator(freshness: Freshness) -> (&'static str, Color) {
  match freshness {
    Freshness::Fresh => ("synced", Color::Green),
    Freshness::Stale => ("stale", Color::Yellow),
    Freshness::Fetching => ("syncing...", Color::Yellow),
    Freshness::Errored => ("offline", Color::Red),
  }
}

/// Host and port of the endpoint URL
fn extract_host(url: &str) -> &str {
  url
    .strip_prefix("https://")
    .or_else(|| url.strip_prefix("http://"))
    .unwrap_or(url)
    .split('/')
    .next()
    .unwrap_or(url)
}
