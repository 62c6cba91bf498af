use ratatui::prelude::*;
use ratatui::widgets::Paragraph;

/// Severity of a footer message
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessageLevel {
  Info,
  Error,
}

/// Draw the footer: a transient message if there is one, else listing context
pub fn draw_footer(frame: &mut Frame, area: Rect, context: &[String], message: Option<(&str, MessageLevel)>) {
  let line = match message {
    Some((text, level)) => {
      let color = match level {
        MessageLevel::Info => Color::Green,
        MessageLevel::Error => Color::Red,
      };
      Line::from(vec![
        Span::raw(" "),
        Span::styled(text.to_string(), Style::default().fg(color).bold()),
      ])
    }
    None => {
      let mut spans = vec![Span::raw(" ")];
      for (i, part) in context.iter().enumerate() {
        if i > 0 {
          spans.push(Span::styled(" │ ", Style::default().fg(Color::DarkGray)));
        }
        spans.push(Span::styled(part.clone(), Style::default().fg(Color::White)));
      }
      Line::from(spans)
    }
  };

  let paragraph = Paragraph::new(line).style(Style::default().bg(Color::Black));

  frame.render_widget(paragraph, area);
}
