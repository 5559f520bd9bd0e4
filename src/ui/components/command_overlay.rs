use crate::commands::Command;
use ratatui::prelude::*;
use ratatui::widgets::{Block, Borders, Clear, Paragraph};

/// Render the command palette overlay: the typed input plus autocomplete
/// suggestions with the selected one highlighted.
pub fn render_command_overlay(
  frame: &mut Frame,
  area: Rect,
  input: &str,
  suggestions: &[&'static Command],
  selected: usize,
) {
  let height = (suggestions.len() as u16 + 3).clamp(3, 10).min(area.height);
  let width = (area.width * 50 / 100).clamp(30, 50).min(area.width);
  let overlay = Rect::new(area.x + 1, area.y + 1, width, height);

  frame.render_widget(Clear, overlay);

  let block = Block::default()
    .borders(Borders::ALL)
    .border_style(Style::default().fg(Color::Magenta))
    .title(" Command ");
  let inner = block.inner(overlay);
  frame.render_widget(block, overlay);

  if inner.height == 0 {
    return;
  }

  let mut lines = vec![Line::from(vec![
    Span::styled(":", Style::default().fg(Color::Magenta)),
    Span::raw(input),
    Span::styled("_", Style::default().fg(Color::Magenta)),
  ])];

  for (index, command) in suggestions.iter().enumerate() {
    let style = if index == selected {
      Style::default().fg(Color::Black).bg(Color::Magenta)
    } else {
      Style::default().fg(Color::White)
    };
    lines.push(Line::from(vec![
      Span::styled(format!(" {:<10}", command.name), style),
      Span::styled(
        command.description,
        Style::default().fg(Color::DarkGray),
      ),
    ]));
  }

  frame.render_widget(Paragraph::new(lines), inner);
}
