use crate::api::client::ApiClient;
use crate::query::{CacheKey, Query, QueryCache, QueryStatus};
use crate::resources::{field_text, FieldKind, Record};
use crate::ui::view::{View, ViewAction};
use crate::ui::{short_date, truncate};
use crossterm::event::{KeyCode, KeyEvent};
use ratatui::prelude::*;
use ratatui::widgets::{Block, Borders, Paragraph, Wrap};

/// Read-only detail screen for a single record, fetched by id.
pub struct RecordDetailView<R: Record> {
  id: String,
  query: Query<R>,
}

impl<R: Record> RecordDetailView<R> {
  pub fn new(api: ApiClient, cache: QueryCache, id: String) -> Self {
    let resource = R::resource();
    let key = CacheKey::new(resource.get_op, &id);
    let query = {
      let id = id.clone();
      Query::new(cache, key, vec![resource.tag], move || {
        let api = api.clone();
        let id = id.clone();
        async move { api.get_one::<R>(resource.path, &id).await }
      })
    };
    query.fetch();
    Self { id, query }
  }
}

impl<R: Record> View for RecordDetailView<R> {
  fn handle_key(&mut self, key: KeyEvent) -> ViewAction {
    match key.code {
      KeyCode::Char('r') => self.query.refetch(),
      KeyCode::Char('q') | KeyCode::Esc => return ViewAction::Pop,
      _ => {}
    }
    ViewAction::None
  }

  fn render(&mut self, frame: &mut Frame, area: Rect) {
    let resource = R::resource();
    let snapshot = self.query.snapshot();

    let title = match snapshot.status {
      QueryStatus::Loading if snapshot.data.is_none() => {
        format!(" {} {} (loading...) ", resource.title, self.id)
      }
      QueryStatus::Error => format!(" {} {} (error) ", resource.title, self.id),
      _ => format!(" {} {} ", resource.title, self.id),
    };
    let block = Block::default()
      .title(title)
      .title_alignment(Alignment::Center)
      .borders(Borders::ALL)
      .border_style(Style::default().fg(Color::Blue));

    let Some(record) = snapshot.data else {
      let content = match &snapshot.error {
        Some(error) => format!("Failed to load: {}. Press 'r' to retry.", error),
        None => "Loading...".to_string(),
      };
      let paragraph = Paragraph::new(content)
        .block(block)
        .style(Style::default().fg(Color::DarkGray));
      frame.render_widget(paragraph, area);
      return;
    };

    let value = serde_json::to_value(record.as_ref()).unwrap_or_default();
    let label_width = resource
      .fields
      .iter()
      .map(|field| field.label.len())
      .max()
      .unwrap_or(0);

    let mut lines = Vec::with_capacity(resource.fields.len());
    for field in resource.fields {
      let raw = field_text(&value, field.key);
      let text = match field.kind {
        FieldKind::Secret => "*".repeat(raw.chars().count().min(12)),
        _ if field.key == "date" || field.key == "eventDate" => short_date(&raw),
        _ => truncate(&raw, 64),
      };
      lines.push(Line::from(vec![
        Span::styled(
          format!(" {:>width$}: ", field.label, width = label_width),
          Style::default().fg(Color::Cyan),
        ),
        Span::raw(text),
      ]));
    }

    let paragraph = Paragraph::new(lines).block(block).wrap(Wrap { trim: false });
    frame.render_widget(paragraph, area);
  }

  fn breadcrumb_label(&self) -> String {
    format!("{} {}", R::resource().title, self.id)
  }

  fn tick(&mut self) {
    self.query.poll();
  }

  fn hint(&self) -> &'static str {
    "r:refresh  q:back"
  }
}
