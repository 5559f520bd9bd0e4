use crate::api::client::ApiClient;
use crate::api::types::{Page, PageParams};
use crate::query::{CacheKey, Mutation, MutationState, Query, QueryCache, QueryStatus};
use crate::resources::{build_payload, field_text, ColumnKind, Record};
use crate::table::TableController;
use crate::ui::components::{
  FormEvent, FormMode, FormPanel, KeyResult, SearchEvent, SearchInput,
};
use crate::ui::view::{View, ViewAction};
use crate::ui::views::RecordDetailView;
use crate::ui::{clamp_selection, short_date, truncate};
use crossterm::event::{KeyCode, KeyEvent};
use ratatui::prelude::*;
use ratatui::widgets::{Block, Borders, Cell, Paragraph, Row, Table, TableState};

/// Generic paginated table screen, instantiated per resource configuration.
///
/// One read query (the current page) plus two mutations (save from the
/// form panel, delete from the row actions). Parameter changes rebind the
/// query to the new cache key; the grid always shows exactly what the
/// server sent for those parameters and is never patched locally — writes
/// invalidate the resource tag and the authoritative page is refetched.
pub struct ResourceTableView<R: Record> {
  api: ApiClient,
  cache: QueryCache,
  controller: TableController,
  query: Query<Page<R>>,
  table_state: TableState,
  search: SearchInput,
  form: FormPanel,
  save: Mutation<()>,
  remove: Mutation<()>,
  /// Row-action errors (delete failures and the like)
  alert: Option<String>,
}

impl<R: Record> ResourceTableView<R> {
  pub fn new(api: ApiClient, cache: QueryCache, page_size: u64) -> Self {
    let controller = TableController::new(page_size);
    let query = Self::build_query(&api, &cache, controller.params());
    query.fetch();

    let resource = R::resource();
    let mut table_state = TableState::default();
    table_state.select(Some(0));

    Self {
      save: Mutation::new(cache.clone(), vec![resource.tag]),
      remove: Mutation::new(cache.clone(), vec![resource.tag]),
      form: FormPanel::new(resource),
      api,
      cache,
      controller,
      query,
      table_state,
      search: SearchInput::new(),
      alert: None,
    }
  }

  fn build_query(api: &ApiClient, cache: &QueryCache, params: PageParams) -> Query<Page<R>> {
    let resource = R::resource();
    let key = CacheKey::new(resource.list_op, &params);
    let api = api.clone();
    Query::new(cache.clone(), key, vec![resource.tag], move || {
      let api = api.clone();
      let params = params.clone();
      async move { api.list::<R>(resource.path, &params).await }
    })
  }

  /// Re-issue the read with the controller's current parameters.
  fn requery(&mut self) {
    self.query = Self::build_query(&self.api, &self.cache, self.controller.params());
    self.query.fetch();
    self.table_state.select(Some(0));
  }

  fn rows(&self) -> Vec<R> {
    self
      .query
      .data()
      .map(|page| page.items.clone())
      .unwrap_or_default()
  }

  fn row_count(&self) -> usize {
    self.query.data().map(|page| page.items.len()).unwrap_or(0)
  }

  fn total(&self) -> u64 {
    self.query.data().map(|page| page.total).unwrap_or(0)
  }

  fn selected_record(&self) -> Option<R> {
    let data = self.query.data()?;
    let index = self.table_state.selected()?;
    data.items.get(index).cloned()
  }

  fn move_selection(&mut self, delta: i32) {
    let len = self.row_count();
    if len == 0 {
      return;
    }
    let current = self.table_state.selected().unwrap_or(0) as i32;
    let next = (current + delta).clamp(0, len as i32 - 1) as usize;
    self.table_state.select(Some(next));
  }

  fn run_save(&mut self, mode: FormMode, values: Vec<String>) {
    let resource = R::resource();
    let payload = build_payload(resource.fields, &values);
    let api = self.api.clone();
    match mode {
      FormMode::Create => {
        self
          .save
          .run(async move { api.create(resource.path, &payload).await });
      }
      FormMode::Update { id } => {
        self
          .save
          .run(async move { api.update(resource.path, &id, &payload).await });
      }
    }
  }

  fn run_delete(&mut self, id: String) {
    if self.remove.is_running() {
      return;
    }
    let resource = R::resource();
    let api = self.api.clone();
    self
      .remove
      .run(async move { api.delete(resource.path, &id).await });
  }

  fn poll_mutations(&mut self) {
    if self.save.poll() {
      let state = self.save.state().clone();
      self.save.reset();
      match state {
        MutationState::Success(()) => {
          self.form.complete_ok();
          self.alert = None;
        }
        MutationState::Error(error) => {
          if !error.is_duplicate_id() {
            tracing::warn!(error = %error, "save failed");
          }
          self.form.complete_err(error.message().to_string());
        }
        _ => {}
      }
    }

    if self.remove.poll() {
      let state = self.remove.state().clone();
      self.remove.reset();
      match state {
        MutationState::Success(()) => {
          self.alert = None;
        }
        MutationState::Error(error) => {
          // The row stays as served; only the alert changes
          self.alert = Some(format!("delete failed: {}", error.message()));
        }
        _ => {}
      }
    }
  }

  fn render_table(&mut self, frame: &mut Frame, area: Rect) {
    let resource = R::resource();
    let snapshot = self.query.snapshot();
    let rows = self.rows();
    clamp_selection(&mut self.table_state, rows.len());

    let title = match snapshot.status {
      QueryStatus::Loading if rows.is_empty() => format!(" {} (loading...) ", resource.title),
      QueryStatus::Error => format!(" {} (error) ", resource.title),
      _ if snapshot.is_loading() || snapshot.stale => {
        format!(" {} (refreshing...) ", resource.title)
      }
      _ => format!(" {} ({} of {}) ", resource.title, rows.len(), self.total()),
    };

    let block = Block::default()
      .title(title)
      .title_alignment(Alignment::Center)
      .borders(Borders::ALL)
      .border_style(Style::default().fg(Color::Blue));

    if rows.is_empty() {
      let content = match &snapshot.error {
        Some(error) => format!("Failed to load: {}. Press 'r' to retry.", error),
        None if snapshot.is_loading() => "Loading...".to_string(),
        None => format!("No {} found.", resource.title.to_lowercase()),
      };
      let paragraph = Paragraph::new(content)
        .block(block)
        .style(Style::default().fg(Color::DarkGray));
      frame.render_widget(paragraph, area);
      return;
    }

    let mut header_cells = vec![Cell::from("#")];
    for column in resource.columns {
      let marker = match self.controller.sort() {
        Some(sort) if sort.field == column.field => match sort.direction {
          crate::api::types::SortDirection::Asc => " ^",
          crate::api::types::SortDirection::Desc => " v",
        },
        _ => "",
      };
      header_cells.push(Cell::from(format!("{}{}", column.title, marker)));
    }
    let header = Row::new(header_cells)
      .style(Style::default().fg(Color::Cyan).bold())
      .bottom_margin(0);

    let table_rows: Vec<Row> = rows
      .iter()
      .enumerate()
      .map(|(offset, record)| {
        let value = serde_json::to_value(record).unwrap_or_default();
        let mut cells = vec![Cell::from(self.controller.row_number(offset).to_string())];
        for column in resource.columns {
          let raw = field_text(&value, column.field);
          let text = match column.kind {
            ColumnKind::Date => short_date(&raw),
            _ => truncate(&raw, 40),
          };
          cells.push(Cell::from(text));
        }
        Row::new(cells)
      })
      .collect();

    let mut widths = vec![Constraint::Length(5)];
    widths.extend(
      resource
        .columns
        .iter()
        .map(|column| Constraint::Fill(column.width)),
    );

    let table = Table::new(table_rows, widths)
      .header(header)
      .block(block)
      .row_highlight_style(
        Style::default()
          .bg(Color::DarkGray)
          .add_modifier(Modifier::BOLD),
      )
      .highlight_symbol("> ");

    frame.render_stateful_widget(table, area, &mut self.table_state);
  }

  fn render_footer(&self, frame: &mut Frame, area: Rect) {
    let mut spans = vec![Span::styled(
      format!(
        " page {}/{}  size {}  total {}",
        self.controller.page() + 1,
        self.controller.page_count(self.total()),
        self.controller.page_size(),
        self.total()
      ),
      Style::default().fg(Color::DarkGray),
    )];

    if let Some(sort) = self.controller.sort() {
      spans.push(Span::styled(
        format!("  sort {} {}", sort.field, sort.direction.as_str()),
        Style::default().fg(Color::DarkGray),
      ));
    }
    if !self.controller.search().is_empty() {
      spans.push(Span::styled(
        format!("  search \"{}\"", self.controller.search()),
        Style::default().fg(Color::Cyan),
      ));
    }
    if let Some(alert) = &self.alert {
      spans.push(Span::styled(
        format!("  {}", alert),
        Style::default().fg(Color::Red),
      ));
    }

    frame.render_widget(Paragraph::new(Line::from(spans)), area);
  }
}

impl<R: Record> View for ResourceTableView<R> {
  fn handle_key(&mut self, key: KeyEvent) -> ViewAction {
    // Overlays first: the open one owns the keyboard
    match self.form.handle_key(key) {
      KeyResult::Handled => return ViewAction::None,
      KeyResult::Event(FormEvent::Submitted { mode, values }) => {
        self.run_save(mode, values);
        return ViewAction::None;
      }
      KeyResult::NotHandled => {}
    }

    match self.search.handle_key(key) {
      KeyResult::Handled => return ViewAction::None,
      KeyResult::Event(SearchEvent::Submitted(search)) => {
        if self.controller.submit_search(search) {
          self.requery();
        }
        return ViewAction::None;
      }
      KeyResult::Event(SearchEvent::Cancelled) => return ViewAction::None,
      KeyResult::NotHandled => {}
    }

    match key.code {
      KeyCode::Char('j') | KeyCode::Down => self.move_selection(1),
      KeyCode::Char('k') | KeyCode::Up => self.move_selection(-1),
      KeyCode::Char(']') | KeyCode::Right => {
        let total = self.total();
        if self.controller.next_page(total) {
          self.requery();
        }
      }
      KeyCode::Char('[') | KeyCode::Left => {
        if self.controller.prev_page() {
          self.requery();
        }
      }
      KeyCode::Char('z') => {
        if self.controller.cycle_page_size() {
          self.requery();
        }
      }
      KeyCode::Char('s') => {
        if self.controller.cycle_sort(R::resource().columns) {
          self.requery();
        }
      }
      KeyCode::Char('r') => self.query.refetch(),
      KeyCode::Char('a') => self.form.open_create(),
      KeyCode::Char('u') => {
        if let Some(record) = self.selected_record() {
          let value = serde_json::to_value(&record).unwrap_or_default();
          self.form.open_update(record.id().to_string(), &value);
        }
      }
      KeyCode::Char('d') => {
        if let Some(record) = self.selected_record() {
          self.run_delete(record.id().to_string());
        }
      }
      KeyCode::Enter => {
        if let Some(record) = self.selected_record() {
          return ViewAction::Push(Box::new(RecordDetailView::<R>::new(
            self.api.clone(),
            self.cache.clone(),
            record.id().to_string(),
          )));
        }
      }
      KeyCode::Char('q') | KeyCode::Esc => return ViewAction::Pop,
      _ => {}
    }
    ViewAction::None
  }

  fn render(&mut self, frame: &mut Frame, area: Rect) {
    let chunks = Layout::default()
      .direction(Direction::Vertical)
      .constraints([Constraint::Min(3), Constraint::Length(1)])
      .split(area);

    self.render_table(frame, chunks[0]);
    self.render_footer(frame, chunks[1]);

    // Overlays draw over the grid
    self.search.render_overlay(frame, chunks[0]);
    self.form.render_overlay(frame, area);
  }

  fn breadcrumb_label(&self) -> String {
    R::resource().title.to_string()
  }

  fn tick(&mut self) {
    self.query.poll();
    self.poll_mutations();
  }

  fn wants_input(&self) -> bool {
    self.form.is_open() || self.search.is_active()
  }

  fn hint(&self) -> &'static str {
    "a:add  u:update  d:delete  /:search  s:sort  z:size  [/]:page  r:refresh  Enter:detail  q:back"
  }
}
