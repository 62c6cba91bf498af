use crate::commands::Invocation;
use crate::event::{Event, EventHandler};
use crate::ui;
use crate::ui::components::{CommandInput, ConfirmDelete, FilterEvent, FilterInput, KeyResult, StatusPicker};
use crate::ui::renderfns::MessageLevel;
use color_eyre::Result;
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use crossterm::terminal::{
  disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen,
};
use crossterm::ExecutableCommand;
use jobdesk::cache::{CacheSnapshot, Freshness, Subscription};
use jobdesk::config::Config;
use jobdesk::selection::SelectionStore;
use jobdesk::vacancy::listing::{ListingView, SortColumn};
use jobdesk::vacancy::{
  Mutation, MutationGateway, MutationOutcome, VacancyCache, VacancyClient, VacancyQuery,
  VacancyRecord,
};
use jobdesk::SyncError;
use ratatui::prelude::*;
use ratatui::widgets::TableState;
use std::io::stdout;
use std::time::{Duration, Instant};
use tokio::sync::mpsc;
use tracing::{debug, info};

const KEY: VacancyQuery = VacancyQuery::AllVacancies;
const MESSAGE_TTL: Duration = Duration::from_secs(4);

/// Transient footer message
#[derive(Debug, Clone)]
pub struct Message {
  pub text: String,
  pub level: MessageLevel,
  shown_at: Instant,
}

/// Main application state
pub struct App {
  config: Config,
  cache: VacancyCache,
  gateway: MutationGateway<VacancyClient>,
  selection: SelectionStore,

  /// Keeps the listing subscribed; dropping it cancels background fetches
  subscription: Option<Subscription<VacancyQuery, Vec<VacancyRecord>>>,
  snapshot: CacheSnapshot<Vec<VacancyRecord>>,

  listing: ListingView,
  table_state: TableState,

  filter: FilterInput,
  command: CommandInput,
  picker: StatusPicker,
  confirm: ConfirmDelete,

  message: Option<Message>,
  /// Mutations sent but not yet acknowledged
  pending_mutations: usize,

  /// Event sender for async tasks
  event_tx: mpsc::UnboundedSender<Event>,

  should_quit: bool,
}

impl App {
  pub fn new(
    config: Config,
    cache: VacancyCache,
    gateway: MutationGateway<VacancyClient>,
    selection: SelectionStore,
  ) -> Self {
    let (tx, _rx) = mpsc::unbounded_channel();
    let snapshot = cache.read(&KEY);

    Self {
      config,
      cache,
      gateway,
      selection,
      subscription: None,
      snapshot,
      listing: ListingView::new(),
      table_state: TableState::default(),
      filter: FilterInput::new(),
      command: CommandInput::new(),
      picker: StatusPicker::new(),
      confirm: ConfirmDelete::new(),
      message: None,
      pending_mutations: 0,
      event_tx: tx,
      should_quit: false,
    }
  }

  pub async fn run(&mut self) -> Result<()> {
    enable_raw_mode()?;
    stdout().execute(EnterAlternateScreen)?;
    let mut terminal = Terminal::new(CrosstermBackend::new(stdout()))?;

    let mut events = EventHandler::new(Duration::from_millis(250));
    self.mount(events.sender());

    let result = self.event_loop(&mut terminal, &mut events).await;

    // Unsubscribing cancels a fetch nobody will see
    self.subscription = None;

    disable_raw_mode()?;
    stdout().execute(LeaveAlternateScreen)?;

    result
  }

  async fn event_loop(
    &mut self,
    terminal: &mut Terminal<CrosstermBackend<std::io::Stdout>>,
    events: &mut EventHandler,
  ) -> Result<()> {
    while !self.should_quit {
      terminal.draw(|frame| ui::draw(frame, self))?;

      if let Some(event) = events.next().await {
        self.handle_event(event);
      }
    }
    Ok(())
  }

  /// Subscribe the listing to the cache. Subscribing revalidates, so every
  /// mount picks up vacancies captured since the last fetch.
  pub fn mount(&mut self, tx: mpsc::UnboundedSender<Event>) {
    self.event_tx = tx.clone();
    let subscription = self.cache.subscribe(&KEY, move |snapshot| {
      let _ = tx.send(Event::Vacancies(snapshot.clone()));
    });
    self.subscription = Some(subscription);
  }

  pub fn handle_event(&mut self, event: Event) {
    match event {
      Event::Key(key) => self.handle_key(key),
      Event::Tick => self.expire_message(),
      Event::Vacancies(snapshot) => self.apply_snapshot(snapshot),
      Event::Mutated { mutation, result } => self.finish_mutation(mutation, result),
    }
  }

  fn apply_snapshot(&mut self, snapshot: CacheSnapshot<Vec<VacancyRecord>>) {
    debug!(freshness = ?snapshot.freshness, "vacancies updated");
    if let (Freshness::Errored, Some(err)) = (snapshot.freshness, &snapshot.error) {
      self.show_error(format!("Could not load vacancies: {}", err));
    }
    self.snapshot = snapshot;

    // The selection is a snapshot taken on Enter; refetches never touch it.
    let len = self.visible_rows().len();
    ui::ensure_valid_selection(&mut self.table_state, len);
  }

  fn handle_key(&mut self, key: KeyEvent) {
    if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
      self.should_quit = true;
      return;
    }

    match self.confirm.handle_key(key) {
      KeyResult::Event(uid) => return self.spawn_mutation(Mutation::Delete { uid }),
      KeyResult::Handled => return,
      KeyResult::NotHandled => {}
    }

    match self.picker.handle_key(key) {
      KeyResult::Event((uid, status)) => return self.spawn_mutation(Mutation::Update { uid, status }),
      KeyResult::Handled => return,
      KeyResult::NotHandled => {}
    }

    match self.filter.handle_key(key) {
      KeyResult::Event(FilterEvent::Changed(text)) => {
        self.listing.company_filter = text;
        self.table_state.select(Some(0));
        return;
      }
      KeyResult::Event(FilterEvent::Submitted) | KeyResult::Handled => return,
      KeyResult::NotHandled => {}
    }

    match self.command.handle_key(key) {
      KeyResult::Event(invocation) => return self.execute_command(invocation),
      KeyResult::Handled => return,
      KeyResult::NotHandled => {}
    }

    self.handle_normal_key(key);
  }

  fn handle_normal_key(&mut self, key: KeyEvent) {
    let len = self.visible_rows().len();
    match key.code {
      KeyCode::Char('q') => self.should_quit = true,

      KeyCode::Char('j') | KeyCode::Down => {
        if len > 0 {
          let next = self.table_state.selected().map_or(0, |i| (i + 1).min(len - 1));
          self.table_state.select(Some(next));
        }
      }
      KeyCode::Char('k') | KeyCode::Up => {
        let prev = self.table_state.selected().map_or(0, |i| i.saturating_sub(1));
        self.table_state.select(Some(prev));
      }
      KeyCode::Char('g') | KeyCode::Home => self.table_state.select(Some(0)),
      KeyCode::Char('G') | KeyCode::End => {
        self.table_state.select(Some(len.saturating_sub(1)));
      }

      KeyCode::Enter => {
        if let Some(record) = self.highlighted() {
          self.selection.select(Some(record));
        }
      }
      KeyCode::Esc => self.selection.clear(),

      KeyCode::Char('/') => self.filter.activate(&self.listing.company_filter),
      KeyCode::Char('s') => self.set_sort(self.listing.sort.next()),
      KeyCode::Char('S') => self.listing.descending = !self.listing.descending,

      KeyCode::Char('m') => {
        if let Some(record) = self.highlighted() {
          self.picker.show(record.uid, record.status);
        }
      }
      KeyCode::Char('d') => {
        if let Some(record) = self.highlighted() {
          let label = format!("{}: {}", record.company, record.title);
          self.confirm.show(record.uid, label);
        }
      }
      KeyCode::Char('r') => self.refresh(),
      _ => {}
    }
  }

  fn execute_command(&mut self, invocation: Invocation) {
    match invocation.name.as_str() {
      "refresh" => self.refresh(),
      "sort" if invocation.argument.is_empty() => self.set_sort(self.listing.sort.next()),
      "sort" => match invocation.argument.parse::<SortColumn>() {
        Ok(column) => self.listing.toggle_sort(column),
        Err(e) => self.show_error(e),
      },
      "filter" => {
        self.listing.company_filter = invocation.argument;
        self.table_state.select(Some(0));
      }
      "unselect" => self.selection.clear(),
      "quit" => self.should_quit = true,
      "" => {}
      other => self.show_error(format!("Unknown command: {}", other)),
    }
  }

  fn set_sort(&mut self, column: SortColumn) {
    self.listing.sort = column;
    self.listing.descending = column == SortColumn::Created;
  }

  fn refresh(&mut self) {
    info!("manual refresh");
    self.cache.invalidate(&KEY);
  }

  fn spawn_mutation(&mut self, mutation: Mutation) {
    info!(uid = mutation.uid(), action = %mutation, "sending mutation");
    self.pending_mutations += 1;

    let gateway = self.gateway.clone();
    let tx = self.event_tx.clone();
    tokio::spawn(async move {
      let result = gateway.mutate(mutation.clone()).await;
      let _ = tx.send(Event::Mutated { mutation, result });
    });
  }

  fn finish_mutation(&mut self, mutation: Mutation, result: Result<MutationOutcome, SyncError>) {
    self.pending_mutations = self.pending_mutations.saturating_sub(1);
    match result {
      Ok(MutationOutcome::Updated(ack)) => self.show_info(format!("Marked as {}", ack.status)),
      Ok(MutationOutcome::Deleted { uid, removed }) => {
        if self.selection.current().is_some_and(|r| r.uid == uid) {
          self.selection.clear();
        }
        if removed {
          self.show_info("Vacancy deleted".to_string());
        } else {
          self.show_info("Vacancy was already gone".to_string());
        }
      }
      Err(e) => self.show_error(format!("Could not {}: {}", mutation, e)),
    }
  }

  fn show_info(&mut self, text: String) {
    self.set_message(text, MessageLevel::Info);
  }

  fn show_error(&mut self, text: String) {
    self.set_message(text, MessageLevel::Error);
  }

  fn set_message(&mut self, text: String, level: MessageLevel) {
    self.message = Some(Message {
      text,
      level,
      shown_at: Instant::now(),
    });
  }

  fn expire_message(&mut self) {
    if self
      .message
      .as_ref()
      .is_some_and(|m| m.shown_at.elapsed() >= MESSAGE_TTL)
    {
      self.message = None;
    }
  }

  fn highlighted(&self) -> Option<VacancyRecord> {
    let idx = self.table_state.selected()?;
    self.visible_rows().get(idx).map(|r| (*r).clone())
  }

  // Accessors for UI rendering

  /// Filtered and sorted rows of the current snapshot
  pub fn visible_rows(&self) -> Vec<&VacancyRecord> {
    self
      .snapshot
      .data()
      .map(|records| self.listing.apply(records))
      .unwrap_or_default()
  }

  pub fn snapshot(&self) -> &CacheSnapshot<Vec<VacancyRecord>> {
    &self.snapshot
  }

  pub fn listing(&self) -> &ListingView {
    &self.listing
  }

  pub fn selected(&self) -> Option<&VacancyRecord> {
    self.selection.state().record()
  }

  pub fn title(&self) -> String {
    self.config.display_title()
  }

  pub fn endpoint(&self) -> &str {
    &self.config.remote.endpoint
  }

  pub fn message(&self) -> Option<&Message> {
    self.message.as_ref()
  }

  /// Footer context: counts, filter, sort and pending writes
  pub fn status_parts(&self) -> Vec<String> {
    let total = self.snapshot.data().map_or(0, Vec::len);
    let mut parts = vec![format!("{} of {} vacancies", self.visible_rows().len(), total)];
    if !self.listing.company_filter.is_empty() {
      parts.push(format!("filter: {}", self.listing.company_filter));
    }
    let direction = if self.listing.descending { "desc" } else { "asc" };
    parts.push(format!("sort: {} {}", self.listing.sort, direction));
    if self.pending_mutations > 0 {
      parts.push(format!("saving {}...", self.pending_mutations));
    }
    parts
  }

  /// Key help for whichever overlay has focus
  pub fn overlay_hint(&self) -> Option<&'static str> {
    if self.confirm.is_active() {
      Some("y: delete   n/Esc: keep")
    } else if self.picker.is_active() {
      Some("j/k: move   Enter: mark   Esc: cancel")
    } else if self.filter.is_active() {
      Some("Enter: keep filter   Esc: clear filter")
    } else if self.command.is_active() {
      Some("Tab: next suggestion   Enter: run   Esc: cancel")
    } else {
      None
    }
  }

  pub fn render_overlays(&self, frame: &mut Frame, area: Rect) {
    self.filter.render_overlay(frame, area);
    self.command.render_overlay(frame, area);
    self.picker.render_overlay(frame, area);
    self.confirm.render_overlay(frame, area);
  }

  pub fn table_state(&mut self) -> &mut TableState {
    &mut self.table_state
  }
}
