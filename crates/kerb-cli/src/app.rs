//! Application state machine and event dispatcher.
//!
//! Key handling is synchronous: anything that talks to the store is queued
//! as a [`Task`] and run by the event loop after the next frame is drawn, so
//! a blocking reload can show its indicator before it starts.

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use kerb_core::{
  Error,
  coordinator::{Coordinator, PendingSave, RefreshMode, SavePlan},
  record::Record,
  store::{DeleteOutcome, RecordStore},
  table::{self, Pager},
};
use strum::{Display, EnumIter, IntoEnumIterator};

use crate::form::{Form, FieldKind, load_image};

// ─── Screen state ─────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, Display)]
pub enum Tab {
  #[strum(to_string = "Waste")]
  Waste,
  #[strum(to_string = "Wastewater")]
  Water,
  #[strum(to_string = "Statistics")]
  Stats,
  #[strum(to_string = "Entry form")]
  Form,
}

#[derive(Debug, Clone)]
pub enum Modal {
  ConfirmDelete {
    id:   String,
    name: String,
  },
  ConfirmDuplicate {
    pending:      PendingSave,
    duplicate_of: Record,
  },
  Detail {
    id: String,
  },
}

/// Store work waiting for the event loop.
#[derive(Debug)]
pub enum Task {
  Initialize,
  Reload(RefreshMode),
  CheckConnection,
  Delete { id: String, name: String },
  Submit,
  Commit(PendingSave),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeKind {
  Info,
  Success,
  Warning,
  Error,
}

/// One-line message shown in the status bar.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
  pub kind: NoticeKind,
  pub text: String,
}

/// The rows a table tab shows right now.
#[derive(Debug, Clone)]
pub struct TableView {
  pub rows:          Vec<Record>,
  pub total:         usize,
  pub matched:       usize,
  pub remaining:     usize,
  pub can_load_more: bool,
}

// ─── App ──────────────────────────────────────────────────────────────────────

/// Top-level application state.
pub struct App<S> {
  pub coordinator:   Coordinator<S>,
  pub tab:           Tab,
  /// Search text shared by both table tabs.
  pub query:         String,
  /// Whether the user is typing into the search box.
  pub search_active: bool,
  /// Cursor position within the visible rows.
  pub cursor:        usize,
  pub pager:         Pager,
  pub form:          Form,
  pub modal:         Option<Modal>,
  pub notice:        Option<Notice>,
  queued:            Option<Task>,
}

impl<S: RecordStore> App<S> {
  /// Create an [`App`]; the first event-loop turn connects and loads.
  pub fn new(coordinator: Coordinator<S>) -> Self {
    Self {
      coordinator,
      tab: Tab::Waste,
      query: String::new(),
      search_active: false,
      cursor: 0,
      pager: Pager::default(),
      form: Form::default(),
      modal: None,
      notice: None,
      queued: Some(Task::Initialize),
    }
  }

  // ── Notices ───────────────────────────────────────────────────────────────

  fn notify(&mut self, kind: NoticeKind, text: impl Into<String>) {
    self.notice = Some(Notice {
      kind,
      text: text.into(),
    });
  }

  fn report(&mut self, context: &str, err: &Error) {
    let kind = match err {
      Error::Validation(_) | Error::RefreshAfterWrite(_) => NoticeKind::Warning,
      Error::Store(_) => NoticeKind::Error,
    };
    self.notify(kind, format!("{context}: {err}"));
  }

  // ── Derived views ─────────────────────────────────────────────────────────

  pub fn table_view(&self) -> TableView {
    let records = self.coordinator.records();
    let filtered = table::filter(&records, &self.query);
    let page = self.pager.page(&filtered);
    TableView {
      rows:          page.items.iter().map(|r| (*r).clone()).collect(),
      total:         records.len(),
      matched:       filtered.len(),
      remaining:     page.remaining,
      can_load_more: self.pager.can_load_more(filtered.len()),
    }
  }

  pub fn cursor_record(&self) -> Option<Record> {
    self.table_view().rows.into_iter().nth(self.cursor)
  }

  /// Label for the blocking indicator of the queued task. The event loop
  /// draws one frame with it before the task runs.
  pub fn busy(&self) -> Option<&'static str> {
    match self.queued.as_ref()? {
      Task::Initialize => Some("Connecting…"),
      Task::Reload(RefreshMode::Blocking) => Some("Loading records…"),
      Task::Reload(RefreshMode::Silent) => None,
      Task::CheckConnection => Some("Checking connection…"),
      Task::Delete { .. } => Some("Deleting…"),
      Task::Submit | Task::Commit(_) => Some("Saving…"),
    }
  }

  fn queue(&mut self, task: Task) { self.queued = Some(task); }

  pub fn take_task(&mut self) -> Option<Task> { self.queued.take() }

  fn reset_view(&mut self) {
    self.cursor = 0;
    self.pager.reset();
  }

  fn switch_tab(&mut self, tab: Tab) {
    if self.tab != tab {
      self.tab = tab;
      self.search_active = false;
      self.reset_view();
    }
  }

  // ── Key handling ──────────────────────────────────────────────────────────

  /// Process a key event. Returns `true` to continue, `false` to quit.
  pub fn handle_key(&mut self, key: KeyEvent) -> bool {
    if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c') {
      return false;
    }
    if self.queued.is_some() {
      return true;
    }
    self.notice = None;
    if self.modal.is_some() {
      self.handle_modal_key(key);
      return true;
    }
    if self.search_active {
      self.handle_search_key(key);
      return true;
    }
    match self.tab {
      Tab::Waste | Tab::Water => self.handle_table_key(key),
      Tab::Stats => self.handle_stats_key(key),
      Tab::Form => {
        self.handle_form_key(key);
        true
      }
    }
  }

  /// Keys shared by the table and statistics tabs.
  fn handle_common_key(&mut self, key: KeyEvent) -> Option<bool> {
    match key.code {
      KeyCode::Char('q') => return Some(false),
      KeyCode::Char('1') => self.switch_tab(Tab::Waste),
      KeyCode::Char('2') => self.switch_tab(Tab::Water),
      KeyCode::Char('3') => self.switch_tab(Tab::Stats),
      KeyCode::Char('4') => self.switch_tab(Tab::Form),
      KeyCode::Tab => {
        let tabs: Vec<Tab> = Tab::iter().collect();
        let at = tabs.iter().position(|t| *t == self.tab).unwrap_or(0);
        self.switch_tab(tabs[(at + 1) % tabs.len()]);
      }
      KeyCode::Char('n') => {
        self.form = Form::default();
        self.switch_tab(Tab::Form);
      }
      KeyCode::Char('r') => self.queue(Task::Reload(RefreshMode::Blocking)),
      KeyCode::Char('c') => self.queue(Task::CheckConnection),
      _ => return None,
    }
    Some(true)
  }

  fn handle_stats_key(&mut self, key: KeyEvent) -> bool {
    self.handle_common_key(key).unwrap_or(true)
  }

  fn handle_table_key(&mut self, key: KeyEvent) -> bool {
    if let Some(cont) = self.handle_common_key(key) {
      return cont;
    }
    match key.code {
      KeyCode::Down | KeyCode::Char('j') => {
        let len = self.table_view().rows.len();
        if self.cursor + 1 < len {
          self.cursor += 1;
        }
      }
      KeyCode::Up | KeyCode::Char('k') => {
        self.cursor = self.cursor.saturating_sub(1);
      }
      KeyCode::Char('m') => {
        if self.table_view().can_load_more {
          self.pager.load_more();
        }
      }
      KeyCode::Char('/') => {
        self.search_active = true;
      }
      KeyCode::Enter => {
        if let Some(r) = self.cursor_record() {
          self.modal = Some(Modal::Detail { id: r.id });
        }
      }
      KeyCode::Char('e') => {
        if let Some(r) = self.cursor_record() {
          self.open_edit(&r);
        }
      }
      KeyCode::Char('d') => {
        if let Some(r) = self.cursor_record() {
          self.confirm_delete(&r);
        }
      }
      _ => {}
    }
    true
  }

  fn handle_search_key(&mut self, key: KeyEvent) {
    match key.code {
      KeyCode::Esc => {
        self.search_active = false;
        self.query.clear();
        self.reset_view();
      }
      KeyCode::Enter => {
        self.search_active = false;
      }
      KeyCode::Backspace => {
        self.query.pop();
        self.reset_view();
      }
      KeyCode::Char(c) => {
        self.query.push(c);
        self.reset_view();
      }
      _ => {}
    }
  }

  fn handle_form_key(&mut self, key: KeyEvent) {
    if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('s') {
      self.queue(Task::Submit);
      return;
    }
    match key.code {
      KeyCode::Esc => self.switch_tab(Tab::Waste),
      KeyCode::Tab | KeyCode::Down | KeyCode::Enter => self.form.next_field(),
      KeyCode::BackTab | KeyCode::Up => self.form.prev_field(),
      KeyCode::Left => self.form.cycle(-1),
      KeyCode::Right => self.form.cycle(1),
      KeyCode::Backspace => self.form.backspace(),
      KeyCode::Char(' ') => self.form.toggle_or_type_space(),
      KeyCode::Char(c) => {
        if self.form.focus.kind() == FieldKind::Text {
          self.form.type_char(c);
        }
      }
      _ => {}
    }
  }

  fn handle_modal_key(&mut self, key: KeyEvent) {
    let Some(modal) = self.modal.take() else {
      return;
    };
    match (modal, key.code) {
      (Modal::ConfirmDelete { id, name }, KeyCode::Char('y')) => {
        self.queue(Task::Delete { id, name });
      }
      (Modal::ConfirmDelete { .. }, KeyCode::Char('n') | KeyCode::Esc) => {
        self.notify(NoticeKind::Info, "Delete cancelled");
      }
      (Modal::ConfirmDuplicate { pending, .. }, KeyCode::Char('y')) => {
        self.queue(Task::Commit(pending));
      }
      (Modal::ConfirmDuplicate { pending, .. }, KeyCode::Char('n') | KeyCode::Esc) => {
        let err = pending.decline();
        self.report("Not saved", &err);
      }
      (Modal::Detail { id }, KeyCode::Char('e')) => {
        if let Some(r) = self.coordinator.record(&id).cloned() {
          self.open_edit(&r);
        }
      }
      (Modal::Detail { id }, KeyCode::Char('d')) => {
        if let Some(r) = self.coordinator.record(&id).cloned() {
          self.confirm_delete(&r);
        }
      }
      (Modal::Detail { .. }, KeyCode::Esc | KeyCode::Enter | KeyCode::Char('q')) => {}
      // Anything else leaves the dialog open.
      (modal, _) => self.modal = Some(modal),
    }
  }

  fn open_edit(&mut self, record: &Record) {
    self.form = Form::edit(record);
    self.switch_tab(Tab::Form);
  }

  fn confirm_delete(&mut self, record: &Record) {
    self.modal = Some(Modal::ConfirmDelete {
      id:   record.id.clone(),
      name: record.full_name.clone(),
    });
  }

  // ── Tasks ─────────────────────────────────────────────────────────────────

  /// Run queued store work, if any. Returns whether anything ran.
  pub async fn run_queued(&mut self) -> bool {
    match self.take_task() {
      Some(task) => {
        self.run(task).await;
        true
      }
      None => false,
    }
  }

  pub async fn run(&mut self, task: Task) {
    match task {
      Task::Initialize => match self.coordinator.initialize().await {
        Ok(()) => {
          let n = self.coordinator.records().len();
          self.notify(NoticeKind::Info, format!("Loaded {n} records"));
        }
        Err(e) => self.report("Could not load records", &Error::from(e)),
      },
      Task::Reload(mode) => match self.coordinator.refresh(mode).await {
        Ok(()) => {
          self.clamp_cursor();
          if mode == RefreshMode::Blocking {
            let n = self.coordinator.records().len();
            self.notify(NoticeKind::Info, format!("Loaded {n} records"));
          }
        }
        Err(e) => self.report("Could not load records", &Error::from(e)),
      },
      Task::CheckConnection => {
        let status = self.coordinator.check_connection().await;
        self.notify(NoticeKind::Info, format!("Store: {status}"));
      }
      Task::Delete { id, name } => {
        match self.coordinator.delete(&id).await {
          Ok(DeleteOutcome::Deleted) => {
            self.notify(NoticeKind::Success, format!("Deleted {name}"));
          }
          Ok(DeleteOutcome::Rejected { message }) => {
            let why = message.unwrap_or_else(|| "no reason given".into());
            self.notify(
              NoticeKind::Error,
              format!("Store refused to delete {name}: {why}"),
            );
          }
          Err(e) => self.report("Delete failed", &e),
        }
        self.clamp_cursor();
      }
      Task::Submit => self.submit().await,
      Task::Commit(pending) => self.commit(pending).await,
    }
  }

  async fn submit(&mut self) {
    let (draft, image_path) = match self.form.submission() {
      Ok(parts) => parts,
      Err(e) => return self.report("Not saved", &Error::from(e)),
    };
    if let Err(e) = draft.validate() {
      return self.report("Not saved", &Error::from(e));
    }
    let image = match image_path {
      Some(path) => match load_image(&path).await {
        Ok(img) => Some(img),
        Err(e) => return self.report("Not saved", &Error::from(e)),
      },
      None => None,
    };

    let plan = match self.form.editing.clone() {
      Some(original) => {
        self.coordinator.prepare_update(original, draft, image).await
      }
      None => self.coordinator.prepare_create(draft, image).await,
    };
    match plan {
      Ok(SavePlan::Ready(pending)) => self.commit(pending).await,
      Ok(SavePlan::NeedsConfirmation {
        pending,
        duplicate_of,
      }) => {
        self.modal = Some(Modal::ConfirmDuplicate {
          pending,
          duplicate_of,
        });
      }
      Err(e) => self.report("Not saved", &e),
    }
  }

  async fn commit(&mut self, pending: PendingSave) {
    let verb = if pending.is_update() { "Updated" } else { "Saved" };
    match self.coordinator.commit(pending).await {
      Ok(record) => {
        self.notify(NoticeKind::Success, format!("{verb} {}", record.full_name));
        self.form = Form::default();
        self.switch_tab(Tab::Waste);
      }
      Err(e @ Error::RefreshAfterWrite(_)) => {
        self.form = Form::default();
        self.report(verb, &e);
      }
      Err(e) => self.report("Not saved", &e),
    }
  }

  fn clamp_cursor(&mut self) {
    let len = self.table_view().rows.len();
    self.cursor = self.cursor.min(len.saturating_sub(1));
  }
}
