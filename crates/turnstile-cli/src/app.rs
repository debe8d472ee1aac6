//! Application state machine and event dispatcher.

use std::{path::{Path, PathBuf}, sync::Arc};

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use fuzzy_matcher::{FuzzyMatcher, skim::SkimMatcherV2};
use tokio::sync::broadcast;
use turnstile_core::{
  Error as CoreError,
  payload::CodePayload,
  record::{NewRecord, Record, StageStatus},
  scan::resolve_scan,
  store::RecordStore,
  validate,
};
use uuid::Uuid;

// ─── Screen ───────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Screen {
  /// The records table; scan, export, and reset act on the cursor row.
  Table,
  /// Registration form overlay.
  Form,
  /// Scanner overlay.
  Scanner,
}

// ─── Form state ───────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FormField {
  #[default]
  Name,
  LicensePlate,
  IdentityCard,
}

/// Registration form fields. Keyboard input is coerced field-by-field as the
/// user types, so the buffers only ever hold permitted characters.
#[derive(Default)]
pub struct FormState {
  pub name:                 String,
  pub license_plate:        String,
  pub identity_card_number: String,
  pub focus:                FormField,
}

impl FormState {
  pub fn field(&self, field: FormField) -> &str {
    match field {
      FormField::Name => &self.name,
      FormField::LicensePlate => &self.license_plate,
      FormField::IdentityCard => &self.identity_card_number,
    }
  }

  /// Append a typed character to the focused field, then re-coerce it.
  fn push_char(&mut self, c: char) {
    match self.focus {
      FormField::Name => {
        self.name.push(c);
        self.name = validate::coerce_name(&self.name);
      }
      FormField::LicensePlate => {
        self.license_plate.push(c);
        self.license_plate = validate::coerce_license_plate(&self.license_plate);
      }
      FormField::IdentityCard => {
        self.identity_card_number.push(c);
        self.identity_card_number =
          validate::coerce_identity_card(&self.identity_card_number);
      }
    }
  }

  fn pop_char(&mut self) {
    match self.focus {
      FormField::Name => self.name.pop(),
      FormField::LicensePlate => self.license_plate.pop(),
      FormField::IdentityCard => self.identity_card_number.pop(),
    };
  }

  fn next_field(&mut self) {
    self.focus = match self.focus {
      FormField::Name => FormField::LicensePlate,
      FormField::LicensePlate => FormField::IdentityCard,
      FormField::IdentityCard => FormField::Name,
    };
  }

  fn prev_field(&mut self) {
    self.focus = match self.focus {
      FormField::Name => FormField::IdentityCard,
      FormField::LicensePlate => FormField::Name,
      FormField::IdentityCard => FormField::LicensePlate,
    };
  }

  /// The format hint shown beneath a non-empty invalid field.
  pub fn field_error(&self, field: FormField) -> Option<&'static str> {
    let value = self.field(field);
    if value.is_empty() {
      return None;
    }
    let (valid, rule) = match field {
      FormField::Name => (validate::is_valid_name(value), validate::NAME_RULE),
      FormField::LicensePlate => (
        validate::is_valid_license_plate(value),
        validate::LICENSE_PLATE_RULE,
      ),
      FormField::IdentityCard => (
        validate::is_valid_identity_card(value),
        validate::IDENTITY_CARD_RULE,
      ),
    };
    (!valid).then_some(rule)
  }

  /// Submission is enabled only while every field passes its format rule.
  pub fn is_valid(&self) -> bool {
    self.to_new_record().validate().is_ok()
  }

  pub fn to_new_record(&self) -> NewRecord {
    NewRecord {
      name:                 self.name.trim().to_string(),
      license_plate:        self.license_plate.clone(),
      identity_card_number: self.identity_card_number.clone(),
    }
  }

  fn clear(&mut self) {
    self.name.clear();
    self.license_plate.clear();
    self.identity_card_number.clear();
    self.focus = FormField::Name;
  }
}

// ─── Scanner state ────────────────────────────────────────────────────────────

/// Scanner overlay: the operator pastes raw decoded payload text or enters a
/// path to a QR image file.
#[derive(Default)]
pub struct ScannerState {
  pub input: String,
  /// Last decode error. Shown inline; decode errors are expected noise and
  /// scanning continues.
  pub error: Option<String>,
}

// ─── App ──────────────────────────────────────────────────────────────────────

/// Top-level application state, generic over the store backend.
pub struct App<S: RecordStore> {
  /// Current screen / keyboard focus.
  pub screen: Screen,

  /// Latest record list pushed by (or fetched from) the store. Never
  /// mutated locally — the store's snapshot is the only source of truth.
  pub records: Vec<Record>,

  /// Current fuzzy-filter string (only active when `filter_active`).
  pub filter: String,

  /// Whether the user is typing a filter query.
  pub filter_active: bool,

  /// Cursor position within the *filtered* record list.
  pub cursor: usize,

  pub form:    FormState,
  pub scanner: ScannerState,

  /// One-line status message shown in the status bar.
  pub status_msg: String,

  /// Directory QR code PNGs are exported into.
  pub export_dir: PathBuf,

  store:   Arc<S>,
  changes: broadcast::Receiver<Vec<Record>>,
}

impl<S: RecordStore> App<S> {
  pub fn new(store: S, export_dir: PathBuf) -> Self {
    let changes = store.subscribe();
    Self {
      screen: Screen::Table,
      records: Vec::new(),
      filter: String::new(),
      filter_active: false,
      cursor: 0,
      form: FormState::default(),
      scanner: ScannerState::default(),
      status_msg: String::new(),
      export_dir,
      store: Arc::new(store),
      changes,
    }
  }

  // ── Data loading ──────────────────────────────────────────────────────────

  /// Fetch the full record list from the store.
  pub async fn load_records(&mut self) -> anyhow::Result<()> {
    match self.store.list().await {
      Ok(records) => {
        self.records = records;
        self.clamp_cursor();
        Ok(())
      }
      Err(e) => {
        tracing::error!(error = %e, "listing records failed");
        self.status_msg = format!("Error: {e}");
        Err(anyhow::Error::new(e))
      }
    }
  }

  /// Drain pushed list updates. Each push carries the full newest-first
  /// list; a lagged receiver falls back to an explicit reload.
  pub async fn drain_changes(&mut self) {
    loop {
      match self.changes.try_recv() {
        Ok(list) => {
          self.records = list;
          self.clamp_cursor();
        }
        Err(broadcast::error::TryRecvError::Lagged(skipped)) => {
          tracing::warn!(skipped, "change subscription lagged; reloading");
          let _ = self.load_records().await;
        }
        Err(_) => break,
      }
    }
  }

  fn clamp_cursor(&mut self) {
    let len = self.filtered_records().len();
    if len == 0 {
      self.cursor = 0;
    } else if self.cursor >= len {
      self.cursor = len - 1;
    }
  }

  // ── Filtered list ─────────────────────────────────────────────────────────

  /// Records matching the current filter query, in store (newest-first)
  /// order.
  pub fn filtered_records(&self) -> Vec<&Record> {
    if self.filter.is_empty() {
      return self.records.iter().collect();
    }
    let matcher = SkimMatcherV2::default();
    self
      .records
      .iter()
      .filter(|r| {
        matcher.fuzzy_match(&r.name, &self.filter).is_some()
          || matcher.fuzzy_match(&r.license_plate, &self.filter).is_some()
          || matcher
            .fuzzy_match(&r.identity_card_number, &self.filter)
            .is_some()
      })
      .collect()
  }

  /// The record under the cursor in the filtered view, if any.
  pub fn cursor_record(&self) -> Option<&Record> {
    let list = self.filtered_records();
    list.get(self.cursor).copied()
  }

  fn record_name(&self, record_id: Uuid) -> String {
    self
      .records
      .iter()
      .find(|r| r.record_id == record_id)
      .map(|r| r.name.clone())
      .unwrap_or_else(|| record_id.to_string())
  }

  // ── Key handling ──────────────────────────────────────────────────────────

  /// Process a key event. Returns `true` to continue, `false` to quit.
  pub async fn handle_key(&mut self, key: KeyEvent) -> anyhow::Result<bool> {
    // Global: Ctrl-C quits from anywhere.
    if key.modifiers.contains(KeyModifiers::CONTROL)
      && key.code == KeyCode::Char('c')
    {
      return Ok(false);
    }

    // Filter input mode: all printable keys go into the filter string.
    if self.filter_active {
      return Ok(self.handle_filter_key(key));
    }

    match self.screen {
      Screen::Table => self.handle_table_key(key).await,
      Screen::Form => self.handle_form_key(key).await,
      Screen::Scanner => self.handle_scanner_key(key).await,
    }
  }

  fn handle_filter_key(&mut self, key: KeyEvent) -> bool {
    match key.code {
      KeyCode::Esc => {
        self.filter_active = false;
        self.filter.clear();
        self.cursor = 0;
      }
      KeyCode::Enter => {
        self.filter_active = false;
        self.cursor = 0;
      }
      KeyCode::Backspace => {
        self.filter.pop();
        self.cursor = 0;
      }
      KeyCode::Char(c) => {
        self.filter.push(c);
        self.cursor = 0;
      }
      _ => {}
    }
    true
  }

  async fn handle_table_key(&mut self, key: KeyEvent) -> anyhow::Result<bool> {
    match key.code {
      // Quit
      KeyCode::Char('q') => return Ok(false),

      // Navigation
      KeyCode::Down | KeyCode::Char('j') => {
        let len = self.filtered_records().len();
        if len > 0 && self.cursor + 1 < len {
          self.cursor += 1;
        }
      }
      KeyCode::Up | KeyCode::Char('k') => {
        if self.cursor > 0 {
          self.cursor -= 1;
        }
      }

      // Filter
      KeyCode::Char('/') => {
        self.filter_active = true;
        self.filter.clear();
        self.cursor = 0;
      }

      // Open the registration form.
      KeyCode::Char('a') => {
        self.status_msg.clear();
        self.screen = Screen::Form;
      }

      // Open the scanner.
      KeyCode::Char('s') => {
        self.status_msg.clear();
        self.scanner = ScannerState::default();
        self.screen = Screen::Scanner;
      }

      // Export the selected record's QR code as a PNG.
      KeyCode::Char('e') => self.export_selected(),

      // Reset the selected record's most recently checked stage.
      KeyCode::Char('u') => self.reset_selected_stage().await,

      _ => {}
    }
    Ok(true)
  }

  async fn handle_form_key(&mut self, key: KeyEvent) -> anyhow::Result<bool> {
    match key.code {
      KeyCode::Esc => {
        self.screen = Screen::Table;
      }
      KeyCode::Tab | KeyCode::Down => self.form.next_field(),
      KeyCode::BackTab | KeyCode::Up => self.form.prev_field(),
      KeyCode::Backspace => self.form.pop_char(),
      KeyCode::Char(c) => self.form.push_char(c),
      KeyCode::Enter => self.submit_form().await,
      _ => {}
    }
    Ok(true)
  }

  async fn handle_scanner_key(&mut self, key: KeyEvent) -> anyhow::Result<bool> {
    match key.code {
      // Explicit close tears the scanner down.
      KeyCode::Esc => {
        self.screen = Screen::Table;
      }
      KeyCode::Backspace => {
        self.scanner.input.pop();
      }
      KeyCode::Char(c) => {
        self.scanner.input.push(c);
      }
      KeyCode::Enter => self.submit_scan().await,
      _ => {}
    }
    Ok(true)
  }

  // ── Registration ──────────────────────────────────────────────────────────

  /// Validate and submit the form. On success the fields are cleared and the
  /// form closes; on store failure it stays populated for retry.
  async fn submit_form(&mut self) {
    let input = self.form.to_new_record();
    if let Err(e) = input.validate() {
      self.status_msg = e.to_string();
      return;
    }

    match self.store.create(input).await {
      Ok(record) => {
        tracing::info!(record_id = %record.record_id, name = %record.name, "record created");
        self.status_msg = format!("Created record for {}", record.name);
        self.form.clear();
        self.screen = Screen::Table;
        let _ = self.load_records().await;
      }
      Err(e) => {
        tracing::error!(error = %e, "record creation failed");
        self.status_msg = format!("Error: {e}");
      }
    }
  }

  // ── Scanning ──────────────────────────────────────────────────────────────

  /// Resolve the scanner input against the current record list and advance
  /// the matched record's next pending stage.
  async fn submit_scan(&mut self) {
    let input = self.scanner.input.trim().to_string();
    if input.is_empty() {
      return;
    }

    // Raw payload text pastes start with '{'; anything else is treated as a
    // path to a QR image file.
    let text = if input.starts_with('{') {
      input
    } else {
      match turnstile_qr::decode_image(Path::new(&input)) {
        Ok(text) => text,
        Err(e) => {
          // Per-frame noise: report inline, keep scanning.
          tracing::debug!(error = %e, "image decode error");
          self.scanner.error = Some(e.to_string());
          self.scanner.input.clear();
          return;
        }
      }
    };

    let payload = match CodePayload::decode(&text) {
      Ok(p) => p,
      Err(e) => {
        tracing::debug!(error = %e, "invalid code payload");
        self.scanner.error = Some(e.to_string());
        self.scanner.input.clear();
        return;
      }
    };

    match resolve_scan(&payload, &self.records) {
      Ok(res) => {
        match self.store.advance_stage(res.record_id, res.stage).await {
          Ok(record) => {
            tracing::info!(
              record_id = %record.record_id,
              stage = %res.stage,
              "stage checked"
            );
            self.status_msg =
              format!("Stage {} checked for {}", res.stage, record.name);
          }
          Err(e) => {
            tracing::error!(error = %e, "stage update failed");
            self.status_msg = format!("Error: {e}");
          }
        }
        // Torn down on successful match.
        self.screen = Screen::Table;
      }
      Err(CoreError::NoMatchingRecord) => {
        self.status_msg = "Scanned code does not match any record".into();
        self.screen = Screen::Table;
      }
      Err(CoreError::AllStagesComplete { record_id }) => {
        self.status_msg = format!(
          "All stages are already complete for {}",
          self.record_name(record_id)
        );
        self.screen = Screen::Table;
      }
      Err(e) => {
        tracing::error!(error = %e, "scan resolution failed");
        self.status_msg = format!("Error: {e}");
        self.screen = Screen::Table;
      }
    }
  }

  // ── Export ────────────────────────────────────────────────────────────────

  fn export_selected(&mut self) {
    let Some(record) = self.cursor_record() else {
      self.status_msg = "No record selected".into();
      return;
    };
    let (payload, name) = (record.code_payload.clone(), record.name.clone());

    match turnstile_qr::export_png(&payload, &name, &self.export_dir) {
      Ok(path) => {
        tracing::info!(path = %path.display(), "QR code exported");
        self.status_msg = format!("Exported {}", path.display());
      }
      Err(e) => {
        tracing::error!(error = %e, "QR export failed");
        self.status_msg = format!("Error: {e}");
      }
    }
  }

  // ── Stage reset ───────────────────────────────────────────────────────────

  /// Set the selected record's most recently checked stage back to pending
  /// through the raw (unguarded) stage update.
  async fn reset_selected_stage(&mut self) {
    let Some(record) = self.cursor_record() else {
      self.status_msg = "No record selected".into();
      return;
    };
    let record_id = record.record_id;
    let name = record.name.clone();
    let Some(stage) = record.stages.last_checked() else {
      self.status_msg = format!("{name} has no checked stage to reset");
      return;
    };

    match self
      .store
      .update_stage(record_id, stage, StageStatus::Pending)
      .await
    {
      Ok(()) => {
        tracing::info!(record_id = %record_id, stage = %stage, "stage reset");
        self.status_msg = format!("Stage {stage} reset for {name}");
      }
      Err(e) => {
        tracing::error!(error = %e, "stage reset failed");
        self.status_msg = format!("Error: {e}");
      }
    }
  }
}
