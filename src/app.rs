//! Desk state and its transitions. Nothing in here draws; `ui` projects this
//! state onto egui and feeds user actions back in.

use std::mem;
use std::path::PathBuf;
use std::time::{Duration, Instant};

use crate::backend::BackendError;
use crate::config::DeskConfig;
use crate::desktop;
use crate::draft::{Draft, Editors, Tab};
use crate::gate::ConfirmationGate;
use crate::gateway::{Outcome, Preview, Task, mode_name};
use crate::model::{AppSettings, InvoiceFiles, InvoiceSummary};
use crate::status::StatusBar;

#[derive(Debug, Clone, PartialEq, Default)]
pub enum HistoryView {
    #[default]
    Idle,
    Loading,
    Empty,
    Table(Vec<InvoiceSummary>),
    Error(String),
}

pub struct Desk {
    current_tab: Tab,
    draft: Draft,
    pub editors: Editors,
    settings: AppSettings,
    pub settings_form: AppSettings,
    history: HistoryView,
    selected: Option<i64>,
    preview: Option<Preview>,
    output: Option<String>,
    pub gate: ConfirmationGate,
    confirming_settings_reset: bool,
    status: StatusBar,
    history_refresh_at: Option<Instant>,
    history_refresh_delay: Duration,
    downloads_dir: PathBuf,
    preview_cache_dir: PathBuf,
    outbox: Vec<Task>,
}

impl Desk {
    pub fn new(config: &DeskConfig) -> Self {
        Self {
            current_tab: Tab::default(),
            draft: Draft::default(),
            editors: Editors::default(),
            settings: AppSettings::default(),
            settings_form: AppSettings::default(),
            history: HistoryView::default(),
            selected: None,
            preview: None,
            output: None,
            gate: ConfirmationGate::default(),
            confirming_settings_reset: false,
            status: StatusBar::new(config.status_timeout()),
            history_refresh_at: None,
            history_refresh_delay: config.history_refresh_delay(),
            downloads_dir: config.downloads_dir(),
            preview_cache_dir: config.preview_cache_dir(),
            outbox: Vec::new(),
        }
    }

    // ---- accessors ----

    pub fn current_tab(&self) -> Tab {
        self.current_tab
    }

    #[cfg(test)]
    pub fn draft(&self) -> &Draft {
        &self.draft
    }

    pub fn settings(&self) -> &AppSettings {
        &self.settings
    }

    pub fn history(&self) -> &HistoryView {
        &self.history
    }

    pub fn selected(&self) -> Option<i64> {
        self.selected
    }

    pub fn preview(&self) -> Option<&Preview> {
        self.preview.as_ref()
    }

    pub fn output(&self) -> Option<&str> {
        self.output.as_deref()
    }

    pub fn status(&self) -> &StatusBar {
        &self.status
    }

    pub fn confirming_settings_reset(&self) -> bool {
        self.confirming_settings_reset
    }

    #[cfg(test)]
    pub fn history_refresh_at(&self) -> Option<Instant> {
        self.history_refresh_at
    }

    /// Tasks queued since the last call, in submission order.
    pub fn take_tasks(&mut self) -> Vec<Task> {
        mem::take(&mut self.outbox)
    }

    fn queue(&mut self, task: Task) {
        self.outbox.push(task);
    }

    // ---- tabs ----

    pub fn switch_to(&mut self, tab: Tab) {
        self.editors.flush(self.current_tab, &mut self.draft);
        self.editors.hydrate(tab, &self.draft);
        match tab {
            Tab::History => self.refresh_history(),
            Tab::Settings => self.load_settings(),
            _ => {}
        }
        tracing::debug!(from = ?self.current_tab, to = ?tab, "switched tab");
        self.current_tab = tab;
    }

    // ---- files ----

    pub fn load_files(&mut self) {
        self.status.info("Loading files...");
        self.queue(Task::LoadFiles);
    }

    pub fn save_all(&mut self) {
        self.status.info("Saving files...");
        self.editors.flush(self.current_tab, &mut self.draft);
        self.queue(Task::SaveFiles(self.draft.to_files()));
    }

    pub fn generate(&mut self, dry_run: bool) {
        self.status.info("Saving files...");
        self.editors.flush(self.current_tab, &mut self.draft);
        self.queue(Task::Generate {
            files: self.draft.to_files(),
            dry_run,
        });
    }

    // ---- history ----

    pub fn refresh_history(&mut self) {
        self.history = HistoryView::Loading;
        self.queue(Task::ListInvoices);
    }

    pub fn request_history_refresh(&mut self) {
        self.refresh_history();
        self.status.info("Refreshing invoice history...");
    }

    pub fn preview_invoice(&mut self, id: i64) {
        self.queue(Task::PreviewInvoice {
            id,
            cache_dir: self.preview_cache_dir.clone(),
        });
    }

    pub fn download_invoice(&mut self, id: i64, invoice_number: &str) {
        self.queue(Task::DownloadInvoice {
            id,
            invoice_number: invoice_number.to_string(),
            downloads: self.downloads_dir.clone(),
        });
    }

    /// Hands the cached preview document to the system PDF viewer.
    pub fn open_preview(&mut self) {
        let Some(preview) = &self.preview else {
            return;
        };
        if let Err(e) = desktop::open_path(&preview.path) {
            self.status.error(format!("Error opening invoice: {e}"));
        }
    }

    // ---- settings ----

    pub fn load_settings(&mut self) {
        self.queue(Task::LoadSettings);
    }

    pub fn save_settings(&mut self) {
        self.status.info("Saving settings...");
        self.queue(Task::SaveSettings(self.settings_form.clone()));
    }

    pub fn request_settings_reset(&mut self) {
        self.confirming_settings_reset = true;
    }

    pub fn cancel_settings_reset(&mut self) {
        self.confirming_settings_reset = false;
    }

    pub fn reset_settings(&mut self) {
        if !mem::take(&mut self.confirming_settings_reset) {
            return;
        }
        self.status.info("Resetting settings...");
        self.queue(Task::ResetSettings {
            with_config_dir: self.settings.config_directory.is_some(),
        });
    }

    pub fn choose_output_directory(&mut self, picked: Option<PathBuf>) {
        if let Some(dir) = picked {
            self.settings_form.output_directory = dir.to_string_lossy().into_owned();
            self.status
                .info("Output directory selected. Remember to save settings.");
        }
    }

    pub fn open_output_directory(&mut self) {
        let dir = self.settings_form.output_directory.trim();
        if dir.is_empty() {
            return;
        }
        if let Err(e) = desktop::open_path(std::path::Path::new(dir)) {
            self.status.error(format!("Error opening directory: {e}"));
        }
    }

    // ---- database reset ----

    pub fn open_reset_dialog(&mut self) {
        self.gate.open();
    }

    pub fn dismiss_reset_dialog(&mut self) {
        self.gate.dismiss();
    }

    /// Closes the dialog up front; the outcome only ever reaches the status bar.
    pub fn confirm_reset(&mut self) {
        if !self.gate.submit() {
            return;
        }
        tracing::warn!("database reset requested");
        self.status
            .info("Resetting database... This may take a moment.");
        self.queue(Task::ResetDatabase);
    }

    // ---- outcomes ----

    /// Expires the status message and fires the delayed history refresh.
    /// Returns how soon something else is due.
    pub fn tick(&mut self, now: Instant) -> Option<Duration> {
        if self.history_refresh_at.is_some_and(|at| now >= at) {
            self.history_refresh_at = None;
            self.refresh_history();
        }
        let refresh = self
            .history_refresh_at
            .map(|at| at.saturating_duration_since(now));
        match (self.status.tick(now), refresh) {
            (Some(a), Some(b)) => Some(a.min(b)),
            (a, b) => a.or(b),
        }
    }

    /// Folds a task outcome into whatever state exists now. Late outcomes are
    /// applied as-is.
    pub fn apply(&mut self, outcome: Outcome) {
        match outcome {
            Outcome::Progress(message) => self.status.info(message),
            Outcome::FilesLoaded(Ok(files)) => {
                self.draft.replace(&files);
                self.editors.hydrate(self.current_tab, &self.draft);
                self.status.success("Files loaded successfully!");
            }
            Outcome::FilesLoaded(Err(e)) => {
                self.status.error(format!("Error loading files: {e}"));
            }
            Outcome::FilesSaved(Ok(())) => {
                self.status.success("All files saved successfully!");
            }
            Outcome::FilesSaved(Err(e)) => {
                self.status.error(format!("Error saving files: {e}"));
            }
            Outcome::Generated {
                dry_run,
                result: Ok(text),
            } => {
                self.status.success(format!(
                    "Invoices generated successfully in {} mode!",
                    mode_name(dry_run)
                ));
                self.output = Some(text);
                if !dry_run && self.current_tab == Tab::History {
                    self.history_refresh_at = Some(Instant::now() + self.history_refresh_delay);
                }
            }
            Outcome::Generated { result: Err(e), .. } => {
                self.status.error(format!("Error generating invoices: {e}"));
                self.output = Some(e.to_string());
            }
            Outcome::InvoicesListed(Ok(invoices)) => {
                self.selected = None;
                self.history = if invoices.is_empty() {
                    HistoryView::Empty
                } else {
                    HistoryView::Table(invoices)
                };
            }
            Outcome::InvoicesListed(Err(e)) => {
                self.history = HistoryView::Error(format!("Error loading invoices: {e}"));
            }
            Outcome::InvoicePreviewed { id, result: Ok(preview) } => {
                self.selected = Some(id);
                self.preview = Some(preview);
            }
            Outcome::InvoicePreviewed { result: Err(e), .. } => {
                self.status.error(format!("Error loading invoice: {e}"));
            }
            Outcome::InvoiceDownloaded {
                invoice_number,
                result: Ok(path),
            } => {
                tracing::info!(%invoice_number, path = %path.display(), "invoice downloaded");
                self.status.success(format!(
                    "Invoice {invoice_number} downloaded successfully!"
                ));
            }
            Outcome::InvoiceDownloaded { result: Err(e), .. } => {
                self.status.error(format!("Error downloading invoice: {e}"));
            }
            Outcome::SettingsLoaded(Ok(settings)) => {
                self.settings_form = settings.clone();
                self.settings = settings;
            }
            Outcome::SettingsLoaded(Err(e)) => {
                self.status.error(format!("Error loading settings: {e}"));
            }
            Outcome::SettingsSaved {
                settings,
                result: Ok(()),
            } => {
                self.settings = settings;
                self.status.success("Settings saved successfully!");
            }
            Outcome::SettingsSaved { result: Err(e), .. } => {
                self.status.error(format!("Error saving settings: {e}"));
            }
            Outcome::SettingsReset(Ok(settings)) => {
                self.settings_form = settings.clone();
                self.settings = settings;
                self.status.success("Settings reset to default!");
            }
            Outcome::SettingsReset(Err(e)) => {
                self.status.error(format!("Error resetting settings: {e}"));
            }
            Outcome::DatabaseReset(Ok(reload)) => self.after_database_reset(reload),
            Outcome::DatabaseReset(Err(e)) => {
                self.status.error(format!("Error resetting database: {e}"));
            }
        }
    }

    fn after_database_reset(&mut self, reload: Result<InvoiceFiles, BackendError>) {
        self.draft.clear();
        self.selected = None;
        self.preview = None;
        let reload_error = match reload {
            Ok(files) => {
                self.draft.replace(&files);
                None
            }
            Err(e) => Some(e),
        };
        self.editors.hydrate(self.current_tab, &self.draft);

        match self.current_tab {
            Tab::History => self.refresh_history(),
            Tab::Settings => self.load_settings(),
            _ => {}
        }

        match reload_error {
            Some(e) => self.status.error(format!(
                "Database was reset, but reloading files failed: {e}"
            )),
            None => self.status.success(
                "Database has been reset successfully! All data has been deleted and fresh example data has been created.",
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::scripted::{ScriptedBackend, invoice};
    use crate::draft::Field;
    use crate::gateway::execute;
    use crate::status::StatusLevel;

    struct Fixture {
        desk: Desk,
        backend: ScriptedBackend,
        _dir: tempfile::TempDir,
    }

    impl Fixture {
        fn new(backend: ScriptedBackend) -> Self {
            let dir = tempfile::tempdir().unwrap();
            let mut config = DeskConfig::default();
            config.paths.downloads = Some(dir.path().join("downloads").to_string_lossy().into());
            config.paths.preview_cache = Some(dir.path().join("cache").to_string_lossy().into());
            Self {
                desk: Desk::new(&config),
                backend,
                _dir: dir,
            }
        }

        /// Runs queued tasks (and any they queue) to completion, in order.
        fn pump(&mut self) {
            loop {
                let tasks = self.desk.take_tasks();
                if tasks.is_empty() {
                    break;
                }
                for task in tasks {
                    let mut outcomes = Vec::new();
                    execute(task, &self.backend, &mut |o| outcomes.push(o));
                    for outcome in outcomes {
                        self.desk.apply(outcome);
                    }
                }
            }
        }

        fn status(&self) -> (String, StatusLevel) {
            let s = self.desk.status().current().expect("status shown");
            (s.message.clone(), s.level)
        }
    }

    fn acme() -> InvoiceFiles {
        InvoiceFiles {
            sender: "Acme".into(),
            ..Default::default()
        }
    }

    #[test]
    fn tab_round_trip_leaves_draft_unchanged() {
        let mut f = Fixture::new(ScriptedBackend::new().with_files(acme()));
        f.desk.load_files();
        f.pump();
        let before = f.desk.draft().clone();

        f.desk.switch_to(Tab::BankDetails);
        f.desk.switch_to(Tab::Sender);

        assert_eq!(f.desk.draft(), &before);
        assert_eq!(f.desk.editors.get(Field::Sender), "Acme");
    }

    #[test]
    fn edit_then_switch_flushes_into_draft() {
        let mut f = Fixture::new(ScriptedBackend::new().with_files(acme()));
        f.desk.load_files();
        f.pump();

        f.desk.switch_to(Tab::Recipients);
        *f.desk.editors.buffer_mut(Field::Recipients) = "Bob".into();
        f.desk.switch_to(Tab::Sender);

        assert_eq!(f.desk.draft().get(Field::Recipients), Some("Bob"));
        assert_eq!(f.desk.editors.get(Field::Sender), "Acme");
    }

    #[test]
    fn invoice_tab_moves_both_fields() {
        let mut f = Fixture::new(ScriptedBackend::new());
        f.desk.switch_to(Tab::Invoice);
        *f.desk.editors.buffer_mut(Field::Description) = "Audit".into();
        *f.desk.editors.buffer_mut(Field::Amount) = "750".into();
        f.desk.switch_to(Tab::Sender);

        assert_eq!(f.desk.draft().get(Field::Description), Some("Audit"));
        assert_eq!(f.desk.draft().get(Field::Amount), Some("750"));

        *f.desk.editors.buffer_mut(Field::Amount) = "junk".into();
        f.desk.switch_to(Tab::Invoice);
        assert_eq!(f.desk.editors.get(Field::Amount), "750");
    }

    #[test]
    fn history_and_settings_tabs_refresh_on_entry() {
        let mut f = Fixture::new(ScriptedBackend::new());
        f.desk.switch_to(Tab::History);
        assert_eq!(f.desk.history(), &HistoryView::Loading);
        assert_eq!(f.desk.take_tasks(), [Task::ListInvoices]);

        f.desk.switch_to(Tab::Settings);
        assert_eq!(f.desk.take_tasks(), [Task::LoadSettings]);
    }

    #[test]
    fn load_failure_leaves_draft_alone() {
        let mut f = Fixture::new(ScriptedBackend::new().with_files(acme()));
        f.desk.load_files();
        f.pump();
        f.backend.fail("read_all_files", "database locked");

        f.desk.load_files();
        f.pump();

        assert_eq!(f.desk.draft().get(Field::Sender), Some("Acme"));
        assert_eq!(
            f.status(),
            ("Error loading files: database locked".into(), StatusLevel::Error)
        );
    }

    #[test]
    fn save_flushes_visible_editor_first() {
        let mut f = Fixture::new(ScriptedBackend::new());
        *f.desk.editors.buffer_mut(Field::Sender) = "Typed but not switched".into();
        f.desk.save_all();
        f.pump();

        assert_eq!(f.backend.state().files.sender, "Typed but not switched");
        assert_eq!(
            f.status(),
            ("All files saved successfully!".into(), StatusLevel::Success)
        );
    }

    #[test]
    fn empty_history_shows_empty_state() {
        let mut f = Fixture::new(ScriptedBackend::new());
        f.desk.switch_to(Tab::History);
        f.pump();
        assert_eq!(f.desk.history(), &HistoryView::Empty);
    }

    #[test]
    fn history_rows_match_invoices() {
        let invoices = vec![invoice(1, "2024-001"), invoice(2, "2024-002")];
        let mut f = Fixture::new(ScriptedBackend::new().with_invoices(invoices.clone()));
        f.desk.switch_to(Tab::History);
        f.pump();

        let HistoryView::Table(rows) = f.desk.history() else {
            panic!("expected table, got {:?}", f.desk.history());
        };
        let expected: Vec<_> = invoices.into_iter().map(|i| i.summary).collect();
        assert_eq!(rows, &expected);
    }

    #[test]
    fn history_error_is_distinct_from_empty() {
        let mut f = Fixture::new(ScriptedBackend::new());
        f.backend.fail("get_all_invoices", "no such table");
        f.desk.switch_to(Tab::History);
        f.pump();
        assert_eq!(
            f.desk.history(),
            &HistoryView::Error("Error loading invoices: no such table".into())
        );
    }

    #[test]
    fn normal_generation_on_history_schedules_refresh() {
        let mut f = Fixture::new(ScriptedBackend::new());
        f.desk.switch_to(Tab::History);
        f.pump();
        assert_eq!(f.desk.history(), &HistoryView::Empty);

        f.desk.generate(false);
        f.pump();
        assert_eq!(f.desk.output(), Some("Generated invoice 2024-001"));
        let due = f.desk.history_refresh_at().expect("refresh scheduled");

        // Not due yet: nothing queued.
        f.desk.tick(due - Duration::from_millis(1));
        assert!(f.desk.take_tasks().is_empty());

        f.desk.tick(due);
        f.pump();
        assert!(matches!(f.desk.history(), HistoryView::Table(rows) if rows.len() == 1));
        assert!(f.desk.history_refresh_at().is_none());
    }

    #[test]
    fn preview_generation_adds_no_row_and_schedules_nothing() {
        let mut f = Fixture::new(ScriptedBackend::new());
        f.desk.switch_to(Tab::History);
        f.pump();

        f.desk.generate(true);
        f.pump();
        assert!(f.desk.history_refresh_at().is_none());
        assert_eq!(
            f.status(),
            (
                "Invoices generated successfully in preview mode!".into(),
                StatusLevel::Success
            )
        );

        f.desk.refresh_history();
        f.pump();
        assert_eq!(f.desk.history(), &HistoryView::Empty);
    }

    #[test]
    fn generation_off_history_tab_schedules_nothing() {
        let mut f = Fixture::new(ScriptedBackend::new());
        f.desk.generate(false);
        f.pump();
        assert!(f.desk.history_refresh_at().is_none());
    }

    #[test]
    fn generation_error_is_shown_as_output() {
        let mut f = Fixture::new(ScriptedBackend::new());
        f.backend.fail("generate_invoices", "missing recipients");
        f.desk.generate(false);
        f.pump();
        assert_eq!(f.desk.output(), Some("missing recipients"));
        assert_eq!(
            f.status(),
            (
                "Error generating invoices: missing recipients".into(),
                StatusLevel::Error
            )
        );
    }

    #[test]
    fn preview_selects_row_on_success() {
        let mut f = Fixture::new(ScriptedBackend::new().with_invoices(vec![invoice(5, "2024-005")]));
        f.desk.switch_to(Tab::History);
        f.pump();

        f.desk.preview_invoice(5);
        f.pump();
        assert_eq!(f.desk.selected(), Some(5));
        let preview = f.desk.preview().expect("preview shown");
        assert!(preview.path.ends_with("invoice-2024-005.pdf"));
    }

    #[test]
    fn stale_preview_leaves_selection_and_placeholder() {
        let mut f = Fixture::new(ScriptedBackend::new().with_invoices(vec![invoice(5, "2024-005")]));
        f.desk.switch_to(Tab::History);
        f.pump();
        f.backend.state().invoices.clear();

        f.desk.preview_invoice(5);
        f.pump();

        assert_eq!(f.desk.selected(), None);
        assert!(f.desk.preview().is_none());
        assert_eq!(f.status().1, StatusLevel::Error);
    }

    #[test]
    fn download_reports_invoice_number() {
        let mut f = Fixture::new(ScriptedBackend::new().with_invoices(vec![invoice(3, "2024-003")]));
        f.desk.download_invoice(3, "2024-003");
        f.pump();
        assert_eq!(
            f.status(),
            (
                "Invoice 2024-003 downloaded successfully!".into(),
                StatusLevel::Success
            )
        );
    }

    #[test]
    fn settings_save_and_reset() {
        let mut f = Fixture::new(ScriptedBackend::new());
        f.desk.switch_to(Tab::Settings);
        f.pump();

        f.desk.settings_form.output_directory = "/srv/out".into();
        f.desk.save_settings();
        f.pump();
        assert_eq!(f.desk.settings().output_directory, "/srv/out");
        assert_eq!(f.backend.state().settings.output_directory, "/srv/out");

        // Reset without confirmation does nothing.
        f.desk.reset_settings();
        assert!(f.desk.take_tasks().is_empty());

        f.desk.request_settings_reset();
        f.desk.reset_settings();
        f.pump();
        assert!(!f.desk.confirming_settings_reset());
        assert_eq!(
            f.desk.settings_form.output_directory,
            "/home/user/Documents/Invoices"
        );
        assert_eq!(
            f.status(),
            ("Settings reset to default!".into(), StatusLevel::Success)
        );
    }

    #[test]
    fn chosen_directory_fills_form_only() {
        let mut f = Fixture::new(ScriptedBackend::new());
        f.desk.choose_output_directory(None);
        assert!(f.desk.status().current().is_none());

        f.desk.choose_output_directory(Some(PathBuf::from("/tmp/picked")));
        assert_eq!(f.desk.settings_form.output_directory, "/tmp/picked");
        assert!(f.desk.settings().output_directory.is_empty());
    }

    #[test]
    fn opening_missing_directory_reports_error() {
        let mut f = Fixture::new(ScriptedBackend::new());
        f.desk.settings_form.output_directory = "/definitely/not/here".into();
        f.desk.open_output_directory();
        assert_eq!(f.status().1, StatusLevel::Error);
    }

    #[test]
    fn reset_requires_confirmed_gate() {
        let mut f = Fixture::new(ScriptedBackend::new());
        f.desk.open_reset_dialog();
        f.desk.gate.phrase = "DELETE DATABASE".into();
        f.desk.confirm_reset();
        assert!(f.desk.take_tasks().is_empty());
        assert!(f.desk.gate.is_open());

        f.desk.dismiss_reset_dialog();
        f.desk.open_reset_dialog();
        assert!(f.desk.gate.phrase.is_empty());
    }

    #[test]
    fn reset_discards_draft_and_reloads() {
        let mut f = Fixture::new(ScriptedBackend::new().with_files(acme()));
        f.desk.load_files();
        f.pump();
        f.desk.switch_to(Tab::History);
        f.pump();

        f.desk.open_reset_dialog();
        f.desk.gate.phrase = "delete database".into();
        f.desk.gate.acknowledged = true;
        f.desk.confirm_reset();
        assert!(!f.desk.gate.is_open());
        f.pump();

        assert_eq!(f.desk.draft().get(Field::Sender), Some("Example Sender"));
        assert!(matches!(f.desk.history(), HistoryView::Table(rows) if rows.len() == 1));
        assert_eq!(f.status().1, StatusLevel::Success);
    }

    fn confirm_gate(desk: &mut Desk) {
        desk.open_reset_dialog();
        desk.gate.phrase = "DELETE DATABASE".into();
        desk.gate.acknowledged = true;
        desk.confirm_reset();
    }

    #[test]
    fn reset_on_settings_tab_reloads_settings() {
        let settings = AppSettings {
            output_directory: "/out".into(),
            config_directory: Some("/cfg".into()),
        };
        let mut f = Fixture::new(ScriptedBackend::new().with_settings(settings.clone()));
        f.desk.switch_to(Tab::Settings);
        f.pump();
        f.desk.settings_form.output_directory = "/unsaved".into();

        confirm_gate(&mut f.desk);
        let tasks = f.desk.take_tasks();
        assert_eq!(tasks, [Task::ResetDatabase]);
        let mut outcomes = Vec::new();
        execute(Task::ResetDatabase, &f.backend, &mut |o| outcomes.push(o));
        for outcome in outcomes {
            f.desk.apply(outcome);
        }
        assert_eq!(f.desk.take_tasks(), [Task::LoadSettings]);

        f.desk.load_settings();
        f.pump();
        assert_eq!(f.desk.settings_form, settings);
        assert_eq!(f.desk.settings(), &settings);
    }

    #[test]
    fn reset_with_failed_reload_leaves_draft_empty() {
        let mut f = Fixture::new(ScriptedBackend::new().with_files(acme()));
        f.desk.load_files();
        f.pump();
        f.backend.fail("read_all_files", "disk gone");

        confirm_gate(&mut f.desk);
        f.pump();

        assert_eq!(f.desk.draft().get(Field::Sender), None);
        assert_eq!(f.desk.editors.get(Field::Sender), "");
        assert_eq!(
            f.status(),
            (
                "Database was reset, but reloading files failed: disk gone".into(),
                StatusLevel::Error
            )
        );
    }

    #[test]
    fn dismissing_reset_dialog_has_no_side_effects() {
        let mut f = Fixture::new(ScriptedBackend::new().with_files(acme()));
        f.desk.load_files();
        f.pump();
        let before = f.desk.draft().clone();
        let calls = f.backend.calls().len();

        f.desk.open_reset_dialog();
        f.desk.gate.phrase = "DELETE DATABASE".into();
        f.desk.gate.acknowledged = true;
        f.desk.dismiss_reset_dialog();

        assert!(!f.desk.gate.is_open());
        assert!(f.desk.take_tasks().is_empty());
        assert_eq!(f.desk.draft(), &before);
        assert_eq!(f.backend.calls().len(), calls);
    }

    #[test]
    fn settings_reset_keeps_config_directory_shape() {
        let settings = AppSettings {
            output_directory: "/out".into(),
            config_directory: Some("/cfg".into()),
        };
        let mut f = Fixture::new(ScriptedBackend::new().with_settings(settings));
        f.desk.switch_to(Tab::Settings);
        f.pump();

        f.desk.request_settings_reset();
        f.desk.reset_settings();
        f.pump();

        let sent = f.backend.state().saved_settings.clone();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].config_directory.as_deref(), Some(""));
        assert!(f.desk.settings().config_directory.is_some());
        assert_eq!(f.status().1, StatusLevel::Success);
    }

    #[test]
    fn failed_reset_keeps_dialog_closed() {
        let mut f = Fixture::new(ScriptedBackend::new().with_files(acme()));
        f.desk.load_files();
        f.pump();
        f.backend.fail("reset_database", "database is locked");

        f.desk.open_reset_dialog();
        f.desk.gate.phrase = "DELETE DATABASE ".into();
        f.desk.gate.acknowledged = true;
        f.desk.confirm_reset();
        f.pump();

        assert!(!f.desk.gate.is_open());
        assert_eq!(f.desk.draft().get(Field::Sender), Some("Acme"));
        assert_eq!(
            f.status(),
            (
                "Error resetting database: database is locked".into(),
                StatusLevel::Error
            )
        );
    }
}
