//! Action gateway: each user action becomes a [`Task`] whose backend calls run
//! in order on a worker thread, reporting [`Outcome`]s back to the desk.

use std::path::PathBuf;
use std::sync::Arc;
use std::sync::mpsc::{self, Receiver, Sender};
use std::thread;

use crate::backend::{Backend, BackendError};
use crate::document::{self, DocumentError};
use crate::draft::Field;
use crate::model::{AppSettings, InvoiceFiles, InvoiceSummary};

#[derive(Debug, Clone, PartialEq)]
pub enum Task {
    LoadFiles,
    SaveFiles(InvoiceFiles),
    Generate {
        files: InvoiceFiles,
        dry_run: bool,
    },
    ListInvoices,
    PreviewInvoice {
        id: i64,
        cache_dir: PathBuf,
    },
    DownloadInvoice {
        id: i64,
        invoice_number: String,
        downloads: PathBuf,
    },
    LoadSettings,
    SaveSettings(AppSettings),
    /// `with_config_dir` keeps the record shape of backends that require a
    /// configuration directory.
    ResetSettings {
        with_config_dir: bool,
    },
    ResetDatabase,
}

impl Task {
    pub fn name(&self) -> &'static str {
        match self {
            Task::LoadFiles => "load-files",
            Task::SaveFiles(_) => "save-files",
            Task::Generate { .. } => "generate",
            Task::ListInvoices => "list-invoices",
            Task::PreviewInvoice { .. } => "preview-invoice",
            Task::DownloadInvoice { .. } => "download-invoice",
            Task::LoadSettings => "load-settings",
            Task::SaveSettings(_) => "save-settings",
            Task::ResetSettings { .. } => "reset-settings",
            Task::ResetDatabase => "reset-database",
        }
    }
}

/// Failure while fetching and materialising an invoice document.
#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    #[error(transparent)]
    Backend(#[from] BackendError),
    #[error(transparent)]
    Document(#[from] DocumentError),
}

/// Decoded invoice document ready to display.
#[derive(Debug, Clone, PartialEq)]
pub struct Preview {
    pub invoice: InvoiceSummary,
    pub path: PathBuf,
    pub size: usize,
}

#[derive(Debug)]
pub enum Outcome {
    Progress(String),
    FilesLoaded(Result<InvoiceFiles, BackendError>),
    FilesSaved(Result<(), BackendError>),
    Generated {
        dry_run: bool,
        result: Result<String, BackendError>,
    },
    InvoicesListed(Result<Vec<InvoiceSummary>, BackendError>),
    InvoicePreviewed {
        id: i64,
        result: Result<Preview, FetchError>,
    },
    InvoiceDownloaded {
        invoice_number: String,
        result: Result<PathBuf, FetchError>,
    },
    SettingsLoaded(Result<AppSettings, BackendError>),
    SettingsSaved {
        settings: AppSettings,
        result: Result<(), BackendError>,
    },
    SettingsReset(Result<AppSettings, BackendError>),
    /// Outer result is the reset itself; inner is the reload that follows it.
    DatabaseReset(Result<Result<InvoiceFiles, BackendError>, BackendError>),
}

pub fn mode_name(dry_run: bool) -> &'static str {
    if dry_run { "preview" } else { "normal" }
}

/// Writes every file in sequence. Not atomic: a failure leaves earlier
/// writes in place.
fn save_files(backend: &dyn Backend, files: &InvoiceFiles) -> Result<(), BackendError> {
    let flat = [
        (Field::Sender, &files.sender),
        (Field::BankDetails, &files.bankdetails),
        (Field::Recipients, &files.recipients),
    ];
    for (field, content) in flat {
        if let Some(path) = field.file_name() {
            backend.write_file(path, content)?;
        }
    }
    backend.save_invoice_details(&files.description, &files.amount)
}

fn fetch_pdf(backend: &dyn Backend, id: i64) -> Result<(InvoiceSummary, Vec<u8>), FetchError> {
    let detail = backend.get_invoice_by_id(id)?;
    let bytes = document::decode_pdf(&detail.pdf_base64)?;
    Ok((detail.summary, bytes))
}

/// Runs one task to completion against `backend`.
pub fn execute(task: Task, backend: &dyn Backend, emit: &mut dyn FnMut(Outcome)) {
    match task {
        Task::LoadFiles => emit(Outcome::FilesLoaded(backend.read_all_files())),
        Task::SaveFiles(files) => emit(Outcome::FilesSaved(save_files(backend, &files))),
        Task::Generate { files, dry_run } => {
            // A failed save is reported but does not stop generation.
            emit(Outcome::FilesSaved(save_files(backend, &files)));
            emit(Outcome::Progress(format!(
                "Generating invoices in {} mode...",
                mode_name(dry_run)
            )));
            let result = backend.generate_invoices(dry_run);
            emit(Outcome::Generated { dry_run, result });
        }
        Task::ListInvoices => emit(Outcome::InvoicesListed(backend.get_all_invoices())),
        Task::PreviewInvoice { id, cache_dir } => {
            let result = fetch_pdf(backend, id).and_then(|(invoice, bytes)| {
                let path = document::store(&cache_dir, &invoice.invoice_number, &bytes)?;
                Ok(Preview {
                    invoice,
                    path,
                    size: bytes.len(),
                })
            });
            emit(Outcome::InvoicePreviewed { id, result });
        }
        Task::DownloadInvoice {
            id,
            invoice_number,
            downloads,
        } => {
            // Named after the row that was clicked; earlier downloads are kept.
            let result = fetch_pdf(backend, id).and_then(|(_, bytes)| {
                Ok(document::store_unique(&downloads, &invoice_number, &bytes)?)
            });
            emit(Outcome::InvoiceDownloaded {
                invoice_number,
                result,
            });
        }
        Task::LoadSettings => emit(Outcome::SettingsLoaded(backend.get_app_settings())),
        Task::SaveSettings(settings) => {
            let result = backend.save_app_settings(&settings);
            emit(Outcome::SettingsSaved { settings, result });
        }
        Task::ResetSettings { with_config_dir } => {
            // Empty values make the backend resolve its own defaults.
            let empty = AppSettings {
                output_directory: String::new(),
                config_directory: with_config_dir.then(String::new),
            };
            let result = backend
                .save_app_settings(&empty)
                .and_then(|()| backend.get_app_settings());
            emit(Outcome::SettingsReset(result));
        }
        Task::ResetDatabase => {
            let result = backend.reset_database().map(|()| backend.read_all_files());
            emit(Outcome::DatabaseReset(result));
        }
    }
}

/// Runs tasks on short-lived worker threads. Tasks are neither serialised nor
/// de-duplicated against each other, and cannot be cancelled once submitted.
pub struct Gateway {
    backend: Arc<dyn Backend>,
    tx: Sender<Outcome>,
    notify: Arc<dyn Fn() + Send + Sync>,
}

impl Gateway {
    pub fn new(
        backend: Arc<dyn Backend>,
        notify: impl Fn() + Send + Sync + 'static,
    ) -> (Self, Receiver<Outcome>) {
        let (tx, rx) = mpsc::channel();
        let gateway = Self {
            backend,
            tx,
            notify: Arc::new(notify),
        };
        (gateway, rx)
    }

    pub fn submit(&self, task: Task) {
        let name = task.name();
        let backend = Arc::clone(&self.backend);
        let tx = self.tx.clone();
        let notify = Arc::clone(&self.notify);
        tracing::debug!(task = name, "submitting task");

        let spawned = thread::Builder::new()
            .name(format!("task-{name}"))
            .spawn(move || {
                execute(task, backend.as_ref(), &mut |outcome| {
                    if tx.send(outcome).is_err() {
                        tracing::debug!(task = name, "desk gone; dropping outcome");
                    }
                    notify();
                });
            });
        if let Err(e) = spawned {
            tracing::error!(task = name, error = %e, "failed to spawn task worker");
        }
    }
}
