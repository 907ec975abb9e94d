//! The request/response boundary to the invoicing backend.
//!
//! Everything the desk persists or renders goes through [`Backend`]. The
//! production implementation is [`ProcessBackend`], which talks to a spawned
//! backend process; tests use an in-memory double.

mod process;
#[cfg(test)]
pub mod scripted;

use crate::model::{AppSettings, InvoiceDetail, InvoiceFiles, InvoiceSummary};

pub use process::ProcessBackend;

#[derive(Debug, thiserror::Error)]
pub enum BackendError {
    /// Error payload produced by the backend, shown to the user unchanged.
    #[error("{0}")]
    Command(String),
    #[error("backend i/o failed: {0}")]
    Io(#[from] std::io::Error),
    #[error("malformed backend message: {0}")]
    Protocol(#[from] serde_json::Error),
    #[error("backend connection closed")]
    Closed,
}

/// Command surface of the backend. Calls block the calling thread; the desk
/// only ever invokes them from task workers.
pub trait Backend: Send + Sync {
    fn read_all_files(&self) -> Result<InvoiceFiles, BackendError>;

    fn write_file(&self, file_path: &str, content: &str) -> Result<(), BackendError>;

    fn save_invoice_details(&self, description: &str, amount: &str) -> Result<(), BackendError>;

    /// Returns the backend's human-readable report. `dry_run` must not create
    /// history rows.
    fn generate_invoices(&self, dry_run: bool) -> Result<String, BackendError>;

    fn get_all_invoices(&self) -> Result<Vec<InvoiceSummary>, BackendError>;

    fn get_invoice_by_id(&self, id: i64) -> Result<InvoiceDetail, BackendError>;

    fn get_app_settings(&self) -> Result<AppSettings, BackendError>;

    /// Empty fields ask the backend to fill in its defaults.
    fn save_app_settings(&self, settings: &AppSettings) -> Result<(), BackendError>;

    /// Irreversibly wipes invoice data and reseeds example data.
    fn reset_database(&self) -> Result<(), BackendError>;
}
