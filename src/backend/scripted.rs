//! In-memory backend double with scriptable failures.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;

use super::{Backend, BackendError};
use crate::model::{AppSettings, InvoiceDetail, InvoiceFiles, InvoiceSummary};

pub const FAKE_PDF: &[u8] = b"%PDF-1.4 fake";

#[derive(Debug, Default)]
pub struct State {
    pub files: InvoiceFiles,
    pub invoices: Vec<InvoiceDetail>,
    pub settings: AppSettings,
    /// Every record passed to `save_app_settings`, as sent.
    pub saved_settings: Vec<AppSettings>,
    pub calls: Vec<String>,
    failures: HashMap<&'static str, String>,
}

#[derive(Debug, Default)]
pub struct ScriptedBackend {
    state: Mutex<State>,
}

pub fn invoice(id: i64, number: &str) -> InvoiceDetail {
    InvoiceDetail {
        summary: InvoiceSummary {
            id,
            invoice_number: number.to_string(),
            service: "Consulting".to_string(),
            invoice_date: "2024-01-05".to_string(),
            due_date: "2024-02-04".to_string(),
            created_at: "2024-01-05 10:00:00".to_string(),
            vat_enabled: None,
            vat_rate: None,
        },
        pdf_base64: STANDARD.encode(FAKE_PDF),
    }
}

impl ScriptedBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_files(self, files: InvoiceFiles) -> Self {
        self.state().files = files;
        self
    }

    pub fn with_invoices(self, invoices: Vec<InvoiceDetail>) -> Self {
        self.state().invoices = invoices;
        self
    }

    pub fn with_settings(self, settings: AppSettings) -> Self {
        self.state().settings = settings;
        self
    }

    /// Makes every later call of `cmd` fail with `message`.
    pub fn fail(&self, cmd: &'static str, message: &str) {
        self.state().failures.insert(cmd, message.to_string());
    }

    pub fn calls(&self) -> Vec<String> {
        self.state().calls.clone()
    }

    pub fn state(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap()
    }

    fn enter(&self, cmd: &'static str) -> Result<MutexGuard<'_, State>, BackendError> {
        let mut state = self.state();
        state.calls.push(cmd.to_string());
        if let Some(message) = state.failures.get(cmd).cloned() {
            return Err(BackendError::Command(message));
        }
        Ok(state)
    }
}

impl Backend for ScriptedBackend {
    fn read_all_files(&self) -> Result<InvoiceFiles, BackendError> {
        Ok(self.enter("read_all_files")?.files.clone())
    }

    fn write_file(&self, file_path: &str, content: &str) -> Result<(), BackendError> {
        let mut state = self.enter("write_file")?;
        let slot = match file_path {
            "sender.txt" => &mut state.files.sender,
            "bankdetails.txt" => &mut state.files.bankdetails,
            "recipients.txt" => &mut state.files.recipients,
            _ => return Err(BackendError::Command("Unknown config file".into())),
        };
        *slot = content.to_string();
        Ok(())
    }

    fn save_invoice_details(&self, description: &str, amount: &str) -> Result<(), BackendError> {
        let mut state = self.enter("save_invoice_details")?;
        state.files.description = description.to_string();
        state.files.amount = amount.to_string();
        Ok(())
    }

    fn generate_invoices(&self, dry_run: bool) -> Result<String, BackendError> {
        let mut state = self.enter("generate_invoices")?;
        if dry_run {
            return Ok("Preview: 1 invoice would be generated".to_string());
        }
        let id = state.invoices.iter().map(|i| i.summary.id).max().unwrap_or(0) + 1;
        let number = format!("2024-{id:03}");
        state.invoices.push(invoice(id, &number));
        Ok(format!("Generated invoice {number}"))
    }

    fn get_all_invoices(&self) -> Result<Vec<InvoiceSummary>, BackendError> {
        let state = self.enter("get_all_invoices")?;
        Ok(state.invoices.iter().map(|i| i.summary.clone()).collect())
    }

    fn get_invoice_by_id(&self, id: i64) -> Result<InvoiceDetail, BackendError> {
        let state = self.enter("get_invoice_by_id")?;
        state
            .invoices
            .iter()
            .find(|i| i.summary.id == id)
            .cloned()
            .ok_or_else(|| BackendError::Command("Failed to get invoice: Query returned no rows".into()))
    }

    fn get_app_settings(&self) -> Result<AppSettings, BackendError> {
        Ok(self.enter("get_app_settings")?.settings.clone())
    }

    fn save_app_settings(&self, settings: &AppSettings) -> Result<(), BackendError> {
        let mut state = self.enter("save_app_settings")?;
        state.saved_settings.push(settings.clone());
        state.settings = settings.clone();
        if state.settings.output_directory.is_empty() {
            state.settings.output_directory = "/home/user/Documents/Invoices".to_string();
        }
        if let Some(dir) = state.settings.config_directory.as_mut().filter(|d| d.is_empty()) {
            *dir = "/home/user/.config/invoice".to_string();
        }
        Ok(())
    }

    fn reset_database(&self) -> Result<(), BackendError> {
        let mut state = self.enter("reset_database")?;
        state.invoices = vec![invoice(1, "EXAMPLE-001")];
        state.files = InvoiceFiles {
            sender: "Example Sender".into(),
            ..Default::default()
        };
        Ok(())
    }
}
