use std::io::{BufRead, BufReader, Write};
use std::process::{Child, ChildStdin, ChildStdout, Command, Stdio};
use std::sync::Mutex;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use super::{Backend, BackendError};
use crate::model::{AppSettings, InvoiceDetail, InvoiceFiles, InvoiceSummary};

/// One line on the backend's stdin.
#[derive(Debug, Serialize, PartialEq)]
#[serde(tag = "cmd", content = "args", rename_all = "snake_case")]
pub enum Request<'a> {
    ReadAllFiles,
    WriteFile {
        #[serde(rename = "filePath")]
        file_path: &'a str,
        content: &'a str,
    },
    SaveInvoiceDetails {
        description: &'a str,
        amount: &'a str,
    },
    GenerateInvoices {
        #[serde(rename = "dryRun")]
        dry_run: bool,
    },
    GetAllInvoices,
    GetInvoiceById {
        id: i64,
    },
    GetAppSettings,
    SaveAppSettings {
        settings: &'a AppSettings,
    },
    ResetDatabase,
}

impl Request<'_> {
    pub fn name(&self) -> &'static str {
        match self {
            Request::ReadAllFiles => "read_all_files",
            Request::WriteFile { .. } => "write_file",
            Request::SaveInvoiceDetails { .. } => "save_invoice_details",
            Request::GenerateInvoices { .. } => "generate_invoices",
            Request::GetAllInvoices => "get_all_invoices",
            Request::GetInvoiceById { .. } => "get_invoice_by_id",
            Request::GetAppSettings => "get_app_settings",
            Request::SaveAppSettings { .. } => "save_app_settings",
            Request::ResetDatabase => "reset_database",
        }
    }
}

/// One line on the backend's stdout.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "lowercase")]
enum Reply {
    Ok(serde_json::Value),
    Err(String),
}

/// Newline-delimited JSON framing over any reader/writer pair.
#[derive(Debug)]
pub struct Transport<R, W> {
    reader: R,
    writer: W,
}

impl<R: BufRead, W: Write> Transport<R, W> {
    pub fn new(reader: R, writer: W) -> Self {
        Self { reader, writer }
    }

    pub fn round_trip<T: DeserializeOwned>(&mut self, request: &Request) -> Result<T, BackendError> {
        let mut line = serde_json::to_string(request)?;
        line.push('\n');
        self.writer.write_all(line.as_bytes())?;
        self.writer.flush()?;

        let mut reply = String::new();
        if self.reader.read_line(&mut reply)? == 0 {
            return Err(BackendError::Closed);
        }

        match serde_json::from_str::<Reply>(reply.trim_end())? {
            Reply::Ok(value) => Ok(serde_json::from_value(value)?),
            Reply::Err(message) => Err(BackendError::Command(message)),
        }
    }

    #[cfg(test)]
    pub fn into_parts(self) -> (R, W) {
        (self.reader, self.writer)
    }
}

/// Backend reached through a child process speaking the line protocol.
pub struct ProcessBackend {
    child: Mutex<Child>,
    transport: Mutex<Transport<BufReader<ChildStdout>, ChildStdin>>,
}

impl ProcessBackend {
    pub fn spawn(program: &str, args: &[String]) -> Result<Self, BackendError> {
        let mut child = Command::new(program)
            .args(args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::inherit())
            .spawn()?;

        let stdin = child.stdin.take().ok_or(BackendError::Closed)?;
        let stdout = child.stdout.take().ok_or(BackendError::Closed)?;
        tracing::info!(%program, pid = child.id(), "backend process started");

        Ok(Self {
            child: Mutex::new(child),
            transport: Mutex::new(Transport::new(BufReader::new(stdout), stdin)),
        })
    }

    fn call<T: DeserializeOwned>(&self, request: Request) -> Result<T, BackendError> {
        let cmd = request.name();
        tracing::debug!(cmd, "backend request");
        // The pipe carries one exchange at a time.
        let mut transport = self.transport.lock().map_err(|_| BackendError::Closed)?;
        let result = transport.round_trip(&request);
        if let Err(e) = &result {
            tracing::debug!(cmd, error = %e, "backend request failed");
        }
        result
    }
}

impl Drop for ProcessBackend {
    fn drop(&mut self) {
        if let Ok(child) = self.child.get_mut() {
            if let Err(e) = child.kill() {
                tracing::debug!(error = %e, "backend process already gone");
            }
            if let Err(e) = child.wait() {
                tracing::debug!(error = %e, "failed to reap backend process");
            }
        }
    }
}

impl Backend for ProcessBackend {
    fn read_all_files(&self) -> Result<InvoiceFiles, BackendError> {
        self.call(Request::ReadAllFiles)
    }

    fn write_file(&self, file_path: &str, content: &str) -> Result<(), BackendError> {
        self.call(Request::WriteFile { file_path, content })
    }

    fn save_invoice_details(&self, description: &str, amount: &str) -> Result<(), BackendError> {
        self.call(Request::SaveInvoiceDetails {
            description,
            amount,
        })
    }

    fn generate_invoices(&self, dry_run: bool) -> Result<String, BackendError> {
        self.call(Request::GenerateInvoices { dry_run })
    }

    fn get_all_invoices(&self) -> Result<Vec<InvoiceSummary>, BackendError> {
        self.call(Request::GetAllInvoices)
    }

    fn get_invoice_by_id(&self, id: i64) -> Result<InvoiceDetail, BackendError> {
        self.call(Request::GetInvoiceById { id })
    }

    fn get_app_settings(&self) -> Result<AppSettings, BackendError> {
        self.call(Request::GetAppSettings)
    }

    fn save_app_settings(&self, settings: &AppSettings) -> Result<(), BackendError> {
        self.call(Request::SaveAppSettings { settings })
    }

    fn reset_database(&self) -> Result<(), BackendError> {
        self.call(Request::ResetDatabase)
    }
}
