use chrono::{DateTime, NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

/// Bulk record returned by `read_all_files`.
#[derive(Debug, Serialize, Deserialize, Clone, Default, PartialEq, Eq)]
pub struct InvoiceFiles {
    pub sender: String,
    pub bankdetails: String,
    pub description: String,
    pub amount: String,
    pub recipients: String,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct InvoiceSummary {
    pub id: i64,
    pub invoice_number: String,
    pub service: String,
    pub invoice_date: String,
    pub due_date: String,
    pub created_at: String,
    // Only some backend builds send these
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vat_enabled: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vat_rate: Option<i32>,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct InvoiceDetail {
    #[serde(flatten)]
    pub summary: InvoiceSummary,
    pub pdf_base64: String,
}

#[derive(Debug, Serialize, Deserialize, Clone, Default, PartialEq, Eq)]
pub struct AppSettings {
    pub output_directory: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub config_directory: Option<String>,
}

/// Renders a backend timestamp as `Jan 5, 2024`.
///
/// Accepts RFC 3339, SQLite's `YYYY-MM-DD HH:MM:SS` and bare dates. Anything
/// else is shown as received.
pub fn format_date(raw: &str) -> String {
    let raw = raw.trim();
    if raw.is_empty() {
        return String::new();
    }

    let date = DateTime::parse_from_rfc3339(raw)
        .map(|dt| dt.date_naive())
        .or_else(|_| NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S").map(|dt| dt.date()))
        .or_else(|_| NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S").map(|dt| dt.date()))
        .or_else(|_| NaiveDate::parse_from_str(raw, "%Y-%m-%d"));

    match date {
        Ok(d) => d.format("%b %-d, %Y").to_string(),
        Err(_) => raw.to_string(),
    }
}
