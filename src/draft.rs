use std::collections::BTreeMap;

use crate::model::InvoiceFiles;

/// One editable text field mirrored by the backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Field {
    Sender,
    BankDetails,
    Recipients,
    Description,
    Amount,
}

impl Field {
    /// Flat file the backend keeps for this field. Description and amount are
    /// written together through `save_invoice_details` instead.
    pub fn file_name(self) -> Option<&'static str> {
        match self {
            Field::Sender => Some("sender.txt"),
            Field::BankDetails => Some("bankdetails.txt"),
            Field::Recipients => Some("recipients.txt"),
            Field::Description | Field::Amount => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Tab {
    #[default]
    Sender,
    BankDetails,
    Recipients,
    Invoice,
    History,
    Settings,
}

impl Tab {
    pub const ALL: [Tab; 6] = [
        Tab::Sender,
        Tab::BankDetails,
        Tab::Recipients,
        Tab::Invoice,
        Tab::History,
        Tab::Settings,
    ];

    pub fn label(self) -> &'static str {
        match self {
            Tab::Sender => "Sender",
            Tab::BankDetails => "Bank Details",
            Tab::Recipients => "Recipients",
            Tab::Invoice => "Invoice",
            Tab::History => "History",
            Tab::Settings => "Settings",
        }
    }

    /// Fields whose editors live on this tab.
    ///
    /// The invoice tab is compound (description + amount); the plain editor
    /// tabs own a single field; history and settings own none. A new compound
    /// tab only has to list its fields here.
    pub fn fields(self) -> &'static [Field] {
        match self {
            Tab::Sender => &[Field::Sender],
            Tab::BankDetails => &[Field::BankDetails],
            Tab::Recipients => &[Field::Recipients],
            Tab::Invoice => &[Field::Description, Field::Amount],
            Tab::History | Tab::Settings => &[],
        }
    }
}

/// Per-field text mirrored from the backend files.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Draft {
    values: BTreeMap<Field, String>,
}

impl Draft {
    pub fn get(&self, field: Field) -> Option<&str> {
        self.values.get(&field).map(String::as_str)
    }

    pub fn set(&mut self, field: Field, value: impl Into<String>) {
        self.values.insert(field, value.into());
    }

    pub fn clear(&mut self) {
        self.values.clear();
    }

    /// Replaces every field with the bulk record.
    pub fn replace(&mut self, files: &InvoiceFiles) {
        self.values.clear();
        self.set(Field::Sender, files.sender.clone());
        self.set(Field::BankDetails, files.bankdetails.clone());
        self.set(Field::Recipients, files.recipients.clone());
        self.set(Field::Description, files.description.clone());
        self.set(Field::Amount, files.amount.clone());
    }

    /// Snapshot for persisting; absent fields become empty strings.
    pub fn to_files(&self) -> InvoiceFiles {
        let get = |f| self.get(f).unwrap_or_default().to_string();
        InvoiceFiles {
            sender: get(Field::Sender),
            bankdetails: get(Field::BankDetails),
            description: get(Field::Description),
            amount: get(Field::Amount),
            recipients: get(Field::Recipients),
        }
    }
}

/// Text buffers bound to the visible editors.
#[derive(Debug, Clone, Default)]
pub struct Editors {
    buffers: BTreeMap<Field, String>,
}

impl Editors {
    pub fn get(&self, field: Field) -> &str {
        self.buffers.get(&field).map_or("", String::as_str)
    }

    pub fn buffer_mut(&mut self, field: Field) -> &mut String {
        self.buffers.entry(field).or_default()
    }

    pub fn set(&mut self, field: Field, value: impl Into<String>) {
        self.buffers.insert(field, value.into());
    }

    /// Copies the editors of `tab` into the draft.
    pub fn flush(&self, tab: Tab, draft: &mut Draft) {
        for &field in tab.fields() {
            draft.set(field, self.get(field));
        }
    }

    /// Loads the editors of `tab` from the draft.
    pub fn hydrate(&mut self, tab: Tab, draft: &Draft) {
        for &field in tab.fields() {
            self.set(field, draft.get(field).unwrap_or_default());
        }
    }
}
