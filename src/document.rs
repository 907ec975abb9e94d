//! Embedded invoice PDFs: decoding and writing them to disk.

use std::fs::{self, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;

#[derive(Debug, thiserror::Error)]
pub enum DocumentError {
    #[error("invalid document encoding: {0}")]
    Decode(#[from] base64::DecodeError),
    #[error("failed to write {}: {source}", path.display())]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },
}

pub fn decode_pdf(encoded: &str) -> Result<Vec<u8>, DocumentError> {
    let compact: String = encoded.chars().filter(|c| !c.is_ascii_whitespace()).collect();
    Ok(STANDARD.decode(compact)?)
}

fn stem(invoice_number: &str) -> String {
    let safe: String = invoice_number
        .chars()
        .map(|c| if matches!(c, '/' | '\\' | ':') { '-' } else { c })
        .collect();
    format!("invoice-{safe}")
}

/// `invoice-<number>.pdf`, with path separators in the number neutralised.
pub fn file_name(invoice_number: &str) -> String {
    format!("{}.pdf", stem(invoice_number))
}

/// Writes the document into `dir`, replacing any earlier copy.
pub fn store(dir: &Path, invoice_number: &str, bytes: &[u8]) -> Result<PathBuf, DocumentError> {
    let path = dir.join(file_name(invoice_number));
    fs::create_dir_all(dir)
        .and_then(|()| fs::write(&path, bytes))
        .map_err(|source| DocumentError::Write {
            path: path.clone(),
            source,
        })?;
    Ok(path)
}

/// Writes the document into `dir` without replacing anything already there.
/// A taken name gets a ` (n)` suffix: `invoice-7 (1).pdf`.
pub fn store_unique(dir: &Path, invoice_number: &str, bytes: &[u8]) -> Result<PathBuf, DocumentError> {
    fs::create_dir_all(dir).map_err(|source| DocumentError::Write {
        path: dir.to_path_buf(),
        source,
    })?;
    let stem = stem(invoice_number);
    let mut n = 0u32;
    loop {
        let name = match n {
            0 => format!("{stem}.pdf"),
            n => format!("{stem} ({n}).pdf"),
        };
        let path = dir.join(name);
        match OpenOptions::new().write(true).create_new(true).open(&path) {
            Ok(mut file) => {
                return match file.write_all(bytes) {
                    Ok(()) => Ok(path),
                    Err(source) => Err(DocumentError::Write { path, source }),
                };
            }
            Err(e) if e.kind() == io::ErrorKind::AlreadyExists => n += 1,
            Err(source) => return Err(DocumentError::Write { path, source }),
        }
    }
}
