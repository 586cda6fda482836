//! Response store and training rows
//!
//! The training source is a CSV with four columns: example text, intent
//! label, canned response, provenance tag. A leading `example,intent,...`
//! header row is optional and survives rewrites.
//! The same file feeds the example classifier and the canned replies.
//!
//! Every edit rewrites the file and reloads the in-memory table before
//! returning, so a reply chosen after an edit always sees the edit.

use crate::error::BankError;
use crate::Result;
use csv::{QuoteStyle, ReaderBuilder, StringRecord, WriterBuilder};
use rand::seq::SliceRandom;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs::{File, OpenOptions};
use std::io::{self, Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};
use tokio::sync::{Mutex, RwLock};
use tracing::{debug, info, warn};

/// Provenance tag for rows added through the admin interface
pub const SOURCE_ADMIN: &str = "admin_added";

/// Intent label mapped to its candidate replies, in file order
pub type ResponseTable = HashMap<String, Vec<String>>;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct TrainingRow {
    pub example: String,
    pub intent: String,
    pub response: String,
    pub source: String,
}

impl TrainingRow {
    fn from_record(record: &StringRecord) -> Option<Self> {
        if record.len() < 3 || record.len() > 4 {
            return None;
        }

        let intent = record.get(1)?.trim();
        let response = record.get(2)?;
        if intent.is_empty() || response.trim().is_empty() {
            return None;
        }

        Some(Self {
            example: record.get(0)?.to_string(),
            intent: intent.to_string(),
            response: response.to_string(),
            source: record.get(3).unwrap_or_default().to_string(),
        })
    }

    fn to_record(&self) -> [&str; 4] {
        [
            self.example.as_str(),
            self.intent.as_str(),
            self.response.as_str(),
            self.source.as_str(),
        ]
    }
}

/// Parsed training file. `header` is kept so a rewrite puts it back.
#[derive(Debug, Default)]
struct TrainingFile {
    header: Option<StringRecord>,
    rows: Vec<TrainingRow>,
}

fn is_header(record: &StringRecord) -> bool {
    matches!(
        (record.get(0), record.get(1)),
        (Some(a), Some(b)) if a.eq_ignore_ascii_case("example") && b.eq_ignore_ascii_case("intent")
    )
}

fn read_training_file(path: &Path) -> Result<TrainingFile> {
    if !path.exists() {
        warn!(path = %path.display(), "Training source not found");
        return Ok(TrainingFile::default());
    }

    let mut reader = ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_path(path)?;

    let mut file = TrainingFile::default();
    for (line, record) in reader.records().enumerate() {
        let record = match record {
            Ok(record) => record,
            Err(e) => {
                debug!(line = line + 1, "Skipping unreadable training row: {}", e);
                continue;
            }
        };

        if line == 0 && is_header(&record) {
            file.header = Some(record);
            continue;
        }

        match TrainingRow::from_record(&record) {
            Some(row) => file.rows.push(row),
            None => debug!(line = line + 1, "Skipping malformed training row"),
        }
    }

    Ok(file)
}

fn write_training_file(path: &Path, file: &TrainingFile) -> Result<()> {
    let mut writer = WriterBuilder::new()
        .has_headers(false)
        .quote_style(QuoteStyle::Always)
        .from_path(path)?;

    if let Some(header) = &file.header {
        writer.write_record(header)?;
    }
    for row in &file.rows {
        writer.write_record(row.to_record())?;
    }
    writer.flush()?;
    Ok(())
}

/// True when the file is missing, empty, or already ends with a line break
fn ends_with_newline(path: &Path) -> Result<bool> {
    let mut file = match File::open(path) {
        Ok(file) => file,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(true),
        Err(e) => return Err(e.into()),
    };
    if file.metadata()?.len() == 0 {
        return Ok(true);
    }

    let mut last = [0u8; 1];
    file.seek(SeekFrom::End(-1))?;
    file.read_exact(&mut last)?;
    Ok(last[0] == b'\n')
}

/// Read the training rows at `path`, skipping malformed ones
pub fn read_training_rows(path: &Path) -> Result<Vec<TrainingRow>> {
    Ok(read_training_file(path)?.rows)
}

/// Group rows by intent, preserving file order inside each group
pub fn build_table(rows: &[TrainingRow]) -> ResponseTable {
    let mut table = ResponseTable::new();
    for row in rows {
        table
            .entry(row.intent.clone())
            .or_default()
            .push(row.response.clone());
    }
    table
}

pub struct ResponseStore {
    path: PathBuf,
    table: RwLock<ResponseTable>,
    /// Serialises edit + reload sequences against each other
    edit_lock: Mutex<()>,
}

impl ResponseStore {
    /// Create an empty store bound to `path`. Call [`ResponseStore::load`] to populate it.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            table: RwLock::new(ResponseTable::new()),
            edit_lock: Mutex::new(()),
        }
    }

    /// Create a store and load it immediately
    pub async fn open(path: impl Into<PathBuf>) -> Result<Self> {
        let store = Self::new(path);
        store.load().await?;
        Ok(store)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Replace the whole table with the current contents of the source.
    /// Returns the number of rows loaded.
    pub async fn load(&self) -> Result<usize> {
        let rows = read_training_rows(&self.path)?;
        let table = build_table(&rows);

        *self.table.write().await = table;
        info!(rows = rows.len(), path = %self.path.display(), "Responses loaded");
        Ok(rows.len())
    }

    /// Pick one candidate reply for `intent` at random, or `fallback` if none exist
    pub async fn get_random(&self, intent: &str, fallback: &str) -> String {
        let table = self.table.read().await;
        table
            .get(intent)
            .and_then(|candidates| candidates.choose(&mut rand::thread_rng()))
            .cloned()
            .unwrap_or_else(|| fallback.to_string())
    }

    pub async fn candidates(&self, intent: &str) -> Vec<String> {
        self.table
            .read()
            .await
            .get(intent)
            .cloned()
            .unwrap_or_default()
    }

    pub async fn snapshot(&self) -> ResponseTable {
        self.table.read().await.clone()
    }

    /// All well-formed rows, in file order. Indices match [`ResponseStore::delete_row`].
    pub async fn rows(&self) -> Result<Vec<TrainingRow>> {
        let _guard = self.edit_lock.lock().await;
        read_training_rows(&self.path)
    }

    /// Append a row tagged `admin_added`, then reload
    pub async fn append_row(&self, example: &str, intent: &str, response: &str) -> Result<()> {
        let (example, intent, response) = (example.trim(), intent.trim(), response.trim());
        if example.is_empty() || intent.is_empty() || response.is_empty() {
            return Err(BankError::TrainingDataError(
                "example, intent and response are all required".to_string(),
            ));
        }

        let _guard = self.edit_lock.lock().await;

        let row = TrainingRow {
            example: example.to_string(),
            intent: intent.to_string(),
            response: response.to_string(),
            source: SOURCE_ADMIN.to_string(),
        };

        let needs_newline = !ends_with_newline(&self.path)?;
        let mut handle = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;
        if needs_newline {
            handle.write_all(b"\n")?;
        }
        let mut writer = WriterBuilder::new()
            .has_headers(false)
            .quote_style(QuoteStyle::Always)
            .from_writer(handle);
        writer.write_record(row.to_record())?;
        writer.flush()?;

        info!(%intent, "Training row appended");
        self.load().await?;
        Ok(())
    }

    /// Delete the row at `index` (position among well-formed rows), then reload
    pub async fn delete_row(&self, index: usize) -> Result<TrainingRow> {
        let _guard = self.edit_lock.lock().await;

        let mut file = read_training_file(&self.path)?;
        if index >= file.rows.len() {
            return Err(BankError::TrainingDataError(format!(
                "Invalid row index {} ({} rows)",
                index,
                file.rows.len()
            )));
        }

        let removed = file.rows.remove(index);
        write_training_file(&self.path, &file)?;

        info!(index, intent = %removed.intent, "Training row deleted");
        self.load().await?;
        Ok(removed)
    }
}
