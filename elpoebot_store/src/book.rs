// The book: an append-only record of published poems.
//
// Each `BookEntry` is a poem stamped with its creation time, stored twice:
// `timestamp` (UTC, RFC 3339) for machines and `date` (local time,
// day/month/year) for people reading the file. The poem's own fields are
// flattened into the entry, so a stored entry looks like
//
//   {"kind":"ABAB","lines":[…],"rhymes":["ella","rena"],
//    "timestamp":"2026-10-18T12:00:00Z","date":"18/10/2026, 14:00:00"}
//
// `FileBook` keeps the whole book as a pretty-printed JSON array and rewrites
// it on every append, via a temporary file and rename so a crash mid-write
// can't truncate the book. A missing or blank file reads as an empty book.

use std::fs;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Local, Utc};
use elpoebot_core::Poem;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::error::StoreError;

/// Display format of `BookEntry::date`.
pub const DATE_FORMAT: &str = "%d/%m/%Y, %H:%M:%S";

/// A poem as recorded in the book.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct BookEntry {
    #[serde(flatten)]
    pub poem: Poem,
    pub timestamp: DateTime<Utc>,
    pub date: String,
}

impl BookEntry {
    pub fn new(poem: Poem, timestamp: DateTime<Utc>) -> Self {
        Self {
            poem,
            timestamp,
            date: local_date(timestamp),
        }
    }

    /// Entry for a poem that arrives with its own stamps. Whichever of
    /// `timestamp` and `date` is missing is filled in from `now`; supplied
    /// values are kept verbatim.
    pub fn submitted(
        poem: Poem,
        timestamp: Option<DateTime<Utc>>,
        date: Option<String>,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            poem,
            timestamp: timestamp.unwrap_or(now),
            date: date.unwrap_or_else(|| local_date(now)),
        }
    }
}

/// `instant` in local time, formatted with `DATE_FORMAT`.
pub fn local_date(instant: DateTime<Utc>) -> String {
    instant.with_timezone(&Local).format(DATE_FORMAT).to_string()
}

/// Append-only destination for finished poems.
pub trait BookSink: Send {
    /// All entries, oldest first.
    fn book(&self) -> Result<Vec<BookEntry>, StoreError>;

    /// Store a complete entry as-is and return it.
    fn record(&mut self, entry: BookEntry) -> Result<BookEntry, StoreError>;

    /// Record a poem created at `timestamp` and return the stored entry.
    fn append(&mut self, poem: Poem, timestamp: DateTime<Utc>) -> Result<BookEntry, StoreError> {
        self.record(BookEntry::new(poem, timestamp))
    }
}

/// Book stored as a JSON array in a file.
#[derive(Debug, Clone)]
pub struct FileBook {
    path: PathBuf,
}

impl FileBook {
    /// Open the book file, creating an empty book (and its directory) if
    /// missing.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let path = path.into();
        if !path.exists() {
            if let Some(parent) = path.parent() {
                fs::create_dir_all(parent).map_err(StoreError::io(parent))?;
            }
            fs::write(&path, "[]").map_err(StoreError::io(&path))?;
            info!(path = %path.display(), "created empty book file");
        }
        Ok(Self { path })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn write(&self, entries: &[BookEntry]) -> Result<(), StoreError> {
        let json = serde_json::to_string_pretty(entries).map_err(StoreError::json(&self.path))?;
        let tmp = self.path.with_extension("json.tmp");
        fs::write(&tmp, json).map_err(StoreError::io(&tmp))?;
        fs::rename(&tmp, &self.path).map_err(StoreError::io(&self.path))
    }
}

impl BookSink for FileBook {
    fn book(&self) -> Result<Vec<BookEntry>, StoreError> {
        let data = match fs::read_to_string(&self.path) {
            Ok(data) => data,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(StoreError::io(&self.path)(e)),
        };
        if data.trim().is_empty() {
            return Ok(Vec::new());
        }
        serde_json::from_str(&data).map_err(StoreError::json(&self.path))
    }

    fn record(&mut self, entry: BookEntry) -> Result<BookEntry, StoreError> {
        let mut entries = self.book()?;
        entries.push(entry.clone());
        self.write(&entries)?;
        Ok(entry)
    }
}

/// Book held in memory; for tests and embedding.
#[derive(Debug, Clone, Default)]
pub struct MemoryBook {
    entries: Vec<BookEntry>,
}

impl MemoryBook {
    pub fn new() -> Self {
        Self::default()
    }
}

impl BookSink for MemoryBook {
    fn book(&self) -> Result<Vec<BookEntry>, StoreError> {
        Ok(self.entries.clone())
    }

    fn record(&mut self, entry: BookEntry) -> Result<BookEntry, StoreError> {
        self.entries.push(entry.clone());
        Ok(entry)
    }
}
