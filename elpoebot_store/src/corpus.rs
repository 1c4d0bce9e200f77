// Verse corpus storage.
//
// On disk the corpus is plain UTF-8 text, one verse per line. Blank lines and
// lines starting with `#` are skipped when reading, so the file can carry
// comments and a hand-edited header. Appending writes `verse + "\n"`, first
// adding a newline if the file doesn't already end with one.
//
// Verses are trimmed before they're stored. Empty verses, verses containing
// a line break (they'd split into several verses on the next read), and
// verses starting with `#` (they'd read back as comments) are rejected.

use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

use tracing::info;

use crate::error::StoreError;

/// Source of the current corpus, plus the single mutation it allows.
pub trait CorpusProvider: Send {
    /// Current verses, in insertion order.
    fn corpus(&self) -> Result<Vec<String>, StoreError>;

    /// Append one verse and return the updated corpus.
    fn add_verse(&mut self, verse: &str) -> Result<Vec<String>, StoreError>;
}

/// Parse corpus file contents into verses.
pub fn parse_corpus(text: &str) -> Vec<String> {
    text.lines()
        .filter(|line| !line.trim().is_empty() && !line.starts_with('#'))
        .map(str::to_string)
        .collect()
}

/// Trim and validate a submitted verse.
pub fn normalize_verse(verse: &str) -> Result<&str, StoreError> {
    let verse = verse.trim();
    if verse.is_empty() {
        return Err(StoreError::InvalidVerse("verse is empty"));
    }
    if verse.contains(['\n', '\r']) {
        return Err(StoreError::InvalidVerse("verse spans more than one line"));
    }
    if verse.starts_with('#') {
        return Err(StoreError::InvalidVerse("verse may not start with '#'"));
    }
    Ok(verse)
}

/// Corpus stored in a text file.
#[derive(Debug, Clone)]
pub struct FileCorpus {
    path: PathBuf,
}

impl FileCorpus {
    /// Open the corpus file, creating it (and its directory) if missing.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let path = path.into();
        if !path.exists() {
            if let Some(parent) = path.parent() {
                fs::create_dir_all(parent).map_err(StoreError::io(parent))?;
            }
            fs::write(&path, "").map_err(StoreError::io(&path))?;
            info!(path = %path.display(), "created empty corpus file");
        }
        Ok(Self { path })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read(&self) -> Result<String, StoreError> {
        fs::read_to_string(&self.path).map_err(StoreError::io(&self.path))
    }
}

impl CorpusProvider for FileCorpus {
    fn corpus(&self) -> Result<Vec<String>, StoreError> {
        Ok(parse_corpus(&self.read()?))
    }

    fn add_verse(&mut self, verse: &str) -> Result<Vec<String>, StoreError> {
        let verse = normalize_verse(verse)?;
        let mut data = self.read()?;

        let mut addition = String::new();
        if !data.is_empty() && !data.ends_with('\n') {
            addition.push('\n');
        }
        addition.push_str(verse);
        addition.push('\n');

        let mut file = OpenOptions::new()
            .append(true)
            .open(&self.path)
            .map_err(StoreError::io(&self.path))?;
        file.write_all(addition.as_bytes())
            .map_err(StoreError::io(&self.path))?;

        data.push_str(&addition);
        Ok(parse_corpus(&data))
    }
}

/// Corpus held in memory; for tests and embedding.
#[derive(Debug, Clone, Default)]
pub struct MemoryCorpus {
    verses: Vec<String>,
}

impl MemoryCorpus {
    pub fn new(verses: Vec<String>) -> Self {
        Self { verses }
    }
}

impl CorpusProvider for MemoryCorpus {
    fn corpus(&self) -> Result<Vec<String>, StoreError> {
        Ok(self.verses.clone())
    }

    fn add_verse(&mut self, verse: &str) -> Result<Vec<String>, StoreError> {
        let verse = normalize_verse(verse)?;
        self.verses.push(verse.to_string());
        Ok(self.verses.clone())
    }
}
