// elpoebot_store: persistence for the verse corpus and the poem book.
//
// The generator never touches storage; it is handed a corpus snapshot. This
// crate supplies that snapshot and records finished poems, behind two traits:
//
// - `CorpusProvider`: read the current verses, append one verse.
// - `BookSink`: read the book, append a poem with its creation timestamp.
//
// Module overview:
// - `corpus.rs`: `CorpusProvider`, `FileCorpus` (plain-text `corpus.txt`,
//                one verse per line, `#` comments), `MemoryCorpus`.
// - `book.rs`:   `BookEntry`, `BookSink`, `FileBook` (pretty JSON array in
//                `book.json`), `MemoryBook`.
// - `error.rs`:  `StoreError`.
//
// Both stores are append-only: nothing here edits or removes a verse or an
// entry. File stores create their file (and data directory) on open.

pub mod book;
pub mod corpus;
pub mod error;

use std::path::Path;

pub use book::{BookEntry, BookSink, FileBook, MemoryBook, local_date};
pub use corpus::{CorpusProvider, FileCorpus, MemoryCorpus};
pub use error::StoreError;

/// File name of the corpus inside a data directory.
pub const CORPUS_FILE: &str = "corpus.txt";
/// File name of the book inside a data directory.
pub const BOOK_FILE: &str = "book.json";

/// Open (creating if needed) the corpus and book files in `dir`.
pub fn open_data_dir(dir: &Path) -> Result<(FileCorpus, FileBook), StoreError> {
    let corpus = FileCorpus::open(dir.join(CORPUS_FILE))?;
    let book = FileBook::open(dir.join(BOOK_FILE))?;
    Ok((corpus, book))
}
