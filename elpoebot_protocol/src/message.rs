// Protocol messages between clients and the poem server.
//
// - `ClientMessage`: requests (read the corpus, submit a verse, read the
//   book, submit a poem, ask for a poem to be generated, rewrite a verse)
//   plus `Goodbye`.
// - `ServerMessage`: one response per request, in request order, plus the
//   unsolicited `PoemPublished` broadcast the server's scheduler sends to
//   every connected client when it adds a poem to the book.
//
// Requests never get more than one response; clients tell responses from
// broadcasts with `ServerMessage::is_broadcast`.

use chrono::{DateTime, Utc};
use elpoebot_core::{Combination, Poem};
use elpoebot_store::BookEntry;
use serde::{Deserialize, Serialize};

/// Messages sent by a client to the server.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum ClientMessage {
    /// Fetch every verse in the corpus.
    GetCorpus,
    /// Append one verse to the corpus.
    AddVerse { verse: String },
    /// Fetch the whole book.
    GetBook,
    /// Record an externally composed poem in the book. Stamps the client
    /// supplies are kept; missing ones are filled in by the server.
    AddPoem {
        poem: Poem,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        timestamp: Option<DateTime<Utc>>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        date: Option<String>,
    },
    /// Rewrite one verse every way `elpoebot_core::combine` knows. Touches
    /// neither the corpus nor the book.
    Combine { verse: String },
    /// Generate a poem from the current corpus. With `publish`, the poem is
    /// also appended to the book and broadcast.
    GeneratePoem { publish: bool },
    /// Client is disconnecting.
    Goodbye,
}

/// Messages sent by the server to a client.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum ServerMessage {
    Corpus { lines: Vec<String> },
    /// The corpus after the verse was appended.
    VerseAdded { lines: Vec<String> },
    Book { entries: Vec<BookEntry> },
    PoemAdded { entry: BookEntry },
    Combinations {
        verse: String,
        combinations: Vec<Combination>,
    },
    /// A freshly generated poem; `entry` is set when it was published.
    Generated {
        poem: Poem,
        entry: Option<BookEntry>,
    },
    /// Broadcast: a poem was just added to the book.
    PoemPublished { entry: BookEntry },
    /// The request could not be served.
    Error { kind: ErrorKind, message: String },
}

impl ServerMessage {
    /// Unsolicited messages, not tied to any request.
    pub fn is_broadcast(&self) -> bool {
        matches!(self, ServerMessage::PoemPublished { .. })
    }
}

/// Coarse category of a failed request.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum ErrorKind {
    /// Too few verses to generate a poem; retry once the corpus grows.
    InsufficientCorpus,
    /// The request itself was rejected (empty verse, inconsistent poem).
    InvalidRequest,
    /// Corpus or book storage failed.
    Storage,
}
