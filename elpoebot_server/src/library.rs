// Request handling for the poem server.
//
// `Library` owns the corpus provider, the book sink, the generator config,
// and the RNG. `server.rs` drives it from a single thread, so there is no
// locking: every request and every scheduled publication runs to completion
// before the next one starts, and each generation reads a fresh corpus
// snapshot.
//
// Responsibilities:
// - Answer `ClientMessage` requests with exactly one `ServerMessage`.
// - Vet externally submitted poems (`Poem::check_scheme`) before they reach
//   the book, keeping any timestamp or date they arrive with.
// - Rewrite single verses on request (`elpoebot_core::combine`).
// - Generate poems on demand and on the scheduler's cadence, appending
//   published ones to the book. A corpus below the minimum size is reported
//   to the requester, or logged and retried at the next interval.
//
// Anything added to the book comes back in `Outcome::published` so the
// server can broadcast it. Nothing here touches sockets.

use chrono::{DateTime, Utc};
use elpoebot_core::{GenerateError, GeneratorConfig, Poem, PoemRng, combine, generate_poem};
use elpoebot_protocol::{ClientMessage, ErrorKind, ServerMessage};
use elpoebot_store::{BookEntry, BookSink, CorpusProvider, StoreError};
use thiserror::Error;
use tracing::{info, warn};

/// Why a request failed.
#[derive(Debug, Error)]
pub enum ServeError {
    #[error(transparent)]
    Generate(#[from] GenerateError),
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error("rejected poem: {0}")]
    InvalidPoem(String),
    #[error("invalid verse: {0}")]
    InvalidVerse(&'static str),
}

impl ServeError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            ServeError::Generate(_) => ErrorKind::InsufficientCorpus,
            ServeError::Store(StoreError::InvalidVerse(_))
            | ServeError::InvalidPoem(_)
            | ServeError::InvalidVerse(_) => ErrorKind::InvalidRequest,
            ServeError::Store(_) => ErrorKind::Storage,
        }
    }

    fn into_message(self) -> ServerMessage {
        ServerMessage::Error {
            kind: self.kind(),
            message: self.to_string(),
        }
    }
}

/// Result of handling one request.
#[derive(Debug)]
pub struct Outcome {
    /// Reply to the requesting client.
    pub response: ServerMessage,
    /// Book entry to broadcast to every client, if the book grew.
    pub published: Option<BookEntry>,
}

impl Outcome {
    fn reply(response: ServerMessage) -> Self {
        Self {
            response,
            published: None,
        }
    }
}

pub struct Library {
    corpus: Box<dyn CorpusProvider>,
    book: Box<dyn BookSink>,
    config: GeneratorConfig,
    rng: PoemRng,
}

impl Library {
    pub fn new(
        corpus: Box<dyn CorpusProvider>,
        book: Box<dyn BookSink>,
        config: GeneratorConfig,
        rng: PoemRng,
    ) -> Self {
        Self {
            corpus,
            book,
            config,
            rng,
        }
    }

    /// Handle one client request. `Goodbye` has no response and yields `None`.
    pub fn handle(&mut self, message: ClientMessage, now: DateTime<Utc>) -> Option<Outcome> {
        let outcome = match message {
            ClientMessage::GetCorpus => match self.corpus.corpus() {
                Ok(lines) => Outcome::reply(ServerMessage::Corpus { lines }),
                Err(e) => self.failed(e.into()),
            },
            ClientMessage::AddVerse { verse } => match self.corpus.add_verse(&verse) {
                Ok(lines) => {
                    info!(corpus_len = lines.len(), "verse added");
                    Outcome::reply(ServerMessage::VerseAdded { lines })
                }
                Err(e) => self.failed(e.into()),
            },
            ClientMessage::GetBook => match self.book.book() {
                Ok(entries) => Outcome::reply(ServerMessage::Book { entries }),
                Err(e) => self.failed(e.into()),
            },
            ClientMessage::AddPoem {
                poem,
                timestamp,
                date,
            } => match self.add_poem(BookEntry::submitted(poem, timestamp, date, now)) {
                Ok(entry) => Outcome {
                    response: ServerMessage::PoemAdded {
                        entry: entry.clone(),
                    },
                    published: Some(entry),
                },
                Err(e) => self.failed(e),
            },
            ClientMessage::GeneratePoem { publish } => self.generate_on_request(publish, now),
            ClientMessage::Combine { verse } => {
                let verse = verse.trim();
                if verse.is_empty() {
                    self.failed(ServeError::InvalidVerse("verse is empty"))
                } else {
                    Outcome::reply(ServerMessage::Combinations {
                        verse: verse.to_string(),
                        combinations: combine(verse),
                    })
                }
            }
            ClientMessage::Goodbye => return None,
        };
        Some(outcome)
    }

    /// Scheduled publication: generate, append to the book, return the
    /// entry for broadcasting. `None` when the corpus is still too small or
    /// storage failed (both logged).
    pub fn publish_scheduled(&mut self, now: DateTime<Utc>) -> Option<BookEntry> {
        match self.generate().and_then(|poem| Ok(self.book.append(poem, now)?)) {
            Ok(entry) => {
                info!(kind = %entry.poem.kind(), lines = entry.poem.lines().len(), "published scheduled poem");
                Some(entry)
            }
            Err(ServeError::Generate(e)) => {
                info!("skipping scheduled poem: {e}; retrying next interval");
                None
            }
            Err(e) => {
                warn!("scheduled poem failed: {e}");
                None
            }
        }
    }

    fn generate(&mut self) -> Result<Poem, ServeError> {
        let snapshot = self.corpus.corpus()?;
        Ok(generate_poem(&snapshot, &self.config, &mut self.rng)?)
    }

    fn generate_on_request(&mut self, publish: bool, now: DateTime<Utc>) -> Outcome {
        let poem = match self.generate() {
            Ok(poem) => poem,
            Err(e) => return self.failed(e),
        };
        if !publish {
            return Outcome::reply(ServerMessage::Generated { poem, entry: None });
        }
        match self.book.append(poem.clone(), now) {
            Ok(entry) => {
                info!(kind = %poem.kind(), "published requested poem");
                Outcome {
                    response: ServerMessage::Generated {
                        poem,
                        entry: Some(entry.clone()),
                    },
                    published: Some(entry),
                }
            }
            Err(e) => self.failed(e.into()),
        }
    }

    fn add_poem(&mut self, entry: BookEntry) -> Result<BookEntry, ServeError> {
        entry.poem.check_scheme().map_err(ServeError::InvalidPoem)?;
        Ok(self.book.record(entry)?)
    }

    fn failed(&self, err: ServeError) -> Outcome {
        match err.kind() {
            ErrorKind::Storage => warn!("request failed: {err}"),
            _ => info!("request rejected: {err}"),
        }
        Outcome::reply(err.into_message())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use chrono::TimeZone;
    use elpoebot_core::PoemKind;
    use elpoebot_store::{MemoryBook, MemoryCorpus};

    fn library(verses: &[&str]) -> Library {
        Library::new(
            Box::new(MemoryCorpus::new(verses.iter().map(|v| v.to_string()).collect())),
            Box::new(MemoryBook::new()),
            GeneratorConfig::default(),
            PoemRng::new(42),
        )
    }

    fn respond(lib: &mut Library, msg: ClientMessage) -> Outcome {
        lib.handle(msg, Utc::now()).expect("request should be answered")
    }

    const PAIRS: [&str; 4] = ["casa vermella", "nit serena", "taula bella", "mar serena"];

    #[test]
    fn add_verse_then_get_corpus() {
        let mut lib = library(&[]);
        let out = respond(
            &mut lib,
            ClientMessage::AddVerse {
                verse: "  la lluna plena ".into(),
            },
        );
        assert_eq!(
            out.response,
            ServerMessage::VerseAdded {
                lines: vec!["la lluna plena".into()]
            }
        );
        let out = respond(&mut lib, ClientMessage::GetCorpus);
        assert_eq!(
            out.response,
            ServerMessage::Corpus {
                lines: vec!["la lluna plena".into()]
            }
        );
    }

    #[test]
    fn empty_verse_is_invalid_request() {
        let mut lib = library(&[]);
        let out = respond(&mut lib, ClientMessage::AddVerse { verse: "   ".into() });
        assert!(matches!(
            out.response,
            ServerMessage::Error {
                kind: ErrorKind::InvalidRequest,
                ..
            }
        ));
    }

    #[test]
    fn generate_reports_insufficient_corpus() {
        let mut lib = library(&PAIRS[..3]);
        let out = respond(&mut lib, ClientMessage::GeneratePoem { publish: true });
        match out.response {
            ServerMessage::Error { kind, message } => {
                assert_eq!(kind, ErrorKind::InsufficientCorpus);
                assert!(message.contains("insufficient"), "message: {message}");
            }
            other => panic!("expected Error, got {other:?}"),
        }
        assert!(out.published.is_none());
    }

    #[test]
    fn generate_without_publish_leaves_book_alone() {
        let mut lib = library(&PAIRS);
        let out = respond(&mut lib, ClientMessage::GeneratePoem { publish: false });
        match out.response {
            ServerMessage::Generated { poem, entry } => {
                assert_eq!(poem.kind(), PoemKind::Abab);
                assert!(entry.is_none());
            }
            other => panic!("expected Generated, got {other:?}"),
        }
        assert!(out.published.is_none());
        let book = respond(&mut lib, ClientMessage::GetBook);
        assert_eq!(book.response, ServerMessage::Book { entries: vec![] });
    }

    #[test]
    fn generate_with_publish_appends_and_broadcasts() {
        let mut lib = library(&PAIRS);
        let out = respond(&mut lib, ClientMessage::GeneratePoem { publish: true });
        let published = out.published.expect("should broadcast");
        match out.response {
            ServerMessage::Generated { poem, entry } => {
                assert_eq!(entry.as_ref(), Some(&published));
                assert_eq!(poem, published.poem);
            }
            other => panic!("expected Generated, got {other:?}"),
        }
        let book = respond(&mut lib, ClientMessage::GetBook);
        assert_eq!(
            book.response,
            ServerMessage::Book {
                entries: vec![published]
            }
        );
    }

    #[test]
    fn add_poem_rejects_broken_quatrain() {
        let mut lib = library(&PAIRS);
        let poem = Poem::Abab {
            lines: [
                "casa vermella".into(),
                "nit serena".into(),
                "flor plena".into(),
                "mar serena".into(),
            ],
            rhymes: ("ella".into(), "rena".into()),
        };
        let out = respond(
            &mut lib,
            ClientMessage::AddPoem {
                poem,
                timestamp: None,
                date: None,
            },
        );
        assert!(matches!(
            out.response,
            ServerMessage::Error {
                kind: ErrorKind::InvalidRequest,
                ..
            }
        ));
        assert!(out.published.is_none());
    }

    #[test]
    fn add_poem_accepts_free_poem() {
        let mut lib = library(&[]);
        let poem = Poem::Free {
            lines: vec!["u".into(), "dos".into()],
        };
        let now = Utc::now();
        let out = lib
            .handle(
                ClientMessage::AddPoem {
                    poem: poem.clone(),
                    timestamp: None,
                    date: None,
                },
                now,
            )
            .unwrap();
        match out.response {
            ServerMessage::PoemAdded { entry } => {
                assert_eq!(entry.poem, poem);
                assert_eq!(entry.timestamp, now);
            }
            other => panic!("expected PoemAdded, got {other:?}"),
        }
        assert!(out.published.is_some());
    }

    #[test]
    fn add_poem_keeps_supplied_stamps() {
        let mut lib = library(&[]);
        let written = Utc.timestamp_opt(1_700_000_000, 0).unwrap();
        let msg = ClientMessage::AddPoem {
            poem: Poem::Free {
                lines: vec!["u".into()],
            },
            timestamp: Some(written),
            date: Some("14/11/2023, 22:13:20".into()),
        };
        let out = respond(&mut lib, msg);
        let entry = out.published.expect("accepted poem is broadcast");
        assert_eq!(entry.timestamp, written);
        assert_eq!(entry.date, "14/11/2023, 22:13:20");
        assert_eq!(
            respond(&mut lib, ClientMessage::GetBook).response,
            ServerMessage::Book {
                entries: vec![entry]
            }
        );
    }

    #[test]
    fn combine_answers_without_touching_stores() {
        let mut lib = library(&PAIRS);
        let out = respond(
            &mut lib,
            ClientMessage::Combine {
                verse: "  nit serena ".into(),
            },
        );
        assert!(out.published.is_none());
        match out.response {
            ServerMessage::Combinations {
                verse,
                combinations,
            } => {
                assert_eq!(verse, "nit serena");
                assert_eq!(combinations, combine("nit serena"));
            }
            other => panic!("expected Combinations, got {other:?}"),
        }
        let corpus = respond(&mut lib, ClientMessage::GetCorpus);
        assert_eq!(
            corpus.response,
            ServerMessage::Corpus {
                lines: PAIRS.map(String::from).to_vec()
            }
        );

        let empty = respond(&mut lib, ClientMessage::Combine { verse: " ".into() });
        assert!(matches!(
            empty.response,
            ServerMessage::Error {
                kind: ErrorKind::InvalidRequest,
                ..
            }
        ));
    }

    #[test]
    fn goodbye_has_no_response() {
        let mut lib = library(&[]);
        assert!(lib.handle(ClientMessage::Goodbye, Utc::now()).is_none());
    }

    #[test]
    fn scheduled_publication_waits_for_corpus() {
        let mut lib = library(&PAIRS[..2]);
        assert!(lib.publish_scheduled(Utc::now()).is_none());

        respond(&mut lib, ClientMessage::AddVerse { verse: PAIRS[2].into() });
        respond(&mut lib, ClientMessage::AddVerse { verse: PAIRS[3].into() });
        let entry = lib.publish_scheduled(Utc::now()).expect("corpus is now large enough");
        entry.poem.check_scheme().unwrap();

        let book = respond(&mut lib, ClientMessage::GetBook);
        assert_eq!(book.response, ServerMessage::Book { entries: vec![entry] });
    }
}
