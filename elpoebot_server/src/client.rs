// Blocking TCP client for the poem server.
//
// - `connect()` opens the TCP connection and spawns a reader thread that
//   `recv`s `ServerMessage`s into an `mpsc` channel.
// - Request helpers (`corpus`, `add_verse`, `book`, `add_poem`, `generate`,
//   `combine`) send one `ClientMessage` and wait, up to the client's timeout,
//   for the next non-broadcast message. The server answers requests in order, so
//   that message is the response.
// - `PoemPublished` broadcasts that arrive meanwhile are buffered and handed
//   out by `poll_published()` / `wait_for_published()`.
//
// Used by the CLI's client subcommands and by the integration tests.

use std::io::{BufReader, BufWriter};
use std::net::{TcpStream, ToSocketAddrs};
use std::sync::mpsc::{self, Receiver, RecvTimeoutError};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use chrono::{DateTime, Utc};
use elpoebot_core::{Combination, Poem};
use elpoebot_protocol::framing::{recv, send};
use elpoebot_protocol::{ClientMessage, ErrorKind, ServerMessage};
use elpoebot_store::BookEntry;
use thiserror::Error;

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(5);

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("connection failed: {0}")]
    Io(#[from] std::io::Error),
    #[error("no response within {0:?}")]
    Timeout(Duration),
    #[error("server closed the connection")]
    Disconnected,
    #[error("server error ({kind:?}): {message}")]
    Server { kind: ErrorKind, message: String },
    #[error("unexpected response: {0}")]
    Unexpected(String),
}

pub struct PoetClient {
    writer: BufWriter<TcpStream>,
    inbox: Receiver<ServerMessage>,
    published: Vec<BookEntry>,
    timeout: Duration,
    _reader_thread: JoinHandle<()>,
}

impl PoetClient {
    pub fn connect(addr: impl ToSocketAddrs) -> Result<Self, ClientError> {
        let stream = TcpStream::connect(addr)?;
        let reader = BufReader::new(stream.try_clone()?);
        let writer = BufWriter::new(stream);

        let (tx, rx) = mpsc::channel();
        let reader_thread = thread::spawn(move || reader_loop(reader, tx));

        Ok(Self {
            writer,
            inbox: rx,
            published: Vec::new(),
            timeout: DEFAULT_TIMEOUT,
            _reader_thread: reader_thread,
        })
    }

    /// Change how long request helpers wait for a response.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn corpus(&mut self) -> Result<Vec<String>, ClientError> {
        match self.request(&ClientMessage::GetCorpus)? {
            ServerMessage::Corpus { lines } => Ok(lines),
            other => Err(unexpected(other)),
        }
    }

    /// Submit a verse; returns the corpus after the append.
    pub fn add_verse(&mut self, verse: &str) -> Result<Vec<String>, ClientError> {
        let msg = ClientMessage::AddVerse {
            verse: verse.into(),
        };
        match self.request(&msg)? {
            ServerMessage::VerseAdded { lines } => Ok(lines),
            other => Err(unexpected(other)),
        }
    }

    pub fn book(&mut self) -> Result<Vec<BookEntry>, ClientError> {
        match self.request(&ClientMessage::GetBook)? {
            ServerMessage::Book { entries } => Ok(entries),
            other => Err(unexpected(other)),
        }
    }

    /// Submit a finished poem. Missing stamps are filled in by the server.
    pub fn add_poem(
        &mut self,
        poem: Poem,
        timestamp: Option<DateTime<Utc>>,
        date: Option<String>,
    ) -> Result<BookEntry, ClientError> {
        let msg = ClientMessage::AddPoem {
            poem,
            timestamp,
            date,
        };
        match self.request(&msg)? {
            ServerMessage::PoemAdded { entry } => Ok(entry),
            other => Err(unexpected(other)),
        }
    }

    /// Ask the server for a poem. With `publish`, the returned entry is the
    /// one appended to the book.
    pub fn generate(&mut self, publish: bool) -> Result<(Poem, Option<BookEntry>), ClientError> {
        match self.request(&ClientMessage::GeneratePoem { publish })? {
            ServerMessage::Generated { poem, entry } => Ok((poem, entry)),
            other => Err(unexpected(other)),
        }
    }

    pub fn combine(&mut self, verse: &str) -> Result<Vec<Combination>, ClientError> {
        let msg = ClientMessage::Combine {
            verse: verse.into(),
        };
        match self.request(&msg)? {
            ServerMessage::Combinations { combinations, .. } => Ok(combinations),
            other => Err(unexpected(other)),
        }
    }

    /// Drain buffered and pending `PoemPublished` broadcasts without blocking.
    pub fn poll_published(&mut self) -> Vec<BookEntry> {
        while let Ok(msg) = self.inbox.try_recv() {
            self.buffer(msg);
        }
        std::mem::take(&mut self.published)
    }

    /// Wait up to `timeout` for the next `PoemPublished` broadcast.
    pub fn wait_for_published(&mut self, timeout: Duration) -> Result<BookEntry, ClientError> {
        if !self.published.is_empty() {
            return Ok(self.published.remove(0));
        }
        let deadline = Instant::now() + timeout;
        loop {
            let remaining = deadline.saturating_duration_since(Instant::now());
            match self.inbox.recv_timeout(remaining) {
                Ok(ServerMessage::PoemPublished { entry }) => return Ok(entry),
                Ok(other) => return Err(unexpected(other)),
                Err(RecvTimeoutError::Timeout) => return Err(ClientError::Timeout(timeout)),
                Err(RecvTimeoutError::Disconnected) => return Err(ClientError::Disconnected),
            }
        }
    }

    /// Send `Goodbye`. The server drops the connection afterwards.
    pub fn disconnect(mut self) {
        let _ = send(&mut self.writer, &ClientMessage::Goodbye);
    }

    fn request(&mut self, msg: &ClientMessage) -> Result<ServerMessage, ClientError> {
        send(&mut self.writer, msg)?;
        let deadline = Instant::now() + self.timeout;
        loop {
            let remaining = deadline.saturating_duration_since(Instant::now());
            match self.inbox.recv_timeout(remaining) {
                Ok(msg) if msg.is_broadcast() => self.buffer(msg),
                Ok(ServerMessage::Error { kind, message }) => {
                    return Err(ClientError::Server { kind, message });
                }
                Ok(response) => return Ok(response),
                Err(RecvTimeoutError::Timeout) => return Err(ClientError::Timeout(self.timeout)),
                Err(RecvTimeoutError::Disconnected) => return Err(ClientError::Disconnected),
            }
        }
    }

    fn buffer(&mut self, msg: ServerMessage) {
        if let ServerMessage::PoemPublished { entry } = msg {
            self.published.push(entry);
        }
    }
}

fn unexpected(msg: ServerMessage) -> ClientError {
    ClientError::Unexpected(format!("{msg:?}"))
}

fn reader_loop(mut reader: BufReader<TcpStream>, tx: mpsc::Sender<ServerMessage>) {
    while let Ok(msg) = recv::<_, ServerMessage>(&mut reader) {
        if tx.send(msg).is_err() {
            break;
        }
    }
}
