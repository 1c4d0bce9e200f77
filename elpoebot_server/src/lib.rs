// elpoebot_server: the ELPOEBOT poem service.
//
// A long-running server that keeps a verse corpus and a book of published
// poems, generates poems from the corpus on request and on a fixed cadence,
// and broadcasts every new book entry to connected clients. Poem generation
// itself lives in `elpoebot_core`; storage in `elpoebot_store`; the wire
// format in `elpoebot_protocol`.
//
// Module overview:
// - `config.rs`:  `ServerConfig`, loaded from JSON with CLI overrides.
// - `library.rs`: `Library`, the single-threaded request handler that owns
//                 the stores and the RNG. No sockets.
// - `server.rs`:  TCP listener, reader threads (one per client), and the
//                 main event loop that drives `Library` and the scheduler.
// - `client.rs`:  `PoetClient`, a blocking client used by the CLI and tests.
//
// The binary (`main.rs`) wraps all of this in the `elpoebot` command.

pub mod client;
pub mod config;
pub mod library;
pub mod server;

pub use client::{ClientError, PoetClient};
pub use config::{ServerConfig, ServerConfigError};
pub use library::{Library, Outcome, ServeError};
pub use server::{ListenConfig, ServerHandle, start_server};
