// elpoebot_protocol: wire protocol between clients and the poem server.
//
// Shared by `elpoebot_server` (both the server loop and its bundled client)
// and by anything else that wants to talk to a running server.
//
// Module overview:
// - `message.rs`: `ClientMessage` requests, `ServerMessage` responses and
//                 broadcasts, `ErrorKind`.
// - `framing.rs`: 4-byte big-endian length prefix + JSON payload over any
//                 `Read`/`Write` stream.
//
// Poems and book entries travel in their storage JSON shape (see
// `elpoebot_core::Poem` and `elpoebot_store::BookEntry`), so what a client
// receives is exactly what `book.json` holds. No async runtime: plain
// `std::io` streams.

pub mod framing;
pub mod message;

pub use framing::{MAX_MESSAGE_SIZE, read_message, recv, send, write_message};
pub use message::{ClientMessage, ErrorKind, ServerMessage};
