// Length-delimited message framing.
//
// A frame is a 4-byte big-endian payload length followed by the payload, a
// JSON-encoded `ClientMessage` or `ServerMessage` (see `message.rs`).
// `write_message`/`read_message` move raw payload bytes; `send`/`recv` add
// the JSON step on top.
//
// `MAX_MESSAGE_SIZE` caps both directions, so a corrupt or hostile length
// prefix can't make the reader allocate more than that. Full book listings
// are the largest legitimate payloads.

use std::io::{self, Read, Write};

use serde::Serialize;
use serde::de::DeserializeOwned;

/// Largest accepted payload (4 MiB).
pub const MAX_MESSAGE_SIZE: u32 = 4 * 1024 * 1024;

/// Payload length as it goes on the wire, or `None` when over the cap.
fn frame_len(len: usize) -> Option<u32> {
    u32::try_from(len).ok().filter(|&n| n <= MAX_MESSAGE_SIZE)
}

fn oversized(kind: io::ErrorKind, len: impl std::fmt::Display) -> io::Error {
    io::Error::new(
        kind,
        format!("frame of {len} bytes exceeds the {MAX_MESSAGE_SIZE}-byte limit"),
    )
}

/// Write one frame and flush. Oversized payloads fail with `InvalidInput`
/// before anything is written.
pub fn write_message<W: Write>(writer: &mut W, payload: &[u8]) -> io::Result<()> {
    let len = frame_len(payload.len())
        .ok_or_else(|| oversized(io::ErrorKind::InvalidInput, payload.len()))?;
    writer.write_all(&len.to_be_bytes())?;
    writer.write_all(payload)?;
    writer.flush()
}

/// Read one frame's payload.
///
/// A stream that ends before or inside the frame gives `UnexpectedEof`; a
/// prefix above `MAX_MESSAGE_SIZE` gives `InvalidData` without reading on.
pub fn read_message<R: Read>(reader: &mut R) -> io::Result<Vec<u8>> {
    let mut prefix = [0u8; 4];
    reader.read_exact(&mut prefix)?;
    let len = u32::from_be_bytes(prefix);
    if len > MAX_MESSAGE_SIZE {
        return Err(oversized(io::ErrorKind::InvalidData, len));
    }
    let mut payload = vec![0u8; len as usize];
    reader.read_exact(&mut payload)?;
    Ok(payload)
}

/// Encode `msg` as JSON and write it as one frame.
pub fn send<W: Write, T: Serialize>(writer: &mut W, msg: &T) -> io::Result<()> {
    let json = serde_json::to_vec(msg).map_err(io::Error::other)?;
    write_message(writer, &json)
}

/// Read one frame and decode it from JSON. Malformed JSON surfaces as
/// `InvalidData`.
pub fn recv<R: Read, T: DeserializeOwned>(reader: &mut R) -> io::Result<T> {
    let payload = read_message(reader)?;
    serde_json::from_slice(&payload).map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))
}
