// TCP server and main event loop.
//
// Architecture: thread-per-reader with a central `mpsc` channel.
//
// - **Listener thread**: non-blocking `accept()` loop that forwards new
//   connections to the main thread as `InternalEvent::NewConnection`.
// - **Reader threads** (one per client): `framing::recv` a `ClientMessage`
//   in a loop and forward it as `InternalEvent::MessageFrom`. EOF, a read
//   error, malformed JSON, or `Goodbye` ends the loop with `Disconnected`.
// - **Main thread**: owns the `Library` and every client's write half. It
//   answers requests in arrival order and broadcasts each new book entry.
//   `recv_timeout` doubles as the scheduler clock: once the publish interval
//   has elapsed, the main thread generates a poem, appends it to the book,
//   and broadcasts `PoemPublished`.
//
// Only the main thread writes to sockets, and only it touches the stores, so
// corpus and book mutations are serialized without locks.
//
// Shutdown: `ServerHandle::stop` clears `keep_running`; the main loop and
// the listener notice within one poll period. Before returning, the main
// loop shuts down every client socket, which unblocks the reader threads
// and gives clients EOF.

use std::collections::BTreeMap;
use std::io::{BufReader, BufWriter};
use std::net::{Shutdown, SocketAddr, TcpListener, TcpStream};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{self, Receiver, Sender};
use std::thread;
use std::time::{Duration, Instant};

use chrono::Utc;
use elpoebot_protocol::framing::{recv, send};
use elpoebot_protocol::{ClientMessage, ServerMessage};
use elpoebot_store::BookEntry;
use tracing::{debug, info, warn};

use crate::library::Library;

/// How often the main loop wakes up with no events, to check the scheduler
/// and the shutdown flag.
const POLL_INTERVAL: Duration = Duration::from_millis(50);

/// Server-assigned connection ID.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub struct ClientId(pub u32);

enum InternalEvent {
    NewConnection {
        stream: TcpStream,
        peer: SocketAddr,
    },
    MessageFrom {
        client_id: ClientId,
        message: ClientMessage,
    },
    Disconnected {
        client_id: ClientId,
    },
}

/// Handle returned by `start_server` to stop the running server.
pub struct ServerHandle {
    keep_running: Arc<AtomicBool>,
    thread: Option<thread::JoinHandle<()>>,
}

impl ServerHandle {
    /// Signal the server to stop and wait for the main loop to exit.
    pub fn stop(mut self) {
        self.keep_running.store(false, Ordering::SeqCst);
        if let Some(handle) = self.thread.take() {
            let _ = handle.join();
        }
    }

    /// Block until the server stops on its own.
    pub fn wait(mut self) {
        if let Some(handle) = self.thread.take() {
            let _ = handle.join();
        }
    }
}

/// Settings the event loop needs, separate from where the stores live.
#[derive(Clone, Debug)]
pub struct ListenConfig {
    pub host: String,
    pub port: u16,
    pub publish_interval: Option<Duration>,
}

/// Bind the listener and run the server on a background thread. Returns the
/// handle and the bound address (useful with port 0).
pub fn start_server(
    listen: ListenConfig,
    library: Library,
) -> std::io::Result<(ServerHandle, SocketAddr)> {
    let listener = TcpListener::bind((listen.host.as_str(), listen.port))?;
    let addr = listener.local_addr()?;
    let keep_running = Arc::new(AtomicBool::new(true));
    let keep_running_loop = keep_running.clone();
    let publish_interval = listen.publish_interval;

    let thread = thread::spawn(move || {
        run_server(listener, library, publish_interval, keep_running_loop);
    });

    info!(%addr, "poem server listening");
    Ok((
        ServerHandle {
            keep_running,
            thread: Some(thread),
        },
        addr,
    ))
}

/// Write halves of every connected client.
struct Connections {
    writers: BTreeMap<ClientId, BufWriter<TcpStream>>,
    next_id: u32,
}

impl Connections {
    fn new() -> Self {
        Self {
            writers: BTreeMap::new(),
            next_id: 0,
        }
    }

    fn add(&mut self, stream: TcpStream) -> ClientId {
        let id = ClientId(self.next_id);
        self.next_id += 1;
        self.writers.insert(id, BufWriter::new(stream));
        id
    }

    fn remove(&mut self, id: ClientId) {
        if self.writers.remove(&id).is_some() {
            info!(client = id.0, "client disconnected");
        }
    }

    /// Write errors are logged; the client's reader thread will notice the
    /// broken connection and report `Disconnected`.
    fn send_to(&mut self, id: ClientId, msg: &ServerMessage) {
        if let Some(writer) = self.writers.get_mut(&id) {
            if let Err(e) = send(writer, msg) {
                warn!(client = id.0, "write failed: {e}");
            }
        }
    }

    fn shutdown_all(&mut self) {
        for (id, writer) in std::mem::take(&mut self.writers) {
            if let Err(e) = writer.get_ref().shutdown(Shutdown::Both) {
                debug!(client = id.0, "shutdown failed: {e}");
            }
        }
    }

    fn broadcast_published(&mut self, entry: BookEntry) {
        let msg = ServerMessage::PoemPublished { entry };
        let ids: Vec<ClientId> = self.writers.keys().copied().collect();
        for id in ids {
            self.send_to(id, &msg);
        }
    }
}

fn run_server(
    listener: TcpListener,
    mut library: Library,
    publish_interval: Option<Duration>,
    keep_running: Arc<AtomicBool>,
) {
    let (tx, rx): (Sender<InternalEvent>, Receiver<InternalEvent>) = mpsc::channel();
    let mut connections = Connections::new();

    // Non-blocking so the accept loop can notice shutdown.
    if let Err(e) = listener.set_nonblocking(true) {
        warn!("cannot make listener non-blocking: {e}");
    }

    let keep_running_listener = keep_running.clone();
    let tx_listener = tx.clone();
    thread::spawn(move || {
        while keep_running_listener.load(Ordering::SeqCst) {
            match listener.accept() {
                Ok((stream, peer)) => {
                    stream.set_nonblocking(false).ok();
                    let _ = tx_listener.send(InternalEvent::NewConnection { stream, peer });
                }
                Err(ref e) if e.kind() == std::io::ErrorKind::WouldBlock => {
                    thread::sleep(POLL_INTERVAL);
                }
                Err(e) => {
                    warn!("accept failed, listener stopping: {e}");
                    break;
                }
            }
        }
    });

    let mut next_publish = publish_interval.map(|every| Instant::now() + every);

    while keep_running.load(Ordering::SeqCst) {
        match rx.recv_timeout(POLL_INTERVAL) {
            Ok(event) => {
                handle_event(&mut library, &mut connections, event, &tx, &keep_running);
                while let Ok(event) = rx.try_recv() {
                    handle_event(&mut library, &mut connections, event, &tx, &keep_running);
                }
            }
            Err(mpsc::RecvTimeoutError::Timeout) => {}
            Err(mpsc::RecvTimeoutError::Disconnected) => break,
        }

        if let (Some(due), Some(every)) = (next_publish, publish_interval) {
            if Instant::now() >= due {
                if let Some(entry) = library.publish_scheduled(Utc::now()) {
                    connections.broadcast_published(entry);
                }
                next_publish = Some(Instant::now() + every);
            }
        }
    }

    connections.shutdown_all();
    info!("poem server stopped");
}

fn handle_event(
    library: &mut Library,
    connections: &mut Connections,
    event: InternalEvent,
    tx: &Sender<InternalEvent>,
    keep_running: &Arc<AtomicBool>,
) {
    match event {
        InternalEvent::NewConnection { stream, peer } => {
            let reader_stream = match stream.try_clone() {
                Ok(s) => s,
                Err(e) => {
                    warn!(%peer, "cannot clone client stream: {e}");
                    return;
                }
            };
            let client_id = connections.add(stream);
            info!(client = client_id.0, %peer, "client connected");

            let tx_reader = tx.clone();
            let keep_running_reader = keep_running.clone();
            thread::spawn(move || {
                reader_loop(
                    BufReader::new(reader_stream),
                    client_id,
                    tx_reader,
                    keep_running_reader,
                );
            });
        }
        InternalEvent::MessageFrom { client_id, message } => {
            debug!(client = client_id.0, ?message, "request");
            if let Some(outcome) = library.handle(message, Utc::now()) {
                connections.send_to(client_id, &outcome.response);
                if let Some(entry) = outcome.published {
                    connections.broadcast_published(entry);
                }
            }
        }
        InternalEvent::Disconnected { client_id } => {
            connections.remove(client_id);
        }
    }
}

/// Reader loop for one client, on its own thread.
fn reader_loop(
    mut reader: BufReader<TcpStream>,
    client_id: ClientId,
    tx: Sender<InternalEvent>,
    keep_running: Arc<AtomicBool>,
) {
    while keep_running.load(Ordering::SeqCst) {
        match recv::<_, ClientMessage>(&mut reader) {
            Ok(ClientMessage::Goodbye) => break,
            Ok(message) => {
                if tx.send(InternalEvent::MessageFrom { client_id, message }).is_err() {
                    return;
                }
            }
            Err(e) => {
                debug!(client = client_id.0, "read ended: {e}");
                break;
            }
        }
    }
    let _ = tx.send(InternalEvent::Disconnected { client_id });
}
