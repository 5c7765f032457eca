//! TCP server: accept loop and per-connection session tasks.
//!
//! This module is responsible for:
//!
//! 1. Binding a TCP listener on the configured address.
//! 2. Accepting renderer connections and giving each one a fresh handler.
//! 3. Running one [`Session`] per connection: socket bytes go into
//!    [`Session::receive`], packets sent by the handler go out through a
//!    [`ChannelSink`] drained by a writer task.
//! 4. Closing every session cleanly on EOF, on a broken stream, or when the
//!    `running` flag is cleared.
//!
//! # Why a writer task?
//!
//! Handlers send packets from inside synchronous callbacks, so the encoder's
//! sink cannot await a socket write.  [`ChannelSink`] only pushes the frame
//! into an unbounded channel; the writer task owns the write half and does
//! the actual I/O.  Frames keep their order because there is exactly one
//! channel and one writer per connection.

use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc,
};
use std::time::Duration;

use anyhow::Context;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt, ReadHalf};
use tokio::net::TcpListener;
use tokio::sync::mpsc::{unbounded_channel, UnboundedReceiver, UnboundedSender};
use tokio::time::timeout;
use tracing::{debug, error, info, warn};

use tau_core::{ConnectionInfo, EventHandler, PacketEncoder, PacketSink, Session};

use crate::infrastructure::storage::config::{ProtocolConfig, ServerConfig};

/// How often blocked accepts and reads wake up to check the `running` flag.
const POLL_INTERVAL: Duration = Duration::from_millis(200);

// ── Outbound sink ─────────────────────────────────────────────────────────────

/// [`PacketSink`] that hands frames to the connection's writer task.
#[derive(Debug, Clone)]
pub struct ChannelSink {
    tx: UnboundedSender<Vec<u8>>,
}

impl ChannelSink {
    pub fn new(tx: UnboundedSender<Vec<u8>>) -> Self {
        Self { tx }
    }
}

impl PacketSink for ChannelSink {
    fn send(&mut self, frame: &[u8]) {
        if self.tx.send(frame.to_vec()).is_err() {
            // The writer only stops once the socket is gone.
            debug!(bytes = frame.len(), "writer closed; dropping frame");
        }
    }
}

// ── Public API ────────────────────────────────────────────────────────────────

/// Binds the configured address and serves connections until `running` is
/// set to `false`.
///
/// `make_handler` is called once per accepted connection.
///
/// # Errors
///
/// Returns an error if the configured address is invalid or the listener
/// cannot be bound (port in use, missing permission).
pub async fn run_server<F, H>(
    config: &ServerConfig,
    running: Arc<AtomicBool>,
    make_handler: F,
) -> anyhow::Result<()>
where
    F: Fn() -> H,
    H: EventHandler + Send + 'static,
{
    let addr = config.socket_addr()?;
    let listener = TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind listener on {addr}"))?;

    info!("tau server listening on {addr}");

    serve(listener, config.protocol.clone(), running, make_handler).await
}

/// Runs the accept loop on an already bound listener.
///
/// Split from [`run_server`] so tests can bind an ephemeral port first and
/// learn its address.
pub async fn serve<F, H>(
    listener: TcpListener,
    protocol: ProtocolConfig,
    running: Arc<AtomicBool>,
    make_handler: F,
) -> anyhow::Result<()>
where
    F: Fn() -> H,
    H: EventHandler + Send + 'static,
{
    let protocol = Arc::new(protocol);

    loop {
        if !running.load(Ordering::Relaxed) {
            info!("shutdown flag set; stopping accept loop");
            break;
        }

        match timeout(POLL_INTERVAL, listener.accept()).await {
            Ok(Ok((stream, peer_addr))) => {
                let local_addr = match stream.local_addr() {
                    Ok(addr) => addr,
                    Err(e) => {
                        warn!("dropping connection from {peer_addr}: no local address: {e}");
                        continue;
                    }
                };
                if let Err(e) = stream.set_nodelay(true) {
                    debug!("could not disable Nagle for {peer_addr}: {e}");
                }

                let info = ConnectionInfo::new(peer_addr, local_addr);
                info!("new connection {info}");

                let handler = make_handler();
                let protocol = Arc::clone(&protocol);
                let running = Arc::clone(&running);
                tokio::spawn(async move {
                    handle_connection(stream, info, handler, protocol, running).await;
                });
            }
            Ok(Err(e)) => {
                error!("accept error: {e}");
            }
            Err(_) => {
                // Timeout; loop back to the flag check.
            }
        }
    }

    Ok(())
}

// ── Per-connection handler ────────────────────────────────────────────────────

async fn handle_connection<S, H>(
    stream: S,
    info: ConnectionInfo,
    handler: H,
    protocol: Arc<ProtocolConfig>,
    running: Arc<AtomicBool>,
) where
    S: AsyncRead + AsyncWrite + Send + 'static,
    H: EventHandler + Send + 'static,
{
    match serve_connection(stream, info, handler, &protocol, running).await {
        Ok(()) => info!("connection {info} closed normally"),
        Err(e) => warn!("connection {info} closed with error: {e:#}"),
    }
}

/// Runs the complete lifecycle of one renderer connection.
///
/// Generic over the stream so tests can drive it with an in-memory
/// [`tokio::io::duplex`] pipe.  The session is always closed, and every frame
/// the handler queued is written, before this returns.
///
/// # Errors
///
/// Returns an error when the byte stream is malformed, a socket read or
/// write fails, or the peer disconnects in the middle of a frame.
pub async fn serve_connection<S, H>(
    stream: S,
    info: ConnectionInfo,
    handler: H,
    protocol: &ProtocolConfig,
    running: Arc<AtomicBool>,
) -> anyhow::Result<()>
where
    S: AsyncRead + AsyncWrite + Send + 'static,
    H: EventHandler + Send + 'static,
{
    let (mut reader, writer) = tokio::io::split(stream);
    // Unbounded: handler callbacks are synchronous and cannot wait for room.
    // The queue is limited only by how far a peer that stops reading lets
    // the server's sends run ahead of the socket.
    let (tx, rx) = unbounded_channel();
    let writer_task = tokio::spawn(write_frames(writer, rx));

    let encoder = PacketEncoder::with_max_frame_size(ChannelSink::new(tx), protocol.max_frame_size);
    let mut session = Session::new(handler, encoder);
    session.open(info)?;

    let result = read_loop(&mut reader, &mut session, protocol.read_buffer_size, &running).await;

    let closed = session.close();
    // Dropping the session drops the last sender, which lets the writer
    // finish once the queue is empty.
    drop(session);
    let written = writer_task.await.context("writer task failed")?;

    result?;
    closed.context("peer disconnected in the middle of a frame")?;
    written.context("failed to write to peer")?;
    Ok(())
}

async fn read_loop<S, H>(
    reader: &mut ReadHalf<S>,
    session: &mut Session<H>,
    buffer_size: usize,
    running: &AtomicBool,
) -> anyhow::Result<()>
where
    S: AsyncRead,
    H: EventHandler,
{
    let mut buf = vec![0u8; buffer_size.max(1)];

    loop {
        if !running.load(Ordering::Relaxed) {
            debug!("shutdown flag set; closing connection");
            return Ok(());
        }

        match timeout(POLL_INTERVAL, reader.read(&mut buf)).await {
            Ok(Ok(0)) => return Ok(()),
            Ok(Ok(n)) => {
                let dispatched = session.receive(&buf[..n]).context("malformed byte stream")?;
                debug!(bytes = n, dispatched, "received chunk");
            }
            Ok(Err(e)) => return Err(e).context("socket read failed"),
            Err(_) => {}
        }
    }
}

async fn write_frames<W>(mut writer: W, mut rx: UnboundedReceiver<Vec<u8>>) -> std::io::Result<()>
where
    W: AsyncWrite + Unpin,
{
    while let Some(frame) = rx.recv().await {
        writer.write_all(&frame).await?;
    }
    writer.flush().await?;
    writer.shutdown().await
}

// ── Tests ─────────────────────────────────────────────────────────────────────
