//! One connection's complete inbound pipeline: bytes → frames → packets →
//! handler calls.

use thiserror::Error;
use tracing::debug;

use crate::dispatch::dispatcher::{DispatchError, EventDispatcher};
use crate::dispatch::handler::{ConnectionInfo, EventHandler};
use crate::protocol::codec::decode_inbound;
use crate::protocol::encoder::PacketEncoder;
use crate::protocol::framing::{FramingError, StreamParser};

/// Errors returned by [`Session::receive`].
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum SessionError {
    /// The byte stream is corrupt; the connection must be closed.
    #[error(transparent)]
    Framing(#[from] FramingError),

    /// Bytes were fed to a session that is not open.
    #[error(transparent)]
    Dispatch(#[from] DispatchError),
}

/// Owns the [`StreamParser`] and [`EventDispatcher`] of one connection.
///
/// The transport pushes raw chunks into [`Session::receive`] in arrival order
/// and calls [`Session::close`] once the peer is gone.  The session performs
/// no I/O of its own; replies leave through the encoder's sink.
#[derive(Debug)]
pub struct Session<H> {
    parser: StreamParser,
    dispatcher: EventDispatcher<H>,
    framing_failed: bool,
}

impl<H: EventHandler> Session<H> {
    /// Creates a session whose inbound frame limit matches the encoder's
    /// outbound limit.
    pub fn new(handler: H, encoder: PacketEncoder) -> Self {
        let parser = StreamParser::new(encoder.max_frame_size());
        Self::with_parser(handler, encoder, parser)
    }

    pub fn with_parser(handler: H, encoder: PacketEncoder, parser: StreamParser) -> Self {
        Self {
            parser,
            dispatcher: EventDispatcher::new(handler, encoder),
            framing_failed: false,
        }
    }

    /// Starts the session and calls [`EventHandler::on_connected`].
    pub fn open(&mut self, info: ConnectionInfo) -> Result<(), DispatchError> {
        self.dispatcher.connected(info)
    }

    /// Feeds one received chunk and dispatches every packet it completes.
    ///
    /// Frames that fail to decode are reported through
    /// [`EventHandler::on_decode_error`] and skipped.
    ///
    /// Returns the number of packets dispatched.
    ///
    /// # Errors
    ///
    /// [`SessionError::Framing`] when the stream is corrupt (the handler has
    /// already seen it via [`EventHandler::on_framing_error`]), or
    /// [`SessionError::Dispatch`] when the session is not open.
    pub fn receive(&mut self, chunk: &[u8]) -> Result<usize, SessionError> {
        self.dispatcher.ensure_open()?;

        self.parser.push(chunk);
        let mut dispatched = 0;
        loop {
            let frame = match self.parser.next_frame() {
                Ok(Some(frame)) => frame,
                Ok(None) => break,
                Err(e) => {
                    self.report_framing(&e);
                    return Err(e.into());
                }
            };
            debug!(bytes = frame.len(), "received frame");
            match decode_inbound(frame.payload()) {
                Ok(packet) => {
                    self.dispatcher.dispatch(packet)?;
                    dispatched += 1;
                }
                Err(e) => self.dispatcher.decode_failed(&e)?,
            }
        }
        Ok(dispatched)
    }

    /// Ends the session: checks for a truncated trailing frame, then calls
    /// [`EventHandler::on_disconnected`].
    ///
    /// # Errors
    ///
    /// Returns [`FramingError::Truncated`] when the peer stopped mid-frame, or
    /// the earlier fatal error if the stream had already failed.  The handler
    /// is disconnected either way.
    pub fn close(&mut self) -> Result<(), FramingError> {
        let result = self.parser.finish();
        if let Err(e) = &result {
            if self.dispatcher.is_connected() {
                self.report_framing(e);
            }
        }
        self.dispatcher.disconnected();
        result
    }

    pub fn is_open(&self) -> bool {
        self.dispatcher.is_connected()
    }

    pub fn connection_info(&self) -> Option<&ConnectionInfo> {
        self.dispatcher.connection_info()
    }

    pub fn handler(&self) -> &H {
        self.dispatcher.handler()
    }

    pub fn handler_mut(&mut self) -> &mut H {
        self.dispatcher.handler_mut()
    }

    pub fn encoder_mut(&mut self) -> &mut PacketEncoder {
        self.dispatcher.encoder_mut()
    }

    pub fn into_handler(self) -> H {
        self.dispatcher.into_handler()
    }

    fn report_framing(&mut self, error: &FramingError) {
        if !self.framing_failed {
            self.framing_failed = true;
            self.dispatcher.framing_failed(error);
        }
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
