//! Routes decoded packets to an [`EventHandler`].

use thiserror::Error;
use tracing::{debug, info, warn};

use crate::dispatch::handler::{ConnectionInfo, EventHandler};
use crate::protocol::codec::DecodeError;
use crate::protocol::encoder::PacketEncoder;
use crate::protocol::framing::FramingError;
use crate::protocol::messages::InboundPacket;

/// Misuse of a dispatcher's connection lifecycle.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum DispatchError {
    /// An event arrived before [`EventDispatcher::connected`].
    #[error("connection has not been opened")]
    NotConnected,

    /// [`EventDispatcher::connected`] was called twice.
    #[error("connection is already open")]
    AlreadyConnected,

    /// An event arrived after [`EventDispatcher::disconnected`].
    #[error("connection has been closed")]
    Disconnected,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ConnectionState {
    Pending,
    Open(ConnectionInfo),
    Closed,
}

/// Owns one connection's handler and encoder and invokes the handler for
/// each event.
///
/// Dispatch is a plain synchronous call: no queue, no reordering, no
/// deduplication.  Two identical packets produce two handler calls.
#[derive(Debug)]
pub struct EventDispatcher<H> {
    handler: H,
    encoder: PacketEncoder,
    state: ConnectionState,
}

impl<H: EventHandler> EventDispatcher<H> {
    pub fn new(handler: H, encoder: PacketEncoder) -> Self {
        Self {
            handler,
            encoder,
            state: ConnectionState::Pending,
        }
    }

    /// Marks the connection open and calls [`EventHandler::on_connected`].
    ///
    /// # Errors
    ///
    /// [`DispatchError::AlreadyConnected`] if already open,
    /// [`DispatchError::Disconnected`] if already closed.
    pub fn connected(&mut self, info: ConnectionInfo) -> Result<(), DispatchError> {
        match self.state {
            ConnectionState::Pending => {}
            ConnectionState::Open(_) => return Err(DispatchError::AlreadyConnected),
            ConnectionState::Closed => return Err(DispatchError::Disconnected),
        }
        info!(
            session = %info.session_id(),
            remote = %info.remote(),
            local = %info.local(),
            "client connected"
        );
        self.state = ConnectionState::Open(info);
        self.handler.on_connected(&mut self.encoder, &info);
        Ok(())
    }

    /// Invokes the handler method matching `packet`.
    ///
    /// # Errors
    ///
    /// [`DispatchError::NotConnected`] before [`EventDispatcher::connected`],
    /// [`DispatchError::Disconnected`] after [`EventDispatcher::disconnected`].
    pub fn dispatch(&mut self, packet: InboundPacket) -> Result<(), DispatchError> {
        self.ensure_open()?;
        debug!(packet_type = packet.packet_type().as_tag(), "dispatching packet");

        let out = &mut self.encoder;
        match packet {
            InboundPacket::RequestProcessingError { layout_id, message } => {
                debug!(layout = %layout_id, "renderer reported a processing error");
                self.handler.on_request_processing_error(out, &layout_id, &message);
            }
            InboundPacket::ClientDeviceInfo { info } => {
                self.handler.on_client_device_info(out, &info);
            }
            InboundPacket::ButtonClick { element_id } => {
                self.handler.on_button_click(out, &element_id);
            }
            InboundPacket::LayoutPageSwitched { page_id } => {
                self.handler.on_layout_page_switched(out, &page_id);
            }
            InboundPacket::BoolValueUpdate {
                element_id,
                value,
                is_automatic,
            } => {
                self.handler.on_bool_value_update(out, &element_id, value, is_automatic);
            }
            InboundPacket::TextValueUpdate {
                element_id,
                value,
                is_automatic,
            } => {
                self.handler.on_text_value_update(out, &element_id, &value, is_automatic);
            }
        }
        Ok(())
    }

    /// Reports an undecodable frame to the handler.  The connection stays open.
    pub fn decode_failed(&mut self, error: &DecodeError) -> Result<(), DispatchError> {
        self.ensure_open()?;
        warn!("dropping undecodable packet: {error}");
        self.handler.on_decode_error(error);
        Ok(())
    }

    /// Reports a fatal stream error to the handler.  The caller is expected to
    /// tear the connection down next.
    pub fn framing_failed(&mut self, error: &FramingError) {
        warn!("framing error, connection must be closed: {error}");
        self.handler.on_framing_error(error);
    }

    /// Marks the connection closed and calls [`EventHandler::on_disconnected`].
    ///
    /// Repeated calls are no-ops, so the handler sees the event at most once.
    pub fn disconnected(&mut self) {
        if let ConnectionState::Open(info) = self.state {
            info!(
                session = %info.session_id(),
                remote = %info.remote(),
                packets_sent = self.encoder.packets_sent(),
                "client disconnected"
            );
            self.state = ConnectionState::Closed;
            self.handler.on_disconnected();
        } else {
            self.state = ConnectionState::Closed;
        }
    }

    pub fn is_connected(&self) -> bool {
        matches!(self.state, ConnectionState::Open(_))
    }

    /// Endpoints of the open connection, if any.
    pub fn connection_info(&self) -> Option<&ConnectionInfo> {
        match &self.state {
            ConnectionState::Open(info) => Some(info),
            _ => None,
        }
    }

    pub fn handler(&self) -> &H {
        &self.handler
    }

    pub fn handler_mut(&mut self) -> &mut H {
        &mut self.handler
    }

    /// The connection's encoder, for sending outside of a callback.
    pub fn encoder_mut(&mut self) -> &mut PacketEncoder {
        &mut self.encoder
    }

    pub fn into_handler(self) -> H {
        self.handler
    }

    /// Succeeds only while the connection is open.
    pub fn ensure_open(&self) -> Result<(), DispatchError> {
        match self.state {
            ConnectionState::Open(_) => Ok(()),
            ConnectionState::Pending => Err(DispatchError::NotConnected),
            ConnectionState::Closed => Err(DispatchError::Disconnected),
        }
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
