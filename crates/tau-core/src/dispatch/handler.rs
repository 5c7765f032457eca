//! The application-facing event interface and per-connection metadata.

use std::fmt;
use std::net::{IpAddr, SocketAddr};

use uuid::Uuid;

use crate::domain::ids::{ElementId, LayoutId, LayoutPageId};
use crate::protocol::codec::DecodeError;
use crate::protocol::encoder::PacketEncoder;
use crate::protocol::framing::FramingError;

/// Immutable snapshot of one connection's endpoints.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConnectionInfo {
    remote: SocketAddr,
    local: SocketAddr,
    session_id: Uuid,
}

impl ConnectionInfo {
    /// Creates connection metadata with a fresh session id.
    pub fn new(remote: SocketAddr, local: SocketAddr) -> Self {
        Self::with_session_id(remote, local, Uuid::new_v4())
    }

    pub fn with_session_id(remote: SocketAddr, local: SocketAddr, session_id: Uuid) -> Self {
        Self {
            remote,
            local,
            session_id,
        }
    }

    pub fn remote(&self) -> SocketAddr {
        self.remote
    }

    pub fn local(&self) -> SocketAddr {
        self.local
    }

    pub fn remote_ip(&self) -> IpAddr {
        self.remote.ip()
    }

    pub fn remote_port(&self) -> u16 {
        self.remote.port()
    }

    pub fn local_ip(&self) -> IpAddr {
        self.local.ip()
    }

    pub fn local_port(&self) -> u16 {
        self.local.port()
    }

    /// Identifier used to correlate log lines of one connection.
    pub fn session_id(&self) -> Uuid {
        self.session_id
    }

    /// Remote endpoint as `ip:port`.
    pub fn remote_addr_dump(&self) -> String {
        self.remote.to_string()
    }

    /// Local endpoint as `ip:port`.
    pub fn local_addr_dump(&self) -> String {
        self.local.to_string()
    }
}

impl fmt::Display for ConnectionInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} -> {} (session {})", self.remote, self.local, self.session_id)
    }
}

/// Callbacks invoked for one connection, in the order events arrive.
///
/// Every method has an empty default body, so an application implements only
/// the events it cares about.  Methods that may reply get the connection's
/// [`PacketEncoder`]; sending from inside a callback is the normal way to
/// react to the renderer.
///
/// All calls happen synchronously on the task that owns the connection.
#[allow(unused_variables)]
pub trait EventHandler {
    /// The connection is established.  Nothing has been received yet.
    fn on_connected(&mut self, out: &mut PacketEncoder, info: &ConnectionInfo) {}

    /// The connection is gone.  Called at most once, after every other event.
    fn on_disconnected(&mut self) {}

    /// The renderer could not process something this side sent.
    fn on_request_processing_error(
        &mut self,
        out: &mut PacketEncoder,
        layout_id: &LayoutId,
        message: &str,
    ) {
    }

    /// Handshake from the renderer; usually answered with a layout reset.
    fn on_client_device_info(&mut self, out: &mut PacketEncoder, info: &serde_json::Value) {}

    fn on_button_click(&mut self, out: &mut PacketEncoder, element_id: &ElementId) {}

    fn on_layout_page_switched(&mut self, out: &mut PacketEncoder, page_id: &LayoutPageId) {}

    fn on_bool_value_update(
        &mut self,
        out: &mut PacketEncoder,
        element_id: &ElementId,
        value: bool,
        is_automatic: bool,
    ) {
    }

    fn on_text_value_update(
        &mut self,
        out: &mut PacketEncoder,
        element_id: &ElementId,
        value: &str,
        is_automatic: bool,
    ) {
    }

    /// A frame could not be decoded.  The stream continues with the next frame.
    fn on_decode_error(&mut self, error: &DecodeError) {}

    /// The byte stream is corrupt.  No further events follow except
    /// [`EventHandler::on_disconnected`]; the owner of the connection closes it.
    fn on_framing_error(&mut self, error: &FramingError) {}
}
