//! # tau-core
//!
//! Shared library for the tau remote UI protocol: a server describes a user
//! interface as a tree of layout elements, sends it to a remote renderer
//! (typically a phone or tablet app) over TCP, and then reacts to the button
//! clicks and value changes the renderer reports back.
//!
//! This crate has no dependency on sockets or async runtimes.  Bytes come in
//! through [`Session::receive`] and leave through a [`PacketSink`]; the
//! transport around them belongs to the caller (see the `tau-server` crate).
//!
//! # Architecture overview (for beginners)
//!
//! - **`domain`** – Identifiers and the declarative layout model: pages made
//!   of containers, buttons, text and boolean inputs, labels and spacers.
//!
//! - **`protocol`** – How packets travel over the wire.  Each packet is a JSON
//!   object tagged with `"type"`, wrapped in a `<length>|` header so that a
//!   stream of bytes can be cut back into packets.
//!
//! - **`dispatch`** – Routes every decoded packet to the matching method of
//!   the application's [`EventHandler`].

pub mod dispatch;
pub mod domain;
pub mod protocol;

// Re-export the most-used types at the crate root so callers can write
// `tau_core::LayoutSet` instead of `tau_core::domain::layout_set::LayoutSet`.
pub use dispatch::{ConnectionInfo, DispatchError, EventDispatcher, EventHandler, Session, SessionError};
pub use domain::ids::{ElementId, LayoutId, LayoutPageId};
pub use domain::layout::{
    BooleanInputElement, ButtonElement, ContainerElement, EmptySpace, LabelElement, LayoutElement,
    LayoutError, SplitDirection, TextInputElement,
};
pub use domain::layout_set::{LayoutDocument, LayoutPage, LayoutSet};
pub use protocol::codec::{DecodeError, EncodeError};
pub use protocol::encoder::{PacketEncoder, PacketSink};
pub use protocol::framing::{FramingError, StreamParser, DEFAULT_MAX_FRAME_SIZE};
pub use protocol::messages::{InboundPacket, OutboundPacket};
