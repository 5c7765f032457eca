//! Packet vocabulary in both directions.
//!
//! Every packet is a JSON object whose `"type"` field names the variant; the
//! remaining fields are camelCase.  For example:
//!
//! ```json
//! {"type":"buttonClick","elementId":"BUTTON_1"}
//! {"type":"changeElementNote","elementId":"LABEL_ON_PAGE2","note":"Button 1 pressed"}
//! ```
//!
//! The two directions use distinct enums so that a server can never send a
//! client-only packet by mistake.

use serde::{Deserialize, Serialize};

use crate::domain::ids::{ElementId, LayoutId, LayoutPageId};
use crate::domain::layout_set::LayoutDocument;

// ── Client → server ───────────────────────────────────────────────────────────

/// Packets the remote renderer sends to the server.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum InboundPacket {
    /// The renderer failed to process something the server sent.
    RequestProcessingError { layout_id: LayoutId, message: String },

    /// Handshake: the renderer describes itself.  The payload is opaque to
    /// the protocol; servers usually answer with `resetLayout`.
    ClientDeviceInfo {
        #[serde(default)]
        info: serde_json::Value,
    },

    /// A button was clicked.
    ButtonClick { element_id: ElementId },

    /// The renderer now shows another page (for example after a button with
    /// a page-switch target was clicked).
    LayoutPageSwitched { page_id: LayoutPageId },

    /// A boolean input changed.  `is_automatic` is set when the change was
    /// caused by a server update rather than by the user.
    BoolValueUpdate {
        element_id: ElementId,
        value: bool,
        #[serde(default)]
        is_automatic: bool,
    },

    /// A text input changed.
    TextValueUpdate {
        element_id: ElementId,
        value: String,
        #[serde(default)]
        is_automatic: bool,
    },
}

impl InboundPacket {
    /// Wire tag of this packet.
    pub fn packet_type(&self) -> InboundPacketType {
        match self {
            InboundPacket::RequestProcessingError { .. } => InboundPacketType::RequestProcessingError,
            InboundPacket::ClientDeviceInfo { .. } => InboundPacketType::ClientDeviceInfo,
            InboundPacket::ButtonClick { .. } => InboundPacketType::ButtonClick,
            InboundPacket::LayoutPageSwitched { .. } => InboundPacketType::LayoutPageSwitched,
            InboundPacket::BoolValueUpdate { .. } => InboundPacketType::BoolValueUpdate,
            InboundPacket::TextValueUpdate { .. } => InboundPacketType::TextValueUpdate,
        }
    }
}

/// Tags of all client → server packets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum InboundPacketType {
    RequestProcessingError,
    ClientDeviceInfo,
    ButtonClick,
    LayoutPageSwitched,
    BoolValueUpdate,
    TextValueUpdate,
}

impl InboundPacketType {
    /// The `"type"` string used on the wire.
    pub fn as_tag(self) -> &'static str {
        match self {
            InboundPacketType::RequestProcessingError => "requestProcessingError",
            InboundPacketType::ClientDeviceInfo => "clientDeviceInfo",
            InboundPacketType::ButtonClick => "buttonClick",
            InboundPacketType::LayoutPageSwitched => "layoutPageSwitched",
            InboundPacketType::BoolValueUpdate => "boolValueUpdate",
            InboundPacketType::TextValueUpdate => "textValueUpdate",
        }
    }
}

impl TryFrom<&str> for InboundPacketType {
    type Error = ();

    fn try_from(tag: &str) -> Result<Self, ()> {
        match tag {
            "requestProcessingError" => Ok(InboundPacketType::RequestProcessingError),
            "clientDeviceInfo" => Ok(InboundPacketType::ClientDeviceInfo),
            "buttonClick" => Ok(InboundPacketType::ButtonClick),
            "layoutPageSwitched" => Ok(InboundPacketType::LayoutPageSwitched),
            "boolValueUpdate" => Ok(InboundPacketType::BoolValueUpdate),
            "textValueUpdate" => Ok(InboundPacketType::TextValueUpdate),
            _ => Err(()),
        }
    }
}

// ── Server → client ───────────────────────────────────────────────────────────

/// Packets the server sends to the remote renderer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum OutboundPacket {
    /// Replace the whole UI with a new layout set.
    ResetLayout { layout: LayoutDocument },

    /// Show another page of the current layout set.
    #[serde(rename = "changeShownLayoutPage")]
    ChangeShownPage { page_id: LayoutPageId },

    /// Set the value of a text input.
    UpdateTextValue { element_id: ElementId, value: String },

    /// Set the value of a boolean input.
    UpdateBoolValue { element_id: ElementId, value: bool },

    /// Change the caption of a button or boolean input, or the text of a label.
    ChangeElementNote { element_id: ElementId, note: String },
}

impl OutboundPacket {
    /// Wire tag of this packet.
    pub fn packet_type(&self) -> OutboundPacketType {
        match self {
            OutboundPacket::ResetLayout { .. } => OutboundPacketType::ResetLayout,
            OutboundPacket::ChangeShownPage { .. } => OutboundPacketType::ChangeShownPage,
            OutboundPacket::UpdateTextValue { .. } => OutboundPacketType::UpdateTextValue,
            OutboundPacket::UpdateBoolValue { .. } => OutboundPacketType::UpdateBoolValue,
            OutboundPacket::ChangeElementNote { .. } => OutboundPacketType::ChangeElementNote,
        }
    }
}

/// Tags of all server → client packets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OutboundPacketType {
    ResetLayout,
    ChangeShownPage,
    UpdateTextValue,
    UpdateBoolValue,
    ChangeElementNote,
}

impl OutboundPacketType {
    /// The `"type"` string used on the wire.
    pub fn as_tag(self) -> &'static str {
        match self {
            OutboundPacketType::ResetLayout => "resetLayout",
            OutboundPacketType::ChangeShownPage => "changeShownLayoutPage",
            OutboundPacketType::UpdateTextValue => "updateTextValue",
            OutboundPacketType::UpdateBoolValue => "updateBoolValue",
            OutboundPacketType::ChangeElementNote => "changeElementNote",
        }
    }
}

impl TryFrom<&str> for OutboundPacketType {
    type Error = ();

    fn try_from(tag: &str) -> Result<Self, ()> {
        match tag {
            "resetLayout" => Ok(OutboundPacketType::ResetLayout),
            "changeShownLayoutPage" => Ok(OutboundPacketType::ChangeShownPage),
            "updateTextValue" => Ok(OutboundPacketType::UpdateTextValue),
            "updateBoolValue" => Ok(OutboundPacketType::UpdateBoolValue),
            "changeElementNote" => Ok(OutboundPacketType::ChangeElementNote),
            _ => Err(()),
        }
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
