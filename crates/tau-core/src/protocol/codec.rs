//! JSON codec for frame bodies.
//!
//! Decoding is two-phase: the body is first parsed into a generic JSON value
//! so that the `"type"` tag can be checked on its own, and only then
//! converted into the typed packet.  That lets an unknown packet type be
//! reported separately from a known packet with bad fields, and lets the
//! error carry whatever element or layout id could still be read.
//!
//! Every decode error is recoverable: the frame boundary is already known,
//! so the stream stays usable.

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use thiserror::Error;

use crate::domain::ids::{ElementId, LayoutId};
use crate::domain::layout::LayoutError;
use crate::domain::layout_set::LayoutSet;
use crate::protocol::framing::{encode_frame, FramingError};
use crate::protocol::messages::{
    InboundPacket, InboundPacketType, OutboundPacket, OutboundPacketType,
};

/// Name of the field carrying the packet tag.
pub const TAG_FIELD: &str = "type";

/// Errors produced while turning a frame body into a packet.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum DecodeError {
    /// The body is not UTF-8 JSON, or not a JSON object.
    #[error("invalid JSON payload: {0}")]
    InvalidJson(String),

    /// The object has no string `"type"` field.
    #[error("packet has no \"type\" tag")]
    MissingTag,

    /// The tag names no packet known for this direction.
    #[error("unknown packet type \"{tag}\"")]
    UnknownPacketType { tag: String },

    /// The tag is known but the fields are missing or of the wrong type.
    #[error("malformed \"{tag}\" packet{}: {reason}", describe_ids(.element_id, .layout_id))]
    MalformedPacket {
        tag: String,
        element_id: Option<ElementId>,
        layout_id: Option<LayoutId>,
        reason: String,
    },
}

fn describe_ids(element_id: &Option<ElementId>, layout_id: &Option<LayoutId>) -> String {
    match (element_id, layout_id) {
        (Some(e), _) => format!(" (element {e})"),
        (None, Some(l)) => format!(" (layout {l})"),
        (None, None) => String::new(),
    }
}

/// Errors produced while turning a packet into bytes for the wire.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum EncodeError {
    /// An identifier field that must be non-empty is empty.
    #[error("empty identifier in field \"{field}\"")]
    EmptyIdentifier { field: &'static str },

    /// The framed packet would exceed the maximum frame size.
    #[error("encoded packet of {size} bytes exceeds maximum frame size of {max} bytes")]
    FrameTooLarge { size: usize, max: usize },

    /// The layout set in a `resetLayout` packet is invalid.
    #[error("invalid layout: {0}")]
    Layout(#[from] LayoutError),

    /// JSON serialization failed.
    #[error("serialization failed: {0}")]
    Serialize(String),
}

// ── Public API ────────────────────────────────────────────────────────────────

/// Decodes a frame body received by the server.
///
/// # Errors
///
/// Returns a [`DecodeError`] describing why the body is not a valid
/// client → server packet.
///
/// # Examples
///
/// ```rust
/// use tau_core::protocol::codec::decode_inbound;
/// use tau_core::protocol::messages::InboundPacket;
///
/// let packet = decode_inbound(br#"{"type":"buttonClick","elementId":"B1"}"#).unwrap();
/// assert!(matches!(packet, InboundPacket::ButtonClick { element_id } if element_id == "B1"));
/// ```
pub fn decode_inbound(payload: &[u8]) -> Result<InboundPacket, DecodeError> {
    let packet: InboundPacket =
        decode_tagged(payload, |tag| InboundPacketType::try_from(tag).is_ok())?;
    let empty_field = match &packet {
        InboundPacket::ButtonClick { element_id }
        | InboundPacket::BoolValueUpdate { element_id, .. }
        | InboundPacket::TextValueUpdate { element_id, .. } => {
            element_id.is_empty().then_some("elementId")
        }
        InboundPacket::LayoutPageSwitched { page_id } => page_id.is_empty().then_some("pageId"),
        InboundPacket::RequestProcessingError { .. } | InboundPacket::ClientDeviceInfo { .. } => {
            None
        }
    };
    match empty_field {
        Some(field) => Err(empty_identifier(packet.packet_type().as_tag(), field)),
        None => Ok(packet),
    }
}

/// Decodes a frame body received by a renderer.
///
/// `resetLayout` documents are additionally validated with the same rules
/// the server applies before sending.
///
/// # Errors
///
/// Returns a [`DecodeError`] describing why the body is not a valid
/// server → client packet.
pub fn decode_outbound(payload: &[u8]) -> Result<OutboundPacket, DecodeError> {
    let packet: OutboundPacket =
        decode_tagged(payload, |tag| OutboundPacketType::try_from(tag).is_ok())?;
    let tag = packet.packet_type().as_tag();
    match &packet {
        OutboundPacket::ResetLayout { layout } => {
            LayoutSet::from_document(layout.clone()).map_err(|e| {
                DecodeError::MalformedPacket {
                    tag: tag.to_string(),
                    element_id: None,
                    layout_id: Some(layout.layout_id.clone()),
                    reason: e.to_string(),
                }
            })?;
        }
        OutboundPacket::ChangeShownPage { page_id } if page_id.is_empty() => {
            return Err(empty_identifier(tag, "pageId"));
        }
        OutboundPacket::UpdateTextValue { element_id, .. }
        | OutboundPacket::UpdateBoolValue { element_id, .. }
        | OutboundPacket::ChangeElementNote { element_id, .. }
            if element_id.is_empty() =>
        {
            return Err(empty_identifier(tag, "elementId"));
        }
        _ => {}
    }
    Ok(packet)
}

/// Serializes a server → client packet into a JSON frame body.
///
/// # Errors
///
/// Returns [`EncodeError::EmptyIdentifier`] for empty ids and
/// [`EncodeError::Layout`] for an invalid layout document.
pub fn encode_outbound(packet: &OutboundPacket) -> Result<Vec<u8>, EncodeError> {
    match packet {
        OutboundPacket::ResetLayout { layout } => {
            if layout.layout_id.is_empty() {
                return Err(EncodeError::EmptyIdentifier { field: "layoutId" });
            }
            LayoutSet::from_document(layout.clone())?;
        }
        OutboundPacket::ChangeShownPage { page_id } => {
            require_id(page_id.is_empty(), "pageId")?;
        }
        OutboundPacket::UpdateTextValue { element_id, .. }
        | OutboundPacket::UpdateBoolValue { element_id, .. }
        | OutboundPacket::ChangeElementNote { element_id, .. } => {
            require_id(element_id.is_empty(), "elementId")?;
        }
    }
    to_json(packet)
}

/// Serializes a client → server packet into a JSON frame body.
///
/// Used by renderers and by tests that play the client side.
///
/// # Errors
///
/// Returns [`EncodeError::EmptyIdentifier`] for empty ids.
pub fn encode_inbound(packet: &InboundPacket) -> Result<Vec<u8>, EncodeError> {
    match packet {
        InboundPacket::ButtonClick { element_id }
        | InboundPacket::BoolValueUpdate { element_id, .. }
        | InboundPacket::TextValueUpdate { element_id, .. } => {
            require_id(element_id.is_empty(), "elementId")?;
        }
        InboundPacket::LayoutPageSwitched { page_id } => {
            require_id(page_id.is_empty(), "pageId")?;
        }
        InboundPacket::RequestProcessingError { .. } | InboundPacket::ClientDeviceInfo { .. } => {}
    }
    to_json(packet)
}

/// Encodes a server → client packet and wraps it in a frame header.
///
/// # Errors
///
/// Any [`encode_outbound`] error, or [`EncodeError::FrameTooLarge`].
pub fn encode_outbound_frame(
    packet: &OutboundPacket,
    max_frame_size: usize,
) -> Result<Vec<u8>, EncodeError> {
    frame(encode_outbound(packet)?, max_frame_size)
}

/// Encodes a client → server packet and wraps it in a frame header.
///
/// # Errors
///
/// Any [`encode_inbound`] error, or [`EncodeError::FrameTooLarge`].
pub fn encode_inbound_frame(
    packet: &InboundPacket,
    max_frame_size: usize,
) -> Result<Vec<u8>, EncodeError> {
    frame(encode_inbound(packet)?, max_frame_size)
}

// ── Internals ─────────────────────────────────────────────────────────────────

fn decode_tagged<T: DeserializeOwned>(
    payload: &[u8],
    is_known: impl Fn(&str) -> bool,
) -> Result<T, DecodeError> {
    let value: Value =
        serde_json::from_slice(payload).map_err(|e| DecodeError::InvalidJson(e.to_string()))?;
    let Value::Object(fields) = &value else {
        return Err(DecodeError::InvalidJson("expected a JSON object".to_string()));
    };
    let tag = fields
        .get(TAG_FIELD)
        .and_then(Value::as_str)
        .ok_or(DecodeError::MissingTag)?
        .to_string();
    if !is_known(&tag) {
        return Err(DecodeError::UnknownPacketType { tag });
    }

    let element_id = string_field(&value, "elementId").map(ElementId::new);
    let layout_id = string_field(&value, "layoutId").map(LayoutId::new);
    serde_json::from_value(value).map_err(|e| DecodeError::MalformedPacket {
        tag,
        element_id,
        layout_id,
        reason: e.to_string(),
    })
}

fn empty_identifier(tag: &str, field: &str) -> DecodeError {
    DecodeError::MalformedPacket {
        tag: tag.to_string(),
        element_id: None,
        layout_id: None,
        reason: format!("empty identifier in field \"{field}\""),
    }
}

fn string_field(value: &Value, name: &str) -> Option<String> {
    value.get(name).and_then(Value::as_str).map(str::to_string)
}

fn require_id(is_empty: bool, field: &'static str) -> Result<(), EncodeError> {
    if is_empty {
        Err(EncodeError::EmptyIdentifier { field })
    } else {
        Ok(())
    }
}

fn to_json<T: Serialize>(packet: &T) -> Result<Vec<u8>, EncodeError> {
    serde_json::to_vec(packet).map_err(|e| EncodeError::Serialize(e.to_string()))
}

fn frame(body: Vec<u8>, max_frame_size: usize) -> Result<Vec<u8>, EncodeError> {
    encode_frame(&body, max_frame_size).map_err(|e| match e {
        FramingError::FrameTooLarge { declared, max } => EncodeError::FrameTooLarge {
            size: declared,
            max,
        },
        other => EncodeError::Serialize(other.to_string()),
    })
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ids::LayoutPageId;
    use crate::domain::layout::{ButtonElement, LabelElement};
    use crate::domain::layout_set::LayoutPage;
    use serde_json::json;

    fn body(value: Value) -> Vec<u8> {
        serde_json::to_vec(&value).unwrap()
    }

    #[test]
    fn test_decode_button_click() {
        let packet = decode_inbound(&body(json!({"type": "buttonClick", "elementId": "B1"})));
        assert_eq!(
            packet,
            Ok(InboundPacket::ButtonClick {
                element_id: ElementId::new("B1")
            })
        );
    }

    #[test]
    fn test_decode_layout_page_switched() {
        let packet = decode_inbound(br#"{"type":"layoutPageSwitched","pageId":"P2"}"#).unwrap();
        assert_eq!(
            packet,
            InboundPacket::LayoutPageSwitched {
                page_id: LayoutPageId::new("P2")
            }
        );
    }

    #[test]
    fn test_decode_client_device_info_without_payload() {
        let packet = decode_inbound(br#"{"type":"clientDeviceInfo"}"#).unwrap();
        assert_eq!(packet, InboundPacket::ClientDeviceInfo { info: Value::Null });
    }

    #[test]
    fn test_decode_request_processing_error() {
        let packet = decode_inbound(&body(json!({
            "type": "requestProcessingError",
            "layoutId": "L1",
            "message": "bad element"
        })))
        .unwrap();
        assert_eq!(
            packet,
            InboundPacket::RequestProcessingError {
                layout_id: LayoutId::new("L1"),
                message: "bad element".to_string(),
            }
        );
    }

    #[test]
    fn test_decode_ignores_unknown_extra_fields() {
        let packet =
            decode_inbound(br#"{"type":"buttonClick","elementId":"B1","extra":42}"#).unwrap();
        assert_eq!(packet.packet_type(), InboundPacketType::ButtonClick);
    }

    #[test]
    fn test_decode_rejects_non_json() {
        assert!(matches!(
            decode_inbound(b"not json"),
            Err(DecodeError::InvalidJson(_))
        ));
    }

    #[test]
    fn test_decode_rejects_invalid_utf8() {
        assert!(matches!(
            decode_inbound(&[0x22, 0xFF, 0xFE, 0x22]),
            Err(DecodeError::InvalidJson(_))
        ));
    }

    #[test]
    fn test_decode_rejects_non_object() {
        assert!(matches!(
            decode_inbound(b"[1,2,3]"),
            Err(DecodeError::InvalidJson(_))
        ));
    }

    #[test]
    fn test_decode_reports_missing_tag() {
        assert_eq!(
            decode_inbound(br#"{"elementId":"B1"}"#),
            Err(DecodeError::MissingTag)
        );
        assert_eq!(
            decode_inbound(br#"{"type":7}"#),
            Err(DecodeError::MissingTag)
        );
    }

    #[test]
    fn test_decode_reports_unknown_type() {
        assert_eq!(
            decode_inbound(br#"{"type":"mouseMove"}"#),
            Err(DecodeError::UnknownPacketType {
                tag: "mouseMove".to_string()
            })
        );
    }

    #[test]
    fn test_outbound_tag_is_unknown_inbound() {
        assert!(matches!(
            decode_inbound(br#"{"type":"resetLayout","layout":{}}"#),
            Err(DecodeError::UnknownPacketType { .. })
        ));
    }

    #[test]
    fn test_decode_malformed_packet_carries_element_id() {
        let err = decode_inbound(br#"{"type":"boolValueUpdate","elementId":"C1","value":"yes"}"#)
            .unwrap_err();
        match err {
            DecodeError::MalformedPacket {
                tag, element_id, ..
            } => {
                assert_eq!(tag, "boolValueUpdate");
                assert_eq!(element_id, Some(ElementId::new("C1")));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_decode_malformed_packet_missing_field() {
        let err = decode_inbound(br#"{"type":"buttonClick"}"#).unwrap_err();
        assert!(matches!(
            err,
            DecodeError::MalformedPacket { element_id: None, .. }
        ));
        assert!(err.to_string().contains("buttonClick"));
    }

    #[test]
    fn test_decode_rejects_empty_element_id() {
        let err = decode_inbound(br#"{"type":"buttonClick","elementId":""}"#).unwrap_err();
        assert_eq!(
            err,
            DecodeError::MalformedPacket {
                tag: "buttonClick".to_string(),
                element_id: None,
                layout_id: None,
                reason: "empty identifier in field \"elementId\"".to_string(),
            }
        );
    }

    #[test]
    fn test_decode_rejects_empty_page_id() {
        assert!(matches!(
            decode_inbound(br#"{"type":"layoutPageSwitched","pageId":""}"#),
            Err(DecodeError::MalformedPacket { tag, .. }) if tag == "layoutPageSwitched"
        ));
        assert!(matches!(
            decode_outbound(br#"{"type":"changeShownLayoutPage","pageId":""}"#),
            Err(DecodeError::MalformedPacket { .. })
        ));
    }

    #[test]
    fn test_decode_rejects_empty_id_in_value_update() {
        assert!(matches!(
            decode_inbound(
                br#"{"type":"textValueUpdate","elementId":"","value":"x","isAutomatic":false}"#
            ),
            Err(DecodeError::MalformedPacket { .. })
        ));
        assert!(matches!(
            decode_outbound(br#"{"type":"changeElementNote","elementId":"","note":"n"}"#),
            Err(DecodeError::MalformedPacket { .. })
        ));
    }

    #[test]
    fn test_encode_outbound_is_tagged_camel_case_json() {
        let bytes = encode_outbound(&OutboundPacket::UpdateTextValue {
            element_id: ElementId::new("TEXT_INPUT"),
            value: "initial text".to_string(),
        })
        .unwrap();
        let value: Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(
            value,
            json!({"type": "updateTextValue", "elementId": "TEXT_INPUT", "value": "initial text"})
        );
    }

    #[test]
    fn test_encode_outbound_rejects_empty_element_id() {
        let result = encode_outbound(&OutboundPacket::UpdateBoolValue {
            element_id: ElementId::new(""),
            value: true,
        });
        assert_eq!(
            result,
            Err(EncodeError::EmptyIdentifier { field: "elementId" })
        );
    }

    #[test]
    fn test_encode_outbound_rejects_empty_page_id() {
        let result = encode_outbound(&OutboundPacket::ChangeShownPage {
            page_id: LayoutPageId::new(""),
        });
        assert_eq!(result, Err(EncodeError::EmptyIdentifier { field: "pageId" }));
    }

    #[test]
    fn test_encode_outbound_rejects_invalid_layout_document() {
        let set = LayoutSet::with_id("L").push_page(LayoutPage::new(
            "P1",
            ButtonElement::new().id("B1").switch_to_page_on_click("P1"),
        ));
        let mut layout = set.to_document().unwrap();
        layout.start_page = LayoutPageId::new("NOWHERE");
        let result = encode_outbound(&OutboundPacket::ResetLayout { layout });
        assert!(matches!(
            result,
            Err(EncodeError::Layout(LayoutError::UnknownStartPage(_)))
        ));
    }

    #[test]
    fn test_reset_layout_decodes_on_renderer_side() {
        let set = LayoutSet::with_id("L").push_page(LayoutPage::new("P1", LabelElement::new("hi")));
        let layout = set.to_document().unwrap();
        let bytes = encode_outbound(&OutboundPacket::ResetLayout {
            layout: layout.clone(),
        })
        .unwrap();
        assert_eq!(
            decode_outbound(&bytes),
            Ok(OutboundPacket::ResetLayout { layout })
        );
    }

    #[test]
    fn test_decode_outbound_validates_layout() {
        let bytes = body(json!({
            "type": "resetLayout",
            "layout": {"layoutId": "L", "startPage": "P1", "pages": []}
        }));
        assert!(matches!(
            decode_outbound(&bytes),
            Err(DecodeError::MalformedPacket { layout_id: Some(_), .. })
        ));
    }

    #[test]
    fn test_encode_inbound_then_decode() {
        let packet = InboundPacket::TextValueUpdate {
            element_id: ElementId::new("T"),
            value: "héllo | 12|".to_string(),
            is_automatic: false,
        };
        let bytes = encode_inbound(&packet).unwrap();
        assert_eq!(decode_inbound(&bytes), Ok(packet));
    }

    #[test]
    fn test_encode_outbound_frame_has_length_header() {
        let packet = OutboundPacket::ChangeShownPage {
            page_id: LayoutPageId::new("P"),
        };
        let body = encode_outbound(&packet).unwrap();
        let framed = encode_outbound_frame(&packet, 1024).unwrap();
        let expected_header = format!("{}|", body.len());
        assert!(framed.starts_with(expected_header.as_bytes()));
        assert!(framed.ends_with(&body));
    }

    #[test]
    fn test_encode_outbound_frame_rejects_oversized() {
        let packet = OutboundPacket::ChangeElementNote {
            element_id: ElementId::new("L"),
            note: "x".repeat(100),
        };
        assert!(matches!(
            encode_outbound_frame(&packet, 64),
            Err(EncodeError::FrameTooLarge { max: 64, .. })
        ));
    }
}
