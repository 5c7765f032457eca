//! Outbound packet encoder.
//!
//! [`PacketEncoder`] is the only way application code talks to the renderer.
//! Each method builds one packet, validates it, serializes and frames it, and
//! hands the finished frame to the [`PacketSink`] in a single call.  Nothing
//! is buffered here: ordering on the wire is the order of the calls.

use std::fmt;

use tracing::debug;

use crate::domain::ids::{ElementId, LayoutPageId};
use crate::domain::layout_set::LayoutSet;
use crate::protocol::codec::{encode_outbound_frame, EncodeError};
use crate::protocol::framing::DEFAULT_MAX_FRAME_SIZE;
use crate::protocol::messages::OutboundPacket;

/// Destination for complete outbound frames.
///
/// Implementations must accept the whole frame or drop it; partial writes
/// are their own concern (the server's sink forwards frames to a writer
/// task over a channel).
#[cfg_attr(test, mockall::automock)]
pub trait PacketSink {
    fn send(&mut self, frame: &[u8]);
}

/// Appends frames back to back, exactly as they would appear on the wire.
impl PacketSink for Vec<u8> {
    fn send(&mut self, frame: &[u8]) {
        self.extend_from_slice(frame);
    }
}

/// Typed front end over a [`PacketSink`].
pub struct PacketEncoder {
    sink: Box<dyn PacketSink + Send>,
    max_frame_size: usize,
    packets_sent: u64,
}

impl fmt::Debug for PacketEncoder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PacketEncoder")
            .field("max_frame_size", &self.max_frame_size)
            .field("packets_sent", &self.packets_sent)
            .finish_non_exhaustive()
    }
}

impl PacketEncoder {
    /// Creates an encoder using [`DEFAULT_MAX_FRAME_SIZE`].
    pub fn new(sink: impl PacketSink + Send + 'static) -> Self {
        Self::with_max_frame_size(sink, DEFAULT_MAX_FRAME_SIZE)
    }

    pub fn with_max_frame_size(sink: impl PacketSink + Send + 'static, max_frame_size: usize) -> Self {
        Self {
            sink: Box::new(sink),
            max_frame_size,
            packets_sent: 0,
        }
    }

    pub fn max_frame_size(&self) -> usize {
        self.max_frame_size
    }

    /// Number of frames handed to the sink so far.
    pub fn packets_sent(&self) -> u64 {
        self.packets_sent
    }

    /// Replaces the renderer's whole UI with `layout`.
    ///
    /// # Errors
    ///
    /// Returns [`EncodeError::Layout`] when the set fails validation; nothing
    /// is sent in that case.
    pub fn reset_layout(&mut self, layout: &LayoutSet) -> Result<(), EncodeError> {
        let layout = layout.to_document()?;
        self.send(&OutboundPacket::ResetLayout { layout })
    }

    /// Asks the renderer to show another page of the current layout set.
    pub fn change_shown_page(&mut self, page_id: &LayoutPageId) -> Result<(), EncodeError> {
        self.send(&OutboundPacket::ChangeShownPage {
            page_id: page_id.clone(),
        })
    }

    /// Sets the content of a text input.
    pub fn update_text_value(&mut self, element_id: &ElementId, value: &str) -> Result<(), EncodeError> {
        self.send(&OutboundPacket::UpdateTextValue {
            element_id: element_id.clone(),
            value: value.to_string(),
        })
    }

    /// Sets the state of a boolean input.
    pub fn update_bool_value(&mut self, element_id: &ElementId, value: bool) -> Result<(), EncodeError> {
        self.send(&OutboundPacket::UpdateBoolValue {
            element_id: element_id.clone(),
            value,
        })
    }

    /// Changes the caption of a button or boolean input, or a label's text.
    pub fn change_element_note(&mut self, element_id: &ElementId, note: &str) -> Result<(), EncodeError> {
        self.send(&OutboundPacket::ChangeElementNote {
            element_id: element_id.clone(),
            note: note.to_string(),
        })
    }

    /// Encodes and sends an arbitrary outbound packet.
    ///
    /// # Errors
    ///
    /// Returns [`EncodeError`] if the packet is invalid or its frame would
    /// exceed the maximum frame size.  The sink is not called on error.
    pub fn send(&mut self, packet: &OutboundPacket) -> Result<(), EncodeError> {
        let frame = encode_outbound_frame(packet, self.max_frame_size)?;
        debug!(
            packet_type = packet.packet_type().as_tag(),
            bytes = frame.len(),
            "sending packet"
        );
        self.sink.send(&frame);
        self.packets_sent += 1;
        Ok(())
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};

    use mockall::predicate::function;

    use crate::domain::layout::{ButtonElement, ContainerElement, LabelElement};
    use crate::domain::layout_set::LayoutPage;
    use crate::protocol::codec::decode_outbound;
    use crate::protocol::framing::StreamParser;

    /// Sink that keeps every frame so the test can inspect it afterwards.
    #[derive(Clone, Default)]
    struct RecordingSink {
        frames: Arc<Mutex<Vec<Vec<u8>>>>,
    }

    impl PacketSink for RecordingSink {
        fn send(&mut self, frame: &[u8]) {
            self.frames.lock().unwrap().push(frame.to_vec());
        }
    }

    impl RecordingSink {
        fn packets(&self) -> Vec<OutboundPacket> {
            let mut parser = StreamParser::default();
            self.frames
                .lock()
                .unwrap()
                .iter()
                .map(|f| {
                    let frames = parser.feed(f).unwrap();
                    assert_eq!(frames.len(), 1, "each send must carry exactly one frame");
                    decode_outbound(frames[0].payload()).unwrap()
                })
                .collect()
        }
    }

    fn sample_layout() -> LayoutSet {
        LayoutSet::with_id("SAMPLE_LAYOUT_ID")
            .push_page(LayoutPage::new(
                "P1",
                ContainerElement::vertical()
                    .push(ButtonElement::new().id("B1").note("go").switch_to_page_on_click("P2")),
            ))
            .push_page(LayoutPage::new("P2", LabelElement::new("page two").id("L2")))
    }

    #[test]
    fn test_each_method_calls_sink_exactly_once() {
        let mut sink = MockPacketSink::new();
        sink.expect_send().times(5).return_const(());
        let mut encoder = PacketEncoder::new(sink);

        encoder.reset_layout(&sample_layout()).unwrap();
        encoder.change_shown_page(&LayoutPageId::new("P2")).unwrap();
        encoder.update_text_value(&ElementId::new("T"), "text").unwrap();
        encoder.update_bool_value(&ElementId::new("C"), true).unwrap();
        encoder.change_element_note(&ElementId::new("L2"), "note").unwrap();

        assert_eq!(encoder.packets_sent(), 5);
    }

    #[test]
    fn test_sink_receives_length_prefixed_frame() {
        let mut sink = MockPacketSink::new();
        sink.expect_send()
            .with(function(|frame: &[u8]| {
                let text = String::from_utf8_lossy(frame);
                match text.split_once('|') {
                    Some((header, body)) => header.parse::<usize>().ok() == Some(body.len()),
                    None => false,
                }
            }))
            .times(1)
            .return_const(());
        let mut encoder = PacketEncoder::new(sink);

        encoder
            .update_bool_value(&ElementId::new("CHECKBOX"), false)
            .unwrap();
    }

    #[test]
    fn test_invalid_packet_never_reaches_sink() {
        let mut sink = MockPacketSink::new();
        sink.expect_send().never();
        let mut encoder = PacketEncoder::new(sink);

        assert_eq!(
            encoder.update_text_value(&ElementId::new(""), "x"),
            Err(EncodeError::EmptyIdentifier { field: "elementId" })
        );
        assert!(matches!(
            encoder.reset_layout(&LayoutSet::with_id("EMPTY")),
            Err(EncodeError::Layout(_))
        ));
        assert_eq!(encoder.packets_sent(), 0);
    }

    #[test]
    fn test_oversized_packet_is_rejected_locally() {
        let mut sink = MockPacketSink::new();
        sink.expect_send().never();
        let mut encoder = PacketEncoder::with_max_frame_size(sink, 32);

        let result = encoder.change_element_note(&ElementId::new("L"), &"n".repeat(64));
        assert!(matches!(result, Err(EncodeError::FrameTooLarge { max: 32, .. })));
    }

    #[test]
    fn test_packets_arrive_in_call_order() {
        let sink = RecordingSink::default();
        let mut encoder = PacketEncoder::new(sink.clone());

        encoder.reset_layout(&sample_layout()).unwrap();
        encoder.change_shown_page(&LayoutPageId::new("P2")).unwrap();
        encoder.change_element_note(&ElementId::new("L2"), "Button 1 pressed").unwrap();

        let packets = sink.packets();
        assert_eq!(packets.len(), 3);
        assert!(matches!(&packets[0], OutboundPacket::ResetLayout { layout } if layout.start_page == "P1"));
        assert_eq!(
            packets[1],
            OutboundPacket::ChangeShownPage {
                page_id: LayoutPageId::new("P2")
            }
        );
        assert_eq!(
            packets[2],
            OutboundPacket::ChangeElementNote {
                element_id: ElementId::new("L2"),
                note: "Button 1 pressed".to_string(),
            }
        );
    }

    #[test]
    fn test_vec_sink_concatenates_frames() {
        let mut sink = Vec::new();

        PacketSink::send(&mut sink, b"2|{}");
        PacketSink::send(&mut sink, b"3|[1]");

        assert_eq!(sink, b"2|{}3|[1]".to_vec());
    }

    #[test]
    fn test_packets_sent_counts_successful_sends_only() {
        let mut encoder = PacketEncoder::new(Vec::new());
        encoder.update_bool_value(&ElementId::new("A"), true).unwrap();
        encoder.update_bool_value(&ElementId::new("B"), false).unwrap();
        assert!(encoder.update_bool_value(&ElementId::new(""), true).is_err());
        assert_eq!(encoder.packets_sent(), 2);
    }
}
