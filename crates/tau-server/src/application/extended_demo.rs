//! Extended demo: a two-page layout exercising every element type.
//!
//! Page 1 holds a boolean input, a button whose caption is rewritten from the
//! text input, the text input itself, spacers, a "reset notes" button and a
//! button that switches to page 2 on the renderer side.  Page 2 holds four
//! numbered buttons, a label that reports which one was pressed, and a
//! "back to page 1" button that the server answers with a page change.
//!
//! ```text
//! LAYOUT_PAGE_1                         LAYOUT_PAGE_2
//! ┌──────────────┬──────────────┐       ┌──────────────┬──────────────┐
//! │ [x] BOOL     │ NOTE BUTTON  │       │      1       │      2       │
//! ├──────────────┴──────────────┤       ├──────────────┼──────────────┤
//! │ TEXT_INPUT                  │       │      3       │      4       │
//! │ (empty) x3                  │       ├──────────────┴──────────────┤
//! ├─────────┬────────┬──────────┤       │ LABEL_ON_PAGE2              │
//! │ reset   │        │ page 2 ▶ │       │ back to page 1              │
//! └─────────┴────────┴──────────┘       └─────────────────────────────┘
//! ```

use tau_core::{
    BooleanInputElement, ButtonElement, ConnectionInfo, ContainerElement, ElementId, EmptySpace,
    EncodeError, EventHandler, LabelElement, LayoutId, LayoutPage, LayoutPageId, LayoutSet,
    PacketEncoder, TextInputElement,
};
use tracing::{info, warn};

pub const LAYOUT_ID: &str = "SAMPLE_LAYOUT_ID";
pub const INITIAL_TEXT_VALUE: &str = "initial text";

pub const LAYOUT_PAGE_1: &str = "LAYOUT_PAGE_1";
pub const LAYOUT_PAGE_2: &str = "LAYOUT_PAGE_2";

pub const BUTTON_WITH_NOTE_TO_REPLACE: &str = "BUTTON_WITH_NOTE_TO_REPLACE";
pub const BUTTON_TO_RESET_NOTES: &str = "BUTTON_TO_RESET_NOTES";
pub const BUTTON_TO_PAGE_1: &str = "BUTTON_TO_PG1";
pub const BUTTON_TO_PAGE_2: &str = "BUTTON_TO_PG2";
pub const BUTTON_1: &str = "BUTTON_1";
pub const BUTTON_2: &str = "BUTTON_2";
pub const BUTTON_3: &str = "BUTTON_3";
pub const BUTTON_4: &str = "BUTTON_4";
pub const TEXT_INPUT: &str = "TEXT_INPUT";
pub const BOOL_INPUT: &str = "BOOL_INPUT";
pub const LABEL_ON_PAGE2: &str = "LABEL_ON_PAGE2";

/// Builds the demo's layout set.
pub fn build_layout() -> LayoutSet {
    let page1 = ContainerElement::vertical()
        .push(
            ContainerElement::horizontal()
                .push(
                    BooleanInputElement::new(true)
                        .note(INITIAL_TEXT_VALUE)
                        .id(BOOL_INPUT),
                )
                .push(
                    ButtonElement::new()
                        .note(INITIAL_TEXT_VALUE)
                        .id(BUTTON_WITH_NOTE_TO_REPLACE),
                ),
        )
        .push(
            TextInputElement::new()
                .id(TEXT_INPUT)
                .initial_value(INITIAL_TEXT_VALUE),
        )
        .push(EmptySpace)
        .push(EmptySpace)
        .push(EmptySpace)
        .push(
            ContainerElement::horizontal()
                .push(ButtonElement::new().note("reset notes").id(BUTTON_TO_RESET_NOTES))
                .push(EmptySpace)
                .push(
                    ButtonElement::new()
                        .note("go to page 2")
                        .id(BUTTON_TO_PAGE_2)
                        .switch_to_page_on_click(LAYOUT_PAGE_2),
                ),
        );

    let page2 = ContainerElement::vertical()
        .push(
            ContainerElement::horizontal()
                .push(ButtonElement::new().note("1").id(BUTTON_1))
                .push(ButtonElement::new().note("2").id(BUTTON_2)),
        )
        .push(
            ContainerElement::horizontal()
                .push(ButtonElement::new().note("3").id(BUTTON_3))
                .push(ButtonElement::new().note("4").id(BUTTON_4)),
        )
        .push(
            ContainerElement::vertical()
                .push(LabelElement::new("").id(LABEL_ON_PAGE2))
                .push(ButtonElement::new().note("back to page 1").id(BUTTON_TO_PAGE_1)),
        );

    LayoutSet::with_id(LayoutId::new(LAYOUT_ID))
        .push_page(LayoutPage::new(LAYOUT_PAGE_1, page1))
        .push_page(LayoutPage::new(LAYOUT_PAGE_2, page2))
        .with_start_page(LAYOUT_PAGE_1)
}

/// Per-connection handler of the extended demo.
#[derive(Debug, Default)]
pub struct ExtendedDemo;

impl ExtendedDemo {
    pub fn new() -> Self {
        Self
    }
}

fn log_send_failure(result: Result<(), EncodeError>) {
    if let Err(e) = result {
        warn!("failed to send packet: {e}");
    }
}

impl EventHandler for ExtendedDemo {
    fn on_connected(&mut self, _out: &mut PacketEncoder, info: &ConnectionInfo) {
        info!(
            "client connected: remoteAddr: {}, localAddr: {}",
            info.remote_addr_dump(),
            info.local_addr_dump()
        );
    }

    fn on_request_processing_error(
        &mut self,
        _out: &mut PacketEncoder,
        layout_id: &LayoutId,
        message: &str,
    ) {
        warn!("error received from client: layout {layout_id}: {message}");
    }

    fn on_client_device_info(&mut self, out: &mut PacketEncoder, _info: &serde_json::Value) {
        info!("received client information packet");
        log_send_failure(out.reset_layout(&build_layout()));
    }

    fn on_button_click(&mut self, out: &mut PacketEncoder, element_id: &ElementId) {
        info!("event: buttonClick, id={element_id}");
        let label = ElementId::new(LABEL_ON_PAGE2);
        let result = match element_id.as_str() {
            BUTTON_TO_RESET_NOTES => {
                out.update_text_value(&ElementId::new(TEXT_INPUT), INITIAL_TEXT_VALUE)
            }
            BUTTON_TO_PAGE_1 => out.change_shown_page(&LayoutPageId::new(LAYOUT_PAGE_1)),
            BUTTON_1 => out.change_element_note(&label, "Button 1 pressed"),
            BUTTON_2 => out.change_element_note(&label, "Button 2 pressed"),
            BUTTON_3 => out.change_element_note(&label, "Button 3 pressed"),
            BUTTON_4 => out.change_element_note(&label, "Button 4 pressed"),
            _ => Ok(()),
        };
        log_send_failure(result);
    }

    fn on_layout_page_switched(&mut self, _out: &mut PacketEncoder, page_id: &LayoutPageId) {
        info!("event: layoutPageSwitch, id={page_id}");
    }

    fn on_bool_value_update(
        &mut self,
        _out: &mut PacketEncoder,
        element_id: &ElementId,
        value: bool,
        _is_automatic: bool,
    ) {
        info!("event: boolValueUpdate, id={element_id}, value={value}");
    }

    fn on_text_value_update(
        &mut self,
        out: &mut PacketEncoder,
        element_id: &ElementId,
        value: &str,
        _is_automatic: bool,
    ) {
        info!("event: textValueUpdate, id={element_id}, value={value}");
        log_send_failure(out.change_element_note(&ElementId::new(BOOL_INPUT), value));
        log_send_failure(out.change_element_note(&ElementId::new(BUTTON_WITH_NOTE_TO_REPLACE), value));
    }

    fn on_disconnected(&mut self) {
        info!("client disconnected");
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};

    use tau_core::protocol::decode_outbound;
    use tau_core::{LayoutElement, OutboundPacket, PacketSink, StreamParser};

    #[derive(Clone, Default)]
    struct CapturingSink(Arc<Mutex<Vec<u8>>>);

    impl PacketSink for CapturingSink {
        fn send(&mut self, frame: &[u8]) {
            self.0.lock().unwrap().extend_from_slice(frame);
        }
    }

    impl CapturingSink {
        fn packets(&self) -> Vec<OutboundPacket> {
            let bytes = self.0.lock().unwrap().clone();
            StreamParser::default()
                .feed(&bytes)
                .unwrap()
                .iter()
                .map(|f| decode_outbound(f.payload()).unwrap())
                .collect()
        }
    }

    fn setup() -> (ExtendedDemo, PacketEncoder, CapturingSink) {
        let sink = CapturingSink::default();
        (ExtendedDemo::new(), PacketEncoder::new(sink.clone()), sink)
    }

    fn note(id: &str, text: &str) -> OutboundPacket {
        OutboundPacket::ChangeElementNote {
            element_id: ElementId::new(id),
            note: text.to_string(),
        }
    }

    #[test]
    fn test_layout_is_valid_and_starts_on_page_1() {
        let layout = build_layout();
        layout.validate().expect("demo layout must be valid");
        assert_eq!(layout.start_page().map(|p| p.as_str()), Some(LAYOUT_PAGE_1));
        assert_eq!(layout.pages().len(), 2);
    }

    #[test]
    fn test_page_2_has_four_numbered_buttons() {
        let layout = build_layout();
        let page2 = layout.page(&LayoutPageId::new(LAYOUT_PAGE_2)).unwrap();
        let mut buttons = Vec::new();
        page2.root.as_ref().unwrap().walk(&mut |e| {
            if let LayoutElement::Button(b) = e {
                buttons.push(b.note.clone());
            }
        });
        assert_eq!(buttons, ["1", "2", "3", "4", "back to page 1"]);
    }

    #[test]
    fn test_device_info_sends_layout_reset() {
        // Arrange
        let (mut demo, mut out, sink) = setup();

        // Act
        demo.on_client_device_info(&mut out, &serde_json::Value::Null);

        // Assert
        let packets = sink.packets();
        assert_eq!(packets.len(), 1);
        match &packets[0] {
            OutboundPacket::ResetLayout { layout } => {
                assert_eq!(layout.layout_id, LAYOUT_ID);
                assert_eq!(layout.start_page, LAYOUT_PAGE_1);
            }
            other => panic!("expected resetLayout, got {other:?}"),
        }
    }

    #[test]
    fn test_reset_button_restores_text_input() {
        let (mut demo, mut out, sink) = setup();
        demo.on_button_click(&mut out, &ElementId::new(BUTTON_TO_RESET_NOTES));
        assert_eq!(
            sink.packets(),
            vec![OutboundPacket::UpdateTextValue {
                element_id: ElementId::new(TEXT_INPUT),
                value: INITIAL_TEXT_VALUE.to_string(),
            }]
        );
    }

    #[test]
    fn test_back_button_changes_shown_page() {
        let (mut demo, mut out, sink) = setup();
        demo.on_button_click(&mut out, &ElementId::new(BUTTON_TO_PAGE_1));
        assert_eq!(
            sink.packets(),
            vec![OutboundPacket::ChangeShownPage {
                page_id: LayoutPageId::new(LAYOUT_PAGE_1),
            }]
        );
    }

    #[test]
    fn test_numbered_buttons_update_label() {
        let (mut demo, mut out, sink) = setup();
        for id in [BUTTON_1, BUTTON_2, BUTTON_3, BUTTON_4] {
            demo.on_button_click(&mut out, &ElementId::new(id));
        }
        assert_eq!(
            sink.packets(),
            vec![
                note(LABEL_ON_PAGE2, "Button 1 pressed"),
                note(LABEL_ON_PAGE2, "Button 2 pressed"),
                note(LABEL_ON_PAGE2, "Button 3 pressed"),
                note(LABEL_ON_PAGE2, "Button 4 pressed"),
            ]
        );
    }

    #[test]
    fn test_page_2_button_is_handled_by_renderer_only() {
        let (mut demo, mut out, sink) = setup();
        demo.on_button_click(&mut out, &ElementId::new(BUTTON_TO_PAGE_2));
        demo.on_button_click(&mut out, &ElementId::new("SOMETHING_ELSE"));
        assert!(sink.packets().is_empty());
    }

    #[test]
    fn test_text_update_rewrites_two_notes() {
        let (mut demo, mut out, sink) = setup();
        demo.on_text_value_update(&mut out, &ElementId::new(TEXT_INPUT), "typed", false);
        assert_eq!(
            sink.packets(),
            vec![
                note(BOOL_INPUT, "typed"),
                note(BUTTON_WITH_NOTE_TO_REPLACE, "typed"),
            ]
        );
    }

    #[test]
    fn test_bool_update_and_page_switch_send_nothing() {
        let (mut demo, mut out, sink) = setup();
        demo.on_bool_value_update(&mut out, &ElementId::new(BOOL_INPUT), false, false);
        demo.on_layout_page_switched(&mut out, &LayoutPageId::new(LAYOUT_PAGE_2));
        assert!(sink.packets().is_empty());
    }
}
