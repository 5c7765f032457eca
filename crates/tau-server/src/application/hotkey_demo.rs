//! Hotkey emulator demo: a remote "copy" / "paste" keypad.
//!
//! The renderer shows two buttons.  Each click is translated into a
//! modifier + key chord and handed to a [`HotkeyInjector`], which is the only
//! part that touches the operating system.
//!
//! Copy and paste use the Insert-key chords (Ctrl+Insert, Shift+Insert)
//! because they work in terminals as well as in ordinary text fields.

use std::fmt;
use std::sync::Arc;

use tau_core::{
    ButtonElement, ConnectionInfo, ContainerElement, ElementId, EventHandler, LayoutId, LayoutPage,
    LayoutSet, PacketEncoder,
};
use tracing::{info, warn};

pub const LAYOUT_PAGE: &str = "LAYOUT_PAGE_ID";
pub const COPY_BUTTON: &str = "COPY";
pub const PASTE_BUTTON: &str = "PASTE";

/// Modifier held down for the duration of a chord.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Modifier {
    Control,
    Shift,
    Alt,
}

/// Main key of a chord.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Key {
    Insert,
    Delete,
    Home,
    End,
    PageUp,
    PageDown,
    PrintScreen,
    NumLock,
    Left,
    Up,
    Right,
    Down,
    Char(char),
}

impl Key {
    /// Keys that live in the extended block of a PC keyboard.  Injectors that
    /// synthesize scan codes must flag these, or the numeric keypad variant is
    /// produced instead.
    pub fn is_extended(self) -> bool {
        !matches!(self, Key::Char(_))
    }
}

/// Direction of one synthetic key event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyAction {
    Press,
    Release,
}

/// One synthetic key event of a chord.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyStroke {
    Modifier(Modifier, KeyAction),
    Key(Key, KeyAction),
}

/// A modifier + key chord such as Ctrl+Insert.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Hotkey {
    pub modifier: Modifier,
    pub key: Key,
}

impl Hotkey {
    pub const COPY: Hotkey = Hotkey {
        modifier: Modifier::Control,
        key: Key::Insert,
    };

    pub const PASTE: Hotkey = Hotkey {
        modifier: Modifier::Shift,
        key: Key::Insert,
    };

    /// The four events that type this chord: modifier down, key down, key up,
    /// modifier up.
    pub fn strokes(self) -> [KeyStroke; 4] {
        [
            KeyStroke::Modifier(self.modifier, KeyAction::Press),
            KeyStroke::Key(self.key, KeyAction::Press),
            KeyStroke::Key(self.key, KeyAction::Release),
            KeyStroke::Modifier(self.modifier, KeyAction::Release),
        ]
    }
}

impl fmt::Display for Hotkey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let modifier = match self.modifier {
            Modifier::Control => "Ctrl",
            Modifier::Shift => "Shift",
            Modifier::Alt => "Alt",
        };
        match self.key {
            Key::Char(c) => write!(f, "{modifier}+{}", c.to_ascii_uppercase()),
            key => write!(f, "{modifier}+{key:?}"),
        }
    }
}

/// Trait for synthesizing keyboard input on the host.
///
/// Infrastructure implementations call into the OS; test implementations
/// record calls.
#[cfg_attr(test, mockall::automock)]
pub trait HotkeyInjector: Send + Sync {
    /// Types `hotkey` on the local machine.
    fn inject(&self, hotkey: Hotkey) -> Result<(), String>;
}

/// Injector that only logs the chord.  Used on hosts without an input
/// injection backend and in headless runs.
#[derive(Debug, Default)]
pub struct LoggingHotkeyInjector;

impl HotkeyInjector for LoggingHotkeyInjector {
    fn inject(&self, hotkey: Hotkey) -> Result<(), String> {
        info!(strokes = ?hotkey.strokes(), "injecting hotkey {hotkey}");
        Ok(())
    }
}

/// Builds the keypad layout: one page with the two buttons stacked.
pub fn build_layout() -> LayoutSet {
    LayoutSet::new().push_page(LayoutPage::new(
        LAYOUT_PAGE,
        ContainerElement::vertical()
            .push(ButtonElement::new().note("copy").id(COPY_BUTTON))
            .push(ButtonElement::new().note("paste").id(PASTE_BUTTON)),
    ))
}

/// Per-connection handler of the hotkey demo.
pub struct HotkeyDemo {
    injector: Arc<dyn HotkeyInjector>,
}

impl HotkeyDemo {
    pub fn new(injector: Arc<dyn HotkeyInjector>) -> Self {
        Self { injector }
    }
}

impl EventHandler for HotkeyDemo {
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
        if let Err(e) = out.reset_layout(&build_layout()) {
            warn!("failed to send keypad layout: {e}");
        }
    }

    fn on_button_click(&mut self, _out: &mut PacketEncoder, element_id: &ElementId) {
        let hotkey = match element_id.as_str() {
            COPY_BUTTON => Hotkey::COPY,
            PASTE_BUTTON => Hotkey::PASTE,
            _ => {
                warn!("unknown button pressed: {element_id}");
                return;
            }
        };
        if let Err(e) = self.injector.inject(hotkey) {
            warn!("failed to inject {hotkey}: {e}");
        }
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    use tau_core::protocol::decode_outbound;
    use tau_core::{OutboundPacket, StreamParser};

    #[derive(Default)]
    struct RecordingInjector {
        injected: Mutex<Vec<Hotkey>>,
    }

    impl HotkeyInjector for RecordingInjector {
        fn inject(&self, hotkey: Hotkey) -> Result<(), String> {
            self.injected.lock().unwrap().push(hotkey);
            Ok(())
        }
    }

    struct FailingInjector;

    impl HotkeyInjector for FailingInjector {
        fn inject(&self, _hotkey: Hotkey) -> Result<(), String> {
            Err("no input backend".to_string())
        }
    }

    fn setup() -> (HotkeyDemo, Arc<RecordingInjector>) {
        let injector = Arc::new(RecordingInjector::default());
        (HotkeyDemo::new(injector.clone()), injector)
    }

    #[test]
    fn test_copy_and_paste_map_to_insert_chords() {
        // Arrange
        let (mut demo, injector) = setup();
        let mut out = PacketEncoder::new(Vec::new());

        // Act
        demo.on_button_click(&mut out, &ElementId::new(COPY_BUTTON));
        demo.on_button_click(&mut out, &ElementId::new(PASTE_BUTTON));

        // Assert
        assert_eq!(
            *injector.injected.lock().unwrap(),
            vec![Hotkey::COPY, Hotkey::PASTE]
        );
        assert_eq!(out.packets_sent(), 0);
    }

    #[test]
    fn test_each_click_injects_exactly_one_chord() {
        let mut injector = MockHotkeyInjector::new();
        injector
            .expect_inject()
            .with(mockall::predicate::eq(Hotkey::PASTE))
            .times(2)
            .returning(|_| Ok(()));
        let mut demo = HotkeyDemo::new(Arc::new(injector));
        let mut out = PacketEncoder::new(Vec::new());

        demo.on_button_click(&mut out, &ElementId::new(PASTE_BUTTON));
        demo.on_button_click(&mut out, &ElementId::new(PASTE_BUTTON));
    }

    #[test]
    fn test_unknown_button_injects_nothing() {
        let (mut demo, injector) = setup();
        let mut out = PacketEncoder::new(Vec::new());
        demo.on_button_click(&mut out, &ElementId::new("BUTTON_1"));
        assert!(injector.injected.lock().unwrap().is_empty());
    }

    #[test]
    fn test_injector_failure_is_not_fatal() {
        let mut demo = HotkeyDemo::new(Arc::new(FailingInjector));
        let mut out = PacketEncoder::new(Vec::new());
        demo.on_button_click(&mut out, &ElementId::new(COPY_BUTTON));
    }

    #[test]
    fn test_device_info_sends_keypad_layout() {
        let (mut demo, _injector) = setup();
        let sink = Arc::new(Mutex::new(Vec::<u8>::new()));

        #[derive(Clone)]
        struct Shared(Arc<Mutex<Vec<u8>>>);
        impl tau_core::PacketSink for Shared {
            fn send(&mut self, frame: &[u8]) {
                self.0.lock().unwrap().extend_from_slice(frame);
            }
        }

        let mut out = PacketEncoder::new(Shared(sink.clone()));
        demo.on_client_device_info(&mut out, &serde_json::Value::Null);

        let bytes = sink.lock().unwrap().clone();
        let frames = StreamParser::default().feed(&bytes).unwrap();
        assert_eq!(frames.len(), 1);
        let OutboundPacket::ResetLayout { layout } = decode_outbound(frames[0].payload()).unwrap()
        else {
            panic!("expected resetLayout");
        };
        assert_eq!(layout.start_page, LAYOUT_PAGE);
        let json = serde_json::to_string(&layout).unwrap();
        assert!(json.contains("\"COPY\"") && json.contains("\"PASTE\""));
    }

    #[test]
    fn test_chord_strokes_release_in_reverse_order() {
        assert_eq!(
            Hotkey::PASTE.strokes(),
            [
                KeyStroke::Modifier(Modifier::Shift, KeyAction::Press),
                KeyStroke::Key(Key::Insert, KeyAction::Press),
                KeyStroke::Key(Key::Insert, KeyAction::Release),
                KeyStroke::Modifier(Modifier::Shift, KeyAction::Release),
            ]
        );
    }

    #[test]
    fn test_hotkey_display() {
        assert_eq!(Hotkey::COPY.to_string(), "Ctrl+Insert");
        assert_eq!(
            Hotkey {
                modifier: Modifier::Control,
                key: Key::Char('v')
            }
            .to_string(),
            "Ctrl+V"
        );
    }

    #[test]
    fn test_only_navigation_keys_are_extended() {
        assert!(Key::Insert.is_extended());
        assert!(Key::Down.is_extended());
        assert!(!Key::Char('c').is_extended());
    }
}
