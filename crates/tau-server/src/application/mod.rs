//! Application layer: the event handlers served to renderers.
//!
//! # What is the "application" layer? (for beginners)
//!
//! In Clean Architecture the *application* layer sits between the domain
//! (here: the tau-core layout model and protocol) and the infrastructure
//! (sockets, config files, OS input injection).
//!
//! Handlers in this layer:
//!
//! - **React** to renderer events by sending packets through the
//!   [`tau_core::PacketEncoder`] they are given.
//! - **Depend on abstractions** (traits such as
//!   [`hotkey_demo::HotkeyInjector`]) rather than OS calls.
//! - **Contain no network I/O**: one handler instance serves one connection
//!   and never sees a socket.
//!
//! # Sub-modules
//!
//! - **`extended_demo`** – Two-page layout exercising every element type and
//!   every outbound packet.
//!
//! - **`hotkey_demo`** – Copy/paste keypad that turns button clicks into
//!   keyboard chords on the server machine.

use std::fmt;

use serde::{Deserialize, Serialize};

pub mod extended_demo;
pub mod hotkey_demo;

/// Which application the server runs for every connection.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum,
)]
#[serde(rename_all = "lowercase")]
pub enum DemoKind {
    #[default]
    Extended,
    Hotkeys,
}

impl fmt::Display for DemoKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            DemoKind::Extended => "extended",
            DemoKind::Hotkeys => "hotkeys",
        })
    }
}
