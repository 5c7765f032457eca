//! Identifier value types for layouts, layout pages and elements.
//!
//! All three are thin newtypes over `String`.  Equality, ordering and hashing
//! follow the underlying string, so identifiers can be used directly as map
//! keys when routing events.  On the wire every identifier is a plain JSON
//! string.

use std::borrow::Borrow;
use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

macro_rules! string_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            /// Creates an identifier from any string-like value.
            pub fn new(value: impl Into<String>) -> Self {
                Self(value.into())
            }

            /// Returns the identifier text.
            pub fn as_str(&self) -> &str {
                &self.0
            }

            /// Returns `true` when the identifier is the empty string.
            pub fn is_empty(&self) -> bool {
                self.0.is_empty()
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl From<&str> for $name {
            fn from(value: &str) -> Self {
                Self(value.to_owned())
            }
        }

        impl From<String> for $name {
            fn from(value: String) -> Self {
                Self(value)
            }
        }

        impl AsRef<str> for $name {
            fn as_ref(&self) -> &str {
                &self.0
            }
        }

        impl Borrow<str> for $name {
            fn borrow(&self) -> &str {
                &self.0
            }
        }

        impl PartialEq<str> for $name {
            fn eq(&self, other: &str) -> bool {
                self.0 == other
            }
        }

        impl PartialEq<&str> for $name {
            fn eq(&self, other: &&str) -> bool {
                self.0 == *other
            }
        }
    };
}

string_id!(
    /// Identifies an element inside a layout page (a button, an input, a label).
    ///
    /// Element ids are how the remote renderer reports interactions and how
    /// the server addresses elements in update packets.
    ElementId
);

string_id!(
    /// Identifies one page of a [`crate::LayoutSet`].
    LayoutPageId
);

string_id!(
    /// Identifies a whole layout set.  The remote peer quotes it back in
    /// `requestProcessingError` packets.
    LayoutId
);

impl LayoutId {
    /// Creates a fresh, random layout id.
    pub fn generate() -> Self {
        Self(Uuid::new_v4().to_string())
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
