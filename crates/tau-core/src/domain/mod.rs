//! Domain entities: identifiers and the declarative layout model.
//!
//! Nothing in here knows about bytes, sockets or packets.  The layout model
//! only describes a UI tree and knows how to validate it and turn it into the
//! JSON document the renderer expects.

/// Identifier value types ([`ids::ElementId`], [`ids::LayoutPageId`], [`ids::LayoutId`]).
pub mod ids;

/// Element tree and builders.
pub mod layout;

/// Pages and the layout set.
pub mod layout_set;
