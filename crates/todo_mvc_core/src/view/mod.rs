//! View layer: page containers, templates, markup scanning and event routing.
//!
//! # Responsibility
//! - Render attribute stores into mount containers through compiled templates.
//! - Route interactions on rendered markup to view handlers.
//!
//! # Invariants
//! - Templates compile once per view; rendering never recompiles.
//! - Event routing is delegated through the mount, so it survives content
//!   replacement.

pub mod document;
pub mod events;
pub mod markup;
pub mod render_view;
pub mod template;
