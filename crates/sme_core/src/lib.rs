//! Toolkit-independent document model for a hierarchical state-chart editor.
//!
//! The model is an ownership tree of [`Element`]s (states and transitions)
//! stored in an id-addressed arena ([`StateChart`]). Transition endpoints are
//! relations (ids that must resolve), not ownership. Enumeration is done with
//! the generic depth-first [`TreeWalker`].

mod element;
pub use element::*;

mod property;
pub use property::*;

mod chart;
pub use chart::*;

mod walker;
pub use walker::*;

mod event;
pub use event::*;

mod error;
pub use error::*;
