//! Peripheral host capabilities.
//!
//! Stateless helpers the embedding application reaches for alongside the
//! background audio manager: the OS color-scheme preference, a navigation
//! history stack, persisted string attributes and the wall clock.

pub mod attributes;
pub mod clock;
pub mod color_scheme;
pub mod history;

pub use attributes::AttributeStore;
pub use clock::timestamp_millis;
pub use color_scheme::{ColorScheme, prefers_dark};
pub use history::NavigationHistory;
