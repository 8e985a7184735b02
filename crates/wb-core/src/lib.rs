//! Core types for Werkbank: items, actors, money, and rune configurations.
//!
//! This crate holds the validated view-models the outcome engine operates on.
//! Hosts translate their loosely structured item documents into these types
//! once per resolution, so every branch downstream works on typed data.

/// Actors and the formulas they know.
pub mod actor;
/// Error types used throughout the crate.
pub mod error;
/// Identifiers for items, actors, and catalog documents.
pub mod id;
/// Item data, classification, and identification state.
pub mod item;
/// Coin amounts.
pub mod price;
/// Rune definitions and the rune configuration of a base item.
pub mod rune;

/// Re-export actor types.
pub use actor::{ActorView, FormulaEntry};
/// Re-export error types.
pub use error::{CoreError, CoreResult};
/// Re-export identifier types.
pub use id::{ActorId, DocumentRef, ItemId};
/// Re-export item types.
pub use item::{
    IdentificationState, IdentificationStatus, IndexEntry, InventoryItem, ItemData, ItemKind,
    Rarity, RetryMarker, TraitSet,
};
/// Re-export money types.
pub use price::Price;
/// Re-export rune types.
pub use rune::{RuneDefinition, RuneKind, RuneState, RuneUsage};
