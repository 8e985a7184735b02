//! Outcome resolution engine for Werkbank.
//!
//! Turns a degree of success on a crafting, identification, reverse
//! engineering, or rune etching check into a consequence descriptor: the
//! items to create, update, and delete, and what to tell the player. Skill
//! checks, dialogs, and document storage stay with the host; the engine
//! reaches them only through the traits in [`collaborators`].

pub mod collaborators;
pub mod config;
pub mod consequence;
pub mod consumption;
pub mod degree;
pub mod difficulty;
pub mod error;
pub mod feats;
pub mod formula_cache;
pub mod memory;
pub mod replacement;
pub mod resolve;
pub mod runes;
pub mod workshop;

pub use collaborators::{
    ConfigurationProvider, DocumentPersistence, ItemDefinitionFetch, ItemIndexSearch,
};
pub use config::{EngineConfig, RarityAdjustments, ReplacementConfig, ReplacementNaming};
pub use consequence::{
    ActorChange, ApplyReport, ConsequenceDescriptor, ItemChange, ItemUpdate, apply_consequence,
};
pub use consumption::{ConsumptionMode, ConsumptionResult, MaterialLine, MaterialUse, consume};
pub use degree::DegreeOfSuccess;
pub use difficulty::{DifficultyCalculator, DifficultyRequest};
pub use error::{CollaboratorError, EngineError, EngineResult, Stage};
pub use feats::{Capabilities, FeatCapability, FeatCatalog, Skill};
pub use formula_cache::FormulaCache;
pub use memory::{MemoryCatalog, MemoryConfig, MemoryPersistence};
pub use replacement::{Replacement, SelectionTier, select_replacement};
pub use resolve::Resolution;
pub use runes::{Incompatibility, RuneMatcher, RuneSlot, SlotKey, SlotKind};
pub use workshop::Workshop;
