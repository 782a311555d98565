//! # Shanghan Knowledge
//!
//! The static Shang Han Lun catalog (formulas, terminology, six-channel
//! patterns, system prompt) and the context builder that turns a free-text
//! query into grounding text plus citations.

mod data;

pub mod context;
pub mod store;

pub use context::{BuiltContext, ContextBuilder, GENERAL_REFERENCE_SOURCE, TERMINOLOGY_SOURCE};
pub use store::{
    FormulaEntry, FormulaNames, Ingredient, KnowledgeStore, PatternEntry, PatternNames,
    TerminologyEntry,
};
