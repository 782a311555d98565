//! Keyword matching of a query against the catalog.
//!
//! Produces the grounding text handed to the completion API together with
//! the citations for everything that matched.

use std::collections::BTreeSet;

use crate::store::{FormulaEntry, KnowledgeStore, PatternEntry};

/// Citation used when nothing in the catalog matched.
pub const GENERAL_REFERENCE_SOURCE: &str = "Shang Han Lun - General Reference";

/// Citation shared by every terminology match.
pub const TERMINOLOGY_SOURCE: &str = "Shang Han Lun - Terminology";

const GENERAL_REFERENCE: &str = "General reference: The Shang Han Lun contains 112 classical formulas organized by the Six Channel (六经辨证) pattern identification system.";

/// Context text plus deduplicated citations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuiltContext {
    /// Matched blocks joined by a blank line
    pub text: String,
    /// Unique citations, sorted
    pub sources: Vec<String>,
}

/// Builds query context from a [`KnowledgeStore`].
#[derive(Debug, Clone, Copy, Default)]
pub struct ContextBuilder {
    store: KnowledgeStore,
}

impl ContextBuilder {
    pub fn new(store: KnowledgeStore) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &KnowledgeStore {
        &self.store
    }

    /// Match `query` against formulas, terms, patterns and herbs.
    ///
    /// A formula matches when *any* token of its key occurs in the query, so
    /// a bare "tang" pulls in every decoction.
    pub fn build(&self, query: &str) -> BuiltContext {
        let query = query.to_lowercase();
        let mut blocks: Vec<String> = Vec::new();
        let mut sources: BTreeSet<String> = BTreeSet::new();

        for formula in self.store.all_formulas() {
            if formula.key_tokens().any(|token| query.contains(token)) {
                blocks.push(format_formula(formula));
                sources.insert(format!("Shang Han Lun - {}", formula.names.pinyin));
            }
        }

        for term in self.store.all_terms() {
            if query.contains(&term.zh.to_lowercase()) || query.contains(&term.en.to_lowercase()) {
                blocks.push(format!("Term: {} ({}) - {}", term.zh, term.pinyin, term.en));
                sources.insert(TERMINOLOGY_SOURCE.to_string());
            }
        }

        for pattern in self.store.all_patterns() {
            let spaced_key = pattern.key.replace('_', " ");
            if query.contains(&spaced_key) || query.contains(&pattern.names.en.to_lowercase()) {
                blocks.push(format_pattern(pattern));
                sources.insert(format!("Shang Han Lun - {} Pattern", pattern.names.en));
            }
        }

        if let Some(herb) = self
            .store
            .herb_names()
            .iter()
            .find(|herb| query.contains(*herb))
        {
            blocks.push(format!(
                "Note: Query mentions herb '{herb}' - refer to relevant formulas for usage context"
            ));
        }

        if blocks.is_empty() {
            blocks.push(GENERAL_REFERENCE.to_string());
            sources.insert(GENERAL_REFERENCE_SOURCE.to_string());
        }

        let context = BuiltContext {
            text: blocks.join("\n\n"),
            sources: sources.into_iter().collect(),
        };
        tracing::debug!(
            blocks = blocks.len(),
            chars = context.text.chars().count(),
            sources = ?context.sources,
            "Built query context"
        );
        context
    }
}

fn format_formula(formula: &FormulaEntry) -> String {
    let composition = formula
        .composition
        .iter()
        .map(|i| format!("{} ({}, {})", i.name, i.pinyin, i.dosage))
        .collect::<Vec<_>>()
        .join(", ");
    let roles = formula
        .composition
        .iter()
        .map(|i| format!("{} as {}", i.name, i.role))
        .collect::<Vec<_>>()
        .join(", ");

    format!(
        "Formula: {} ({}, {})\nComposition: {}\nRoles: {}\nIndications: {}\nFunctions: {}\nPattern: {}",
        formula.names.zh,
        formula.names.pinyin,
        formula.names.en,
        composition,
        roles,
        formula.indications,
        formula.functions,
        formula.pattern,
    )
}

fn format_pattern(pattern: &PatternEntry) -> String {
    format!(
        "Pattern: {} ({})\nLocation: {}\nCharacteristics: {}\nSub-patterns: {}",
        pattern.names.zh,
        pattern.names.en,
        pattern.location,
        pattern.characteristics,
        pattern.sub_patterns.join(", "),
    )
}
