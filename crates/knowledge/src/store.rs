//! Read-only catalog of formulas, terminology and patterns.
//!
//! All entries are `'static` and never mutated, so a single store can be
//! shared across request tasks without locks.

use crate::data;

/// One herb within a formula, in listing order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Ingredient {
    /// Native-script herb name
    pub name: &'static str,
    pub pinyin: &'static str,
    pub english: &'static str,
    pub dosage: &'static str,
    /// Hierarchical role (Jun / Chen / Zuo / Shi)
    pub role: &'static str,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FormulaNames {
    pub zh: &'static str,
    pub pinyin: &'static str,
    pub en: &'static str,
}

/// A classical prescription.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FormulaEntry {
    /// Snake-case catalog key; its tokens are what queries are matched on
    pub key: &'static str,
    pub names: FormulaNames,
    pub composition: &'static [Ingredient],
    pub indications: &'static str,
    pub functions: &'static str,
    /// Pattern-stage tag
    pub pattern: &'static str,
}

impl FormulaEntry {
    /// The whitespace tokens of the key with underscores read as spaces.
    pub fn key_tokens(&self) -> impl Iterator<Item = &'static str> {
        self.key.split('_').filter(|t| !t.is_empty())
    }
}

/// A native term with its gloss.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TerminologyEntry {
    pub zh: &'static str,
    pub en: &'static str,
    pub pinyin: &'static str,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PatternNames {
    pub zh: &'static str,
    pub en: &'static str,
}

/// A six-channel diagnostic stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PatternEntry {
    pub key: &'static str,
    pub names: PatternNames,
    pub location: &'static str,
    pub characteristics: &'static str,
    pub sub_patterns: &'static [&'static str],
}

/// The knowledge catalog plus the assistant persona.
#[derive(Debug, Clone, Copy)]
pub struct KnowledgeStore {
    formulas: &'static [FormulaEntry],
    terms: &'static [TerminologyEntry],
    patterns: &'static [PatternEntry],
    herbs: &'static [&'static str],
    system_prompt: &'static str,
}

impl KnowledgeStore {
    /// The built-in Shang Han Lun catalog.
    pub fn builtin() -> Self {
        Self {
            formulas: data::FORMULAS,
            terms: data::TERMINOLOGY,
            patterns: data::PATTERNS,
            herbs: data::HERBS,
            system_prompt: data::SYSTEM_PROMPT,
        }
    }

    pub fn lookup_formula(&self, key: &str) -> Option<&'static FormulaEntry> {
        self.formulas.iter().find(|f| f.key == key)
    }

    /// All formulas in catalog order.
    pub fn all_formulas(&self) -> &'static [FormulaEntry] {
        self.formulas
    }

    /// Look up a term by its native spelling.
    pub fn lookup_term(&self, term: &str) -> Option<&'static TerminologyEntry> {
        self.terms.iter().find(|t| t.zh == term)
    }

    pub fn all_terms(&self) -> &'static [TerminologyEntry] {
        self.terms
    }

    pub fn lookup_pattern(&self, key: &str) -> Option<&'static PatternEntry> {
        self.patterns.iter().find(|p| p.key == key)
    }

    pub fn all_patterns(&self) -> &'static [PatternEntry] {
        self.patterns
    }

    /// The herb watch-list, in scan order.
    pub fn herb_names(&self) -> &'static [&'static str] {
        self.herbs
    }

    /// Persona and answering rules sent as the system message.
    pub fn system_prompt(&self) -> &'static str {
        self.system_prompt
    }
}

impl Default for KnowledgeStore {
    fn default() -> Self {
        Self::builtin()
    }
}
