//! Canned answers for when generation is unavailable.
//!
//! Topics are tried in table order and the first whose keywords occur in the
//! lower-cased query wins.

use shanghan_core::AnswerResult;

/// The topics a canned answer exists for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FallbackTopic {
    Ephedra,
    CinnamonTwig,
    Formulas,
    Treatise,
    General,
}

/// Ordered dispatch table; `General` is the catch-all and has no keywords.
const RULES: &[(FallbackTopic, &[&str])] = &[
    (FallbackTopic::Ephedra, &["ma huang", "麻黄", "ephedra"]),
    (FallbackTopic::CinnamonTwig, &["gui zhi", "桂枝", "cinnamon"]),
    (FallbackTopic::Formulas, &["formula", "prescription", "方", "tang"]),
    (FallbackTopic::Treatise, &["shang han lun", "treatise", "伤寒论"]),
];

impl FallbackTopic {
    /// Pick the topic for a query.
    pub fn classify(query: &str) -> Self {
        let query = query.to_lowercase();
        RULES
            .iter()
            .find(|(_, keywords)| keywords.iter().any(|kw| query.contains(kw)))
            .map(|(topic, _)| *topic)
            .unwrap_or(FallbackTopic::General)
    }

    pub fn answer(&self) -> &'static str {
        match self {
            FallbackTopic::Ephedra => concat!(
                "Ma Huang (Ephedra) is the chief herb in the classic formula Ma Huang Tang. ",
                "It releases the exterior and promotes perspiration. The typical dosage is 6-10g. ",
                "It is indicated for exterior cold with wheezing and absence of sweating.",
            ),
            FallbackTopic::CinnamonTwig => concat!(
                "Gui Zhi (Cinnamon Twig) is the chief herb in Gui Zhi Tang. ",
                "It releases the exterior and harmonizes ying and wei. ",
                "The typical dosage is 6-10g. It is indicated for exterior cold with sweating.",
            ),
            FallbackTopic::Formulas => concat!(
                "The Shang Han Lun contains 112 classical formulas. ",
                "Each formula has specific indications based on the pattern diagnosis. ",
                "Common formulas include Gui Zhi Tang, Ma Huang Tang, Xiao Chai Hu Tang, and others. ",
                "The formula selection depends on the stage and pattern of the disease.",
            ),
            FallbackTopic::Treatise => concat!(
                "The Shang Han Lun (Treatise on Cold Damage) is a classical TCM text written by Zhang Zhongjing. ",
                "It systematically presents 112 formulas organized by pattern diagnosis (六经辨证). ",
                "The text is foundational for understanding exterior diseases and formula selection in TCM.",
            ),
            FallbackTopic::General => concat!(
                "Thank you for your question. The Shang Han Lun is the foundational text for classical TCM formula prescribing. ",
                "I can answer questions about specific formulas, their compositions, indications, and modifications. ",
                "Please ask about a specific formula, herb, or concept.",
            ),
        }
    }

    pub fn source(&self) -> &'static str {
        match self {
            FallbackTopic::Ephedra => "Shang Han Lun - Chapter 3 (Ma Huang Tang)",
            FallbackTopic::CinnamonTwig => "Shang Han Lun - Chapter 2 (Gui Zhi Tang)",
            FallbackTopic::Formulas => "Shang Han Lun - Complete Formula Compendium",
            FallbackTopic::Treatise => "Shang Han Lun - Introduction",
            FallbackTopic::General => "Shang Han Lun - General Reference",
        }
    }
}

/// Produces canned answers by topic.
#[derive(Debug, Clone, Copy, Default)]
pub struct FallbackResponder;

impl FallbackResponder {
    pub fn new() -> Self {
        Self
    }

    pub fn respond(&self, query: &str) -> AnswerResult {
        let topic = FallbackTopic::classify(query);
        tracing::debug!(topic = ?topic, "Answering from fallback responder");
        AnswerResult::new(topic.answer(), vec![topic.source().to_string()])
    }
}
