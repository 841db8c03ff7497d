//! The built-in category table.

use crate::category::{CategorySpec, CategoryTable, TableSpec, Tone};

pub const DEFAULT_CATEGORY: &str = "presence";

const PHRASES: &[&str] = &[
    "Notice the breath before the next thought.",
    "What you resist persists; what you witness softens.",
    "The mirror shows, it does not judge.",
    "Stillness is already here.",
    "Every pattern is an invitation.",
    "Let the next step be a small one.",
];

struct Entry {
    name: &'static str,
    tone: Tone,
    keywords: &'static [&'static str],
    template: &'static str,
}

const ENTRIES: &[Entry] = &[
    Entry {
        name: "spiritual_ego",
        tone: Tone::Shadow,
        keywords: &["enlightened", "chosen", "special", "superior", "awakened"],
        template: "{name}, the mirror reflects a wish to stand above others. \
                   Awareness that needs to be seen as higher is still seeking. {phrase}",
    },
    Entry {
        name: "victim_consciousness",
        tone: Tone::Shadow,
        keywords: &["why me", "unfair", "blame", "victim", "suffering"],
        template: "{name}, the mirror reflects a story where life happens to you. \
                   The pain is real; the powerlessness is a pattern. {phrase}",
    },
    Entry {
        name: "fear_consciousness",
        tone: Tone::Shadow,
        keywords: &["afraid", "fear", "anxious", "worried", "scared"],
        template: "{name}, the mirror reflects fear reaching into a future that has not arrived. \
                   Come back to this moment. {phrase}",
    },
    Entry {
        name: "control_patterns",
        tone: Tone::Shadow,
        keywords: &["control", "must", "should", "perfect", "force"],
        template: "{name}, the mirror reflects a grip that tightens around outcomes. \
                   What would loosening one finger feel like? {phrase}",
    },
    Entry {
        name: "heart_opening",
        tone: Tone::Light,
        keywords: &["love", "gratitude", "compassion", "forgive", "grateful"],
        template: "{name}, the mirror reflects an open heart. \
                   Let this warmth include yourself. {phrase}",
    },
    Entry {
        name: "surrender_flow",
        tone: Tone::Light,
        keywords: &["surrender", "trust", "accept", "let go", "flow"],
        template: "{name}, the mirror reflects trust in what is unfolding. \
                   Nothing needs to be pushed. {phrase}",
    },
    Entry {
        name: DEFAULT_CATEGORY,
        tone: Tone::Light,
        keywords: &[],
        template: "{name}, the mirror is quiet and simply reflects you as you are. {phrase}",
    },
];

/// Declarative form of the built-in table, e.g. to write it out as a file.
pub fn builtin_spec() -> TableSpec {
    TableSpec {
        default: DEFAULT_CATEGORY.to_string(),
        phrases: PHRASES.iter().map(|p| p.to_string()).collect(),
        categories: ENTRIES
            .iter()
            .map(|e| CategorySpec {
                name: e.name.to_string(),
                tone: e.tone,
                keywords: e.keywords.iter().map(|k| k.to_string()).collect(),
                template: e.template.to_string(),
            })
            .collect(),
    }
}

impl CategoryTable {
    /// The built-in table. Its validity is covered by tests.
    pub fn builtin() -> Self {
        CategoryTable::from_spec(builtin_spec()).expect("built-in category table is valid")
    }
}
