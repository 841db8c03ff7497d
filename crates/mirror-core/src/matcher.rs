use serde::Serialize;

use crate::category::{Category, CategoryTable};

/// Score of one category against one input.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct CategoryScore {
    pub category: String,
    pub score: f64,
}

/// Outcome of classifying one input against a table.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Classification {
    /// Position of the chosen category in the table.
    #[serde(skip)]
    pub index: usize,
    pub category: String,
    pub score: f64,
    /// True when nothing matched and the table default was chosen.
    pub is_default: bool,
    /// Every category's score, in table order.
    pub scores: Vec<CategoryScore>,
}

/// Lowercase one character at a time.
///
/// Unlike `str::to_lowercase` this ignores word position (capital sigma
/// always folds to `σ`), so a keyword folds the same way wherever it occurs.
pub fn fold_case(s: &str) -> String {
    s.chars().flat_map(char::to_lowercase).collect()
}

/// Fraction of the category's keywords that occur in `text`.
///
/// Matching is case-insensitive substring containment with no tokenization,
/// so a keyword matches inside longer words. A category without keywords
/// scores 0.
pub fn score(text: &str, category: &Category) -> f64 {
    score_lowered(&fold_case(text), category)
}

fn score_lowered(lowered: &str, category: &Category) -> f64 {
    let keywords = category.keywords();
    if keywords.is_empty() {
        return 0.0;
    }
    let hits = keywords
        .iter()
        .filter(|kw| lowered.contains(kw.as_str()))
        .count();
    hits as f64 / keywords.len() as f64
}

/// Pick the best-scoring category for `text`.
///
/// The earliest category in table order wins a tie. When every score is zero
/// the table's default category is returned with score 0.
pub fn classify(table: &CategoryTable, text: &str) -> Classification {
    let lowered = fold_case(text);

    let mut best: Option<(usize, f64)> = None;
    let mut scores = Vec::with_capacity(table.len());

    for (i, category) in table.categories().iter().enumerate() {
        let s = score_lowered(&lowered, category);
        if s > 0.0 && best.is_none_or(|(_, b)| s > b) {
            best = Some((i, s));
        }
        scores.push(CategoryScore {
            category: category.name().to_string(),
            score: s,
        });
    }

    let (index, score, is_default) = match best {
        Some((i, s)) => (i, s, false),
        None => (table.default_index(), 0.0, true),
    };

    Classification {
        index,
        category: table.categories()[index].name().to_string(),
        score,
        is_default,
        scores,
    }
}
