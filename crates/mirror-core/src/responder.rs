use rand::Rng;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::category::{Category, CategoryTable, Tone};
use crate::matcher::{Classification, classify};
use crate::template::{Placeholder, RenderContext};
use crate::time::Timestamp;

pub const DEFAULT_SUBJECT: &str = "friend";

/// Longest input excerpt substituted for `{text}`, in characters.
pub const EXCERPT_CHARS: usize = 80;

/// A filled template plus the random choice that went into it.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Rendered {
    pub message: String,
    pub phrase: Option<String>,
}

/// One reply to one input.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Response {
    pub id: Uuid,
    pub category: String,
    pub tone: Tone,
    pub score: f64,
    pub message: String,
    pub phrase: Option<String>,
    pub subject: String,
    pub timestamp: String,
}

/// Classifies input against a category table and renders the reply.
#[derive(Clone, Debug)]
pub struct Responder {
    table: CategoryTable,
    subject: String,
}

impl Responder {
    pub fn new(table: CategoryTable) -> Self {
        Self {
            table,
            subject: DEFAULT_SUBJECT.to_string(),
        }
    }

    /// Name used when a request does not supply one.
    pub fn with_subject(mut self, subject: impl Into<String>) -> Self {
        let subject = subject.into();
        if !subject.trim().is_empty() {
            self.subject = subject.trim().to_string();
        }
        self
    }

    pub fn table(&self) -> &CategoryTable {
        &self.table
    }

    pub fn subject(&self) -> &str {
        &self.subject
    }

    pub fn classify(&self, text: &str) -> Classification {
        classify(&self.table, text)
    }

    /// Fill `category`'s template for `text`.
    ///
    /// A phrase is drawn from the pool only when the template uses `{phrase}`,
    /// so templates without one leave `rng` untouched.
    pub fn render(
        &self,
        category: &Category,
        text: &str,
        subject: Option<&str>,
        timestamp: Timestamp,
        rng: &mut impl Rng,
    ) -> Rendered {
        let name = self.resolve_subject(subject);
        let phrase = if category.template().uses(Placeholder::Phrase) {
            self.draw_phrase(rng)
        } else {
            None
        };
        let timestamp = timestamp.to_string();
        let excerpt = excerpt(text);

        let message = category.template().render(&RenderContext {
            name,
            phrase: phrase.as_deref(),
            timestamp: &timestamp,
            category: category.name(),
            text: &excerpt,
        });

        Rendered { message, phrase }
    }

    /// Classify and render in one step, stamped with the current time.
    pub fn respond(&self, text: &str, subject: Option<&str>, rng: &mut impl Rng) -> Response {
        self.respond_at(text, subject, Timestamp::now(), rng)
    }

    pub fn respond_at(
        &self,
        text: &str,
        subject: Option<&str>,
        timestamp: Timestamp,
        rng: &mut impl Rng,
    ) -> Response {
        let classification = self.classify(text);
        self.reply(&classification, text, subject, timestamp, rng)
    }

    /// Render the reply for an existing classification of `text`.
    ///
    /// `classification` must come from this responder's table.
    pub fn reply(
        &self,
        classification: &Classification,
        text: &str,
        subject: Option<&str>,
        timestamp: Timestamp,
        rng: &mut impl Rng,
    ) -> Response {
        let category = &self.table.categories()[classification.index];
        let rendered = self.render(category, text, subject, timestamp, rng);

        Response {
            id: Uuid::new_v4(),
            category: classification.category.clone(),
            tone: category.tone(),
            score: classification.score,
            message: rendered.message,
            phrase: rendered.phrase,
            subject: self.resolve_subject(subject).to_string(),
            timestamp: timestamp.to_string(),
        }
    }

    fn resolve_subject<'a>(&'a self, subject: Option<&'a str>) -> &'a str {
        match subject.map(str::trim) {
            Some(s) if !s.is_empty() => s,
            _ => &self.subject,
        }
    }

    fn draw_phrase(&self, rng: &mut impl Rng) -> Option<String> {
        let pool = self.table.phrases();
        if pool.is_empty() {
            return None;
        }
        Some(pool[rng.random_range(0..pool.len())].clone())
    }
}

/// First [`EXCERPT_CHARS`] characters of the trimmed input, with `...` when cut.
fn excerpt(text: &str) -> String {
    let text = text.trim();
    match text.char_indices().nth(EXCERPT_CHARS) {
        Some((cut, _)) => format!("{}...", &text[..cut]),
        None => text.to_string(),
    }
}
