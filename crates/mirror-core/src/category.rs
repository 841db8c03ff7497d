use std::collections::HashSet;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::matcher::fold_case;
use crate::template::{Placeholder, Template, TemplateError};

/// Whether a category names a pattern to be mirrored back (shadow) or one to
/// be affirmed (light).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Tone {
    Shadow,
    Light,
}

impl Tone {
    pub fn as_str(self) -> &'static str {
        match self {
            Tone::Shadow => "shadow",
            Tone::Light => "light",
        }
    }
}

impl fmt::Display for Tone {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Declarative form of one category, as written in a table file.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CategorySpec {
    pub name: String,
    pub tone: Tone,
    #[serde(default)]
    pub keywords: Vec<String>,
    pub template: String,
}

/// Declarative form of a whole category table.
///
/// Category order is significant: it decides ties during classification.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TableSpec {
    /// Category returned when no keyword of any category matches.
    pub default: String,
    #[serde(default)]
    pub phrases: Vec<String>,
    #[serde(rename = "category", default)]
    pub categories: Vec<CategorySpec>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TableError {
    Empty,
    EmptyName,
    DuplicateCategory(String),
    UnknownDefault(String),
    EmptyKeyword { category: String },
    Template { category: String, source: TemplateError },
    MissingName { category: String },
    EmptyPhrasePool { category: String },
}

impl fmt::Display for TableError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TableError::Empty => write!(f, "category table has no categories"),
            TableError::EmptyName => write!(f, "category name must not be empty"),
            TableError::DuplicateCategory(name) => write!(f, "duplicate category '{name}'"),
            TableError::UnknownDefault(name) => {
                write!(f, "default category '{name}' is not in the table")
            }
            TableError::EmptyKeyword { category } => {
                write!(f, "category '{category}' has an empty keyword")
            }
            TableError::Template { category, source } => {
                write!(f, "template for '{category}': {source}")
            }
            TableError::MissingName { category } => {
                write!(f, "template for '{category}' must contain {{name}}")
            }
            TableError::EmptyPhrasePool { category } => write!(
                f,
                "template for '{category}' uses {{phrase}} but the phrase pool is empty"
            ),
        }
    }
}

impl std::error::Error for TableError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            TableError::Template { source, .. } => Some(source),
            _ => None,
        }
    }
}

/// A validated category: lowercase, deduplicated keywords and a parsed template.
#[derive(Clone, Debug)]
pub struct Category {
    name: String,
    tone: Tone,
    keywords: Vec<String>,
    template: Template,
}

impl Category {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn tone(&self) -> Tone {
        self.tone
    }

    /// Keywords in their original order, lowercased with spacing kept.
    pub fn keywords(&self) -> &[String] {
        &self.keywords
    }

    pub fn template(&self) -> &Template {
        &self.template
    }

    fn from_spec(spec: CategorySpec, has_phrases: bool) -> Result<Self, TableError> {
        let name = spec.name.trim().to_string();
        if name.is_empty() {
            return Err(TableError::EmptyName);
        }

        let mut seen = HashSet::new();
        let mut keywords = Vec::with_capacity(spec.keywords.len());
        for kw in &spec.keywords {
            // Surrounding spaces stay part of the keyword.
            if kw.trim().is_empty() {
                return Err(TableError::EmptyKeyword { category: name });
            }
            let kw = fold_case(kw);
            if seen.insert(kw.clone()) {
                keywords.push(kw);
            }
        }

        let template = Template::parse(&spec.template).map_err(|source| TableError::Template {
            category: name.clone(),
            source,
        })?;
        if !template.uses(Placeholder::Name) {
            return Err(TableError::MissingName { category: name });
        }
        if template.uses(Placeholder::Phrase) && !has_phrases {
            return Err(TableError::EmptyPhrasePool { category: name });
        }

        Ok(Self {
            name,
            tone: spec.tone,
            keywords,
            template,
        })
    }

    fn to_spec(&self) -> CategorySpec {
        CategorySpec {
            name: self.name.clone(),
            tone: self.tone,
            keywords: self.keywords.clone(),
            template: self.template.source().to_string(),
        }
    }
}

/// Ordered, validated set of categories plus the shared phrase pool.
///
/// Never empty, and the default category is always present.
#[derive(Clone, Debug)]
pub struct CategoryTable {
    categories: Vec<Category>,
    default_index: usize,
    phrases: Vec<String>,
}

impl CategoryTable {
    pub fn from_spec(spec: TableSpec) -> Result<Self, TableError> {
        if spec.categories.is_empty() {
            return Err(TableError::Empty);
        }

        let phrases: Vec<String> = spec
            .phrases
            .into_iter()
            .map(|p| p.trim().to_string())
            .filter(|p| !p.is_empty())
            .collect();

        let mut categories: Vec<Category> = Vec::with_capacity(spec.categories.len());
        for cat_spec in spec.categories {
            let category = Category::from_spec(cat_spec, !phrases.is_empty())?;
            if categories.iter().any(|c| c.name == category.name) {
                return Err(TableError::DuplicateCategory(category.name));
            }
            categories.push(category);
        }

        let default = spec.default.trim();
        let default_index = categories
            .iter()
            .position(|c| c.name == default)
            .ok_or_else(|| TableError::UnknownDefault(default.to_string()))?;

        Ok(Self {
            categories,
            default_index,
            phrases,
        })
    }

    pub fn to_spec(&self) -> TableSpec {
        TableSpec {
            default: self.default_category().name.clone(),
            phrases: self.phrases.clone(),
            categories: self.categories.iter().map(Category::to_spec).collect(),
        }
    }

    pub fn categories(&self) -> &[Category] {
        &self.categories
    }

    pub fn get(&self, name: &str) -> Option<&Category> {
        self.categories.iter().find(|c| c.name == name)
    }

    pub fn index_of(&self, name: &str) -> Option<usize> {
        self.categories.iter().position(|c| c.name == name)
    }

    pub fn default_index(&self) -> usize {
        self.default_index
    }

    pub fn default_category(&self) -> &Category {
        &self.categories[self.default_index]
    }

    pub fn phrases(&self) -> &[String] {
        &self.phrases
    }

    pub fn len(&self) -> usize {
        self.categories.len()
    }

    pub fn is_empty(&self) -> bool {
        self.categories.is_empty()
    }
}
