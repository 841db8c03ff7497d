use std::fmt;
use std::sync::LazyLock;

use regex::Regex;

/// `{{`, `}}`, `{ident}`, or a lone brace (which is always an error).
static TOKEN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\{\{|\}\}|\{([A-Za-z_][A-Za-z0-9_]*)\}|\{|\}").unwrap());

/// A substitution slot in a response template.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Placeholder {
    /// `{name}`: the subject being addressed.
    Name,
    /// `{phrase}`: one entry drawn from the phrase pool.
    Phrase,
    /// `{timestamp}`: ISO-8601 UTC time of the response.
    Timestamp,
    /// `{category}`: the chosen category's name.
    Category,
    /// `{text}`: a short excerpt of the input.
    Text,
}

impl Placeholder {
    fn from_ident(ident: &str) -> Option<Self> {
        match ident {
            "name" => Some(Placeholder::Name),
            "phrase" => Some(Placeholder::Phrase),
            "timestamp" => Some(Placeholder::Timestamp),
            "category" => Some(Placeholder::Category),
            "text" => Some(Placeholder::Text),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TemplateError {
    UnknownPlaceholder(String),
    UnbalancedBrace { offset: usize },
}

impl fmt::Display for TemplateError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TemplateError::UnknownPlaceholder(name) => write!(f, "unknown placeholder {{{name}}}"),
            TemplateError::UnbalancedBrace { offset } => {
                write!(f, "unbalanced brace at byte {offset} (use {{{{ or }}}} for literals)")
            }
        }
    }
}

impl std::error::Error for TemplateError {}

#[derive(Clone, Debug, PartialEq, Eq)]
enum Segment {
    Literal(String),
    Slot(Placeholder),
}

/// Values substituted into a template at render time.
#[derive(Clone, Copy, Debug)]
pub struct RenderContext<'a> {
    pub name: &'a str,
    pub phrase: Option<&'a str>,
    pub timestamp: &'a str,
    pub category: &'a str,
    pub text: &'a str,
}

/// A parsed response template.
///
/// Parsing happens once, when a category table is built. Rendering a parsed
/// template cannot fail.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Template {
    source: String,
    segments: Vec<Segment>,
}

impl Template {
    pub fn parse(source: &str) -> Result<Self, TemplateError> {
        let mut segments = Vec::new();
        let mut literal = String::new();
        let mut last = 0;

        for caps in TOKEN.captures_iter(source) {
            let Some(m) = caps.get(0) else { continue };
            literal.push_str(&source[last..m.start()]);
            last = m.end();

            match m.as_str() {
                "{{" => literal.push('{'),
                "}}" => literal.push('}'),
                "{" | "}" => return Err(TemplateError::UnbalancedBrace { offset: m.start() }),
                _ => {
                    let ident = &caps[1];
                    let slot = Placeholder::from_ident(ident)
                        .ok_or_else(|| TemplateError::UnknownPlaceholder(ident.to_string()))?;
                    if !literal.is_empty() {
                        segments.push(Segment::Literal(std::mem::take(&mut literal)));
                    }
                    segments.push(Segment::Slot(slot));
                }
            }
        }

        literal.push_str(&source[last..]);
        if !literal.is_empty() {
            segments.push(Segment::Literal(literal));
        }

        Ok(Self {
            source: source.to_string(),
            segments,
        })
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    /// Whether the template contains the given slot at least once.
    pub fn uses(&self, placeholder: Placeholder) -> bool {
        self.segments
            .iter()
            .any(|s| matches!(s, Segment::Slot(p) if *p == placeholder))
    }

    pub fn render(&self, ctx: &RenderContext<'_>) -> String {
        let mut out = String::with_capacity(self.source.len() + 32);
        for segment in &self.segments {
            match segment {
                Segment::Literal(s) => out.push_str(s),
                Segment::Slot(Placeholder::Name) => out.push_str(ctx.name),
                Segment::Slot(Placeholder::Phrase) => out.push_str(ctx.phrase.unwrap_or("")),
                Segment::Slot(Placeholder::Timestamp) => out.push_str(ctx.timestamp),
                Segment::Slot(Placeholder::Category) => out.push_str(ctx.category),
                Segment::Slot(Placeholder::Text) => out.push_str(ctx.text),
            }
        }
        out
    }
}

impl fmt::Display for Template {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.source)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ctx() -> RenderContext<'static> {
        RenderContext {
            name: "Ada",
            phrase: Some("breathe"),
            timestamp: "2026-01-01T00:00:00Z",
            category: "surrender_flow",
            text: "let it go",
        }
    }

    #[test]
    fn test_render_all_slots() {
        let t = Template::parse("{name}|{phrase}|{timestamp}|{category}|{text}").unwrap();
        assert_eq!(
            t.render(&ctx()),
            "Ada|breathe|2026-01-01T00:00:00Z|surrender_flow|let it go"
        );
    }

    #[test]
    fn test_literal_only() {
        let t = Template::parse("no slots here").unwrap();
        assert_eq!(t.render(&ctx()), "no slots here");
        assert!(!t.uses(Placeholder::Name));
    }

    #[test]
    fn test_escaped_braces() {
        let t = Template::parse("{{{name}}}").unwrap();
        assert_eq!(t.render(&ctx()), "{Ada}");
    }

    #[test]
    fn test_repeated_slot() {
        let t = Template::parse("{name}, dear {name}").unwrap();
        assert_eq!(t.render(&ctx()), "Ada, dear Ada");
    }

    #[test]
    fn test_unknown_placeholder() {
        let err = Template::parse("hello {nmae}").unwrap_err();
        assert_eq!(err, TemplateError::UnknownPlaceholder("nmae".to_string()));
    }

    #[test]
    fn test_lone_open_brace() {
        let err = Template::parse("hello {name").unwrap_err();
        assert_eq!(err, TemplateError::UnbalancedBrace { offset: 6 });
    }

    #[test]
    fn test_lone_close_brace() {
        assert!(matches!(
            Template::parse("}oops"),
            Err(TemplateError::UnbalancedBrace { offset: 0 })
        ));
    }

    #[test]
    fn test_missing_phrase_renders_empty() {
        let t = Template::parse("[{phrase}]").unwrap();
        let mut c = ctx();
        c.phrase = None;
        assert_eq!(t.render(&c), "[]");
    }

    #[test]
    fn test_uses() {
        let t = Template::parse("{name} {phrase}").unwrap();
        assert!(t.uses(Placeholder::Name));
        assert!(t.uses(Placeholder::Phrase));
        assert!(!t.uses(Placeholder::Timestamp));
    }

    #[test]
    fn test_display_is_source() {
        let src = "hi {name}, {{literal}}";
        assert_eq!(Template::parse(src).unwrap().to_string(), src);
    }
}
