//! Compiled item templates.
//!
//! # Responsibility
//! - Compile underscore-style template text once into reusable segments.
//! - Evaluate compiled segments against an attribute mapping.
//!
//! # Invariants
//! - Compilation is the only fallible step; evaluation never fails.
//! - A key missing from the mapping renders as empty text and is reported
//!   back to the caller.
//!
//! Supported tags:
//! - `<%= expr %>` inserts the value as-is.
//! - `<%- expr %>` inserts the HTML-escaped value.
//!
//! `expr` is an attribute name or `name ? 'a' : 'b'`, which picks one of
//! the two literals by the attribute's truthiness. Evaluate blocks
//! (`<% ... %>`) are rejected.

use crate::model::Attributes;
use once_cell::sync::Lazy;
use regex::Regex;
use std::error::Error;
use std::fmt::{Display, Formatter};

const OPEN_TAG: &str = "<%";
const CLOSE_TAG: &str = "%>";

static ATTRIBUTE_NAME_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Za-z_$][A-Za-z0-9_$]*$").expect("valid attribute name regex"));
static CONDITIONAL_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r#"^([A-Za-z_$][A-Za-z0-9_$]*)\s*\?\s*(?:'([^']*)'|"([^"]*)")\s*:\s*(?:'([^']*)'|"([^"]*)")$"#,
    )
    .expect("valid conditional regex")
});

pub type TemplateResult<T> = Result<T, TemplateError>;

/// Template compilation errors. Offsets are byte offsets into the source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TemplateError {
    /// `<%` without a matching `%>`.
    UnterminatedTag { offset: usize },
    /// `<% ... %>` evaluate blocks have no equivalent here.
    UnsupportedBlock { offset: usize, code: String },
    /// Interpolation body is neither a name nor a conditional.
    InvalidExpression { offset: usize, expression: String },
}

impl Display for TemplateError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::UnterminatedTag { offset } => {
                write!(f, "unterminated template tag at byte {offset}")
            }
            Self::UnsupportedBlock { offset, code } => {
                write!(f, "unsupported evaluate block `{code}` at byte {offset}")
            }
            Self::InvalidExpression { offset, expression } => {
                write!(f, "invalid template expression `{expression}` at byte {offset}")
            }
        }
    }
}

impl Error for TemplateError {}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Expression {
    Attribute(String),
    Conditional {
        attribute: String,
        when_true: String,
        when_false: String,
    },
}

impl Expression {
    fn attribute(&self) -> &str {
        match self {
            Self::Attribute(name) => name,
            Self::Conditional { attribute, .. } => attribute,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
    Literal(String),
    Insert { expression: Expression, escape: bool },
}

/// Output of one template evaluation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rendered {
    pub markup: String,
    /// Referenced keys absent from the mapping, in first-use order.
    pub missing_keys: Vec<String>,
}

/// A template compiled once and evaluated many times.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Template {
    segments: Vec<Segment>,
}

impl Template {
    /// Compiles template source text.
    ///
    /// # Errors
    /// - `UnterminatedTag` when a `<%` is never closed.
    /// - `UnsupportedBlock` for `<% ... %>` evaluate blocks.
    /// - `InvalidExpression` when an interpolation body cannot be parsed.
    pub fn compile(source: &str) -> TemplateResult<Self> {
        let mut segments = Vec::new();
        let mut cursor = 0usize;

        while let Some(found) = source[cursor..].find(OPEN_TAG) {
            let tag_start = cursor + found;
            if tag_start > cursor {
                segments.push(Segment::Literal(source[cursor..tag_start].to_string()));
            }

            let body_start = tag_start + OPEN_TAG.len();
            let Some(body_len) = source[body_start..].find(CLOSE_TAG) else {
                return Err(TemplateError::UnterminatedTag { offset: tag_start });
            };
            let body = &source[body_start..body_start + body_len];
            cursor = body_start + body_len + CLOSE_TAG.len();

            let (escape, expression_text) = if let Some(rest) = body.strip_prefix('=') {
                (false, rest)
            } else if let Some(rest) = body.strip_prefix('-') {
                (true, rest)
            } else {
                return Err(TemplateError::UnsupportedBlock {
                    offset: tag_start,
                    code: body.trim().to_string(),
                });
            };

            let expression = parse_expression(expression_text.trim()).ok_or_else(|| {
                TemplateError::InvalidExpression {
                    offset: tag_start,
                    expression: expression_text.trim().to_string(),
                }
            })?;
            segments.push(Segment::Insert { expression, escape });
        }

        if cursor < source.len() {
            segments.push(Segment::Literal(source[cursor..].to_string()));
        }

        Ok(Self { segments })
    }

    /// Evaluates the template against `attributes`.
    pub fn render(&self, attributes: &Attributes) -> Rendered {
        let mut markup = String::new();
        let mut missing_keys: Vec<String> = Vec::new();

        for segment in &self.segments {
            match segment {
                Segment::Literal(text) => markup.push_str(text),
                Segment::Insert { expression, escape } => {
                    let value = attributes.get(expression.attribute());
                    if value.is_none() && !missing_keys.iter().any(|k| k == expression.attribute())
                    {
                        missing_keys.push(expression.attribute().to_string());
                    }

                    let text = match expression {
                        Expression::Attribute(_) => {
                            value.map(ToString::to_string).unwrap_or_default()
                        }
                        Expression::Conditional {
                            when_true,
                            when_false,
                            ..
                        } => {
                            if value.is_some_and(|value| value.is_truthy()) {
                                when_true.clone()
                            } else {
                                when_false.clone()
                            }
                        }
                    };

                    if *escape {
                        markup.push_str(&escape_html(&text));
                    } else {
                        markup.push_str(&text);
                    }
                }
            }
        }

        Rendered {
            markup,
            missing_keys,
        }
    }

    /// Attribute names referenced by the template, in first-use order.
    pub fn referenced_keys(&self) -> Vec<&str> {
        let mut keys: Vec<&str> = Vec::new();
        for segment in &self.segments {
            if let Segment::Insert { expression, .. } = segment {
                let key = expression.attribute();
                if !keys.contains(&key) {
                    keys.push(key);
                }
            }
        }
        keys
    }
}

fn parse_expression(text: &str) -> Option<Expression> {
    if ATTRIBUTE_NAME_RE.is_match(text) {
        return Some(Expression::Attribute(text.to_string()));
    }

    let captures = CONDITIONAL_RE.captures(text)?;
    let attribute = captures.get(1)?.as_str().to_string();
    let when_true = captures.get(2).or_else(|| captures.get(3))?.as_str();
    let when_false = captures.get(4).or_else(|| captures.get(5))?.as_str();
    Some(Expression::Conditional {
        attribute,
        when_true: when_true.to_string(),
        when_false: when_false.to_string(),
    })
}

/// Escapes text for safe inclusion in HTML content and attribute values.
pub fn escape_html(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#x27;"),
            '`' => escaped.push_str("&#x60;"),
            other => escaped.push(other),
        }
    }
    escaped
}
