//! Flat markup scanning and simple selectors.
//!
//! Rendered markup is only ever inspected, never restructured, so a flat
//! list of opening tags, each pointing at its enclosing element, is enough
//! to resolve selectors and ancestor lookups against the live subtree of a
//! mount.

use indexmap::IndexMap;
use once_cell::sync::Lazy;
use regex::Regex;
use std::fmt::{Display, Formatter};

static TAG_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"<(/?)([A-Za-z][A-Za-z0-9-]*)((?:\s+[^\s=>/]+(?:\s*=\s*(?:"[^"]*"|'[^']*'|[^\s>]+))?)*)\s*(/?)>"#)
        .expect("valid tag regex")
});

// Elements that never have content or a closing tag.
const VOID_TAGS: &[&str] = &[
    "area", "base", "br", "col", "embed", "hr", "img", "input", "link", "meta", "source", "track",
    "wbr",
];
static ATTRIBUTE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"([^\s=/>]+)(?:\s*=\s*(?:"([^"]*)"|'([^']*)'|([^\s>]+)))?"#)
        .expect("valid attribute regex")
});

/// One opening tag found in scanned markup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Element {
    /// Lowercased tag name.
    pub tag: String,
    /// Attributes in source order; valueless attributes map to "".
    pub attributes: IndexMap<String, String>,
    /// Byte offset of the tag start within the scanned markup.
    pub offset: usize,
    /// Index of the enclosing element; `None` at the top level.
    pub parent: Option<usize>,
}

impl Element {
    pub fn id(&self) -> Option<&str> {
        self.attributes.get("id").map(String::as_str)
    }

    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes.get(name).map(String::as_str)
    }

    pub fn classes(&self) -> impl Iterator<Item = &str> {
        self.attributes
            .get("class")
            .map(String::as_str)
            .unwrap_or_default()
            .split_whitespace()
    }

    pub fn has_class(&self, class: &str) -> bool {
        self.classes().any(|candidate| candidate == class)
    }
}

/// Scans `markup` into its opening tags, in document order.
///
/// Closing tags only restore the enclosing element; a closing tag without
/// a matching open element is ignored.
pub fn scan_elements(markup: &str) -> Vec<Element> {
    let mut elements: Vec<Element> = Vec::new();
    let mut open: Vec<usize> = Vec::new();

    for captures in TAG_RE.captures_iter(markup) {
        let (Some(whole), Some(name)) = (captures.get(0), captures.get(2)) else {
            continue;
        };
        let tag = name.as_str().to_ascii_lowercase();

        let is_closing = captures.get(1).is_some_and(|slash| !slash.as_str().is_empty());
        if is_closing {
            if let Some(depth) = open.iter().rposition(|&index| elements[index].tag == tag) {
                open.truncate(depth);
            }
            continue;
        }

        let self_closing = captures.get(4).is_some_and(|slash| !slash.as_str().is_empty());
        let attributes = captures
            .get(3)
            .map(|raw| parse_attributes(raw.as_str()))
            .unwrap_or_default();
        let index = elements.len();
        elements.push(Element {
            parent: open.last().copied(),
            tag,
            attributes,
            offset: whole.start(),
        });
        if !self_closing && !VOID_TAGS.contains(&elements[index].tag.as_str()) {
            open.push(index);
        }
    }

    elements
}

/// Index of `start` or its nearest ancestor matched by `selector`.
pub fn closest(elements: &[Element], start: usize, selector: &Selector) -> Option<usize> {
    let mut current = Some(start);
    while let Some(index) = current {
        let element = elements.get(index)?;
        if selector.matches(element) {
            return Some(index);
        }
        current = element.parent;
    }
    None
}

/// Parses the attribute section of one opening tag.
pub fn parse_attributes(raw: &str) -> IndexMap<String, String> {
    ATTRIBUTE_RE
        .captures_iter(raw)
        .filter_map(|captures| {
            let name = captures.get(1)?.as_str().to_ascii_lowercase();
            let value = captures
                .get(2)
                .or_else(|| captures.get(3))
                .or_else(|| captures.get(4))
                .map(|value| value.as_str().to_string())
                .unwrap_or_default();
            Some((name, value))
        })
        .collect()
}

/// Simple selector: optional tag, optional id, any number of classes.
///
/// Supported forms: `label`, `.edit`, `#to-do`, `input.edit.active`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Selector {
    tag: Option<String>,
    id: Option<String>,
    classes: Vec<String>,
}

impl Selector {
    /// Parses a selector, returning `None` when it is empty or malformed.
    pub fn parse(input: &str) -> Option<Self> {
        let input = input.trim();
        if input.is_empty() || input.contains('\0') {
            return None;
        }

        let mut selector = Self {
            tag: None,
            id: None,
            classes: Vec::new(),
        };
        let mut marker: Option<char> = None;
        let mut current = String::new();

        for ch in input.chars().chain(std::iter::once('\0')) {
            if ch == '.' || ch == '#' || ch == '\0' {
                match marker {
                    None if current.is_empty() => {}
                    None => selector.tag = Some(current.to_ascii_lowercase()),
                    Some(_) if current.is_empty() => return None,
                    Some('#') => {
                        if selector.id.replace(current.clone()).is_some() {
                            return None;
                        }
                    }
                    Some(_) => selector.classes.push(current.clone()),
                }
                current.clear();
                marker = Some(ch);
                continue;
            }
            if !(ch.is_ascii_alphanumeric() || ch == '-' || ch == '_') {
                return None;
            }
            current.push(ch);
        }

        Some(selector)
    }

    pub fn matches(&self, element: &Element) -> bool {
        if let Some(tag) = &self.tag {
            if element.tag != *tag {
                return false;
            }
        }
        if let Some(id) = &self.id {
            if element.id() != Some(id.as_str()) {
                return false;
            }
        }
        self.classes.iter().all(|class| element.has_class(class))
    }

    /// First element in `elements` matched by this selector.
    pub fn find_first<'a>(&self, elements: &'a [Element]) -> Option<&'a Element> {
        elements.iter().find(|element| self.matches(element))
    }

    /// Index of the first element matched by this selector.
    pub fn position(&self, elements: &[Element]) -> Option<usize> {
        elements.iter().position(|element| self.matches(element))
    }
}

impl Display for Selector {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        if let Some(tag) = &self.tag {
            f.write_str(tag)?;
        }
        if let Some(id) = &self.id {
            write!(f, "#{id}")?;
        }
        for class in &self.classes {
            write!(f, ".{class}")?;
        }
        Ok(())
    }
}
