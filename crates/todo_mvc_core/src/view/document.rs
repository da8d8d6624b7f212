//! In-memory page: mount containers and embedded template sources.
//!
//! # Responsibility
//! - Own addressable containers that views render into.
//! - Own template sources addressed by identifier.
//!
//! # Invariants
//! - Containers are created by the page owner, never by a view.
//! - Container content is replaced wholesale, never patched.

use crate::view::markup::{parse_attributes, scan_elements};
use indexmap::IndexMap;
use log::debug;
use once_cell::sync::Lazy;
use regex::Regex;
use std::cell::RefCell;
use std::fmt::{Display, Formatter};
use std::rc::Rc;

static SCRIPT_BLOCK_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?is)<script\b([^>]*)>(.*?)</script\s*>").expect("valid script block regex")
});

const TEMPLATE_SCRIPT_TYPE: &str = "text/template";

/// Page shared between its owner and the views rendering into it.
pub type SharedDocument = Rc<RefCell<Document>>;

/// Opaque reference to one mount container.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ContainerHandle {
    id: String,
}

impl ContainerHandle {
    pub fn id(&self) -> &str {
        &self.id
    }
}

impl Display for ContainerHandle {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.id)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct Container {
    tag: String,
    content: String,
}

/// Addressable containers plus template sources.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Document {
    containers: IndexMap<String, Container>,
    templates: IndexMap<String, String>,
}

impl Document {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a document from page markup.
    ///
    /// `<script type="text/template" id="...">` blocks become template
    /// sources; every other element carrying an `id` becomes an empty
    /// container.
    pub fn from_page(markup: &str) -> Self {
        let mut document = Self::new();

        for captures in SCRIPT_BLOCK_RE.captures_iter(markup) {
            let attributes = captures
                .get(1)
                .map(|raw| parse_attributes(raw.as_str()))
                .unwrap_or_default();
            let is_template = attributes
                .get("type")
                .is_some_and(|kind| kind.eq_ignore_ascii_case(TEMPLATE_SCRIPT_TYPE));
            if let (true, Some(id)) = (is_template, attributes.get("id")) {
                let source = captures.get(2).map(|m| m.as_str()).unwrap_or_default();
                document.add_template(id.as_str(), source.trim());
            }
        }

        let without_scripts = SCRIPT_BLOCK_RE.replace_all(markup, "");
        for element in scan_elements(&without_scripts) {
            if let Some(id) = element.id() {
                document.add_container(id, element.tag.as_str());
            }
        }

        debug!(
            "event=page_loaded module=view containers={} templates={}",
            document.containers.len(),
            document.templates.len()
        );
        document
    }

    pub fn into_shared(self) -> SharedDocument {
        Rc::new(RefCell::new(self))
    }

    /// Adds (or resets) an empty container and returns its handle.
    ///
    /// `id` may be given with or without a leading `#`.
    pub fn add_container(&mut self, id: &str, tag: &str) -> ContainerHandle {
        let id = normalize_id(id).to_string();
        self.containers.insert(
            id.clone(),
            Container {
                tag: tag.to_ascii_lowercase(),
                content: String::new(),
            },
        );
        ContainerHandle { id }
    }

    /// Removes a container; returns whether it existed.
    pub fn remove_container(&mut self, id: &str) -> bool {
        self.containers.shift_remove(normalize_id(id)).is_some()
    }

    /// Locates a container by identifier.
    pub fn locate(&self, id: &str) -> Option<ContainerHandle> {
        let id = normalize_id(id);
        self.containers.contains_key(id).then(|| ContainerHandle { id: id.to_string() })
    }

    pub fn contains(&self, handle: &ContainerHandle) -> bool {
        self.containers.contains_key(handle.id.as_str())
    }

    /// Current markup of a container, or `None` when it no longer exists.
    pub fn content(&self, handle: &ContainerHandle) -> Option<&str> {
        self.containers
            .get(handle.id.as_str())
            .map(|container| container.content.as_str())
    }

    pub fn container_tag(&self, handle: &ContainerHandle) -> Option<&str> {
        self.containers
            .get(handle.id.as_str())
            .map(|container| container.tag.as_str())
    }

    /// Registers template source under `id` (with or without `#`).
    pub fn add_template(&mut self, id: &str, source: impl Into<String>) {
        self.templates
            .insert(normalize_id(id).to_string(), source.into());
    }

    pub fn template_source(&self, id: &str) -> Option<&str> {
        self.templates.get(normalize_id(id)).map(String::as_str)
    }

    /// Replaces a container's content; returns `false` when it is gone.
    pub(crate) fn replace_content(&mut self, handle: &ContainerHandle, markup: String) -> bool {
        match self.containers.get_mut(handle.id.as_str()) {
            Some(container) => {
                container.content = markup;
                true
            }
            None => false,
        }
    }
}

fn normalize_id(id: &str) -> &str {
    let trimmed = id.trim();
    trimmed.strip_prefix('#').unwrap_or(trimmed)
}
