//! To-do item entity: defaults, item template and view handlers.
//!
//! # Responsibility
//! - Define the to-do defaults once (`title = ""`, `completed = false`).
//! - Wire the item view: template, mount, editable field and event table.
//!
//! # Invariants
//! - Handlers only emit diagnostics; they never mutate the store.
//! - The key-press handler reports every key; it does not filter on Enter.

use crate::model::defaults::{AttributeDefaults, EntityDefaults};
use crate::model::store::{AttributeStore, SharedStore};
use crate::model::value::AttributeValue;
use crate::model::Attributes;
use crate::view::document::{Document, SharedDocument};
use crate::view::render_view::{Handler, HandlerContext, RenderView, ViewHandlers, ViewResult};
use once_cell::sync::Lazy;

/// Container the item view renders into.
pub const TODO_MOUNT_ID: &str = "to-do";
/// Identifier of the embedded item template.
pub const ITEM_TEMPLATE_ID: &str = "item-template";

/// Item template rendered for one to-do.
pub const ITEM_TEMPLATE: &str = r#"<div class="view">
  <input class="toggle" type="checkbox" <%= completed ? 'checked' : '' %>>
  <label><%- title %></label>
</div>
<input class="edit" value="<%- title %>">"#;

/// Defaults shared by every to-do store.
pub static TODO_DEFAULTS: Lazy<AttributeDefaults> =
    Lazy::new(|| TodoDefaults::default().to_defaults());

/// Typed base defaults of a to-do item.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TodoDefaults {
    pub title: String,
    pub completed: bool,
}

impl EntityDefaults for TodoDefaults {
    const ENTITY: &'static str = "todo";

    fn attributes(&self) -> Attributes {
        crate::model::attributes([
            ("title", AttributeValue::from(self.title.as_str())),
            ("completed", AttributeValue::from(self.completed)),
        ])
    }
}

/// Creates a to-do store from the shared defaults plus `overrides`.
pub fn new_todo(overrides: Attributes) -> AttributeStore {
    AttributeStore::create(&TODO_DEFAULTS, overrides)
}

/// Page holding the `#to-do` mount and the embedded item template.
pub fn demo_page() -> String {
    format!(
        r#"<section id="todoapp">
  <ul id="{TODO_MOUNT_ID}"></ul>
</section>
<script type="text/template" id="{ITEM_TEMPLATE_ID}">
{ITEM_TEMPLATE}
</script>"#
    )
}

/// Document built from [`demo_page`].
pub fn demo_document() -> SharedDocument {
    Document::from_page(&demo_page()).into_shared()
}

/// Diagnostic handlers of the to-do item view.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TodoHandlers;

pub type TodoView = RenderView<TodoHandlers>;

impl TodoHandlers {
    fn edit(&mut self, context: &HandlerContext<'_>) -> String {
        let title = context
            .store
            .get("title")
            .map(ToString::to_string)
            .unwrap_or_default();
        format!("to-do label double-clicked (title=\"{title}\")")
    }

    fn close(&mut self, _context: &HandlerContext<'_>) -> String {
        "to-do edit field lost focus".to_string()
    }

    // Reports every key press; acting only on Enter is left to a real
    // editing flow.
    fn update_on_enter(&mut self, context: &HandlerContext<'_>) -> String {
        let key = context.interaction.key.as_deref().unwrap_or("unknown");
        format!(
            "key press in edit field (key={key} enter={})",
            context.interaction.is_enter()
        )
    }
}

impl ViewHandlers for TodoHandlers {
    const NAME: &'static str = "todo_item";
    const EVENTS: &'static [(&'static str, &'static str)] = &[
        ("dblclick label", "edit"),
        ("keypress .edit", "updateOnEnter"),
        ("blur .edit", "close"),
    ];
    const EDITABLE: Option<&'static str> = Some(".edit");

    fn handler(name: &str) -> Option<Handler<Self>> {
        match name {
            "edit" => Some(Self::edit),
            "close" => Some(Self::close),
            "updateOnEnter" => Some(Self::update_on_enter),
            _ => None,
        }
    }
}

/// Creates the to-do item view over `store`, mounted at `#to-do`.
///
/// # Errors
/// - `MountNotFound` / `TemplateNotFound` when the page lacks either.
pub fn todo_view(store: SharedStore, document: SharedDocument) -> ViewResult<TodoView> {
    RenderView::from_template_id(store, document, TODO_MOUNT_ID, ITEM_TEMPLATE_ID, TodoHandlers)
}
