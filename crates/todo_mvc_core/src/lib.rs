//! Model/View data-binding core for to-do items.
//!
//! Attribute stores are seeded from per-type defaults and rendered into
//! page containers by views that compile their template once and route
//! UI interactions through a declarative event table.

pub mod logging;
pub mod model;
pub mod todo;
pub mod view;

pub use logging::{default_log_level, init_logging, logging_status, LoggingConfig, LoggingError};
pub use model::defaults::{AttributeDefaults, EntityDefaults};
pub use model::store::{AttributeStore, SharedStore, StoreError, StoreId};
pub use model::value::AttributeValue;
pub use model::{attributes, Attributes};
pub use todo::{new_todo, todo_view, TodoDefaults, TodoHandlers, TodoView, TODO_DEFAULTS};
pub use view::document::{ContainerHandle, Document, SharedDocument};
pub use view::events::{EventKind, EventMapError, Interaction};
pub use view::render_view::{
    HandlerContext, HandlerInvocation, RenderView, ViewError, ViewHandlers, ViewResult,
};
pub use view::template::{Template, TemplateError};

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
