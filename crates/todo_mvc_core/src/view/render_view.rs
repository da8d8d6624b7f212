//! Store-bound view rendering into a mount container.
//!
//! # Responsibility
//! - Compile the item template once and render the bound store with it.
//! - Replace mount content on every render and cache the editable element.
//! - Route interactions on the rendered subtree through the event table.
//!
//! # Invariants
//! - The view shares its store; it never owns or drops store content.
//! - The view is the only writer of its mount's content.
//! - `render()` always re-evaluates the template from current store
//!   content; only the compiled template is cached.
//! - Nothing is dispatched before the first render.

use crate::model::store::{AttributeStore, SharedStore};
use crate::view::document::{ContainerHandle, SharedDocument};
use crate::view::events::{Delegate, EventMap, EventMapError, Interaction};
use crate::view::markup::{scan_elements, Element, Selector};
use crate::view::template::{Template, TemplateError};
use log::{debug, info, warn};
use std::error::Error;
use std::fmt::{Display, Formatter};

pub type ViewResult<T> = Result<T, ViewError>;

/// View construction, render and dispatch errors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ViewError {
    /// Mount container cannot be located in the document.
    MountNotFound(String),
    /// No template source registered under this identifier.
    TemplateNotFound(String),
    Template(TemplateError),
    EventMap(EventMapError),
    /// Bound store is mutably borrowed elsewhere during render/dispatch.
    StoreBusy,
    /// Document is mutably borrowed elsewhere during render/dispatch.
    DocumentBusy,
}

impl Display for ViewError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::MountNotFound(id) => write!(f, "mount container not found: #{id}"),
            Self::TemplateNotFound(id) => write!(f, "template source not found: #{id}"),
            Self::Template(err) => write!(f, "{err}"),
            Self::EventMap(err) => write!(f, "{err}"),
            Self::StoreBusy => write!(f, "attribute store is already mutably borrowed"),
            Self::DocumentBusy => write!(f, "document is already mutably borrowed"),
        }
    }
}

impl Error for ViewError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Template(err) => Some(err),
            Self::EventMap(err) => Some(err),
            _ => None,
        }
    }
}

impl From<TemplateError> for ViewError {
    fn from(value: TemplateError) -> Self {
        Self::Template(value)
    }
}

impl From<EventMapError> for ViewError {
    fn from(value: EventMapError) -> Self {
        Self::EventMap(value)
    }
}

/// Read-only context passed to one handler invocation.
pub struct HandlerContext<'a> {
    pub store: &'a AttributeStore,
    pub interaction: &'a Interaction,
    /// Element the interaction happened on; `None` for the mount itself.
    pub target: Option<&'a Element>,
    /// Element the binding's selector matched: the target or the ancestor
    /// it bubbled to. `None` for bindings on the mount.
    pub current: Option<&'a Element>,
    /// Editable element cached by the last render.
    pub editable: Option<&'a Element>,
}

/// Handler reference stored in the event table.
///
/// Returns a short human-readable diagnostic line.
pub type Handler<H> = fn(&mut H, &HandlerContext<'_>) -> String;

/// Handler set and declarative configuration of one view type.
pub trait ViewHandlers: Sized {
    /// View name used in diagnostics.
    const NAME: &'static str;
    /// `(descriptor, handler name)` rows, e.g. `("dblclick label", "edit")`.
    const EVENTS: &'static [(&'static str, &'static str)];
    /// Selector of the editable element cached after each render.
    const EDITABLE: Option<&'static str> = None;

    /// Resolves a handler name from `EVENTS`.
    fn handler(name: &str) -> Option<Handler<Self>>;
}

/// Record of one handler run by [`RenderView::dispatch`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HandlerInvocation {
    pub descriptor: String,
    pub handler: String,
    pub message: String,
}

#[derive(Debug, Clone)]
struct RenderedTree {
    elements: Vec<Element>,
    editable: Option<usize>,
}

/// View bound to one shared store and one mount container.
pub struct RenderView<H: ViewHandlers> {
    store: SharedStore,
    document: SharedDocument,
    mount: ContainerHandle,
    template: Template,
    events: EventMap<Handler<H>>,
    editable_selector: Option<Selector>,
    handlers: H,
    rendered: Option<RenderedTree>,
}

impl<H: ViewHandlers> RenderView<H> {
    /// Creates a view, compiling `template_source` and the event table once.
    ///
    /// # Errors
    /// - `MountNotFound` when `mount_id` is not a container of `document`.
    /// - `Template` when the template does not compile.
    /// - `EventMap` when `H::EVENTS` is malformed.
    pub fn create(
        store: SharedStore,
        document: SharedDocument,
        mount_id: &str,
        template_source: &str,
        handlers: H,
    ) -> ViewResult<Self> {
        let mount = document
            .try_borrow()
            .map_err(|_| ViewError::DocumentBusy)?
            .locate(mount_id)
            .ok_or_else(|| ViewError::MountNotFound(mount_id.trim_start_matches('#').to_string()))?;
        let template = Template::compile(template_source)?;
        let events = EventMap::parse(H::EVENTS, H::handler)?;
        let editable_selector = match H::EDITABLE {
            Some(raw) => Some(Selector::parse(raw).ok_or_else(|| {
                ViewError::EventMap(EventMapError::InvalidSelector {
                    descriptor: format!("{} editable", H::NAME),
                    selector: raw.to_string(),
                })
            })?),
            None => None,
        };

        info!(
            "event=view_created module=view view={} mount={} bindings={}",
            H::NAME,
            mount,
            events.len()
        );

        Ok(Self {
            store,
            document,
            mount,
            template,
            events,
            editable_selector,
            handlers,
            rendered: None,
        })
    }

    /// Creates a view whose template source is registered in `document`.
    ///
    /// # Errors
    /// - `TemplateNotFound` when `template_id` is not registered.
    /// - Everything [`RenderView::create`] reports.
    pub fn from_template_id(
        store: SharedStore,
        document: SharedDocument,
        mount_id: &str,
        template_id: &str,
        handlers: H,
    ) -> ViewResult<Self> {
        let source = document
            .try_borrow()
            .map_err(|_| ViewError::DocumentBusy)?
            .template_source(template_id)
            .map(str::to_string)
            .ok_or_else(|| {
                ViewError::TemplateNotFound(template_id.trim_start_matches('#').to_string())
            })?;
        Self::create(store, document, mount_id, &source, handlers)
    }

    /// Renders current store content into the mount.
    ///
    /// Replaces the mount's content, caches the editable element of the new
    /// subtree and returns the mount handle.
    ///
    /// # Errors
    /// - `MountNotFound` when the mount was removed from the document.
    pub fn render(&mut self) -> ViewResult<ContainerHandle> {
        let rendered = {
            let store = self.store.try_borrow().map_err(|_| ViewError::StoreBusy)?;
            self.template.render(store.get_all())
        };
        if !rendered.missing_keys.is_empty() {
            debug!(
                "event=template_keys_missing module=view view={} keys={}",
                H::NAME,
                rendered.missing_keys.join(",")
            );
        }

        let elements = scan_elements(&rendered.markup);
        let editable = self
            .editable_selector
            .as_ref()
            .and_then(|selector| selector.position(&elements));
        let byte_len = rendered.markup.len();

        let replaced = self
            .document
            .try_borrow_mut()
            .map_err(|_| ViewError::DocumentBusy)?
            .replace_content(&self.mount, rendered.markup);
        if !replaced {
            warn!(
                "event=render_failed module=view view={} mount={} reason=mount_not_found",
                H::NAME,
                self.mount
            );
            self.rendered = None;
            return Err(ViewError::MountNotFound(self.mount.id().to_string()));
        }

        info!(
            "event=view_rendered module=view view={} mount={} bytes={} elements={} editable={}",
            H::NAME,
            self.mount,
            byte_len,
            elements.len(),
            editable.is_some()
        );
        self.rendered = Some(RenderedTree { elements, editable });
        Ok(self.mount.clone())
    }

    /// Delivers one interaction to the mount.
    ///
    /// Runs every binding that accepts the interaction, in table order.
    /// Selector bindings also catch interactions on elements nested inside
    /// a matching element.
    /// Returns an empty list before the first render or when the target is
    /// not part of the rendered subtree.
    ///
    /// # Errors
    /// - `MountNotFound` when the mount was removed from the document.
    pub fn dispatch(&mut self, interaction: &Interaction) -> ViewResult<Vec<HandlerInvocation>> {
        if !self
            .document
            .try_borrow()
            .map_err(|_| ViewError::DocumentBusy)?
            .contains(&self.mount)
        {
            return Err(ViewError::MountNotFound(self.mount.id().to_string()));
        }

        let Some(tree) = self.rendered.as_ref() else {
            debug!(
                "event=dispatch_skipped module=view view={} interaction=\"{}\" reason=not_rendered",
                H::NAME,
                interaction
            );
            return Ok(Vec::new());
        };

        let target = match &interaction.target {
            Some(selector) => match selector.position(&tree.elements) {
                found @ Some(_) => found,
                None => {
                    debug!(
                        "event=dispatch_skipped module=view view={} interaction=\"{}\" reason=target_not_found",
                        H::NAME,
                        interaction
                    );
                    return Ok(Vec::new());
                }
            },
            None => None,
        };

        let store = self.store.try_borrow().map_err(|_| ViewError::StoreBusy)?;
        let editable = tree.editable.map(|index| &tree.elements[index]);

        let mut invocations = Vec::new();
        for (binding, delegate) in self.events.matching(interaction.kind, &tree.elements, target) {
            let context = HandlerContext {
                store: &store,
                interaction,
                target: target.map(|index| &tree.elements[index]),
                current: match delegate {
                    Delegate::Mount => None,
                    Delegate::Element(index) => Some(&tree.elements[index]),
                },
                editable,
            };
            let message = (binding.handler)(&mut self.handlers, &context);
            info!(
                "event=handler_invoked module=view view={} handler={} descriptor=\"{}\" message=\"{}\"",
                H::NAME,
                binding.handler_name,
                binding.descriptor,
                message
            );
            invocations.push(HandlerInvocation {
                descriptor: binding.descriptor.clone(),
                handler: binding.handler_name.clone(),
                message,
            });
        }

        Ok(invocations)
    }

    pub fn mount(&self) -> &ContainerHandle {
        &self.mount
    }

    pub fn store(&self) -> &SharedStore {
        &self.store
    }

    pub fn handlers(&self) -> &H {
        &self.handlers
    }

    pub fn events(&self) -> &EventMap<Handler<H>> {
        &self.events
    }

    pub fn is_rendered(&self) -> bool {
        self.rendered.is_some()
    }

    /// Editable element found by the last render, if any.
    pub fn editable(&self) -> Option<&Element> {
        let tree = self.rendered.as_ref()?;
        tree.editable.map(|index| &tree.elements[index])
    }
}
