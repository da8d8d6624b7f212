//! Declarative event table and interaction model.
//!
//! # Responsibility
//! - Parse `"<event> <selector>" -> handler` descriptors once.
//! - Describe one UI interaction delivered to a mount.
//!
//! # Invariants
//! - Every binding resolves to a handler reference at parse time.
//! - A binding without a selector listens on the mount root and receives
//!   interactions bubbling from any element below it.
//! - A binding with a selector receives interactions on a matching element
//!   or on anything nested inside one.

use crate::view::markup::{closest, Element, Selector};
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Key name reported for the Enter key.
pub const ENTER_KEY: &str = "Enter";

pub type EventResult<T> = Result<T, EventMapError>;

/// Interaction kinds understood by the event table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    Click,
    DoubleClick,
    Blur,
    KeyPress,
}

impl EventKind {
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "click" => Some(Self::Click),
            "dblclick" => Some(Self::DoubleClick),
            "blur" => Some(Self::Blur),
            "keypress" => Some(Self::KeyPress),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Click => "click",
            Self::DoubleClick => "dblclick",
            Self::Blur => "blur",
            Self::KeyPress => "keypress",
        }
    }
}

impl Display for EventKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Event table errors, reported at view construction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EventMapError {
    EmptyDescriptor,
    UnknownEventKind { descriptor: String, kind: String },
    InvalidSelector { descriptor: String, selector: String },
    UnknownHandler { descriptor: String, handler: String },
}

impl Display for EventMapError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::EmptyDescriptor => write!(f, "event descriptor cannot be empty"),
            Self::UnknownEventKind { descriptor, kind } => {
                write!(f, "unknown event `{kind}` in descriptor `{descriptor}`")
            }
            Self::InvalidSelector {
                descriptor,
                selector,
            } => write!(f, "invalid selector `{selector}` in descriptor `{descriptor}`"),
            Self::UnknownHandler {
                descriptor,
                handler,
            } => write!(f, "unknown handler `{handler}` for descriptor `{descriptor}`"),
        }
    }
}

impl Error for EventMapError {}

/// One interaction delivered to a mount.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Interaction {
    pub kind: EventKind,
    /// Element the interaction happened on; `None` targets the mount itself.
    pub target: Option<Selector>,
    /// Key name for key presses, e.g. `Enter` or `a`.
    pub key: Option<String>,
}

impl Interaction {
    /// Builds an interaction on the first element matching `target`.
    ///
    /// # Errors
    /// - `InvalidSelector` when `target` is not a supported selector.
    pub fn new(kind: EventKind, target: &str) -> EventResult<Self> {
        let selector = Selector::parse(target).ok_or_else(|| EventMapError::InvalidSelector {
            descriptor: format!("{kind} {target}"),
            selector: target.to_string(),
        })?;
        Ok(Self {
            kind,
            target: Some(selector),
            key: None,
        })
    }

    /// Interaction on the mount element itself.
    pub fn on_mount(kind: EventKind) -> Self {
        Self {
            kind,
            target: None,
            key: None,
        }
    }

    pub fn click(target: &str) -> EventResult<Self> {
        Self::new(EventKind::Click, target)
    }

    pub fn double_click(target: &str) -> EventResult<Self> {
        Self::new(EventKind::DoubleClick, target)
    }

    pub fn blur(target: &str) -> EventResult<Self> {
        Self::new(EventKind::Blur, target)
    }

    pub fn key_press(target: &str, key: impl Into<String>) -> EventResult<Self> {
        let mut interaction = Self::new(EventKind::KeyPress, target)?;
        interaction.key = Some(key.into());
        Ok(interaction)
    }

    pub fn is_enter(&self) -> bool {
        self.key.as_deref() == Some(ENTER_KEY)
    }
}

impl Display for Interaction {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.kind)?;
        if let Some(target) = &self.target {
            write!(f, " {target}")?;
        }
        if let Some(key) = &self.key {
            write!(f, " key={key}")?;
        }
        Ok(())
    }
}

/// One parsed event table row.
#[derive(Debug, Clone)]
pub struct EventBinding<F> {
    pub descriptor: String,
    pub kind: EventKind,
    pub selector: Option<Selector>,
    pub handler_name: String,
    pub handler: F,
}

/// Where a delegated binding caught an interaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Delegate {
    /// The mount itself.
    Mount,
    /// Index of the element matched by the binding's selector: the target
    /// or its nearest matching ancestor.
    Element(usize),
}

impl<F> EventBinding<F> {
    /// Resolves where this binding catches `kind` happening on `target`,
    /// an index into `elements`; `None` when it does not receive it.
    pub fn accepts(
        &self,
        kind: EventKind,
        elements: &[Element],
        target: Option<usize>,
    ) -> Option<Delegate> {
        if self.kind != kind {
            return None;
        }
        match (&self.selector, target) {
            (None, _) => Some(Delegate::Mount),
            (Some(selector), Some(index)) => {
                closest(elements, index, selector).map(Delegate::Element)
            }
            (Some(_), None) => None,
        }
    }
}

/// Event table with handlers resolved once.
#[derive(Debug, Clone)]
pub struct EventMap<F> {
    bindings: Vec<EventBinding<F>>,
}

impl<F: Copy> EventMap<F> {
    /// Parses `(descriptor, handler name)` rows, resolving each handler name.
    ///
    /// # Errors
    /// - Any malformed descriptor or unresolvable handler name.
    pub fn parse(
        table: &[(&str, &str)],
        resolve: impl Fn(&str) -> Option<F>,
    ) -> EventResult<Self> {
        let mut bindings = Vec::with_capacity(table.len());

        for &(descriptor, handler_name) in table {
            let descriptor = descriptor.trim();
            let (kind_text, selector_text) = match descriptor.split_once(char::is_whitespace) {
                Some((kind, selector)) => (kind, selector.trim()),
                None => (descriptor, ""),
            };
            if kind_text.is_empty() {
                return Err(EventMapError::EmptyDescriptor);
            }

            let kind = EventKind::parse(kind_text).ok_or_else(|| {
                EventMapError::UnknownEventKind {
                    descriptor: descriptor.to_string(),
                    kind: kind_text.to_string(),
                }
            })?;

            let selector = if selector_text.is_empty() {
                None
            } else {
                Some(Selector::parse(selector_text).ok_or_else(|| {
                    EventMapError::InvalidSelector {
                        descriptor: descriptor.to_string(),
                        selector: selector_text.to_string(),
                    }
                })?)
            };

            let handler = resolve(handler_name).ok_or_else(|| EventMapError::UnknownHandler {
                descriptor: descriptor.to_string(),
                handler: handler_name.to_string(),
            })?;

            bindings.push(EventBinding {
                descriptor: descriptor.to_string(),
                kind,
                selector,
                handler_name: handler_name.to_string(),
                handler,
            });
        }

        Ok(Self { bindings })
    }
}

impl<F> EventMap<F> {
    pub fn bindings(&self) -> &[EventBinding<F>] {
        &self.bindings
    }

    pub fn len(&self) -> usize {
        self.bindings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }

    /// Bindings receiving `kind` on `target`, in table order, each with
    /// the place it caught the interaction.
    pub fn matching<'a>(
        &'a self,
        kind: EventKind,
        elements: &'a [Element],
        target: Option<usize>,
    ) -> impl Iterator<Item = (&'a EventBinding<F>, Delegate)> + 'a {
        self.bindings.iter().filter_map(move |binding| {
            binding
                .accepts(kind, elements, target)
                .map(|delegate| (binding, delegate))
        })
    }
}
