//! Event wiring
//!
//! Declarative `events` maps and how their handler references resolve to
//! DOM listeners.

use std::fmt;
use std::rc::Rc;

use fos_dom::{DomEvent, Listener};
use indexmap::IndexMap;

use crate::component::WeakComponent;
use crate::{Component, ComponentError, ComponentResult};

/// What an `events` entry points at
#[derive(Clone)]
pub enum HandlerRef {
    /// Attached as is
    Function(Rc<dyn Fn(&DomEvent)>),
    /// Method of the component owning the map
    Method(String),
    /// Method of another live component, written `"id:method"`
    Remote { component_id: String, method: String },
}

impl HandlerRef {
    pub fn function(f: impl Fn(&DomEvent) + 'static) -> Self {
        Self::Function(Rc::new(f))
    }

    pub fn method(name: &str) -> Self {
        Self::Method(name.to_string())
    }

    pub fn remote(component_id: &str, method: &str) -> Self {
        Self::Remote {
            component_id: component_id.to_string(),
            method: method.to_string(),
        }
    }

    /// Parse `"method"` or `"id:method"`
    pub fn parse(source: &str) -> Self {
        match source.split_once(':') {
            Some((id, method)) => Self::remote(id, method),
            None => Self::method(source),
        }
    }

    fn describe(&self) -> String {
        match self {
            Self::Function(_) => "<function>".to_string(),
            Self::Method(name) => name.clone(),
            Self::Remote {
                component_id,
                method,
            } => format!("{component_id}:{method}"),
        }
    }
}

impl From<&str> for HandlerRef {
    fn from(source: &str) -> Self {
        Self::parse(source)
    }
}

impl From<String> for HandlerRef {
    fn from(source: String) -> Self {
        Self::parse(&source)
    }
}

impl fmt::Debug for HandlerRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Function(_) => f.write_str("Function(..)"),
            Self::Method(name) => f.debug_tuple("Method").field(name).finish(),
            Self::Remote {
                component_id,
                method,
            } => f
                .debug_struct("Remote")
                .field("component_id", component_id)
                .field("method", method)
                .finish(),
        }
    }
}

impl PartialEq for HandlerRef {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Function(a), Self::Function(b)) => {
                std::ptr::addr_eq(Rc::as_ptr(a), Rc::as_ptr(b))
            }
            (Self::Method(a), Self::Method(b)) => a == b,
            (
                Self::Remote {
                    component_id: a,
                    method: m,
                },
                Self::Remote {
                    component_id: b,
                    method: n,
                },
            ) => a == b && m == n,
            _ => false,
        }
    }
}

/// One `events` entry
#[derive(Debug, Clone, PartialEq)]
pub struct EventBinding {
    pub handler: HandlerRef,
    /// Delegate to descendants of the element matching this selector
    pub selector: Option<String>,
}

/// Ordered event name → binding map
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EventMap {
    entries: IndexMap<String, EventBinding>,
}

impl EventMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Bind `event` to a method reference (`"name"` or `"id:name"`)
    #[must_use]
    pub fn on(self, event: &str, handler: impl Into<HandlerRef>) -> Self {
        self.bind(event, handler.into(), None)
    }

    #[must_use]
    pub fn on_fn(self, event: &str, f: impl Fn(&DomEvent) + 'static) -> Self {
        self.bind(event, HandlerRef::function(f), None)
    }

    /// Bind a delegated handler firing for targets matching `selector`
    #[must_use]
    pub fn delegate(self, event: &str, selector: &str, handler: impl Into<HandlerRef>) -> Self {
        self.bind(event, handler.into(), Some(selector.to_string()))
    }

    #[must_use]
    pub fn delegate_fn(self, event: &str, selector: &str, f: impl Fn(&DomEvent) + 'static) -> Self {
        self.bind(event, HandlerRef::function(f), Some(selector.to_string()))
    }

    fn bind(mut self, event: &str, handler: HandlerRef, selector: Option<String>) -> Self {
        self.entries
            .insert(event.to_string(), EventBinding { handler, selector });
        self
    }

    pub fn get(&self, event: &str) -> Option<&EventBinding> {
        self.entries.get(event)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &EventBinding)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

fn unresolved(event: &str, handler: &HandlerRef, reason: String) -> ComponentError {
    ComponentError::UnresolvedEventHandler {
        event: event.to_string(),
        handler: handler.describe(),
        reason,
    }
}

/// Listener calling `method` on `target` while it is alive
fn method_listener(target: &Component, method: crate::definition::MethodFn) -> Listener {
    let weak: WeakComponent = target.downgrade();
    Rc::new(move |event: &DomEvent| {
        if let Some(component) = weak.upgrade() {
            if !component.is_disposed() {
                method(&component, event);
            }
        }
    })
}

/// Resolve the handler of one `events` entry of `owner`
pub(crate) fn resolve(owner: &Component, event: &str, handler: &HandlerRef) -> ComponentResult<Listener> {
    match handler {
        HandlerRef::Function(f) => Ok(Rc::clone(f)),
        HandlerRef::Method(name) => owner
            .component_type()
            .method(name)
            .map(|m| method_listener(owner, m))
            .ok_or_else(|| {
                unresolved(
                    event,
                    handler,
                    format!("`{}` has no method `{name}`", owner.component_type().name()),
                )
            }),
        HandlerRef::Remote {
            component_id,
            method,
        } => {
            let other = owner
                .runtime()
                .collector()
                .get_component(component_id)
                .ok_or_else(|| {
                    unresolved(event, handler, format!("no live component `{component_id}`"))
                })?;
            let m = other.component_type().method(method).ok_or_else(|| {
                unresolved(
                    event,
                    handler,
                    format!("component `{component_id}` has no method `{method}`"),
                )
            })?;
            Ok(method_listener(&other, m))
        }
    }
}
