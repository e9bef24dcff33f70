//! Built-in sync handlers
//!
//! Sync handlers of the attributes every component declares. They are
//! registered on the base type and run through the same path as user
//! handlers: once at render/decorate, then on every flushed change.

use crate::{events, AttrValue, Component};

/// Recompute the element class list.
///
/// Applied tokens are the base class, the type chain's static classes and
/// the configured tokens, deduplicated in that order. Tokens a previous sync
/// applied but the new value drops are removed unless the element carried
/// them before the first sync.
pub(crate) fn sync_element_classes(component: &Component, value: &AttrValue) {
    let Some(element) = component.element() else {
        return;
    };
    let runtime = component.runtime();

    let mut desired: Vec<String> = Vec::new();
    let tokens = std::iter::once(runtime.config().base_class.clone())
        .chain(component.component_type().element_classes().iter().cloned())
        .chain(value.class_tokens());
    for token in tokens {
        if !desired.contains(&token) {
            desired.push(token);
        }
    }

    let inner = &component.0;
    let mut document = runtime.document_mut();
    let classes = match document.class_list_mut(element) {
        Ok(classes) => classes,
        Err(err) => {
            tracing::error!(id = %component.id(), error = %err, "cannot apply element classes");
            return;
        }
    };

    let mut preserved = inner.preserved_classes.borrow_mut();
    let preserved = preserved.get_or_insert_with(|| classes.tokens().to_vec());
    let previous = std::mem::take(&mut *inner.applied_classes.borrow_mut());
    for token in previous {
        if !desired.contains(&token) && !preserved.contains(&token) {
            classes.remove(&token);
        }
    }
    for token in &desired {
        classes.add(token);
    }
    *inner.applied_classes.borrow_mut() = desired;
}

/// Replace the listeners wired from the previous `events` value
pub(crate) fn sync_events(component: &Component, value: &AttrValue) {
    let Some(element) = component.element() else {
        return;
    };
    let runtime = component.runtime();
    let id = component.id();

    let previous = std::mem::take(&mut *component.0.event_listeners.borrow_mut());
    {
        let mut document = runtime.document_mut();
        for listener in previous {
            document.remove_listener(listener);
        }
    }

    let Some(map) = value.as_events() else {
        return;
    };
    let mut wired = Vec::with_capacity(map.len());
    for (event, binding) in map.iter() {
        let listener = match events::resolve(component, event, &binding.handler) {
            Ok(listener) => listener,
            Err(err) => {
                tracing::error!(id = %id, event, error = %err, "skipping event handler");
                continue;
            }
        };
        let mut document = runtime.document_mut();
        let added = match &binding.selector {
            None => Ok(document.add_listener(element, event, listener)),
            Some(selector) => document.add_delegated_listener(element, event, selector, listener),
        };
        match added {
            Ok(listener_id) => wired.push(listener_id),
            Err(err) => {
                tracing::error!(id = %id, event, error = %err, "skipping event handler");
            }
        }
    }
    tracing::debug!(id = %id, listeners = wired.len(), "events wired");
    *component.0.event_listeners.borrow_mut() = wired;
}

/// Toggle the element display between its shown value and the hidden one
pub(crate) fn sync_visible(component: &Component, value: &AttrValue) {
    let Some(element) = component.element() else {
        return;
    };
    let runtime = component.runtime();
    let hidden = runtime.config().hidden_display.as_str();
    let visible = value.as_bool().unwrap_or(true);

    let mut document = runtime.document_mut();
    let current = document.display(element).map(str::to_string);
    let mut shown = component.0.shown_display.borrow_mut();
    let result = if visible {
        if current.as_deref() == Some(hidden) {
            document.set_display(element, shown.take().as_deref())
        } else {
            Ok(())
        }
    } else {
        if current.as_deref() != Some(hidden) {
            *shown = current;
        }
        document.set_display(element, Some(hidden))
    };
    if let Err(err) = result {
        tracing::error!(id = %component.id(), error = %err, "cannot apply visibility");
    }
}
