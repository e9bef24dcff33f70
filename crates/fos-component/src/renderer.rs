//! Renderer contract
//!
//! A renderer materializes the element of exactly one component. It is
//! created lazily from the type's factory and kept for the component's
//! lifetime.

use crate::{AttrChanges, Component, ComponentResult};

pub trait Renderer {
    /// Produce or adopt the component element; called once
    fn render(&mut self, component: &Component) -> ComponentResult<()>;

    /// Apply a flushed batch; only called after the first render
    fn update(&mut self, component: &Component, changes: &AttrChanges) {
        let _ = (component, changes);
    }
}

/// Creates a bare element carrying the base class when none was supplied
#[derive(Debug, Default, Clone, Copy)]
pub struct DefaultRenderer;

impl Renderer for DefaultRenderer {
    fn render(&mut self, component: &Component) -> ComponentResult<()> {
        if component.element().is_some() {
            return Ok(());
        }
        let runtime = component.runtime();
        let node = {
            let config = runtime.config();
            let mut document = runtime.document_mut();
            let node = document.create_element(&config.default_tag);
            document.class_list_mut(node)?.add(&config.base_class);
            node
        };
        component.set_element(node)
    }
}
