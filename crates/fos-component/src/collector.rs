//! Component collector
//!
//! Directory of live components by id. Used to resolve `"id:method"`
//! handlers, to adopt existing instances as sub-components, and to enforce
//! that at most one live instance holds a given id.

use std::cell::RefCell;
use std::collections::HashMap;

use crate::{Component, ComponentError, ComponentResult};

#[derive(Debug, Default)]
pub struct ComponentCollector {
    components: RefCell<HashMap<String, Component>>,
}

impl ComponentCollector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a live component under `id`
    pub fn add_component(&self, id: &str, component: Component) -> ComponentResult<()> {
        let mut components = self.components.borrow_mut();
        if components.contains_key(id) {
            return Err(ComponentError::DuplicateId(id.to_string()));
        }
        components.insert(id.to_string(), component);
        Ok(())
    }

    pub fn remove_component(&self, id: &str) -> Option<Component> {
        self.components.borrow_mut().remove(id)
    }

    /// Remove `id` only if it still maps to `component`
    pub fn remove_if_same(&self, id: &str, component: &Component) -> bool {
        let mut components = self.components.borrow_mut();
        if components.get(id).is_some_and(|c| c.ptr_eq(component)) {
            components.remove(id);
            true
        } else {
            false
        }
    }

    pub fn get_component(&self, id: &str) -> Option<Component> {
        self.components.borrow().get(id).cloned()
    }

    pub fn len(&self) -> usize {
        self.components.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.components.borrow().is_empty()
    }

    /// Ids of live components, sorted
    pub fn ids(&self) -> Vec<String> {
        let mut ids: Vec<_> = self.components.borrow().keys().cloned().collect();
        ids.sort();
        ids
    }

    /// Snapshot of live components
    pub fn components(&self) -> Vec<Component> {
        self.components.borrow().values().cloned().collect()
    }
}
