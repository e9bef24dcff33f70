//! Component registry
//!
//! Name → component type lookup for lazy instantiation by name. Entries may
//! be added or overridden, never removed.

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use crate::ComponentType;

#[derive(Debug, Default)]
pub struct ComponentRegistry {
    types: RefCell<HashMap<String, Rc<ComponentType>>>,
}

impl ComponentRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `ty` under `name`, or under its own type name
    pub fn register(&self, ty: &Rc<ComponentType>, name: Option<&str>) {
        let name = name.unwrap_or_else(|| ty.name());
        let previous = self
            .types
            .borrow_mut()
            .insert(name.to_string(), Rc::clone(ty));
        if previous.is_some() {
            tracing::debug!(name, "component type registration overridden");
        }
    }

    pub fn get_constructor(&self, name: &str) -> Option<Rc<ComponentType>> {
        self.types.borrow().get(name).cloned()
    }

    pub fn is_registered(&self, name: &str) -> bool {
        self.types.borrow().contains_key(name)
    }

    /// Registered names, sorted
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<_> = self.types.borrow().keys().cloned().collect();
        names.sort();
        names
    }
}
