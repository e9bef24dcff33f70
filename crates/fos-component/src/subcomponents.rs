//! Sub-components
//!
//! Components owned by another component under a local key. Owners dispose
//! their sub-components; a sub-component shared with another owner is torn
//! down by whichever disposes first and ignored by the other.

use std::rc::Rc;

use crate::definition::ID_ATTR;
use crate::{Component, ComponentError, ComponentResult, ComponentType, Config};

/// How `add_sub_component` finds the type to construct
#[derive(Debug, Clone)]
pub enum ComponentTypeRef {
    Type(Rc<ComponentType>),
    /// Looked up in the registry
    Name(String),
}

impl From<&Rc<ComponentType>> for ComponentTypeRef {
    fn from(ty: &Rc<ComponentType>) -> Self {
        Self::Type(Rc::clone(ty))
    }
}

impl From<Rc<ComponentType>> for ComponentTypeRef {
    fn from(ty: Rc<ComponentType>) -> Self {
        Self::Type(ty)
    }
}

impl From<&str> for ComponentTypeRef {
    fn from(name: &str) -> Self {
        Self::Name(name.to_string())
    }
}

impl Component {
    /// Own the component with id `key`.
    ///
    /// A live component with that id is adopted as is and `config` is
    /// dropped. Otherwise a new instance of `ty` is created with id `key`.
    pub fn add_sub_component(
        &self,
        ty: impl Into<ComponentTypeRef>,
        key: &str,
        config: Option<Config>,
    ) -> ComponentResult<Component> {
        self.ensure_live()?;
        let runtime = self.runtime();

        let child = match runtime.collector().get_component(key) {
            Some(existing) => {
                if config.is_some() {
                    tracing::warn!(id = %self.id(), key, "adopting live component, config ignored");
                }
                existing
            }
            None => {
                let ty = match ty.into() {
                    ComponentTypeRef::Type(ty) => ty,
                    ComponentTypeRef::Name(name) => runtime
                        .registry()
                        .get_constructor(&name)
                        .ok_or(ComponentError::UnknownComponentType(name))?,
                };
                let config = config.unwrap_or_default().merged(Config::new().with(ID_ATTR, key));
                Component::new(runtime, &ty, config)?
            }
        };

        tracing::debug!(id = %self.id(), key, "sub-component added");
        self.0
            .components
            .borrow_mut()
            .insert(key.to_string(), child.clone());
        Ok(child)
    }

    pub fn sub_component(&self, key: &str) -> Option<Component> {
        self.0.components.borrow().get(key).cloned()
    }

    /// Sub-components in insertion order
    pub fn sub_components(&self) -> Vec<(String, Component)> {
        self.0
            .components
            .borrow()
            .iter()
            .map(|(k, c)| (k.clone(), c.clone()))
            .collect()
    }

    /// Sub-components whose key starts with `prefix`, in insertion order
    pub fn get_components_with_prefix(&self, prefix: &str) -> Vec<Component> {
        self.0
            .components
            .borrow()
            .iter()
            .filter(|(k, _)| k.starts_with(prefix))
            .map(|(_, c)| c.clone())
            .collect()
    }

    /// Dispose and forget the sub-components stored under `keys`
    pub fn dispose_sub_components(&self, keys: &[&str]) {
        for key in keys {
            let removed = self.0.components.borrow_mut().shift_remove(*key);
            if let Some(child) = removed {
                child.dispose();
            }
        }
    }
}
