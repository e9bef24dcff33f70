//! Attribute store
//!
//! Declared attributes with default values, optional validators and
//! change batching. The store only records changes; scheduling the flush
//! is up to the owner (see `Component::set_attr`).

use std::fmt;
use std::rc::Rc;

use indexmap::IndexMap;

use crate::{AttrChange, AttrChanges, AttrError, AttrValue};

/// Attribute validator
pub type Validator = Rc<dyn Fn(&AttrValue) -> bool>;

/// Attribute declaration
#[derive(Clone, Default)]
pub struct AttrDef {
    pub value: AttrValue,
    pub validator: Option<Validator>,
    /// Only settable through construction config
    pub write_once: bool,
}

impl AttrDef {
    /// Declaration with a default value
    pub fn new(value: impl Into<AttrValue>) -> Self {
        Self {
            value: value.into(),
            validator: None,
            write_once: false,
        }
    }

    #[must_use]
    pub fn validator(mut self, f: impl Fn(&AttrValue) -> bool + 'static) -> Self {
        self.validator = Some(Rc::new(f));
        self
    }

    #[must_use]
    pub fn write_once(mut self) -> Self {
        self.write_once = true;
        self
    }

    fn accepts(&self, value: &AttrValue) -> bool {
        self.validator.as_ref().is_none_or(|f| f(value))
    }
}

impl fmt::Debug for AttrDef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AttrDef")
            .field("value", &self.value)
            .field("validator", &self.validator.is_some())
            .field("write_once", &self.write_once)
            .finish()
    }
}

#[derive(Debug)]
struct Slot {
    def: AttrDef,
    value: AttrValue,
}

/// Reactive key/value store of one component
#[derive(Debug, Default)]
pub struct Attributes {
    slots: IndexMap<String, Slot>,
    pending: AttrChanges,
}

impl Attributes {
    pub fn new() -> Self {
        Self::default()
    }

    /// Declare an attribute; re-declaring replaces the definition and value
    pub fn define(&mut self, name: &str, def: AttrDef) {
        let value = def.value.clone();
        self.slots.insert(name.to_string(), Slot { def, value });
    }

    pub fn has(&self, name: &str) -> bool {
        self.slots.contains_key(name)
    }

    pub fn get(&self, name: &str) -> Option<&AttrValue> {
        self.slots.get(name).map(|s| &s.value)
    }

    /// Attribute names in declaration order
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.slots.keys().map(String::as_str)
    }

    fn slot_mut(&mut self, name: &str) -> Result<&mut Slot, AttrError> {
        self.slots
            .get_mut(name)
            .ok_or_else(|| AttrError::Undeclared(name.to_string()))
    }

    /// Set the construction-time value; no change is recorded
    pub fn init(&mut self, name: &str, value: AttrValue) -> Result<(), AttrError> {
        let slot = self.slot_mut(name)?;
        if !slot.def.accepts(&value) {
            return Err(AttrError::Validation(name.to_string()));
        }
        slot.value = value;
        Ok(())
    }

    /// Write a value and record the change.
    ///
    /// Returns `true` when this write opened a new batch, i.e. the caller
    /// must schedule a flush.
    pub fn set(&mut self, name: &str, value: AttrValue) -> Result<bool, AttrError> {
        let slot = self.slot_mut(name)?;
        if slot.def.write_once {
            return Err(AttrError::WriteOnce(name.to_string()));
        }
        if !slot.def.accepts(&value) {
            return Err(AttrError::Validation(name.to_string()));
        }
        if slot.value == value {
            return Ok(false);
        }

        let prev = std::mem::replace(&mut slot.value, value.clone());
        let opened = self.pending.is_empty();
        self.pending
            .entry(name.to_string())
            .and_modify(|change| change.new_val = value.clone())
            .or_insert(AttrChange {
                prev_val: prev,
                new_val: value,
            });
        Ok(opened)
    }

    pub fn has_pending(&self) -> bool {
        !self.pending.is_empty()
    }

    /// Drain the current batch
    pub fn take_changes(&mut self) -> AttrChanges {
        std::mem::take(&mut self.pending)
    }

    /// Drop the current batch without delivering it
    pub fn discard_changes(&mut self) {
        self.pending.clear();
    }
}
