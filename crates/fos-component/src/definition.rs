//! Component types
//!
//! A `ComponentType` is the static description shared by every instance of
//! a kind of component: its declared attributes, the sync handler for each
//! attribute, named methods usable as event handlers, default element
//! classes, lifecycle hooks and renderer factory.
//!
//! Types form a single-inheritance chain rooted at [`ComponentType::base`].
//! Building a type merges the chain once, base first:
//!
//! * attributes keep the position the first ancestor declared them at, a
//!   redeclaration only replaces the definition;
//! * sync handlers and methods are overridden by name;
//! * element classes accumulate, ancestors first;
//! * renderer factory and default parent come from the nearest declaration;
//! * hooks accumulate and run ancestors first.

use std::collections::HashMap;
use std::fmt;
use std::rc::Rc;

use fos_dom::DomEvent;
use indexmap::IndexMap;

use crate::sync;
use crate::{AttrDef, AttrValue, Component, DefaultRenderer, EventMap, Renderer};

/// Attribute carrying the component id
pub const ID_ATTR: &str = "id";
/// Extra classes applied to the element
pub const ELEMENT_CLASSES_ATTR: &str = "element_classes";
/// Declarative event handler map
pub const EVENTS_ATTR: &str = "events";
/// Element visibility
pub const VISIBLE_ATTR: &str = "visible";
/// Reserved for sub-components, never declarable
pub const RESERVED_ATTR: &str = "components";

/// Called with the new value whenever the attribute changes
pub type SyncFn = Rc<dyn Fn(&Component, &AttrValue)>;
/// Named method usable as an event handler
pub type MethodFn = Rc<dyn Fn(&Component, &DomEvent)>;
/// Lifecycle hook
pub type HookFn = Rc<dyn Fn(&Component)>;
/// `rendered` hook; the flag is true for the first render
pub type RenderedFn = Rc<dyn Fn(&Component, bool)>;
/// Creates the renderer bound to one instance
pub type RendererFactory = Rc<dyn Fn() -> Box<dyn Renderer>>;

#[derive(Clone, Default)]
pub(crate) struct Hooks {
    pub(crate) created: Vec<HookFn>,
    pub(crate) attached: Vec<HookFn>,
    pub(crate) detached: Vec<HookFn>,
    pub(crate) rendered: Vec<RenderedFn>,
    pub(crate) disposed: Vec<HookFn>,
}

impl Hooks {
    fn extend(&mut self, other: Hooks) {
        self.created.extend(other.created);
        self.attached.extend(other.attached);
        self.detached.extend(other.detached);
        self.rendered.extend(other.rendered);
        self.disposed.extend(other.disposed);
    }
}

/// Static description of a component type
pub struct ComponentType {
    name: String,
    /// Type names, base first, ending with this type
    ancestry: Vec<String>,
    attrs: IndexMap<String, AttrDef>,
    sync: HashMap<String, SyncFn>,
    methods: HashMap<String, MethodFn>,
    element_classes: Vec<String>,
    renderer: RendererFactory,
    default_parent: Option<String>,
    pub(crate) hooks: Hooks,
}

impl ComponentType {
    /// The root type every other type extends
    pub fn base() -> Rc<Self> {
        let mut attrs = IndexMap::new();
        attrs.insert(
            ID_ATTR.to_string(),
            AttrDef::new(AttrValue::Null).validator(|v| v.as_str().is_some()),
        );
        attrs.insert(
            ELEMENT_CLASSES_ATTR.to_string(),
            AttrDef::new("").validator(|v| matches!(v, AttrValue::Str(_) | AttrValue::List(_))),
        );
        attrs.insert(
            EVENTS_ATTR.to_string(),
            AttrDef::new(EventMap::new())
                .validator(|v| matches!(v, AttrValue::Events(_) | AttrValue::Null)),
        );
        attrs.insert(
            VISIBLE_ATTR.to_string(),
            AttrDef::new(true).validator(|v| v.as_bool().is_some()),
        );

        let mut sync: HashMap<String, SyncFn> = HashMap::new();
        sync.insert(ELEMENT_CLASSES_ATTR.to_string(), Rc::new(sync::sync_element_classes));
        sync.insert(EVENTS_ATTR.to_string(), Rc::new(sync::sync_events));
        sync.insert(VISIBLE_ATTR.to_string(), Rc::new(sync::sync_visible));

        Rc::new(Self {
            name: "Component".to_string(),
            ancestry: vec!["Component".to_string()],
            attrs,
            sync,
            methods: HashMap::new(),
            element_classes: Vec::new(),
            renderer: Rc::new(|| Box::new(DefaultRenderer) as Box<dyn Renderer>),
            default_parent: None,
            hooks: Hooks::default(),
        })
    }

    /// Start a type extending the base type
    pub fn builder(name: &str) -> ComponentTypeBuilder {
        ComponentTypeBuilder::new(name)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Type names from the base type down to this one
    pub fn ancestry(&self) -> &[String] {
        &self.ancestry
    }

    /// Check whether this type is `name` or extends it
    pub fn is_a(&self, name: &str) -> bool {
        self.ancestry.iter().any(|n| n == name)
    }

    /// Merged attribute declarations in declaration order
    pub fn attrs(&self) -> impl Iterator<Item = (&str, &AttrDef)> {
        self.attrs.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn declares(&self, attr: &str) -> bool {
        self.attrs.contains_key(attr)
    }

    pub fn sync_handler(&self, attr: &str) -> Option<SyncFn> {
        self.sync.get(attr).cloned()
    }

    /// Declared attributes that have a sync handler, in declaration order
    pub fn synced_attrs(&self) -> Vec<String> {
        self.attrs
            .keys()
            .filter(|name| self.sync.contains_key(*name))
            .cloned()
            .collect()
    }

    pub fn method(&self, name: &str) -> Option<MethodFn> {
        self.methods.get(name).cloned()
    }

    /// Static classes contributed by the type chain
    pub fn element_classes(&self) -> &[String] {
        &self.element_classes
    }

    pub fn default_parent(&self) -> Option<&str> {
        self.default_parent.as_deref()
    }

    pub(crate) fn create_renderer(&self) -> Box<dyn Renderer> {
        (self.renderer)()
    }
}

impl fmt::Debug for ComponentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ComponentType")
            .field("name", &self.name)
            .field("ancestry", &self.ancestry)
            .field("attrs", &self.attrs.keys().collect::<Vec<_>>())
            .field("element_classes", &self.element_classes)
            .field("default_parent", &self.default_parent)
            .finish_non_exhaustive()
    }
}

/// Builder for [`ComponentType`]
pub struct ComponentTypeBuilder {
    name: String,
    parent: Option<Rc<ComponentType>>,
    attrs: Vec<(String, AttrDef)>,
    sync: Vec<(String, SyncFn)>,
    methods: Vec<(String, MethodFn)>,
    element_classes: Vec<String>,
    renderer: Option<RendererFactory>,
    default_parent: Option<String>,
    hooks: Hooks,
}

impl ComponentTypeBuilder {
    fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            parent: None,
            attrs: Vec::new(),
            sync: Vec::new(),
            methods: Vec::new(),
            element_classes: Vec::new(),
            renderer: None,
            default_parent: None,
            hooks: Hooks::default(),
        }
    }

    /// Extend `parent` instead of the base type
    #[must_use]
    pub fn extends(mut self, parent: &Rc<ComponentType>) -> Self {
        self.parent = Some(Rc::clone(parent));
        self
    }

    /// Declare an attribute
    #[must_use]
    pub fn attr(mut self, name: &str, def: AttrDef) -> Self {
        self.attrs.push((name.to_string(), def));
        self
    }

    /// Register the sync handler of `attr`
    #[must_use]
    pub fn sync(mut self, attr: &str, f: impl Fn(&Component, &AttrValue) + 'static) -> Self {
        self.sync.push((attr.to_string(), Rc::new(f)));
        self
    }

    /// Register a named method for `events` maps
    #[must_use]
    pub fn method(mut self, name: &str, f: impl Fn(&Component, &DomEvent) + 'static) -> Self {
        self.methods.push((name.to_string(), Rc::new(f)));
        self
    }

    /// Add static element classes (space separated)
    #[must_use]
    pub fn element_classes(mut self, classes: &str) -> Self {
        self.element_classes
            .extend(classes.split_whitespace().map(str::to_string));
        self
    }

    #[must_use]
    pub fn renderer<R: Renderer + 'static>(mut self, factory: impl Fn() -> R + 'static) -> Self {
        self.renderer = Some(Rc::new(move || Box::new(factory()) as Box<dyn Renderer>));
        self
    }

    /// Selector of the parent used by `render(None, _)`
    #[must_use]
    pub fn default_parent(mut self, selector: &str) -> Self {
        self.default_parent = Some(selector.to_string());
        self
    }

    #[must_use]
    pub fn on_created(mut self, f: impl Fn(&Component) + 'static) -> Self {
        self.hooks.created.push(Rc::new(f));
        self
    }

    #[must_use]
    pub fn on_attached(mut self, f: impl Fn(&Component) + 'static) -> Self {
        self.hooks.attached.push(Rc::new(f));
        self
    }

    #[must_use]
    pub fn on_detached(mut self, f: impl Fn(&Component) + 'static) -> Self {
        self.hooks.detached.push(Rc::new(f));
        self
    }

    #[must_use]
    pub fn on_rendered(mut self, f: impl Fn(&Component, bool) + 'static) -> Self {
        self.hooks.rendered.push(Rc::new(f));
        self
    }

    #[must_use]
    pub fn on_disposed(mut self, f: impl Fn(&Component) + 'static) -> Self {
        self.hooks.disposed.push(Rc::new(f));
        self
    }

    /// Merge with the ancestor chain
    pub fn build(self) -> Rc<ComponentType> {
        let parent = self.parent.unwrap_or_else(ComponentType::base);

        let mut attrs = parent.attrs.clone();
        for (name, def) in self.attrs {
            attrs.insert(name, def);
        }

        let mut sync = parent.sync.clone();
        sync.extend(self.sync);

        let mut methods = parent.methods.clone();
        methods.extend(self.methods);

        let mut element_classes = parent.element_classes.clone();
        for class in self.element_classes {
            if !element_classes.contains(&class) {
                element_classes.push(class);
            }
        }

        let mut hooks = parent.hooks.clone();
        hooks.extend(self.hooks);

        let mut ancestry = parent.ancestry.clone();
        ancestry.push(self.name.clone());

        Rc::new(ComponentType {
            name: self.name,
            ancestry,
            attrs,
            sync,
            methods,
            element_classes,
            renderer: self.renderer.unwrap_or_else(|| Rc::clone(&parent.renderer)),
            default_parent: self.default_parent.or_else(|| parent.default_parent.clone()),
            hooks,
        })
    }
}

impl fmt::Debug for ComponentTypeBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ComponentTypeBuilder")
            .field("name", &self.name)
            .field("parent", &self.parent.as_ref().map(|p| p.name()))
            .finish_non_exhaustive()
    }
}
