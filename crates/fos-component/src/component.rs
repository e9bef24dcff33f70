//! Component
//!
//! Lifecycle state machine of one UI component bound to one element.
//!
//! ```text
//! UNRENDERED --render/decorate--> RENDERED (ATTACHED <-> DETACHED)
//!      \                                   |
//!       `----------- dispose ------------> DISPOSED
//! ```
//!
//! Attribute writes after construction are batched: the first write of a
//! turn queues a microtask on the runtime and every later write of the same
//! turn joins the batch. The flush delivers the coalesced changes to the
//! sync handlers, the renderer and the lifecycle subscribers.

use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::{Rc, Weak};

use fos_dom::{DomEvent, ListenerId, NodeId};
use indexmap::IndexMap;

use crate::definition::{ID_ATTR, RESERVED_ATTR};
use crate::event_loop::TaskId;
use crate::{
    AttrChanges, AttrError, AttrValue, Attributes, ComponentError, ComponentResult, ComponentType,
    Config, Renderer, Runtime,
};

/// Config key adopting an element at construction
pub const ELEMENT_KEY: &str = "element";

/// Lifecycle phase
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Unrendered,
    Attached,
    Detached,
    Disposed,
}

/// Kinds of lifecycle events subscribers can listen to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LifecycleKind {
    Render,
    AttrsChanged,
    AttrsSynced,
    Attached,
    Detached,
    Disposed,
}

/// Lifecycle event delivered to subscribers
#[derive(Debug, Clone, PartialEq)]
pub enum ComponentEvent {
    Render { decorating: bool },
    AttrsChanged(AttrChanges),
    AttrsSynced(AttrChanges),
    Attached,
    Detached,
    Disposed,
}

impl ComponentEvent {
    pub fn kind(&self) -> LifecycleKind {
        match self {
            Self::Render { .. } => LifecycleKind::Render,
            Self::AttrsChanged(_) => LifecycleKind::AttrsChanged,
            Self::AttrsSynced(_) => LifecycleKind::AttrsSynced,
            Self::Attached => LifecycleKind::Attached,
            Self::Detached => LifecycleKind::Detached,
            Self::Disposed => LifecycleKind::Disposed,
        }
    }
}

/// Handle returned by [`Component::listen`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

type Subscriber = Rc<dyn Fn(&Component, &ComponentEvent)>;

struct Subscription {
    id: SubscriptionId,
    kind: LifecycleKind,
    callback: Subscriber,
}

pub(crate) struct ComponentInner {
    runtime: Runtime,
    ty: Rc<ComponentType>,
    id: RefCell<String>,
    element: Cell<Option<NodeId>>,
    default_parent: Cell<Option<NodeId>>,
    attrs: RefCell<Attributes>,
    renderer: RefCell<Option<Box<dyn Renderer>>>,

    rendered: Cell<bool>,
    decorated: Cell<bool>,
    attached: Cell<bool>,
    disposed: Cell<bool>,
    pending_flush: Cell<Option<TaskId>>,

    /// Listeners wired from the `events` attribute
    pub(crate) event_listeners: RefCell<Vec<ListenerId>>,
    /// Listeners added through `on`/`delegate`
    dom_listeners: RefCell<Vec<ListenerId>>,
    subscriptions: RefCell<Vec<Subscription>>,
    next_subscription: Cell<u64>,

    /// Class tokens applied by the last `element_classes` sync
    pub(crate) applied_classes: RefCell<Vec<String>>,
    /// Classes the element carried before the first sync
    pub(crate) preserved_classes: RefCell<Option<Vec<String>>>,
    /// Display value restored when shown again
    pub(crate) shown_display: RefCell<Option<String>>,

    pub(crate) components: RefCell<IndexMap<String, Component>>,
}

/// Shared handle to a component
#[derive(Clone)]
pub struct Component(pub(crate) Rc<ComponentInner>);

/// Non-owning component handle
#[derive(Clone)]
pub struct WeakComponent(Weak<ComponentInner>);

impl WeakComponent {
    pub fn upgrade(&self) -> Option<Component> {
        self.0.upgrade().map(Component)
    }
}

impl Component {
    /// Create a component and register it in the runtime's collector.
    ///
    /// `config` may carry `id`, `element` (node, selector or markup) and
    /// values for declared attributes. Undeclared keys are ignored.
    pub fn new(runtime: &Runtime, ty: &Rc<ComponentType>, mut config: Config) -> ComponentResult<Self> {
        if ty.declares(RESERVED_ATTR) {
            return Err(ComponentError::ReservedAttributeName(RESERVED_ATTR.to_string()));
        }

        let mut attrs = Attributes::new();
        for (name, def) in ty.attrs() {
            attrs.define(name, def.clone());
        }

        let id = match config.remove(ID_ATTR) {
            Some(AttrValue::Str(id)) if !id.is_empty() => id,
            None | Some(AttrValue::Null) | Some(AttrValue::Str(_)) => runtime.next_id(),
            Some(_) => return Err(AttrError::Validation(ID_ATTR.to_string()).into()),
        };

        let element = match config.remove(ELEMENT_KEY) {
            None | Some(AttrValue::Null) => None,
            Some(source @ (AttrValue::Node(_) | AttrValue::Str(_))) => Some(source),
            Some(_) => return Err(AttrError::Validation(ELEMENT_KEY.to_string()).into()),
        };

        for (name, value) in config {
            if attrs.has(&name) {
                attrs.init(&name, value)?;
            } else {
                tracing::debug!(id = %id, attr = %name, "ignoring undeclared config key");
            }
        }
        attrs.init(ID_ATTR, AttrValue::Str(id.clone()))?;

        let component = Self(Rc::new(ComponentInner {
            runtime: runtime.clone(),
            ty: Rc::clone(ty),
            id: RefCell::new(id.clone()),
            element: Cell::new(None),
            default_parent: Cell::new(None),
            attrs: RefCell::new(attrs),
            renderer: RefCell::new(None),
            rendered: Cell::new(false),
            decorated: Cell::new(false),
            attached: Cell::new(false),
            disposed: Cell::new(false),
            pending_flush: Cell::new(None),
            event_listeners: RefCell::new(Vec::new()),
            dom_listeners: RefCell::new(Vec::new()),
            subscriptions: RefCell::new(Vec::new()),
            next_subscription: Cell::new(0),
            applied_classes: RefCell::new(Vec::new()),
            preserved_classes: RefCell::new(None),
            shown_display: RefCell::new(None),
            components: RefCell::new(IndexMap::new()),
        }));

        runtime.collector().add_component(&id, component.clone())?;
        if let Some(source) = element {
            if let Err(err) = component.adopt_element_source(source) {
                runtime.collector().remove_if_same(&id, &component);
                return Err(err);
            }
        }

        tracing::debug!(id = %id, ty = ty.name(), "component created");
        for hook in &ty.hooks.created {
            hook(&component);
        }
        Ok(component)
    }

    /// Create a component of the type registered as `name`
    pub fn from_name(runtime: &Runtime, name: &str, config: Config) -> ComponentResult<Self> {
        let ty = runtime
            .registry()
            .get_constructor(name)
            .ok_or_else(|| ComponentError::UnknownComponentType(name.to_string()))?;
        Self::new(runtime, &ty, config)
    }

    pub fn id(&self) -> String {
        self.0.id.borrow().clone()
    }

    pub fn runtime(&self) -> &Runtime {
        &self.0.runtime
    }

    pub fn component_type(&self) -> &Rc<ComponentType> {
        &self.0.ty
    }

    pub fn element(&self) -> Option<NodeId> {
        self.0.element.get()
    }

    /// Element connected to the document tree
    pub fn in_document(&self) -> bool {
        self.element()
            .is_some_and(|el| self.0.runtime.document().is_connected(el))
    }

    pub fn was_rendered(&self) -> bool {
        self.0.rendered.get()
    }

    pub fn was_decorated(&self) -> bool {
        self.0.decorated.get()
    }

    pub fn is_attached(&self) -> bool {
        self.0.attached.get()
    }

    pub fn is_disposed(&self) -> bool {
        self.0.disposed.get()
    }

    pub fn phase(&self) -> Phase {
        if self.is_disposed() {
            Phase::Disposed
        } else if !self.was_rendered() {
            Phase::Unrendered
        } else if self.is_attached() {
            Phase::Attached
        } else {
            Phase::Detached
        }
    }

    pub fn ptr_eq(&self, other: &Component) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }

    pub fn downgrade(&self) -> WeakComponent {
        WeakComponent(Rc::downgrade(&self.0))
    }

    pub(crate) fn ensure_live(&self) -> ComponentResult<()> {
        if self.is_disposed() {
            Err(ComponentError::Disposed(self.id()))
        } else {
            Ok(())
        }
    }

    fn ensure_unrendered(&self) -> ComponentResult<()> {
        if self.was_decorated() {
            Err(ComponentError::AlreadyDecorated(self.id()))
        } else if self.was_rendered() {
            Err(ComponentError::AlreadyRendered(self.id()))
        } else {
            Ok(())
        }
    }

    fn require_element(&self) -> ComponentResult<NodeId> {
        self.element()
            .ok_or_else(|| ComponentError::MissingElement(self.id()))
    }

    fn adopt_element(&self, node: NodeId) -> ComponentResult<()> {
        self.0.runtime.document_mut().set_id(node, &self.id())?;
        self.0.element.set(Some(node));
        Ok(())
    }

    /// Adopt a node, or an element resolved from a selector or markup
    fn adopt_element_source(&self, source: AttrValue) -> ComponentResult<()> {
        let node = match source {
            AttrValue::Node(node) => node,
            AttrValue::Str(source) => self.0.runtime.document_mut().to_element(&source)?,
            _ => return Err(AttrError::Validation(ELEMENT_KEY.to_string()).into()),
        };
        self.adopt_element(node)
    }

    /// Replace the element; only before the first render
    pub fn set_element(&self, node: NodeId) -> ComponentResult<()> {
        self.ensure_live()?;
        self.ensure_unrendered()?;
        self.adopt_element(node)
    }

    /// Replace the element with one resolved from a selector or markup
    pub fn set_element_from(&self, source: &str) -> ComponentResult<()> {
        self.ensure_live()?;
        self.ensure_unrendered()?;
        let node = self.0.runtime.document_mut().to_element(source)?;
        self.adopt_element(node)
    }

    /// Parent used when `render`/`attach` get none
    pub fn set_default_parent(&self, parent: Option<NodeId>) {
        self.0.default_parent.set(parent);
    }

    fn resolve_parent(&self, parent: Option<NodeId>) -> ComponentResult<NodeId> {
        if let Some(parent) = parent.or(self.0.default_parent.get()) {
            return Ok(parent);
        }
        let document = self.0.runtime.document();
        if let Some(selector) = self.0.ty.default_parent() {
            if let Some(node) = document.query_selector(document.tree().root(), selector)? {
                return Ok(node);
            }
            tracing::warn!(id = %self.id(), selector, "default parent not found, using body");
        }
        Ok(document.body())
    }

    /// Run `f` with this component's renderer, creating it on first use.
    ///
    /// The renderer is borrowed for the duration of `f`; renderers must not
    /// call back into `with_renderer`.
    pub fn with_renderer<R>(&self, f: impl FnOnce(&mut dyn Renderer) -> R) -> R {
        let mut slot = self.0.renderer.borrow_mut();
        let renderer = slot.get_or_insert_with(|| self.0.ty.create_renderer());
        f(renderer.as_mut())
    }

    /// Render into `parent` before `sibling`.
    ///
    /// Without a parent the component default parent is used, then the
    /// type's default parent selector, then the document body.
    pub fn render(&self, parent: Option<NodeId>, sibling: Option<NodeId>) -> ComponentResult<()> {
        self.ensure_live()?;
        self.ensure_unrendered()?;
        let parent = self.resolve_parent(parent)?;
        self.0.runtime.document().tree().check_sibling(parent, sibling)?;
        let element = self.materialize()?;
        self.0.runtime.document().check_insert(parent, element, sibling)?;
        self.initial_sync();

        self.0.runtime.document_mut().insert(parent, element, sibling)?;
        self.0.rendered.set(true);
        self.0.attached.set(true);
        tracing::debug!(id = %self.id(), "component rendered");

        self.emit(ComponentEvent::Render { decorating: false });
        if self.is_disposed() {
            return Ok(());
        }
        self.enter_attached();
        if !self.is_disposed() {
            self.run_rendered_hooks(true);
        }
        Ok(())
    }

    /// Take over an element already in place, optionally replacing the
    /// current one first. The element is never moved.
    pub fn decorate(&self, element: Option<NodeId>) -> ComponentResult<()> {
        self.ensure_live()?;
        self.ensure_unrendered()?;
        if let Some(node) = element {
            self.adopt_element(node)?;
        }
        self.materialize()?;
        self.initial_sync();

        self.0.rendered.set(true);
        self.0.decorated.set(true);
        let in_document = self.in_document();
        self.0.attached.set(in_document);
        tracing::debug!(id = %self.id(), in_document, "component decorated");

        self.emit(ComponentEvent::Render { decorating: true });
        if in_document && !self.is_disposed() {
            self.enter_attached();
        }
        if !self.is_disposed() {
            self.run_rendered_hooks(true);
        }
        Ok(())
    }

    /// Run the renderer and check it left an element with our id
    fn materialize(&self) -> ComponentResult<NodeId> {
        self.with_renderer(|renderer| renderer.render(self))?;
        let element = self.require_element()?;
        self.0.runtime.document_mut().set_id(element, &self.id())?;
        Ok(element)
    }

    /// First-pass sync of every synced attribute, in declaration order.
    ///
    /// The base type declares `element_classes` and `events` first, so
    /// classes and listeners are in place before subtype handlers run.
    fn initial_sync(&self) {
        for name in self.0.ty.synced_attrs() {
            self.sync_attr(&name);
        }
    }

    fn sync_attr(&self, name: &str) {
        let Some(handler) = self.0.ty.sync_handler(name) else {
            return;
        };
        let value = self.get_attr(name).unwrap_or_default();
        handler(self, &value);
    }

    /// Insert the element again after a detach, or move it when a new
    /// position is given while attached.
    pub fn attach(&self, parent: Option<NodeId>, sibling: Option<NodeId>) -> ComponentResult<()> {
        self.ensure_live()?;
        if !self.was_rendered() {
            return Err(ComponentError::NotRendered(self.id()));
        }
        let element = self.require_element()?;

        if self.is_attached() {
            if parent.is_none() && sibling.is_none() {
                return Ok(());
            }
            let current = self.0.runtime.document().tree().parent(element);
            let parent = match parent.or(current) {
                Some(parent) => parent,
                None => self.resolve_parent(None)?,
            };
            self.0.runtime.document_mut().insert(parent, element, sibling)?;
            tracing::debug!(id = %self.id(), "component moved");
            return Ok(());
        }

        let parent = self.resolve_parent(parent)?;
        self.0.runtime.document_mut().insert(parent, element, sibling)?;
        self.0.attached.set(true);
        tracing::debug!(id = %self.id(), "component attached");
        self.enter_attached();
        Ok(())
    }

    /// Remove the element from the tree; no-op while detached
    pub fn detach(&self) {
        if !self.is_attached() {
            return;
        }
        if let Some(element) = self.element() {
            self.0.runtime.document_mut().remove(element);
        }
        self.0.attached.set(false);
        tracing::debug!(id = %self.id(), "component detached");
        for hook in &self.0.ty.hooks.detached {
            hook(self);
        }
        self.emit(ComponentEvent::Detached);
    }

    /// Tear the component down; repeated calls are no-ops
    pub fn dispose(&self) {
        if self.0.disposed.replace(true) {
            return;
        }
        let id = self.id();
        tracing::debug!(id = %id, "disposing component");

        self.detach();
        self.emit(ComponentEvent::Disposed);
        for hook in &self.0.ty.hooks.disposed {
            hook(self);
        }

        let children: Vec<Component> = std::mem::take(&mut *self.0.components.borrow_mut())
            .into_values()
            .collect();
        for child in children {
            child.dispose();
        }

        let mut listeners = std::mem::take(&mut *self.0.event_listeners.borrow_mut());
        listeners.append(&mut self.0.dom_listeners.borrow_mut());
        {
            let mut document = self.0.runtime.document_mut();
            for listener in listeners {
                document.remove_listener(listener);
            }
        }
        self.0.subscriptions.borrow_mut().clear();

        if let Some(task) = self.0.pending_flush.take() {
            self.0.runtime.cancel_microtask(task);
        }
        self.0.attrs.borrow_mut().discard_changes();

        self.0.runtime.collector().remove_if_same(&id, self);
    }

    fn enter_attached(&self) {
        for hook in &self.0.ty.hooks.attached {
            hook(self);
        }
        self.emit(ComponentEvent::Attached);
    }

    fn run_rendered_hooks(&self, first: bool) {
        for hook in &self.0.ty.hooks.rendered {
            hook(self, first);
        }
    }

    // ---- attributes ----

    pub fn get_attr(&self, name: &str) -> Option<AttrValue> {
        self.0.attrs.borrow().get(name).cloned()
    }

    /// Write an attribute. Sync handlers see the change at the next flush.
    pub fn set_attr(&self, name: &str, value: impl Into<AttrValue>) -> ComponentResult<()> {
        self.ensure_live()?;
        let value = value.into();
        if name == ID_ATTR {
            return self.change_id(value);
        }
        let opened = self.0.attrs.borrow_mut().set(name, value)?;
        if opened {
            self.schedule_flush();
        }
        Ok(())
    }

    /// Write several attributes into the same batch
    pub fn set_attrs(&self, config: Config) -> ComponentResult<()> {
        for (name, value) in config {
            self.set_attr(&name, value)?;
        }
        Ok(())
    }

    fn change_id(&self, value: AttrValue) -> ComponentResult<()> {
        let new_id = match value.as_str() {
            Some(id) if !id.is_empty() => id.to_string(),
            _ => return Err(AttrError::Validation(ID_ATTR.to_string()).into()),
        };
        let old_id = self.id();
        if new_id == old_id {
            return Ok(());
        }
        if self.was_rendered() {
            return Err(ComponentError::ImmutableId(old_id));
        }

        let collector = self.0.runtime.collector();
        collector.add_component(&new_id, self.clone())?;
        collector.remove_if_same(&old_id, self);
        *self.0.id.borrow_mut() = new_id.clone();
        if let Some(element) = self.element() {
            self.0.runtime.document_mut().set_id(element, &new_id)?;
        }
        tracing::debug!(from = %old_id, to = %new_id, "component id changed");

        if self.0.attrs.borrow_mut().set(ID_ATTR, value)? {
            self.schedule_flush();
        }
        Ok(())
    }

    fn schedule_flush(&self) {
        if self.0.pending_flush.get().is_some() {
            return;
        }
        let weak = self.downgrade();
        let task = self.0.runtime.queue_microtask(move || {
            if let Some(component) = weak.upgrade() {
                component.flush_changes();
            }
        });
        self.0.pending_flush.set(Some(task));
    }

    fn flush_changes(&self) {
        self.0.pending_flush.set(None);
        if self.is_disposed() {
            return;
        }
        let changes = self.0.attrs.borrow_mut().take_changes();
        if changes.is_empty() {
            return;
        }
        tracing::debug!(id = %self.id(), changed = changes.len(), "flushing attribute batch");

        if !self.was_rendered() {
            self.emit(ComponentEvent::AttrsChanged(changes));
            return;
        }

        for name in self.0.ty.synced_attrs() {
            if let Some(change) = changes.get(&name) {
                if let Some(handler) = self.0.ty.sync_handler(&name) {
                    handler(self, &change.new_val);
                }
            }
        }
        if self.is_disposed() {
            return;
        }
        self.with_renderer(|renderer| renderer.update(self, &changes));
        self.emit(ComponentEvent::AttrsChanged(changes.clone()));
        self.emit(ComponentEvent::AttrsSynced(changes));
        self.run_rendered_hooks(false);
    }

    // ---- events ----

    /// Listen for `event_type` on the element; removed on dispose
    pub fn on(&self, event_type: &str, f: impl Fn(&DomEvent) + 'static) -> ComponentResult<ListenerId> {
        self.ensure_live()?;
        let element = self.require_element()?;
        let id = self
            .0
            .runtime
            .document_mut()
            .add_listener(element, event_type, Rc::new(f));
        self.0.dom_listeners.borrow_mut().push(id);
        Ok(id)
    }

    /// Listen for `event_type` on descendants matching `selector`
    pub fn delegate(
        &self,
        event_type: &str,
        selector: &str,
        f: impl Fn(&DomEvent) + 'static,
    ) -> ComponentResult<ListenerId> {
        self.ensure_live()?;
        let element = self.require_element()?;
        let id = self.0.runtime.document_mut().add_delegated_listener(
            element,
            event_type,
            selector,
            Rc::new(f),
        )?;
        self.0.dom_listeners.borrow_mut().push(id);
        Ok(id)
    }

    /// Remove a listener added through `on`/`delegate`.
    ///
    /// Returns false for listeners this component did not add.
    pub fn off(&self, id: ListenerId) -> bool {
        let owned = {
            let mut listeners = self.0.dom_listeners.borrow_mut();
            let before = listeners.len();
            listeners.retain(|&l| l != id);
            listeners.len() != before
        };
        owned && self.0.runtime.document_mut().remove_listener(id)
    }

    /// Dispatch a DOM event at the element
    pub fn dispatch(&self, event_type: &str) -> ComponentResult<DomEvent> {
        let element = self.require_element()?;
        Ok(self.0.runtime.dispatch_event(element, event_type))
    }

    /// Subscribe to lifecycle events of `kind`
    pub fn listen(
        &self,
        kind: LifecycleKind,
        f: impl Fn(&Component, &ComponentEvent) + 'static,
    ) -> SubscriptionId {
        let id = SubscriptionId(self.0.next_subscription.get());
        self.0.next_subscription.set(id.0 + 1);
        self.0.subscriptions.borrow_mut().push(Subscription {
            id,
            kind,
            callback: Rc::new(f),
        });
        id
    }

    pub fn unlisten(&self, id: SubscriptionId) -> bool {
        let mut subscriptions = self.0.subscriptions.borrow_mut();
        let before = subscriptions.len();
        subscriptions.retain(|s| s.id != id);
        subscriptions.len() != before
    }

    fn emit(&self, event: ComponentEvent) {
        let kind = event.kind();
        let callbacks: Vec<Subscriber> = self
            .0
            .subscriptions
            .borrow()
            .iter()
            .filter(|s| s.kind == kind)
            .map(|s| Rc::clone(&s.callback))
            .collect();
        for callback in callbacks {
            callback(self, &event);
        }
    }

    /// Number of listeners this component currently owns
    pub fn listener_count(&self) -> usize {
        self.0.event_listeners.borrow().len() + self.0.dom_listeners.borrow().len()
    }
}

impl fmt::Debug for Component {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Component")
            .field("id", &*self.0.id.borrow())
            .field("type", &self.0.ty.name())
            .field("phase", &self.phase())
            .field("element", &self.element())
            .finish()
    }
}

impl fmt::Debug for WeakComponent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("WeakComponent")
    }
}
