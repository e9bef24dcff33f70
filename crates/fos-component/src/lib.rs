//! fOS Components
//!
//! Lifecycle and attribute synchronization for UI components living in a
//! fOS DOM document.
//!
//! A [`ComponentType`] describes a kind of component: declared attributes,
//! sync handlers, methods, hooks and renderer. A [`Component`] is one
//! instance of it, registered in its [`Runtime`] under a unique id. After
//! `render` or `decorate`, attribute writes are batched and synchronized at
//! the next [`Runtime::flush`].

mod attributes;
mod collector;
mod component;
mod definition;
mod error;
mod event_loop;
mod events;
mod registry;
mod renderer;
mod runtime;
mod subcomponents;
mod sync;
mod value;

pub use attributes::{AttrDef, Attributes, Validator};
pub use collector::ComponentCollector;
pub use component::{
    Component, ComponentEvent, LifecycleKind, Phase, SubscriptionId, WeakComponent, ELEMENT_KEY,
};
pub use definition::{
    ComponentType, ComponentTypeBuilder, HookFn, MethodFn, RenderedFn, RendererFactory, SyncFn,
    ELEMENT_CLASSES_ATTR, EVENTS_ATTR, ID_ATTR, RESERVED_ATTR, VISIBLE_ATTR,
};
pub use error::{AttrError, ComponentError, ComponentResult};
pub use event_loop::{EventLoop, Microtask, TaskId};
pub use events::{EventBinding, EventMap, HandlerRef};
pub use registry::ComponentRegistry;
pub use renderer::{DefaultRenderer, Renderer};
pub use runtime::{Runtime, RuntimeConfig};
pub use subcomponents::ComponentTypeRef;
pub use value::{AttrChange, AttrChanges, AttrValue, Config};

pub use fos_dom::{DomEvent, ListenerId, NodeId};
