//! Runtime services
//!
//! One `Runtime` owns everything components share: the document, the
//! collector of live instances, the type registry and the microtask queue.
//! Components receive it at construction instead of reaching for globals.

use std::cell::{Cell, Ref, RefCell, RefMut};
use std::fmt;
use std::rc::Rc;

use fos_dom::{Document, DomEvent, NodeId};
use serde::{Deserialize, Serialize};

use crate::event_loop::{EventLoop, TaskId};
use crate::{ComponentCollector, ComponentRegistry};

/// Runtime configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RuntimeConfig {
    /// Marker class carried by every component element
    pub base_class: String,
    /// Prefix of autogenerated component ids
    pub id_prefix: String,
    /// Tag of elements created by the default renderer
    pub default_tag: String,
    /// `display` value applied when `visible` is false
    pub hidden_display: String,
    /// URL of the runtime's document
    pub document_url: String,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            base_class: "component".to_string(),
            id_prefix: "component".to_string(),
            default_tag: "div".to_string(),
            hidden_display: "none".to_string(),
            document_url: "about:blank".to_string(),
        }
    }
}

struct RuntimeInner {
    config: RuntimeConfig,
    document: RefCell<Document>,
    collector: ComponentCollector,
    registry: ComponentRegistry,
    event_loop: RefCell<EventLoop>,
    next_uid: Cell<u64>,
}

/// Shared handle to the component services
#[derive(Clone)]
pub struct Runtime {
    inner: Rc<RuntimeInner>,
}

impl Runtime {
    pub fn new(config: RuntimeConfig) -> Self {
        let document = Document::new(&config.document_url);
        Self {
            inner: Rc::new(RuntimeInner {
                config,
                document: RefCell::new(document),
                collector: ComponentCollector::new(),
                registry: ComponentRegistry::new(),
                event_loop: RefCell::new(EventLoop::new()),
                next_uid: Cell::new(0),
            }),
        }
    }

    pub fn with_defaults() -> Self {
        Self::new(RuntimeConfig::default())
    }

    pub fn config(&self) -> &RuntimeConfig {
        &self.inner.config
    }

    /// Borrow the document.
    ///
    /// Do not hold the guard across calls into components: they borrow it
    /// mutably.
    pub fn document(&self) -> Ref<'_, Document> {
        self.inner.document.borrow()
    }

    pub fn document_mut(&self) -> RefMut<'_, Document> {
        self.inner.document.borrow_mut()
    }

    pub fn collector(&self) -> &ComponentCollector {
        &self.inner.collector
    }

    pub fn registry(&self) -> &ComponentRegistry {
        &self.inner.registry
    }

    /// Queue a callback for the next flush
    pub fn queue_microtask(&self, task: impl FnOnce() + 'static) -> TaskId {
        self.inner.event_loop.borrow_mut().queue_microtask(Box::new(task))
    }

    pub fn cancel_microtask(&self, id: TaskId) -> bool {
        self.inner.event_loop.borrow_mut().cancel(id)
    }

    pub fn has_pending_work(&self) -> bool {
        self.inner.event_loop.borrow().has_pending_work()
    }

    /// Run queued microtasks, including ones queued while flushing, until
    /// the queue is empty. Returns how many ran.
    pub fn flush(&self) -> usize {
        let mut ran = 0;
        loop {
            // The borrow must end before the task runs: tasks queue more tasks.
            let next = self.inner.event_loop.borrow_mut().pop_microtask();
            let Some(task) = next else {
                break;
            };
            task();
            ran += 1;
        }
        if ran > 0 {
            tracing::trace!(tasks = ran, "flushed microtasks");
        }
        ran
    }

    /// Dispatch a DOM event with bubbling
    pub fn dispatch_event(&self, target: NodeId, event_type: &str) -> DomEvent {
        fos_dom::dispatch(&self.inner.document, target, event_type)
    }

    /// Next autogenerated component id not held by a live component
    pub fn next_id(&self) -> String {
        loop {
            let n = self.inner.next_uid.get();
            self.inner.next_uid.set(n + 1);
            let id = format!("{}{}", self.inner.config.id_prefix, n);
            if self.inner.collector.get_component(&id).is_none() {
                return id;
            }
        }
    }

    /// Dispose every live component and drop pending tasks.
    ///
    /// Live components keep the runtime alive through the collector, so
    /// this is the teardown point for a runtime that is done.
    pub fn shutdown(&self) {
        let live = self.inner.collector.components();
        tracing::debug!(live = live.len(), "shutting down runtime");
        for component in live {
            component.dispose();
        }
        self.inner.event_loop.borrow_mut().clear();
    }
}

impl Default for Runtime {
    fn default() -> Self {
        Self::with_defaults()
    }
}

impl fmt::Debug for Runtime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Runtime")
            .field("config", &self.inner.config)
            .field("live_components", &self.inner.collector.len())
            .field("event_loop", &self.inner.event_loop)
            .finish_non_exhaustive()
    }
}
