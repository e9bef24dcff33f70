//! DOM Events
//!
//! Listener bookkeeping (direct and delegated) and bubbling dispatch.
//!
//! Handlers are plain closures. Dispatch first snapshots the listeners that
//! apply along the propagation path while the document is borrowed, then
//! releases the borrow and invokes them, so handlers are free to mutate the
//! document (including adding or removing listeners).

use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::fmt;
use std::rc::Rc;

use crate::{Document, NodeId, Selector};

/// Event handler closure
pub type Listener = Rc<dyn Fn(&DomEvent)>;

/// Handle identifying one registered listener
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ListenerId(u64);

/// Event delivered to listeners
#[derive(Debug)]
pub struct DomEvent {
    event_type: String,
    target: NodeId,
    current_target: Cell<NodeId>,
    delegate_target: Cell<Option<NodeId>>,
    propagation_stopped: Cell<bool>,
    default_prevented: Cell<bool>,
}

impl DomEvent {
    /// Create an event of `event_type` aimed at `target`
    pub fn new(event_type: &str, target: NodeId) -> Self {
        Self {
            event_type: event_type.to_string(),
            target,
            current_target: Cell::new(target),
            delegate_target: Cell::new(None),
            propagation_stopped: Cell::new(false),
            default_prevented: Cell::new(false),
        }
    }

    /// Event type (`"click"`, ...)
    pub fn event_type(&self) -> &str {
        &self.event_type
    }

    /// Node the event was dispatched to
    pub fn target(&self) -> NodeId {
        self.target
    }

    /// Node whose listener is currently running
    pub fn current_target(&self) -> NodeId {
        self.current_target.get()
    }

    /// For delegated listeners, the element that matched the selector
    pub fn delegate_target(&self) -> Option<NodeId> {
        self.delegate_target.get()
    }

    /// Stop bubbling after the current node
    pub fn stop_propagation(&self) {
        self.propagation_stopped.set(true);
    }

    /// Check if propagation was stopped
    pub fn is_propagation_stopped(&self) -> bool {
        self.propagation_stopped.get()
    }

    /// Mark the default action as prevented
    pub fn prevent_default(&self) {
        self.default_prevented.set(true);
    }

    /// Check if the default action was prevented
    pub fn is_default_prevented(&self) -> bool {
        self.default_prevented.get()
    }
}

struct Registration {
    node: NodeId,
    event_type: String,
    selector: Option<Selector>,
    handler: Listener,
}

impl fmt::Debug for Registration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Registration")
            .field("node", &self.node)
            .field("event_type", &self.event_type)
            .field("selector", &self.selector)
            .finish_non_exhaustive()
    }
}

/// Listener registry owned by a document
#[derive(Debug, Default)]
pub struct EventListeners {
    next_id: u64,
    registrations: HashMap<ListenerId, Registration>,
    /// Registration order per node, so dispatch is deterministic
    by_node: HashMap<NodeId, Vec<ListenerId>>,
}

impl EventListeners {
    pub fn new() -> Self {
        Self::default()
    }

    fn insert(&mut self, node: NodeId, event_type: &str, selector: Option<Selector>, handler: Listener) -> ListenerId {
        let id = ListenerId(self.next_id);
        self.next_id += 1;
        self.registrations.insert(
            id,
            Registration {
                node,
                event_type: event_type.to_string(),
                selector,
                handler,
            },
        );
        self.by_node.entry(node).or_default().push(id);
        id
    }

    /// Listen for `event_type` on `node`
    pub fn add(&mut self, node: NodeId, event_type: &str, handler: Listener) -> ListenerId {
        self.insert(node, event_type, None, handler)
    }

    /// Listen on `root` for events whose target matches `selector` below it
    pub fn add_delegated(
        &mut self,
        root: NodeId,
        event_type: &str,
        selector: Selector,
        handler: Listener,
    ) -> ListenerId {
        self.insert(root, event_type, Some(selector), handler)
    }

    /// Remove a listener; returns whether it was registered
    pub fn remove(&mut self, id: ListenerId) -> bool {
        let Some(reg) = self.registrations.remove(&id) else {
            return false;
        };
        if let Some(ids) = self.by_node.get_mut(&reg.node) {
            ids.retain(|other| *other != id);
            if ids.is_empty() {
                self.by_node.remove(&reg.node);
            }
        }
        true
    }

    /// Remove every listener registered on `node`
    pub fn remove_all_for(&mut self, node: NodeId) -> usize {
        let ids = self.by_node.remove(&node).unwrap_or_default();
        for id in &ids {
            self.registrations.remove(id);
        }
        ids.len()
    }

    /// Check if a listener is still registered
    pub fn is_active(&self, id: ListenerId) -> bool {
        self.registrations.contains_key(&id)
    }

    /// Number of listeners registered on `node`
    pub fn count_for(&self, node: NodeId) -> usize {
        self.by_node.get(&node).map_or(0, Vec::len)
    }

    /// Total number of listeners
    pub fn len(&self) -> usize {
        self.registrations.len()
    }

    /// Check if no listener is registered
    pub fn is_empty(&self) -> bool {
        self.registrations.is_empty()
    }
}

/// One handler invocation planned by dispatch
struct PlannedCall {
    id: ListenerId,
    current: NodeId,
    delegate: Option<NodeId>,
    handler: Listener,
}

impl Document {
    fn plan_dispatch(&self, target: NodeId, event_type: &str) -> Vec<PlannedCall> {
        let tree = self.tree();
        let listeners = self.listeners();
        let path: Vec<NodeId> = std::iter::once(target).chain(tree.ancestors(target)).collect();

        let mut plan = Vec::new();
        for &current in &path {
            let Some(ids) = listeners.by_node.get(&current) else {
                continue;
            };
            for &id in ids {
                let reg = &listeners.registrations[&id];
                if reg.event_type != event_type {
                    continue;
                }
                let delegate = match &reg.selector {
                    None => None,
                    Some(selector) => {
                        // Closest match strictly below the delegating node.
                        let hit = path
                            .iter()
                            .take_while(|&&n| n != current)
                            .copied()
                            .find(|&n| selector.matches_within(tree, n, None));
                        match hit {
                            Some(n) => Some(n),
                            None => continue,
                        }
                    }
                };
                plan.push(PlannedCall {
                    id,
                    current,
                    delegate,
                    handler: Rc::clone(&reg.handler),
                });
            }
        }
        plan
    }
}

/// Dispatch `event_type` at `target`, bubbling to the document root.
///
/// The document is only borrowed while planning and between calls, never
/// while a handler runs.
pub fn dispatch(document: &RefCell<Document>, target: NodeId, event_type: &str) -> DomEvent {
    let event = DomEvent::new(event_type, target);
    let plan = document.borrow().plan_dispatch(target, event_type);
    tracing::trace!(?target, event = event_type, listeners = plan.len(), "dispatching event");

    let mut stopped_after: Option<NodeId> = None;
    for call in plan {
        if let Some(node) = stopped_after {
            if node != call.current {
                break;
            }
        }
        if !document.borrow().listeners().is_active(call.id) {
            continue;
        }
        event.current_target.set(call.current);
        event.delegate_target.set(call.delegate);
        (call.handler)(&event);
        if event.is_propagation_stopped() && stopped_after.is_none() {
            stopped_after = Some(call.current);
        }
    }
    event.delegate_target.set(None);
    event
}

#[cfg(test)]
mod tests {
    use super::*;

    fn recorder() -> (Rc<RefCell<Vec<String>>>, impl Fn(&str) -> Listener) {
        let log = Rc::new(RefCell::new(Vec::new()));
        let make = {
            let log = Rc::clone(&log);
            move |name: &str| -> Listener {
                let log = Rc::clone(&log);
                let name = name.to_string();
                Rc::new(move |_ev: &DomEvent| log.borrow_mut().push(name.clone()))
            }
        };
        (log, make)
    }

    #[test]
    fn test_add_remove() {
        let mut listeners = EventListeners::new();
        let node = NodeId(3);
        let a = listeners.add(node, "click", Rc::new(|_: &DomEvent| {}));
        let b = listeners.add(node, "click", Rc::new(|_: &DomEvent| {}));
        assert_eq!(listeners.count_for(node), 2);

        assert!(listeners.remove(a));
        assert!(!listeners.remove(a));
        assert!(listeners.is_active(b));
        assert_eq!(listeners.remove_all_for(node), 1);
        assert!(listeners.is_empty());
    }

    #[test]
    fn test_bubbling_order() {
        let doc = RefCell::new(Document::new("about:blank"));
        let (log, make) = recorder();
        let (outer, inner) = {
            let mut d = doc.borrow_mut();
            let outer = d.create_element("div");
            let inner = d.create_element("span");
            let body = d.body();
            d.tree_mut().append_child(body, outer).unwrap();
            d.tree_mut().append_child(outer, inner).unwrap();
            d.add_listener(outer, "click", make("outer"));
            d.add_listener(inner, "click", make("inner"));
            d.add_listener(inner, "keyup", make("keyup"));
            (outer, inner)
        };

        dispatch(&doc, inner, "click");
        assert_eq!(*log.borrow(), ["inner", "outer"]);

        log.borrow_mut().clear();
        dispatch(&doc, outer, "click");
        assert_eq!(*log.borrow(), ["outer"]);
    }

    #[test]
    fn test_stop_propagation() {
        let doc = RefCell::new(Document::new("about:blank"));
        let (log, make) = recorder();
        let inner = {
            let mut d = doc.borrow_mut();
            let outer = d.create_element("div");
            let inner = d.create_element("span");
            d.tree_mut().append_child(outer, inner).unwrap();
            d.add_listener(outer, "click", make("outer"));
            d.add_listener(inner, "click", Rc::new(|ev: &DomEvent| ev.stop_propagation()));
            d.add_listener(inner, "click", make("inner-2"));
            inner
        };

        let event = dispatch(&doc, inner, "click");
        assert!(event.is_propagation_stopped());
        assert_eq!(*log.borrow(), ["inner-2"]);
    }

    #[test]
    fn test_delegated_listener() {
        let doc = RefCell::new(Document::new("about:blank"));
        let seen = Rc::new(Cell::new(None));
        let (root, button, label, other) = {
            let mut d = doc.borrow_mut();
            let root = d.to_element("<div><button class='btn'><b>go</b></button><p>x</p></div>").unwrap();
            let button = d.tree().children(root)[0];
            let label = d.tree().children(button)[0];
            let other = d.tree().children(root)[1];
            let seen = Rc::clone(&seen);
            d.add_delegated_listener(
                root,
                "click",
                ".btn",
                Rc::new(move |ev: &DomEvent| seen.set(ev.delegate_target())),
            )
            .unwrap();
            (root, button, label, other)
        };

        dispatch(&doc, label, "click");
        assert_eq!(seen.take(), Some(button));

        dispatch(&doc, other, "click");
        assert_eq!(seen.take(), None);

        dispatch(&doc, root, "click");
        assert_eq!(seen.take(), None);
    }

    #[test]
    fn test_removed_during_dispatch() {
        let doc = Rc::new(RefCell::new(Document::new("about:blank")));
        let (log, make) = recorder();
        let node = doc.borrow_mut().create_element("div");
        let victim: Rc<Cell<Option<ListenerId>>> = Rc::new(Cell::new(None));
        let remover = {
            let doc = Rc::clone(&doc);
            let victim = Rc::clone(&victim);
            Rc::new(move |_: &DomEvent| {
                if let Some(id) = victim.get() {
                    doc.borrow_mut().remove_listener(id);
                }
            })
        };
        doc.borrow_mut().add_listener(node, "click", remover);
        let later = doc.borrow_mut().add_listener(node, "click", make("later"));
        victim.set(Some(later));

        dispatch(&doc, node, "click");
        assert!(log.borrow().is_empty());
        assert!(!doc.borrow().listeners().is_active(later));
    }
}
