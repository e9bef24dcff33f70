//! Edge case tests for fos-component
//!
//! Contract violations, disposal races with pending batches, id handling
//! and parent resolution.

use std::cell::Cell;
use std::rc::Rc;

use fos_component::{
    AttrChanges, AttrDef, AttrError, AttrValue, Component, ComponentError, ComponentEvent,
    ComponentType, Config, EventMap, LifecycleKind, Phase, Runtime, RuntimeConfig,
};
use fos_dom::DomError;

fn counter() -> Rc<Cell<u32>> {
    Rc::new(Cell::new(0))
}

fn bump(count: &Rc<Cell<u32>>) {
    count.set(count.get() + 1);
}

/// Type declaring `foo` whose sync handler counts calls
fn counting_type(count: &Rc<Cell<u32>>) -> Rc<ComponentType> {
    let count = Rc::clone(count);
    ComponentType::builder("Counting")
        .attr("foo", AttrDef::new(0))
        .sync("foo", move |_, _| bump(&count))
        .build()
}

// ============================================================================
// CONSTRUCTION AND IDS
// ============================================================================

#[test]
fn test_autogenerated_ids_are_unique() {
    let runtime = Runtime::with_defaults();
    let base = ComponentType::base();
    let taken = Component::new(&runtime, &base, Config::new().with("id", "component1")).unwrap();
    let a = Component::new(&runtime, &base, Config::new()).unwrap();
    let b = Component::new(&runtime, &base, Config::new().with("id", "")).unwrap();

    assert_eq!(a.id(), "component0");
    assert_eq!(b.id(), "component2");
    assert_ne!(taken.id(), b.id());
    assert_eq!(runtime.collector().len(), 3);
}

#[test]
fn test_duplicate_live_id_rejected() {
    let runtime = Runtime::with_defaults();
    let base = ComponentType::base();
    let first = Component::new(&runtime, &base, Config::new().with("id", "dup")).unwrap();
    assert_eq!(
        Component::new(&runtime, &base, Config::new().with("id", "dup")).unwrap_err(),
        ComponentError::DuplicateId("dup".into())
    );

    first.dispose();
    let second = Component::new(&runtime, &base, Config::new().with("id", "dup")).unwrap();
    assert!(runtime.collector().get_component("dup").unwrap().ptr_eq(&second));

    // Disposing the old instance again must not unregister the new one.
    first.dispose();
    assert!(runtime.collector().get_component("dup").is_some());
}

#[test]
fn test_id_change_collision() {
    let runtime = Runtime::with_defaults();
    let base = ComponentType::base();
    let _a = Component::new(&runtime, &base, Config::new().with("id", "a")).unwrap();
    let b = Component::new(&runtime, &base, Config::new().with("id", "b")).unwrap();

    assert_eq!(b.set_attr("id", "a"), Err(ComponentError::DuplicateId("a".into())));
    assert_eq!(b.id(), "b");
    assert_eq!(
        b.set_attr("id", 5),
        Err(ComponentError::Attr(AttrError::Validation("id".into())))
    );
}

#[test]
fn test_id_change_updates_element() {
    let runtime = Runtime::with_defaults();
    let component = Component::new(
        &runtime,
        &ComponentType::base(),
        Config::new().with("id", "old").with("element", "<section></section>"),
    )
    .unwrap();
    let element = component.element().unwrap();
    assert_eq!(runtime.document().id_of(element), Some("old"));

    component.set_attr("id", "new").unwrap();
    assert_eq!(runtime.document().id_of(element), Some("new"));
    assert_eq!(component.get_attr("id"), Some(AttrValue::from("new")));
}

#[test]
fn test_undeclared_config_keys_ignored() {
    let runtime = Runtime::with_defaults();
    let component = Component::new(
        &runtime,
        &ComponentType::base(),
        Config::new().with("nonsense", 1),
    )
    .unwrap();
    assert_eq!(component.get_attr("nonsense"), None);
    assert_eq!(
        component.set_attr("nonsense", 2),
        Err(ComponentError::Attr(AttrError::Undeclared("nonsense".into())))
    );
}

#[test]
fn test_config_validation() {
    let runtime = Runtime::with_defaults();
    let ty = ComponentType::builder("Sized")
        .attr("size", AttrDef::new(1).validator(|v| v.as_int().is_some_and(|n| n > 0)))
        .attr("key", AttrDef::new(AttrValue::Null).write_once())
        .build();

    assert_eq!(
        Component::new(&runtime, &ty, Config::new().with("size", -1)).unwrap_err(),
        ComponentError::Attr(AttrError::Validation("size".into()))
    );
    assert!(runtime.collector().is_empty());

    let component = Component::new(&runtime, &ty, Config::new().with("key", "k")).unwrap();
    assert_eq!(component.get_attr("key"), Some(AttrValue::from("k")));
    assert_eq!(
        component.set_attr("key", "other"),
        Err(ComponentError::Attr(AttrError::WriteOnce("key".into())))
    );
}

#[test]
fn test_element_from_missing_selector() {
    let runtime = Runtime::with_defaults();
    assert_eq!(
        Component::new(
            &runtime,
            &ComponentType::base(),
            Config::new().with("element", "#nowhere"),
        )
        .unwrap_err(),
        ComponentError::Dom(DomError::SelectorNotFound("#nowhere".into()))
    );
}

#[test]
fn test_duplicate_id_leaves_no_parsed_element() {
    let runtime = Runtime::with_defaults();
    let base = ComponentType::base();
    let _first = Component::new(&runtime, &base, Config::new().with("id", "dup")).unwrap();
    let nodes = runtime.document().tree().len();

    assert_eq!(
        Component::new(
            &runtime,
            &base,
            Config::new().with("id", "dup").with("element", "<section><p>x</p></section>"),
        )
        .unwrap_err(),
        ComponentError::DuplicateId("dup".into())
    );
    assert_eq!(runtime.document().tree().len(), nodes);
}

#[test]
fn test_from_name_unknown() {
    let runtime = Runtime::with_defaults();
    assert_eq!(
        Component::from_name(&runtime, "Nope", Config::new()).unwrap_err(),
        ComponentError::UnknownComponentType("Nope".into())
    );
}

#[test]
fn test_created_hooks_run_ancestor_first() {
    let runtime = Runtime::with_defaults();
    let order = Rc::new(std::cell::RefCell::new(Vec::new()));
    let parent = {
        let order = Rc::clone(&order);
        ComponentType::builder("Parent")
            .on_created(move |_| order.borrow_mut().push("parent"))
            .build()
    };
    let child = {
        let order = Rc::clone(&order);
        ComponentType::builder("Child")
            .extends(&parent)
            .on_created(move |_| order.borrow_mut().push("child"))
            .build()
    };
    Component::new(&runtime, &child, Config::new()).unwrap();
    assert_eq!(*order.borrow(), ["parent", "child"]);
}

// ============================================================================
// ELEMENT AND PARENT
// ============================================================================

#[test]
fn test_set_element_after_render_fails() {
    let runtime = Runtime::with_defaults();
    let component = Component::new(&runtime, &ComponentType::base(), Config::new()).unwrap();
    let spare = runtime.document_mut().create_element("div");
    component.render(None, None).unwrap();
    assert_eq!(
        component.set_element(spare),
        Err(ComponentError::AlreadyRendered(component.id()))
    );
}

#[test]
fn test_set_element_before_render() {
    let runtime = Runtime::with_defaults();
    let component = Component::new(&runtime, &ComponentType::base(), Config::new()).unwrap();
    component.set_element_from("<article></article>").unwrap();
    let element = component.element().unwrap();
    component.render(None, None).unwrap();

    assert_eq!(component.element(), Some(element));
    let document = runtime.document();
    assert_eq!(document.tree().element(element).unwrap().tag, "article");
    assert!(document.class_list(element).unwrap().contains("component"));
}

#[test]
fn test_type_default_parent() {
    let runtime = Runtime::with_defaults();
    let sidebar = {
        let mut document = runtime.document_mut();
        let body = document.body();
        let sidebar = document.to_element(r#"<aside class="sidebar"></aside>"#).unwrap();
        document.insert(body, sidebar, None).unwrap();
        sidebar
    };
    let ty = ComponentType::builder("Widget").default_parent(".sidebar").build();
    let component = Component::new(&runtime, &ty, Config::new()).unwrap();
    component.render(None, None).unwrap();
    assert_eq!(
        runtime.document().tree().parent(component.element().unwrap()),
        Some(sidebar)
    );
}

#[test]
fn test_missing_type_default_parent_falls_back_to_body() {
    let runtime = Runtime::with_defaults();
    let ty = ComponentType::builder("Widget").default_parent("#missing").build();
    let component = Component::new(&runtime, &ty, Config::new()).unwrap();
    component.render(None, None).unwrap();
    let document = runtime.document();
    assert_eq!(
        document.tree().parent(component.element().unwrap()),
        Some(document.body())
    );
}

#[test]
fn test_component_default_parent_wins() {
    let runtime = Runtime::with_defaults();
    let host = {
        let mut document = runtime.document_mut();
        let body = document.body();
        let host = document.create_element("div");
        document.insert(body, host, None).unwrap();
        host
    };
    let ty = ComponentType::builder("Widget").default_parent("body").build();
    let component = Component::new(&runtime, &ty, Config::new()).unwrap();
    component.set_default_parent(Some(host));
    component.render(None, None).unwrap();
    component.detach();
    component.attach(None, None).unwrap();
    assert_eq!(
        runtime.document().tree().parent(component.element().unwrap()),
        Some(host)
    );
}

#[test]
fn test_render_at_invalid_sibling_has_no_side_effects() {
    let runtime = Runtime::with_defaults();
    let synced = counter();
    let component = Component::new(
        &runtime,
        &counting_type(&synced),
        Config::new()
            .with("events", EventMap::new().on_fn("tap", |_| {}))
            .with("element_classes", "wide"),
    )
    .unwrap();
    let body = runtime.document().body();
    let stray = runtime.document_mut().create_element("p");

    assert_eq!(
        component.render(Some(body), Some(stray)),
        Err(ComponentError::Dom(DomError::InvalidSibling {
            parent: body,
            sibling: stray
        }))
    );
    assert_eq!(synced.get(), 0);
    assert_eq!(component.listener_count(), 0);
    assert!(component.element().is_none());
    assert_eq!(component.phase(), Phase::Unrendered);

    component.render(Some(body), None).unwrap();
    assert_eq!(synced.get(), 1);
    assert_eq!(component.listener_count(), 1);
}

#[test]
fn test_render_into_own_descendant_has_no_side_effects() {
    let runtime = Runtime::with_defaults();
    let synced = counter();
    let component = Component::new(
        &runtime,
        &counting_type(&synced),
        Config::new().with("element", r#"<div><span class="slot"></span></div>"#),
    )
    .unwrap();
    let element = component.element().unwrap();
    let slot = {
        let document = runtime.document();
        document.query_selector(element, ".slot").unwrap().unwrap()
    };

    assert_eq!(
        component.render(Some(slot), None),
        Err(ComponentError::Dom(DomError::HierarchyRequest {
            parent: slot,
            child: element
        }))
    );
    assert_eq!(synced.get(), 0);
    assert!(!component.was_rendered());

    component.render(None, None).unwrap();
    assert_eq!(synced.get(), 1);
}

#[test]
fn test_dispose_from_attached_hook_skips_rendered_hooks() {
    let runtime = Runtime::with_defaults();
    let rendered = counter();
    let ty = {
        let rendered = Rc::clone(&rendered);
        ComponentType::builder("SelfDisposing")
            .on_attached(|component| component.dispose())
            .on_rendered(move |_, _| bump(&rendered))
            .build()
    };
    let component = Component::new(&runtime, &ty, Config::new()).unwrap();

    assert_eq!(component.render(None, None), Ok(()));
    assert!(component.is_disposed());
    assert_eq!(component.phase(), Phase::Disposed);
    assert_eq!(rendered.get(), 0);
    assert!(runtime.collector().get_component(&component.id()).is_none());
}

#[test]
fn test_dispose_from_render_event_skips_attach() {
    let runtime = Runtime::with_defaults();
    let attached = counter();
    let ty = {
        let attached = Rc::clone(&attached);
        ComponentType::builder("Fragile")
            .on_attached(move |_| bump(&attached))
            .build()
    };
    let component = Component::new(&runtime, &ty, Config::new()).unwrap();
    component.listen(LifecycleKind::Render, |component, _| component.dispose());

    component.render(None, None).unwrap();
    assert!(component.is_disposed());
    assert_eq!(attached.get(), 0);
}

#[test]
fn test_decorate_detached_element_is_not_attached() {
    let runtime = Runtime::with_defaults();
    let attached = counter();
    let ty = {
        let attached = Rc::clone(&attached);
        ComponentType::builder("Loose")
            .on_attached(move |_| bump(&attached))
            .build()
    };
    let component = Component::new(&runtime, &ty, Config::new()).unwrap();
    component.decorate(None).unwrap();

    assert!(component.element().is_some());
    assert!(!component.is_attached());
    assert_eq!(component.phase(), Phase::Detached);
    assert_eq!(attached.get(), 0);
    assert_eq!(
        component.decorate(None),
        Err(ComponentError::AlreadyDecorated(component.id()))
    );

    component.attach(None, None).unwrap();
    assert_eq!(attached.get(), 1);
}

// ============================================================================
// BATCHING AND DISPOSAL
// ============================================================================

#[test]
fn test_same_value_write_schedules_nothing() {
    let runtime = Runtime::with_defaults();
    let count = counter();
    let component = Component::new(&runtime, &counting_type(&count), Config::new()).unwrap();
    component.render(None, None).unwrap();

    component.set_attr("foo", 0).unwrap();
    assert!(!runtime.has_pending_work());
    assert_eq!(runtime.flush(), 0);
    assert_eq!(count.get(), 1);
}

#[test]
fn test_batch_returning_to_original_still_reports() {
    let runtime = Runtime::with_defaults();
    let count = counter();
    let component = Component::new(&runtime, &counting_type(&count), Config::new()).unwrap();
    component.render(None, None).unwrap();
    let seen: Rc<std::cell::RefCell<Vec<AttrChanges>>> = Rc::default();
    {
        let seen = Rc::clone(&seen);
        component.listen(LifecycleKind::AttrsChanged, move |_, event| {
            if let ComponentEvent::AttrsChanged(changes) = event {
                seen.borrow_mut().push(changes.clone());
            }
        });
    }

    component.set_attr("foo", 1).unwrap();
    component.set_attr("foo", 0).unwrap();
    runtime.flush();

    let seen = seen.borrow();
    assert_eq!(seen.len(), 1);
    assert_eq!(seen[0]["foo"].prev_val, AttrValue::Int(0));
    assert_eq!(seen[0]["foo"].new_val, AttrValue::Int(0));
    assert_eq!(count.get(), 2);
}

#[test]
fn test_separate_turns_make_separate_batches() {
    let runtime = Runtime::with_defaults();
    let count = counter();
    let component = Component::new(&runtime, &counting_type(&count), Config::new()).unwrap();
    component.render(None, None).unwrap();

    component.set_attr("foo", 1).unwrap();
    runtime.flush();
    component.set_attr("foo", 2).unwrap();
    runtime.flush();
    assert_eq!(count.get(), 3);
}

#[test]
fn test_dispose_cancels_pending_batch() {
    let runtime = Runtime::with_defaults();
    let count = counter();
    let component = Component::new(&runtime, &counting_type(&count), Config::new()).unwrap();
    component.render(None, None).unwrap();

    component.set_attr("foo", 7).unwrap();
    assert!(runtime.has_pending_work());
    component.dispose();
    assert!(!runtime.has_pending_work());
    runtime.flush();
    assert_eq!(count.get(), 1);
}

#[test]
fn test_dispose_from_sync_handler_stops_flush() {
    let runtime = Runtime::with_defaults();
    let synced = counter();
    let ty = ComponentType::builder("SelfDestruct")
        .attr("armed", AttrDef::new(false))
        .sync("armed", |component, value| {
            if value.as_bool() == Some(true) {
                component.dispose();
            }
        })
        .build();
    let component = Component::new(&runtime, &ty, Config::new()).unwrap();
    component.render(None, None).unwrap();
    {
        let synced = Rc::clone(&synced);
        component.listen(LifecycleKind::AttrsSynced, move |_, _| bump(&synced));
    }

    component.set_attr("armed", true).unwrap();
    runtime.flush();
    assert!(component.is_disposed());
    assert_eq!(synced.get(), 0);
    assert!(runtime.collector().is_empty());
}

#[test]
fn test_writes_during_flush_join_next_batch() {
    let runtime = Runtime::with_defaults();
    let count = counter();
    let ty = {
        let count = Rc::clone(&count);
        ComponentType::builder("Chained")
            .attr("foo", AttrDef::new(0))
            .attr("bar", AttrDef::new(0))
            .sync("foo", |component, value| {
                let next = value.as_int().unwrap_or(0) * 10;
                component.set_attr("bar", next).unwrap();
            })
            .sync("bar", move |_, _| bump(&count))
            .build()
    };
    let component = Component::new(&runtime, &ty, Config::new()).unwrap();
    component.render(None, None).unwrap();
    assert_eq!(count.get(), 1);

    component.set_attr("foo", 2).unwrap();
    assert_eq!(runtime.flush(), 2);
    assert_eq!(component.get_attr("bar"), Some(AttrValue::Int(20)));
    assert_eq!(count.get(), 2);
}

#[test]
fn test_disposed_component_rejects_calls() {
    let runtime = Runtime::with_defaults();
    let component = Component::new(&runtime, &ComponentType::base(), Config::new()).unwrap();
    component.dispose();
    let id = component.id();

    assert_eq!(component.render(None, None), Err(ComponentError::Disposed(id.clone())));
    assert_eq!(component.attach(None, None), Err(ComponentError::Disposed(id.clone())));
    assert!(matches!(
        component.add_sub_component(&ComponentType::base(), "child", None),
        Err(ComponentError::Disposed(_))
    ));
    assert!(matches!(
        component.on("click", |_| {}),
        Err(ComponentError::Disposed(_))
    ));
    component.detach();
}

#[test]
fn test_passthrough_requires_element() {
    let runtime = Runtime::with_defaults();
    let component = Component::new(&runtime, &ComponentType::base(), Config::new()).unwrap();
    assert!(matches!(
        component.on("click", |_| {}),
        Err(ComponentError::MissingElement(_))
    ));
    assert!(matches!(
        component.dispatch("click"),
        Err(ComponentError::MissingElement(_))
    ));
}

#[test]
fn test_unlisten() {
    let runtime = Runtime::with_defaults();
    let seen = counter();
    let component = Component::new(&runtime, &ComponentType::base(), Config::new()).unwrap();
    let subscription = {
        let seen = Rc::clone(&seen);
        component.listen(LifecycleKind::Render, move |_, _| bump(&seen))
    };
    assert!(component.unlisten(subscription));
    assert!(!component.unlisten(subscription));
    component.render(None, None).unwrap();
    assert_eq!(seen.get(), 0);
}

// ============================================================================
// EVENTS
// ============================================================================

#[test]
fn test_events_cleared_with_null() {
    let runtime = Runtime::with_defaults();
    let fired = counter();
    let component = {
        let fired = Rc::clone(&fired);
        Component::new(
            &runtime,
            &ComponentType::base(),
            Config::new().with("events", EventMap::new().on_fn("tap", move |_| bump(&fired))),
        )
        .unwrap()
    };
    component.render(None, None).unwrap();
    component.set_attr("events", AttrValue::Null).unwrap();
    runtime.flush();

    component.dispatch("tap").unwrap();
    assert_eq!(fired.get(), 0);
    assert_eq!(component.listener_count(), 0);
}

#[test]
fn test_invalid_delegation_selector_is_skipped() {
    let runtime = Runtime::with_defaults();
    let component = Component::new(
        &runtime,
        &ComponentType::base(),
        Config::new().with(
            "events",
            EventMap::new()
                .delegate_fn("click", "..", |_| {})
                .on_fn("focus", |_| {}),
        ),
    )
    .unwrap();
    component.render(None, None).unwrap();
    assert_eq!(component.listener_count(), 1);
}

#[test]
fn test_stop_propagation_inside_component() {
    let runtime = Runtime::with_defaults();
    let outer_hits = counter();
    let outer = {
        let outer_hits = Rc::clone(&outer_hits);
        Component::new(
            &runtime,
            &ComponentType::base(),
            Config::new().with("events", EventMap::new().on_fn("click", move |_| bump(&outer_hits))),
        )
        .unwrap()
    };
    outer.render(None, None).unwrap();
    let inner = Component::new(
        &runtime,
        &ComponentType::base(),
        Config::new().with(
            "events",
            EventMap::new().on_fn("click", |event| event.stop_propagation()),
        ),
    )
    .unwrap();
    inner.render(outer.element(), None).unwrap();

    let event = inner.dispatch("click").unwrap();
    assert!(event.is_propagation_stopped());
    assert_eq!(outer_hits.get(), 0);
}

// ============================================================================
// RUNTIME
// ============================================================================

#[test]
fn test_runtime_config_from_json() {
    let config: RuntimeConfig =
        serde_json::from_str(r#"{ "base_class": "ui", "hidden_display": "hidden" }"#).unwrap();
    let runtime = Runtime::new(config);
    let component = Component::new(
        &runtime,
        &ComponentType::base(),
        Config::new().with("visible", false),
    )
    .unwrap();
    component.render(None, None).unwrap();

    let element = component.element().unwrap();
    let document = runtime.document();
    assert_eq!(document.class_list(element).unwrap().tokens(), ["ui"]);
    assert_eq!(document.display(element), Some("hidden"));
    assert_eq!(document.tree().element(element).unwrap().tag, "div");
}

#[test]
fn test_dispose_sub_components_of_disposed_child() {
    let runtime = Runtime::with_defaults();
    let base = ComponentType::base();
    let parent = Component::new(&runtime, &base, Config::new()).unwrap();
    let child = parent.add_sub_component(&base, "child", None).unwrap();
    let grandchild = child.add_sub_component(&base, "grandchild", None).unwrap();

    child.dispose();
    assert!(grandchild.is_disposed());
    parent.dispose_sub_components(&["child"]);
    assert!(parent.sub_components().is_empty());
    parent.dispose();
    assert!(runtime.collector().is_empty());
}
