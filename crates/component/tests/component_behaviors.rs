use std::sync::{
    atomic::{AtomicUsize, Ordering},
    Arc,
};

use component::{Behavior, Component, Event, HandlerSpec};

struct Stamp {
    calls: Arc<AtomicUsize>,
}

impl Behavior for Stamp {
    fn events(&self) -> Vec<(String, HandlerSpec)> {
        let calls = Arc::clone(&self.calls);
        vec![(
            "afterAction".to_string(),
            HandlerSpec::Callable(Arc::new(move |event: &mut Event| {
                calls.fetch_add(1, Ordering::SeqCst);
                event.data = serde_json::json!("stamped");
            })),
        )]
    }
}

#[test]
fn named_behavior_replaces_previous_one() {
    let first = Arc::new(AtomicUsize::new(0));
    let second = Arc::new(AtomicUsize::new(0));
    let mut component = Component::new();

    component
        .attach_behavior("stamp", Arc::new(Stamp { calls: first.clone() }))
        .expect("attach first");
    component
        .attach_behavior("stamp", Arc::new(Stamp { calls: second.clone() }))
        .expect("attach second");

    let mut event = Event::new();
    component.trigger("afterAction", &mut event);

    assert_eq!(first.load(Ordering::SeqCst), 0);
    assert_eq!(second.load(Ordering::SeqCst), 1);
    assert_eq!(event.sender, Some(component.id()));
    assert_eq!(event.data, serde_json::json!("stamped"));
    assert_eq!(component.behavior_names().collect::<Vec<_>>(), vec!["stamp"]);
}

#[test]
fn detach_behavior_removes_its_handlers_only() {
    let calls = Arc::new(AtomicUsize::new(0));
    let mut component = Component::new();
    component.on("afterAction", Arc::new(|_: &mut Event| {}));
    component
        .attach_behavior("stamp", Arc::new(Stamp { calls: calls.clone() }))
        .expect("attach");
    assert_eq!(component.events().handler_count("afterAction"), 2);

    assert!(component.detach_behavior("stamp").is_some());
    assert!(component.detach_behavior("stamp").is_none());
    assert_eq!(component.events().handler_count("afterAction"), 1);

    component.trigger("afterAction", &mut Event::new());
    assert_eq!(calls.load(Ordering::SeqCst), 0);
}

#[test]
fn detach_behaviors_clears_everything_attached() {
    let mut component = Component::new();
    for name in ["a", "b"] {
        component
            .attach_behavior(name, Arc::new(Stamp { calls: Arc::default() }))
            .expect("attach");
    }
    component.detach_behaviors();
    assert!(!component.events().has_handlers("afterAction"));
    assert!(component.behavior("a").is_none());
}
