use std::sync::Arc;

use shared::domain::{ComponentId, HandlerId};

use crate::{
    error::ComponentError,
    event::{Event, EventBus, Handler},
};

/// How a behavior wants one of its events handled.
#[derive(Clone)]
pub enum HandlerSpec {
    /// A handler method on the behavior itself, dispatched through [`Behavior::invoke`].
    Method(&'static str),
    Callable(Handler),
}

/// A detachable bundle of event handlers grafted onto a component.
pub trait Behavior: Send + Sync {
    fn events(&self) -> Vec<(String, HandlerSpec)>;

    fn responds_to(&self, _method: &str) -> bool {
        false
    }

    fn invoke(&self, _method: &str, _event: &mut Event) {}
}

/// Binding state of one behavior: who owns it and which registrations it made.
pub struct Attachment {
    behavior: Arc<dyn Behavior>,
    owner: Option<ComponentId>,
    registrations: Vec<(String, HandlerId)>,
}

impl Attachment {
    pub fn new(behavior: Arc<dyn Behavior>) -> Self {
        Self {
            behavior,
            owner: None,
            registrations: Vec::new(),
        }
    }

    pub fn behavior(&self) -> &Arc<dyn Behavior> {
        &self.behavior
    }

    pub fn owner(&self) -> Option<ComponentId> {
        self.owner
    }

    pub fn is_attached(&self) -> bool {
        self.owner.is_some()
    }

    pub fn attach(&mut self, owner: ComponentId, bus: &mut EventBus) -> Result<(), ComponentError> {
        if let Some(current) = self.owner {
            return Err(ComponentError::AlreadyAttached(current.0));
        }

        // Resolve everything first so a bad spec leaves the bus untouched.
        let mut resolved = Vec::new();
        for (event, spec) in self.behavior.events() {
            let handler = match spec {
                HandlerSpec::Callable(handler) => handler,
                HandlerSpec::Method(method) => {
                    if !self.behavior.responds_to(method) {
                        return Err(ComponentError::UnknownMethod {
                            event,
                            method: method.to_string(),
                        });
                    }
                    let behavior = Arc::clone(&self.behavior);
                    Arc::new(move |event: &mut Event| behavior.invoke(method, event)) as Handler
                }
            };
            resolved.push((event, handler));
        }

        for (event, handler) in resolved {
            let id = bus.on(event.clone(), handler);
            self.registrations.push((event, id));
        }
        self.owner = Some(owner);
        tracing::trace!(owner = owner.0, handlers = self.registrations.len(), "behavior attached");
        Ok(())
    }

    /// Unregisters every handler added by [`Attachment::attach`]. Detaching an
    /// unattached behavior does nothing.
    pub fn detach(&mut self, bus: &mut EventBus) {
        let Some(owner) = self.owner.take() else {
            return;
        };
        for (event, id) in self.registrations.drain(..) {
            bus.off(&event, id);
        }
        tracing::trace!(owner = owner.0, "behavior detached");
    }
}

#[cfg(test)]
#[path = "tests/behavior_tests.rs"]
mod tests;
