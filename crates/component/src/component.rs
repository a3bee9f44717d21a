use std::{fmt, sync::Arc};

use shared::domain::{ComponentId, HandlerId};

use crate::{
    behavior::{Attachment, Behavior},
    error::ComponentError,
    event::{Event, EventBus, Handler},
};

/// Event owner with named behaviors.
pub struct Component {
    id: ComponentId,
    events: EventBus,
    behaviors: Vec<(String, Attachment)>,
}

impl Default for Component {
    fn default() -> Self {
        Self::new()
    }
}

impl Component {
    pub fn new() -> Self {
        Self {
            id: ComponentId::next(),
            events: EventBus::new(),
            behaviors: Vec::new(),
        }
    }

    pub fn id(&self) -> ComponentId {
        self.id
    }

    pub fn events(&self) -> &EventBus {
        &self.events
    }

    pub fn on(&mut self, name: impl Into<String>, handler: Handler) -> HandlerId {
        self.events.on(name, handler)
    }

    pub fn off(&mut self, name: &str, id: HandlerId) -> bool {
        self.events.off(name, id)
    }

    pub fn trigger(&self, name: &str, event: &mut Event) {
        if event.sender.is_none() {
            event.sender = Some(self.id);
        }
        self.events.trigger(name, event);
    }

    /// Attaches `behavior` under `name`, detaching any behavior previously
    /// registered under the same name.
    pub fn attach_behavior(
        &mut self,
        name: impl Into<String>,
        behavior: Arc<dyn Behavior>,
    ) -> Result<(), ComponentError> {
        let name = name.into();
        self.detach_behavior(&name);

        let mut attachment = Attachment::new(behavior);
        attachment.attach(self.id, &mut self.events)?;
        self.behaviors.push((name, attachment));
        Ok(())
    }

    pub fn detach_behavior(&mut self, name: &str) -> Option<Arc<dyn Behavior>> {
        let index = self.behaviors.iter().position(|(key, _)| key == name)?;
        let (_, mut attachment) = self.behaviors.remove(index);
        attachment.detach(&mut self.events);
        Some(Arc::clone(attachment.behavior()))
    }

    pub fn detach_behaviors(&mut self) {
        for (_, mut attachment) in self.behaviors.drain(..) {
            attachment.detach(&mut self.events);
        }
    }

    pub fn behavior(&self, name: &str) -> Option<&Arc<dyn Behavior>> {
        self.behaviors
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, attachment)| attachment.behavior())
    }

    pub fn behavior_names(&self) -> impl Iterator<Item = &str> {
        self.behaviors.iter().map(|(name, _)| name.as_str())
    }
}

impl fmt::Debug for Component {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Component")
            .field("id", &self.id)
            .field("events", &self.events)
            .field("behaviors", &self.behavior_names().collect::<Vec<_>>())
            .finish()
    }
}
