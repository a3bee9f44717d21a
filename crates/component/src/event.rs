use std::{collections::HashMap, fmt, sync::Arc};

use serde_json::Value;
use shared::domain::{ActionInfo, ComponentId, HandlerId};

pub type Handler = Arc<dyn Fn(&mut Event) + Send + Sync>;

/// Payload handed to every handler of a triggered event.
///
/// `is_valid` is the veto flag read back by `beforeAction` style triggers,
/// `result` is the rewritable payload of `afterAction` style triggers.
#[derive(Debug, Clone)]
pub struct Event {
    pub name: String,
    pub sender: Option<ComponentId>,
    pub handled: bool,
    pub is_valid: bool,
    pub action: Option<ActionInfo>,
    pub result: Option<Value>,
    pub data: Value,
}

impl Default for Event {
    fn default() -> Self {
        Self {
            name: String::new(),
            sender: None,
            handled: false,
            is_valid: true,
            action: None,
            result: None,
            data: Value::Null,
        }
    }
}

impl Event {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn for_action(action: ActionInfo) -> Self {
        Self {
            action: Some(action),
            ..Self::default()
        }
    }

    pub fn with_result(mut self, result: Option<Value>) -> Self {
        self.result = result;
        self
    }

    pub fn with_data(mut self, data: Value) -> Self {
        self.data = data;
        self
    }
}

/// Observer lists keyed by event name.
#[derive(Default, Clone)]
pub struct EventBus {
    next_id: u64,
    handlers: HashMap<String, Vec<(HandlerId, Handler)>>,
}

impl EventBus {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a handler; the returned id is the only way to remove it again.
    pub fn on(&mut self, name: impl Into<String>, handler: Handler) -> HandlerId {
        let id = self.allocate_id();
        self.handlers
            .entry(name.into())
            .or_default()
            .push((id, handler));
        id
    }

    pub fn prepend(&mut self, name: impl Into<String>, handler: Handler) -> HandlerId {
        let id = self.allocate_id();
        self.handlers
            .entry(name.into())
            .or_default()
            .insert(0, (id, handler));
        id
    }

    pub fn off(&mut self, name: &str, id: HandlerId) -> bool {
        let Some(list) = self.handlers.get_mut(name) else {
            return false;
        };
        let before = list.len();
        list.retain(|(registered, _)| *registered != id);
        let removed = list.len() < before;
        if list.is_empty() {
            self.handlers.remove(name);
        }
        removed
    }

    pub fn off_all(&mut self, name: &str) -> bool {
        self.handlers.remove(name).is_some()
    }

    pub fn has_handlers(&self, name: &str) -> bool {
        self.handler_count(name) > 0
    }

    pub fn handler_count(&self, name: &str) -> usize {
        self.handlers.get(name).map_or(0, Vec::len)
    }

    pub fn event_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.handlers.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    /// Calls the handlers registered for `name` in order, stopping at the
    /// first one that marks the event handled.
    pub fn trigger(&self, name: &str, event: &mut Event) {
        event.name = name.to_string();
        event.handled = false;
        let Some(list) = self.handlers.get(name) else {
            return;
        };
        for (_, handler) in list {
            handler(event);
            if event.handled {
                break;
            }
        }
    }

    fn allocate_id(&mut self) -> HandlerId {
        self.next_id += 1;
        HandlerId(self.next_id)
    }
}

impl fmt::Debug for EventBus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut map = f.debug_map();
        for name in self.event_names() {
            map.entry(&name, &self.handler_count(name));
        }
        map.finish()
    }
}

#[cfg(test)]
#[path = "tests/event_tests.rs"]
mod tests;
