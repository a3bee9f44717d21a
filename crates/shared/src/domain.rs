use std::sync::atomic::{AtomicU64, Ordering};

use serde::{Deserialize, Serialize};

macro_rules! id_newtype {
    ($name:ident) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        pub struct $name(pub u64);
    };
}

id_newtype!(ComponentId);
id_newtype!(HandlerId);

static NEXT_COMPONENT_ID: AtomicU64 = AtomicU64::new(1);

impl ComponentId {
    /// Allocates a process-unique id for a new event owner.
    pub fn next() -> Self {
        Self(NEXT_COMPONENT_ID.fetch_add(1, Ordering::Relaxed))
    }
}

/// Identity of a dispatched action as seen by hooks and event handlers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActionInfo {
    pub id: String,
    pub unique_id: String,
    pub controller_id: String,
}

impl ActionInfo {
    pub fn new(
        id: impl Into<String>,
        unique_id: impl Into<String>,
        controller_id: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            unique_id: unique_id.into(),
            controller_id: controller_id.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn component_ids_are_unique() {
        let a = ComponentId::next();
        let b = ComponentId::next();
        assert_ne!(a, b);
        assert!(b > a);
    }
}
