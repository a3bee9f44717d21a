use std::{fmt, sync::Arc};

use serde_json::Value;
use shared::domain::ActionInfo;

use crate::{controller::Controller, error::DispatchError, params::Params};

/// What a dispatch produced; `None` when a hook vetoed the action.
pub type ActionOutput = Option<Value>;

pub type InlineHandler =
    Arc<dyn Fn(&mut Controller<'_>, &Params) -> Result<Value, DispatchError> + Send + Sync>;

/// Builds a fresh standalone action for the given action id.
pub type ActionFactory = Arc<dyn Fn(&str) -> Box<dyn Action> + Send + Sync>;

const METHOD_PREFIX: &str = "action";

/// A standalone action: its own type, registered in a controller's action map.
pub trait Action: Send + Sync {
    fn run(&self, controller: &mut Controller<'_>, params: &Params) -> Result<Value, DispatchError>;

    /// Returning `false` skips `run` and the dispatch yields no result.
    fn before_run(&self, _controller: &Controller<'_>) -> bool {
        true
    }

    fn after_run(&self, _controller: &Controller<'_>) {}

    fn type_name(&self) -> &'static str {
        std::any::type_name::<Self>()
    }
}

pub enum ActionTarget {
    Inline {
        method: String,
        handler: InlineHandler,
    },
    Standalone(Box<dyn Action>),
}

/// An action resolved for one `run_action` call.
pub struct ResolvedAction {
    info: ActionInfo,
    target: ActionTarget,
}

impl ResolvedAction {
    pub(crate) fn new(info: ActionInfo, target: ActionTarget) -> Self {
        Self { info, target }
    }

    pub fn id(&self) -> &str {
        &self.info.id
    }

    pub fn unique_id(&self) -> &str {
        &self.info.unique_id
    }

    pub fn info(&self) -> &ActionInfo {
        &self.info
    }

    pub fn target(&self) -> &ActionTarget {
        &self.target
    }

    /// Name of the controller method an inline action is bound to.
    pub fn method(&self) -> Option<&str> {
        match &self.target {
            ActionTarget::Inline { method, .. } => Some(method),
            ActionTarget::Standalone(_) => None,
        }
    }

    pub fn standalone_type(&self) -> Option<&'static str> {
        match &self.target {
            ActionTarget::Inline { .. } => None,
            ActionTarget::Standalone(action) => Some(action.type_name()),
        }
    }

    pub fn run_with_params(
        &self,
        controller: &mut Controller<'_>,
        params: &Params,
    ) -> Result<ActionOutput, DispatchError> {
        controller.bind_action_params(params);
        match &self.target {
            ActionTarget::Inline { handler, .. } => handler(controller, params).map(Some),
            ActionTarget::Standalone(action) => {
                if !action.before_run(controller) {
                    tracing::debug!(action = %self.info.unique_id, "action skipped by before_run");
                    return Ok(None);
                }
                let result = action.run(controller, params)?;
                action.after_run(controller);
                Ok(Some(result))
            }
        }
    }
}

impl fmt::Debug for ResolvedAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let target = match &self.target {
            ActionTarget::Inline { method, .. } => format!("inline {method}"),
            ActionTarget::Standalone(action) => format!("standalone {}", action.type_name()),
        };
        f.debug_struct("ResolvedAction")
            .field("unique_id", &self.info.unique_id)
            .field("target", &target)
            .finish()
    }
}

/// Lowercase alphanumerics, `-` and `_`; no `--`, no leading or trailing `-`.
pub fn is_valid_action_id(id: &str) -> bool {
    !id.is_empty()
        && id
            .bytes()
            .all(|b| b.is_ascii_lowercase() || b.is_ascii_digit() || b == b'-' || b == b'_')
        && !id.contains("--")
        && !id.starts_with('-')
        && !id.ends_with('-')
}

/// `view-post` becomes `actionViewPost`.
pub fn inline_method_name(id: &str) -> String {
    let mut name = String::from(METHOD_PREFIX);
    for word in id.split('-') {
        let mut chars = word.chars();
        if let Some(first) = chars.next() {
            name.extend(first.to_uppercase());
            name.push_str(chars.as_str());
        }
    }
    name
}

/// Inverse of [`inline_method_name`], used when listing routes.
pub fn action_id_from_method(method: &str) -> Option<String> {
    let rest = method.strip_prefix(METHOD_PREFIX)?;
    if !rest.starts_with(|c: char| c.is_ascii_uppercase()) {
        return None;
    }
    let mut id = String::with_capacity(rest.len() + 4);
    for (index, c) in rest.chars().enumerate() {
        if c.is_ascii_uppercase() {
            if index > 0 {
                id.push('-');
            }
            id.push(c.to_ascii_lowercase());
        } else {
            id.push(c);
        }
    }
    Some(id)
}

#[cfg(test)]
#[path = "tests/action_tests.rs"]
mod tests;
