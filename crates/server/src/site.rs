use std::{path::Path, sync::Arc};

use anyhow::Context;
use component::{Behavior, Event, Handler, HandlerSpec};
use mvc::{
    Action, Application, ApplicationConfig, Controller, ControllerDef, DispatchError, ModuleDef,
    Params, EVENT_AFTER_ACTION, EVENT_BEFORE_ACTION,
};
use serde_json::{json, Value};
use tracing::{debug, info, warn};

/// Loads the bootstrap file and builds the bundled application. A relative
/// `base_path` is taken against the directory holding the file.
pub fn load_application(path: &Path) -> anyhow::Result<Application> {
    let mut config = ApplicationConfig::load(path)
        .with_context(|| format!("failed to load application config '{}'", path.display()))?;
    if config.base_path.is_relative() {
        if let Some(dir) = path.parent() {
            config.base_path = dir.join(&config.base_path);
        }
    }
    build_application(config).context("failed to build application")
}

pub fn build_application(config: ApplicationConfig) -> Result<Application, DispatchError> {
    Application::builder(config)
        .behavior("requestLog", Arc::new(RequestLog))
        .controller("site", site_controller())
        .module(admin_module())
        .build()
}

fn site_controller() -> ControllerDef {
    ControllerDef::new()
        .action("ping", |_| Box::new(Ping) as Box<dyn Action>)
        .inline("index", |controller, params| {
            let name: String = params.get_or("name", "world".to_string())?;
            let page = controller.render("index", &json!({ "name": name }))?;
            Ok(Value::String(page))
        })
        .inline("about", |controller, _| {
            let app = controller.app().name().to_string();
            let page = controller.render("about", &json!({ "app": app }))?;
            Ok(Value::String(page))
        })
        .inline("terms", |controller, _| {
            let content = controller.render_file("@pages/terms.html", &json!({}))?;
            Ok(Value::String(controller.render_content(content)?))
        })
        .inline("echo", |_, params| Ok(params.clone().into_value()))
        .inline("add", |_, params| {
            let a: i64 = params.require("a")?;
            let b: i64 = params.require("b")?;
            let sum = a.checked_add(b).ok_or_else(|| {
                DispatchError::BadRequest(format!("The sum of {a} and {b} is out of range."))
            })?;
            Ok(json!({ "sum": sum }))
        })
        .inline("forward", |controller, params| {
            let target: String = params.get_or("to", "/admin/default/index".to_string())?;
            Ok(controller.run(&target, params)?.unwrap_or(Value::Null))
        })
}

fn admin_module() -> ModuleDef {
    ModuleDef::new("admin")
        .behavior("access", Arc::new(AccessGate::deny(["purge"])))
        .controller(
            "default",
            ControllerDef::new()
                .inline("index", |controller, _| {
                    let page = controller.render("index", &json!({}))?;
                    Ok(Value::String(page))
                })
                .inline("purge", |_, _| Ok(json!("purged"))),
        )
}

struct Ping;

impl Action for Ping {
    fn run(&self, controller: &mut Controller<'_>, _params: &Params) -> Result<Value, DispatchError> {
        Ok(json!({ "pong": true, "route": controller.route() }))
    }
}

/// Logs every dispatched action and whether it produced a result.
struct RequestLog;

impl Behavior for RequestLog {
    fn events(&self) -> Vec<(String, HandlerSpec)> {
        let started: Handler = Arc::new(|event: &mut Event| {
            if let Some(action) = &event.action {
                info!(route = %action.unique_id, "action started");
            }
        });
        vec![
            (EVENT_BEFORE_ACTION.to_string(), HandlerSpec::Callable(started)),
            (EVENT_AFTER_ACTION.to_string(), HandlerSpec::Method("logResult")),
        ]
    }

    fn responds_to(&self, method: &str) -> bool {
        method == "logResult"
    }

    fn invoke(&self, _method: &str, event: &mut Event) {
        if let Some(action) = &event.action {
            debug!(route = %action.unique_id, has_result = event.result.is_some(), "action finished");
        }
    }
}

/// Vetoes the listed action ids for every controller of the owning module.
struct AccessGate {
    denied: Vec<String>,
}

impl AccessGate {
    fn deny<const N: usize>(ids: [&str; N]) -> Self {
        Self {
            denied: ids.iter().map(|id| id.to_string()).collect(),
        }
    }
}

impl Behavior for AccessGate {
    fn events(&self) -> Vec<(String, HandlerSpec)> {
        vec![(
            EVENT_BEFORE_ACTION.to_string(),
            HandlerSpec::Method("checkAccess"),
        )]
    }

    fn responds_to(&self, method: &str) -> bool {
        method == "checkAccess"
    }

    fn invoke(&self, _method: &str, event: &mut Event) {
        let Some(action) = &event.action else {
            return;
        };
        if self.denied.iter().any(|id| *id == action.id) {
            warn!(route = %action.unique_id, "access denied");
            event.is_valid = false;
        }
    }
}

#[cfg(test)]
#[path = "tests/site_tests.rs"]
mod tests;
