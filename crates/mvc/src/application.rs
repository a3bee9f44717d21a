use std::{cell::RefCell, fmt, path::Path, sync::Arc};

use component::{Behavior, Handler};
use shared::{
    domain::ActionInfo,
    protocol::{RouteListing, RouteSummary},
};
use tracing::{debug, warn};

use crate::{
    action::ActionOutput,
    alias::Aliases,
    config::ApplicationConfig,
    controller::{Controller, ControllerDef},
    error::DispatchError,
    module::{build_tree, Module, ModuleDef, ModuleId},
    params::Params,
    view::{TemplateView, View},
};

/// The built application: an immutable module tree plus aliases and the
/// view renderer. Shared across requests; per-request state lives in
/// [`RequestScope`].
pub struct Application {
    id: String,
    name: String,
    modules: Vec<Module>,
    aliases: Aliases,
    view: Arc<dyn View>,
}

impl Application {
    pub fn builder(config: ApplicationConfig) -> ApplicationBuilder {
        ApplicationBuilder::new(config)
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn root(&self) -> &Module {
        &self.modules[ModuleId::ROOT.0]
    }

    pub fn module(&self, id: ModuleId) -> &Module {
        &self.modules[id.0]
    }

    /// Looks a module up by its unique id (`admin/reports`); `""` is the root.
    pub fn find_module(&self, unique_id: &str) -> Option<ModuleId> {
        let mut current = ModuleId::ROOT;
        for segment in unique_id.split('/').filter(|segment| !segment.is_empty()) {
            current = self.module(current).child(segment)?;
        }
        Some(current)
    }

    pub fn base_path(&self) -> &Path {
        self.root().base_path()
    }

    pub fn view_path(&self) -> &Path {
        self.root().view_path()
    }

    pub fn layout_path(&self) -> &Path {
        self.root().layout_path()
    }

    pub fn default_route(&self) -> &str {
        self.root().default_route()
    }

    pub fn aliases(&self) -> &Aliases {
        &self.aliases
    }

    pub fn view(&self) -> &dyn View {
        self.view.as_ref()
    }

    /// Runs `route` from the application root in a fresh request scope.
    pub fn handle_request(&self, route: &str, params: &Params) -> Result<ActionOutput, DispatchError> {
        let scope = RequestScope::new(self);
        scope.handle(route, params)
    }

    pub fn routes(&self) -> RouteListing {
        let mut routes = Vec::new();
        for module in &self.modules {
            for (controller_id, def) in module.controllers() {
                let prefix = if module.unique_id().is_empty() {
                    controller_id.to_string()
                } else {
                    format!("{}/{controller_id}", module.unique_id())
                };
                for (action_id, kind) in def.action_ids() {
                    routes.push(RouteSummary {
                        route: format!("{prefix}/{action_id}"),
                        kind,
                        is_default: action_id == def.default_action_id(),
                    });
                }
            }
        }
        routes.sort_by(|a, b| a.route.cmp(&b.route));
        RouteListing {
            application: self.id.clone(),
            default_route: self.default_route().to_string(),
            routes,
        }
    }
}

impl fmt::Debug for Application {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Application")
            .field("id", &self.id)
            .field("modules", &self.modules)
            .field("aliases", &self.aliases)
            .finish()
    }
}

pub struct ApplicationBuilder {
    config: ApplicationConfig,
    root: ModuleDef,
    view: Option<Arc<dyn View>>,
}

impl ApplicationBuilder {
    pub fn new(config: ApplicationConfig) -> Self {
        let root = ModuleDef::new(config.id.clone());
        Self {
            config,
            root,
            view: None,
        }
    }

    pub fn controller(mut self, id: impl Into<String>, def: ControllerDef) -> Self {
        self.root = self.root.controller(id, def);
        self
    }

    pub fn module(mut self, def: ModuleDef) -> Self {
        self.root = self.root.module(def);
        self
    }

    pub fn on(mut self, event: impl Into<String>, handler: Handler) -> Self {
        self.root = self.root.on(event, handler);
        self
    }

    pub fn behavior(mut self, name: impl Into<String>, behavior: Arc<dyn Behavior>) -> Self {
        self.root = self.root.behavior(name, behavior);
        self
    }

    pub fn view(mut self, view: Arc<dyn View>) -> Self {
        self.view = Some(view);
        self
    }

    pub fn build(self) -> Result<Application, DispatchError> {
        let Self {
            config,
            mut root,
            view,
        } = self;

        root.layout = config.layout.clone().into_layout()?;
        root.default_route = Some(config.default_route.clone());
        for (id, module_config) in &config.modules {
            let Some(module) = root.child_mut(id) else {
                return Err(DispatchError::InvalidConfig(format!(
                    "module '{id}' is configured but not registered"
                )));
            };
            if let Some(layout) = &module_config.layout {
                module.layout = layout.clone().into_layout()?;
            }
            if let Some(base_path) = &module_config.base_path {
                module.base_path = Some(base_path.clone());
            }
            if let Some(route) = &module_config.default_route {
                module.default_route = Some(route.clone());
            }
        }
        for component in config.components.keys() {
            debug!(component = %component, "component configuration is handled outside the dispatcher");
        }

        let modules = build_tree(root, config.base_path.clone(), &config.default_route)?;

        let mut aliases = Aliases::new();
        let root_node = &modules[ModuleId::ROOT.0];
        aliases.set("@app", root_node.base_path())?;
        aliases.set("@views", root_node.view_path())?;
        for (name, target) in &config.aliases {
            aliases.set(name, target)?;
        }

        let view = view.unwrap_or_else(|| {
            Arc::new(TemplateView::new(config.view.default_extension.clone()))
        });

        debug!(id = %config.id, modules = modules.len(), "application built");
        Ok(Application {
            id: config.id,
            name: config.name,
            modules,
            aliases,
            view,
        })
    }
}

/// Per-request state: the application plus diagnostic bookkeeping of the
/// first dispatched route, action and parameters.
pub struct RequestScope<'a> {
    app: &'a Application,
    requested_route: RefCell<Option<String>>,
    requested_action: RefCell<Option<ActionInfo>>,
    requested_params: RefCell<Option<Params>>,
}

impl<'a> RequestScope<'a> {
    pub fn new(app: &'a Application) -> Self {
        Self {
            app,
            requested_route: RefCell::new(None),
            requested_action: RefCell::new(None),
            requested_params: RefCell::new(None),
        }
    }

    pub fn app(&self) -> &'a Application {
        self.app
    }

    pub fn requested_route(&self) -> Option<String> {
        self.requested_route.borrow().clone()
    }

    pub fn requested_action(&self) -> Option<ActionInfo> {
        self.requested_action.borrow().clone()
    }

    pub fn requested_params(&self) -> Option<Params> {
        self.requested_params.borrow().clone()
    }

    pub fn handle(&self, route: &str, params: &Params) -> Result<ActionOutput, DispatchError> {
        self.requested_route
            .borrow_mut()
            .get_or_insert_with(|| route.to_string());
        self.run_module_action(ModuleId::ROOT, route, params)
    }

    /// Resolves `route` relative to `module` into a controller and the
    /// remaining action id. `None` when nothing matches.
    pub fn create_controller(
        &self,
        module: ModuleId,
        route: &str,
    ) -> Result<Option<(Controller<'_>, String)>, DispatchError> {
        let node = self.app.module(module);
        let route = if route.is_empty() {
            node.default_route()
        } else {
            route
        };
        let route = route.trim_matches('/');
        if route.contains("//") {
            return Ok(None);
        }

        let (id, rest) = route.split_once('/').unwrap_or((route, ""));
        if let Some(def) = node.controller(id) {
            let controller = Controller::new(id, module, self, Arc::clone(def))?;
            return Ok(Some((controller, rest.to_string())));
        }
        match node.child(id) {
            Some(child) => self.create_controller(child, rest),
            None => Ok(None),
        }
    }

    pub fn run_module_action(
        &self,
        module: ModuleId,
        route: &str,
        params: &Params,
    ) -> Result<ActionOutput, DispatchError> {
        match self.create_controller(module, route)? {
            Some((mut controller, action_id)) => controller.run_action(&action_id, params),
            None => {
                let prefix = self.app.module(module).unique_id();
                let full = if prefix.is_empty() {
                    route.to_string()
                } else {
                    format!("{prefix}/{route}")
                };
                warn!(route = %full, "unresolvable route");
                Err(DispatchError::InvalidRoute(format!(
                    "Unable to resolve the request \"{full}\"."
                )))
            }
        }
    }

    pub(crate) fn record_action(&self, action: &ActionInfo) {
        self.requested_action
            .borrow_mut()
            .get_or_insert_with(|| action.clone());
    }

    pub(crate) fn record_params(&self, params: &Params) {
        self.requested_params
            .borrow_mut()
            .get_or_insert_with(|| params.clone());
    }
}

#[cfg(test)]
#[path = "tests/application_tests.rs"]
mod tests;
