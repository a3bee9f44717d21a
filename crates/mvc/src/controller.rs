use std::{
    cell::OnceCell,
    collections::BTreeMap,
    fmt,
    path::{Path, PathBuf},
    sync::Arc,
};

use component::{Behavior, Component, Event, Handler};
use serde_json::{json, Value};
use shared::{
    domain::{ActionInfo, HandlerId},
    protocol::ActionKind,
};
use tracing::debug;

use crate::{
    action::{
        action_id_from_method, inline_method_name, is_valid_action_id, Action, ActionFactory,
        ActionOutput, ActionTarget, InlineHandler, ResolvedAction,
    },
    application::{Application, RequestScope},
    error::DispatchError,
    module::{Module, ModuleId},
    params::Params,
    view::{with_default_extension, Layout, ViewContext},
};

pub const EVENT_BEFORE_ACTION: &str = "beforeAction";
pub const EVENT_AFTER_ACTION: &str = "afterAction";

pub type BehaviorFactory = Arc<dyn Fn() -> Arc<dyn Behavior> + Send + Sync>;

/// Static description of a controller: its action map, inline methods,
/// event handlers and behaviors. A [`Controller`] is created from it for
/// every dispatch.
pub struct ControllerDef {
    default_action: String,
    layout: Layout,
    view_path: Option<String>,
    actions: BTreeMap<String, ActionFactory>,
    methods: BTreeMap<String, InlineHandler>,
    handlers: Vec<(String, Handler)>,
    behaviors: Vec<(String, BehaviorFactory)>,
}

impl Default for ControllerDef {
    fn default() -> Self {
        Self::new()
    }
}

impl ControllerDef {
    pub fn new() -> Self {
        Self {
            default_action: "index".to_string(),
            layout: Layout::Inherit,
            view_path: None,
            actions: BTreeMap::new(),
            methods: BTreeMap::new(),
            handlers: Vec::new(),
            behaviors: Vec::new(),
        }
    }

    pub fn default_action(mut self, id: impl Into<String>) -> Self {
        self.default_action = id.into();
        self
    }

    pub fn layout(mut self, layout: Layout) -> Self {
        self.layout = layout;
        self
    }

    /// Overrides `<module views>/<controller id>`; may be an alias.
    pub fn view_path(mut self, path: impl Into<String>) -> Self {
        self.view_path = Some(path.into());
        self
    }

    /// Registers a standalone action. Entries here win over inline methods.
    pub fn action<F>(mut self, id: impl Into<String>, factory: F) -> Self
    where
        F: Fn(&str) -> Box<dyn Action> + Send + Sync + 'static,
    {
        self.actions.insert(id.into(), Arc::new(factory));
        self
    }

    /// Registers an inline action method under its full name, e.g. `actionIndex`.
    pub fn method<F>(mut self, name: impl Into<String>, handler: F) -> Self
    where
        F: Fn(&mut Controller<'_>, &Params) -> Result<Value, DispatchError>
            + Send
            + Sync
            + 'static,
    {
        self.methods.insert(name.into(), Arc::new(handler));
        self
    }

    /// Registers an inline action method named after `id` (`view-post` → `actionViewPost`).
    pub fn inline<F>(self, id: &str, handler: F) -> Self
    where
        F: Fn(&mut Controller<'_>, &Params) -> Result<Value, DispatchError>
            + Send
            + Sync
            + 'static,
    {
        let name = inline_method_name(id);
        self.method(name, handler)
    }

    pub fn on(mut self, event: impl Into<String>, handler: Handler) -> Self {
        self.handlers.push((event.into(), handler));
        self
    }

    pub fn behavior<F>(mut self, name: impl Into<String>, factory: F) -> Self
    where
        F: Fn() -> Arc<dyn Behavior> + Send + Sync + 'static,
    {
        self.behaviors.push((name.into(), Arc::new(factory)));
        self
    }

    pub fn default_action_id(&self) -> &str {
        &self.default_action
    }

    /// Action ids this controller answers to, standalone entries first.
    pub fn action_ids(&self) -> Vec<(String, ActionKind)> {
        let mut ids: Vec<(String, ActionKind)> = self
            .actions
            .keys()
            .map(|id| (id.clone(), ActionKind::Standalone))
            .collect();
        for method in self.methods.keys() {
            if let Some(id) = action_id_from_method(method) {
                if is_valid_action_id(&id) && !self.actions.contains_key(&id) {
                    ids.push((id, ActionKind::Inline));
                }
            }
        }
        ids
    }
}

impl fmt::Debug for ControllerDef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ControllerDef")
            .field("default_action", &self.default_action)
            .field("layout", &self.layout)
            .field("actions", &self.actions.keys().collect::<Vec<_>>())
            .field("methods", &self.methods.keys().collect::<Vec<_>>())
            .finish()
    }
}

/// A controller instance serving one dispatch.
pub struct Controller<'s> {
    id: String,
    module: ModuleId,
    scope: &'s RequestScope<'s>,
    def: Arc<ControllerDef>,
    component: Component,
    action: Option<Arc<ResolvedAction>>,
    action_params: Params,
    layout: Layout,
    view_path: OnceCell<PathBuf>,
}

impl<'s> Controller<'s> {
    pub fn new(
        id: impl Into<String>,
        module: ModuleId,
        scope: &'s RequestScope<'s>,
        def: Arc<ControllerDef>,
    ) -> Result<Self, DispatchError> {
        let mut component = Component::new();
        for (event, handler) in &def.handlers {
            component.on(event.clone(), Arc::clone(handler));
        }
        for (name, factory) in &def.behaviors {
            component.attach_behavior(name.clone(), factory())?;
        }

        Ok(Self {
            id: id.into(),
            module,
            scope,
            layout: def.layout.clone(),
            def,
            component,
            action: None,
            action_params: Params::new(),
            view_path: OnceCell::new(),
        })
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn unique_id(&self) -> String {
        let module = self.module();
        if module.unique_id().is_empty() {
            self.id.clone()
        } else {
            format!("{}/{}", module.unique_id(), self.id)
        }
    }

    /// Route of the current action, or of the controller when idle.
    pub fn route(&self) -> String {
        match &self.action {
            Some(action) => action.unique_id().to_string(),
            None => self.unique_id(),
        }
    }

    pub fn app(&self) -> &'s Application {
        self.scope.app()
    }

    pub fn scope(&self) -> &'s RequestScope<'s> {
        self.scope
    }

    pub fn module_id(&self) -> ModuleId {
        self.module
    }

    pub fn module(&self) -> &'s Module {
        self.scope.app().module(self.module)
    }

    /// Ancestor modules from the application down to the owning module.
    pub fn modules(&self) -> Vec<&'s Module> {
        let app = self.scope.app();
        self.module()
            .chain()
            .iter()
            .map(|id| app.module(*id))
            .collect()
    }

    pub fn action(&self) -> Option<&ActionInfo> {
        self.action.as_deref().map(ResolvedAction::info)
    }

    pub fn action_params(&self) -> &Params {
        &self.action_params
    }

    pub fn component(&self) -> &Component {
        &self.component
    }

    pub fn component_mut(&mut self) -> &mut Component {
        &mut self.component
    }

    pub fn on(&mut self, event: impl Into<String>, handler: Handler) -> HandlerId {
        self.component.on(event, handler)
    }

    pub fn layout(&self) -> &Layout {
        &self.layout
    }

    pub fn set_layout(&mut self, layout: Layout) {
        self.layout = layout;
    }

    pub fn create_action(&self, id: &str) -> Option<ResolvedAction> {
        let id = if id.is_empty() {
            self.def.default_action.as_str()
        } else {
            id
        };
        let info = ActionInfo::new(id, format!("{}/{id}", self.unique_id()), self.unique_id());

        if let Some(factory) = self.def.actions.get(id) {
            return Some(ResolvedAction::new(
                info,
                ActionTarget::Standalone(factory(id)),
            ));
        }

        if !is_valid_action_id(id) {
            return None;
        }
        let method = inline_method_name(id);
        let handler = self.def.methods.get(&method)?;
        Some(ResolvedAction::new(
            info,
            ActionTarget::Inline {
                method,
                handler: Arc::clone(handler),
            },
        ))
    }

    pub fn run_action(&mut self, id: &str, params: &Params) -> Result<ActionOutput, DispatchError> {
        let Some(action) = self.create_action(id) else {
            return Err(DispatchError::InvalidRoute(format!(
                "Unable to resolve the request: {}/{id}",
                self.unique_id()
            )));
        };
        let action = Arc::new(action);
        debug!(route = %action.unique_id(), "route to run");
        self.scope.record_action(action.info());

        let previous = self.action.replace(Arc::clone(&action));
        let outcome = self.run_intercepted(&action, params);
        self.action = previous;
        outcome
    }

    fn run_intercepted(
        &mut self,
        action: &ResolvedAction,
        params: &Params,
    ) -> Result<ActionOutput, DispatchError> {
        let info = action.info();
        let mut approved = Vec::new();
        for module in self.modules() {
            if !module.before_action(info) {
                debug!(module = %module.unique_id(), action = %info.unique_id, "module vetoed action");
                return Ok(None);
            }
            approved.push(module);
        }

        if !self.before_action(info) {
            debug!(action = %info.unique_id, "controller vetoed action");
            return Ok(None);
        }

        let result = action.run_with_params(self, params)?;
        let mut result = self.after_action(info, result);
        for module in approved.iter().rev() {
            result = module.after_action(info, result);
        }
        Ok(result)
    }

    /// Dispatches `route`: a bare action id runs here, `a/b` runs relative to
    /// the owning module and `/a/b` runs from the application root.
    pub fn run(&mut self, route: &str, params: &Params) -> Result<ActionOutput, DispatchError> {
        match route.find('/') {
            None => self.run_action(route, params),
            Some(pos) if pos > 0 => self.scope.run_module_action(self.module, route, params),
            Some(_) => self
                .scope
                .run_module_action(ModuleId::ROOT, route.trim_start_matches('/'), params),
        }
    }

    pub fn before_action(&self, action: &ActionInfo) -> bool {
        let mut event = Event::for_action(action.clone());
        self.component.trigger(EVENT_BEFORE_ACTION, &mut event);
        event.is_valid
    }

    pub fn after_action(&self, action: &ActionInfo, result: ActionOutput) -> ActionOutput {
        let mut event = Event::for_action(action.clone()).with_result(result);
        self.component.trigger(EVENT_AFTER_ACTION, &mut event);
        event.result
    }

    pub(crate) fn bind_action_params(&mut self, params: &Params) {
        self.action_params = params.clone();
        self.scope.record_params(params);
    }

    pub fn view_path(&self) -> Result<&Path, DispatchError> {
        if let Some(path) = self.view_path.get() {
            return Ok(path);
        }
        let path = match &self.def.view_path {
            Some(custom) => self.app().aliases().resolve(custom)?,
            None => self.module().view_path().join(&self.id),
        };
        Ok(self.view_path.get_or_init(|| path))
    }

    pub fn set_view_path(&mut self, path: impl Into<PathBuf>) {
        self.view_path = OnceCell::from(path.into());
    }

    /// Resolves the effective layout to a file, or `None` when no layout applies.
    pub fn find_layout_file(&self) -> Result<Option<PathBuf>, DispatchError> {
        let app = self.app();
        let (layout, module) = match &self.layout {
            Layout::Disabled => return Ok(None),
            Layout::Named(name) => (name.as_str(), self.module()),
            Layout::Inherit => {
                let mut declared = None;
                for id in self.module().chain().iter().rev() {
                    let module = app.module(*id);
                    match module.layout() {
                        Layout::Inherit => continue,
                        Layout::Disabled => return Ok(None),
                        Layout::Named(name) => {
                            declared = Some((name.as_str(), module));
                            break;
                        }
                    }
                }
                match declared {
                    Some(found) => found,
                    None => return Ok(None),
                }
            }
        };

        let file = if layout.starts_with('@') {
            app.aliases().resolve(layout)?
        } else if let Some(rest) = layout.strip_prefix('/') {
            app.layout_path().join(rest)
        } else {
            module.layout_path().join(layout)
        };
        Ok(Some(with_default_extension(
            file,
            app.view().default_extension(),
        )))
    }

    pub fn render(&self, view: &str, params: &Value) -> Result<String, DispatchError> {
        let content = self.render_partial(view, params)?;
        self.render_content(content)
    }

    pub fn render_partial(&self, view: &str, params: &Value) -> Result<String, DispatchError> {
        let ctx = self.view_context()?;
        self.app().view().render(view, params, &ctx)
    }

    /// Wraps already rendered content in the effective layout.
    pub fn render_content(&self, content: String) -> Result<String, DispatchError> {
        match self.find_layout_file()? {
            Some(layout) => {
                let ctx = self.view_context()?;
                self.app()
                    .view()
                    .render_file(&layout, &json!({ "content": content }), &ctx)
            }
            None => Ok(content),
        }
    }

    pub fn render_file(&self, file: &str, params: &Value) -> Result<String, DispatchError> {
        let path = self.app().aliases().resolve(file)?;
        let ctx = self.view_context()?;
        self.app().view().render_file(&path, params, &ctx)
    }

    fn view_context(&self) -> Result<ViewContext<'_>, DispatchError> {
        let app = self.app();
        Ok(ViewContext {
            view_path: self.view_path()?,
            module_view_path: self.module().view_path(),
            app_view_path: app.view_path(),
            aliases: app.aliases(),
        })
    }
}

impl fmt::Debug for Controller<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Controller")
            .field("unique_id", &self.unique_id())
            .field("action", &self.action)
            .field("layout", &self.layout)
            .finish()
    }
}

#[cfg(test)]
#[path = "tests/controller_tests.rs"]
mod tests;
