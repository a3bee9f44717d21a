use std::{
    collections::BTreeMap,
    fmt,
    path::{Path, PathBuf},
    sync::Arc,
};

use component::{Behavior, Component, Event, Handler};
use shared::domain::ActionInfo;

use crate::{
    action::ActionOutput,
    controller::{ControllerDef, EVENT_AFTER_ACTION, EVENT_BEFORE_ACTION},
    error::DispatchError,
    view::Layout,
};

/// Index of a module inside the application's module tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ModuleId(pub(crate) usize);

impl ModuleId {
    pub const ROOT: ModuleId = ModuleId(0);
}

/// Declarative description of a module, turned into a [`Module`] when the
/// application is built.
pub struct ModuleDef {
    pub(crate) id: String,
    pub(crate) layout: Layout,
    pub(crate) base_path: Option<PathBuf>,
    pub(crate) view_path: Option<PathBuf>,
    pub(crate) layout_path: Option<PathBuf>,
    pub(crate) default_route: Option<String>,
    pub(crate) controllers: Vec<(String, ControllerDef)>,
    pub(crate) modules: Vec<ModuleDef>,
    pub(crate) handlers: Vec<(String, Handler)>,
    pub(crate) behaviors: Vec<(String, Arc<dyn Behavior>)>,
}

impl ModuleDef {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            layout: Layout::Inherit,
            base_path: None,
            view_path: None,
            layout_path: None,
            default_route: None,
            controllers: Vec::new(),
            modules: Vec::new(),
            handlers: Vec::new(),
            behaviors: Vec::new(),
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn layout(mut self, layout: Layout) -> Self {
        self.layout = layout;
        self
    }

    /// Relative paths are taken against the parent module's base path.
    pub fn base_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.base_path = Some(path.into());
        self
    }

    pub fn view_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.view_path = Some(path.into());
        self
    }

    pub fn layout_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.layout_path = Some(path.into());
        self
    }

    pub fn default_route(mut self, route: impl Into<String>) -> Self {
        self.default_route = Some(route.into());
        self
    }

    pub fn controller(mut self, id: impl Into<String>, def: ControllerDef) -> Self {
        self.controllers.push((id.into(), def));
        self
    }

    pub fn module(mut self, def: ModuleDef) -> Self {
        self.modules.push(def);
        self
    }

    pub fn on(mut self, event: impl Into<String>, handler: Handler) -> Self {
        self.handlers.push((event.into(), handler));
        self
    }

    pub fn behavior(mut self, name: impl Into<String>, behavior: Arc<dyn Behavior>) -> Self {
        self.behaviors.push((name.into(), behavior));
        self
    }

    pub(crate) fn child_mut(&mut self, id: &str) -> Option<&mut ModuleDef> {
        self.modules.iter_mut().find(|module| module.id == id)
    }
}

/// A node of the built module tree. The root node is the application.
pub struct Module {
    id: String,
    unique_id: String,
    parent: Option<ModuleId>,
    chain: Vec<ModuleId>,
    layout: Layout,
    base_path: PathBuf,
    view_path: PathBuf,
    layout_path: PathBuf,
    default_route: String,
    controllers: BTreeMap<String, Arc<ControllerDef>>,
    children: BTreeMap<String, ModuleId>,
    component: Component,
}

impl Module {
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Slash separated ids from the application down to this module; empty
    /// for the application itself.
    pub fn unique_id(&self) -> &str {
        &self.unique_id
    }

    pub fn parent(&self) -> Option<ModuleId> {
        self.parent
    }

    /// Ancestors from the application down to and including this module.
    pub fn chain(&self) -> &[ModuleId] {
        &self.chain
    }

    pub fn layout(&self) -> &Layout {
        &self.layout
    }

    pub fn base_path(&self) -> &Path {
        &self.base_path
    }

    pub fn view_path(&self) -> &Path {
        &self.view_path
    }

    pub fn layout_path(&self) -> &Path {
        &self.layout_path
    }

    pub fn default_route(&self) -> &str {
        &self.default_route
    }

    pub fn controller(&self, id: &str) -> Option<&Arc<ControllerDef>> {
        self.controllers.get(id)
    }

    pub fn controllers(&self) -> impl Iterator<Item = (&str, &Arc<ControllerDef>)> {
        self.controllers.iter().map(|(id, def)| (id.as_str(), def))
    }

    pub fn child(&self, id: &str) -> Option<ModuleId> {
        self.children.get(id).copied()
    }

    pub fn children(&self) -> impl Iterator<Item = (&str, ModuleId)> {
        self.children.iter().map(|(id, module)| (id.as_str(), *module))
    }

    pub fn component(&self) -> &Component {
        &self.component
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
}

impl fmt::Debug for Module {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Module")
            .field("unique_id", &self.unique_id)
            .field("layout", &self.layout)
            .field("base_path", &self.base_path)
            .field("controllers", &self.controllers.keys().collect::<Vec<_>>())
            .field("children", &self.children.keys().collect::<Vec<_>>())
            .finish()
    }
}

/// Flattens a module definition tree into an arena. Ancestor chains are
/// computed here once.
pub(crate) fn build_tree(
    root: ModuleDef,
    root_base: PathBuf,
    root_default_route: &str,
) -> Result<Vec<Module>, DispatchError> {
    let mut arena = Vec::new();
    insert(&mut arena, root, None, &root_base, root_default_route)?;
    Ok(arena)
}

fn insert(
    arena: &mut Vec<Module>,
    def: ModuleDef,
    parent: Option<ModuleId>,
    parent_base: &Path,
    fallback_route: &str,
) -> Result<ModuleId, DispatchError> {
    let index = ModuleId(arena.len());

    let (unique_id, mut chain, base_path) = match parent {
        None => {
            let base_path = match &def.base_path {
                Some(path) => parent_base.join(path),
                None => parent_base.to_path_buf(),
            };
            (String::new(), Vec::new(), base_path)
        }
        Some(parent_id) => {
            if def.id.is_empty() || def.id.contains('/') {
                return Err(DispatchError::InvalidConfig(format!(
                    "invalid module id '{}'",
                    def.id
                )));
            }
            let parent_node = &arena[parent_id.0];
            let unique_id = if parent_node.unique_id.is_empty() {
                def.id.clone()
            } else {
                format!("{}/{}", parent_node.unique_id, def.id)
            };
            let base_path = match &def.base_path {
                Some(path) => parent_base.join(path),
                None => parent_base.join("modules").join(&def.id),
            };
            (unique_id, parent_node.chain.clone(), base_path)
        }
    };
    chain.push(index);

    let view_path = def
        .view_path
        .as_ref()
        .map(|path| base_path.join(path))
        .unwrap_or_else(|| base_path.join("views"));
    let layout_path = def
        .layout_path
        .as_ref()
        .map(|path| base_path.join(path))
        .unwrap_or_else(|| view_path.join("layouts"));

    let mut component = Component::new();
    for (event, handler) in def.handlers {
        component.on(event, handler);
    }
    for (name, behavior) in def.behaviors {
        component.attach_behavior(name, behavior)?;
    }

    let mut controllers = BTreeMap::new();
    for (id, controller) in def.controllers {
        if controllers.insert(id.clone(), Arc::new(controller)).is_some() {
            return Err(DispatchError::InvalidConfig(format!(
                "controller '{id}' registered twice in module '{unique_id}'"
            )));
        }
    }

    arena.push(Module {
        id: def.id,
        unique_id: unique_id.clone(),
        parent,
        chain,
        layout: def.layout,
        base_path: base_path.clone(),
        view_path,
        layout_path,
        default_route: def.default_route.unwrap_or_else(|| fallback_route.to_string()),
        controllers,
        children: BTreeMap::new(),
        component,
    });

    for child in def.modules {
        let child_id = child.id.clone();
        let child_index = insert(arena, child, Some(index), &base_path, "default")?;
        if arena[index.0]
            .children
            .insert(child_id.clone(), child_index)
            .is_some()
        {
            return Err(DispatchError::InvalidConfig(format!(
                "module '{child_id}' registered twice in module '{unique_id}'"
            )));
        }
    }

    Ok(index)
}
