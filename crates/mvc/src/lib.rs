mod action;
mod alias;
mod application;
mod config;
mod controller;
mod error;
mod module;
mod params;
mod view;

pub use action::{
    action_id_from_method, inline_method_name, is_valid_action_id, Action, ActionFactory,
    ActionOutput, ActionTarget, InlineHandler, ResolvedAction,
};
pub use alias::Aliases;
pub use application::{Application, ApplicationBuilder, RequestScope};
pub use config::{ApplicationConfig, LayoutSetting, ModuleConfig, ViewConfig};
pub use controller::{
    BehaviorFactory, Controller, ControllerDef, EVENT_AFTER_ACTION, EVENT_BEFORE_ACTION,
};
pub use error::DispatchError;
pub use module::{Module, ModuleDef, ModuleId};
pub use params::Params;
pub use view::{
    find_view_file, with_default_extension, Layout, TemplateView, View, ViewContext,
    STANDARD_EXTENSION,
};
