use std::path::PathBuf;

use super::*;
use crate::{
    config::{LayoutSetting, ModuleConfig},
    view::Layout,
};
use serde_json::json;
use shared::{error::ErrorCode, protocol::ActionKind};

fn base_config() -> ApplicationConfig {
    ApplicationConfig {
        id: "basic".into(),
        base_path: PathBuf::from("/srv/basic"),
        ..ApplicationConfig::default()
    }
}

fn sample_app(config: ApplicationConfig) -> Application {
    Application::builder(config)
        .controller(
            "site",
            ControllerDef::new()
                .inline("index", |_, _| Ok(json!("home")))
                .inline("about", |_, _| Ok(json!("about"))),
        )
        .module(
            ModuleDef::new("admin")
                .controller(
                    "default",
                    ControllerDef::new().inline("index", |_, _| Ok(json!("admin home"))),
                )
                .module(ModuleDef::new("reports").controller(
                    "default",
                    ControllerDef::new().inline("index", |controller, _| {
                        Ok(json!(controller.unique_id()))
                    }),
                )),
        )
        .build()
        .expect("app")
}

#[test]
fn empty_route_runs_the_application_default_route() {
    let app = sample_app(base_config());
    assert_eq!(
        app.handle_request("", &Params::new()).expect("run"),
        Some(json!("home"))
    );
}

#[test]
fn module_routes_fall_back_to_module_default_route() {
    let app = sample_app(base_config());
    assert_eq!(
        app.handle_request("admin", &Params::new()).expect("run"),
        Some(json!("admin home"))
    );
    assert_eq!(
        app.handle_request("admin/reports", &Params::new()).expect("run"),
        Some(json!("admin/reports/default"))
    );
}

#[test]
fn create_controller_splits_route_at_the_controller() {
    let app = sample_app(base_config());
    let scope = RequestScope::new(&app);

    let (controller, rest) = scope
        .create_controller(ModuleId::ROOT, "/admin/reports/default/index/")
        .expect("create")
        .expect("controller");
    assert_eq!(controller.unique_id(), "admin/reports/default");
    assert_eq!(rest, "index");

    let (controller, rest) = scope
        .create_controller(ModuleId::ROOT, "site/about")
        .expect("create")
        .expect("controller");
    assert_eq!(controller.unique_id(), "site");
    assert_eq!(rest, "about");
}

#[test]
fn double_slashes_never_resolve() {
    let app = sample_app(base_config());
    let scope = RequestScope::new(&app);
    assert!(scope
        .create_controller(ModuleId::ROOT, "admin//default")
        .expect("create")
        .is_none());

    let err = app
        .handle_request("site//about", &Params::new())
        .expect_err("invalid");
    assert_eq!(err.code(), ErrorCode::NotFound);
}

#[test]
fn unresolvable_routes_name_the_full_request() {
    let app = sample_app(base_config());
    let err = app
        .handle_request("nowhere/index", &Params::new())
        .expect_err("unresolved");
    assert_eq!(err.to_string(), "Unable to resolve the request \"nowhere/index\".");

    let scope = RequestScope::new(&app);
    let admin = app.find_module("admin").expect("admin");
    let err = scope
        .run_module_action(admin, "missing", &Params::new())
        .expect_err("unresolved");
    assert_eq!(err.to_string(), "Unable to resolve the request \"admin/missing\".");
}

#[test]
fn requested_route_keeps_the_first_route() {
    let app = sample_app(base_config());
    let scope = RequestScope::new(&app);
    scope.handle("site/about", &Params::new()).expect("first");
    scope.handle("site/index", &Params::new()).expect("second");
    assert_eq!(scope.requested_route().as_deref(), Some("site/about"));
    assert_eq!(
        scope.requested_action().map(|action| action.unique_id),
        Some("site/about".to_string())
    );
}

#[test]
fn module_tree_paths_and_chains() {
    let app = sample_app(base_config());
    let reports = app.find_module("admin/reports").expect("reports");
    let module = app.module(reports);

    assert_eq!(module.unique_id(), "admin/reports");
    assert_eq!(
        module.base_path(),
        PathBuf::from("/srv/basic/modules/admin/modules/reports")
    );
    assert_eq!(module.layout_path(), module.view_path().join("layouts"));
    let chain: Vec<&str> = module
        .chain()
        .iter()
        .map(|id| app.module(*id).unique_id())
        .collect();
    assert_eq!(chain, ["", "admin", "admin/reports"]);
    assert_eq!(app.find_module(""), Some(ModuleId::ROOT));
    assert!(app.find_module("admin/missing").is_none());
}

#[test]
fn builtin_aliases_point_into_the_base_path() {
    let mut config = base_config();
    config.aliases.insert("@assets".into(), "@app/web/assets".into());
    let app = sample_app(config);

    let aliases = app.aliases();
    assert_eq!(aliases.resolve("@app").expect("app"), PathBuf::from("/srv/basic"));
    assert_eq!(
        aliases.resolve("@views/site").expect("views"),
        PathBuf::from("/srv/basic/views/site")
    );
    assert_eq!(
        aliases.resolve("@assets/app.css").expect("assets"),
        PathBuf::from("/srv/basic/web/assets/app.css")
    );
}

#[test]
fn module_settings_from_config_apply_to_registered_modules() {
    let mut config = base_config();
    config.modules.insert(
        "admin".into(),
        ModuleConfig {
            layout: Some(LayoutSetting::Name("admin".into())),
            base_path: Some(PathBuf::from("backend")),
            default_route: Some("default/index".into()),
        },
    );
    let app = sample_app(config);
    let admin = app.module(app.find_module("admin").expect("admin"));

    assert_eq!(admin.layout(), &Layout::named("admin"));
    assert_eq!(admin.base_path(), PathBuf::from("/srv/basic/backend"));
    assert_eq!(admin.default_route(), "default/index");
}

#[test]
fn configuring_unknown_module_fails_the_build() {
    let mut config = base_config();
    config.modules.insert("ghost".into(), ModuleConfig::default());
    let err = Application::builder(config).build().expect_err("unknown");
    assert!(matches!(err, DispatchError::InvalidConfig(_)));
}

#[test]
fn duplicate_controllers_fail_the_build() {
    let err = Application::builder(base_config())
        .controller("site", ControllerDef::new())
        .controller("site", ControllerDef::new())
        .build()
        .expect_err("duplicate");
    assert!(matches!(err, DispatchError::InvalidConfig(_)));
}

#[test]
fn route_listing_covers_every_module() {
    let app = Application::builder(base_config())
        .controller(
            "site",
            ControllerDef::new()
                .action("captcha", |_| unreachable!("factory not called when listing"))
                .inline("index", |_, _| Ok(json!(null)))
                .inline("view-post", |_, _| Ok(json!(null))),
        )
        .module(ModuleDef::new("admin").controller(
            "default",
            ControllerDef::new().inline("index", |_, _| Ok(json!(null))),
        ))
        .build()
        .expect("app");

    let listing = app.routes();
    assert_eq!(listing.application, "basic");
    assert_eq!(listing.default_route, "site");
    let routes: Vec<(&str, ActionKind, bool)> = listing
        .routes
        .iter()
        .map(|route| (route.route.as_str(), route.kind, route.is_default))
        .collect();
    assert_eq!(
        routes,
        [
            ("admin/default/index", ActionKind::Inline, true),
            ("site/captcha", ActionKind::Standalone, false),
            ("site/index", ActionKind::Inline, true),
            ("site/view-post", ActionKind::Inline, false),
        ]
    );
}
