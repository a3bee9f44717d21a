use super::*;
use serde_json::json;

#[test]
fn substitutes_escaped_and_raw_placeholders() {
    let view = TemplateView::default();
    let params = json!({
        "title": "<b>News</b>",
        "body": "<p>hi</p>",
        "user": { "name": "ana", "age": 31 },
    });

    let out = view.render_str(
        "<h1>{{ title }}</h1>{{{ body }}}<span>{{user.name}} {{ user.age }}</span>{{ missing }}",
        &params,
    );
    assert_eq!(
        out,
        "<h1>&lt;b&gt;News&lt;/b&gt;</h1><p>hi</p><span>ana 31</span>"
    );
}

#[test]
fn unterminated_tags_are_left_alone() {
    let view = TemplateView::default();
    assert_eq!(view.render_str("a {{ b", &json!({ "b": 1 })), "a {{ b");
}

#[test]
fn extension_probe_keeps_explicit_extension() {
    let file = with_default_extension(PathBuf::from("/views/site/index.txt"), "md");
    assert_eq!(file, PathBuf::from("/views/site/index.txt"));
}

#[test]
fn extension_probe_falls_back_to_standard_extension() {
    let dir = tempfile::tempdir().expect("tempdir");
    fs::write(dir.path().join("page.md"), "markdown").expect("write md");

    assert_eq!(
        with_default_extension(dir.path().join("page"), "md"),
        dir.path().join("page.md")
    );
    assert_eq!(
        with_default_extension(dir.path().join("other"), "md"),
        dir.path().join("other.html")
    );
    assert_eq!(
        with_default_extension(dir.path().join("other"), STANDARD_EXTENSION),
        dir.path().join("other.html")
    );
}

#[test]
fn view_names_resolve_against_their_roots() {
    let mut aliases = Aliases::new();
    aliases.set("@themes", "/themes").expect("alias");
    let ctx = ViewContext {
        view_path: Path::new("/app/views/site"),
        module_view_path: Path::new("/app/modules/admin/views"),
        app_view_path: Path::new("/app/views"),
        aliases: &aliases,
    };

    let resolve = |name: &str| find_view_file(name, &ctx, STANDARD_EXTENSION).expect("resolve");
    assert_eq!(resolve("index"), PathBuf::from("/app/views/site/index.html"));
    assert_eq!(
        resolve("/shared/menu"),
        PathBuf::from("/app/modules/admin/views/shared/menu.html")
    );
    assert_eq!(
        resolve("//layouts/main"),
        PathBuf::from("/app/views/layouts/main.html")
    );
    assert_eq!(resolve("@themes/dark/index"), PathBuf::from("/themes/dark/index.html"));
}

#[test]
fn missing_view_file_is_an_invalid_path() {
    let dir = tempfile::tempdir().expect("tempdir");
    let aliases = Aliases::new();
    let ctx = ViewContext {
        view_path: dir.path(),
        module_view_path: dir.path(),
        app_view_path: dir.path(),
        aliases: &aliases,
    };
    let err = TemplateView::default()
        .render("nope", &json!({}), &ctx)
        .expect_err("missing");
    assert!(matches!(err, DispatchError::InvalidPath(ref msg) if msg.contains("nope.html")));
}

#[test]
fn renders_file_from_disk() {
    let dir = tempfile::tempdir().expect("tempdir");
    fs::write(dir.path().join("hello.html"), "Hello {{ name }}!").expect("write");
    let aliases = Aliases::new();
    let ctx = ViewContext {
        view_path: dir.path(),
        module_view_path: dir.path(),
        app_view_path: dir.path(),
        aliases: &aliases,
    };
    let out = TemplateView::default()
        .render("hello", &json!({ "name": "Rust" }), &ctx)
        .expect("render");
    assert_eq!(out, "Hello Rust!");
}
