use std::{
    fs,
    path::{Path, PathBuf},
};

use serde_json::Value;

use crate::{alias::Aliases, error::DispatchError};

pub const STANDARD_EXTENSION: &str = "html";

/// Layout declaration of a controller or module.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum Layout {
    /// Take the layout of the nearest ancestor module that declares one.
    #[default]
    Inherit,
    Disabled,
    Named(String),
}

impl Layout {
    pub fn named(name: impl Into<String>) -> Self {
        Self::Named(name.into())
    }
}

/// Directories a view name is resolved against.
#[derive(Debug, Clone, Copy)]
pub struct ViewContext<'a> {
    /// Views of the rendering controller.
    pub view_path: &'a Path,
    /// Views of the controller's module, target of `/name`.
    pub module_view_path: &'a Path,
    /// Views of the application, target of `//name`.
    pub app_view_path: &'a Path,
    pub aliases: &'a Aliases,
}

pub trait View: Send + Sync {
    fn default_extension(&self) -> &str {
        STANDARD_EXTENSION
    }

    fn render(
        &self,
        view: &str,
        params: &Value,
        ctx: &ViewContext<'_>,
    ) -> Result<String, DispatchError> {
        let file = find_view_file(view, ctx, self.default_extension())?;
        self.render_file(&file, params, ctx)
    }

    fn render_file(
        &self,
        path: &Path,
        params: &Value,
        ctx: &ViewContext<'_>,
    ) -> Result<String, DispatchError>;
}

pub fn find_view_file(
    view: &str,
    ctx: &ViewContext<'_>,
    default_extension: &str,
) -> Result<PathBuf, DispatchError> {
    let file = if view.starts_with('@') {
        ctx.aliases.resolve(view)?
    } else if let Some(rest) = view.strip_prefix("//") {
        ctx.app_view_path.join(rest)
    } else if let Some(rest) = view.strip_prefix('/') {
        ctx.module_view_path.join(rest)
    } else {
        ctx.view_path.join(view)
    };
    Ok(with_default_extension(file, default_extension))
}

/// Appends the default extension to an extensionless file, falling back to
/// [`STANDARD_EXTENSION`] when a non-standard default finds nothing on disk.
pub fn with_default_extension(file: PathBuf, default_extension: &str) -> PathBuf {
    if file.extension().is_some() {
        return file;
    }
    let probed = append_extension(&file, default_extension);
    if default_extension != STANDARD_EXTENSION && !probed.is_file() {
        return append_extension(&file, STANDARD_EXTENSION);
    }
    probed
}

fn append_extension(file: &Path, extension: &str) -> PathBuf {
    let mut raw = file.as_os_str().to_owned();
    raw.push(".");
    raw.push(extension);
    PathBuf::from(raw)
}

/// File based view with `{{ name }}` (escaped) and `{{{ name }}}` (raw)
/// placeholders. Dotted names walk nested objects.
#[derive(Debug, Clone)]
pub struct TemplateView {
    default_extension: String,
}

impl Default for TemplateView {
    fn default() -> Self {
        Self::new(STANDARD_EXTENSION)
    }
}

impl TemplateView {
    pub fn new(default_extension: impl Into<String>) -> Self {
        Self {
            default_extension: default_extension.into(),
        }
    }

    pub fn render_str(&self, template: &str, params: &Value) -> String {
        let mut out = String::with_capacity(template.len());
        let mut rest = template;

        while let Some(start) = rest.find("{{") {
            out.push_str(&rest[..start]);
            let after = &rest[start..];
            let (raw, open, close) = if after.starts_with("{{{") {
                (true, 3, "}}}")
            } else {
                (false, 2, "}}")
            };
            let Some(end) = after[open..].find(close) else {
                // Unterminated tag, keep the remainder verbatim.
                out.push_str(after);
                return out;
            };
            let name = after[open..open + end].trim();
            let value = lookup(params, name);
            if raw {
                out.push_str(&value);
            } else {
                out.push_str(&escape_html(&value));
            }
            rest = &after[open + end + close.len()..];
        }

        out.push_str(rest);
        out
    }
}

impl View for TemplateView {
    fn default_extension(&self) -> &str {
        &self.default_extension
    }

    fn render_file(
        &self,
        path: &Path,
        params: &Value,
        _ctx: &ViewContext<'_>,
    ) -> Result<String, DispatchError> {
        if !path.is_file() {
            return Err(DispatchError::InvalidPath(format!(
                "The view file does not exist: {}",
                path.display()
            )));
        }
        let template = fs::read_to_string(path).map_err(|err| {
            DispatchError::InvalidPath(format!("failed to read view file {}: {err}", path.display()))
        })?;
        tracing::trace!(file = %path.display(), "rendering view file");
        Ok(self.render_str(&template, params))
    }
}

fn lookup(params: &Value, name: &str) -> String {
    let mut current = params;
    for segment in name.split('.') {
        match current.get(segment) {
            Some(next) => current = next,
            None => return String::new(),
        }
    }
    match current {
        Value::Null => String::new(),
        Value::String(text) => text.clone(),
        other => other.to_string(),
    }
}

fn escape_html(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#039;"),
            _ => escaped.push(c),
        }
    }
    escaped
}

#[cfg(test)]
#[path = "tests/view_tests.rs"]
mod tests;
