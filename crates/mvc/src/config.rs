use std::{collections::BTreeMap, fs, path::Path, path::PathBuf};

use serde::Deserialize;

use crate::{error::DispatchError, view::Layout, view::STANDARD_EXTENSION};

/// Bootstrap configuration of an application, usually read from TOML.
///
/// ```toml
/// id = "basic"
/// base_path = "app"
/// layout = "main"
///
/// [aliases]
/// "@themes" = "@app/themes"
///
/// [modules.admin]
/// layout = "admin"
/// ```
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ApplicationConfig {
    pub id: String,
    pub name: String,
    pub base_path: PathBuf,
    pub default_route: String,
    pub layout: LayoutSetting,
    pub aliases: BTreeMap<String, String>,
    pub view: ViewConfig,
    pub modules: BTreeMap<String, ModuleConfig>,
    /// Collaborators such as databases, caches or mailers. Accepted so that
    /// shared config files parse, not interpreted here.
    pub components: BTreeMap<String, toml::Value>,
}

impl Default for ApplicationConfig {
    fn default() -> Self {
        Self {
            id: "app".into(),
            name: "My Application".into(),
            base_path: PathBuf::from("."),
            default_route: "site".into(),
            layout: LayoutSetting::Name("main".into()),
            aliases: BTreeMap::new(),
            view: ViewConfig::default(),
            modules: BTreeMap::new(),
            components: BTreeMap::new(),
        }
    }
}

impl ApplicationConfig {
    pub fn from_toml_str(raw: &str) -> Result<Self, DispatchError> {
        toml::from_str(raw).map_err(|err| DispatchError::InvalidConfig(err.to_string()))
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, DispatchError> {
        let path = path.as_ref();
        let raw = fs::read_to_string(path).map_err(|err| {
            DispatchError::InvalidConfig(format!("failed to read '{}': {err}", path.display()))
        })?;
        Self::from_toml_str(&raw)
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ModuleConfig {
    pub layout: Option<LayoutSetting>,
    pub base_path: Option<PathBuf>,
    pub default_route: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ViewConfig {
    pub default_extension: String,
}

impl Default for ViewConfig {
    fn default() -> Self {
        Self {
            default_extension: STANDARD_EXTENSION.into(),
        }
    }
}

/// `layout = "name"` or `layout = false`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum LayoutSetting {
    Name(String),
    Enabled(bool),
}

impl LayoutSetting {
    pub fn into_layout(self) -> Result<Layout, DispatchError> {
        match self {
            Self::Name(name) if name.is_empty() => Err(DispatchError::InvalidConfig(
                "layout name must not be empty".into(),
            )),
            Self::Name(name) => Ok(Layout::Named(name)),
            Self::Enabled(false) => Ok(Layout::Disabled),
            Self::Enabled(true) => Err(DispatchError::InvalidConfig(
                "layout = true is ambiguous, name the layout instead".into(),
            )),
        }
    }
}
