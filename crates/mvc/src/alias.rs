use std::{
    collections::BTreeMap,
    path::{Path, PathBuf},
};

use crate::error::DispatchError;

/// `@name` shortcuts for filesystem roots.
#[derive(Debug, Clone, Default)]
pub struct Aliases {
    entries: BTreeMap<String, PathBuf>,
}

impl Aliases {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `name` (which must start with `@`). A target that is itself
    /// an alias is resolved immediately.
    pub fn set(&mut self, name: &str, target: impl AsRef<Path>) -> Result<(), DispatchError> {
        if !name.starts_with('@') || name.len() < 2 {
            return Err(DispatchError::InvalidAlias(name.to_string()));
        }
        let name = name.trim_end_matches('/').to_string();
        let target = target.as_ref();
        let resolved = match target.to_str() {
            Some(raw) if raw.starts_with('@') => self.resolve(raw)?,
            _ => target.to_path_buf(),
        };
        self.entries.insert(name, resolved);
        Ok(())
    }

    pub fn remove(&mut self, name: &str) -> bool {
        self.entries.remove(name.trim_end_matches('/')).is_some()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }

    /// Translates `@name/rest` using the longest registered alias that
    /// prefixes it. Strings without a leading `@` are returned unchanged.
    pub fn resolve(&self, alias: &str) -> Result<PathBuf, DispatchError> {
        if !alias.starts_with('@') {
            return Ok(PathBuf::from(alias));
        }

        let matched = self
            .entries
            .iter()
            .filter(|(name, _)| {
                alias == name.as_str()
                    || alias
                        .strip_prefix(name.as_str())
                        .is_some_and(|rest| rest.starts_with('/'))
            })
            .max_by_key(|(name, _)| name.len());

        let Some((name, root)) = matched else {
            return Err(DispatchError::InvalidAlias(alias.to_string()));
        };

        let rest = alias[name.len()..].trim_start_matches('/');
        if rest.is_empty() {
            Ok(root.clone())
        } else {
            Ok(root.join(rest))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolves_longest_matching_alias() {
        let mut aliases = Aliases::new();
        aliases.set("@app", "/srv/app").expect("app");
        aliases.set("@app/themes", "/opt/themes").expect("themes");

        assert_eq!(aliases.resolve("@app").expect("root"), PathBuf::from("/srv/app"));
        assert_eq!(
            aliases.resolve("@app/views/site").expect("views"),
            PathBuf::from("/srv/app/views/site")
        );
        assert_eq!(
            aliases.resolve("@app/themes/dark").expect("themes"),
            PathBuf::from("/opt/themes/dark")
        );
    }

    #[test]
    fn alias_targets_may_reference_other_aliases() {
        let mut aliases = Aliases::new();
        aliases.set("@app", "/srv/app").expect("app");
        aliases.set("@layouts/", "@app/views/layouts").expect("layouts");
        assert_eq!(
            aliases.resolve("@layouts/main.html").expect("layout"),
            PathBuf::from("/srv/app/views/layouts/main.html")
        );
    }

    #[test]
    fn unknown_or_malformed_aliases_fail() {
        let mut aliases = Aliases::new();
        aliases.set("@app", "/srv/app").expect("app");
        assert!(matches!(
            aliases.resolve("@application/x"),
            Err(DispatchError::InvalidAlias(_))
        ));
        assert!(matches!(
            aliases.set("app", "/srv"),
            Err(DispatchError::InvalidAlias(_))
        ));
        assert_eq!(
            aliases.resolve("plain/path").expect("plain"),
            PathBuf::from("plain/path")
        );
    }
}
