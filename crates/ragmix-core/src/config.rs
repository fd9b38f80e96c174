//! Layered configuration loader and path helpers.
//!
//! Uses Figment to merge `config.toml` + `config.<env>.toml` + `APP_*` env vars
//! (`__` separates nested keys). Missing keys fall back to the serde defaults
//! of [`Settings`]. Path settings have `~` and `${VAR}` expanded, and relative
//! ones are resolved against the config file's directory when there is one.

use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use std::env;
use std::path::{Path, PathBuf};

use crate::error::{Error, Result};
use crate::settings::{EmbeddingSettings, Settings};

pub struct Config {
    figment: Figment,
    base: Option<PathBuf>,
}

impl Config {
    pub fn load() -> Result<Self> {
        let env_name = env::var("RUST_ENV").unwrap_or_else(|_| "dev".to_string());

        let mut figment = Self::defaults().merge(Toml::file("config.toml"));
        match env_name.as_str() {
            "dev" | "development" => figment = figment.merge(Toml::file("config.dev.toml")),
            "prod" | "production" => figment = figment.merge(Toml::file("config.prod.toml")),
            "test" | "testing" => figment = figment.merge(Toml::file("config.test.toml")),
            _ => {}
        }
        figment = figment.merge(Env::prefixed("APP_").split("__"));

        let config = Self { figment, base: None };
        config.settings()?;
        Ok(config)
    }

    /// Load from an explicit file instead of the working-directory lookup.
    /// Relative paths inside it resolve against the file's directory.
    pub fn from_file(path: &Path) -> Result<Self> {
        let figment = Self::defaults().merge(Toml::file(path)).merge(Env::prefixed("APP_").split("__"));
        let base = path.parent().map(Path::to_path_buf);
        let config = Self { figment, base };
        config.settings()?;
        Ok(config)
    }

    pub fn from_toml_str(toml: &str) -> Result<Self> {
        let config = Self { figment: Self::defaults().merge(Toml::string(toml)), base: None };
        config.settings()?;
        Ok(config)
    }

    /// Typed lookup of one dotted key, defaults included
    /// (`get::<u32>("fusion.rrf_k")`).
    pub fn get<T>(&self, key: &str) -> Result<T>
    where
        T: serde::de::DeserializeOwned,
    {
        Figment::from(Serialized::defaults(self.settings()?))
            .extract_inner(key)
            .map_err(|e| Error::InvalidConfig(format!("Failed to get '{}': {}", key, e)))
    }

    /// The whole typed settings tree, validated, with path fields expanded.
    pub fn settings(&self) -> Result<Settings> {
        let mut settings: Settings = self
            .figment
            .extract()
            .map_err(|e| Error::InvalidConfig(e.to_string()))?;
        settings.validate()?;
        if let EmbeddingSettings::Local { model_dir, .. } = &mut settings.embedding {
            let raw = model_dir.to_string_lossy().into_owned();
            *model_dir = match &self.base {
                Some(base) => resolve_with_base(base, raw),
                None => expand_path(raw),
            };
        }
        Ok(settings)
    }

    // Variant-tagged sections (`embedding`, `generation`) must not inherit
    // fields from another variant, so defaults come from serde rather than a
    // merged provider.
    fn defaults() -> Figment {
        Figment::new()
    }
}

/// Expand a user-provided path string:
/// - Expands leading '~' to the user's home directory
/// - Expands ${VAR} and $VAR environment variables
/// - Returns a PathBuf without attempting to canonicalize
pub fn expand_path<S: AsRef<str>>(input: S) -> PathBuf {
    let s = input.as_ref();
    let expanded_env = shellexpand::env(s).unwrap_or(std::borrow::Cow::Borrowed(s));
    let expanded = shellexpand::tilde(&expanded_env);
    PathBuf::from(expanded.as_ref())
}

/// Resolve a possibly relative path against a given base directory after expansion.
/// If `p` is absolute, it's returned as-is; otherwise `base.join(p)` is returned.
pub fn resolve_with_base<S: AsRef<str>>(base: &Path, p: S) -> PathBuf {
    let p = expand_path(p);
    if p.is_absolute() { p } else { base.join(p) }
}
