//! # Generator Configuration
//!
//! Per-run settings for the built-in layers, loaded from a `modelforge.toml`
//! that sits next to the schema (or passed explicitly with `--config`).
//!
//! ```toml
//! target = "axum"
//! provider = "mongodb"
//! import_root = "crate"
//! route_prefix = "/api/v1"
//! layers = ["dto", "validator", "service"]
//! parallel = true
//!
//! [provider_config]
//! database = "blog"
//! ```
//!
//! ## Environment Variables
//!
//! Applied after the file by [`GeneratorConfig::apply_env`]:
//!
//! - `MODELFORGE_TARGET` - overrides `target`
//! - `MODELFORGE_PROVIDER` - overrides `provider`
//! - `MODELFORGE_PARALLEL` - `1`/`true`/`yes`/`on` enables parallel generation,
//!   `0`/`false`/`no`/`off` disables it
//!
//! The orchestrator never reads this type; it is forwarded untouched to the
//! layer generators.

use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

pub const CONFIG_FILE_NAME: &str = "modelforge.toml";

/// Names of the built-in layers, in generation order.
pub const BUILTIN_LAYERS: [&str; 5] = ["dto", "validator", "service", "handler", "routes"];

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct GeneratorConfig {
    /// Web framework the handler and route layers target (`axum` or `actix`).
    pub target: String,
    /// Provider name looked up in the provider registry.
    pub provider: String,
    /// Leading path segment of generated `use` statements.
    pub import_root: String,
    pub route_prefix: String,
    /// Enabled layers; all built-in layers when empty.
    pub layers: Vec<String>,
    pub provider_config: BTreeMap<String, String>,
    pub parallel: bool,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            target: "axum".to_string(),
            provider: "postgresql".to_string(),
            import_root: "crate".to_string(),
            route_prefix: "/api".to_string(),
            layers: Vec::new(),
            provider_config: BTreeMap::new(),
            parallel: false,
        }
    }
}

impl GeneratorConfig {
    /// Apply `MODELFORGE_*` overrides from the process environment.
    pub fn apply_env(&mut self) {
        self.apply_overrides(|key| std::env::var(key).ok());
    }

    /// Apply overrides from any key lookup; `apply_env` passes the process environment.
    pub fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(target) = lookup("MODELFORGE_TARGET").filter(|v| !v.is_empty()) {
            self.target = target;
        }
        if let Some(provider) = lookup("MODELFORGE_PROVIDER").filter(|v| !v.is_empty()) {
            self.provider = provider;
        }
        if let Some(raw) = lookup("MODELFORGE_PARALLEL") {
            match raw.trim().to_ascii_lowercase().as_str() {
                "1" | "true" | "yes" | "on" => self.parallel = true,
                "0" | "false" | "no" | "off" => self.parallel = false,
                other => tracing::warn!(value = other, "ignoring unrecognized MODELFORGE_PARALLEL"),
            }
        }
    }

    /// True when `layer` should run under this config.
    pub fn layer_enabled(&self, layer: &str) -> bool {
        self.layers.is_empty() || self.layers.iter().any(|l| l == layer)
    }

    /// Reject layer names that no built-in layer answers to.
    pub fn validate_layers(&self) -> anyhow::Result<()> {
        let unknown: Vec<&str> = self
            .layers
            .iter()
            .map(String::as_str)
            .filter(|l| !BUILTIN_LAYERS.contains(l))
            .collect();
        if unknown.is_empty() {
            Ok(())
        } else {
            anyhow::bail!(
                "unknown layer(s): {} (available: {})",
                unknown.join(", "),
                BUILTIN_LAYERS.join(", ")
            )
        }
    }
}

/// Load a generator config from a TOML file.
///
/// Returns `Ok(None)` when the file does not exist and an error when it exists
/// but cannot be read or parsed.
pub fn load_config(config_path: &Path) -> anyhow::Result<Option<GeneratorConfig>> {
    if !config_path.exists() {
        return Ok(None);
    }
    let contents = std::fs::read_to_string(config_path)
        .with_context(|| format!("Failed to read generator config: {}", config_path.display()))?;
    let config: GeneratorConfig = toml::from_str(&contents)
        .with_context(|| format!("Failed to parse generator config: {}", config_path.display()))?;
    Ok(Some(config))
}

/// Look for `modelforge.toml` in the schema's directory.
pub fn auto_detect_config_path(schema_path: &Path) -> Option<PathBuf> {
    let config_path = schema_path.parent()?.join(CONFIG_FILE_NAME);
    config_path.exists().then_some(config_path)
}

/// Resolve the config path.
///
/// Priority:
/// 1. Explicitly provided path (via CLI), when it exists
/// 2. Auto-detected alongside the schema
/// 3. None (defaults)
pub fn resolve_config_path(explicit_path: Option<&Path>, schema_path: &Path) -> Option<PathBuf> {
    if let Some(path) = explicit_path {
        if path.exists() {
            return Some(path.to_path_buf());
        }
        tracing::warn!(path = %path.display(), "config file not found, falling back to auto-detection");
    }
    auto_detect_config_path(schema_path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_defaults() {
        let config = GeneratorConfig::default();
        assert_eq!(config.target, "axum");
        assert_eq!(config.provider, "postgresql");
        assert_eq!(config.route_prefix, "/api");
        assert!(config.layer_enabled("routes"));
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let config: GeneratorConfig = toml::from_str(
            "provider = \"mongodb\"\nlayers = [\"dto\"]\n[provider_config]\ndatabase = \"blog\"\n",
        )
        .unwrap();
        assert_eq!(config.provider, "mongodb");
        assert_eq!(config.target, "axum");
        assert_eq!(config.provider_config["database"], "blog");
        assert!(config.layer_enabled("dto"));
        assert!(!config.layer_enabled("service"));
    }

    #[test]
    fn test_unknown_keys_are_rejected() {
        assert!(toml::from_str::<GeneratorConfig>("tagret = \"axum\"").is_err());
    }

    #[test]
    fn test_overrides() {
        let env: HashMap<&str, &str> = [
            ("MODELFORGE_TARGET", "actix"),
            ("MODELFORGE_PROVIDER", "sqlite"),
            ("MODELFORGE_PARALLEL", "Yes"),
        ]
        .into_iter()
        .collect();
        let mut config = GeneratorConfig::default();
        config.apply_overrides(|k| env.get(k).map(|v| v.to_string()));
        assert_eq!(config.target, "actix");
        assert_eq!(config.provider, "sqlite");
        assert!(config.parallel);

        config.apply_overrides(|k| (k == "MODELFORGE_PARALLEL").then(|| "maybe".to_string()));
        assert!(config.parallel);
    }

    #[test]
    fn test_validate_layers() {
        let mut config = GeneratorConfig::default();
        assert!(config.validate_layers().is_ok());
        config.layers = vec!["dto".into(), "graphql".into()];
        let err = config.validate_layers().unwrap_err();
        assert!(err.to_string().contains("graphql"));
    }

    #[test]
    fn test_load_and_resolve() {
        let dir = tempfile::tempdir().unwrap();
        let schema = dir.path().join("schema.json");
        assert!(resolve_config_path(None, &schema).is_none());
        assert!(load_config(&dir.path().join(CONFIG_FILE_NAME)).unwrap().is_none());

        std::fs::write(dir.path().join(CONFIG_FILE_NAME), "target = \"actix\"\n").unwrap();
        let found = resolve_config_path(Some(Path::new("/no/such/file.toml")), &schema).unwrap();
        assert_eq!(found, dir.path().join(CONFIG_FILE_NAME));
        let loaded = load_config(&found).unwrap().unwrap();
        assert_eq!(loaded.target, "actix");

        std::fs::write(&found, "target = [").unwrap();
        assert!(load_config(&found).is_err());
    }
}
