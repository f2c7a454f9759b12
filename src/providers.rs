//! # Provider Registry
//!
//! Data-access scaffolding differs per database provider: which crates the
//! generated service imports, what client type it holds, how the client is
//! built, and which settings must be present. Each provider is described by a
//! [`ProviderDescriptor`] and looked up by name; adding a provider is a
//! [`ProviderRegistry::register`] call, not a new branch in the generators.
//!
//! Client setup snippets may reference settings as `{key}` placeholders. They
//! are filled from the `provider_config` table of the generator config, and
//! every key in `required_config_keys` must be present there.

use std::collections::BTreeMap;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProviderDescriptor {
    pub name: String,
    /// `use` paths added to generated services.
    pub imports: Vec<String>,
    /// Type of the connection handle the service holds.
    pub client_type: String,
    /// Error type returned by client setup.
    pub error_type: String,
    /// Body of the generated `connect(url)` function.
    pub client_setup: String,
    pub required_config_keys: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProviderError {
    #[error("unknown provider '{name}' (known: {})", .known.join(", "))]
    Unknown { name: String, known: Vec<String> },
    #[error("provider '{provider}' requires config keys: {}", .missing.join(", "))]
    MissingConfig {
        provider: String,
        missing: Vec<String>,
    },
}

impl ProviderDescriptor {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            imports: Vec::new(),
            client_type: String::new(),
            error_type: String::new(),
            client_setup: String::new(),
            required_config_keys: Vec::new(),
        }
    }

    pub fn imports<I, S>(mut self, imports: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.imports = imports.into_iter().map(Into::into).collect();
        self
    }

    pub fn client(
        mut self,
        client_type: impl Into<String>,
        error_type: impl Into<String>,
        client_setup: impl Into<String>,
    ) -> Self {
        self.client_type = client_type.into();
        self.error_type = error_type.into();
        self.client_setup = client_setup.into();
        self
    }

    pub fn requires<I, S>(mut self, keys: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.required_config_keys = keys.into_iter().map(Into::into).collect();
        self
    }

    /// Check that every required key is configured.
    pub fn validate(&self, config: &BTreeMap<String, String>) -> Result<(), ProviderError> {
        let missing: Vec<String> = self
            .required_config_keys
            .iter()
            .filter(|k| !config.contains_key(k.as_str()))
            .cloned()
            .collect();
        if missing.is_empty() {
            Ok(())
        } else {
            Err(ProviderError::MissingConfig {
                provider: self.name.clone(),
                missing,
            })
        }
    }

    /// Client setup with `{key}` placeholders filled from `config`.
    pub fn render_client_setup(
        &self,
        config: &BTreeMap<String, String>,
    ) -> Result<String, ProviderError> {
        self.validate(config)?;
        Ok(config
            .iter()
            .fold(self.client_setup.clone(), |setup, (key, value)| {
                setup.replace(&format!("{{{key}}}"), value)
            }))
    }
}

#[derive(Debug, Clone, Default)]
pub struct ProviderRegistry {
    providers: BTreeMap<String, ProviderDescriptor>,
}

impl ProviderRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// postgresql, mysql and sqlite via sqlx; mongodb via the official driver.
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();
        registry.register(
            ProviderDescriptor::new("postgresql")
                .imports(["sqlx::postgres::PgPool"])
                .client("PgPool", "sqlx::Error", "PgPool::connect(url).await"),
        );
        registry.register(
            ProviderDescriptor::new("mysql")
                .imports(["sqlx::mysql::MySqlPool"])
                .client("MySqlPool", "sqlx::Error", "MySqlPool::connect(url).await"),
        );
        registry.register(
            ProviderDescriptor::new("sqlite")
                .imports(["sqlx::sqlite::SqlitePool"])
                .client("SqlitePool", "sqlx::Error", "SqlitePool::connect(url).await"),
        );
        registry.register(
            ProviderDescriptor::new("mongodb")
                .imports(["mongodb::Client", "mongodb::Database"])
                .client(
                    "Database",
                    "mongodb::error::Error",
                    "Ok(Client::with_uri_str(url).await?.database(\"{database}\"))",
                )
                .requires(["database"]),
        );
        registry
    }

    /// Add or replace a provider.
    pub fn register(&mut self, descriptor: ProviderDescriptor) -> Option<ProviderDescriptor> {
        self.providers.insert(descriptor.name.clone(), descriptor)
    }

    pub fn get(&self, name: &str) -> Option<&ProviderDescriptor> {
        self.providers.get(name)
    }

    /// Like [`get`](Self::get), failing with the list of known providers.
    pub fn require(&self, name: &str) -> Result<&ProviderDescriptor, ProviderError> {
        self.get(name).ok_or_else(|| ProviderError::Unknown {
            name: name.to_string(),
            known: self.names(),
        })
    }

    /// Resolve `name` and check its required settings against `config`.
    pub fn validate(
        &self,
        name: &str,
        config: &BTreeMap<String, String>,
    ) -> Result<&ProviderDescriptor, ProviderError> {
        let descriptor = self.require(name)?;
        descriptor.validate(config)?;
        Ok(descriptor)
    }

    pub fn names(&self) -> Vec<String> {
        self.providers.keys().cloned().collect()
    }
}
