//! # Built-in Layers
//!
//! Five [`LayerGenerator`]s that turn one model and its cached analysis into
//! Rust source for the target application, rendered with Askama templates from
//! `templates/`:
//!
//! | layer       | logical id            | contents                                  |
//! |-------------|-----------------------|-------------------------------------------|
//! | `dto`       | `dto/<model>`         | entity struct, create/update inputs       |
//! | `validator` | `validators/<model>`  | input checks (required, enum, slug)       |
//! | `service`   | `services/<model>`    | data-access trait, provider `connect`     |
//! | `handler`   | `handlers/<model>`    | request handlers for the chosen framework |
//! | `routes`    | `routes/<model>`      | route table and router/config function    |
//!
//! Models annotated `@skip` produce nothing. Junction tables only get a DTO and
//! a validator; they are reached through the relation loaders of both sides.
//! `@route("/prefix")` replaces the model's base route.

mod dto;
mod handler;
mod routes;
mod service;
mod validator;

pub use dto::DtoLayer;
pub use handler::HandlerLayer;
pub use routes::RoutesLayer;
pub use service::ServiceLayer;
pub use validator::ValidatorLayer;

use std::collections::BTreeMap;
use std::sync::Arc;

use super::naming::{base_rust_type, pluralize, to_kebab_case, to_pascal_case, to_snake_case};
use super::orchestrator::LayerGenerator;
use crate::analysis::ModelAnalysis;
use crate::config::{GeneratorConfig, BUILTIN_LAYERS};
use crate::providers::ProviderRegistry;
use crate::schema::{EnumDef, Model, ScalarType};

/// Shared, read-only inputs of the built-in layers beyond the model itself.
#[derive(Debug, Clone, Default)]
pub struct LayerContext {
    pub providers: ProviderRegistry,
    /// Enum name → allowed values.
    pub enums: BTreeMap<String, Vec<String>>,
}

impl LayerContext {
    pub fn new(providers: ProviderRegistry) -> Self {
        Self {
            providers,
            enums: BTreeMap::new(),
        }
    }

    pub fn with_enums<'a>(mut self, enums: impl IntoIterator<Item = &'a EnumDef>) -> Self {
        self.enums = enums
            .into_iter()
            .map(|e| (e.name.clone(), e.values.clone()))
            .collect();
        self
    }
}

/// The built-in layers enabled by `config`, in generation order.
pub fn builtin_layers(
    config: &GeneratorConfig,
    context: Arc<LayerContext>,
) -> Vec<Box<dyn LayerGenerator<GeneratorConfig>>> {
    BUILTIN_LAYERS
        .iter()
        .filter(|name| config.layer_enabled(name))
        .filter_map(|name| -> Option<Box<dyn LayerGenerator<GeneratorConfig>>> {
            match *name {
                "dto" => Some(Box::new(DtoLayer)),
                "validator" => Some(Box::new(ValidatorLayer::new(Arc::clone(&context)))),
                "service" => Some(Box::new(ServiceLayer::new(Arc::clone(&context)))),
                "handler" => Some(Box::new(HandlerLayer)),
                "routes" => Some(Box::new(RoutesLayer)),
                _ => None,
            }
        })
        .collect()
}

/// Web framework targeted by the handler and route layers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Target {
    Axum,
    Actix,
}

impl Target {
    pub(crate) fn from_config(config: &GeneratorConfig) -> anyhow::Result<Self> {
        match config.target.to_ascii_lowercase().as_str() {
            "axum" => Ok(Target::Axum),
            "actix" | "actix-web" => Ok(Target::Actix),
            other => anyhow::bail!("unsupported target '{other}' (expected axum or actix)"),
        }
    }
}

/// Names derived once per model and shared by every template.
#[derive(Debug, Clone)]
pub(crate) struct ModelNames {
    pub model_name: String,
    pub type_name: String,
    /// snake_case module name, also the last logical id segment.
    pub module: String,
    pub plural: String,
}

impl ModelNames {
    pub(crate) fn of(model: &Model) -> Self {
        let module = to_snake_case(&model.name);
        Self {
            model_name: model.name.clone(),
            type_name: to_pascal_case(&model.name),
            plural: pluralize(&module),
            module,
        }
    }

    pub(crate) fn create_input(&self) -> String {
        format!("Create{}Input", self.type_name)
    }

    pub(crate) fn update_input(&self) -> String {
        format!("Update{}Input", self.type_name)
    }

    pub(crate) fn import(&self, import_root: &str, layer_dir: &str) -> String {
        format!("{import_root}::{layer_dir}::{}", self.module)
    }
}

pub(crate) fn is_skipped(model: &Model) -> bool {
    model.has_annotation("skip")
}

/// Models that get a service, handlers and routes.
pub(crate) fn is_exposed(model: &Model, analysis: &ModelAnalysis) -> bool {
    !is_skipped(model) && !analysis.is_junction_table
}

/// Rust type of the model's primary key; a tuple for composite keys.
pub(crate) fn id_type(model: &Model) -> anyhow::Result<String> {
    let types = model
        .id_fields
        .iter()
        .map(|name| {
            model
                .field(name)
                .and_then(base_rust_type)
                .ok_or_else(|| anyhow::anyhow!("id field '{name}' of '{}' is not a column", model.name))
        })
        .collect::<anyhow::Result<Vec<String>>>()?;
    match types.as_slice() {
        [] => anyhow::bail!("model '{}' has no id field", model.name),
        [single] => Ok(single.clone()),
        many => Ok(format!("({})", many.join(", "))),
    }
}

/// Parameter type for looking a row up by `field`.
pub(crate) fn lookup_param_type(model: &Model, field: &str) -> String {
    match model.field(field).and_then(|f| f.field_type.scalar()) {
        Some(ScalarType::String) | None => "str".to_string(),
        Some(_) => model
            .field(field)
            .and_then(base_rust_type)
            .unwrap_or_else(|| "str".to_string()),
    }
}

/// Owned counterpart of [`lookup_param_type`] for path extraction.
pub(crate) fn lookup_path_type(model: &Model, field: &str) -> String {
    match lookup_param_type(model, field).as_str() {
        "str" => "String".to_string(),
        other => other.to_string(),
    }
}

/// What a route does; decides the handler body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum RouteKind {
    List,
    Create,
    Get,
    Update,
    Delete,
    Restore,
    ListPublished,
    /// `param_type` is borrowed by the service (`&str`), `path_type` is owned by the extractor.
    Lookup {
        method: String,
        param_type: String,
        path_type: String,
    },
    Relation { method: String, return_type: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct RouteDef {
    pub method: &'static str,
    pub path: String,
    pub handler: String,
    pub kind: RouteKind,
}

impl RouteDef {
    pub fn method_lower(&self) -> String {
        self.method.to_ascii_lowercase()
    }
}

/// Base path of the model's routes: `@route("/x")` or `<prefix>/<plural>`.
pub(crate) fn base_route(model: &Model, names: &ModelNames, config: &GeneratorConfig) -> anyhow::Result<String> {
    if let Some(annotation) = model.annotation("route") {
        let Some(path) = annotation.first_arg() else {
            anyhow::bail!("@route on '{}' needs a path argument", model.name);
        };
        if !path.starts_with('/') {
            anyhow::bail!("@route path '{path}' on '{}' must start with '/'", model.name);
        }
        return Ok(path.trim_end_matches('/').to_string());
    }
    let prefix = config.route_prefix.trim_end_matches('/');
    Ok(format!("{prefix}/{}", names.plural.replace('_', "-")))
}

/// Every route of an exposed model, in a fixed order.
pub(crate) fn route_plan(
    model: &Model,
    analysis: &ModelAnalysis,
    config: &GeneratorConfig,
) -> anyhow::Result<Vec<RouteDef>> {
    let names = ModelNames::of(model);
    let base = base_route(model, &names, config)?;
    let item = match model.id_fields.as_slice() {
        [_] | [] => format!("{base}/{{id}}"),
        keys => {
            let segments: Vec<String> = keys.iter().map(|k| format!("{{{}}}", to_snake_case(k))).collect();
            format!("{base}/{}", segments.join("/"))
        }
    };
    let module = &names.module;

    let mut routes = vec![
        RouteDef {
            method: "GET",
            path: base.clone(),
            handler: format!("list_{}", names.plural),
            kind: RouteKind::List,
        },
        RouteDef {
            method: "POST",
            path: base.clone(),
            handler: format!("create_{module}"),
            kind: RouteKind::Create,
        },
    ];
    if analysis.special_fields.published.is_some() {
        routes.push(RouteDef {
            method: "GET",
            path: format!("{base}/published"),
            handler: format!("list_published_{}", names.plural),
            kind: RouteKind::ListPublished,
        });
    }
    for field in &analysis.unique_lookup_fields {
        let method = to_snake_case(field);
        routes.push(RouteDef {
            method: "GET",
            path: format!("{base}/by-{}/{{value}}", to_kebab_case(field)),
            handler: format!("get_{module}_by_{method}"),
            kind: RouteKind::Lookup {
                param_type: lookup_param_type(model, field),
                path_type: lookup_path_type(model, field),
                method,
            },
        });
    }
    routes.extend([
        RouteDef {
            method: "GET",
            path: item.clone(),
            handler: format!("get_{module}"),
            kind: RouteKind::Get,
        },
        RouteDef {
            method: "PUT",
            path: item.clone(),
            handler: format!("update_{module}"),
            kind: RouteKind::Update,
        },
        RouteDef {
            method: "DELETE",
            path: item.clone(),
            handler: format!("delete_{module}"),
            kind: RouteKind::Delete,
        },
    ]);
    if analysis.special_fields.deleted_at.is_some() {
        routes.push(RouteDef {
            method: "POST",
            path: format!("{item}/restore"),
            handler: format!("restore_{module}"),
            kind: RouteKind::Restore,
        });
    }
    for rel in &analysis.relationships {
        let field = to_snake_case(&rel.field);
        let verb = if rel.kind.is_collection() { "list" } else { "get" };
        routes.push(RouteDef {
            method: "GET",
            path: format!("{item}/{}", to_kebab_case(&rel.field)),
            handler: format!("{verb}_{module}_{field}"),
            kind: RouteKind::Relation {
                method: format!("load_{field}"),
                return_type: relation_return_type(rel.kind.is_collection(), &rel.target_model),
            },
        });
    }
    Ok(routes)
}

pub(crate) fn relation_return_type(collection: bool, target_model: &str) -> String {
    let target = to_pascal_case(target_model);
    if collection {
        format!("Vec<{target}>")
    } else {
        format!("Option<{target}>")
    }
}

/// `use` lines for the DTOs of related models, excluding the model itself.
pub(crate) fn related_dto_imports(analysis: &ModelAnalysis, import_root: &str) -> Vec<String> {
    let mut imports: Vec<String> = analysis
        .relationships
        .iter()
        .filter(|r| !r.is_self_referential)
        .map(|r| {
            format!(
                "{import_root}::dto::{}::{}",
                to_snake_case(&r.target_model),
                to_pascal_case(&r.target_model)
            )
        })
        .collect();
    imports.sort();
    imports.dedup();
    imports
}

pub(crate) fn doc_lines(model: &Model) -> Vec<String> {
    model
        .documentation
        .as_deref()
        .map(|doc| {
            doc.lines()
                .map(str::trim)
                .filter(|l| !l.is_empty() && !l.starts_with('@'))
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default()
}
