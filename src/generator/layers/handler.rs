use askama::Template;

use super::{
    id_type, is_exposed, related_dto_imports, route_plan, ModelNames, RouteDef, RouteKind, Target,
};
use crate::analysis::ModelAnalysis;
use crate::config::GeneratorConfig;
use crate::generator::orchestrator::{ArtifactFile, LayerGenerator};
use crate::schema::Model;

/// Handler body shape; the templates match on it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum HandlerKind {
    /// Paged listing (`list`, `list_published`).
    Paged,
    Create,
    Get,
    Lookup,
    Update,
    /// Id in, no content out (`delete`, `soft_delete`, `restore`).
    Command,
    Relation,
}

/// One handler function, flattened from a [`RouteDef`].
#[derive(Debug, Clone)]
pub(crate) struct HandlerView {
    pub name: String,
    pub method: String,
    pub path: String,
    pub kind: HandlerKind,
    /// Service trait method the handler delegates to.
    pub service_method: String,
    /// Extracted path value type for lookups.
    pub path_type: String,
    /// Payload type for relation loaders.
    pub return_type: String,
}

impl HandlerView {
    fn from_route(route: &RouteDef, soft_delete: bool) -> Self {
        let mut path_type = String::new();
        let mut return_type = String::new();
        let (kind, service_method) = match &route.kind {
            RouteKind::List => (HandlerKind::Paged, "list".to_string()),
            RouteKind::ListPublished => (HandlerKind::Paged, "list_published".to_string()),
            RouteKind::Create => (HandlerKind::Create, "create".to_string()),
            RouteKind::Get => (HandlerKind::Get, "get".to_string()),
            RouteKind::Update => (HandlerKind::Update, "update".to_string()),
            RouteKind::Delete if soft_delete => (HandlerKind::Command, "soft_delete".to_string()),
            RouteKind::Delete => (HandlerKind::Command, "delete".to_string()),
            RouteKind::Restore => (HandlerKind::Command, "restore".to_string()),
            RouteKind::Lookup {
                method,
                path_type: owned,
                ..
            } => {
                path_type = owned.clone();
                (HandlerKind::Lookup, format!("find_by_{method}"))
            }
            RouteKind::Relation {
                method,
                return_type: payload,
            } => {
                return_type = payload.clone();
                (HandlerKind::Relation, method.clone())
            }
        };
        Self {
            name: route.handler.clone(),
            method: route.method.to_string(),
            path: route.path.clone(),
            kind,
            service_method,
            path_type,
            return_type,
        }
    }
}

#[derive(Template)]
#[template(path = "handler_axum.rs.txt", escape = "none")]
struct AxumHandlerTemplateData {
    model_name: String,
    type_name: String,
    service_use: String,
    service_trait: String,
    dto_use: String,
    create_input: String,
    update_input: String,
    related_imports: Vec<String>,
    validator_use: Option<String>,
    validate_create: String,
    validate_update: String,
    id_type: String,
    handlers: Vec<HandlerView>,
}

#[derive(Template)]
#[template(path = "handler_actix.rs.txt", escape = "none")]
struct ActixHandlerTemplateData {
    model_name: String,
    type_name: String,
    service_use: String,
    service_trait: String,
    dto_use: String,
    create_input: String,
    update_input: String,
    related_imports: Vec<String>,
    validator_use: Option<String>,
    validate_create: String,
    validate_update: String,
    id_type: String,
    handlers: Vec<HandlerView>,
}

/// Request handlers for the configured web framework.
///
/// Handlers are generic over the model's service trait and call the
/// validators before create and update when the validator layer is enabled.
pub struct HandlerLayer;

impl LayerGenerator<GeneratorConfig> for HandlerLayer {
    fn name(&self) -> &str {
        "handler"
    }

    fn generate(
        &self,
        model: &Model,
        analysis: &ModelAnalysis,
        config: &GeneratorConfig,
    ) -> anyhow::Result<Vec<ArtifactFile>> {
        if !is_exposed(model, analysis) {
            return Ok(Vec::new());
        }
        let target = Target::from_config(config)?;
        let names = ModelNames::of(model);
        let id_type = id_type(model)?;
        let soft_delete = analysis.special_fields.deleted_at.is_some();
        let handlers: Vec<HandlerView> = route_plan(model, analysis, config)?
            .iter()
            .map(|route| HandlerView::from_route(route, soft_delete))
            .collect();

        let validate_create = format!("validate_create_{}", names.module);
        let validate_update = format!("validate_update_{}", names.module);
        let validator_use = config.layer_enabled("validator").then(|| {
            format!(
                "{}::{{{validate_create}, {validate_update}, ValidationError}}",
                names.import(&config.import_root, "validators")
            )
        });
        let service_trait = format!("{}Service", names.type_name);
        let service_use = format!(
            "{}::{{{service_trait}, Page, ServiceError}}",
            names.import(&config.import_root, "services")
        );
        let dto_use = format!(
            "{}::{{{}, {}, {}}}",
            names.import(&config.import_root, "dto"),
            names.type_name,
            names.create_input(),
            names.update_input()
        );
        let related_imports = related_dto_imports(analysis, &config.import_root);

        let rendered = match target {
            Target::Axum => AxumHandlerTemplateData {
                model_name: names.model_name.clone(),
                type_name: names.type_name.clone(),
                service_use,
                service_trait,
                dto_use,
                create_input: names.create_input(),
                update_input: names.update_input(),
                related_imports,
                validator_use,
                validate_create,
                validate_update,
                id_type,
                handlers,
            }
            .render()?,
            Target::Actix => ActixHandlerTemplateData {
                model_name: names.model_name.clone(),
                type_name: names.type_name.clone(),
                service_use,
                service_trait,
                dto_use,
                create_input: names.create_input(),
                update_input: names.update_input(),
                related_imports,
                validator_use,
                validate_create,
                validate_update,
                id_type,
                handlers,
            }
            .render()?,
        };
        Ok(vec![ArtifactFile::new(format!("handlers/{}", names.module), rendered)])
    }
}
