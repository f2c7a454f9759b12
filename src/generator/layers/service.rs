use askama::Template;
use std::sync::Arc;

use super::{
    id_type, is_exposed, lookup_param_type, related_dto_imports, relation_return_type,
    LayerContext, ModelNames,
};
use crate::analysis::ModelAnalysis;
use crate::config::GeneratorConfig;
use crate::generator::naming::to_snake_case;
use crate::generator::orchestrator::{ArtifactFile, LayerGenerator};
use crate::schema::Model;

#[derive(Debug, Clone)]
pub(crate) struct LookupMethod {
    pub method: String,
    pub param: String,
    pub param_type: String,
    pub field: String,
}

#[derive(Debug, Clone)]
pub(crate) struct LoaderMethod {
    pub method: String,
    pub field: String,
    pub target: String,
    pub kind: String,
    pub return_type: String,
    pub self_referential: bool,
}

#[derive(Template)]
#[template(path = "service.rs.txt", escape = "none")]
struct ServiceTemplateData {
    model_name: String,
    type_name: String,
    provider: String,
    provider_imports: Vec<String>,
    client_type: String,
    error_type: String,
    client_setup: String,
    dto_use: String,
    related_imports: Vec<String>,
    id_type: String,
    create_input: String,
    update_input: String,
    lookups: Vec<LookupMethod>,
    loaders: Vec<LoaderMethod>,
    soft_delete: Option<String>,
    published: Option<String>,
    approved: Option<String>,
    counters: Vec<String>,
    parent: Option<String>,
}

/// Data-access trait and client bootstrap for the configured provider.
pub struct ServiceLayer {
    context: Arc<LayerContext>,
}

impl ServiceLayer {
    pub fn new(context: Arc<LayerContext>) -> Self {
        Self { context }
    }
}

impl LayerGenerator<GeneratorConfig> for ServiceLayer {
    fn name(&self) -> &str {
        "service"
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
        let provider = self
            .context
            .providers
            .validate(&config.provider, &config.provider_config)?;
        let client_setup = provider.render_client_setup(&config.provider_config)?;
        let names = ModelNames::of(model);
        let special = &analysis.special_fields;

        let lookups = analysis
            .unique_lookup_fields
            .iter()
            .map(|field| {
                let method = to_snake_case(field);
                LookupMethod {
                    param: method.clone(),
                    method,
                    param_type: lookup_param_type(model, field),
                    field: field.clone(),
                }
            })
            .collect();
        let loaders = analysis
            .relationships
            .iter()
            .map(|rel| LoaderMethod {
                method: format!("load_{}", to_snake_case(&rel.field)),
                field: rel.field.clone(),
                target: rel.target_model.clone(),
                kind: rel.kind.to_string(),
                return_type: relation_return_type(rel.kind.is_collection(), &rel.target_model),
                self_referential: rel.is_self_referential,
            })
            .collect();

        let rendered = ServiceTemplateData {
            model_name: names.model_name.clone(),
            type_name: names.type_name.clone(),
            provider: provider.name.clone(),
            provider_imports: provider.imports.clone(),
            client_type: provider.client_type.clone(),
            error_type: provider.error_type.clone(),
            client_setup,
            dto_use: format!(
                "{}::{{{}, {}, {}}}",
                names.import(&config.import_root, "dto"),
                names.type_name,
                names.create_input(),
                names.update_input()
            ),
            related_imports: related_dto_imports(analysis, &config.import_root),
            id_type: id_type(model)?,
            create_input: names.create_input(),
            update_input: names.update_input(),
            lookups,
            loaders,
            soft_delete: special.deleted_at.clone(),
            published: special.published.clone(),
            approved: special.approved.clone(),
            counters: [special.views.as_deref(), special.likes.as_deref()]
                .into_iter()
                .flatten()
                .map(to_snake_case)
                .collect(),
            parent: special.parent_id.clone(),
        }
        .render()?;
        Ok(vec![ArtifactFile::new(format!("services/{}", names.module), rendered)])
    }
}
