use askama::Template;
use std::sync::Arc;

use super::{is_skipped, LayerContext, ModelNames};
use crate::analysis::ModelAnalysis;
use crate::config::GeneratorConfig;
use crate::generator::naming::field_ident;
use crate::generator::orchestrator::{ArtifactFile, LayerGenerator};
use crate::schema::{Field, FieldType, Model, ScalarType};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum CheckKind {
    NonEmpty,
    OneOf,
    Slug,
    NonNegative,
}

#[derive(Debug, Clone)]
pub(crate) struct Check {
    /// Rust member name on the input struct.
    pub field: String,
    /// Name reported in errors.
    pub label: String,
    pub optional: bool,
    pub kind: CheckKind,
    /// Quoted, comma-separated values for `OneOf`.
    pub allowed: String,
}

#[derive(Debug, Clone)]
pub(crate) struct CheckGroup {
    pub function: String,
    pub input_type: String,
    pub checks: Vec<Check>,
}

#[derive(Template)]
#[template(path = "validator.rs.txt", escape = "none")]
struct ValidatorTemplateData {
    model_name: String,
    /// `crate::dto::x::{CreateXInput, UpdateXInput}`
    dto_use: String,
    groups: Vec<CheckGroup>,
    needs_slug: bool,
}

/// Field checks for create and update inputs.
pub struct ValidatorLayer {
    context: Arc<LayerContext>,
}

impl ValidatorLayer {
    pub fn new(context: Arc<LayerContext>) -> Self {
        Self { context }
    }

    fn checks_for(&self, field: &Field, slug: Option<&str>, counters: &[&str]) -> anyhow::Result<Vec<(CheckKind, String)>> {
        let mut checks = Vec::new();
        match &field.field_type {
            FieldType::Scalar(ScalarType::String) if slug == Some(field.name.as_str()) => {
                checks.push((CheckKind::Slug, String::new()));
            }
            FieldType::Scalar(ScalarType::String) if field.is_required && !field.has_default_value => {
                checks.push((CheckKind::NonEmpty, String::new()));
            }
            FieldType::Scalar(ty) if ty.is_integer() && counters.contains(&field.name.as_str()) => {
                checks.push((CheckKind::NonNegative, String::new()));
            }
            FieldType::Enum(name) => {
                let values = self
                    .context
                    .enums
                    .get(name)
                    .ok_or_else(|| anyhow::anyhow!("enum '{name}' used by '{}' is not known to the validator layer", field.name))?;
                let allowed = values
                    .iter()
                    .map(|v| format!("{v:?}"))
                    .collect::<Vec<_>>()
                    .join(", ");
                checks.push((CheckKind::OneOf, allowed));
            }
            _ => {}
        }
        Ok(checks)
    }
}

impl LayerGenerator<GeneratorConfig> for ValidatorLayer {
    fn name(&self) -> &str {
        "validator"
    }

    fn generate(
        &self,
        model: &Model,
        analysis: &ModelAnalysis,
        config: &GeneratorConfig,
    ) -> anyhow::Result<Vec<ArtifactFile>> {
        if is_skipped(model) {
            return Ok(Vec::new());
        }
        let names = ModelNames::of(model);
        let special = &analysis.special_fields;
        let counters: Vec<&str> = [special.views.as_deref(), special.likes.as_deref()]
            .into_iter()
            .flatten()
            .collect();

        let mut create = Vec::new();
        let mut update = Vec::new();
        for field in model.scalar_fields() {
            if field.is_list || model.id_fields.contains(&field.name) {
                continue;
            }
            let in_create = special.deleted_at.as_deref() != Some(field.name.as_str());
            for (kind, allowed) in self.checks_for(field, special.slug.as_deref(), &counters)? {
                let check = Check {
                    field: field_ident(&field.name),
                    label: field.name.clone(),
                    optional: !field.is_required || field.has_default_value,
                    kind,
                    allowed,
                };
                if in_create {
                    create.push(check.clone());
                }
                update.push(Check {
                    optional: true,
                    ..check
                });
            }
        }

        let needs_slug = create.iter().chain(&update).any(|c| c.kind == CheckKind::Slug);
        let rendered = ValidatorTemplateData {
            model_name: names.model_name.clone(),
            dto_use: format!(
                "{}::{{{}, {}}}",
                names.import(&config.import_root, "dto"),
                names.create_input(),
                names.update_input()
            ),
            groups: vec![
                CheckGroup {
                    function: format!("validate_create_{}", names.module),
                    input_type: names.create_input(),
                    checks: create,
                },
                CheckGroup {
                    function: format!("validate_update_{}", names.module),
                    input_type: names.update_input(),
                    checks: update,
                },
            ],
            needs_slug,
        }
        .render()?;
        Ok(vec![ArtifactFile::new(format!("validators/{}", names.module), rendered)])
    }
}
