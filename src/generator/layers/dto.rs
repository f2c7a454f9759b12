use askama::Template;

use super::{doc_lines, is_skipped, ModelNames};
use crate::analysis::ModelAnalysis;
use crate::config::GeneratorConfig;
use crate::generator::naming::{base_rust_type, field_ident};
use crate::generator::orchestrator::{ArtifactFile, LayerGenerator};
use crate::schema::{Field, Model};

/// A field of a generated struct.
#[derive(Debug, Clone)]
pub(crate) struct FieldDef {
    /// Rust member name (`author_id`).
    pub name: String,
    /// Name on the wire (`authorId`).
    pub original_name: String,
    /// Full Rust type including any `Option` wrapper.
    pub ty: String,
    pub renamed: bool,
}

impl FieldDef {
    fn new(field: &Field, ty: String) -> Self {
        let name = field_ident(&field.name);
        Self {
            renamed: name.trim_start_matches("r#") != field.name,
            original_name: field.name.clone(),
            name,
            ty,
        }
    }
}

#[derive(Template)]
#[template(path = "dto.rs.txt", escape = "none")]
struct DtoTemplateData {
    model_name: String,
    type_name: String,
    create_input: String,
    update_input: String,
    doc_lines: Vec<String>,
    fields: Vec<FieldDef>,
    create_fields: Vec<FieldDef>,
    update_fields: Vec<FieldDef>,
}

/// Entity struct plus create and update inputs.
pub struct DtoLayer;

impl LayerGenerator<GeneratorConfig> for DtoLayer {
    fn name(&self) -> &str {
        "dto"
    }

    fn generate(
        &self,
        model: &Model,
        analysis: &ModelAnalysis,
        _config: &GeneratorConfig,
    ) -> anyhow::Result<Vec<ArtifactFile>> {
        if is_skipped(model) {
            return Ok(Vec::new());
        }
        let names = ModelNames::of(model);
        let soft_delete = analysis.special_fields.deleted_at.as_deref();

        let mut fields = Vec::new();
        let mut create_fields = Vec::new();
        let mut update_fields = Vec::new();
        for field in model.scalar_fields() {
            let Some(base) = base_rust_type(field) else {
                continue;
            };
            let nullable = !field.is_required && !field.is_list;
            let generated_id = model.id_fields.contains(&field.name) && field.has_default_value;

            fields.push(FieldDef::new(field, optional_if(nullable, &base)));
            if !generated_id && soft_delete != Some(field.name.as_str()) {
                let omittable = nullable || field.has_default_value;
                create_fields.push(FieldDef::new(field, optional_if(omittable, &base)));
            }
            if !model.id_fields.contains(&field.name) {
                update_fields.push(FieldDef::new(field, format!("Option<{base}>")));
            }
        }

        let rendered = DtoTemplateData {
            model_name: names.model_name.clone(),
            type_name: names.type_name.clone(),
            create_input: names.create_input(),
            update_input: names.update_input(),
            doc_lines: doc_lines(model),
            fields,
            create_fields,
            update_fields,
        }
        .render()?;
        Ok(vec![ArtifactFile::new(format!("dto/{}", names.module), rendered)])
    }
}

fn optional_if(optional: bool, base: &str) -> String {
    if optional {
        format!("Option<{base}>")
    } else {
        base.to_string()
    }
}
