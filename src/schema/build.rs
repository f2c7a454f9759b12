use serde::Serialize;
use sha2::{Digest, Sha256};
use std::collections::{HashMap, HashSet};

use super::annotations::parse_annotations;
use super::error::SchemaError;
use super::load::{RawField, RawFieldKind, RawModel, RawSchema};
use super::types::{EnumDef, Field, FieldType, Model, ParsedSchema, ScalarType};

/// Validate a raw document and freeze it into a [`ParsedSchema`].
///
/// Every relation must resolve to a declared model, every enum field to a
/// declared enum, and every constraint or FK list to existing fields. The
/// back-reference index built here is what keeps relationship analysis linear
/// in the number of relation fields.
pub fn build_schema(raw: RawSchema) -> Result<ParsedSchema, SchemaError> {
    let mut enum_names = HashSet::new();
    for e in &raw.enums {
        if !enum_names.insert(e.name.clone()) {
            return Err(SchemaError::malformed(
                format!("enum:{}", e.name),
                "enum declared more than once",
            ));
        }
    }

    let mut model_map = HashMap::with_capacity(raw.models.len());
    for (idx, m) in raw.models.iter().enumerate() {
        if m.name.trim().is_empty() {
            return Err(SchemaError::malformed(
                format!("model#{idx}"),
                "model name is empty",
            ));
        }
        if model_map.insert(m.name.clone(), idx).is_some() {
            return Err(SchemaError::malformed(
                format!("model:{}", m.name),
                "model declared more than once",
            ));
        }
    }

    let mut models = Vec::with_capacity(raw.models.len());
    for raw_model in raw.models {
        models.push(build_model(raw_model, &model_map, &enum_names)?);
    }

    for model in &models {
        validate_relation_columns(model, &models, &model_map)?;
    }

    let back_refs = models
        .iter()
        .map(|model| {
            let mut by_type: HashMap<String, Vec<usize>> = HashMap::new();
            for (idx, field) in model.relation_fields() {
                if let Some(target) = field.field_type.relation_target() {
                    by_type.entry(target.to_string()).or_default().push(idx);
                }
            }
            by_type
        })
        .collect();

    let enums = raw
        .enums
        .into_iter()
        .map(|e| EnumDef {
            name: e.name,
            values: e.values,
        })
        .collect::<Vec<_>>();

    let fingerprint = fingerprint(&models, &enums)?;

    Ok(ParsedSchema {
        models,
        enums,
        model_map,
        back_refs,
        fingerprint,
    })
}

fn build_model(
    raw: RawModel,
    model_map: &HashMap<String, usize>,
    enum_names: &HashSet<String>,
) -> Result<Model, SchemaError> {
    let mut seen = HashSet::new();
    let mut fields = Vec::with_capacity(raw.fields.len());
    for raw_field in raw.fields {
        if !seen.insert(raw_field.name.clone()) {
            return Err(SchemaError::malformed(
                format!("model:{}.{}", raw.name, raw_field.name),
                "field declared more than once",
            ));
        }
        fields.push(build_field(&raw.name, raw_field, model_map, enum_names)?);
    }

    let id_fields = if raw.primary_key.is_empty() {
        fields
            .iter()
            .filter(|f| f.is_id)
            .map(|f| f.name.clone())
            .collect::<Vec<_>>()
    } else {
        raw.primary_key
    };
    for name in id_fields.iter().chain(raw.unique_fields.iter().flatten()) {
        if !seen.contains(name) {
            return Err(SchemaError::malformed(
                format!("model:{}", raw.name),
                format!("key or unique constraint references unknown field '{name}'"),
            ));
        }
    }
    if raw.unique_fields.iter().any(Vec::is_empty) {
        return Err(SchemaError::malformed(
            format!("model:{}", raw.name),
            "unique constraint with no fields",
        ));
    }

    let mut scalar_indices = Vec::new();
    let mut relation_indices = Vec::new();
    for (idx, field) in fields.iter().enumerate() {
        if field.is_relation() {
            relation_indices.push(idx);
        } else {
            scalar_indices.push(idx);
        }
    }

    let annotations = raw
        .documentation
        .as_deref()
        .map(parse_annotations)
        .unwrap_or_default();

    Ok(Model {
        name: raw.name,
        fields,
        id_fields,
        unique_constraints: raw.unique_fields,
        documentation: raw.documentation,
        annotations,
        scalar_indices,
        relation_indices,
    })
}

fn build_field(
    model: &str,
    raw: RawField,
    model_map: &HashMap<String, usize>,
    enum_names: &HashSet<String>,
) -> Result<Field, SchemaError> {
    let field_type = match raw.kind {
        RawFieldKind::Scalar => match ScalarType::parse(&raw.ty) {
            Some(ty) => FieldType::Scalar(ty),
            None => {
                return Err(SchemaError::UnknownScalar {
                    model: model.to_string(),
                    field: raw.name,
                    ty: raw.ty,
                })
            }
        },
        RawFieldKind::Enum => {
            if !enum_names.contains(&raw.ty) {
                return Err(SchemaError::UnresolvedEnum {
                    model: model.to_string(),
                    field: raw.name,
                    target: raw.ty,
                });
            }
            FieldType::Enum(raw.ty)
        }
        RawFieldKind::Object => {
            if !model_map.contains_key(&raw.ty) {
                return Err(SchemaError::UnresolvedRelation {
                    model: model.to_string(),
                    field: raw.name,
                    target: raw.ty,
                });
            }
            FieldType::Relation(raw.ty)
        }
    };

    let is_relation = matches!(field_type, FieldType::Relation(_));
    if !is_relation
        && (raw.relation_name.is_some()
            || !raw.relation_from_fields.is_empty()
            || !raw.relation_to_fields.is_empty())
    {
        return Err(SchemaError::malformed(
            format!("model:{model}.{}", raw.name),
            "relation attributes on a non-relation field",
        ));
    }
    if is_relation && raw.is_list && !raw.relation_from_fields.is_empty() {
        return Err(SchemaError::malformed(
            format!("model:{model}.{}", raw.name),
            "list relation cannot own foreign key columns",
        ));
    }

    Ok(Field {
        name: raw.name,
        field_type,
        is_list: raw.is_list,
        // Lists are never "required" in the nullable sense.
        is_required: raw.is_required && !raw.is_list,
        is_unique: raw.is_unique,
        is_id: raw.is_id,
        has_default_value: raw.has_default_value,
        relation_name: raw.relation_name,
        relation_from_fields: raw.relation_from_fields,
        relation_to_fields: raw.relation_to_fields,
        documentation: raw.documentation,
    })
}

// FK columns must be scalars on the owning model; referenced columns must exist on the target.
fn validate_relation_columns(
    model: &Model,
    models: &[Model],
    model_map: &HashMap<String, usize>,
) -> Result<(), SchemaError> {
    for (_, field) in model.relation_fields() {
        let location = || format!("model:{}.{}", model.name, field.name);
        if field.relation_from_fields.len() != field.relation_to_fields.len() {
            return Err(SchemaError::malformed(
                location(),
                "relationFromFields and relationToFields differ in length",
            ));
        }
        for from in &field.relation_from_fields {
            match model.field(from) {
                Some(col) if !col.is_relation() => {}
                _ => {
                    return Err(SchemaError::malformed(
                        location(),
                        format!("foreign key column '{from}' is not a scalar field"),
                    ))
                }
            }
        }
        let Some(target) = field
            .field_type
            .relation_target()
            .and_then(|t| model_map.get(t))
            .map(|&i| &models[i])
        else {
            continue;
        };
        for to in &field.relation_to_fields {
            if target.field(to).is_none() {
                return Err(SchemaError::malformed(
                    location(),
                    format!("referenced column '{to}' does not exist on '{}'", target.name),
                ));
            }
        }
    }
    Ok(())
}

#[derive(Serialize)]
struct CanonicalSchema<'a> {
    models: &'a [Model],
    enums: &'a [EnumDef],
}

fn fingerprint(models: &[Model], enums: &[EnumDef]) -> Result<String, SchemaError> {
    let canonical = serde_json::to_vec(&CanonicalSchema { models, enums })
        .map_err(|e| SchemaError::Parse(e.to_string()))?;
    let mut hasher = Sha256::new();
    hasher.update(&canonical);
    let result = hasher.finalize();
    Ok(format!("{:x}", result))
}
