use crate::schema::{Field, FieldType, Model, ScalarType};

const TIMESTAMP_FIELDS: [&str; 4] = ["createdat", "updatedat", "created_at", "updated_at"];

/// True iff the model exists only to join two other models.
///
/// Decided from the model's own shape: exactly two relation fields, both
/// required and single-valued, pointing at two different models, and no scalar
/// besides ids, the relations' key columns and timestamps.
pub fn is_junction_table(model: &Model) -> bool {
    let mut relations = model.relation_fields().map(|(_, f)| f);
    let (Some(a), Some(b), None) = (relations.next(), relations.next(), relations.next()) else {
        return false;
    };
    if a.is_list || b.is_list || !a.is_required || !b.is_required {
        return false;
    }
    match (a.field_type.relation_target(), b.field_type.relation_target()) {
        (Some(ta), Some(tb)) if ta != tb => {}
        _ => return false,
    }

    model
        .scalar_fields()
        .all(|s| is_key_column(model, s, [a, b]) || is_timestamp(s))
}

fn is_key_column(model: &Model, scalar: &Field, relations: [&Field; 2]) -> bool {
    if scalar.is_id || scalar.name == "id" || model.id_fields.contains(&scalar.name) {
        return true;
    }
    relations.iter().any(|rel| {
        rel.relation_from_fields.contains(&scalar.name)
            || scalar.name == format!("{}Id", rel.name)
            || scalar.name == format!("{}_id", rel.name)
    })
}

fn is_timestamp(field: &Field) -> bool {
    field.field_type == FieldType::Scalar(ScalarType::DateTime)
        && TIMESTAMP_FIELDS.contains(&field.name.to_lowercase().as_str())
}
