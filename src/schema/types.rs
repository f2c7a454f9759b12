use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use super::error::SchemaError;

/// Scalar column types understood by the analyzer and the built-in layers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ScalarType {
    String,
    Boolean,
    Int,
    BigInt,
    Float,
    Decimal,
    DateTime,
    Json,
    Bytes,
}

impl ScalarType {
    /// Parse the normalized type name (`"String"`, `"Int"`, ...).
    pub fn parse(name: &str) -> Option<Self> {
        let ty = match name {
            "String" => ScalarType::String,
            "Boolean" => ScalarType::Boolean,
            "Int" => ScalarType::Int,
            "BigInt" => ScalarType::BigInt,
            "Float" => ScalarType::Float,
            "Decimal" => ScalarType::Decimal,
            "DateTime" => ScalarType::DateTime,
            "Json" => ScalarType::Json,
            "Bytes" => ScalarType::Bytes,
            _ => return None,
        };
        Some(ty)
    }

    pub fn is_integer(&self) -> bool {
        matches!(self, ScalarType::Int | ScalarType::BigInt)
    }
}

impl std::fmt::Display for ScalarType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            ScalarType::String => "String",
            ScalarType::Boolean => "Boolean",
            ScalarType::Int => "Int",
            ScalarType::BigInt => "BigInt",
            ScalarType::Float => "Float",
            ScalarType::Decimal => "Decimal",
            ScalarType::DateTime => "DateTime",
            ScalarType::Json => "Json",
            ScalarType::Bytes => "Bytes",
        };
        write!(f, "{s}")
    }
}

/// What a field holds: a scalar column, an enum value, or a relation to another model.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "type", rename_all = "camelCase")]
pub enum FieldType {
    Scalar(ScalarType),
    Enum(String),
    Relation(String),
}

impl FieldType {
    /// Target model name when this is a relation.
    pub fn relation_target(&self) -> Option<&str> {
        match self {
            FieldType::Relation(target) => Some(target),
            _ => None,
        }
    }

    pub fn scalar(&self) -> Option<ScalarType> {
        match self {
            FieldType::Scalar(ty) => Some(*ty),
            _ => None,
        }
    }

    /// The declared type name as it appears in the normalized document.
    pub fn type_name(&self) -> String {
        match self {
            FieldType::Scalar(ty) => ty.to_string(),
            FieldType::Enum(name) | FieldType::Relation(name) => name.clone(),
        }
    }
}

/// A typed annotation parsed from model documentation (`@key(arg, ...)`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Annotation {
    pub key: String,
    pub args: Vec<String>,
}

impl Annotation {
    pub fn first_arg(&self) -> Option<&str> {
        self.args.first().map(String::as_str)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Field {
    pub name: String,
    pub field_type: FieldType,
    pub is_list: bool,
    pub is_required: bool,
    pub is_unique: bool,
    pub is_id: bool,
    pub has_default_value: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub relation_name: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub relation_from_fields: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub relation_to_fields: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub documentation: Option<String>,
}

impl Field {
    pub fn is_relation(&self) -> bool {
        matches!(self.field_type, FieldType::Relation(_))
    }

    /// Relation fields whose FK columns live on this model.
    pub fn owns_foreign_key(&self) -> bool {
        self.is_relation() && !self.relation_from_fields.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Model {
    pub name: String,
    pub fields: Vec<Field>,
    pub id_fields: Vec<String>,
    /// Multi- and single-field unique constraints declared at model level.
    pub unique_constraints: Vec<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub documentation: Option<String>,
    #[serde(skip)]
    pub annotations: Vec<Annotation>,
    #[serde(skip)]
    pub(crate) scalar_indices: Vec<usize>,
    #[serde(skip)]
    pub(crate) relation_indices: Vec<usize>,
}

impl Model {
    pub fn field(&self, name: &str) -> Option<&Field> {
        self.fields.iter().find(|f| f.name == name)
    }

    /// Scalar and enum fields, in declaration order.
    pub fn scalar_fields(&self) -> impl Iterator<Item = &Field> + '_ {
        self.scalar_indices.iter().map(move |&i| &self.fields[i])
    }

    /// Relation fields, in declaration order, paired with their field index.
    pub fn relation_fields(&self) -> impl Iterator<Item = (usize, &Field)> + '_ {
        self.relation_indices.iter().map(move |&i| (i, &self.fields[i]))
    }

    /// Relation fields whose type is `type_name`, paired with their field index.
    pub fn relation_fields_to<'a>(
        &'a self,
        type_name: &'a str,
    ) -> impl Iterator<Item = (usize, &'a Field)> + 'a {
        self.relation_fields()
            .filter(move |(_, f)| f.field_type.relation_target() == Some(type_name))
    }

    pub fn relation_count(&self) -> usize {
        self.relation_indices.len()
    }

    /// The designated single id field, if the model has a non-composite id.
    pub fn id_field(&self) -> Option<&Field> {
        match self.id_fields.as_slice() {
            [single] => self.field(single),
            _ => None,
        }
    }

    pub fn annotation(&self, key: &str) -> Option<&Annotation> {
        self.annotations.iter().find(|a| a.key == key)
    }

    pub fn has_annotation(&self, key: &str) -> bool {
        self.annotation(key).is_some()
    }

    /// True when `name` is a member of a unique constraint with more than one field.
    pub fn in_composite_unique(&self, name: &str) -> bool {
        self.unique_constraints
            .iter()
            .any(|c| c.len() > 1 && c.iter().any(|f| f == name))
    }

    /// True when `fields` exactly matches (as a set) a multi-field unique
    /// constraint or the composite primary key.
    pub fn has_composite_unique(&self, fields: &[String]) -> bool {
        let same_set = |c: &[String]| c.len() == fields.len() && fields.iter().all(|f| c.contains(f));
        fields.len() > 1
            && (same_set(&self.id_fields)
                || self.unique_constraints.iter().any(|c| same_set(c)))
    }

    /// Unique on its own: field-level marker or a single-member constraint.
    pub fn is_standalone_unique(&self, name: &str) -> bool {
        let marked = self
            .field(name)
            .is_some_and(|f| f.is_unique || (f.is_id && self.id_fields.len() == 1));
        marked
            || self
                .unique_constraints
                .iter()
                .any(|c| c.len() == 1 && c[0] == name)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EnumDef {
    pub name: String,
    pub values: Vec<String>,
}

/// The immutable, normalized schema every analysis and generator reads from.
#[derive(Debug, Clone)]
pub struct ParsedSchema {
    pub(crate) models: Vec<Model>,
    pub(crate) enums: Vec<EnumDef>,
    pub(crate) model_map: HashMap<String, usize>,
    /// Per model index: referenced type name → relation field indices on that model.
    pub(crate) back_refs: Vec<HashMap<String, Vec<usize>>>,
    pub(crate) fingerprint: String,
}

impl ParsedSchema {
    /// Models in declaration order.
    pub fn models(&self) -> &[Model] {
        &self.models
    }

    pub fn enums(&self) -> &[EnumDef] {
        &self.enums
    }

    pub fn model(&self, name: &str) -> Option<&Model> {
        self.model_map.get(name).map(|&i| &self.models[i])
    }

    pub fn model_index(&self, name: &str) -> Option<usize> {
        self.model_map.get(name).copied()
    }

    /// Resolve a model by name, failing with a schema error instead of `None`.
    pub fn require_model(&self, name: &str) -> Result<&Model, SchemaError> {
        self.model(name).ok_or_else(|| SchemaError::UnknownModel(name.to_string()))
    }

    /// Relation field indices on `target` whose declared type is `type_name`.
    pub fn back_reference_candidates(&self, target: &str, type_name: &str) -> &[usize] {
        self.model_map
            .get(target)
            .and_then(|&t| self.back_refs.get(t))
            .and_then(|by_type| by_type.get(type_name))
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// SHA-256 of the canonical JSON form of the normalized schema.
    pub fn fingerprint(&self) -> &str {
        &self.fingerprint
    }

    pub fn enum_def(&self, name: &str) -> Option<&EnumDef> {
        self.enums.iter().find(|e| e.name == name)
    }
}
