use serde::{Deserialize, Serialize};
use std::path::Path;

use super::build::build_schema;
use super::error::SchemaError;
use super::types::ParsedSchema;

/// Serialized form of a normalized schema document.
///
/// This is the contract with the upstream normalizer: it has already turned the
/// source schema syntax into models, fields and enums. Keys are camelCase.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawSchema {
    #[serde(default)]
    pub models: Vec<RawModel>,
    #[serde(default)]
    pub enums: Vec<RawEnum>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawModel {
    pub name: String,
    #[serde(default)]
    pub fields: Vec<RawField>,
    /// Composite primary key; single ids are flagged with `isId` on the field.
    #[serde(default)]
    pub primary_key: Vec<String>,
    #[serde(default, alias = "uniqueConstraints")]
    pub unique_fields: Vec<Vec<String>>,
    #[serde(default)]
    pub documentation: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RawFieldKind {
    Scalar,
    Enum,
    /// A relation to another model.
    Object,
}

fn default_true() -> bool {
    true
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawField {
    pub name: String,
    pub kind: RawFieldKind,
    #[serde(rename = "type")]
    pub ty: String,
    #[serde(default)]
    pub is_list: bool,
    #[serde(default = "default_true")]
    pub is_required: bool,
    #[serde(default)]
    pub is_unique: bool,
    #[serde(default)]
    pub is_id: bool,
    #[serde(default)]
    pub has_default_value: bool,
    #[serde(default)]
    pub relation_name: Option<String>,
    #[serde(default)]
    pub relation_from_fields: Vec<String>,
    #[serde(default)]
    pub relation_to_fields: Vec<String>,
    #[serde(default)]
    pub documentation: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RawEnum {
    pub name: String,
    #[serde(default)]
    pub values: Vec<String>,
}

/// Document encoding of a normalized schema.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchemaFormat {
    Json,
    Yaml,
}

impl SchemaFormat {
    /// YAML for `.yaml`/`.yml`, JSON for everything else.
    pub fn from_path(path: &Path) -> Self {
        match path.extension().and_then(|e| e.to_str()) {
            Some("yaml") | Some("yml") => SchemaFormat::Yaml,
            _ => SchemaFormat::Json,
        }
    }
}

/// Parse a normalized schema document held in memory.
pub fn parse_schema_str(content: &str, format: SchemaFormat) -> Result<ParsedSchema, SchemaError> {
    let raw: RawSchema = match format {
        SchemaFormat::Yaml => {
            serde_yaml::from_str(content).map_err(|e| SchemaError::Parse(e.to_string()))?
        }
        SchemaFormat::Json => {
            serde_json::from_str(content).map_err(|e| SchemaError::Parse(e.to_string()))?
        }
    };
    build_schema(raw)
}

/// Load and freeze a normalized schema from disk.
pub fn load_schema(path: &Path) -> Result<ParsedSchema, SchemaError> {
    let content = std::fs::read_to_string(path).map_err(|source| SchemaError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    let schema = parse_schema_str(&content, SchemaFormat::from_path(path))?;
    tracing::info!(
        path = %path.display(),
        models = schema.models().len(),
        enums = schema.enums().len(),
        fingerprint = %&schema.fingerprint()[..16],
        "loaded schema"
    );
    Ok(schema)
}
