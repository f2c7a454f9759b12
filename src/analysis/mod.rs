//! # Analysis Module
//!
//! Everything derived from a [`ParsedSchema`] before any code is generated:
//!
//! - [`relationship`] - cardinality, back-references, self-reference
//! - [`special_fields`] - conventional fields (slug, soft delete, counters) and
//!   unique-lookup eligibility
//! - [`junction`] - join-table detection from the model's own shape
//! - [`topology`] - dependency-first model order
//! - [`cache`] - the per-run memo every layer generator reads from
//!
//! [`analyze_model`] composes the first three into one [`ModelAnalysis`].

pub mod cache;
pub mod junction;
pub mod relationship;
pub mod special_fields;
pub mod topology;

use serde::Serialize;

use crate::schema::{Model, ParsedSchema, SchemaError};

pub use cache::AnalysisCache;
pub use junction::is_junction_table;
pub use relationship::{
    analyze_relationships, RelationKind, RelationshipAmbiguityWarning, RelationshipAnalysis,
    RelationshipInfo,
};
pub use special_fields::{
    composite_unique_conflicts, detect_special_fields, unique_lookup_fields, SpecialFieldKind,
    SpecialFields,
};
pub use topology::topological_order;

/// Read-only analysis of one model, shared by every layer generator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ModelAnalysis {
    pub model: String,
    pub relationships: Vec<RelationshipInfo>,
    pub special_fields: SpecialFields,
    pub is_junction_table: bool,
    /// Non-id scalar fields that are unique on their own.
    pub unique_lookup_fields: Vec<String>,
    /// Unique-looking fields that only participate in a multi-field constraint.
    pub composite_unique_conflicts: Vec<String>,
    pub warnings: Vec<RelationshipAmbiguityWarning>,
}

impl ModelAnalysis {
    pub fn relationship(&self, field: &str) -> Option<&RelationshipInfo> {
        self.relationships.iter().find(|r| r.field == field)
    }

    pub fn supports_unique_lookup(&self, field: &str) -> bool {
        self.unique_lookup_fields.iter().any(|f| f == field)
    }

    pub fn has_composite_unique_conflict(&self, field: &str) -> bool {
        self.composite_unique_conflicts.iter().any(|f| f == field)
    }

    /// The slug field, when it may back a single-row lookup.
    pub fn slug_lookup_field(&self) -> Option<&str> {
        self.special_fields
            .slug
            .as_deref()
            .filter(|slug| self.supports_unique_lookup(slug))
    }
}

/// Analyze one model against the whole schema.
pub fn analyze_model(model: &Model, schema: &ParsedSchema) -> Result<ModelAnalysis, SchemaError> {
    let RelationshipAnalysis {
        relationships,
        warnings,
    } = analyze_relationships(model, schema)?;
    let special_fields = detect_special_fields(model);
    let composite_unique_conflicts = composite_unique_conflicts(model, &special_fields);

    Ok(ModelAnalysis {
        model: model.name.clone(),
        relationships,
        is_junction_table: is_junction_table(model),
        unique_lookup_fields: unique_lookup_fields(model),
        composite_unique_conflicts,
        special_fields,
        warnings,
    })
}
