//! Relationship cardinality inference.
//!
//! For every relation field `f` on a model pointing at target `T`, exactly one
//! back-reference lookup is made against the schema's back-reference index
//! (fields on `T` whose declared type is the model's name). The single result
//! of that lookup decides the cardinality:
//!
//! | `f` is list | back-ref | back-ref is list | kind on this side |
//! |-------------|----------|------------------|-------------------|
//! | yes         | yes      | yes              | many-to-many      |
//! | yes         | any      | no / absent      | one-to-many       |
//! | no          | yes      |                  | many-to-one       |
//! | no          | no       |                  | one-to-one        |
//!
//! Unique foreign keys refine the single-valued rows: a non-list relation
//! whose FK columns are unique (a standalone unique column, or exactly one
//! declared multi-column unique constraint) is one-to-one, as is its non-list
//! back side. Composite FKs without a matching constraint are never one-to-one.

use serde::Serialize;
use std::collections::HashSet;
use std::fmt;

use crate::schema::{Field, Model, ParsedSchema, SchemaError};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum RelationKind {
    OneToOne,
    OneToMany,
    ManyToOne,
    ManyToMany,
}

impl RelationKind {
    /// True when this side of the relation yields a collection.
    pub fn is_collection(&self) -> bool {
        matches!(self, RelationKind::OneToMany | RelationKind::ManyToMany)
    }

    /// The kind as seen from the other side of the relation.
    pub fn inverse(&self) -> Self {
        match self {
            RelationKind::OneToOne => RelationKind::OneToOne,
            RelationKind::OneToMany => RelationKind::ManyToOne,
            RelationKind::ManyToOne => RelationKind::OneToMany,
            RelationKind::ManyToMany => RelationKind::ManyToMany,
        }
    }
}

impl fmt::Display for RelationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            RelationKind::OneToOne => "one-to-one",
            RelationKind::OneToMany => "one-to-many",
            RelationKind::ManyToOne => "many-to-one",
            RelationKind::ManyToMany => "many-to-many",
        };
        write!(f, "{s}")
    }
}

/// One classified relation field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RelationshipInfo {
    /// The relation field on the source model.
    pub field: String,
    pub source_model: String,
    pub target_model: String,
    pub kind: RelationKind,
    pub back_reference_field: Option<String>,
    pub is_self_referential: bool,
    /// FK columns held by the source side, if any.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub foreign_key: Vec<String>,
}

/// A back-reference that could not be determined uniquely.
///
/// Non-fatal: a best-effort candidate is chosen and the warning is carried in
/// the analysis and the run summary.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RelationshipAmbiguityWarning {
    pub model: String,
    pub field: String,
    pub target_model: String,
    pub candidates: Vec<String>,
    pub chosen: String,
}

impl fmt::Display for RelationshipAmbiguityWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}.{}: ambiguous back-reference on '{}' (candidates: {}), using '{}'",
            self.model,
            self.field,
            self.target_model,
            self.candidates.join(", "),
            self.chosen
        )
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RelationshipAnalysis {
    pub relationships: Vec<RelationshipInfo>,
    pub warnings: Vec<RelationshipAmbiguityWarning>,
}

/// Classify every relation field of `model` against `schema`.
///
/// Fails only when a relation target is not a model of `schema`.
pub fn analyze_relationships(
    model: &Model,
    schema: &ParsedSchema,
) -> Result<RelationshipAnalysis, SchemaError> {
    let mut out = RelationshipAnalysis::default();
    // (target model, field index) pairs already matched to one of this model's fields.
    let mut claimed: HashSet<(&str, usize)> = HashSet::new();

    for (idx, field) in model.relation_fields() {
        let target = resolve_target(model, field, schema)?;
        let is_self_referential = target.name == model.name;

        let lookup = find_back_reference(model, idx, field, target, schema, &claimed);
        if let Some(warning) = lookup.warning {
            tracing::warn!(%warning, "relationship ambiguity");
            out.warnings.push(warning);
        }
        let back = lookup.index.map(|i| {
            claimed.insert((target.name.as_str(), i));
            &target.fields[i]
        });

        out.relationships.push(RelationshipInfo {
            field: field.name.clone(),
            source_model: model.name.clone(),
            target_model: target.name.clone(),
            kind: classify(model, field, target, back),
            back_reference_field: back.map(|b| b.name.clone()),
            is_self_referential,
            foreign_key: field.relation_from_fields.clone(),
        });
    }

    Ok(out)
}

pub(crate) fn resolve_target<'s>(
    model: &Model,
    field: &Field,
    schema: &'s ParsedSchema,
) -> Result<&'s Model, SchemaError> {
    let unresolved = || SchemaError::UnresolvedRelation {
        model: model.name.clone(),
        field: field.name.clone(),
        target: field.field_type.type_name(),
    };
    let target = field.field_type.relation_target().ok_or_else(unresolved)?;
    schema.model(target).ok_or_else(unresolved)
}

pub(crate) struct BackReferenceLookup {
    pub index: Option<usize>,
    pub warning: Option<RelationshipAmbiguityWarning>,
}

/// The single back-reference lookup for `field` (at `field_idx` on `model`).
pub(crate) fn find_back_reference(
    model: &Model,
    field_idx: usize,
    field: &Field,
    target: &Model,
    schema: &ParsedSchema,
    claimed: &HashSet<(&str, usize)>,
) -> BackReferenceLookup {
    let self_ref = target.name == model.name;
    let mut pool: Vec<usize> = schema
        .back_reference_candidates(&target.name, &model.name)
        .iter()
        .copied()
        // Identity, not name: a self relation must never match itself.
        .filter(|&c| !(self_ref && c == field_idx))
        .filter(|&c| {
            match (&field.relation_name, &target.fields[c].relation_name) {
                (Some(a), Some(b)) => a == b,
                _ => true,
            }
        })
        .collect();

    let named: Vec<usize> = pool
        .iter()
        .copied()
        .filter(|&c| target.fields[c].relation_name == field.relation_name)
        .collect();
    match named.len() {
        1 => return resolved(named[0]),
        n if n > 1 => pool = named,
        _ => {}
    }

    match pool.as_slice() {
        [] => BackReferenceLookup {
            index: None,
            warning: None,
        },
        [only] => resolved(*only),
        _ => {
            let unclaimed = |c: &usize| !claimed.contains(&(target.name.as_str(), *c));
            let conventional: Vec<usize> = pool
                .iter()
                .copied()
                .filter(unclaimed)
                .filter(|&c| follows_back_reference_convention(&target.fields[c], model, field))
                .collect();
            if let [only] = conventional.as_slice() {
                return resolved(*only);
            }

            let chosen = pool.iter().copied().find(unclaimed).unwrap_or(pool[0]);
            BackReferenceLookup {
                index: Some(chosen),
                warning: Some(RelationshipAmbiguityWarning {
                    model: model.name.clone(),
                    field: field.name.clone(),
                    target_model: target.name.clone(),
                    candidates: pool.iter().map(|&c| target.fields[c].name.clone()).collect(),
                    chosen: target.fields[chosen].name.clone(),
                }),
            }
        }
    }
}

fn resolved(index: usize) -> BackReferenceLookup {
    BackReferenceLookup {
        index: Some(index),
        warning: None,
    }
}

// `user` / `users` / `userList` for a `User` source, `parent`/`children` for self relations.
fn follows_back_reference_convention(candidate: &Field, source: &Model, field: &Field) -> bool {
    let name = candidate.name.to_lowercase();
    let base = source.name.to_lowercase();
    let plural = match base.strip_suffix('y') {
        Some(stem) => format!("{stem}ies"),
        None if base.ends_with('s') => format!("{base}es"),
        None => format!("{base}s"),
    };
    if name == base || name == plural || name == format!("{base}list") || name == format!("{base}_list")
    {
        return true;
    }
    if field.field_type.relation_target() == Some(source.name.as_str()) {
        return if field.is_list {
            matches!(name.as_str(), "parent" | "owner")
        } else {
            matches!(name.as_str(), "children" | "child")
        };
    }
    false
}

fn classify(model: &Model, field: &Field, target: &Model, back: Option<&Field>) -> RelationKind {
    match (field.is_list, back) {
        (true, Some(b)) if b.is_list => RelationKind::ManyToMany,
        (true, _) => RelationKind::OneToMany,
        (false, _) if field.owns_foreign_key() => {
            if foreign_key_is_unique(model, field) {
                RelationKind::OneToOne
            } else if field.relation_from_fields.len() > 1 || back.is_some() {
                // A composite FK is only one-to-one under an explicit composite unique.
                RelationKind::ManyToOne
            } else {
                RelationKind::OneToOne
            }
        }
        (false, Some(b)) => {
            if !b.is_list && b.owns_foreign_key() && foreign_key_is_unique(target, b) {
                RelationKind::OneToOne
            } else {
                RelationKind::ManyToOne
            }
        }
        (false, None) => RelationKind::OneToOne,
    }
}

fn foreign_key_is_unique(owner: &Model, field: &Field) -> bool {
    match field.relation_from_fields.as_slice() {
        [] => false,
        [single] => owner.is_standalone_unique(single),
        columns => owner.has_composite_unique(columns),
    }
}
