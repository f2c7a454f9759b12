use serde::Serialize;

use crate::schema::{FieldType, Model, ScalarType};

/// Conventional fields that unlock extra generated capabilities.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SpecialFields {
    pub slug: Option<String>,
    pub published: Option<String>,
    pub views: Option<String>,
    pub likes: Option<String>,
    pub approved: Option<String>,
    pub deleted_at: Option<String>,
    pub parent_id: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpecialFieldKind {
    Slug,
    Published,
    Views,
    Likes,
    Approved,
    DeletedAt,
    ParentId,
}

impl SpecialFieldKind {
    /// Name table, keyed by the already-lowercased field name.
    fn from_lowercase_name(name: &str) -> Option<Self> {
        let kind = match name {
            "slug" => SpecialFieldKind::Slug,
            "published" => SpecialFieldKind::Published,
            "views" => SpecialFieldKind::Views,
            "likes" => SpecialFieldKind::Likes,
            "approved" => SpecialFieldKind::Approved,
            "deletedat" | "deleted_at" => SpecialFieldKind::DeletedAt,
            "parentid" | "parent_id" => SpecialFieldKind::ParentId,
            _ => return None,
        };
        Some(kind)
    }

    fn accepts(self, ty: ScalarType) -> bool {
        match self {
            SpecialFieldKind::Slug => ty == ScalarType::String,
            SpecialFieldKind::Published | SpecialFieldKind::Approved => ty == ScalarType::Boolean,
            SpecialFieldKind::Views | SpecialFieldKind::Likes => ty.is_integer(),
            SpecialFieldKind::DeletedAt => ty == ScalarType::DateTime,
            SpecialFieldKind::ParentId => ty.is_integer() || ty == ScalarType::String,
        }
    }
}

impl SpecialFields {
    pub fn get(&self, kind: SpecialFieldKind) -> Option<&str> {
        self.slot(kind).as_deref()
    }

    fn slot(&self, kind: SpecialFieldKind) -> &Option<String> {
        match kind {
            SpecialFieldKind::Slug => &self.slug,
            SpecialFieldKind::Published => &self.published,
            SpecialFieldKind::Views => &self.views,
            SpecialFieldKind::Likes => &self.likes,
            SpecialFieldKind::Approved => &self.approved,
            SpecialFieldKind::DeletedAt => &self.deleted_at,
            SpecialFieldKind::ParentId => &self.parent_id,
        }
    }

    fn slot_mut(&mut self, kind: SpecialFieldKind) -> &mut Option<String> {
        match kind {
            SpecialFieldKind::Slug => &mut self.slug,
            SpecialFieldKind::Published => &mut self.published,
            SpecialFieldKind::Views => &mut self.views,
            SpecialFieldKind::Likes => &mut self.likes,
            SpecialFieldKind::Approved => &mut self.approved,
            SpecialFieldKind::DeletedAt => &mut self.deleted_at,
            SpecialFieldKind::ParentId => &mut self.parent_id,
        }
    }
}

/// Single pass over the scalar fields; each name is lowercased once and
/// checked against the name table. The first matching field fills a slot.
pub fn detect_special_fields(model: &Model) -> SpecialFields {
    let mut found = SpecialFields::default();
    for field in model.scalar_fields() {
        if field.is_list {
            continue;
        }
        let FieldType::Scalar(ty) = field.field_type else {
            continue;
        };
        let lowered = field.name.to_lowercase();
        let Some(kind) = SpecialFieldKind::from_lowercase_name(&lowered) else {
            continue;
        };
        if !kind.accepts(ty) {
            continue;
        }
        let slot = found.slot_mut(kind);
        if slot.is_none() {
            *slot = Some(field.name.clone());
        }
    }
    found
}

/// Scalar fields usable for single-row lookup.
///
/// A field qualifies only when it is unique on its own. Membership in any
/// multi-field unique constraint disqualifies it, even when the field also
/// carries its own unique marker. Id fields are left out; they always get a
/// lookup.
pub fn unique_lookup_fields(model: &Model) -> Vec<String> {
    model
        .scalar_fields()
        .filter(|f| !f.is_list && !model.id_fields.contains(&f.name))
        .filter(|f| model.is_standalone_unique(&f.name) && !model.in_composite_unique(&f.name))
        .map(|f| f.name.clone())
        .collect()
}

/// Fields that look unique (own marker, or a detected slug) but sit inside a
/// multi-field unique constraint.
pub fn composite_unique_conflicts(model: &Model, special: &SpecialFields) -> Vec<String> {
    model
        .scalar_fields()
        .filter(|f| model.in_composite_unique(&f.name))
        .filter(|f| {
            model.is_standalone_unique(&f.name) || special.slug.as_deref() == Some(f.name.as_str())
        })
        .map(|f| f.name.clone())
        .collect()
}
