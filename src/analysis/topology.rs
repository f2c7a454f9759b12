use std::collections::{BTreeSet, HashSet};

use super::relationship::find_back_reference;
use crate::schema::ParsedSchema;

/// Dependency-first model order.
///
/// A model depends on the target of each single-valued relation it owns: one
/// that holds the FK columns, or, without explicit columns, the single side of
/// a one-to-many or a reference with no back side. Ties resolve in declaration
/// order. Models on a cycle are appended in declaration order.
pub fn topological_order(schema: &ParsedSchema) -> Vec<String> {
    let models = schema.models();
    let mut depends_on: Vec<BTreeSet<usize>> = vec![BTreeSet::new(); models.len()];
    let mut dependents: Vec<Vec<usize>> = vec![Vec::new(); models.len()];

    for (idx, model) in models.iter().enumerate() {
        let claimed = HashSet::new();
        for (field_idx, field) in model.relation_fields() {
            if field.is_list {
                continue;
            }
            let Some(target_idx) = field
                .field_type
                .relation_target()
                .and_then(|t| schema.model_index(t))
            else {
                continue;
            };
            if target_idx == idx {
                continue;
            }
            let owns = if field.owns_foreign_key() {
                true
            } else {
                let target = &models[target_idx];
                let lookup = find_back_reference(model, field_idx, field, target, schema, &claimed);
                lookup
                    .index
                    .map(|b| &target.fields[b])
                    .map_or(true, |b| b.is_list)
            };
            if owns && depends_on[idx].insert(target_idx) {
                dependents[target_idx].push(idx);
            }
        }
    }

    let mut remaining: Vec<usize> = depends_on.iter().map(BTreeSet::len).collect();
    let mut ready: BTreeSet<usize> = (0..models.len()).filter(|&i| remaining[i] == 0).collect();
    let mut placed = vec![false; models.len()];
    let mut order = Vec::with_capacity(models.len());

    while let Some(next) = ready.pop_first() {
        placed[next] = true;
        order.push(models[next].name.clone());
        for &dependent in &dependents[next] {
            remaining[dependent] -= 1;
            if remaining[dependent] == 0 {
                ready.insert(dependent);
            }
        }
    }

    if order.len() < models.len() {
        let cyclic: Vec<String> = models
            .iter()
            .enumerate()
            .filter(|(i, _)| !placed[*i])
            .map(|(_, m)| m.name.clone())
            .collect();
        tracing::warn!(models = ?cyclic, "dependency cycle, appending in declaration order");
        order.extend(cyclic);
    }
    order
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{parse_schema_str, SchemaFormat};
    use serde_json::json;

    #[test]
    fn test_dependencies_come_first() {
        let doc = json!({"models": [
            {"name": "Comment", "fields": [
                {"name": "id", "kind": "scalar", "type": "Int", "isId": true},
                {"name": "postId", "kind": "scalar", "type": "Int"},
                {"name": "post", "kind": "object", "type": "Post",
                 "relationFromFields": ["postId"], "relationToFields": ["id"]}
            ]},
            {"name": "Post", "fields": [
                {"name": "id", "kind": "scalar", "type": "Int", "isId": true},
                {"name": "author", "kind": "object", "type": "User"},
                {"name": "comments", "kind": "object", "type": "Comment", "isList": true}
            ]},
            {"name": "User", "fields": [
                {"name": "id", "kind": "scalar", "type": "Int", "isId": true},
                {"name": "posts", "kind": "object", "type": "Post", "isList": true}
            ]}
        ]});
        let s = parse_schema_str(&doc.to_string(), SchemaFormat::Json).unwrap();
        assert_eq!(topological_order(&s), vec!["User", "Post", "Comment"]);
    }

    #[test]
    fn test_self_reference_and_cycles() {
        let doc = json!({"models": [
            {"name": "Node", "fields": [
                {"name": "id", "kind": "scalar", "type": "Int", "isId": true},
                {"name": "parent", "kind": "object", "type": "Node", "isRequired": false},
                {"name": "children", "kind": "object", "type": "Node", "isList": true}
            ]},
            {"name": "A", "fields": [
                {"name": "id", "kind": "scalar", "type": "Int", "isId": true},
                {"name": "bId", "kind": "scalar", "type": "Int"},
                {"name": "b", "kind": "object", "type": "B",
                 "relationFromFields": ["bId"], "relationToFields": ["id"]}
            ]},
            {"name": "B", "fields": [
                {"name": "id", "kind": "scalar", "type": "Int", "isId": true},
                {"name": "aId", "kind": "scalar", "type": "Int"},
                {"name": "a", "kind": "object", "type": "A",
                 "relationFromFields": ["aId"], "relationToFields": ["id"]}
            ]}
        ]});
        let s = parse_schema_str(&doc.to_string(), SchemaFormat::Json).unwrap();
        assert_eq!(topological_order(&s), vec!["Node", "A", "B"]);
    }
}
