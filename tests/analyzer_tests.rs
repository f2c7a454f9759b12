mod common;

use common::fixtures::{self, belongs_to, id, list, parse, scalar};
use modelforge::analysis::{
    analyze_model, topological_order, AnalysisCache, ModelAnalysis, RelationKind,
};
use modelforge::schema::ParsedSchema;
use serde_json::json;

fn analysis(schema: &ParsedSchema, model: &str) -> ModelAnalysis {
    analyze_model(schema.model(model).unwrap(), schema).unwrap()
}

fn kind(schema: &ParsedSchema, model: &str, field: &str) -> RelationKind {
    analysis(schema, model).relationship(field).unwrap().kind
}

#[test]
fn test_user_posts_end_to_end() {
    let schema = fixtures::user_post();
    let post = analysis(&schema, "Post");
    let author = post.relationship("author").unwrap();
    assert_eq!(author.kind, RelationKind::ManyToOne);
    assert_eq!(author.target_model, "User");
    assert_eq!(author.back_reference_field.as_deref(), Some("posts"));
    assert_eq!(author.foreign_key, vec!["authorId".to_string()]);

    let user = analysis(&schema, "User");
    let posts = user.relationship("posts").unwrap();
    assert_eq!(posts.kind, RelationKind::OneToMany);
    assert_eq!(posts.back_reference_field.as_deref(), Some("author"));
}

#[test]
fn test_list_with_single_back_reference_is_never_one_to_one() {
    let schema = fixtures::blog();
    for (model, field, back_model, back_field) in [
        ("User", "posts", "Post", "author"),
        ("User", "comments", "Comment", "author"),
        ("Post", "comments", "Comment", "post"),
        ("Post", "tags", "PostTag", "post"),
        ("Tag", "posts", "PostTag", "tag"),
    ] {
        assert_eq!(kind(&schema, model, field), RelationKind::OneToMany, "{model}.{field}");
        assert_eq!(
            kind(&schema, back_model, back_field),
            RelationKind::ManyToOne,
            "{back_model}.{back_field}"
        );
    }
}

#[test]
fn test_lists_on_both_sides_are_many_to_many() {
    let schema = fixtures::blog();
    assert_eq!(kind(&schema, "Post", "categories"), RelationKind::ManyToMany);
    assert_eq!(kind(&schema, "Category", "posts"), RelationKind::ManyToMany);
}

#[test]
fn test_composite_unique_slug_is_not_lookup_eligible() {
    let schema = fixtures::blog();
    let post = analysis(&schema, "Post");
    assert_eq!(post.special_fields.slug.as_deref(), Some("slug"));
    assert!(!post.supports_unique_lookup("slug"));
    assert!(post.has_composite_unique_conflict("slug"));
    assert!(post.slug_lookup_field().is_none());

    let tag = analysis(&schema, "Tag");
    assert!(tag.supports_unique_lookup("slug"));
    assert_eq!(tag.slug_lookup_field(), Some("slug"));
    assert!(tag.composite_unique_conflicts.is_empty());
}

#[test]
fn test_slug_in_own_single_field_constraint_is_eligible() {
    let schema = parse(json!({"models": [
        {"name": "Page", "uniqueFields": [["slug"]], "fields": [id("Int"), scalar("slug", "String")]}
    ]}));
    let page = analysis(&schema, "Page");
    assert_eq!(page.unique_lookup_fields, vec!["slug".to_string()]);
    assert!(page.composite_unique_conflicts.is_empty());
}

#[test]
fn test_unique_marker_does_not_survive_composite_membership() {
    let schema = parse(json!({"models": [
        {"name": "Page", "uniqueFields": [["slug", "locale"]], "fields": [
            id("Int"),
            {"name": "slug", "kind": "scalar", "type": "String", "isUnique": true},
            scalar("locale", "String")
        ]}
    ]}));
    let page = analysis(&schema, "Page");
    assert!(page.unique_lookup_fields.is_empty());
    assert_eq!(page.composite_unique_conflicts, vec!["slug".to_string()]);
}

#[test]
fn test_self_referential_parent_and_children() {
    let schema = fixtures::blog();
    let comment = analysis(&schema, "Comment");

    let parent = comment.relationship("parent").unwrap();
    assert_eq!(parent.kind, RelationKind::ManyToOne);
    assert!(parent.is_self_referential);
    assert_eq!(parent.back_reference_field.as_deref(), Some("children"));

    let children = comment.relationship("children").unwrap();
    assert_eq!(children.kind, RelationKind::OneToMany);
    assert!(children.is_self_referential);
    assert_eq!(children.back_reference_field.as_deref(), Some("parent"));

    assert_eq!(comment.special_fields.parent_id.as_deref(), Some("parentId"));
    assert_eq!(comment.special_fields.approved.as_deref(), Some("approved"));
}

#[test]
fn test_self_reference_without_names_never_matches_itself() {
    let schema = parse(json!({"models": [
        {"name": "Node", "fields": [
            id("Int"),
            {"name": "parentId", "kind": "scalar", "type": "Int", "isRequired": false},
            {"name": "parent", "kind": "object", "type": "Node", "isRequired": false,
             "relationFromFields": ["parentId"], "relationToFields": ["id"]},
            list("children", "Node")
        ]}
    ]}));
    let node = analysis(&schema, "Node");
    assert_eq!(node.relationship("parent").unwrap().kind, RelationKind::ManyToOne);
    assert_eq!(node.relationship("children").unwrap().kind, RelationKind::OneToMany);
    assert_ne!(
        node.relationship("parent").unwrap().back_reference_field.as_deref(),
        Some("parent")
    );
}

#[test]
fn test_post_tag_is_a_junction_table() {
    let schema = fixtures::blog();
    assert!(analysis(&schema, "PostTag").is_junction_table);
    for model in ["User", "Post", "Category", "Tag", "Comment"] {
        assert!(!analysis(&schema, model).is_junction_table, "{model}");
    }
}

#[test]
fn test_meaningful_scalar_disqualifies_junction() {
    let schema = parse(json!({"models": [
        {"name": "Post", "fields": [id("Int"), list("tags", "PostTag")]},
        {"name": "Tag", "fields": [id("Int"), list("posts", "PostTag")]},
        {"name": "PostTag", "fields": [
            id("Int"),
            scalar("postId", "Int"),
            scalar("tagId", "Int"),
            scalar("weight", "Int"),
            belongs_to("post", "Post", "postId"),
            belongs_to("tag", "Tag", "tagId")
        ]}
    ]}));
    assert!(!analysis(&schema, "PostTag").is_junction_table);
}

#[test]
fn test_special_fields_on_post() {
    let schema = fixtures::blog();
    let special = analysis(&schema, "Post").special_fields;
    assert_eq!(special.published.as_deref(), Some("published"));
    assert_eq!(special.views.as_deref(), Some("views"));
    assert_eq!(special.deleted_at.as_deref(), Some("deletedAt"));
    assert!(special.likes.is_none());
    assert!(special.parent_id.is_none());
}

#[test]
fn test_topological_order_of_blog() {
    let schema = fixtures::blog();
    assert_eq!(
        topological_order(&schema),
        vec!["User", "Post", "Category", "Tag", "PostTag", "Comment"]
    );
}

#[test]
fn test_cache_is_shared_and_computed_once() {
    let schema = fixtures::blog();
    let mut cache = AnalysisCache::new();
    let post = schema.model("Post").unwrap();
    let first = cache.get_analysis(post, &schema).unwrap();
    let second = cache.get_analysis(post, &schema).unwrap();
    assert!(std::sync::Arc::ptr_eq(&first, &second));
    assert_eq!(cache.computations(), 1);
    assert!(std::sync::Arc::ptr_eq(&cache.get("Post").unwrap(), &first));
    assert!(cache.get("User").is_none());
}

#[test]
fn test_analysis_serializes_camel_case() {
    let schema = fixtures::blog();
    let value = serde_json::to_value(analysis(&schema, "PostTag")).unwrap();
    assert_eq!(value["isJunctionTable"], json!(true));
    assert_eq!(value["relationships"][0]["kind"], json!("many-to-one"));
    assert_eq!(value["relationships"][0]["targetModel"], json!("Post"));
}

#[test]
fn test_relation_fields_to_filters_by_target() {
    let schema = fixtures::blog();
    let comment = schema.model("Comment").unwrap();
    let to_self: Vec<&str> = comment
        .relation_fields_to("Comment")
        .map(|(_, f)| f.name.as_str())
        .collect();
    assert_eq!(to_self, vec!["parent", "children"]);
    assert_eq!(comment.relation_fields_to("Tag").count(), 0);
}
