#![allow(dead_code)]

pub mod fixtures {
    use modelforge::schema::{parse_schema_str, ParsedSchema, SchemaFormat};
    use serde_json::{json, Value};

    pub fn parse(doc: Value) -> ParsedSchema {
        parse_schema_str(&doc.to_string(), SchemaFormat::Json).unwrap()
    }

    pub fn id(ty: &str) -> Value {
        json!({"name": "id", "kind": "scalar", "type": ty, "isId": true, "hasDefaultValue": true})
    }

    pub fn scalar(name: &str, ty: &str) -> Value {
        json!({"name": name, "kind": "scalar", "type": ty})
    }

    pub fn unique(name: &str, ty: &str) -> Value {
        json!({"name": name, "kind": "scalar", "type": ty, "isUnique": true})
    }

    pub fn list(name: &str, target: &str) -> Value {
        json!({"name": name, "kind": "object", "type": target, "isList": true})
    }

    pub fn belongs_to(name: &str, target: &str, fk: &str) -> Value {
        json!({"name": name, "kind": "object", "type": target,
               "relationFromFields": [fk], "relationToFields": ["id"]})
    }

    /// `User { id, email @unique, posts: Post[] }`, `Post { id, title, authorId, author: User }`.
    pub fn user_post() -> ParsedSchema {
        parse(json!({"models": [
            {"name": "User", "fields": [id("Int"), unique("email", "String"), list("posts", "Post")]},
            {"name": "Post", "fields": [
                id("Int"),
                scalar("title", "String"),
                scalar("authorId", "Int"),
                belongs_to("author", "User", "authorId")
            ]}
        ]}))
    }

    /// Blog schema exercising every analysis rule at once.
    ///
    /// - `User` 1:n `Post` (`author`)
    /// - `Post` n:m `Category` (implicit, list on both sides)
    /// - `Post` 1:n `PostTag` n:1 `Tag` (explicit junction)
    /// - `Post.slug` unique together with `tenantId`; `Tag.slug` unique alone
    /// - `Comment` self-referential (`parent` / `children`)
    pub fn blog() -> ParsedSchema {
        parse(json!({
            "enums": [{"name": "Status", "values": ["DRAFT", "PUBLISHED", "ARCHIVED"]}],
            "models": [
                {"name": "User", "fields": [
                    id("Int"),
                    unique("email", "String"),
                    scalar("name", "String"),
                    list("posts", "Post"),
                    list("comments", "Comment")
                ]},
                {"name": "Post", "documentation": "A blog post.", "uniqueFields": [["slug", "tenantId"]], "fields": [
                    id("Int"),
                    scalar("title", "String"),
                    scalar("slug", "String"),
                    scalar("tenantId", "Int"),
                    {"name": "status", "kind": "enum", "type": "Status", "hasDefaultValue": true},
                    {"name": "published", "kind": "scalar", "type": "Boolean", "hasDefaultValue": true},
                    {"name": "views", "kind": "scalar", "type": "Int", "hasDefaultValue": true},
                    {"name": "deletedAt", "kind": "scalar", "type": "DateTime", "isRequired": false},
                    scalar("authorId", "Int"),
                    belongs_to("author", "User", "authorId"),
                    list("categories", "Category"),
                    list("tags", "PostTag"),
                    list("comments", "Comment")
                ]},
                {"name": "Category", "fields": [
                    id("Int"),
                    unique("name", "String"),
                    list("posts", "Post")
                ]},
                {"name": "Tag", "fields": [
                    id("Int"),
                    unique("slug", "String"),
                    list("posts", "PostTag")
                ]},
                {"name": "PostTag", "primaryKey": ["postId", "tagId"], "fields": [
                    scalar("postId", "Int"),
                    scalar("tagId", "Int"),
                    {"name": "createdAt", "kind": "scalar", "type": "DateTime", "hasDefaultValue": true},
                    belongs_to("post", "Post", "postId"),
                    belongs_to("tag", "Tag", "tagId")
                ]},
                {"name": "Comment", "fields": [
                    id("Int"),
                    scalar("body", "String"),
                    {"name": "approved", "kind": "scalar", "type": "Boolean", "hasDefaultValue": true},
                    scalar("postId", "Int"),
                    scalar("authorId", "Int"),
                    {"name": "parentId", "kind": "scalar", "type": "Int", "isRequired": false},
                    belongs_to("post", "Post", "postId"),
                    belongs_to("author", "User", "authorId"),
                    {"name": "parent", "kind": "object", "type": "Comment", "isRequired": false,
                     "relationName": "Thread", "relationFromFields": ["parentId"], "relationToFields": ["id"]},
                    {"name": "children", "kind": "object", "type": "Comment", "isList": true,
                     "relationName": "Thread"}
                ]}
            ]
        }))
    }
}
