mod common;

use common::fixtures;
use modelforge::analysis::{AnalysisCache, ModelAnalysis};
use modelforge::config::GeneratorConfig;
use modelforge::generator::{
    builtin_layers, ArtifactFile, FnLayer, LayerContext, LayerGenerator, Orchestrator, OutputLayout,
    RunOptions, RunResult, MODULE_INDEX_LAYER,
};
use modelforge::providers::ProviderRegistry;
use modelforge::schema::{Model, ParsedSchema, SchemaError};
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

fn layer(
    name: &str,
    f: impl Fn(&Model, &ModelAnalysis, &()) -> anyhow::Result<Vec<ArtifactFile>> + Send + Sync + 'static,
) -> Box<dyn LayerGenerator<()>> {
    Box::new(FnLayer::new(name, f))
}

fn builtin_run(schema: &ParsedSchema, parallel: bool) -> RunResult {
    let config = GeneratorConfig {
        import_root: "crate::generated".into(),
        ..GeneratorConfig::default()
    };
    let context = LayerContext::new(ProviderRegistry::with_defaults()).with_enums(schema.enums());
    let layers = builtin_layers(&config, Arc::new(context));
    Orchestrator::new(OutputLayout::new("/srv/app/src/generated").with_import_root("crate::generated"))
        .with_options(RunOptions {
            parallel,
            ..RunOptions::default()
        })
        .run(schema, &layers, &config, &mut AnalysisCache::new())
        .unwrap()
}

#[test]
fn test_failing_layer_does_not_stop_other_models_or_layers() {
    let schema = fixtures::user_post();
    let layers: Vec<Box<dyn LayerGenerator<()>>> = vec![
        layer("first", |m, _, _| {
            Ok(vec![ArtifactFile::new(format!("first/{}", m.name.to_lowercase()), "1")])
        }),
        layer("flaky", |m, _, _| {
            if m.name == "User" {
                anyhow::bail!("cannot render {}", m.name);
            }
            Ok(vec![ArtifactFile::new(format!("flaky/{}", m.name.to_lowercase()), "2")])
        }),
        layer("last", |m, _, _| {
            Ok(vec![ArtifactFile::new(format!("last/{}", m.name.to_lowercase()), "3")])
        }),
    ];
    let result = Orchestrator::new(OutputLayout::new("/out"))
        .run(&schema, &layers, &(), &mut AnalysisCache::new())
        .unwrap();

    assert!(!result.success);
    assert_eq!(result.failures.len(), 1);
    assert_eq!(result.failures[0].model, "User");
    assert_eq!(result.failures[0].layer, "flaky");
    assert!(result.failures[0].cause.contains("cannot render User"));

    let ids: Vec<&str> = result.artifacts.iter().map(|a| a.logical_id.as_str()).collect();
    assert_eq!(
        ids,
        vec!["first/user", "last/user", "first/post", "flaky/post", "last/post"]
    );
    assert!(result.manifest.path_map.contains_key("last/user"));
    assert!(!result.manifest.path_map.contains_key("flaky/user"));
}

#[test]
fn test_every_layer_sees_the_same_analysis() {
    let schema = fixtures::blog();
    let seen: Arc<Mutex<HashMap<String, Vec<usize>>>> = Arc::default();
    let record = |seen: Arc<Mutex<HashMap<String, Vec<usize>>>>| {
        move |m: &Model, a: &ModelAnalysis, _: &()| -> anyhow::Result<Vec<ArtifactFile>> {
            let ptr = a as *const ModelAnalysis as usize;
            seen.lock().unwrap().entry(m.name.clone()).or_default().push(ptr);
            Ok(Vec::new())
        }
    };
    let layers = vec![
        layer("a", record(Arc::clone(&seen))),
        layer("b", record(Arc::clone(&seen))),
        layer("c", record(Arc::clone(&seen))),
    ];
    let mut cache = AnalysisCache::new();
    Orchestrator::new(OutputLayout::new("/out"))
        .run(&schema, &layers, &(), &mut cache)
        .unwrap();

    let seen = seen.lock().unwrap();
    assert_eq!(seen.len(), schema.models().len());
    for (model, ptrs) in seen.iter() {
        assert_eq!(ptrs.len(), 3);
        assert!(ptrs.iter().all(|p| *p == ptrs[0]), "{model} saw different analyses");
        let cached = cache.get(model).unwrap();
        assert_eq!(Arc::as_ptr(&cached) as usize, ptrs[0]);
    }
    assert_eq!(cache.computations(), schema.models().len());
}

#[test]
fn test_analysis_error_aborts_before_generation() {
    let blog = fixtures::blog();
    let other = fixtures::user_post();
    let mut cache = AnalysisCache::new();
    cache.get_analysis(other.model("User").unwrap(), &other).unwrap();

    let calls = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&calls);
    let layers = vec![layer("count", move |_: &Model, _: &ModelAnalysis, _: &()| {
        counter.fetch_add(1, Ordering::SeqCst);
        Ok(Vec::new())
    })];
    let err = Orchestrator::new(OutputLayout::new("/out"))
        .run(&blog, &layers, &(), &mut cache)
        .unwrap_err();
    assert!(matches!(err, SchemaError::ForeignSchema { .. }));
    assert_eq!(calls.load(Ordering::SeqCst), 0);
}

#[test]
fn test_placement_conflict_drops_only_that_artifact() {
    let schema = fixtures::user_post();
    let layers: Vec<Box<dyn LayerGenerator<()>>> = vec![
        layer("index", |_, _, _| Ok(vec![ArtifactFile::new("shared/index", "a")])),
        layer("relocated", |m, _, _| {
            if m.name != "User" {
                return Ok(Vec::new());
            }
            Ok(vec![
                ArtifactFile::new("shared/index", "b").placed_at("elsewhere/index.rs"),
                ArtifactFile::new("relocated/ok", "c"),
            ])
        }),
    ];
    let result = Orchestrator::new(OutputLayout::new("/out"))
        .run(&schema, &layers, &(), &mut AnalysisCache::new())
        .unwrap();

    assert!(!result.success);
    assert!(result.failures.is_empty());
    assert_eq!(result.manifest.conflicts.len(), 1);
    let conflict = &result.manifest.conflicts[0];
    assert_eq!(conflict.logical_id, "shared/index");
    assert_eq!(conflict.existing, std::path::PathBuf::from("/out/shared/index.rs"));
    assert_eq!(conflict.rejected, std::path::PathBuf::from("/out/elsewhere/index.rs"));

    assert_eq!(result.artifact("shared/index").unwrap().content, "a");
    assert!(result.artifact("relocated/ok").is_some());
}

#[test]
fn test_builtin_layers_over_blog() {
    let schema = fixtures::blog();
    let result = builtin_run(&schema, false);
    assert!(result.success, "failures: {:?}", result.failures);

    // Five exposed models with five layers, plus dto and validator for the junction.
    assert_eq!(result.artifacts.len(), 27);
    assert!(result.artifact("dto/post_tag").is_some());
    assert!(result.artifact("validators/post_tag").is_some());
    assert!(result.artifact("services/post_tag").is_none());
    assert!(result.artifact("routes/post_tag").is_none());

    let post_service = &result.artifact("services/post").unwrap().content;
    assert!(!post_service.contains("find_by_slug"));
    assert!(post_service.contains("fn soft_delete(&self, id: i32)"));
    assert!(post_service.contains("fn list_published(&self, page: Page)"));
    assert!(post_service.contains("fn increment_views(&self, id: i32)"));
    assert!(post_service.contains("fn load_categories(&self, id: i32)"));
    assert!(post_service.contains("use crate::generated::dto::post::{Post, CreatePostInput, UpdatePostInput};"));

    let tag_service = &result.artifact("services/tag").unwrap().content;
    assert!(tag_service.contains("fn find_by_slug(&self, slug: &str)"));

    let comment_service = &result.artifact("services/comment").unwrap().content;
    assert!(comment_service.contains("fn approve(&self, id: i32)"));
    assert!(comment_service.contains("fn list_children(&self, id: i32, page: Page)"));
    assert!(comment_service.contains("(self-referential)"));

    let post_validator = &result.artifact("validators/post").unwrap().content;
    assert!(post_validator.contains("\"DRAFT\", \"PUBLISHED\", \"ARCHIVED\""));

    let post_routes = &result.artifact("routes/post").unwrap().content;
    assert!(post_routes.contains("(\"GET\", \"/api/posts/published\", \"list_published_posts\"),"));
    assert!(post_routes.contains("(\"POST\", \"/api/posts/{id}/restore\", \"restore_post\"),"));
    assert!(!post_routes.contains("by-slug"));

    let user = result.manifest.path_map.get("handlers/user").unwrap();
    assert_eq!(user.import_specifier, "crate::generated::handlers::user");
    assert_eq!(
        user.absolute_path,
        std::path::PathBuf::from("/srv/app/src/generated/handlers/user.rs")
    );
}

#[test]
fn test_runs_are_deterministic_serial_and_parallel() {
    let schema = fixtures::blog();
    let first = builtin_run(&schema, false);
    let second = builtin_run(&schema, false);
    let parallel = builtin_run(&schema, true);

    for other in [&second, &parallel] {
        assert!(first.manifest.deterministic_eq(&other.manifest));
        assert_eq!(first.artifacts.len(), other.artifacts.len());
        for (a, b) in first.artifacts.iter().zip(&other.artifacts) {
            assert_eq!(a.logical_id, b.logical_id);
            assert_eq!(a.path, b.path);
            assert_eq!(a.content, b.content, "{} differs", a.logical_id);
        }
    }
    assert_eq!(
        first.manifest.to_json().unwrap().lines().filter(|l| l.contains("generatedAt")).count(),
        1
    );
}

#[test]
fn test_disabled_layers_are_not_run() {
    let schema = fixtures::blog();
    let config = GeneratorConfig {
        layers: vec!["dto".into()],
        ..GeneratorConfig::default()
    };
    let layers = builtin_layers(&config, Arc::new(LayerContext::default()));
    let result = Orchestrator::new(OutputLayout::new("/out"))
        .run(&schema, &layers, &config, &mut AnalysisCache::new())
        .unwrap();
    assert!(result.success);
    assert_eq!(result.artifacts.len(), schema.models().len());
    assert!(result.artifacts.iter().all(|a| a.layer == "dto"));
}

#[test]
fn test_two_ids_placed_at_the_same_path_conflict() {
    let schema = fixtures::user_post();
    let layers = vec![layer("shared", |m, _, _| {
        Ok(vec![
            ArtifactFile::new(format!("a/{}", m.name.to_lowercase()), m.name.clone()).placed_at("same.rs")
        ])
    })];
    let result = Orchestrator::new(OutputLayout::new("/out"))
        .run(&schema, &layers, &(), &mut AnalysisCache::new())
        .unwrap();

    assert!(!result.success);
    assert_eq!(result.artifacts.len(), 1);
    let kept = &result.artifacts[0];
    assert_eq!(kept.logical_id, "a/user");
    assert_eq!(kept.content, "User");
    assert_eq!(kept.path, std::path::PathBuf::from("/out/same.rs"));
    assert_eq!(kept.import_specifier, "crate::same");

    assert_eq!(result.manifest.conflicts.len(), 1);
    let conflict = &result.manifest.conflicts[0];
    assert_eq!(conflict.logical_id, "a/post");
    assert_eq!(conflict.owner, "a/user");
    assert_eq!(conflict.rejected, std::path::PathBuf::from("/out/same.rs"));
    assert!(!result.manifest.path_map.contains_key("a/post"));
}

#[test]
fn test_module_index_over_builtin_layers() {
    let schema = fixtures::blog();
    let config = GeneratorConfig {
        layers: vec!["dto".into(), "service".into()],
        ..GeneratorConfig::default()
    };
    let context = LayerContext::new(ProviderRegistry::with_defaults()).with_enums(schema.enums());
    let layers = builtin_layers(&config, Arc::new(context));
    let result = Orchestrator::new(OutputLayout::new("/out"))
        .with_options(RunOptions {
            module_index: true,
            ..RunOptions::default()
        })
        .run(&schema, &layers, &config, &mut AnalysisCache::new())
        .unwrap();
    assert!(result.success, "failures: {:?}", result.failures);

    let dto = result.artifact("dto/mod").unwrap();
    assert_eq!(dto.layer, MODULE_INDEX_LAYER);
    assert_eq!(dto.import_specifier, "crate::dto");
    assert!(dto.content.contains("pub mod post;"));
    assert!(dto.content.contains("pub mod post_tag;"));
    assert!(!result.artifact("services/mod").unwrap().content.contains("post_tag"));

    let root = result.artifact("mod").unwrap();
    assert_eq!(root.path, std::path::PathBuf::from("/out/mod.rs"));
    assert!(root.content.ends_with("pub mod dto;\npub mod services;\n"));
    for id in ["dto/mod", "services/mod", "mod"] {
        assert!(result.manifest.path_map.contains_key(id), "{id} missing from manifest");
    }
}
