//! # modelforge
//!
//! **modelforge** is a deterministic, relationship-aware code generator. It reads a normalized
//! data-model schema (models, fields, relations, enums, unique constraints) and emits DTO,
//! validator, service, handler and route layers for a Rust web application.
//!
//! ## Overview
//!
//! Every model is analyzed exactly once per run. The analysis classifies each relation field
//! (one-to-one, one-to-many, many-to-one, many-to-many), detects junction tables and special
//! fields (slugs, soft-delete, publish flags, counters, self-referential parents) and decides
//! which fields support single-row lookups. All layers then consume the same shared analysis,
//! so they can never disagree about a model.
//!
//! ## Architecture
//!
//! - **[`schema`]** - Loading and freezing the normalized schema (JSON or YAML)
//! - **[`analysis`]** - Relationship classification, special fields, junction detection,
//!   topological ordering and the per-run analysis cache
//! - **[`generator`]** - Two-phase orchestrator, path tracking, manifest and built-in layers
//! - **[`providers`]** - Registry of data providers the service layer can target
//! - **[`config`]** - `modelforge.toml` and `MODELFORGE_*` environment overrides
//! - **[`cli`]** - The `modelforge-gen` command line
//! - **[`logging`]** - `tracing` subscriber setup for the binary
//!
//! ### Generation Flow
//!
//! ```mermaid
//! sequenceDiagram
//!     participant User
//!     participant CLI as CLI<br/>(modelforge-gen)
//!     participant Schema as schema::load_schema
//!     participant Cache as AnalysisCache
//!     participant Orch as Orchestrator
//!     participant Layer as LayerGenerator × N
//!     participant Tracker as PathTracker
//!     participant FS as File System
//!
//!     User->>CLI: modelforge-gen generate --schema schema.json
//!     CLI->>Schema: load_schema("schema.json")
//!     Schema-->>CLI: ParsedSchema (frozen, fingerprinted)
//!
//!     CLI->>Orch: run(&schema, &layers, &config, &mut cache)
//!     loop every model (Phase 1)
//!         Orch->>Cache: get_analysis(model, schema)
//!         Cache-->>Orch: Arc<ModelAnalysis>
//!     end
//!     alt unresolved relation target
//!         Orch-->>CLI: SchemaError (nothing generated)
//!     end
//!
//!     loop every model × layer (Phase 2)
//!         Orch->>Layer: generate(model, &analysis, &config)
//!         alt error or panic
//!             Layer-->>Orch: Failure (other pairs continue)
//!         end
//!         Layer-->>Orch: Vec<ArtifactFile>
//!         Orch->>Tracker: track_path(logical_id, path)
//!     end
//!     Orch-->>CLI: RunResult (artifacts, failures, warnings, manifest)
//!
//!     CLI->>FS: write artifacts, mod.rs files, manifest.json
//!     CLI-->>User: ✅ / ❌ summary
//! ```
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use modelforge::analysis::AnalysisCache;
//! use modelforge::config::GeneratorConfig;
//! use modelforge::generator::{builtin_layers, LayerContext, Orchestrator, OutputLayout};
//! use modelforge::providers::ProviderRegistry;
//! use modelforge::schema::load_schema;
//! use std::sync::Arc;
//!
//! let schema = load_schema("schema.json".as_ref())?;
//! let config = GeneratorConfig::default();
//! let context = LayerContext::new(ProviderRegistry::with_defaults()).with_enums(schema.enums());
//! let layers = builtin_layers(&config, Arc::new(context));
//!
//! let mut cache = AnalysisCache::new();
//! let result = Orchestrator::new(OutputLayout::new("src/generated"))
//!     .run(&schema, &layers, &config, &mut cache)?;
//! assert!(result.success);
//! ```
//!
//! ## Custom Layers
//!
//! Anything implementing [`generator::LayerGenerator`] can join a run, including closures
//! wrapped in [`generator::FnLayer`]. The orchestrator never inspects the configuration
//! type; it forwards it to every layer.

pub mod analysis;
pub mod cli;
pub mod config;
pub mod generator;
pub mod logging;
pub mod providers;
pub mod schema;

pub use analysis::{analyze_model, topological_order, AnalysisCache, ModelAnalysis};
pub use generator::{ArtifactFile, LayerGenerator, Orchestrator, OutputLayout, RunResult};
pub use schema::{load_schema, parse_schema_str, ParsedSchema, SchemaError, SchemaFormat};
