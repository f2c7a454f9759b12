//! # Generator Module
//!
//! Turns an analyzed schema into source files for a target application.
//!
//! ## Architecture
//!
//! ```text
//! ParsedSchema → AnalysisCache → Orchestrator → LayerGenerator × N → PathTracker → Manifest
//! ```
//!
//! - [`orchestrator`] - two-phase run: analyze every model, then call every
//!   layer with the shared analysis; isolates layer failures
//! - [`paths`] - logical id → file path and import specifier, conflict tracking,
//!   the run manifest
//! - [`layers`] - the built-in DTO, validator, service, handler and route layers
//! - [`naming`] - identifier casing and Rust type mapping shared by the layers
//! - [`write`] - writes a run to disk, honoring `--force` and `--dry-run`
//!
//! ## Generated Structure
//!
//! With the default layout rooted at `src/generated`:
//!
//! ```text
//! src/generated/
//! ├── manifest.json
//! ├── dto/          # one file per model + mod.rs
//! ├── validators/
//! ├── services/
//! ├── handlers/
//! └── routes/
//! ```
//!
//! ## Usage
//!
//! ```rust,ignore
//! use modelforge::generator::{builtin_layers, LayerContext, Orchestrator, OutputLayout};
//!
//! let layers = builtin_layers(&config, Arc::new(context));
//! let result = Orchestrator::new(OutputLayout::new("src/generated"))
//!     .run(&schema, &layers, &config, &mut cache)?;
//! write_artifacts(&result, false, false)?;
//! ```

pub mod layers;
pub mod naming;
pub mod orchestrator;
pub mod paths;
pub mod write;

pub use layers::{builtin_layers, LayerContext};
pub use orchestrator::{
    ArtifactFile, EmittedArtifact, Failure, FnLayer, LayerGenerator, Orchestrator, RunOptions, RunResult,
    MODULE_INDEX_LAYER,
};
pub use paths::{
    LayoutError, Manifest, OutputLayout, PathConflictError, PathEntry, PathTracker,
};
pub use write::{write_artifacts, write_manifest, WriteSummary, MANIFEST_FILE_NAME};
