//! # Generator Orchestrator
//!
//! Threads one cached [`ModelAnalysis`] per model through any number of layer
//! generators and records every emitted artifact in a [`PathTracker`].
//!
//! ## Phases
//!
//! 1. **Analysis (barrier)** - every model is analyzed into the caller's
//!    [`AnalysisCache`] in declaration order. A schema error here aborts the
//!    run before any generator is invoked.
//! 2. **Generation** - for each model, each layer is called with the same
//!    `Arc<ModelAnalysis>`. A layer that returns an error or panics becomes a
//!    [`Failure`]; every other model/layer pair still runs.
//!
//! With [`RunOptions::parallel`] set, Phase 2 runs one scoped thread per model.
//! Outcomes are merged in declaration order either way, so the artifacts and
//! the manifest do not depend on scheduling.
//!
//! With [`RunOptions::module_index`] set, a `mod.rs` declaring every generated
//! `.rs` file and subdirectory is added to each output directory (the root
//! included). These index files go through the path tracker like any other
//! artifact and appear in the manifest.
//!
//! ```rust,ignore
//! let orchestrator = Orchestrator::new(OutputLayout::new("generated"));
//! let mut cache = AnalysisCache::new();
//! let result = orchestrator.run(&schema, &layers, &config, &mut cache)?;
//! for failure in &result.failures {
//!     eprintln!("{failure}");
//! }
//! ```

use serde::Serialize;
use std::any::Any;
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{debug, info, warn};

use super::paths::{Manifest, OutputLayout, PathTracker};
use crate::analysis::{AnalysisCache, ModelAnalysis, RelationshipAmbiguityWarning};
use crate::schema::{Model, ParsedSchema, SchemaError};

/// One file's worth of generated content, addressed by logical id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArtifactFile {
    pub logical_id: String,
    pub content: String,
    /// Explicit location relative to the output root, overriding the layout.
    pub placement: Option<PathBuf>,
}

impl ArtifactFile {
    pub fn new(logical_id: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            logical_id: logical_id.into(),
            content: content.into(),
            placement: None,
        }
    }

    pub fn placed_at(mut self, relative: impl Into<PathBuf>) -> Self {
        self.placement = Some(relative.into());
        self
    }
}

/// A code generator for one layer of the target application.
///
/// `C` is the run configuration; the orchestrator forwards it without reading it.
pub trait LayerGenerator<C>: Send + Sync {
    fn name(&self) -> &str;

    fn generate(
        &self,
        model: &Model,
        analysis: &ModelAnalysis,
        config: &C,
    ) -> anyhow::Result<Vec<ArtifactFile>>;
}

/// Adapts a closure into a [`LayerGenerator`].
pub struct FnLayer<F> {
    name: String,
    generate: F,
}

impl<F> FnLayer<F> {
    pub fn new(name: impl Into<String>, generate: F) -> Self {
        Self {
            name: name.into(),
            generate,
        }
    }
}

impl<C, F> LayerGenerator<C> for FnLayer<F>
where
    F: Fn(&Model, &ModelAnalysis, &C) -> anyhow::Result<Vec<ArtifactFile>> + Send + Sync,
{
    fn name(&self) -> &str {
        &self.name
    }

    fn generate(
        &self,
        model: &Model,
        analysis: &ModelAnalysis,
        config: &C,
    ) -> anyhow::Result<Vec<ArtifactFile>> {
        (self.generate)(model, analysis, config)
    }
}

/// A model/layer pair that did not produce its artifacts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Failure {
    pub model: String,
    pub layer: String,
    pub cause: String,
}

impl fmt::Display for Failure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} / {}: {}", self.model, self.layer, self.cause)
    }
}

/// An artifact that was accepted by the path tracker.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmittedArtifact {
    pub model: String,
    pub layer: String,
    pub logical_id: String,
    pub path: PathBuf,
    pub import_specifier: String,
    pub content: String,
}

/// Layer name recorded on generated `mod.rs` artifacts.
pub const MODULE_INDEX_LAYER: &str = "mod";

#[derive(Debug, Clone)]
pub struct RunOptions {
    /// Generate models on scoped threads during Phase 2.
    pub parallel: bool,
    /// Emit a `mod.rs` per output directory when the layout extension is `rs`.
    pub module_index: bool,
    /// Recorded in the manifest.
    pub tool_version: String,
}

impl Default for RunOptions {
    fn default() -> Self {
        Self {
            parallel: false,
            module_index: false,
            tool_version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct RunResult {
    /// No failures and no path conflicts.
    pub success: bool,
    pub failures: Vec<Failure>,
    /// Accepted artifacts in declaration order (model, then layer).
    pub artifacts: Vec<EmittedArtifact>,
    pub warnings: Vec<RelationshipAmbiguityWarning>,
    pub manifest: Manifest,
}

impl RunResult {
    pub fn artifact(&self, logical_id: &str) -> Option<&EmittedArtifact> {
        self.artifacts.iter().find(|a| a.logical_id == logical_id)
    }
}

type LayerOutcome = (String, Result<Vec<ArtifactFile>, String>);

pub struct Orchestrator {
    layout: OutputLayout,
    options: RunOptions,
}

impl Orchestrator {
    pub fn new(layout: OutputLayout) -> Self {
        Self {
            layout,
            options: RunOptions::default(),
        }
    }

    pub fn with_options(mut self, options: RunOptions) -> Self {
        self.options = options;
        self
    }

    pub fn layout(&self) -> &OutputLayout {
        &self.layout
    }

    /// Analyze every model, then run every layer for every model.
    ///
    /// # Errors
    ///
    /// Only Phase 1 errors are returned; generation problems are reported in
    /// [`RunResult::failures`] and the manifest's conflicts.
    pub fn run<C: Sync>(
        &self,
        schema: &ParsedSchema,
        layers: &[Box<dyn LayerGenerator<C>>],
        config: &C,
        cache: &mut AnalysisCache,
    ) -> Result<RunResult, SchemaError> {
        let models = schema.models();
        info!(models = models.len(), layers = layers.len(), "analysis phase");

        let mut analyses: Vec<Arc<ModelAnalysis>> = Vec::with_capacity(models.len());
        let mut warnings = Vec::new();
        for model in models {
            let analysis = cache.get_analysis(model, schema)?;
            warnings.extend(analysis.warnings.iter().cloned());
            analyses.push(analysis);
        }

        info!(parallel = self.options.parallel, "generation phase");
        let outcomes: Vec<Vec<LayerOutcome>> = if self.options.parallel && models.len() > 1 {
            std::thread::scope(|scope| {
                let handles: Vec<_> = models
                    .iter()
                    .zip(&analyses)
                    .map(|(model, analysis)| {
                        scope.spawn(move || generate_model(model, analysis, layers, config))
                    })
                    .collect();
                handles
                    .into_iter()
                    .map(|handle| {
                        handle.join().unwrap_or_else(|_| {
                            layers
                                .iter()
                                .map(|l| (l.name().to_string(), Err("worker thread panicked".to_string())))
                                .collect()
                        })
                    })
                    .collect()
            })
        } else {
            models
                .iter()
                .zip(&analyses)
                .map(|(model, analysis)| generate_model(model, analysis, layers, config))
                .collect()
        };

        let tracker = PathTracker::new();
        let mut artifacts = Vec::new();
        let mut failures = Vec::new();
        for (model, model_outcomes) in models.iter().zip(outcomes) {
            for (layer, outcome) in model_outcomes {
                let files = match outcome {
                    Ok(files) => files,
                    Err(cause) => {
                        warn!(model = %model.name, %layer, %cause, "layer generation failed");
                        failures.push(Failure {
                            model: model.name.clone(),
                            layer,
                            cause,
                        });
                        continue;
                    }
                };
                for file in files {
                    if let Err(failure) = self.accept(&tracker, &model.name, &layer, file, &mut artifacts) {
                        failures.push(failure);
                    }
                }
            }
        }

        if self.options.module_index {
            for file in module_index(&artifacts, &self.layout) {
                if let Err(failure) = self.accept(&tracker, "", MODULE_INDEX_LAYER, file, &mut artifacts) {
                    failures.push(failure);
                }
            }
        }

        let conflicts = tracker.conflict_count();
        let manifest = tracker.finalize(schema.fingerprint(), &self.options.tool_version);
        let success = failures.is_empty() && conflicts == 0;
        info!(
            artifacts = artifacts.len(),
            failures = failures.len(),
            conflicts,
            warnings = warnings.len(),
            "generation finished"
        );

        Ok(RunResult {
            success,
            failures,
            artifacts,
            warnings,
            manifest,
        })
    }
}

impl Orchestrator {
    /// Resolve and register one artifact. Path conflicts are recorded by the
    /// tracker and only drop this artifact.
    fn accept(
        &self,
        tracker: &PathTracker,
        model: &str,
        layer: &str,
        file: ArtifactFile,
        artifacts: &mut Vec<EmittedArtifact>,
    ) -> Result<(), Failure> {
        let entry = self
            .layout
            .resolve(&file.logical_id, file.placement.as_deref())
            .map_err(|err| Failure {
                model: model.to_string(),
                layer: layer.to_string(),
                cause: err.to_string(),
            })?;
        match tracker.track_entry(&entry) {
            Ok(true) => {
                debug!(logical_id = %entry.logical_id, path = %entry.absolute_path.display(), "artifact");
                artifacts.push(EmittedArtifact {
                    model: model.to_string(),
                    layer: layer.to_string(),
                    logical_id: entry.logical_id,
                    path: entry.absolute_path,
                    import_specifier: entry.import_specifier,
                    content: file.content,
                });
            }
            Ok(false) => {
                debug!(logical_id = %entry.logical_id, %layer, "artifact already emitted, keeping first");
            }
            Err(_) => {}
        }
        Ok(())
    }
}

/// One `mod.rs` per directory holding generated `.rs` files, declaring its
/// files and subdirectories. Directories that already got a `mod.rs` from a
/// layer are left alone.
fn module_index(artifacts: &[EmittedArtifact], layout: &OutputLayout) -> Vec<ArtifactFile> {
    if layout.extension != "rs" {
        return Vec::new();
    }
    let mut modules: BTreeMap<Vec<String>, BTreeSet<String>> = BTreeMap::new();
    let mut covered: BTreeSet<Vec<String>> = BTreeSet::new();
    for artifact in artifacts {
        let Ok(relative) = artifact.path.strip_prefix(&layout.root) else {
            continue;
        };
        if relative.extension().and_then(|e| e.to_str()) != Some("rs") {
            continue;
        }
        let Some(parts) = relative
            .iter()
            .map(|p| p.to_str().map(str::to_string))
            .collect::<Option<Vec<String>>>()
        else {
            continue;
        };
        let Some((file, dirs)) = parts.split_last() else {
            continue;
        };
        let stem = file.trim_end_matches(".rs");
        if stem == "mod" {
            covered.insert(dirs.to_vec());
        } else {
            modules.entry(dirs.to_vec()).or_default().insert(stem.to_string());
        }
        for depth in 0..dirs.len() {
            modules
                .entry(dirs[..depth].to_vec())
                .or_default()
                .insert(dirs[depth].clone());
        }
    }

    modules
        .into_iter()
        .filter(|(dir, _)| !covered.contains(dir))
        .map(|(dir, names)| {
            let mut content = String::from("// @generated by modelforge. Do not edit.\n\n");
            for name in names {
                content.push_str(&format!("pub mod {name};\n"));
            }
            let logical_id = if dir.is_empty() {
                "mod".to_string()
            } else {
                format!("{}/mod", dir.join("/"))
            };
            ArtifactFile::new(logical_id, content)
        })
        .collect()
}

fn generate_model<C>(
    model: &Model,
    analysis: &Arc<ModelAnalysis>,
    layers: &[Box<dyn LayerGenerator<C>>],
    config: &C,
) -> Vec<LayerOutcome> {
    layers
        .iter()
        .map(|layer| {
            let outcome = catch_unwind(AssertUnwindSafe(|| {
                layer.generate(model, analysis.as_ref(), config)
            }));
            let result = match outcome {
                Ok(Ok(files)) => Ok(files),
                Ok(Err(err)) => Err(format!("{err:#}")),
                Err(payload) => Err(format!("panicked: {}", panic_message(payload.as_ref()))),
            };
            (layer.name().to_string(), result)
        })
        .collect()
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic payload".to_string()
    }
}
