use anyhow::Context;
use clap::{Parser, Subcommand, ValueEnum};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::analysis::{topological_order, AnalysisCache, ModelAnalysis};
use crate::config::{load_config, resolve_config_path, GeneratorConfig};
use crate::generator::{
    builtin_layers, write_artifacts, write_manifest, LayerContext, Orchestrator,
    OutputLayout, RunOptions,
};
use crate::providers::ProviderRegistry;
use crate::schema::{load_schema, ParsedSchema};

/// Command-line interface for modelforge
///
/// Generates application layers from a normalized data-model schema.
#[derive(Parser)]
#[command(name = "modelforge-gen")]
#[command(about = "Relationship-aware layer generator", long_about = None, version)]
pub struct Cli {
    /// Log at debug level (overridden by RUST_LOG)
    #[arg(short, long, global = true, default_value_t = false)]
    pub verbose: bool,

    /// Emit logs as JSON lines
    #[arg(long, global = true, default_value_t = false)]
    pub log_json: bool,

    /// The subcommand to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Available CLI commands
#[derive(Subcommand)]
pub enum Commands {
    /// Generate layers for every model of a schema
    Generate {
        /// Path to the normalized schema (JSON or YAML)
        #[arg(short, long)]
        schema: PathBuf,

        /// Output root for generated files
        #[arg(short, long, default_value = "src/generated")]
        output: PathBuf,

        /// Generator config (default: modelforge.toml next to the schema)
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Limit generation to specific layers (comma-separated or repeated)
        #[arg(long, value_enum, num_args = 1.., value_delimiter = ',')]
        only: Option<Vec<LayerName>>,

        /// Web framework for handlers and routes
        #[arg(long)]
        target: Option<String>,

        /// Data provider for services
        #[arg(long)]
        provider: Option<String>,

        /// Overwrite existing files
        #[arg(short, long, default_value_t = false)]
        force: bool,

        /// Show what would change without writing files
        #[arg(long, default_value_t = false)]
        dry_run: bool,

        /// Generate models on parallel threads
        #[arg(long, default_value_t = false)]
        parallel: bool,
    },
    /// Print the analysis of one model, or of every model, as JSON
    Analyze {
        /// Path to the normalized schema (JSON or YAML)
        #[arg(short, long)]
        schema: PathBuf,

        /// Only this model
        #[arg(short, long)]
        model: Option<String>,
    },
    /// Print models in dependency order, referenced models first
    Order {
        /// Path to the normalized schema (JSON or YAML)
        #[arg(short, long)]
        schema: PathBuf,
    },
}

/// Built-in layers selectable with `--only`.
#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
pub enum LayerName {
    /// Entity and input structs
    Dto,
    /// Input checks
    Validator,
    /// Data-access trait
    Service,
    /// Request handlers
    Handler,
    /// Route tables
    Routes,
}

impl LayerName {
    pub fn as_str(self) -> &'static str {
        match self {
            LayerName::Dto => "dto",
            LayerName::Validator => "validator",
            LayerName::Service => "service",
            LayerName::Handler => "handler",
            LayerName::Routes => "routes",
        }
    }
}

/// Execute the CLI command provided by the user
///
/// # Errors
///
/// Returns an error if:
/// - The schema cannot be loaded or contains unresolved references
/// - The generator config cannot be read, or names unknown layers
/// - Any layer failed or any output path conflicted (after the rest was written)
/// - Output files cannot be written
pub fn run_cli(cli: Cli) -> anyhow::Result<()> {
    match cli.command {
        Commands::Generate {
            schema,
            output,
            config,
            only,
            target,
            provider,
            force,
            dry_run,
            parallel,
        } => {
            let parsed = load_schema(&schema)?;
            let mut generator_config = resolve_generator_config(config.as_deref(), &schema)?;
            if let Some(target) = target {
                generator_config.target = target;
            }
            if let Some(provider) = provider {
                generator_config.provider = provider;
            }
            if let Some(only) = only {
                generator_config.layers = only.iter().map(|l| l.as_str().to_string()).collect();
            }
            if parallel {
                generator_config.parallel = true;
            }
            generator_config.validate_layers()?;
            generate(&parsed, &generator_config, &output, force, dry_run)
        }
        Commands::Analyze { schema, model } => {
            let parsed = load_schema(&schema)?;
            let mut cache = AnalysisCache::new();
            let json = match model {
                Some(name) => {
                    let model = parsed.require_model(&name)?;
                    serde_json::to_string_pretty(cache.get_analysis(model, &parsed)?.as_ref())?
                }
                None => {
                    let mut all = Vec::with_capacity(parsed.models().len());
                    for model in parsed.models() {
                        all.push(cache.get_analysis(model, &parsed)?);
                    }
                    let all: Vec<&ModelAnalysis> = all.iter().map(|a| a.as_ref()).collect();
                    serde_json::to_string_pretty(&all)?
                }
            };
            println!("{json}");
            Ok(())
        }
        Commands::Order { schema } => {
            let parsed = load_schema(&schema)?;
            for name in topological_order(&parsed) {
                println!("{name}");
            }
            Ok(())
        }
    }
}

/// File config (explicit or auto-detected), then `MODELFORGE_*` overrides.
fn resolve_generator_config(explicit: Option<&Path>, schema: &Path) -> anyhow::Result<GeneratorConfig> {
    let mut config = match resolve_config_path(explicit, schema) {
        Some(path) => {
            tracing::info!(path = %path.display(), "using generator config");
            load_config(&path)?.unwrap_or_default()
        }
        None => GeneratorConfig::default(),
    };
    config.apply_env();
    Ok(config)
}

fn generate(
    schema: &ParsedSchema,
    config: &GeneratorConfig,
    output: &Path,
    force: bool,
    dry_run: bool,
) -> anyhow::Result<()> {
    let context = LayerContext::new(ProviderRegistry::with_defaults()).with_enums(schema.enums());
    let layers = builtin_layers(config, Arc::new(context));
    let orchestrator = Orchestrator::new(
        OutputLayout::new(output).with_import_root(config.import_root.clone()),
    )
    .with_options(RunOptions {
        parallel: config.parallel,
        module_index: true,
        ..RunOptions::default()
    });

    let mut cache = AnalysisCache::new();
    let result = orchestrator.run(schema, &layers, config, &mut cache)?;
    for warning in &result.warnings {
        println!("⚠️  {warning}");
    }
    for failure in &result.failures {
        eprintln!("❌ {failure}");
    }
    for conflict in &result.manifest.conflicts {
        eprintln!("❌ {conflict}");
    }

    let summary = write_artifacts(&result, force, dry_run)?;
    if !dry_run {
        write_manifest(&result.manifest, output)
            .with_context(|| format!("Failed to write manifest into {}", output.display()))?;
    }
    println!(
        "📦 {} written, {} unchanged, {} skipped",
        summary.written.len(),
        summary.unchanged.len(),
        summary.skipped.len()
    );

    if !result.success {
        anyhow::bail!(
            "{} layer failure(s), {} path conflict(s)",
            result.failures.len(),
            result.manifest.conflicts.len()
        );
    }
    Ok(())
}
