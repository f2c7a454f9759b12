//! # CLI Module
//!
//! Command-line interface of the `modelforge-gen` binary.
//!
//! ## Commands
//!
//! ### `generate`
//!
//! Generate every enabled layer for every model of a schema:
//!
//! ```bash
//! modelforge-gen generate --schema schema.json --output src/generated
//! ```
//!
//! Options:
//! - `--schema <FILE>` - Normalized schema, JSON or YAML (required)
//! - `--output <DIR>` - Output root (default: `src/generated`)
//! - `--config <FILE>` - Generator config (default: `modelforge.toml` next to the schema)
//! - `--only <LAYERS>` - Comma-separated subset of `dto,validator,service,handler,routes`
//! - `--target <NAME>` / `--provider <NAME>` - Override the config file
//! - `--force` - Overwrite files that differ from the generated content
//! - `--dry-run` - Report what would be written
//! - `--parallel` - Generate models on parallel threads
//!
//! The command exits non-zero when any layer failed or any path conflicted,
//! after writing everything that did succeed.
//!
//! ### `analyze`
//!
//! Print relationship and special-field analysis as JSON:
//!
//! ```bash
//! modelforge-gen analyze --schema schema.json --model Post
//! ```
//!
//! ### `order`
//!
//! Print models in dependency order:
//!
//! ```bash
//! modelforge-gen order --schema schema.json
//! ```

mod commands;


pub use commands::{run_cli, Cli, Commands, LayerName};
