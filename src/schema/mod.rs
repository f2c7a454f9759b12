//! # Schema Module
//!
//! Loads a normalized data-model document and freezes it into an immutable
//! [`ParsedSchema`]: models, fields, enums, a name → model index, and a
//! back-reference index used by the relationship analyzer.
//!
//! Turning a source schema language into the normalized document is the job of
//! an upstream normalizer; this module only consumes its output (JSON or YAML).
//!
//! ```rust,ignore
//! use modelforge::schema::load_schema;
//!
//! let schema = load_schema(std::path::Path::new("schema.json"))?;
//! for model in schema.models() {
//!     println!("{} ({} relations)", model.name, model.relation_count());
//! }
//! ```

mod annotations;
mod build;
mod error;
mod load;
mod types;

pub use annotations::parse_annotations;
pub use build::build_schema;
pub use error::SchemaError;
pub use load::*;
pub use types::*;
