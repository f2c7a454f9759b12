//! # Model Analysis Cache
//!
//! Memoizes one [`ModelAnalysis`] per model for the lifetime of one run.
//!
//! The cache is an explicit value owned by the caller and handed to the
//! orchestrator, never process-wide state. That keeps test runs isolated and
//! lets two generations over different schemas run side by side.
//!
//! ## Binding
//!
//! The first analysis binds the cache to the schema's content fingerprint.
//! Asking the same cache about a schema with a different fingerprint fails with
//! [`SchemaError::ForeignSchema`] instead of serving stale entries.
//!
//! ## Sharing
//!
//! Entries are `Arc`-wrapped: every layer generator for a model receives a
//! clone of the same pointer, so no layer can observe a different analysis.
//!
//! ```rust,ignore
//! let mut cache = AnalysisCache::new();
//! let a = cache.get_analysis(model, &schema)?;
//! let b = cache.get_analysis(model, &schema)?;
//! assert!(Arc::ptr_eq(&a, &b));
//! assert_eq!(cache.computations(), 1);
//! ```

use std::collections::HashMap;
use std::sync::Arc;
use tracing::debug;

use super::{analyze_model, ModelAnalysis};
use crate::schema::{Model, ParsedSchema, SchemaError};

#[derive(Debug, Default)]
pub struct AnalysisCache {
    fingerprint: Option<String>,
    entries: HashMap<String, Arc<ModelAnalysis>>,
    computations: usize,
}

impl AnalysisCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Return the analysis for `model`, computing it on first request.
    ///
    /// # Errors
    ///
    /// * [`SchemaError::ForeignSchema`] when the cache is bound to another schema
    /// * any error from the relationship analyzer (unresolved relation target)
    pub fn get_analysis(
        &mut self,
        model: &Model,
        schema: &ParsedSchema,
    ) -> Result<Arc<ModelAnalysis>, SchemaError> {
        match &self.fingerprint {
            Some(bound) if bound != schema.fingerprint() => {
                return Err(SchemaError::ForeignSchema {
                    expected: bound.clone(),
                    actual: schema.fingerprint().to_string(),
                });
            }
            Some(_) => {}
            None => self.fingerprint = Some(schema.fingerprint().to_string()),
        }

        if let Some(hit) = self.entries.get(&model.name) {
            return Ok(Arc::clone(hit));
        }

        let analysis = Arc::new(analyze_model(model, schema)?);
        self.computations += 1;
        debug!(
            model = %model.name,
            relationships = analysis.relationships.len(),
            junction = analysis.is_junction_table,
            "analyzed model"
        );
        self.entries.insert(model.name.clone(), Arc::clone(&analysis));
        Ok(analysis)
    }

    /// Read-only lookup of an already computed analysis.
    pub fn get(&self, model_name: &str) -> Option<Arc<ModelAnalysis>> {
        self.entries.get(model_name).cloned()
    }

    /// Number of times the analyzer actually ran.
    pub fn computations(&self) -> usize {
        self.computations
    }

    /// Fingerprint of the schema this cache is bound to, if any.
    pub fn fingerprint(&self) -> Option<&str> {
        self.fingerprint.as_deref()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
