use std::path::PathBuf;

/// Fatal schema-level failure. Aborts a run before any generation begins.
#[derive(Debug, thiserror::Error)]
pub enum SchemaError {
    #[error("failed to read schema {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse schema document: {0}")]
    Parse(String),

    #[error("model '{model}', field '{field}': relation target '{target}' is not a model in this schema")]
    UnresolvedRelation {
        model: String,
        field: String,
        target: String,
    },

    #[error("model '{model}', field '{field}': enum '{target}' is not declared")]
    UnresolvedEnum {
        model: String,
        field: String,
        target: String,
    },

    #[error("model '{model}', field '{field}': unknown scalar type '{ty}'")]
    UnknownScalar {
        model: String,
        field: String,
        ty: String,
    },

    #[error("malformed schema at {location}: {message}")]
    Malformed { location: String, message: String },

    #[error("model '{0}' is not part of this schema")]
    UnknownModel(String),

    #[error("analysis cache is bound to schema {expected}, got {actual}")]
    ForeignSchema { expected: String, actual: String },
}

impl SchemaError {
    pub(crate) fn malformed(location: impl Into<String>, message: impl Into<String>) -> Self {
        SchemaError::Malformed {
            location: location.into(),
            message: message.into(),
        }
    }
}
