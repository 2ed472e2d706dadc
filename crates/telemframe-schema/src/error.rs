use telemframe_codec::CodecError;

/// Errors that can occur while loading schema definitions.
#[derive(Debug, thiserror::Error)]
pub enum SchemaError {
    /// The definition file could not be read.
    #[error("failed to load schema: {0}")]
    LoadFailed(String),

    /// The definition is not valid JSON.
    #[error("schema definition is not valid JSON: {0}")]
    InvalidJson(#[from] serde_json::Error),

    /// The JSON is well-formed but does not describe a schema.
    #[error("invalid schema definition: {0}")]
    InvalidDefinition(String),

    /// The definition declares more channels than the loader allows.
    #[error("schema declares {count} channels (max {max})")]
    TooManyChannels { count: usize, max: usize },

    /// The channel list was rejected by the codec (e.g. duplicate keys).
    #[error(transparent)]
    Codec(#[from] CodecError),

    /// No schema with the given name in the catalog.
    #[error("no schema named {0:?}")]
    NotFound(String),
}

pub type Result<T> = std::result::Result<T, SchemaError>;
