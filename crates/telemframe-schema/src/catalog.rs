use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Arc;

use telemframe_codec::{Codec, Schema};
use tracing::{debug, warn};

use crate::config::LoaderConfig;
use crate::error::{Result, SchemaError};
use crate::loader::{read_definition_file, SchemaLoader};

const SCHEMA_SUFFIX: &str = ".schema.json";

/// Named schemas, typically loaded from a directory of definition files.
#[derive(Debug, Clone, Default)]
pub struct SchemaCatalog {
    schemas: BTreeMap<String, Arc<Schema>>,
    loader: SchemaLoader,
}

impl SchemaCatalog {
    /// Create an empty catalog with default config.
    pub fn new() -> Self {
        Self::with_config(LoaderConfig::default())
    }

    /// Create an empty catalog with explicit config.
    pub fn with_config(config: LoaderConfig) -> Self {
        Self {
            schemas: BTreeMap::new(),
            loader: SchemaLoader::with_config(config),
        }
    }

    /// Load every `<name>.schema.json` file in a directory.
    pub fn from_directory(path: &Path) -> Result<Self> {
        Self::from_directory_with_config(path, LoaderConfig::default())
    }

    /// Load schemas from a directory with explicit config.
    pub fn from_directory_with_config(path: &Path, config: LoaderConfig) -> Result<Self> {
        let mut catalog = Self::with_config(config);

        let mut entries = std::fs::read_dir(path)
            .map_err(|err| SchemaError::LoadFailed(format!("{}: {err}", path.display())))?
            .collect::<std::io::Result<Vec<_>>>()
            .map_err(|err| SchemaError::LoadFailed(err.to_string()))?;
        entries.sort_by_key(|entry| entry.file_name());

        for entry in entries {
            let file_name = entry.file_name();
            let file_name = file_name.to_string_lossy();
            let Some(name) = schema_name(&file_name) else {
                continue;
            };

            let entry_path = entry.path();
            let file_type = std::fs::symlink_metadata(&entry_path)
                .map_err(|err| SchemaError::LoadFailed(err.to_string()))?
                .file_type();
            if file_type.is_symlink() {
                warn!(file = %file_name, "refusing schema symlink");
                return Err(SchemaError::LoadFailed(format!(
                    "refusing to load schema symlink: {file_name}"
                )));
            }
            if !file_type.is_file() {
                continue;
            }

            if catalog.schemas.len() >= config.max_schemas_from_directory {
                return Err(SchemaError::LoadFailed(format!(
                    "schema count exceeds configured max ({}): {}",
                    config.max_schemas_from_directory,
                    catalog.schemas.len() + 1
                )));
            }

            let content = read_definition_file(&entry_path, config.max_schema_file_size)?;
            let schema = catalog.loader.load_str(&content)?;
            catalog.insert(name, schema);
        }

        debug!(
            path = %path.display(),
            schemas = catalog.len(),
            "schema directory loaded"
        );
        Ok(catalog)
    }

    /// Add or replace a named schema, returning the previous one.
    pub fn insert(&mut self, name: impl Into<String>, schema: Schema) -> Option<Arc<Schema>> {
        self.schemas.insert(name.into(), Arc::new(schema))
    }

    /// Look up a schema by name.
    pub fn get(&self, name: &str) -> Option<&Schema> {
        self.schemas.get(name).map(Arc::as_ref)
    }

    /// Look up a schema by name, failing with [`SchemaError::NotFound`].
    pub fn require(&self, name: &str) -> Result<&Schema> {
        self.get(name)
            .ok_or_else(|| SchemaError::NotFound(name.to_string()))
    }

    /// Build a codec bound to the named schema.
    pub fn codec(&self, name: &str) -> Result<Codec> {
        self.schemas
            .get(name)
            .map(|schema| Codec::new(Arc::clone(schema)))
            .ok_or_else(|| SchemaError::NotFound(name.to_string()))
    }

    /// Schema names in sorted order.
    pub fn names(&self) -> Vec<&str> {
        self.schemas.keys().map(String::as_str).collect()
    }

    pub fn len(&self) -> usize {
        self.schemas.len()
    }

    pub fn is_empty(&self) -> bool {
        self.schemas.is_empty()
    }

    /// Get loader configuration.
    pub fn config(&self) -> &LoaderConfig {
        self.loader.config()
    }
}

fn schema_name(file_name: &str) -> Option<&str> {
    file_name
        .strip_suffix(SCHEMA_SUFFIX)
        .filter(|name| !name.is_empty())
}
