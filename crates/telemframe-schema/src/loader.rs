use std::fs::File;
use std::io::Read;
use std::path::Path;

use serde::Deserialize;
use serde_json::{Map, Value};
use telemframe_codec::Schema;
use tracing::{debug, warn};

use crate::config::LoaderConfig;
use crate::definition::{SchemaDefinition, CHANNEL_FIELDS, DEFINITION_FIELDS};
use crate::error::{Result, SchemaError};

/// Builds [`Schema`]s from JSON definitions.
#[derive(Debug, Clone, Default)]
pub struct SchemaLoader {
    config: LoaderConfig,
}

impl SchemaLoader {
    /// Create a loader with default config.
    pub fn new() -> Self {
        Self::with_config(LoaderConfig::default())
    }

    /// Create a loader with explicit config.
    pub fn with_config(config: LoaderConfig) -> Self {
        Self { config }
    }

    /// Load a schema from a JSON string.
    pub fn load_str(&self, definition: &str) -> Result<Schema> {
        let value: Value = serde_json::from_str(definition)?;
        self.load_value(&value)
    }

    /// Load a schema from a JSON value.
    pub fn load_value(&self, value: &Value) -> Result<Schema> {
        self.load_definition(value)?.to_schema()
    }

    /// Parse and check a definition without building the schema.
    pub fn load_definition(&self, value: &Value) -> Result<SchemaDefinition> {
        if self.config.strict_mode {
            check_known_fields(value)?;
        }

        let definition = SchemaDefinition::deserialize(value)
            .map_err(|err| SchemaError::InvalidDefinition(err.to_string()))?;

        let count = definition.channels.len();
        if count > self.config.max_channels {
            return Err(SchemaError::TooManyChannels {
                count,
                max: self.config.max_channels,
            });
        }
        Ok(definition)
    }

    /// Load a schema from a definition file.
    pub fn load_file(&self, path: &Path) -> Result<Schema> {
        let content = read_definition_file(path, self.config.max_schema_file_size)?;
        let schema = self.load_str(&content)?;
        debug!(path = %path.display(), channels = schema.size(), "schema loaded");
        Ok(schema)
    }

    /// Get loader configuration.
    pub fn config(&self) -> &LoaderConfig {
        &self.config
    }
}

/// Read a definition file, refusing symlinks and anything over `max_bytes`.
pub(crate) fn read_definition_file(path: &Path, max_bytes: usize) -> Result<String> {
    let name = path.display();
    let path_metadata = std::fs::symlink_metadata(path)
        .map_err(|err| SchemaError::LoadFailed(format!("{name}: {err}")))?;
    if path_metadata.file_type().is_symlink() {
        warn!(path = %name, "refusing schema symlink");
        return Err(SchemaError::LoadFailed(format!(
            "refusing to load schema symlink: {name}"
        )));
    }
    if !path_metadata.is_file() {
        return Err(SchemaError::LoadFailed(format!("not a regular file: {name}")));
    }

    let file = File::open(path)
        .map_err(|err| SchemaError::LoadFailed(format!("failed opening schema {name}: {err}")))?;
    let opened_metadata = file
        .metadata()
        .map_err(|err| SchemaError::LoadFailed(err.to_string()))?;

    #[cfg(unix)]
    {
        if !same_file_identity(&path_metadata, &opened_metadata) {
            return Err(SchemaError::LoadFailed(format!(
                "schema file changed during load: {name}"
            )));
        }
    }

    if opened_metadata.len() > max_bytes as u64 {
        return Err(SchemaError::LoadFailed(format!(
            "schema file too large ({} bytes): {name}",
            opened_metadata.len()
        )));
    }

    let read_limit = u64::try_from(max_bytes.saturating_add(1)).unwrap_or(u64::MAX);
    let mut content = String::new();
    file.take(read_limit)
        .read_to_string(&mut content)
        .map_err(|err| SchemaError::LoadFailed(format!("failed reading schema {name}: {err}")))?;
    if content.len() > max_bytes {
        return Err(SchemaError::LoadFailed(format!(
            "schema file too large while reading: {name}"
        )));
    }
    Ok(content)
}

fn check_known_fields(value: &Value) -> Result<()> {
    let Value::Object(map) = value else {
        return Err(SchemaError::InvalidDefinition(
            "definition must be a JSON object".to_string(),
        ));
    };
    reject_unknown(map, DEFINITION_FIELDS, "definition")?;

    if let Some(Value::Array(channels)) = map.get("channels") {
        for (index, channel) in channels.iter().enumerate() {
            if let Value::Object(channel) = channel {
                reject_unknown(channel, CHANNEL_FIELDS, &format!("channels[{index}]"))?;
            }
        }
    }
    Ok(())
}

fn reject_unknown(map: &Map<String, Value>, allowed: &[&str], at: &str) -> Result<()> {
    match map.keys().find(|field| !allowed.contains(&field.as_str())) {
        Some(field) => Err(SchemaError::InvalidDefinition(format!(
            "{at}: unknown field {field:?}"
        ))),
        None => Ok(()),
    }
}

#[cfg(unix)]
fn same_file_identity(
    path_metadata: &std::fs::Metadata,
    opened_metadata: &std::fs::Metadata,
) -> bool {
    use std::os::unix::fs::MetadataExt;
    path_metadata.dev() == opened_metadata.dev() && path_metadata.ino() == opened_metadata.ino()
}

#[cfg(test)]
mod tests {
    use telemframe_codec::{CodecError, DataType};

    use super::*;
    use crate::catalog::tests::{make_temp_schema_dir, write_schema};

    const ENGINE: &str = r#"{
        "name": "engine",
        "channels": [
            { "key": 65537, "data_type": "float32" },
            { "key": 65538, "data_type": "timestamp" },
            { "key": 3, "data_type": "uint8" }
        ]
    }"#;

    #[test]
    fn load_keeps_declared_order() {
        let schema = SchemaLoader::new().load_str(ENGINE).unwrap();
        assert_eq!(schema.keys(), &[65537, 65538, 3]);
        assert_eq!(
            schema.data_types(),
            &[DataType::Float32, DataType::Timestamp, DataType::Uint8]
        );
    }

    #[test]
    fn name_is_optional_and_channels_may_be_empty() {
        let schema = SchemaLoader::new().load_str(r#"{"channels":[]}"#).unwrap();
        assert!(schema.is_empty());
        assert_eq!(schema.mask_len(), 0);
    }

    #[test]
    fn malformed_json_fails() {
        assert!(matches!(
            SchemaLoader::new().load_str("{"),
            Err(SchemaError::InvalidJson(_))
        ));
    }

    #[test]
    fn missing_channels_is_invalid_definition() {
        assert!(matches!(
            SchemaLoader::new().load_str(r#"{"name":"x"}"#),
            Err(SchemaError::InvalidDefinition(_))
        ));
    }

    #[test]
    fn duplicate_keys_surface_codec_error() {
        let src = r#"{"channels":[{"key":1,"data_type":"int8"},{"key":1,"data_type":"int16"}]}"#;
        assert!(matches!(
            SchemaLoader::new().load_str(src),
            Err(SchemaError::Codec(CodecError::Config(_)))
        ));
    }

    #[test]
    fn channel_limit_is_enforced() {
        let loader = SchemaLoader::with_config(LoaderConfig {
            max_channels: 2,
            ..LoaderConfig::default()
        });
        assert!(matches!(
            loader.load_str(ENGINE),
            Err(SchemaError::TooManyChannels { count: 3, max: 2 })
        ));
    }

    #[test]
    fn strict_mode_rejects_unknown_fields() {
        let top_level = r#"{"channels":[],"version":2}"#;
        let nested = r#"{"channels":[{"key":1,"data_type":"int8","unit":"rpm"}]}"#;

        let permissive = SchemaLoader::new();
        assert!(permissive.load_str(top_level).is_ok());
        assert!(permissive.load_str(nested).is_ok());

        let strict = SchemaLoader::with_config(LoaderConfig {
            strict_mode: true,
            ..LoaderConfig::default()
        });
        assert!(strict.load_str(ENGINE).is_ok());
        assert!(matches!(
            strict.load_str(top_level),
            Err(SchemaError::InvalidDefinition(_))
        ));
        match strict.load_str(nested) {
            Err(SchemaError::InvalidDefinition(message)) => {
                assert!(message.contains("channels[0]"), "{message}");
                assert!(message.contains("unit"), "{message}");
            }
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[test]
    fn strict_mode_requires_object() {
        let strict = SchemaLoader::with_config(LoaderConfig {
            strict_mode: true,
            ..LoaderConfig::default()
        });
        assert!(matches!(
            strict.load_str("[]"),
            Err(SchemaError::InvalidDefinition(_))
        ));
    }

    #[test]
    fn load_file_reads_definition() {
        let dir = make_temp_schema_dir("load-file");
        write_schema(&dir, "engine.schema.json", ENGINE);

        let schema = SchemaLoader::new()
            .load_file(&dir.join("engine.schema.json"))
            .unwrap();
        assert_eq!(schema.size(), 3);

        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn load_file_missing_fails() {
        let dir = make_temp_schema_dir("load-missing");
        assert!(matches!(
            SchemaLoader::new().load_file(&dir.join("absent.schema.json")),
            Err(SchemaError::LoadFailed(_))
        ));
        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn load_file_size_limit_is_enforced() {
        let dir = make_temp_schema_dir("load-size");
        write_schema(&dir, "engine.schema.json", ENGINE);

        let loader = SchemaLoader::with_config(LoaderConfig {
            max_schema_file_size: 8,
            ..LoaderConfig::default()
        });
        assert!(matches!(
            loader.load_file(&dir.join("engine.schema.json")),
            Err(SchemaError::LoadFailed(_))
        ));

        let _ = std::fs::remove_dir_all(&dir);
    }

    #[cfg(unix)]
    #[test]
    fn load_file_rejects_symlink() {
        let dir = make_temp_schema_dir("load-symlink");
        let target = dir.join("target.json");
        std::fs::write(&target, ENGINE).unwrap();
        let link = dir.join("engine.schema.json");
        std::os::unix::fs::symlink(&target, &link).unwrap();

        assert!(matches!(
            SchemaLoader::new().load_file(&link),
            Err(SchemaError::LoadFailed(_))
        ));

        let _ = std::fs::remove_dir_all(&dir);
    }

    #[cfg(unix)]
    #[test]
    fn same_file_identity_distinguishes_files() {
        let dir = make_temp_schema_dir("identity-check");
        let first = dir.join("first.json");
        let second = dir.join("second.json");
        std::fs::write(&first, ENGINE).unwrap();
        std::fs::write(&second, ENGINE).unwrap();

        let first_meta = std::fs::symlink_metadata(&first).unwrap();
        let opened_first = File::open(&first).unwrap().metadata().unwrap();
        let opened_second = File::open(&second).unwrap().metadata().unwrap();

        assert!(same_file_identity(&first_meta, &opened_first));
        assert!(!same_file_identity(&first_meta, &opened_second));

        let _ = std::fs::remove_dir_all(&dir);
    }
}
