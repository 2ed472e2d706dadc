use serde::{Deserialize, Serialize};
use telemframe_codec::{ChannelKey, DataType, Schema};

use crate::error::{Result, SchemaError};

/// Fields accepted at the top level of a definition in strict mode.
pub(crate) const DEFINITION_FIELDS: &[&str] = &["name", "channels"];
/// Fields accepted on each channel entry in strict mode.
pub(crate) const CHANNEL_FIELDS: &[&str] = &["key", "data_type"];

/// On-disk form of a schema.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SchemaDefinition {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    pub channels: Vec<ChannelDefinition>,
}

/// One channel of a definition, in wire order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChannelDefinition {
    pub key: ChannelKey,
    pub data_type: String,
}

impl SchemaDefinition {
    /// Describe an existing schema.
    pub fn from_schema(name: Option<String>, schema: &Schema) -> Self {
        let channels = schema
            .iter()
            .map(|(_, key, data_type)| ChannelDefinition {
                key,
                data_type: data_type.to_string(),
            })
            .collect();
        Self { name, channels }
    }

    /// Build the schema this definition describes.
    pub fn to_schema(&self) -> Result<Schema> {
        let mut keys = Vec::with_capacity(self.channels.len());
        let mut data_types = Vec::with_capacity(self.channels.len());
        for (index, channel) in self.channels.iter().enumerate() {
            let data_type: DataType = channel.data_type.parse().map_err(|_| {
                SchemaError::InvalidDefinition(format!(
                    "channels[{index}]: unknown data type {:?}",
                    channel.data_type
                ))
            })?;
            keys.push(channel.key);
            data_types.push(data_type);
        }
        Ok(Schema::new(keys, data_types)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn definition_roundtrips_through_schema() {
        let schema = Schema::from_pairs([(7, DataType::Timestamp), (3, DataType::Uuid)]).unwrap();
        let definition = SchemaDefinition::from_schema(Some("gps".into()), &schema);

        assert_eq!(definition.channels[0].data_type, "timestamp");
        assert_eq!(definition.to_schema().unwrap(), schema);
    }

    #[test]
    fn unnamed_definition_omits_name() {
        let schema = Schema::from_pairs([(1, DataType::Int8)]).unwrap();
        let json = serde_json::to_string(&SchemaDefinition::from_schema(None, &schema)).unwrap();
        assert_eq!(json, r#"{"channels":[{"key":1,"data_type":"int8"}]}"#);
    }

    #[test]
    fn unknown_type_names_channel_index() {
        let definition = SchemaDefinition {
            name: None,
            channels: vec![
                ChannelDefinition {
                    key: 1,
                    data_type: "float32".into(),
                },
                ChannelDefinition {
                    key: 2,
                    data_type: "string".into(),
                },
            ],
        };
        match definition.to_schema() {
            Err(SchemaError::InvalidDefinition(message)) => {
                assert!(message.starts_with("channels[1]"), "{message}")
            }
            other => panic!("unexpected result: {other:?}"),
        }
    }
}
