use std::io::IsTerminal;

use clap::ValueEnum;
use comfy_table::{presets::UTF8_FULL, ContentArrangement, Table};
use serde::Serialize;
use serde_json::Value;
use telemframe_codec::{ChannelKey, Frame, JsonCodec, Schema};
use telemframe_schema::SchemaCatalog;

use crate::exit::{codec_error, CliError, CliResult, INTERNAL};

const PREVIEW_SAMPLES: usize = 8;

#[derive(Clone, Debug, Copy, ValueEnum)]
pub enum OutputFormat {
    Json,
    Table,
    Pretty,
}

impl OutputFormat {
    pub fn default_for_stdout() -> Self {
        if std::io::stdout().is_terminal() {
            Self::Table
        } else {
            Self::Json
        }
    }
}

#[derive(Serialize)]
struct SchemaOutput<'a> {
    schema_id: &'a str,
    source: &'a str,
    size: usize,
    mask_len: usize,
    channels: Vec<ChannelOutput>,
}

#[derive(Serialize)]
struct ChannelOutput {
    index: usize,
    key: ChannelKey,
    data_type: &'static str,
    byte_width: usize,
}

#[derive(Serialize)]
struct CatalogOutput<'a> {
    schema_id: &'a str,
    source: &'a str,
    schemas: Vec<CatalogEntry<'a>>,
}

#[derive(Serialize)]
struct CatalogEntry<'a> {
    name: &'a str,
    size: usize,
    mask_len: usize,
}

pub fn print_schema(source: &str, schema: &Schema, format: OutputFormat) -> CliResult<()> {
    match format {
        OutputFormat::Json => {
            let out = SchemaOutput {
                schema_id: "https://schemas.3leaps.dev/telemframe/cli/v1/schema-info.schema.json",
                source,
                size: schema.size(),
                mask_len: schema.mask_len(),
                channels: schema
                    .iter()
                    .map(|(index, key, data_type)| ChannelOutput {
                        index,
                        key,
                        data_type: data_type.as_str(),
                        byte_width: data_type.byte_width(),
                    })
                    .collect(),
            };
            print_json(&out)
        }
        OutputFormat::Table => {
            let mut table = Table::new();
            table
                .load_preset(UTF8_FULL)
                .set_content_arrangement(ContentArrangement::Dynamic)
                .set_header(vec!["INDEX", "KEY", "TYPE", "WIDTH"]);
            for (index, key, data_type) in schema.iter() {
                table.add_row(vec![
                    index.to_string(),
                    key.to_string(),
                    data_type.to_string(),
                    data_type.byte_width().to_string(),
                ]);
            }
            println!("{table}");
            println!(
                "{} channels, {}-byte presence mask",
                schema.size(),
                schema.mask_len()
            );
            Ok(())
        }
        OutputFormat::Pretty => {
            println!(
                "schema {source}: {} channels, mask {} bytes",
                schema.size(),
                schema.mask_len()
            );
            for (index, key, data_type) in schema.iter() {
                println!(
                    "  [{index}] key={key} type={data_type} width={}",
                    data_type.byte_width()
                );
            }
            Ok(())
        }
    }
}

pub fn print_catalog(source: &str, catalog: &SchemaCatalog, format: OutputFormat) -> CliResult<()> {
    let entries: Vec<CatalogEntry<'_>> = catalog
        .names()
        .into_iter()
        .filter_map(|name| {
            catalog.get(name).map(|schema| CatalogEntry {
                name,
                size: schema.size(),
                mask_len: schema.mask_len(),
            })
        })
        .collect();

    match format {
        OutputFormat::Json => print_json(&CatalogOutput {
            schema_id: "https://schemas.3leaps.dev/telemframe/cli/v1/schema-catalog.schema.json",
            source,
            schemas: entries,
        }),
        OutputFormat::Table => {
            let mut table = Table::new();
            table
                .load_preset(UTF8_FULL)
                .set_content_arrangement(ContentArrangement::Dynamic)
                .set_header(vec!["NAME", "CHANNELS", "MASK BYTES"]);
            for entry in &entries {
                table.add_row(vec![
                    entry.name.to_string(),
                    entry.size.to_string(),
                    entry.mask_len.to_string(),
                ]);
            }
            println!("{table}");
            Ok(())
        }
        OutputFormat::Pretty => {
            println!("catalog {source}: {} schemas", entries.len());
            for entry in &entries {
                println!(
                    "  {} channels={} mask={}",
                    entry.name, entry.size, entry.mask_len
                );
            }
            Ok(())
        }
    }
}

/// Print one decoded frame. JSON output is the text codec form, one frame
/// per line, so it can be fed back into `encode`.
pub fn print_frame(index: usize, frame: &Frame, format: OutputFormat) -> CliResult<()> {
    let codec = JsonCodec::new();
    match format {
        OutputFormat::Json => {
            let bytes = codec
                .encode(frame)
                .map_err(|err| codec_error(&format!("frame {index}"), err))?;
            println!("{}", String::from_utf8_lossy(&bytes));
            Ok(())
        }
        OutputFormat::Table => {
            let value = codec
                .encode_value(frame)
                .map_err(|err| codec_error(&format!("frame {index}"), err))?;
            let mut table = Table::new();
            table
                .load_preset(UTF8_FULL)
                .set_content_arrangement(ContentArrangement::Dynamic)
                .set_header(vec!["FRAME", "KEY", "TYPE", "SAMPLES", "DATA"]);
            for ((key, series), json) in frame.iter().zip(series_data(&value)) {
                table.add_row(vec![
                    index.to_string(),
                    key.to_string(),
                    series.data_type().to_string(),
                    series.sample_count().to_string(),
                    preview(json),
                ]);
            }
            println!("{table}");
            Ok(())
        }
        OutputFormat::Pretty => {
            let value = codec
                .encode_value(frame)
                .map_err(|err| codec_error(&format!("frame {index}"), err))?;
            println!("frame {index}: {} series", frame.len());
            for ((key, series), json) in frame.iter().zip(series_data(&value)) {
                println!(
                    "  key={key} type={} samples={} data={}",
                    series.data_type(),
                    series.sample_count(),
                    preview(json)
                );
            }
            Ok(())
        }
    }
}

pub fn print_json<T: Serialize>(value: &T) -> CliResult<()> {
    let text = serde_json::to_string(value)
        .map_err(|err| CliError::new(INTERNAL, format!("failed to serialize output: {err}")))?;
    println!("{text}");
    Ok(())
}

fn series_data(value: &Value) -> impl Iterator<Item = &[Value]> {
    value["series"]
        .as_array()
        .into_iter()
        .flatten()
        .map(|series| series["data"].as_array().map(Vec::as_slice).unwrap_or(&[]))
}

fn preview(data: &[Value]) -> String {
    let shown: Vec<String> = data
        .iter()
        .take(PREVIEW_SAMPLES)
        .map(Value::to_string)
        .collect();
    if data.len() > PREVIEW_SAMPLES {
        format!(
            "[{}, ... +{} more]",
            shown.join(", "),
            data.len() - PREVIEW_SAMPLES
        )
    } else {
        format!("[{}]", shown.join(", "))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn preview_truncates_long_series() {
        let data: Vec<Value> = (0..10).map(Value::from).collect();
        assert_eq!(preview(&data), "[0, 1, 2, 3, 4, 5, 6, 7, ... +2 more]");
        assert_eq!(preview(&data[..2]), "[0, 1]");
        assert_eq!(preview(&[]), "[]");
    }

    #[test]
    fn series_data_follows_frame_order() {
        let value = serde_json::json!({
            "series": [
                {"key": 1, "data_type": "int8", "data": [1, 2]},
                {"key": 2, "data_type": "int8", "data": []}
            ]
        });
        let data: Vec<&[Value]> = series_data(&value).collect();
        assert_eq!(data.len(), 2);
        assert_eq!(data[0].len(), 2);
        assert!(data[1].is_empty());
    }
}
