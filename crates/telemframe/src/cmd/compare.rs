use std::time::{Duration, Instant};

use serde::Serialize;
use telemframe_codec::{Codec, CodecError, Frame, JsonCodec, Schema, Series};
use tracing::debug;

use crate::cmd::CompareArgs;
use crate::exit::{codec_error, CliResult, SUCCESS};
use crate::output::{print_json, OutputFormat};

#[derive(Debug, Serialize)]
pub struct Comparison {
    schema_id: &'static str,
    channels: usize,
    samples_per_channel: usize,
    payload_bytes: usize,
    iterations: u32,
    binary: CodecReport,
    json: CodecReport,
}

#[derive(Debug, Serialize)]
pub struct CodecReport {
    encoded_bytes: usize,
    encode_ns: u128,
    decode_ns: u128,
}

pub fn run(args: CompareArgs, format: OutputFormat) -> CliResult<i32> {
    let schema = args.source.load()?;
    let frame = synthetic_frame(&schema, args.samples)
        .map_err(|err| codec_error("building synthetic frame", err))?;
    let codec = Codec::new(schema);
    let json = JsonCodec::new();

    let binary = measure(args.iterations, || codec.encode(&frame), |bytes| {
        codec.decode(bytes).map(drop)
    })
    .map_err(|err| codec_error("binary codec", err))?;
    let text = measure(args.iterations, || json.encode(&frame), |bytes| {
        json.decode(bytes).map(drop)
    })
    .map_err(|err| codec_error("json codec", err))?;

    let report = Comparison {
        schema_id: "https://schemas.3leaps.dev/telemframe/cli/v1/codec-comparison.schema.json",
        channels: frame.len(),
        samples_per_channel: args.samples,
        payload_bytes: frame.data_len(),
        iterations: args.iterations,
        binary,
        json: text,
    };
    print_comparison(&report, format)?;
    Ok(SUCCESS)
}

/// A frame with every schema channel present, filled with a byte pattern.
fn synthetic_frame(schema: &Schema, samples: usize) -> telemframe_codec::Result<Frame> {
    schema
        .iter()
        .map(|(index, key, data_type)| {
            let len = samples.checked_mul(data_type.byte_width()).ok_or_else(|| {
                CodecError::Config(format!("{samples} {data_type} samples overflow a series"))
            })?;
            let data: Vec<u8> = (0..len)
                .map(|i| (i.wrapping_mul(31).wrapping_add(index)) as u8)
                .collect();
            Series::new(data_type, data).map(|series| (key, series))
        })
        .collect()
}

fn measure<B, E, D>(
    iterations: u32,
    mut encode: E,
    mut decode: D,
) -> telemframe_codec::Result<CodecReport>
where
    B: AsRef<[u8]>,
    E: FnMut() -> telemframe_codec::Result<B>,
    D: FnMut(&[u8]) -> telemframe_codec::Result<()>,
{
    let encoded = encode()?;
    let encoded_bytes = encoded.as_ref().len();

    let start = Instant::now();
    for _ in 0..iterations {
        encode()?;
    }
    let encode_elapsed = start.elapsed();

    let start = Instant::now();
    for _ in 0..iterations {
        decode(encoded.as_ref())?;
    }
    let decode_elapsed = start.elapsed();

    debug!(
        encoded_bytes,
        ?encode_elapsed,
        ?decode_elapsed,
        "codec measured"
    );
    Ok(CodecReport {
        encoded_bytes,
        encode_ns: per_iteration(encode_elapsed, iterations),
        decode_ns: per_iteration(decode_elapsed, iterations),
    })
}

fn per_iteration(elapsed: Duration, iterations: u32) -> u128 {
    elapsed.as_nanos() / u128::from(iterations.max(1))
}

fn print_comparison(report: &Comparison, format: OutputFormat) -> CliResult<()> {
    match format {
        OutputFormat::Json => print_json(report),
        OutputFormat::Table => {
            let mut table = comfy_table::Table::new();
            table
                .load_preset(comfy_table::presets::UTF8_FULL)
                .set_header(vec!["CODEC", "BYTES", "ENCODE NS", "DECODE NS"]);
            for (name, codec) in [("binary", &report.binary), ("json", &report.json)] {
                table.add_row(vec![
                    name.to_string(),
                    codec.encoded_bytes.to_string(),
                    codec.encode_ns.to_string(),
                    codec.decode_ns.to_string(),
                ]);
            }
            println!("{table}");
            println!(
                "{} channels x {} samples, {} payload bytes, {} iterations",
                report.channels, report.samples_per_channel, report.payload_bytes, report.iterations
            );
            Ok(())
        }
        OutputFormat::Pretty => {
            println!(
                "{} channels x {} samples ({} payload bytes)",
                report.channels, report.samples_per_channel, report.payload_bytes
            );
            for (name, codec) in [("binary", &report.binary), ("json", &report.json)] {
                println!(
                    "  {name:<6} {} bytes, encode {} ns, decode {} ns",
                    codec.encoded_bytes, codec.encode_ns, codec.decode_ns
                );
            }
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use telemframe_codec::DataType;

    use super::*;

    #[test]
    fn synthetic_frame_fills_every_channel() {
        let schema = Schema::from_pairs([(1, DataType::Float64), (9, DataType::Uuid)]).unwrap();
        let frame = synthetic_frame(&schema, 3).unwrap();

        assert_eq!(frame.keys().collect::<Vec<_>>(), vec![1, 9]);
        assert_eq!(frame.get(1).unwrap().sample_count(), 3);
        assert_eq!(frame.get(9).unwrap().byte_len(), 48);
    }

    #[test]
    fn oversized_sample_count_is_usage_error() {
        let schema = Schema::from_pairs([(2, DataType::Float64)]).unwrap();
        let err = synthetic_frame(&schema, usize::MAX / 2).unwrap_err();
        assert!(matches!(err, CodecError::Config(_)), "{err}");
        assert_eq!(codec_error("building synthetic frame", err).code, crate::exit::USAGE);
    }

    #[test]
    fn binary_is_smaller_than_json() {
        let schema = Schema::from_pairs((0..20).map(|k| (k, DataType::Float32))).unwrap();
        let frame = synthetic_frame(&schema, 50).unwrap();
        let codec = Codec::new(schema);

        let binary = measure(1, || codec.encode(&frame), |b| codec.decode(b).map(drop)).unwrap();
        let json = measure(
            1,
            || JsonCodec.encode(&frame),
            |b| JsonCodec.decode(b).map(drop),
        )
        .unwrap();
        assert_eq!(binary.encoded_bytes, 3 + 20 * (4 + 50 * 4));
        assert!(binary.encoded_bytes < json.encoded_bytes);
    }
}
