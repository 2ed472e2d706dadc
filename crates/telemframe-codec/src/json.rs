//! Self-describing JSON representation of frames.
//!
//! Every series carries its key and data type, so no schema is needed to
//! read it back. This is the generic text fallback the binary codec is
//! measured against, and the human-readable format used by tooling.
//!
//! ```json
//! {"series":[{"key":1,"data_type":"float32","data":[1.0,2.0]}]}
//! ```

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::data_type::{ChannelKey, DataType, Sample, TimeStamp};
use crate::error::{CodecError, Result};
use crate::frame::Frame;
use crate::series::Series;

#[derive(Debug, Serialize, Deserialize)]
struct JsonFrame {
    series: Vec<JsonSeries>,
}

#[derive(Debug, Serialize, Deserialize)]
struct JsonSeries {
    key: ChannelKey,
    data_type: String,
    data: Vec<Value>,
}

/// Schema-free JSON frame codec.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonCodec;

impl JsonCodec {
    pub fn new() -> Self {
        Self
    }

    /// Encode a frame as compact JSON bytes.
    pub fn encode(&self, frame: &Frame) -> Result<Vec<u8>> {
        Ok(serde_json::to_vec(&encode_json_frame(frame)?)?)
    }

    /// Decode a frame from JSON bytes.
    pub fn decode(&self, src: &[u8]) -> Result<Frame> {
        let frame: JsonFrame = serde_json::from_slice(src)?;
        decode_json_frame(frame)
    }

    /// Convert a frame into a JSON value.
    pub fn encode_value(&self, frame: &Frame) -> Result<Value> {
        Ok(serde_json::to_value(encode_json_frame(frame)?)?)
    }

    /// Build a frame from a JSON value.
    pub fn decode_value(&self, value: Value) -> Result<Frame> {
        let frame: JsonFrame = serde_json::from_value(value)?;
        decode_json_frame(frame)
    }
}

fn encode_json_frame(frame: &Frame) -> Result<JsonFrame> {
    let series = frame
        .iter()
        .map(|(key, series)| {
            Ok(JsonSeries {
                key,
                data_type: series.data_type().to_string(),
                data: series_to_json(series)?,
            })
        })
        .collect::<Result<Vec<_>>>()?;
    Ok(JsonFrame { series })
}

fn decode_json_frame(frame: JsonFrame) -> Result<Frame> {
    let mut out = Frame::with_capacity(frame.series.len());
    for entry in frame.series {
        let data_type: DataType = entry.data_type.parse()?;
        let series = series_from_json(entry.key, data_type, &entry.data)?;
        out.insert(entry.key, series);
    }
    Ok(out)
}

fn series_to_json(series: &Series) -> Result<Vec<Value>> {
    fn map<T: Sample>(series: &Series, f: impl Fn(T) -> Value) -> Result<Vec<Value>> {
        Ok(series.values::<T>()?.into_iter().map(f).collect())
    }

    match series.data_type() {
        DataType::Float64 => map::<f64>(series, Value::from),
        DataType::Float32 => map::<f32>(series, Value::from),
        DataType::Int64 => map::<i64>(series, Value::from),
        DataType::Int32 => map::<i32>(series, Value::from),
        DataType::Int16 => map::<i16>(series, Value::from),
        DataType::Int8 => map::<i8>(series, Value::from),
        DataType::Uint64 => map::<u64>(series, Value::from),
        DataType::Uint32 => map::<u32>(series, Value::from),
        DataType::Uint16 => map::<u16>(series, Value::from),
        DataType::Uint8 => map::<u8>(series, Value::from),
        DataType::Timestamp => map::<TimeStamp>(series, |ts| Value::from(ts.nanos())),
        DataType::Uuid => map::<[u8; 16]>(series, |id| Value::String(format_uuid(&id))),
    }
}

fn series_from_json(key: ChannelKey, data_type: DataType, data: &[Value]) -> Result<Series> {
    fn collect<T: Sample>(
        key: ChannelKey,
        data_type: DataType,
        data: &[Value],
        f: impl Fn(&Value) -> Option<T>,
    ) -> Result<Series> {
        let values = data
            .iter()
            .map(|v| {
                f(v).ok_or_else(|| CodecError::InvalidValue {
                    key,
                    data_type,
                    value: v.to_string(),
                })
            })
            .collect::<Result<Vec<T>>>()?;
        Ok(Series::from_values(&values))
    }

    let dt = data_type;
    match data_type {
        DataType::Float64 => collect(key, dt, data, as_float),
        DataType::Float32 => collect(key, dt, data, as_f32),
        DataType::Int64 => collect(key, dt, data, Value::as_i64),
        DataType::Int32 => collect(key, dt, data, int::<i32>),
        DataType::Int16 => collect(key, dt, data, int::<i16>),
        DataType::Int8 => collect(key, dt, data, int::<i8>),
        DataType::Uint64 => collect(key, dt, data, Value::as_u64),
        DataType::Uint32 => collect(key, dt, data, uint::<u32>),
        DataType::Uint16 => collect(key, dt, data, uint::<u16>),
        DataType::Uint8 => collect(key, dt, data, uint::<u8>),
        DataType::Timestamp => collect(key, dt, data, |v| v.as_i64().map(TimeStamp::from_nanos)),
        DataType::Uuid => collect(key, dt, data, |v| v.as_str().and_then(parse_uuid)),
    }
}

// JSON has no NaN or infinity; serde_json writes them as null.
fn as_float(v: &Value) -> Option<f64> {
    if v.is_null() {
        Some(f64::NAN)
    } else {
        v.as_f64()
    }
}

// A finite value that only fits f64 must not silently become infinity.
fn as_f32(v: &Value) -> Option<f32> {
    let wide = as_float(v)?;
    let narrow = wide as f32;
    (narrow.is_finite() || !wide.is_finite()).then_some(narrow)
}

fn int<T: TryFrom<i64>>(v: &Value) -> Option<T> {
    v.as_i64().and_then(|n| T::try_from(n).ok())
}

fn uint<T: TryFrom<u64>>(v: &Value) -> Option<T> {
    v.as_u64().and_then(|n| T::try_from(n).ok())
}

fn format_uuid(id: &[u8; 16]) -> String {
    let hex: String = id.iter().map(|b| format!("{b:02x}")).collect();
    format!(
        "{}-{}-{}-{}-{}",
        &hex[0..8],
        &hex[8..12],
        &hex[12..16],
        &hex[16..20],
        &hex[20..32]
    )
}

fn parse_uuid(s: &str) -> Option<[u8; 16]> {
    const GROUPS: [usize; 5] = [8, 4, 4, 4, 12];

    let mut hex = Vec::with_capacity(32);
    let mut groups = s.split('-');
    for len in GROUPS {
        let group = groups.next()?;
        if group.len() != len || !group.bytes().all(|b| b.is_ascii_hexdigit()) {
            return None;
        }
        hex.extend_from_slice(group.as_bytes());
    }
    if groups.next().is_some() {
        return None;
    }

    let mut out = [0u8; 16];
    for (i, pair) in hex.chunks_exact(2).enumerate() {
        out[i] = (hex_digit(pair[0])? << 4) | hex_digit(pair[1])?;
    }
    Some(out)
}

fn hex_digit(b: u8) -> Option<u8> {
    (b as char).to_digit(16).map(|d| d as u8)
}
