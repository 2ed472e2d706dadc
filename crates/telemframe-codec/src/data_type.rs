//! Channel keys, sample data types, and typed sample conversion.

use std::fmt;
use std::str::FromStr;
use std::time::{SystemTime, UNIX_EPOCH};

use bytes::BufMut;

use crate::error::CodecError;

/// Stable identifier of a telemetry channel.
pub type ChannelKey = u32;

/// Closed set of fixed-width sample types a channel can carry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DataType {
    Float64,
    Float32,
    Int64,
    Int32,
    Int16,
    Int8,
    Uint64,
    Uint32,
    Uint16,
    Uint8,
    /// Nanoseconds since the Unix epoch, stored as `i64`.
    Timestamp,
    /// 128-bit identifier, stored as 16 raw bytes.
    Uuid,
}

impl DataType {
    /// Every supported data type.
    pub const ALL: [DataType; 12] = [
        DataType::Float64,
        DataType::Float32,
        DataType::Int64,
        DataType::Int32,
        DataType::Int16,
        DataType::Int8,
        DataType::Uint64,
        DataType::Uint32,
        DataType::Uint16,
        DataType::Uint8,
        DataType::Timestamp,
        DataType::Uuid,
    ];

    /// Size in bytes of one sample of this type.
    pub const fn byte_width(self) -> usize {
        match self {
            DataType::Int8 | DataType::Uint8 => 1,
            DataType::Int16 | DataType::Uint16 => 2,
            DataType::Float32 | DataType::Int32 | DataType::Uint32 => 4,
            DataType::Float64 | DataType::Int64 | DataType::Uint64 | DataType::Timestamp => 8,
            DataType::Uuid => 16,
        }
    }

    /// Lowercase wire name, e.g. `float32`.
    pub const fn as_str(self) -> &'static str {
        match self {
            DataType::Float64 => "float64",
            DataType::Float32 => "float32",
            DataType::Int64 => "int64",
            DataType::Int32 => "int32",
            DataType::Int16 => "int16",
            DataType::Int8 => "int8",
            DataType::Uint64 => "uint64",
            DataType::Uint32 => "uint32",
            DataType::Uint16 => "uint16",
            DataType::Uint8 => "uint8",
            DataType::Timestamp => "timestamp",
            DataType::Uuid => "uuid",
        }
    }
}

impl fmt::Display for DataType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DataType {
    type Err = CodecError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        DataType::ALL
            .into_iter()
            .find(|dt| dt.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| CodecError::Config(format!("unknown data type: {s}")))
    }
}

/// Nanosecond-precision point in time relative to the Unix epoch.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TimeStamp(pub i64);

impl TimeStamp {
    pub const fn from_nanos(nanos: i64) -> Self {
        Self(nanos)
    }

    pub const fn nanos(self) -> i64 {
        self.0
    }

    /// Current wall-clock time. Clocks before the epoch read as zero.
    pub fn now() -> Self {
        let nanos = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| i64::try_from(d.as_nanos()).unwrap_or(i64::MAX))
            .unwrap_or(0);
        Self(nanos)
    }
}

mod sealed {
    pub trait Sealed {}
}

/// A Rust value that can be stored as one sample of a [`DataType`].
///
/// Implemented for the primitive numeric types, [`TimeStamp`], and
/// `[u8; 16]` (UUIDs). Samples are always little-endian on the wire.
pub trait Sample: sealed::Sealed + Copy {
    /// The data type this Rust type maps to.
    const DATA_TYPE: DataType;

    /// Append the little-endian encoding of `self`.
    fn write_le<B: BufMut>(self, dst: &mut B);

    /// Decode one sample from exactly `DATA_TYPE.byte_width()` bytes.
    fn read_le(src: &[u8]) -> Self;
}

macro_rules! impl_numeric_sample {
    ($($ty:ty => $dt:ident),* $(,)?) => {
        $(
            impl sealed::Sealed for $ty {}

            impl Sample for $ty {
                const DATA_TYPE: DataType = DataType::$dt;

                fn write_le<B: BufMut>(self, dst: &mut B) {
                    dst.put_slice(&self.to_le_bytes());
                }

                fn read_le(src: &[u8]) -> Self {
                    let mut raw = [0u8; std::mem::size_of::<$ty>()];
                    raw.copy_from_slice(&src[..std::mem::size_of::<$ty>()]);
                    <$ty>::from_le_bytes(raw)
                }
            }
        )*
    };
}

impl_numeric_sample! {
    f64 => Float64,
    f32 => Float32,
    i64 => Int64,
    i32 => Int32,
    i16 => Int16,
    i8 => Int8,
    u64 => Uint64,
    u32 => Uint32,
    u16 => Uint16,
    u8 => Uint8,
}

impl sealed::Sealed for TimeStamp {}

impl Sample for TimeStamp {
    const DATA_TYPE: DataType = DataType::Timestamp;

    fn write_le<B: BufMut>(self, dst: &mut B) {
        dst.put_i64_le(self.0);
    }

    fn read_le(src: &[u8]) -> Self {
        Self(i64::read_le(src))
    }
}

impl sealed::Sealed for [u8; 16] {}

impl Sample for [u8; 16] {
    const DATA_TYPE: DataType = DataType::Uuid;

    fn write_le<B: BufMut>(self, dst: &mut B) {
        dst.put_slice(&self);
    }

    fn read_le(src: &[u8]) -> Self {
        let mut raw = [0u8; 16];
        raw.copy_from_slice(&src[..16]);
        raw
    }
}
