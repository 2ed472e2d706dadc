use crate::data_type::{ChannelKey, DataType};

/// Errors that can occur while building schemas or encoding/decoding frames.
#[derive(Debug, thiserror::Error)]
pub enum CodecError {
    /// The schema could not be constructed (length mismatch, duplicate keys,
    /// unknown data type name).
    #[error("invalid schema: {0}")]
    Config(String),

    /// A frame referenced a channel key that is not part of the schema.
    #[error("channel {0} is not part of the schema")]
    UnknownChannel(ChannelKey),

    /// The input ended before the mask, a sample count, or a channel payload
    /// was complete.
    #[error("truncated frame ({needed} bytes needed, {available} available)")]
    Truncated { needed: usize, available: usize },

    /// Bytes were left over after the last expected channel block.
    #[error("{0} trailing bytes after last channel block")]
    TrailingBytes(usize),

    /// The presence mask has bits set beyond the schema size.
    #[error("presence mask sets bits beyond schema size {size}")]
    InvalidMask { size: usize },

    /// A series carries a different data type than the schema declares.
    #[error("channel {key}: series data type {actual} does not match schema data type {expected}")]
    DataTypeMismatch {
        key: ChannelKey,
        expected: DataType,
        actual: DataType,
    },

    /// A series byte buffer is not a whole number of samples.
    #[error("series of {len} bytes is not a multiple of {width}-byte samples")]
    MisalignedSeries { len: usize, width: usize },

    /// A series has more samples than the 4-byte count field can carry.
    #[error("channel {key}: {samples} samples exceed the u32 sample count field")]
    SeriesTooLarge { key: ChannelKey, samples: usize },

    /// An enveloped message exceeds the configured maximum size.
    #[error("message too large ({size} bytes, max {max})")]
    PayloadTooLarge { size: usize, max: usize },

    /// An I/O error occurred while reading or writing messages.
    #[error("message I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The stream was closed before a complete message was received.
    #[error("connection closed (incomplete message)")]
    ConnectionClosed,

    /// The JSON text representation was malformed.
    #[cfg(feature = "json")]
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    /// A JSON value did not fit the channel's data type.
    #[cfg(feature = "json")]
    #[error("channel {key}: invalid {data_type} value: {value}")]
    InvalidValue {
        key: ChannelKey,
        data_type: DataType,
        value: String,
    },
}

impl CodecError {
    pub(crate) fn truncated(needed: usize, available: usize) -> Self {
        Self::Truncated { needed, available }
    }
}

pub type Result<T> = std::result::Result<T, CodecError>;
