use std::sync::Arc;

use bytes::{Buf, BufMut, Bytes, BytesMut};
use tracing::{debug, trace};

use crate::config::CodecConfig;
use crate::data_type::{ChannelKey, DataType};
use crate::error::{CodecError, Result};
use crate::frame::Frame;
use crate::mask::PresenceMask;
use crate::schema::Schema;
use crate::series::Series;

/// Size of the per-channel sample count field.
pub const COUNT_SIZE: usize = 4;

/// Size of the envelope length prefix.
pub const LENGTH_PREFIX_SIZE: usize = 4;

/// Encodes and decodes frames against one fixed [`Schema`].
///
/// Wire format:
/// ```text
/// ┌────────────────────┬──────────────┬──────────────────────┬─────
/// │ Presence mask      │ Count (4B LE)│ Samples              │ ...
/// │ ceil(N/8) bytes    │ channel i    │ count * width(i) B   │ next set bit
/// └────────────────────┴──────────────┴──────────────────────┴─────
/// ```
///
/// A codec holds no mutable state. Clones share the schema and may be used
/// from any number of threads at once.
#[derive(Debug, Clone)]
pub struct Codec {
    schema: Arc<Schema>,
    config: CodecConfig,
}

struct EncodePlan<'a> {
    mask: PresenceMask,
    blocks: Vec<(usize, &'a Series)>,
    len: usize,
}

impl Codec {
    /// Create a codec with default configuration.
    pub fn new(schema: impl Into<Arc<Schema>>) -> Self {
        Self::with_config(schema, CodecConfig::default())
    }

    /// Create a codec with explicit configuration.
    pub fn with_config(schema: impl Into<Arc<Schema>>, config: CodecConfig) -> Self {
        let schema = schema.into();
        debug!(
            channels = schema.size(),
            mask_len = schema.mask_len(),
            strict = config.strict_decode,
            "codec bound to schema"
        );
        Self { schema, config }
    }

    /// Create a codec straight from parallel key and data type lists.
    pub fn from_parts(keys: Vec<ChannelKey>, data_types: Vec<DataType>) -> Result<Self> {
        Ok(Self::new(Schema::new(keys, data_types)?))
    }

    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    pub fn config(&self) -> &CodecConfig {
        &self.config
    }

    /// Exact number of bytes [`Codec::encode`] would produce for `frame`.
    pub fn encoded_len(&self, frame: &Frame) -> Result<usize> {
        Ok(self.plan(frame)?.len)
    }

    /// Encode a frame into a new buffer.
    pub fn encode(&self, frame: &Frame) -> Result<Bytes> {
        let mut dst = BytesMut::new();
        self.encode_into(frame, &mut dst)?;
        Ok(dst.freeze())
    }

    /// Append the encoding of `frame` to `dst`.
    ///
    /// Every channel is validated before the first byte is written, so `dst`
    /// is unchanged on error.
    pub fn encode_into(&self, frame: &Frame, dst: &mut BytesMut) -> Result<()> {
        let plan = self.plan(frame)?;

        dst.reserve(plan.len);
        dst.put_slice(plan.mask.as_bytes());
        for (_, series) in &plan.blocks {
            dst.put_u32_le(series.sample_count() as u32);
            dst.put_slice(series.as_bytes());
        }

        trace!(channels = plan.blocks.len(), bytes = plan.len, "encoded frame");
        Ok(())
    }

    fn plan<'a>(&self, frame: &'a Frame) -> Result<EncodePlan<'a>> {
        let mut mask = PresenceMask::new(self.schema.size());
        let mut blocks = Vec::with_capacity(frame.len());
        let mut len = self.schema.mask_len();

        for (key, series) in frame.iter() {
            let index = self.schema.index_of(key)?;
            let expected = self.schema.data_types()[index];
            if series.data_type() != expected {
                return Err(CodecError::DataTypeMismatch {
                    key,
                    expected,
                    actual: series.data_type(),
                });
            }
            let samples = series.sample_count();
            if u32::try_from(samples).is_err() {
                return Err(CodecError::SeriesTooLarge { key, samples });
            }
            mask.set(index);
            blocks.push((index, series));
            len += COUNT_SIZE + series.byte_len();
        }

        blocks.sort_unstable_by_key(|(index, _)| *index);
        Ok(EncodePlan { mask, blocks, len })
    }

    /// Decode a frame from a byte slice. The sample data is copied.
    pub fn decode(&self, src: &[u8]) -> Result<Frame> {
        self.decode_bytes(Bytes::copy_from_slice(src))
    }

    /// Decode a frame, slicing series data out of `src` without copying.
    ///
    /// Channels come back in ascending schema order. Nothing is returned
    /// unless the whole buffer decodes.
    pub fn decode_bytes(&self, mut src: Bytes) -> Result<Frame> {
        let size = self.schema.size();
        let mask_len = self.schema.mask_len();
        let mask = PresenceMask::from_bytes(&src, size)
            .ok_or_else(|| CodecError::truncated(mask_len, src.len()))?;
        if self.config.strict_decode && mask.has_padding_bits() {
            return Err(CodecError::InvalidMask { size });
        }
        src.advance(mask_len);

        let mut frame = Frame::with_capacity(mask.count());
        for index in mask.iter() {
            if src.len() < COUNT_SIZE {
                return Err(CodecError::truncated(COUNT_SIZE, src.len()));
            }
            let samples = src.get_u32_le() as usize;
            let data_type = self.schema.data_types()[index];
            let byte_len = samples
                .checked_mul(data_type.byte_width())
                .ok_or_else(|| CodecError::truncated(usize::MAX, src.len()))?;
            if src.len() < byte_len {
                return Err(CodecError::truncated(byte_len, src.len()));
            }
            let series = Series::new(data_type, src.split_to(byte_len))?;
            frame.push_unchecked(self.schema.keys()[index], series);
        }

        if self.config.strict_decode && !src.is_empty() {
            return Err(CodecError::TrailingBytes(src.len()));
        }

        trace!(channels = frame.len(), "decoded frame");
        Ok(frame)
    }
}

/// Wrap an encoded frame in a 4-byte little-endian length prefix.
///
/// The codec itself does not delimit messages; this envelope is for byte
/// streams (files, pipes) that carry several frames back to back.
pub fn encode_message(payload: &[u8], dst: &mut BytesMut) -> Result<()> {
    if payload.len() > u32::MAX as usize {
        return Err(CodecError::PayloadTooLarge {
            size: payload.len(),
            max: u32::MAX as usize,
        });
    }
    dst.reserve(LENGTH_PREFIX_SIZE + payload.len());
    dst.put_u32_le(payload.len() as u32);
    dst.put_slice(payload);
    Ok(())
}

/// Split one enveloped message off the front of `src`.
///
/// Returns `Ok(None)` if `src` does not hold a complete message yet.
pub fn decode_message(src: &mut BytesMut, max_message_size: usize) -> Result<Option<Bytes>> {
    if src.len() < LENGTH_PREFIX_SIZE {
        return Ok(None); // Need more data
    }

    let mut prefix = [0u8; LENGTH_PREFIX_SIZE];
    prefix.copy_from_slice(&src[..LENGTH_PREFIX_SIZE]);
    let len = u32::from_le_bytes(prefix) as usize;

    if len > max_message_size {
        return Err(CodecError::PayloadTooLarge {
            size: len,
            max: max_message_size,
        });
    }

    if src.len() < LENGTH_PREFIX_SIZE + len {
        return Ok(None); // Need more data
    }

    src.advance(LENGTH_PREFIX_SIZE);
    Ok(Some(src.split_to(len).freeze()))
}
