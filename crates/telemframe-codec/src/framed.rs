//! `tokio_util::codec` adapter for async byte streams.

use bytes::{BufMut, BytesMut};
use tokio_util::codec::{Decoder, Encoder};

use crate::codec::{decode_message, Codec, LENGTH_PREFIX_SIZE};
use crate::error::{CodecError, Result};
use crate::frame::Frame;

/// Length-prefixed frame codec for `FramedRead`/`FramedWrite`.
#[derive(Debug, Clone)]
pub struct FrameCodec {
    codec: Codec,
}

impl FrameCodec {
    pub fn new(codec: Codec) -> Self {
        Self { codec }
    }

    pub fn codec(&self) -> &Codec {
        &self.codec
    }
}

impl Decoder for FrameCodec {
    type Item = Frame;
    type Error = CodecError;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Frame>> {
        match decode_message(src, self.codec.config().max_message_size)? {
            Some(message) => self.codec.decode_bytes(message).map(Some),
            None => Ok(None),
        }
    }
}

impl Encoder<&Frame> for FrameCodec {
    type Error = CodecError;

    /// Writes a placeholder prefix, encodes in place, then patches the
    /// length. `dst` is rolled back if the frame is rejected.
    fn encode(&mut self, item: &Frame, dst: &mut BytesMut) -> Result<()> {
        let start = dst.len();
        dst.put_u32_le(0);
        if let Err(err) = self.codec.encode_into(item, dst) {
            dst.truncate(start);
            return Err(err);
        }

        let len = dst.len() - start - LENGTH_PREFIX_SIZE;
        let max = self.codec.config().max_message_size;
        let prefix = match u32::try_from(len) {
            Ok(prefix) if len <= max => prefix,
            _ => {
                dst.truncate(start);
                return Err(CodecError::PayloadTooLarge { size: len, max });
            }
        };
        dst[start..start + LENGTH_PREFIX_SIZE].copy_from_slice(&prefix.to_le_bytes());
        Ok(())
    }
}

impl Encoder<Frame> for FrameCodec {
    type Error = CodecError;

    fn encode(&mut self, item: Frame, dst: &mut BytesMut) -> Result<()> {
        Encoder::<&Frame>::encode(self, &item, dst)
    }
}
