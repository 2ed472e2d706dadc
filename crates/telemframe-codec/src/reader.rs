use std::io::{ErrorKind, Read};

use bytes::{Bytes, BytesMut};
use tracing::debug;

use crate::codec::{decode_message, Codec, LENGTH_PREFIX_SIZE};
use crate::error::{CodecError, Result};
use crate::frame::Frame;

const INITIAL_BUFFER_CAPACITY: usize = 8 * 1024;
const READ_CHUNK_SIZE: usize = 8 * 1024;

/// Reads length-prefixed encoded frames from any `Read` stream.
///
/// Partial reads are buffered internally; callers only see complete frames.
pub struct MessageReader<T> {
    inner: T,
    buf: BytesMut,
    codec: Codec,
}

impl<T: Read> MessageReader<T> {
    /// Create a reader that decodes messages with `codec`.
    pub fn new(inner: T, codec: Codec) -> Self {
        Self {
            inner,
            buf: BytesMut::with_capacity(INITIAL_BUFFER_CAPACITY),
            codec,
        }
    }

    /// Read and decode the next frame (blocking).
    ///
    /// Returns `Err(CodecError::ConnectionClosed)` when EOF is reached on a
    /// message boundary, and `Err(CodecError::Truncated)` when the stream
    /// ends inside a message.
    pub fn read_frame(&mut self) -> Result<Frame> {
        let message = self.read_message()?;
        self.codec.decode_bytes(message)
    }

    /// Read the next raw message payload without decoding it.
    pub fn read_message(&mut self) -> Result<Bytes> {
        loop {
            if let Some(message) =
                decode_message(&mut self.buf, self.codec.config().max_message_size)?
            {
                return Ok(message);
            }

            let mut chunk = [0u8; READ_CHUNK_SIZE];
            let read = match self.inner.read(&mut chunk) {
                Ok(n) => n,
                Err(err) if err.kind() == ErrorKind::Interrupted => continue,
                Err(err) => return Err(CodecError::Io(err)),
            };

            if read == 0 {
                if self.buf.is_empty() {
                    return Err(CodecError::ConnectionClosed);
                }
                debug!(buffered = self.buf.len(), "stream closed mid-message");
                return Err(CodecError::Truncated {
                    needed: self.pending_len(),
                    available: self.buf.len(),
                });
            }

            self.buf.extend_from_slice(&chunk[..read]);
        }
    }

    /// Bytes the buffered message needs in total, prefix included.
    fn pending_len(&self) -> usize {
        match self.buf.get(..LENGTH_PREFIX_SIZE) {
            Some(prefix) => {
                let mut raw = [0u8; LENGTH_PREFIX_SIZE];
                raw.copy_from_slice(prefix);
                LENGTH_PREFIX_SIZE + u32::from_le_bytes(raw) as usize
            }
            None => LENGTH_PREFIX_SIZE,
        }
    }

    /// Iterate over the remaining frames.
    ///
    /// Ends cleanly at EOF on a message boundary. Any other error is yielded
    /// once and ends the iteration.
    pub fn frames(&mut self) -> impl Iterator<Item = Result<Frame>> + '_ {
        let mut done = false;
        std::iter::from_fn(move || {
            if done {
                return None;
            }
            match self.read_frame() {
                Err(CodecError::ConnectionClosed) if self.buf.is_empty() => None,
                Err(err) => {
                    done = true;
                    Some(Err(err))
                }
                ok => Some(ok),
            }
        })
    }

    pub fn codec(&self) -> &Codec {
        &self.codec
    }

    /// Borrow the underlying stream.
    pub fn get_ref(&self) -> &T {
        &self.inner
    }

    /// Mutably borrow the underlying stream.
    pub fn get_mut(&mut self) -> &mut T {
        &mut self.inner
    }

    /// Consume the reader and return the inner stream.
    pub fn into_inner(self) -> T {
        self.inner
    }
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;

    use bytes::{BufMut, BytesMut};

    use super::*;
    use crate::codec::encode_message;
    use crate::config::CodecConfig;
    use crate::data_type::DataType;
    use crate::schema::Schema;
    use crate::series::Series;

    fn codec() -> Codec {
        Codec::from_parts(vec![1, 2], vec![DataType::Float64, DataType::Int32]).unwrap()
    }

    fn wire(codec: &Codec, frames: &[Frame]) -> Vec<u8> {
        let mut wire = BytesMut::new();
        for frame in frames {
            encode_message(&codec.encode(frame).unwrap(), &mut wire).unwrap();
        }
        wire.to_vec()
    }

    #[test]
    fn read_multiple_frames() {
        let codec = codec();
        let first = Frame::new().with(1, Series::from_values(&[1.0f64, 2.0]));
        let second = Frame::new().with(2, Series::from_values(&[7i32]));
        let bytes = wire(&codec, &[first.clone(), second.clone()]);

        let mut reader = MessageReader::new(Cursor::new(bytes), codec);
        assert_eq!(reader.read_frame().unwrap(), first);
        assert_eq!(reader.read_frame().unwrap(), second);
        assert!(matches!(
            reader.read_frame(),
            Err(CodecError::ConnectionClosed)
        ));
    }

    #[test]
    fn partial_read_handling() {
        let codec = codec();
        let frame = Frame::new().with(2, Series::from_values(&[1i32, 2, 3]));
        let bytes = wire(&codec, &[frame.clone()]);

        let mut reader = MessageReader::new(ByteByByteReader { bytes, pos: 0 }, codec);
        assert_eq!(reader.read_frame().unwrap(), frame);
    }

    #[test]
    fn frames_iterator_stops_at_eof() {
        let codec = codec();
        let frames: Vec<Frame> = (0..5i32)
            .map(|i| Frame::new().with(2, Series::from_values(&[i])))
            .collect();
        let bytes = wire(&codec, &frames);

        let mut reader = MessageReader::new(Cursor::new(bytes), codec);
        let read: Vec<Frame> = reader.frames().collect::<Result<_>>().unwrap();
        assert_eq!(read, frames);
    }

    #[test]
    fn frames_iterator_reports_mid_message_eof() {
        let codec = codec();
        let mut bytes = wire(&codec, &[Frame::new().with(2, Series::from_values(&[1i32]))]);

        let total = bytes.len();
        bytes.truncate(total - 1);

        let mut reader = MessageReader::new(Cursor::new(bytes), codec);
        let results: Vec<_> = reader.frames().collect();
        assert_eq!(results.len(), 1);
        assert!(matches!(
            results[0],
            Err(CodecError::Truncated { needed, available })
                if needed == total && available == total - 1
        ));
    }

    #[test]
    fn cut_length_prefix_is_truncated() {
        let mut reader = MessageReader::new(Cursor::new(vec![9u8, 0]), codec());
        assert!(matches!(
            reader.read_frame(),
            Err(CodecError::Truncated {
                needed: LENGTH_PREFIX_SIZE,
                available: 2
            })
        ));
    }

    #[test]
    fn undecodable_message_surfaces_codec_error() {
        let codec = codec();
        let mut bytes = BytesMut::new();
        encode_message(&[0b11, 1, 0], &mut bytes).unwrap();

        let mut reader = MessageReader::new(Cursor::new(bytes.to_vec()), codec);
        assert!(matches!(
            reader.read_frame(),
            Err(CodecError::Truncated { .. })
        ));
    }

    #[test]
    fn oversized_message_in_stream() {
        let mut bytes = BytesMut::new();
        bytes.put_u32_le(1024);

        let schema = Schema::from_pairs([(1, DataType::Uint8)]).unwrap();
        let cfg = CodecConfig {
            max_message_size: 16,
            ..CodecConfig::default()
        };
        let mut reader =
            MessageReader::new(Cursor::new(bytes.to_vec()), Codec::with_config(schema, cfg));
        assert!(matches!(
            reader.read_frame(),
            Err(CodecError::PayloadTooLarge { .. })
        ));
    }

    #[test]
    fn interrupted_read_retries() {
        let codec = codec();
        let frame = Frame::new().with(1, Series::from_values(&[3.5f64]));
        let bytes = wire(&codec, &[frame.clone()]);

        let mut reader = MessageReader::new(
            InterruptedThenData {
                interrupted: false,
                inner: Cursor::new(bytes),
            },
            codec,
        );
        assert_eq!(reader.read_frame().unwrap(), frame);
    }

    #[test]
    fn accessors_and_into_inner() {
        let mut reader = MessageReader::new(Cursor::new(Vec::<u8>::new()), codec());
        assert_eq!(reader.codec().schema().size(), 2);
        let _ = reader.get_ref();
        let _ = reader.get_mut();
        let _inner = reader.into_inner();
    }

    struct ByteByByteReader {
        bytes: Vec<u8>,
        pos: usize,
    }

    impl Read for ByteByByteReader {
        fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
            if self.pos >= self.bytes.len() || buf.is_empty() {
                return Ok(0);
            }
            buf[0] = self.bytes[self.pos];
            self.pos += 1;
            Ok(1)
        }
    }

    struct InterruptedThenData {
        interrupted: bool,
        inner: Cursor<Vec<u8>>,
    }

    impl Read for InterruptedThenData {
        fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
            if !self.interrupted {
                self.interrupted = true;
                return Err(std::io::Error::from(ErrorKind::Interrupted));
            }
            self.inner.read(buf)
        }
    }
}
