use std::io::{ErrorKind, Write};

use bytes::BytesMut;

use crate::codec::{encode_message, Codec, LENGTH_PREFIX_SIZE};
use crate::error::{CodecError, Result};
use crate::frame::Frame;

const INITIAL_BUFFER_CAPACITY: usize = 8 * 1024;

/// Writes encoded frames, each behind a length prefix, to any `Write` stream.
pub struct MessageWriter<T> {
    inner: T,
    buf: BytesMut,
    scratch: BytesMut,
    codec: Codec,
}

impl<T: Write> MessageWriter<T> {
    /// Create a writer that encodes frames with `codec`.
    pub fn new(inner: T, codec: Codec) -> Self {
        Self {
            inner,
            buf: BytesMut::with_capacity(INITIAL_BUFFER_CAPACITY),
            scratch: BytesMut::with_capacity(INITIAL_BUFFER_CAPACITY),
            codec,
        }
    }

    /// Encode and write a complete frame (blocking).
    pub fn write_frame(&mut self, frame: &Frame) -> Result<()> {
        let mut scratch = std::mem::take(&mut self.scratch);
        scratch.clear();
        let result = self
            .codec
            .encode_into(frame, &mut scratch)
            .and_then(|()| self.send(&scratch));
        self.scratch = scratch;
        result
    }

    /// Write an already-encoded payload.
    pub fn send(&mut self, payload: &[u8]) -> Result<()> {
        let max = self.codec.config().max_message_size;
        if payload.len() > max {
            return Err(CodecError::PayloadTooLarge {
                size: payload.len(),
                max,
            });
        }

        self.buf.clear();
        self.buf.reserve(LENGTH_PREFIX_SIZE + payload.len());
        encode_message(payload, &mut self.buf)?;

        let mut offset = 0usize;
        while offset < self.buf.len() {
            match self.inner.write(&self.buf[offset..]) {
                Ok(0) => return Err(CodecError::ConnectionClosed),
                Ok(n) => offset += n,
                Err(err) if err.kind() == ErrorKind::Interrupted => continue,
                Err(err) => return Err(CodecError::Io(err)),
            }
        }

        self.flush()
    }

    /// Flush the underlying stream.
    pub fn flush(&mut self) -> Result<()> {
        loop {
            match self.inner.flush() {
                Ok(()) => return Ok(()),
                Err(err) if err.kind() == ErrorKind::Interrupted => continue,
                Err(err) => return Err(CodecError::Io(err)),
            }
        }
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

    /// Consume the writer and return the inner stream.
    pub fn into_inner(self) -> T {
        self.inner
    }
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;

    use super::*;
    use crate::codec::decode_message;
    use crate::config::CodecConfig;
    use crate::data_type::DataType;
    use crate::reader::MessageReader;
    use crate::schema::Schema;
    use crate::series::Series;

    fn codec() -> Codec {
        Codec::from_parts(vec![10, 20], vec![DataType::Uint16, DataType::Float32]).unwrap()
    }

    #[test]
    fn write_single_frame() {
        let codec = codec();
        let frame = Frame::new().with(20, Series::from_values(&[0.5f32]));
        let mut writer = MessageWriter::new(Cursor::new(Vec::new()), codec.clone());

        writer.write_frame(&frame).unwrap();

        let mut wire = BytesMut::from(writer.into_inner().into_inner().as_slice());
        let message = decode_message(&mut wire, usize::MAX).unwrap().unwrap();
        assert_eq!(codec.decode(&message).unwrap(), frame);
        assert!(wire.is_empty());
    }

    #[test]
    fn writer_reader_roundtrip() {
        let codec = codec();
        let frames = vec![
            Frame::new().with(10, Series::from_values(&[1u16, 2, 3])),
            Frame::new(),
            Frame::new()
                .with(20, Series::from_values(&[9.0f32]))
                .with(10, Series::from_values(&[4u16])),
        ];

        let mut writer = MessageWriter::new(Cursor::new(Vec::new()), codec.clone());
        for frame in &frames {
            writer.write_frame(frame).unwrap();
        }
        let bytes = writer.into_inner().into_inner();

        let mut reader = MessageReader::new(Cursor::new(bytes), codec);
        assert_eq!(reader.read_frame().unwrap(), frames[0]);
        assert_eq!(reader.read_frame().unwrap(), frames[1]);
        // Third frame comes back in schema order.
        let third = reader.read_frame().unwrap();
        assert_eq!(third.keys().collect::<Vec<_>>(), vec![10, 20]);
    }

    #[test]
    fn unknown_channel_writes_nothing() {
        let mut writer = MessageWriter::new(Cursor::new(Vec::new()), codec());
        let frame = Frame::new().with(99, Series::from_values(&[1u16]));

        assert!(matches!(
            writer.write_frame(&frame),
            Err(CodecError::UnknownChannel(99))
        ));
        assert!(writer.get_ref().get_ref().is_empty());
    }

    #[test]
    fn send_rejects_oversized_payload() {
        let schema = Schema::from_pairs([(1, DataType::Uint8)]).unwrap();
        let cfg = CodecConfig {
            max_message_size: 4,
            ..CodecConfig::default()
        };
        let mut writer =
            MessageWriter::new(Cursor::new(Vec::new()), Codec::with_config(schema, cfg));

        let frame = Frame::new().with(1, Series::from_values(&[1u8, 2, 3, 4]));
        assert!(matches!(
            writer.write_frame(&frame),
            Err(CodecError::PayloadTooLarge { size: 9, max: 4 })
        ));
    }

    #[test]
    fn zero_write_is_connection_closed() {
        let mut writer = MessageWriter::new(ZeroWriter, codec());
        assert!(matches!(
            writer.send(b"x"),
            Err(CodecError::ConnectionClosed)
        ));
    }

    #[test]
    fn interrupted_write_retries() {
        let mut writer = MessageWriter::new(
            InterruptedWriter {
                interrupted: false,
                out: Vec::new(),
            },
            codec(),
        );
        writer.send(b"ok").unwrap();
        assert_eq!(writer.get_ref().out, vec![2, 0, 0, 0, b'o', b'k']);
    }

    struct ZeroWriter;

    impl Write for ZeroWriter {
        fn write(&mut self, _buf: &[u8]) -> std::io::Result<usize> {
            Ok(0)
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    struct InterruptedWriter {
        interrupted: bool,
        out: Vec<u8>,
    }

    impl Write for InterruptedWriter {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            if !self.interrupted {
                self.interrupted = true;
                return Err(std::io::Error::from(ErrorKind::Interrupted));
            }
            self.out.extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }
}
