use bytes::{Bytes, BytesMut};

use crate::data_type::{DataType, Sample};
use crate::error::{CodecError, Result};

/// An owned run of samples for one channel.
///
/// The byte buffer is always a whole number of `data_type` samples.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Series {
    data_type: DataType,
    data: Bytes,
}

impl Series {
    /// Wrap raw little-endian sample bytes.
    pub fn new(data_type: DataType, data: impl Into<Bytes>) -> Result<Self> {
        let data = data.into();
        let width = data_type.byte_width();
        if data.len() % width != 0 {
            return Err(CodecError::MisalignedSeries {
                len: data.len(),
                width,
            });
        }
        Ok(Self { data_type, data })
    }

    /// Build a series from typed values.
    pub fn from_values<T: Sample>(values: &[T]) -> Self {
        let mut data = BytesMut::with_capacity(values.len() * T::DATA_TYPE.byte_width());
        for value in values {
            value.write_le(&mut data);
        }
        Self {
            data_type: T::DATA_TYPE,
            data: data.freeze(),
        }
    }

    /// An empty series of the given type.
    pub fn empty(data_type: DataType) -> Self {
        Self {
            data_type,
            data: Bytes::new(),
        }
    }

    /// Read the samples back as typed values.
    pub fn values<T: Sample>(&self) -> Result<Vec<T>> {
        if T::DATA_TYPE != self.data_type {
            return Err(CodecError::Config(format!(
                "cannot read {} series as {}",
                self.data_type,
                T::DATA_TYPE
            )));
        }
        Ok(self
            .data
            .chunks_exact(self.data_type.byte_width())
            .map(T::read_le)
            .collect())
    }

    pub fn data_type(&self) -> DataType {
        self.data_type
    }

    /// Number of samples in the series.
    pub fn sample_count(&self) -> usize {
        self.data.len() / self.data_type.byte_width()
    }

    pub fn byte_len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.data
    }

    /// Shared handle to the sample bytes.
    pub fn data(&self) -> &Bytes {
        &self.data
    }
}
