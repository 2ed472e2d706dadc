use std::collections::HashMap;

use crate::data_type::{ChannelKey, DataType};
use crate::error::{CodecError, Result};
use crate::mask::PresenceMask;

/// The fixed, ordered channel layout both stream endpoints agree on.
///
/// Each key's position in the list is its schema index, which decides its
/// presence bit and the order of its block on the wire.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Schema {
    keys: Vec<ChannelKey>,
    data_types: Vec<DataType>,
    index: HashMap<ChannelKey, usize>,
}

impl Schema {
    /// Build a schema from parallel key and data type lists.
    pub fn new(keys: Vec<ChannelKey>, data_types: Vec<DataType>) -> Result<Self> {
        if keys.len() != data_types.len() {
            return Err(CodecError::Config(format!(
                "{} channel keys but {} data types",
                keys.len(),
                data_types.len()
            )));
        }

        let mut index = HashMap::with_capacity(keys.len());
        for (i, key) in keys.iter().enumerate() {
            if index.insert(*key, i).is_some() {
                return Err(CodecError::Config(format!("duplicate channel key {key}")));
            }
        }

        Ok(Self {
            keys,
            data_types,
            index,
        })
    }

    /// Build a schema from `(key, data_type)` pairs.
    pub fn from_pairs(pairs: impl IntoIterator<Item = (ChannelKey, DataType)>) -> Result<Self> {
        let (keys, data_types) = pairs.into_iter().unzip();
        Self::new(keys, data_types)
    }

    /// Schema index of `key`.
    pub fn index_of(&self, key: ChannelKey) -> Result<usize> {
        self.index
            .get(&key)
            .copied()
            .ok_or(CodecError::UnknownChannel(key))
    }

    pub fn contains(&self, key: ChannelKey) -> bool {
        self.index.contains_key(&key)
    }

    /// Key at `index`.
    pub fn key(&self, index: usize) -> Option<ChannelKey> {
        self.keys.get(index).copied()
    }

    /// Data type at `index`.
    pub fn data_type(&self, index: usize) -> Option<DataType> {
        self.data_types.get(index).copied()
    }

    /// Sample width in bytes of the channel at `index`.
    ///
    /// # Panics
    ///
    /// Panics if `index >= self.size()`.
    pub fn byte_width(&self, index: usize) -> usize {
        self.data_types[index].byte_width()
    }

    /// Number of channels.
    pub fn size(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    /// Bytes taken by the presence mask of every encoded frame.
    pub fn mask_len(&self) -> usize {
        PresenceMask::byte_len(self.size())
    }

    pub fn keys(&self) -> &[ChannelKey] {
        &self.keys
    }

    pub fn data_types(&self) -> &[DataType] {
        &self.data_types
    }

    /// `(index, key, data_type)` in schema order.
    pub fn iter(&self) -> impl Iterator<Item = (usize, ChannelKey, DataType)> + '_ {
        self.keys
            .iter()
            .zip(&self.data_types)
            .enumerate()
            .map(|(i, (key, dt))| (i, *key, *dt))
    }
}
