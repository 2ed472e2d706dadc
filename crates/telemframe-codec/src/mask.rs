//! Channel presence bitmask.
//!
//! Bit `i` lives in byte `i / 8` at position `i % 8`, least significant bit
//! first. All bit-order knowledge in the crate is confined to this module.

/// One presence bit per schema channel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PresenceMask {
    bits: Vec<u8>,
    size: usize,
}

impl PresenceMask {
    /// Number of bytes needed to hold `size` bits.
    pub const fn byte_len(size: usize) -> usize {
        size.div_ceil(8)
    }

    /// An all-clear mask for `size` channels.
    pub fn new(size: usize) -> Self {
        Self {
            bits: vec![0; Self::byte_len(size)],
            size,
        }
    }

    /// Reinterpret raw mask bytes for `size` channels.
    ///
    /// Returns `None` if `bytes` is shorter than [`PresenceMask::byte_len`].
    /// Extra input bytes are ignored.
    pub fn from_bytes(bytes: &[u8], size: usize) -> Option<Self> {
        let len = Self::byte_len(size);
        let bits = bytes.get(..len)?.to_vec();
        Some(Self { bits, size })
    }

    /// Mark channel `index` present. Indices outside the mask are ignored.
    pub fn set(&mut self, index: usize) {
        if index < self.size {
            self.bits[index / 8] |= 1 << (index % 8);
        }
    }

    /// Whether channel `index` is present.
    pub fn get(&self, index: usize) -> bool {
        index < self.size && self.bits[index / 8] & (1 << (index % 8)) != 0
    }

    /// Number of present channels.
    pub fn count(&self) -> usize {
        self.iter().count()
    }

    /// Present channel indices in ascending order.
    pub fn iter(&self) -> impl Iterator<Item = usize> + '_ {
        (0..self.size).filter(move |&i| self.get(i))
    }

    /// True if any bit at or beyond `size` is set in the final byte.
    pub fn has_padding_bits(&self) -> bool {
        let used = self.size % 8;
        match self.bits.last() {
            Some(last) if used != 0 => last >> used != 0,
            _ => false,
        }
    }

    /// Number of channels the mask covers.
    pub fn size(&self) -> usize {
        self.size
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.bits
    }
}
