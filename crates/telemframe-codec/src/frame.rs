use crate::data_type::ChannelKey;
use crate::series::Series;

/// An ordered set of channel series exchanged as one message.
///
/// Keys are unique. Insertion order is preserved until the frame passes
/// through a codec, which normalizes it to schema order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Frame {
    entries: Vec<(ChannelKey, Series)>,
}

impl Frame {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            entries: Vec::with_capacity(capacity),
        }
    }

    /// Insert a series for `key`.
    ///
    /// An existing series for the same key is replaced in place and returned.
    pub fn insert(&mut self, key: ChannelKey, series: Series) -> Option<Series> {
        match self.entries.iter_mut().find(|(k, _)| *k == key) {
            Some((_, existing)) => Some(std::mem::replace(existing, series)),
            None => {
                self.entries.push((key, series));
                None
            }
        }
    }

    /// Builder-style [`Frame::insert`].
    pub fn with(mut self, key: ChannelKey, series: Series) -> Self {
        self.insert(key, series);
        self
    }

    pub fn get(&self, key: ChannelKey) -> Option<&Series> {
        self.entries
            .iter()
            .find(|(k, _)| *k == key)
            .map(|(_, series)| series)
    }

    pub fn contains_key(&self, key: ChannelKey) -> bool {
        self.entries.iter().any(|(k, _)| *k == key)
    }

    pub fn remove(&mut self, key: ChannelKey) -> Option<Series> {
        let pos = self.entries.iter().position(|(k, _)| *k == key)?;
        Some(self.entries.remove(pos).1)
    }

    /// Drop every channel not listed in `keys`.
    pub fn keep_keys(&mut self, keys: &[ChannelKey]) {
        self.entries.retain(|(k, _)| keys.contains(k));
    }

    pub fn keys(&self) -> impl Iterator<Item = ChannelKey> + '_ {
        self.entries.iter().map(|(k, _)| *k)
    }

    pub fn iter(&self) -> impl Iterator<Item = (ChannelKey, &Series)> {
        self.entries.iter().map(|(k, series)| (*k, series))
    }

    /// Number of channels in the frame.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Total sample bytes across all series.
    pub fn data_len(&self) -> usize {
        self.entries.iter().map(|(_, s)| s.byte_len()).sum()
    }

    pub(crate) fn push_unchecked(&mut self, key: ChannelKey, series: Series) {
        self.entries.push((key, series));
    }
}

impl FromIterator<(ChannelKey, Series)> for Frame {
    fn from_iter<I: IntoIterator<Item = (ChannelKey, Series)>>(iter: I) -> Self {
        let mut frame = Frame::new();
        for (key, series) in iter {
            frame.insert(key, series);
        }
        frame
    }
}

impl IntoIterator for Frame {
    type Item = (ChannelKey, Series);
    type IntoIter = std::vec::IntoIter<(ChannelKey, Series)>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.into_iter()
    }
}
