/// Default maximum enveloped message size: 16 MiB.
pub const DEFAULT_MAX_MESSAGE_SIZE: usize = 16 * 1024 * 1024;

/// Configuration for the frame codec and its message envelope.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CodecConfig {
    /// When true, decode rejects trailing bytes after the last channel block
    /// and presence bits beyond the schema size.
    pub strict_decode: bool,
    /// Maximum message size in bytes accepted by the envelope reader/writer.
    pub max_message_size: usize,
}

impl CodecConfig {
    /// Config that tolerates trailing bytes and mask padding bits.
    pub fn lenient() -> Self {
        Self {
            strict_decode: false,
            ..Self::default()
        }
    }
}

impl Default for CodecConfig {
    fn default() -> Self {
        Self {
            strict_decode: true,
            max_message_size: DEFAULT_MAX_MESSAGE_SIZE,
        }
    }
}
