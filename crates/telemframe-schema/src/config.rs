/// Controls schema loading behavior.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoaderConfig {
    /// When true, definitions with fields the loader does not know are rejected.
    pub strict_mode: bool,
    /// Maximum number of channels in one schema.
    pub max_channels: usize,
    /// Maximum bytes allowed per definition file.
    pub max_schema_file_size: usize,
    /// Maximum number of schemas loaded from a directory.
    pub max_schemas_from_directory: usize,
}

impl Default for LoaderConfig {
    fn default() -> Self {
        Self {
            strict_mode: false,
            max_channels: 65_536,
            max_schema_file_size: 256 * 1024,
            max_schemas_from_directory: 256,
        }
    }
}
