/// Controls schema registry construction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RegistryConfig {
    /// When true, object schemas reject properties they do not declare.
    pub strict_mode: bool,
    /// Maximum number of event schemas (channel and user events combined).
    pub max_schema_count: usize,
    /// Maximum bytes accepted when loading a manifest file.
    pub max_manifest_size: usize,
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            strict_mode: false,
            max_schema_count: 1024,
            max_manifest_size: 1024 * 1024,
        }
    }
}
