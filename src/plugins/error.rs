use std::path::PathBuf;

#[derive(Debug, thiserror::Error)]
pub enum PluginError {
    #[error("plugin directory not found: {path}")]
    DirectoryNotFound { path: PathBuf },

    #[error("failed to load plugin from {path}: {reason}")]
    LoadFailed { path: PathBuf, reason: String },

    #[error("plugin '{name}' not found in marketplace '{marketplace}'")]
    PluginNotFound { name: String, marketplace: String },

    #[error("marketplace '{name}' not found")]
    MarketplaceNotFound { name: String },

    #[error("no marketplace descriptor found in {path}")]
    DescriptorMissing { path: PathBuf },

    #[error("invalid marketplace descriptor at {path}: {reason}")]
    DescriptorInvalid { path: PathBuf, reason: String },

    #[error("failed to clone {source_ref}: {reason}")]
    CloneFailed { source_ref: String, reason: String },

    #[error("unsupported source: {source_ref}")]
    UnsupportedSource { source_ref: String },

    #[error("plugin '{name}' has no usable install source")]
    SourceMissing { name: String },

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = PluginError::PluginNotFound {
            name: "formatter".into(),
            marketplace: "tools".into(),
        };
        let msg = err.to_string();
        assert!(msg.contains("formatter"));
        assert!(msg.contains("tools"));

        let err = PluginError::CloneFailed {
            source_ref: "owner/repo".into(),
            reason: "timed out".into(),
        };
        assert!(err.to_string().contains("owner/repo"));

        let err = PluginError::DescriptorMissing {
            path: PathBuf::from("/tmp/market"),
        };
        assert!(err.to_string().contains("/tmp/market"));
    }

    #[test]
    fn test_io_error_conversion() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file missing");
        let plugin_err: PluginError = io_err.into();
        assert!(matches!(plugin_err, PluginError::Io(_)));
    }
}
