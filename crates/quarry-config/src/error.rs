use std::path::PathBuf;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("configuration file not found: {path}")]
    FileNotFound { path: PathBuf },

    #[error("unsupported config format '{extension}' (expected toml, yml, yaml or json)")]
    UnsupportedFormat { extension: String },

    #[error("failed to parse {path}: {message}")]
    ParseError { path: PathBuf, message: String },

    #[error("invalid value for {field}: {message}")]
    ValidationError { field: String, message: String },
}

pub type Result<T> = std::result::Result<T, ConfigError>;
