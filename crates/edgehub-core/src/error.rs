//! Error types for the EdgeHub core.

/// Configuration error raised while loading or validating process settings.
///
/// A missing session key is fatal at startup. Missing storage settings are
/// carried by the facade and reported on every presign call instead.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    /// A required secret is absent or empty.
    #[error("missing secret: {0}")]
    MissingSecret(&'static str),

    /// A required non-secret setting is absent or empty.
    #[error("missing setting: {0}")]
    MissingSetting(&'static str),

    /// A setting is present but cannot be interpreted.
    #[error("invalid value for {name}: {value}")]
    InvalidValue {
        /// The variable or field name.
        name: &'static str,
        /// The rejected value.
        value: String,
    },
}

/// Convenience result type for configuration operations.
pub type ConfigResult<T> = Result<T, ConfigError>;
