//! Common type definitions shared across the trust layer.

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use crate::error::ConfigError;

/// Opaque key material: a session signing key, a storage secret key, or a
/// webhook shared secret.
///
/// Cloning is cheap and shares the same immutable bytes. The value never
/// appears in `Debug` output and has no serde implementation, so it cannot be
/// logged or serialized by accident.
///
/// # Examples
///
/// ```
/// use edgehub_core::Secret;
///
/// let secret = Secret::new("whsec_example");
/// assert_eq!(secret.expose(), b"whsec_example");
/// assert!(!format!("{secret:?}").contains("whsec"));
/// ```
#[derive(Clone)]
pub struct Secret(Arc<[u8]>);

impl Secret {
    /// Wrap raw key bytes.
    pub fn new(bytes: impl AsRef<[u8]>) -> Self {
        Self(Arc::from(bytes.as_ref()))
    }

    /// Borrow the raw key bytes for a cryptographic operation.
    #[must_use]
    pub fn expose(&self) -> &[u8] {
        &self.0
    }

    /// Number of key bytes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether the key is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Debug for Secret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Secret")
            .field("len", &self.0.len())
            .finish_non_exhaustive()
    }
}

/// The S3-compatible object store the presigner targets.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum StorageProvider {
    /// Amazon S3.
    #[default]
    Aws,
    /// Cloudflare R2.
    R2,
}

impl StorageProvider {
    /// Signing region used when none is configured.
    #[must_use]
    pub fn default_region(self) -> &'static str {
        match self {
            Self::Aws => "us-east-1",
            Self::R2 => "auto",
        }
    }

    /// Lowercase provider name, as reported to API callers.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Aws => "aws",
            Self::R2 => "r2",
        }
    }
}

impl FromStr for StorageProvider {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "" | "aws" | "s3" => Ok(Self::Aws),
            "r2" => Ok(Self::R2),
            other => Err(ConfigError::InvalidValue {
                name: "STORAGE_PROVIDER",
                value: other.to_owned(),
            }),
        }
    }
}

impl fmt::Display for StorageProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How the bucket is placed in presigned URLs.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum AddressingStyle {
    /// `https://host/bucket/key`.
    #[default]
    Path,
    /// `https://bucket.host/key`.
    VirtualHosted,
}

impl FromStr for AddressingStyle {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "" | "path" => Ok(Self::Path),
            "virtual" | "virtual-hosted" => Ok(Self::VirtualHosted),
            other => Err(ConfigError::InvalidValue {
                name: "S3_ADDRESSING",
                value: other.to_owned(),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_should_redact_secret_in_debug() {
        let secret = Secret::new("super-secret-value");
        let debug = format!("{secret:?}");
        assert!(!debug.contains("super-secret-value"));
        assert!(debug.contains("len: 18"));
    }

    #[test]
    fn test_should_share_bytes_between_clones() {
        let secret = Secret::new(b"abc");
        let clone = secret.clone();
        assert_eq!(clone.expose(), b"abc");
        assert_eq!(secret.len(), 3);
    }

    #[test]
    fn test_should_parse_storage_provider() {
        assert_eq!("R2".parse::<StorageProvider>().unwrap(), StorageProvider::R2);
        assert_eq!("".parse::<StorageProvider>().unwrap(), StorageProvider::Aws);
        assert!("gcs".parse::<StorageProvider>().is_err());
    }

    #[test]
    fn test_should_use_provider_default_region() {
        assert_eq!(StorageProvider::Aws.default_region(), "us-east-1");
        assert_eq!(StorageProvider::R2.default_region(), "auto");
    }

    #[test]
    fn test_should_parse_addressing_style() {
        assert_eq!(
            "virtual".parse::<AddressingStyle>().unwrap(),
            AddressingStyle::VirtualHosted
        );
        assert_eq!("path".parse::<AddressingStyle>().unwrap(), AddressingStyle::Path);
        assert!("dns".parse::<AddressingStyle>().is_err());
    }
}
