//! Top-level error wrapper types.

use crate::{
    ConfigError, GenerationError, HttpError, IoError, JsonError, ProviderError, RevisionError,
};

/// Every error condition a Folio operation can surface.
///
/// # Examples
///
/// ```
/// use folio_error::{FolioError, HttpError};
///
/// let http_err = HttpError::new("Connection failed");
/// let err: FolioError = http_err.into();
/// assert!(format!("{}", err).contains("HTTP Error"));
/// ```
#[derive(Debug, derive_more::From, derive_more::Display, derive_more::Error)]
pub enum FolioErrorKind {
    /// HTTP error
    #[from(HttpError)]
    Http(HttpError),
    /// JSON serialization/deserialization error
    #[from(JsonError)]
    Json(JsonError),
    /// Configuration error
    #[from(ConfigError)]
    Config(ConfigError),
    /// Filesystem error
    #[from(IoError)]
    Io(IoError),
    /// Provider call error
    #[from(ProviderError)]
    Provider(ProviderError),
    /// Generation pipeline error
    #[from(GenerationError)]
    Generation(GenerationError),
    /// Revision pass error
    #[from(RevisionError)]
    Revision(RevisionError),
}

/// Folio error with kind discrimination.
///
/// # Examples
///
/// ```
/// use folio_error::{ConfigError, FolioResult};
///
/// fn might_fail() -> FolioResult<()> {
///     Err(ConfigError::new("Missing field"))?
/// }
///
/// assert!(might_fail().is_err());
/// ```
#[derive(Debug, derive_more::Display, derive_more::Error)]
#[display("Folio Error: {}", _0)]
pub struct FolioError(Box<FolioErrorKind>);

impl FolioError {
    /// Create a new error from a kind.
    pub fn new(kind: FolioErrorKind) -> Self {
        Self(Box::new(kind))
    }

    /// Get the error kind.
    pub fn kind(&self) -> &FolioErrorKind {
        &self.0
    }

    /// The provider error carried by this error, if any.
    pub fn as_provider(&self) -> Option<&ProviderError> {
        match self.kind() {
            FolioErrorKind::Provider(err) => Some(err),
            _ => None,
        }
    }

    /// The generation error carried by this error, if any.
    pub fn as_generation(&self) -> Option<&GenerationError> {
        match self.kind() {
            FolioErrorKind::Generation(err) => Some(err),
            _ => None,
        }
    }

    /// The revision error carried by this error, if any.
    pub fn as_revision(&self) -> Option<&RevisionError> {
        match self.kind() {
            FolioErrorKind::Revision(err) => Some(err),
            _ => None,
        }
    }
}

// Generic From implementation for any type that converts to FolioErrorKind
impl<T> From<T> for FolioError
where
    T: Into<FolioErrorKind>,
{
    fn from(err: T) -> Self {
        Self::new(err.into())
    }
}

/// Result type for Folio operations.
pub type FolioResult<T> = std::result::Result<T, FolioError>;
