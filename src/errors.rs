//! Error handling for the ghec-backup crate.
use std::{error::Error as StdError, fmt};

/// Error type for the ghec-backup crate.
#[derive(Debug)]
pub struct BackupError {
    /// Inner error.
    inner: Box<Inner>,
}

impl BackupError {
    /// Create a new error.
    pub(crate) fn new(kind: BackupErrorKind) -> Self {
        Self {
            inner: Box::new(Inner { kind, source: None }),
        }
    }

    /// Create a new error with a source.
    pub(crate) fn with_text(mut self, text: &str) -> Self {
        self.inner.source = Some(Box::new(std::io::Error::other(text.to_string())));
        self
    }

    /// Replace the kind, keeping the source.
    ///
    /// Transport errors come in through the `From` impls and are re-kinded at
    /// the step that produced them.
    pub(crate) fn with_kind(mut self, kind: BackupErrorKind) -> Self {
        self.inner.kind = kind;
        self
    }

    /// Kind of the error
    pub fn kind(&self) -> &BackupErrorKind {
        &self.inner.kind
    }
}

/// Type alias for a boxed error.
pub(crate) type BoxError = Box<dyn StdError + Send + Sync>;

/// Inner error type for the ghec-backup crate.
#[derive(Debug)]
struct Inner {
    /// Error kind.
    kind: BackupErrorKind,

    /// Source error.
    source: Option<BoxError>,
}

/// What went wrong, by workflow step.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BackupErrorKind {
    /// Invalid or missing configuration
    Configuration,

    /// Listing the organization repositories failed
    Enumeration,

    /// The migration could not be started
    Submission,

    /// Checking the migration status failed
    Poll,

    /// The server reported the migration as failed
    ExportFailed,

    /// Streaming the archive to disk failed
    Download,

    /// One or more repositories could not be unlocked
    Unlock,

    /// The server-side migration archive could not be deleted
    Cleanup,

    /// Error related to the reqwest crate.
    Reqwest,

    /// Error related to serde.
    Serde,

    /// Filesystem error
    Io,
}

impl fmt::Display for BackupError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.inner.source {
            Some(source) => write!(f, "{:?}: {}", self.inner.kind, source),
            None => write!(f, "{:?}", self.inner.kind),
        }
    }
}

impl StdError for BackupError {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        self.inner.source.as_ref().map(|e| &**e as _)
    }
}

impl From<reqwest::Error> for BackupError {
    fn from(e: reqwest::Error) -> Self {
        Self {
            inner: Box::new(Inner {
                kind: BackupErrorKind::Reqwest,
                source: Some(Box::new(e)),
            }),
        }
    }
}

impl From<serde_json::Error> for BackupError {
    fn from(e: serde_json::Error) -> Self {
        Self {
            inner: Box::new(Inner {
                kind: BackupErrorKind::Serde,
                source: Some(Box::new(e)),
            }),
        }
    }
}

impl From<toml::de::Error> for BackupError {
    fn from(e: toml::de::Error) -> Self {
        Self {
            inner: Box::new(Inner {
                kind: BackupErrorKind::Configuration,
                source: Some(Box::new(e)),
            }),
        }
    }
}

impl From<std::io::Error> for BackupError {
    fn from(e: std::io::Error) -> Self {
        Self {
            inner: Box::new(Inner {
                kind: BackupErrorKind::Io,
                source: Some(Box::new(e)),
            }),
        }
    }
}
