//! Error types for report generation.

use thiserror::Error;

/// Errors that abort a report request.
///
/// Extraction anomalies (missing titles, empty containers, unresolved
/// images) are never errors; they degrade to defaults instead.
#[derive(Error, Debug)]
pub enum Error {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("cannot read package archive: {0}")]
    ArchiveRead(#[from] zip::result::ZipError),

    #[error("no imsmanifest.xml found in package")]
    ManifestMissing,

    #[error("malformed manifest at byte {position}: {message}")]
    ManifestParse { position: u64, message: String },

    #[error("package contains no HTML pages")]
    NoContent,

    #[error("invalid selector {rule:?}: {message}")]
    InvalidSelector { rule: String, message: String },

    #[error("invalid configuration: {0}")]
    Config(String),

    #[error("rendering failed: {0}")]
    Render(String),
}

impl Error {
    /// Whether the failure is caused by the submitted package rather than
    /// by this process.
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            Error::ArchiveRead(_) | Error::ManifestMissing | Error::ManifestParse { .. } | Error::NoContent
        )
    }
}

pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_error_classification() {
        assert!(Error::ManifestMissing.is_client_error());
        assert!(Error::NoContent.is_client_error());
        assert!(
            Error::ManifestParse {
                position: 3,
                message: "bad".into()
            }
            .is_client_error()
        );
        assert!(!Error::Render("font".into()).is_client_error());
        assert!(!Error::Config("x".into()).is_client_error());
    }

    #[test]
    fn test_display() {
        let err = Error::ManifestParse {
            position: 42,
            message: "unexpected end".into(),
        };
        assert_eq!(
            err.to_string(),
            "malformed manifest at byte 42: unexpected end"
        );
    }
}
