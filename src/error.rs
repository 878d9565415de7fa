use std::path::PathBuf;
use std::{error, fmt, io};

/// Error type for loading and saving persisted map documents.
#[derive(Debug)]
pub enum MapError {
    /// File I/O error, with the path involved.
    Io {
        /// File being read or written.
        path: PathBuf,
        /// Underlying error.
        source: io::Error,
    },
    /// The document is not valid JSON.
    Json {
        /// File being parsed.
        path: PathBuf,
        /// Underlying parse error.
        source: serde_json::Error,
    },
    /// The document parsed but is not a map document.
    InvalidDocument(String),
    /// Unsupported file format (non-JSON).
    UnsupportedFormat(String),
}

impl fmt::Display for MapError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MapError::Io { path, source } => {
                write!(f, "I/O error on {}: {}", path.display(), source)
            }
            MapError::Json { path, source } => {
                write!(f, "failed to parse {}: {}", path.display(), source)
            }
            MapError::InvalidDocument(why) => write!(f, "invalid map document: {}", why),
            MapError::UnsupportedFormat(ext) => write!(f, "unsupported file format: {}", ext),
        }
    }
}

impl error::Error for MapError {
    fn source(&self) -> Option<&(dyn error::Error + 'static)> {
        match self {
            MapError::Io { source, .. } => Some(source),
            MapError::Json { source, .. } => Some(source),
            _ => None,
        }
    }
}
