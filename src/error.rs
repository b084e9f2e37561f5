use std::path::PathBuf;

/// The primary error type for all operations in the `docshelf` crate.
#[derive(Debug)]
pub enum DocshelfError {
    /// An I/O error occurred, typically while reading a bundle archive or a
    /// configuration file. Includes the path where the error happened.
    Io { source: std::io::Error, path: PathBuf },

    /// The underlying zip container could not be opened or an entry could not be read.
    Archive(zip::result::ZipError),

    /// A descriptor (plugin, table-of-contents or keyword index) violated its
    /// expected structure. Carries a human-readable reason.
    MalformedDescriptor(String),

    /// A referenced archive entry does not exist.
    MissingEntry { archive: String, entry: String },

    /// The full-text index could not be built or queried.
    Search(String),

    /// A wrapper for any other error that doesn't fit the specific variants.
    Other(Box<dyn std::error::Error + Send + Sync>),
}

impl std::fmt::Display for DocshelfError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DocshelfError::Io { source, path } => {
                write!(f, "I/O error on path '{}': {}", path.display(), source)
            }
            DocshelfError::Archive(e) => write!(f, "Archive error: {}", e),
            DocshelfError::MalformedDescriptor(msg) => write!(f, "Malformed descriptor: {}", msg),
            DocshelfError::MissingEntry { archive, entry } => {
                write!(f, "Archive '{}' has no entry '{}'", archive, entry)
            }
            DocshelfError::Search(msg) => write!(f, "Search index error: {}", msg),
            DocshelfError::Other(e) => write!(f, "An unexpected error occurred: {}", e),
        }
    }
}

impl std::error::Error for DocshelfError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            DocshelfError::Io { source, .. } => Some(source),
            DocshelfError::Archive(e) => Some(e),
            DocshelfError::Other(e) => Some(e.as_ref()),
            _ => None,
        }
    }
}

impl From<zip::result::ZipError> for DocshelfError {
    fn from(err: zip::result::ZipError) -> Self {
        DocshelfError::Archive(err)
    }
}

impl From<quick_xml::Error> for DocshelfError {
    fn from(err: quick_xml::Error) -> Self {
        DocshelfError::MalformedDescriptor(format!("XML error: {}", err))
    }
}

impl From<tantivy::TantivyError> for DocshelfError {
    fn from(err: tantivy::TantivyError) -> Self {
        DocshelfError::Search(err.to_string())
    }
}
