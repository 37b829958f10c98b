//! Error types for the storage layer.

/// Errors raised by virtual paths, backends, routing and call strategies.
///
/// Callers see either a soft failure (`Ok(false)` / `Ok(None)` from a
/// [`Backend`](crate::Backend) operation) or one of these typed errors.
#[derive(thiserror::Error, Debug)]
pub enum Error {
    /// Destination already present and overwrite not requested.
    #[error("the file '{path}' already exists")]
    FileExists { path: String },

    /// Requested resource absent after exhausting all applicable backends.
    #[error("the file '{path}' doesn't exist")]
    FileNotFound { path: String },

    /// Malformed or disallowed path argument.
    #[error("invalid path '{path}'")]
    InvalidPath { path: String },

    /// An adapter value could not be used to build a storage.
    #[error("invalid storage adapter: {message}")]
    InvalidAdapter { message: String },

    /// No builtin adapter registered under the requested name.
    #[error("builtin storage adapter \"{name}\" not found")]
    AdapterNotFound { name: String },

    /// A strategy was asked to run an operation with an empty adapter list.
    #[error("there are no adapters available to use")]
    NoAdaptersAvailable,

    /// A failure reported by a named adapter.
    #[error("exception from adapter {adapter}: {source}")]
    Adapter {
        adapter: String,
        #[source]
        source: Box<Error>,
    },

    /// A virtual path was constructed from a non-absolute string.
    #[error("relative path not allowed {path}")]
    RelativePathNotAllowed { path: String },

    /// Underlying I/O failure in an adapter.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration could not be parsed or applied.
    #[error("invalid configuration: {message}")]
    Config { message: String },
}

impl Error {
    pub fn file_exists(path: impl Into<String>) -> Self {
        Error::FileExists { path: path.into() }
    }

    pub fn file_not_found(path: impl Into<String>) -> Self {
        Error::FileNotFound { path: path.into() }
    }

    pub fn invalid_path(path: impl Into<String>) -> Self {
        Error::InvalidPath { path: path.into() }
    }

    pub fn config(message: impl Into<String>) -> Self {
        Error::Config {
            message: message.into(),
        }
    }

    /// Wrap an error with the name of the adapter that produced it.
    pub fn adapter(adapter: impl Into<String>, source: Error) -> Self {
        Error::Adapter {
            adapter: adapter.into(),
            source: Box::new(source),
        }
    }

    /// Stable numeric code for this error kind.
    pub fn code(&self) -> u32 {
        match self {
            Error::FileExists { .. } => 1001,
            Error::FileNotFound { .. } => 1002,
            Error::InvalidPath { .. } => 1003,
            Error::InvalidAdapter { .. } => 1004,
            Error::AdapterNotFound { .. } => 1006,
            Error::NoAdaptersAvailable => 1007,
            Error::Adapter { .. } => 1008,
            Error::RelativePathNotAllowed { .. } => 1009,
            Error::Io(_) => 1010,
            Error::Config { .. } => 1011,
        }
    }

    /// True for errors that mean the path argument itself is unusable.
    pub fn is_path_error(&self) -> bool {
        matches!(
            self,
            Error::InvalidPath { .. } | Error::RelativePathNotAllowed { .. }
        )
    }
}
