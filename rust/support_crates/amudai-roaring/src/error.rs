use thiserror::Error;

/// Error returned by the fallible (I/O facing) operations of this crate.
///
/// Structural problems of an in-memory bitmap are never reported through this
/// type: they are described by a [`ValidationResult`](crate::validation::ValidationResult).
#[derive(Debug, Error)]
#[error(transparent)]
pub struct Error(Box<ErrorKind>);

pub type Result<T, E = Error> = std::result::Result<T, E>;

impl Error {
    pub fn kind(&self) -> &ErrorKind {
        self.0.as_ref()
    }

    pub fn into_kind(self) -> ErrorKind {
        *self.0
    }

    pub fn invalid_cookie(cookie: u32) -> Error {
        Error(ErrorKind::InvalidCookie { cookie }.into())
    }

    pub fn invalid_container_count(count: u64) -> Error {
        Error(ErrorKind::InvalidContainerCount { count }.into())
    }

    pub fn invalid_format(element: impl Into<String>, message: impl Into<String>) -> Error {
        Error(
            ErrorKind::InvalidFormat {
                element: element.into(),
                message: message.into(),
            }
            .into(),
        )
    }

    pub fn io(context: impl Into<String>, source: std::io::Error) -> Error {
        Error(
            ErrorKind::Io {
                context: context.into(),
                source,
            }
            .into(),
        )
    }
}

#[derive(Debug, Error)]
pub enum ErrorKind {
    #[error("unrecognized serialization cookie {cookie:#x}")]
    InvalidCookie { cookie: u32 },

    #[error("container count {count} exceeds the 65536 possible keys")]
    InvalidContainerCount { count: u64 },

    #[error("invalid roaring format for '{element}': {message}")]
    InvalidFormat { element: String, message: String },

    #[error("IO error for '{context}': {source}")]
    Io {
        context: String,
        source: std::io::Error,
    },
}

impl From<ErrorKind> for Error {
    fn from(kind: ErrorKind) -> Self {
        Error(kind.into())
    }
}

impl From<std::io::Error> for Error {
    fn from(e: std::io::Error) -> Self {
        Error::io("", e)
    }
}
