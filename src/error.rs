//! Error type for the file layer's load/save path. Every other public
//! method either returns a plain value/`Option`/`MISS` or panics on the
//! fatal conditions `spec.md` §7 assigns to process termination; this type
//! exists only for the recoverable corner of the file layer.

use std::fmt;
use std::io;

/// Error returned by the file layer's load/save path.
#[derive(Debug)]
pub enum Error {
    /// An underlying I/O or mmap operation failed.
    Io(io::Error),
    /// A database block's size field ran past the end of the file.
    WrongHeader,
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::Io(e) => write!(f, "io error: {}", e),
            Error::WrongHeader => write!(f, "wrong file header"),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Io(e) => Some(e),
            Error::WrongHeader => None,
        }
    }
}

impl From<io::Error> for Error {
    fn from(e: io::Error) -> Error {
        Error::Io(e)
    }
}
