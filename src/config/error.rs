use std::fmt;
use std::path::PathBuf;

#[derive(Debug)]
pub struct Error {
    kind: ErrorKind,
}

impl std::error::Error for Error {}

impl Error {
    /// Return the kind of this error.
    pub fn kind(&self) -> &ErrorKind {
        &self.kind
    }

    pub(crate) fn mount(dir: PathBuf) -> Error {
        Error {
            kind: ErrorKind::Mount(dir),
        }
    }

    pub(crate) fn read(e: std::io::Error) -> Error {
        Error {
            kind: ErrorKind::Read(e),
        }
    }

    pub(crate) fn write(e: std::io::Error) -> Error {
        Error {
            kind: ErrorKind::Write(e),
        }
    }
}

/// The kind of an error that can occur.
#[derive(Debug)]
#[non_exhaustive]
pub enum ErrorKind {
    /// The directory backing the store is missing or not a directory.
    Mount(PathBuf),
    Read(std::io::Error),
    Parse(serde_json::Error),
    Write(std::io::Error),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self.kind {
            ErrorKind::Mount(ref dir) => {
                write!(f, "failed to mount config store at {}", dir.display())
            }
            ErrorKind::Read(ref err) => err.fmt(f),
            ErrorKind::Parse(ref err) => err.fmt(f),
            ErrorKind::Write(ref err) => err.fmt(f),
        }
    }
}

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Error {
            kind: ErrorKind::Parse(e),
        }
    }
}
