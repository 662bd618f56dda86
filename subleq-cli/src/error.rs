use std::fmt;
use std::path::PathBuf;

use crate::loader::LoadError;

#[derive(Debug)]
pub enum Error {
    Load(LoadError, PathBuf),
    Clap(clap::Error),
}

impl Error {
    /// Setup/parsing failures abort before any execution with exit code 1;
    /// a failure closing the image file after a successful read gets its
    /// own exit code, 2.
    pub fn exit_code(&self) -> i32 {
        match self {
            Error::Load(LoadError::Close(_), _) => 2,
            Error::Load(..) => 1,
            Error::Clap(_) => 1,
        }
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Error::Load(err, path) => {
                write!(f, "loading image \"{}\" failed: {}", path.display(), err)
            }
            Error::Clap(err) => write!(f, "{}", err),
        }
    }
}

impl From<clap::Error> for Error {
    fn from(err: clap::Error) -> Error {
        Error::Clap(err)
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use std::io;

    #[test]
    fn close_failure_maps_to_exit_code_2() {
        let err = Error::Load(
            LoadError::Close(io::Error::new(io::ErrorKind::Other, "disk error")),
            PathBuf::from("image.dec"),
        );
        assert_eq!(err.exit_code(), 2);
    }

    #[test]
    fn parse_and_read_failures_map_to_exit_code_1() {
        assert_eq!(
            Error::Load(LoadError::MalformedSeparator, PathBuf::from("image.dec")).exit_code(),
            1
        );
        assert_eq!(
            Error::Load(LoadError::OutOfRange(99999), PathBuf::from("image.dec")).exit_code(),
            1
        );
    }
}
