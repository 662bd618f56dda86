//! Tokenizes the image format: a text stream of signed decimal integers
//! separated by commas or whitespace.

use std::fmt;
use std::fs::File;
use std::io::{self, Read};
use std::path::Path;

use subleq::Word;

#[derive(Debug)]
pub enum LoadError {
    Io(io::Error),
    MalformedSeparator,
    OutOfRange(i64),
    /// The image file failed to close after a successful read. Distinct
    /// from `Io` so callers can map it to its own exit code, matching
    /// `fclose(file) < 0` being checked separately from the read loop.
    Close(io::Error),
}

impl fmt::Display for LoadError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            LoadError::Io(err) => write!(f, "{}", err),
            LoadError::MalformedSeparator => write!(f, "image contains a malformed separator"),
            LoadError::OutOfRange(v) => {
                write!(f, "value {} does not fit in a signed 16-bit word", v)
            }
            LoadError::Close(err) => write!(f, "failed to close image file: {}", err),
        }
    }
}

impl std::error::Error for LoadError {}

impl From<io::Error> for LoadError {
    fn from(err: io::Error) -> LoadError {
        LoadError::Io(err)
    }
}

/// Reads and tokenizes the image at `path` into its sequence of words.
///
/// The file is closed explicitly (via `sync_all`, the closest stable-Rust
/// equivalent of checking a C `fclose` return value without unsafe FFI)
/// after a successful read, before parsing; a close failure is reported as
/// `LoadError::Close`, distinct from read failures, so it can be mapped to
/// its own exit code.
pub fn load_image(path: &Path) -> Result<Vec<Word>, LoadError> {
    let mut file = File::open(path)?;
    let mut contents = String::new();
    file.read_to_string(&mut contents)?;
    file.sync_all().map_err(LoadError::Close)?;
    parse_image(&contents)
}

fn parse_image(text: &str) -> Result<Vec<Word>, LoadError> {
    let mut words = Vec::new();
    let mut chars = text.chars().peekable();

    loop {
        while matches!(chars.peek(), Some(c) if c.is_whitespace() || *c == ',') {
            chars.next();
        }
        if chars.peek().is_none() {
            break;
        }

        let mut token = String::new();
        if matches!(chars.peek(), Some('-') | Some('+')) {
            token.push(chars.next().unwrap());
        }
        while matches!(chars.peek(), Some(c) if c.is_ascii_digit()) {
            token.push(chars.next().unwrap());
        }

        if token.is_empty() || token == "-" || token == "+" {
            return Err(LoadError::MalformedSeparator);
        }

        // Anything left touching the token that isn't a separator or EOF is
        // itself a malformed separator (e.g. "12a3").
        if matches!(chars.peek(), Some(c) if !c.is_whitespace() && *c != ',') {
            return Err(LoadError::MalformedSeparator);
        }

        let value: i64 = token.parse().map_err(|_| LoadError::MalformedSeparator)?;
        if value < i64::from(i16::min_value()) || value > i64::from(i16::max_value()) {
            return Err(LoadError::OutOfRange(value));
        }

        words.push(value as i16 as u16 as Word);
    }

    Ok(words)
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn comma_and_whitespace_separated() {
        let words = parse_image("0, 65535 0\n0 0 -1").unwrap();
        assert_eq!(words, vec![0, 65535, 0, 0, 0, 0xFFFF]);
    }

    #[test]
    fn negative_values_cast_to_unsigned() {
        let words = parse_image("-1").unwrap();
        assert_eq!(words, vec![0xFFFF]);
    }

    #[test]
    fn out_of_range_literal_is_rejected() {
        let err = parse_image("40000").unwrap_err();
        assert!(matches!(err, LoadError::OutOfRange(40000)));
    }

    #[test]
    fn malformed_separator_is_rejected() {
        let err = parse_image("12a3").unwrap_err();
        assert!(matches!(err, LoadError::MalformedSeparator));
    }

    #[test]
    fn empty_image_loads_as_no_words() {
        let words = parse_image("   \n  ").unwrap();
        assert!(words.is_empty());
    }
}
