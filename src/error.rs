use std::fmt;

pub type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Debug)]
pub enum Error {
    /// The first four bytes weren't the expected table signature.
    FormatMismatch { expected: [u8; 4], actual: [u8; 4] },
    /// A region of the table ended too early.
    LengthTooShort {
        step: &'static str,
        actual: usize,
        expected: usize,
    },
    /// Two parts of the table disagree with each other, e.g. the sparse ID list doesn't have the
    /// same length as the index table.
    StructuralInconsistency(String),
    /// A column declared a compression code this decoder doesn't know.
    UnknownCompression { column: usize, code: u32 },
    /// A string field pointed at an offset with no string-table entry.
    MissingString { column: usize, key: i64 },
    /// A string wasn't valid UTF-8, or wasn't NUL-terminated.
    BadString(String),
    /// A field index past the end of the table's columns.
    ColumnOutOfRange { column: usize, count: usize },
    /// A field was read in a way its column can't support, like asking a scalar column for an
    /// array.
    TypeMismatch { column: usize, reason: &'static str },
    /// Two rows resolved to the same ID.
    DuplicateId(u32),
    /// A copy-table entry referenced a row that was never decoded.
    MissingCopySource { new_id: u32, source_id: u32 },
    /// Failure reading the input stream.
    Io(std::io::Error),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match *self {
            Error::FormatMismatch {
                ref expected,
                ref actual,
            } => write!(
                f,
                "Expected table signature {:?}, but got {:?}",
                String::from_utf8_lossy(expected),
                String::from_utf8_lossy(actual)
            ),
            Error::LengthTooShort {
                step,
                actual,
                expected,
            } => write!(
                f,
                "Expected data length {}, but got {} on step [{}]",
                expected, actual, step
            ),
            Error::StructuralInconsistency(ref err) => {
                write!(f, "Structural inconsistency: {}", err)
            }
            Error::UnknownCompression { column, code } => write!(
                f,
                "Column {} uses unknown compression code {}",
                column, code
            ),
            Error::MissingString { column, key } => write!(
                f,
                "Column {} references string offset {}, which isn't in the string table",
                column, key
            ),
            Error::BadString(ref err) => write!(f, "Bad string data: {}", err),
            Error::ColumnOutOfRange { column, count } => write!(
                f,
                "Column {} requested, but the table only has {} columns",
                column, count
            ),
            Error::TypeMismatch { column, reason } => {
                write!(f, "Column {} can't be read this way: {}", column, reason)
            }
            Error::DuplicateId(id) => write!(f, "Record ID {} appears more than once", id),
            Error::MissingCopySource { new_id, source_id } => write!(
                f,
                "Copy of record {} into {} failed: source record doesn't exist",
                source_id, new_id
            ),
            Error::Io(ref err) => write!(f, "I/O failure: {}", err),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match *self {
            Error::Io(ref err) => Some(err),
            _ => None,
        }
    }
}

impl std::convert::From<std::io::Error> for Error {
    fn from(e: std::io::Error) -> Self {
        Self::Io(e)
    }
}
