//! Decoding verified result rows into native values.
//!
//! The demo schema is an `(INTEGER, VARCHAR)` pair, so a decoded row is an
//! `(i32, String)` pair. Binary-format integers arrive in network byte
//! order regardless of host architecture; the conversion lives in one
//! explicit primitive ([`int4_from_be`]) with tests pinned to known byte
//! patterns. `i32` pins the 4-byte width at compile time.
//!
//! Callers decode only results whose shape has passed verification
//! (see [`crate::schema`]); as a backstop, [`decode_rows`] refuses a
//! result whose column count is not two.

use crate::client::ResultSet;
use crate::protocol::FormatCode;

/// One decoded record from the demo table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodedRow {
    /// The "number" column.
    pub number: i32,
    /// The "english" column.
    pub text: String,
}

/// Errors from interpreting raw cell bytes.
#[derive(Debug)]
pub enum DecodeError {
    /// The result does not have the two-column shape decoding assumes.
    UnexpectedColumnCount { found: usize },
    /// A cell was SQL NULL where the schema says NOT NULL.
    NullValue { row: usize, column: usize },
    /// A binary INT4 cell held fewer than 4 bytes.
    TruncatedInt4 { len: usize },
    /// A text cell was not valid UTF-8.
    InvalidUtf8(std::str::Utf8Error),
    /// A text-format integer cell did not parse.
    InvalidInteger(String),
}

impl std::fmt::Display for DecodeError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DecodeError::UnexpectedColumnCount { found } => {
                write!(f, "cannot decode result with {} columns", found)
            }
            DecodeError::NullValue { row, column } => {
                write!(f, "unexpected NULL at row {}, column {}", row, column)
            }
            DecodeError::TruncatedInt4 { len } => {
                write!(f, "INT4 cell has only {} bytes", len)
            }
            DecodeError::InvalidUtf8(e) => write!(f, "invalid UTF-8 in cell: {}", e),
            DecodeError::InvalidInteger(s) => write!(f, "invalid integer text: \"{}\"", s),
        }
    }
}

impl std::error::Error for DecodeError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            DecodeError::InvalidUtf8(e) => Some(e),
            _ => None,
        }
    }
}

/// Interprets the first 4 bytes of a binary-format cell as a big-endian
/// signed 32-bit integer and converts it to host order.
pub fn int4_from_be(bytes: &[u8]) -> Result<i32, DecodeError> {
    if bytes.len() < 4 {
        return Err(DecodeError::TruncatedInt4 { len: bytes.len() });
    }
    Ok(i32::from_be_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]))
}

/// Parses a text-format integer cell (ASCII decimal digits).
pub fn int4_from_text(bytes: &[u8]) -> Result<i32, DecodeError> {
    let s = text_from_bytes(bytes)?;
    s.parse::<i32>()
        .map_err(|_| DecodeError::InvalidInteger(s))
}

/// Interprets a cell as text: bytes up to the first NUL (or the whole cell
/// if none), validated as UTF-8.
pub fn text_from_bytes(bytes: &[u8]) -> Result<String, DecodeError> {
    let end = bytes.iter().position(|&b| b == 0).unwrap_or(bytes.len());
    std::str::from_utf8(&bytes[..end])
        .map(str::to_owned)
        .map_err(DecodeError::InvalidUtf8)
}

/// Decodes every row of a verified two-column result into
/// [`DecodedRow`]s, honoring each column's negotiated format.
pub fn decode_rows(result: &ResultSet) -> Result<Vec<DecodedRow>, DecodeError> {
    if result.num_columns() != 2 {
        return Err(DecodeError::UnexpectedColumnCount {
            found: result.num_columns(),
        });
    }

    let mut rows = Vec::with_capacity(result.num_rows());
    for row in 0..result.num_rows() {
        let number_bytes = result
            .cell(row, 0)
            .ok_or(DecodeError::NullValue { row, column: 0 })?;
        let number = match result.column_format(0) {
            FormatCode::Binary => int4_from_be(number_bytes)?,
            FormatCode::Text => int4_from_text(number_bytes)?,
        };

        let text_bytes = result
            .cell(row, 1)
            .ok_or(DecodeError::NullValue { row, column: 1 })?;
        let text = text_from_bytes(text_bytes)?;

        rows.push(DecodedRow { number, text });
    }
    Ok(rows)
}
