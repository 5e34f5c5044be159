/// Format code for parameter and result values in the PostgreSQL protocol.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[repr(i16)]
pub enum FormatCode {
    /// Text format (0)
    #[default]
    Text = 0,
    /// Binary format (1)
    Binary = 1,
}

impl TryFrom<i16> for FormatCode {
    type Error = i16;

    fn try_from(value: i16) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(FormatCode::Text),
            1 => Ok(FormatCode::Binary),
            _ => Err(value),
        }
    }
}

impl FormatCode {
    /// Converts the FormatCode to an i16 value.
    pub fn as_i16(self) -> i16 {
        self as i16
    }
}

/// PostgreSQL type OIDs as reported in RowDescription metadata.
///
/// These numeric identifiers are contract constants: servers report them
/// verbatim, and a column whose OID disagrees with an expectation is a
/// schema-verification failure, not a protocol error. The values below are
/// stable across all supported PostgreSQL releases.
pub mod type_oid {
    /// BOOLEAN
    pub const BOOL: i32 = 16;
    /// BYTEA
    pub const BYTEA: i32 = 17;
    /// BIGINT
    pub const INT8: i32 = 20;
    /// SMALLINT
    pub const INT2: i32 = 21;
    /// INTEGER
    pub const INT4: i32 = 23;
    /// TEXT
    pub const TEXT: i32 = 25;
    /// REAL
    pub const FLOAT4: i32 = 700;
    /// DOUBLE PRECISION
    pub const FLOAT8: i32 = 701;
    /// CHAR
    pub const BPCHAR: i32 = 1042;
    /// VARCHAR
    pub const VARCHAR: i32 = 1043;
}

/// Error and notice message field type codes.
/// See: https://www.postgresql.org/docs/current/protocol-error-fields.html
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum ErrorFieldCode {
    /// Severity: ERROR, FATAL, PANIC, WARNING, NOTICE, DEBUG, INFO, LOG
    Severity = b'S',
    /// Severity (non-localized): Same as Severity but never localized
    SeverityNonLocalized = b'V',
    /// SQLSTATE code
    SqlState = b'C',
    /// Primary human-readable error message
    Message = b'M',
    /// Optional detail message
    Detail = b'D',
    /// Optional hint message
    Hint = b'H',
    /// Error cursor position in the original query string
    Position = b'P',
}

impl ErrorFieldCode {
    /// Converts the ErrorFieldCode to a u8 value.
    pub fn as_u8(self) -> u8 {
        self as u8
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_code_round_trip() {
        assert_eq!(FormatCode::try_from(0), Ok(FormatCode::Text));
        assert_eq!(FormatCode::try_from(1), Ok(FormatCode::Binary));
        assert_eq!(FormatCode::try_from(2), Err(2));
        assert_eq!(FormatCode::Binary.as_i16(), 1);
    }

    #[test]
    fn test_demo_table_oids() {
        // The two OIDs the demo schema expectation is pinned against.
        assert_eq!(type_oid::INT4, 23);
        assert_eq!(type_oid::VARCHAR, 1043);
    }
}
