use bytes::{Buf, BytesMut};
use tokio_util::codec::Decoder;

use crate::protocol::codec::{ClientCodec, get_cstring, get_nullable_bytes};
use crate::protocol::error::ProtocolError;
use crate::protocol::types::{ErrorFieldCode, FormatCode};

/// Ensures that the buffer has at least `n` bytes remaining.
/// Returns `ProtocolError::InvalidMessage` if not enough bytes are available.
macro_rules! ensure_remaining {
    ($buf:expr, $n:expr) => {
        if $buf.len() < $n {
            return Err(ProtocolError::InvalidMessage);
        }
    };
}

/// Authentication request carried in an 'R' message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthenticationRequest {
    /// Authentication succeeded (code 0).
    Ok,
    /// Server wants the password in cleartext (code 3).
    CleartextPassword,
    /// Any other method (MD5, SCRAM, ...). This client does not speak it.
    Other(i32),
}

/// Transaction status indicator in a ReadyForQuery message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransactionStatus {
    /// 'I' - Idle (not in a transaction block)
    Idle,
    /// 'T' - In a transaction block
    InTransaction,
    /// 'E' - In a failed transaction block
    Failed,
}

impl TryFrom<u8> for TransactionStatus {
    type Error = u8;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            b'I' => Ok(TransactionStatus::Idle),
            b'T' => Ok(TransactionStatus::InTransaction),
            b'E' => Ok(TransactionStatus::Failed),
            _ => Err(value),
        }
    }
}

/// Metadata for one result column, from a RowDescription message.
#[derive(Debug, Clone)]
pub struct FieldDescription {
    /// Column name (or alias).
    pub name: String,
    /// OID of the source table, or 0 for computed columns.
    pub table_oid: i32,
    /// Attribute number within the source table, or 0.
    pub column_attr: i16,
    /// Type OID of the column.
    pub type_oid: i32,
    /// Byte width for fixed-size types, negative for variable-length.
    pub type_size: i16,
    /// Type modifier (e.g. VARCHAR length limit), type-specific.
    pub type_modifier: i32,
    /// Format the cells of this column arrive in.
    pub format: FormatCode,
}

/// One field of an ErrorResponse or NoticeResponse.
#[derive(Debug, Clone)]
pub struct ErrorField {
    pub code: u8,
    pub value: String,
}

/// Decoded error/notice fields with accessors for the common ones.
#[derive(Debug, Clone, Default)]
pub struct ErrorInfo {
    fields: Vec<ErrorField>,
}

impl ErrorInfo {
    fn field(&self, code: ErrorFieldCode) -> Option<&str> {
        self.fields
            .iter()
            .find(|f| f.code == code.as_u8())
            .map(|f| f.value.as_str())
    }

    /// Severity string (ERROR, FATAL, NOTICE, ...), if the server sent one.
    pub fn severity(&self) -> Option<&str> {
        self.field(ErrorFieldCode::Severity)
    }

    /// SQLSTATE code, if the server sent one.
    pub fn sqlstate(&self) -> Option<&str> {
        self.field(ErrorFieldCode::SqlState)
    }

    /// Primary human-readable message. The protocol requires this field;
    /// an empty string stands in if a server omits it anyway.
    pub fn message(&self) -> &str {
        self.field(ErrorFieldCode::Message).unwrap_or("")
    }

    /// All fields as received, in wire order.
    pub fn fields(&self) -> &[ErrorField] {
        &self.fields
    }
}

impl std::fmt::Display for ErrorInfo {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match (self.severity(), self.sqlstate()) {
            (Some(severity), Some(state)) => {
                write!(f, "{}: {} ({})", severity, self.message(), state)
            }
            (Some(severity), None) => write!(f, "{}: {}", severity, self.message()),
            _ => write!(f, "{}", self.message()),
        }
    }
}

/// Messages sent by the backend (server) to this client.
#[derive(Debug)]
pub enum BackendMessage {
    /// 'R' - Authentication request/response
    Authentication(AuthenticationRequest),
    /// 'K' - Backend key data for cancel requests
    BackendKeyData { process_id: i32, secret_key: i32 },
    /// 'S' - Parameter status notification
    ParameterStatus { name: String, value: String },
    /// 'Z' - Ready for query
    ReadyForQuery { status: TransactionStatus },
    /// 'T' - Row description (result column metadata)
    RowDescription { fields: Vec<FieldDescription> },
    /// 'D' - One data row; None cells are SQL NULL
    DataRow { values: Vec<Option<Vec<u8>>> },
    /// 'C' - Command completion tag
    CommandComplete { tag: String },
    /// 'I' - Response to an empty query string
    EmptyQueryResponse,
    /// 'E' - Error response
    ErrorResponse(ErrorInfo),
    /// 'N' - Notice response (non-fatal)
    NoticeResponse(ErrorInfo),
    /// '1' - Parse completed
    ParseComplete,
    /// '2' - Bind completed
    BindComplete,
    /// 'n' - Statement/portal produces no rows
    NoData,
    /// 't' - Parameter types of a described statement
    ParameterDescription { param_types: Vec<i32> },
}

impl BackendMessage {
    /// Decodes a backend message from the buffer.
    /// The buffer must contain exactly one complete message (framing already
    /// validated by the codec).
    fn decode(src: &mut BytesMut) -> Result<Self, ProtocolError> {
        let msg_type = src.get_u8();
        let _length = src.get_i32();
        match msg_type {
            b'R' => {
                ensure_remaining!(src, 4);
                let request = match src.get_i32() {
                    0 => AuthenticationRequest::Ok,
                    3 => AuthenticationRequest::CleartextPassword,
                    code => AuthenticationRequest::Other(code),
                };
                Ok(BackendMessage::Authentication(request))
            }
            b'K' => {
                ensure_remaining!(src, 8);
                let process_id = src.get_i32();
                let secret_key = src.get_i32();
                Ok(BackendMessage::BackendKeyData {
                    process_id,
                    secret_key,
                })
            }
            b'S' => {
                let name = get_cstring(src)?;
                let value = get_cstring(src)?;
                Ok(BackendMessage::ParameterStatus { name, value })
            }
            b'Z' => {
                ensure_remaining!(src, 1);
                let status = TransactionStatus::try_from(src.get_u8())
                    .map_err(|_| ProtocolError::InvalidMessage)?;
                Ok(BackendMessage::ReadyForQuery { status })
            }
            b'T' => {
                ensure_remaining!(src, 2);
                let count = src.get_i16();
                if count < 0 {
                    return Err(ProtocolError::InvalidMessage);
                }
                let mut fields = Vec::with_capacity(count as usize);
                for _ in 0..count {
                    let name = get_cstring(src)?;
                    ensure_remaining!(src, 18);
                    let table_oid = src.get_i32();
                    let column_attr = src.get_i16();
                    let type_oid = src.get_i32();
                    let type_size = src.get_i16();
                    let type_modifier = src.get_i32();
                    let format = FormatCode::try_from(src.get_i16())
                        .map_err(|_| ProtocolError::InvalidMessage)?;
                    fields.push(FieldDescription {
                        name,
                        table_oid,
                        column_attr,
                        type_oid,
                        type_size,
                        type_modifier,
                        format,
                    });
                }
                Ok(BackendMessage::RowDescription { fields })
            }
            b'D' => {
                ensure_remaining!(src, 2);
                let count = src.get_i16();
                if count < 0 {
                    return Err(ProtocolError::InvalidMessage);
                }
                let mut values = Vec::with_capacity(count as usize);
                for _ in 0..count {
                    values.push(get_nullable_bytes(src)?);
                }
                Ok(BackendMessage::DataRow { values })
            }
            b'C' => {
                let tag = get_cstring(src)?;
                Ok(BackendMessage::CommandComplete { tag })
            }
            b'I' => Ok(BackendMessage::EmptyQueryResponse),
            b'E' => Ok(BackendMessage::ErrorResponse(Self::decode_error_fields(
                src,
            )?)),
            b'N' => Ok(BackendMessage::NoticeResponse(Self::decode_error_fields(
                src,
            )?)),
            b'1' => Ok(BackendMessage::ParseComplete),
            b'2' => Ok(BackendMessage::BindComplete),
            b'n' => Ok(BackendMessage::NoData),
            b't' => {
                ensure_remaining!(src, 2);
                let count = src.get_i16();
                if count < 0 {
                    return Err(ProtocolError::InvalidMessage);
                }
                let mut param_types = Vec::with_capacity(count as usize);
                for _ in 0..count {
                    ensure_remaining!(src, 4);
                    param_types.push(src.get_i32());
                }
                Ok(BackendMessage::ParameterDescription { param_types })
            }
            _ => Err(ProtocolError::UnknownMessageType(msg_type)),
        }
    }

    /// Decodes the field list of an ErrorResponse/NoticeResponse body:
    /// (code byte, cstring value) pairs until a zero code byte.
    fn decode_error_fields(src: &mut BytesMut) -> Result<ErrorInfo, ProtocolError> {
        let mut fields = Vec::new();
        loop {
            ensure_remaining!(src, 1);
            let code = src.get_u8();
            if code == 0 {
                break;
            }
            let value = get_cstring(src)?;
            fields.push(ErrorField { code, value });
        }
        Ok(ErrorInfo { fields })
    }
}

impl Decoder for ClientCodec {
    type Item = BackendMessage;
    type Error = ProtocolError;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        // Need at least 5 bytes (type + length)
        if src.len() < 5 {
            return Ok(None);
        }

        // Peek at the length (bytes 1-4, don't consume yet)
        let len = i32::from_be_bytes([src[1], src[2], src[3], src[4]]) as usize;
        if len < 4 {
            return Err(ProtocolError::InvalidMessage);
        }
        if len > self.max_message_size {
            return Err(ProtocolError::MessageTooLarge(len));
        }

        // Total message size = 1 (type byte) + length
        let len = 1 + len;

        // Wait for complete message
        if src.len() < len {
            return Ok(None);
        }

        // Ready to decode - consume the message and decode it
        let mut msg_buf = src.split_to(len);
        let msg = BackendMessage::decode(&mut msg_buf)?;
        Ok(Some(msg))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bytes::BufMut;

    /// Helper to create a backend message with given type and body.
    fn make_message(msg_type: u8, body: &[u8]) -> Vec<u8> {
        let mut buf = Vec::new();
        buf.push(msg_type);
        buf.put_i32((4 + body.len()) as i32);
        buf.extend_from_slice(body);
        buf
    }

    /// Helper to decode a BackendMessage from bytes.
    fn decode_message(buf: &[u8]) -> Result<Option<BackendMessage>, ProtocolError> {
        let mut codec = ClientCodec::new();
        let mut bytes = BytesMut::from(buf);
        codec.decode(&mut bytes)
    }

    #[test]
    fn test_decode_authentication_ok() {
        let buf = make_message(b'R', &0i32.to_be_bytes());
        let msg = decode_message(&buf).unwrap().unwrap();
        assert!(matches!(
            msg,
            BackendMessage::Authentication(AuthenticationRequest::Ok)
        ));
    }

    #[test]
    fn test_decode_authentication_cleartext() {
        let buf = make_message(b'R', &3i32.to_be_bytes());
        let msg = decode_message(&buf).unwrap().unwrap();
        assert!(matches!(
            msg,
            BackendMessage::Authentication(AuthenticationRequest::CleartextPassword)
        ));
    }

    #[test]
    fn test_decode_authentication_unsupported_method() {
        // AuthenticationMD5Password (code 5) plus salt
        let mut body = Vec::new();
        body.put_i32(5);
        body.extend_from_slice(&[1, 2, 3, 4]);
        let buf = make_message(b'R', &body);
        let msg = decode_message(&buf).unwrap().unwrap();
        assert!(matches!(
            msg,
            BackendMessage::Authentication(AuthenticationRequest::Other(5))
        ));
    }

    #[test]
    fn test_decode_ready_for_query() {
        let buf = make_message(b'Z', b"I");
        let msg = decode_message(&buf).unwrap().unwrap();
        let BackendMessage::ReadyForQuery { status } = msg else {
            panic!("expected ReadyForQuery, got {msg:?}")
        };
        assert_eq!(status, TransactionStatus::Idle);
    }

    #[test]
    fn test_decode_backend_key_data() {
        let mut body = Vec::new();
        body.put_i32(12345);
        body.put_i32(67890);
        let buf = make_message(b'K', &body);
        let msg = decode_message(&buf).unwrap().unwrap();
        let BackendMessage::BackendKeyData {
            process_id,
            secret_key,
        } = msg
        else {
            panic!("expected BackendKeyData, got {msg:?}")
        };
        assert_eq!(process_id, 12345);
        assert_eq!(secret_key, 67890);
    }

    #[test]
    fn test_decode_parameter_status() {
        let buf = make_message(b'S', b"server_version\016.0\0");
        let msg = decode_message(&buf).unwrap().unwrap();
        let BackendMessage::ParameterStatus { name, value } = msg else {
            panic!("expected ParameterStatus, got {msg:?}")
        };
        assert_eq!(name, "server_version");
        assert_eq!(value, "16.0");
    }

    #[test]
    fn test_decode_row_description() {
        let mut body = Vec::new();
        body.put_i16(2);
        // column "number": INT4, size 4, binary format
        body.extend_from_slice(b"number\0");
        body.put_i32(0);
        body.put_i16(1);
        body.put_i32(23);
        body.put_i16(4);
        body.put_i32(-1);
        body.put_i16(1);
        // column "english": VARCHAR(11), variable size, binary format
        body.extend_from_slice(b"english\0");
        body.put_i32(0);
        body.put_i16(2);
        body.put_i32(1043);
        body.put_i16(-1);
        body.put_i32(11 + 4);
        body.put_i16(1);

        let buf = make_message(b'T', &body);
        let msg = decode_message(&buf).unwrap().unwrap();
        let BackendMessage::RowDescription { fields } = msg else {
            panic!("expected RowDescription, got {msg:?}")
        };
        assert_eq!(fields.len(), 2);
        assert_eq!(fields[0].name, "number");
        assert_eq!(fields[0].type_oid, 23);
        assert_eq!(fields[0].format, FormatCode::Binary);
        assert_eq!(fields[1].name, "english");
        assert_eq!(fields[1].type_oid, 1043);
        assert_eq!(fields[1].type_modifier, 15);
    }

    #[test]
    fn test_decode_data_row_with_null() {
        let mut body = Vec::new();
        body.put_i16(2);
        body.put_i32(4);
        body.extend_from_slice(&[0, 0, 0, 1]);
        body.put_i32(-1); // SQL NULL
        let buf = make_message(b'D', &body);
        let msg = decode_message(&buf).unwrap().unwrap();
        let BackendMessage::DataRow { values } = msg else {
            panic!("expected DataRow, got {msg:?}")
        };
        assert_eq!(values, vec![Some(vec![0, 0, 0, 1]), None]);
    }

    #[test]
    fn test_decode_command_complete() {
        let buf = make_message(b'C', b"SELECT 1\0");
        let msg = decode_message(&buf).unwrap().unwrap();
        let BackendMessage::CommandComplete { tag } = msg else {
            panic!("expected CommandComplete, got {msg:?}")
        };
        assert_eq!(tag, "SELECT 1");
    }

    #[test]
    fn test_decode_error_response() {
        let buf = make_message(b'E', b"SERROR\0C42P01\0Mrelation does not exist\0\0");
        let msg = decode_message(&buf).unwrap().unwrap();
        let BackendMessage::ErrorResponse(info) = msg else {
            panic!("expected ErrorResponse, got {msg:?}")
        };
        assert_eq!(info.severity(), Some("ERROR"));
        assert_eq!(info.sqlstate(), Some("42P01"));
        assert_eq!(info.message(), "relation does not exist");
        assert_eq!(
            info.to_string(),
            "ERROR: relation does not exist (42P01)"
        );
    }

    #[test]
    fn test_decode_extended_protocol_acks() {
        for (tag, want_parse, want_bind, want_nodata) in [
            (b'1', true, false, false),
            (b'2', false, true, false),
            (b'n', false, false, true),
        ] {
            let buf = make_message(tag, &[]);
            let msg = decode_message(&buf).unwrap().unwrap();
            assert_eq!(matches!(msg, BackendMessage::ParseComplete), want_parse);
            assert_eq!(matches!(msg, BackendMessage::BindComplete), want_bind);
            assert_eq!(matches!(msg, BackendMessage::NoData), want_nodata);
        }
    }

    #[test]
    fn test_decode_incomplete_frame_waits() {
        let buf = make_message(b'C', b"SELECT 1\0");
        // Everything but the last byte: not decodable yet
        let msg = decode_message(&buf[..buf.len() - 1]).unwrap();
        assert!(msg.is_none());
    }

    #[test]
    fn test_decode_eof() {
        let msg = decode_message(&[]).unwrap();
        assert!(msg.is_none());
    }

    #[test]
    fn test_decode_unknown_message_type() {
        let buf = make_message(b'?', &[]);
        let result = decode_message(&buf);
        assert!(matches!(result, Err(ProtocolError::UnknownMessageType(b'?'))));
    }

    #[test]
    fn test_decode_oversized_frame_rejected() {
        let mut codec = ClientCodec::new();
        codec.max_message_size = 16;
        let buf = make_message(b'C', &[b'x'; 32]);
        let mut bytes = BytesMut::from(&buf[..]);
        assert!(matches!(
            codec.decode(&mut bytes),
            Err(ProtocolError::MessageTooLarge(_))
        ));
    }
}
