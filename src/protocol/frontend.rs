use bytes::{BufMut, BytesMut};
use tokio_util::codec::Encoder;

use crate::protocol::codec::{ClientCodec, put_cstring};
use crate::protocol::error::ProtocolError;
use crate::protocol::types::FormatCode;

/// Protocol version 3.0, the only version this client speaks.
pub const PROTOCOL_VERSION: i32 = 3 << 16;

/// Connection parameters sent in the startup message.
#[derive(Debug, Clone, Default)]
pub struct StartupParameters {
    pub user: String,
    pub database: Option<String>,
    pub application_name: Option<String>,
}

/// Target of a Describe or Close message in the Extended Query protocol.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DescribeTarget {
    /// 'S' - a prepared statement
    Statement,
    /// 'P' - a portal
    Portal,
}

impl DescribeTarget {
    fn as_byte(self) -> u8 {
        match self {
            DescribeTarget::Statement => b'S',
            DescribeTarget::Portal => b'P',
        }
    }
}

/// Messages sent by the frontend (this client) to the server.
#[derive(Debug)]
pub enum FrontendMessage {
    /// Untagged startup message opening the connection.
    Startup { parameters: StartupParameters },
    /// 'p' - Password response to an authentication request
    Password(String),
    /// 'Q' - Simple query
    Query(String),
    /// 'P' - Parse (Extended Query protocol)
    Parse {
        statement_name: String,
        query: String,
        param_types: Vec<i32>,
    },
    /// 'B' - Bind a prepared statement to a portal
    Bind {
        portal_name: String,
        statement_name: String,
        param_format_codes: Vec<FormatCode>,
        param_values: Vec<Option<Vec<u8>>>,
        result_format_codes: Vec<FormatCode>,
    },
    /// 'D' - Describe a statement or portal
    Describe {
        target: DescribeTarget,
        name: String,
    },
    /// 'E' - Execute a portal
    Execute { portal_name: String, max_rows: i32 },
    /// 'S' - Sync (end of an extended-query pipeline)
    Sync,
    /// 'X' - Termination
    Terminate,
}

/// Overwrites the 4-byte length placeholder at `len_pos` with the number of
/// bytes written from `len_pos` to the end of the buffer. The length field
/// counts itself but not the tag byte, per the protocol.
fn patch_length(dst: &mut BytesMut, len_pos: usize) {
    let len = (dst.len() - len_pos) as i32;
    dst[len_pos..len_pos + 4].copy_from_slice(&len.to_be_bytes());
}

impl Encoder<FrontendMessage> for ClientCodec {
    type Error = ProtocolError;

    fn encode(&mut self, item: FrontendMessage, dst: &mut BytesMut) -> Result<(), ProtocolError> {
        match item {
            FrontendMessage::Startup { parameters } => {
                let len_pos = dst.len();
                dst.put_i32(0); // length, patched below
                dst.put_i32(PROTOCOL_VERSION);
                put_cstring(dst, "user");
                put_cstring(dst, &parameters.user);
                if let Some(database) = &parameters.database {
                    put_cstring(dst, "database");
                    put_cstring(dst, database);
                }
                if let Some(application_name) = &parameters.application_name {
                    put_cstring(dst, "application_name");
                    put_cstring(dst, application_name);
                }
                dst.put_u8(0); // terminator
                patch_length(dst, len_pos);
            }
            FrontendMessage::Password(password) => {
                dst.put_u8(b'p');
                let len_pos = dst.len();
                dst.put_i32(0);
                put_cstring(dst, &password);
                patch_length(dst, len_pos);
            }
            FrontendMessage::Query(query) => {
                dst.put_u8(b'Q');
                let len_pos = dst.len();
                dst.put_i32(0);
                put_cstring(dst, &query);
                patch_length(dst, len_pos);
            }
            FrontendMessage::Parse {
                statement_name,
                query,
                param_types,
            } => {
                dst.put_u8(b'P');
                let len_pos = dst.len();
                dst.put_i32(0);
                put_cstring(dst, &statement_name);
                put_cstring(dst, &query);
                dst.put_i16(param_types.len() as i16);
                for oid in &param_types {
                    dst.put_i32(*oid);
                }
                patch_length(dst, len_pos);
            }
            FrontendMessage::Bind {
                portal_name,
                statement_name,
                param_format_codes,
                param_values,
                result_format_codes,
            } => {
                dst.put_u8(b'B');
                let len_pos = dst.len();
                dst.put_i32(0);
                put_cstring(dst, &portal_name);
                put_cstring(dst, &statement_name);
                dst.put_i16(param_format_codes.len() as i16);
                for code in &param_format_codes {
                    dst.put_i16(code.as_i16());
                }
                dst.put_i16(param_values.len() as i16);
                for value in &param_values {
                    match value {
                        None => dst.put_i32(-1), // SQL NULL
                        Some(bytes) => {
                            dst.put_i32(bytes.len() as i32);
                            dst.put_slice(bytes);
                        }
                    }
                }
                dst.put_i16(result_format_codes.len() as i16);
                for code in &result_format_codes {
                    dst.put_i16(code.as_i16());
                }
                patch_length(dst, len_pos);
            }
            FrontendMessage::Describe { target, name } => {
                dst.put_u8(b'D');
                let len_pos = dst.len();
                dst.put_i32(0);
                dst.put_u8(target.as_byte());
                put_cstring(dst, &name);
                patch_length(dst, len_pos);
            }
            FrontendMessage::Execute {
                portal_name,
                max_rows,
            } => {
                dst.put_u8(b'E');
                let len_pos = dst.len();
                dst.put_i32(0);
                put_cstring(dst, &portal_name);
                dst.put_i32(max_rows);
                patch_length(dst, len_pos);
            }
            FrontendMessage::Sync => {
                dst.put_u8(b'S');
                dst.put_i32(4);
            }
            FrontendMessage::Terminate => {
                dst.put_u8(b'X');
                dst.put_i32(4);
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Helper to encode a single message into a byte vector.
    fn encode_message(msg: FrontendMessage) -> Vec<u8> {
        let mut codec = ClientCodec::new();
        let mut buf = BytesMut::new();
        codec.encode(msg, &mut buf).unwrap();
        buf.to_vec()
    }

    #[test]
    fn test_encode_startup() {
        let buf = encode_message(FrontendMessage::Startup {
            parameters: StartupParameters {
                user: "postgres".to_string(),
                database: Some("testdb".to_string()),
                application_name: None,
            },
        });

        // length(4) + version(4) + "user\0postgres\0" + "database\0testdb\0" + terminator
        let expected_len = 4 + 4 + 14 + 16 + 1;
        assert_eq!(&buf[0..4], &(expected_len as i32).to_be_bytes());
        assert_eq!(&buf[4..8], &PROTOCOL_VERSION.to_be_bytes());
        assert_eq!(&buf[8..], b"user\0postgres\0database\0testdb\0\0");
    }

    #[test]
    fn test_encode_query() {
        let buf = encode_message(FrontendMessage::Query("SELECT 1".to_string()));
        assert_eq!(buf[0], b'Q');
        assert_eq!(&buf[1..5], &[0, 0, 0, 13]); // 4 + "SELECT 1\0"
        assert_eq!(&buf[5..], b"SELECT 1\0");
    }

    #[test]
    fn test_encode_password() {
        let buf = encode_message(FrontendMessage::Password("secret".to_string()));
        assert_eq!(buf[0], b'p');
        assert_eq!(&buf[1..5], &[0, 0, 0, 11]);
        assert_eq!(&buf[5..], b"secret\0");
    }

    #[test]
    fn test_encode_parse_no_params() {
        let buf = encode_message(FrontendMessage::Parse {
            statement_name: String::new(),
            query: "SELECT 1".to_string(),
            param_types: vec![],
        });
        assert_eq!(buf[0], b'P');
        // 4 + "\0" + "SELECT 1\0" + i16 param count
        assert_eq!(&buf[1..5], &[0, 0, 0, 16]);
        assert_eq!(&buf[5..], b"\0SELECT 1\0\x00\x00");
    }

    #[test]
    fn test_encode_bind_binary_results() {
        let buf = encode_message(FrontendMessage::Bind {
            portal_name: String::new(),
            statement_name: String::new(),
            param_format_codes: vec![],
            param_values: vec![],
            result_format_codes: vec![FormatCode::Binary],
        });
        assert_eq!(buf[0], b'B');
        // 4 + "\0" + "\0" + i16(0) + i16(0) + i16(1) + i16(1)
        assert_eq!(&buf[1..5], &[0, 0, 0, 14]);
        assert_eq!(&buf[5..], &[0, 0, 0, 0, 0, 0, 0, 0, 1, 0, 1][..]);
    }

    #[test]
    fn test_encode_describe_portal() {
        let buf = encode_message(FrontendMessage::Describe {
            target: DescribeTarget::Portal,
            name: String::new(),
        });
        assert_eq!(buf, vec![b'D', 0, 0, 0, 6, b'P', 0]);
    }

    #[test]
    fn test_encode_execute() {
        let buf = encode_message(FrontendMessage::Execute {
            portal_name: String::new(),
            max_rows: 0,
        });
        assert_eq!(buf, vec![b'E', 0, 0, 0, 9, 0, 0, 0, 0, 0]);
    }

    #[test]
    fn test_encode_sync() {
        assert_eq!(encode_message(FrontendMessage::Sync), vec![b'S', 0, 0, 0, 4]);
    }

    #[test]
    fn test_encode_terminate() {
        assert_eq!(
            encode_message(FrontendMessage::Terminate),
            vec![b'X', 0, 0, 0, 4]
        );
    }
}
