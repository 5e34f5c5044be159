use bytes::{Buf, BufMut, BytesMut};

use crate::protocol::ProtocolError;

/// Maximum message size in bytes (16 MB).
/// PostgreSQL allows up to 1 GB, but 16 MB is plenty for this client.
pub const DEFAULT_MAX_MESSAGE_SIZE: usize = 16 * 1024 * 1024;

/// Read a null-terminated string from a BytesMut buffer.
/// Returns an error if no null terminator is found.
/// Returns the string (without the null terminator) if successful.
///
/// The search is bounded to keep a corrupt length field from forcing an
/// unbounded scan.
pub fn get_cstring(src: &mut BytesMut) -> Result<String, ProtocolError> {
    const MAX_CSTRING_LENGTH: usize = 64 * 1024; // 64KB limit

    let Some(null_pos) = src.iter().take(MAX_CSTRING_LENGTH).position(|&b| b == 0) else {
        return Err(ProtocolError::InvalidMessage);
    };

    let bytes = src.split_to(null_pos);
    src.advance(1);
    String::from_utf8(bytes.to_vec()).map_err(ProtocolError::InvalidUtf8)
}

/// Read a nullable byte array from a BytesMut buffer.
/// Returns an error if there's not enough data.
/// Returns None if the value is SQL NULL (length = -1).
/// Returns Some(Vec<u8>) if the value is present.
///
/// Wire format: Int32 length (-1 for NULL, >= 0 for data), followed by data
/// bytes if length >= 0
pub fn get_nullable_bytes(src: &mut BytesMut) -> Result<Option<Vec<u8>>, ProtocolError> {
    if src.len() < 4 {
        return Err(ProtocolError::InvalidMessage);
    }

    let len = src.get_i32();
    if len < 0 {
        // SQL NULL
        return Ok(None);
    }

    let len = len as usize;
    if src.len() < len {
        return Err(ProtocolError::InvalidMessage);
    }
    let bytes = src.split_to(len);
    Ok(Some(bytes.to_vec()))
}

/// Write a null-terminated string to a BytesMut buffer.
pub fn put_cstring(dst: &mut BytesMut, s: &str) {
    dst.put_slice(s.as_bytes());
    dst.put_u8(0);
}

/// Codec for the client side of the PostgreSQL protocol.
/// Encodes FrontendMessage (in frontend.rs) and decodes BackendMessage
/// (in backend.rs).
///
/// Backend messages are uniformly tagged, so a single codec covers both the
/// startup exchange and the query phase. The one untagged frame in the
/// protocol, the StartupMessage, is only ever encoded by this side.
pub struct ClientCodec {
    pub(crate) max_message_size: usize,
}

impl ClientCodec {
    /// Creates a new ClientCodec with the default maximum message size.
    pub fn new() -> Self {
        Self {
            max_message_size: DEFAULT_MAX_MESSAGE_SIZE,
        }
    }
}

impl Default for ClientCodec {
    fn default() -> Self {
        Self::new()
    }
}
