//! PostgreSQL wire protocol, client side.
//!
//! This module implements the client half of the PostgreSQL v3.0 wire
//! protocol: encoding frontend messages and decoding backend messages.
//!
//! ## Architecture
//!
//! ```text
//! +-----------+                           +----------+
//! |  Client   |  --- FrontendMessage -->  |  Server  |
//! | (pgprobe) |  <-- BackendMessage  ---  |(postgres)|
//! +-----------+                           +----------+
//!                ^                   ^
//!                |    ClientCodec    |
//!                +-------------------+
//! ```
//!
//! ## Terminology
//!
//! - **FrontendMessage**: Messages from client to server (Startup, Query, Parse, ...)
//! - **BackendMessage**: Messages from server to client (RowDescription, DataRow, ...)
//! - **Codec**: Framing and serialization for the wire protocol

pub mod backend;
pub mod codec;
pub mod error;
pub mod frontend;
pub mod types;

pub use backend::{
    AuthenticationRequest, BackendMessage, ErrorField, ErrorInfo, FieldDescription,
    TransactionStatus,
};
pub use codec::ClientCodec;
pub use error::ProtocolError;
pub use frontend::{DescribeTarget, FrontendMessage, StartupParameters};
pub use types::{ErrorFieldCode, FormatCode, type_oid};
