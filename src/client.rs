//! PostgreSQL client session layer.
//!
//! Sits between the wire protocol ([`crate::protocol`]) and the
//! application: [`Client`] establishes one session, runs one statement at a
//! time, and hands back either a [`ResultSet`] or a structured
//! [`ExecOutcome`] describing why no rows came back.

mod error;
mod result;
mod session;

pub use error::ClientError;
pub use result::ResultSet;
pub use session::{Client, ConnectParams, ExecOutcome};
