pub mod client;
pub mod decode;
pub mod protocol;
pub mod schema;
