pub use self::connection::{Connection, ConnectionState};
mod connection;

pub use self::builder::ConnectionBuilder;
mod builder;

#[cfg(feature = "tokio")]
pub mod transport;
