//! Configuration types for metadata providers.
//!
//! Connection settings never carry passwords. Credentials stay inside the
//! connection string handed to the driver and are redacted everywhere else.

mod connection;

pub use connection::ConnectionConfig;
