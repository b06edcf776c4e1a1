pub mod connection;
pub mod documents;
pub mod models;
pub mod redis;
pub mod users;
pub mod verifications;

pub use connection::DbClient;
