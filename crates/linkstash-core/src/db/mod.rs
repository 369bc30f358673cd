//! Database layer for LinkStash

mod connection;
mod migrations;
mod repository;

pub use connection::Database;
pub use repository::LibSqlBookmarkRepository;
