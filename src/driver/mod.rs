//! Minimal synchronous ArangoDB driver over the HTTP REST API.
//!
//! [`ArangoClient`] owns the connection. Database and collection handles
//! borrow it, and query cursors stream results batch by batch.
mod client;
mod cursor;
mod database;
mod document;
mod error;
mod names;
#[cfg(test)]
mod test_server;

pub use client::{ArangoClient, ClientOptions};
pub use cursor::QueryOptions;
pub use database::BindVars;
pub use document::{display_value, tree_i64, tree_str, BaseDocument, RawDocument};
