//! Markline database layer.
//!
//! Provides SQLite connection management and schema migrations for the
//! durable bookmark table.
//!
//! # Usage
//!
//! ```no_run
//! use markline::database::Database;
//!
//! let db = Database::open("markline.db").expect("failed to open database");
//! let conn = db.connection();
//! ```

pub mod connection;
pub mod migrations;

pub use connection::Database;
