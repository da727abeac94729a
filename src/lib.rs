//! Markline: a per-user bookmark list kept consistent across sessions.
//!
//! Each session holds an in-memory list reconciled from three sources: the
//! initial load, the user's own optimistic add/delete actions, and a change
//! feed carrying mutations made by any session of the same user.
//!
//! This library crate exposes all modules for use by the binary and integration tests.

pub mod app;
pub mod database;
pub mod managers;
pub mod platform;
pub mod rpc_handler;
pub mod services;
pub mod types;
