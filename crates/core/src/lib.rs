//! Domain logic for the script gateway: principals, the authorization
//! registry, tenant-scoped script storage and process-isolated execution.
//!
//! Nothing in this crate knows about HTTP or the chat transport.

pub mod config;
pub mod error;
pub mod registry;
pub mod scripting;
pub mod store;
pub mod types;
