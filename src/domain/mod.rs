//! Job-search domain exposed over REST and the MCP protocol
//!
//! Parameter validation, the operation dispatcher, and the MCP tool and
//! resource bindings built on top of it.

pub mod operations;
pub mod queries;
pub mod resources;
pub mod tools;
pub mod utils;
