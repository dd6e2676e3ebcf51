//! HTTP transport layer
//!
//! REST routes for each job-search operation alongside the `/mcp` JSON-RPC listener.

pub mod handlers;
