#![deny(missing_docs)]
//! # lacquer-mcp — MCP tool provider (C8)
//!
//! [`McpToolProvider`] connects to (or launches) an MCP endpoint, discovers
//! its tools, and implements [`lacquer_tool::ToolProvider`] so those tools
//! dispatch through the same registry as script and native tools.
//! Authentication is one of [`AuthMode`]'s four modes; the OAuth2
//! client-credentials mode refreshes its bearer token proactively through
//! [`TokenCache`].

mod auth;
mod client;
mod error;

pub use auth::{AuthMode, TokenCache};
pub use client::McpToolProvider;
pub use error::McpError;
