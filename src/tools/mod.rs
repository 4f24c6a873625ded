//! PrediCare Tools module
//!
//! Tool implementations behind the MCP server. Each returns
//! `Result<T, String>` with a message suitable for the caller.

pub mod activities;
pub mod charts;
pub mod export;
pub mod meals;
pub mod profile;
pub mod stats;
pub mod status;
pub mod weights;
