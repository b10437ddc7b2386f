//! HTTP request handlers for the console API.
//!
//! This module is organized by domain:
//! - `common` - Shared response types and error helpers
//! - `servers` - Server CRUD and bulk import
//! - `maintenance` - Maintenance schedule CRUD and cancellation
//! - `dashboard` - Aggregated statistics and scheduler diagnostics

pub mod common;
pub mod dashboard;
pub mod maintenance;
pub mod servers;

// Re-export all public handler functions for convenience
pub use dashboard::*;
pub use maintenance::*;
pub use servers::*;
