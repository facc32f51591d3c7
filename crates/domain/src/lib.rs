//! # Pagerline Domain
//!
//! Data types shared by every layer of the Pagerline API client.
//!
//! This crate contains:
//! - Credentials and the on-disk token representation
//! - Pagination envelope and list options
//! - The shared API object reference and webhook event payloads
//! - Client configuration structures and constants
//! - The domain error type and Result alias
//!
//! ## Architecture
//! - No dependencies on other Pagerline crates
//! - Only external dependencies allowed
//! - Pure data structures, no I/O

pub mod config;
pub mod constants;
pub mod errors;
pub mod types;

// Re-export commonly used items
pub use config::*;
pub use errors::*;
pub use types::*;
