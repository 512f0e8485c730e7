//! Bookplate Common Library
#![deny(clippy::unwrap_used, clippy::expect_used)]
//!
//! Shared error handling and logging for the bookplate workspace.
//!
//! # Overview
//!
//! - **Error Handling**: [`BookplateError`] and the [`Result`] alias used by
//!   every pipeline stage
//! - **Logging**: [`logging::LogConfig`] and [`logging::init_logging`]
//!
//! # Example
//!
//! ```no_run
//! use bookplate_common::{BookplateError, Result};
//!
//! fn require_dir(path: &std::path::Path) -> Result<()> {
//!     if !path.is_dir() {
//!         return Err(BookplateError::config(format!("not a directory: {}", path.display())));
//!     }
//!     Ok(())
//! }
//! ```

pub mod error;
pub mod logging;

// Re-export commonly used types
pub use error::{BookplateError, Result};
