//! Bookplate Ingest Library
//!
//! Scans library catalog exports for records carrying bookplate (donor
//! acknowledgment) metadata.
//!
//! # Pipeline stages
//!
//! - **discovery**: find and order the `.tar.gz` exports
//! - **decompression**: unpack one export into a scoped MARC-XML file
//! - **marc**: read MARC-XML records
//! - **bookplate**: detect 996 $u bookplate data in a record
//! - **store**: merge bookplates into `{mms_id}.json` files
//! - **tracker**: per-run counts and timings
//! - **pipeline**: the orchestrator tying these together
//!
//! # Example
//!
//! ```no_run
//! use bookplate_ingest::{config::IngestConfig, pipeline::BookplatePipeline};
//!
//! fn main() -> anyhow::Result<()> {
//!     let config = IngestConfig::from_env()?;
//!     let report = BookplatePipeline::new(config).run()?;
//!     println!("{} bookplates found", report.bookplates.len());
//!     Ok(())
//! }
//! ```

pub mod bookplate;
pub mod config;
pub mod confirmation;
pub mod decompression;
pub mod discovery;
pub mod marc;
pub mod pipeline;
pub mod store;
pub mod tracker;

pub use bookplate::{extract_bookplate, BookplateData};
pub use pipeline::{BookplatePipeline, RunReport};
