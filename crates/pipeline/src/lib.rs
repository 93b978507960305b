//! The job import pipeline.
//!
//! [`Importer::import`] normalises the URL, fetches the page (escalating to a
//! headless browser for sites that need one), runs every signal extractor,
//! rejects pages that are not a single posting and writes a diagnostics dump
//! for every page it parsed.
//!
//! ```no_run
//! use jobimport_config::Config;
//! use jobimport_pipeline::{Importer, Mode};
//!
//! # async fn run() -> jobimport_pipeline::error::Result<()> {
//! let importer = Importer::from_config(&Config::default())?;
//! let record = importer.import("https://www.jobup.ch/fr/emplois/detail/1234/", Mode::Auto).await?;
//! for (key, value) in record.prefill() {
//!     println!("{key}: {value}");
//! }
//! # Ok(())
//! # }
//! ```

pub mod address;
mod dump;
pub mod error;
mod importer;

pub use crate::dump::{Dump, DumpHandle, DumpWriter, Excerpt, FileDumpWriter};
pub use crate::importer::{Importer, Mode};
pub use jobimport_extract::{Field, Record};
