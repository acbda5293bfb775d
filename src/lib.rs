//! RDS (Radio Data System) group decoder.
//!
//! Turns a demodulated RDS bit stream into structured records:
//! - Block synchronization and burst-error correction over the (26,16)
//!   shortened cyclic code ([`block_sync`])
//! - Group assembly with C′-based version detection ([`group`])
//! - Per-station accumulation of PS, RadioText, clock time, alternative
//!   frequencies, RadioText+, EON, ODA and TMC ([`station`], [`tmc`])
//! - One ordered JSON record per decoded group ([`output`])
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use fmrds::{EventCatalog, JsonLinesSink, Options, Pipeline};
//!
//! let options = Options::default();
//! let mut pipeline = Pipeline::new(&options, 0, Arc::new(EventCatalog::new()));
//! let mut sink = JsonLinesSink::new(std::io::stdout());
//!
//! for bit in [true, false, true] {
//!     pipeline.push_bit(bit, &mut sink);
//! }
//! ```

pub mod altfreq;
pub mod block_sync;
pub mod error;
pub mod group;
pub mod options;
pub mod output;
pub mod pipeline;
pub mod rdsstring;
pub mod station;
pub mod tables;
pub mod tmc;
pub mod util;

// Re-export the main types for convenience
pub use block_sync::BlockStream;
pub use error::{Error, Result};
pub use group::{Group, GroupType};
pub use options::Options;
pub use output::{JsonLinesSink, Record, RecordSink, VecSink};
pub use pipeline::Pipeline;
pub use station::Station;
pub use tmc::EventCatalog;
