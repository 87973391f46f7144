//! Converts text lines to arrow record batches.
//!
//! The named capture groups of a regex define the columns; every matching
//! line becomes one row of `Utf8` values.
//!
//! ```
//! use regex::Regex;
//! use rs_lines2arrow_ipc::{BatchAccumulator, BuilderConfig, LineMatcher, derive_schema};
//!
//! let re = Regex::new(r"(?P<a>\w+)-(?P<b>\d+)").unwrap();
//! let schema = derive_schema(&re).unwrap();
//! let mut matcher = LineMatcher::new(re).unwrap();
//! let mut acc = BatchAccumulator::new(schema, 2, BuilderConfig::default());
//!
//! for line in ["foo-1", "nope", "bar-2"] {
//!     if let Some(row) = matcher.match_line(line) {
//!         acc.append(&row);
//!     }
//! }
//! assert!(acc.should_flush());
//! assert_eq!(acc.finalize().unwrap().num_rows(), 2);
//! ```

pub mod batch;
pub mod error;
pub mod ingest;
pub mod matcher;
pub mod pattern;
pub mod schema;

pub use batch::{AsText, BatchAccumulator, BuilderConfig};
pub use error::{Error, SchemaError};
pub use ingest::{
    IngestOptions, IngestStats, Lines2BatchIter, batches2ipc_file, lines2batch_iter,
    reader2byte_lines, reader2lines,
};
pub use matcher::{LineMatcher, parse_line};
pub use pattern::Pattern;
pub use schema::{derive_schema, describe_schema, named_groups};
