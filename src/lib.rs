//! # tsz
//!
//! A streaming decoder for TSZ-compressed time-series datapoint streams, a
//! member of the Gorilla compression family (*"Gorilla: A Fast, Scalable,
//! In-Memory Time Series Database"*, VLDB 2015) extended with in-band
//! markers for annotations, time-unit changes, and end-of-stream.
//!
//! ## Format overview
//!
//! - **Timestamps** travel as delta-of-delta: the second difference of
//!   consecutive instants, normalized to the stream's active time unit and
//!   prefix-coded per unit, so regular cadences cost a single bit per point.
//! - **Values** (IEEE 754 doubles) travel XOR-compressed: only the
//!   meaningful middle window of the XOR with the previous value is stored,
//!   and the window bounds themselves are reused across records.
//! - **Markers** share the bit stream under a reserved opcode prefix that
//!   no data encoding starts with. They attach an opaque annotation to the
//!   next datapoint, switch the active time unit mid-stream, or terminate
//!   the stream.
//!
//! ## Example
//!
//! ```rust
//! use std::io::Cursor;
//! use tsz::{BitWriter, Options, ReaderIterator, TimeUnit};
//!
//! // A one-point stream: start instant, delta-of-delta 0, raw value bits,
//! // end-of-stream marker.
//! let mut w = BitWriter::new();
//! w.write_bits(1_609_459_200_000_000_000, 64);
//! w.write_bit(false);
//! w.write_bits(1.5f64.to_bits(), 64);
//! w.write_bits(0b1_0000_0000, 9);
//! w.write_bits(0, 2);
//!
//! let mut it = ReaderIterator::new(Cursor::new(w.into_bytes()), Options::default());
//! assert!(it.next());
//! let (dp, unit, annotation) = it.current();
//! assert_eq!(dp.timestamp, 1_609_459_200_000_000_000);
//! assert_eq!(dp.value, 1.5);
//! assert_eq!(unit, TimeUnit::Second);
//! assert!(annotation.is_none());
//! assert!(!it.next());
//! assert!(it.err().is_none());
//! ```
//!
//! Iteration is single-threaded within one iterator; separate iterators
//! over separate readers run concurrently without coordination, sharing the
//! read-only scheme tables in [`Options`]. For workloads decoding many
//! short streams, [`ReaderIteratorPool`] recycles closed iterators.

pub mod bitstream;
pub mod decoder;
pub mod error;
pub mod options;
pub mod pool;
pub mod scheme;
pub mod time;

// Re-export primary types at the crate root.
pub use bitstream::{BitReader, BitWriter};
pub use decoder::{Datapoint, ReaderIterator};
pub use error::DecodeError;
pub use options::Options;
pub use pool::ReaderIteratorPool;
pub use scheme::{Bucket, MarkerEncodingScheme, TimeEncodingScheme, TimeEncodingSchemes};
pub use time::TimeUnit;
