//! Prefixed, human-readable sequence identifiers (`INV-00001`,
//! `MAN-00042`) backed by a durable counter table in SQLite.
//!
//! Each identifier series is one *segment*: a row keyed by the segment
//! name holding the current counter value. Allocation reads the row
//! (creating it on first use), then advances it with a conditional update
//! that only fires if the value is still the one observed — a
//! compare-and-swap over SQL. Losers of that race retry against the fresh
//! value, so concurrent callers across threads and processes never see
//! the same number for the same segment.
//!
//! The [`optimizer`] strategy decides how many values a storage
//! round-trip reserves: [`OptimizerKind::Direct`] hits the store on every
//! allocation and is gap-free; [`OptimizerKind::Pooled`] reserves blocks
//! and serves them from memory, trading possible gaps (abandoned block
//! remainders) for fewer round-trips.
//!
//! [`PrefixedIdGenerator`] sits on top and turns grouping prefixes into
//! rendered identifiers; [`SegmentAllocator`] is the raw counter if you
//! only want integers.

pub mod allocator;
pub mod config;
pub mod db;
pub mod error;
pub mod format;
pub mod generator;
pub mod optimizer;
pub mod output;
pub mod sql;

pub use allocator::SegmentAllocator;
pub use config::GeneratorConfig;
pub use db::ExecutionContext;
pub use error::{ContaError, Result};
pub use format::NumberFormat;
pub use generator::PrefixedIdGenerator;
pub use optimizer::OptimizerKind;
