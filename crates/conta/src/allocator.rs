use std::sync::atomic::{AtomicU64, Ordering};

use crate::config::GeneratorConfig;
use crate::db::ExecutionContext;
use crate::error::{ContaError, Result};
use crate::optimizer::{self, Optimizer, OptimizerKind};
use crate::sql::Statements;

/// Maps a segment key to a persistent, monotonically advancing counter.
///
/// The stored value is advanced with an optimistic compare-and-swap:
/// read the current value, then `UPDATE ... WHERE value = <observed>`.
/// Zero affected rows means a concurrent allocator won the race for this
/// segment, and the attempt restarts from a fresh read. The predicate on
/// the observed value is what prevents lost updates, so correctness does
/// not depend on the backing store providing serializable transactions or
/// row locks.
pub struct SegmentAllocator {
    statements: Statements,
    initial_value: i64,
    max_retries: u32,
    optimizer: Box<dyn Optimizer>,
    round_trips: AtomicU64,
}

impl SegmentAllocator {
    pub fn new(config: &GeneratorConfig) -> Result<Self> {
        config.validate()?;
        Ok(SegmentAllocator {
            statements: Statements::build(config),
            initial_value: config.initial_value,
            max_retries: config.max_retries,
            optimizer: optimizer::build(config.optimizer_kind(), config.increment_size),
            round_trips: AtomicU64::new(0),
        })
    }

    /// The strategy in effect, so callers can assert gap-free vs.
    /// gap-tolerant behavior.
    pub fn optimizer_kind(&self) -> OptimizerKind {
        self.optimizer.kind()
    }

    /// Storage round-trips performed so far. Diagnostic only.
    pub fn store_round_trips(&self) -> u64 {
        self.round_trips.load(Ordering::Relaxed)
    }

    /// Returns the next value for `segment_key`, durably reserving it so
    /// no concurrent caller is ever handed the same value.
    pub fn allocate(&self, ctx: &dyn ExecutionContext, segment_key: &str) -> Result<i64> {
        if segment_key.is_empty() {
            return Err(ContaError::InvalidSegmentKey);
        }
        self.optimizer
            .generate(segment_key, &mut || self.next_from_store(ctx, segment_key))
    }

    /// One storage round-trip of the read-initialize-update protocol.
    /// Returns the pre-increment stored value; the store moves on by the
    /// optimizer's step.
    fn next_from_store(&self, ctx: &dyn ExecutionContext, segment_key: &str) -> Result<i64> {
        let step = self.optimizer.stored_step();

        for attempt in 1..=self.max_retries {
            let current = match ctx.query_value(&self.statements.select, segment_key)? {
                Some(value) => value,
                None => {
                    let inserted = ctx.execute(
                        &self.statements.insert,
                        rusqlite::params![segment_key, self.initial_value],
                    )?;
                    if inserted == 0 {
                        // another allocator created the row first; re-read
                        tracing::debug!(segment_key, attempt, "lost initialization race");
                        continue;
                    }
                    self.initial_value
                }
            };

            let candidate = current + step;
            let updated = ctx.execute(
                &self.statements.update,
                rusqlite::params![candidate, current, segment_key],
            )?;
            if updated == 1 {
                self.round_trips.fetch_add(1, Ordering::Relaxed);
                return Ok(current);
            }
            tracing::debug!(segment_key, attempt, observed = current, "lost update race");
        }

        Err(ContaError::Contention {
            segment: segment_key.to_string(),
            attempts: self.max_retries,
        })
    }
}
