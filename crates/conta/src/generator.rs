use crate::allocator::SegmentAllocator;
use crate::config::GeneratorConfig;
use crate::db::ExecutionContext;
use crate::error::{ContaError, Result};
use crate::format::NumberFormat;

/// Produces rendered identifiers like `INV-00001`.
///
/// The segment key handed to the allocator is
/// `<discriminator><grouping prefix>`, and the rendered identifier uses
/// the prefix alone. With the default empty discriminator, any two
/// callers reporting the same prefix draw from one shared counter series,
/// so identifiers for one entity class need not be contiguous when classes
/// share a prefix.
pub struct PrefixedIdGenerator {
    allocator: SegmentAllocator,
    format: NumberFormat,
    discriminator: String,
}

impl PrefixedIdGenerator {
    pub fn new(config: GeneratorConfig) -> Result<Self> {
        let format = config.parsed_format()?;
        let allocator = SegmentAllocator::new(&config)?;
        Ok(PrefixedIdGenerator {
            allocator,
            format,
            discriminator: config.discriminator,
        })
    }

    /// Allocates the next value for `group_prefix` and renders the full
    /// identifier.
    pub fn generate(&self, ctx: &dyn ExecutionContext, group_prefix: &str) -> Result<String> {
        let raw = self.next_raw(ctx, group_prefix)?;
        Ok(self.format.render_id(group_prefix, raw))
    }

    /// Same as [`generate`](Self::generate), with the grouping prefix
    /// supplied by a caller-provided capability instead of a plain string.
    pub fn generate_with<F>(&self, ctx: &dyn ExecutionContext, provider: F) -> Result<String>
    where
        F: FnOnce() -> String,
    {
        let prefix = provider();
        self.generate(ctx, &prefix)
    }

    /// The raw counter value, for callers that format elsewhere.
    pub fn next_raw(&self, ctx: &dyn ExecutionContext, group_prefix: &str) -> Result<i64> {
        if group_prefix.is_empty() {
            return Err(ContaError::InvalidSegmentKey);
        }
        let segment_key = format!("{}{}", self.discriminator, group_prefix);
        self.allocator.allocate(ctx, &segment_key)
    }

    pub fn allocator(&self) -> &SegmentAllocator {
        &self.allocator
    }
}
