use crate::error::{ContaError, Result};
use crate::format::NumberFormat;
use crate::optimizer::OptimizerKind;

pub const DEFAULT_TABLE: &str = "conta_sequences";
pub const DEFAULT_SEGMENT_COLUMN: &str = "sequence_name";
pub const DEFAULT_VALUE_COLUMN: &str = "next_val";
pub const DEFAULT_SEGMENT_LENGTH: usize = 255;
pub const DEFAULT_INITIAL_VALUE: i64 = 1;
pub const DEFAULT_INCREMENT_SIZE: i64 = 1;
pub const DEFAULT_NUMBER_FORMAT: &str = "%05d";
pub const DEFAULT_MAX_RETRIES: u32 = 64;

/// Configuration for a generator and its underlying counter table.
///
/// All options are fixed at construction time; nothing here is consulted
/// per allocation.
#[derive(Debug, Clone)]
pub struct GeneratorConfig {
    /// Name of the table holding one counter row per segment.
    pub table: String,
    /// Column holding the segment key. Acts as the primary key.
    pub segment_column: String,
    /// Declared length of the segment column. Schema bootstrap only.
    pub segment_length: usize,
    /// Column holding the current counter value.
    pub value_column: String,
    /// Stored value for a newly seen segment.
    pub initial_value: i64,
    /// Values reserved per storage round-trip. 1 means every allocation
    /// hits the store.
    pub increment_size: i64,
    /// Explicit strategy choice. `None` derives it from the increment size.
    pub optimizer: Option<OptimizerKind>,
    /// printf-style display format for the numeric suffix, e.g. `%05d`.
    pub number_format: String,
    /// Per-entity-class segment discriminator, prepended to the grouping
    /// prefix to form the segment key. Defaults to empty, so distinct
    /// entity classes reporting the same prefix share one counter series
    /// (their identifiers interleave). That sharing is documented,
    /// caller-visible behavior.
    pub discriminator: String,
    /// Cap on compare-and-swap retries before giving up on a segment.
    pub max_retries: u32,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        GeneratorConfig {
            table: DEFAULT_TABLE.to_string(),
            segment_column: DEFAULT_SEGMENT_COLUMN.to_string(),
            segment_length: DEFAULT_SEGMENT_LENGTH,
            value_column: DEFAULT_VALUE_COLUMN.to_string(),
            initial_value: DEFAULT_INITIAL_VALUE,
            increment_size: DEFAULT_INCREMENT_SIZE,
            optimizer: None,
            number_format: DEFAULT_NUMBER_FORMAT.to_string(),
            discriminator: String::new(),
            max_retries: DEFAULT_MAX_RETRIES,
        }
    }
}

impl GeneratorConfig {
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn table(mut self, name: impl Into<String>) -> Self {
        self.table = name.into();
        self
    }

    #[must_use]
    pub fn segment_column(mut self, name: impl Into<String>) -> Self {
        self.segment_column = name.into();
        self
    }

    #[must_use]
    pub fn segment_length(mut self, length: usize) -> Self {
        self.segment_length = length;
        self
    }

    #[must_use]
    pub fn value_column(mut self, name: impl Into<String>) -> Self {
        self.value_column = name.into();
        self
    }

    #[must_use]
    pub fn initial_value(mut self, value: i64) -> Self {
        self.initial_value = value;
        self
    }

    #[must_use]
    pub fn increment_size(mut self, size: i64) -> Self {
        self.increment_size = size;
        self
    }

    #[must_use]
    pub fn optimizer(mut self, kind: OptimizerKind) -> Self {
        self.optimizer = Some(kind);
        self
    }

    #[must_use]
    pub fn number_format(mut self, spec: impl Into<String>) -> Self {
        self.number_format = spec.into();
        self
    }

    #[must_use]
    pub fn discriminator(mut self, discriminator: impl Into<String>) -> Self {
        self.discriminator = discriminator.into();
        self
    }

    #[must_use]
    pub fn max_retries(mut self, cap: u32) -> Self {
        self.max_retries = cap;
        self
    }

    /// The strategy in effect: an explicit choice wins, otherwise an
    /// increment size above 1 implies the pooled strategy.
    pub fn optimizer_kind(&self) -> OptimizerKind {
        self.optimizer.unwrap_or(if self.increment_size > 1 {
            OptimizerKind::Pooled
        } else {
            OptimizerKind::Direct
        })
    }

    pub fn parsed_format(&self) -> Result<NumberFormat> {
        NumberFormat::parse(&self.number_format)
    }

    /// Rejects anything that would produce broken SQL or a broken
    /// allocation protocol. Table and column names are spliced into
    /// statement text, so they must be plain identifiers.
    pub fn validate(&self) -> Result<()> {
        for (what, name) in [
            ("table name", &self.table),
            ("segment column name", &self.segment_column),
            ("value column name", &self.value_column),
        ] {
            if !is_sql_identifier(name) {
                return Err(ContaError::Config(format!(
                    "{what} {name:?} is not a plain SQL identifier"
                )));
            }
        }
        if self.segment_column == self.value_column {
            return Err(ContaError::Config(
                "segment column and value column must differ".to_string(),
            ));
        }
        if self.segment_length == 0 {
            return Err(ContaError::Config(
                "segment column length must be at least 1".to_string(),
            ));
        }
        if self.increment_size < 1 {
            return Err(ContaError::Config(format!(
                "increment size must be at least 1, got {}",
                self.increment_size
            )));
        }
        if self.max_retries == 0 {
            return Err(ContaError::Config(
                "retry cap must be at least 1".to_string(),
            ));
        }
        self.parsed_format()?;
        Ok(())
    }
}

fn is_sql_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}
