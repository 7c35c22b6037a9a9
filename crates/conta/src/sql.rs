use crate::config::GeneratorConfig;

/// Statement text for the allocation protocol, built once from a validated
/// config. Table and column names are spliced in (they are checked to be
/// plain identifiers); row values always travel as bound parameters.
#[derive(Debug, Clone)]
pub struct Statements {
    /// `?1` = segment key.
    pub select: String,
    /// `?1` = segment key, `?2` = initial value. `ON CONFLICT DO NOTHING`
    /// so a first-allocation race reports zero affected rows instead of a
    /// primary-key violation, and the loser re-reads.
    pub insert: String,
    /// The compare-and-swap: `?1` = candidate, `?2` = observed value,
    /// `?3` = segment key. Zero affected rows means a concurrent allocator
    /// advanced the counter first.
    pub update: String,
}

impl Statements {
    pub fn build(config: &GeneratorConfig) -> Self {
        let table = &config.table;
        let segment = &config.segment_column;
        let value = &config.value_column;

        Statements {
            select: format!("SELECT {value} FROM {table} WHERE {segment} = ?1"),
            insert: format!(
                "INSERT INTO {table} ({segment}, {value}) VALUES (?1, ?2) ON CONFLICT DO NOTHING"
            ),
            update: format!(
                "UPDATE {table} SET {value} = ?1 WHERE {value} = ?2 AND {segment} = ?3"
            ),
        }
    }
}

/// Schema bootstrap for the counter table. The primary key on the segment
/// column is what the insert race resolution relies on.
pub fn bootstrap_ddl(config: &GeneratorConfig) -> String {
    format!(
        "CREATE TABLE IF NOT EXISTS {table} ({segment} VARCHAR({len}) PRIMARY KEY, {value} BIGINT NOT NULL)",
        table = config.table,
        segment = config.segment_column,
        len = config.segment_length,
        value = config.value_column,
    )
}
