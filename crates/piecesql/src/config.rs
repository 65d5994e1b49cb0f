use crate::grammar::Dialect;

/// Configuration shared by every query built on a connection.
///
/// By default queries are prepared (values become named parameters) and SQL
/// logging is enabled with truncation at 200 bytes.
#[derive(Debug, Clone)]
pub struct QueryConfig {
    /// Bind values as named parameters (`true`) or quote them inline (`false`).
    pub prepared: bool,
    /// Engine whose grammar is used for escaping.
    pub dialect: Dialect,
    /// Emit the rendered SQL before execution (requires the `tracing` feature).
    pub log_sql: bool,
    /// Truncate logged SQL (in bytes). `None` means no truncation.
    pub max_logged_sql_length: Option<usize>,
    /// Level of the emitted SQL event.
    #[cfg(feature = "tracing")]
    pub log_level: tracing::Level,
}

impl Default for QueryConfig {
    fn default() -> Self {
        Self {
            prepared: true,
            dialect: Dialect::default(),
            log_sql: true,
            max_logged_sql_length: Some(200),
            #[cfg(feature = "tracing")]
            log_level: tracing::Level::DEBUG,
        }
    }
}

impl QueryConfig {
    /// Create a new configuration with defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Select the SQL dialect.
    pub fn dialect(mut self, dialect: Dialect) -> Self {
        self.dialect = dialect;
        self
    }

    /// Switch between prepared (named parameters) and unprepared (inline literals) mode.
    pub fn prepared(mut self, prepared: bool) -> Self {
        self.prepared = prepared;
        self
    }

    /// Quote values inline instead of binding them.
    pub fn unprepared(self) -> Self {
        self.prepared(false)
    }

    /// Enable or disable SQL logging.
    pub fn log_sql(mut self, enabled: bool) -> Self {
        self.log_sql = enabled;
        self
    }

    /// Set maximum logged SQL length.
    pub fn max_logged_sql_length(mut self, len: usize) -> Self {
        self.max_logged_sql_length = Some(len);
        self
    }

    /// Override the level SQL events are emitted at.
    #[cfg(feature = "tracing")]
    pub fn log_level(mut self, level: tracing::Level) -> Self {
        self.log_level = level;
        self
    }

    /// Disable SQL truncation in logs.
    pub fn no_truncate(mut self) -> Self {
        self.max_logged_sql_length = None;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_prepared_postgres() {
        let config = QueryConfig::new();
        assert!(config.prepared);
        assert_eq!(config.dialect, Dialect::Postgres);
        assert_eq!(config.max_logged_sql_length, Some(200));
    }

    #[test]
    fn builder_methods_chain() {
        let config = QueryConfig::new()
            .dialect(Dialect::MySql)
            .unprepared()
            .no_truncate();
        assert!(!config.prepared);
        assert_eq!(config.dialect, Dialect::MySql);
        assert_eq!(config.max_logged_sql_length, None);
    }
}
