//! SQL debug logging through `tracing`.

use crate::value::Value;
use tracing::Level;

/// Emits every statement and its arguments before execution.
///
/// Attached to a [`DbModel`](crate::DbModel) when `DB_DEBUG` is true, or
/// explicitly with [`DbModel::set_tracer`](crate::DbModel::set_tracer). Events go to
/// the `fluentdb.sql` target.
#[derive(Debug, Clone)]
pub struct SqlTracer {
    /// Tracing event level to emit at.
    pub level: Level,
    /// Truncate long SQL strings (in bytes). `None` means no truncation.
    pub max_sql_length: Option<usize>,
}

impl Default for SqlTracer {
    fn default() -> Self {
        Self {
            level: Level::INFO,
            max_sql_length: None,
        }
    }
}

impl SqlTracer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Override the tracing event level.
    pub fn level(mut self, level: Level) -> Self {
        self.level = level;
        self
    }

    /// Set maximum SQL length to display.
    pub fn max_sql_length(mut self, len: usize) -> Self {
        self.max_sql_length = Some(len);
        self
    }

    fn truncate_sql<'a>(&self, sql: &'a str) -> std::borrow::Cow<'a, str> {
        match self.max_sql_length {
            Some(max) if sql.len() > max => format!("{}...", truncate_sql_bytes(sql, max)).into(),
            _ => sql.into(),
        }
    }

    pub fn trace(&self, sql: &str, args: &[Value]) {
        macro_rules! emit_at_level {
            ($level:expr, $($field:tt)*) => {
                match $level {
                    Level::ERROR => tracing::error!($($field)*),
                    Level::WARN  => tracing::warn!($($field)*),
                    Level::INFO  => tracing::info!($($field)*),
                    Level::DEBUG => tracing::debug!($($field)*),
                    _ => tracing::trace!($($field)*),
                }
            };
        }

        let sql = self.truncate_sql(sql);
        emit_at_level!(
            self.level,
            target: "fluentdb.sql",
            param_count = args.len(),
            sql = %sql,
            args = ?args,
        );
    }
}

fn truncate_sql_bytes(sql: &str, max_bytes: usize) -> &str {
    if sql.len() <= max_bytes {
        return sql;
    }
    let mut end = max_bytes;
    while end > 0 && !sql.is_char_boundary(end) {
        end -= 1;
    }
    &sql[..end]
}
