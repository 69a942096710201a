use crate::{CompiledStatement, Connection, Error, KeyRow, Result, Rows, Value};
use std::{
    collections::BTreeMap,
    fmt::{self, Display},
};

/// Whether an update-mode execution reports the generated row id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum GeneratedKeys {
    #[default]
    None,
    Return,
}

/// Per-statement configuration, fixed at construction.
#[derive(Debug, Clone, Copy, Default)]
pub struct StatementOptions {
    pub generated_keys: GeneratedKeys,
    /// Log every bound value at debug level.
    pub log_bindings: bool,
}

impl StatementOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn returning_generated_keys(mut self) -> Self {
        self.generated_keys = GeneratedKeys::Return;
        self
    }

    pub fn logging_bindings(mut self) -> Self {
        self.log_bindings = true;
        self
    }
}

/// A compiled SQL statement with positional parameter slots.
///
/// Slots are 1-indexed and dense up to the placeholder count; binding an
/// index twice overwrites the earlier value, and [`clear_parameters`] resets
/// every slot while keeping the compiled form valid, so the statement can be
/// rebound and executed any number of times. Each bind is pushed eagerly into
/// the native handle and shadowed in an ordered slot map used for
/// diagnostics and for replaying the query path.
///
/// Three execute entry points cover the three execution modes: [`execute`]
/// for statements with neither rows nor keys, [`execute_query`] for
/// row-returning queries and [`execute_update`] for updates (reporting either
/// the affected row count or, when requested at construction, the generated
/// key). The SQL text is fixed at compile time; the `*_sql` variants always
/// fail with [`Error::Unsupported`].
///
/// [`clear_parameters`]: Self::clear_parameters
/// [`execute`]: Self::execute
/// [`execute_query`]: Self::execute_query
/// [`execute_update`]: Self::execute_update
pub struct PreparedStatement<'c> {
    connection: &'c Connection,
    sql: String,
    statement: CompiledStatement,
    options: StatementOptions,
    /// Shadow of the native bindings, ordered by slot index.
    slots: BTreeMap<usize, Value>,
    result: Option<Rows<'c>>,
    update_count: u64,
    closed: bool,
}

impl<'c> PreparedStatement<'c> {
    pub(crate) fn new(
        connection: &'c Connection,
        sql: &str,
        statement: CompiledStatement,
        options: StatementOptions,
    ) -> Self {
        Self {
            connection,
            sql: sql.into(),
            statement,
            options,
            slots: BTreeMap::new(),
            result: None,
            update_count: 0,
            closed: false,
        }
    }

    fn ensure_open(&self) -> Result<()> {
        if self.closed {
            return Err(Error::Closed);
        }
        Ok(())
    }

    fn record(&mut self, index: usize, value: Value) {
        if self.options.log_bindings {
            log::debug!("Bound ?{} = {} in `{}`", index, value, self.sql);
        }
        self.slots.insert(index, value);
    }

    /// Binds SQL NULL at `index`.
    pub fn bind_null(&mut self, index: usize) -> Result<&mut Self> {
        self.ensure_open()?;
        self.statement.bind_null(index)?;
        self.record(index, Value::Null);
        Ok(self)
    }

    /// Binds text at `index`, routing `None` to the engine's null path.
    pub fn bind_text(&mut self, index: usize, value: Option<&str>) -> Result<&mut Self> {
        self.ensure_open()?;
        match value {
            Some(text) => {
                self.statement.bind_text(index, text)?;
                self.record(index, Value::Text(text.into()));
            }
            None => {
                self.statement.bind_null(index)?;
                self.record(index, Value::Null);
            }
        }
        Ok(self)
    }

    /// Binds a 64 bit integer at `index`.
    pub fn bind_long(&mut self, index: usize, value: i64) -> Result<&mut Self> {
        self.ensure_open()?;
        self.statement.bind_long(index, value)?;
        self.record(index, Value::Integer(value));
        Ok(self)
    }

    /// Binds a double at `index`.
    pub fn bind_double(&mut self, index: usize, value: f64) -> Result<&mut Self> {
        self.ensure_open()?;
        self.statement.bind_double(index, value)?;
        self.record(index, Value::Real(value));
        Ok(self)
    }

    /// Binds a blob bytewise at `index`, routing `None` to the engine's null
    /// path. The shadow slot keeps a hex literal instead of a second copy of
    /// the payload.
    pub fn bind_blob(&mut self, index: usize, value: Option<&[u8]>) -> Result<&mut Self> {
        self.ensure_open()?;
        match value {
            Some(bytes) => {
                self.statement.bind_blob(index, bytes)?;
                self.record(index, Value::Text(Value::blob_literal(bytes)));
            }
            None => {
                self.statement.bind_null(index)?;
                self.record(index, Value::Null);
            }
        }
        Ok(self)
    }

    /// Current shadow slots, keyed by 1-based index.
    pub fn bindings(&self) -> &BTreeMap<usize, Value> {
        &self.slots
    }

    /// Number of `?` placeholders in the SQL.
    pub fn parameter_count(&self) -> usize {
        self.statement.parameter_count()
    }

    /// Resets every slot. The compiled statement stays valid, so the caller
    /// can rebind and execute again.
    pub fn clear_parameters(&mut self) -> Result<()> {
        self.ensure_open()?;
        self.statement.clear_bindings()?;
        self.slots.clear();
        Ok(())
    }

    /// Runs the statement expecting no row output and no generated key.
    ///
    /// Always reports `false`: this execution path never classifies itself as
    /// query-producing.
    pub fn execute(&mut self) -> Result<bool> {
        self.ensure_open()?;
        self.statement.execute()?;
        Ok(false)
    }

    /// Re-runs the original SQL text with the currently bound values and
    /// installs a fresh cursor-backed result.
    ///
    /// The compiled handle is execute-only; the query path needs an
    /// independently positioned cursor, so the text goes back through the
    /// connection with the slot values as positional arguments. Any
    /// previously installed result is closed first.
    pub fn execute_query(&mut self) -> Result<&mut Rows<'c>> {
        self.ensure_open()?;
        let args = self.replay_args();
        let connection = self.connection;
        let cursor = connection.raw_query(&self.sql, &args)?;
        Ok(self.install(Rows::Cursor(cursor)))
    }

    /// Runs the statement in update mode.
    ///
    /// When generated keys were requested at construction the engine's insert
    /// path runs instead: the row id is installed as a single synthetic
    /// result and the reported count is always 1, assuming single-row insert
    /// semantics. Otherwise the engine's affected row count is stored and
    /// returned verbatim.
    pub fn execute_update(&mut self) -> Result<u64> {
        self.ensure_open()?;
        match self.options.generated_keys {
            GeneratedKeys::Return => {
                let row_id = self.statement.execute_insert()?;
                self.install(Rows::Key(KeyRow::new(row_id)));
                self.update_count = 1;
            }
            GeneratedKeys::None => {
                self.update_count = self.statement.execute_update_delete()?;
            }
        }
        Ok(self.update_count)
    }

    /// Count reported by the most recent update-mode execution.
    pub fn update_count(&self) -> u64 {
        self.update_count
    }

    /// Currently installed result of either kind, if any.
    pub fn rows(&mut self) -> Option<&mut Rows<'c>> {
        self.result.as_mut()
    }

    /// Generated-key result of the last insert, when keys were requested.
    pub fn generated_keys(&mut self) -> Option<&mut Rows<'c>> {
        match &mut self.result {
            Some(rows @ Rows::Key(..)) => Some(rows),
            _ => None,
        }
    }

    /// A prepared statement's SQL is fixed at compile time; running arbitrary
    /// text through it is rejected without touching the engine.
    pub fn execute_sql(&mut self, _sql: &str) -> Result<bool> {
        Err(Error::Unsupported("execute with SQL text"))
    }

    /// See [`execute_sql`](Self::execute_sql).
    pub fn execute_query_sql(&mut self, _sql: &str) -> Result<&mut Rows<'c>> {
        Err(Error::Unsupported("execute_query with SQL text"))
    }

    /// See [`execute_sql`](Self::execute_sql).
    pub fn execute_update_sql(&mut self, _sql: &str) -> Result<u64> {
        Err(Error::Unsupported("execute_update with SQL text"))
    }

    /// The SQL this statement was compiled from.
    pub fn sql(&self) -> &str {
        &self.sql
    }

    pub fn is_closed(&self) -> bool {
        self.closed
    }

    /// Releases the bindings, the compiled handle and any installed result.
    ///
    /// Every step proceeds independently of earlier failures, and closing an
    /// already closed statement is a no-op, so this is safe to call from
    /// error paths.
    pub fn close(&mut self) {
        if self.closed {
            return;
        }
        if let Err(error) = self.statement.clear_bindings() {
            log::debug!("Ignoring a bind clear failure during close: {}", error);
        }
        self.statement.close();
        if let Some(mut rows) = self.result.take() {
            rows.close();
        }
        self.slots.clear();
        self.closed = true;
    }

    /// Closes the previous result before installing its replacement, so a
    /// re-execute never leaks a live cursor.
    fn install(&mut self, rows: Rows<'c>) -> &mut Rows<'c> {
        if let Some(mut previous) = self.result.take() {
            previous.close();
        }
        self.result.insert(rows)
    }

    /// Dense positional argument array derived from the slots in index order;
    /// a missing slot replays as NULL.
    fn replay_args(&self) -> Vec<Option<String>> {
        (1..=self.statement.parameter_count())
            .map(|index| self.slots.get(&index).and_then(Value::as_replay_arg))
            .collect()
    }
}

impl Drop for PreparedStatement<'_> {
    fn drop(&mut self) {
        self.close();
    }
}

impl Display for PreparedStatement<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.sql)?;
        if !self.slots.is_empty() {
            f.write_str(" [")?;
            for (i, (index, value)) in self.slots.iter().enumerate() {
                if i > 0 {
                    f.write_str(", ")?;
                }
                write!(f, "?{}={}", index, value)?;
            }
            f.write_str("]")?;
        }
        Ok(())
    }
}
