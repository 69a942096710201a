use crate::{
    CompiledStatement, Connection, EngineError, Result, Row, RowNames, Value,
    extract::{extract_name, extract_value},
};
use libsqlite3_sys::*;
use std::{ffi::c_int, marker::PhantomData};

/// A live, forward-only, read-only row sequence produced by a query.
///
/// The cursor owns its own compiled handle, independent of the prepared
/// statement that spawned it, so its iteration state is fresh on every query
/// execution. It stays valid only as long as the connection it came from.
pub struct Cursor<'c> {
    statement: CompiledStatement,
    labels: RowNames,
    done: bool,
    _connection: PhantomData<&'c Connection>,
}

impl<'c> Cursor<'c> {
    pub(crate) fn new(_connection: &'c Connection, statement: CompiledStatement) -> Self {
        let labels: RowNames = unsafe {
            let count = sqlite3_column_count(*statement.handle);
            (0..count)
                .map(|i| extract_name(*statement.handle, i))
                .collect::<Vec<_>>()
                .into()
        };
        Self {
            statement,
            labels,
            done: false,
            _connection: PhantomData,
        }
    }

    /// Column names of the rows this cursor produces.
    pub fn labels(&self) -> &RowNames {
        &self.labels
    }

    /// Advances to the next row, `None` once the sequence is exhausted.
    pub fn next_row(&mut self) -> Result<Option<Row>> {
        if self.done || self.statement.is_closed() {
            return Ok(None);
        }
        unsafe {
            loop {
                match sqlite3_step(*self.statement.handle) {
                    SQLITE_BUSY => continue,
                    SQLITE_DONE => {
                        self.done = true;
                        return Ok(None);
                    }
                    SQLITE_ROW => {
                        let values = (0..self.labels.len() as c_int)
                            .map(|i| extract_value(*self.statement.handle, i))
                            .collect::<Result<Box<[Value]>, EngineError>>()?;
                        return Ok(Some(Row::new(self.labels.clone(), values)));
                    }
                    _ => {
                        let error =
                            EngineError::from_handle(sqlite3_db_handle(*self.statement.handle));
                        log::error!("{}", error);
                        self.done = true;
                        return Err(error.into());
                    }
                }
            }
        }
    }

    /// Releases the underlying handle; later `next_row` calls return `None`.
    pub fn close(&mut self) {
        self.statement.close();
        self.done = true;
    }
}
