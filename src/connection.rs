use crate::{
    CBox, CompiledStatement, Cursor, EngineError, Error, PreparedStatement, Result,
    StatementOptions,
};
use libsqlite3_sys::*;
use std::{
    ffi::{CString, c_int},
    os::raw::c_char,
    path::Path,
    ptr,
};

/// An open handle to an encrypted SQLite database file.
///
/// Not thread safe: the contract assumes exactly one caller operates on a
/// connection and its statements at a time, and every call blocks until the
/// engine returns.
pub struct Connection {
    pub(crate) handle: CBox<*mut sqlite3>,
}

impl Connection {
    /// Opens (creating if needed) the database file at `path`.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_string_lossy();
        let c_path = CString::new(path.as_bytes())
            .map_err(|_| Error::Input(format!("The path `{}` contains a NUL byte", path)))?;
        unsafe {
            let mut handle = CBox::new(ptr::null_mut(), |p| {
                sqlite3_close(p);
            });
            let rc = sqlite3_open_v2(
                c_path.as_ptr(),
                &mut *handle,
                SQLITE_OPEN_READWRITE | SQLITE_OPEN_CREATE | SQLITE_OPEN_URI,
                ptr::null(),
            );
            if rc != SQLITE_OK {
                let error = if handle.is_null() {
                    EngineError::new(rc, "Could not allocate a database handle")
                } else {
                    EngineError::from_handle(*handle)
                };
                log::error!("Cannot open `{}`: {}", path, error);
                return Err(error.into());
            }
            Ok(Self { handle })
        }
    }

    /// Opens `path` and unlocks it with the SQLCipher `key`.
    ///
    /// The key is applied before anything else touches the file and verified
    /// by reading the schema, so a wrong key fails here rather than on the
    /// first statement.
    pub fn open_with_key(path: impl AsRef<Path>, key: &str) -> Result<Self> {
        let connection = Self::open(path)?;
        connection.execute_batch(&format!("PRAGMA key = '{}';", key.replace('\'', "''")))?;
        connection.execute_batch("SELECT count(*) FROM sqlite_master;")?;
        Ok(connection)
    }

    /// Compiles `sql` into a prepared statement, failing fast on malformed
    /// SQL. Exactly one statement is accepted.
    pub fn prepare(&self, sql: &str, options: StatementOptions) -> Result<PreparedStatement<'_>> {
        let statement = self.compile_statement(sql)?;
        Ok(PreparedStatement::new(self, sql, statement, options))
    }

    /// Compiles a single statement, rejecting trailing SQL after it.
    pub(crate) fn compile_statement(&self, sql: &str) -> Result<CompiledStatement> {
        unsafe {
            let mut statement = CBox::new(ptr::null_mut(), |p| {
                sqlite3_finalize(p);
            });
            let mut tail: *const c_char = ptr::null();
            let rc = sqlite3_prepare_v2(
                *self.handle,
                sql.as_ptr() as *const c_char,
                sql.len() as c_int,
                &mut *statement,
                &mut tail,
            );
            if rc != SQLITE_OK {
                let error = EngineError::from_handle(*self.handle);
                log::error!("Cannot compile `{}`: {}", sql, error);
                return Err(error.into());
            }
            // the tail points into `sql`, right after the compiled statement
            let consumed = tail as usize - sql.as_ptr() as usize;
            if !sql[consumed..].trim().is_empty() {
                return Err(Error::Input(
                    "Cannot prepare more than one statement at a time".into(),
                ));
            }
            if statement.is_null() {
                return Err(Error::Input("The statement is empty".into()));
            }
            Ok(CompiledStatement::new(statement))
        }
    }

    /// Runs `sql` with a fresh, independently positioned cursor. Arguments
    /// are bound positionally as text, `None` as SQL NULL.
    pub fn raw_query(&self, sql: &str, args: &[Option<String>]) -> Result<Cursor<'_>> {
        let mut statement = self.compile_statement(sql)?;
        for (i, arg) in args.iter().enumerate() {
            match arg {
                Some(text) => statement.bind_text(i + 1, text)?,
                None => statement.bind_null(i + 1)?,
            }
        }
        Ok(Cursor::new(self, statement))
    }

    /// Runs every `;`-separated statement in `sql`, discarding row output.
    pub fn execute_batch(&self, sql: &str) -> Result<()> {
        let mut rest = sql.trim_start();
        while !rest.is_empty() {
            unsafe {
                let mut statement = CBox::new(ptr::null_mut(), |p| {
                    sqlite3_finalize(p);
                });
                let mut tail: *const c_char = ptr::null();
                let rc = sqlite3_prepare_v2(
                    *self.handle,
                    rest.as_ptr() as *const c_char,
                    rest.len() as c_int,
                    &mut *statement,
                    &mut tail,
                );
                if rc != SQLITE_OK {
                    let error = EngineError::from_handle(*self.handle);
                    log::error!("Cannot compile `{}`: {}", rest, error);
                    return Err(error.into());
                }
                let consumed = tail as usize - rest.as_ptr() as usize;
                if !statement.is_null() {
                    CompiledStatement::new(statement).execute()?;
                }
                rest = rest[consumed..].trim_start();
            }
        }
        Ok(())
    }
}
