use crate::{CBox, EngineError, error_message_from_ptr};
use libsqlite3_sys::*;
use std::{
    ffi::{c_int, c_void},
    os::raw::c_char,
    ptr,
};

/// Exclusive owner of a compiled `sqlite3_stmt` handle.
///
/// Every method reports non-OK result codes as [`EngineError`] with the native
/// code and message intact; an out of range bind index surfaces the engine's
/// own `SQLITE_RANGE` failure unmodified. A failed step resets the handle so
/// the statement stays usable afterwards.
pub struct CompiledStatement {
    pub(crate) handle: CBox<*mut sqlite3_stmt>,
}

impl CompiledStatement {
    pub(crate) fn new(handle: CBox<*mut sqlite3_stmt>) -> Self {
        unsafe {
            sqlite3_clear_bindings(*handle);
        }
        Self { handle }
    }

    fn db(&self) -> *mut sqlite3 {
        unsafe { sqlite3_db_handle(*self.handle) }
    }

    fn check(&self, rc: c_int) -> Result<(), EngineError> {
        if rc == SQLITE_OK {
            return Ok(());
        }
        // the code comes from the failing call itself, not from whatever the
        // connection reported last
        let error = EngineError::new(rc, unsafe {
            error_message_from_ptr(&sqlite3_errmsg(self.db())).to_string()
        });
        log::error!("{}", error);
        Err(error)
    }

    /// Number of `?` placeholders in the compiled SQL.
    pub fn parameter_count(&self) -> usize {
        unsafe { sqlite3_bind_parameter_count(*self.handle) as usize }
    }

    pub fn bind_null(&mut self, index: usize) -> Result<(), EngineError> {
        self.check(unsafe { sqlite3_bind_null(*self.handle, index as c_int) })
    }

    pub fn bind_long(&mut self, index: usize, value: i64) -> Result<(), EngineError> {
        self.check(unsafe { sqlite3_bind_int64(*self.handle, index as c_int, value) })
    }

    pub fn bind_double(&mut self, index: usize, value: f64) -> Result<(), EngineError> {
        self.check(unsafe { sqlite3_bind_double(*self.handle, index as c_int, value) })
    }

    pub fn bind_text(&mut self, index: usize, value: &str) -> Result<(), EngineError> {
        self.check(unsafe {
            sqlite3_bind_text(
                *self.handle,
                index as c_int,
                value.as_ptr() as *const c_char,
                value.len() as c_int,
                SQLITE_TRANSIENT(),
            )
        })
    }

    pub fn bind_blob(&mut self, index: usize, value: &[u8]) -> Result<(), EngineError> {
        self.check(unsafe {
            sqlite3_bind_blob(
                *self.handle,
                index as c_int,
                value.as_ptr() as *const c_void,
                value.len() as c_int,
                SQLITE_TRANSIENT(),
            )
        })
    }

    pub fn clear_bindings(&mut self) -> Result<(), EngineError> {
        self.check(unsafe { sqlite3_clear_bindings(*self.handle) })
    }

    /// Steps the statement to completion and resets it for the next run.
    fn step_to_done(&mut self) -> Result<(), EngineError> {
        unsafe {
            loop {
                match sqlite3_step(*self.handle) {
                    SQLITE_BUSY => continue,
                    SQLITE_DONE | SQLITE_ROW => break,
                    _ => {
                        let error = EngineError::from_handle(self.db());
                        log::error!("{}", error);
                        // reset keeps the statement reusable after the failure
                        sqlite3_reset(*self.handle);
                        return Err(error);
                    }
                }
            }
            sqlite3_reset(*self.handle);
        }
        Ok(())
    }

    /// Runs a statement that produces neither rows nor a generated key.
    pub fn execute(&mut self) -> Result<(), EngineError> {
        self.step_to_done()
    }

    /// Runs an insert and reports the generated row id, or -1 when the
    /// insert inserted nothing (e.g. an ignored conflict): the last row id
    /// on the connection would still hold the previous insert's key.
    pub fn execute_insert(&mut self) -> Result<i64, EngineError> {
        self.step_to_done()?;
        unsafe {
            if sqlite3_changes(self.db()) > 0 {
                Ok(sqlite3_last_insert_rowid(self.db()))
            } else {
                Ok(-1)
            }
        }
    }

    /// Runs an update or delete and reports the affected row count.
    pub fn execute_update_delete(&mut self) -> Result<u64, EngineError> {
        self.step_to_done()?;
        Ok(unsafe { sqlite3_changes(self.db()) } as u64)
    }

    pub fn is_closed(&self) -> bool {
        self.handle.is_null()
    }

    /// Finalizes the handle. Later calls are no-ops and `Drop` will not
    /// release it a second time.
    pub fn close(&mut self) {
        let handle = std::mem::replace(&mut *self.handle, ptr::null_mut());
        if !handle.is_null() {
            unsafe {
                sqlite3_finalize(handle);
            }
        }
    }
}
