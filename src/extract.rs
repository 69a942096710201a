use crate::{EngineError, Value};
use libsqlite3_sys::*;
use std::{
    ffi::{CStr, c_int},
    slice,
};

pub(crate) fn extract_value(
    statement: *mut sqlite3_stmt,
    index: c_int,
) -> Result<Value, EngineError> {
    unsafe {
        let column_type = sqlite3_column_type(statement, index);
        Ok(match column_type {
            SQLITE_NULL => Value::Null,
            SQLITE_INTEGER => Value::Integer(sqlite3_column_int64(statement, index)),
            SQLITE_FLOAT => Value::Real(sqlite3_column_double(statement, index)),
            SQLITE_TEXT => {
                let ptr = sqlite3_column_text(statement, index);
                let len = sqlite3_column_bytes(statement, index) as usize;
                if ptr.is_null() || len == 0 {
                    Value::Text(String::new())
                } else {
                    Value::Text(String::from_utf8_lossy(slice::from_raw_parts(ptr, len)).into_owned())
                }
            }
            SQLITE_BLOB => {
                let ptr = sqlite3_column_blob(statement, index) as *const u8;
                let len = sqlite3_column_bytes(statement, index) as usize;
                if ptr.is_null() || len == 0 {
                    Value::Blob(Box::from([]))
                } else {
                    Value::Blob(slice::from_raw_parts(ptr, len).into())
                }
            }
            _ => {
                return Err(EngineError::new(
                    SQLITE_MISMATCH,
                    format!("Unexpected column type {}", column_type),
                ));
            }
        })
    }
}

pub(crate) fn extract_name(statement: *mut sqlite3_stmt, index: c_int) -> String {
    unsafe {
        let name = sqlite3_column_name(statement, index);
        if name.is_null() {
            return format!("column{}", index);
        }
        CStr::from_ptr(name).to_string_lossy().into_owned()
    }
}
