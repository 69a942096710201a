use crate::error_message_from_ptr;
use libsqlite3_sys::{sqlite3, sqlite3_errcode, sqlite3_errmsg};
use std::ffi::c_int;
use thiserror::Error;

/// A failure reported by the native engine, keeping the original result code
/// and message so no diagnostic information is lost in translation.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("sqlite error {code}: {message}")]
pub struct EngineError {
    /// Native result code, e.g. `SQLITE_RANGE` for an out of range bind index.
    pub code: c_int,
    pub message: String,
}

impl EngineError {
    pub(crate) fn new(code: c_int, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }

    /// Reads the most recent error of `db`. Every native failure is routed
    /// through here before it reaches the caller.
    pub(crate) fn from_handle(db: *mut sqlite3) -> Self {
        unsafe {
            Self {
                code: sqlite3_errcode(db),
                message: error_message_from_ptr(&sqlite3_errmsg(db)).to_string(),
            }
        }
    }
}

#[derive(Debug, Error)]
pub enum Error {
    /// Translated native engine failure.
    #[error(transparent)]
    Engine(#[from] EngineError),
    /// Operation that a prepared statement cannot perform.
    #[error("unsupported on a prepared statement: {0}")]
    Unsupported(&'static str),
    /// The statement was already closed.
    #[error("the statement is closed")]
    Closed,
    /// Input rejected before reaching the engine.
    #[error("{0}")]
    Input(String),
}

impl Error {
    /// Native result code, when the failure originated in the engine.
    pub fn engine_code(&self) -> Option<c_int> {
        match self {
            Error::Engine(error) => Some(error.code),
            _ => None,
        }
    }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
