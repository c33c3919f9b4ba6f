use std::path::PathBuf;

use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Error, Debug)]
pub enum Error {
    #[error("cannot open '{}': {source}", .path.display())]
    FileOpen {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("cannot write '{}': {source}", .path.display())]
    FileWrite {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("cannot close '{}': {source}", .path.display())]
    FileClose {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("unreadable token at offset {offset}")]
    TokenCantRead { offset: usize },

    #[error("syntax error: {0}")]
    SqlSyntax(String),

    #[error("bad column name: {0}")]
    BadColumnName(String),

    #[error("invalid operand type: {0}")]
    WhereOperandType(String),

    #[error("malformed csv '{}': {reason}", .path.display())]
    CsvSyntax { path: PathBuf, reason: String },

    #[error("out of memory while buffering rows")]
    MemoryAllocate,

    #[error("row limit of {limit} exceeded")]
    MemoryOver { limit: usize },
}

/// Numeric status returned by [`crate::execute`] and used as the process exit code.
#[repr(i32)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResultCode {
    Ok = 0,
    ErrFileOpen = 1,
    ErrFileWrite = 2,
    ErrFileClose = 3,
    ErrTokenCantRead = 4,
    ErrSqlSyntax = 5,
    ErrBadColumnName = 6,
    ErrWhereOperandType = 7,
    ErrCsvSyntax = 8,
    ErrMemoryAllocate = 9,
    ErrMemoryOver = 10,
}

impl ResultCode {
    pub fn as_i32(self) -> i32 {
        self as i32
    }
}

impl Error {
    pub fn code(&self) -> ResultCode {
        match self {
            Error::FileOpen { .. } => ResultCode::ErrFileOpen,
            Error::FileWrite { .. } => ResultCode::ErrFileWrite,
            Error::FileClose { .. } => ResultCode::ErrFileClose,
            Error::TokenCantRead { .. } => ResultCode::ErrTokenCantRead,
            Error::SqlSyntax(_) => ResultCode::ErrSqlSyntax,
            Error::BadColumnName(_) => ResultCode::ErrBadColumnName,
            Error::WhereOperandType(_) => ResultCode::ErrWhereOperandType,
            Error::CsvSyntax { .. } => ResultCode::ErrCsvSyntax,
            Error::MemoryAllocate => ResultCode::ErrMemoryAllocate,
            Error::MemoryOver { .. } => ResultCode::ErrMemoryOver,
        }
    }
}
