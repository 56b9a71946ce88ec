use thiserror::Error;

use crate::metadata::token::Token;

/// Builds an [`Error::Malformed`] carrying the source location of the call site.
macro_rules! malformed_error {
    // Single string version
    ($msg:expr) => {
        crate::Error::Malformed {
            message: $msg.to_string(),
            file: file!(),
            line: line!(),
        }
    };

    // Format string with arguments version
    ($fmt:expr, $($arg:tt)*) => {
        crate::Error::Malformed {
            message: format!($fmt, $($arg)*),
            file: file!(),
            line: line!(),
        }
    };
}

/// The generic Error type, which provides coverage for all errors this library can potentially
/// return.
///
/// # Error Categories
///
/// ## Input Errors
/// - [`Error::Malformed`] - Corrupted or invalid assembly, PDB or manifest structure
/// - [`Error::OutOfBounds`] - Attempted to read beyond the end of a buffer
/// - [`Error::NotSupported`] - Unsupported file format or feature
/// - [`Error::Empty`] - Empty input provided
///
/// ## I/O and External Errors
/// - [`Error::FileError`] - Filesystem I/O errors, fatal when writing the container
/// - [`Error::GoblinErr`] - PE parsing errors from goblin
/// - [`Error::Json`] - Decompiler manifest (de)serialization errors
///
/// ## Generation Errors
/// - [`Error::MissingCodeView`] - The assembly has no CodeView entry and one was required
/// - [`Error::DuplicateDocument`] - A document name was registered twice
/// - [`Error::Decompiler`] - The decompiler failed for a file group
/// - [`Error::InvalidMethod`] - A token does not name a method of the module
/// - [`Error::RecursionLimit`] - A syntax tree nests deeper than allowed
#[derive(Error, Debug)]
pub enum Error {
    /// The data is malformed.
    ///
    /// Carries the location where the problem was detected, to make tracking down
    /// the offending input possible without re-running.
    #[error("Malformed - {file}:{line}: {message}")]
    Malformed {
        /// The message to be printed for the Malformed error
        message: String,
        /// The source file in which this error occurred
        file: &'static str,
        /// The source line in which this error occurred
        line: u32,
    },

    /// An out of bound access was attempted while reading a buffer.
    #[error("Out of Bound read would have occurred!")]
    OutOfBounds,

    /// This file type is not supported.
    #[error("This file type is not supported")]
    NotSupported,

    /// Provided input was empty.
    #[error("Provided input was empty")]
    Empty,

    /// File I/O error.
    #[error("{0}")]
    FileError(#[from] std::io::Error),

    /// Other errors that don't fit other categories.
    #[error("{0}")]
    Error(String),

    /// Error from the goblin crate while parsing the PE container.
    #[error("{0}")]
    GoblinErr(#[from] goblin::error::Error),

    /// Error while reading or writing a decompiler manifest.
    #[error("{0}")]
    Json(#[from] serde_json::Error),

    /// The assembly carries no CodeView debug directory entry, and generation was
    /// configured to require one.
    #[error("No CodeView debug directory entry present in {0}")]
    MissingCodeView(String),

    /// A document with this name already exists in the metadata builder.
    #[error("Document already registered - {0}")]
    DuplicateDocument(String),

    /// The decompiler collaborator failed.
    #[error("Decompiler failed - {0}")]
    Decompiler(String),

    /// The token does not reference a method definition of the loaded module.
    #[error("Not a valid method of this module - {0}")]
    InvalidMethod(Token),

    /// Reached the maximum recursion level allowed.
    #[error("Reach the maximum recursion level allowed - {0}")]
    RecursionLimit(usize),
}
