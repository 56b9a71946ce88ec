//! LocalScope table (0x32) of the Portable PDB format.
//!
//! Each row covers an IL range of one method. Rows must be sorted by method, then by start
//! offset ascending, then by length descending, so that an enclosing scope precedes the scopes
//! nested in it. The variable and constant columns are run-start indices: a scope owns the
//! rows from its index up to the next scope's index.

mod raw;

pub use raw::LocalScopeRaw;
