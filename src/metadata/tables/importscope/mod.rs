//! ImportScope table (0x35) of the Portable PDB format.
//!
//! Rows form a tree through the parent column; row 1 is conventionally the global scope with a
//! null parent and an empty imports blob.

mod raw;

pub use raw::ImportScopeRaw;
