//! LocalConstant table (0x34) of the Portable PDB format.
//!
//! Never populated by the generator, but part of every `LocalScope` row's layout.

mod raw;

pub use raw::LocalConstantRaw;
