//! LocalVariable table (0x33) of the Portable PDB format.

mod raw;

pub use raw::{LocalVariableAttributes, LocalVariableRaw};
