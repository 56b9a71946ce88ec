//! MethodDebugInformation table (0x31) of the Portable PDB format.
//!
//! Parallel to the assembly's `MethodDef` table: row N describes method N. A row with a null
//! sequence-points blob means the method has no stepping information.

mod raw;

pub use raw::MethodDebugInformationRaw;
