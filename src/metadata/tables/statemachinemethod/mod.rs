//! StateMachineMethod table (0x36) of the Portable PDB format.
//!
//! Maps the compiler-generated `MoveNext` of an iterator or async state machine back to the
//! user-written kickoff method. Sorted by the `MoveNext` column.

mod raw;

pub use raw::StateMachineMethodRaw;
