//! CIL method bodies.
//!
//! PDB generation never looks at instructions. It needs two facts from each body header: the
//! length of the IL code, which bounds every local scope of the method, and the local variable
//! signature, which heads the sequence-point blob.

mod body;

pub use body::{MethodBody, MethodBodyFlags};
