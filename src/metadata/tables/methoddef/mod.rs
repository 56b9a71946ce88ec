//! MethodDef table (0x06), read from the assembly to locate method bodies.

mod raw;

pub use raw::MethodDefRaw;
