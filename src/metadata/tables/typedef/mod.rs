//! TypeDef table (0x02), read from the assembly to select and name the types to decompile.

mod raw;

pub use raw::{TypeAttributes, TypeDefRaw};
