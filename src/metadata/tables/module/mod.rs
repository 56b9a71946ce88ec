//! Module table (0x00), read from the assembly for the module name.

mod raw;

pub use raw::ModuleRaw;
