//! NestedClass table (0x29), read from the assembly to tell nested types from top-level ones.

mod raw;

pub use raw::NestedClassRaw;
