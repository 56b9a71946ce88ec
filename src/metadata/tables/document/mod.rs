//! Document table (0x30) of the Portable PDB format.
//!
//! One row per source file. The name column is a document name blob (separator plus interned
//! path parts, see [`crate::pdb::document`]); hash and language are identified by GUID.
//!
//! # Reference
//! * [Portable PDB Format - Document Table](https://github.com/dotnet/runtime/blob/main/docs/design/specs/PortablePdb-Metadata.md#document-table-0x30)

mod raw;

pub use raw::DocumentRaw;
