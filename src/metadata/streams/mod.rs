//! Metadata streams.
//!
//! Readers for the heaps and the tables stream of both assemblies and Portable PDBs, and the
//! interning heap builders the PDB writer fills.
//!
//! # Stream Types
//!
//! - **`#Strings`** - NUL terminated UTF-8 identifiers. The first entry is always empty.
//! - **`#Blob`** - Length-prefixed binary data.
//! - **`#GUID`** - 16-byte GUIDs, addressed by 1-based index.
//! - **`#~`** - The metadata tables.
//! - **`#Pdb`** - Portable PDB only: the PDB id, entry point and the row counts of the
//!   type-system tables the debug tables refer to, see [`crate::pdb`].
//! - **`#US`** - User strings. A PDB emits an empty one and nothing reads it.
//!
//! # References
//!
//! - ECMA-335 6th Edition, Partition II, Section 24.2.2 - Stream Headers

mod blob;
mod guid;
mod streamheader;
mod strings;
mod tablesheader;

pub use blob::{Blob, BlobBuilder, BlobIterator};
pub use guid::{Guid, GuidBuilder};
pub use streamheader::{StreamHeader, VALID_STREAM_NAMES};
pub use strings::{Strings, StringsBuilder};
pub use tablesheader::{TableSummary, TablesHeader};
