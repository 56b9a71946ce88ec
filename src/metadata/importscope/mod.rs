//! Import declarations of Portable PDB import scopes.
//!
//! An `ImportScope` row stores the namespaces, types and aliases visible in a lexical scope as an
//! imports blob. The generator only ever emits namespace imports (one per `using` directive);
//! the parser understands every declaration kind so that foreign PDBs can be dumped.
//!
//! # Imports Blob Format
//!
//! ```text
//! Blob   ::= Import*
//! Import ::= kind alias? target-assembly? target-namespace? target-type?
//! ```
//!
//! Strings (aliases and namespaces) are stored as compressed `#Blob` indices of their UTF-8
//! bytes, assembly targets as compressed `AssemblyRef` rows and type targets as
//! `TypeDefOrRefOrSpecEncoded` values.
//!
//! # Examples
//!
//! ```rust
//! use dotpdb::metadata::importscope::{encode_imports, parse_imports_blob, ImportDeclaration};
//! use dotpdb::metadata::streams::{Blob, BlobBuilder};
//!
//! let mut blobs = BlobBuilder::new();
//! let blob = encode_imports(["System", "System.Linq"], &mut blobs)?;
//!
//! let heap = blobs.into_bytes();
//! let imports = parse_imports_blob(&blob, &Blob::from(&heap)?)?;
//! assert_eq!(
//!     imports.declarations[1],
//!     ImportDeclaration::ImportNamespace { namespace: "System.Linq".to_string() }
//! );
//! # Ok::<(), dotpdb::Error>(())
//! ```
//!
//! # Reference
//! - [Portable PDB Format - Imports Blob](https://github.com/dotnet/runtime/blob/main/docs/design/specs/PortablePdb-Metadata.md#imports-blob)

mod encoder;
mod parser;
mod types;

pub use encoder::encode_imports;
pub use parser::parse_imports_blob;
pub use types::{ImportDeclaration, ImportKind, ImportsInfo};
