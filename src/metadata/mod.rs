//! ECMA-335 metadata reading and writing.
//!
//! This module holds both sides of the format the crate needs:
//!
//! - the assembly side: the COR20 header, metadata root, streams and the handful of type-system
//!   tables needed to enumerate types and method bodies, condensed into a [`module::ModuleInfo`];
//! - the debug side: row layouts of the Portable PDB tables (`0x30`-`0x37`), interning heap
//!   builders and the blob encodings for sequence points, imports and custom debug information.
//!
//! # Examples
//!
//! ```rust,no_run
//! use dotpdb::metadata::module::ModuleInfo;
//!
//! let module = ModuleInfo::from_file("tests/samples/App.dll".as_ref())?;
//! println!("{}: {} methods, {} types", module.name(), module.method_count(), module.types().len());
//! # Ok::<(), dotpdb::Error>(())
//! ```

/// Implementation of the Header of CIL
pub mod cor20header;
/// Custom debug information blob kinds, encoders and decoders
pub mod customdebuginformation;
/// Non-fatal problems collected during generation
pub mod diagnostics;
/// Imports blobs of `ImportScope` rows
pub mod importscope;
/// Implementation of the MethodHeader of CIL
pub mod method;
/// Condensed view of an assembly's types and method bodies
pub mod module;
/// Implementation of the root metadata structure
pub mod root;
/// Sequence point blob encoding and decoding
pub mod sequencepoints;
/// Implementation of all metadata streams (tables, heaps, etc.)
pub mod streams;
/// Row layouts of the metadata tables
pub mod tables;
/// Commonly used metadata token type
pub mod token;
