//! Portable PDB generation and reading.
//!
//! This module turns a compiled module ([`crate::metadata::module::ModuleInfo`]) and decompiled
//! source ([`crate::decompiler::Decompiler`]) into a standalone Portable PDB a debugger can load
//! next to the assembly. The container maps IL offsets of every decompiled method back to the
//! generated source, which is embedded, and carries the lexical import scopes, local scopes and
//! state machine information needed to step through iterators, lambdas and async methods.
//!
//! # Architecture
//!
//! - [`document`] - virtual source paths, hashing and embedding of source text
//! - [`scopes`] - the syntax tree walk building import scopes and local scopes
//! - [`statemachine`] - `MoveNext`/kickoff pairs, hoisted locals and async stepping blobs
//! - [`builder`] - the row and heap accumulator with the sort invariants of the sorted tables
//! - [`serializer`] - the container layout and the `PdbId`
//! - [`generator`] - the pipeline tying everything together
//! - [`reader`] - decoding of existing containers
//!
//! # Examples
//!
//! ```rust,no_run
//! use std::path::Path;
//! use dotpdb::prelude::*;
//!
//! let module = ModuleInfo::from_file(Path::new("App.dll"))?;
//! let decompiler = JsonDecompiler::from_file(Path::new("App.json"))?;
//! let pdb = PdbGenerator::new(&module, &decompiler).generate()?;
//! pdb.write_file(Path::new("App.pdb"))?;
//!
//! let parsed = PortablePdb::parse(&pdb.data)?;
//! assert_eq!(parsed.id, pdb.report.content_id);
//! # Ok::<(), dotpdb::Error>(())
//! ```
//!
//! # References
//!
//! - [Portable PDB v1.0 format specification](https://github.com/dotnet/runtime/blob/main/docs/design/specs/PortablePdb-Metadata.md)
//! - ECMA-335 6th Edition, Partition II, Section 24

pub mod builder;
pub mod contentid;
pub mod document;
pub mod generator;
pub mod reader;
pub mod scopes;
pub mod serializer;
pub mod statemachine;

pub use builder::{LocalVariableInfo, PdbBuilder, PdbTables, GLOBAL_IMPORT_SCOPE};
pub use contentid::ContentId;
pub use document::{virtual_path, SourceDocument};
pub use generator::{
    ContentIdSource, GeneratedPdb, GenerationReport, GeneratorOptions, PdbGenerator,
    ProgressObserver, SourceFile,
};
pub use reader::PortablePdb;
