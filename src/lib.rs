// Copyright 2025 Johann Kempter
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.
//
// SPDX-License-Identifier: Apache-2.0

#![doc(html_no_source)]
#![deny(missing_docs)]
#![allow(clippy::too_many_arguments)]
//#![deny(unsafe_code)]
// - 'file/physical.rs' uses mmap to map a file into memory

//! # dotpdb
//!
//! [![Crates.io](https://img.shields.io/crates/v/dotpdb.svg)](https://crates.io/crates/dotpdb)
//! [![Documentation](https://docs.rs/dotpdb/badge.svg)](https://docs.rs/dotpdb)
//! [![License](https://img.shields.io/badge/license-Apache--2.0-blue.svg)](https://github.com/BinFlip/dotpdb/blob/main/LICENSE-APACHE)
//!
//! Portable PDB generation for decompiled .NET assemblies, in pure Rust.
//!
//! Given a compiled .NET PE file and the source a decompiler produced for its types, `dotpdb`
//! writes a standalone Portable PDB that lets a debugger step through the assembly at source
//! level: sequence points map IL offsets to lines, the source is embedded, and import scopes,
//! local scopes and state machine information make lambdas, iterators and async methods
//! debuggable.
//!
//! ## Features
//!
//! - **📦 Lean metadata reader** - Memory-mapped PE loading that reads only what a PDB needs
//! - **🧭 Byte-exact encoders** - Sequence points, imports, document names and custom debug blobs
//! - **⚡ Parallel generation** - Per-file work on the rayon thread pool, deterministic merge
//! - **🔁 Reproducible output** - Identical input produces an identical container, id included
//! - **🔍 Reader included** - Decode any Portable PDB for inspection and testing
//!
//! ## Quick Start
//!
//! ```toml
//! [dependencies]
//! dotpdb = "0.1"
//! ```
//!
//! ```rust,no_run
//! use dotpdb::prelude::*;
//! use std::path::Path;
//!
//! let module = ModuleInfo::from_file(Path::new("tests/samples/App.dll"))?;
//! let decompiler = JsonDecompiler::from_file(Path::new("tests/samples/App.json"))?;
//!
//! let pdb = PdbGenerator::new(&module, &decompiler)
//!     .with_options(GeneratorOptions::default().with_banner("Decompiled with dotpdb"))
//!     .generate()?;
//! pdb.write_file(Path::new("App.pdb"))?;
//!
//! println!(
//!     "{} documents, {} methods with sequence points",
//!     pdb.report.documents, pdb.report.methods_with_sequence_points
//! );
//! # Ok::<(), dotpdb::Error>(())
//! ```
//!
//! ## Architecture
//!
//! - [`metadata`] - The ECMA-335 side: tokens, tables, heaps, the blob encoders and decoders of
//!   the debug tables, and [`metadata::module::ModuleInfo`], the view of the assembly
//! - [`decompiler`] - The interface to the decompiler and the JSON manifest adapter
//! - [`pdb`] - Scope collection, table building, serialization, the generator and the reader
//! - [`prelude`] - The types most programs need
//!
//! ## Error Handling
//!
//! All operations return [`Result<T>`]. Problems that only lose part of the debug information
//! are not errors: the generator records them as
//! [`metadata::diagnostics::Diagnostic`]s in its report and carries on.
//!
//! ## References
//!
//! - [ECMA-335 Standard](https://ecma-international.org/wp-content/uploads/ECMA-335_6th_edition_june_2012.pdf)
//! - [Portable PDB v1.0 Format](https://github.com/dotnet/runtime/blob/main/docs/design/specs/PortablePdb-Metadata.md)

#[macro_use]
pub(crate) mod error;

/// PE file access and the byte readers shared by all decoders.
pub mod file;

/// Shared functionality which is used in unit- and integration-tests
#[cfg(test)]
pub(crate) mod test;

/// Convenient re-exports of the most commonly used types and traits.
///
/// # Example
///
/// ```rust,no_run
/// use dotpdb::prelude::*;
///
/// let module = ModuleInfo::from_file("tests/samples/App.dll".as_ref())?;
/// println!("{} methods", module.method_count());
/// # Ok::<(), dotpdb::Error>(())
/// ```
pub mod prelude;

/// The decompiler interface and the JSON manifest adapter.
pub mod decompiler;

/// ECMA-335 metadata: tokens, tables, heaps, debug blobs and the module view.
pub mod metadata;

/// Portable PDB generation, serialization and reading.
pub mod pdb;

/// Compressed integers, hashing and deflate helpers.
pub mod utils;

/// `dotpdb` Result type
///
/// A type alias for `std::result::Result<T, Error>` where the error type is always [`Error`].
pub type Result<T> = std::result::Result<T, Error>;

/// `dotpdb` Error type
///
/// The main error type for all operations in this crate.
pub use error::Error;

/// Sequential reader over metadata blobs
pub use file::{parser::Parser, CodeViewInfo, File};
