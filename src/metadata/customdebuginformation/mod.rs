//! Custom debug information blobs of Portable PDB files.
//!
//! `CustomDebugInformation` rows attach a GUID-identified blob to a document, method or scope.
//! The generator emits three kinds:
//!
//! - **Embedded source** on every document: `i32` uncompressed length followed by a raw deflate
//!   stream of the UTF-8 source (a length of 0 means the text follows uncompressed).
//! - **State machine hoisted local scopes** on `MoveNext` methods: a `(start u32, length u32)`
//!   pair per hoisted local.
//! - **Async method stepping information**: catch handler offset, then the yield/resume offsets
//!   and resume method of every await.
//!
//! The parser additionally understands Source Link and compilation metadata, and passes every
//! other kind through as raw bytes.
//!
//! # Examples
//!
//! ```rust
//! use dotpdb::metadata::customdebuginformation::{
//!     encode_embedded_source, parse_custom_debug_blob, CustomDebugInfo, CustomDebugKind,
//! };
//!
//! let blob = encode_embedded_source("class Program {}")?;
//! match parse_custom_debug_blob(&blob, CustomDebugKind::EmbeddedSource)? {
//!     CustomDebugInfo::EmbeddedSource { content, was_compressed } => {
//!         assert_eq!(content, "class Program {}");
//!         assert!(was_compressed);
//!     }
//!     other => panic!("unexpected {other:?}"),
//! }
//! # Ok::<(), dotpdb::Error>(())
//! ```
//!
//! # Reference
//! - [Portable PDB Format - Custom Debug Information](https://github.com/dotnet/runtime/blob/main/docs/design/specs/PortablePdb-Metadata.md#language-specific-custom-debug-information-records)

mod encoder;
mod parser;
mod types;

pub use encoder::{encode_async_stepping, encode_embedded_source, encode_hoisted_local_scopes};
pub use parser::parse_custom_debug_blob;
pub use types::{AsyncStepInfo, AwaitPoint, CustomDebugInfo, CustomDebugKind, HoistedScope};
