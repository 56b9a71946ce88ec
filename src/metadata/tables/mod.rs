//! Metadata table rows.
//!
//! Two families of tables live here. The Portable PDB debug tables (`0x30..=0x37`) are both
//! written by the generator and read back by [`crate::pdb::PortablePdb`]. The handful of
//! assembly tables the generator needs to understand its input (`Module`, `TypeDef`, `MethodDef`
//! and `NestedClass`) are read-only.
//!
//! Every table follows the same layout: a `raw` module with the row struct implementing
//! [`types::RowReadable`] (and [`types::RowWritable`] for the debug tables), re-exported here.
//!
//! # Reference
//! * [ECMA-335 II.22 - Metadata logical format: tables](https://www.ecma-international.org/publications-and-standards/standards/ecma-335/)
//! * [Portable PDB Format](https://github.com/dotnet/runtime/blob/main/docs/design/specs/PortablePdb-Metadata.md)

mod customdebuginformation;
mod document;
mod importscope;
mod localconstant;
mod localscope;
mod localvariable;
mod methoddebuginformation;
mod methoddef;
mod module;
mod nestedclass;
mod statemachinemethod;
mod typedef;
pub mod types;

pub use customdebuginformation::CustomDebugInformationRaw;
pub use document::DocumentRaw;
pub use importscope::ImportScopeRaw;
pub use localconstant::LocalConstantRaw;
pub use localscope::LocalScopeRaw;
pub use localvariable::{LocalVariableAttributes, LocalVariableRaw};
pub use methoddebuginformation::MethodDebugInformationRaw;
pub use methoddef::MethodDefRaw;
pub use module::ModuleRaw;
pub use nestedclass::NestedClassRaw;
pub use statemachinemethod::StateMachineMethodRaw;
pub use typedef::{TypeAttributes, TypeDefRaw};
pub use types::*;
