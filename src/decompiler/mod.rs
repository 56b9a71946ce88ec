//! The decompiler side of PDB generation.
//!
//! dotpdb does not decompile anything itself. For every group of top-level types that end up in
//! one source file, a [`Decompiler`] hands back the finished source text together with what the
//! generator needs to describe it to a debugger:
//!
//! - a syntax tree whose method-like nodes are annotated with function ids, used to build
//!   import scopes and local scopes ([`SyntaxNode`], [`NodeKind`]);
//! - a function table mapping ids to compiled methods, state machine `MoveNext` methods and async
//!   stepping information ([`FunctionInfo`]);
//! - per function, the ordered sequence points into the source text ([`SequencePointTable`]).
//!
//! [`JsonDecompiler`] reads all of this from a manifest produced by an external tool.
//!
//! # Examples
//!
//! ```rust
//! use dotpdb::decompiler::{DecompiledFile, Decompiler};
//! use dotpdb::metadata::{module::ModuleInfo, token::Token};
//!
//! struct Fixed(DecompiledFile);
//!
//! impl Decompiler for Fixed {
//!     fn decompile_types(&self, _module: &ModuleInfo, _types: &[Token]) -> dotpdb::Result<DecompiledFile> {
//!         Ok(self.0.clone())
//!     }
//! }
//! ```

mod file;
mod json;
mod syntax;

pub use file::{DecompiledFile, FunctionId, FunctionInfo, SequencePointTable};
pub use json::{JsonDecompiler, Manifest, ManifestEntry};
pub use syntax::{NodeKind, SyntaxNode};

use crate::{
    metadata::{module::ModuleInfo, token::Token},
    Result,
};

/// Source for decompiled files
///
/// Implementations are called from the worker threads of the generator, one call per source file.
pub trait Decompiler: Send + Sync {
    /// Decompile the given top-level types into one source file
    ///
    /// ## Arguments
    /// * 'module' - The module being described
    /// * 'types'  - `TypeDef` tokens of all top-level types sharing one virtual path, in row order
    ///
    /// # Errors
    /// Returns an error if the types cannot be decompiled; the generator skips the file.
    fn decompile_types(&self, module: &ModuleInfo, types: &[Token]) -> Result<DecompiledFile>;

    /// Whether a type is hidden from decompiled output (compiler generated, for example)
    fn is_hidden(&self, _module: &ModuleInfo, _type_token: Token) -> bool {
        false
    }
}
