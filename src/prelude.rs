//! # dotpdb Prelude
//!
//! This module provides a convenient prelude for the most commonly used types and traits
//! from the dotpdb library. Import it to get quick access to everything needed to generate
//! or inspect a Portable PDB.

// ================================================================================================
// Core Types and Error Handling
// ================================================================================================

/// The main error type for all dotpdb operations
pub use crate::Error;

/// The result type used throughout dotpdb
pub use crate::Result;

/// Low-level file parsing utilities
pub use crate::{File, Parser};

// ================================================================================================
// Metadata
// ================================================================================================

/// The view of a compiled module the generator works from
pub use crate::metadata::module::{ModuleInfo, ModuleInfoBuilder};

/// Metadata tokens
pub use crate::metadata::token::Token;

/// Metadata table identifiers
pub use crate::metadata::tables::TableId;

/// Sequence points and their blob codec
pub use crate::metadata::sequencepoints::{
    encode_sequence_points, parse_sequence_points, SequencePoint, SequencePoints,
};

/// Non-fatal generation problems
pub use crate::metadata::diagnostics::{
    Diagnostic, DiagnosticCategory, DiagnosticSeverity, Diagnostics,
};

// ================================================================================================
// Decompiler
// ================================================================================================

/// The decompiler interface and its data model
pub use crate::decompiler::{
    DecompiledFile, Decompiler, FunctionInfo, JsonDecompiler, NodeKind, SequencePointTable,
    SyntaxNode,
};

// ================================================================================================
// PDB
// ================================================================================================

/// Generation
pub use crate::pdb::{
    ContentId, GeneratedPdb, GenerationReport, GeneratorOptions, PdbGenerator, ProgressObserver,
};

/// Reading
pub use crate::pdb::PortablePdb;
