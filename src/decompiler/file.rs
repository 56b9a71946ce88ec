use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::{
    decompiler::SyntaxNode,
    metadata::{customdebuginformation::AsyncStepInfo, sequencepoints::SequencePoint, token::Token},
};

/// Identifies one decompiled function within a [`DecompiledFile`]
pub type FunctionId = u32;

/// A decompiled function and the compiled methods it came from
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FunctionInfo {
    /// Id referenced by syntax nodes and sequence points
    pub id: FunctionId,
    /// The user-visible method (the kickoff method for state machines)
    pub method: Token,
    /// The state machine `MoveNext` method, for iterators and async methods
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub move_next: Option<Token>,
    /// True for `async` methods
    #[serde(default)]
    pub is_async: bool,
    /// Await points, for async methods
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub async_info: Option<AsyncStepInfo>,
    /// Number of locals hoisted into state machine fields
    #[serde(default)]
    pub hoisted_locals: u32,
}

impl FunctionInfo {
    /// A plain function compiled to `method`
    #[must_use]
    pub fn new(id: FunctionId, method: Token) -> Self {
        FunctionInfo {
            id,
            method,
            move_next: None,
            is_async: false,
            async_info: None,
            hoisted_locals: 0,
        }
    }

    /// The method whose IL the sequence points describe: `MoveNext` if present
    #[must_use]
    pub fn body_method(&self) -> Token {
        self.move_next.unwrap_or(self.method)
    }
}

/// Sequence points of a file, or why there are none
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SequencePointTable {
    /// Ordered points per function
    Points(BTreeMap<FunctionId, Vec<SequencePoint>>),
    /// The decompiler could not produce sequence points
    Omitted(String),
}

impl Default for SequencePointTable {
    fn default() -> Self {
        SequencePointTable::Points(BTreeMap::new())
    }
}

impl SequencePointTable {
    /// Points of one function, `None` if it has none or the table was omitted
    #[must_use]
    pub fn get(&self, function: FunctionId) -> Option<&[SequencePoint]> {
        match self {
            SequencePointTable::Points(points) => points.get(&function).map(Vec::as_slice),
            SequencePointTable::Omitted(_) => None,
        }
    }
}

/// One decompiled source file
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct DecompiledFile {
    /// The complete source text
    pub source: String,
    /// Top-level nodes of the syntax tree, empty if nothing was produced
    #[serde(default)]
    pub syntax_tree: Vec<SyntaxNode>,
    /// Every function annotated somewhere in the tree
    #[serde(default)]
    pub functions: Vec<FunctionInfo>,
    /// Sequence points per function
    #[serde(default)]
    pub sequence_points: SequencePointTable,
}

impl DecompiledFile {
    /// True if the decompiler produced no syntax
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.syntax_tree.is_empty()
    }

    /// Look up a function by id
    #[must_use]
    pub fn function(&self, id: FunctionId) -> Option<&FunctionInfo> {
        self.functions.iter().find(|function| function.id == id)
    }
}
