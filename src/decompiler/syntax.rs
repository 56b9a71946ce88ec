use serde::{Deserialize, Serialize};

use crate::decompiler::FunctionId;

/// Syntactic category of a node, as far as debug information cares
///
/// Everything that neither opens an import scope, adds an import, nor compiles to its own
/// method is [`NodeKind::Other`].
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum NodeKind {
    /// `namespace Name { ... }`
    Namespace {
        /// Declared name, possibly dotted
        name: String,
    },
    /// `using Namespace;`
    Using {
        /// The imported namespace
        namespace: String,
    },
    /// Method declaration
    Method,
    /// Property or event accessor
    Accessor,
    /// Instance or static constructor
    Constructor,
    /// Finalizer
    Destructor,
    /// Operator or conversion
    Operator,
    /// `x => ...`
    Lambda,
    /// `delegate (...) { ... }`
    AnonymousMethod,
    /// Property declaration
    Property {
        /// `int P => expr;`, compiled to a single getter
        #[serde(default)]
        expression_body: bool,
    },
    /// Indexer declaration
    Indexer {
        /// `int this[int i] => expr;`, compiled to a single getter
        #[serde(default)]
        expression_body: bool,
    },
    /// Query `from` clause
    QueryFrom,
    /// Query `let` clause
    QueryLet,
    /// Query `orderby` ordering
    QueryOrdering,
    /// Query `select` clause
    QuerySelect,
    /// Query `where` clause
    QueryWhere,
    /// Query `group` clause; the first child is the projection, the second the key
    QueryGroup {
        /// Lambda compiled from the projection
        #[serde(default)]
        projection: Option<FunctionId>,
        /// Lambda compiled from the key
        #[serde(default)]
        key: Option<FunctionId>,
    },
    /// Query `join` clause; the first child is the `on` expression, the second the `equals`
    QueryJoin {
        /// Lambda compiled from the `on` expression
        #[serde(default, rename = "on")]
        on_lambda: Option<FunctionId>,
        /// Lambda compiled from the `equals` expression
        #[serde(default, rename = "equals")]
        equals_lambda: Option<FunctionId>,
    },
    /// Anything else: type declarations, statements, expressions
    #[default]
    Other,
}

impl NodeKind {
    /// True for constructs that compile to a method of their own
    #[must_use]
    pub fn is_method_like(&self) -> bool {
        matches!(
            self,
            NodeKind::Method
                | NodeKind::Accessor
                | NodeKind::Constructor
                | NodeKind::Destructor
                | NodeKind::Operator
                | NodeKind::Lambda
                | NodeKind::AnonymousMethod
                | NodeKind::QueryLet
                | NodeKind::QueryOrdering
                | NodeKind::QuerySelect
                | NodeKind::QueryWhere
        )
    }
}

/// A node of the decompiled syntax tree
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct SyntaxNode {
    /// What this node is
    #[serde(flatten)]
    pub kind: NodeKind,
    /// The function this node was decompiled from, for method-like nodes
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub function: Option<FunctionId>,
    /// Child nodes in source order
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<SyntaxNode>,
}

impl SyntaxNode {
    /// A node without annotation or children
    #[must_use]
    pub fn new(kind: NodeKind) -> Self {
        SyntaxNode {
            kind,
            function: None,
            children: Vec::new(),
        }
    }

    /// Annotate with the function this node compiles to
    #[must_use]
    pub fn with_function(mut self, function: FunctionId) -> Self {
        self.function = Some(function);
        self
    }

    /// Append a child node
    #[must_use]
    pub fn with_child(mut self, child: SyntaxNode) -> Self {
        self.children.push(child);
        self
    }

    /// `namespace name { children }`
    #[must_use]
    pub fn namespace(name: &str, children: Vec<SyntaxNode>) -> Self {
        SyntaxNode {
            kind: NodeKind::Namespace {
                name: name.to_string(),
            },
            function: None,
            children,
        }
    }

    /// `using namespace;`
    #[must_use]
    pub fn using(namespace: &str) -> Self {
        SyntaxNode::new(NodeKind::Using {
            namespace: namespace.to_string(),
        })
    }

    /// A method declaration compiled from `function`
    #[must_use]
    pub fn method(function: FunctionId) -> Self {
        SyntaxNode::new(NodeKind::Method).with_function(function)
    }

    /// Number of nodes in this subtree, including this one
    #[must_use]
    pub fn node_count(&self) -> usize {
        1 + self.children.iter().map(SyntaxNode::node_count).sum::<usize>()
    }
}
