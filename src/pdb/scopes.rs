//! Import scopes and local scopes of one decompiled file.
//!
//! A single depth-first walk over the syntax tree produces both:
//!
//! - an arena of import scopes mirroring the namespace nesting, each holding the namespaces its
//!   `using` directives import. Slot 0 is the compilation unit itself;
//! - one local scope per compiled method body, spanning the whole IL body and tagged with the
//!   import scope that was active at the method's lexical position.
//!
//! Method bodies are visited before their own method is registered, so lambdas nested in a
//! method come first. The walk is a pure function of the tree, the function table and the
//! module, which lets files be processed on any thread.

use std::collections::BTreeSet;

use log::debug;

use crate::{
    decompiler::{DecompiledFile, FunctionId, NodeKind, SyntaxNode},
    metadata::{module::ModuleInfo, tables::TableId, token::Token},
    Error, Result,
};

/// Deepest syntax nesting the walk accepts
const MAX_NESTING_DEPTH: usize = 512;

/// One node of the import scope tree
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ImportScopeNode {
    /// Arena index of the enclosing scope, `None` for the compilation unit
    pub parent: Option<usize>,
    /// Imported namespaces, sorted and without duplicates
    pub imports: BTreeSet<String>,
}

/// A local scope covering one method body
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LocalScopeRecord {
    /// The `MethodDef` the scope belongs to
    pub method: Token,
    /// Arena index of the active import scope
    pub import_scope: usize,
    /// First IL offset
    pub start_offset: u32,
    /// Length of the range in bytes
    pub length: u32,
}

/// Everything the walk collected for one file
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct FileScopes {
    /// Import scope arena; slot 0 is the compilation unit
    pub import_scopes: Vec<ImportScopeNode>,
    /// Local scopes in discovery order
    pub local_scopes: Vec<LocalScopeRecord>,
    /// Functions that resolved to a `MethodDef`, in discovery order, possibly repeated
    pub functions: Vec<FunctionId>,
}

struct ScopeCollector<'a> {
    file: &'a DecompiledFile,
    module: &'a ModuleInfo,
    current: usize,
    depth: usize,
    result: FileScopes,
}

impl<'a> ScopeCollector<'a> {
    fn new(file: &'a DecompiledFile, module: &'a ModuleInfo) -> Self {
        ScopeCollector {
            file,
            module,
            current: 0,
            depth: 0,
            result: FileScopes {
                import_scopes: vec![ImportScopeNode::default()],
                ..FileScopes::default()
            },
        }
    }

    fn visit_children(&mut self, node: &SyntaxNode) -> Result<()> {
        for (index, child) in node.children.iter().enumerate() {
            self.visit(child, index == 0)?;
        }
        Ok(())
    }

    fn visit(&mut self, node: &SyntaxNode, is_first_child: bool) -> Result<()> {
        if self.depth >= MAX_NESTING_DEPTH {
            return Err(Error::RecursionLimit(MAX_NESTING_DEPTH));
        }
        self.depth += 1;
        let result = self.visit_node(node, is_first_child);
        self.depth -= 1;
        result
    }

    fn visit_node(&mut self, node: &SyntaxNode, is_first_child: bool) -> Result<()> {
        match &node.kind {
            NodeKind::Namespace { .. } => {
                let parent = self.current;
                self.result.import_scopes.push(ImportScopeNode {
                    parent: Some(parent),
                    imports: BTreeSet::new(),
                });
                self.current = self.result.import_scopes.len() - 1;
                let result = self.visit_children(node);
                self.current = parent;
                result
            }
            NodeKind::Using { namespace } => {
                self.result.import_scopes[self.current]
                    .imports
                    .insert(namespace.clone());
                Ok(())
            }
            NodeKind::Property {
                expression_body: true,
            }
            | NodeKind::Indexer {
                expression_body: true,
            } => self.handle_method(node, node.function),
            // The first `from` is the query source, not a lambda
            NodeKind::QueryFrom if !is_first_child => self.handle_method(node, node.function),
            NodeKind::QueryGroup {
                projection: first,
                key: second,
            }
            | NodeKind::QueryJoin {
                on_lambda: first,
                equals_lambda: second,
            } if first.is_some() || second.is_some() => {
                if let Some(child) = node.children.first() {
                    self.handle_method(child, *first)?;
                }
                if let Some(child) = node.children.get(1) {
                    self.handle_method(child, *second)?;
                }
                Ok(())
            }
            kind if kind.is_method_like() => self.handle_method(node, node.function),
            _ => self.visit_children(node),
        }
    }

    fn handle_method(&mut self, node: &SyntaxNode, function: Option<FunctionId>) -> Result<()> {
        self.visit_children(node)?;

        let Some(id) = function else {
            return Ok(());
        };
        let Some(info) = self.file.function(id) else {
            debug!("Syntax node references unknown function {id}");
            return Ok(());
        };
        if !info.method.is_table(TableId::MethodDef) {
            return Ok(());
        }

        self.result.functions.push(id);
        self.add_local_scope(info.method);
        if let Some(move_next) = info.move_next {
            self.add_local_scope(move_next);
        }
        Ok(())
    }

    fn add_local_scope(&mut self, method: Token) {
        let Some(body) = self.module.method(method).and_then(|method| method.body) else {
            return;
        };

        self.result.local_scopes.push(LocalScopeRecord {
            method,
            import_scope: self.current,
            start_offset: 0,
            length: body.code_size,
        });
    }
}

/// Walk the syntax tree of a decompiled file
///
/// ## Arguments
/// * 'file'   - The decompiled file, providing the tree and the function table
/// * 'module' - The module, providing method body sizes
///
/// # Errors
/// Returns [`Error::RecursionLimit`] if the tree nests deeper than the walk allows.
pub fn collect_scopes(file: &DecompiledFile, module: &ModuleInfo) -> Result<FileScopes> {
    let mut collector = ScopeCollector::new(file, module);
    for (index, node) in file.syntax_tree.iter().enumerate() {
        collector.visit(node, index == 0)?;
    }
    Ok(collector.result)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        decompiler::{FunctionInfo, SequencePointTable},
        metadata::module::ModuleInfoBuilder,
    };

    fn module() -> (ModuleInfo, Vec<Token>) {
        let mut builder = ModuleInfoBuilder::new("App.dll");
        let program = builder.add_type("App", "Program");
        let methods = vec![
            builder.add_method(program, "Main", Some((30, 0))),
            builder.add_method(program, "<Main>b__0", Some((8, 0))),
            builder.add_method(program, "RunAsync", Some((40, 0))),
            builder.add_method(program, "MoveNext", Some((120, 2))),
            builder.add_method(program, "Abstract", None),
        ];
        (builder.build(), methods)
    }

    fn file(tree: Vec<SyntaxNode>, functions: Vec<FunctionInfo>) -> DecompiledFile {
        DecompiledFile {
            source: String::new(),
            syntax_tree: tree,
            functions,
            sequence_points: SequencePointTable::default(),
        }
    }

    #[test]
    fn namespaces_and_usings() {
        let (module, methods) = module();
        let tree = vec![
            SyntaxNode::using("System"),
            SyntaxNode::namespace(
                "App",
                vec![
                    SyntaxNode::using("System.Linq"),
                    SyntaxNode::using("System.Collections.Generic"),
                    SyntaxNode::using("System.Linq"),
                    SyntaxNode::namespace("Inner", vec![SyntaxNode::method(0)]),
                ],
            ),
        ];
        let file = file(tree, vec![FunctionInfo::new(0, methods[0])]);

        let scopes = collect_scopes(&file, &module).unwrap();
        assert_eq!(scopes.import_scopes.len(), 3);
        assert_eq!(scopes.import_scopes[0].parent, None);
        assert!(scopes.import_scopes[0].imports.contains("System"));
        assert_eq!(scopes.import_scopes[1].parent, Some(0));
        assert_eq!(
            scopes.import_scopes[1].imports.iter().collect::<Vec<_>>(),
            ["System.Collections.Generic", "System.Linq"]
        );
        assert_eq!(scopes.import_scopes[2].parent, Some(1));

        assert_eq!(
            scopes.local_scopes,
            vec![LocalScopeRecord {
                method: methods[0],
                import_scope: 2,
                start_offset: 0,
                length: 30
            }]
        );
    }

    #[test]
    fn lambdas_before_their_method() {
        let (module, methods) = module();
        let tree = vec![SyntaxNode::method(0).with_child(
            SyntaxNode::new(NodeKind::Other)
                .with_child(SyntaxNode::new(NodeKind::Lambda).with_function(1)),
        )];
        let file = file(
            tree,
            vec![
                FunctionInfo::new(0, methods[0]),
                FunctionInfo::new(1, methods[1]),
            ],
        );

        let scopes = collect_scopes(&file, &module).unwrap();
        assert_eq!(scopes.functions, vec![1, 0]);
        assert_eq!(scopes.local_scopes[0].method, methods[1]);
        assert_eq!(scopes.local_scopes[1].method, methods[0]);
    }

    #[test]
    fn state_machine_scopes() {
        let (module, methods) = module();
        let mut function = FunctionInfo::new(0, methods[2]);
        function.move_next = Some(methods[3]);
        function.is_async = true;

        let file = file(vec![SyntaxNode::method(0)], vec![function]);
        let scopes = collect_scopes(&file, &module).unwrap();

        assert_eq!(scopes.local_scopes.len(), 2);
        assert_eq!(scopes.local_scopes[0].method, methods[2]);
        assert_eq!(scopes.local_scopes[0].length, 40);
        assert_eq!(scopes.local_scopes[1].method, methods[3]);
        assert_eq!(scopes.local_scopes[1].length, 120);
    }

    #[test]
    fn unresolved_functions() {
        let (module, methods) = module();
        let tree = vec![
            SyntaxNode::method(0),
            SyntaxNode::method(7),
            SyntaxNode::new(NodeKind::Method),
            SyntaxNode::method(2),
        ];
        let file = file(
            tree,
            vec![
                FunctionInfo::new(0, methods[4]),
                FunctionInfo::new(2, Token::type_def(2)),
            ],
        );

        let scopes = collect_scopes(&file, &module).unwrap();
        // Known method without a body: registered, but no scope
        assert_eq!(scopes.functions, vec![0]);
        assert!(scopes.local_scopes.is_empty());
    }

    #[test]
    fn queries_and_properties() {
        let (module, methods) = module();
        let query = SyntaxNode::new(NodeKind::Other)
            .with_child(SyntaxNode::new(NodeKind::QueryFrom).with_function(0))
            .with_child(SyntaxNode::new(NodeKind::QueryFrom).with_function(1))
            .with_child(
                SyntaxNode::new(NodeKind::QueryGroup {
                    projection: Some(2),
                    key: None,
                })
                .with_child(SyntaxNode::new(NodeKind::Other))
                .with_child(SyntaxNode::new(NodeKind::Other)),
            );
        let property = SyntaxNode::new(NodeKind::Property {
            expression_body: true,
        })
        .with_function(3);
        let plain_property = SyntaxNode::new(NodeKind::Property {
            expression_body: false,
        })
        .with_function(0)
        .with_child(SyntaxNode::new(NodeKind::Accessor).with_function(0));

        let file = file(
            vec![query, property, plain_property],
            vec![
                FunctionInfo::new(0, methods[0]),
                FunctionInfo::new(1, methods[1]),
                FunctionInfo::new(2, methods[2]),
                FunctionInfo::new(3, methods[3]),
            ],
        );

        let scopes = collect_scopes(&file, &module).unwrap();
        // first `from` skipped, group projection handled, expression body handled, accessor handled
        assert_eq!(scopes.functions, vec![1, 2, 3, 0]);
    }

    #[test]
    fn nesting_limit() {
        let (module, _) = module();
        let mut node = SyntaxNode::new(NodeKind::Other);
        for _ in 0..MAX_NESTING_DEPTH + 1 {
            node = SyntaxNode::new(NodeKind::Other).with_child(node);
        }

        let file = file(vec![node], Vec::new());
        assert!(matches!(
            collect_scopes(&file, &module),
            Err(Error::RecursionLimit(_))
        ));
    }
}
