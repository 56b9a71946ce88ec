use serde::Serialize;

use crate::metadata::token::Token;

/// Kind byte of an import declaration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum ImportKind {
    /// `using Namespace;`
    ImportNamespace = 1,
    /// Namespace of a specific referenced assembly (VB `extern alias` style)
    ImportAssemblyNamespace = 2,
    /// `using static Type;`
    ImportType = 3,
    /// VB XML namespace import
    ImportXmlNamespace = 4,
    /// `extern alias` usage
    ImportAssemblyReferenceAlias = 5,
    /// `extern alias` definition
    DefineAssemblyAlias = 6,
    /// `using Alias = Namespace;`
    DefineNamespaceAlias = 7,
    /// Alias for a namespace of a specific assembly
    DefineAssemblyNamespaceAlias = 8,
    /// `using Alias = Type;`
    DefineTypeAlias = 9,
}

impl ImportKind {
    /// Map a raw kind value back to its variant
    #[must_use]
    pub fn from_u32(value: u32) -> Option<Self> {
        match value {
            1 => Some(ImportKind::ImportNamespace),
            2 => Some(ImportKind::ImportAssemblyNamespace),
            3 => Some(ImportKind::ImportType),
            4 => Some(ImportKind::ImportXmlNamespace),
            5 => Some(ImportKind::ImportAssemblyReferenceAlias),
            6 => Some(ImportKind::DefineAssemblyAlias),
            7 => Some(ImportKind::DefineNamespaceAlias),
            8 => Some(ImportKind::DefineAssemblyNamespaceAlias),
            9 => Some(ImportKind::DefineTypeAlias),
            _ => None,
        }
    }
}

/// One decoded import declaration
#[allow(missing_docs)]
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum ImportDeclaration {
    ImportNamespace {
        namespace: String,
    },
    ImportAssemblyNamespace {
        assembly_ref: Token,
        namespace: String,
    },
    ImportType {
        type_ref: Token,
    },
    ImportXmlNamespace {
        alias: String,
        namespace: String,
    },
    ImportAssemblyReferenceAlias {
        alias: String,
    },
    DefineAssemblyAlias {
        alias: String,
        assembly_ref: Token,
    },
    DefineNamespaceAlias {
        alias: String,
        namespace: String,
    },
    DefineAssemblyNamespaceAlias {
        alias: String,
        assembly_ref: Token,
        namespace: String,
    },
    DefineTypeAlias {
        alias: String,
        type_ref: Token,
    },
}

impl ImportDeclaration {
    /// The imported namespace for plain namespace imports
    #[must_use]
    pub fn namespace(&self) -> Option<&str> {
        match self {
            ImportDeclaration::ImportNamespace { namespace }
            | ImportDeclaration::ImportAssemblyNamespace { namespace, .. } => Some(namespace),
            _ => None,
        }
    }
}

/// All declarations of one imports blob, in blob order
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct ImportsInfo {
    /// The declarations
    pub declarations: Vec<ImportDeclaration>,
}

impl ImportsInfo {
    /// Number of declarations
    #[must_use]
    pub fn len(&self) -> usize {
        self.declarations.len()
    }

    /// True if the blob declared nothing
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.declarations.is_empty()
    }

    /// The namespaces of all namespace imports
    pub fn namespaces(&self) -> impl Iterator<Item = &str> {
        self.declarations.iter().filter_map(ImportDeclaration::namespace)
    }
}
