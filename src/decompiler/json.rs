use std::{collections::BTreeSet, path::Path};

use log::debug;
use serde::{Deserialize, Serialize};

use crate::{
    decompiler::{DecompiledFile, Decompiler},
    metadata::{module::ModuleInfo, token::Token},
    Error, Result,
};

/// One decompiled file of a [`Manifest`]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ManifestEntry {
    /// `TypeDef` tokens of the top-level types this file covers
    pub types: Vec<Token>,
    /// The decompiled file
    pub file: DecompiledFile,
}

/// Output of an external decompiler run
///
/// ```json
/// {
///   "hidden": ["0x02000005"],
///   "files": [
///     {
///       "types": ["0x02000002"],
///       "file": {
///         "source": "namespace App;\n...",
///         "syntax_tree": [{ "kind": "method", "function": 0 }],
///         "functions": [{ "id": 0, "method": "0x06000001" }],
///         "sequence_points": { "points": { "0": [{ "il_offset": 0, "start_line": 3 }] } }
///       }
///     }
///   ]
/// }
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Manifest {
    /// Types the decompiler chose not to show
    #[serde(default)]
    pub hidden: Vec<Token>,
    /// Decompiled files
    #[serde(default)]
    pub files: Vec<ManifestEntry>,
}

/// A [`Decompiler`] answering from a JSON [`Manifest`]
///
/// A request is answered by the manifest entry whose type set equals the requested one.
///
/// # Examples
///
/// ```rust
/// use dotpdb::decompiler::{Decompiler, JsonDecompiler};
/// use dotpdb::metadata::module::ModuleInfoBuilder;
///
/// let mut builder = ModuleInfoBuilder::new("App.dll");
/// let program = builder.add_type("App", "Program");
/// let module = builder.build();
///
/// let decompiler = JsonDecompiler::from_json(&format!(
///     r#"{{ "files": [{{ "types": ["{program}"], "file": {{ "source": "class Program {{}}" }} }}] }}"#
/// ))?;
/// let file = decompiler.decompile_types(&module, &[program])?;
/// assert_eq!(file.source, "class Program {}");
/// # Ok::<(), dotpdb::Error>(())
/// ```
#[derive(Debug, Clone, Default)]
pub struct JsonDecompiler {
    manifest: Manifest,
    hidden: BTreeSet<Token>,
}

impl JsonDecompiler {
    /// Wrap an already loaded manifest
    #[must_use]
    pub fn new(manifest: Manifest) -> Self {
        let hidden = manifest.hidden.iter().copied().collect();
        JsonDecompiler { manifest, hidden }
    }

    /// Parse a manifest from JSON text
    ///
    /// # Errors
    /// Returns [`Error::Json`] if the text is not a valid manifest.
    pub fn from_json(text: &str) -> Result<Self> {
        Ok(Self::new(serde_json::from_str(text)?))
    }

    /// Load a manifest file
    ///
    /// # Errors
    /// Returns an error if the file cannot be read or is not a valid manifest.
    pub fn from_file(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        let decompiler = Self::from_json(&text)?;
        debug!(
            "Loaded decompiler manifest {} with {} file(s)",
            path.display(),
            decompiler.manifest.files.len()
        );
        Ok(decompiler)
    }

    /// The loaded manifest
    #[must_use]
    pub fn manifest(&self) -> &Manifest {
        &self.manifest
    }
}

impl Decompiler for JsonDecompiler {
    fn decompile_types(&self, _module: &ModuleInfo, types: &[Token]) -> Result<DecompiledFile> {
        let requested: BTreeSet<Token> = types.iter().copied().collect();

        self.manifest
            .files
            .iter()
            .find(|entry| entry.types.iter().copied().collect::<BTreeSet<_>>() == requested)
            .map(|entry| entry.file.clone())
            .ok_or_else(|| {
                let names: Vec<String> = types.iter().map(Token::to_string).collect();
                Error::Decompiler(format!(
                    "Manifest has no file for types [{}]",
                    names.join(", ")
                ))
            })
    }

    fn is_hidden(&self, _module: &ModuleInfo, type_token: Token) -> bool {
        self.hidden.contains(&type_token)
    }
}
