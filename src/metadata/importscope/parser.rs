use crate::{
    file::parser::Parser,
    metadata::{
        importscope::types::{ImportDeclaration, ImportKind, ImportsInfo},
        streams::Blob,
        tables::{CodedIndex, CodedIndexType, TableId},
        token::Token,
    },
    Result,
};

struct ImportsParser<'a> {
    parser: Parser<'a>,
    blobs: &'a Blob<'a>,
}

impl<'a> ImportsParser<'a> {
    fn new(data: &'a [u8], blobs: &'a Blob<'a>) -> Self {
        ImportsParser {
            parser: Parser::new(data),
            blobs,
        }
    }

    fn parse_imports(&mut self) -> Result<ImportsInfo> {
        let mut declarations = Vec::new();

        while self.parser.has_more_data() {
            let kind_value = self.parser.read_compressed_uint()?;
            let Some(kind) = ImportKind::from_u32(kind_value) else {
                return Err(malformed_error!("Invalid import kind - {}", kind_value));
            };

            let declaration = match kind {
                ImportKind::ImportNamespace => ImportDeclaration::ImportNamespace {
                    namespace: self.read_blob_string()?,
                },
                ImportKind::ImportAssemblyNamespace => ImportDeclaration::ImportAssemblyNamespace {
                    assembly_ref: self.read_assembly_ref()?,
                    namespace: self.read_blob_string()?,
                },
                ImportKind::ImportType => ImportDeclaration::ImportType {
                    type_ref: self.read_type()?,
                },
                ImportKind::ImportXmlNamespace => ImportDeclaration::ImportXmlNamespace {
                    alias: self.read_blob_string()?,
                    namespace: self.read_blob_string()?,
                },
                ImportKind::ImportAssemblyReferenceAlias => {
                    ImportDeclaration::ImportAssemblyReferenceAlias {
                        alias: self.read_blob_string()?,
                    }
                }
                ImportKind::DefineAssemblyAlias => ImportDeclaration::DefineAssemblyAlias {
                    alias: self.read_blob_string()?,
                    assembly_ref: self.read_assembly_ref()?,
                },
                ImportKind::DefineNamespaceAlias => ImportDeclaration::DefineNamespaceAlias {
                    alias: self.read_blob_string()?,
                    namespace: self.read_blob_string()?,
                },
                ImportKind::DefineAssemblyNamespaceAlias => {
                    ImportDeclaration::DefineAssemblyNamespaceAlias {
                        alias: self.read_blob_string()?,
                        assembly_ref: self.read_assembly_ref()?,
                        namespace: self.read_blob_string()?,
                    }
                }
                ImportKind::DefineTypeAlias => ImportDeclaration::DefineTypeAlias {
                    alias: self.read_blob_string()?,
                    type_ref: self.read_type()?,
                },
            };

            declarations.push(declaration);
        }

        Ok(ImportsInfo { declarations })
    }

    fn read_blob_string(&mut self) -> Result<String> {
        let blob_index = self.parser.read_compressed_uint()?;
        let blob_data = self.blobs.get(blob_index as usize)?;
        Ok(String::from_utf8_lossy(blob_data).into_owned())
    }

    fn read_assembly_ref(&mut self) -> Result<Token> {
        let row = self.parser.read_compressed_uint()?;
        Ok(Token::from_parts(TableId::AssemblyRef, row))
    }

    // TypeDefOrRefOrSpecEncoded: row << 2 | tag
    fn read_type(&mut self) -> Result<Token> {
        let value = self.parser.read_compressed_uint()?;
        Ok(CodedIndex::decode(value, CodedIndexType::TypeDefOrRef)?.token)
    }
}

/// Decode an imports blob
///
/// ## Arguments
/// * 'data'  - The imports blob
/// * 'blobs' - The `#Blob` heap the strings are stored in
///
/// # Errors
/// Returns an error for unknown kinds, truncated data or invalid heap indices.
pub fn parse_imports_blob(data: &[u8], blobs: &Blob) -> Result<ImportsInfo> {
    if data.is_empty() {
        return Ok(ImportsInfo::default());
    }

    ImportsParser::new(data, blobs).parse_imports()
}

#[cfg(test)]
mod tests {
    use super::*;

    // 0: empty, 1: "System", 8: "Col"
    const HEAP: [u8; 12] = [
        0x00, 0x06, b'S', b'y', b's', b't', b'e', b'm', 0x03, b'C', b'o', b'l',
    ];

    #[test]
    fn empty_blob() {
        let blobs = Blob::from(&HEAP).unwrap();
        assert!(parse_imports_blob(&[], &blobs).unwrap().is_empty());
    }

    #[test]
    fn namespaces_and_aliases() {
        let blobs = Blob::from(&HEAP).unwrap();
        let data = [
            0x01, 0x01, // using System;
            0x07, 0x08, 0x01, // using Col = System;
            0x02, 0x03, 0x01, // System from AssemblyRef 3
            0x03, 0x0D, // using static TypeRef 3
        ];

        let imports = parse_imports_blob(&data, &blobs).unwrap();
        assert_eq!(imports.len(), 4);
        assert_eq!(
            imports.declarations[1],
            ImportDeclaration::DefineNamespaceAlias {
                alias: "Col".to_string(),
                namespace: "System".to_string()
            }
        );
        assert_eq!(
            imports.declarations[2],
            ImportDeclaration::ImportAssemblyNamespace {
                assembly_ref: Token(0x2300_0003),
                namespace: "System".to_string()
            }
        );
        assert_eq!(
            imports.declarations[3],
            ImportDeclaration::ImportType {
                type_ref: Token(0x0100_0003)
            }
        );
        assert_eq!(imports.namespaces().collect::<Vec<_>>(), ["System", "System"]);
    }

    #[test]
    fn invalid() {
        let blobs = Blob::from(&HEAP).unwrap();
        assert!(parse_imports_blob(&[0x0A, 0x01], &blobs).is_err());
        assert!(parse_imports_blob(&[0x01], &blobs).is_err());
        assert!(parse_imports_blob(&[0x01, 0x40], &blobs).is_err());
    }
}
