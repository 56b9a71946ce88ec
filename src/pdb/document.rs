//! Source documents: virtual paths, hashes, embedded text and name blobs.
//!
//! Every decompiled file becomes one `Document` row. Its name is a virtual, slash-delimited path
//! derived from the namespace and name of the first type in the file, the same path a whole
//! project decompilation would write the file to. The source text is hashed (SHA-256) for
//! the debugger's checksum verification and embedded, deflate-compressed, so that no source
//! file has to exist on disk.

use uguid::{guid, Guid};

use crate::{
    file::parser::Parser,
    metadata::{
        customdebuginformation::encode_embedded_source,
        streams::{Blob, BlobBuilder},
    },
    utils::{compute_sha256, write_compressed_uint},
    Result,
};

/// `HashAlgorithm` GUID of SHA-256
pub const HASH_ALGORITHM_SHA256: Guid = guid!("8829d00f-11b8-4213-878b-770e8597ac16");

/// `Language` GUID of C#
pub const LANGUAGE_CSHARP: Guid = guid!("3f5162f8-07c6-11d3-9053-00c04fa302a1");

/// Separator of virtual paths and of document name blobs
pub const PATH_SEPARATOR: char = '/';

const MAX_SEGMENT_LENGTH: usize = 255;

const RESERVED_NAMES: [&str; 22] = [
    "CON", "PRN", "AUX", "NUL", "COM1", "COM2", "COM3", "COM4", "COM5", "COM6", "COM7", "COM8",
    "COM9", "LPT1", "LPT2", "LPT3", "LPT4", "LPT5", "LPT6", "LPT7", "LPT8", "LPT9",
];

fn is_reserved_name(name: &str) -> bool {
    let stem = name.split('.').next().unwrap_or(name);
    RESERVED_NAMES
        .iter()
        .any(|reserved| reserved.eq_ignore_ascii_case(stem))
}

/// Turn a metadata name into something usable as a file or directory name.
///
/// Anything after a `:` and the generic arity suffix are cut, characters other than letters,
/// digits, `-` and `_` become `-`, segments are capped at 255 characters and device names get a
/// trailing `_`. With `separate_at_dots` each `.` starts a new directory.
fn clean_up_name(text: &str, separate_at_dots: bool) -> String {
    let mut text = text;
    if let Some(pos) = text.find(':').filter(|pos| *pos > 0) {
        text = &text[..pos];
    }
    text = text.trim();
    if let Some(pos) = text.find('`').filter(|pos| *pos > 0) {
        text = text[..pos].trim();
    }

    let mut segments: Vec<String> = Vec::new();
    let mut current = String::new();
    let mut segment_length = 0;
    for c in text.chars() {
        segment_length += 1;
        if c.is_alphanumeric() || c == '-' || c == '_' {
            if segment_length <= MAX_SEGMENT_LENGTH {
                current.push(c);
            }
        } else if c == '.' && !current.is_empty() && !current.ends_with('.') {
            if separate_at_dots {
                segments.push(std::mem::take(&mut current));
                segment_length = 0;
            } else {
                current.push('.');
            }
        } else if segment_length <= MAX_SEGMENT_LENGTH {
            current.push('-');
        }
    }
    if !current.is_empty() || segments.is_empty() {
        segments.push(current);
    }

    let cleaned: Vec<String> = segments
        .into_iter()
        .map(|segment| {
            if segment.is_empty() {
                "-".to_string()
            } else if is_reserved_name(&segment) {
                segment + "_"
            } else {
                segment
            }
        })
        .collect();
    cleaned.join(&PATH_SEPARATOR.to_string())
}

/// The virtual path of the file a top-level type is decompiled into
///
/// ## Arguments
/// * 'namespace'          - Namespace of the type, may be empty
/// * 'type_name'          - Name of the type, generic arity included
/// * 'nested_directories' - One directory per namespace segment, otherwise a single directory
///   named after the whole namespace
///
/// # Examples
///
/// ```rust
/// use dotpdb::pdb::virtual_path;
///
/// assert_eq!(virtual_path("App.Models", "List`1", true), "App/Models/List.cs");
/// assert_eq!(virtual_path("App.Models", "List`1", false), "App.Models/List.cs");
/// assert_eq!(virtual_path("", "Program", true), "Program.cs");
/// ```
#[must_use]
pub fn virtual_path(namespace: &str, type_name: &str, nested_directories: bool) -> String {
    let file_name = clean_up_name(type_name, false) + ".cs";
    if namespace.is_empty() {
        return file_name;
    }

    let directory = clean_up_name(namespace, nested_directories);
    format!("{directory}{PATH_SEPARATOR}{file_name}")
}

/// A source document ready to be added to the PDB
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceDocument {
    /// Virtual path, slash-delimited
    pub path: String,
    /// SHA-256 of the UTF-8 source text
    pub hash: [u8; 32],
    /// Embedded source blob
    pub embedded_source: Vec<u8>,
}

impl SourceDocument {
    /// Hash and compress a source text
    ///
    /// # Errors
    /// Returns an error if the text is too large to embed or compression fails.
    pub fn new(path: &str, text: &str) -> Result<Self> {
        Ok(SourceDocument {
            path: path.to_string(),
            hash: compute_sha256(text.as_bytes()),
            embedded_source: encode_embedded_source(text)?,
        })
    }
}

/// Encode a path as a document name blob, interning each part into `blobs`
///
/// The blob is the separator character followed by the compressed `#Blob` index of every
/// part; empty parts use index 0.
///
/// # Errors
/// Returns an error if a heap index exceeds the compressed integer range.
pub fn encode_document_name(path: &str, blobs: &mut BlobBuilder) -> Result<Vec<u8>> {
    let mut blob = vec![PATH_SEPARATOR as u8];
    for part in path.split(PATH_SEPARATOR) {
        write_compressed_uint(blobs.add(part.as_bytes())?, &mut blob)?;
    }
    Ok(blob)
}

/// Decode a document name blob
///
/// # Errors
/// Returns an error if the blob is empty, truncated or references a missing heap entry.
pub fn decode_document_name(data: &[u8], blobs: &Blob) -> Result<String> {
    let mut parser = Parser::new(data);
    let separator = parser.read_le::<u8>()?;

    let mut name = String::new();
    let mut first = true;
    while parser.has_more_data() {
        if !first && separator != 0 {
            name.push(char::from(separator));
        }
        first = false;

        let part = blobs.get(parser.read_compressed_uint()? as usize)?;
        name.push_str(&String::from_utf8_lossy(part));
    }

    Ok(name)
}
