use crate::{
    metadata::{importscope::ImportKind, streams::BlobBuilder},
    utils::write_compressed_uint,
    Result,
};

/// Encode namespace imports into an imports blob.
///
/// Each namespace name is interned into `blobs` as UTF-8 and referenced by its heap index. The
/// declarations are written in iteration order, so callers pass an ordered set.
///
/// # Errors
/// Returns an error if a blob index exceeds the compressed integer range.
pub fn encode_imports<'a, I>(namespaces: I, blobs: &mut BlobBuilder) -> Result<Vec<u8>>
where
    I: IntoIterator<Item = &'a str>,
{
    let mut writer = Vec::new();
    for namespace in namespaces {
        writer.push(ImportKind::ImportNamespace as u8);
        write_compressed_uint(blobs.add(namespace.as_bytes())?, &mut writer)?;
    }

    Ok(writer)
}
