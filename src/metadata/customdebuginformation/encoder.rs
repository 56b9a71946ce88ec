use crate::{
    metadata::{
        customdebuginformation::types::{AsyncStepInfo, HoistedScope},
        tables::TableId,
        token::Token,
    },
    utils::{deflate, write_compressed_uint},
    Result,
};

/// Build an embedded source blob: `i32` LE uncompressed length, then raw deflate
///
/// # Errors
/// Returns an error if the text exceeds `i32::MAX` bytes or compression fails.
pub fn encode_embedded_source(text: &str) -> Result<Vec<u8>> {
    let Ok(length) = i32::try_from(text.len()) else {
        return Err(malformed_error!(
            "Source of {} bytes is too large to embed",
            text.len()
        ));
    };

    let compressed = deflate(text.as_bytes())?;

    let mut blob = Vec::with_capacity(compressed.len() + 4);
    blob.extend_from_slice(&length.to_le_bytes());
    blob.extend_from_slice(&compressed);
    Ok(blob)
}

/// Build a state machine hoisted local scopes blob
#[must_use]
pub fn encode_hoisted_local_scopes(scopes: &[HoistedScope]) -> Vec<u8> {
    let mut blob = Vec::with_capacity(scopes.len() * 8);
    for scope in scopes {
        blob.extend_from_slice(&scope.start.to_le_bytes());
        blob.extend_from_slice(&scope.length.to_le_bytes());
    }
    blob
}

/// Build an async method stepping information blob
///
/// The catch handler offset is stored biased by one so that 0 means "none". Every await resumes
/// in `method`, the method the blob is attached to.
///
/// ## Arguments
/// * 'info'   - Catch handler and awaits
/// * 'method' - `MethodDef` token of the parent method
///
/// # Errors
/// Returns an error if `method` is not a `MethodDef` token, an await names a different resume
/// method, or an offset overflows.
pub fn encode_async_stepping(info: &AsyncStepInfo, method: Token) -> Result<Vec<u8>> {
    if !method.is_table(TableId::MethodDef) {
        return Err(malformed_error!(
            "Async stepping parent {} is not a MethodDef",
            method
        ));
    }

    let catch_handler = match info.catch_handler_offset {
        None => 0,
        Some(offset) => offset.checked_add(1).ok_or_else(|| {
            malformed_error!("Catch handler offset {} overflows", offset)
        })?,
    };

    let mut blob = Vec::with_capacity(4 + info.awaits.len() * 10);
    blob.extend_from_slice(&catch_handler.to_le_bytes());

    for point in &info.awaits {
        if !point.resume_method.is_null() && point.resume_method != method {
            return Err(malformed_error!(
                "Await at 0x{:x} resumes in {}, not in {}",
                point.yield_offset,
                point.resume_method,
                method
            ));
        }

        blob.extend_from_slice(&point.yield_offset.to_le_bytes());
        blob.extend_from_slice(&point.resume_offset.to_le_bytes());
        write_compressed_uint(method.row(), &mut blob)?;
    }

    Ok(blob)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metadata::{customdebuginformation::AwaitPoint, token::Token};

    #[test]
    fn embedded_source_header() {
        let blob = encode_embedded_source("abc").unwrap();
        assert_eq!(&blob[..4], &[3, 0, 0, 0]);
        assert_eq!(crate::utils::inflate(&blob[4..], 3).unwrap(), b"abc");
    }

    #[test]
    fn hoisted_scopes() {
        let blob = encode_hoisted_local_scopes(&[
            HoistedScope { start: 0, length: 0x20 },
            HoistedScope { start: 0, length: 0x20 },
        ]);
        assert_eq!(blob, [0, 0, 0, 0, 0x20, 0, 0, 0, 0, 0, 0, 0, 0x20, 0, 0, 0]);
        assert!(encode_hoisted_local_scopes(&[]).is_empty());
    }

    #[test]
    fn async_stepping() {
        let info = AsyncStepInfo {
            catch_handler_offset: Some(0x40),
            awaits: vec![AwaitPoint {
                yield_offset: 0x10,
                resume_offset: 0x2C,
                resume_method: Token::method_def(5),
            }],
        };

        let blob = encode_async_stepping(&info, Token::method_def(5)).unwrap();
        assert_eq!(
            blob,
            [0x41, 0, 0, 0, 0x10, 0, 0, 0, 0x2C, 0, 0, 0, 0x05]
        );

        let none = encode_async_stepping(&AsyncStepInfo::default(), Token::method_def(5)).unwrap();
        assert_eq!(none, [0, 0, 0, 0]);
    }

    #[test]
    fn async_stepping_resumes_in_parent() {
        let info = AsyncStepInfo {
            catch_handler_offset: None,
            awaits: vec![
                AwaitPoint {
                    yield_offset: 0x08,
                    resume_offset: 0x12,
                    resume_method: Token::default(),
                },
                AwaitPoint {
                    yield_offset: 0x30,
                    resume_offset: 0x3A,
                    resume_method: Token::default(),
                },
            ],
        };

        let blob = encode_async_stepping(&info, Token::method_def(3)).unwrap();
        assert_eq!(blob[12], 0x03);
        assert_eq!(blob[21], 0x03);
        assert_eq!(blob.len(), 22);
    }

    #[test]
    fn async_stepping_rejects_foreign_methods() {
        let info = AsyncStepInfo {
            catch_handler_offset: None,
            awaits: vec![AwaitPoint {
                yield_offset: 0,
                resume_offset: 4,
                resume_method: Token::method_def(2),
            }],
        };
        assert!(encode_async_stepping(&info, Token::method_def(3)).is_err());
        assert!(encode_async_stepping(&info, Token::type_def(2)).is_err());
        assert!(encode_async_stepping(&AsyncStepInfo::default(), Token::default()).is_err());
    }
}
